//! Projection engine: the public operations on a user's ledger.
//!
//! Every operation fetches the user's full record from the store, works on
//! it in memory and, if it mutated anything, persists the whole record
//! before returning. No state is kept between calls.

use crate::clock::Clock;
use crate::config::{ModelConfig, TheoreticalWeightMode};
use crate::projection;
use crate::report::{HistoryReport, ProjectionReport};
use crate::store::UserStore;
use crate::{Error, Profile, Result, SetupRequest, UserRecord};

/// Lowest accepted measured weight (kg)
pub const MIN_WEIGHT_KG: i32 = 42;

/// Highest accepted measured weight (kg)
pub const MAX_WEIGHT_KG: i32 = 1000;

/// Ledger engine bound to a store and a clock
#[derive(Debug)]
pub struct Tracker<S, C> {
    store: S,
    clock: C,
    model: ModelConfig,
}

impl<S: UserStore, C: Clock> Tracker<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self::with_model(store, clock, ModelConfig::default())
    }

    pub fn with_model(store: S, clock: C, model: ModelConfig) -> Self {
        Self { store, clock, model }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Create (or overwrite) the user's record with a fresh profile
    pub fn setup(&self, user_id: &str, request: SetupRequest) -> Result<UserRecord> {
        request.validate()?;

        let today = self.clock.today();
        let profile = Profile {
            age: request.age,
            sex: request.sex,
            height_cm: request.height_cm,
            initial_weight_kg: request.initial_weight_kg,
            target_weight_kg: request.target_weight_kg,
            setup_date: today,
        };

        let user = self.store.upsert(UserRecord::new(user_id, profile))?;
        tracing::info!("Set up user {} on {}", user_id, today);
        Ok(user)
    }

    /// Record today's measured weight, replacing any earlier value for today
    pub fn log_weight(&self, user_id: &str, weight_kg: i32) -> Result<()> {
        if !(MIN_WEIGHT_KG..=MAX_WEIGHT_KG).contains(&weight_kg) {
            tracing::info!("Rejected weight {} kg for user {}", weight_kg, user_id);
            return Err(Error::Validation(format!(
                "Invalid weight. Must be between {} and {} kg.",
                MIN_WEIGHT_KG, MAX_WEIGHT_KG
            )));
        }
        let weight_kg = weight_kg.unsigned_abs();
        let today = self.clock.today();

        self.mutate(user_id, |user| {
            user.set_actual_weight(today, weight_kg);
            Ok(())
        })?;

        tracing::info!("Logged weight {} kg for user {} on {}", weight_kg, user_id, today);
        Ok(())
    }

    /// Append a food entry to today's ledger
    pub fn log_food(&self, user_id: &str, tag: &str, kcal: i32) -> Result<()> {
        let now = self.clock.now();
        self.mutate(user_id, |user| {
            user.append_food(tag, kcal, now);
            Ok(())
        })?;

        tracing::info!("Logged food '{}' ({} kcal) for user {}", tag, kcal, user_id);
        Ok(())
    }

    /// Append an exercise entry to today's ledger
    pub fn log_exercise(&self, user_id: &str, tag: &str, minutes: u32) -> Result<()> {
        let now = self.clock.now();
        self.mutate(user_id, |user| {
            user.append_exercise(tag, minutes, now);
            Ok(())
        })?;

        tracing::info!("Logged exercise '{}' ({} min) for user {}", tag, minutes, user_id);
        Ok(())
    }

    /// Theoretical and measured weight for every day since setup
    pub fn history(&self, user_id: &str) -> Result<HistoryReport> {
        let user = self.load(user_id)?;
        Ok(projection::history(&user, self.clock.today()))
    }

    /// Forward projection from today's theoretical weight
    pub fn projection(&self, user_id: &str) -> Result<ProjectionReport> {
        let user = self.load(user_id)?;
        Ok(projection::project(
            &user,
            self.clock.today(),
            self.model.projection_days,
            self.model.average_window_days as usize,
        ))
    }

    /// The user's current theoretical weight.
    ///
    /// In `Baseline` mode (the default) this is the stored starting weight,
    /// untouched by anything logged since setup.
    pub fn theoretical_weight(&self, user_id: &str) -> Result<f64> {
        let user = self.load(user_id)?;
        let kg = match self.model.theoretical_weight {
            TheoreticalWeightMode::Baseline => f64::from(user.current_starting_weight_kg),
            TheoreticalWeightMode::EndOfDay => {
                projection::end_of_day_weight(&user, self.clock.today())
            }
        };
        Ok(kg)
    }

    fn load(&self, user_id: &str) -> Result<UserRecord> {
        self.store
            .fetch(user_id)?
            .ok_or_else(|| Error::UserNotFound(user_id.to_string()))
    }

    fn mutate<F>(&self, user_id: &str, f: F) -> Result<UserRecord>
    where
        F: FnOnce(&mut UserRecord) -> Result<()>,
    {
        self.store
            .modify(user_id, f)?
            .ok_or_else(|| Error::UserNotFound(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::MemoryStore;
    use crate::{energy, Sex};
    use chrono::NaiveDate;

    fn start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn create_tracker() -> Tracker<MemoryStore, FixedClock> {
        crate::logging::init_test();
        Tracker::new(MemoryStore::new(), FixedClock::at_date(start_date()))
    }

    fn setup_request() -> SetupRequest {
        SetupRequest {
            age: 30,
            sex: Sex::Male,
            height_cm: 175,
            initial_weight_kg: 80,
            target_weight_kg: 70,
        }
    }

    #[test]
    fn test_setup_roundtrip_through_store() {
        let tracker = create_tracker();
        tracker.setup("test123", setup_request()).unwrap();

        let user = tracker.store().fetch("test123").unwrap().unwrap();
        assert_eq!(user.profile.age, 30);
        assert_eq!(user.profile.sex, Sex::Male);
        assert_eq!(user.profile.height_cm, 175);
        assert_eq!(user.profile.initial_weight_kg, 80);
        assert_eq!(user.profile.target_weight_kg, 70);
        assert_eq!(user.profile.setup_date, start_date());
        assert_eq!(user.current_starting_weight_kg, 80);
        assert_eq!(user.starting_date, start_date());
    }

    #[test]
    fn test_setup_overwrites_existing_record() {
        let tracker = create_tracker();
        tracker.setup("test123", setup_request()).unwrap();
        tracker.log_food("test123", "apple", 95).unwrap();

        let mut again = setup_request();
        again.initial_weight_kg = 90;
        tracker.setup("test123", again).unwrap();

        let user = tracker.store().fetch("test123").unwrap().unwrap();
        assert_eq!(user.current_starting_weight_kg, 90);
        assert!(user.daily_ledgers.is_empty());
    }

    #[test]
    fn test_setup_rejects_zero_age() {
        let tracker = create_tracker();
        let mut request = setup_request();
        request.age = 0;

        assert!(matches!(tracker.setup("u", request), Err(Error::Validation(_))));
        assert!(tracker.store().is_empty());
    }

    #[test]
    fn test_log_weight_accepts_bounds() {
        let tracker = create_tracker();
        tracker.setup("test123", setup_request()).unwrap();

        for weight in [42, 75, 1000] {
            tracker.log_weight("test123", weight).unwrap();
            let user = tracker.store().fetch("test123").unwrap().unwrap();
            assert_eq!(
                user.ledger(start_date()).unwrap().actual_weight_kg,
                Some(weight as u32)
            );
        }
    }

    #[test]
    fn test_log_weight_out_of_range_does_not_mutate() {
        let tracker = create_tracker();
        tracker.setup("test123", setup_request()).unwrap();

        for weight in [41, 1001, 0, -5] {
            let err = tracker.log_weight("test123", weight).unwrap_err();
            assert_eq!(err.to_string(), "Invalid weight. Must be between 42 and 1000 kg.");
        }

        let user = tracker.store().fetch("test123").unwrap().unwrap();
        assert!(user.daily_ledgers.is_empty());
    }

    #[test]
    fn test_log_weight_validation_precedes_lookup() {
        let tracker = create_tracker();
        assert!(matches!(tracker.log_weight("ghost", 5), Err(Error::Validation(_))));
        assert!(matches!(
            tracker.log_weight("ghost", 70),
            Err(Error::UserNotFound(_))
        ));
    }

    #[test]
    fn test_log_weight_same_day_overwrites() {
        let tracker = create_tracker();
        tracker.setup("test123", setup_request()).unwrap();
        tracker.log_weight("test123", 79).unwrap();
        tracker.log_weight("test123", 78).unwrap();

        let user = tracker.store().fetch("test123").unwrap().unwrap();
        assert_eq!(user.daily_ledgers.len(), 1);
        assert_eq!(user.ledger(start_date()).unwrap().actual_weight_kg, Some(78));
    }

    #[test]
    fn test_log_food_appends_in_call_order() {
        let tracker = create_tracker();
        tracker.setup("test123", setup_request()).unwrap();
        tracker.log_food("test123", "apple", 95).unwrap();
        tracker.log_food("test123", "banana", 105).unwrap();

        let user = tracker.store().fetch("test123").unwrap().unwrap();
        let ledger = user.ledger(start_date()).unwrap();
        assert_eq!(ledger.food.len(), 2);
        assert_eq!(ledger.food[0].tag, "apple");
        assert_eq!(ledger.food[1].tag, "banana");
        assert_eq!(ledger.food_kcal(), 200);
        assert_eq!(ledger.food[0].recorded_at, tracker.clock().now());
    }

    #[test]
    fn test_log_exercise_appends_entry() {
        let tracker = create_tracker();
        tracker.setup("test123", setup_request()).unwrap();
        tracker.log_exercise("test123", "running", 30).unwrap();

        let user = tracker.store().fetch("test123").unwrap().unwrap();
        let ledger = user.ledger(start_date()).unwrap();
        assert_eq!(ledger.exercise.len(), 1);
        assert_eq!(ledger.exercise[0].tag, "running");
        assert_eq!(ledger.exercise[0].minutes, 30);
    }

    #[test]
    fn test_operations_on_missing_user() {
        let tracker = create_tracker();

        assert!(matches!(tracker.log_food("ghost", "x", 1), Err(Error::UserNotFound(_))));
        assert!(matches!(
            tracker.log_exercise("ghost", "x", 1),
            Err(Error::UserNotFound(_))
        ));
        assert!(matches!(tracker.history("ghost"), Err(Error::UserNotFound(_))));
        assert!(matches!(tracker.projection("ghost"), Err(Error::UserNotFound(_))));
        assert!(matches!(
            tracker.theoretical_weight("ghost"),
            Err(Error::UserNotFound(_))
        ));
        assert!(tracker.store().is_empty());
    }

    #[test]
    fn test_theoretical_weight_right_after_setup() {
        let tracker = create_tracker();
        tracker.setup("test123", setup_request()).unwrap();
        assert_eq!(tracker.theoretical_weight("test123").unwrap(), 80.0);
    }

    #[test]
    fn test_theoretical_weight_baseline_ignores_logged_intake() {
        // Baseline mode reports the stored starting weight even after
        // food and exercise have been logged today.
        let tracker = create_tracker();
        tracker.setup("test123", setup_request()).unwrap();
        tracker.log_food("test123", "cake", 3000).unwrap();
        tracker.log_exercise("test123", "walk", 20).unwrap();

        assert_eq!(tracker.theoretical_weight("test123").unwrap(), 80.0);
    }

    #[test]
    fn test_theoretical_weight_end_of_day_mode_diverges() {
        let model = ModelConfig {
            theoretical_weight: TheoreticalWeightMode::EndOfDay,
            ..ModelConfig::default()
        };
        let tracker = Tracker::with_model(
            MemoryStore::new(),
            FixedClock::at_date(start_date()),
            model,
        );
        tracker.setup("test123", setup_request()).unwrap();
        tracker.log_food("test123", "cake", 3000).unwrap();

        let bmr = energy::bmr(80.0, 30, Sex::Male, 175);
        let expected = 80.0 + (3000.0 - bmr) / 7700.0;
        let actual = tracker.theoretical_weight("test123").unwrap();
        assert!((actual - expected).abs() < 1e-9);
        assert_ne!(actual, 80.0);
    }

    #[test]
    fn test_history_spans_setup_through_today() {
        let tracker = create_tracker();
        tracker.setup("test123", setup_request()).unwrap();
        tracker.clock().advance_days(2);

        let report = tracker.history("test123").unwrap();
        let dates: Vec<_> = report.rows.iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![
                start_date(),
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
            ]
        );
    }

    #[test]
    fn test_history_scenario_food_and_exercise() {
        let tracker = create_tracker();
        tracker.setup("test123", setup_request()).unwrap();
        tracker.log_food("test123", "apple", 95).unwrap();
        tracker.log_exercise("test123", "running", 30).unwrap();

        let report = tracker.history("test123").unwrap();
        let bmr = energy::bmr(80.0, 30, Sex::Male, 175);
        let expected = 80.0 + (95.0 - bmr - 210.0) / 7700.0;

        assert_eq!(report.rows.len(), 1);
        assert!((report.rows[0].theoretical_kg - expected).abs() < 1e-9);
        assert!(report.to_string().ends_with("2024-03-01 | 79.8 kg | No Data"));
    }

    #[test]
    fn test_log_on_later_day_creates_new_ledger() {
        let tracker = create_tracker();
        tracker.setup("test123", setup_request()).unwrap();
        tracker.log_weight("test123", 80).unwrap();
        tracker.clock().advance_days(1);
        tracker.log_weight("test123", 79).unwrap();

        let user = tracker.store().fetch("test123").unwrap().unwrap();
        assert_eq!(user.daily_ledgers.len(), 2);

        let report = tracker.history("test123").unwrap();
        assert_eq!(report.rows[0].actual_kg, Some(80));
        assert_eq!(report.rows[1].actual_kg, Some(79));
    }

    #[test]
    fn test_projection_without_ledgers_has_thirty_rows() {
        let tracker = create_tracker();
        tracker.setup("test123", setup_request()).unwrap();

        let report = tracker.projection("test123").unwrap();
        assert_eq!(report.rows.len(), 30);
        assert_eq!(
            report.rows[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
        assert_eq!(report.to_string().lines().count(), 32);
    }

    #[test]
    fn test_projection_honours_model_config() {
        let model = ModelConfig {
            projection_days: 5,
            ..ModelConfig::default()
        };
        let tracker = Tracker::with_model(
            MemoryStore::new(),
            FixedClock::at_date(start_date()),
            model,
        );
        tracker.setup("test123", setup_request()).unwrap();

        assert_eq!(tracker.projection("test123").unwrap().rows.len(), 5);
    }

    #[test]
    fn test_users_are_independent() {
        let tracker = create_tracker();
        tracker.setup("a", setup_request()).unwrap();
        tracker.setup("b", setup_request()).unwrap();
        tracker.log_food("a", "apple", 95).unwrap();

        let b = tracker.store().fetch("b").unwrap().unwrap();
        assert!(b.daily_ledgers.is_empty());
    }
}
