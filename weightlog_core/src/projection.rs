//! Theoretical weight and forward projection.
//!
//! History and projection deliberately use different weight inputs to BMR:
//! - End-of-day theoretical weight always uses the fixed baseline, and each
//!   date is an independent offset from it (no chaining across days).
//! - The 7-day average balance also uses the fixed baseline.
//! - The forward projection recomputes BMR from the running projected
//!   weight, and subtracts it from the average balance each day.

use crate::energy;
use crate::report::{HistoryReport, HistoryRow, ProjectionReport, ProjectionRow};
use crate::UserRecord;
use chrono::{Days, NaiveDate};

/// Default number of forward days in a projection
pub const DEFAULT_PROJECTION_DAYS: u32 = 30;

/// Default number of recent ledgers averaged for a projection
pub const DEFAULT_AVERAGE_WINDOW_DAYS: u32 = 7;

/// BMR for the user at an arbitrary weight
fn bmr_at(user: &UserRecord, weight_kg: f64) -> f64 {
    let p = &user.profile;
    energy::bmr(weight_kg, p.age, p.sex, p.height_cm)
}

/// Theoretical end-of-day weight for a single date.
///
/// Returns the baseline unchanged when nothing was logged on `date`.
pub fn end_of_day_weight(user: &UserRecord, date: NaiveDate) -> f64 {
    let baseline = f64::from(user.current_starting_weight_kg);
    match user.ledger(date) {
        None => baseline,
        Some(ledger) => {
            let bmr = bmr_at(user, baseline);
            let net = energy::net_daily_balance(ledger.food_kcal(), bmr, ledger.exercise_minutes());
            baseline + energy::weight_delta(net)
        }
    }
}

/// Average net daily balance over the `window` most recent ledgers.
///
/// With no ledgers the divisor is clamped to one, giving 0.
pub fn average_daily_balance(user: &UserRecord, window: usize) -> f64 {
    let recent = user.recent_ledgers(window);
    let bmr = bmr_at(user, f64::from(user.current_starting_weight_kg));

    let total: f64 = recent
        .iter()
        .map(|l| energy::net_daily_balance(l.food_kcal(), bmr, l.exercise_minutes()))
        .sum();

    total / recent.len().max(1) as f64
}

/// One row per date from the setup date through `today`, inclusive
pub fn history(user: &UserRecord, today: NaiveDate) -> HistoryReport {
    let rows = user
        .profile
        .setup_date
        .iter_days()
        .take_while(|d| *d <= today)
        .map(|date| HistoryRow {
            date,
            theoretical_kg: end_of_day_weight(user, date),
            actual_kg: user.ledger(date).and_then(|l| l.actual_weight_kg),
        })
        .collect();

    HistoryReport { rows }
}

/// Simulate `days` future days starting the day after `today`.
///
/// Rows stop early if the calendar runs out before the horizon does.
pub fn project(user: &UserRecord, today: NaiveDate, days: u32, window: usize) -> ProjectionReport {
    let average = average_daily_balance(user, window);
    let mut weight = end_of_day_weight(user, today);

    tracing::debug!(
        "Projecting {} days for {} from {:.2} kg (average balance {:.1} kcal)",
        days,
        user.id,
        weight,
        average
    );

    let rows = (1..=u64::from(days))
        .map_while(|offset| {
            let date = today.checked_add_days(Days::new(offset))?;
            let bmr = bmr_at(user, weight);
            weight += energy::weight_delta(average - bmr);
            Some(ProjectionRow {
                date,
                projected_kg: weight,
            })
        })
        .collect();

    ProjectionReport { rows }
}
