//! Daily ledger management.
//!
//! Lookup, lazy creation and windowing of a user's daily ledgers. Storage
//! order is insertion order; anything that needs chronology sorts on read.

use crate::{DailyLedger, ExerciseEntry, FoodEntry, Profile, UserRecord};
use chrono::{DateTime, NaiveDate, Utc};

impl DailyLedger {
    /// An empty ledger for the given date
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            food: Vec::new(),
            exercise: Vec::new(),
            actual_weight_kg: None,
        }
    }

    /// Sum of kcal across all food entries
    pub fn food_kcal(&self) -> i64 {
        self.food.iter().map(|f| i64::from(f.kcal)).sum()
    }

    /// Sum of minutes across all exercise entries
    pub fn exercise_minutes(&self) -> u64 {
        self.exercise.iter().map(|e| u64::from(e.minutes)).sum()
    }
}

impl UserRecord {
    /// Build a fresh record from a profile. Baseline and starting date
    /// come from the profile.
    pub fn new(id: impl Into<String>, profile: Profile) -> Self {
        Self {
            id: id.into(),
            current_starting_weight_kg: profile.initial_weight_kg,
            starting_date: profile.setup_date,
            profile,
            daily_ledgers: Vec::new(),
        }
    }

    /// Find the ledger for a date, if one exists
    pub fn ledger(&self, date: NaiveDate) -> Option<&DailyLedger> {
        self.daily_ledgers.iter().find(|l| l.date == date)
    }

    /// Return the ledger for `date`, creating and appending an empty one if
    /// none exists. Calling this repeatedly never creates duplicates.
    pub fn ensure_ledger(&mut self, date: NaiveDate) -> &mut DailyLedger {
        let idx = match self.daily_ledgers.iter().position(|l| l.date == date) {
            Some(idx) => idx,
            None => {
                tracing::debug!("Creating ledger for {} (user {})", date, self.id);
                self.daily_ledgers.push(DailyLedger::new(date));
                self.daily_ledgers.len() - 1
            }
        };
        &mut self.daily_ledgers[idx]
    }

    /// Record a measured weight for `date`, replacing any earlier value
    pub fn set_actual_weight(&mut self, date: NaiveDate, weight_kg: u32) {
        self.ensure_ledger(date).actual_weight_kg = Some(weight_kg);
    }

    /// Append a food entry to the ledger for the entry's date
    pub fn append_food(&mut self, tag: impl Into<String>, kcal: i32, at: DateTime<Utc>) {
        self.ensure_ledger(at.date_naive()).food.push(FoodEntry {
            tag: tag.into(),
            kcal,
            recorded_at: at,
        });
    }

    /// Append an exercise entry to the ledger for the entry's date
    pub fn append_exercise(&mut self, tag: impl Into<String>, minutes: u32, at: DateTime<Utc>) {
        self.ensure_ledger(at.date_naive()).exercise.push(ExerciseEntry {
            tag: tag.into(),
            minutes,
            recorded_at: at,
        });
    }

    /// The `limit` most recent ledgers, newest first
    pub fn recent_ledgers(&self, limit: usize) -> Vec<&DailyLedger> {
        let mut ledgers: Vec<_> = self.daily_ledgers.iter().collect();
        ledgers.sort_by(|a, b| b.date.cmp(&a.date));
        ledgers.truncate(limit);
        ledgers
    }
}
