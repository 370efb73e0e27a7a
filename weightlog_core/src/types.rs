//! Core domain types for the weight ledger.
//!
//! This module defines the fundamental types used throughout the system:
//! - The user's profile and sex (for BMR)
//! - Food and exercise entries
//! - Daily ledgers and the user record that owns them

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Profile Types
// ============================================================================

/// Biological sex, as used by the Mifflin-St Jeor equation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl FromStr for Sex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" => Ok(Sex::Male),
            "f" | "female" => Ok(Sex::Female),
            other => Err(Error::Validation(format!(
                "Invalid sex '{}'. Use M or F.",
                other
            ))),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => f.write_str("M"),
            Sex::Female => f.write_str("F"),
        }
    }
}

/// Profile captured at setup. Never changed afterwards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub age: u32,
    pub sex: Sex,
    pub height_cm: u32,
    pub initial_weight_kg: u32,
    pub target_weight_kg: u32,
    pub setup_date: NaiveDate,
}

// ============================================================================
// Ledger Entry Types
// ============================================================================

/// A single recorded meal or snack
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FoodEntry {
    pub tag: String,
    pub kcal: i32,
    pub recorded_at: DateTime<Utc>,
}

/// A single recorded exercise bout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseEntry {
    pub tag: String,
    pub minutes: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Everything logged by one user on one calendar date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyLedger {
    pub date: NaiveDate,
    #[serde(default)]
    pub food: Vec<FoodEntry>,
    #[serde(default)]
    pub exercise: Vec<ExerciseEntry>,
    /// Measured weight in kg; `None` means not weighed that day
    #[serde(default)]
    pub actual_weight_kg: Option<u32>,
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// A user's full document: profile, baseline and every daily ledger.
///
/// Ledgers are stored in insertion order. At most one ledger exists per
/// date; callers go through [`UserRecord::ensure_ledger`] to add one.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub profile: Profile,
    #[serde(default)]
    pub daily_ledgers: Vec<DailyLedger>,
    /// Baseline for theoretical-weight calculations
    pub current_starting_weight_kg: u32,
    pub starting_date: NaiveDate,
}

/// Setup inputs, before the record exists
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupRequest {
    pub age: u32,
    pub sex: Sex,
    pub height_cm: u32,
    pub initial_weight_kg: u32,
    pub target_weight_kg: u32,
}

impl SetupRequest {
    /// Check the profile invariants: age, height and initial weight > 0
    pub fn validate(&self) -> Result<()> {
        if self.age == 0 {
            return Err(Error::Validation("Invalid age. Must be greater than 0.".into()));
        }
        if self.height_cm == 0 {
            return Err(Error::Validation(
                "Invalid height. Must be greater than 0 cm.".into(),
            ));
        }
        if self.initial_weight_kg == 0 {
            return Err(Error::Validation(
                "Invalid initial weight. Must be greater than 0 kg.".into(),
            ));
        }
        Ok(())
    }
}
