//! Energy-balance model.
//!
//! Pure functions only:
//! - BMR from the Mifflin-St Jeor equation
//! - Exercise burn at a fixed per-minute rate
//! - Net daily balance and its conversion to body mass

use crate::Sex;

/// Energy stored in one kilogram of body mass (kcal)
pub const KCAL_PER_KG: f64 = 7700.0;

/// Burn rate applied to every logged exercise minute, regardless of activity
pub const EXERCISE_KCAL_PER_MINUTE: f64 = 7.0;

/// Basal metabolic rate in kcal/day (Mifflin-St Jeor)
///
/// `10 * weight + 6.25 * height - 5 * age + 5` for men, `- 161` for women.
pub fn bmr(weight_kg: f64, age: u32, sex: Sex, height_cm: u32) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * f64::from(height_cm) - 5.0 * f64::from(age);
    match sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    }
}

/// Calories burned by the given number of exercise minutes
pub fn exercise_kcal(minutes: u64) -> f64 {
    minutes as f64 * EXERCISE_KCAL_PER_MINUTE
}

/// Calories in minus calories out (BMR plus exercise)
pub fn net_daily_balance(food_kcal: i64, bmr: f64, exercise_minutes: u64) -> f64 {
    food_kcal as f64 - bmr - exercise_kcal(exercise_minutes)
}

/// Body-mass change implied by a calorie balance
pub fn weight_delta(net_balance_kcal: f64) -> f64 {
    net_balance_kcal / KCAL_PER_KG
}
