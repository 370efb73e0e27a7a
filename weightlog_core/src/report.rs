//! Tabular history and projection reports.
//!
//! Reports are typed values; `Display` renders the plain-text table sent
//! back to the user.

use chrono::NaiveDate;
use std::fmt;

const SEPARATOR: &str = "----------------------------------------";

/// One day of history
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub theoretical_kg: f64,
    pub actual_kg: Option<u32>,
}

/// Theoretical vs. measured weight, setup date through today
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryReport {
    pub rows: Vec<HistoryRow>,
}

/// One projected future day
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionRow {
    pub date: NaiveDate,
    pub projected_kg: f64,
}

/// Forward weight projection
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectionReport {
    pub rows: Vec<ProjectionRow>,
}

impl fmt::Display for HistoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Date | Theoretical weight | Actual weight")?;
        write!(f, "{}", SEPARATOR)?;
        for row in &self.rows {
            write!(f, "\n{} | {:.1} kg | ", row.date.format("%Y-%m-%d"), row.theoretical_kg)?;
            match row.actual_kg {
                Some(kg) => write!(f, "{} kg", kg)?,
                None => write!(f, "No Data")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for ProjectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Date | Projected weight | N/A")?;
        write!(f, "{}", SEPARATOR)?;
        for row in &self.rows {
            write!(
                f,
                "\n{} | {:.1} kg | N/A",
                row.date.format("%Y-%m-%d"),
                row.projected_kg
            )?;
        }
        Ok(())
    }
}

/// Render a single weight the way the theoretical-weight reply does
pub fn format_theoretical_weight(kg: f64) -> String {
    format!("Theoretical weight: {:.1} kg", kg)
}
