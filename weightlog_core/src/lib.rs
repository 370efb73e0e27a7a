#![forbid(unsafe_code)]

//! Core domain model and business logic for weightlog.
//!
//! This crate provides:
//! - Domain types (profile, daily ledgers, food/exercise entries)
//! - The energy-balance model (BMR, calorie balance)
//! - The projection engine and its history/projection reports
//! - Storage (in-memory and JSON-file stores) and an injectable clock
//! - Command parsing and dispatch for transports

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod energy;
pub mod ledger;
pub mod projection;
pub mod report;
pub mod clock;
pub mod store;
pub mod json_store;
pub mod engine;
pub mod command;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use clock::{Clock, FixedClock, SystemClock};
pub use store::{MemoryStore, UserStore};
pub use json_store::JsonFileStore;
pub use engine::Tracker;
pub use command::{execute, respond, Command};
pub use report::{HistoryReport, ProjectionReport};
