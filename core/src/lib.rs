//! Stop-level default risk attribution.
//!
//! Takes a table of delivery-trip stops and a table of per-trip default
//! predictions, and marks the last N stops of each predicted trip as at
//! risk, N being the predicted default count capped at the trip's stops.

pub mod attribution;
pub mod breakdown;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod io;
pub mod model;
pub mod rng;
pub mod sample;
pub mod table;
pub mod types;

pub use attribution::{attribute_risk, Attribution};
pub use breakdown::{summarize, BreakdownRow};
pub use config::{AttributionConfig, KeyColumn, KeySpec, ValuePolicy};
pub use diagnostics::{Diagnostics, EmptyReason, Outcome};
pub use error::{AttributionError, AttributionResult};
pub use table::{Table, Value};
