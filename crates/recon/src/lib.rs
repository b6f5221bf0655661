//! `rollcall-recon` - name matching and pay-period reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded tables, returns matches, joins and
//! compliance buckets. No CLI or file IO dependencies.

pub mod classify;
pub mod columns;
pub mod config;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod roster;
pub mod similarity;
pub mod summary;
pub mod worker;

pub use columns::{ColumnResolver, ColumnRule};
pub use config::ReconConfig;
pub use engine::{run, PayPeriodInput};
pub use error::ReconError;
pub use lookup::LookupIndex;
pub use matcher::MatchingEngine;
pub use model::{FieldValue, MatchResult, MatchStatistics, MatchStatus, PayPeriodReport, Table};
pub use normalize::{normalize, NormalizedName};
pub use reconcile::{reconcile, ReconcileOptions};
