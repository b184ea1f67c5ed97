//! Test support utilities for the fixture workspace.
//!
//! This crate provides:
//! - `ScriptedExecutor`, a statement executor double with queued responses
//! - fixture-script execution with pretty-printed output for snapshot testing
//! - common configs, rows and record batches
//! - property-based generators for identifiers, values and DSL maps
//! - custom assertion helpers
//!
//! # Example Usage
//!
//! ```
//! use testsupport::prelude::*;
//! use database::FixtureApi;
//! use types::Value;
//!
//! let mut executor = ScriptedExecutor::new(dev_config());
//! executor.push_rows(row(&[("id", Value::Int(5))]));
//!
//! let mut api = FixtureApi::new(executor).unwrap();
//! let found = api.select("user", "id:5").unwrap();
//! assert_eq!(found["id"], Value::Int(5));
//! assert_executed(api.executor(), &["SELECT * FROM dev_user WHERE `id` = 5"]);
//! ```

pub mod assertions;
pub mod executor;
pub mod fixtures;
pub mod macros;
pub mod proptest_generators;
pub mod runner;

/// Convenient re-exports for common testing patterns.
pub mod prelude {
    pub use crate::assert_error_matches;
    pub use crate::row;
    pub use crate::assertions::*;
    pub use crate::executor::*;
    pub use crate::fixtures::*;
    pub use crate::runner::*;
}
