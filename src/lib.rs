//! Satellite pass predictor.
//!
//! The pipeline is split across the workspace crates and re-exported here so
//! front-ends (the `pass-predict` CLI, tests) depend on a single crate.

pub use pass_config as config;
pub use pass_core as model;
pub use pass_export as export;
pub use pass_importer as importer;
pub use pass_predict as predict;
pub use pass_propagator as propagator;
pub use pass_store as store;

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
