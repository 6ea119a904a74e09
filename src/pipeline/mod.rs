// Event reconciliation pipeline: normalize -> deduplicate -> sort

pub mod processing;
pub mod reconcile;

pub use reconcile::{ReconcileResult, Reconciler, SourceOutcome};
