//! The optimization loop: collect metrics, score health, decide on one
//! corrective action per campaign, and dispatch it within safety bounds.
//!
//! The pipeline is `MetricCollector` -> `analyze` -> `decide` ->
//! `ActionDispatcher`, driven once per cycle by the `Scheduler`. Every
//! stage takes its collaborators as trait objects so the whole loop runs
//! unchanged against the sandbox platform or a real one.

pub mod analyzer;
pub mod collector;
pub mod decision;
pub mod dispatcher;
pub mod scheduler;

pub use analyzer::analyze;
pub use collector::MetricCollector;
pub use decision::decide;
pub use dispatcher::ActionDispatcher;
pub use scheduler::{CancelToken, CycleReport, Scheduler};
