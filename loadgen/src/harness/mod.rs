//! The load harness
//!
//! Kind-agnostic machinery: weighted action tables, the actor trait and its
//! bootstrap context, the scenario scheduler, and run metrics. Everything
//! specific to the target platform lives in `scenarios` and `api`.

pub mod action;
pub mod actor;
pub mod metrics;
pub mod scheduler;

pub use action::{Action, ActionResult, ActionSet, Completion, Handler};
pub use actor::{Actor, ActorRng, BootstrapContext, BootstrapError};
pub use metrics::{LatencyStats, Recorder, RunReport};
pub use scheduler::{ActorExit, Scenario, StopHandle};
