pub mod cycle;
pub mod lifecycle;

pub use cycle::{CycleReport, CycleRunner};
pub use lifecycle::{EngineCommand, EngineState, Supervisor, SupervisorHandle};
