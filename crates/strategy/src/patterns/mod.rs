//! Pattern detectors over a [`StructureSnapshot`](crate::structure::StructureSnapshot).
//!
//! Three cooperating detectors decide whether, and in which direction, a
//! signal fires: range compression, velocity spike (volume-confirmed), and
//! breakout confirmation (momentum-filtered). Compression and velocity are
//! direction-blind; direction is decided only at the breakout step.
//! The divergence side-check feeds the position monitor, not entries.

pub mod breakout;
pub mod compression;
pub mod divergence;
pub mod velocity;

pub use breakout::{confirm_breakout, BreakoutReason, BreakoutResult};
pub use compression::{detect_compression, CompressionReason, CompressionResult};
pub use divergence::{detect_divergence, Divergence};
pub use velocity::{detect_velocity_spike, VelocityReason, VelocityResult};
