use serde::Serialize;

use common::Result;

use crate::structure::StructureSnapshot;

/// Current velocity must exceed this multiple of the rolling baseline.
pub const VELOCITY_SPIKE_RATIO: f64 = 2.5;
/// Current volume must exceed this multiple of the rolling volume average.
pub const VOLUME_CONFIRM_RATIO: f64 = 1.5;

/// Why the spike did or did not register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VelocityReason {
    SpikeConfirmed,
    BodyBelowThreshold,
    VolumeUnconfirmed,
    /// The rolling baseline is zero (a run of rangeless bars); there is no
    /// meaningful ratio to take.
    FlatBaseline,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VelocityResult {
    pub spike: bool,
    pub velocity_ratio: f64,
    pub volume_ratio: f64,
    pub current_velocity: f64,
    pub avg_velocity: f64,
    pub reason: VelocityReason,
}

/// Velocity-spike detection with volume confirmation.
///
/// Both gates must clear: velocity alone is a false-positive-prone signal,
/// so the volume confirmation is load-bearing and must not be dropped.
pub fn detect_velocity_spike(snapshot: &StructureSnapshot) -> Result<VelocityResult> {
    let current_velocity = snapshot.velocity[snapshot.current];
    let avg_velocity = snapshot.velocity_avg_at_current()?;
    let current_volume = snapshot.current_candle().volume;
    let avg_volume = snapshot.volume_sma_at_current()?;

    if avg_velocity <= 0.0 || avg_volume <= 0.0 {
        return Ok(VelocityResult {
            spike: false,
            velocity_ratio: 0.0,
            volume_ratio: 0.0,
            current_velocity,
            avg_velocity,
            reason: VelocityReason::FlatBaseline,
        });
    }

    let velocity_ratio = current_velocity / avg_velocity;
    let volume_ratio = current_volume / avg_volume;

    let (spike, reason) = if velocity_ratio <= VELOCITY_SPIKE_RATIO {
        (false, VelocityReason::BodyBelowThreshold)
    } else if volume_ratio <= VOLUME_CONFIRM_RATIO {
        (false, VelocityReason::VolumeUnconfirmed)
    } else {
        (true, VelocityReason::SpikeConfirmed)
    };

    Ok(VelocityResult {
        spike,
        velocity_ratio,
        volume_ratio,
        current_velocity,
        avg_velocity,
        reason,
    })
}
