//! End-to-end scenarios
//!
//! Reusable node setups plus the suite that runs them through the
//! scheduler simulator and checks the delivery contract:
//! - Every packet is delivered exactly once, in order
//! - No invocation spans more than one sync set
//! - Timestamps increase within each sync set
//! - The node is closed exactly once, after everything else

use crate::{SimulationConfig, StreamProfile};

/// Stereo camera pair synchronized together, audio and sparse metadata on
/// their own cadences.
pub fn av_pipeline(seed: u64) -> SimulationConfig {
    SimulationConfig::new(seed)
        .with_stream("VIDEO:0:left", StreamProfile::jittery(33, 60))
        .with_stream("VIDEO:1:right", StreamProfile::jittery(33, 60))
        .with_stream("AUDIO:0:mic", StreamProfile::steady(10, 200))
        .with_stream("META:0:tags", StreamProfile::sparse(100, 20).with_phase(5))
        .with_sync_set(["VIDEO:0", "VIDEO:1"])
        .with_sync_set(["AUDIO"])
}

/// Two unrelated groups at different rates, the second one implicit.
pub fn two_cadences(seed: u64) -> SimulationConfig {
    SimulationConfig::new(seed)
        .with_stream("FAST:0:a", StreamProfile::jittery(1, 100))
        .with_stream("FAST:1:b", StreamProfile::sparse(1, 100))
        .with_stream("SLOW:0:c", StreamProfile::jittery(7, 15).with_phase(3))
        .with_stream("SLOW:1:d", StreamProfile::steady(7, 15).with_phase(3))
        .with_sync_set(["FAST:0", "FAST:1"])
}

/// Every stream on its own: the node runs whenever any input arrives.
pub fn fully_independent(seed: u64) -> SimulationConfig {
    SimulationConfig::new(seed)
        .with_stream("IN:0:a", StreamProfile::jittery(2, 40))
        .with_stream("IN:1:b", StreamProfile::sparse(3, 40))
        .with_stream("IN:2:c", StreamProfile::steady(5, 40))
        .with_sync_set(["IN:0"])
        .with_sync_set(["IN:1"])
        .with_sync_set(["IN:2"])
        .with_max_allowance(1)
}
