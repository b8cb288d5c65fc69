// ==============================================================================
// error.rs — TYPED FAILURES
// ------------------------------------------------------------------------------
// Three families:
// - ConfigError: loading/validating the JSON tuning file (startup only)
// - SimError: a Ready vehicle slot points at physics state that no longer
//   exists. This is a construction-order bug, the server treats it as fatal.
// - NetError: websocket bind/handshake failures.
//
// "Vehicle not built yet" is NOT an error: the tick is skipped (see
// vehicle::VehicleSlot).
// ==============================================================================

use std::path::PathBuf;

use rapier3d::prelude::RigidBodyHandle;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("chassis body {0:?} is registered to a player but missing from the rigid body set")]
    MissingChassis(RigidBodyHandle),

    #[error("chassis body {0:?} has no raycast vehicle controller")]
    MissingController(RigidBodyHandle),
}

#[derive(Debug, Error)]
pub enum NetError {
    #[error("failed to bind websocket listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("websocket handshake failed: {0}")]
    Handshake(#[from] tungstenite::Error),
}
