//! Arcade vehicle control on top of rapier's raycast vehicle: ground driving,
//! jump / double jump / flips, air control, self-righting and a chase camera,
//! served to browser clients over a websocket.

pub mod body;
pub mod camera;
pub mod config;
pub mod control;
pub mod error;
pub mod frame;
pub mod input;
pub mod net;
pub mod physics;
pub mod reset;
pub mod sim;
pub mod spawn;
pub mod state;
pub mod timing;
pub mod vehicle;

pub use body::{ChassisBody, ChassisState, VehicleCommand};
pub use config::{AppConfig, CameraConfig, VehicleConfig};
pub use control::{ControlPolicy, TickContext, TickOutput};
pub use error::{ConfigError, NetError, SimError};
pub use input::{Control, Edge, InputState, KeyBindings, KeyEvent, Modifiers};
