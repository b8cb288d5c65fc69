// ==============================================================================
// config.rs — TUNING + SERVER CONFIGURATION
// ------------------------------------------------------------------------------
// VehicleConfig is read-only after construction. `VehicleConfig::ARCADE` is
// the built-in preset; a JSON file may override any subset of fields
// (`#[serde(default)]` on every section).
//
// Durations are stored as milliseconds (JSON friendly) and exposed as
// `Duration` through accessor methods.
// ==============================================================================

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::input::KeyBindings;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    // --- Chassis ---
    pub mass: f32,                       // kg
    pub chassis_half_extents: [f32; 3],  // [hx, hy, hz] meters
    pub linear_damping: f32,             // drag
    pub angular_damping: f32,            // rotational drag

    // --- Wheels (chassis local; front axle at -z) ---
    pub wheel_radius: f32,               // m
    pub wheel_half_track: f32,           // |x| of each wheel mount
    pub wheel_half_base: f32,            // |z| of each wheel mount
    pub wheel_mount_height: f32,         // y of each wheel mount
    pub suspension_rest_length: f32,     // m
    pub suspension_stiffness: f32,
    pub suspension_compression: f32,
    pub suspension_damping: f32,
    pub max_suspension_travel: f32,      // m
    pub friction_slip: f32,

    // --- Ground drive ---
    pub max_steer_value: f32,            // radians
    pub max_engine_force: f32,           // N per wheel, negative = forward
    pub brake_force: f32,                // per wheel

    // --- Jump ---
    pub jump_impulse: f32,               // N*s on press
    pub jump_force: f32,                 // N while held
    pub max_jump_duration_ms: u64,
    pub double_jump_force: f32,          // N*s
    pub min_double_jump_ms: u64,         // exclusive
    pub max_double_jump_ms: u64,         // exclusive

    // --- Flips ---
    pub flip_force: f32,                 // N*s, front/back
    pub flip_torque: f32,                // N*m*s, front/back
    pub side_flip_horizontal_force: f32, // N*s
    pub side_flip_torque: f32,           // N*m*s
    pub flip_immobility_ms: u64,         // air control suppressed after a flip

    // --- Self-righting ---
    pub self_righting_force: f32,        // N*s
    pub self_righting_torque: f32,       // N*m*s
    pub self_righting_delay_ms: u64,
    pub stuck_up_dot: f32,               // up.y below this = inverted
    pub stuck_height: f32,               // m, chassis y below this = on the ground
    pub upright_dot: f32,                // up.y at/above this = upright again

    // --- Air control ---
    pub air_pitch_torque: f32,           // N*m
    pub air_yaw_torque: f32,             // N*m
    pub air_roll_torque: f32,            // N*m

    // --- Downforce + governance ---
    pub downforce_per_speed: f32,        // N per m/s
    pub max_downforce: f32,              // N
    pub max_velocity: f32,               // m/s
    pub max_angular_velocity: f32,       // rad/s
}

impl VehicleConfig {
    pub const ARCADE: VehicleConfig = VehicleConfig {
        mass: 150.0,
        chassis_half_extents: [0.9, 0.3, 1.8],
        linear_damping: 0.05,
        angular_damping: 0.4,

        wheel_radius: 0.4,
        wheel_half_track: 0.85,
        wheel_half_base: 1.3,
        wheel_mount_height: -0.1,
        suspension_rest_length: 0.35,
        suspension_stiffness: 30.0,
        suspension_compression: 4.4,
        suspension_damping: 2.3,
        max_suspension_travel: 0.3,
        friction_slip: 1.4,

        max_steer_value: 0.5,
        max_engine_force: 500.0,
        brake_force: 20.0,

        jump_impulse: 600.0,
        jump_force: 1500.0,
        max_jump_duration_ms: 200,
        double_jump_force: 700.0,
        min_double_jump_ms: 100,
        max_double_jump_ms: 1500,

        flip_force: 600.0,
        flip_torque: 1000.0,
        side_flip_horizontal_force: 500.0,
        side_flip_torque: 400.0,
        flip_immobility_ms: 400,

        self_righting_force: 900.0,
        self_righting_torque: 700.0,
        self_righting_delay_ms: 250,
        stuck_up_dot: -0.5,
        stuck_height: 1.5,
        upright_dot: 0.9,

        air_pitch_torque: 400.0,
        air_yaw_torque: 300.0,
        air_roll_torque: 400.0,

        downforce_per_speed: 10.0,
        max_downforce: 1500.0,
        max_velocity: 40.0,
        max_angular_velocity: 6.0,
    };

    pub fn max_jump_duration(&self) -> Duration {
        Duration::from_millis(self.max_jump_duration_ms)
    }

    pub fn min_double_jump(&self) -> Duration {
        Duration::from_millis(self.min_double_jump_ms)
    }

    pub fn max_double_jump(&self) -> Duration {
        Duration::from_millis(self.max_double_jump_ms)
    }

    pub fn flip_immobility(&self) -> Duration {
        Duration::from_millis(self.flip_immobility_ms)
    }

    pub fn self_righting_delay(&self) -> Duration {
        Duration::from_millis(self.self_righting_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("mass", self.mass),
            ("wheel_radius", self.wheel_radius),
            ("suspension_rest_length", self.suspension_rest_length),
            ("max_engine_force", self.max_engine_force),
            ("max_velocity", self.max_velocity),
            ("max_angular_velocity", self.max_angular_velocity),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be > 0 (got {value})")));
            }
        }

        let non_negative = [
            ("brake_force", self.brake_force),
            ("jump_impulse", self.jump_impulse),
            ("jump_force", self.jump_force),
            ("double_jump_force", self.double_jump_force),
            ("flip_force", self.flip_force),
            ("flip_torque", self.flip_torque),
            ("side_flip_horizontal_force", self.side_flip_horizontal_force),
            ("side_flip_torque", self.side_flip_torque),
            ("self_righting_force", self.self_righting_force),
            ("self_righting_torque", self.self_righting_torque),
            ("downforce_per_speed", self.downforce_per_speed),
            ("max_downforce", self.max_downforce),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be >= 0 (got {value})")));
            }
        }

        if self.min_double_jump_ms >= self.max_double_jump_ms {
            return Err(ConfigError::Invalid(format!(
                "double jump window is empty ({}ms..{}ms)",
                self.min_double_jump_ms, self.max_double_jump_ms
            )));
        }

        if self.stuck_up_dot >= self.upright_dot {
            return Err(ConfigError::Invalid(format!(
                "stuck_up_dot ({}) must be below upright_dot ({})",
                self.stuck_up_dot, self.upright_dot
            )));
        }

        Ok(())
    }
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self::ARCADE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub distance: f32,          // m behind the tracked direction
    pub height: f32,            // m above the chassis
    pub look_ahead: f32,        // m ahead of the chassis (vehicle mode)
    pub reverse_dot: f32,       // forward·velocity below this flips the trail direction
    pub reverse_min_speed: f32, // m/s, below this no flip
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 8.0,
            height: 3.0,
            look_ahead: 4.0,
            reverse_dot: -0.7,
            reverse_min_speed: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub tick_hz: u32,
    pub ball_radius: f32,
    pub ball_spawn: [f32; 3],
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9001".to_string(),
            tick_hz: 60,
            ball_radius: 1.0,
            ball_spawn: [0.0, 3.0, -15.0],
        }
    }
}

impl ServerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_hz.max(1) as f64)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub vehicle: VehicleConfig,
    pub camera: CameraConfig,
    pub bindings: KeyBindings,
}

impl AppConfig {
    /// Load from a JSON file, or fall back to built-in defaults when no path
    /// is given. The result is always validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_json(&text)?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.vehicle.validate()?;
        if self.server.tick_hz == 0 {
            return Err(ConfigError::Invalid("server.tick_hz must be > 0".into()));
        }
        if self.camera.distance < 0.0 {
            return Err(ConfigError::Invalid("camera.distance must be >= 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arcade_preset_is_valid() {
        assert!(VehicleConfig::ARCADE.validate().is_ok());
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config = AppConfig::from_json(
            r#"{ "vehicle": { "max_engine_force": 900.0 }, "server": { "tick_hz": 120 } }"#,
        )
        .unwrap();

        assert_eq!(config.vehicle.max_engine_force, 900.0);
        assert_eq!(config.vehicle.max_steer_value, VehicleConfig::ARCADE.max_steer_value);
        assert_eq!(config.server.tick_hz, 120);
        assert_eq!(config.server.bind_addr, "0.0.0.0:9001");
    }

    #[test]
    fn empty_double_jump_window_is_rejected() {
        let mut vehicle = VehicleConfig::ARCADE;
        vehicle.min_double_jump_ms = 1500;
        vehicle.max_double_jump_ms = 1500;
        assert!(matches!(vehicle.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn negative_force_is_rejected() {
        let mut vehicle = VehicleConfig::ARCADE;
        vehicle.flip_torque = -1.0;
        assert!(matches!(vehicle.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn millisecond_fields_map_to_durations() {
        let v = VehicleConfig::ARCADE;
        assert_eq!(v.max_jump_duration(), Duration::from_millis(200));
        assert_eq!(v.self_righting_delay(), Duration::from_millis(250));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AppConfig::load(Some(Path::new("/definitely/not/here.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
