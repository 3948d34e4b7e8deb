//! The abstract boundary between the interpreter and the physical car.
//!
//! Every call reports success or failure without raising; a failed call is
//! logged as a warning by the caller while internal state tracking continues.
//! Sensor reads return defined fallbacks on failure so a program can always
//! make progress. Implementations are swappable at runtime: [`MockHardware`]
//! here for deterministic tests, [`CarHardware`](crate::client::CarHardware)
//! for the real robot.

/// Default distance threshold for obstacle detection, in centimetres.
pub const DEFAULT_OBSTACLE_THRESHOLD_CM: f64 = 30.0;

/// Distance reported when the ultrasonic sensor cannot be read.
pub const DISTANCE_FALLBACK_CM: f64 = 999.0;

/// Capability set of the robot car.
pub trait HardwareInterface {
    /// Moves the car by `distance_cm`; the sign selects the direction.
    /// Returns true if the movement succeeded.
    fn move_distance(&mut self, distance_cm: f64) -> bool;

    /// Rotates the car by `degrees`; positive is right, negative is left.
    /// Returns true if the rotation succeeded.
    fn rotate_degrees(&mut self, degrees: f64) -> bool;

    /// Lowers (`true`) or raises (`false`) the drawing pen.
    fn set_pen_down(&mut self, down: bool) -> bool;

    /// Ultrasonic distance in centimetres, or [`DISTANCE_FALLBACK_CM`] on failure.
    fn distance_cm(&mut self) -> f64;

    /// Whether an obstacle sits within `threshold_cm`; false on failure.
    fn is_obstacle_detected(&mut self, threshold_cm: f64) -> bool;

    /// Whether the IR sensor sees a black surface; false on failure.
    fn is_black_detected(&mut self) -> bool;

    /// Turns the buzzer on or off.
    fn control_buzzer(&mut self, on: bool) -> bool;
}

/// In-memory hardware for tests: records every movement, rotation and pen
/// change, and serves configurable sensor readings.
///
/// Setting `fail_calls` makes every actuation report failure (state is still
/// recorded), which exercises the engine's hardware-warning path.
#[derive(Debug, Clone)]
pub struct MockHardware {
    /// Distance the ultrasonic sensor will report, in centimetres.
    pub distance_reading: f64,
    /// Whether the IR sensor reports a black surface.
    pub black_surface: bool,
    /// When true, every actuation call returns failure.
    pub fail_calls: bool,

    pub pen_is_down: bool,
    pub buzzer_on: bool,
    pub total_distance_moved: f64,
    pub total_degrees_rotated: f64,
    /// Individual movement distances in call order, in centimetres.
    pub movements: Vec<f64>,
    /// Individual rotations in call order, in signed degrees.
    pub rotations: Vec<f64>,
}

impl Default for MockHardware {
    fn default() -> Self {
        Self {
            distance_reading: 100.0,
            black_surface: false,
            fail_calls: false,
            pen_is_down: false,
            buzzer_on: false,
            total_distance_moved: 0.0,
            total_degrees_rotated: 0.0,
            movements: Vec::new(),
            rotations: Vec::new(),
        }
    }
}

impl MockHardware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears recorded history and actuator state, keeping sensor settings.
    pub fn reset(&mut self) {
        self.pen_is_down = false;
        self.buzzer_on = false;
        self.total_distance_moved = 0.0;
        self.total_degrees_rotated = 0.0;
        self.movements.clear();
        self.rotations.clear();
    }
}

impl HardwareInterface for MockHardware {
    fn move_distance(&mut self, distance_cm: f64) -> bool {
        log::debug!("[mock] moving {distance_cm}cm");
        self.total_distance_moved += distance_cm;
        self.movements.push(distance_cm);
        !self.fail_calls
    }

    fn rotate_degrees(&mut self, degrees: f64) -> bool {
        log::debug!("[mock] rotating {degrees} degrees");
        self.total_degrees_rotated += degrees;
        self.rotations.push(degrees);
        !self.fail_calls
    }

    fn set_pen_down(&mut self, down: bool) -> bool {
        log::debug!("[mock] pen {}", if down { "down" } else { "up" });
        self.pen_is_down = down;
        !self.fail_calls
    }

    fn distance_cm(&mut self) -> f64 {
        self.distance_reading
    }

    fn is_obstacle_detected(&mut self, threshold_cm: f64) -> bool {
        self.distance_reading < threshold_cm
    }

    fn is_black_detected(&mut self) -> bool {
        self.black_surface
    }

    fn control_buzzer(&mut self, on: bool) -> bool {
        log::debug!("[mock] buzzer {}", if on { "on" } else { "off" });
        self.buzzer_on = on;
        !self.fail_calls
    }
}
