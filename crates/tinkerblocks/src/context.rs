//! Mutable state owned by one program execution.
//!
//! The context tracks the car's logical position and heading, program
//! variables, pen and path state, and the step budget. It owns exclusive
//! borrows of the hardware interface and message sink for the duration of
//! the run; nothing else mutates it. Hardware failures are reported as
//! warnings and never abort the program.

use std::{
    borrow::Cow,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use indexmap::IndexMap;

use crate::{
    config::EngineConfig,
    hardware::{DEFAULT_OBSTACLE_THRESHOLD_CM, HardwareInterface},
    io::MessageSink,
    types::{Direction, GridPosition, LogLevel, Position, SensorKind},
    value::{Evaluated, fmt_number},
};

/// Shared cancellation flag, set by the host to stop a running execution.
///
/// The engine checks the token before each command, at the end of every loop
/// iteration, and between the polling slices of a `WAIT`, so cancellation
/// takes effect promptly even inside tight loops or long waits. There is no
/// rollback: in-progress hardware calls are not compensated.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A value stored in a program variable.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Number(f64),
    Boolean(bool),
}

impl From<f64> for VarValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for VarValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", fmt_number(*n)),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Fatal runtime conditions. Anything else the engine can recover from.
#[derive(Debug, Clone)]
pub enum ExecError {
    /// The step budget was exhausted; the counter ends one past the limit.
    StepLimit { limit: u64 },
    /// Division by zero in an expression.
    DivisionByZero,
    /// A value could not be coerced to the required numeric type.
    Conversion { value: String },
    /// An operand or argument had the wrong type.
    Type { msg: Cow<'static, str> },
    /// An `ELSE` marker reached the executor; the parser must absorb these.
    ElseExecuted { position: GridPosition },
    /// The host cancelled the execution.
    Cancelled,
}

impl ExecError {
    pub(crate) fn type_error(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Type { msg: msg.into() }
    }

    /// True if this error is a host cancellation rather than a program fault.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StepLimit { limit } => write!(f, "maximum steps ({limit}) exceeded"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::Conversion { value } => write!(f, "cannot convert '{value}' to a number"),
            Self::Type { msg } => write!(f, "{msg}"),
            Self::ElseExecuted { position } => {
                write!(f, "ELSE command executed directly at {position}")
            }
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for ExecError {}

/// Granularity of the cancellation poll inside a `WAIT`.
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Execution state for one run of a program.
pub struct ExecutionContext<'a> {
    pub position: Position,
    pub heading: Direction,
    pub pen_down: bool,
    /// Segment endpoints drawn while the pen was down, plus the seed point
    /// recorded when the pen is lowered.
    pub path: Vec<Position>,
    pub steps_executed: u64,
    pub max_steps: u64,

    variables: IndexMap<String, VarValue>,
    scale_cm_per_unit: f64,
    hardware: &'a mut dyn HardwareInterface,
    sink: &'a mut dyn MessageSink,
    cancel: CancelToken,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        hardware: &'a mut dyn HardwareInterface,
        sink: &'a mut dyn MessageSink,
        cancel: CancelToken,
        config: &EngineConfig,
    ) -> Self {
        Self {
            position: Position::default(),
            heading: Direction::Forward,
            pen_down: false,
            path: Vec::new(),
            steps_executed: 0,
            max_steps: config.max_steps,
            variables: IndexMap::new(),
            scale_cm_per_unit: config.scale_cm_per_unit,
            hardware,
            sink,
            cancel,
        }
    }

    /// Sends a message to the host through the sink.
    pub fn send(&mut self, text: &str, level: LogLevel) {
        self.sink.send(text, level);
    }

    /// Errors with [`ExecError::Cancelled`] if the host requested a stop.
    pub fn check_cancelled(&self) -> Result<(), ExecError> {
        if self.cancel.is_cancelled() {
            Err(ExecError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Bumps the step counter, failing once the budget is exhausted.
    ///
    /// Every operation that advances real-world state or completes an
    /// assignment counts as one step. The counter may end at `max_steps + 1`:
    /// the step that trips the limit is itself counted.
    pub fn increment_steps(&mut self) -> Result<(), ExecError> {
        self.steps_executed += 1;
        if self.steps_executed > self.max_steps {
            Err(ExecError::StepLimit {
                limit: self.max_steps,
            })
        } else {
            Ok(())
        }
    }

    /// Moves the car by `distance` logical units along the current heading.
    ///
    /// The hardware sees the distance scaled to centimetres. Position
    /// tracking updates whether or not the hardware succeeded; a failed call
    /// is reported as a warning.
    pub fn move_by(&mut self, distance: f64) -> Result<(), ExecError> {
        let distance_cm = distance * self.scale_cm_per_unit;
        if !self.hardware.move_distance(distance_cm) {
            self.send(
                &format!("hardware movement failed for distance {distance_cm}cm"),
                LogLevel::Warning,
            );
        }

        let (dx, dy) = self.heading.unit_vector();
        let new_position = Position::new(
            self.position.x + dx * distance,
            self.position.y + dy * distance,
        );
        if self.pen_down {
            self.path.push(self.position);
            self.path.push(new_position);
        }
        self.position = new_position;
        self.increment_steps()
    }

    /// Rotates the car by `degrees` (right positive, left negative) and
    /// snaps the tracked heading to the nearest cardinal.
    pub fn turn_by(&mut self, degrees: f64) -> Result<(), ExecError> {
        if !self.hardware.rotate_degrees(degrees) {
            self.send(
                &format!("hardware rotation failed for {degrees} degrees"),
                LogLevel::Warning,
            );
        }

        // Interpret the rotation mod 360 into (-180, 180], then combine with
        // the current heading and snap.
        let mut delta = degrees.rem_euclid(360.0);
        if delta > 180.0 {
            delta -= 360.0;
        }
        let new_heading = (self.heading.heading_degrees() + delta).rem_euclid(360.0);
        self.heading = Direction::from_heading_degrees(new_heading);
        self.increment_steps()
    }

    /// Lowers or raises the pen. Lowering seeds the path with the current
    /// position when it differs from the last recorded point.
    pub fn set_pen(&mut self, down: bool) -> Result<(), ExecError> {
        if !self.hardware.set_pen_down(down) {
            self.send("hardware pen control failed", LogLevel::Warning);
        }
        self.pen_down = down;
        if down && self.path.last() != Some(&self.position) {
            self.path.push(self.position);
        }
        self.increment_steps()
    }

    /// Turns the buzzer on or off.
    pub fn set_buzzer(&mut self, on: bool) -> Result<(), ExecError> {
        if !self.hardware.control_buzzer(on) {
            self.send("hardware buzzer control failed", LogLevel::Warning);
        }
        self.increment_steps()
    }

    /// Suspends for `seconds`, polling the cancel token every 100 ms.
    pub fn wait(&mut self, seconds: f64) -> Result<(), ExecError> {
        let duration = Duration::try_from_secs_f64(seconds).map_err(|_| {
            ExecError::type_error(format!("wait time must be a finite number of seconds, got {seconds}"))
        })?;
        let deadline = Instant::now().checked_add(duration).ok_or_else(|| {
            ExecError::type_error(format!("wait time out of range: {seconds}"))
        })?;
        loop {
            self.check_cancelled()?;
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(WAIT_SLICE.min(deadline - now));
        }
        self.increment_steps()
    }

    /// Stores a variable under its upper-cased name.
    pub fn set_variable(&mut self, name: &str, value: VarValue) -> Result<(), ExecError> {
        let name = name.to_uppercase();
        let old = self.variables.insert(name.clone(), value);
        match old {
            Some(old) => self.send(&format!("variable {name}: {old} -> {value}"), LogLevel::Debug),
            None => self.send(&format!("variable {name} = {value} (new)"), LogLevel::Debug),
        }
        self.increment_steps()
    }

    /// Reads a variable, defaulting to `0` when unset.
    #[must_use]
    pub fn variable(&self, name: &str) -> VarValue {
        self.variables
            .get(&name.to_uppercase())
            .copied()
            .unwrap_or(VarValue::Number(0.0))
    }

    /// All variables in insertion order.
    #[must_use]
    pub fn variables(&self) -> &IndexMap<String, VarValue> {
        &self.variables
    }

    /// Reads a sensor through the hardware interface.
    ///
    /// `Distance` yields a number; the other kinds yield booleans.
    /// `BlackLost` is the negation of the IR reading. Failures are handled
    /// inside the hardware implementation via its documented fallbacks.
    pub fn sensor_value(&mut self, kind: SensorKind) -> Evaluated {
        let value = match kind {
            SensorKind::Distance => Evaluated::Number(self.hardware.distance_cm()),
            SensorKind::Obstacle => Evaluated::Boolean(
                self.hardware
                    .is_obstacle_detected(DEFAULT_OBSTACLE_THRESHOLD_CM),
            ),
            SensorKind::BlackDetected => Evaluated::Boolean(self.hardware.is_black_detected()),
            SensorKind::BlackLost => Evaluated::Boolean(!self.hardware.is_black_detected()),
        };
        self.send(&format!("sensor {kind} reading: {value}"), LogLevel::Debug);
        value
    }
}
