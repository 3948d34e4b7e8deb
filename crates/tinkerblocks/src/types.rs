use std::fmt;

/// A program grid as produced by the recognition pipeline: rows of text cells.
///
/// Rows may differ in length; missing cells are treated as empty. A cell is
/// empty iff its trimmed text is empty.
pub type Grid = Vec<Vec<String>>;

/// Position of a cell in the grid, attached to every command for diagnostics.
///
/// The column of the leading non-empty cell of a row is that row's
/// indentation level, which drives block nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct GridPosition {
    pub row: usize,
    pub col: usize,
}

impl GridPosition {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Indentation level of a row starting at this position.
    #[must_use]
    pub const fn indentation_level(&self) -> usize {
        self.col
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// 2D position in the car's logical coordinate system.
///
/// One logical unit corresponds to `EngineConfig::scale_cm_per_unit`
/// centimetres of real-world travel.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal heading of the car.
///
/// The heading is always one of the four cardinals; rotations that land
/// elsewhere snap to the nearest cardinal (see [`Direction::from_heading_degrees`]).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, serde::Serialize, serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    /// Parses a direction keyword, case-insensitively.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "FORWARD" => Some(Self::Forward),
            "BACKWARD" => Some(Self::Backward),
            "LEFT" => Some(Self::Left),
            "RIGHT" => Some(Self::Right),
            _ => None,
        }
    }

    /// The uppercase keyword for this direction, as it appears on a block.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Forward => "FORWARD",
            Self::Backward => "BACKWARD",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }

    /// Rotation in signed degrees when this direction is used as a turn
    /// argument: right is positive, left is negative.
    #[must_use]
    pub const fn turn_degrees(&self) -> f64 {
        match self {
            Self::Left => -90.0,
            Self::Right => 90.0,
            Self::Backward => 180.0,
            Self::Forward => 0.0,
        }
    }

    /// Absolute heading angle with `Forward` at 0° and clockwise positive.
    #[must_use]
    pub const fn heading_degrees(&self) -> f64 {
        match self {
            Self::Forward => 0.0,
            Self::Right => 90.0,
            Self::Backward => 180.0,
            Self::Left => 270.0,
        }
    }

    /// Unit vector of travel for this heading in the logical plane.
    #[must_use]
    pub const fn unit_vector(&self) -> (f64, f64) {
        match self {
            Self::Forward => (0.0, 1.0),
            Self::Backward => (0.0, -1.0),
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
        }
    }

    /// Snaps an absolute heading angle in `[0, 360)` to the nearest cardinal.
    ///
    /// Bands: `[315, 360) ∪ [0, 45)` → forward, `[45, 135)` → right,
    /// `[135, 225)` → backward, `[225, 315)` → left.
    #[must_use]
    pub fn from_heading_degrees(degrees: f64) -> Self {
        let degrees = degrees.rem_euclid(360.0);
        if !(45.0..315.0).contains(&degrees) {
            Self::Forward
        } else if degrees < 135.0 {
            Self::Right
        } else if degrees < 225.0 {
            Self::Backward
        } else {
            Self::Left
        }
    }
}

/// The sensor probes a program can read through the hardware interface.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, serde::Serialize, serde::Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Ultrasonic distance reading in centimetres.
    Distance,
    /// Whether an obstacle sits within the configured threshold.
    Obstacle,
    /// Whether the IR sensor currently sees a black surface.
    BlackDetected,
    /// Negation of [`SensorKind::BlackDetected`].
    BlackLost,
}

impl SensorKind {
    /// Parses a sensor keyword, case-insensitively.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "DISTANCE" => Some(Self::Distance),
            "OBSTACLE" => Some(Self::Obstacle),
            "BLACK_DETECTED" => Some(Self::BlackDetected),
            "BLACK_LOST" => Some(Self::BlackLost),
            _ => None,
        }
    }
}

/// Severity levels for messages delivered through a [`MessageSink`](crate::io::MessageSink).
///
/// `Debug` is a developer channel and is suppressed from user-facing sinks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, serde::Serialize, serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Success,
    Warning,
    Error,
    Assistant,
}
