//! The command set: argument parsing and execution for every block type.
//!
//! Commands form a tagged sum type with owned child vectors; the tree is
//! immutable after parsing and executed by pattern matching. Registration is
//! by one or more case-insensitive names in [`CommandRegistry`].

use std::fmt;

use ahash::AHashMap;

use crate::{
    context::{ExecError, ExecutionContext, VarValue},
    expr::parse_expression,
    parse::ParseError,
    types::{Direction, GridPosition, LogLevel},
    value::{Evaluated, Value},
};

/// Default `MOVE` distance: a sentinel meaning "until externally stopped".
/// The hardware treats it as "move until obstacle" when its obstacle check
/// is enabled.
pub const MOVE_UNTIL_STOPPED: f64 = 999.0;

/// An executable node in the program tree, with the grid cell it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub position: GridPosition,
    pub kind: CommandKind,
}

/// The command variants. Only control-flow variants own nested commands.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    /// Move by a distance in logical units; negative is backward.
    Move { distance: Value },
    /// Rotate; the rotation resolves to signed degrees or `LEFT`/`RIGHT`.
    Turn { rotation: Value },
    /// Repeat the body `count` times; `TRUE` is unbounded (within the step
    /// budget) and `FALSE` is zero iterations.
    Loop { count: Value, body: Vec<Command> },
    /// Repeat the body while the condition is truthy, re-evaluating before
    /// each iteration.
    While { condition: Value, body: Vec<Command> },
    If {
        condition: Value,
        then_branch: Vec<Command>,
        else_branch: Vec<Command>,
    },
    /// Assign an expression result to a variable (name stored upper-cased).
    Set { name: String, expr: Value },
    PenUp,
    PenDown,
    /// Suspend for a number of seconds, staying cancellable throughout.
    Wait { seconds: Value },
    AlertOn,
    AlertOff,
    /// Parser-only marker; never appears in a built tree.
    Else,
}

impl CommandKind {
    /// The canonical keyword for this command.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Move { .. } => "MOVE",
            Self::Turn { .. } => "TURN",
            Self::Loop { .. } => "LOOP",
            Self::While { .. } => "WHILE",
            Self::If { .. } => "IF",
            Self::Set { .. } => "SET",
            Self::PenUp => "PEN_UP",
            Self::PenDown => "PEN_DOWN",
            Self::Wait { .. } => "WAIT",
            Self::AlertOn => "ALERT_ON",
            Self::AlertOff => "ALERT_OFF",
            Self::Else => "ELSE",
        }
    }

    /// Nested command list for control-flow variants (`If` yields the then
    /// branch, which is where the parser routes plain nesting).
    pub(crate) fn body_mut(&mut self) -> Option<&mut Vec<Command>> {
        match self {
            Self::Loop { body, .. } | Self::While { body, .. } => Some(body),
            Self::If { then_branch, .. } => Some(then_branch),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CommandKind::Move { distance } => write!(f, "Move({distance})"),
            CommandKind::Turn { rotation } => write!(f, "Turn({rotation})"),
            CommandKind::Loop { count, body } => {
                write!(f, "Loop({count}, {} commands)", body.len())
            }
            CommandKind::While { condition, body } => {
                write!(f, "While({condition}, {} commands)", body.len())
            }
            CommandKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "If({condition}, {} commands", then_branch.len())?;
                if !else_branch.is_empty() {
                    write!(f, ", {} else commands", else_branch.len())?;
                }
                write!(f, ")")
            }
            CommandKind::Set { name, expr } => write!(f, "Set({name} = {expr})"),
            CommandKind::Wait { seconds } => write!(f, "Wait({seconds})"),
            CommandKind::PenUp
            | CommandKind::PenDown
            | CommandKind::AlertOn
            | CommandKind::AlertOff
            | CommandKind::Else => f.write_str(self.kind.keyword()),
        }
    }
}

impl Command {
    /// Executes this command against the context.
    ///
    /// Every execution starts with a cancellation check and a debug trace
    /// naming the command and its grid position.
    pub fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<(), ExecError> {
        ctx.check_cancelled()?;
        ctx.send(
            &format!("executing {} at {}", self.kind.keyword(), self.position),
            LogLevel::Debug,
        );

        match &self.kind {
            CommandKind::Move { distance } => match distance.evaluate(ctx)? {
                Evaluated::Number(n) => ctx.move_by(n),
                other => Err(ExecError::type_error(format!(
                    "move distance must be a number, got {other}"
                ))),
            },
            CommandKind::Turn { rotation } => match rotation.evaluate(ctx)? {
                Evaluated::Number(degrees) => ctx.turn_by(degrees),
                Evaluated::Text(s) if s.eq_ignore_ascii_case("LEFT") => ctx.turn_by(-90.0),
                Evaluated::Text(s) if s.eq_ignore_ascii_case("RIGHT") => ctx.turn_by(90.0),
                other => Err(ExecError::type_error(format!(
                    "turn requires degrees or LEFT/RIGHT, got {other}"
                ))),
            },
            CommandKind::Loop { count, body } => match count.evaluate(ctx)? {
                Evaluated::Boolean(true) => loop {
                    for command in body {
                        command.execute(ctx)?;
                    }
                    // Iteration boundary: admit cancellation in tight bodies.
                    ctx.check_cancelled()?;
                },
                Evaluated::Boolean(false) => Ok(()),
                Evaluated::Number(n) => {
                    let iterations = n as i64;
                    for _ in 0..iterations.max(0) {
                        for command in body {
                            command.execute(ctx)?;
                        }
                        ctx.check_cancelled()?;
                    }
                    Ok(())
                }
                other @ Evaluated::Text(_) => Err(ExecError::type_error(format!(
                    "loop count must be a number or boolean, got {other}"
                ))),
            },
            CommandKind::While { condition, body } => loop {
                if !condition.evaluate(ctx)?.truthy() {
                    break Ok(());
                }
                for command in body {
                    command.execute(ctx)?;
                }
                ctx.check_cancelled()?;
            },
            CommandKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let branch = if condition.evaluate(ctx)?.truthy() {
                    then_branch
                } else {
                    else_branch
                };
                for command in branch {
                    command.execute(ctx)?;
                }
                Ok(())
            }
            CommandKind::Set { name, expr } => {
                let value = match expr.evaluate(ctx)? {
                    Evaluated::Number(n) => VarValue::Number(n),
                    Evaluated::Boolean(b) => VarValue::Boolean(b),
                    // Text results are coerced: parse as a number where
                    // possible, otherwise truthy keywords become booleans.
                    Evaluated::Text(s) => match s.parse::<f64>() {
                        Ok(n) => VarValue::Number(n),
                        Err(_) => VarValue::Boolean(matches!(
                            s.to_ascii_uppercase().as_str(),
                            "TRUE" | "YES" | "1"
                        )),
                    },
                };
                ctx.set_variable(name, value)
            }
            CommandKind::PenUp => ctx.set_pen(false),
            CommandKind::PenDown => ctx.set_pen(true),
            CommandKind::Wait { seconds } => match seconds.evaluate(ctx)? {
                Evaluated::Number(n) if n >= 0.0 => {
                    ctx.send(&format!("waiting for {n} seconds"), LogLevel::Info);
                    ctx.wait(n)
                }
                Evaluated::Number(n) => Err(ExecError::type_error(format!(
                    "wait time must be positive, got {n}"
                ))),
                other => Err(ExecError::type_error(format!(
                    "wait time must be a number, got {other}"
                ))),
            },
            CommandKind::AlertOn => ctx.set_buzzer(true),
            CommandKind::AlertOff => ctx.set_buzzer(false),
            CommandKind::Else => Err(ExecError::ElseExecuted {
                position: self.position,
            }),
        }
    }
}

/// Identifies a command type in the registry, before arguments are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Move,
    Turn,
    Loop,
    While,
    If,
    Else,
    Set,
    PenUp,
    PenDown,
    Wait,
    AlertOn,
    AlertOff,
}

impl CommandName {
    /// All registered spellings for this command.
    #[must_use]
    pub const fn names(&self) -> &'static [&'static str] {
        match self {
            Self::Move => &["MOVE"],
            Self::Turn => &["TURN"],
            Self::Loop => &["LOOP", "REPEAT", "FOR"],
            Self::While => &["WHILE"],
            Self::If => &["IF"],
            Self::Else => &["ELSE"],
            Self::Set => &["SET", "ASSIGN", "LET"],
            Self::PenUp => &["PEN_UP", "PENUP", "UP"],
            Self::PenDown => &["PEN_DOWN", "PENDOWN", "DOWN"],
            Self::Wait => &["WAIT", "PAUSE", "SLEEP", "DELAY"],
            Self::AlertOn => &["ALERT_ON"],
            Self::AlertOff => &["ALERT_OFF"],
        }
    }

    /// Parses this command's argument tokens and builds the command.
    ///
    /// Tokens are the trimmed, non-empty cells following the command name in
    /// its row. Control-flow bodies start empty; the grid parser fills them.
    pub fn build(self, tokens: &[&str], position: GridPosition) -> Result<Command, ParseError> {
        let kind = match self {
            Self::Move => {
                if tokens.is_empty() {
                    CommandKind::Move {
                        distance: Value::Number(MOVE_UNTIL_STOPPED),
                    }
                } else {
                    CommandKind::Move {
                        distance: parse_expression(tokens).ok_or_else(|| {
                            ParseError::bad_arguments(
                                format!("invalid move distance: {}", tokens.join(" ")),
                                position,
                            )
                        })?,
                    }
                }
            }
            Self::Turn => CommandKind::Turn {
                rotation: parse_turn_rotation(tokens, position)?,
            },
            Self::Loop => {
                if tokens.is_empty() {
                    return Err(ParseError::bad_arguments("LOOP requires a count", position));
                }
                CommandKind::Loop {
                    count: parse_expression(tokens).ok_or_else(|| {
                        ParseError::bad_arguments(
                            format!("invalid loop count: {}", tokens.join(" ")),
                            position,
                        )
                    })?,
                    body: Vec::new(),
                }
            }
            Self::While => CommandKind::While {
                condition: parse_condition("WHILE", tokens, position)?,
                body: Vec::new(),
            },
            Self::If => CommandKind::If {
                condition: parse_condition("IF", tokens, position)?,
                then_branch: Vec::new(),
                else_branch: Vec::new(),
            },
            Self::Else => {
                require_no_args("ELSE", tokens, position)?;
                CommandKind::Else
            }
            Self::Set => {
                if tokens.len() < 2 {
                    return Err(ParseError::bad_arguments(
                        "SET requires a variable name and a value",
                        position,
                    ));
                }
                CommandKind::Set {
                    name: tokens[0].to_uppercase(),
                    expr: parse_expression(&tokens[1..]).ok_or_else(|| {
                        ParseError::bad_arguments(
                            format!("invalid value expression: {}", tokens[1..].join(" ")),
                            position,
                        )
                    })?,
                }
            }
            Self::PenUp => {
                require_no_args("PEN_UP", tokens, position)?;
                CommandKind::PenUp
            }
            Self::PenDown => {
                require_no_args("PEN_DOWN", tokens, position)?;
                CommandKind::PenDown
            }
            Self::Wait => {
                if tokens.is_empty() {
                    return Err(ParseError::bad_arguments(
                        "WAIT requires a time in seconds",
                        position,
                    ));
                }
                CommandKind::Wait {
                    seconds: parse_expression(tokens).ok_or_else(|| {
                        ParseError::bad_arguments(
                            format!("invalid wait time: {}", tokens.join(" ")),
                            position,
                        )
                    })?,
                }
            }
            Self::AlertOn => {
                require_no_args("ALERT_ON", tokens, position)?;
                CommandKind::AlertOn
            }
            Self::AlertOff => {
                require_no_args("ALERT_OFF", tokens, position)?;
                CommandKind::AlertOff
            }
        };
        Ok(Command { position, kind })
    }
}

/// TURN accepts signed degrees, `LEFT`/`RIGHT`, `LEFT`/`RIGHT` plus degrees
/// (the direction sets the sign), or an arbitrary expression.
fn parse_turn_rotation(tokens: &[&str], position: GridPosition) -> Result<Value, ParseError> {
    let [first, rest @ ..] = tokens else {
        return Err(ParseError::bad_arguments(
            "TURN requires a direction (LEFT or RIGHT) or degrees",
            position,
        ));
    };

    if rest.is_empty()
        && let Ok(degrees) = first.parse::<f64>()
    {
        return Ok(Value::Number(degrees));
    }

    if let Some(dir) = Direction::from_token(first) {
        if !matches!(dir, Direction::Left | Direction::Right) {
            return Err(ParseError::bad_arguments(
                format!("TURN requires LEFT, RIGHT, or degrees, got: {first}"),
                position,
            ));
        }
        return match rest {
            [] => Ok(Value::Direction(dir)),
            [degrees, ..] => {
                let degrees: f64 = degrees.parse().map_err(|_| {
                    ParseError::bad_arguments(
                        format!("invalid degrees value: {degrees}"),
                        position,
                    )
                })?;
                Ok(Value::Number(if dir == Direction::Left {
                    -degrees.abs()
                } else {
                    degrees.abs()
                }))
            }
        };
    }

    parse_expression(tokens).ok_or_else(|| {
        ParseError::bad_arguments(
            format!("invalid turn argument: {}", tokens.join(" ")),
            position,
        )
    })
}

fn parse_condition(
    keyword: &str,
    tokens: &[&str],
    position: GridPosition,
) -> Result<Value, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::bad_arguments(
            format!("{keyword} requires a condition"),
            position,
        ));
    }
    parse_expression(tokens).ok_or_else(|| {
        ParseError::bad_arguments(
            format!("invalid condition: {}", tokens.join(" ")),
            position,
        )
    })
}

fn require_no_args(keyword: &str, tokens: &[&str], position: GridPosition) -> Result<(), ParseError> {
    if tokens.is_empty() {
        Ok(())
    } else {
        Err(ParseError::bad_arguments(
            format!("{keyword} takes no arguments"),
            position,
        ))
    }
}

/// Case-insensitive name → command lookup used by the grid parser.
///
/// The default registry knows every built-in spelling; hosts may register
/// extra spellings at configuration time. Mutation concurrent with parsing
/// must be synchronised externally.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    names: AHashMap<String, CommandName>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        let mut registry = Self {
            names: AHashMap::new(),
        };
        for command in [
            CommandName::Move,
            CommandName::Turn,
            CommandName::Loop,
            CommandName::While,
            CommandName::If,
            CommandName::Else,
            CommandName::Set,
            CommandName::PenUp,
            CommandName::PenDown,
            CommandName::Wait,
            CommandName::AlertOn,
            CommandName::AlertOff,
        ] {
            for name in command.names() {
                registry.register(name, command);
            }
        }
        registry
    }
}

impl CommandRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an additional spelling for a command.
    pub fn register(&mut self, name: &str, command: CommandName) {
        self.names.insert(name.to_uppercase(), command);
    }

    /// Looks up a token as a command name, case-insensitively.
    #[must_use]
    pub fn lookup(&self, token: &str) -> Option<CommandName> {
        self.names.get(&token.to_uppercase()).copied()
    }

    /// True if the token is a registered command name.
    #[must_use]
    pub fn is_command(&self, token: &str) -> bool {
        self.lookup(token).is_some()
    }

    /// All registered spellings, sorted for stable output.
    #[must_use]
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
