//! The expression/value model.
//!
//! A [`Value`] is an expression-tree node: a literal, a variable or sensor
//! reference, a direction keyword, or an operator application. Evaluation
//! walks the tree against the execution context and produces an
//! [`Evaluated`] result: a number, a boolean, or (for the non-turn
//! directions) a text keyword.

use std::{borrow::Cow, fmt};

use crate::{
    context::{ExecError, ExecutionContext, VarValue},
    types::{Direction, SensorKind},
};

/// Binary and unary operators, in precedence groups.
///
/// Precedence is lowest-first: logical, then comparison, then arithmetic,
/// with unary `NOT` binding tightest. There are no parentheses in this
/// grammar; the grid's tokenisation already linearises expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    // Logical
    And,
    Or,
    Not,

    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    /// The operator's surface spelling.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An expression-tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Numeric literal; integers and floats are merged at this layer.
    Number(f64),
    Boolean(bool),
    /// Variable reference; the name is stored upper-cased and an unset
    /// variable reads as `0`.
    Variable(String),
    /// Sensor probe, read through the hardware interface at evaluation time.
    Sensor(SensorKind),
    /// Direction keyword. `LEFT`/`RIGHT` evaluate to ∓90/±90 for turns;
    /// the others evaluate to their keyword text.
    Direction(Direction),
    /// Operator application; `right` is `None` only for unary `NOT`.
    Expression {
        left: Box<Value>,
        op: Operator,
        right: Option<Box<Value>>,
    },
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&fmt_number(*n)),
            Self::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::Variable(name) => f.write_str(name),
            Self::Sensor(kind) => write!(f, "{}", kind.to_string().to_uppercase()),
            Self::Direction(dir) => f.write_str(dir.keyword()),
            Self::Expression { left, op, right } => match right {
                Some(right) => write!(f, "{left} {op} {right}"),
                None => write!(f, "{op} {left}"),
            },
        }
    }
}

/// The result of evaluating a [`Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Number(f64),
    Boolean(bool),
    Text(Cow<'static, str>),
}

impl Evaluated {
    /// Coerces to a number: booleans become 0/1 and text is parsed as a
    /// float; unparseable text is a conversion error.
    pub fn as_number(&self) -> Result<f64, ExecError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => s.parse::<f64>().map_err(|_| ExecError::Conversion {
                value: s.to_string(),
            }),
        }
    }

    /// Truthiness: non-zero numbers, non-empty text, and `true`.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0.0,
            Self::Boolean(b) => *b,
            Self::Text(s) => !s.is_empty(),
        }
    }
}

impl From<VarValue> for Evaluated {
    fn from(value: VarValue) -> Self {
        match value {
            VarValue::Number(n) => Self::Number(n),
            VarValue::Boolean(b) => Self::Boolean(b),
        }
    }
}

impl fmt::Display for Evaluated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&fmt_number(*n)),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl Value {
    /// Evaluates this node against the execution context.
    pub fn evaluate(&self, ctx: &mut ExecutionContext<'_>) -> Result<Evaluated, ExecError> {
        match self {
            Self::Number(n) => Ok(Evaluated::Number(*n)),
            Self::Boolean(b) => Ok(Evaluated::Boolean(*b)),
            Self::Variable(name) => Ok(ctx.variable(name).into()),
            Self::Sensor(kind) => Ok(ctx.sensor_value(*kind)),
            Self::Direction(dir) => Ok(match dir {
                Direction::Left | Direction::Right => Evaluated::Number(dir.turn_degrees()),
                Direction::Forward | Direction::Backward => {
                    Evaluated::Text(Cow::Borrowed(dir.keyword()))
                }
            }),
            Self::Expression { left, op, right } => evaluate_expression(ctx, left, *op, right.as_deref()),
        }
    }
}

fn evaluate_expression(
    ctx: &mut ExecutionContext<'_>,
    left: &Value,
    op: Operator,
    right: Option<&Value>,
) -> Result<Evaluated, ExecError> {
    let left_val = left.evaluate(ctx)?;

    if op == Operator::Not {
        return Ok(Evaluated::Boolean(!left_val.truthy()));
    }

    let Some(right) = right else {
        return Err(ExecError::type_error(format!(
            "binary operator {op} requires a right operand"
        )));
    };
    let right_val = right.evaluate(ctx)?;

    let result = match op {
        Operator::Add | Operator::Sub | Operator::Mul | Operator::Div => {
            let l = left_val.as_number()?;
            let r = right_val.as_number()?;
            Evaluated::Number(match op {
                Operator::Add => l + r,
                Operator::Sub => l - r,
                Operator::Mul => l * r,
                Operator::Div => {
                    if r == 0.0 {
                        return Err(ExecError::DivisionByZero);
                    }
                    l / r
                }
                _ => unreachable!(),
            })
        }
        Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
            let l = left_val.as_number()?;
            let r = right_val.as_number()?;
            Evaluated::Boolean(match op {
                Operator::Lt => l < r,
                Operator::Le => l <= r,
                Operator::Gt => l > r,
                Operator::Ge => l >= r,
                _ => unreachable!(),
            })
        }
        // Equality compares the raw evaluated values with no coercion:
        // values of different kinds are simply unequal.
        Operator::Eq => Evaluated::Boolean(left_val == right_val),
        Operator::Ne => Evaluated::Boolean(left_val != right_val),
        Operator::And => Evaluated::Boolean(left_val.truthy() && right_val.truthy()),
        Operator::Or => Evaluated::Boolean(left_val.truthy() || right_val.truthy()),
        Operator::Not => unreachable!(),
    };
    Ok(result)
}

/// Formats a number the way it appears on a block: integral values without
/// a trailing `.0`.
#[must_use]
pub fn fmt_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}
