//! Token-level expression parsing.
//!
//! Input is the sequence of trimmed, non-empty cell tokens from one grid row
//! after the command keyword has been removed. The parser recursively scans
//! for the lowest-precedence operator, splits there, and recurses on both
//! sides; unary `NOT` applies only when it is the leading token. Splitting
//! happens at the first occurrence within a precedence group, so same-level
//! chains group to the right.

use crate::{
    types::{Direction, SensorKind},
    value::{Operator, Value},
};

/// Parses a token sequence into an expression tree.
///
/// Returns `None` when the tokens do not form a valid expression.
#[must_use]
pub fn parse_expression(tokens: &[&str]) -> Option<Value> {
    let tokens: Vec<&str> = tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    parse_tokens(&tokens)
}

fn parse_tokens(tokens: &[&str]) -> Option<Value> {
    match tokens {
        [] => None,
        [single] => parse_value(single),
        _ => {
            // Logical operators bind loosest, then comparisons, then
            // arithmetic.
            let groups: [fn(&str) -> Option<Operator>; 3] =
                [logical_operator, comparison_operator, arithmetic_operator];
            for group in groups {
                for (i, token) in tokens.iter().enumerate() {
                    let Some(op) = group(token) else { continue };
                    let (Some(left), Some(right)) =
                        (parse_tokens(&tokens[..i]), parse_tokens(&tokens[i + 1..]))
                    else {
                        continue;
                    };
                    return Some(Value::Expression {
                        left: Box::new(left),
                        op,
                        right: Some(Box::new(right)),
                    });
                }
            }

            if tokens[0].eq_ignore_ascii_case("NOT") {
                let operand = parse_tokens(&tokens[1..])?;
                return Some(Value::Expression {
                    left: Box::new(operand),
                    op: Operator::Not,
                    right: None,
                });
            }

            None
        }
    }
}

/// Parses a single token into a literal or reference value.
///
/// Recognition order: numeric literal, `TRUE`/`FALSE`, direction keyword,
/// sensor keyword, then any purely alphabetic token as a variable
/// (upper-cased). Anything else is not a value.
#[must_use]
pub fn parse_value(token: &str) -> Option<Value> {
    if let Ok(n) = token.parse::<f64>() {
        return Some(Value::Number(n));
    }

    let upper = token.to_ascii_uppercase();
    match upper.as_str() {
        "TRUE" => return Some(Value::Boolean(true)),
        "FALSE" => return Some(Value::Boolean(false)),
        _ => {}
    }
    if let Some(dir) = Direction::from_token(token) {
        return Some(Value::Direction(dir));
    }
    if let Some(kind) = SensorKind::from_token(token) {
        return Some(Value::Sensor(kind));
    }
    if !token.is_empty() && token.chars().all(char::is_alphabetic) {
        return Some(Value::Variable(upper));
    }
    None
}

fn logical_operator(token: &str) -> Option<Operator> {
    if token.eq_ignore_ascii_case("AND") {
        Some(Operator::And)
    } else if token.eq_ignore_ascii_case("OR") {
        Some(Operator::Or)
    } else {
        None
    }
}

fn comparison_operator(token: &str) -> Option<Operator> {
    match token {
        "<" => Some(Operator::Lt),
        "<=" => Some(Operator::Le),
        ">" => Some(Operator::Gt),
        ">=" => Some(Operator::Ge),
        "=" | "==" => Some(Operator::Eq),
        "!=" => Some(Operator::Ne),
        _ => None,
    }
}

fn arithmetic_operator(token: &str) -> Option<Operator> {
    match token {
        "+" => Some(Operator::Add),
        "-" => Some(Operator::Sub),
        "*" => Some(Operator::Mul),
        "/" => Some(Operator::Div),
        _ => None,
    }
}
