//! Execution core for the TinkerBlocks tangible programming board.
//!
//! Physical coloured blocks on a 16×10 board are photographed and recognised
//! into a [`Grid`] of text cells. This crate turns such a grid into a
//! command tree and runs it against a robot car:
//!
//! - [`mappings`]: alias rewriting applied to every cell before parsing.
//! - [`parse`]: the indentation-based grid parser, including `ELSE` binding.
//! - [`value`] / [`expr`]: the expression model and its token-level parser.
//! - [`command`]: the command set (movement, control flow, variables,
//!   drawing, wait, buzzer).
//! - [`context`]: per-run state (position, heading, variables, pen, path,
//!   step budget) and cancellation.
//! - [`hardware`] / [`client`]: the capability boundary to the car, with a
//!   recording mock and a real HTTP RPC implementation.
//! - [`run`]: the workflow driver producing a structured [`RunReport`].
//!
//! Execution is cooperative and single-threaded: commands suspend at
//! hardware calls, wait slices and loop-iteration boundaries, where the
//! host's [`CancelToken`] is honoured.

pub mod client;
pub mod command;
pub mod config;
pub mod context;
pub mod expr;
pub mod hardware;
pub mod io;
pub mod mappings;
pub mod parse;
pub mod run;
pub mod types;
pub mod value;

pub use crate::{
    client::{CarClient, CarHardware, CarResponse},
    command::{Command, CommandKind, CommandName, CommandRegistry, MOVE_UNTIL_STOPPED},
    config::EngineConfig,
    context::{CancelToken, ExecError, ExecutionContext, VarValue},
    expr::{parse_expression, parse_value},
    hardware::{
        DEFAULT_OBSTACLE_THRESHOLD_CM, DISTANCE_FALLBACK_CM, HardwareInterface, MockHardware,
    },
    io::{CollectSink, MessageSink, NullSink, StdoutSink},
    mappings::AliasTable,
    parse::{GridParser, ParseError, ParserContext},
    run::{Executor, FinalState, RunReport, engine_workflow},
    types::{Direction, Grid, GridPosition, LogLevel, Position, SensorKind},
    value::{Evaluated, Operator, Value},
};
