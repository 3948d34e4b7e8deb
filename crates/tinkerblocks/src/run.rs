//! Top-level driver: validate the grid, parse it, execute the command tree
//! and report a structured result.

use indexmap::IndexMap;

use crate::{
    command::{Command, CommandKind},
    config::EngineConfig,
    context::{CancelToken, ExecError, ExecutionContext, VarValue},
    hardware::HardwareInterface,
    io::MessageSink,
    parse::{GridParser, ParserContext},
    types::{Direction, Grid, LogLevel, Position},
};

/// Snapshot of the execution context when a run ends.
///
/// Best-effort on failure: it reflects whatever state the run reached, and
/// is zeroed when the error prevented execution altogether.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct FinalState {
    pub position: Position,
    pub direction: Direction,
    pub variables: IndexMap<String, VarValue>,
    pub pen_down: bool,
    pub path: Vec<Position>,
    pub steps_executed: u64,
}

impl FinalState {
    fn capture(ctx: &ExecutionContext<'_>) -> Self {
        Self {
            position: ctx.position,
            direction: ctx.heading,
            variables: ctx.variables().clone(),
            pen_down: ctx.pen_down,
            path: ctx.path.clone(),
            steps_executed: ctx.steps_executed,
        }
    }
}

/// Structured result of one workflow run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunReport {
    pub success: bool,
    pub error: Option<String>,
    pub final_state: FinalState,
    /// Number of top-level commands, present only on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commands_parsed: Option<usize>,
}

impl RunReport {
    fn succeeded(final_state: FinalState, commands_parsed: usize) -> Self {
        Self {
            success: true,
            error: None,
            final_state,
            commands_parsed: Some(commands_parsed),
        }
    }

    fn failed(error: impl Into<String>, final_state: FinalState) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            final_state,
            commands_parsed: None,
        }
    }

    /// True if the run ended because the host cancelled it.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.error.as_deref() == Some("cancelled")
    }
}

/// Executes command trees against a hardware interface and message sink.
pub struct Executor<'a> {
    sink: &'a mut dyn MessageSink,
    hardware: &'a mut dyn HardwareInterface,
    cancel: CancelToken,
    config: EngineConfig,
}

impl<'a> Executor<'a> {
    pub fn new(
        sink: &'a mut dyn MessageSink,
        hardware: &'a mut dyn HardwareInterface,
        cancel: CancelToken,
        config: EngineConfig,
    ) -> Self {
        Self {
            sink,
            hardware,
            cancel,
            config,
        }
    }

    /// Executes commands in order against a fresh context.
    ///
    /// Always returns the final state the run reached, alongside the
    /// execution outcome.
    pub fn execute(&mut self, commands: &[Command]) -> (FinalState, Result<(), ExecError>) {
        let mut ctx = ExecutionContext::new(
            &mut *self.hardware,
            &mut *self.sink,
            self.cancel.clone(),
            &self.config,
        );
        let mut outcome = Ok(());
        for command in commands {
            if let Err(err) = command.execute(&mut ctx) {
                outcome = Err(err);
                break;
            }
        }
        (FinalState::capture(&ctx), outcome)
    }

    /// Executes a single command; a convenience for unit-style callers.
    pub fn execute_single(&mut self, command: &Command) -> (FinalState, Result<(), ExecError>) {
        self.execute(std::slice::from_ref(command))
    }
}

/// Runs the full workflow: validate, preprocess and parse the grid, execute
/// the program, and report the outcome.
///
/// An empty cell grid (no rows) is invalid input; an all-blank grid is a
/// successful no-op. Parse and runtime failures end the workflow with
/// `success = false` and a best-effort final state.
pub fn engine_workflow(
    grid: &Grid,
    parser: &ParserContext,
    sink: &mut dyn MessageSink,
    hardware: &mut dyn HardwareInterface,
    cancel: CancelToken,
    config: &EngineConfig,
) -> RunReport {
    if grid.is_empty() {
        sink.send("no grid data provided", LogLevel::Error);
        return RunReport::failed("no grid data provided", FinalState::default());
    }

    let is_blank = grid
        .iter()
        .all(|row| row.iter().all(|cell| cell.trim().is_empty()));
    if is_blank {
        sink.send("grid is empty - no commands to execute", LogLevel::Info);
        return RunReport::succeeded(FinalState::default(), 0);
    }

    let grid_parser = GridParser::new(grid, parser);
    sink.send("grid contents:", LogLevel::Debug);
    for (i, row) in grid_parser.grid().iter().enumerate() {
        let row_text: Vec<&str> = row
            .iter()
            .take(config.grid_cols)
            .map(|cell| if cell.trim().is_empty() { "___" } else { cell })
            .collect();
        sink.send(&format!("row {i:2}: {}", row_text.join(" | ")), LogLevel::Debug);
    }

    sink.send("parsing grid into commands...", LogLevel::Info);
    let commands = match grid_parser.parse() {
        Ok(commands) => commands,
        Err(err) => {
            sink.send(&format!("parse error: {err}"), LogLevel::Error);
            return RunReport::failed(err.to_string(), FinalState::default());
        }
    };
    sink.send(
        &format!("parsed {} top-level commands", commands.len()),
        LogLevel::Success,
    );
    for command in &commands {
        describe_tree(command, sink, 0);
    }

    sink.send("executing commands...", LogLevel::Info);
    let mut executor = Executor::new(sink, hardware, cancel, config.clone());
    let (final_state, outcome) = executor.execute(&commands);

    match outcome {
        Ok(()) => {
            sink.send("execution complete", LogLevel::Success);
            sink.send(
                &format!("total steps executed: {}", final_state.steps_executed),
                LogLevel::Info,
            );
            sink.send(
                &format!("final position: {}", final_state.position),
                LogLevel::Info,
            );
            sink.send(
                &format!("final direction: {}", final_state.direction),
                LogLevel::Info,
            );
            for (name, value) in &final_state.variables {
                sink.send(&format!("  {name} = {value}"), LogLevel::Debug);
            }
            if !final_state.path.is_empty() {
                sink.send(
                    &format!("drew path with {} points", final_state.path.len()),
                    LogLevel::Info,
                );
            }
            RunReport::succeeded(final_state, commands.len())
        }
        Err(err) if err.is_cancelled() => {
            sink.send("execution cancelled", LogLevel::Warning);
            RunReport::failed("cancelled", final_state)
        }
        Err(err) => {
            sink.send(&format!("error: {err}"), LogLevel::Error);
            RunReport::failed(err.to_string(), final_state)
        }
    }
}

fn describe_tree(command: &Command, sink: &mut dyn MessageSink, depth: usize) {
    let indent = "  ".repeat(depth + 1);
    sink.send(&format!("{indent}{command}"), LogLevel::Debug);
    match &command.kind {
        CommandKind::Loop { body, .. } | CommandKind::While { body, .. } => {
            for nested in body {
                describe_tree(nested, sink, depth + 1);
            }
        }
        CommandKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            for nested in then_branch {
                describe_tree(nested, sink, depth + 1);
            }
            if !else_branch.is_empty() {
                sink.send(&format!("{indent}ELSE:"), LogLevel::Debug);
                for nested in else_branch {
                    describe_tree(nested, sink, depth + 1);
                }
            }
        }
        _ => {}
    }
}
