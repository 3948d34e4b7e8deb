//! The grid parser: a rectangular grid of text cells becomes a forest of
//! top-level commands.
//!
//! The grid is read top-to-bottom, left-to-right within a row. Each row
//! holds one command followed by its argument cells; the column of the
//! leading non-empty cell is the row's indentation level, which drives
//! block nesting. `ELSE` is not a command in the built tree: it re-routes
//! subsequent nested rows into the else branch of the nearest open `IF`.

use std::{borrow::Cow, fmt};

use crate::{
    command::{Command, CommandKind, CommandRegistry},
    mappings::AliasTable,
    types::{Grid, GridPosition},
};

/// Errors produced while turning a grid into a command tree.
///
/// All variants are fatal to the whole run and carry the offending grid
/// position where one is available.
#[derive(Debug, Clone)]
pub enum ParseError {
    /// The leading cell of a row is not a registered command name.
    UnknownCommand { name: String, position: GridPosition },
    /// A command rejected its argument tokens.
    BadArguments {
        msg: Cow<'static, str>,
        position: GridPosition,
    },
    /// `ELSE` with no open `IF` to bind to.
    OrphanElse { position: GridPosition },
    /// Any other structural violation, e.g. a row nested under a command
    /// that cannot own children.
    Invariant {
        msg: Cow<'static, str>,
        position: Option<GridPosition>,
    },
}

impl ParseError {
    pub(crate) fn unknown_command(name: &str, position: GridPosition) -> Self {
        Self::UnknownCommand {
            name: name.to_uppercase(),
            position,
        }
    }

    pub(crate) fn bad_arguments(msg: impl Into<Cow<'static, str>>, position: GridPosition) -> Self {
        Self::BadArguments {
            msg: msg.into(),
            position,
        }
    }

    pub(crate) fn orphan_else(position: GridPosition) -> Self {
        Self::OrphanElse { position }
    }

    pub(crate) fn invariant(
        msg: impl Into<Cow<'static, str>>,
        position: Option<GridPosition>,
    ) -> Self {
        Self::Invariant {
            msg: msg.into(),
            position,
        }
    }

    /// The grid position the error points at, if any.
    #[must_use]
    pub fn position(&self) -> Option<GridPosition> {
        match self {
            Self::UnknownCommand { position, .. }
            | Self::BadArguments { position, .. }
            | Self::OrphanElse { position } => Some(*position),
            Self::Invariant { position, .. } => *position,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand { name, position } => {
                write!(f, "unknown command '{name}' at position {position}")
            }
            Self::BadArguments { msg, position } => write!(f, "{msg} at position {position}"),
            Self::OrphanElse { position } => {
                write!(f, "ELSE without matching IF at position {position}")
            }
            Self::Invariant { msg, position } => match position {
                Some(position) => write!(f, "{msg} at position {position}"),
                None => write!(f, "{msg}"),
            },
        }
    }
}

impl std::error::Error for ParseError {}

/// The read-mostly structures parsing depends on: the alias table applied to
/// every cell before parsing, and the registry of command names.
///
/// A default instance covers the built-in language; hosts that extend the
/// language construct their own and pass it to [`GridParser::new`].
#[derive(Debug, Clone, Default)]
pub struct ParserContext {
    pub aliases: AliasTable,
    pub registry: CommandRegistry,
}

/// One open scope while parsing.
///
/// Every command opens a frame when its row is read; the frame closes (and
/// the command attaches to its parent) once a row at the same or lesser
/// indentation arrives. `ElseMarker` frames route subsequent nested rows
/// into the else branch of the `IF` at `if_index` in the stack.
#[derive(Debug)]
enum Frame {
    Open { indent: usize, command: Command },
    ElseMarker { indent: usize, if_index: usize },
}

impl Frame {
    const fn indent(&self) -> usize {
        match self {
            Self::Open { indent, .. } | Self::ElseMarker { indent, .. } => *indent,
        }
    }

    fn is_open_if(&self) -> bool {
        matches!(
            self,
            Self::Open {
                command: Command {
                    kind: CommandKind::If { .. },
                    ..
                },
                ..
            }
        )
    }
}

/// Parses a preprocessed grid into a command tree.
pub struct GridParser<'a> {
    grid: Grid,
    ctx: &'a ParserContext,
}

impl<'a> GridParser<'a> {
    /// Applies alias preprocessing and prepares the parser.
    #[must_use]
    pub fn new(grid: &Grid, ctx: &'a ParserContext) -> Self {
        Self {
            grid: ctx.aliases.preprocess(grid),
            ctx,
        }
    }

    /// The grid after alias rewriting.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Parses the grid into a list of top-level commands with nesting
    /// resolved from indentation.
    pub fn parse(&self) -> Result<Vec<Command>, ParseError> {
        let mut top_level: Vec<Command> = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();

        for (row_idx, row) in self.grid.iter().enumerate() {
            let Some(first_col) = row.iter().position(|cell| !cell.trim().is_empty()) else {
                continue;
            };
            let position = GridPosition::new(row_idx, first_col);
            let name_token = row[first_col].trim();
            let is_else = name_token.eq_ignore_ascii_case("ELSE");

            // Close scopes at the same or deeper indentation. An open IF at
            // exactly this indentation survives when the row is its ELSE.
            loop {
                let Some(top) = stack.last() else { break };
                if top.indent() < first_col {
                    break;
                }
                if is_else && top.indent() == first_col && top.is_open_if() {
                    break;
                }
                if let Some(Frame::Open { command, .. }) = stack.pop() {
                    attach(command, &mut stack, &mut top_level)?;
                }
            }

            let Some(command_name) = self.ctx.registry.lookup(name_token) else {
                return Err(ParseError::unknown_command(name_token, position));
            };

            // Argument cells: the rest of the row up to the first token that
            // is itself a command name. ELSE never terminates collection
            // because it is not a stand-alone command in argument position.
            let mut args: Vec<&str> = Vec::new();
            for cell in &row[first_col + 1..] {
                let text = cell.trim();
                if text.is_empty() {
                    continue;
                }
                if !text.eq_ignore_ascii_case("ELSE") && self.ctx.registry.is_command(text) {
                    break;
                }
                args.push(text);
            }

            let command = command_name.build(&args, position)?;

            if matches!(command.kind, CommandKind::Else) {
                // Bind to the nearest open IF, walking the stack downward.
                let Some(if_index) = stack.iter().rposition(Frame::is_open_if) else {
                    return Err(ParseError::orphan_else(position));
                };
                stack.push(Frame::ElseMarker {
                    indent: position.indentation_level(),
                    if_index,
                });
                continue;
            }

            stack.push(Frame::Open {
                indent: position.indentation_level(),
                command,
            });
        }

        while let Some(frame) = stack.pop() {
            if let Frame::Open { command, .. } = frame {
                attach(command, &mut stack, &mut top_level)?;
            }
        }

        Ok(top_level)
    }
}

/// Attaches a closed command to its parent: the else branch of the marked
/// `IF` when the enclosing scope is an else marker, the body of the topmost
/// open command otherwise, or the top level when no scope is open.
fn attach(
    command: Command,
    stack: &mut [Frame],
    top_level: &mut Vec<Command>,
) -> Result<(), ParseError> {
    match stack.last() {
        None => {
            top_level.push(command);
            Ok(())
        }
        Some(Frame::ElseMarker { if_index, .. }) => {
            let if_index = *if_index;
            let position = command.position;
            if let Some(Frame::Open {
                command:
                    Command {
                        kind: CommandKind::If { else_branch, .. },
                        ..
                    },
                ..
            }) = stack.get_mut(if_index)
            {
                else_branch.push(command);
                Ok(())
            } else {
                Err(ParseError::invariant(
                    "else marker does not reference an open IF",
                    Some(position),
                ))
            }
        }
        Some(Frame::Open { .. }) => {
            let position = command.position;
            let Some(Frame::Open { command: parent, .. }) = stack.last_mut() else {
                return Err(ParseError::invariant("scope stack corrupted", Some(position)));
            };
            let keyword = parent.kind.keyword();
            match parent.kind.body_mut() {
                Some(body) => {
                    body.push(command);
                    Ok(())
                }
                None => Err(ParseError::invariant(
                    format!("commands cannot be nested under {keyword}"),
                    Some(position),
                )),
            }
        }
    }
}
