//! Tests for grid parse failures and parse-level invariants.

use pretty_assertions::assert_eq;
use tinkerblocks::{Grid, GridParser, GridPosition, ParseError, ParserContext};

fn grid(rows: &[&[&str]]) -> Grid {
    rows.iter()
        .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
        .collect()
}

fn parse_err(rows: &[&[&str]]) -> ParseError {
    let ctx = ParserContext::default();
    GridParser::new(&grid(rows), &ctx)
        .parse()
        .expect_err("grid should fail to parse")
}

// =============================================================================
// 1. Unknown commands
// =============================================================================

#[test]
fn unknown_command_reports_name_and_position() {
    let err = parse_err(&[&["MOVE", "1"], &["", "", "JUMP"]]);
    let ParseError::UnknownCommand { name, position } = &err else {
        panic!("expected UnknownCommand, got {err:?}");
    };
    assert_eq!(name, "JUMP");
    assert_eq!(*position, GridPosition::new(1, 2));
    assert_eq!(
        err.to_string(),
        "unknown command 'JUMP' at position (1, 2)"
    );
}

#[test]
fn unknown_command_lookup_is_case_insensitive() {
    let ctx = ParserContext::default();
    let commands = GridParser::new(&grid(&[&["move", "1"], &["Turn", "right"]]), &ctx)
        .parse()
        .expect("lowercase command names parse");
    assert_eq!(commands.len(), 2);
}

// =============================================================================
// 2. Bad arguments
// =============================================================================

#[test]
fn set_without_a_value_is_rejected() {
    let err = parse_err(&[&["SET", "X"]]);
    assert!(matches!(err, ParseError::BadArguments { .. }));
    assert!(err.to_string().contains("SET requires a variable name and a value"));
}

#[test]
fn loop_without_a_count_is_rejected() {
    let err = parse_err(&[&["LOOP"]]);
    assert!(matches!(err, ParseError::BadArguments { .. }));
}

#[test]
fn if_with_an_unparseable_condition_is_rejected() {
    let err = parse_err(&[&["IF", "@", "%"]]);
    assert!(matches!(err, ParseError::BadArguments { .. }));
    assert!(err.to_string().contains("invalid condition"));
}

#[test]
fn pen_commands_take_no_arguments() {
    let err = parse_err(&[&["PEN_UP", "5"]]);
    assert!(err.to_string().contains("PEN_UP takes no arguments"));
}

#[test]
fn else_takes_no_arguments() {
    let err = parse_err(&[&["IF", "TRUE"], &["ELSE", "5"]]);
    assert!(matches!(err, ParseError::BadArguments { .. }));
}

#[test]
fn turn_rejects_forward_as_a_direction() {
    let err = parse_err(&[&["TURN", "FORWARD"]]);
    assert!(err.to_string().contains("TURN requires LEFT, RIGHT, or degrees"));
}

#[test]
fn turn_rejects_garbage_degrees() {
    let err = parse_err(&[&["TURN", "LEFT", "fast"]]);
    assert!(err.to_string().contains("invalid degrees value"));
}

#[test]
fn bad_argument_errors_carry_the_command_position() {
    let err = parse_err(&[&["MOVE", "1"], &["", "SET", "X"]]);
    assert_eq!(err.position(), Some(GridPosition::new(1, 1)));
}

// =============================================================================
// 3. Structural invariants
// =============================================================================

#[test]
fn nesting_under_a_non_control_command_is_an_invariant_error() {
    let err = parse_err(&[&["MOVE", "1"], &["", "MOVE", "2"]]);
    let ParseError::Invariant { .. } = &err else {
        panic!("expected Invariant, got {err:?}");
    };
    assert!(err.to_string().contains("cannot be nested under MOVE"));
}

#[test]
fn orphan_else_is_detected() {
    let err = parse_err(&[&["ELSE"]]);
    assert!(matches!(err, ParseError::OrphanElse { .. }));
    assert_eq!(err.position(), Some(GridPosition::new(0, 0)));
}

// =============================================================================
// 4. Idempotence
// =============================================================================

#[test]
fn reparsing_a_preprocessed_grid_yields_the_same_tree() {
    let source = grid(&[
        &["Mov", "2"],
        &["LOOP", "3"],
        &["", "pen_on"],
        &["", "MOVE", "1"],
        &["IF", "OBSTACLE"],
        &["", "TURN", "LEFT"],
        &["ELSE"],
        &["", "TURN", "RIGHT"],
    ]);
    let ctx = ParserContext::default();

    let first_parser = GridParser::new(&source, &ctx);
    let first = first_parser.parse().expect("first parse");

    // Preprocessing is idempotent, so parsing the rewritten grid again must
    // produce an isomorphic tree.
    let second_parser = GridParser::new(first_parser.grid(), &ctx);
    assert_eq!(first_parser.grid(), second_parser.grid());
    let second = second_parser.parse().expect("second parse");
    assert_eq!(first, second);
}

#[test]
fn skipped_rows_do_not_disturb_positions() {
    let ctx = ParserContext::default();
    let commands = GridParser::new(
        &grid(&[&["", ""], &["MOVE", "1"], &["", ""], &["TURN", "LEFT"]]),
        &ctx,
    )
    .parse()
    .expect("grid parses");
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].position, GridPosition::new(1, 0));
    assert_eq!(commands[1].position, GridPosition::new(3, 0));
}
