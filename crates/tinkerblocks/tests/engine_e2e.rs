//! End-to-end tests for the execution workflow: grid in, report out.
//!
//! Every test runs against [`MockHardware`] so results are deterministic.
//! The scenarios mirror programs children actually build on the board:
//! drawing a square, counting with variables, and branching on sensors.

use pretty_assertions::assert_eq;
use tinkerblocks::{
    CancelToken, CollectSink, CommandName, EngineConfig, Executor, Grid, GridPosition,
    MockHardware, ParserContext, RunReport, VarValue, engine_workflow,
};

fn grid(rows: &[&[&str]]) -> Grid {
    rows.iter()
        .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
        .collect()
}

fn run(rows: &[&[&str]]) -> (RunReport, MockHardware) {
    run_with(rows, EngineConfig::default(), MockHardware::new())
}

fn run_with(
    rows: &[&[&str]],
    config: EngineConfig,
    mut hardware: MockHardware,
) -> (RunReport, MockHardware) {
    let grid = grid(rows);
    let mut sink = CollectSink::new();
    let report = engine_workflow(
        &grid,
        &ParserContext::default(),
        &mut sink,
        &mut hardware,
        CancelToken::new(),
        &config,
    );
    (report, hardware)
}

fn number(report: &RunReport, name: &str) -> f64 {
    match report.final_state.variables.get(name) {
        Some(VarValue::Number(n)) => *n,
        other => panic!("expected numeric variable {name}, got {other:?}"),
    }
}

// =============================================================================
// 1. Movement basics
// =============================================================================

#[test]
fn simple_movement_sequence() {
    let (report, _) = run(&[
        &["MOVE", "1"],
        &["MOVE", "1"],
        &["TURN", "RIGHT"],
        &["MOVE", "1"],
    ]);
    assert!(report.success, "run failed: {:?}", report.error);
    assert_eq!(report.commands_parsed, Some(4));
    assert_eq!(report.final_state.position.x, 1.0);
    assert_eq!(report.final_state.position.y, 2.0);
    assert_eq!(report.final_state.steps_executed, 4);
}

#[test]
fn move_without_argument_uses_the_until_stopped_sentinel() {
    let (report, hardware) = run(&[&["MOVE"]]);
    assert!(report.success);
    assert_eq!(report.final_state.position.y, 999.0);
    // 1 logical unit is 10cm by default.
    assert_eq!(hardware.movements, vec![9990.0]);
}

#[test]
fn negative_distance_moves_backward() {
    let (report, _) = run(&[&["MOVE", "-2"]]);
    assert!(report.success);
    assert_eq!(report.final_state.position.y, -2.0);
}

#[test]
fn move_distance_may_be_an_expression() {
    let (report, _) = run(&[&["SET", "X", "2"], &["MOVE", "X", "+", "3"]]);
    assert!(report.success);
    assert_eq!(report.final_state.position.y, 5.0);
}

#[test]
fn argument_collection_stops_at_the_next_command_name() {
    // The TURN tokens are not arguments of MOVE; a row holds one command.
    let (report, hardware) = run(&[&["MOVE", "2", "TURN", "RIGHT"]]);
    assert!(report.success);
    assert_eq!(report.commands_parsed, Some(1));
    assert_eq!(report.final_state.position.y, 2.0);
    assert!(hardware.rotations.is_empty());
}

// =============================================================================
// 2. Square drawing
// =============================================================================

#[test]
fn square_drawing_returns_home_with_nine_path_points() {
    let (report, hardware) = run(&[
        &["SET", "SIDE", "3"],
        &["SET", "COUNT", "4"],
        &["PEN_DOWN"],
        &["LOOP", "COUNT"],
        &["", "MOVE", "SIDE"],
        &["", "TURN", "RIGHT"],
        &["PEN_UP"],
    ]);
    assert!(report.success, "run failed: {:?}", report.error);

    let state = &report.final_state;
    assert!(state.position.x.abs() < 1e-9);
    assert!(state.position.y.abs() < 1e-9);
    assert_eq!(state.direction, tinkerblocks::Direction::Forward);
    assert!(!state.pen_down);
    // One seed point at PEN_DOWN plus 4 segments x 2 endpoints.
    assert_eq!(state.path.len(), 9);
    // 2 sets + pen down + 4 x (move + turn) + pen up.
    assert_eq!(state.steps_executed, 12);

    assert_eq!(hardware.movements, vec![30.0, 30.0, 30.0, 30.0]);
    assert_eq!(hardware.rotations, vec![90.0, 90.0, 90.0, 90.0]);
}

// =============================================================================
// 3. Variables and while loops
// =============================================================================

#[test]
fn fibonacci_via_while_loop() {
    let (report, _) = run(&[
        &["SET", "A", "0"],
        &["SET", "B", "1"],
        &["SET", "COUNT", "0"],
        &["WHILE", "COUNT", "<", "10"],
        &["", "SET", "TEMP", "A", "+", "B"],
        &["", "SET", "A", "B"],
        &["", "SET", "B", "TEMP"],
        &["", "SET", "COUNT", "COUNT", "+", "1"],
    ]);
    assert!(report.success, "run failed: {:?}", report.error);
    assert_eq!(number(&report, "B"), 89.0);
    assert_eq!(number(&report, "COUNT"), 10.0);
}

#[test]
fn set_stores_booleans_and_lowercase_names_are_uppercased() {
    let (report, _) = run(&[&["SET", "flag", "TRUE"]]);
    assert!(report.success);
    assert_eq!(
        report.final_state.variables.get("FLAG"),
        Some(&VarValue::Boolean(true))
    );
}

#[test]
fn unset_variables_read_as_zero() {
    let (report, _) = run(&[&["SET", "X", "NOTHING", "+", "1"]]);
    assert!(report.success);
    assert_eq!(number(&report, "X"), 1.0);
}

// =============================================================================
// 4. Loop boundaries and the step budget
// =============================================================================

#[test]
fn loop_false_runs_zero_iterations() {
    let (report, _) = run(&[&["LOOP", "FALSE"], &["", "MOVE", "1"]]);
    assert!(report.success);
    assert_eq!(report.final_state.position.y, 0.0);
    assert_eq!(report.final_state.steps_executed, 0);
}

#[test]
fn loop_true_is_stopped_by_the_step_budget() {
    let config = EngineConfig::default().max_steps(25);
    let (report, _) = run_with(
        &[&["LOOP", "TRUE"], &["", "MOVE", "1"]],
        config,
        MockHardware::new(),
    );
    assert!(!report.success);
    let error = report.error.as_deref().unwrap_or_default();
    assert!(
        error.contains("maximum steps (25) exceeded"),
        "unexpected error: {error}"
    );
    // The step that trips the limit is itself counted.
    assert_eq!(report.final_state.steps_executed, 26);
}

#[test]
fn step_counter_never_passes_one_beyond_the_budget() {
    let config = EngineConfig::default().max_steps(10);
    let (report, _) = run_with(
        &[&["LOOP", "100"], &["", "MOVE", "1"]],
        config,
        MockHardware::new(),
    );
    assert!(!report.success);
    assert_eq!(report.final_state.steps_executed, 11);
}

#[test]
fn counted_loop_steps_scale_with_the_body() {
    // LOOP n with a 2-step body: total steps = n x steps(body) + 1 SET.
    let (report, _) = run(&[
        &["SET", "N", "5"],
        &["LOOP", "N"],
        &["", "MOVE", "1"],
        &["", "TURN", "RIGHT"],
    ]);
    assert!(report.success);
    assert_eq!(report.final_state.steps_executed, 1 + 5 * 2);
}

#[test]
fn fractional_loop_counts_truncate() {
    let (report, _) = run(&[&["LOOP", "2.9"], &["", "MOVE", "1"]]);
    assert!(report.success);
    assert_eq!(report.final_state.position.y, 2.0);
}

// =============================================================================
// 5. Empty and blank grids
// =============================================================================

#[test]
fn grid_of_empty_cells_succeeds_with_zero_steps() {
    let (report, _) = run(&[&["", "", ""], &["", "", ""]]);
    assert!(report.success);
    assert_eq!(report.final_state.steps_executed, 0);
    assert!(report.final_state.path.is_empty());
    assert_eq!(report.commands_parsed, Some(0));
}

#[test]
fn all_whitespace_grid_succeeds_with_zero_steps() {
    let (report, _) = run(&[&["  ", "\t"], &[" ", "  "]]);
    assert!(report.success);
    assert_eq!(report.final_state.steps_executed, 0);
}

#[test]
fn grid_with_no_rows_is_invalid_input() {
    let grid: Grid = Vec::new();
    let mut hardware = MockHardware::new();
    let mut sink = CollectSink::new();
    let report = engine_workflow(
        &grid,
        &ParserContext::default(),
        &mut sink,
        &mut hardware,
        CancelToken::new(),
        &EngineConfig::default(),
    );
    assert!(!report.success);
    assert_eq!(report.error.as_deref(), Some("no grid data provided"));
}

// =============================================================================
// 6. Sensor-driven branching
// =============================================================================

#[test]
fn obstacle_branch_with_clear_path_moves_forward() {
    let mut hardware = MockHardware::new();
    hardware.distance_reading = 100.0;
    let (report, _) = run_with(
        &[
            &["IF", "OBSTACLE"],
            &["", "TURN", "RIGHT"],
            &["", "MOVE", "2"],
            &["ELSE"],
            &["", "MOVE", "3"],
        ],
        EngineConfig::default(),
        hardware,
    );
    assert!(report.success);
    assert_eq!(report.final_state.position.y, 3.0);
    assert_eq!(report.final_state.direction, tinkerblocks::Direction::Forward);
}

#[test]
fn obstacle_branch_with_blocked_path_turns_away() {
    let mut hardware = MockHardware::new();
    hardware.distance_reading = 20.0;
    let (report, _) = run_with(
        &[
            &["IF", "OBSTACLE"],
            &["", "TURN", "RIGHT"],
            &["", "MOVE", "2"],
            &["ELSE"],
            &["", "MOVE", "3"],
        ],
        EngineConfig::default(),
        hardware,
    );
    assert!(report.success);
    assert_eq!(report.final_state.direction, tinkerblocks::Direction::Right);
    assert_eq!(report.final_state.position.x, 2.0);
    assert_eq!(report.final_state.position.y, 0.0);
}

#[test]
fn while_loop_reads_sensors_each_iteration() {
    // BLACK_LOST is true while no black surface is seen, so the loop runs
    // until the step budget would hit; bound it with a counter instead.
    let (report, _) = run(&[
        &["SET", "N", "0"],
        &["WHILE", "N", "<", "3", "AND", "BLACK_LOST"],
        &["", "MOVE", "1"],
        &["", "SET", "N", "N", "+", "1"],
    ]);
    assert!(report.success);
    assert_eq!(report.final_state.position.y, 3.0);
}

// =============================================================================
// 7. Headings
// =============================================================================

#[test]
fn turn_heading_matches_summed_angles_for_cardinal_turns() {
    let cases: &[(&[&str], tinkerblocks::Direction)] = &[
        (&["90"], tinkerblocks::Direction::Right),
        (&["-90"], tinkerblocks::Direction::Left),
        (&["180"], tinkerblocks::Direction::Backward),
        (&["270"], tinkerblocks::Direction::Left),
        (&["360"], tinkerblocks::Direction::Forward),
    ];
    for (tokens, expected) in cases {
        let mut row = vec!["TURN"];
        row.extend_from_slice(tokens);
        let (report, _) = run(&[&row]);
        assert!(report.success);
        assert_eq!(report.final_state.direction, *expected, "TURN {tokens:?}");
    }
}

#[test]
fn turn_left_and_right_by_custom_degrees() {
    let (report, hardware) = run(&[&["TURN", "LEFT", "45"]]);
    assert!(report.success);
    assert_eq!(hardware.rotations, vec![-45.0]);
    // 315 degrees sits in the forward band.
    assert_eq!(report.final_state.direction, tinkerblocks::Direction::Forward);

    let (report, hardware) = run(&[&["TURN", "RIGHT", "45"]]);
    assert!(report.success);
    assert_eq!(hardware.rotations, vec![45.0]);
    assert_eq!(report.final_state.direction, tinkerblocks::Direction::Right);
}

// =============================================================================
// 8. Aliases
// =============================================================================

#[test]
fn aliases_are_rewritten_before_parsing() {
    let (report, hardware) = run(&[&["MOV", "2"], &["PEN_ON"]]);
    assert!(report.success, "run failed: {:?}", report.error);
    assert_eq!(report.final_state.position.y, 2.0);
    assert!(report.final_state.pen_down);
    assert!(hardware.pen_is_down);
}

#[test]
fn alias_value_tokens_rewrite_too() {
    // black_on is an alias for the black_detected sensor keyword.
    let mut hardware = MockHardware::new();
    hardware.black_surface = true;
    let (report, _) = run_with(
        &[&["SET", "SEEN", "BLACK_ON"]],
        EngineConfig::default(),
        hardware,
    );
    assert!(report.success);
    assert_eq!(
        report.final_state.variables.get("SEEN"),
        Some(&VarValue::Boolean(true))
    );
}

// =============================================================================
// 9. Single-command execution
// =============================================================================

#[test]
fn execute_single_runs_one_command_against_a_fresh_context() {
    let command = CommandName::Move
        .build(&["5"], GridPosition::new(0, 0))
        .expect("MOVE 5 builds");

    let mut hardware = MockHardware::new();
    let mut sink = CollectSink::new();
    let mut executor = Executor::new(
        &mut sink,
        &mut hardware,
        CancelToken::new(),
        EngineConfig::default(),
    );
    let (state, outcome) = executor.execute_single(&command);
    assert!(outcome.is_ok());
    assert_eq!(state.position.y, 5.0);
    assert_eq!(state.steps_executed, 1);

    // Each call gets a fresh context; state does not carry over.
    let backward = CommandName::Move
        .build(&["-2"], GridPosition::new(0, 1))
        .expect("MOVE -2 builds");
    let (state, outcome) = executor.execute_single(&backward);
    assert!(outcome.is_ok());
    assert_eq!(state.position.y, -2.0);
    drop(executor);
    assert_eq!(hardware.movements, vec![50.0, -20.0]);
}

// =============================================================================
// 10. Report serialization
// =============================================================================

#[test]
fn report_serializes_with_lowercase_direction() {
    let (report, _) = run(&[&["TURN", "LEFT"]]);
    let json = serde_json::to_value(&report).expect("report serializes");
    assert_eq!(json["success"], serde_json::json!(true));
    assert_eq!(json["final_state"]["direction"], serde_json::json!("left"));
    assert_eq!(json["commands_parsed"], serde_json::json!(1));
    assert_eq!(json["final_state"]["position"]["x"], serde_json::json!(0.0));
}

#[test]
fn failed_report_omits_commands_parsed() {
    let (report, _) = run(&[&["FLY"]]);
    assert!(!report.success);
    let json = serde_json::to_value(&report).expect("report serializes");
    assert!(json.get("commands_parsed").is_none());
}
