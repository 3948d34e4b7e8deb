//! Command-line runner for TinkerBlocks programs.
//!
//! Loads a grid from a JSON file (an array of rows, each an array of cell
//! strings), executes it against mock hardware by default or the real car
//! when `--hardware <base-url>` is given, and prints the workflow report as
//! JSON on stdout.

use std::{env, fs, process::ExitCode};

use tinkerblocks::{
    CancelToken, CarHardware, EngineConfig, Grid, HardwareInterface, MockHardware, ParserContext,
    StdoutSink, engine_workflow,
};

fn main() -> ExitCode {
    env_logger::builder().format_timestamp(None).init();

    let args: Vec<String> = env::args().collect();
    let mut grid_path: Option<&str> = None;
    let mut hardware_url: Option<&str> = None;
    let mut max_steps: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--hardware" => {
                i += 1;
                hardware_url = args.get(i).map(String::as_str);
                if hardware_url.is_none() {
                    eprintln!("error: --hardware requires a base URL");
                    return ExitCode::FAILURE;
                }
            }
            "--max-steps" => {
                i += 1;
                max_steps = match args.get(i).map(|v| v.parse()) {
                    Some(Ok(limit)) => Some(limit),
                    _ => {
                        eprintln!("error: --max-steps requires an integer");
                        return ExitCode::FAILURE;
                    }
                };
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                return ExitCode::SUCCESS;
            }
            path => grid_path = Some(path),
        }
        i += 1;
    }

    let Some(grid_path) = grid_path else {
        print_usage(&args[0]);
        return ExitCode::FAILURE;
    };

    let grid = match read_grid(grid_path) {
        Ok(grid) => grid,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut config = EngineConfig::default();
    if let Some(url) = hardware_url {
        config = config.car_api_url(url);
    }
    if let Some(limit) = max_steps {
        config = config.max_steps(limit);
    }

    let mut mock;
    let mut car;
    let hardware: &mut dyn HardwareInterface = if hardware_url.is_some() {
        car = match CarHardware::from_config(&config) {
            Ok(car) => car,
            Err(err) => {
                eprintln!("error: cannot build hardware client: {err}");
                return ExitCode::FAILURE;
            }
        };
        &mut car
    } else {
        mock = MockHardware::new();
        &mut mock
    };

    let mut sink = StdoutSink;
    let report = engine_workflow(
        &grid,
        &ParserContext::default(),
        &mut sink,
        hardware,
        CancelToken::new(),
        &config,
    );

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("error: cannot serialize report: {err}");
            return ExitCode::FAILURE;
        }
    }

    if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn read_grid(path: &str) -> Result<Grid, String> {
    let text = fs::read_to_string(path).map_err(|err| format!("cannot read {path}: {err}"))?;
    serde_json::from_str(&text).map_err(|err| format!("{path} is not a valid grid: {err}"))
}

fn print_usage(program: &str) {
    eprintln!("usage: {program} [--hardware <base-url>] [--max-steps <n>] <grid.json>");
}
