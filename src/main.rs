use clap::Parser;
use instant::Duration;
use std::fs;
use std::process::ExitCode;

use crossfill::backtracking_search::{find_fill, FillFailure, SolverConfig};
use crossfill::domains::DomainStore;
use crossfill::grid_config::{generate_grid_config_from_template_string, render_grid};
use crossfill::word_list::load_word_list;

/// crossfill: fill a crossword grid structure from a word list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the grid structure, with `_` (or `.`) for open squares and `#` for blocks
    structure: String,

    /// Path to the word list, one word per line
    words: String,

    /// Write the filled grid to this file as plain text, as well as printing it
    output: Option<String>,

    /// Give up after visiting this many search states
    #[arg(long)]
    max_states: Option<u64>,

    /// Give up after this many milliseconds of searching
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    crossfill::log::init_logger(cli.debug);

    if let Err(e) = try_main(&cli) {
        eprintln!("Error: {e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let template = fs::read_to_string(&cli.structure)
        .map_err(|e| format!("couldn't read structure '{}': {e}", cli.structure))?;
    let word_list = load_word_list(&cli.words)?;

    let grid_config = generate_grid_config_from_template_string(word_list, &template)?;
    let solver_config = SolverConfig {
        max_states: cli.max_states,
        timeout: cli.timeout_ms.map(Duration::from_millis),
    };

    match find_fill(&grid_config, DomainStore::new(&grid_config), &solver_config) {
        Ok(result) => {
            log::info!("{:?}", result.statistics);

            let display_grid = render_grid(&grid_config, &result.assignment);
            println!("{display_grid}");

            if let Some(output) = &cli.output {
                fs::write(output, format!("{display_grid}\n"))
                    .map_err(|e| format!("couldn't write '{output}': {e}"))?;
                log::info!("Wrote grid to {output}");
            }

            Ok(())
        }
        Err(FillFailure::NoSolution) => {
            println!("No solution.");
            Ok(())
        }
        Err(failure) => Err(failure.into()),
    }
}
