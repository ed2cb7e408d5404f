use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::info;

use propsolve_core::{parse_source, EngineError, Solver};

mod renderer;
mod scenarios;

#[derive(Parser)]
#[command(name = "propsolve")]
#[command(about = "A backward-chaining propositional expert system")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a knowledge base and answer every query it lists.
    Run {
        /// Print the justification tree behind each answer.
        #[arg(short, long)]
        verbose: bool,

        /// Like --verbose, and also list every candidate considered at
        /// each derivation step, not just the one that won.
        #[arg(short, long)]
        debug: bool,

        /// Path to the source file (spec.md §6's rule/facts/query format).
        filename: PathBuf,
    },

    /// Run the engine's built-in scenario fixtures and report pass/fail.
    Test,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { verbose, debug, filename } => cmd_run(&filename, verbose, debug),
        Commands::Test => cmd_test(),
    }
}

fn cmd_run(filename: &PathBuf, verbose: bool, debug: bool) -> ExitCode {
    let source = match fs::read_to_string(filename) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: could not read '{}': {e}", filename.display());
            return ExitCode::from(1);
        }
    };

    let parsed = match parse_source(&source) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    info!("parsed {} formulas, {} quer{}", parsed.kb.len(), parsed.queries.len(), if parsed.queries.len() == 1 { "y" } else { "ies" });

    let verbose_or_debug = verbose || debug;
    let mut saw_incoherence = false;
    for &query in &parsed.queries {
        let result = if debug {
            let mut solver = Solver::with_trace(&parsed.kb);
            solver.solve(query).map(|j| (j, solver.candidate_trace().cloned()))
        } else {
            Solver::new(&parsed.kb).solve(query).map(|j| (j, None))
        };

        match result {
            Ok((justification, trace)) => {
                if verbose_or_debug {
                    println!("{}", renderer::render_tree(&parsed.kb, &justification));
                }
                if let Some(trace) = trace {
                    println!("{}", renderer::render_candidates(&parsed.kb, &trace, &justification));
                }
                println!("{}", renderer::render_value_line(&parsed.kb, query, justification.value()));
            }
            Err(EngineError::Incoherence(kind)) => {
                saw_incoherence = true;
                eprintln!("Error: {} is incoherent: {kind}", parsed.kb.display(query));
            }
        }
    }

    if saw_incoherence {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn cmd_test() -> ExitCode {
    let mut failed = 0;
    for scenario in scenarios::SCENARIOS {
        match scenario.run() {
            Ok(()) => println!("ok   {}", scenario.name),
            Err(message) => {
                println!("FAIL {} — {message}", scenario.name);
                failed += 1;
            }
        }
    }
    if failed == 0 {
        println!("\n{} scenarios passed", scenarios::SCENARIOS.len());
        ExitCode::SUCCESS
    } else {
        println!("\n{failed}/{} scenarios failed", scenarios::SCENARIOS.len());
        ExitCode::from(1)
    }
}
