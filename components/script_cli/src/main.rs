//! hatch-script
//!
//! Entry point for the script runner. Parses CLI arguments and delegates
//! to `ScriptRunner`.

use clap::Parser;
use script_cli::{Cli, CliResult, ScriptRunner};
use tracing_subscriber::EnvFilter;

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> CliResult<()> {
    let chunk = ScriptRunner::load_file(&cli.chunk)?;
    if cli.disassemble {
        println!("{}", chunk.disassemble(&cli.chunk.display().to_string()));
    }

    let mut runner = ScriptRunner::new(cli.runtime_config()?)?;
    let result = match (runner.run(&chunk), &cli.entry) {
        (Ok(_), Some(entry)) => runner.run_frames(entry, cli.frames),
        (result, _) => result,
    };

    for line in runner.take_console() {
        println!("{}", line);
    }
    let value = result?;
    if !value.is_null() {
        println!("{}", runner.display(value));
    }

    if cli.stats {
        println!("{}", runner.stats_json()?);
    }
    runner.shutdown();
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
