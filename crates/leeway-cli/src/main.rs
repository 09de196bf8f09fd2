//! Leeway CLI - formula checker and runner

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use leeway_formula::Interpreter;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "leeway")]
#[command(author, version, about = "Formula checker and runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a formula file for syntax errors
    Check {
        /// Formula file
        file: PathBuf,
    },

    /// Run a formula and print its outputs
    Run {
        /// Formula file
        file: PathBuf,

        /// Input value as name=value (repeatable); inputs left out are
        /// absent for the run
        #[arg(short, long = "input", value_name = "NAME=VALUE")]
        inputs: Vec<String>,
    },

    /// Show a formula's declared inputs, outputs, and functions
    Info {
        /// Formula file
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { file } => check(&file),
        Commands::Run { file, inputs } => run(&file, &inputs),
        Commands::Info { file } => show_info(&file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn read_source(file: &PathBuf) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Failed to read '{}'", file.display()))
}

fn check(file: &PathBuf) -> Result<()> {
    let source = read_source(file)?;
    Interpreter::validate(&source)
        .with_context(|| format!("'{}' is not a valid formula", file.display()))?;
    println!("{}: OK", file.display());
    Ok(())
}

fn run(file: &PathBuf, inputs: &[String]) -> Result<()> {
    let source = read_source(file)?;
    let mut interp = Interpreter::load(&source)
        .with_context(|| format!("Failed to load '{}'", file.display()))?;

    let supplied = parse_inputs(inputs)?;
    for (name, _) in &supplied {
        if !interp.program().inputs().iter().any(|i| &i.name == name) {
            bail!("'{name}' is not a declared input of this formula");
        }
    }

    // Pre-run protocol: declare every output, set supplied inputs, delete
    // the rest so the formula sees them as absent
    let outputs = interp.program().outputs().to_vec();
    let declared_inputs: Vec<String> = interp
        .program()
        .inputs()
        .iter()
        .map(|i| i.name.clone())
        .collect();

    for output in &outputs {
        interp.declare_variable(&output.name);
    }
    for name in &declared_inputs {
        match supplied.iter().find(|(n, _)| n == name) {
            Some((_, value)) => interp.set_variable(name, *value),
            None => interp.delete_variable(name),
        }
    }

    interp
        .run()
        .with_context(|| format!("'{}' failed", file.display()))?;

    for output in &outputs {
        match interp.get_variable(&output.name) {
            Some(value) => println!("{}\t{}", output.label, format_value(value, &output.format)),
            None => println!("{}\t", output.label),
        }
    }

    Ok(())
}

fn show_info(file: &PathBuf) -> Result<()> {
    let source = read_source(file)?;
    let interp = Interpreter::load(&source)
        .with_context(|| format!("Failed to load '{}'", file.display()))?;
    let program = interp.program();

    println!("File: {}", file.display());

    println!();
    println!("Inputs: {}", program.inputs().len());
    for input in program.inputs() {
        println!("  {}\t\"{}\"", input.name, input.prompt);
    }

    println!();
    println!("Outputs: {}", program.outputs().len());
    for output in program.outputs() {
        println!(
            "  {}\t\"{}\"\t\"{}\"",
            output.name, output.label, output.format
        );
    }

    let mut functions: Vec<_> = program
        .functions()
        .map(|f| (f.name.clone(), f.params.len()))
        .collect();
    functions.sort();

    println!();
    println!("Functions: {}", functions.len());
    for (name, arity) in functions {
        println!("  {name}/{arity}");
    }

    Ok(())
}

fn parse_inputs(inputs: &[String]) -> Result<Vec<(String, f64)>> {
    let mut parsed = Vec::with_capacity(inputs.len());
    for input in inputs {
        let (name, value) = input
            .split_once('=')
            .with_context(|| format!("expected NAME=VALUE, got '{input}'"))?;
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("invalid value for '{name}': '{value}'"))?;
        parsed.push((name.trim().to_string(), value));
    }
    Ok(parsed)
}

/// Render an output using its declared format when it is a simple
/// `%.Nf` pattern; anything else falls back to the default display
fn format_value(value: f64, format: &str) -> String {
    if let Some(precision) = parse_precision(format) {
        return format!("{value:.precision$}");
    }
    format!("{value}")
}

fn parse_precision(format: &str) -> Option<usize> {
    let rest = format.strip_prefix("%.")?;
    let digits = rest.strip_suffix('f')?;
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inputs() {
        let parsed = parse_inputs(&["x=3".into(), "y = 2.5".into()]).unwrap();
        assert_eq!(parsed, vec![("x".into(), 3.0), ("y".into(), 2.5)]);

        assert!(parse_inputs(&["bogus".into()]).is_err());
        assert!(parse_inputs(&["x=abc".into()]).is_err());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(6.0, "%.1f"), "6.0");
        assert_eq!(format_value(3.14159, "%.2f"), "3.14");
        // Unrecognized formats fall back to the default display
        assert_eq!(format_value(6.5, "%d"), "6.5");
        assert_eq!(format_value(6.5, ""), "6.5");
    }
}
