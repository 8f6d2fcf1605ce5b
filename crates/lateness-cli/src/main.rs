//! Command-line front end for the `lateness` parser.

use anyhow::{bail, Context, Result};
use clap::Parser;

/// Parse an elapsed-time expression and print its total seconds.
///
/// The expression is one or more "<quantity> <unit>" pairs followed by the
/// keyword "late", e.g.: lateness 2 days 3 hours late
#[derive(Debug, Parser)]
#[command(name = "lateness", version, about)]
struct Cli {
    /// The expression tokens; joined with spaces before parsing.
    expression: Vec<String>,

    /// Print the full parse result as JSON instead of the bare total.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.expression.is_empty() {
        bail!("no expression given; try: lateness 2 days 3 hours late");
    }
    let text = cli.expression.join(" ");
    let parsed =
        lateness::parse(&text).with_context(|| format!("cannot parse {text:?}"))?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        println!("{}", parsed.total_seconds);
    }
    Ok(())
}
