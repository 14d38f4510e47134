//! `shapejson` CLI: reformat and inspect JSON from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Re-emit JSON in the codec's compact layout (stdin → stdout)
//! echo '{"name":"Alice","tags":[]}' | shapejson format
//!
//! # Indented output, file to file
//! shapejson format --pretty -i data.json -o data.pretty.json
//!
//! # Load serialization options from a JSON file
//! shapejson format --options opts.json -i data.json
//!
//! # Validate and count nodes per shape
//! shapejson check -i data.json
//! ```
//!
//! Set `RUST_LOG=debug` to see what the codec skipped or defaulted.

use std::collections::BTreeMap;
use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shapejson::{classify_token, Options, Shape, Value};

#[derive(Parser)]
#[command(
    name = "shapejson",
    version,
    about = "Shape-driven JSON formatter and inspector"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse JSON and re-emit it through the serializer
    Format {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Indented multi-line output
        #[arg(long)]
        pretty: bool,
        /// Escape non-ASCII characters as \uXXXX
        #[arg(long)]
        escape_non_ascii: bool,
        /// JSON file with serialization options (flags above override it).
        /// Only `pretty` and `escape_non_ascii` apply to plain JSON; member
        /// filters, name casing and `include_non_public` are rejected
        #[arg(long)]
        options: Option<String>,
    },
    /// Validate JSON and report its shape
    Check {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Format {
            input,
            output,
            pretty,
            escape_non_ascii,
            options,
        } => {
            let mut opts = load_options(options.as_deref())?;
            opts.pretty |= pretty;
            opts.escape_non_ascii |= escape_non_ascii;

            let json = read_input(input.as_deref())?;
            let formatted = match shapejson::deserialize_value(&json)
                .context("Failed to parse JSON input")?
            {
                Some(value) => shapejson::serialize(&value, &opts),
                None => String::new(),
            };
            write_output(output.as_deref(), &formatted)?;
        }
        Commands::Check { input } => {
            let json = read_input(input.as_deref())?;
            let Some(value) =
                shapejson::deserialize_value(&json).context("Failed to parse JSON input")?
            else {
                println!("shape: empty");
                return Ok(());
            };

            let mut counts = BTreeMap::new();
            count_shapes(&value, &mut counts);
            let total: usize = counts.values().sum();
            println!("shape: {}", classify_token(&value));
            println!("nodes: {}", total);
            for (shape, count) in &counts {
                println!("  {}: {}", shape, count);
            }
        }
    }

    Ok(())
}

/// Tally every node of the token tree by shape.
fn count_shapes(value: &Value, counts: &mut BTreeMap<Shape, usize>) {
    *counts.entry(classify_token(value)).or_insert(0) += 1;
    match value {
        Value::Array(items) => items.iter().for_each(|item| count_shapes(item, counts)),
        Value::Object(map) => map.values().for_each(|item| count_shapes(item, counts)),
        _ => {}
    }
}

/// Options from a JSON file, or the defaults when no file is given.
fn load_options(path: Option<&str>) -> Result<Options> {
    let Some(path) = path else {
        return Ok(Options::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read options file: {}", path))?;
    let opts: Options = serde_json::from_str(&text)
        .with_context(|| format!("Invalid options file: {}", path))?;
    let inert = member_only_settings(&opts);
    if !inert.is_empty() {
        bail!(
            "Invalid options file: {}: {} only apply to described types, not plain JSON",
            path,
            inert.join(", ")
        );
    }
    log::debug!("loaded options from {}: {:?}", path, opts);
    Ok(opts)
}

/// Settings that only affect members of described types. Plain JSON is all
/// dictionaries, so setting any of these would do nothing.
fn member_only_settings(opts: &Options) -> Vec<&'static str> {
    let defaults = Options::default();
    let mut set = Vec::new();
    if opts.filter != defaults.filter {
        set.push("filter");
    }
    if opts.name_case != defaults.name_case {
        set.push("name_case");
    }
    if opts.include_non_public {
        set.push("include_non_public");
    }
    set
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_every_node() {
        let mut counts = BTreeMap::new();
        count_shapes(&json!({"a": [1, null, {"b": true}]}), &mut counts);
        assert_eq!(counts[&Shape::Dictionary], 2);
        assert_eq!(counts[&Shape::Sequence], 1);
        assert_eq!(counts[&Shape::Primitive], 2);
        assert_eq!(counts[&Shape::Null], 1);
    }

    #[test]
    fn layout_settings_are_not_member_only() {
        let opts = Options::pretty().escape_non_ascii(true);
        assert!(member_only_settings(&opts).is_empty());
    }

    #[test]
    fn member_settings_are_reported() {
        let opts = Options::compact()
            .with_name_case(shapejson::NameCase::Camel)
            .include_non_public(true);
        assert_eq!(member_only_settings(&opts), ["name_case", "include_non_public"]);
    }

    #[test]
    fn missing_options_file_is_default() {
        assert_eq!(load_options(None).unwrap(), Options::default());
    }
}
