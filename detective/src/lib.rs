//! Tool shell for the data detective.
//!
//! Parses the command line, connects the sources named with `--source`,
//! and runs either one tool or a line-delimited JSON tool loop. Every
//! result and every error is written to stdout as JSON; logs go to stderr.
//!
//! The binary lives in `main.rs`; the argument types, dispatcher and
//! output helpers are exposed here for testing.

pub mod dispatch;
pub mod output;

use clap::{Args, Parser, Subcommand};
use detective_core::SourceType;
use detective_core::explore::{DEFAULT_QUERY_LIMIT, DEFAULT_SAMPLE_SIZE};
use detective_core::quality::AnomalySensitivity;
use serde::Deserialize;

pub use dispatch::Session;

#[derive(Parser, Debug)]
#[command(name = "detective")]
#[command(about = "Data quality scanning, anomaly detection and profiling over DuckDB")]
#[command(version)]
#[command(long_about = "
Data detective - quality checks and exploration across SQLite, Parquet and CSV

Every source is read through one in-memory DuckDB engine, so the same
checks run against any of them:
- Quality scan: duplicates, null rates, constant columns, unexpected negatives
- Anomaly detection: z-score outliers per row or per day
- Schema comparison between two tables
- Column profiles and catalog summaries

Results are printed as JSON. Errors are printed as
{\"error\": <kind>, \"message\": <text>} with exit code 1.

EXAMPLES:
  detective --source shop=sqlite:./shop.db scan orders --source shop
  detective --source ev=parquet:./events/*.parquet anomalies ev amount --time-column ts
  detective --source ppl=csv:people.csv serve < calls.ndjson
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Source to connect before running the command
    #[arg(
        long = "source",
        value_name = "NAME=TYPE:PATH",
        value_parser = parse_source_spec,
        help = "Connect a source first (repeatable), e.g. shop=sqlite:./shop.db"
    )]
    pub sources: Vec<SourceSpec>,

    /// Row cap for ad-hoc queries without their own LIMIT
    #[arg(
        long,
        env = "DETECTIVE_QUERY_LIMIT",
        default_value_t = DEFAULT_QUERY_LIMIT,
        help = "Row cap appended to queries without a LIMIT"
    )]
    pub query_limit: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all log output except errors")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(flatten)]
    Tool(ToolCall),
    /// Read JSON tool calls from stdin, one per line, and answer each on stdout
    Serve,
}

/// One tool invocation.
///
/// Built by clap from the command line or deserialized from a JSON
/// request such as `{"tool": "scan", "table": "orders"}`.
#[derive(Subcommand, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolCall {
    /// Connect a SQLite database, Parquet file(s) or CSV file(s)
    Connect {
        name: String,
        #[arg(value_name = "TYPE")]
        #[serde(rename = "type")]
        source_type: String,
        path: String,
    },
    /// Disconnect a source and drop its catalog objects
    Disconnect { name: String },
    /// List connected sources
    Sources,
    /// List the tables of every connected source
    Tables,
    /// Show the columns of a table
    Schema {
        table: String,
        #[arg(long)]
        #[serde(default)]
        source: Option<String>,
    },
    /// Run read-only SQL
    Query {
        sql: String,
        #[arg(long)]
        #[serde(default)]
        limit: Option<usize>,
    },
    /// Return random rows from a table
    Sample {
        table: String,
        #[arg(short = 'n', long = "rows", default_value_t = DEFAULT_SAMPLE_SIZE)]
        #[serde(default = "default_sample_size")]
        n: usize,
        #[arg(long)]
        #[serde(default)]
        source: Option<String>,
    },
    /// Profile every column of a table
    Profile {
        table: String,
        #[arg(long)]
        #[serde(default)]
        source: Option<String>,
    },
    /// Summarize every connected source
    Summarize,
    /// Scan a table for quality issues
    Scan {
        table: String,
        #[arg(long)]
        #[serde(default)]
        source: Option<String>,
    },
    /// Find z-score outliers in a numeric column
    Anomalies {
        table: String,
        column: String,
        #[arg(long)]
        #[serde(default)]
        time_column: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        #[serde(default)]
        z_threshold: Option<f64>,
        #[arg(long, value_parser = parse_sensitivity)]
        #[serde(default)]
        sensitivity: Option<AnomalySensitivity>,
        #[arg(long)]
        #[serde(default)]
        source: Option<String>,
    },
    /// Compare the schemas of two tables
    Compare {
        table_a: String,
        table_b: String,
        #[arg(long)]
        #[serde(default)]
        source_a: Option<String>,
        #[arg(long)]
        #[serde(default)]
        source_b: Option<String>,
    },
    /// Write a query result to a Parquet or CSV file
    Export {
        sql: String,
        output_path: String,
        #[arg(long, default_value = "parquet")]
        #[serde(default = "default_export_format")]
        format: String,
    },
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

fn default_export_format() -> String {
    "parquet".to_string()
}

/// A source given on the command line as `NAME=TYPE:PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    pub source_type: SourceType,
    pub path: String,
}

/// Parses `NAME=TYPE:PATH`. Only the first `=` and the first `:` after it
/// split, so Windows drive letters survive in the path.
pub fn parse_source_spec(value: &str) -> Result<SourceSpec, String> {
    let (name, rest) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=TYPE:PATH, got '{value}'"))?;
    let (source_type, path) = rest
        .split_once(':')
        .ok_or_else(|| format!("expected NAME=TYPE:PATH, got '{value}'"))?;
    if name.trim().is_empty() || path.trim().is_empty() {
        return Err(format!("expected NAME=TYPE:PATH, got '{value}'"));
    }
    let source_type = source_type
        .parse::<SourceType>()
        .map_err(|e| e.to_string())?;
    Ok(SourceSpec {
        name: name.trim().to_string(),
        source_type,
        path: path.trim().to_string(),
    })
}

fn parse_sensitivity(value: &str) -> Result<AnomalySensitivity, String> {
    match value.trim().to_lowercase().as_str() {
        "low" => Ok(AnomalySensitivity::Low),
        "medium" => Ok(AnomalySensitivity::Medium),
        "high" => Ok(AnomalySensitivity::High),
        other => Err(format!("unknown sensitivity '{other}' (use low, medium or high)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_source_spec() {
        let spec = parse_source_spec("shop=sqlite:./data/shop.db").unwrap();
        assert_eq!(spec.name, "shop");
        assert_eq!(spec.source_type, SourceType::Sqlite);
        assert_eq!(spec.path, "./data/shop.db");

        let spec = parse_source_spec("win=CSV:C:\\data\\x.csv").unwrap();
        assert_eq!(spec.source_type, SourceType::Csv);
        assert_eq!(spec.path, "C:\\data\\x.csv");
    }

    #[test]
    fn test_parse_source_spec_errors() {
        assert!(parse_source_spec("shop").is_err());
        assert!(parse_source_spec("shop=sqlite").is_err());
        assert!(parse_source_spec("=csv:x.csv").is_err());
        assert!(parse_source_spec("x=excel:x.xlsx").unwrap_err().contains("source type"));
    }

    #[test]
    fn test_parse_tool_from_args() {
        let cli = Cli::try_parse_from([
            "detective",
            "--source",
            "ev=parquet:/tmp/ev.parquet",
            "anomalies",
            "ev",
            "amount",
            "--time-column",
            "ts",
            "--sensitivity",
            "high",
        ])
        .unwrap();
        assert_eq!(cli.sources.len(), 1);
        assert_eq!(cli.query_limit, DEFAULT_QUERY_LIMIT);
        match cli.command {
            Command::Tool(ToolCall::Anomalies {
                table,
                column,
                time_column,
                z_threshold,
                sensitivity,
                source,
            }) => {
                assert_eq!(table, "ev");
                assert_eq!(column, "amount");
                assert_eq!(time_column.as_deref(), Some("ts"));
                assert_eq!(z_threshold, None);
                assert_eq!(sensitivity, Some(AnomalySensitivity::High));
                assert_eq!(source, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_tool_from_json() {
        let call: ToolCall =
            serde_json::from_str(r#"{"tool": "sample", "table": "orders"}"#).unwrap();
        assert_eq!(
            call,
            ToolCall::Sample {
                table: "orders".to_string(),
                n: DEFAULT_SAMPLE_SIZE,
                source: None,
            }
        );

        let call: ToolCall = serde_json::from_str(
            r#"{"tool": "connect", "name": "p", "type": "csv", "path": "p.csv"}"#,
        )
        .unwrap();
        assert!(matches!(call, ToolCall::Connect { ref source_type, .. } if source_type == "csv"));

        let call: ToolCall = serde_json::from_str(r#"{"tool": "summarize"}"#).unwrap();
        assert_eq!(call, ToolCall::Summarize);
    }

    #[test]
    fn test_unknown_tool_is_rejected() {
        assert!(serde_json::from_str::<ToolCall>(r#"{"tool": "chart"}"#).is_err());
    }
}
