use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    calendar::{self, MONTH_NAMES, WEEKDAY_NAMES},
    filter::{Dimension, FilterSelection},
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Filter and summarize restaurant sales exports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check a sales file against the required column layout
    Validate(ValidateArgs),
    /// Fill the CATEGORIA column from product descriptions
    Categorize(CategorizeArgs),
    /// List the values available for each filter dimension
    Options(OptionsArgs),
    /// Print KPIs and aggregated views for a filtered selection
    Report(ReportArgs),
    /// Write the filtered rows to a CSV file
    Export(ExportArgs),
    /// Generate a synthetic sales dataset
    Sample(SampleArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Sales file (.xlsx, .xls, .ods, .csv or .tsv)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

/// Repeatable per-dimension filter flags. A dimension with no flags is left
/// unconstrained.
#[derive(Debug, Args, Default)]
pub struct FilterArgs {
    #[arg(long = "category", action = clap::ArgAction::Append)]
    pub categories: Vec<String>,
    /// Product descriptions; only honoured for the selected categories
    #[arg(long = "product", action = clap::ArgAction::Append)]
    pub products: Vec<String>,
    #[arg(long = "year", action = clap::ArgAction::Append)]
    pub years: Vec<i32>,
    /// Month names (Enero..Diciembre)
    #[arg(long = "month", action = clap::ArgAction::Append, value_parser = parse_month)]
    pub months: Vec<String>,
    /// Weekday names (Lunes..Domingo)
    #[arg(long = "weekday", action = clap::ArgAction::Append, value_parser = parse_weekday)]
    pub weekdays: Vec<String>,
    #[arg(long = "branch", action = clap::ArgAction::Append)]
    pub branches: Vec<String>,
}

impl FilterArgs {
    pub fn selection(&self) -> FilterSelection {
        FilterSelection::new()
            .with(Dimension::Category, self.categories.iter().cloned())
            .with(Dimension::Product, self.products.iter().cloned())
            .with(Dimension::Year, self.years.iter().map(|y| y.to_string()))
            .with(Dimension::Month, self.months.iter().cloned())
            .with(Dimension::Weekday, self.weekdays.iter().cloned())
            .with(Dimension::Branch, self.branches.iter().cloned())
    }
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Emit the structure report as JSON
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct CategorizeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Destination CSV file (defaults to stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// YAML catalog of `{ category, products }` entries replacing the built-in one
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Directory receiving a timestamped export file
    #[arg(long = "output-dir", default_value = ".", conflicts_with = "output")]
    pub output_dir: PathBuf,
    /// Explicit destination file (`-` for stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SampleArgs {
    /// Destination CSV file (defaults to stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    #[arg(long, default_value_t = 1000)]
    pub records: usize,
    /// First date in the generated range (YYYY-MM-DD)
    #[arg(long, default_value = "2024-01-01", value_parser = parse_date_arg)]
    pub start: NaiveDate,
    /// Last date in the generated range (YYYY-MM-DD)
    #[arg(long, default_value = "2024-12-31", value_parser = parse_date_arg)]
    pub end: NaiveDate,
    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

fn parse_month(value: &str) -> Result<String, String> {
    calendar::month_code(value.trim())
        .map(|_| value.trim().to_string())
        .ok_or_else(|| format!("Unknown month '{value}' (expected one of {})", MONTH_NAMES.join(", ")))
}

fn parse_weekday(value: &str) -> Result<String, String> {
    calendar::weekday_code(value.trim())
        .map(|_| value.trim().to_string())
        .ok_or_else(|| {
            format!(
                "Unknown weekday '{value}' (expected one of {})",
                WEEKDAY_NAMES.join(", ")
            )
        })
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| format!("Invalid date '{value}': {err}"))
}
