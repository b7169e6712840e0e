pub mod aggregate;
pub mod calendar;
pub mod categorize;
pub mod cli;
pub mod data;
pub mod export;
pub mod filter;
pub mod io_utils;
pub mod record;
pub mod report;
pub mod sample;
pub mod schema;
pub mod table;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    aggregate::Analysis,
    categorize::CategoryCatalog,
    cli::{Cli, Commands, FilterArgs, InputArgs, OutputFormat},
    filter::{Dimension, FilterOptions, FilterSelection},
    record::{RawTable, SalesTable},
    schema::SchemaError,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("menta_sales", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Validate(args) => handle_validate(&args),
        Commands::Categorize(args) => handle_categorize(&args),
        Commands::Options(args) => handle_options(&args),
        Commands::Report(args) => handle_report(&args),
        Commands::Export(args) => handle_export(&args),
        Commands::Sample(args) => handle_sample(&args),
    }
}

fn read_input(args: &InputArgs) -> Result<RawTable> {
    info!(
        "Reading '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(io_utils::resolve_input_delimiter(&args.input, args.delimiter))
    );
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let raw = io_utils::read_raw_table(&args.input, args.delimiter, encoding)
        .with_context(|| format!("Reading sales data from {:?}", args.input))?;
    debug!(
        "Loaded {} row(s) across {} column(s)",
        raw.row_count(),
        raw.headers.len()
    );
    Ok(raw)
}

pub fn load_table(args: &InputArgs) -> Result<SalesTable> {
    let raw = read_input(args)?;
    let table = schema::validate(&raw)?;
    info!(
        "Validated {} record(s); {} cell(s) treated as missing",
        table.len(),
        table.coercion.total()
    );
    Ok(table)
}

/// Drops selected values the data no longer offers. Products are only offered
/// for the chosen categories, so losing every product lifts that constraint.
/// Any other constrained dimension losing every value makes the selection
/// unsatisfiable and yields `None`.
fn prepare_selection(table: &SalesTable, filters: &FilterArgs) -> Option<FilterSelection> {
    let mut selection = filters.selection();
    let constrained = Dimension::ALL
        .into_iter()
        .filter(|dim| *dim != Dimension::Product && selection.is_constrained(*dim))
        .collect::<Vec<_>>();
    let options = FilterOptions::from_table(table, &selection);
    for (dimension, value) in selection.retain_available(&options) {
        warn!("Ignoring {dimension} '{value}': not available for the current selection");
    }
    let emptied = constrained
        .into_iter()
        .filter(|dim| !selection.is_constrained(*dim))
        .collect::<Vec<_>>();
    if emptied.is_empty() {
        Some(selection)
    } else {
        for dimension in emptied {
            warn!("No {dimension} value in the selection is present in the data");
        }
        None
    }
}

fn handle_validate(args: &cli::ValidateArgs) -> Result<()> {
    let raw = read_input(&args.input)?;
    let structure = schema::inspect(&raw);
    match args.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&structure).context("Serializing structure report")?
        ),
        OutputFormat::Text => {
            let summary = &structure.summary;
            let rows = vec![
                vec!["records".to_string(), summary.total_records.to_string()],
                vec!["first date".to_string(), data::format_date(summary.first_date)],
                vec!["last date".to_string(), data::format_date(summary.last_date)],
                vec!["categories".to_string(), summary.categories.to_string()],
                vec!["products".to_string(), summary.products.to_string()],
                vec!["branches".to_string(), summary.branches.to_string()],
                vec!["extra columns".to_string(), structure.extra_columns.join(", ")],
            ];
            table::print_table(
                &["property".to_string(), "value".to_string()],
                &rows,
                &[],
            );
        }
    }
    if !structure.valid {
        return Err(anyhow!(SchemaError::MissingColumns {
            columns: structure.missing_columns,
        }));
    }
    let table = schema::validate(&raw)?;
    info!(
        "'{}' satisfies the column contract ({} cell(s) treated as missing)",
        args.input.input.display(),
        table.coercion.total()
    );
    Ok(())
}

fn handle_categorize(args: &cli::CategorizeArgs) -> Result<()> {
    let catalog = match &args.catalog {
        Some(path) => CategoryCatalog::load(path)?,
        None => CategoryCatalog::built_in()?,
    };
    let raw = read_input(&args.input)?;
    let (enriched, _) = categorize::enrich(&raw, &catalog)
        .with_context(|| format!("Categorizing {:?}", args.input.input))?;
    write_raw(&enriched, args.output.as_deref())?;
    if let Some(path) = &args.output {
        info!("Categorized table written to {path:?}");
    }
    Ok(())
}

fn handle_options(args: &cli::OptionsArgs) -> Result<()> {
    let table = load_table(&args.input)?;
    let options = FilterOptions::from_table(&table, &args.filters.selection());
    match args.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&options).context("Serializing filter options")?
        ),
        OutputFormat::Text => {
            let rows = Dimension::ALL
                .iter()
                .map(|dim| vec![dim.to_string(), options.values(*dim).join(", ")])
                .collect::<Vec<_>>();
            table::print_table(
                &["dimension".to_string(), "values".to_string()],
                &rows,
                &[],
            );
        }
    }
    Ok(())
}

fn handle_report(args: &cli::ReportArgs) -> Result<()> {
    let table = load_table(&args.input)?;
    let (analysis, filtered) = match prepare_selection(&table, &args.filters) {
        Some(selection) => {
            let view = filter::apply_filters(&table, &selection);
            (aggregate::analyze(&view, &selection), view.len())
        }
        None => (Analysis::Empty, 0),
    };
    info!("Filters kept {} of {} record(s)", filtered, table.len());
    let rendered = match args.format {
        OutputFormat::Json => report::render_json(&analysis, table.len(), filtered)?,
        OutputFormat::Text => report::render_text(&analysis, table.len(), filtered),
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn handle_export(args: &cli::ExportArgs) -> Result<()> {
    let table = load_table(&args.input)?;
    let empty = SalesTable::default();
    let view = match prepare_selection(&table, &args.filters) {
        Some(selection) => filter::apply_filters(&table, &selection),
        None => empty.view(),
    };
    match &args.output {
        Some(path) => {
            if view.is_empty() {
                info!("Filtered result is empty; nothing to export");
                return Ok(());
            }
            let rows = export::export_to(&view, Some(path.as_path()))
                .with_context(|| format!("Exporting filtered rows to {path:?}"))?;
            if !io_utils::is_dash(path) {
                info!("Exported {rows} row(s) to {path:?}");
            }
        }
        None => {
            if let Some(path) = export::export_to_directory(&view, &args.output_dir)? {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

fn handle_sample(args: &cli::SampleArgs) -> Result<()> {
    let options = sample::SampleOptions {
        records: args.records,
        start: args.start,
        end: args.end,
        seed: args.seed,
    };
    let raw = sample::generate(&options)?;
    write_raw(&raw, args.output.as_deref())?;
    info!(
        "Generated {} sample record(s) between {} and {}",
        raw.row_count(),
        args.start,
        args.end
    );
    Ok(())
}

fn write_raw(raw: &RawTable, output: Option<&Path>) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(output, io_utils::DEFAULT_CSV_DELIMITER)?;
    writer
        .write_record(&raw.headers)
        .context("Writing output headers")?;
    for (idx, row) in raw.rows.iter().enumerate() {
        writer
            .write_record(row)
            .with_context(|| format!("Writing output row {}", idx + 2))?;
    }
    writer.flush().context("Flushing output")?;
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
