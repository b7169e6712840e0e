//! CSV download of a filtered view.
//!
//! Output carries the fourteen contract columns followed by the derived
//! `MONTH_NAME` and `WEEKDAY_NAME`. Missing cells are written empty.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use log::info;

use crate::{
    data::{format_date, format_number},
    io_utils,
    record::{SalesRecord, SalesView},
    schema::{COL_MONTH_NAME, COL_WEEKDAY_NAME, REQUIRED_COLUMNS},
};

pub const EXPORT_FILE_PREFIX: &str = "ventas_menta_filtrado";

pub fn export_file_name(generated_at: NaiveDateTime) -> String {
    format!(
        "{EXPORT_FILE_PREFIX}_{}.csv",
        generated_at.format("%Y%m%d_%H%M%S")
    )
}

pub fn export_headers() -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .chain([COL_MONTH_NAME, COL_WEEKDAY_NAME])
        .collect()
}

fn record_fields(record: &SalesRecord) -> Vec<String> {
    let number = |value: Option<f64>| value.map(format_number).unwrap_or_default();
    let code = |value: Option<u32>| value.map(|v| v.to_string()).unwrap_or_default();
    vec![
        record.product_code.clone(),
        record.description.clone(),
        record.branch.clone(),
        format_date(record.date),
        record.category.clone(),
        record.year.map(|y| y.to_string()).unwrap_or_default(),
        code(record.month),
        code(record.weekday),
        record.transaction_id.clone(),
        record.customer_id.clone(),
        number(record.quantity),
        number(record.price),
        number(record.value),
        number(record.bs),
        record.month_name().unwrap_or_default().to_string(),
        record.weekday_name().unwrap_or_default().to_string(),
    ]
}

/// Writes the header and every row of `view`; returns the number of rows.
pub fn write_view<W: Write>(writer: &mut csv::Writer<W>, view: &SalesView<'_>) -> Result<usize> {
    writer
        .write_record(export_headers())
        .context("Writing export header")?;
    for (idx, record) in view.iter().enumerate() {
        writer
            .write_record(record_fields(record))
            .with_context(|| format!("Writing export row {}", idx + 1))?;
    }
    writer.flush().context("Flushing export")?;
    Ok(view.len())
}

/// Writes the view to `output` (stdout for `None` or `-`).
pub fn export_to(view: &SalesView<'_>, output: Option<&Path>) -> Result<usize> {
    let mut writer = io_utils::open_csv_writer(output, io_utils::DEFAULT_CSV_DELIMITER)?;
    write_view(&mut writer, view)
}

/// Writes the view into `directory` under a timestamped name. An empty view
/// writes nothing and returns `None`.
pub fn export_to_directory(view: &SalesView<'_>, directory: &Path) -> Result<Option<PathBuf>> {
    if view.is_empty() {
        info!("Filtered result is empty; nothing to export");
        return Ok(None);
    }
    std::fs::create_dir_all(directory)
        .with_context(|| format!("Creating export directory {directory:?}"))?;
    let path = directory.join(export_file_name(Local::now().naive_local()));
    let rows = export_to(view, Some(&path))?;
    info!("Exported {rows} row(s) to {:?}", path);
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{SalesTable, fixtures::record};
    use chrono::NaiveDate;

    #[test]
    fn file_name_embeds_generation_timestamp() {
        let at = NaiveDate::from_ymd_opt(2025, 6, 30)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap();
        assert_eq!(
            export_file_name(at),
            "ventas_menta_filtrado_20250630_140509.csv"
        );
    }

    #[test]
    fn export_appends_derived_name_columns() {
        let mut missing = record(None, "B", "TE", "FA", None);
        missing.month = None;
        missing.weekday = None;
        let table = SalesTable::new(vec![
            record(Some((2024, 1, 1)), "A", "SOPA", "16J", Some(12.5)),
            missing,
        ]);
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        let rows = write_view(&mut writer, &table.view()).unwrap();
        assert_eq!(rows, 2);
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(
            lines[0],
            "COD PRD,DESCRIPCION,SUCURSAL,FECHA,CATEGORIA,YEAR,MONTH,L a D,Nº TRANS.,CLIENTE,CANTIDAD,PRECIO,VALOR,BS,MONTH_NAME,WEEKDAY_NAME"
        );
        assert_eq!(
            lines[1],
            "PRD000,SOPA,16J,2024-01-01,A,2024,1,1,T000001,CLI0001,1,12.5,12.5,12.5,Enero,Lunes"
        );
        assert_eq!(lines[2], "PRD000,TE,FA,,B,,,,T000001,CLI0001,1,,,,,");
    }

    #[test]
    fn empty_view_is_not_exported() {
        let dir = tempfile::tempdir().unwrap();
        let table = SalesTable::default();
        assert_eq!(export_to_directory(&table.view(), dir.path()).unwrap(), None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
