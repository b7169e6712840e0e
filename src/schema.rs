//! Required-column contract and typed loading of sales tables.
//!
//! [`validate`] checks a [`RawTable`] against [`REQUIRED_COLUMNS`] and coerces
//! each row into a [`SalesRecord`]. A missing column aborts the load with
//! [`SchemaError::MissingColumns`]; an unparseable cell does not. It becomes a
//! missing marker and is tallied in the table's [`CoercionReport`].
//!
//! [`inspect`] produces a non-fatal structure report (missing and extra
//! columns plus a short summary) for any raw table.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

use crate::{
    categorize::UNKNOWN_CATEGORY,
    data::{parse_date_cell, parse_integer_cell, parse_number_cell},
    record::{CoercionReport, RawTable, SalesRecord, SalesTable},
};

pub const COL_PRODUCT_CODE: &str = "COD PRD";
pub const COL_DESCRIPTION: &str = "DESCRIPCION";
pub const COL_BRANCH: &str = "SUCURSAL";
pub const COL_DATE: &str = "FECHA";
pub const COL_CATEGORY: &str = "CATEGORIA";
pub const COL_YEAR: &str = "YEAR";
pub const COL_MONTH: &str = "MONTH";
pub const COL_WEEKDAY: &str = "L a D";
pub const COL_TRANSACTION: &str = "Nº TRANS.";
pub const COL_CUSTOMER: &str = "CLIENTE";
pub const COL_QUANTITY: &str = "CANTIDAD";
pub const COL_PRICE: &str = "PRECIO";
pub const COL_VALUE: &str = "VALOR";
pub const COL_BS: &str = "BS";

pub const COL_MONTH_NAME: &str = "MONTH_NAME";
pub const COL_WEEKDAY_NAME: &str = "WEEKDAY_NAME";

pub const REQUIRED_COLUMNS: [&str; 14] = [
    COL_PRODUCT_CODE,
    COL_DESCRIPTION,
    COL_BRANCH,
    COL_DATE,
    COL_CATEGORY,
    COL_YEAR,
    COL_MONTH,
    COL_WEEKDAY,
    COL_TRANSACTION,
    COL_CUSTOMER,
    COL_QUANTITY,
    COL_PRICE,
    COL_VALUE,
    COL_BS,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Missing required column(s): {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },
}

/// Required columns absent from `headers`, in contract order.
pub fn missing_columns(headers: &[String]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|header| header == *required))
        .map(|required| required.to_string())
        .collect()
}

struct ColumnPositions {
    product_code: usize,
    description: usize,
    branch: usize,
    date: usize,
    category: usize,
    year: usize,
    month: usize,
    weekday: usize,
    transaction: usize,
    customer: usize,
    quantity: usize,
    price: usize,
    value: usize,
    bs: usize,
}

impl ColumnPositions {
    fn resolve(raw: &RawTable) -> Result<Self, SchemaError> {
        let missing = missing_columns(&raw.headers);
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns { columns: missing });
        }
        // every lookup below is guaranteed by the check above
        let at = |name: &str| raw.column_index(name).unwrap_or_default();
        Ok(Self {
            product_code: at(COL_PRODUCT_CODE),
            description: at(COL_DESCRIPTION),
            branch: at(COL_BRANCH),
            date: at(COL_DATE),
            category: at(COL_CATEGORY),
            year: at(COL_YEAR),
            month: at(COL_MONTH),
            weekday: at(COL_WEEKDAY),
            transaction: at(COL_TRANSACTION),
            customer: at(COL_CUSTOMER),
            quantity: at(COL_QUANTITY),
            price: at(COL_PRICE),
            value: at(COL_VALUE),
            bs: at(COL_BS),
        })
    }
}

/// Validates the column contract and coerces every row. The input is not modified.
pub fn validate(raw: &RawTable) -> Result<SalesTable, SchemaError> {
    let positions = ColumnPositions::resolve(raw)?;
    let mut coercion = CoercionReport::default();
    let records = (0..raw.row_count())
        .map(|row| coerce_row(raw, row, &positions, &mut coercion))
        .collect::<Vec<_>>();

    if !coercion.is_empty() {
        for (column, count) in coercion.entries() {
            warn!("{count} cell(s) in column '{column}' could not be parsed and were left empty");
        }
    }
    debug!("Validated {} record(s)", records.len());
    Ok(SalesTable { records, coercion })
}

fn coerce_row(
    raw: &RawTable,
    row: usize,
    positions: &ColumnPositions,
    coercion: &mut CoercionReport,
) -> SalesRecord {
    let text = |column: usize| raw.cell(row, column).trim().to_string();
    let mut number = |column: usize, name: &str| match parse_number_cell(raw.cell(row, column)) {
        Ok(value) => value,
        Err(err) => {
            debug!("Row {}: {err:#}", row + 2);
            coercion.record(name);
            None
        }
    };
    let quantity = number(positions.quantity, COL_QUANTITY);
    let price = number(positions.price, COL_PRICE);
    let value = number(positions.value, COL_VALUE);
    let bs = number(positions.bs, COL_BS);

    let date = coerce_date(raw.cell(row, positions.date), row, coercion);
    let year = coerce_code(raw.cell(row, positions.year), COL_YEAR, row, coercion, |code| {
        i32::try_from(code).ok()
    });
    let month = coerce_code(raw.cell(row, positions.month), COL_MONTH, row, coercion, |code| {
        u32::try_from(code).ok().filter(|month| (1..=12).contains(month))
    });
    let weekday = coerce_code(raw.cell(row, positions.weekday), COL_WEEKDAY, row, coercion, |code| {
        u32::try_from(code).ok().filter(|weekday| (1..=7).contains(weekday))
    });
    let category = match text(positions.category) {
        category if category.is_empty() => UNKNOWN_CATEGORY.to_string(),
        category => category,
    };

    SalesRecord {
        product_code: text(positions.product_code),
        description: text(positions.description),
        branch: text(positions.branch),
        date,
        category,
        year,
        month,
        weekday,
        transaction_id: text(positions.transaction),
        customer_id: text(positions.customer),
        quantity,
        price,
        value,
        bs,
    }
}

fn coerce_date(cell: &str, row: usize, coercion: &mut CoercionReport) -> Option<NaiveDate> {
    match parse_date_cell(cell) {
        Ok(date) => date,
        Err(err) => {
            debug!("Row {}: {err:#}", row + 2);
            coercion.record(COL_DATE);
            None
        }
    }
}

/// Parses an integer code and narrows it with `convert`; codes `convert`
/// rejects are counted like unparseable cells.
fn coerce_code<T>(
    cell: &str,
    column: &str,
    row: usize,
    coercion: &mut CoercionReport,
    convert: impl Fn(i64) -> Option<T>,
) -> Option<T> {
    match parse_integer_cell(cell) {
        Ok(Some(code)) => {
            let converted = convert(code);
            if converted.is_none() {
                debug!("Row {}: {code} is out of range for '{column}'", row + 2);
                coercion.record(column);
            }
            converted
        }
        Ok(None) => None,
        Err(err) => {
            debug!("Row {}: {err:#}", row + 2);
            coercion.record(column);
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureSummary {
    pub total_records: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub categories: usize,
    pub products: usize,
    pub branches: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureReport {
    pub valid: bool,
    pub missing_columns: Vec<String>,
    pub extra_columns: Vec<String>,
    pub summary: StructureSummary,
}

/// Describes how a raw table lines up with the column contract without failing.
pub fn inspect(raw: &RawTable) -> StructureReport {
    let missing_columns = missing_columns(&raw.headers);
    let extra_columns = raw
        .headers
        .iter()
        .filter(|header| !REQUIRED_COLUMNS.contains(&header.as_str()))
        .cloned()
        .collect::<Vec<_>>();

    let distinct = |name: &str| -> usize {
        raw.column_index(name)
            .map(|column| {
                (0..raw.row_count())
                    .map(|row| raw.cell(row, column).trim())
                    .collect::<BTreeSet<_>>()
                    .len()
            })
            .unwrap_or(0)
    };
    let dates = raw
        .column_index(COL_DATE)
        .map(|column| {
            (0..raw.row_count())
                .filter_map(|row| parse_date_cell(raw.cell(row, column)).ok().flatten())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    StructureReport {
        valid: missing_columns.is_empty(),
        missing_columns,
        extra_columns,
        summary: StructureSummary {
            total_records: raw.row_count(),
            first_date: dates.iter().min().copied(),
            last_date: dates.iter().max().copied(),
            categories: distinct(COL_CATEGORY),
            products: distinct(COL_DESCRIPTION),
            branches: distinct(COL_BRANCH),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_without(skip: &[&str]) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|name| !skip.contains(name))
            .map(|name| name.to_string())
            .collect()
    }

    fn row(values: [&str; 14]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn missing_category_column_is_reported_by_name() {
        let raw = RawTable::new(headers_without(&[COL_CATEGORY]), Vec::new());
        let err = validate(&raw).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumns {
                columns: vec!["CATEGORIA".to_string()]
            }
        );
    }

    #[test]
    fn every_missing_column_is_listed_in_contract_order() {
        let raw = RawTable::new(headers_without(&[COL_BS, COL_WEEKDAY, COL_TRANSACTION]), Vec::new());
        let SchemaError::MissingColumns { columns } = validate(&raw).unwrap_err();
        assert_eq!(columns, vec!["L a D", "Nº TRANS.", "BS"]);
    }

    #[test]
    fn column_names_are_case_sensitive() {
        let mut headers = headers_without(&[]);
        headers[0] = "cod prd".to_string();
        let SchemaError::MissingColumns { columns } =
            validate(&RawTable::new(headers, Vec::new())).unwrap_err();
        assert_eq!(columns, vec!["COD PRD"]);
    }

    #[test]
    fn unparseable_cells_become_missing_without_dropping_rows() {
        let raw = RawTable::new(
            headers_without(&[]),
            vec![
                row([
                    "P1", "SOPA", "16J", "2024-01-01", "Almuerzos", "2024", "1", "1", "T1",
                    "CLI1", "2", "10", "20", "20",
                ]),
                row([
                    "P2", "TE", "FA", "ayer", "Otras", "2024", "1", "1", "T2", "CLI2", "uno",
                    "5", "", "5",
                ]),
            ],
        );
        let table = validate(&raw).expect("valid schema");
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.records[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(table.records[1].date, None);
        assert_eq!(table.records[1].quantity, None);
        assert_eq!(table.records[1].value, None);
        assert_eq!(table.coercion.count(COL_DATE), 1);
        assert_eq!(table.coercion.count(COL_QUANTITY), 1);
        // blank cells are missing but not a coercion failure
        assert_eq!(table.coercion.count(COL_VALUE), 0);
    }

    #[test]
    fn blank_category_resolves_to_unknown() {
        let raw = RawTable::new(
            headers_without(&[]),
            vec![row([
                "P1", "SOPA", "16J", "2024-01-01", "   ", "2024", "1", "1", "T1", "CLI1", "1",
                "10", "10", "10",
            ])],
        );
        let table = validate(&raw).unwrap();
        assert_eq!(table.records[0].category, UNKNOWN_CATEGORY);
        assert!(table.coercion.is_empty());
    }

    #[test]
    fn out_of_range_codes_are_counted_as_coerced() {
        let raw = RawTable::new(
            headers_without(&[]),
            vec![
                row([
                    "P1", "SOPA", "16J", "2024-01-01", "A", "2024", "13", "8", "T1", "CLI1", "1",
                    "10", "10", "10",
                ]),
                row([
                    "P2", "TE", "FA", "2024-01-01", "A", "99999999999", "0", "7", "T2", "CLI2",
                    "1", "5", "5", "5",
                ]),
            ],
        );
        let table = validate(&raw).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].month, None);
        assert_eq!(table.records[0].weekday, None);
        assert_eq!(table.records[1].year, None);
        assert_eq!(table.records[1].month, None);
        assert_eq!(table.records[1].weekday, Some(7));
        assert_eq!(table.coercion.count(COL_MONTH), 2);
        assert_eq!(table.coercion.count(COL_WEEKDAY), 1);
        assert_eq!(table.coercion.count(COL_YEAR), 1);
    }

    #[test]
    fn columns_may_appear_in_any_order_with_extras() {
        let mut headers = headers_without(&[]);
        headers.reverse();
        headers.push("NOTAS".to_string());
        let mut values = vec![
            "P1", "SOPA", "16J", "2024-02-05", "Almuerzos", "2024", "2", "1", "T1", "CLI1",
            "2", "10", "20", "21",
        ];
        values.reverse();
        values.push("extra");
        let raw = RawTable::new(
            headers,
            vec![values.into_iter().map(String::from).collect()],
        );
        let table = validate(&raw).unwrap();
        let record = &table.records[0];
        assert_eq!(record.product_code, "P1");
        assert_eq!(record.bs, Some(21.0));
        assert_eq!(record.month_name(), Some("Febrero"));

        let report = inspect(&raw);
        assert!(report.valid);
        assert_eq!(report.extra_columns, vec!["NOTAS"]);
        assert_eq!(report.summary.total_records, 1);
    }

    #[test]
    fn inspect_reports_missing_columns_without_failing() {
        let raw = RawTable::new(
            vec!["DESCRIPCION".to_string(), "FECHA".to_string()],
            vec![
                vec!["SOPA".to_string(), "2024-03-01".to_string()],
                vec!["TE".to_string(), "2024-01-15".to_string()],
            ],
        );
        let report = inspect(&raw);
        assert!(!report.valid);
        assert_eq!(report.missing_columns.len(), 12);
        assert_eq!(report.summary.products, 2);
        assert_eq!(report.summary.first_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(report.summary.last_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(report.summary.branches, 0);
    }
}
