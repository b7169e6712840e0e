#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use tempfile::{TempDir, tempdir};

pub const HEADER: &str = "COD PRD,DESCRIPCION,SUCURSAL,FECHA,CATEGORIA,YEAR,MONTH,L a D,Nº TRANS.,CLIENTE,CANTIDAD,PRECIO,VALOR,BS";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes a sales CSV with the full required header.
    pub fn write_sales(&self, name: &str, rows: &[String]) -> PathBuf {
        let mut contents = String::from(HEADER);
        contents.push('\n');
        for row in rows {
            contents.push_str(row);
            contents.push('\n');
        }
        self.write(name, &contents)
    }
}

/// One CSV line with YEAR, MONTH and `L a D` derived from `date`.
pub fn sales_row(date: &str, category: &str, description: &str, branch: &str, value: f64) -> String {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("fixture date");
    format!(
        "PRD001,{description},{branch},{date},{category},{},{},{},T000001,CLI0001,1,{value},{value},{value}",
        parsed.year(),
        parsed.month(),
        parsed.weekday().number_from_monday()
    )
}

/// The three-row table used for the worked KPI example.
pub fn worked_example_rows() -> Vec<String> {
    vec![
        sales_row("2024-01-01", "A", "SOPA", "16J", 100.0),
        sales_row("2024-01-01", "B", "TE", "FA", 50.0),
        sales_row("2024-01-02", "A", "SOPA", "16J", 30.0),
    ]
}
