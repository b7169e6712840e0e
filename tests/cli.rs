mod common;

use std::fs;

use assert_cmd::Command;
use common::{TestWorkspace, sales_row, worked_example_rows};
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn menta() -> Command {
    Command::cargo_bin("menta-sales").expect("binary exists")
}

#[test]
fn validate_reports_missing_category_column() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "ventas.csv",
        "COD PRD,DESCRIPCION,SUCURSAL,FECHA,YEAR,MONTH,L a D,Nº TRANS.,CLIENTE,CANTIDAD,PRECIO,VALOR,BS,EXTRA\n\
         PRD001,SOPA,16J,2024-01-01,2024,1,1,T1,CLI0001,1,10,10,10,x\n",
    );
    menta()
        .args(["validate", "-i", path.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(contains("EXTRA"))
        .stderr(contains("Missing required column(s): CATEGORIA"));
}

#[test]
fn validate_json_summarizes_structure() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_sales("ventas.csv", &worked_example_rows());
    let output = menta()
        .args(["validate", "-i", path.to_str().unwrap(), "--format", "json"])
        .output()
        .expect("run validate");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["valid"], true);
    assert_eq!(report["summary"]["total_records"], 3);
    assert_eq!(report["summary"]["first_date"], "2024-01-01");
    assert_eq!(report["summary"]["categories"], 2);
}

#[test]
fn report_prints_kpis_for_selection() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_sales("ventas.csv", &worked_example_rows());
    menta()
        .args(["report", "-i", path.to_str().unwrap(), "--category", "A"])
        .assert()
        .success()
        .stdout(contains("Records: 2 of 3 loaded"))
        .stdout(contains("Bs. 130"))
        .stdout(contains("Top 15 products in selected categories"));
}

#[test]
fn report_json_exposes_analysis() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_sales("ventas.csv", &worked_example_rows());
    let output = menta()
        .args(["report", "-i", path.to_str().unwrap(), "--format", "json"])
        .output()
        .expect("run report");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["status"], "ready");
    assert_eq!(report["kpis"]["total_sales"], 180.0);
    assert_eq!(report["kpis"]["average_daily_sales"], 90.0);
    assert_eq!(report["views"]["weekday_totals"].as_array().unwrap().len(), 7);
    assert_eq!(report["views"]["heatmap"]["totals"].as_array().unwrap().len(), 12);
}

fn report_json(args: &[&str]) -> serde_json::Value {
    let output = menta().args(args).output().expect("run report");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("json")
}

#[test]
fn product_filter_follows_selected_categories() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_sales("ventas.csv", &worked_example_rows());
    let input = path.to_str().unwrap();

    // without a category the product flag is ignored rather than matching nothing
    let alone = report_json(&["report", "-i", input, "--product", "SOPA", "--format", "json"]);
    assert_eq!(alone["status"], "ready");
    assert_eq!(alone["filtered_records"], 3);

    let matching = report_json(&[
        "report", "-i", input, "--category", "A", "--product", "SOPA", "--format", "json",
    ]);
    assert_eq!(matching["filtered_records"], 2);
    assert_eq!(matching["kpis"]["total_sales"], 130.0);

    // SOPA is not offered under B, so only the category constraint remains
    let foreign = report_json(&[
        "report", "-i", input, "--category", "B", "--product", "SOPA", "--format", "json",
    ]);
    assert_eq!(foreign["filtered_records"], 1);
    assert_eq!(foreign["kpis"]["total_sales"], 50.0);
}

#[test]
fn report_without_matches_prints_notice() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_sales("ventas.csv", &worked_example_rows());
    menta()
        .args(["report", "-i", path.to_str().unwrap(), "--weekday", "Domingo"])
        .assert()
        .success()
        .stdout(contains("No data matches the selected filters."))
        .stdout(contains("Key indicators").not());
}

#[test]
fn export_writes_timestamped_file() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_sales("ventas.csv", &worked_example_rows());
    let out_dir = workspace.path().join("exports");
    menta()
        .args([
            "export",
            "-i",
            path.to_str().unwrap(),
            "--branch",
            "FA",
            "--output-dir",
            out_dir.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("ventas_menta_filtrado_"));

    let files = fs::read_dir(&out_dir)
        .expect("export dir")
        .map(|entry| entry.expect("entry").path())
        .collect::<Vec<_>>();
    assert_eq!(files.len(), 1);
    let contents = fs::read_to_string(&files[0]).expect("read export");
    let lines = contents.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("\"MONTH_NAME\",\"WEEKDAY_NAME\""));
    assert!(lines[1].contains("\"TE\""));
    assert!(lines[1].ends_with("\"Enero\",\"Lunes\""));
}

#[test]
fn export_skips_empty_result() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_sales("ventas.csv", &worked_example_rows());
    let out_dir = workspace.path().join("exports");
    menta()
        .args([
            "export",
            "-i",
            path.to_str().unwrap(),
            "--branch",
            "SCZ",
            "--output-dir",
            out_dir.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert!(!out_dir.exists());
}

#[test]
fn options_list_products_for_chosen_category() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_sales(
        "ventas.csv",
        &[
            sales_row("2024-03-04", "Sopas", "SOPA DEL DIA", "16J", 20.0),
            sales_row("2024-03-05", "Bebidas", "TE VERDE", "FA", 8.0),
        ],
    );
    let output = menta()
        .args([
            "options",
            "-i",
            path.to_str().unwrap(),
            "--category",
            "Sopas",
            "--format",
            "json",
        ])
        .output()
        .expect("run options");
    assert!(output.status.success());
    let options: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(options["values"]["product"], serde_json::json!(["SOPA DEL DIA"]));
    assert_eq!(options["values"]["month"], serde_json::json!(["Marzo"]));
    assert_eq!(options["values"]["branch"], serde_json::json!(["16J", "FA"]));
}

#[test]
fn categorize_fills_category_from_catalog() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sin_categoria.csv", "DESCRIPCION,VALOR\nsopa del dia,10\nMISTERIO,5\n");
    let catalog = workspace.write(
        "catalogo.yaml",
        "- category: Sopas\n  products:\n    - SOPA DEL DIA\n",
    );
    let output = workspace.path().join("categorizado.csv");
    menta()
        .args([
            "categorize",
            "-i",
            input.to_str().unwrap(),
            "--catalog",
            catalog.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&output).expect("read output");
    let lines = contents.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "\"DESCRIPCION\",\"VALOR\",\"CATEGORIA\"");
    assert_eq!(lines[1], "\"sopa del dia\",\"10\",\"Sopas\"");
    assert_eq!(lines[2], "\"MISTERIO\",\"5\",\"Categoria desconocida\"");
}

#[test]
fn sample_output_passes_validation() {
    let workspace = TestWorkspace::new();
    let sample = workspace.path().join("muestra.csv");
    menta()
        .args([
            "sample",
            "--records",
            "50",
            "--seed",
            "9",
            "-o",
            sample.to_str().unwrap(),
        ])
        .assert()
        .success();
    menta()
        .args(["validate", "-i", sample.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("50"));
}
