//! Text and JSON rendering of an [`Analysis`] for the command-line consumer.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    aggregate::{Analysis, KpiSet, LabeledTotal, ViewSet},
    table::{Align, render_aligned},
};

pub const EMPTY_NOTICE: &str = "No data matches the selected filters.";

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    loaded_records: usize,
    filtered_records: usize,
    #[serde(flatten)]
    analysis: &'a Analysis,
}

pub fn render_json(analysis: &Analysis, loaded: usize, filtered: usize) -> Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        loaded_records: loaded,
        filtered_records: filtered,
        analysis,
    })
    .context("Serializing report as JSON")
}

pub fn render_text(analysis: &Analysis, loaded: usize, filtered: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Records: {} of {} loaded",
        group_thousands(filtered as f64, 0),
        group_thousands(loaded as f64, 0)
    );
    match analysis {
        Analysis::Empty => {
            let _ = writeln!(out, "\n{EMPTY_NOTICE}");
        }
        Analysis::Ready { kpis, views } => {
            render_kpis(&mut out, kpis);
            render_views(&mut out, views);
        }
    }
    out
}

fn render_kpis(out: &mut String, kpis: &KpiSet) {
    section(out, "Key indicators");
    let rows = vec![
        vec!["Total sales".to_string(), currency(kpis.total_sales)],
        vec!["Total quantity".to_string(), group_thousands(kpis.total_quantity, 0)],
        vec!["Days with sales".to_string(), kpis.days_with_sales.to_string()],
        vec!["Average daily sales".to_string(), currency(kpis.average_daily_sales)],
    ];
    out.push_str(&render_aligned(
        &headers(&["indicator", "value"]),
        &rows,
        &[Align::Left, Align::Right],
    ));

    if !kpis.sales_by_branch.is_empty() {
        section(out, "Sales by branch");
        let rows = kpis
            .sales_by_branch
            .iter()
            .map(|(branch, total)| vec![branch.clone(), currency(*total)])
            .collect::<Vec<_>>();
        out.push_str(&render_aligned(
            &headers(&["branch", "sales"]),
            &rows,
            &[Align::Left, Align::Right],
        ));
    }
}

fn render_views(out: &mut String, views: &ViewSet) {
    totals_section(out, "Sales by category", "category", &views.category_totals);
    totals_section(out, "Top 10 products", "product", &views.top_products);
    totals_section(out, "Bottom 10 products", "product", &views.bottom_products);

    section(out, "Monthly trend");
    let rows = views
        .monthly_trend
        .iter()
        .map(|point| vec![point.period.clone(), currency(point.total)])
        .collect::<Vec<_>>();
    out.push_str(&render_aligned(
        &headers(&["period", "sales"]),
        &rows,
        &[Align::Left, Align::Right],
    ));

    totals_section(out, "Sales by weekday", "weekday", &views.weekday_totals);

    section(out, "Month x weekday (thousands)");
    let mut heat_headers = vec!["month".to_string()];
    heat_headers.extend(views.heatmap.weekdays.iter().cloned());
    let rows = views
        .heatmap
        .months
        .iter()
        .enumerate()
        .map(|(m, month)| {
            std::iter::once(month.clone())
                .chain((0..views.heatmap.weekdays.len()).map(|w| views.heatmap.cell_label(m, w)))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let mut align = vec![Align::Left];
    align.extend(std::iter::repeat_n(Align::Right, views.heatmap.weekdays.len()));
    out.push_str(&render_aligned(&heat_headers, &rows, &align));

    section(out, "Quantity vs value by category");
    let rows = views
        .category_scatter
        .iter()
        .map(|point| {
            vec![
                point.category.clone(),
                group_thousands(point.quantity, 0),
                currency(point.total),
            ]
        })
        .collect::<Vec<_>>();
    out.push_str(&render_aligned(
        &headers(&["category", "quantity", "sales"]),
        &rows,
        &[Align::Left, Align::Right, Align::Right],
    ));

    section(out, "Cumulative sales");
    let rows = views
        .cumulative_trend
        .iter()
        .map(|point| vec![point.date.to_string(), currency(point.cumulative)])
        .collect::<Vec<_>>();
    out.push_str(&render_aligned(
        &headers(&["date", "cumulative"]),
        &rows,
        &[Align::Left, Align::Right],
    ));

    if !views.category_products.is_empty() {
        totals_section(
            out,
            "Top 15 products in selected categories",
            "product",
            &views.category_products,
        );
    }
}

fn totals_section(out: &mut String, title: &str, label: &str, totals: &[LabeledTotal]) {
    section(out, title);
    let rows = totals
        .iter()
        .map(|t| vec![t.label.clone(), currency(t.total)])
        .collect::<Vec<_>>();
    out.push_str(&render_aligned(
        &headers(&[label, "sales"]),
        &rows,
        &[Align::Left, Align::Right],
    ));
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n== {title} ==");
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

pub fn currency(value: f64) -> String {
    format!("Bs. {}", group_thousands(value, 0))
}

/// Formats with comma thousands separators and a fixed number of decimals.
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let rendered = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match rendered.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (rendered.as_str(), None),
    };
    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, ch) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && rendered.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match fraction {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aggregate::compute_views,
        aggregate::compute_kpis,
        record::{SalesTable, fixtures::record},
    };

    #[test]
    fn group_thousands_inserts_separators() {
        assert_eq!(group_thousands(0.0, 0), "0");
        assert_eq!(group_thousands(999.0, 0), "999");
        assert_eq!(group_thousands(1234567.0, 0), "1,234,567");
        assert_eq!(group_thousands(-1234.56, 1), "-1,234.6");
        assert_eq!(group_thousands(-0.2, 0), "0");
        assert_eq!(currency(15000.4), "Bs. 15,000");
    }

    #[test]
    fn text_report_lists_kpis_and_views() {
        let table = SalesTable::new(vec![
            record(Some((2024, 1, 1)), "A", "SOPA", "16J", Some(100.0)),
            record(Some((2024, 1, 2)), "B", "TE", "FA", Some(2500.0)),
        ]);
        let view = table.view();
        let analysis = Analysis::Ready {
            kpis: compute_kpis(&view),
            views: compute_views(&view, &[]),
        };
        let text = render_text(&analysis, 10, 2);
        assert!(text.contains("Records: 2 of 10 loaded"));
        assert!(text.contains("Bs. 2,600"));
        assert!(text.contains("== Sales by branch =="));
        assert!(text.contains("2024-Enero"));
        assert!(text.contains("Diciembre"));
        assert!(!text.contains("Top 15 products"));
    }

    #[test]
    fn empty_analysis_prints_notice() {
        let text = render_text(&Analysis::Empty, 10, 0);
        assert!(text.contains(EMPTY_NOTICE));
        assert!(!text.contains("Key indicators"));

        let json = render_json(&Analysis::Empty, 10, 0).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["status"], "empty");
        assert_eq!(parsed["loaded_records"], 10);
    }
}
