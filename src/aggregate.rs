//! KPIs and chart-ready aggregate views over a filtered sales view.
//!
//! Sums treat a missing `VALOR`/`CANTIDAD` cell as zero but never drop the row:
//! it still forms its product/category group and still counts its date. Rows
//! without a date are left out of the date-keyed aggregates (days with sales,
//! daily average, cumulative trend); rows without a usable year, month, or
//! weekday code are left out of the aggregates keyed on those fields.
//!
//! Descending rankings break ties on the label, ascending; ascending rankings
//! are the exact reverse of that order, so the top and bottom product lists
//! are the two ends of one sequence.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

use chrono::NaiveDate;
use itertools::Itertools;
use log::debug;
use serde::Serialize;

use crate::{
    calendar::{MONTH_NAMES, WEEKDAY_NAMES},
    filter::{Dimension, FilterSelection},
    record::{SalesRecord, SalesView},
};

pub const TOP_PRODUCTS: usize = 10;
pub const BOTTOM_PRODUCTS: usize = 10;
pub const CATEGORY_PRODUCTS: usize = 15;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiSet {
    pub total_sales: f64,
    pub total_quantity: f64,
    pub days_with_sales: usize,
    pub average_daily_sales: f64,
    pub sales_by_branch: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledTotal {
    pub label: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: u32,
    pub period: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPoint {
    pub category: String,
    pub quantity: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub cumulative: f64,
}

/// Month × weekday sales matrix on the canonical axes (12 rows, 7 columns).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub months: Vec<String>,
    pub weekdays: Vec<String>,
    pub totals: Vec<Vec<f64>>,
    /// `totals` in thousands, rounded to one decimal.
    pub thousands: Vec<Vec<f64>>,
}

impl Heatmap {
    fn from_totals(totals: Vec<Vec<f64>>) -> Self {
        let thousands = totals
            .iter()
            .map(|row| row.iter().map(|value| in_thousands(*value)).collect())
            .collect();
        Self {
            months: MONTH_NAMES.iter().map(|m| m.to_string()).collect(),
            weekdays: WEEKDAY_NAMES.iter().map(|w| w.to_string()).collect(),
            totals,
            thousands,
        }
    }

    pub fn cell_label(&self, month: usize, weekday: usize) -> String {
        let value = self
            .thousands
            .get(month)
            .and_then(|row| row.get(weekday))
            .copied()
            .unwrap_or(0.0);
        format!("{value:.1}")
    }
}

fn in_thousands(value: f64) -> f64 {
    (value / 100.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSet {
    pub record_count: usize,
    pub category_totals: Vec<LabeledTotal>,
    pub top_products: Vec<LabeledTotal>,
    pub bottom_products: Vec<LabeledTotal>,
    pub monthly_trend: Vec<MonthlyPoint>,
    pub weekday_totals: Vec<LabeledTotal>,
    pub heatmap: Heatmap,
    pub category_scatter: Vec<CategoryPoint>,
    pub cumulative_trend: Vec<CumulativePoint>,
    pub category_products: Vec<LabeledTotal>,
}

impl ViewSet {
    /// False when the views were computed from an empty view and there is
    /// nothing to chart.
    pub fn has_data(&self) -> bool {
        self.record_count > 0
    }
}

/// Result of a full analysis; an empty filter result is a state, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Analysis {
    Empty,
    Ready { kpis: KpiSet, views: ViewSet },
}

pub fn compute_kpis(view: &SalesView<'_>) -> KpiSet {
    if view.is_empty() {
        return KpiSet::default();
    }
    let daily = daily_totals(view.iter());
    let average_daily_sales = if daily.is_empty() {
        0.0
    } else {
        daily.values().sum::<f64>() / daily.len() as f64
    };
    let mut sales_by_branch = BTreeMap::new();
    for record in view.iter() {
        *sales_by_branch.entry(record.branch.clone()).or_insert(0.0) += record.value_or_zero();
    }
    KpiSet {
        total_sales: view.iter().map(SalesRecord::value_or_zero).sum(),
        total_quantity: view.iter().map(SalesRecord::quantity_or_zero).sum(),
        days_with_sales: daily.len(),
        average_daily_sales,
        sales_by_branch,
    }
}

/// Computes every view. `focus_categories` drives the category → product
/// breakdown, which stays empty when no category is given.
pub fn compute_views(view: &SalesView<'_>, focus_categories: &[&str]) -> ViewSet {
    let product_totals = group_totals(view.iter(), |record| record.description.as_str());
    let views = ViewSet {
        record_count: view.len(),
        category_totals: rank(
            group_totals(view.iter(), |record| record.category.as_str()),
            Ordering::Less,
            None,
        ),
        top_products: rank(product_totals.clone(), Ordering::Greater, Some(TOP_PRODUCTS)),
        bottom_products: rank(product_totals, Ordering::Less, Some(BOTTOM_PRODUCTS)),
        monthly_trend: monthly_trend(view),
        weekday_totals: weekday_totals(view),
        heatmap: heatmap(view),
        category_scatter: category_scatter(view),
        cumulative_trend: cumulative_trend(view),
        category_products: category_products(view, focus_categories),
    };
    debug!(
        "Computed views over {} record(s): {} categor(ies), {} period(s), {} day(s)",
        views.record_count,
        views.category_totals.len(),
        views.monthly_trend.len(),
        views.cumulative_trend.len()
    );
    views
}

/// Runs KPIs and views for a filtered view, using the selection's categories
/// for the product breakdown.
pub fn analyze(view: &SalesView<'_>, selection: &FilterSelection) -> Analysis {
    if view.is_empty() {
        return Analysis::Empty;
    }
    let focus = selection.selected(Dimension::Category).collect::<Vec<_>>();
    Analysis::Ready {
        kpis: compute_kpis(view),
        views: compute_views(view, &focus),
    }
}

/// Sums `VALOR` onto a fixed axis. Axis entries with no rows stay at zero and
/// rows whose key is absent or off-axis are skipped.
pub fn totals_on_axis<'r, K, F>(
    records: impl IntoIterator<Item = &'r SalesRecord>,
    axis: &[K],
    key: F,
) -> Vec<f64>
where
    K: PartialEq,
    F: Fn(&'r SalesRecord) -> Option<K>,
{
    let mut totals = vec![0.0; axis.len()];
    for record in records {
        if let Some(idx) = key(record).and_then(|k| axis.iter().position(|a| *a == k)) {
            totals[idx] += record.value_or_zero();
        }
    }
    totals
}

/// Two-axis variant of [`totals_on_axis`]: a `rows.len() × cols.len()` matrix.
pub fn grid_on_axes<'r, R, C, FR, FC>(
    records: impl IntoIterator<Item = &'r SalesRecord>,
    rows: &[R],
    cols: &[C],
    row_key: FR,
    col_key: FC,
) -> Vec<Vec<f64>>
where
    R: PartialEq,
    C: PartialEq,
    FR: Fn(&'r SalesRecord) -> Option<R>,
    FC: Fn(&'r SalesRecord) -> Option<C>,
{
    let mut grid = vec![vec![0.0; cols.len()]; rows.len()];
    for record in records {
        let row = row_key(record).and_then(|k| rows.iter().position(|r| *r == k));
        let col = col_key(record).and_then(|k| cols.iter().position(|c| *c == k));
        if let (Some(row), Some(col)) = (row, col) {
            grid[row][col] += record.value_or_zero();
        }
    }
    grid
}

fn group_totals<'r, F>(
    records: impl Iterator<Item = &'r SalesRecord>,
    key: F,
) -> HashMap<String, f64>
where
    F: Fn(&'r SalesRecord) -> &'r str,
{
    records
        .map(|record| (key(record).to_string(), record.value_or_zero()))
        .into_grouping_map()
        .sum()
}

/// Orders group totals (`Ordering::Greater` = descending) with the label as a
/// tie-breaker, optionally keeping only the first `limit` entries. The
/// ascending order is the descending one reversed.
fn rank(totals: HashMap<String, f64>, direction: Ordering, limit: Option<usize>) -> Vec<LabeledTotal> {
    totals
        .into_iter()
        .sorted_by(|(label_a, total_a), (label_b, total_b)| {
            let descending = total_b
                .total_cmp(total_a)
                .then_with(|| label_a.cmp(label_b));
            if direction == Ordering::Greater {
                descending
            } else {
                descending.reverse()
            }
        })
        .take(limit.unwrap_or(usize::MAX))
        .map(|(label, total)| LabeledTotal { label, total })
        .collect()
}

fn daily_totals<'r>(records: impl Iterator<Item = &'r SalesRecord>) -> BTreeMap<NaiveDate, f64> {
    let mut daily = BTreeMap::new();
    for record in records {
        if let Some(date) = record.date {
            *daily.entry(date).or_insert(0.0) += record.value_or_zero();
        }
    }
    daily
}

fn monthly_trend(view: &SalesView<'_>) -> Vec<MonthlyPoint> {
    let mut periods: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for record in view.iter() {
        if let (Some(year), Some(month)) = (record.year, record.month)
            && record.month_name().is_some()
        {
            *periods.entry((year, month)).or_insert(0.0) += record.value_or_zero();
        }
    }
    periods
        .into_iter()
        .map(|((year, month), total)| MonthlyPoint {
            year,
            month,
            period: format!("{year}-{}", MONTH_NAMES[(month - 1) as usize]),
            total,
        })
        .collect()
}

fn weekday_totals(view: &SalesView<'_>) -> Vec<LabeledTotal> {
    totals_on_axis(view.iter(), &WEEKDAY_NAMES, SalesRecord::weekday_name)
        .into_iter()
        .zip(WEEKDAY_NAMES)
        .map(|(total, name)| LabeledTotal {
            label: name.to_string(),
            total,
        })
        .collect()
}

fn heatmap(view: &SalesView<'_>) -> Heatmap {
    Heatmap::from_totals(grid_on_axes(
        view.iter(),
        &MONTH_NAMES,
        &WEEKDAY_NAMES,
        SalesRecord::month_name,
        SalesRecord::weekday_name,
    ))
}

fn category_scatter(view: &SalesView<'_>) -> Vec<CategoryPoint> {
    let mut stats: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for record in view.iter() {
        let entry = stats.entry(record.category.as_str()).or_insert((0.0, 0.0));
        entry.0 += record.quantity_or_zero();
        entry.1 += record.value_or_zero();
    }
    stats
        .into_iter()
        .map(|(category, (quantity, total))| CategoryPoint {
            category: category.to_string(),
            quantity,
            total,
        })
        .collect()
}

/// Running total over rows sorted by date, reduced to the last value seen on
/// each distinct date.
fn cumulative_trend(view: &SalesView<'_>) -> Vec<CumulativePoint> {
    let dated = view
        .iter()
        .filter_map(|record| record.date.map(|date| (date, record.value_or_zero())))
        .sorted_by_key(|(date, _)| *date);

    let mut running = 0.0;
    let mut points: Vec<CumulativePoint> = Vec::new();
    for (date, value) in dated {
        running += value;
        match points.last_mut() {
            Some(last) if last.date == date => last.cumulative = running,
            _ => points.push(CumulativePoint {
                date,
                cumulative: running,
            }),
        }
    }
    points
}

/// Product totals restricted to `categories`, descending, top 15.
pub fn category_products(view: &SalesView<'_>, categories: &[&str]) -> Vec<LabeledTotal> {
    if categories.is_empty() {
        return Vec::new();
    }
    let totals = group_totals(
        view.iter()
            .filter(|record| categories.contains(&record.category.as_str())),
        |record| record.description.as_str(),
    );
    rank(totals, Ordering::Greater, Some(CATEGORY_PRODUCTS))
}
