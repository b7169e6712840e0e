//! Multi-valued inclusion filters over a sales table.
//!
//! A [`FilterSelection`] holds one set of chosen values per [`Dimension`]. An
//! empty set places no constraint on its dimension; non-empty sets keep only
//! rows whose value is a member. Dimensions combine with AND. Filtering never
//! mutates the table and preserves its row order.

use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use log::debug;
use serde::Serialize;

use crate::{
    calendar::{MONTH_NAMES, WEEKDAY_NAMES},
    record::{SalesRecord, SalesTable, SalesView},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Category,
    Product,
    Year,
    Month,
    Weekday,
    Branch,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Category,
        Dimension::Product,
        Dimension::Year,
        Dimension::Month,
        Dimension::Weekday,
        Dimension::Branch,
    ];

    /// The record's value on this dimension, as compared against selections.
    pub fn key<'r>(&self, record: &'r SalesRecord) -> Option<Cow<'r, str>> {
        match self {
            Dimension::Category => Some(Cow::Borrowed(record.category.as_str())),
            Dimension::Product => Some(Cow::Borrowed(record.description.as_str())),
            Dimension::Year => record.year.map(|year| Cow::Owned(year.to_string())),
            Dimension::Month => record.month_name().map(Cow::Borrowed),
            Dimension::Weekday => record.weekday_name().map(Cow::Borrowed),
            Dimension::Branch => Some(Cow::Borrowed(record.branch.as_str())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Category => "category",
            Dimension::Product => "product",
            Dimension::Year => "year",
            Dimension::Month => "month",
            Dimension::Weekday => "weekday",
            Dimension::Branch => "branch",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    values: BTreeMap<Dimension, BTreeSet<String>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper adding several values to one dimension.
    pub fn with<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self.insert(dimension, value);
        }
        self
    }

    pub fn insert(&mut self, dimension: Dimension, value: impl Into<String>) {
        self.values.entry(dimension).or_default().insert(value.into());
    }

    pub fn remove(&mut self, dimension: Dimension, value: &str) -> bool {
        let removed = self
            .values
            .get_mut(&dimension)
            .is_some_and(|set| set.remove(value));
        if self.values.get(&dimension).is_some_and(BTreeSet::is_empty) {
            self.values.remove(&dimension);
        }
        removed
    }

    /// Replaces the dimension's selection with every available value.
    pub fn select_all<I, S>(&mut self, dimension: Dimension, available: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = available.into_iter().map(Into::into).collect::<BTreeSet<_>>();
        if set.is_empty() {
            self.values.remove(&dimension);
        } else {
            self.values.insert(dimension, set);
        }
    }

    /// Drops every chosen value for the dimension, lifting its constraint.
    pub fn clear(&mut self, dimension: Dimension) {
        self.values.remove(&dimension);
    }

    pub fn selected(&self, dimension: Dimension) -> impl Iterator<Item = &str> {
        self.values
            .get(&dimension)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn is_constrained(&self, dimension: Dimension) -> bool {
        self.values.get(&dimension).is_some_and(|set| !set.is_empty())
    }

    pub fn is_unconstrained(&self) -> bool {
        Dimension::ALL.iter().all(|dim| !self.is_constrained(*dim))
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        self.values.iter().all(|(dimension, chosen)| {
            chosen.is_empty()
                || dimension
                    .key(record)
                    .is_some_and(|key| chosen.contains(&*key))
        })
    }

    /// Removes chosen values that `options` no longer offers and returns them.
    pub fn retain_available(&mut self, options: &FilterOptions) -> Vec<(Dimension, String)> {
        let mut pruned = Vec::new();
        for dimension in Dimension::ALL {
            let Some(set) = self.values.get_mut(&dimension) else {
                continue;
            };
            let offered = options.values(dimension);
            set.retain(|value| {
                let keep = offered.iter().any(|candidate| candidate == value);
                if !keep {
                    pruned.push((dimension, value.clone()));
                }
                keep
            });
            if set.is_empty() {
                self.values.remove(&dimension);
            }
        }
        pruned
    }
}

/// Filters the full table.
pub fn apply_filters<'a>(table: &'a SalesTable, selection: &FilterSelection) -> SalesView<'a> {
    let view = SalesView::from_records(
        table
            .records
            .iter()
            .filter(|record| selection.matches(record))
            .collect(),
    );
    debug!(
        "Filters kept {} of {} record(s)",
        view.len(),
        table.records.len()
    );
    view
}

/// Filters an existing view further; applying the same selection twice is a no-op.
pub fn refine<'a>(view: &SalesView<'a>, selection: &FilterSelection) -> SalesView<'a> {
    SalesView::from_records(
        view.records()
            .iter()
            .copied()
            .filter(|record| selection.matches(record))
            .collect(),
    )
}

/// Values a presentation layer can offer per dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    values: BTreeMap<Dimension, Vec<String>>,
}

impl FilterOptions {
    /// Categories, years and branches ascend; months and weekdays follow the
    /// canonical calendar order; products are only offered for the categories
    /// currently selected.
    pub fn from_table(table: &SalesTable, selection: &FilterSelection) -> Self {
        let distinct = |dimension: Dimension| -> BTreeSet<String> {
            table
                .records
                .iter()
                .filter_map(|record| dimension.key(record).map(Cow::into_owned))
                .collect()
        };

        let mut values = BTreeMap::new();
        values.insert(
            Dimension::Category,
            distinct(Dimension::Category).into_iter().collect(),
        );

        let chosen_categories = selection
            .selected(Dimension::Category)
            .collect::<BTreeSet<_>>();
        let products = if chosen_categories.is_empty() {
            Vec::new()
        } else {
            table
                .records
                .iter()
                .filter(|record| chosen_categories.contains(record.category.as_str()))
                .map(|record| record.description.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };
        values.insert(Dimension::Product, products);

        let years = table
            .records
            .iter()
            .filter_map(|record| record.year)
            .collect::<BTreeSet<_>>();
        values.insert(
            Dimension::Year,
            years.into_iter().map(|year| year.to_string()).collect(),
        );

        let months = distinct(Dimension::Month);
        values.insert(
            Dimension::Month,
            MONTH_NAMES
                .iter()
                .filter(|name| months.contains(**name))
                .map(|name| name.to_string())
                .collect(),
        );

        let weekdays = distinct(Dimension::Weekday);
        values.insert(
            Dimension::Weekday,
            WEEKDAY_NAMES
                .iter()
                .filter(|name| weekdays.contains(**name))
                .map(|name| name.to_string())
                .collect(),
        );

        values.insert(
            Dimension::Branch,
            distinct(Dimension::Branch).into_iter().collect(),
        );

        Self { values }
    }

    pub fn values(&self, dimension: Dimension) -> &[String] {
        self.values
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
