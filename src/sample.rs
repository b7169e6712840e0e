//! Synthetic sales data for demos, tests, and benchmarks.
//!
//! Generated rows satisfy the column contract: `YEAR`, `MONTH`, and `L a D` are
//! derived from `FECHA`, and `VALOR` equals `BS` equals quantity × price.

use anyhow::{Result, ensure};
use chrono::{Datelike, Duration, NaiveDate};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    data::{format_date, format_number},
    record::RawTable,
    schema::REQUIRED_COLUMNS,
};

const SAMPLE_PRODUCTS: &[(&str, &[&str])] = &[
    (
        "Bebidas Naturales",
        &["Agua Saborizada Menta", "Té Verde Orgánico", "Limonada Natural"],
    ),
    (
        "Ensaladas",
        &["Ensalada César Veggie", "Bowl de Quinoa", "Ensalada Mediterránea"],
    ),
    (
        "Bowls Saludables",
        &["Bowl de Açaí", "Bowl Proteico", "Bowl Tropical"],
    ),
    (
        "Jugos Detox",
        &["Verde Detox", "Naranja Energía", "Remolacha Antioxidante"],
    ),
    (
        "Smoothies",
        &["Smoothie Tropical", "Smoothie Proteico", "Smoothie Verde"],
    ),
    (
        "Wraps Veggie",
        &["Wrap de Hummus", "Wrap Mediterráneo", "Wrap de Aguacate"],
    ),
    (
        "Sopas",
        &["Sopa de Lentejas", "Crema de Calabaza", "Sopa Minestrone"],
    ),
    (
        "Postres Saludables",
        &["Chia Pudding", "Brownie Vegano", "Helado de Coco"],
    ),
];

const BRANCHES: &[&str] = &["16J", "FA", "SCZ"];
const CUSTOMERS: usize = 100;
const PRODUCT_CODES: usize = 500;

#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub records: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub seed: Option<u64>,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            records: 1000,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            seed: None,
        }
    }
}

pub fn generate(options: &SampleOptions) -> Result<RawTable> {
    ensure!(
        options.start <= options.end,
        "Sample start date {} is after end date {}",
        options.start,
        options.end
    );
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let span = (options.end - options.start).num_days();

    let rows = (0..options.records)
        .map(|i| {
            let date = options.start + Duration::days(rng.gen_range(0..=span));
            let (category, products) = SAMPLE_PRODUCTS
                .choose(&mut rng)
                .copied()
                .unwrap_or(SAMPLE_PRODUCTS[0]);
            let product = products.choose(&mut rng).copied().unwrap_or(products[0]);
            let branch = BRANCHES.choose(&mut rng).copied().unwrap_or(BRANCHES[0]);
            let customer = rng.gen_range(1..=CUSTOMERS);
            let quantity: u32 = rng.gen_range(1..=10);
            let price = round_cents(rng.gen_range(15.0..150.0));
            let value = round_cents(f64::from(quantity) * price);

            vec![
                format!("PRD{:03}", i % PRODUCT_CODES),
                product.to_string(),
                branch.to_string(),
                format_date(Some(date)),
                category.to_string(),
                date.year().to_string(),
                date.month().to_string(),
                date.weekday().number_from_monday().to_string(),
                format!("T{i:06}"),
                format!("CLI{customer:04}"),
                quantity.to_string(),
                format_number(price),
                format_number(value),
                format_number(value),
            ]
        })
        .collect();

    Ok(RawTable::new(
        REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    ))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn options(records: usize, seed: u64) -> SampleOptions {
        SampleOptions {
            records,
            seed: Some(seed),
            ..SampleOptions::default()
        }
    }

    #[test]
    fn generated_rows_pass_validation() {
        let raw = generate(&options(200, 7)).unwrap();
        let table = schema::validate(&raw).expect("sample satisfies contract");
        assert_eq!(table.len(), 200);
        assert!(table.coercion.is_empty());
        for record in &table.records {
            let date = record.date.expect("date");
            assert_eq!(record.weekday, Some(date.weekday().number_from_monday()));
            assert_eq!(record.month, Some(date.month()));
            assert_eq!(record.value, record.bs);
            assert!(BRANCHES.contains(&record.branch.as_str()));
        }
    }

    #[test]
    fn seed_makes_output_reproducible() {
        assert_eq!(generate(&options(50, 42)).unwrap(), generate(&options(50, 42)).unwrap());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let opts = SampleOptions {
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ..SampleOptions::default()
        };
        assert!(generate(&opts).is_err());
    }
}
