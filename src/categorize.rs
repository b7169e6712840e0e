//! Product description → category lookup.
//!
//! A [`CategoryCatalog`] maps each category label to the exact product
//! descriptions that belong to it. Lookups trim and uppercase the description
//! and compare against uppercased catalog entries; anything unmatched (or
//! blank) resolves to [`UNKNOWN_CATEGORY`]. A catalog listing the same
//! description under two categories is rejected when it is built.
//!
//! Categorization is an offline enrichment pass ([`enrich`]) run before a
//! file is loaded for analysis, not something evaluated per filter change.

use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    record::RawTable,
    schema::{COL_CATEGORY, COL_DESCRIPTION, SchemaError},
};

pub const UNKNOWN_CATEGORY: &str = "Categoria desconocida";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Product '{description}' is listed under both '{first}' and '{second}'")]
    DuplicateDescription {
        description: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub category: String,
    pub products: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CategoryCatalog {
    entries: Vec<CategoryEntry>,
    lookup: HashMap<String, usize>,
}

impl CategoryCatalog {
    pub fn new(entries: Vec<CategoryEntry>) -> Result<Self, CatalogError> {
        let lookup = build_lookup(&entries)?;
        Ok(Self { entries, lookup })
    }

    /// The restaurant's own catalog, checked for duplicates like any other.
    pub fn built_in() -> Result<Self, CatalogError> {
        Self::new(
            DEFAULT_CATALOG
                .iter()
                .map(|(category, products)| CategoryEntry {
                    category: category.to_string(),
                    products: products.iter().map(|p| p.to_string()).collect(),
                })
                .collect(),
        )
    }

    /// Loads a catalog from a YAML list of `{ category, products }` entries.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening catalog file {path:?}"))?;
        let entries: Vec<CategoryEntry> = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing catalog YAML {path:?}"))?;
        let catalog = Self::new(entries).with_context(|| format!("Validating catalog {path:?}"))?;
        debug!(
            "Loaded catalog with {} categor(ies) from {:?}",
            catalog.entries.len(),
            path
        );
        Ok(catalog)
    }

    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    /// Resolves a description to exactly one category label.
    pub fn categorize(&self, description: Option<&str>) -> &str {
        let Some(description) = description else {
            return UNKNOWN_CATEGORY;
        };
        let key = normalize_description(description);
        if key.is_empty() {
            return UNKNOWN_CATEGORY;
        }
        self.lookup
            .get(&key)
            .map(|&idx| self.entries[idx].category.as_str())
            .unwrap_or(UNKNOWN_CATEGORY)
    }
}

fn build_lookup(entries: &[CategoryEntry]) -> Result<HashMap<String, usize>, CatalogError> {
    let mut lookup: HashMap<String, usize> = HashMap::new();
    for (idx, entry) in entries.iter().enumerate() {
        for product in &entry.products {
            let key = normalize_description(product);
            match lookup.get(&key) {
                Some(&previous) if previous != idx => {
                    return Err(CatalogError::DuplicateDescription {
                        description: product.clone(),
                        first: entries[previous].category.clone(),
                        second: entry.category.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    lookup.insert(key, idx);
                }
            }
        }
    }
    Ok(lookup)
}

fn normalize_description(value: &str) -> String {
    value.trim().to_uppercase()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    pub categorized: usize,
    pub unknown: usize,
}

/// Returns a copy of `raw` with `CATEGORIA` set for every row from its
/// `DESCRIPCION`. The column is appended when absent and overwritten otherwise.
pub fn enrich(
    raw: &RawTable,
    catalog: &CategoryCatalog,
) -> Result<(RawTable, EnrichSummary), SchemaError> {
    let description_idx =
        raw.column_index(COL_DESCRIPTION)
            .ok_or_else(|| SchemaError::MissingColumns {
                columns: vec![COL_DESCRIPTION.to_string()],
            })?;
    let mut enriched = raw.clone();
    let category_idx = match enriched.column_index(COL_CATEGORY) {
        Some(idx) => idx,
        None => {
            enriched.headers.push(COL_CATEGORY.to_string());
            enriched.headers.len() - 1
        }
    };

    let mut summary = EnrichSummary::default();
    for row in enriched.rows.iter_mut() {
        let description = row.get(description_idx).map(|cell| cell.as_str());
        let category = catalog.categorize(description).to_string();
        if category == UNKNOWN_CATEGORY {
            summary.unknown += 1;
        } else {
            summary.categorized += 1;
        }
        if row.len() <= category_idx {
            row.resize(category_idx + 1, String::new());
        }
        row[category_idx] = category;
    }
    info!(
        "Categorized {} row(s); {} row(s) left as '{}'",
        summary.categorized, summary.unknown, UNKNOWN_CATEGORY
    );
    Ok((enriched, summary))
}

const DEFAULT_CATALOG: &[(&str, &[&str])] = &[
    (
        "Burgers",
        &[
            "BURGUER CORSO",
            "CAÑAHUA BURGER",
            "CHICKPEA BURGER",
            "LENTEJA BURGER",
            "MORENA BURGER",
            "QUINOA BURGER",
            "TAURUS BURGUER",
            "MINI BURGER",
        ],
    ),
    (
        "Ensaladas & Bowls",
        &[
            "BUDDHA BOWL",
            "BUDDHA BOWL PEQUEÑO",
            "BUFFET DE ENSALADAS",
            "FALAFEL BOWL",
            "FALAFEL BOWL PEQUEÑO",
            "JALISCO BOWL",
            "JALISCO BOWL PEQUEÑO",
            "MEDITERRANEA BOWL",
            "MEDITERRANEA BOWL PEQUEÑO",
        ],
    ),
    (
        "Almuerzos Diarios",
        &[
            "ALMUERZO COMPLETO",
            "ALMUERZO + BUFFET DE ENSALADAS",
            "SEGUNDO",
            "SEGUNDO + BUFFET DE ENSALADAS",
            "SOPA",
            "ENTRADA",
        ],
    ),
    (
        "Especiales",
        &[
            "SAB. ALMUERZO ESPECIAL COMPLETO",
            "SAB. ESPECIAL SOPA",
            "SEGUNDO SABADO ESPECIAL",
            "SILPANCHO VEGGIE",
            "PIQUE MACHO",
            "FRICASE AÑO NUEVO",
            "PICANA NAVIDEÑA",
            "VEGANCUCHO",
        ],
    ),
    (
        "Bebidas Frías",
        &[
            "AGUA CON GAS",
            "AGUA CON LIMON",
            "AGUA SIN GAS",
            "CITRUS FRESA",
            "FULL CITRUS",
            "FULL GREEN 780",
            "JUGO DE TEMPORADA",
            "COCO",
            "SKINNY",
        ],
    ),
    (
        "Otras Bebidas",
        &[
            "CERVEZA",
            "CERVEZA CORONA PERSONAL",
            "CERVEZA S/A PROST LATA",
            "CHUFLAY O MOJITO VASO",
            "INFUSION DE HIERBAS",
            "TE",
            "MENTA",
            "VINO BLANCO TERRUÑO BOTELLA",
        ],
    ),
    (
        "Postres & Helados",
        &[
            "BROWNIES",
            "HELADO ARTESANAL",
            "HELADO ARTESANAL CHOCOLATE",
            "PASTEL DE ZANAHORIA",
            "TIRAMISU",
            "POSTRE ESPECIAL",
        ],
    ),
    (
        "Combos & Promociones",
        &[
            "COMBO 2x1 TRANCAPECHO HORA VEGGIE FELIZ",
            "COMBO BURGER 2X1 (SIN PAPAS)",
            "COMBO HAMBURGUESA 3X2",
            "COMBO TRANCAPECHO",
            "PROMO 21 SEPTIEMBRE",
            "VEGGIE WING 2X30",
        ],
    ),
    (
        "Planes & Mensualidades",
        &[
            "ALMUERZO MENSUAL",
            "ALMUERZO SEMANAL",
            "FIT MENSUAL",
            "SEGUNDO MENSUAL",
            "SEGUNDO SEMANAL",
            "PLAN MENSUAL 400",
            "PROMO ALMUERZO SEMANAL",
        ],
    ),
    (
        "Otros",
        &[
            "DESECHABLES 1bs",
            "DESECHABLES 3bs",
            "DESECHABLES 5bs",
            "CONSUMO CORTESIA",
            "PAPAS FRITAS",
            "PAPITAS C/SALSA BLANCA",
            "PORCION EXTRA-FALAFEL",
            "PORCION HUEVO",
            "PORCION CARNE HAMBURGUESA",
        ],
    ),
];
