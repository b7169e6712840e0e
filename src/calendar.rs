//! Fixed calendar lookup tables.
//!
//! Month and weekday names are derived from the numeric `MONTH` and `L a D`
//! codes carried by every sales line. The tables double as the canonical axis
//! order used when aggregates are reindexed (January first, Monday first).

pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];

/// Returns the month name for a 1-based month code.
pub fn month_name(code: u32) -> Option<&'static str> {
    code.checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
}

/// Returns the weekday name for a 1-based weekday code (1 = Monday).
pub fn weekday_name(code: u32) -> Option<&'static str> {
    code.checked_sub(1)
        .and_then(|idx| WEEKDAY_NAMES.get(idx as usize))
        .copied()
}

pub fn month_code(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|candidate| *candidate == name)
        .map(|idx| idx as u32 + 1)
}

pub fn weekday_code(name: &str) -> Option<u32> {
    WEEKDAY_NAMES
        .iter()
        .position(|candidate| *candidate == name)
        .map(|idx| idx as u32 + 1)
}
