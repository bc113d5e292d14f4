//! Record decoding: one [`RawRow`] in, one typed record or a [`DecodeError`]
//! out. Nothing here performs I/O or logging; the loader decides what to do
//! with a failed row.

use crate::config::SourceFormat;
use crate::error::ReportError;
use crate::types::{EnergySample, RawRow, Reservation, TypedRecord};
use crate::util::{parse_date, parse_f64, parse_time, parse_timestamp, parse_u32, parse_u64};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty row")]
    EmptyRow,

    #[error("expected {expected} fields, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("field '{field}' has invalid value '{raw}'")]
    FieldTypeError { field: String, raw: String },

    #[error("duplicate reservation id {0}")]
    DuplicateId(u64),

    #[error("expected a {expected} record, decoded a {found} record")]
    VariantMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Column positions of an energy CSV, resolved from its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnergyLayout {
    pub arity: usize,
    pub time: usize,
    /// `(column, phase)` pairs, phase in `0..3`.
    pub consumption: Vec<(usize, usize)>,
    pub production: Vec<(usize, usize)>,
    pub temperature: Option<usize>,
}

impl EnergyLayout {
    /// Resolve columns by case-insensitive substring: `time`, `consumption`,
    /// `production`, `temperature`. Other columns are carried but ignored.
    pub fn from_header(header: &RawRow) -> Result<Self, ReportError> {
        let mut time = None;
        let mut consumption = Vec::new();
        let mut production = Vec::new();
        let mut temperature = None;

        for (col, name) in header.fields.iter().enumerate() {
            let name = name.trim().to_lowercase();
            if name.contains("time") {
                time = time.or(Some(col));
            } else if name.contains("consumption") {
                consumption.push((col, phase_hint(&name)));
            } else if name.contains("production") {
                production.push((col, phase_hint(&name)));
            } else if name.contains("temperature") {
                temperature = temperature.or(Some(col));
            }
        }

        let time = time.ok_or_else(|| {
            ReportError::Layout(format!("no time column in '{}'", header.fields.join(";")))
        })?;
        if consumption.is_empty() && production.is_empty() {
            return Err(ReportError::Layout(format!(
                "no consumption or production column in '{}'",
                header.fields.join(";")
            )));
        }

        Ok(EnergyLayout {
            arity: header.fields.len(),
            time,
            consumption: assign_phases("consumption", consumption)?,
            production: assign_phases("production", production)?,
            temperature,
        })
    }

    /// Headerless files: `time;cons1;cons2;cons3;prod1;prod2;prod3`.
    pub fn positional() -> Self {
        EnergyLayout {
            arity: 7,
            time: 0,
            consumption: vec![(1, 0), (2, 1), (3, 2)],
            production: vec![(4, 0), (5, 1), (6, 2)],
            temperature: None,
        }
    }
}

// "consumption phase 2 wh" -> Some(1)
fn phase_hint(name: &str) -> Option<usize> {
    let rest = name.split("phase").nth(1)?;
    let digit = rest.trim_start().chars().next()?.to_digit(10)? as usize;
    (1..=3).contains(&digit).then(|| digit - 1)
}

fn assign_phases(
    kind: &str,
    columns: Vec<(usize, Option<usize>)>,
) -> Result<Vec<(usize, usize)>, ReportError> {
    if columns.len() > 3 {
        return Err(ReportError::Layout(format!(
            "{} {kind} columns, at most 3 phases are supported",
            columns.len()
        )));
    }
    let mut taken = [false; 3];
    let mut out = Vec::with_capacity(columns.len());
    for &(col, hint) in &columns {
        if let Some(phase) = hint {
            if taken[phase] {
                return Err(ReportError::Layout(format!(
                    "{kind} phase {} appears twice",
                    phase + 1
                )));
            }
            taken[phase] = true;
            out.push((col, phase));
        }
    }
    for &(col, hint) in &columns {
        if hint.is_none() {
            // At most three columns, so a free phase always exists.
            if let Some(phase) = taken.iter().position(|t| !t) {
                taken[phase] = true;
                out.push((col, phase));
            }
        }
    }
    out.sort_unstable();
    Ok(out)
}

/// Which record type a source holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant {
    Reservation,
    Energy(EnergyLayout),
}

pub fn decode(
    row: &RawRow,
    variant: &Variant,
    format: &SourceFormat,
) -> Result<TypedRecord, DecodeError> {
    match variant {
        Variant::Reservation => decode_reservation(row, format).map(TypedRecord::Reservation),
        Variant::Energy(layout) => decode_energy(row, layout, format).map(TypedRecord::Energy),
    }
}

impl TryFrom<TypedRecord> for Reservation {
    type Error = DecodeError;

    fn try_from(record: TypedRecord) -> Result<Self, DecodeError> {
        match record {
            TypedRecord::Reservation(r) => Ok(r),
            other => Err(DecodeError::VariantMismatch {
                expected: "reservation",
                found: other.kind(),
            }),
        }
    }
}

impl TryFrom<TypedRecord> for EnergySample {
    type Error = DecodeError;

    fn try_from(record: TypedRecord) -> Result<Self, DecodeError> {
        match record {
            TypedRecord::Energy(e) => Ok(e),
            other => Err(DecodeError::VariantMismatch {
                expected: "energy",
                found: other.kind(),
            }),
        }
    }
}

/// A first row that cannot be reservation data: full width, but no numeric id.
pub fn looks_like_reservation_header(row: &RawRow) -> bool {
    row.fields.len() == Reservation::ARITY && !row.is_blank() && parse_u64(&row.fields[0]).is_none()
}

fn check_shape(row: &RawRow, expected: usize) -> Result<(), DecodeError> {
    if row.is_blank() {
        return Err(DecodeError::EmptyRow);
    }
    if row.fields.len() != expected {
        return Err(DecodeError::ArityMismatch {
            expected,
            found: row.fields.len(),
        });
    }
    Ok(())
}

fn field<T>(
    row: &RawRow,
    idx: usize,
    name: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, DecodeError> {
    let raw = row.fields[idx].trim();
    parse(raw).ok_or_else(|| DecodeError::FieldTypeError {
        field: name.to_string(),
        raw: raw.to_string(),
    })
}

fn text(row: &RawRow, idx: usize) -> String {
    row.fields[idx].trim().to_string()
}

/// `id|name|email|phone|date|time|duration|price|confirmed|resource|created_at`
pub fn decode_reservation(row: &RawRow, format: &SourceFormat) -> Result<Reservation, DecodeError> {
    check_shape(row, Reservation::ARITY)?;
    let decimal_comma = format.decimal_comma;

    Ok(Reservation {
        id: field(row, 0, "id", |s| parse_u64(s).filter(|id| *id > 0))?,
        name: text(row, 1),
        email: text(row, 2),
        phone: text(row, 3),
        date: field(row, 4, "date", parse_date)?,
        time: field(row, 5, "time", parse_time)?,
        duration_hours: field(row, 6, "duration", |s| parse_u32(s).filter(|h| *h >= 1))?,
        unit_price: field(row, 7, "price", |s| {
            parse_f64(s, decimal_comma).filter(|p| *p >= 0.0)
        })?,
        // Anything but a case-insensitive "true" is unconfirmed.
        confirmed: row.fields[8].trim().eq_ignore_ascii_case("true"),
        resource: text(row, 9),
        created_at: field(row, 10, "created_at", parse_timestamp)?,
    })
}

pub fn decode_energy(
    row: &RawRow,
    layout: &EnergyLayout,
    format: &SourceFormat,
) -> Result<EnergySample, DecodeError> {
    check_shape(row, layout.arity)?;
    let decimal_comma = format.decimal_comma;
    let watt_hours = |s: &str| parse_f64(s, decimal_comma).filter(|v| *v >= 0.0);

    let timestamp = field(row, layout.time, "time", parse_timestamp)?;

    let mut consumption = [0.0; 3];
    for &(col, phase) in &layout.consumption {
        consumption[phase] = field(row, col, "consumption", watt_hours)?;
    }
    let mut production = [0.0; 3];
    for &(col, phase) in &layout.production {
        production[phase] = field(row, col, "production", watt_hours)?;
    }

    let temperature = match layout.temperature {
        Some(col) if !row.fields[col].trim().is_empty() => {
            Some(field(row, col, "temperature", |s| parse_f64(s, decimal_comma))?)
        }
        _ => None,
    };

    Ok(EnergySample {
        timestamp,
        consumption,
        production,
        temperature,
    })
}
