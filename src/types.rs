use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tabled::Tabled;

/// One delimited row as read from a source, before any typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source, 0 when unknown.
    pub line: u64,
    pub fields: Vec<String>,
}

impl RawRow {
    pub fn new(line: u64, fields: Vec<String>) -> Self {
        RawRow { line, fields }
    }

    /// Split a text line on `delimiter`, trimming every field.
    pub fn split(line: u64, text: &str, delimiter: char) -> Self {
        let fields = text
            .split(delimiter)
            .map(|f| f.trim().to_string())
            .collect();
        RawRow { line, fields }
    }

    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|f| f.trim().is_empty())
    }

    /// The row as it appeared in the source, for diagnostics.
    pub fn joined(&self, delimiter: char) -> String {
        self.fields.join(delimiter.to_string().as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_hours: u32,
    pub unit_price: f64,
    pub confirmed: bool,
    pub resource: String,
    pub created_at: NaiveDateTime,
}

impl Reservation {
    pub const ARITY: usize = 11;
    pub const LONG_HOURS: u32 = 3;

    pub fn total_price(&self) -> f64 {
        self.duration_hours as f64 * self.unit_price
    }

    pub fn is_long(&self) -> bool {
        self.duration_hours >= Self::LONG_HOURS
    }
}

/// One hourly meter reading. Phase values are watt-hours as read.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergySample {
    pub timestamp: NaiveDateTime,
    pub consumption: [f64; 3],
    pub production: [f64; 3],
    pub temperature: Option<f64>,
}

impl EnergySample {
    pub fn consumption_wh(&self) -> f64 {
        self.consumption.iter().sum()
    }

    pub fn production_wh(&self) -> f64 {
        self.production.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedRecord {
    Reservation(Reservation),
    Energy(EnergySample),
}

impl TypedRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            TypedRecord::Reservation(_) => "reservation",
            TypedRecord::Energy(_) => "energy",
        }
    }
}

/// Records that carry a calendar date to group on.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for Reservation {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for EnergySample {
    fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

impl Dated for TypedRecord {
    fn date(&self) -> NaiveDate {
        match self {
            TypedRecord::Reservation(r) => r.date(),
            TypedRecord::Energy(e) => e.date(),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct DailyEnergyRow {
    #[tabled(rename = "Day")]
    pub weekday: String,
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Cons v1")]
    pub cons_1: String,
    #[tabled(rename = "Cons v2")]
    pub cons_2: String,
    #[tabled(rename = "Cons v3")]
    pub cons_3: String,
    #[tabled(rename = "Prod v1")]
    pub prod_1: String,
    #[tabled(rename = "Prod v2")]
    pub prod_2: String,
    #[tabled(rename = "Prod v3")]
    pub prod_3: String,
}

#[derive(Debug, Clone, Tabled)]
pub struct MonthlyEnergyRow {
    #[tabled(rename = "Month")]
    pub month: String,
    #[tabled(rename = "Consumption [kWh]")]
    pub consumption: String,
    #[tabled(rename = "Production [kWh]")]
    pub production: String,
    #[tabled(rename = "Avg temp [°C]")]
    pub avg_temperature: String,
    #[tabled(rename = "Samples")]
    pub samples: usize,
}

#[derive(Debug, Clone, Tabled)]
pub struct DailyRevenueRow {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Day")]
    pub weekday: String,
    #[tabled(rename = "Reservations")]
    pub reservations: usize,
    #[tabled(rename = "Confirmed")]
    pub confirmed: usize,
    #[tabled(rename = "Revenue [€]")]
    pub revenue: String,
}
