//! Report selection: turns user parameters into a validated [`ReportKind`]
//! and builds the matching report, plus the interactive menu used by the
//! `interactive` command.

use crate::config::Settings;
use crate::error::ValidationError;
use crate::output::{write_lines, Report};
use crate::reports;
use crate::store::RecordStore;
use crate::types::{EnergySample, Reservation};
use chrono::NaiveDate;
use std::io::{self, BufRead, Write};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Reservations,
    DailyTables,
    DateRange { start: NaiveDate, end: NaiveDate },
    Month(u32),
    Year,
}

/// `dd.mm.yyyy`, or `yyyy-mm-dd` as typed on a command line.
pub fn parse_user_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let s = input.trim();
    NaiveDate::parse_from_str(s, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .map_err(|_| ValidationError::BadDate(s.to_string()))
}

impl ReportKind {
    pub fn date_range(start: &str, end: &str) -> Result<Self, ValidationError> {
        let kind = ReportKind::DateRange {
            start: parse_user_date(start)?,
            end: parse_user_date(end)?,
        };
        kind.validate()?;
        Ok(kind)
    }

    pub fn month(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        let month = s
            .parse::<u32>()
            .map_err(|_| ValidationError::BadMonth(s.to_string()))?;
        let kind = ReportKind::Month(month);
        kind.validate()?;
        Ok(kind)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            ReportKind::DateRange { start, end } if end < start => {
                Err(ValidationError::ReversedRange { start, end })
            }
            ReportKind::Month(m) if !(1..=12).contains(&m) => Err(ValidationError::MonthOutOfRange(m)),
            _ => Ok(()),
        }
    }
}

/// The record stores a report can draw from.
#[derive(Debug, Clone, Default)]
pub struct Stores {
    pub reservations: RecordStore<Reservation>,
    pub energy: RecordStore<EnergySample>,
}

/// Validate, then build. No aggregation runs for an invalid request.
pub fn build(kind: &ReportKind, stores: &Stores) -> Result<Report, ValidationError> {
    kind.validate()?;
    let report = match *kind {
        ReportKind::Reservations => reports::reservation_report(&stores.reservations),
        ReportKind::DailyTables => reports::daily_energy_report(&stores.energy),
        ReportKind::DateRange { start, end } => reports::range_report(&stores.energy, start, end),
        ReportKind::Month(m) => reports::month_report(&stores.energy, m),
        ReportKind::Year => reports::year_report(&stores.energy),
    };
    Ok(report)
}

const MAIN_MENU: [&str; 6] = [
    "Choose a report type:",
    "1) Daily summary for a date range",
    "2) Monthly summary for one month",
    "3) Full year summary",
    "4) Daily tables by week",
    "5) Exit the program",
];

const NEXT_MENU: [&str; 4] = [
    "What would you like to do next?",
    "1) Write the report to the file {file}",
    "2) Create a new report",
    "3) Exit",
];

/// Menu-driven session over an already loaded energy store.
///
/// Reads choices from `input`, prints menus and reports to `out`. Ends on
/// the exit choice or end of input.
pub fn run_interactive<R: BufRead, W: Write>(
    mut input: R,
    mut out: W,
    energy: &RecordStore<EnergySample>,
    settings: &Settings,
) -> io::Result<()> {
    let stores = Stores {
        energy: energy.clone(),
        ..Stores::default()
    };
    let file = settings.report_file.display().to_string();

    loop {
        for line in MAIN_MENU {
            writeln!(out, "{line}")?;
        }
        let Some(choice) = prompt(&mut input, &mut out, "Enter your choice: ")? else {
            return Ok(());
        };
        let kind = match choice.as_str() {
            "1" => {
                let Some(start) = prompt(&mut input, &mut out, "Enter start date (dd.mm.yyyy): ")? else {
                    return Ok(());
                };
                let Some(end) = prompt(&mut input, &mut out, "Enter end date (dd.mm.yyyy): ")? else {
                    return Ok(());
                };
                ReportKind::date_range(&start, &end)
            }
            "2" => match prompt(&mut input, &mut out, "Enter month number (1–12): ")? {
                Some(m) => ReportKind::month(&m),
                None => return Ok(()),
            },
            "3" => Ok(ReportKind::Year),
            "4" => Ok(ReportKind::DailyTables),
            "5" => return Ok(()),
            _ => {
                writeln!(out, "Invalid choice.")?;
                continue;
            }
        };

        let report = match kind.and_then(|k| build(&k, &stores)) {
            Ok(report) => report,
            Err(err) => {
                writeln!(out, "Error: {err}")?;
                continue;
            }
        };
        let lines = report.render();
        for line in &lines {
            writeln!(out, "{line}")?;
        }

        writeln!(out)?;
        for line in NEXT_MENU {
            writeln!(out, "{}", line.replace("{file}", &file))?;
        }
        match prompt(&mut input, &mut out, "Enter your choice: ")?.as_deref() {
            Some("1") => match write_lines(&settings.report_file, &lines) {
                Ok(()) => {
                    info!("report written to {file}");
                    writeln!(out, "Report successfully written to {file}")?;
                }
                Err(err) => {
                    error!("{err}");
                    writeln!(out, "Error: {err}")?;
                }
            },
            Some("2") => continue,
            Some("3") | None => return Ok(()),
            Some(_) => writeln!(out, "Invalid choice, returning to main menu.")?,
        }
    }
}

// `None` at end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, text: &str) -> io::Result<Option<String>> {
    write!(out, "{text}")?;
    out.flush()?;
    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim().to_string()))
}
