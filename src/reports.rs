use crate::aggregate::columns::*;
use crate::aggregate::{aggregate, energy_reducers, reservation_reducers, GroupKey, GroupView, Grouping};
use crate::output::{
    render_table, Report, Section, DAILY_ENERGY_LAYOUT, DAILY_REVENUE_LAYOUT, MONTHLY_ENERGY_LAYOUT,
};
use crate::store::RecordStore;
use crate::types::{DailyEnergyRow, DailyRevenueRow, EnergySample, MonthlyEnergyRow, Reservation};
use crate::util::{format_date, format_decimal, format_time, month_name, weekday_name};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

pub fn reservation_report(store: &RecordStore<Reservation>) -> Report {
    let mut confirmed = Section::new("Confirmed Reservations");
    if store.is_empty() {
        confirmed = confirmed.line("No valid reservations found.");
    }
    confirmed = confirmed.lines(store.iter().filter(|r| r.confirmed).map(|r| {
        format!(
            "- {}, {}, {} at {}",
            r.name,
            r.resource,
            format_date(r.date),
            format_time(r.time)
        )
    }));

    let long = Section::new(format!(
        "Long Reservations (>= {} hours)",
        Reservation::LONG_HOURS
    ))
    .lines(store.iter().filter(|r| r.is_long()).map(|r| {
        format!(
            "- {}, {} at {}, duration {} h, {}",
            r.name,
            format_date(r.date),
            format_time(r.time),
            r.duration_hours,
            r.resource
        )
    }));

    let status = Section::new("Reservation Confirmation Status").lines(store.iter().map(|r| {
        let label = if r.confirmed { "Confirmed" } else { "NOT Confirmed" };
        format!("{} → {}", r.name, label)
    }));

    let reducers = reservation_reducers();
    let totals = aggregate(store, Grouping::All, &reducers);
    let all = totals.whole();

    let counts = Section::new("Confirmation Summary")
        .line(format!("- Confirmed reservations: {} pcs", all.value(CONFIRMED) as usize))
        .line(format!("- Not confirmed reservations: {} pcs", all.value(UNCONFIRMED) as usize));

    let revenue = Section::new("Total Revenue").line(format!(
        "Total revenue from confirmed reservations: {} €",
        format_decimal(all.value(TOTAL_REVENUE))
    ));

    let rows: Vec<DailyRevenueRow> = aggregate(store, Grouping::ByDay, &reducers)
        .groups()
        .filter_map(|g| match g.key() {
            GroupKey::Day(date) => Some(DailyRevenueRow {
                date: format_date(date),
                weekday: weekday_name(date).to_string(),
                reservations: g.records(),
                confirmed: g.value(CONFIRMED) as usize,
                revenue: format_decimal(g.value(TOTAL_REVENUE)),
            }),
            _ => None,
        })
        .collect();
    let daily = Section::new("Revenue by Day").lines(render_table(rows, &DAILY_REVENUE_LAYOUT));

    Report::new(vec![confirmed, long, status, counts, revenue, daily])
}

/// One table per ISO week, each day a row with per-phase kWh.
pub fn daily_energy_report(store: &RecordStore<EnergySample>) -> Report {
    let summary = aggregate(store, Grouping::ByDay, &energy_reducers());

    let mut weeks: BTreeMap<(i32, u32), Vec<DailyEnergyRow>> = BTreeMap::new();
    for group in summary.groups() {
        let GroupKey::Day(date) = group.key() else {
            continue;
        };
        let week = date.iso_week();
        weeks
            .entry((week.year(), week.week()))
            .or_default()
            .push(daily_row(date, &group));
    }

    if weeks.is_empty() {
        return Report::new(vec![Section::new(
            "Electricity consumption and production (kWh, by phase)",
        )
        .lines(render_table(Vec::<DailyEnergyRow>::new(), &DAILY_ENERGY_LAYOUT))]);
    }

    Report::new(
        weeks
            .into_iter()
            .map(|((_, week), rows)| {
                Section::new(format!(
                    "Week {week} electricity consumption and production (kWh, by phase)"
                ))
                .lines(render_table(rows, &DAILY_ENERGY_LAYOUT))
            })
            .collect(),
    )
}

fn daily_row(date: NaiveDate, group: &GroupView<'_>) -> DailyEnergyRow {
    DailyEnergyRow {
        weekday: weekday_name(date).to_string(),
        date: format_date(date),
        cons_1: format_decimal(group.value(CONS_PHASE[0])),
        cons_2: format_decimal(group.value(CONS_PHASE[1])),
        cons_3: format_decimal(group.value(CONS_PHASE[2])),
        prod_1: format_decimal(group.value(PROD_PHASE[0])),
        prod_2: format_decimal(group.value(PROD_PHASE[1])),
        prod_3: format_decimal(group.value(PROD_PHASE[2])),
    }
}

fn totals_lines(group: &GroupView<'_>) -> Vec<String> {
    vec![
        format!("- Total consumption: {} kWh", format_decimal(group.value(CONS_TOTAL))),
        format!("- Total production: {} kWh", format_decimal(group.value(PROD_TOTAL))),
        format!(
            "- Average temperature: {} °C",
            format_decimal(group.value(AVG_TEMPERATURE))
        ),
        format!("- Samples: {}", group.value(SAMPLES) as usize),
    ]
}

/// Totals for `start..=end`. Callers validate the range first.
pub fn range_report(store: &RecordStore<EnergySample>, start: NaiveDate, end: NaiveDate) -> Report {
    let summary = aggregate(store, Grouping::ByRange(start, end), &energy_reducers());
    let section = Section::new(format!(
        "Report for the period {}–{}",
        format_date(start),
        format_date(end)
    ))
    .lines(totals_lines(&summary.whole()));
    Report::new(vec![section])
}

/// Totals for one month number across every year in the store.
pub fn month_report(store: &RecordStore<EnergySample>, month: u32) -> Report {
    let summary = aggregate(store, Grouping::ByMonth(month), &energy_reducers()).collapse();
    let name = month_name(month).unwrap_or("-");
    let section = Section::new(format!("Report for the month: {name}"))
        .lines(totals_lines(&summary.whole()));
    Report::new(vec![section])
}

pub fn year_report(store: &RecordStore<EnergySample>) -> Report {
    let reducers = energy_reducers();
    let label = match store.years() {
        Some((first, last)) if first == last => first.to_string(),
        Some((first, last)) => format!("{first}–{last}"),
        None => "-".to_string(),
    };
    let summary = aggregate(store, Grouping::All, &reducers);
    let totals = Section::new(format!("Report for the year: {label}"))
        .lines(totals_lines(&summary.whole()));

    let months: Vec<MonthlyEnergyRow> = aggregate(store, Grouping::EveryMonth, &reducers)
        .groups()
        .filter_map(|g| match g.key() {
            GroupKey::Month { year, month } => Some(MonthlyEnergyRow {
                month: format!("{} {year}", month_name(month).unwrap_or("-")),
                consumption: format_decimal(g.value(CONS_TOTAL)),
                production: format_decimal(g.value(PROD_TOTAL)),
                avg_temperature: format_decimal(g.value(AVG_TEMPERATURE)),
                samples: g.records(),
            }),
            _ => None,
        })
        .collect();
    let breakdown = Section::new("Monthly breakdown").lines(render_table(months, &MONTHLY_ENERGY_LAYOUT));

    Report::new(vec![totals, breakdown])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, NaiveTime};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reservation(id: u64, name: &str, duration_hours: u32, unit_price: f64, confirmed: bool) -> Reservation {
        let date = day(2025, 10, 12 + id as u32);
        Reservation {
            id,
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "0400000000".into(),
            date,
            time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            duration_hours,
            unit_price,
            confirmed,
            resource: "Room A".into(),
            created_at: date.and_hms_opt(8, 0, 0).unwrap(),
        }
    }

    fn sample(ts: NaiveDateTime, wh: f64, temperature: Option<f64>) -> EnergySample {
        EnergySample {
            timestamp: ts,
            consumption: [wh, wh, wh],
            production: [wh / 2.0, 0.0, 0.0],
            temperature,
        }
    }

    fn three_reservations() -> RecordStore<Reservation> {
        RecordStore::from(vec![
            reservation(1, "Anna", 2, 10.0, true),
            reservation(2, "Ben", 5, 20.0, false),
            reservation(3, "Cara", 3, 15.0, true),
        ])
    }

    #[test]
    fn reservation_sections() {
        let report = reservation_report(&three_reservations());
        let headings: Vec<&str> = report.sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(
            headings,
            vec![
                "Confirmed Reservations",
                "Long Reservations (>= 3 hours)",
                "Reservation Confirmation Status",
                "Confirmation Summary",
                "Total Revenue",
                "Revenue by Day",
            ]
        );
        assert_eq!(
            report.sections[0].lines,
            vec![
                "- Anna, Room A, 13.10.2025 at 09.30",
                "- Cara, Room A, 15.10.2025 at 09.30"
            ]
        );
        assert_eq!(report.sections[1].lines.len(), 2);
        assert_eq!(report.sections[2].lines[1], "Ben → NOT Confirmed");
        assert_eq!(
            report.sections[3].lines,
            vec!["- Confirmed reservations: 2 pcs", "- Not confirmed reservations: 1 pcs"]
        );
        assert_eq!(
            report.sections[4].lines,
            vec!["Total revenue from confirmed reservations: 65,00 €"]
        );
    }

    #[test]
    fn empty_reservations_still_render_every_section() {
        let report = reservation_report(&RecordStore::new());
        assert_eq!(report.sections.len(), 6);
        assert_eq!(report.sections[0].lines, vec!["No valid reservations found."]);
        assert!(report.sections[4].lines[0].ends_with("0,00 €"));
    }

    #[test]
    fn daily_energy_splits_by_week() {
        let mut samples = Vec::new();
        for d in 12..=14 {
            for hour in 0..24 {
                samples.push(sample(day(2025, 10, d).and_hms_opt(hour, 0, 0).unwrap(), 500.0, None));
            }
        }
        let report = daily_energy_report(&RecordStore::from(samples));
        assert_eq!(report.sections.len(), 2);
        assert!(report.sections[0].heading.starts_with("Week 41 "));
        assert!(report.sections[1].heading.starts_with("Week 42 "));

        let monday = report.sections[1]
            .lines
            .iter()
            .find(|l| l.contains("13.10.2025"))
            .unwrap();
        assert!(monday.contains("Monday"));
        assert!(monday.contains("12,00"));
        assert!(monday.contains("6,00"));
    }

    #[test]
    fn range_report_lines() {
        let store = RecordStore::from(vec![
            sample(day(2025, 1, 1).and_hms_opt(0, 0, 0).unwrap(), 1000.0, Some(-2.0)),
            sample(day(2025, 1, 2).and_hms_opt(0, 0, 0).unwrap(), 1000.0, Some(4.0)),
            sample(day(2025, 1, 5).and_hms_opt(0, 0, 0).unwrap(), 1000.0, Some(40.0)),
        ]);
        let report = range_report(&store, day(2025, 1, 1), day(2025, 1, 2));
        assert_eq!(report.sections[0].heading, "Report for the period 01.01.2025–02.01.2025");
        assert_eq!(
            report.sections[0].lines,
            vec![
                "- Total consumption: 6,00 kWh",
                "- Total production: 1,00 kWh",
                "- Average temperature: 1,00 °C",
                "- Samples: 2",
            ]
        );
    }

    #[test]
    fn empty_month_is_zeros() {
        let report = month_report(&RecordStore::new(), 2);
        assert_eq!(report.sections[0].heading, "Report for the month: February");
        assert_eq!(report.sections[0].lines[2], "- Average temperature: 0,00 °C");
        assert_eq!(report.sections[0].lines[3], "- Samples: 0");
    }

    #[test]
    fn year_report_labels_and_breakdown() {
        let store = RecordStore::from(vec![
            sample(day(2025, 3, 1).and_hms_opt(0, 0, 0).unwrap(), 1000.0, Some(1.0)),
            sample(day(2025, 1, 1).and_hms_opt(0, 0, 0).unwrap(), 1000.0, Some(3.0)),
        ]);
        let report = year_report(&store);
        assert_eq!(report.sections[0].heading, "Report for the year: 2025");
        assert_eq!(report.sections[0].lines[0], "- Total consumption: 6,00 kWh");
        assert_eq!(report.sections[0].lines[2], "- Average temperature: 2,00 °C");

        let breakdown = &report.sections[1].lines;
        let jan = breakdown.iter().position(|l| l.contains("January 2025")).unwrap();
        let mar = breakdown.iter().position(|l| l.contains("March 2025")).unwrap();
        assert!(jan < mar);
        assert!(breakdown.iter().all(|l| !l.contains("February")));
    }

    #[test]
    fn year_breakdown_spans_years_in_order() {
        let store = RecordStore::from(vec![
            sample(day(2025, 1, 15).and_hms_opt(0, 0, 0).unwrap(), 1000.0, None),
            sample(day(2024, 12, 15).and_hms_opt(0, 0, 0).unwrap(), 1000.0, None),
        ]);
        let report = year_report(&store);
        assert_eq!(report.sections[0].heading, "Report for the year: 2024–2025");
        let breakdown = &report.sections[1].lines;
        let dec = breakdown.iter().position(|l| l.contains("December 2024")).unwrap();
        let jan = breakdown.iter().position(|l| l.contains("January 2025")).unwrap();
        assert!(dec < jan);
    }

    #[test]
    fn empty_year_has_placeholder_label() {
        let report = year_report(&RecordStore::new());
        assert_eq!(report.sections[0].heading, "Report for the year: -");
    }
}
