//! Grouping and reduction.
//!
//! [`aggregate`] walks a record slice once, routes each record to a
//! [`GroupKey`] chosen by the [`Grouping`], and feeds every declared
//! [`Reducer`] column. The returned [`Summary`] lists its groups in ascending
//! key order, so formatters can iterate it directly.

use crate::types::{Dated, EnergySample, Reservation};
use crate::util::average;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// One group per calendar day.
    ByDay,
    /// Only records in the given month (1..=12), one group per year.
    ByMonth(u32),
    /// One group per calendar month of every year.
    EveryMonth,
    /// Records with `start <= date <= end`, as a single group.
    ByRange(NaiveDate, NaiveDate),
    /// Every record, as a single group.
    All,
}

impl Grouping {
    fn key_for(self, date: NaiveDate) -> Option<GroupKey> {
        match self {
            Grouping::ByDay => Some(GroupKey::Day(date)),
            Grouping::ByMonth(month) => (date.month() == month).then(|| GroupKey::Month {
                year: date.year(),
                month,
            }),
            Grouping::EveryMonth => Some(GroupKey::Month {
                year: date.year(),
                month: date.month(),
            }),
            Grouping::ByRange(start, end) => (start <= date && date <= end).then_some(GroupKey::Whole),
            Grouping::All => Some(GroupKey::Whole),
        }
    }

    // Single-group groupings always report their group, even when empty.
    fn always_has_whole(self) -> bool {
        matches!(self, Grouping::ByRange(..) | Grouping::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Day(NaiveDate),
    Month { year: i32, month: u32 },
    Whole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    Sum,
    /// Number of records whose extractor yields a value.
    Count,
    /// Sum over count of yielded values; 0 when nothing was yielded.
    Average,
}

/// One output column: a name, how to reduce, and what to read from a
/// record. Returning `None` leaves the record out of this column.
pub struct Reducer<T> {
    pub name: &'static str,
    pub op: ReduceOp,
    pub extract: fn(&T) -> Option<f64>,
}

impl<T> Clone for Reducer<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Reducer<T> {}

impl<T> Reducer<T> {
    pub const fn sum(name: &'static str, extract: fn(&T) -> Option<f64>) -> Self {
        Reducer {
            name,
            op: ReduceOp::Sum,
            extract,
        }
    }

    pub const fn count(name: &'static str, extract: fn(&T) -> Option<f64>) -> Self {
        Reducer {
            name,
            op: ReduceOp::Count,
            extract,
        }
    }

    pub const fn average(name: &'static str, extract: fn(&T) -> Option<f64>) -> Self {
        Reducer {
            name,
            op: ReduceOp::Average,
            extract,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn merge(&mut self, other: &Accumulator) {
        self.sum += other.sum;
        self.count += other.count;
    }

    fn finish(&self, op: ReduceOp) -> f64 {
        match op {
            ReduceOp::Sum => self.sum,
            ReduceOp::Count => self.count as f64,
            ReduceOp::Average => average(self.sum, self.count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Column {
    name: &'static str,
    op: ReduceOp,
}

#[derive(Debug, Clone, PartialEq)]
struct Group {
    key: GroupKey,
    records: usize,
    accumulators: Vec<Accumulator>,
}

impl Group {
    fn empty(key: GroupKey, width: usize) -> Self {
        Group {
            key,
            records: 0,
            accumulators: vec![Accumulator::default(); width],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    columns: Vec<Column>,
    groups: Vec<Group>,
}

/// Read access to one group of a [`Summary`].
#[derive(Debug, Clone, Copy)]
pub struct GroupView<'a> {
    columns: &'a [Column],
    group: &'a Group,
}

impl GroupView<'_> {
    pub fn key(&self) -> GroupKey {
        self.group.key
    }

    /// Records routed to this group, regardless of column filters.
    pub fn records(&self) -> usize {
        self.group.records
    }

    /// Final value of a column. Unknown names read as 0.
    pub fn value(&self, name: &str) -> f64 {
        let idx = self.columns.iter().position(|c| c.name == name);
        debug_assert!(idx.is_some(), "unknown summary column {name}");
        idx.and_then(|i| {
            self.group
                .accumulators
                .get(i)
                .map(|acc| acc.finish(self.columns[i].op))
        })
        .unwrap_or(0.0)
    }
}

impl Summary {
    /// Groups in ascending key order.
    pub fn groups(&self) -> impl Iterator<Item = GroupView<'_>> + '_ {
        self.groups.iter().map(|group| GroupView {
            columns: &self.columns,
            group,
        })
    }

    pub fn group(&self, key: GroupKey) -> Option<GroupView<'_>> {
        self.groups().find(|g| g.key() == key)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Fold every group into one `Whole` group. Averages are recomputed from
    /// the underlying sums and counts, not averaged again.
    pub fn collapse(&self) -> Summary {
        let mut whole = Group::empty(GroupKey::Whole, self.columns.len());
        for group in &self.groups {
            whole.records += group.records;
            for (acc, other) in whole.accumulators.iter_mut().zip(&group.accumulators) {
                acc.merge(other);
            }
        }
        Summary {
            columns: self.columns.clone(),
            groups: vec![whole],
        }
    }

    /// The `Whole` group of a range, all or collapsed summary. Reads as all
    /// zeros when there is none.
    pub fn whole(&self) -> GroupView<'_> {
        let group = self
            .groups
            .iter()
            .find(|g| g.key == GroupKey::Whole)
            .unwrap_or(&EMPTY_GROUP);
        GroupView {
            columns: &self.columns,
            group,
        }
    }
}

static EMPTY_GROUP: Group = Group {
    key: GroupKey::Whole,
    records: 0,
    accumulators: Vec::new(),
};

pub fn aggregate<'a, T, I>(records: I, grouping: Grouping, reducers: &[Reducer<T>]) -> Summary
where
    T: Dated + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let width = reducers.len();
    let mut groups: BTreeMap<GroupKey, Group> = BTreeMap::new();
    if grouping.always_has_whole() {
        groups.insert(GroupKey::Whole, Group::empty(GroupKey::Whole, width));
    }

    for record in records {
        let Some(key) = grouping.key_for(record.date()) else {
            continue;
        };
        let group = groups
            .entry(key)
            .or_insert_with(|| Group::empty(key, width));
        group.records += 1;
        for (acc, reducer) in group.accumulators.iter_mut().zip(reducers) {
            acc.add((reducer.extract)(record));
        }
    }

    Summary {
        columns: reducers
            .iter()
            .map(|r| Column {
                name: r.name,
                op: r.op,
            })
            .collect(),
        groups: groups.into_values().collect(),
    }
}

const WH_PER_KWH: f64 = 1000.0;

pub mod columns {
    pub const CONS_PHASE: [&str; 3] = ["cons_phase1_kwh", "cons_phase2_kwh", "cons_phase3_kwh"];
    pub const PROD_PHASE: [&str; 3] = ["prod_phase1_kwh", "prod_phase2_kwh", "prod_phase3_kwh"];
    pub const CONS_TOTAL: &str = "cons_total_kwh";
    pub const PROD_TOTAL: &str = "prod_total_kwh";
    pub const AVG_TEMPERATURE: &str = "avg_temperature";
    pub const SAMPLES: &str = "sample_count";

    pub const TOTAL_REVENUE: &str = "total_revenue";
    pub const CONFIRMED: &str = "confirmed_count";
    pub const UNCONFIRMED: &str = "unconfirmed_count";
    pub const RESERVATIONS: &str = "reservation_count";
    pub const LONG: &str = "long_count";
    pub const BOOKED_HOURS: &str = "booked_hours";
}

/// Watt-hour readings reduced to kilowatt-hours, plus temperature and count.
pub fn energy_reducers() -> Vec<Reducer<EnergySample>> {
    use columns::*;
    type R = Reducer<EnergySample>;
    vec![
        R::sum(CONS_PHASE[0], |s| Some(s.consumption[0] / WH_PER_KWH)),
        R::sum(CONS_PHASE[1], |s| Some(s.consumption[1] / WH_PER_KWH)),
        R::sum(CONS_PHASE[2], |s| Some(s.consumption[2] / WH_PER_KWH)),
        R::sum(PROD_PHASE[0], |s| Some(s.production[0] / WH_PER_KWH)),
        R::sum(PROD_PHASE[1], |s| Some(s.production[1] / WH_PER_KWH)),
        R::sum(PROD_PHASE[2], |s| Some(s.production[2] / WH_PER_KWH)),
        R::sum(CONS_TOTAL, |s| Some(s.consumption_wh() / WH_PER_KWH)),
        R::sum(PROD_TOTAL, |s| Some(s.production_wh() / WH_PER_KWH)),
        R::average(AVG_TEMPERATURE, |s| s.temperature),
        R::count(SAMPLES, |_| Some(1.0)),
    ]
}

/// Revenue counts confirmed reservations only.
pub fn reservation_reducers() -> Vec<Reducer<Reservation>> {
    use columns::*;
    type R = Reducer<Reservation>;
    vec![
        R::sum(TOTAL_REVENUE, |r| r.confirmed.then(|| r.total_price())),
        R::count(CONFIRMED, |r| r.confirmed.then_some(1.0)),
        R::count(UNCONFIRMED, |r| (!r.confirmed).then_some(1.0)),
        R::count(RESERVATIONS, |_| Some(1.0)),
        R::count(LONG, |r| r.is_long().then_some(1.0)),
        R::sum(BOOKED_HOURS, |r| Some(r.duration_hours as f64)),
    ]
}

#[cfg(test)]
mod tests {
    use super::columns::*;
    use super::*;
    use chrono::{NaiveDateTime, NaiveTime};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
        date.and_hms_opt(hour, 0, 0).unwrap()
    }

    fn reservation(id: u64, date: NaiveDate, duration_hours: u32, unit_price: f64, confirmed: bool) -> Reservation {
        Reservation {
            id,
            name: format!("guest {id}"),
            email: String::new(),
            phone: String::new(),
            date,
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            duration_hours,
            unit_price,
            confirmed,
            resource: "Room A".into(),
            created_at: at(date, 0),
        }
    }

    fn sample(ts: NaiveDateTime, cons: f64, prod: f64, temperature: Option<f64>) -> EnergySample {
        EnergySample {
            timestamp: ts,
            consumption: [cons, cons * 2.0, 0.0],
            production: [prod, 0.0, 0.0],
            temperature,
        }
    }

    #[test]
    fn revenue_counts_confirmed_only() {
        let data = vec![
            reservation(1, day(2025, 10, 13), 2, 10.0, true),
            reservation(2, day(2025, 10, 14), 5, 20.0, false),
            reservation(3, day(2025, 10, 15), 3, 15.0, true),
        ];
        let summary = aggregate(&data, Grouping::All, &reservation_reducers());
        let all = summary.whole();
        assert_eq!(all.value(TOTAL_REVENUE), 65.0);
        assert_eq!(all.value(CONFIRMED), 2.0);
        assert_eq!(all.value(UNCONFIRMED), 1.0);
        assert_eq!(all.value(RESERVATIONS), 3.0);
        assert_eq!(all.value(LONG), 2.0);
        assert_eq!(all.records(), 3);
    }

    #[test]
    fn empty_range_is_zeros_not_a_fault() {
        let data = vec![sample(at(day(2025, 2, 1), 0), 100.0, 0.0, Some(5.0))];
        let range = Grouping::ByRange(day(2025, 1, 1), day(2025, 1, 1));
        let summary = aggregate(&data, range, &energy_reducers());
        assert_eq!(summary.len(), 1);
        let whole = summary.whole();
        assert_eq!(whole.value(AVG_TEMPERATURE), 0.0);
        assert_eq!(whole.value(SAMPLES), 0.0);
        assert_eq!(whole.value(CONS_TOTAL), 0.0);
        assert_eq!(whole.records(), 0);
    }

    #[test]
    fn range_is_inclusive_on_both_ends() {
        let data = vec![
            sample(at(day(2025, 1, 1), 0), 1000.0, 0.0, None),
            sample(at(day(2025, 1, 2), 23), 1000.0, 0.0, None),
            sample(at(day(2025, 1, 3), 0), 1000.0, 0.0, None),
        ];
        let summary = aggregate(&data, Grouping::ByRange(day(2025, 1, 1), day(2025, 1, 2)), &energy_reducers());
        assert_eq!(summary.whole().value(SAMPLES), 2.0);
        assert_eq!(summary.whole().value(CONS_PHASE[0]), 2.0);
    }

    #[test]
    fn daily_groups_sum_to_the_whole() {
        let mut data = Vec::new();
        for d in 13..=19 {
            for hour in 0..24 {
                let cons = (d * 100 + hour) as f64;
                let temp = (hour % 3 != 0).then_some(hour as f64 - 5.0);
                data.push(sample(at(day(2025, 10, d), hour), cons, cons / 4.0, temp));
            }
        }
        let reducers = energy_reducers();
        let daily = aggregate(&data, Grouping::ByDay, &reducers);
        let whole = aggregate(&data, Grouping::All, &reducers);
        assert_eq!(daily.len(), 7);

        for name in whole.column_names().filter(|n| *n != AVG_TEMPERATURE) {
            let by_day: f64 = daily.groups().map(|g| g.value(name)).sum();
            let total = whole.whole().value(name);
            assert!((by_day - total).abs() < 1e-9, "{name}: {by_day} vs {total}");
        }
        let collapsed = daily.collapse();
        assert!((collapsed.whole().value(AVG_TEMPERATURE) - whole.whole().value(AVG_TEMPERATURE)).abs() < 1e-9);
    }

    #[test]
    fn groups_come_out_in_date_order() {
        let data = vec![
            sample(at(day(2025, 10, 15), 0), 1.0, 0.0, None),
            sample(at(day(2025, 10, 13), 0), 1.0, 0.0, None),
            sample(at(day(2025, 10, 14), 0), 1.0, 0.0, None),
        ];
        let keys: Vec<GroupKey> = aggregate(&data, Grouping::ByDay, &energy_reducers())
            .groups()
            .map(|g| g.key())
            .collect();
        assert_eq!(
            keys,
            vec![
                GroupKey::Day(day(2025, 10, 13)),
                GroupKey::Day(day(2025, 10, 14)),
                GroupKey::Day(day(2025, 10, 15)),
            ]
        );
    }

    #[test]
    fn month_grouping_excludes_other_months() {
        let data = vec![
            sample(at(day(2025, 9, 30), 23), 5000.0, 0.0, Some(100.0)),
            sample(at(day(2025, 10, 1), 0), 1000.0, 500.0, Some(10.0)),
            sample(at(day(2025, 10, 31), 23), 3000.0, 0.0, Some(20.0)),
        ];
        let summary = aggregate(&data, Grouping::ByMonth(10), &energy_reducers());
        assert_eq!(summary.len(), 1);
        let october = summary.group(GroupKey::Month { year: 2025, month: 10 }).unwrap();
        assert_eq!(october.value(CONS_PHASE[0]), 4.0);
        assert_eq!(october.value(CONS_TOTAL), 12.0);
        assert_eq!(october.value(PROD_TOTAL), 0.5);
        assert_eq!(october.value(AVG_TEMPERATURE), 15.0);
    }

    #[test]
    fn every_month_keys_by_year_and_month() {
        let data = vec![
            sample(at(day(2025, 3, 2), 0), 1000.0, 0.0, None),
            sample(at(day(2024, 12, 31), 23), 2000.0, 0.0, None),
            sample(at(day(2025, 3, 9), 0), 1000.0, 0.0, None),
        ];
        let summary = aggregate(&data, Grouping::EveryMonth, &energy_reducers());
        let keys: Vec<GroupKey> = summary.groups().map(|g| g.key()).collect();
        assert_eq!(
            keys,
            vec![
                GroupKey::Month { year: 2024, month: 12 },
                GroupKey::Month { year: 2025, month: 3 },
            ]
        );
        let march = summary.group(GroupKey::Month { year: 2025, month: 3 }).unwrap();
        assert_eq!(march.records(), 2);
        assert_eq!(march.value(CONS_PHASE[0]), 2.0);
    }

    #[test]
    fn empty_month_collapses_to_zeros() {
        let data: Vec<EnergySample> = Vec::new();
        let summary = aggregate(&data, Grouping::ByMonth(3), &energy_reducers());
        assert!(summary.is_empty());
        let whole = summary.collapse();
        assert_eq!(whole.whole().value(AVG_TEMPERATURE), 0.0);
        assert_eq!(whole.whole().value(SAMPLES), 0.0);
    }

    #[test]
    fn stored_samples_keep_watt_hours() {
        let data = vec![sample(at(day(2025, 1, 1), 0), 1500.0, 0.0, None)];
        let _ = aggregate(&data, Grouping::All, &energy_reducers());
        assert_eq!(data[0].consumption[0], 1500.0);
    }
}
