use crate::types::Dated;
use chrono::{Datelike, NaiveDate};

/// Decoded records in source order. Filled once by the loader, read by
/// every report afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordStore<T> {
    records: Vec<T>,
}

impl<T> Default for RecordStore<T> {
    fn default() -> Self {
        RecordStore {
            records: Vec::new(),
        }
    }
}

impl<T> RecordStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: T) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Append every record of `other`, keeping order.
    pub fn extend(&mut self, other: RecordStore<T>) {
        self.records.extend(other.records);
    }
}

impl<T: Dated> RecordStore<T> {
    /// Earliest and latest record date.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(Dated::date).min()?;
        let last = self.records.iter().map(Dated::date).max()?;
        Some((first, last))
    }

    pub fn years(&self) -> Option<(i32, i32)> {
        self.date_span().map(|(a, b)| (a.year(), b.year()))
    }
}

impl<T> From<Vec<T>> for RecordStore<T> {
    fn from(records: Vec<T>) -> Self {
        RecordStore { records }
    }
}

impl<'a, T> IntoIterator for &'a RecordStore<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
