use crate::config::{HeaderPolicy, SourceFormat};
use crate::decode::{decode, looks_like_reservation_header, DecodeError, EnergyLayout, Variant};
use crate::error::{ReportError, Result};
use crate::store::RecordStore;
use crate::types::{EnergySample, RawRow, Reservation, TypedRecord};
use crate::util::format_int;
use csv::{ReaderBuilder, Trim};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: u64,
    pub raw: String,
    pub error: DecodeError,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub blank_rows: usize,
    pub header_skipped: bool,
    pub skipped: Vec<SkippedRow>,
}

impl LoadReport {
    fn log(&self, source: &Path) {
        info!(
            "{}: {} rows read, {} records kept, {} skipped",
            source.display(),
            format_int(self.total_rows),
            format_int(self.kept_rows),
            format_int(self.skipped.len())
        );
    }
}

/// Split a source into raw rows. Quoting is off: the delimiter always
/// separates fields. Bytes that are not UTF-8 are replaced, so the row still
/// reaches the decoder and gets reported there.
pub fn read_raw_rows<R: Read>(reader: R, format: &SourceFormat) -> Result<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(format.delimiter_byte()?)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.byte_records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let fields = record
            .iter()
            .map(|f| String::from_utf8_lossy(f).trim().to_string())
            .collect();
        rows.push(RawRow::new(line, fields));
    }
    Ok(rows)
}

// Decode every row as `variant`, logging and recording failures. `check`
// sees each decoded record before it is stored. Blank rows are counted but
// not reported.
fn decode_rows<T>(
    rows: impl Iterator<Item = RawRow>,
    variant: &Variant,
    format: &SourceFormat,
    report: &mut LoadReport,
    mut check: impl FnMut(&T) -> std::result::Result<(), DecodeError>,
) -> RecordStore<T>
where
    T: TryFrom<TypedRecord, Error = DecodeError>,
{
    let mut store = RecordStore::new();
    for row in rows {
        report.total_rows += 1;
        let decoded = decode(&row, variant, format)
            .and_then(<T as TryFrom<TypedRecord>>::try_from)
            .and_then(|record| check(&record).map(|()| record));
        match decoded {
            Ok(record) => store.push(record),
            Err(DecodeError::EmptyRow) => report.blank_rows += 1,
            Err(error) => {
                let raw = row.joined(format.delimiter);
                warn!(line = row.line, "skipping invalid row: {raw} ({error})");
                report.skipped.push(SkippedRow {
                    line: row.line,
                    raw,
                    error,
                });
            }
        }
    }
    report.kept_rows = store.len();
    store
}

pub fn load_reservations<R: Read>(
    reader: R,
    format: &SourceFormat,
) -> Result<(RecordStore<Reservation>, LoadReport)> {
    let mut rows = read_raw_rows(reader, format)?.into_iter().peekable();
    let mut report = LoadReport::default();

    // A malformed first data row stays in and is reported like any other.
    let drop_first = match format.header {
        HeaderPolicy::Required => true,
        HeaderPolicy::Optional => rows.peek().is_some_and(looks_like_reservation_header),
        HeaderPolicy::Absent => false,
    };
    if drop_first {
        if let Some(header) = rows.next() {
            debug!("treating first row as header: {}", header.joined(format.delimiter));
            report.header_skipped = true;
        }
    }

    let mut seen = HashSet::new();
    let store = decode_rows(rows, &Variant::Reservation, format, &mut report, |r: &Reservation| {
        if seen.insert(r.id) {
            Ok(())
        } else {
            Err(DecodeError::DuplicateId(r.id))
        }
    });
    Ok((store, report))
}

pub fn load_energy<R: Read>(
    reader: R,
    format: &SourceFormat,
) -> Result<(RecordStore<EnergySample>, LoadReport)> {
    let mut rows = read_raw_rows(reader, format)?
        .into_iter()
        .skip_while(RawRow::is_blank)
        .peekable();
    let mut report = LoadReport::default();

    let layout = match format.header {
        HeaderPolicy::Required => match rows.next() {
            Some(header) => {
                report.header_skipped = true;
                EnergyLayout::from_header(&header)?
            }
            None => return Ok((RecordStore::new(), report)),
        },
        HeaderPolicy::Optional => match rows.peek().map(EnergyLayout::from_header) {
            Some(Ok(layout)) => {
                rows.next();
                report.header_skipped = true;
                layout
            }
            _ => EnergyLayout::positional(),
        },
        HeaderPolicy::Absent => EnergyLayout::positional(),
    };
    debug!(?layout, "energy columns resolved");

    let variant = Variant::Energy(layout);
    let store = decode_rows(rows, &variant, format, &mut report, |_: &EnergySample| Ok(()));
    Ok((store, report))
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
}

pub fn load_reservations_file(
    path: &Path,
    format: &SourceFormat,
) -> Result<(RecordStore<Reservation>, LoadReport)> {
    let (store, report) = load_reservations(open(path)?, format)?;
    report.log(path);
    Ok((store, report))
}

pub fn load_energy_file(
    path: &Path,
    format: &SourceFormat,
) -> Result<(RecordStore<EnergySample>, LoadReport)> {
    let (store, report) = load_energy(open(path)?, format)?;
    report.log(path);
    Ok((store, report))
}

/// An unreadable input becomes an empty store; other failures propagate.
pub fn empty_on_io_error<T>(loaded: Result<(RecordStore<T>, LoadReport)>) -> Result<RecordStore<T>> {
    match loaded {
        Ok((store, _)) => Ok(store),
        Err(err @ ReportError::Io { .. }) => {
            error!("{err}; continuing with no records");
            Ok(RecordStore::new())
        }
        Err(err) => Err(err),
    }
}

/// Load several energy files into one store, in the order given.
pub fn load_energy_files<P: AsRef<Path>>(
    paths: &[P],
    format: &SourceFormat,
) -> Result<RecordStore<EnergySample>> {
    let mut store = RecordStore::new();
    for path in paths {
        store.extend(empty_on_io_error(load_energy_file(path.as_ref(), format))?);
    }
    Ok(store)
}
