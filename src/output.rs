use crate::error::{ReportError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tabled::settings::object::{Cell, Columns};
use tabled::settings::{Alignment, Format, Modify, Style, Width};
use tabled::{Table, Tabled};

/// A named block of report text. The heading is the first line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    pub lines: Vec<String>,
}

impl Section {
    pub fn new(heading: impl Into<String>) -> Self {
        Section {
            heading: heading.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub sections: Vec<Section>,
}

impl Report {
    pub fn new(sections: Vec<Section>) -> Self {
        Report { sections }
    }

    /// Sections in order, exactly one blank line between two sections and
    /// none after the last.
    pub fn render(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push(String::new());
            }
            out.push(section.heading.clone());
            out.extend(section.lines.iter().cloned());
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Fixed width of one table column. Longer left-aligned text is cut with a
/// trailing `…`; right-aligned numbers are never cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub width: usize,
    pub align: Align,
}

impl ColumnSpec {
    pub const fn left(width: usize) -> Self {
        ColumnSpec {
            width,
            align: Align::Left,
        }
    }

    pub const fn right(width: usize) -> Self {
        ColumnSpec {
            width,
            align: Align::Right,
        }
    }
}

/// Weekday, date, three consumption and three production phases.
pub const DAILY_ENERGY_LAYOUT: [ColumnSpec; 8] = [
    ColumnSpec::left(9),
    ColumnSpec::left(10),
    ColumnSpec::right(9),
    ColumnSpec::right(9),
    ColumnSpec::right(9),
    ColumnSpec::right(9),
    ColumnSpec::right(9),
    ColumnSpec::right(9),
];

/// Month, consumption, production, average temperature, samples.
pub const MONTHLY_ENERGY_LAYOUT: [ColumnSpec; 5] = [
    ColumnSpec::left(14),
    ColumnSpec::right(17),
    ColumnSpec::right(16),
    ColumnSpec::right(13),
    ColumnSpec::right(7),
];

/// Date, weekday, reservations, confirmed, revenue.
pub const DAILY_REVENUE_LAYOUT: [ColumnSpec; 5] = [
    ColumnSpec::left(10),
    ColumnSpec::left(9),
    ColumnSpec::right(12),
    ColumnSpec::right(9),
    ColumnSpec::right(12),
];

/// Render rows as a borderless table whose column widths come from
/// `layout`, never from the data. A number wider than its column widens
/// that column instead of losing digits. An empty `rows` still yields the
/// header.
pub fn render_table<T: Tabled>(rows: Vec<T>, layout: &[ColumnSpec]) -> Vec<String> {
    let mut table = Table::new(rows);
    table.with(Style::blank());
    for (col, spec) in layout.iter().copied().enumerate() {
        match spec.align {
            Align::Left => table.with(
                Modify::new(Columns::single(col))
                    .with(Width::truncate(spec.width).suffix("…"))
                    .with(Alignment::left()),
            ),
            Align::Right => table.with(Modify::new(Columns::single(col)).with(Alignment::right())),
        };
        // The padded header pins the column width.
        table.with(Modify::new(Cell::new(0, col)).with(Format::content(move |s| pad(s, spec))));
    }
    table
        .to_string()
        .lines()
        .map(|l| l.trim_end().to_string())
        .collect()
}

fn pad(text: &str, spec: ColumnSpec) -> String {
    let width = spec.width;
    match spec.align {
        Align::Left => format!("{text:<width$}"),
        Align::Right => format!("{text:>width$}"),
    }
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

/// Write report lines verbatim, one per line, UTF-8.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut w = BufWriter::new(File::create(path).map_err(io_err)?);
    for line in lines {
        writeln!(w, "{}", line).map_err(io_err)?;
    }
    w.flush().map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DailyEnergyRow, DailyRevenueRow};

    fn row(weekday: &str, date: &str, value: &str) -> DailyEnergyRow {
        DailyEnergyRow {
            weekday: weekday.into(),
            date: date.into(),
            cons_1: value.into(),
            cons_2: value.into(),
            cons_3: value.into(),
            prod_1: value.into(),
            prod_2: value.into(),
            prod_3: value.into(),
        }
    }

    #[test]
    fn sections_are_separated_by_one_blank_line() {
        let report = Report::new(vec![
            Section::new("Confirmed Reservations").line("- Anna"),
            Section::new("Total Revenue").line("65,00 €"),
        ]);
        assert_eq!(
            report.render(),
            vec!["Confirmed Reservations", "- Anna", "", "Total Revenue", "65,00 €"]
        );
    }

    #[test]
    fn empty_report_renders_nothing() {
        assert!(Report::default().render().is_empty());
    }

    #[test]
    fn table_width_does_not_follow_content() {
        let narrow = render_table(vec![row("Monday", "13.10.2025", "1,00")], &DAILY_ENERGY_LAYOUT);
        let wide = render_table(vec![row("Monday", "13.10.2025", "1234,00")], &DAILY_ENERGY_LAYOUT);
        assert_eq!(narrow[0], wide[0]);
        assert_eq!(narrow[1].chars().count(), wide[1].chars().count());
    }

    fn revenue_row(revenue: &str) -> DailyRevenueRow {
        DailyRevenueRow {
            date: "13.10.2025".into(),
            weekday: "Monday".into(),
            reservations: 3,
            confirmed: 2,
            revenue: revenue.into(),
        }
    }

    #[test]
    fn wide_numbers_keep_every_digit() {
        let revenue = render_table(vec![revenue_row("1234567890123,00")], &DAILY_REVENUE_LAYOUT);
        assert!(revenue[1].ends_with("1234567890123,00"));

        let energy = render_table(vec![row("Monday", "13.10.2025", "1234567,00")], &DAILY_ENERGY_LAYOUT);
        assert!(energy[1].ends_with("1234567,00"));
        assert_eq!(energy[1].matches("1234567,00").count(), 6);
    }

    #[test]
    fn long_text_is_cut_with_a_marker() {
        let lines = render_table(vec![row("Wednesdays", "13.10.2025", "1,00")], &DAILY_ENERGY_LAYOUT);
        assert!(lines[1].contains('…'));
        assert!(!lines[1].contains("Wednesdays"));
        assert!(lines[1].contains("13.10.2025"));
    }

    #[test]
    fn right_aligned_headers_end_with_their_numbers() {
        let lines = render_table(vec![revenue_row("65,00")], &DAILY_REVENUE_LAYOUT);
        assert!(lines[0].ends_with("Revenue [€]"));
        assert!(lines[1].ends_with("65,00"));
        assert_eq!(lines[0].chars().count(), lines[1].chars().count());

        let confirmed = lines[0].find("Confirmed").unwrap() + "Confirmed".len();
        let header_prefix = lines[0][..confirmed].chars().count();
        let data_prefix = lines[1].chars().take(header_prefix).collect::<String>();
        assert!(data_prefix.ends_with('2'));
    }

    #[test]
    fn table_rendering_is_repeatable() {
        let rows = || vec![row("Monday", "13.10.2025", "7,50"), row("Tuesday", "14.10.2025", "0,00")];
        assert_eq!(
            render_table(rows(), &DAILY_ENERGY_LAYOUT),
            render_table(rows(), &DAILY_ENERGY_LAYOUT)
        );
    }

    #[test]
    fn empty_table_keeps_its_header() {
        let lines = render_table(Vec::<DailyEnergyRow>::new(), &DAILY_ENERGY_LAYOUT);
        assert!(!lines.is_empty());
        assert!(lines[0].contains("Cons v1"));
        assert!(lines.iter().all(|l| !l.contains("Monday")));
    }

    #[test]
    fn writes_lines_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        write_lines(&path, &["a".to_string(), String::new(), "b".to_string()]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\n\nb\n");
    }
}
