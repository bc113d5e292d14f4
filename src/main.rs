// Entry point and CLI flow.
//
// Each subcommand loads its input, builds one report, prints it and
// optionally writes it to `--output`. `interactive` loads one energy file and
// then loops over the report menu until the user exits.
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use usage_report::config::Settings;
use usage_report::error::ReportError;
use usage_report::loader::{empty_on_io_error, load_energy_files, load_reservations_file};
use usage_report::output::{print_lines, write_lines};
use usage_report::selector::{self, ReportKind, Stores};

#[derive(Parser, Debug)]
#[command(name = "usage-report", version, about = "Reservation and electricity usage reports")]
struct Cli {
    /// JSON settings file (delimiters, decimal style, report file name)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write the report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Confirmation lists and revenue from a reservation file
    Reservations { file: PathBuf },
    /// Per-day phase totals, one table per week
    Daily {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Totals between two dates (dd.mm.yyyy), both included
    Range {
        file: PathBuf,
        start: String,
        end: String,
    },
    /// Totals for one month (1-12)
    Month { file: PathBuf, month: String },
    /// Totals for the whole file with a monthly breakdown
    Year { file: PathBuf },
    /// Menu-driven reports over one energy file
    Interactive { file: PathBuf },
}

fn run(cli: Cli) -> Result<(), ReportError> {
    let settings = match &cli.config {
        Some(path) => Settings::from_json_file(path)?,
        None => Settings::default(),
    };

    // Parameters are validated before anything is read.
    let (kind, files) = match cli.command {
        Command::Interactive { file } => {
            let energy = load_energy_files(&[file], &settings.energy)?;
            let stdin = io::stdin();
            return selector::run_interactive(stdin.lock(), io::stdout(), &energy, &settings)
                .map_err(|source| ReportError::Io {
                    path: PathBuf::from("<console>"),
                    source,
                });
        }
        Command::Reservations { file } => (ReportKind::Reservations, vec![file]),
        Command::Daily { files } => (ReportKind::DailyTables, files),
        Command::Range { file, start, end } => (ReportKind::date_range(&start, &end)?, vec![file]),
        Command::Month { file, month } => (ReportKind::month(&month)?, vec![file]),
        Command::Year { file } => (ReportKind::Year, vec![file]),
    };

    let mut stores = Stores::default();
    if kind == ReportKind::Reservations {
        for file in &files {
            let loaded = load_reservations_file(file, &settings.reservations);
            stores.reservations.extend(empty_on_io_error(loaded)?);
        }
    } else {
        stores.energy = load_energy_files(&files, &settings.energy)?;
    }

    let lines = selector::build(&kind, &stores)?.render();
    print_lines(&lines);
    if let Some(path) = &cli.output {
        write_lines(path, &lines)?;
        info!("report written to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries the report; diagnostics go to stderr.
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
