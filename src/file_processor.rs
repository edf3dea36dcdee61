use super::cli_utils;
use super::point_matcher::{
    self, Assignment, MatchStats, MatcherError, NormalizedTable, PointSet, RawTable, Role,
    ASSIGNMENT_COLUMNS,
};

use std::io;
use std::time;

use log::{info, warn};

use failure::Fail;

const UTF8_BOM: char = '\u{feff}';

/// What to do when one side has no valid rows left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptySidePolicy {
    Abort,
    /// Write the other side's table instead of matching.
    Degrade,
}

impl Default for EmptySidePolicy {
    fn default() -> EmptySidePolicy {
        EmptySidePolicy::Abort
    }
}

#[derive(Debug, Clone)]
pub struct MatchOptions {
    pub delimiter: u8,
    pub empty_side_policy: EmptySidePolicy,
    pub quiet: bool,
}

impl Default for MatchOptions {
    fn default() -> MatchOptions {
        MatchOptions {
            delimiter: b',',
            empty_side_policy: EmptySidePolicy::default(),
            quiet: false,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    Matched(MatchStats),
    Degraded { empty: Role, kept: Role, rows: usize },
}

#[derive(Debug, Fail)]
pub enum FileProcessorError {
    #[fail(display = "I/O error: {}", _0)]
    Io(io::Error),
    #[fail(display = "Csv error: {}", _0)]
    Csv(csv::Error),
    #[fail(display = "Json error: {}", _0)]
    Json(serde_json::Error),
    #[fail(display = "{}", _0)]
    Matcher(MatcherError),
}

impl From<io::Error> for FileProcessorError {
    fn from(err: io::Error) -> FileProcessorError {
        FileProcessorError::Io(err)
    }
}

impl From<csv::Error> for FileProcessorError {
    fn from(err: csv::Error) -> FileProcessorError {
        FileProcessorError::Csv(err)
    }
}

impl From<serde_json::Error> for FileProcessorError {
    fn from(err: serde_json::Error) -> FileProcessorError {
        FileProcessorError::Json(err)
    }
}

impl From<MatcherError> for FileProcessorError {
    fn from(err: MatcherError) -> FileProcessorError {
        FileProcessorError::Matcher(err)
    }
}

#[inline]
fn record_size(record: &csv::StringRecord) -> u64 {
    record.iter().map(|e| e.len() as u64).sum()
}

/// Reads a delimited table whose first record is the header. Records may have
/// any number of fields.
pub fn read_raw_table(
    input: &mut dyn io::Read,
    file_size: Option<u64>,
    label: &str,
    options: &MatchOptions,
) -> Result<RawTable, FileProcessorError> {
    let progress_bar = cli_utils::create_progress_bar_bytes(
        options.quiet,
        &format!("Reading {}...", label),
        file_size,
    );

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut headers: Vec<String> = csv_reader.headers()?.iter().map(String::from).collect();
    if let Some(first) = headers.first_mut() {
        *first = first.trim_start_matches(UTF8_BOM).to_owned();
    }

    let mut rows = Vec::new();
    for record_result in csv_reader.records() {
        let record = record_result?;
        progress_bar.inc(record_size(&record));
        rows.push(record.iter().map(String::from).collect());
    }

    progress_bar.finish_and_clear();
    info!("Read {} rows with {} columns from {}", rows.len(), headers.len(), label);

    Ok(RawTable::new(headers, rows))
}

/// Comma separated, header row first, no index column.
pub fn write_assignments(
    output: &mut dyn io::Write,
    assignments: &[Assignment],
) -> Result<(), FileProcessorError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    // Written by hand so that an empty result still carries the header.
    csv_writer.write_record(ASSIGNMENT_COLUMNS.iter())?;
    for assignment in assignments {
        csv_writer.serialize(assignment)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_point_set(
    output: &mut dyn io::Write,
    point_set: &PointSet,
) -> Result<(), FileProcessorError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    csv_writer.write_record(point_set.role.columns().iter())?;
    for point in point_set.iter() {
        csv_writer.serialize((&point.id, point.lat, point.lon))?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_summary(output: &mut dyn io::Write, stats: &MatchStats) -> Result<(), FileProcessorError> {
    serde_json::to_writer_pretty(&mut *output, stats)?;
    writeln!(output)?;
    Ok(())
}

fn degrade(
    empty: Role,
    kept: &NormalizedTable,
    output: &mut dyn io::Write,
) -> Result<RunOutcome, FileProcessorError> {
    warn!(
        "{} table has no valid rows, writing the {} table without matching",
        empty, kept.points.role
    );
    info!("{}", kept.mapping);

    write_point_set(output, &kept.points)?;

    Ok(RunOutcome::Degraded {
        empty,
        kept: kept.points.role,
        rows: kept.points.len(),
    })
}

/**
 * Normalizes both tables, matches them and writes the assignments to `output`.
 *
 * Any table error aborts the whole run, except an empty side under
 * `EmptySidePolicy::Degrade`, where the other side is written instead.
 */
pub fn run_matching(
    hp_table: &RawTable,
    chid_table: &RawTable,
    output: &mut dyn io::Write,
    options: &MatchOptions,
) -> Result<RunOutcome, FileProcessorError> {
    let normalized = (
        point_matcher::normalize(hp_table, Role::Hp),
        point_matcher::normalize(chid_table, Role::Chid),
    );

    let (hp, chid) = match normalized {
        (Ok(hp), Ok(chid)) => (hp, chid),
        (Err(MatcherError::EmptyAfterValidation { role: empty }), Ok(kept))
        | (Ok(kept), Err(MatcherError::EmptyAfterValidation { role: empty }))
            if options.empty_side_policy == EmptySidePolicy::Degrade =>
        {
            return degrade(empty, &kept, output);
        }
        (Err(err), _) | (_, Err(err)) => return Err(FileProcessorError::Matcher(err)),
    };

    info!("{}", hp.mapping);
    info!("{}", chid.mapping);

    let progress_bar = cli_utils::create_progress_bar_fraction(options.quiet, "Matching...");
    let start_instant = time::Instant::now();

    let result = point_matcher::match_points_with_progress(
        &hp.points,
        &chid.points,
        &mut |fraction| cli_utils::set_fraction(&progress_bar, fraction),
    );

    progress_bar.finish();

    let elapsed_secs = start_instant.elapsed().as_millis() as f32 / 1000.0f32;
    info!(
        "Matched {} HPs against {} CHIDs in {} seconds",
        hp.points.len(),
        chid.points.len(),
        elapsed_secs
    );

    write_assignments(output, &result.assignments)?;

    let stats = result.stats;
    info!(
        "Assigned {} HP-CHID pairs. Used {} out of {} CHIDs",
        stats.assigned_pairs, stats.unique_chids_used, stats.total_chids
    );
    if stats.failed_distances > 0 {
        warn!("{} distances could not be computed", stats.failed_distances);
    }

    Ok(RunOutcome::Matched(stats))
}
