#[macro_use]
extern crate clap;
use clap::{App, Arg};

use failure::{Error, Fail};

use log::{error, info, warn};
use std::io;
use std::path::Path;

use chrono::offset::Local;

use chid_finder::file_processor::{self, EmptySidePolicy, MatchOptions, RunOutcome};
use chid_finder::point_matcher::RawTable;

#[derive(Debug, Fail)]
pub enum MainError {
    #[fail(display = "Invalid delimiter {:?}, it must be a single byte", _0)]
    InvalidDelimiter(String),
}

fn main() {
    let local_time = Local::now();
    let time_offset = local_time.offset();
    // Configure logging
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config {
            offset: time_offset.clone(),
            ..simplelog::Config::default()
        },
        simplelog::TerminalMode::Stderr,
    )
    .ok();

    match do_main() {
        Ok(_) => info!("Process finished OK"),
        Err(err) => {
            error!("Process finished with an error: {}", err);
            std::process::exit(1);
        }
    };
}

fn parse_delimiter(raw: &str) -> Result<u8, MainError> {
    let delimiter = raw.replace("\\t", "\t");
    match delimiter.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(MainError::InvalidDelimiter(raw.to_owned())),
    }
}

fn load_table(path: &Path, label: &str, options: &MatchOptions) -> Result<RawTable, Error> {
    info!("Loading {} table from {}", label, path.display());

    let mut input_file = std::fs::File::open(path)?;
    let file_size = input_file.metadata()?.len();

    let table = file_processor::read_raw_table(&mut input_file, Some(file_size), label, options)?;
    Ok(table)
}

fn match_command(
    hp_path: &Path,
    chid_path: &Path,
    output_file: &mut dyn io::Write,
    summary_path: Option<&Path>,
    options: &MatchOptions,
) -> Result<(), Error> {
    let hp_table = load_table(hp_path, "HP", options)?;
    let chid_table = load_table(chid_path, "CHID", options)?;

    let outcome = file_processor::run_matching(&hp_table, &chid_table, output_file, options)?;

    match outcome {
        RunOutcome::Matched(stats) => {
            info!("Stats: {:?}", stats);
            if let Some(path) = summary_path {
                info!("Writing summary into {}", path.display());
                let mut summary_file = std::fs::File::create(path)?;
                file_processor::write_summary(&mut summary_file, &stats)?;
            }
        }
        RunOutcome::Degraded { empty, kept, rows } => {
            warn!(
                "No matching done: {} table is empty, wrote {} {} rows instead",
                empty, rows, kept
            );
            if summary_path.is_some() {
                warn!("Skipping summary, nothing was matched");
            }
        }
    }

    Ok(())
}

fn do_main() -> Result<(), Error> {
    let matches = App::new("chid_finder")
                    .version(crate_version!())
                    .about("Assigns every HP location to its nearest CHID location")
                    .arg(Arg::with_name("hp")
                        .short("p")
                        .long("hp")
                        .help("CSV file with the HP locations: id, latitude, longitude.")
                        .takes_value(true)
                        .required(true)
                    )
                    .arg(Arg::with_name("chid")
                        .short("c")
                        .long("chid")
                        .help("CSV file with the CHID locations: id, latitude, longitude.")
                        .takes_value(true)
                        .required(true)
                    )
                    .arg(Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .help("Sets the output file to create. If omitted, stdout will be used.")
                        .takes_value(true)
                    )
                    .arg(Arg::with_name("delimiter")
                        .short("d")
                        .long("delimiter")
                        .help("Delimiter for input file fields")
                        .takes_value(true)
                        .default_value(",")
                    )
                    .arg(Arg::with_name("summary")
                        .long("summary")
                        .help("Writes the run statistics as JSON into this file.")
                        .takes_value(true)
                    )
                    .arg(Arg::with_name("degrade-on-empty")
                        .long("degrade-on-empty")
                        .help("If one table has no valid rows, write the other one instead of failing.")
                    )
                    .arg(Arg::with_name("quiet")
                        .short("q")
                        .long("quiet")
                        .help("Hides the progress bars.")
                    )
                    .get_matches();

    let delimiter = parse_delimiter(matches.value_of("delimiter").unwrap_or(","))?;
    info!("Using the following delimiter: {:?}", delimiter as char);

    let empty_side_policy = match matches.is_present("degrade-on-empty") {
        true => EmptySidePolicy::Degrade,
        false => EmptySidePolicy::Abort,
    };

    let options = MatchOptions {
        delimiter,
        empty_side_policy,
        quiet: matches.is_present("quiet"),
    };

    // Both are required, clap exits before we get here without them.
    let hp_path = Path::new(matches.value_of("hp").unwrap_or_default());
    let chid_path = Path::new(matches.value_of("chid").unwrap_or_default());
    let summary_path = matches.value_of("summary").map(Path::new);

    let mut output_file: Box<dyn io::Write> = match matches.value_of("output") {
        Some(path) => {
            info!("Writing to file {}.", path);
            Box::new(io::BufWriter::new(std::fs::File::create(path)?))
        }
        None => {
            info!("Writing to stdout");
            Box::new(io::stdout())
        }
    };

    match_command(hp_path, chid_path, output_file.as_mut(), summary_path, &options)?;
    output_file.flush()?;

    Ok(())
}
