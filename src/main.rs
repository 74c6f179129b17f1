use std::path::PathBuf;

use clap::{ArgMatches, Command};
use fakelab::{
    filters::{cli_to_filter, filter_group, FontFilter, FILTER_NAMES},
    FakeLabError, Font, VfbReadOptions, VfbWriteOptions,
};

fn command() -> Command {
    let command = Command::new("fakelab")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reads a VFB font database, optionally reshapes its masters, and writes it back")
        .arg(
            clap::Arg::new("input")
                .help("VFB file to read")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("output")
                .help("VFB file to write")
                .required(true)
                .index(2),
        )
        .arg(
            clap::Arg::new("verbose")
                .short('v')
                .help("Log more; repeat for entry-level detail")
                .action(clap::ArgAction::Count),
        )
        .arg(
            clap::Arg::new("strict")
                .long("strict")
                .help("Reject files containing entries of unknown type")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("always_emit")
                .long("always-emit")
                .help("Write optional entries even when they hold no data")
                .action(clap::ArgAction::SetTrue),
        );
    filter_group(command)
}

/// Filters in the order they appear on the command line.
fn filters_in_order(args: &ArgMatches) -> Result<Vec<Box<dyn FontFilter>>, FakeLabError> {
    let mut given = vec![];
    for name in FILTER_NAMES {
        if let (Some(values), Some(indices)) =
            (args.get_many::<String>(name), args.indices_of(name))
        {
            given.extend(indices.zip(values).map(|(ix, value)| (ix, name, value)));
        }
    }
    given.sort_by_key(|(ix, _, _)| *ix);
    given
        .into_iter()
        .map(|(_, name, value)| cli_to_filter(name, value))
        .collect()
}

fn run(args: &ArgMatches) -> Result<(), FakeLabError> {
    let input = args
        .get_one::<String>("input")
        .map(PathBuf::from)
        .unwrap_or_default();
    let output = args
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_default();
    let filters = filters_in_order(args)?;

    let read_options = VfbReadOptions {
        strict: args.get_flag("strict"),
    };
    let mut font = Font::open_with_options(&input, &read_options)?;
    log::info!(
        "Read {} glyphs in {} masters",
        font.glyphs.len(),
        font.master_count()
    );
    for filter in &filters {
        filter.apply(&mut font)?;
    }

    let write_options = VfbWriteOptions {
        always_emit_optional: args.get_flag("always_emit"),
    };
    font.save_with_options(&output, &write_options)
}

fn main() {
    let args = command().get_matches();
    env_logger::Builder::new()
        .filter_level(match args.get_count("verbose") {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();
    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
