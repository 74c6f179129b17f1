//! Whole-font filters, applied by the command line tool in the order given.
//!
//! `--drop-axis AXIS=FACTOR` blends each pair of masters that differ only
//! along one axis. `--instance NAME=VALUE,...` collapses the masters into a
//! single instance.
mod dropaxis;
mod instantiate;

pub use dropaxis::DropAxis;
pub use instantiate::Instantiate;

use crate::{FakeLabError, Font};

/// Command line names of every filter.
pub const FILTER_NAMES: [&str; 2] = [DropAxis::NAME, Instantiate::NAME];

/// A transformation of a whole font.
pub trait FontFilter {
    fn apply(&self, font: &mut Font) -> Result<(), FakeLabError>;

    /// Parses the filter from its command line value
    fn from_str(s: &str) -> Result<Self, FakeLabError>
    where
        Self: Sized;

    #[cfg(feature = "cli")]
    fn arg() -> clap::Arg
    where
        Self: Sized;
}

/// Adds the filter options under their own help heading.
#[cfg(feature = "cli")]
pub fn filter_group(command: clap::Command) -> clap::Command {
    command
        .next_help_heading("Master and axis filters")
        .arg(DropAxis::arg())
        .arg(Instantiate::arg())
}

/// Builds a filter from its command line name and value.
pub fn cli_to_filter(name: &str, value: &str) -> Result<Box<dyn FontFilter>, FakeLabError> {
    match name {
        DropAxis::NAME => Ok(Box::new(DropAxis::from_str(value)?)),
        Instantiate::NAME => Ok(Box::new(Instantiate::from_str(value)?)),
        _ => Err(FakeLabError::FilterError(format!(
            "No filter called {}",
            name
        ))),
    }
}

/// Splits `NAME=VALUE` into its parts, parsing the value as a number.
fn name_value(s: &str) -> Result<(String, f64), FakeLabError> {
    let (name, value) = s.split_once('=').ok_or_else(|| {
        FakeLabError::FilterError(format!("Expected NAME=VALUE, found '{}'", s))
    })?;
    let value = value.trim().parse::<f64>().map_err(|e| {
        FakeLabError::FilterError(format!("Bad value in '{}': {}", s, e))
    })?;
    Ok((name.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_name_value() {
        assert_eq!(name_value("Weight = 0.5").unwrap(), ("Weight".to_string(), 0.5));
        assert!(name_value("Weight").is_err());
        assert!(name_value("Weight=heavy").is_err());
    }

    #[test]
    fn test_filter_by_name() {
        let mut font = Font::new();
        font.add_axis(crate::Axis::new("Weight")).unwrap();
        cli_to_filter("dropaxis", "Weight=0")
            .unwrap()
            .apply(&mut font)
            .unwrap();
        assert_eq!(font.master_count(), 1);
    }

    #[test]
    fn test_unknown_filter() {
        assert!(matches!(
            cli_to_filter("scaleupem", "2048"),
            Err(FakeLabError::FilterError(_))
        ));
    }
}
