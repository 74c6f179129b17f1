use crate::{
    filters::{name_value, FontFilter},
    interpolate::interpolate,
    Location,
};

/// Replaces a multiple-master font with a single-master instance.
pub struct Instantiate(Location);

impl Instantiate {
    /// The command line argument id
    pub const NAME: &'static str = "instance";

    pub fn new(location: Location) -> Self {
        Instantiate(location)
    }
}

impl FontFilter for Instantiate {
    fn apply(&self, font: &mut crate::Font) -> Result<(), crate::FakeLabError> {
        log::info!("Instantiating at {}", self.0);
        *font = interpolate(font, &self.0)?;
        Ok(())
    }

    /// Parses `NAME=VALUE,...` with values in user units.
    fn from_str(s: &str) -> Result<Self, crate::FakeLabError>
    where
        Self: Sized,
    {
        let values = s
            .split(',')
            .map(name_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Instantiate::new(Location::user(values)))
    }

    #[cfg(feature = "cli")]
    fn arg() -> clap::Arg
    where
        Self: Sized,
    {
        clap::Arg::new(Self::NAME)
            .long("instance")
            .help("Replace the masters with an instance at a user-space location")
            .value_name("NAME=VALUE,...")
            .action(clap::ArgAction::Append)
    }
}
