use crate::filters::{name_value, FontFilter};

/// Removes one axis, blending the master pairs it separated.
pub struct DropAxis {
    axis: String,
    factor: f64,
}

impl DropAxis {
    /// The command line argument id
    pub const NAME: &'static str = "dropaxis";

    /// `factor` is the normalized position kept on the dropped axis.
    pub fn new(axis: impl Into<String>, factor: f64) -> Self {
        DropAxis {
            axis: axis.into(),
            factor,
        }
    }
}

impl FontFilter for DropAxis {
    fn apply(&self, font: &mut crate::font::Font) -> Result<(), crate::error::FakeLabError> {
        log::info!("Dropping axis {} at {}", self.axis, self.factor);
        let Some(index) = font.axes.iter().position(|axis| {
            axis.name.eq_ignore_ascii_case(&self.axis)
                || axis.short_name().eq_ignore_ascii_case(&self.axis)
        }) else {
            log::warn!("Axis {} not found in font axes", self.axis);
            return Ok(());
        };
        font.remove_axis(index, self.factor)
    }

    fn from_str(s: &str) -> Result<Self, crate::FakeLabError>
    where
        Self: Sized,
    {
        let (axis, factor) = name_value(s)?;
        Ok(DropAxis::new(axis, factor))
    }

    #[cfg(feature = "cli")]
    fn arg() -> clap::Arg
    where
        Self: Sized,
    {
        clap::Arg::new(Self::NAME)
            .long("drop-axis")
            .help("Remove an axis, keeping the given normalized position on it")
            .value_name("AXIS=FACTOR")
            .action(clap::ArgAction::Append)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{Axis, Font, Glyph};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_drop_width() {
        let mut font = Font::new();
        font.add_axis(Axis::new("Weight")).unwrap();
        font.add_axis(Axis::new("Width")).unwrap();
        let mut glyph = Glyph::new("o");
        glyph.set_layers_number(4).unwrap();
        for (master, width) in [400, 600, 500, 700].into_iter().enumerate() {
            glyph.set_width_at(master, width).unwrap();
        }
        font.append_glyph(glyph).unwrap();

        DropAxis::new("wd", 0.5).apply(&mut font).unwrap();
        assert_eq!(font.axes.len(), 1);
        assert_eq!(font.axes[0].name, "Weight");
        assert_eq!(font.master_count(), 2);
        let glyph = &font.glyphs[0];
        assert_eq!(glyph.layers_number(), 2);
        assert_eq!(glyph.width_at(0), Some(450));
        assert_eq!(glyph.width_at(1), Some(650));
    }

    #[test]
    fn test_from_str() {
        let mut font = Font::new();
        font.add_axis(Axis::new("Weight")).unwrap();
        font.set_ascender_at(1, 800).unwrap();
        DropAxis::from_str("Weight=1").unwrap().apply(&mut font).unwrap();
        assert_eq!(font.ascender(), vec![800]);
    }

    #[test]
    fn test_missing_axis_is_ignored() {
        let mut font = Font::new();
        font.add_axis(Axis::new("Weight")).unwrap();
        DropAxis::new("Optical Size", 0.0).apply(&mut font).unwrap();
        assert_eq!(font.master_count(), 2);
    }
}
