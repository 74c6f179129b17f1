/// The mapping used when an axis declares none: user 0 to 0.0, user 1000 to 1.0.
pub const DEFAULT_MAPPING: [(f64, f64); 2] = [(0.0, 0.0), (1000.0, 1.0)];

/// A multiple-master design axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    /// Piecewise-linear map from user coordinates to normalized 0..1 positions,
    /// sorted by user coordinate.
    pub mapping: Vec<(f64, f64)>,
}

impl Axis {
    pub fn new(name: impl Into<String>) -> Self {
        Axis {
            name: name.into(),
            mapping: DEFAULT_MAPPING.to_vec(),
        }
    }

    /// The two-letter abbreviation used in instance names.
    pub fn short_name(&self) -> String {
        match self.name.as_str() {
            "Weight" => "Wt".to_string(),
            "Width" => "Wd".to_string(),
            "Optical Size" => "Op".to_string(),
            "Serif" => "Se".to_string(),
            other => other.chars().take(2).collect(),
        }
    }

    pub fn has_default_mapping(&self) -> bool {
        self.mapping == DEFAULT_MAPPING
    }

    /// Maps a user coordinate to a normalized position.
    ///
    /// Values outside the mapping are clamped to its ends; an empty mapping
    /// behaves like the default one.
    pub fn normalize(&self, user: f64) -> f64 {
        let mapping: &[(f64, f64)] = if self.mapping.is_empty() {
            &DEFAULT_MAPPING
        } else {
            &self.mapping
        };
        let (Some(first), Some(last)) = (mapping.first(), mapping.last()) else {
            return user;
        };
        if user <= first.0 {
            return first.1;
        }
        if user >= last.0 {
            return last.1;
        }
        for window in mapping.windows(2) {
            let ((x0, y0), (x1, y1)) = (window[0], window[1]);
            if user >= x0 && user <= x1 {
                if x1 == x0 {
                    return y1;
                }
                return y0 + (user - x0) / (x1 - x0) * (y1 - y0);
            }
        }
        last.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(289.0, 0.289)]
    #[case(1000.0, 1.0)]
    #[case(-50.0, 0.0)]
    #[case(1200.0, 1.0)]
    fn test_default_mapping(#[case] user: f64, #[case] expected: f64) {
        let axis = Axis::new("Weight");
        assert!((axis.normalize(user) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_piecewise_mapping() {
        let mut axis = Axis::new("Width");
        axis.mapping = vec![(0.0, 0.0), (500.0, 0.8), (1000.0, 1.0)];
        assert!((axis.normalize(250.0) - 0.4).abs() < 1e-9);
        assert!((axis.normalize(750.0) - 0.9).abs() < 1e-9);
        assert!(!axis.has_default_mapping());
        assert_eq!(axis.short_name(), "Wd");
        assert_eq!(Axis::new("Contrast").short_name(), "Co");
    }
}
