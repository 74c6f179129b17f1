use std::sync::LazyLock;

use font_types::Tag;
use regex::Regex;
use smol_str::SmolStr;

use crate::{common::tag_from_string, FakeLabError};

static FEATURE_START: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // Static pattern
    Regex::new(r"(?m)^[ \t]*feature\s+([A-Za-z0-9_.]{1,4})\s*\{").unwrap()
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Features {
    /// Feature code placed before any feature block: languagesystems, named
    /// lookups and the like.
    pub prefix: String,
    /// OpenType features
    ///
    /// A list of OpenType feature code, expressed as a tuple (feature tag, code).
    pub features: Vec<(SmolStr, String)>,
}

impl Features {
    pub fn is_empty(&self) -> bool {
        self.prefix.trim().is_empty() && self.features.is_empty()
    }

    pub fn tags(&self) -> Result<Vec<Tag>, FakeLabError> {
        self.features
            .iter()
            .map(|(tag, _)| tag_from_string(tag))
            .collect()
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.features
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, code)| code.as_str())
    }

    pub fn to_fea(&self) -> String {
        let mut fea = String::new();
        if !self.prefix.is_empty() {
            fea.push_str(&self.prefix);
            fea.push('\n');
        }
        for (name, code) in &self.features {
            fea.push_str(&format!("feature {} {{\n{}\n}} {};\n", name, code, name));
        }
        fea
    }

    /// Splits feature code into a prefix and the individual feature blocks.
    ///
    /// Anything outside a feature block after the first one is appended to the
    /// prefix. Unterminated blocks become part of the prefix too.
    pub fn from_fea(fea: &str) -> Features {
        let mut features = Features::default();
        let mut prefix_parts: Vec<&str> = vec![];
        let mut cursor = 0;
        while let Some(caps) = FEATURE_START.captures_at(fea, cursor) {
            let (Some(whole), Some(tag)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            let body_start = whole.end();
            let Some((body_end, block_end)) = find_block_end(fea, body_start, tag.as_str())
            else {
                log::warn!("Unterminated feature block {}", tag.as_str());
                break;
            };
            prefix_parts.push(&fea[cursor..whole.start()]);
            features.features.push((
                tag.as_str().into(),
                fea[body_start..body_end].trim_matches('\n').to_string(),
            ));
            cursor = block_end;
        }
        prefix_parts.push(&fea[cursor..]);
        features.prefix = prefix_parts
            .iter()
            .map(|p| p.trim_matches('\n'))
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        features
    }
}

/// Finds the `} tag;` closing a feature block, returning the end of the body
/// and the end of the closing statement.
fn find_block_end(fea: &str, from: usize, tag: &str) -> Option<(usize, usize)> {
    let closing = Regex::new(&format!(r"\}}\s*{}\s*;[ \t]*\n?", regex::escape(tag))).ok()?;
    let m = closing.find_at(fea, from)?;
    Some((m.start(), m.end()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;

    const FEA: &str = "languagesystem DFLT dflt;\nlanguagesystem latn dflt;\n\nfeature kern {\n  pos A V -80;\n} kern;\nfeature liga {\n  sub f i by fi;\n} liga;\n";

    #[test]
    fn test_split() {
        let features = Features::from_fea(FEA);
        assert_eq!(
            features.prefix,
            "languagesystem DFLT dflt;\nlanguagesystem latn dflt;"
        );
        assert_eq!(features.features.len(), 2);
        assert_eq!(features.get("kern"), Some("  pos A V -80;"));
        assert_eq!(features.get("liga"), Some("  sub f i by fi;"));
        assert_eq!(
            features.tags().unwrap(),
            vec![Tag::new(b"kern"), Tag::new(b"liga")]
        );
    }

    #[test]
    fn test_join_and_split_again() {
        let features = Features::from_fea(FEA);
        assert_eq!(Features::from_fea(&features.to_fea()), features);
    }

    #[test]
    fn test_nested_braces() {
        let fea = "feature ss01 {\n  lookup X {\n    sub a by a.alt;\n  } X;\n} ss01;\n";
        let features = Features::from_fea(fea);
        assert_eq!(features.features.len(), 1);
        assert!(features.get("ss01").unwrap().contains("} X;"));
        assert!(features.prefix.is_empty());
    }

    #[test]
    fn test_unterminated() {
        let features = Features::from_fea("feature kern {\n pos A V -10;\n");
        assert!(features.features.is_empty());
        assert!(features.prefix.contains("pos A V -10;"));
    }
}
