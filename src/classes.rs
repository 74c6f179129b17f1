use std::fmt::Display;

use indexmap::IndexMap;

use crate::FakeLabError;

/// A parsed class definition of the form `name: key' member member ...`.
///
/// The key glyph, marked with a trailing apostrophe, represents the class in
/// sparse kerning tables. The raw definition is kept verbatim so that a class
/// list written back out is byte-identical to what was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphClass {
    definition: String,
    name: String,
    key: Option<String>,
    members: Vec<String>,
}

impl GlyphClass {
    pub fn parse(definition: &str) -> Result<GlyphClass, FakeLabError> {
        let (name, body) = definition.split_once(':').ok_or_else(|| {
            FakeLabError::General(format!("Class definition has no name: '{}'", definition))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(FakeLabError::General(format!(
                "Class definition has an empty name: '{}'",
                definition
            )));
        }
        let mut key = None;
        let mut members = vec![];
        for token in body.split_whitespace() {
            match token.strip_suffix('\'') {
                Some(stripped) if key.is_none() => key = Some(stripped.to_string()),
                Some(stripped) => members.push(stripped.to_string()),
                None => members.push(token.to_string()),
            }
        }
        Ok(GlyphClass {
            definition: definition.to_string(),
            name: name.to_string(),
            key,
            members,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Members other than the key glyph.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// The key glyph followed by the members.
    pub fn glyphs(&self) -> impl Iterator<Item = &str> {
        self.key
            .iter()
            .map(|k| k.as_str())
            .chain(self.members.iter().map(|m| m.as_str()))
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Kerning classes are those whose name starts with an underscore.
    pub fn is_kerning(&self) -> bool {
        self.name.starts_with('_')
    }

    /// Which kerning sides the class name declares: `"L"`, `"R"`, `"LR"`, or
    /// `""` for a class that is not a kerning class.
    pub fn sides(&self) -> &'static str {
        let upper = self.name.to_ascii_uppercase();
        if ["_LEFT", "_L", "_1ST"].iter().any(|s| upper.ends_with(s)) {
            "L"
        } else if ["_RIGHT", "_R", "_2ND"].iter().any(|s| upper.ends_with(s)) {
            "R"
        } else if self.is_kerning() {
            "LR"
        } else {
            ""
        }
    }
}

impl Display for GlyphClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.definition)
    }
}

/// Kerning and metrics participation of one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassFlags {
    pub kern_left: bool,
    pub kern_right: bool,
    pub metrics_lsb: bool,
    pub metrics_rsb: bool,
    pub metrics_width: bool,
}

impl ClassFlags {
    pub fn is_empty(&self) -> bool {
        *self == ClassFlags::default()
    }

    pub(crate) fn kerning_bits(&self) -> u8 {
        (self.kern_left as u8) | ((self.kern_right as u8) << 1)
    }

    pub(crate) fn metrics_bits(&self) -> u8 {
        (self.metrics_lsb as u8)
            | ((self.metrics_rsb as u8) << 1)
            | ((self.metrics_width as u8) << 2)
    }

    pub(crate) fn set_kerning_bits(&mut self, bits: u8) {
        self.kern_left = bits & 1 != 0;
        self.kern_right = bits & 2 != 0;
    }

    pub(crate) fn set_metrics_bits(&mut self, bits: u8) {
        self.metrics_lsb = bits & 1 != 0;
        self.metrics_rsb = bits & 2 != 0;
        self.metrics_width = bits & 4 != 0;
    }
}

/// The font's class definitions, with flags attached by class name.
///
/// Flags follow the class name rather than its position, so reordering or
/// replacing the list keeps the flags of every class that survives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassList {
    classes: Vec<GlyphClass>,
    flags: IndexMap<String, ClassFlags>,
}

impl ClassList {
    pub fn new() -> Self {
        ClassList::default()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GlyphClass> {
        self.classes.iter()
    }

    pub fn get(&self, index: usize) -> Option<&GlyphClass> {
        self.classes.get(index)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.classes.iter().position(|c| c.name == name)
    }

    pub fn push(&mut self, definition: &str) -> Result<(), FakeLabError> {
        self.classes.push(GlyphClass::parse(definition)?);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<GlyphClass, FakeLabError> {
        if index >= self.classes.len() {
            return Err(self.unresolved(index));
        }
        let removed = self.classes.remove(index);
        if self.find(&removed.name).is_none() {
            self.flags.shift_remove(&removed.name);
        }
        Ok(removed)
    }

    /// Replaces every definition at once.
    ///
    /// Flags of classes whose name appears in the new list are kept; flags of
    /// classes that disappear are dropped.
    pub fn replace_all<S: AsRef<str>>(&mut self, definitions: &[S]) -> Result<(), FakeLabError> {
        let classes = definitions
            .iter()
            .map(|d| GlyphClass::parse(d.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.flags
            .retain(|name, _| classes.iter().any(|c| &c.name == name));
        self.classes = classes;
        Ok(())
    }

    pub fn definitions(&self) -> Vec<String> {
        self.classes.iter().map(|c| c.definition.clone()).collect()
    }

    pub fn flags(&self, index: usize) -> Result<ClassFlags, FakeLabError> {
        let class = self.get(index).ok_or_else(|| self.unresolved(index))?;
        Ok(self.flags_by_name(&class.name))
    }

    pub fn flags_by_name(&self, name: &str) -> ClassFlags {
        self.flags.get(name).copied().unwrap_or_default()
    }

    pub fn set_flags(&mut self, index: usize, flags: ClassFlags) -> Result<(), FakeLabError> {
        let name = self.get(index).ok_or_else(|| self.unresolved(index))?.name.clone();
        self.set_flags_by_name(&name, flags);
        Ok(())
    }

    pub fn set_flags_by_name(&mut self, name: &str, flags: ClassFlags) {
        if flags.is_empty() {
            self.flags.shift_remove(name);
        } else {
            self.flags.insert(name.to_string(), flags);
        }
    }

    /// All non-empty flags in class order.
    pub(crate) fn named_flags(&self) -> impl Iterator<Item = (&str, ClassFlags)> {
        self.classes
            .iter()
            .filter_map(|c| self.flags.get(&c.name).map(|f| (c.name.as_str(), *f)))
    }

    pub fn get_class_left(&self, index: usize) -> Result<bool, FakeLabError> {
        Ok(self.flags(index)?.kern_left)
    }

    pub fn get_class_right(&self, index: usize) -> Result<bool, FakeLabError> {
        Ok(self.flags(index)?.kern_right)
    }

    /// `(lsb, rsb, width)`
    pub fn get_class_metrics_flags(
        &self,
        index: usize,
    ) -> Result<(bool, bool, bool), FakeLabError> {
        let flags = self.flags(index)?;
        Ok((flags.metrics_lsb, flags.metrics_rsb, flags.metrics_width))
    }

    pub fn set_class_flags(
        &mut self,
        index: usize,
        left: bool,
        right: bool,
    ) -> Result<(), FakeLabError> {
        let mut flags = self.flags(index)?;
        flags.kern_left = left;
        flags.kern_right = right;
        self.set_flags(index, flags)
    }

    pub fn set_class_metrics_flags(
        &mut self,
        index: usize,
        lsb: bool,
        rsb: bool,
        width: bool,
    ) -> Result<(), FakeLabError> {
        let mut flags = self.flags(index)?;
        flags.metrics_lsb = lsb;
        flags.metrics_rsb = rsb;
        flags.metrics_width = width;
        self.set_flags(index, flags)
    }

    /// Kerning classes usable on the given side.
    ///
    /// Explicit kerning flags decide when a class has any; otherwise the side
    /// suffix of the class name does.
    pub fn kerning_classes(&self, left: bool) -> impl Iterator<Item = &GlyphClass> {
        self.classes.iter().filter(move |c| {
            if !c.is_kerning() || c.key.is_none() {
                return false;
            }
            let flags = self.flags_by_name(&c.name);
            if flags.kern_left || flags.kern_right {
                if left {
                    flags.kern_left
                } else {
                    flags.kern_right
                }
            } else {
                c.sides().contains(if left { 'L' } else { 'R' })
            }
        })
    }

    fn unresolved(&self, index: usize) -> FakeLabError {
        FakeLabError::UnresolvedReference {
            what: "class".to_string(),
            index: i32::try_from(index).unwrap_or(i32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_parse_kerning_class() {
        let class = GlyphClass::parse("_LAT_a_LEFT: a' c").unwrap();
        assert_eq!(class.name(), "_LAT_a_LEFT");
        assert_eq!(class.key(), Some("a"));
        assert_eq!(class.members(), &["c".to_string()]);
        assert_eq!(class.sides(), "L");
        assert_eq!(class.glyphs().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(class.to_string(), "_LAT_a_LEFT: a' c");
    }

    #[rstest]
    #[case("_o_R: o' e", "R")]
    #[case("_o_2ND: o' e", "R")]
    #[case("_o_1st: o' e", "L")]
    #[case("_o: o' e", "LR")]
    #[case("smallcaps: a.sc b.sc", "")]
    fn test_sides(#[case] definition: &str, #[case] sides: &str) {
        assert_eq!(GlyphClass::parse(definition).unwrap().sides(), sides);
    }

    #[test]
    fn test_parse_no_key() {
        let class = GlyphClass::parse("figures: zero one two").unwrap();
        assert_eq!(class.key(), None);
        assert_eq!(class.members().len(), 3);
        assert!(GlyphClass::parse("no colon here").is_err());
        assert!(GlyphClass::parse(" : a b").is_err());
    }

    #[test]
    fn test_flags_follow_names() {
        let mut classes = ClassList::new();
        classes.replace_all(&["_A: A' Agrave", "_O: O' Oacute"]).unwrap();
        classes.set_class_flags(1, true, false).unwrap();
        classes.set_class_metrics_flags(0, false, true, true).unwrap();

        classes
            .replace_all(&["_V: V' W", "_O: O' Oacute Odieresis"])
            .unwrap();
        assert!(classes.get_class_left(1).unwrap());
        assert!(!classes.get_class_right(1).unwrap());
        // _A disappeared and took its flags with it
        assert_eq!(classes.get_class_metrics_flags(0).unwrap(), (false, false, false));

        classes.replace_all(&["_O: O'", "_A: A' Agrave"]).unwrap();
        assert!(classes.get_class_left(0).unwrap());
        assert_eq!(classes.flags(1).unwrap(), ClassFlags::default());
    }

    #[test]
    fn test_flag_index_out_of_range() {
        let classes = ClassList::new();
        assert!(matches!(
            classes.get_class_left(0),
            Err(FakeLabError::UnresolvedReference { index: 0, .. })
        ));
    }

    #[test]
    fn test_flag_bits() {
        let mut flags = ClassFlags::default();
        flags.set_kerning_bits(2);
        flags.set_metrics_bits(5);
        assert!(!flags.kern_left && flags.kern_right);
        assert!(flags.metrics_lsb && !flags.metrics_rsb && flags.metrics_width);
        assert_eq!((flags.kerning_bits(), flags.metrics_bits()), (2, 5));
    }

    #[test]
    fn test_kerning_sides_prefer_flags() {
        let mut classes = ClassList::new();
        classes
            .replace_all(&["_T_LEFT: T' Tcaron", "_o: o' oacute", "lc: a b"])
            .unwrap();
        let left: Vec<&str> = classes.kerning_classes(true).map(|c| c.name()).collect();
        assert_eq!(left, vec!["_T_LEFT", "_o"]);
        classes.set_class_flags(1, false, true).unwrap();
        let left: Vec<&str> = classes.kerning_classes(true).map(|c| c.name()).collect();
        assert_eq!(left, vec!["_T_LEFT"]);
        let right: Vec<&str> = classes.kerning_classes(false).map(|c| c.name()).collect();
        assert_eq!(right, vec!["_o"]);
    }
}
