use std::collections::BTreeMap;

/// The number of slots in a single-byte code page.
pub const ENCODING_SIZE: usize = 256;

/// Windows Latin 1 glyph names for slots 0x20 to 0xFF; empty strings are unassigned.
const CP1252_NAMES: [&str; 224] = [
    "space", "exclam", "quotedbl", "numbersign", "dollar", "percent", "ampersand", "quotesingle",
    "parenleft", "parenright", "asterisk", "plus", "comma", "hyphen", "period", "slash",
    "zero", "one", "two", "three", "four", "five", "six", "seven",
    "eight", "nine", "colon", "semicolon", "less", "equal", "greater", "question",
    "at", "A", "B", "C", "D", "E", "F", "G",
    "H", "I", "J", "K", "L", "M", "N", "O",
    "P", "Q", "R", "S", "T", "U", "V", "W",
    "X", "Y", "Z", "bracketleft", "backslash", "bracketright", "asciicircum", "underscore",
    "grave", "a", "b", "c", "d", "e", "f", "g",
    "h", "i", "j", "k", "l", "m", "n", "o",
    "p", "q", "r", "s", "t", "u", "v", "w",
    "x", "y", "z", "braceleft", "bar", "braceright", "asciitilde", "",
    "Euro", "", "quotesinglbase", "florin", "quotedblbase", "ellipsis", "dagger", "daggerdbl",
    "circumflex", "perthousand", "Scaron", "guilsinglleft", "OE", "", "Zcaron", "",
    "", "quoteleft", "quoteright", "quotedblleft", "quotedblright", "bullet", "endash", "emdash",
    "tilde", "trademark", "scaron", "guilsinglright", "oe", "", "zcaron", "Ydieresis",
    "nbspace", "exclamdown", "cent", "sterling", "currency", "yen", "brokenbar", "section",
    "dieresis", "copyright", "ordfeminine", "guillemotleft", "logicalnot", "sfthyphen", "registered", "macron",
    "degree", "plusminus", "twosuperior", "threesuperior", "acute", "mu", "paragraph", "periodcentered",
    "cedilla", "onesuperior", "ordmasculine", "guillemotright", "onequarter", "onehalf", "threequarters", "questiondown",
    "Agrave", "Aacute", "Acircumflex", "Atilde", "Adieresis", "Aring", "AE", "Ccedilla",
    "Egrave", "Eacute", "Ecircumflex", "Edieresis", "Igrave", "Iacute", "Icircumflex", "Idieresis",
    "Eth", "Ntilde", "Ograve", "Oacute", "Ocircumflex", "Otilde", "Odieresis", "multiply",
    "Oslash", "Ugrave", "Uacute", "Ucircumflex", "Udieresis", "Yacute", "Thorn", "germandbls",
    "agrave", "aacute", "acircumflex", "atilde", "adieresis", "aring", "ae", "ccedilla",
    "egrave", "eacute", "ecircumflex", "edieresis", "igrave", "iacute", "icircumflex", "idieresis",
    "eth", "ntilde", "ograve", "oacute", "ocircumflex", "otilde", "odieresis", "divide",
    "oslash", "ugrave", "uacute", "ucircumflex", "udieresis", "yacute", "thorn", "ydieresis",
];

/// Code points of slots 0x80 to 0x9F, which differ from Latin 1.
const CP1252_HIGH: [Option<u32>; 32] = [
    Some(0x20AC), None, Some(0x201A), Some(0x0192), Some(0x201E), Some(0x2026), Some(0x2020), Some(0x2021),
    Some(0x02C6), Some(0x2030), Some(0x0160), Some(0x2039), Some(0x0152), None, Some(0x017D), None,
    None, Some(0x2018), Some(0x2019), Some(0x201C), Some(0x201D), Some(0x2022), Some(0x2013), Some(0x2014),
    Some(0x02DC), Some(0x2122), Some(0x0161), Some(0x203A), Some(0x0153), None, Some(0x017E), Some(0x0178),
];

/// The placeholder name of an unassigned slot.
pub fn placeholder_name(slot: usize) -> String {
    format!("_{:04}", slot)
}

pub fn is_placeholder(name: &str) -> bool {
    name.len() == 5
        && name.starts_with('_')
        && name[1..].bytes().all(|b| b.is_ascii_digit())
}

fn default_slot(slot: usize) -> Option<(&'static str, u32)> {
    let name = *CP1252_NAMES.get(slot.checked_sub(0x20)?)?;
    if name.is_empty() {
        return None;
    }
    let unicode = match slot {
        0x80..=0x9F => CP1252_HIGH[slot - 0x80]?,
        _ => slot as u32,
    };
    Some((name, unicode))
}

/// Resolves a glyph name to a code point: known code page names first,
/// then `uniXXXX` and `uXXXXX` names.
pub fn unicode_for_name(name: &str) -> Option<u32> {
    if let Some(slot) = CP1252_NAMES.iter().position(|n| !n.is_empty() && *n == name) {
        return default_slot(slot + 0x20).map(|(_, u)| u);
    }
    let hex = name
        .strip_prefix("uni")
        .filter(|h| h.len() == 4)
        .or_else(|| name.strip_prefix('u').filter(|h| (4..=6).contains(&h.len())))?;
    u32::from_str_radix(hex, 16).ok()
}

/// One code page slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingRecord {
    pub name: String,
    pub unicode: Option<u32>,
}

impl EncodingRecord {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let unicode = unicode_for_name(&name);
        EncodingRecord { name, unicode }
    }
}

/// A legacy single-byte code page, addressed by slot index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    records: Vec<EncodingRecord>,
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding {
            records: (0..ENCODING_SIZE)
                .map(|slot| match default_slot(slot) {
                    Some((name, unicode)) => EncodingRecord {
                        name: name.to_string(),
                        unicode: Some(unicode),
                    },
                    None => EncodingRecord {
                        name: placeholder_name(slot),
                        unicode: None,
                    },
                })
                .collect(),
        }
    }
}

impl Encoding {
    /// Builds an encoding from sparse slot assignments.
    ///
    /// The encoding is as long as the highest assigned slot, capped at
    /// [`ENCODING_SIZE`]; slots beyond the cap are ignored and gaps are filled
    /// with placeholder names.
    pub fn from_slots(slots: &BTreeMap<usize, String>) -> Encoding {
        let len = slots
            .keys()
            .next_back()
            .map(|max| (max + 1).min(ENCODING_SIZE))
            .unwrap_or(0);
        if slots.keys().any(|&slot| slot >= ENCODING_SIZE) {
            log::warn!("Ignoring encoding slots beyond {}", ENCODING_SIZE - 1);
        }
        Encoding {
            records: (0..len)
                .map(|slot| match slots.get(&slot) {
                    Some(name) => EncodingRecord::new(name.clone()),
                    None => EncodingRecord {
                        name: placeholder_name(slot),
                        unicode: None,
                    },
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&EncodingRecord> {
        self.records.get(slot)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EncodingRecord> {
        self.records.iter()
    }

    pub fn find_name(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.name == name)
    }

    pub fn find_unicode(&self, unicode: u32) -> Option<usize> {
        self.records.iter().position(|r| r.unicode == Some(unicode))
    }
}
