//! Entry keys and the payload kind each one carries.
//!
//! Key numbers follow the files written by the legacy editor as far as they
//! are known; any key not listed here is carried as [`EntryKey::Unknown`].

/// How the payload bytes of an entry are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// UTF-8 text
    Str,
    /// One variable-length integer
    Int,
    /// Variable-length integers up to the end of the payload
    Ints,
    /// A little-endian `f64`
    Float,
    /// A structured record with a per-key binary layout
    Record,
    /// Opaque bytes
    Raw,
}

macro_rules! entry_keys {
    ($($name:ident = $code:literal => $kind:ident),* $(,)?) => {
        /// Every entry key this library understands.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EntryKey {
            $($name,)*
            Unknown(u16),
        }

        impl EntryKey {
            pub fn code(self) -> u16 {
                match self {
                    $(EntryKey::$name => $code,)*
                    EntryKey::Unknown(code) => code,
                }
            }

            pub fn from_code(code: u16) -> EntryKey {
                match code {
                    $($code => EntryKey::$name,)*
                    other => EntryKey::Unknown(other),
                }
            }

            pub fn kind(self) -> PayloadKind {
                match self {
                    $(EntryKey::$name => PayloadKind::$kind,)*
                    EntryKey::Unknown(_) => PayloadKind::Raw,
                }
            }
        }
    };
}

entry_keys! {
    End = 5 => Raw,
    BlockNamesEnd = 257 => Raw,
    BlockFontInfoStart = 1010 => Raw,
    BlockFontInfoEnd = 1011 => Raw,
    BlockMmFontInfoStart = 1012 => Raw,
    BlockMmFontInfoEnd = 1013 => Raw,

    FullName = 1025 => Str,
    FontName = 1026 => Str,
    FamilyName = 1027 => Str,
    Weight = 1028 => Str,
    ItalicAngle = 1029 => Float,
    SlantAngle = 1030 => Float,
    UnderlinePosition = 1031 => Int,
    UnderlineThickness = 1032 => Int,
    IsFixedPitch = 1034 => Int,
    Copyright = 1037 => Str,
    Notice = 1038 => Str,
    Source = 1039 => Str,
    UniqueId = 1044 => Int,
    Version = 1046 => Str,
    WeightCode = 1048 => Int,
    MsCharset = 1054 => Int,
    MenuName = 1056 => Str,
    PclId = 1057 => Int,
    VpId = 1058 => Int,
    MsId = 1060 => Int,
    Trademark = 1061 => Str,
    Designer = 1062 => Str,
    DesignerUrl = 1063 => Str,
    VendorUrl = 1064 => Str,
    Width = 1065 => Str,
    DefaultCharacter = 1066 => Str,
    License = 1069 => Str,
    LicenseUrl = 1070 => Str,
    FondId = 1090 => Int,
    AppleName = 1092 => Str,
    Vendor = 1121 => Str,
    StyleName = 1127 => Str,
    VersionMajor = 1130 => Int,
    VersionMinor = 1131 => Int,
    Year = 1132 => Int,
    Xuid = 1133 => Ints,
    XuidNum = 1134 => Int,
    Upm = 1135 => Int,
    UnicodeRanges = 1136 => Ints,
    FontNames = 1138 => Record,
    SampleText = 1140 => Str,

    TtInfo = 1264 => Record,
    Gasp = 1265 => Record,
    Vdmx = 1266 => Record,
    Cvt = 1268 => Raw,
    Prep = 1269 => Raw,
    Fpgm = 1270 => Raw,
    HheaAscender = 1271 => Int,
    HheaDescender = 1272 => Int,
    TrueTypeStems = 1273 => Record,
    TrueTypeStemPpems = 1274 => Record,
    TrueTypeStemPpems1 = 1275 => Record,
    TrueTypeZones = 1276 => Record,
    TrueTypeZoneDeltas = 1278 => Record,
    OpenTypeClass = 1277 => Str,
    TrueTypeTable = 1279 => Raw,
    GlobalGuides = 1294 => Record,
    GlobalGuideProperties = 1296 => Record,

    Encoding = 1500 => Record,
    EncodingDefault = 1502 => Raw,
    MasterCount = 1503 => Int,
    AxisCount = 1513 => Int,
    AxisName = 1514 => Str,
    AxisMappingsCount = 1515 => Ints,
    AxisMappings = 1516 => Record,
    WeightVector = 1517 => Record,
    MasterName = 1523 => Str,
    MasterLocation = 1504 => Record,
    PostScriptInfo = 1536 => Record,
    BlueValuesNum = 1530 => Int,
    OtherBluesNum = 1531 => Int,
    FamilyBluesNum = 1532 => Int,
    FamilyOtherBluesNum = 1533 => Int,
    StemSnapHNum = 1534 => Int,
    StemSnapVNum = 1535 => Int,
    ExportOptions = 1743 => Ints,
    OpenTypeExportOptions = 1744 => Ints,

    Glyph = 2001 => Record,
    Links = 2008 => Record,
    Image = 2007 => Record,
    HintingOptions = 2010 => Ints,
    Mark = 2012 => Int,
    Mask = 2011 => Record,
    Origin = 2027 => Ints,
    Unicodes = 1250 => Ints,
    UnicodesNonBmp = 2028 => Ints,
    GlyphCustomData = 2015 => Str,
    GlyphNote = 2016 => Str,
    Features = 2014 => Str,
    Note = 2025 => Str,
    CustomData = 2026 => Str,
    GdefData = 2018 => Record,
    AnchorsProperties = 2020 => Record,
    AnchorsMm = 2029 => Record,
    GuideProperties = 2031 => Record,
    MetricsClassFlags = 1104 => Record,
    KerningClassFlags = 1105 => Record,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL: &[EntryKey] = &[
        EntryKey::End,
        EntryKey::FontName,
        EntryKey::Glyph,
        EntryKey::Encoding,
        EntryKey::PostScriptInfo,
        EntryKey::TrueTypeZoneDeltas,
        EntryKey::KerningClassFlags,
    ];

    #[test]
    fn test_codes_roundtrip() {
        for key in ALL {
            assert_eq!(EntryKey::from_code(key.code()), *key);
        }
        assert_eq!(EntryKey::from_code(9999), EntryKey::Unknown(9999));
        assert_eq!(EntryKey::Unknown(9999).kind(), PayloadKind::Raw);
    }

    #[test]
    fn test_codes_fit_in_key_field() {
        let codes: HashSet<u16> = ALL.iter().map(|k| k.code()).collect();
        assert!(codes.iter().all(|c| c & 0x8000 == 0));
        assert_eq!(codes.len(), ALL.len());
    }
}
