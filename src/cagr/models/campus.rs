use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the university's campuses, as listed by the search form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Campus {
    #[serde(rename = "FLO")]
    Florianopolis,
    #[serde(rename = "JOI")]
    Joinville,
    #[serde(rename = "CBS")]
    Curitibanos,
    #[serde(rename = "ARA")]
    Ararangua,
    #[serde(rename = "BLN")]
    Blumenau,
}

/// Tag and wire code for every campus, in the order the site lists them.
/// Code 0 (distance learning) is deliberately not crawled.
const CAMPUS_TABLE: [(Campus, &str, u8); 5] = [
    (Campus::Florianopolis, "FLO", 1),
    (Campus::Joinville, "JOI", 2),
    (Campus::Curitibanos, "CBS", 3),
    (Campus::Ararangua, "ARA", 4),
    (Campus::Blumenau, "BLN", 5),
];

impl Campus {
    pub const ALL: [Campus; 5] = [
        Campus::Florianopolis,
        Campus::Joinville,
        Campus::Curitibanos,
        Campus::Ararangua,
        Campus::Blumenau,
    ];

    // Variants are declared in table order, so the discriminant is the row.
    fn entry(self) -> &'static (Campus, &'static str, u8) {
        &CAMPUS_TABLE[self as usize]
    }

    /// Three-letter tag used as the campus key in the output document.
    pub fn tag(self) -> &'static str {
        self.entry().1
    }

    /// Value of `formBusca:selectCampus` for this campus.
    pub fn code(self) -> u8 {
        self.entry().2
    }
}

impl fmt::Display for Campus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown campus {0:?} (expected one of FLO, JOI, CBS, ARA, BLN)")]
pub struct UnknownCampus(String);

impl FromStr for Campus {
    type Err = UnknownCampus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        CAMPUS_TABLE
            .iter()
            .find(|(_, tag, _)| tag.eq_ignore_ascii_case(s))
            .map(|(campus, _, _)| *campus)
            .ok_or_else(|| UnknownCampus(s.to_owned()))
    }
}
