use std::fmt;

use serde::{Deserialize, Serialize};

/// Language tag stored in both records and trainer blocks. Value 6 is unused
/// by every game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    None,
    Japanese,
    English,
    French,
    Italian,
    German,
    Spanish,
    Korean,
    ChineseSimplified,
    ChineseTraditional,
    Unknown(u8),
}

impl Language {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::Japanese,
            2 => Self::English,
            3 => Self::French,
            4 => Self::Italian,
            5 => Self::German,
            7 => Self::Spanish,
            8 => Self::Korean,
            9 => Self::ChineseSimplified,
            10 => Self::ChineseTraditional,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u8 {
        match *self {
            Self::None => 0,
            Self::Japanese => 1,
            Self::English => 2,
            Self::French => 3,
            Self::Italian => 4,
            Self::German => 5,
            Self::Spanish => 7,
            Self::Korean => 8,
            Self::ChineseSimplified => 9,
            Self::ChineseTraditional => 10,
            Self::Unknown(other) => other,
        }
    }

    pub fn code(&self) -> &'static str {
        match *self {
            Self::None => "-",
            Self::Japanese => "JPN",
            Self::English => "ENG",
            Self::French => "FRE",
            Self::Italian => "ITA",
            Self::German => "GER",
            Self::Spanish => "SPA",
            Self::Korean => "KOR",
            Self::ChineseSimplified => "CHS",
            Self::ChineseTraditional => "CHT",
            Self::Unknown(_) => "???",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Unknown(v) => write!(f, "Unknown ({})", v),
            _ => f.write_str(self.code()),
        }
    }
}
