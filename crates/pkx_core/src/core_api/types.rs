use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gender::Gender;
use crate::language::Language;
use crate::pkx::Generation;
use crate::sav::Pouch;

use super::error::CoreErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Game {
    SunMoon,
    UltraSunUltraMoon,
    LegendsArceus,
}

impl Game {
    pub fn generation(self) -> Generation {
        match self {
            Game::SunMoon | Game::UltraSunUltraMoon => Generation::Seven,
            Game::LegendsArceus => Generation::Eight,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Game::SunMoon => "SM",
            Game::UltraSunUltraMoon => "USUM",
            Game::LegendsArceus => "PLA",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Game::SunMoon => "Sun/Moon",
            Game::UltraSunUltraMoon => "Ultra Sun/Ultra Moon",
            Game::LegendsArceus => "Legends: Arceus",
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayTime {
    pub hours: u16,
    pub minutes: u8,
    pub seconds: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub game: Game,
    pub ot_name: String,
    pub tid: u16,
    pub sid: u16,
    pub gender: Gender,
    pub language: Language,
    pub version: u8,
    pub money: u32,
    pub badges: u8,
    pub play_time: PlayTime,
    pub party_count: usize,
    pub max_boxes: usize,
    pub current_box: u8,
    pub unlocked_boxes: u8,
    pub dex_seen: u16,
    pub dex_caught: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapabilityIssue {
    DexNotModelled,
    MysteryGiftNotModelled,
    BagNotModelled,
}

impl CapabilityIssue {
    pub fn as_str(self) -> &'static str {
        match self {
            CapabilityIssue::DexNotModelled => "dex_not_modelled",
            CapabilityIssue::MysteryGiftNotModelled => "mystery_gift_not_modelled",
            CapabilityIssue::BagNotModelled => "bag_not_modelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Capabilities {
    pub can_query: bool,
    pub can_apply_edits: bool,
    pub issues: Vec<CapabilityIssue>,
}

impl Capabilities {
    pub fn editable(issues: Vec<CapabilityIssue>) -> Self {
        Self {
            can_query: true,
            can_apply_edits: true,
            issues,
        }
    }

    pub fn supports_bag(&self) -> bool {
        !self.issues.contains(&CapabilityIssue::BagNotModelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotLocation {
    Party { slot: usize },
    Box { box_id: usize, slot: usize },
}

impl fmt::Display for SlotLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SlotLocation::Party { slot } => write!(f, "party slot {}", slot + 1),
            SlotLocation::Box { box_id, slot } => {
                write!(f, "box {} slot {}", box_id + 1, slot + 1)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkmSummary {
    pub location: SlotLocation,
    pub species: u16,
    pub species_name: Option<String>,
    pub nickname: String,
    pub level: u8,
    pub gender: Gender,
    pub nature: u8,
    pub held_item: u16,
    pub ot_name: String,
    pub tid: u16,
    pub sid: u16,
    pub is_egg: bool,
    pub is_shiny: bool,
    pub moves: [u16; 4],
    pub ivs: [u8; 6],
    pub evs: [u8; 6],
    pub checksum_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemEntry {
    pub pouch: Pouch,
    pub slot: usize,
    pub id: u16,
    pub count: u16,
    pub name: Option<String>,
}

/// Non-fatal integrity finding, surfaced after a successful load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityIssue {
    pub code: CoreErrorCode,
    pub message: String,
}
