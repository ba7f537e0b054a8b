use std::fmt;

use serde::{Deserialize, Serialize};

/// Stat ordinal, shared by IV/EV packing and party stat tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Hp = 0,
    Attack = 1,
    Defense = 2,
    Speed = 3,
    SpecialAttack = 4,
    SpecialDefense = 5,
}

impl Stat {
    pub const ALL: [Stat; 6] = [
        Stat::Hp,
        Stat::Attack,
        Stat::Defense,
        Stat::Speed,
        Stat::SpecialAttack,
        Stat::SpecialDefense,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Stat::Hp => "HP",
            Stat::Attack => "Atk",
            Stat::Defense => "Def",
            Stat::Speed => "Spe",
            Stat::SpecialAttack => "SpA",
            Stat::SpecialDefense => "SpD",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Normal,
    Fighting,
    Flying,
    Poison,
    Ground,
    Rock,
    Bug,
    Ghost,
    Steel,
    Fire,
    Water,
    Grass,
    Electric,
    Psychic,
    Ice,
    Dragon,
    Dark,
    Fairy,
}

impl Type {
    /// Types reachable through Hidden Power, indexed by `15 * w / 63`.
    pub const HIDDEN_POWER: [Type; 16] = [
        Type::Fighting,
        Type::Flying,
        Type::Poison,
        Type::Ground,
        Type::Rock,
        Type::Bug,
        Type::Ghost,
        Type::Steel,
        Type::Fire,
        Type::Water,
        Type::Grass,
        Type::Electric,
        Type::Psychic,
        Type::Ice,
        Type::Dragon,
        Type::Dark,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Type::Normal => "Normal",
            Type::Fighting => "Fighting",
            Type::Flying => "Flying",
            Type::Poison => "Poison",
            Type::Ground => "Ground",
            Type::Rock => "Rock",
            Type::Bug => "Bug",
            Type::Ghost => "Ghost",
            Type::Steel => "Steel",
            Type::Fire => "Fire",
            Type::Water => "Water",
            Type::Grass => "Grass",
            Type::Electric => "Electric",
            Type::Psychic => "Psychic",
            Type::Ice => "Ice",
            Type::Dragon => "Dragon",
            Type::Dark => "Dark",
            Type::Fairy => "Fairy",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Packs six 5-bit IVs into the low 30 bits of an IV word.
pub fn pack_ivs(ivs: [u8; 6]) -> u32 {
    ivs.iter()
        .enumerate()
        .fold(0u32, |acc, (i, &iv)| acc | (((iv & 0x1F) as u32) << (5 * i)))
}

pub fn unpack_ivs(word: u32) -> [u8; 6] {
    let mut out = [0u8; 6];
    for (i, iv) in out.iter_mut().enumerate() {
        *iv = ((word >> (5 * i)) & 0x1F) as u8;
    }
    out
}

const SHEDINJA: u16 = 292;

/// Nature modifier in percent. Natures come in rows of five: `nature / 5`
/// raises and `nature % 5` lowers one of Attack..SpecialDefense.
pub fn nature_percent(nature: u8, stat: Stat) -> u32 {
    if stat == Stat::Hp || nature >= 25 {
        return 100;
    }
    let raised = (nature / 5) as usize + 1;
    let lowered = (nature % 5) as usize + 1;
    if raised == lowered {
        return 100;
    }
    match stat.index() {
        i if i == raised => 110,
        i if i == lowered => 90,
        _ => 100,
    }
}

/// Inputs to the standard stat formula for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatInputs {
    pub species: u16,
    pub level: u8,
    pub nature: u8,
    pub base: [u8; 6],
    pub ivs: [u8; 6],
    pub evs: [u8; 6],
}

impl StatInputs {
    pub fn calc(&self, stat: Stat) -> u16 {
        let i = stat.index();
        let level = self.level as u32;
        let core = (2 * self.base[i] as u32 + self.ivs[i] as u32 + self.evs[i] as u32 / 4)
            * level
            / 100;
        let value = if stat == Stat::Hp {
            if self.species == SHEDINJA {
                1
            } else {
                core + level + 10
            }
        } else {
            (core + 5) * nature_percent(self.nature, stat) / 100
        };
        value.min(u16::MAX as u32) as u16
    }

    pub fn calc_all(&self) -> [u16; 6] {
        Stat::ALL.map(|s| self.calc(s))
    }
}
