//! Entity records: one fixed-size buffer per creature, in either the compact
//! (box) or extended (party) layout.

pub mod pa8;
pub mod pk7;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::gender::Gender;
use crate::language::Language;
use crate::lookup::{GrowthGroup, Lookup};
use crate::stat::{self, Stat, StatInputs, Type};

pub use pa8::Pa8;
pub use pk7::Pk7;

pub const MOVE_SLOTS: usize = 4;
pub const CONTEST_STATS: usize = 6;
pub const MAX_LEVEL: u8 = 100;

/// Value returned by party-only getters on compact records.
pub const NOT_IN_PARTY: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    Compact,
    Extended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Generation {
    Seven,
    Eight,
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generation::Seven => f.write_str("7"),
            Generation::Eight => f.write_str("8"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handler {
    OriginalTrainer,
    NotOriginalTrainer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// Identity of the trainer receiving a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerInfo {
    pub name: String,
    pub tid: u16,
    pub sid: u16,
    pub gender: Gender,
}

pub trait Pkx: fmt::Debug + Send + Sync {
    fn generation(&self) -> Generation;
    fn layout(&self) -> Layout;
    fn extension(&self) -> &'static str;
    fn box_length(&self) -> usize;
    fn party_length(&self) -> usize;
    fn raw(&self) -> &[u8];
    fn clone_box(&self) -> Box<dyn Pkx>;
    /// Copy of this record in `layout`; the party trailer is zeroed when
    /// extending and dropped when compacting.
    fn to_layout(&self, layout: Layout) -> Box<dyn Pkx>;

    fn is_party(&self) -> bool {
        self.layout() == Layout::Extended
    }

    fn to_party(&self) -> Box<dyn Pkx> {
        self.to_layout(Layout::Extended)
    }

    fn to_box(&self) -> Box<dyn Pkx> {
        self.to_layout(Layout::Compact)
    }

    fn is_encrypted(&self) -> bool;
    fn encrypt(&mut self);
    fn decrypt(&mut self);
    /// On-disk form of the record, leaving `self` decrypted.
    fn encrypted_bytes(&self) -> Vec<u8>;
    fn calc_checksum(&self) -> u16;
    fn refresh_checksum(&mut self);

    fn checksum_valid(&self) -> bool {
        self.checksum() == self.calc_checksum()
    }

    fn encryption_constant(&self) -> u32;
    fn set_encryption_constant(&mut self, v: u32);
    fn sanity(&self) -> u16;
    fn set_sanity(&mut self, v: u16);
    fn checksum(&self) -> u16;
    fn set_checksum(&mut self, v: u16);
    fn species(&self) -> u16;
    fn set_species(&mut self, v: u16);
    fn held_item(&self) -> u16;
    fn set_held_item(&mut self, v: u16);
    fn tid(&self) -> u16;
    fn set_tid(&mut self, v: u16);
    fn sid(&self) -> u16;
    fn set_sid(&mut self, v: u16);
    fn experience(&self) -> u32;
    fn set_experience(&mut self, v: u32);
    fn ability(&self) -> u16;
    fn set_ability(&mut self, v: u16);
    fn ability_number(&self) -> u8;
    fn set_ability_number(&mut self, v: u8);
    fn mark_value(&self) -> u16;
    fn set_mark_value(&mut self, v: u16);
    fn pid(&self) -> u32;
    fn set_pid(&mut self, v: u32);
    fn nature(&self) -> u8;
    /// Values outside the 25 natures are ignored.
    fn set_nature(&mut self, v: u8);
    fn fateful_encounter(&self) -> bool;
    fn set_fateful_encounter(&mut self, v: bool);
    fn gender(&self) -> Gender;
    fn set_gender(&mut self, v: Gender);
    fn form(&self) -> u16;
    fn set_form(&mut self, v: u16);
    fn ev(&self, stat: Stat) -> u8;
    fn set_ev(&mut self, stat: Stat, v: u8);
    fn contest(&self, index: usize) -> u8;
    fn set_contest(&mut self, index: usize, v: u8);
    fn pkrs(&self) -> u8;
    fn set_pkrs(&mut self, v: u8);
    fn nickname(&self) -> String;
    fn set_nickname(&mut self, v: &str);
    fn move_id(&self, index: usize) -> u16;
    fn set_move_id(&mut self, index: usize, v: u16);
    fn pp(&self, index: usize) -> u8;
    fn set_pp(&mut self, index: usize, v: u8);
    fn pp_ups(&self, index: usize) -> u8;
    fn set_pp_ups(&mut self, index: usize, v: u8);
    fn relearn_move(&self, index: usize) -> u16;
    fn set_relearn_move(&mut self, index: usize, v: u16);
    fn iv32(&self) -> u32;
    fn set_iv32(&mut self, v: u32);
    fn current_handler(&self) -> Handler;
    fn set_current_handler(&mut self, v: Handler);
    fn ot_name(&self) -> String;
    fn set_ot_name(&mut self, v: &str);
    fn ot_friendship(&self) -> u8;
    fn set_ot_friendship(&mut self, v: u8);
    fn ht_friendship(&self) -> u8;
    fn set_ht_friendship(&mut self, v: u8);
    fn egg_location(&self) -> u16;
    fn set_egg_location(&mut self, v: u16);
    fn met_location(&self) -> u16;
    fn set_met_location(&mut self, v: u16);
    fn ball(&self) -> u8;
    fn set_ball(&mut self, v: u8);
    fn met_level(&self) -> u8;
    fn set_met_level(&mut self, v: u8);
    fn ot_gender(&self) -> Gender;
    fn set_ot_gender(&mut self, v: Gender);
    fn version(&self) -> u8;
    fn set_version(&mut self, v: u8);
    fn language(&self) -> Language;
    fn set_language(&mut self, v: Language);
    fn met_date(&self) -> Date;
    fn set_met_date(&mut self, v: Date);
    fn egg_date(&self) -> Option<Date>;
    fn set_egg_date(&mut self, v: Option<Date>);

    /// Returns [`NOT_IN_PARTY`] on compact records.
    fn party_current_hp(&self) -> i32;
    /// No-op on compact records.
    fn set_party_current_hp(&mut self, v: u16);
    fn party_stat(&self, stat: Stat) -> i32;
    fn set_party_stat(&mut self, stat: Stat, v: u16);
    fn party_level(&self) -> i32;
    fn set_party_level(&mut self, v: u8);

    fn pkrs_days(&self) -> u8 {
        self.pkrs() & 0xF
    }

    fn set_pkrs_days(&mut self, v: u8) {
        let pkrs = self.pkrs();
        self.set_pkrs((pkrs & !0xF) | (v & 0xF));
    }

    fn pkrs_strain(&self) -> u8 {
        self.pkrs() >> 4
    }

    fn set_pkrs_strain(&mut self, v: u8) {
        let pkrs = self.pkrs();
        self.set_pkrs((pkrs & 0xF) | (v << 4));
    }

    fn iv(&self, stat: Stat) -> u8 {
        crate::bytes::bits(self.iv32(), 5 * stat.index() as u32, 5) as u8
    }

    fn set_iv(&mut self, stat: Stat, v: u8) {
        let word = crate::bytes::with_bits(self.iv32(), 5 * stat.index() as u32, 5, v as u32);
        self.set_iv32(word);
    }

    fn ivs(&self) -> [u8; 6] {
        stat::unpack_ivs(self.iv32())
    }

    fn set_ivs(&mut self, ivs: [u8; 6]) {
        let flags = self.iv32() & 0xC000_0000;
        self.set_iv32(flags | stat::pack_ivs(ivs));
    }

    fn evs(&self) -> [u8; 6] {
        Stat::ALL.map(|s| self.ev(s))
    }

    fn is_egg(&self) -> bool {
        crate::bytes::flag(self.iv32(), 30)
    }

    fn set_egg(&mut self, v: bool) {
        let word = crate::bytes::with_flag(self.iv32(), 30, v);
        self.set_iv32(word);
    }

    fn is_nicknamed(&self) -> bool {
        crate::bytes::flag(self.iv32(), 31)
    }

    fn set_nicknamed(&mut self, v: bool) {
        let word = crate::bytes::with_flag(self.iv32(), 31, v);
        self.set_iv32(word);
    }

    fn moves(&self) -> [u16; MOVE_SLOTS] {
        [0, 1, 2, 3].map(|i| self.move_id(i))
    }

    fn is_empty(&self) -> bool {
        self.species() == 0
    }

    fn psv(&self) -> u16 {
        let pid = self.pid();
        (((pid >> 16) ^ (pid & 0xFFFF)) >> 4) as u16
    }

    fn tsv(&self) -> u16 {
        (self.tid() ^ self.sid()) >> 4
    }

    /// `tid ^ sid ^ pid_hi ^ pid_lo` before the shift; square/star
    /// shininess is not derived from it.
    fn shiny_xor(&self) -> u16 {
        let pid = self.pid();
        self.tid() ^ self.sid() ^ (pid >> 16) as u16 ^ (pid & 0xFFFF) as u16
    }

    fn is_shiny(&self) -> bool {
        self.psv() == self.tsv()
    }

    fn hidden_power_type(&self) -> Type {
        let w = Stat::ALL
            .iter()
            .enumerate()
            .fold(0usize, |acc, (i, &s)| acc + (((self.iv(s) & 1) as usize) << i));
        Type::HIDDEN_POWER[15 * w / 63]
    }

    fn growth_group(&self, lookup: &dyn Lookup) -> GrowthGroup {
        lookup.growth_group(self.species(), self.form())
    }

    /// Stored level for party records; otherwise, or when the stored level
    /// is zero, derived from experience.
    fn level(&self, lookup: &dyn Lookup) -> u8 {
        if let Ok(level @ 1..) = u8::try_from(self.party_level()) {
            return level;
        }
        level_from_exp(self.experience(), self.growth_group(lookup), lookup)
    }

    /// Selects ability slot 0, 1 or 2 (hidden). The ability number becomes
    /// 1, 2 or 4; the ability id follows the lookup's table when it has one.
    fn set_ability_slot(&mut self, lookup: &dyn Lookup, slot: u8) {
        let slot = slot.min(2);
        self.set_ability_number(1 << slot);
        if let Some(ids) = lookup.abilities(self.species(), self.form()) {
            self.set_ability(ids[slot as usize]);
        }
    }

    /// Stats from the standard formula. Without a personal-table entry the
    /// base stats count as zero.
    fn calc_stats(&self, lookup: &dyn Lookup) -> [u16; 6] {
        StatInputs {
            species: self.species(),
            level: level_from_exp(self.experience(), self.growth_group(lookup), lookup),
            nature: self.nature(),
            base: lookup
                .base_stats(self.species(), self.form())
                .unwrap_or_default(),
            ivs: self.ivs(),
            evs: self.evs(),
        }
        .calc_all()
    }

    /// Fills the party-only region from the shared data: level from
    /// experience, stored stats, and current HP at full. No-op on compact
    /// records.
    fn update_party_data(&mut self, lookup: &dyn Lookup) {
        if !self.is_party() {
            return;
        }
        let level = level_from_exp(self.experience(), self.growth_group(lookup), lookup);
        let stats = self.calc_stats(lookup);
        self.set_party_level(level);
        for stat in Stat::ALL {
            self.set_party_stat(stat, stats[stat.index()]);
        }
        self.set_party_current_hp(stats[Stat::Hp.index()]);
    }

    fn set_level(&mut self, lookup: &dyn Lookup, level: u8) {
        let level = level.clamp(1, MAX_LEVEL);
        let exp = lookup.exp_for_level(level, self.growth_group(lookup));
        self.set_experience(exp);
        self.set_party_level(level);
    }
}

pub fn level_from_exp(exp: u32, group: GrowthGroup, lookup: &dyn Lookup) -> u8 {
    let mut level = 1u8;
    while level < MAX_LEVEL && exp >= lookup.exp_for_level(level + 1, group) {
        level += 1;
    }
    level
}

/// Updates the handler fields a record picks up when it enters `trainer`'s
/// storage. Eggs keep their state.
pub fn trade(pk: &mut dyn Pkx, trainer: &TrainerInfo) {
    if pk.is_egg() {
        return;
    }
    let is_ot = pk.ot_name() == trainer.name
        && pk.tid() == trainer.tid
        && pk.sid() == trainer.sid
        && pk.ot_gender() == trainer.gender;
    pk.set_current_handler(if is_ot {
        Handler::OriginalTrainer
    } else {
        Handler::NotOriginalTrainer
    });
}

/// Builds whichever record variant has `bytes.len()` as one of its lengths.
pub fn from_bytes(bytes: &[u8]) -> Result<Box<dyn Pkx>, CoreError> {
    match bytes.len() {
        Pk7::BOX_LENGTH | Pk7::PARTY_LENGTH => Ok(Box::new(Pk7::new(bytes.to_vec())?)),
        Pa8::BOX_LENGTH | Pa8::PARTY_LENGTH => Ok(Box::new(Pa8::new(bytes.to_vec())?)),
        other => Err(CoreError::new(
            CoreErrorCode::TruncatedBuffer,
            format!("no record format is {other} bytes long"),
        )),
    }
}

pub(crate) fn layout_for(len: usize, box_len: usize, party_len: usize) -> Result<Layout, CoreError> {
    if len == box_len {
        Ok(Layout::Compact)
    } else if len == party_len {
        Ok(Layout::Extended)
    } else {
        Err(CoreError::new(
            CoreErrorCode::TruncatedBuffer,
            format!("record length {len}, expected {box_len} or {party_len}"),
        ))
    }
}

pub(crate) fn resize_for(data: &[u8], layout: Layout, box_len: usize, party_len: usize) -> Vec<u8> {
    let mut out = data.to_vec();
    out.resize(
        match layout {
            Layout::Compact => box_len,
            Layout::Extended => party_len,
        },
        0,
    );
    out
}

pub(crate) fn warn_on_bad_checksum(pk: &dyn Pkx) {
    if !pk.is_empty() && !pk.checksum_valid() {
        tracing::warn!(
            format = pk.extension(),
            species = pk.species(),
            stored = pk.checksum(),
            computed = pk.calc_checksum(),
            "record checksum mismatch"
        );
    }
}
