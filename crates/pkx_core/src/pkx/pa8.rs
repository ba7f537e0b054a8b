//! Legends: Arceus record: 0x168-byte box layout, 0x178-byte party layout.
//!
//! Current HP lives in the shared region for this format but is still
//! treated as party-only data.

use crate::bytes::{read_u16, read_u32, write_u16, write_u32};
use crate::core_api::CoreError;
use crate::crypto::{self, CryptLayout};
use crate::gender::Gender;
use crate::language::Language;
use crate::stat::Stat;
use crate::text::{self, Charset};

use super::{
    CONTEST_STATS, Date, Generation, Handler, Layout, MOVE_SLOTS, NOT_IN_PARTY, Pkx, layout_for,
    resize_for, warn_on_bad_checksum,
};

const NAME_BYTES: usize = text::slot_bytes(13);

const OFS_MOVES: usize = 0x54;
const OFS_PP: usize = 0x5C;
const OFS_NICKNAME: usize = 0x60;
const OFS_PP_UPS: usize = 0x86;
const OFS_RELEARN: usize = 0x8A;
const OFS_CURRENT_HP: usize = 0x92;
const OFS_IV32: usize = 0x94;
const OFS_OT_NAME: usize = 0x110;
const OFS_EGG_DATE: usize = 0x131;
const OFS_MET_DATE: usize = 0x134;
const OFS_PARTY_LEVEL: usize = 0x168;
const OFS_PARTY_STATS: usize = 0x16A;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pa8 {
    data: Vec<u8>,
}

impl CryptLayout for Pa8 {
    const BOX_LENGTH: usize = 0x168;
    const PARTY_LENGTH: usize = 0x178;
    const BLOCK_LENGTH: usize = 88;

    fn is_encrypted(data: &[u8]) -> bool {
        read_u16(data, 0x78) != 0 && read_u16(data, 0x128) != 0
    }
}

impl Pa8 {
    pub const BOX_LENGTH: usize = <Self as CryptLayout>::BOX_LENGTH;
    pub const PARTY_LENGTH: usize = <Self as CryptLayout>::PARTY_LENGTH;

    pub fn new(mut data: Vec<u8>) -> Result<Self, CoreError> {
        layout_for(data.len(), Self::BOX_LENGTH, Self::PARTY_LENGTH)?;
        crypto::decrypt::<Self>(&mut data);
        let pk = Self { data };
        warn_on_bad_checksum(&pk);
        Ok(pk)
    }

    pub fn blank(layout: Layout) -> Self {
        Self {
            data: resize_for(&[], layout, Self::BOX_LENGTH, Self::PARTY_LENGTH),
        }
    }

    /// Nature used for stat calculation; kept equal to the nature on write.
    pub fn stat_nature(&self) -> u8 {
        self.data[0x21]
    }

    fn date_at(&self, ofs: usize) -> Date {
        Date {
            year: 2000 + self.data[ofs] as u16,
            month: self.data[ofs + 1],
            day: self.data[ofs + 2],
        }
    }

    fn put_date(&mut self, ofs: usize, date: Option<Date>) {
        let raw = date.map_or([0; 3], |d| [d.year.saturating_sub(2000) as u8, d.month, d.day]);
        self.data[ofs..ofs + 3].copy_from_slice(&raw);
    }
}

impl Pkx for Pa8 {
    fn generation(&self) -> Generation {
        Generation::Eight
    }

    fn layout(&self) -> Layout {
        if self.data.len() == Self::PARTY_LENGTH {
            Layout::Extended
        } else {
            Layout::Compact
        }
    }

    fn extension(&self) -> &'static str {
        "pa8"
    }

    fn box_length(&self) -> usize {
        Self::BOX_LENGTH
    }

    fn party_length(&self) -> usize {
        Self::PARTY_LENGTH
    }

    fn raw(&self) -> &[u8] {
        &self.data
    }

    fn clone_box(&self) -> Box<dyn Pkx> {
        Box::new(self.clone())
    }

    fn to_layout(&self, layout: Layout) -> Box<dyn Pkx> {
        Box::new(Self {
            data: resize_for(&self.data, layout, Self::BOX_LENGTH, Self::PARTY_LENGTH),
        })
    }

    fn is_encrypted(&self) -> bool {
        <Self as CryptLayout>::is_encrypted(&self.data)
    }

    fn encrypt(&mut self) {
        crypto::encrypt::<Self>(&mut self.data);
    }

    fn decrypt(&mut self) {
        crypto::decrypt::<Self>(&mut self.data);
    }

    fn encrypted_bytes(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        crypto::encrypt::<Self>(&mut out);
        out
    }

    fn calc_checksum(&self) -> u16 {
        crypto::checksum::<Self>(&self.data)
    }

    fn refresh_checksum(&mut self) {
        crypto::refresh_checksum::<Self>(&mut self.data);
    }

    fn encryption_constant(&self) -> u32 {
        read_u32(&self.data, 0x00)
    }

    fn set_encryption_constant(&mut self, v: u32) {
        write_u32(&mut self.data, 0x00, v);
    }

    fn sanity(&self) -> u16 {
        read_u16(&self.data, 0x04)
    }

    fn set_sanity(&mut self, v: u16) {
        write_u16(&mut self.data, 0x04, v);
    }

    fn checksum(&self) -> u16 {
        crypto::stored_checksum::<Self>(&self.data)
    }

    fn set_checksum(&mut self, v: u16) {
        write_u16(&mut self.data, 0x06, v);
    }

    fn species(&self) -> u16 {
        read_u16(&self.data, 0x08)
    }

    fn set_species(&mut self, v: u16) {
        write_u16(&mut self.data, 0x08, v);
    }

    fn held_item(&self) -> u16 {
        read_u16(&self.data, 0x0A)
    }

    fn set_held_item(&mut self, v: u16) {
        write_u16(&mut self.data, 0x0A, v);
    }

    fn tid(&self) -> u16 {
        read_u16(&self.data, 0x0C)
    }

    fn set_tid(&mut self, v: u16) {
        write_u16(&mut self.data, 0x0C, v);
    }

    fn sid(&self) -> u16 {
        read_u16(&self.data, 0x0E)
    }

    fn set_sid(&mut self, v: u16) {
        write_u16(&mut self.data, 0x0E, v);
    }

    fn experience(&self) -> u32 {
        read_u32(&self.data, 0x10)
    }

    fn set_experience(&mut self, v: u32) {
        write_u32(&mut self.data, 0x10, v);
    }

    fn ability(&self) -> u16 {
        read_u16(&self.data, 0x14)
    }

    fn set_ability(&mut self, v: u16) {
        write_u16(&mut self.data, 0x14, v);
    }

    fn ability_number(&self) -> u8 {
        self.data[0x16] & 7
    }

    fn set_ability_number(&mut self, v: u8) {
        self.data[0x16] = (self.data[0x16] & !7) | (v & 7);
    }

    fn mark_value(&self) -> u16 {
        read_u16(&self.data, 0x18)
    }

    fn set_mark_value(&mut self, v: u16) {
        write_u16(&mut self.data, 0x18, v);
    }

    fn pid(&self) -> u32 {
        read_u32(&self.data, 0x1C)
    }

    fn set_pid(&mut self, v: u32) {
        write_u32(&mut self.data, 0x1C, v);
    }

    fn nature(&self) -> u8 {
        self.data[0x20]
    }

    fn set_nature(&mut self, v: u8) {
        if v < 25 {
            self.data[0x20] = v;
            self.data[0x21] = v;
        }
    }

    fn fateful_encounter(&self) -> bool {
        self.data[0x22] & 1 == 1
    }

    fn set_fateful_encounter(&mut self, v: bool) {
        self.data[0x22] = (self.data[0x22] & !1) | v as u8;
    }

    fn gender(&self) -> Gender {
        Gender::from_raw((self.data[0x22] >> 2) & 3)
    }

    fn set_gender(&mut self, v: Gender) {
        self.data[0x22] = (self.data[0x22] & !0x0C) | ((v.raw() & 3) << 2);
    }

    fn form(&self) -> u16 {
        read_u16(&self.data, 0x24)
    }

    fn set_form(&mut self, v: u16) {
        write_u16(&mut self.data, 0x24, v);
    }

    fn ev(&self, stat: Stat) -> u8 {
        self.data[0x26 + stat.index()]
    }

    fn set_ev(&mut self, stat: Stat, v: u8) {
        self.data[0x26 + stat.index()] = v;
    }

    fn contest(&self, index: usize) -> u8 {
        if index >= CONTEST_STATS {
            return 0;
        }
        self.data[0x2C + index]
    }

    fn set_contest(&mut self, index: usize, v: u8) {
        if index < CONTEST_STATS {
            self.data[0x2C + index] = v;
        }
    }

    fn pkrs(&self) -> u8 {
        self.data[0x32]
    }

    fn set_pkrs(&mut self, v: u8) {
        self.data[0x32] = v;
    }

    fn nickname(&self) -> String {
        text::decode(&self.data[OFS_NICKNAME..OFS_NICKNAME + NAME_BYTES], Charset::Gen67)
    }

    fn set_nickname(&mut self, v: &str) {
        text::encode(
            &mut self.data[OFS_NICKNAME..OFS_NICKNAME + NAME_BYTES],
            v,
            Charset::Gen67,
        );
    }

    fn move_id(&self, index: usize) -> u16 {
        if index >= MOVE_SLOTS {
            return 0;
        }
        read_u16(&self.data, OFS_MOVES + 2 * index)
    }

    fn set_move_id(&mut self, index: usize, v: u16) {
        if index < MOVE_SLOTS {
            write_u16(&mut self.data, OFS_MOVES + 2 * index, v);
        }
    }

    fn pp(&self, index: usize) -> u8 {
        if index >= MOVE_SLOTS {
            return 0;
        }
        self.data[OFS_PP + index]
    }

    fn set_pp(&mut self, index: usize, v: u8) {
        if index < MOVE_SLOTS {
            self.data[OFS_PP + index] = v;
        }
    }

    fn pp_ups(&self, index: usize) -> u8 {
        if index >= MOVE_SLOTS {
            return 0;
        }
        self.data[OFS_PP_UPS + index]
    }

    fn set_pp_ups(&mut self, index: usize, v: u8) {
        if index < MOVE_SLOTS {
            self.data[OFS_PP_UPS + index] = v;
        }
    }

    fn relearn_move(&self, index: usize) -> u16 {
        if index >= MOVE_SLOTS {
            return 0;
        }
        read_u16(&self.data, OFS_RELEARN + 2 * index)
    }

    fn set_relearn_move(&mut self, index: usize, v: u16) {
        if index < MOVE_SLOTS {
            write_u16(&mut self.data, OFS_RELEARN + 2 * index, v);
        }
    }

    fn iv32(&self) -> u32 {
        read_u32(&self.data, OFS_IV32)
    }

    fn set_iv32(&mut self, v: u32) {
        write_u32(&mut self.data, OFS_IV32, v);
    }

    fn current_handler(&self) -> Handler {
        if self.data[0xD4] == 0 {
            Handler::OriginalTrainer
        } else {
            Handler::NotOriginalTrainer
        }
    }

    fn set_current_handler(&mut self, v: Handler) {
        self.data[0xD4] = (v == Handler::NotOriginalTrainer) as u8;
    }

    fn ot_name(&self) -> String {
        text::decode(&self.data[OFS_OT_NAME..OFS_OT_NAME + NAME_BYTES], Charset::Gen67)
    }

    fn set_ot_name(&mut self, v: &str) {
        text::encode(
            &mut self.data[OFS_OT_NAME..OFS_OT_NAME + NAME_BYTES],
            v,
            Charset::Gen67,
        );
    }

    fn ot_friendship(&self) -> u8 {
        self.data[0x12A]
    }

    fn set_ot_friendship(&mut self, v: u8) {
        self.data[0x12A] = v;
    }

    fn ht_friendship(&self) -> u8 {
        self.data[0xD8]
    }

    fn set_ht_friendship(&mut self, v: u8) {
        self.data[0xD8] = v;
    }

    fn egg_location(&self) -> u16 {
        read_u16(&self.data, 0x144)
    }

    fn set_egg_location(&mut self, v: u16) {
        write_u16(&mut self.data, 0x144, v);
    }

    fn met_location(&self) -> u16 {
        read_u16(&self.data, 0x146)
    }

    fn set_met_location(&mut self, v: u16) {
        write_u16(&mut self.data, 0x146, v);
    }

    fn ball(&self) -> u8 {
        self.data[0x148]
    }

    fn set_ball(&mut self, v: u8) {
        self.data[0x148] = v;
    }

    fn met_level(&self) -> u8 {
        self.data[0x149] & 0x7F
    }

    fn set_met_level(&mut self, v: u8) {
        self.data[0x149] = (self.data[0x149] & 0x80) | (v & 0x7F);
    }

    fn ot_gender(&self) -> Gender {
        Gender::from_raw(self.data[0x149] >> 7)
    }

    fn set_ot_gender(&mut self, v: Gender) {
        self.data[0x149] = (self.data[0x149] & 0x7F) | ((v.raw() & 1) << 7);
    }

    fn version(&self) -> u8 {
        self.data[0xEE]
    }

    fn set_version(&mut self, v: u8) {
        self.data[0xEE] = v;
    }

    fn language(&self) -> Language {
        Language::from_raw(self.data[0xF2])
    }

    fn set_language(&mut self, v: Language) {
        self.data[0xF2] = v.raw();
    }

    fn met_date(&self) -> Date {
        self.date_at(OFS_MET_DATE)
    }

    fn set_met_date(&mut self, v: Date) {
        self.put_date(OFS_MET_DATE, Some(v));
    }

    fn egg_date(&self) -> Option<Date> {
        if self.data[OFS_EGG_DATE..OFS_EGG_DATE + 3] == [0; 3] {
            return None;
        }
        Some(self.date_at(OFS_EGG_DATE))
    }

    fn set_egg_date(&mut self, v: Option<Date>) {
        self.put_date(OFS_EGG_DATE, v);
    }

    fn party_current_hp(&self) -> i32 {
        if !self.is_party() {
            return NOT_IN_PARTY;
        }
        read_u16(&self.data, OFS_CURRENT_HP) as i32
    }

    fn set_party_current_hp(&mut self, v: u16) {
        if self.is_party() {
            write_u16(&mut self.data, OFS_CURRENT_HP, v);
        }
    }

    fn party_stat(&self, stat: Stat) -> i32 {
        if !self.is_party() {
            return NOT_IN_PARTY;
        }
        read_u16(&self.data, OFS_PARTY_STATS + 2 * stat.index()) as i32
    }

    fn set_party_stat(&mut self, stat: Stat, v: u16) {
        if self.is_party() {
            write_u16(&mut self.data, OFS_PARTY_STATS + 2 * stat.index(), v);
        }
    }

    fn party_level(&self) -> i32 {
        if !self.is_party() {
            return NOT_IN_PARTY;
        }
        self.data[OFS_PARTY_LEVEL] as i32
    }

    fn set_party_level(&mut self, v: u8) {
        if self.is_party() {
            self.data[OFS_PARTY_LEVEL] = v;
        }
    }
}
