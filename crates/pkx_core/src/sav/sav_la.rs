//! Legends: Arceus saves, decoded from their key-block stream.
//!
//! The block stream is what remains once the outer file hash layer has been
//! removed by the caller.

use crate::bytes::{get_u8, get_u16, get_u32, put_u8, put_u16, put_u32};
use crate::core_api::{CoreError, Game};
use crate::crypto;
use crate::gender::Gender;
use crate::language::Language;
use crate::pkx::{Layout, Pa8, Pkx};
use crate::text::{self, Charset};

use super::block::{Block, BlockType, KeyedStore};
use super::{
    Item, Pouch, Sav, box_bytes, check_box_slot, check_generation, check_party_slot, party_bytes,
};

pub mod keys {
    pub const BOX: u32 = 0x47E1_CEAB;
    pub const PARTY: u32 = 0x2985_FE5D;
    pub const STATUS: u32 = 0xF25C_070E;
    pub const ZUKAN: u32 = 0x0216_8706;
    pub const ITEMS: u32 = 0x9FE2_790A;
    pub const BOX_LAYOUT: u32 = 0x1972_2C89;
    pub const CURRENT_BOX: u32 = 0x017C_3CBB;
    pub const BOXES_UNLOCKED: u32 = 0x7182_5204;
    pub const BOX_WALLPAPERS: u32 = 0x2EB1_B190;
    pub const MONEY: u32 = 0x3279_D927;
    pub const PLAY_TIME: u32 = 0xC4FA_7C8C;

    pub const MANDATORY: [u32; 3] = [BOX, PARTY, STATUS];
    pub const OPTIONAL: [u32; 6] = [
        BOX_LAYOUT,
        CURRENT_BOX,
        BOXES_UNLOCKED,
        BOX_WALLPAPERS,
        MONEY,
        PLAY_TIME,
    ];
}

pub const MAX_BOXES: usize = 32;

const BOX_NAME_BYTES: usize = text::slot_bytes(17);
const OT_NAME_BYTES: usize = text::slot_bytes(13);
const STATUS_OT_NAME: usize = 0x20;
const STATUS_LENGTH: usize = 0x80;
const PARTY_COUNT: usize = 6 * Pa8::PARTY_LENGTH;
const PARTY_BLOCK_LENGTH: usize = PARTY_COUNT + 8;
const BOX_BLOCK_LENGTH: usize = MAX_BOXES * super::SLOTS_PER_BOX * Pa8::BOX_LENGTH;

#[derive(Debug, Clone)]
pub struct SavLa {
    store: KeyedStore,
}

/// True when `bytes` parses cleanly as a block stream holding every
/// mandatory key.
pub fn is_block_stream(bytes: &[u8]) -> bool {
    KeyedStore::parse(bytes)
        .map(|store| keys::MANDATORY.iter().all(|&key| store.contains(key)))
        .unwrap_or(false)
}

impl SavLa {
    pub fn open(bytes: &[u8]) -> Result<Self, CoreError> {
        Self::from_store(KeyedStore::parse(bytes)?)
    }

    pub fn from_store(store: KeyedStore) -> Result<Self, CoreError> {
        for (key, need) in [
            (keys::BOX, BOX_BLOCK_LENGTH),
            (keys::PARTY, PARTY_COUNT + 1),
            (keys::STATUS, STATUS_OT_NAME + OT_NAME_BYTES),
        ] {
            let len = store.block(key)?.data().len();
            if len < need {
                return Err(CoreError::truncated(&format!("block {key:#010X}"), len, need));
            }
        }
        for key in keys::OPTIONAL {
            if !store.contains(key) {
                tracing::warn!("optional block {key:#010X} missing");
            }
        }

        let mut sav = Self { store };
        sav.crypt_box_data(true);
        Ok(sav)
    }

    pub fn blank() -> Self {
        let mut sav = Self {
            store: KeyedStore::from_blocks([
                Block::object(keys::BOX, vec![0; BOX_BLOCK_LENGTH]),
                Block::object(keys::PARTY, vec![0; PARTY_BLOCK_LENGTH]),
                Block::object(keys::STATUS, vec![0; STATUS_LENGTH]),
                Block::object(keys::BOX_LAYOUT, vec![0; MAX_BOXES * BOX_NAME_BYTES]),
                Block::array(keys::BOX_WALLPAPERS, BlockType::Byte, vec![0; MAX_BOXES]),
                Block::primitive(keys::CURRENT_BOX, BlockType::Byte),
                Block::primitive(keys::BOXES_UNLOCKED, BlockType::Byte),
                Block::primitive(keys::MONEY, BlockType::UInt32),
                Block::object(keys::PLAY_TIME, vec![0; 8]),
            ]),
        };
        sav.set_unlocked_boxes(MAX_BOXES as u8);
        sav
    }

    pub fn store(&self) -> &KeyedStore {
        &self.store
    }

    fn data(&self, key: u32) -> &[u8] {
        self.store.block(key).map(Block::data).unwrap_or_default()
    }

    /// Runs `f` on the block's payload; missing optional blocks are skipped.
    fn with_data(&mut self, key: u32, f: impl FnOnce(&mut [u8])) {
        match self.store.block_mut(key) {
            Ok(block) => f(block.data_mut()),
            Err(err) => tracing::debug!(%err, "write to missing block ignored"),
        }
    }

    fn set_party_count(&mut self, count: usize) {
        self.with_data(keys::PARTY, |d| {
            put_u8(d, PARTY_COUNT, count as u8);
        });
    }
}

impl Sav for SavLa {
    fn game(&self) -> Game {
        Game::LegendsArceus
    }

    fn clone_box(&self) -> Box<dyn Sav> {
        Box::new(self.clone())
    }

    fn ot_name(&self) -> String {
        self.data(keys::STATUS)
            .get(STATUS_OT_NAME..STATUS_OT_NAME + OT_NAME_BYTES)
            .map(|slot| text::decode(slot, Charset::Unicode))
            .unwrap_or_default()
    }

    fn set_ot_name(&mut self, name: &str) {
        self.with_data(keys::STATUS, |d| {
            if let Some(slot) = d.get_mut(STATUS_OT_NAME..STATUS_OT_NAME + OT_NAME_BYTES) {
                text::encode(slot, name, Charset::Unicode);
            }
        });
    }

    fn tid(&self) -> u16 {
        get_u16(self.data(keys::STATUS), 0x10).unwrap_or_default()
    }

    fn set_tid(&mut self, v: u16) {
        self.with_data(keys::STATUS, |d| {
            put_u16(d, 0x10, v);
        });
    }

    fn sid(&self) -> u16 {
        get_u16(self.data(keys::STATUS), 0x12).unwrap_or_default()
    }

    fn set_sid(&mut self, v: u16) {
        self.with_data(keys::STATUS, |d| {
            put_u16(d, 0x12, v);
        });
    }

    fn gender(&self) -> Gender {
        Gender::from_raw(get_u8(self.data(keys::STATUS), 0x15).unwrap_or_default())
    }

    fn set_gender(&mut self, v: Gender) {
        self.with_data(keys::STATUS, |d| {
            put_u8(d, 0x15, v.raw());
        });
    }

    fn language(&self) -> Language {
        Language::from_raw(get_u8(self.data(keys::STATUS), 0x17).unwrap_or_default())
    }

    fn set_language(&mut self, v: Language) {
        self.with_data(keys::STATUS, |d| {
            put_u8(d, 0x17, v.raw());
        });
    }

    fn version(&self) -> u8 {
        get_u8(self.data(keys::STATUS), 0x14).unwrap_or_default()
    }

    fn set_version(&mut self, v: u8) {
        self.with_data(keys::STATUS, |d| {
            put_u8(d, 0x14, v);
        });
    }

    fn money(&self) -> u32 {
        get_u32(self.data(keys::MONEY), 0).unwrap_or_default()
    }

    fn set_money(&mut self, v: u32) {
        self.with_data(keys::MONEY, |d| {
            put_u32(d, 0, v);
        });
    }

    fn badges(&self) -> u8 {
        0
    }

    fn played_hours(&self) -> u16 {
        get_u16(self.data(keys::PLAY_TIME), 0).unwrap_or_default()
    }

    fn set_played_hours(&mut self, v: u16) {
        self.with_data(keys::PLAY_TIME, |d| {
            put_u16(d, 0, v);
        });
    }

    fn played_minutes(&self) -> u8 {
        get_u8(self.data(keys::PLAY_TIME), 2).unwrap_or_default()
    }

    fn set_played_minutes(&mut self, v: u8) {
        self.with_data(keys::PLAY_TIME, |d| {
            put_u8(d, 2, v);
        });
    }

    fn played_seconds(&self) -> u8 {
        get_u8(self.data(keys::PLAY_TIME), 3).unwrap_or_default()
    }

    fn set_played_seconds(&mut self, v: u8) {
        self.with_data(keys::PLAY_TIME, |d| {
            put_u8(d, 3, v);
        });
    }

    fn max_boxes(&self) -> usize {
        MAX_BOXES
    }

    fn box_offset(&self, box_id: usize, slot: usize) -> usize {
        Pa8::BOX_LENGTH * (box_id * self.slots_per_box() + slot)
    }

    fn party_offset(&self, slot: usize) -> usize {
        Pa8::PARTY_LENGTH * slot
    }

    fn party_count(&self) -> usize {
        (get_u8(self.data(keys::PARTY), PARTY_COUNT).unwrap_or_default() as usize)
            .min(self.max_party())
    }

    fn empty_pkm(&self) -> Box<dyn Pkx> {
        Box::new(Pa8::blank(Layout::Compact))
    }

    fn party_pkm(&self, slot: usize) -> Result<Box<dyn Pkx>, CoreError> {
        check_party_slot(self, slot)?;
        let ofs = self.party_offset(slot);
        let party = self.store.block(keys::PARTY)?.data();
        let bytes = party
            .get(ofs..ofs + Pa8::PARTY_LENGTH)
            .ok_or_else(|| CoreError::truncated("party block", party.len(), ofs + Pa8::PARTY_LENGTH))?;
        Ok(Box::new(Pa8::new(bytes.to_vec())?))
    }

    fn box_pkm(&self, box_id: usize, slot: usize) -> Result<Box<dyn Pkx>, CoreError> {
        check_box_slot(self, box_id, slot)?;
        let ofs = self.box_offset(box_id, slot);
        let boxes = self.store.block(keys::BOX)?.data();
        let bytes = boxes
            .get(ofs..ofs + Pa8::BOX_LENGTH)
            .ok_or_else(|| CoreError::truncated("box block", boxes.len(), ofs + Pa8::BOX_LENGTH))?;
        Ok(Box::new(Pa8::new(bytes.to_vec())?))
    }

    fn set_party_pkm(&mut self, pk: &dyn Pkx, slot: usize) -> Result<(), CoreError> {
        check_party_slot(self, slot)?;
        check_generation(self, pk)?;
        let bytes = party_bytes(pk);
        let ofs = self.party_offset(slot);
        let party = self.store.block_mut(keys::PARTY)?.data_mut();
        let total = party.len();
        party
            .get_mut(ofs..ofs + bytes.len())
            .ok_or_else(|| CoreError::truncated("party block", total, ofs + bytes.len()))?
            .copy_from_slice(&bytes);
        if !pk.is_empty() && slot >= self.party_count() {
            self.set_party_count(slot + 1);
        }
        Ok(())
    }

    fn set_box_pkm(
        &mut self,
        pk: &dyn Pkx,
        box_id: usize,
        slot: usize,
        apply_trade: bool,
    ) -> Result<(), CoreError> {
        check_box_slot(self, box_id, slot)?;
        check_generation(self, pk)?;
        let bytes = box_bytes(self, pk, apply_trade);
        let ofs = self.box_offset(box_id, slot);
        let boxes = self.store.block_mut(keys::BOX)?.data_mut();
        let total = boxes.len();
        boxes
            .get_mut(ofs..ofs + bytes.len())
            .ok_or_else(|| CoreError::truncated("box block", total, ofs + bytes.len()))?
            .copy_from_slice(&bytes);
        Ok(())
    }

    fn box_name(&self, box_id: usize) -> String {
        let ofs = box_id * BOX_NAME_BYTES;
        self.data(keys::BOX_LAYOUT)
            .get(ofs..ofs + BOX_NAME_BYTES)
            .filter(|_| box_id < self.max_boxes())
            .map(|slot| text::decode(slot, Charset::Unicode))
            .unwrap_or_default()
    }

    fn set_box_name(&mut self, box_id: usize, name: &str) {
        if box_id >= self.max_boxes() {
            return;
        }
        let ofs = box_id * BOX_NAME_BYTES;
        self.with_data(keys::BOX_LAYOUT, |d| {
            if let Some(slot) = d.get_mut(ofs..ofs + BOX_NAME_BYTES) {
                text::encode(slot, name, Charset::Unicode);
            }
        });
    }

    fn box_wallpaper(&self, box_id: usize) -> u8 {
        get_u8(self.data(keys::BOX_WALLPAPERS), box_id).unwrap_or_default()
    }

    fn set_box_wallpaper(&mut self, box_id: usize, v: u8) {
        self.with_data(keys::BOX_WALLPAPERS, |d| {
            put_u8(d, box_id, v);
        });
    }

    fn current_box(&self) -> u8 {
        get_u8(self.data(keys::CURRENT_BOX), 0).unwrap_or_default()
    }

    fn set_current_box(&mut self, v: u8) {
        self.with_data(keys::CURRENT_BOX, |d| {
            put_u8(d, 0, v);
        });
    }

    fn unlocked_boxes(&self) -> u8 {
        get_u8(self.data(keys::BOXES_UNLOCKED), 0).unwrap_or(MAX_BOXES as u8)
    }

    fn set_unlocked_boxes(&mut self, v: u8) {
        self.with_data(keys::BOXES_UNLOCKED, |d| {
            put_u8(d, 0, v);
        });
    }

    fn crypt_box_data(&mut self, crypted: bool) {
        let slots = self.max_boxes() * self.slots_per_box();
        self.with_data(keys::BOX, |boxes| {
            for record in boxes.chunks_exact_mut(Pa8::BOX_LENGTH).take(slots) {
                if crypted {
                    crypto::decrypt::<Pa8>(record);
                } else {
                    crypto::encrypt::<Pa8>(record);
                }
            }
        });
    }

    fn pouches(&self) -> Vec<(Pouch, usize)> {
        Vec::new()
    }

    fn item(&self, _pouch: Pouch, _slot: usize) -> Option<Item> {
        None
    }

    fn set_item(&mut self, _item: Item, _pouch: Pouch, _slot: usize) -> Result<(), CoreError> {
        Ok(())
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut copy = self.clone();
        copy.crypt_box_data(false);
        copy.store.encode()
    }
}
