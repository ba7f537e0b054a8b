//! Sun/Moon and Ultra Sun/Ultra Moon saves.
//!
//! Flat buffers addressed by per-game offsets, with a footer block table
//! carrying one CRC-16 per block.

use crate::bytes::{get_u8, get_u16, get_u32, put_u8, put_u16, put_u32};
use crate::core_api::{CoreError, CoreErrorCode, Game};
use crate::crypto;
use crate::gender::Gender;
use crate::language::Language;
use crate::pkx::{Layout, Pk7, Pkx};
use crate::text::{self, Charset};

use super::flat::FlatStore;
use super::{
    Item, Pouch, Sav, box_bytes, check_box_slot, check_generation, check_party_slot, party_bytes,
};

pub const SIZE_SM: usize = 0x6BE00;
pub const SIZE_USUM: usize = 0x6CC00;
pub const MAX_BOXES: usize = 32;

const OT_NAME_BYTES: usize = text::slot_bytes(13);
const BOX_NAME_BYTES: usize = text::slot_bytes(17);

/// Packed Gen 7 bag slot: id in bits 0-9, count in 10-19, free-space index
/// in 20-29, "new" flag in bit 30.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemWord {
    pub id: u16,
    pub count: u16,
    pub free_space: u16,
    pub is_new: bool,
}

impl ItemWord {
    /// Largest value a 10-bit id field holds.
    pub const MAX_ID: u16 = 0x3FF;
    /// Bag stack limit; counts above it are clamped on write.
    pub const MAX_COUNT: u16 = 999;

    pub fn from_raw(raw: u32) -> Self {
        use crate::bytes::{bits, flag};
        Self {
            id: bits(raw, 0, 10) as u16,
            count: bits(raw, 10, 10) as u16,
            free_space: bits(raw, 20, 10) as u16,
            is_new: flag(raw, 30),
        }
    }

    pub fn raw(&self) -> u32 {
        use crate::bytes::{with_bits, with_flag};
        let word = with_bits(0, 0, 10, self.id as u32);
        let word = with_bits(word, 10, 10, self.count as u32);
        let word = with_bits(word, 20, 10, self.free_space as u32);
        with_flag(word, 30, self.is_new)
    }
}

struct PouchTable {
    pouch: Pouch,
    offset: usize,
    slots: usize,
}

struct Offsets {
    trainer_card: usize,
    party: usize,
    misc: usize,
    pc_layout: usize,
    boxes: usize,
    play_time: usize,
    pouches: &'static [PouchTable],
    block_lengths: &'static [u32],
}

const fn pouch(pouch: Pouch, offset: usize, slots: usize) -> PouchTable {
    PouchTable {
        pouch,
        offset,
        slots,
    }
}

// The last block of each table is the footer itself.
const BLOCKS_SM: [u32; 37] = [
    0x00DE0, 0x0007C, 0x00014, 0x000C0, 0x0061C, 0x00E00, 0x00F78, 0x00228, 0x00104, 0x00200,
    0x00020, 0x00004, 0x00058, 0x005E6, 0x36600, 0x0572C, 0x00008, 0x01080, 0x01A08, 0x06408,
    0x06408, 0x03998, 0x00100, 0x00100, 0x10528, 0x00204, 0x00B60, 0x03F50, 0x00358, 0x00728,
    0x00400, 0x00718, 0x001FC, 0x00200, 0x00120, 0x001C8, 0x00200,
];

const BLOCKS_USUM: [u32; 39] = [
    0x00E28, 0x0007C, 0x00014, 0x000C0, 0x0061C, 0x00E00, 0x00F78, 0x00228, 0x0030C, 0x001FC,
    0x0004C, 0x00004, 0x00058, 0x005E6, 0x36600, 0x0572C, 0x00008, 0x01218, 0x01A08, 0x06408,
    0x06408, 0x03998, 0x00100, 0x00100, 0x10528, 0x00204, 0x00B60, 0x03F50, 0x00358, 0x00728,
    0x00400, 0x00718, 0x001FC, 0x00200, 0x00120, 0x001C8, 0x00200, 0x0039C, 0x00400,
];

static OFFSETS_SM: Offsets = Offsets {
    trainer_card: 0x1200,
    party: 0x1400,
    misc: 0x4000,
    pc_layout: 0x4800,
    boxes: 0x4E00,
    play_time: 0x40C00,
    pouches: &[
        pouch(Pouch::Items, 0x000, 430),
        pouch(Pouch::KeyItems, 0x6B8, 184),
        pouch(Pouch::TMs, 0x998, 108),
        pouch(Pouch::Medicine, 0xB48, 64),
        pouch(Pouch::Berries, 0xC48, 72),
        pouch(Pouch::ZCrystals, 0xD68, 30),
    ],
    block_lengths: &BLOCKS_SM,
};

static OFFSETS_USUM: Offsets = Offsets {
    trainer_card: 0x1400,
    party: 0x1600,
    misc: 0x4400,
    pc_layout: 0x4C00,
    boxes: 0x5200,
    play_time: 0x41000,
    pouches: &[
        pouch(Pouch::Items, 0x000, 427),
        pouch(Pouch::KeyItems, 0x6AC, 198),
        pouch(Pouch::TMs, 0x9C4, 108),
        pouch(Pouch::Medicine, 0xB74, 60),
        pouch(Pouch::Berries, 0xC64, 67),
        pouch(Pouch::ZCrystals, 0xD70, 35),
        pouch(Pouch::RotomPowers, 0xDFC, 11),
    ],
    block_lengths: &BLOCKS_USUM,
};

// Offsets inside the PC layout block.
const PC_WALLPAPERS: usize = 0x5C0;
const PC_UNLOCKED: usize = 0x5E1;
const PC_CURRENT_BOX: usize = 0x5E3;

#[derive(Debug, Clone)]
pub struct Sav7 {
    game: Game,
    store: FlatStore,
    ofs: &'static Offsets,
    /// Footer blocks whose CRC was stale in the loaded image.
    loaded_mismatches: Vec<u16>,
}

impl std::fmt::Debug for Offsets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Offsets")
            .field("trainer_card", &self.trainer_card)
            .field("boxes", &self.boxes)
            .finish_non_exhaustive()
    }
}

fn offsets_for(game: Game) -> Result<&'static Offsets, CoreError> {
    match game {
        Game::SunMoon => Ok(&OFFSETS_SM),
        Game::UltraSunUltraMoon => Ok(&OFFSETS_USUM),
        Game::LegendsArceus => Err(CoreError::new(
            CoreErrorCode::FormatMismatch,
            "Legends: Arceus is not a Gen 7 save",
        )),
    }
}

pub fn expected_size(game: Game) -> Option<usize> {
    match game {
        Game::SunMoon => Some(SIZE_SM),
        Game::UltraSunUltraMoon => Some(SIZE_USUM),
        Game::LegendsArceus => None,
    }
}

impl Sav7 {
    pub fn open(data: Vec<u8>, game: Game) -> Result<Self, CoreError> {
        let ofs = offsets_for(game)?;
        let need = expected_size(game).unwrap_or_default();
        if data.len() != need {
            return Err(CoreError::new(
                CoreErrorCode::TruncatedBuffer,
                format!("{game} save must be {need:#X} bytes, got {:#X}", data.len()),
            ));
        }
        let store = FlatStore::open(data, ofs.block_lengths.len())?;
        let mismatches = store.checksum_mismatches();
        if !mismatches.is_empty() {
            tracing::warn!(?mismatches, "footer checksum mismatch");
        }

        let mut sav = Self {
            game,
            store,
            ofs,
            loaded_mismatches: mismatches,
        };
        sav.crypt_box_data(true);
        Ok(sav)
    }

    /// Empty save with a valid footer and every box unlocked.
    pub fn blank(game: Game) -> Result<Self, CoreError> {
        let ofs = offsets_for(game)?;
        let len = expected_size(game).unwrap_or_default();
        let store = FlatStore::with_blocks(len, ofs.block_lengths)?;
        let mut sav = Self {
            game,
            store,
            ofs,
            loaded_mismatches: Vec::new(),
        };
        sav.set_unlocked_boxes(MAX_BOXES as u8);
        // Reopen so footer CRCs cover the encrypted boxes.
        Self::open(sav.to_bytes(), game)
    }

    fn u8_at(&self, offset: usize) -> u8 {
        get_u8(self.store.bytes(), offset).unwrap_or_default()
    }

    fn u16_at(&self, offset: usize) -> u16 {
        get_u16(self.store.bytes(), offset).unwrap_or_default()
    }

    fn u32_at(&self, offset: usize) -> u32 {
        get_u32(self.store.bytes(), offset).unwrap_or_default()
    }

    fn set_u8_at(&mut self, offset: usize, v: u8) {
        put_u8(self.store.bytes_mut(), offset, v);
    }

    fn set_u16_at(&mut self, offset: usize, v: u16) {
        put_u16(self.store.bytes_mut(), offset, v);
    }

    fn set_u32_at(&mut self, offset: usize, v: u32) {
        put_u32(self.store.bytes_mut(), offset, v);
    }

    fn pouch_table(&self, pouch: Pouch) -> Option<&'static PouchTable> {
        self.ofs.pouches.iter().find(|p| p.pouch == pouch)
    }

    pub fn item_word(&self, pouch: Pouch, slot: usize) -> Option<ItemWord> {
        let table = self.pouch_table(pouch)?;
        if slot >= table.slots {
            return None;
        }
        get_u32(self.store.bytes(), table.offset + 4 * slot).map(ItemWord::from_raw)
    }

    fn party_region(&self, slot: usize) -> Result<&[u8], CoreError> {
        self.store
            .slice(self.ofs.party + self.party_offset(slot), Pk7::PARTY_LENGTH)
    }

    fn box_region(&self, box_id: usize, slot: usize) -> Result<&[u8], CoreError> {
        self.store
            .slice(self.ofs.boxes + self.box_offset(box_id, slot), Pk7::BOX_LENGTH)
    }

    fn set_party_count(&mut self, count: usize) {
        self.set_u8_at(self.ofs.party + 6 * Pk7::PARTY_LENGTH, count as u8);
    }
}

impl Sav for Sav7 {
    fn game(&self) -> Game {
        self.game
    }

    fn clone_box(&self) -> Box<dyn Sav> {
        Box::new(self.clone())
    }

    fn ot_name(&self) -> String {
        let ofs = self.ofs.trainer_card + 0x38;
        self.store
            .slice(ofs, OT_NAME_BYTES)
            .map(|slot| text::decode(slot, Charset::Gen67))
            .unwrap_or_default()
    }

    fn set_ot_name(&mut self, name: &str) {
        let ofs = self.ofs.trainer_card + 0x38;
        if let Ok(slot) = self.store.slice_mut(ofs, OT_NAME_BYTES) {
            text::encode(slot, name, Charset::Gen67);
        }
    }

    fn tid(&self) -> u16 {
        self.u16_at(self.ofs.trainer_card)
    }

    fn set_tid(&mut self, v: u16) {
        self.set_u16_at(self.ofs.trainer_card, v);
    }

    fn sid(&self) -> u16 {
        self.u16_at(self.ofs.trainer_card + 2)
    }

    fn set_sid(&mut self, v: u16) {
        self.set_u16_at(self.ofs.trainer_card + 2, v);
    }

    fn gender(&self) -> Gender {
        Gender::from_raw(self.u8_at(self.ofs.trainer_card + 5))
    }

    fn set_gender(&mut self, v: Gender) {
        self.set_u8_at(self.ofs.trainer_card + 5, v.raw());
    }

    fn language(&self) -> Language {
        Language::from_raw(self.u8_at(self.ofs.trainer_card + 0x35))
    }

    fn set_language(&mut self, v: Language) {
        self.set_u8_at(self.ofs.trainer_card + 0x35, v.raw());
    }

    fn version(&self) -> u8 {
        self.u8_at(self.ofs.trainer_card + 4)
    }

    fn set_version(&mut self, v: u8) {
        self.set_u8_at(self.ofs.trainer_card + 4, v);
    }

    fn money(&self) -> u32 {
        self.u32_at(self.ofs.misc + 4)
    }

    fn set_money(&mut self, v: u32) {
        self.set_u32_at(self.ofs.misc + 4, v);
    }

    fn badges(&self) -> u8 {
        self.u8_at(self.ofs.misc + 8).count_ones() as u8
    }

    fn played_hours(&self) -> u16 {
        self.u16_at(self.ofs.play_time)
    }

    fn set_played_hours(&mut self, v: u16) {
        self.set_u16_at(self.ofs.play_time, v);
    }

    fn played_minutes(&self) -> u8 {
        self.u8_at(self.ofs.play_time + 2)
    }

    fn set_played_minutes(&mut self, v: u8) {
        self.set_u8_at(self.ofs.play_time + 2, v);
    }

    fn played_seconds(&self) -> u8 {
        self.u8_at(self.ofs.play_time + 3)
    }

    fn set_played_seconds(&mut self, v: u8) {
        self.set_u8_at(self.ofs.play_time + 3, v);
    }

    fn max_boxes(&self) -> usize {
        MAX_BOXES
    }

    fn box_offset(&self, box_id: usize, slot: usize) -> usize {
        Pk7::BOX_LENGTH * (box_id * self.slots_per_box() + slot)
    }

    fn party_offset(&self, slot: usize) -> usize {
        Pk7::PARTY_LENGTH * slot
    }

    fn party_count(&self) -> usize {
        (self.u8_at(self.ofs.party + 6 * Pk7::PARTY_LENGTH) as usize).min(self.max_party())
    }

    fn empty_pkm(&self) -> Box<dyn Pkx> {
        Box::new(Pk7::blank(Layout::Compact))
    }

    fn party_pkm(&self, slot: usize) -> Result<Box<dyn Pkx>, CoreError> {
        check_party_slot(self, slot)?;
        Ok(Box::new(Pk7::new(self.party_region(slot)?.to_vec())?))
    }

    fn box_pkm(&self, box_id: usize, slot: usize) -> Result<Box<dyn Pkx>, CoreError> {
        check_box_slot(self, box_id, slot)?;
        Ok(Box::new(Pk7::new(self.box_region(box_id, slot)?.to_vec())?))
    }

    fn set_party_pkm(&mut self, pk: &dyn Pkx, slot: usize) -> Result<(), CoreError> {
        check_party_slot(self, slot)?;
        check_generation(self, pk)?;
        let bytes = party_bytes(pk);
        let ofs = self.ofs.party + self.party_offset(slot);
        self.store.slice_mut(ofs, bytes.len())?.copy_from_slice(&bytes);
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
        let ofs = self.ofs.boxes + self.box_offset(box_id, slot);
        self.store.slice_mut(ofs, bytes.len())?.copy_from_slice(&bytes);
        Ok(())
    }

    fn box_name(&self, box_id: usize) -> String {
        if box_id >= self.max_boxes() {
            return String::new();
        }
        self.store
            .slice(self.ofs.pc_layout + box_id * BOX_NAME_BYTES, BOX_NAME_BYTES)
            .map(|slot| text::decode(slot, Charset::Gen67))
            .unwrap_or_default()
    }

    fn set_box_name(&mut self, box_id: usize, name: &str) {
        if box_id >= self.max_boxes() {
            return;
        }
        let ofs = self.ofs.pc_layout + box_id * BOX_NAME_BYTES;
        if let Ok(slot) = self.store.slice_mut(ofs, BOX_NAME_BYTES) {
            text::encode(slot, name, Charset::Gen67);
        }
    }

    fn box_wallpaper(&self, box_id: usize) -> u8 {
        if box_id >= self.max_boxes() {
            return 0;
        }
        self.u8_at(self.ofs.pc_layout + PC_WALLPAPERS + box_id)
    }

    fn set_box_wallpaper(&mut self, box_id: usize, v: u8) {
        if box_id < self.max_boxes() {
            self.set_u8_at(self.ofs.pc_layout + PC_WALLPAPERS + box_id, v);
        }
    }

    fn current_box(&self) -> u8 {
        self.u8_at(self.ofs.pc_layout + PC_CURRENT_BOX)
    }

    fn set_current_box(&mut self, v: u8) {
        self.set_u8_at(self.ofs.pc_layout + PC_CURRENT_BOX, v);
    }

    fn unlocked_boxes(&self) -> u8 {
        self.u8_at(self.ofs.pc_layout + PC_UNLOCKED)
    }

    fn set_unlocked_boxes(&mut self, v: u8) {
        self.set_u8_at(self.ofs.pc_layout + PC_UNLOCKED, v);
    }

    fn crypt_box_data(&mut self, crypted: bool) {
        let base = self.ofs.boxes;
        for box_id in 0..self.max_boxes() {
            for slot in 0..self.slots_per_box() {
                let ofs = base + self.box_offset(box_id, slot);
                let Ok(region) = self.store.slice_mut(ofs, Pk7::BOX_LENGTH) else {
                    continue;
                };
                if crypted {
                    crypto::decrypt::<Pk7>(region);
                } else {
                    crypto::encrypt::<Pk7>(region);
                }
            }
        }
    }

    fn pouches(&self) -> Vec<(Pouch, usize)> {
        self.ofs.pouches.iter().map(|p| (p.pouch, p.slots)).collect()
    }

    fn item(&self, pouch: Pouch, slot: usize) -> Option<Item> {
        let word = self.item_word(pouch, slot)?;
        let item = Item {
            id: word.id,
            count: word.count,
        };
        (!item.is_empty()).then_some(item)
    }

    fn set_item(&mut self, item: Item, pouch: Pouch, slot: usize) -> Result<(), CoreError> {
        let Some(table) = self.pouch_table(pouch) else {
            return Err(CoreError::invalid_slot(format!(
                "{pouch} pouch does not exist in {}",
                self.game
            )));
        };
        if slot >= table.slots {
            return Err(CoreError::invalid_slot(format!(
                "{pouch} slot {slot} out of range (max {})",
                table.slots
            )));
        }
        if item.id > ItemWord::MAX_ID {
            return Err(CoreError::invalid_slot(format!(
                "item id {} does not fit the {pouch} pouch (max {})",
                item.id,
                ItemWord::MAX_ID
            )));
        }
        let ofs = table.offset + 4 * slot;
        let word = if item.is_empty() {
            0
        } else {
            let old = ItemWord::from_raw(self.u32_at(ofs));
            ItemWord {
                id: item.id,
                count: item.count.min(ItemWord::MAX_COUNT),
                ..old
            }
            .raw()
        };
        self.set_u32_at(ofs, word);
        Ok(())
    }

    fn block_checksum_mismatches(&self) -> Vec<u16> {
        self.loaded_mismatches.clone()
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut copy = self.clone();
        copy.crypt_box_data(false);
        copy.store.to_bytes()
    }
}
