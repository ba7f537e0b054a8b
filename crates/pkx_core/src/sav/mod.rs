//! Save containers: one owned buffer per save, exposing trainer data,
//! storage addressing and the bag through [`Sav`].

pub mod block;
pub mod flat;
pub mod sav7;
pub mod sav_la;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, CoreErrorCode, Game};
use crate::gender::Gender;
use crate::language::Language;
use crate::lookup::{Lookup, StandardLookup};
use crate::pkx::{Generation, Pkx, TrainerInfo};

pub use sav_la::SavLa;
pub use sav7::Sav7;

pub const SLOTS_PER_BOX: usize = 30;
pub const MAX_PARTY: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pouch {
    Items,
    KeyItems,
    TMs,
    Medicine,
    Berries,
    ZCrystals,
    RotomPowers,
}

impl Pouch {
    pub fn as_str(self) -> &'static str {
        match self {
            Pouch::Items => "Items",
            Pouch::KeyItems => "Key Items",
            Pouch::TMs => "TMs",
            Pouch::Medicine => "Medicine",
            Pouch::Berries => "Berries",
            Pouch::ZCrystals => "Z-Crystals",
            Pouch::RotomPowers => "Rotom Powers",
        }
    }
}

impl fmt::Display for Pouch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bag slot. An id or count of zero is an empty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u16,
    pub count: u16,
}

impl Item {
    pub fn is_empty(&self) -> bool {
        self.id == 0 || self.count == 0
    }
}

pub trait Sav: fmt::Debug + Send + Sync {
    fn game(&self) -> Game;
    fn clone_box(&self) -> Box<dyn Sav>;

    fn generation(&self) -> Generation {
        self.game().generation()
    }

    fn ot_name(&self) -> String;
    fn set_ot_name(&mut self, name: &str);
    fn tid(&self) -> u16;
    fn set_tid(&mut self, v: u16);
    fn sid(&self) -> u16;
    fn set_sid(&mut self, v: u16);
    fn gender(&self) -> Gender;
    fn set_gender(&mut self, v: Gender);
    fn language(&self) -> Language;
    fn set_language(&mut self, v: Language);
    fn version(&self) -> u8;
    fn set_version(&mut self, v: u8);
    fn money(&self) -> u32;
    fn set_money(&mut self, v: u32);
    fn badges(&self) -> u8;
    fn played_hours(&self) -> u16;
    fn set_played_hours(&mut self, v: u16);
    fn played_minutes(&self) -> u8;
    fn set_played_minutes(&mut self, v: u8);
    fn played_seconds(&self) -> u8;
    fn set_played_seconds(&mut self, v: u8);

    fn trainer_info(&self) -> TrainerInfo {
        TrainerInfo {
            name: self.ot_name(),
            tid: self.tid(),
            sid: self.sid(),
            gender: self.gender(),
        }
    }

    fn max_boxes(&self) -> usize;

    fn slots_per_box(&self) -> usize {
        SLOTS_PER_BOX
    }

    fn max_party(&self) -> usize {
        MAX_PARTY
    }

    /// Byte offset of a box slot inside the region that holds boxes.
    fn box_offset(&self, box_id: usize, slot: usize) -> usize;
    /// Byte offset of a party slot inside the region that holds the party.
    fn party_offset(&self, slot: usize) -> usize;
    fn party_count(&self) -> usize;

    fn empty_pkm(&self) -> Box<dyn Pkx>;
    fn party_pkm(&self, slot: usize) -> Result<Box<dyn Pkx>, CoreError>;
    fn box_pkm(&self, box_id: usize, slot: usize) -> Result<Box<dyn Pkx>, CoreError>;
    fn set_party_pkm(&mut self, pk: &dyn Pkx, slot: usize) -> Result<(), CoreError>;
    /// Stores `pk` decrypted in compact layout, running [`crate::pkx::trade`]
    /// first when `apply_trade` is set.
    fn set_box_pkm(
        &mut self,
        pk: &dyn Pkx,
        box_id: usize,
        slot: usize,
        apply_trade: bool,
    ) -> Result<(), CoreError>;

    fn box_name(&self, box_id: usize) -> String;
    fn set_box_name(&mut self, box_id: usize, name: &str);
    fn box_wallpaper(&self, box_id: usize) -> u8;
    fn set_box_wallpaper(&mut self, box_id: usize, v: u8);
    fn current_box(&self) -> u8;
    fn set_current_box(&mut self, v: u8);
    fn unlocked_boxes(&self) -> u8;
    fn set_unlocked_boxes(&mut self, v: u8);

    /// `true` decrypts every box slot (data is currently encrypted); `false`
    /// encrypts them.
    fn crypt_box_data(&mut self, crypted: bool);

    /// Modelled pouches with their slot capacity.
    fn pouches(&self) -> Vec<(Pouch, usize)>;
    fn item(&self, pouch: Pouch, slot: usize) -> Option<Item>;
    fn set_item(&mut self, item: Item, pouch: Pouch, slot: usize) -> Result<(), CoreError>;

    fn valid_items(&self, lookup: &dyn Lookup) -> BTreeMap<Pouch, Vec<u16>> {
        self.pouches()
            .into_iter()
            .map(|(pouch, _)| (pouch, lookup.valid_items(self.game(), pouch)))
            .collect()
    }

    fn dex_seen(&self) -> u16 {
        0
    }

    fn dex_caught(&self) -> u16 {
        0
    }

    fn register_dex(&mut self, _pk: &dyn Pkx) {}

    fn mystery_gift(&self, _index: usize) -> Option<Vec<u8>> {
        None
    }

    fn set_mystery_gift(&mut self, _index: usize, _data: &[u8]) {}

    /// Ids of container-level blocks whose stored checksum was stale in the
    /// loaded image.
    fn block_checksum_mismatches(&self) -> Vec<u16> {
        Vec::new()
    }

    /// Serialised image. Boxes are encrypted and checksums refreshed in the
    /// output only.
    fn to_bytes(&self) -> Vec<u8>;
}

pub(crate) fn check_box_slot(sav: &dyn Sav, box_id: usize, slot: usize) -> Result<(), CoreError> {
    if box_id >= sav.max_boxes() || slot >= sav.slots_per_box() {
        return Err(CoreError::invalid_slot(format!(
            "box {box_id} slot {slot} out of range ({} boxes x {} slots)",
            sav.max_boxes(),
            sav.slots_per_box()
        )));
    }
    Ok(())
}

pub(crate) fn check_party_slot(sav: &dyn Sav, slot: usize) -> Result<(), CoreError> {
    if slot >= sav.max_party() {
        return Err(CoreError::invalid_slot(format!(
            "party slot {slot} out of range (max {})",
            sav.max_party()
        )));
    }
    Ok(())
}

pub(crate) fn check_generation(sav: &dyn Sav, pk: &dyn Pkx) -> Result<(), CoreError> {
    if pk.generation() != sav.generation() {
        return Err(CoreError::new(
            CoreErrorCode::FormatMismatch,
            format!(
                "{} record cannot be stored in a {} save",
                pk.extension(),
                sav.game()
            ),
        ));
    }
    Ok(())
}

/// Decrypted compact bytes for a box slot.
pub(crate) fn box_bytes(sav: &dyn Sav, pk: &dyn Pkx, apply_trade: bool) -> Vec<u8> {
    let mut copy = pk.clone_box();
    copy.decrypt();
    if apply_trade {
        crate::pkx::trade(copy.as_mut(), &sav.trainer_info());
    }
    let mut stored = copy.to_box();
    stored.refresh_checksum();
    stored.raw().to_vec()
}

/// Whether `pk` reaches a party slot without usable party data.
pub fn needs_party_data(pk: &dyn Pkx) -> bool {
    !pk.is_empty() && (!pk.is_party() || pk.party_level() <= 0)
}

/// Encrypted extended bytes for a party slot. Records without party data
/// get it computed with [`StandardLookup`].
pub(crate) fn party_bytes(pk: &dyn Pkx) -> Vec<u8> {
    let mut copy = pk.clone_box();
    copy.decrypt();
    let mut party = copy.to_party();
    if needs_party_data(copy.as_ref()) {
        party.update_party_data(&StandardLookup);
    }
    party.encrypted_bytes()
}
