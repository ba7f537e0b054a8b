use std::fmt;
use std::sync::Arc;

use crate::detect;
use crate::lookup::{Lookup, StandardLookup};
use crate::pkx::Pkx;
use crate::sav::{self, Sav};

use super::error::{CoreError, CoreErrorCode};
use super::types::{
    Capabilities, CapabilityIssue, Game, IntegrityIssue, ItemEntry, PkmSummary, PlayTime,
    SlotLocation, Snapshot,
};

#[derive(Clone)]
pub struct Engine {
    lookup: Arc<dyn Lookup>,
}

pub struct Session {
    snapshot: Snapshot,
    capabilities: Capabilities,
    save: Box<dyn Sav>,
    lookup: Arc<dyn Lookup>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("snapshot", &self.snapshot)
            .field("save", &self.save)
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_lookup(Arc::new(StandardLookup))
    }

    pub fn with_lookup(lookup: Arc<dyn Lookup>) -> Self {
        Self { lookup }
    }

    pub fn open_bytes<B: AsRef<[u8]>>(
        &self,
        bytes: B,
        hint: Option<Game>,
    ) -> Result<Session, CoreError> {
        let bytes = bytes.as_ref();
        let save = match hint {
            Some(game) => detect::open_as(bytes, game).map_err(|e| {
                CoreError::new(e.code, format!("failed to open as {game}: {}", e.message))
            })?,
            None => detect::detect(bytes)?,
        };
        Ok(self.session(save))
    }

    pub fn new_save(&self, game: Game) -> Result<Session, CoreError> {
        Ok(self.session(detect::blank(game)?))
    }

    fn session(&self, save: Box<dyn Sav>) -> Session {
        tracing::debug!(game = %save.game(), "opened save");
        Session {
            snapshot: snapshot_of(save.as_ref()),
            capabilities: capabilities_for(save.game()),
            save,
            lookup: Arc::clone(&self.lookup),
        }
    }
}

impl Session {
    pub fn game(&self) -> Game {
        self.save.game()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn save(&self) -> &dyn Sav {
        self.save.as_ref()
    }

    pub fn lookup(&self) -> &dyn Lookup {
        self.lookup.as_ref()
    }

    pub fn summarize(&self, pk: &dyn Pkx, location: SlotLocation) -> PkmSummary {
        PkmSummary {
            location,
            species: pk.species(),
            species_name: self.lookup.species_name(pk.species()),
            nickname: pk.nickname(),
            level: pk.level(self.lookup.as_ref()),
            gender: pk.gender(),
            nature: pk.nature(),
            held_item: pk.held_item(),
            ot_name: pk.ot_name(),
            tid: pk.tid(),
            sid: pk.sid(),
            is_egg: pk.is_egg(),
            is_shiny: pk.is_shiny(),
            moves: pk.moves(),
            ivs: pk.ivs(),
            evs: pk.evs(),
            checksum_valid: pk.checksum_valid(),
        }
    }

    pub fn party_pkm(&self, slot: usize) -> Result<Box<dyn Pkx>, CoreError> {
        self.save.party_pkm(slot)
    }

    pub fn box_pkm(&self, box_id: usize, slot: usize) -> Result<Box<dyn Pkx>, CoreError> {
        self.save.box_pkm(box_id, slot)
    }

    pub fn party(&self) -> Vec<PkmSummary> {
        (0..self.save.party_count())
            .filter_map(|slot| {
                let pk = self.save.party_pkm(slot).ok()?;
                (!pk.is_empty()).then(|| self.summarize(pk.as_ref(), SlotLocation::Party { slot }))
            })
            .collect()
    }

    /// Occupied slots of one box.
    pub fn box_slots(&self, box_id: usize) -> Result<Vec<PkmSummary>, CoreError> {
        let mut out = Vec::new();
        for slot in 0..self.save.slots_per_box() {
            let pk = self.save.box_pkm(box_id, slot)?;
            if !pk.is_empty() {
                out.push(self.summarize(pk.as_ref(), SlotLocation::Box { box_id, slot }));
            }
        }
        Ok(out)
    }

    pub fn items(&self) -> Vec<ItemEntry> {
        let mut out = Vec::new();
        for (pouch, slots) in self.save.pouches() {
            for slot in 0..slots {
                if let Some(item) = self.save.item(pouch, slot) {
                    out.push(ItemEntry {
                        pouch,
                        slot,
                        id: item.id,
                        count: item.count,
                        name: self.lookup.item_name(item.id),
                    });
                }
            }
        }
        out
    }

    /// Checksum findings for occupied slots and container blocks. Never
    /// fatal; the session stays usable.
    pub fn integrity_issues(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();
        let mut check = |pk: &dyn Pkx, location: SlotLocation| {
            if !pk.is_empty() && !pk.checksum_valid() {
                issues.push(IntegrityIssue {
                    code: CoreErrorCode::ChecksumMismatch,
                    message: format!(
                        "{location}: stored checksum {:#06X}, computed {:#06X}",
                        pk.checksum(),
                        pk.calc_checksum()
                    ),
                });
            }
        };

        for slot in 0..self.save.party_count() {
            if let Ok(pk) = self.save.party_pkm(slot) {
                check(pk.as_ref(), SlotLocation::Party { slot });
            }
        }
        for box_id in 0..self.save.max_boxes() {
            for slot in 0..self.save.slots_per_box() {
                if let Ok(pk) = self.save.box_pkm(box_id, slot) {
                    check(pk.as_ref(), SlotLocation::Box { box_id, slot });
                }
            }
        }
        for id in self.save.block_checksum_mismatches() {
            issues.push(IntegrityIssue {
                code: CoreErrorCode::ChecksumMismatch,
                message: format!("save block {id}: footer checksum mismatch"),
            });
        }
        issues
    }

    pub fn set_ot_name(&mut self, name: &str) {
        self.save.set_ot_name(name);
        self.snapshot.ot_name = self.save.ot_name();
    }

    pub fn set_tid(&mut self, tid: u16) {
        self.save.set_tid(tid);
        self.snapshot.tid = tid;
    }

    pub fn set_sid(&mut self, sid: u16) {
        self.save.set_sid(sid);
        self.snapshot.sid = sid;
    }

    /// Optional-block setters are no-ops when the block is missing, so the
    /// snapshot is reread rather than assumed.
    pub fn set_money(&mut self, money: u32) {
        self.save.set_money(money);
        self.snapshot.money = self.save.money();
    }

    pub fn set_play_time(&mut self, time: PlayTime) {
        self.save.set_played_hours(time.hours);
        self.save.set_played_minutes(time.minutes);
        self.save.set_played_seconds(time.seconds);
        self.refresh_snapshot();
    }

    pub fn set_current_box(&mut self, box_id: u8) -> Result<(), CoreError> {
        if box_id as usize >= self.save.max_boxes() {
            return Err(CoreError::invalid_slot(format!(
                "box {box_id} out of range (max {})",
                self.save.max_boxes()
            )));
        }
        self.save.set_current_box(box_id);
        self.snapshot.current_box = self.save.current_box();
        Ok(())
    }

    /// Records without party data get it filled from the engine's lookup
    /// before they are stored.
    pub fn set_party_pkm(&mut self, pk: &dyn Pkx, slot: usize) -> Result<(), CoreError> {
        if sav::needs_party_data(pk) {
            let mut copy = pk.clone_box();
            copy.decrypt();
            let mut party = copy.to_party();
            party.update_party_data(self.lookup());
            self.save.set_party_pkm(party.as_ref(), slot)?;
        } else {
            self.save.set_party_pkm(pk, slot)?;
        }
        self.snapshot.party_count = self.save.party_count();
        Ok(())
    }

    pub fn set_box_pkm(
        &mut self,
        pk: &dyn Pkx,
        box_id: usize,
        slot: usize,
        apply_trade: bool,
    ) -> Result<(), CoreError> {
        self.save.set_box_pkm(pk, box_id, slot, apply_trade)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.save.to_bytes()
    }

    fn refresh_snapshot(&mut self) {
        self.snapshot = snapshot_of(self.save.as_ref());
    }
}

fn snapshot_of(save: &dyn Sav) -> Snapshot {
    Snapshot {
        game: save.game(),
        ot_name: save.ot_name(),
        tid: save.tid(),
        sid: save.sid(),
        gender: save.gender(),
        language: save.language(),
        version: save.version(),
        money: save.money(),
        badges: save.badges(),
        play_time: PlayTime {
            hours: save.played_hours(),
            minutes: save.played_minutes(),
            seconds: save.played_seconds(),
        },
        party_count: save.party_count(),
        max_boxes: save.max_boxes(),
        current_box: save.current_box(),
        unlocked_boxes: save.unlocked_boxes(),
        dex_seen: save.dex_seen(),
        dex_caught: save.dex_caught(),
    }
}

fn capabilities_for(game: Game) -> Capabilities {
    let mut issues = vec![
        CapabilityIssue::DexNotModelled,
        CapabilityIssue::MysteryGiftNotModelled,
    ];
    if game == Game::LegendsArceus {
        issues.push(CapabilityIssue::BagNotModelled);
    }
    Capabilities::editable(issues)
}
