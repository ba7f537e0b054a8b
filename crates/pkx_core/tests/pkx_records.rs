use pkx_core::core_api::CoreErrorCode;
use pkx_core::crypto::{self, BLOCK_POSITION, BLOCK_POSITION_INVERT, CryptLayout};
use pkx_core::gender::Gender;
use pkx_core::language::Language;
use pkx_core::lookup::StandardLookup;
use pkx_core::pkx::{self, Date, Generation, Handler, Layout, NOT_IN_PARTY, Pa8, Pk7, Pkx, TrainerInfo};
use pkx_core::stat::{Stat, Type, pack_ivs, unpack_ivs};

fn sample_pk7(layout: Layout) -> Pk7 {
    let mut pk = Pk7::blank(layout);
    pk.set_encryption_constant(0x2C6F_1A3B);
    pk.set_species(25);
    pk.set_tid(12345);
    pk.set_sid(54321);
    pk.set_experience(1000);
    pk.set_pid(0x1234_5678);
    pk.set_nature(3);
    pk.set_nickname("Pika");
    pk.set_ot_name("Ash");
    pk.set_ivs([31, 0, 31, 0, 31, 0]);
    pk.set_move_id(0, 84);
    pk.set_move_id(1, 45);
    pk.set_language(Language::English);
    pk
}

fn sample_pa8(layout: Layout) -> Pa8 {
    let mut pk = Pa8::blank(layout);
    pk.set_encryption_constant(0x9A3C_55E1);
    pk.set_species(722);
    pk.set_tid(1);
    pk.set_sid(2);
    pk.set_experience(8000);
    pk.set_pid(0xCAFE_BABE);
    pk.set_nature(7);
    pk.set_nickname("Rowlet");
    pk.set_ot_name("Rei");
    pk.set_ivs([31; 6]);
    pk.set_move_id(0, 33);
    pk.set_language(Language::English);
    pk
}

#[test]
fn iv_vector_packs_to_known_word() {
    assert_eq!(pack_ivs([31, 0, 31, 0, 31, 0]), 32_537_631);

    let pk = sample_pk7(Layout::Compact);
    assert_eq!(pk.iv32() & 0x3FFF_FFFF, 32_537_631);
    assert_eq!(pk.iv(Stat::Defense), 31);
    assert_eq!(pk.iv(Stat::Speed), 0);
}

#[test]
fn every_iv_value_survives_packing_per_stat() {
    for stat in Stat::ALL {
        for value in 0..32u8 {
            let mut ivs = [0u8; 6];
            ivs[stat.index()] = value;
            assert_eq!(unpack_ivs(pack_ivs(ivs)), ivs, "{stat} = {value}");
        }
    }
}

#[test]
fn iv_setters_preserve_egg_and_nickname_flags() {
    let mut pk = Pk7::blank(Layout::Compact);
    pk.set_egg(true);
    pk.set_nicknamed(true);
    pk.set_ivs([1, 2, 3, 4, 5, 6]);
    pk.set_iv(Stat::Hp, 30);
    assert!(pk.is_egg());
    assert!(pk.is_nicknamed());
    assert_eq!(pk.ivs(), [30, 2, 3, 4, 5, 6]);
}

#[test]
fn shiny_values_are_deterministic() {
    let mut pk = Pk7::blank(Layout::Compact);
    pk.set_pid(0x1234_5678);
    pk.set_tid(1);
    pk.set_sid(2);
    assert_eq!(pk.psv(), 1092);
    assert_eq!(pk.tsv(), 0);
    assert!(!pk.is_shiny());

    pk.set_tid(0x1234);
    pk.set_sid(0x5678);
    assert!(pk.is_shiny());
    assert_eq!(pk.shiny_xor(), 0);
}

#[test]
fn pk7_encrypt_round_trip_restores_every_field() {
    for layout in [Layout::Compact, Layout::Extended] {
        let pk = sample_pk7(layout);
        let encrypted = pk.encrypted_bytes();
        assert_ne!(encrypted, pk.raw());
        assert_eq!(&encrypted[..4], &pk.raw()[..4]);

        let back = Pk7::new(encrypted).expect("decrypt pk7");
        assert_eq!(back.layout(), layout);
        assert_eq!(back.species(), 25);
        assert_eq!(back.nickname(), "Pika");
        assert_eq!(back.ot_name(), "Ash");
        assert_eq!(back.moves(), [84, 45, 0, 0]);
        assert!(back.checksum_valid());
        assert_eq!(&back.raw()[8..], &pk.raw()[8..]);
    }
}

#[test]
fn pa8_encrypt_round_trip_restores_every_field() {
    for layout in [Layout::Compact, Layout::Extended] {
        let mut pk = sample_pa8(layout);
        pk.set_party_stat(Stat::Attack, 123);
        let mut encrypted = pk.clone();
        encrypted.encrypt();
        assert!(encrypted.is_encrypted());

        let back = pkx::from_bytes(encrypted.raw()).expect("decrypt pa8");
        assert_eq!(back.generation(), Generation::Eight);
        assert_eq!(back.nickname(), "Rowlet");
        assert_eq!(back.ivs(), [31; 6]);
        assert_eq!(back.party_stat(Stat::Attack), pk.party_stat(Stat::Attack));
        assert!(back.checksum_valid());
    }
}

#[test]
fn decrypt_is_a_no_op_on_plain_records() {
    let pk = sample_pk7(Layout::Compact);
    let mut copy = pk.clone();
    copy.decrypt();
    assert_eq!(copy, pk);
    assert!(!copy.is_encrypted());
}

#[test]
fn checksum_refresh_is_idempotent() {
    let mut pk = sample_pa8(Layout::Compact);
    assert!(!pk.checksum_valid());
    pk.refresh_checksum();
    let first = pk.checksum();
    pk.refresh_checksum();
    assert_eq!(pk.checksum(), first);
    assert!(pk.checksum_valid());

    pk.set_held_item(1);
    assert!(!pk.checksum_valid());
}

#[test]
fn shuffle_rows_alias_past_twenty_four() {
    for sv in 24..32 {
        assert_eq!(BLOCK_POSITION[sv], BLOCK_POSITION[sv - 24]);
        assert_eq!(BLOCK_POSITION_INVERT[sv], BLOCK_POSITION_INVERT[sv - 24]);
    }
}

#[test]
fn aliased_shuffle_value_still_round_trips() {
    let mut pk = sample_pk7(Layout::Compact);
    // (ec >> 13) & 31 == 29
    pk.set_encryption_constant(29 << 13);
    let back = Pk7::new(pk.encrypted_bytes()).expect("decrypt");
    assert_eq!(back.nickname(), "Pika");
    assert_eq!(back.experience(), 1000);
}

#[test]
fn party_fields_are_sentinels_on_compact_records() {
    let mut pk = sample_pk7(Layout::Compact);
    pk.set_party_level(50);
    pk.set_party_stat(Stat::Speed, 99);
    pk.set_party_current_hp(10);
    assert_eq!(pk.party_level(), NOT_IN_PARTY);
    assert_eq!(pk.party_stat(Stat::Speed), NOT_IN_PARTY);
    assert_eq!(pk.party_current_hp(), NOT_IN_PARTY);

    let mut party = pk.to_party();
    assert!(party.is_party());
    assert_eq!(party.party_level(), 0);
    party.set_party_stat(Stat::Speed, 99);
    party.set_party_current_hp(10);
    assert_eq!(party.party_stat(Stat::Speed), 99);
    assert_eq!(party.party_current_hp(), 10);

    let boxed = party.to_box();
    assert_eq!(boxed.raw().len(), Pk7::BOX_LENGTH);
    assert_eq!(boxed.party_stat(Stat::Speed), NOT_IN_PARTY);
}

#[test]
fn pa8_current_hp_is_party_only() {
    let mut pk = sample_pa8(Layout::Compact);
    pk.set_party_current_hp(40);
    assert_eq!(pk.party_current_hp(), NOT_IN_PARTY);
    assert_eq!(pk.raw()[0x92], 0);
}

#[test]
fn level_follows_experience_on_compact_records() {
    let lookup = StandardLookup;
    let mut pk = sample_pk7(Layout::Compact);
    assert_eq!(pk.level(&lookup), 10);
    pk.set_experience(999);
    assert_eq!(pk.level(&lookup), 9);
    pk.set_experience(0);
    assert_eq!(pk.level(&lookup), 1);
    pk.set_experience(u32::MAX);
    assert_eq!(pk.level(&lookup), 100);

    pk.set_level(&lookup, 50);
    assert_eq!(pk.experience(), 125_000);
    assert_eq!(pk.party_level(), NOT_IN_PARTY);
}

#[test]
fn party_records_report_stored_level() {
    let lookup = StandardLookup;
    let mut pk = sample_pa8(Layout::Extended);
    pk.set_level(&lookup, 36);
    assert_eq!(pk.party_level(), 36);
    pk.set_experience(0);
    assert_eq!(pk.level(&lookup), 36);
}

#[test]
fn hidden_power_type_uses_low_iv_bits() {
    let mut pk = Pk7::blank(Layout::Compact);
    pk.set_ivs([31; 6]);
    assert_eq!(pk.hidden_power_type(), Type::Dark);
    pk.set_ivs([30; 6]);
    assert_eq!(pk.hidden_power_type(), Type::Fighting);
}

#[test]
fn setters_reject_or_mask_out_of_range_values() {
    let mut pk = sample_pa8(Layout::Compact);
    pk.set_nature(25);
    assert_eq!(pk.nature(), 7);
    assert_eq!(pk.stat_nature(), 7);
    pk.set_nature(12);
    assert_eq!(pk.stat_nature(), 12);

    pk.set_ability_number(0xFC);
    assert_eq!(pk.ability_number(), 4);
    pk.set_met_level(200);
    assert_eq!(pk.met_level(), 200 & 0x7F);
    pk.set_ot_gender(Gender::Female);
    assert_eq!(pk.met_level(), 200 & 0x7F);
    assert_eq!(pk.ot_gender(), Gender::Female);

    pk.set_move_id(4, 99);
    assert_eq!(pk.move_id(4), 0);
    assert_eq!(pk.contest(6), 0);
}

#[test]
fn gender_form_and_fateful_share_a_byte() {
    let mut pk = Pk7::blank(Layout::Compact);
    pk.set_fateful_encounter(true);
    pk.set_gender(Gender::Genderless);
    pk.set_form(5);
    assert!(pk.fateful_encounter());
    assert_eq!(pk.gender(), Gender::Genderless);
    assert_eq!(pk.form(), 5);
    assert_eq!(pk.raw()[0x1D], 1 | (2 << 1) | (5 << 3));
}

#[test]
fn pokerus_nibbles() {
    let mut pk = Pk7::blank(Layout::Compact);
    pk.set_pkrs_strain(3);
    pk.set_pkrs_days(2);
    assert_eq!(pk.pkrs(), 0x32);
    assert_eq!(pk.pkrs_days(), 2);
    assert_eq!(pk.pkrs_strain(), 3);
}

#[test]
fn names_use_the_gen67_gender_symbols() {
    let mut pk = Pk7::blank(Layout::Compact);
    pk.set_nickname("Nidoran\u{2642}");
    assert_eq!(&pk.raw()[0x4E..0x50], &0xE08Eu16.to_le_bytes());
    assert_eq!(pk.nickname(), "Nidoran\u{2642}");

    pk.set_ot_name("ABCDEFGHIJKLMNOP");
    assert_eq!(pk.ot_name(), "ABCDEFGHIJKL");
}

#[test]
fn dates_are_offset_from_2000() {
    let mut pk = Pk7::blank(Layout::Compact);
    assert_eq!(pk.egg_date(), None);
    let met = Date {
        year: 2017,
        month: 11,
        day: 17,
    };
    pk.set_met_date(met);
    pk.set_egg_date(Some(met));
    assert_eq!(pk.raw()[0xD4], 17);
    assert_eq!(pk.met_date(), met);
    assert_eq!(pk.egg_date(), Some(met));
    pk.set_egg_date(None);
    assert_eq!(pk.egg_date(), None);
}

#[test]
fn trade_sets_handler_from_trainer_identity() {
    let mut pk = sample_pk7(Layout::Compact);
    let owner = TrainerInfo {
        name: "Ash".to_string(),
        tid: 12345,
        sid: 54321,
        gender: Gender::Male,
    };
    pk.set_current_handler(Handler::NotOriginalTrainer);
    pkx::trade(&mut pk, &owner);
    assert_eq!(pk.current_handler(), Handler::OriginalTrainer);

    let stranger = TrainerInfo {
        sid: 1,
        ..owner.clone()
    };
    pkx::trade(&mut pk, &stranger);
    assert_eq!(pk.current_handler(), Handler::NotOriginalTrainer);

    pk.set_egg(true);
    pkx::trade(&mut pk, &owner);
    assert_eq!(pk.current_handler(), Handler::NotOriginalTrainer);
}

#[test]
fn from_bytes_picks_variant_by_length() {
    let pk7 = pkx::from_bytes(&[0; 0x104]).expect("pk7 party");
    assert_eq!(pk7.extension(), "pk7");
    assert!(pk7.is_party());

    let pa8 = pkx::from_bytes(&[0; 0x168]).expect("pa8 box");
    assert_eq!(pa8.extension(), "pa8");
    assert!(!pa8.is_party());

    let err = pkx::from_bytes(&[0; 0x100]).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::TruncatedBuffer);
    let err = Pk7::new(vec![0; 0x168]).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::TruncatedBuffer);
}

#[test]
fn records_are_send_and_sync_trait_objects() {
    fn assert_send_sync<T: Send + Sync + ?Sized>() {}
    assert_send_sync::<dyn Pkx>();

    let boxed: Box<dyn Pkx> = Box::new(sample_pa8(Layout::Compact));
    let clone = boxed.clone_box();
    assert_eq!(clone.raw(), boxed.raw());
}

#[test]
fn move_bookkeeping_fields_survive_layout_changes() {
    let records: Vec<Box<dyn Pkx>> = vec![
        Box::new(sample_pk7(Layout::Compact)),
        Box::new(sample_pa8(Layout::Compact)),
    ];
    for mut pk in records {
        for i in 0..4 {
            pk.set_pp(i, 10 + i as u8);
            pk.set_pp_ups(i, i as u8);
            pk.set_relearn_move(i, 100 + i as u16);
        }
        pk.set_ht_friendship(70);
        pk.set_pp(4, 99);
        pk.set_relearn_move(4, 999);

        let party = pk.to_party();
        let back = party.to_box();
        for view in [&party, &back] {
            assert_eq!(view.pp(2), 12);
            assert_eq!(view.pp_ups(3), 3);
            assert_eq!(view.relearn_move(1), 101);
            assert_eq!(view.ht_friendship(), 70);
            assert_eq!(view.pp(4), 0);
            assert_eq!(view.relearn_move(4), 0);
        }
        assert!(party.is_party());
        assert!(!back.is_party());
    }
}

fn assert_cipher_is_byte_exact<L: CryptLayout>(mut plain: Vec<u8>) -> Vec<u8> {
    crypto::refresh_checksum::<L>(&mut plain);
    let mut encrypted = plain.clone();
    crypto::encrypt::<L>(&mut encrypted);
    assert_ne!(encrypted, plain);

    let mut decrypted = encrypted.clone();
    crypto::decrypt::<L>(&mut decrypted);
    assert_eq!(decrypted, plain);

    crypto::encrypt::<L>(&mut decrypted);
    assert_eq!(decrypted, encrypted);
    encrypted
}

#[test]
fn cipher_round_trips_are_byte_exact() {
    for layout in [Layout::Compact, Layout::Extended] {
        let encrypted = assert_cipher_is_byte_exact::<Pk7>(sample_pk7(layout).raw().to_vec());
        let reread = Pk7::new(encrypted.clone()).expect("pk7");
        assert_eq!(reread.encrypted_bytes(), encrypted);

        let mut pa8 = sample_pa8(layout);
        pa8.set_party_stat(Stat::Speed, 55);
        let encrypted = assert_cipher_is_byte_exact::<Pa8>(pa8.raw().to_vec());
        let reread = Pa8::new(encrypted.clone()).expect("pa8");
        assert_eq!(reread.encrypted_bytes(), encrypted);
    }
}

struct RowletAbilities;

impl pkx_core::lookup::Lookup for RowletAbilities {
    fn abilities(&self, species: u16, _form: u16) -> Option<[u16; 3]> {
        (species == 722).then_some([65, 65, 203])
    }
}

#[test]
fn ability_slot_sets_number_and_id() {
    let mut pk = sample_pa8(Layout::Compact);
    for (slot, number) in [(0, 1), (1, 2), (2, 4), (7, 4)] {
        pk.set_ability_slot(&StandardLookup, slot);
        assert_eq!(pk.ability_number(), number);
    }
    assert_eq!(pk.ability(), 0);

    pk.set_ability_slot(&RowletAbilities, 2);
    assert_eq!(pk.ability_number(), 4);
    assert_eq!(pk.ability(), 203);

    let mut pk7 = sample_pk7(Layout::Compact);
    pk7.set_ability_slot(&RowletAbilities, 1);
    assert_eq!(pk7.ability_number(), 2);
    assert_eq!(pk7.ability(), 0);
}
