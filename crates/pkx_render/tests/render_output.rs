use pkx_core::core_api::{Engine, Game, Session};
use pkx_core::language::Language;
use pkx_core::pkx::{Layout, Pk7, Pkx};
use pkx_core::sav::{Item, Pouch, Sav};
use pkx_render::{
    FieldSelection, JsonStyle, TextRenderOptions, TextStyle, render_field_pairs,
    render_json_full, render_json_selected, render_text_with_options, render_trainer_card,
};
use serde_json::Value;

fn sample_pk7() -> Pk7 {
    let mut pk = Pk7::blank(Layout::Compact);
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

fn sun_moon_session() -> Session {
    let engine = Engine::new();
    let mut session = engine.new_save(Game::SunMoon).expect("blank save");
    session.set_ot_name("Ash");
    session.set_tid(12345);
    session.set_money(1_234_567);
    session
        .set_party_pkm(&sample_pk7(), 0)
        .expect("party slot");
    session
        .set_box_pkm(&sample_pk7(), 0, 3, false)
        .expect("box slot");
    engine
        .open_bytes(session.to_bytes(), None)
        .expect("edited save should reopen")
}

fn json_keys(value: &Value) -> Vec<&str> {
    value
        .as_object()
        .expect("json should be an object")
        .keys()
        .map(String::as_str)
        .collect()
}

#[test]
fn full_json_uses_canonical_top_level_order() {
    let session = sun_moon_session();
    let value = render_json_full(&session, JsonStyle::CanonicalV1);

    assert_eq!(
        json_keys(&value),
        vec![
            "game",
            "ot_name",
            "tid",
            "sid",
            "gender",
            "language",
            "version",
            "money",
            "badges",
            "play_time",
            "party_count",
            "current_box",
            "unlocked_boxes",
            "max_boxes",
            "dex_seen",
            "dex_caught",
            "party",
            "bag",
            "capability_issues",
            "integrity",
        ]
    );
    assert_eq!(value["game"], "SM");
    assert_eq!(value["money"], 1_234_567);
    assert_eq!(value["party"][0]["nickname"], "Pika");
    assert_eq!(value["party"][0]["location"], "party slot 1");
    assert_eq!(value["party"][0]["ivs"][0], 31);
    assert!(value["integrity"].as_array().expect("array").is_empty());
}

#[test]
fn selected_json_uses_canonical_subset_order() {
    let session = sun_moon_session();
    let fields = FieldSelection {
        bag: true,
        money: true,
        box_id: Some(0),
        name: true,
        ..FieldSelection::default()
    };
    let value = render_json_selected(&session, &fields, JsonStyle::CanonicalV1);

    assert_eq!(json_keys(&value), vec!["ot_name", "money", "box", "bag"]);
    assert_eq!(value["box"][0]["location"], "box 1 slot 4");
    assert_eq!(value["box"][0]["level"], 10);
}

#[test]
fn field_pairs_follow_fixed_order() {
    let session = sun_moon_session();
    let fields = FieldSelection {
        tid: true,
        name: true,
        party: true,
        ..FieldSelection::default()
    };
    let pairs = render_field_pairs(&session, &fields);
    let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec!["name", "tid", "party"]);
    assert_eq!(pairs[0].1, "Ash");
    assert_eq!(pairs[1].1, "12345");
    assert_eq!(pairs[2].1, "party slot 1 species=25 nickname=Pika level=10");
}

#[test]
fn out_of_range_box_renders_empty() {
    let session = sun_moon_session();
    let fields = FieldSelection {
        box_id: Some(99),
        ..FieldSelection::default()
    };
    assert!(render_field_pairs(&session, &fields).is_empty());
}

#[test]
fn trainer_card_contains_expected_sections() {
    let session = sun_moon_session();
    let rendered = render_trainer_card(&session);

    assert!(rendered.starts_with("\n\n"));
    assert!(rendered.contains("POKEMON SUN/MOON"));
    assert!(rendered.contains("TRAINER CARD"));
    assert!(rendered.contains("Name: Ash"));
    assert!(rendered.contains("TID: 12345"));
    assert!(rendered.contains("Money: 1,234,567"));
    assert!(rendered.contains(" ::: Party :::"));
    assert!(rendered.contains("#025"));
    assert!(rendered.contains(" ::: Bag :::"));
    assert!(!rendered.contains("::: Integrity :::"));
    assert!(!rendered.contains("Moves:"));

    let verbose = render_text_with_options(
        &session,
        TextStyle::TrainerCard,
        TextRenderOptions { verbose: true },
    );
    assert!(verbose.contains("Moves: 84/45/0/0"));
    assert!(verbose.contains("IVs: 31/0/31/0/31/0"));
}

#[test]
fn bag_rendering_depends_on_capabilities() {
    let engine = Engine::new();
    let la = engine.new_save(Game::LegendsArceus).expect("blank");
    assert!(render_trainer_card(&la).contains("(not modelled)"));
    let value = render_json_full(&la, JsonStyle::CanonicalV1);
    assert_eq!(value["game"], "PLA");
    assert!(
        value["capability_issues"]
            .as_array()
            .expect("array")
            .contains(&Value::from("bag_not_modelled"))
    );

    let session = engine.new_save(Game::UltraSunUltraMoon).expect("blank");
    let mut edited = session.save().clone_box();
    edited
        .set_item(Item { id: 4, count: 12 }, Pouch::Items, 0)
        .expect("items pouch");
    let session = engine
        .open_bytes(edited.to_bytes(), None)
        .expect("reopen");
    let value = render_json_full(&session, JsonStyle::CanonicalV1);
    assert_eq!(value["bag"][0]["pouch"], "Items");
    assert_eq!(value["bag"][0]["count"], 12);
    assert!(render_trainer_card(&session).contains("item #4"));
}
