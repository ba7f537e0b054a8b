use std::fmt::Write as _;

use pkx_core::core_api::{ItemEntry, PkmSummary, PlayTime, Session};
use serde_json::{Map as JsonMap, Value as JsonValue};

const SHEET_WIDTH: usize = 76;
const NAME_COL_WIDTH: usize = 19;
const SPECIES_COL_WIDTH: usize = 24;
const NICKNAME_COL_WIDTH: usize = 14;
const ITEM_COL_WIDTH: usize = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    CanonicalV1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextStyle {
    #[default]
    TrainerCard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRenderOptions {
    /// Adds moves, IVs and EVs under each party member.
    pub verbose: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelection {
    pub name: bool,
    pub tid: bool,
    pub sid: bool,
    pub money: bool,
    pub play_time: bool,
    pub party: bool,
    pub box_id: Option<usize>,
    pub bag: bool,
}

impl FieldSelection {
    pub fn is_any_selected(&self) -> bool {
        self.name
            || self.tid
            || self.sid
            || self.money
            || self.play_time
            || self.party
            || self.box_id.is_some()
            || self.bag
    }
}

pub fn render_json_full(session: &Session, style: JsonStyle) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(default_json(session)),
    }
}

pub fn render_json_selected(
    session: &Session,
    fields: &FieldSelection,
    style: JsonStyle,
) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(selected_json(fields, session)),
    }
}

/// `key=value` lines for field mode, in the fixed field order. List fields
/// repeat their key once per entry.
pub fn render_field_pairs(session: &Session, fields: &FieldSelection) -> Vec<(&'static str, String)> {
    let snapshot = session.snapshot();
    let mut out = Vec::new();

    if fields.name {
        out.push(("name", snapshot.ot_name.clone()));
    }
    if fields.tid {
        out.push(("tid", snapshot.tid.to_string()));
    }
    if fields.sid {
        out.push(("sid", snapshot.sid.to_string()));
    }
    if fields.money {
        out.push(("money", snapshot.money.to_string()));
    }
    if fields.play_time {
        out.push(("play_time", format_play_time(snapshot.play_time)));
    }
    if fields.party {
        for pk in session.party() {
            out.push(("party", pkm_pair(&pk)));
        }
    }
    if let Some(box_id) = fields.box_id {
        for pk in session.box_slots(box_id).unwrap_or_default() {
            out.push(("box", pkm_pair(&pk)));
        }
    }
    if fields.bag {
        for item in session.items() {
            out.push((
                "item",
                format!("{}#{} id={} x{}", item.pouch, item.slot, item.id, item.count),
            ));
        }
    }

    out
}

pub fn render_trainer_card(session: &Session) -> String {
    render_text_with_options(session, TextStyle::TrainerCard, TextRenderOptions::default())
}

pub fn render_text(session: &Session, style: TextStyle) -> String {
    render_text_with_options(session, style, TextRenderOptions::default())
}

pub fn render_text_with_options(
    session: &Session,
    style: TextStyle,
    options: TextRenderOptions,
) -> String {
    match style {
        TextStyle::TrainerCard => render_trainer_card_impl(session, options),
    }
}

fn selected_json(fields: &FieldSelection, session: &Session) -> JsonMap<String, JsonValue> {
    let snapshot = session.snapshot();
    let mut out = JsonMap::new();

    if fields.name {
        out.insert(
            "ot_name".to_string(),
            JsonValue::String(snapshot.ot_name.clone()),
        );
    }
    if fields.tid {
        out.insert("tid".to_string(), JsonValue::from(snapshot.tid));
    }
    if fields.sid {
        out.insert("sid".to_string(), JsonValue::from(snapshot.sid));
    }
    if fields.money {
        out.insert("money".to_string(), JsonValue::from(snapshot.money));
    }
    if fields.play_time {
        out.insert(
            "play_time".to_string(),
            JsonValue::String(format_play_time(snapshot.play_time)),
        );
    }
    if fields.party {
        out.insert("party".to_string(), pkm_list_to_json(&session.party()));
    }
    if let Some(box_id) = fields.box_id {
        out.insert(
            "box".to_string(),
            pkm_list_to_json(&session.box_slots(box_id).unwrap_or_default()),
        );
    }
    if fields.bag {
        out.insert("bag".to_string(), items_to_json(&session.items()));
    }

    out
}

fn default_json(session: &Session) -> JsonMap<String, JsonValue> {
    let snapshot = session.snapshot();
    let mut out = JsonMap::new();

    out.insert(
        "game".to_string(),
        JsonValue::String(session.game().short_name().to_string()),
    );
    out.insert(
        "ot_name".to_string(),
        JsonValue::String(snapshot.ot_name.clone()),
    );
    out.insert("tid".to_string(), JsonValue::from(snapshot.tid));
    out.insert("sid".to_string(), JsonValue::from(snapshot.sid));
    out.insert(
        "gender".to_string(),
        JsonValue::String(snapshot.gender.to_string()),
    );
    out.insert(
        "language".to_string(),
        JsonValue::String(snapshot.language.to_string()),
    );
    out.insert("version".to_string(), JsonValue::from(snapshot.version));
    out.insert("money".to_string(), JsonValue::from(snapshot.money));
    out.insert("badges".to_string(), JsonValue::from(snapshot.badges));
    out.insert(
        "play_time".to_string(),
        JsonValue::String(format_play_time(snapshot.play_time)),
    );
    out.insert(
        "party_count".to_string(),
        JsonValue::from(snapshot.party_count),
    );
    out.insert(
        "current_box".to_string(),
        JsonValue::from(snapshot.current_box),
    );
    out.insert(
        "unlocked_boxes".to_string(),
        JsonValue::from(snapshot.unlocked_boxes),
    );
    out.insert("max_boxes".to_string(), JsonValue::from(snapshot.max_boxes));
    out.insert("dex_seen".to_string(), JsonValue::from(snapshot.dex_seen));
    out.insert(
        "dex_caught".to_string(),
        JsonValue::from(snapshot.dex_caught),
    );
    out.insert("party".to_string(), pkm_list_to_json(&session.party()));
    out.insert("bag".to_string(), items_to_json(&session.items()));
    out.insert(
        "capability_issues".to_string(),
        JsonValue::Array(
            session
                .capabilities()
                .issues
                .iter()
                .map(|issue| JsonValue::String(issue.as_str().to_string()))
                .collect(),
        ),
    );
    out.insert(
        "integrity".to_string(),
        JsonValue::Array(
            session
                .integrity_issues()
                .into_iter()
                .map(|issue| JsonValue::String(issue.message))
                .collect(),
        ),
    );

    out
}

fn pkm_list_to_json(list: &[PkmSummary]) -> JsonValue {
    JsonValue::Array(list.iter().map(pkm_to_json).collect())
}

fn pkm_to_json(pk: &PkmSummary) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert(
        "location".to_string(),
        JsonValue::String(pk.location.to_string()),
    );
    m.insert("species".to_string(), JsonValue::from(pk.species));
    if let Some(name) = &pk.species_name {
        m.insert("species_name".to_string(), JsonValue::String(name.clone()));
    }
    m.insert("nickname".to_string(), JsonValue::String(pk.nickname.clone()));
    m.insert("level".to_string(), JsonValue::from(pk.level));
    m.insert("gender".to_string(), JsonValue::String(pk.gender.to_string()));
    m.insert("nature".to_string(), JsonValue::from(pk.nature));
    m.insert("held_item".to_string(), JsonValue::from(pk.held_item));
    m.insert("ot_name".to_string(), JsonValue::String(pk.ot_name.clone()));
    m.insert("tid".to_string(), JsonValue::from(pk.tid));
    m.insert("sid".to_string(), JsonValue::from(pk.sid));
    m.insert("is_egg".to_string(), JsonValue::Bool(pk.is_egg));
    m.insert("is_shiny".to_string(), JsonValue::Bool(pk.is_shiny));
    m.insert(
        "moves".to_string(),
        JsonValue::Array(pk.moves.iter().map(|&id| JsonValue::from(id)).collect()),
    );
    m.insert(
        "ivs".to_string(),
        JsonValue::Array(pk.ivs.iter().map(|&v| JsonValue::from(v)).collect()),
    );
    m.insert(
        "evs".to_string(),
        JsonValue::Array(pk.evs.iter().map(|&v| JsonValue::from(v)).collect()),
    );
    m.insert(
        "checksum_valid".to_string(),
        JsonValue::Bool(pk.checksum_valid),
    );
    JsonValue::Object(m)
}

fn items_to_json(items: &[ItemEntry]) -> JsonValue {
    JsonValue::Array(
        items
            .iter()
            .map(|item| {
                let mut m = JsonMap::new();
                m.insert(
                    "pouch".to_string(),
                    JsonValue::String(item.pouch.as_str().to_string()),
                );
                m.insert("slot".to_string(), JsonValue::from(item.slot));
                m.insert("id".to_string(), JsonValue::from(item.id));
                m.insert("count".to_string(), JsonValue::from(item.count));
                if let Some(name) = &item.name {
                    m.insert("name".to_string(), JsonValue::String(name.clone()));
                }
                JsonValue::Object(m)
            })
            .collect(),
    )
}

fn render_trainer_card_impl(session: &Session, options: TextRenderOptions) -> String {
    let snapshot = session.snapshot();
    let title = format!("POKEMON {}", session.game().title().to_uppercase());

    let mut out = String::new();
    writeln!(&mut out).expect("writing to String cannot fail");
    writeln!(&mut out).expect("writing to String cannot fail");
    writeln!(&mut out, "{}", centered_no_trailing(&title, SHEET_WIDTH))
        .expect("writing to String cannot fail");
    writeln!(&mut out, "{}", centered_no_trailing("TRAINER CARD", SHEET_WIDTH))
        .expect("writing to String cannot fail");
    writeln!(&mut out).expect("writing to String cannot fail");

    let name_section = format!("  Name: {:<w$}", snapshot.ot_name, w = NAME_COL_WIDTH);
    writeln!(
        &mut out,
        "{}TID: {:05}  SID: {:05}",
        name_section, snapshot.tid, snapshot.sid
    )
    .expect("writing to String cannot fail");
    let gender_section = format!("  Gender: {:<w$}", snapshot.gender, w = NAME_COL_WIDTH - 2);
    writeln!(
        &mut out,
        "{}Language: {}  Version: {}",
        gender_section, snapshot.language, snapshot.version
    )
    .expect("writing to String cannot fail");
    let money_section = format!(
        "  Money: {:<w$}",
        format_number_with_commas(snapshot.money),
        w = NAME_COL_WIDTH - 1
    );
    writeln!(
        &mut out,
        "{}Badges: {}  Play Time: {}",
        money_section,
        snapshot.badges,
        format_play_time(snapshot.play_time)
    )
    .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "  Boxes: {} unlocked of {}, current box {}",
        snapshot.unlocked_boxes,
        snapshot.max_boxes,
        u16::from(snapshot.current_box) + 1
    )
    .expect("writing to String cannot fail");
    writeln!(&mut out).expect("writing to String cannot fail");

    write_party_section(&mut out, &session.party(), options);
    write_bag_section(&mut out, session);

    let issues = session.integrity_issues();
    if !issues.is_empty() {
        writeln!(&mut out).expect("writing to String cannot fail");
        writeln!(&mut out, " ::: Integrity :::").expect("writing to String cannot fail");
        for issue in issues {
            writeln!(&mut out, "  {}", issue.message).expect("writing to String cannot fail");
        }
    }

    out
}

fn write_party_section(out: &mut String, party: &[PkmSummary], options: TextRenderOptions) {
    writeln!(out, " ::: Party :::").expect("writing to String cannot fail");
    if party.is_empty() {
        writeln!(out, "  (empty)").expect("writing to String cannot fail");
        return;
    }
    for pk in party {
        let species = pk
            .species_name
            .clone()
            .unwrap_or_else(|| format!("#{:03}", pk.species));
        let egg = if pk.is_egg { " [Egg]" } else { "" };
        let shiny = if pk.is_shiny { " *" } else { "" };
        let line = format!(
            "  {}  {:<sw$}{:<nw$}Lv. {:<4}{}{}{}",
            pk.location,
            fit_column(&species, SPECIES_COL_WIDTH - 2),
            fit_column(&pk.nickname, NICKNAME_COL_WIDTH - 1),
            pk.level,
            pk.gender,
            egg,
            shiny,
            sw = SPECIES_COL_WIDTH,
            nw = NICKNAME_COL_WIDTH,
        );
        writeln!(out, "{}", line.trim_end()).expect("writing to String cannot fail");
        if options.verbose {
            writeln!(out, "      Moves: {}", join_numbers(&pk.moves))
                .expect("writing to String cannot fail");
            writeln!(out, "      IVs: {}  EVs: {}", join_numbers(&pk.ivs), join_numbers(&pk.evs))
                .expect("writing to String cannot fail");
        }
    }
}

fn write_bag_section(out: &mut String, session: &Session) {
    writeln!(out).expect("writing to String cannot fail");
    writeln!(out, " ::: Bag :::").expect("writing to String cannot fail");
    if !session.capabilities().supports_bag() {
        writeln!(out, "  (not modelled)").expect("writing to String cannot fail");
        return;
    }
    let items = session.items();
    if items.is_empty() {
        writeln!(out, "  (empty)").expect("writing to String cannot fail");
        return;
    }
    for item in items {
        let name = item.name.clone().unwrap_or_else(|| format!("item #{}", item.id));
        let line = format!(
            "  {:<12}{:<w$}x{}",
            item.pouch.as_str(),
            fit_column(&name, ITEM_COL_WIDTH - 1),
            item.count,
            w = ITEM_COL_WIDTH
        );
        writeln!(out, "{}", line.trim_end()).expect("writing to String cannot fail");
    }
}

fn pkm_pair(pk: &PkmSummary) -> String {
    format!(
        "{} species={} nickname={} level={}",
        pk.location, pk.species, pk.nickname, pk.level
    )
}

fn join_numbers<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

fn fit_column(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 3 {
        return value.chars().take(width).collect();
    }

    let mut out = String::with_capacity(width);
    for ch in value.chars().take(width - 3) {
        out.push(ch);
    }
    out.push_str("...");
    out
}

fn centered_no_trailing(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }

    let left_padding = (width - len) / 2;
    format!("{}{}", " ".repeat(left_padding), value)
}

fn format_play_time(time: PlayTime) -> String {
    format!("{}:{:02}:{:02}", time.hours, time.minutes, time.seconds)
}

fn format_number_with_commas(n: u32) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}
