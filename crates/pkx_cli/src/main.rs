use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use pkx_core::core_api::{Engine, Game as CoreGame, Session};
use pkx_render::{
    FieldSelection, JsonStyle, TextRenderOptions, TextStyle, render_field_pairs,
    render_json_full, render_json_selected, render_text_with_options,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(value_name = "SAVE")]
    path: PathBuf,
    #[arg(long, value_name = "sm|usum|pla", value_parser = parse_game)]
    game: Option<CoreGame>,
    #[arg(long)]
    name: bool,
    #[arg(long)]
    tid: bool,
    #[arg(long)]
    sid: bool,
    #[arg(long)]
    money: bool,
    #[arg(long = "play-time")]
    play_time: bool,
    #[arg(long)]
    party: bool,
    /// List the occupied slots of box N (1-based).
    #[arg(long = "box", value_name = "N")]
    box_number: Option<usize>,
    #[arg(long)]
    bag: bool,
    #[arg(long)]
    json: bool,
    /// Include moves and stats in the trainer card.
    #[arg(long)]
    verbose: bool,
    #[arg(long = "set-name", value_name = "NAME")]
    set_name: Option<String>,
    #[arg(long = "set-money")]
    set_money: Option<u32>,
    #[arg(long = "set-tid")]
    set_tid: Option<u16>,
    #[arg(long = "set-sid")]
    set_sid: Option<u16>,
    /// Make box N (1-based) the current box.
    #[arg(long = "set-current-box", value_name = "N")]
    set_current_box: Option<u8>,
    /// Write party slot N (1-based) as an encrypted record.
    #[arg(long = "export-party", value_name = "SLOT", conflicts_with_all = [
        "set_name", "set_money", "set_tid", "set_sid", "set_current_box"
    ])]
    export_party: Option<usize>,
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

impl Cli {
    fn fields(&self) -> FieldSelection {
        FieldSelection {
            name: self.name,
            tid: self.tid,
            sid: self.sid,
            money: self.money,
            play_time: self.play_time,
            party: self.party,
            box_id: self.box_number.map(|n| n.saturating_sub(1)),
            bag: self.bag,
        }
    }

    fn has_edits(&self) -> bool {
        self.set_name.is_some()
            || self.set_money.is_some()
            || self.set_tid.is_some()
            || self.set_sid.is_some()
            || self.set_current_box.is_some()
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let fields = cli.fields();
    let has_edits = cli.has_edits();

    if (has_edits || cli.export_party.is_some()) && cli.output.is_none() {
        usage_error("--set-* and --export-party flags require --output <PATH>");
    }
    if !has_edits && cli.export_party.is_none() && cli.output.is_some() {
        usage_error("--output requires at least one --set-* flag or --export-party");
    }
    if cli.box_number == Some(0) || cli.set_current_box == Some(0) || cli.export_party == Some(0) {
        usage_error("box and slot numbers start at 1");
    }

    let bytes = fs::read(&cli.path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", cli.path.display());
        process::exit(1);
    });

    let engine = Engine::new();
    let mut session = engine.open_bytes(bytes, cli.game).unwrap_or_else(|e| {
        eprintln!("Error parsing save file: {}", cli.path.display());
        eprintln!("  {}", e);
        process::exit(1);
    });
    tracing::debug!(game = %session.game(), "loaded save");

    let max_boxes = session.snapshot().max_boxes;
    if let Some(n) = cli.box_number.filter(|&n| n > max_boxes) {
        usage_error(&format!("--box {n} is out of range (1-{max_boxes})"));
    }
    if let Some(n) = cli.set_current_box.filter(|&n| n as usize > max_boxes) {
        usage_error(&format!("--set-current-box {n} is out of range (1-{max_boxes})"));
    }
    let max_party = session.save().max_party();
    if let Some(n) = cli.export_party.filter(|&n| n > max_party) {
        usage_error(&format!("--export-party {n} is out of range (1-{max_party})"));
    }

    if let (Some(slot), Some(out_path)) = (cli.export_party, cli.output.as_deref()) {
        export_party(&session, slot, out_path);
        println!("Exported party slot {slot} to {}", out_path.display());
        return;
    }

    apply_edits(&cli, &mut session);
    if has_edits {
        if let Some(out_path) = cli.output.as_deref() {
            fs::write(out_path, session.to_bytes()).unwrap_or_else(|e| {
                eprintln!("Error writing {}: {e}", out_path.display());
                process::exit(1);
            });
        }
    }

    if cli.json {
        let json = if fields.is_any_selected() {
            render_json_selected(&session, &fields, JsonStyle::CanonicalV1)
        } else {
            render_json_full(&session, JsonStyle::CanonicalV1)
        };
        let rendered = serde_json::to_string_pretty(&json).unwrap_or_else(|e| {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        });
        println!("{rendered}");
        return;
    }

    if fields.is_any_selected() {
        for (key, value) in render_field_pairs(&session, &fields) {
            println!("{key}={value}");
        }
        return;
    }

    if let Some(out_path) = cli.output.as_deref() {
        println!("Wrote edited save to {}", out_path.display());
        return;
    }

    print!(
        "{}",
        render_text_with_options(
            &session,
            TextStyle::TrainerCard,
            TextRenderOptions {
                verbose: cli.verbose
            },
        )
    );
}

fn apply_edits(cli: &Cli, session: &mut Session) {
    if let Some(name) = &cli.set_name {
        session.set_ot_name(name);
    }
    if let Some(money) = cli.set_money {
        session.set_money(money);
    }
    if let Some(tid) = cli.set_tid {
        session.set_tid(tid);
    }
    if let Some(sid) = cli.set_sid {
        session.set_sid(sid);
    }
    if let Some(n) = cli.set_current_box {
        session.set_current_box(n - 1).unwrap_or_else(|e| {
            eprintln!("Error applying current box edit: {e}");
            process::exit(1);
        });
    }
}

fn export_party(session: &Session, slot: usize, out_path: &Path) {
    let pk = session.party_pkm(slot - 1).unwrap_or_else(|e| {
        eprintln!("Error reading party slot {slot}: {e}");
        process::exit(1);
    });
    if pk.is_empty() {
        eprintln!("Party slot {slot} is empty");
        process::exit(1);
    }
    fs::write(out_path, pk.encrypted_bytes()).unwrap_or_else(|e| {
        eprintln!("Error writing {}: {e}", out_path.display());
        process::exit(1);
    });
}

fn usage_error(message: &str) -> ! {
    eprintln!("{message}");
    process::exit(2);
}

fn parse_game(value: &str) -> Result<CoreGame, String> {
    match value.to_ascii_lowercase().as_str() {
        "sm" | "sun-moon" => Ok(CoreGame::SunMoon),
        "usum" | "ultra-sun-ultra-moon" => Ok(CoreGame::UltraSunUltraMoon),
        "pla" | "legends-arceus" => Ok(CoreGame::LegendsArceus),
        _ => Err(format!(
            "invalid game '{value}', expected one of: sm, usum, pla"
        )),
    }
}
