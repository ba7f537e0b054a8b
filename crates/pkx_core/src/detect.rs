//! Save format recognition. Recognizers run in a fixed order and the first
//! match wins; probing never touches the caller's buffer.

use crate::core_api::{CoreError, CoreErrorCode, Game};
use crate::sav::flat::has_footer;
use crate::sav::sav_la::{SavLa, is_block_stream};
use crate::sav::sav7::{SIZE_SM, SIZE_USUM, Sav7};
use crate::sav::Sav;

/// Game whose recognizer accepts `bytes`, without building a container.
pub fn detect_game(bytes: &[u8]) -> Option<Game> {
    let flat = |size: usize| bytes.len() == size && has_footer(bytes);

    if flat(SIZE_USUM) {
        tracing::debug!(len = bytes.len(), "recognized Ultra Sun/Ultra Moon layout");
        return Some(Game::UltraSunUltraMoon);
    }
    if flat(SIZE_SM) {
        tracing::debug!(len = bytes.len(), "recognized Sun/Moon layout");
        return Some(Game::SunMoon);
    }
    if is_block_stream(bytes) {
        tracing::debug!(len = bytes.len(), "recognized Legends: Arceus block stream");
        return Some(Game::LegendsArceus);
    }
    tracing::debug!(len = bytes.len(), "no save recognizer matched");
    None
}

pub fn detect(bytes: &[u8]) -> Result<Box<dyn Sav>, CoreError> {
    match detect_game(bytes) {
        Some(game) => open_as(bytes, game),
        None => Err(CoreError::new(
            CoreErrorCode::UnrecognizedFormat,
            format!("{} bytes do not match any supported save", bytes.len()),
        )),
    }
}

/// Opens `bytes` as `game`, skipping recognition.
pub fn open_as(bytes: &[u8], game: Game) -> Result<Box<dyn Sav>, CoreError> {
    match game {
        Game::SunMoon | Game::UltraSunUltraMoon => Ok(Box::new(Sav7::open(bytes.to_vec(), game)?)),
        Game::LegendsArceus => Ok(Box::new(SavLa::open(bytes)?)),
    }
}

/// Structurally valid empty save for `game`.
pub fn blank(game: Game) -> Result<Box<dyn Sav>, CoreError> {
    match game {
        Game::SunMoon | Game::UltraSunUltraMoon => Ok(Box::new(Sav7::blank(game)?)),
        Game::LegendsArceus => Ok(Box::new(SavLa::blank())),
    }
}
