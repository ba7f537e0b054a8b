pub mod bytes;
pub mod core_api;
pub mod crypto;
pub mod detect;
pub mod gender;
pub mod language;
pub mod layout;
pub mod lookup;
pub mod pkx;
pub mod sav;
pub mod stat;
pub mod text;

pub use core_api::{CoreError, CoreErrorCode};
pub use detect::{detect, detect_game};
