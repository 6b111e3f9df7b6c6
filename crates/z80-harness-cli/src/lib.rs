//! Library half of the interactive demo binary, split out so the menu and
//! benchmark logic are unit-testable without going through stdin — the
//! shape the teacher's binary crates use (e.g. `emu-nes`'s `lib.rs`/`main.rs`
//! split).

pub mod benchmark;
pub mod menu;

pub use menu::Menu;
