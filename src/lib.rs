//! Generate picon channel logos by compositing logos onto background templates.

pub mod discovery;
pub mod overlay;
pub mod picon_gen;
pub mod progress;

pub use picon_gen::{generate_picons, Config, GenerationReport};
