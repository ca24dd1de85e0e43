//! Data structures for combat content.
//!
//! Abilities and monsters are defined in RON and validated as a whole
//! [`ContentPack`] before anything spawns.

mod content_pack;
mod monster_data;

pub use content_pack::ContentPack;
pub use monster_data::MonsterData;
