//! # ARPG Core
//!
//! Combat resolution for a tile-based action RPG.
//!
//! This crate contains **only** combat logic:
//! - No rendering
//! - No audio or animation
//! - No system randomness (every roll goes through a seeded [`rng::CombatRng`])
//! - Fixed-point positions, integer damage
//!
//! This separation enables:
//! - Headless simulation of whole encounters
//! - Reproducible fights from a seed
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`geometry`] - Pattern rotation, circles, segments, sectors
//! - [`damage`] - Attack, ability and monster damage with reductions
//! - [`hit`] - Which targets a shape strikes
//! - [`movement`] - One-tile step planning and the move guard
//! - [`behavior`] - Monster aggro and engagement state machine
//! - [`ability`] - Ability descriptors and in-flight activations
//! - [`world`] - Traits the engine needs from its host, and the collision grid
//! - [`encounter`] - Reference host: one hero, many monsters, fixed ticks
//! - [`data`] - RON content packs
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ability;
pub mod behavior;
pub mod components;
pub mod config;
pub mod damage;
pub mod data;
pub mod encounter;
pub mod error;
pub mod events;
pub mod geometry;
pub mod hit;
pub mod math;
pub mod movement;
pub mod rng;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ability::{
        AbilityDescriptor, AbilityShape, Activation, ActivationState, Caster, EffectId, Effects,
        ResolvedHits,
    };
    pub use crate::behavior::{
        Agent, AgentAction, AgentProfile, AggroState, AttackType, BehaviorChange, Decision,
        Perception, StepReason,
    };
    pub use crate::components::*;
    pub use crate::config::{CombatConfig, WanderConfig};
    pub use crate::damage::{Defense, SkillLevels, StatBundle, WeaponType};
    pub use crate::data::{ContentPack, MonsterData};
    pub use crate::encounter::{Encounter, HeroSetup, TickEvents, HERO_ID, TICK_DURATION_MS, TICK_RATE};
    pub use crate::error::{CombatError, Result};
    pub use crate::events::{CombatEvent, CombatObserver, EventBus, ObserverError};
    pub use crate::geometry::{Sector, TileOffset};
    pub use crate::hit::{HitTracker, TARGET_RADIUS};
    pub use crate::math::{Fixed, TileCoord, Vec2Fixed, WideFixed};
    pub use crate::movement::{MoveGuard, Step, StepIntent};
    pub use crate::rng::CombatRng;
    pub use crate::world::{Cell, CollisionGrid, DamageSink, StatProvider, WorldQuery};
}
