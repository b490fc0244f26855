//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Seeded RNG only
//! - Flat fixed-stride buffers, no per-entity heap objects in hot loops
//! - Time comes in as `dt`; no clocks or platform calls
//! - No rendering dependencies

pub mod combat;
pub mod config;
pub mod effects;
pub mod enemy;
pub mod grid;
pub mod loot;
pub mod player;
pub mod pool;
pub mod rng;
pub mod skills;
pub mod stage;
pub mod state;
pub mod store;
pub mod tick;

pub use combat::{HitOutcome, HitRoll, resolve_hit, roll_crit_tier, roll_hit};
pub use config::{ConfigError, GameConfig, MAX_TIER, TIER_COUNT, TierChances, TieredStat};
pub use effects::{DamageNumbers, FxKind, FxPool};
pub use enemy::{EnemyPhase, enemy_phase, spawn_enemy};
pub use grid::SpatialGrid;
pub use loot::{LootQueue, roll_drops};
pub use player::{Player, ShieldState, ShipState, WeaponState};
pub use pool::Pool;
pub use rng::SimRng;
pub use skills::{SkillHit, SkillId, SkillKind, SkillSystem};
pub use stage::{Stage, StagePlan};
pub use state::{GameState, KillEvent, SimHooks};
pub use store::EnemyStore;
pub use tick::{TickInput, report_frame_time, step, tick};
