//! Simulation context
//!
//! `GameState` owns every buffer, pool and counter the systems touch. One
//! frame is a sequence of phase functions taking `&mut GameState`; nothing
//! here is shared across threads.

use std::fmt;

use glam::Vec2;

use super::config::GameConfig;
use super::effects::{DamageNumbers, FxPool};
use super::enemy::spawn_enemy;
use super::grid::SpatialGrid;
use super::loot::LootQueue;
use super::player::Player;
use super::pool::{Pool, bullet};
use super::rng::SimRng;
use super::skills::{SkillHit, SkillSystem};
use super::stage::{Stage, StagePlan};
use super::store::EnemyStore;
use crate::settings::Settings;

/// Emitted once per enemy death
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KillEvent {
    pub index: usize,
    pub type_index: usize,
    pub tier: usize,
    pub lucky: bool,
    pub position: Vec2,
}

/// Optional host callbacks
#[derive(Default)]
pub struct SimHooks {
    pub on_kill: Option<Box<dyn FnMut(KillEvent)>>,
    /// Batched drops: item key and aggregated amount
    pub on_loot: Option<Box<dyn FnMut(&str, u64)>>,
    /// Damage taken by the ship, before shield absorption
    pub on_player_hit: Option<Box<dyn FnMut(f32)>>,
    pub on_stage_change: Option<Box<dyn FnMut(Stage)>>,
}

impl fmt::Debug for SimHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimHooks")
            .field("on_kill", &self.on_kill.is_some())
            .field("on_loot", &self.on_loot.is_some())
            .field("on_player_hit", &self.on_player_hit.is_some())
            .field("on_stage_change", &self.on_stage_change.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub struct GameState {
    pub config: GameConfig,
    pub settings: Settings,
    pub rng: SimRng,

    // === Entities ===
    pub enemies: EnemyStore,
    pub grid: SpatialGrid,
    pub bullets: Pool,
    pub skills: SkillSystem,
    pub fx: FxPool,
    pub damage_numbers: DamageNumbers,
    /// Damage taken by the ship, for the HUD
    pub incoming_damage: DamageNumbers,
    pub loot: LootQueue,
    pub player: Player,

    // === Stage ===
    pub plan: StagePlan,
    /// Slots `0..spawn_index` have been spawned
    pub spawn_index: usize,
    pub kill_count: u64,
    pub stage_kill_count: u32,
    pub soft_resets: u32,

    // === Clocks (simulation ms) ===
    pub clock_ms: f64,
    pub last_target_ms: f64,
    pub last_combat_ms: f64,

    pub hooks: SimHooks,
    /// Enemy attack damage collected during the AI pass
    pub pending_player_hits: Vec<f32>,
    pub(crate) scratch: Vec<u32>,
    pub(crate) skill_hits: Vec<SkillHit>,
}

impl GameState {
    /// Fresh run parked at the stage 1 center. Enemies spawn progressively
    /// from the first tick.
    pub fn new(config: GameConfig, settings: Settings, seed: u64) -> Self {
        let mut rng = SimRng::new(seed);
        let plan = StagePlan::build(&config, Stage::Campaign(1), &mut rng);
        let pools = &config.pools;
        let player = Player::new(&config, plan.center);
        Self {
            enemies: EnemyStore::new(pools.enemies),
            grid: SpatialGrid::new(config.grid.cell_size, config.grid.dim, pools.enemies),
            bullets: Pool::new(pools.bullets, bullet::STRIDE, bullet::ACTIVE),
            skills: SkillSystem::new(pools.skills, pools.ring_waves),
            fx: FxPool::new(pools.fx),
            damage_numbers: DamageNumbers::new(pools.damage_numbers),
            incoming_damage: DamageNumbers::new(pools.incoming_damage),
            loot: LootQueue::new(config.loot.items.len()),
            player,
            plan,
            spawn_index: 0,
            kill_count: 0,
            stage_kill_count: 0,
            soft_resets: 0,
            clock_ms: 0.0,
            last_target_ms: f64::NEG_INFINITY,
            last_combat_ms: f64::NEG_INFINITY,
            hooks: SimHooks::default(),
            pending_player_hits: Vec::new(),
            scratch: Vec::new(),
            skill_hits: Vec::new(),
            rng,
            settings,
            config,
        }
    }

    pub fn stage(&self) -> Stage {
        self.plan.stage
    }

    /// Start traveling to another stage. Ignored while already traveling.
    pub fn change_stage(&mut self, stage: Stage) -> bool {
        if self.player.traveling {
            log::debug!("change to {stage} ignored while traveling");
            return false;
        }
        self.enter_stage(stage);
        true
    }

    /// Wipe the stage and start traveling to `stage`
    fn enter_stage(&mut self, stage: Stage) {
        self.plan = StagePlan::build(&self.config, stage, &mut self.rng);
        self.spawn_index = 0;
        self.enemies.clear();
        self.grid.clear();
        self.bullets.clear();
        self.skills.clear();
        self.fx.clear();
        self.damage_numbers.clear();
        self.incoming_damage.clear();
        self.pending_player_hits.clear();
        self.stage_kill_count = 0;

        self.player.reset_weapons(&self.config.weapons);
        self.player.target = None;
        self.player.travel_target = self.plan.center;
        self.player.traveling = true;
        self.last_target_ms = self.clock_ms;
        self.last_combat_ms = self.clock_ms;

        log::info!(
            "Entering {}: {} enemies, {} kills to clear",
            self.plan.stage,
            self.plan.spawn_list.len(),
            self.plan.kill_target
        );
        if let Some(hook) = self.hooks.on_stage_change.as_mut() {
            hook(self.plan.stage);
        }
    }

    /// Travel finished: resume combat and release the first spawn batch
    pub fn arrive(&mut self) {
        self.player.traveling = false;
        log::info!("Arrived at {}", self.plan.stage);
        self.spawn_pending();
    }

    /// Ship destroyed: back to stage 1 with counters zeroed and the ship
    /// fully repaired.
    pub fn soft_reset(&mut self) {
        self.soft_resets += 1;
        log::info!(
            "Ship destroyed on {} after {} kills, restarting",
            self.plan.stage,
            self.kill_count
        );
        self.kill_count = 0;
        self.player.restore();
        self.skills.reset();
        self.enter_stage(Stage::Campaign(1));
    }

    /// Spawn the next batch of the stage's spawn list. Simulation levels
    /// spawn everything at once.
    pub fn spawn_pending(&mut self) {
        if self.player.traveling {
            return;
        }
        let total = self.plan.spawn_list.len().min(self.enemies.capacity());
        let start = self.spawn_index;
        if start >= total {
            return;
        }
        let budget = if self.plan.spawn_all {
            total
        } else {
            self.config.stages.spawns_per_frame.max(1)
        };
        let end = total.min(start.saturating_add(budget));
        let Self {
            enemies,
            config,
            plan,
            rng,
            ..
        } = self;
        for slot in start..end {
            spawn_enemy(enemies, slot, plan.spawn_list[slot] as usize, true, config, plan, rng);
        }
        self.spawn_index = end;
        log::trace!("spawned slots {start}..{end} of {total}");
    }

    /// Deliver aggregated loot to the host sink. Without a sink the totals
    /// stay queued.
    pub fn flush_loot(&mut self) {
        let Self {
            loot,
            hooks,
            config,
            clock_ms,
            ..
        } = self;
        let Some(hook) = hooks.on_loot.as_mut() else {
            return;
        };
        loot.flush(*clock_ms, |item, amount| {
            if let Some(entry) = config.loot.items.get(item) {
                hook(&entry.key, amount);
            }
        });
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_new_state_parked_at_stage_one() {
        let state = test_state();
        assert_eq!(state.stage(), Stage::Campaign(1));
        assert!(!state.player.traveling);
        assert_eq!(state.player.pos, Vec2::ZERO);
        assert_eq!(state.spawn_index, 0);
        assert_eq!(state.player.weapons.len(), state.config.weapons.len());
    }

    #[test]
    fn test_progressive_spawning_respects_budget() {
        let mut state = test_state();
        state.config.stages.spawns_per_frame = 5;
        let total = state.plan.spawn_list.len();
        state.spawn_pending();
        assert_eq!(state.spawn_index, 5.min(total));
        while state.spawn_index < total {
            state.spawn_pending();
        }
        state.spawn_pending();
        assert_eq!(state.spawn_index, total);
        for slot in 0..total {
            assert!(state.enemies.is_alive(slot));
        }
    }

    #[test]
    fn test_simulation_level_spawns_all_at_once() {
        let mut state = test_state();
        state.change_stage(Stage::Simulation {
            level: 3,
            difficulty: 0,
        });
        state.arrive();
        state.spawn_pending();
        assert_eq!(state.spawn_index, state.plan.spawn_list.len());
    }

    #[test]
    fn test_change_stage_wipes_and_travels() {
        let mut state = test_state();
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        state.hooks.on_stage_change = Some(Box::new(move |stage| sink.borrow_mut().push(stage)));
        state.spawn_pending();
        state.stage_kill_count = 12;
        state.player.weapons[0].ammo = 0.0;
        crate::sim::combat::fire_weapon(&mut state, 0);

        assert!(state.change_stage(Stage::Campaign(3)));
        assert!(state.player.traveling);
        assert_eq!(state.spawn_index, 0);
        assert_eq!(state.stage_kill_count, 0);
        assert!(state.bullets.is_empty());
        assert_eq!(state.player.weapons[0].ammo, state.config.weapons[0].max_ammo);
        assert_eq!(state.player.travel_target, state.plan.center);
        assert_eq!(changes.borrow().as_slice(), &[Stage::Campaign(3)]);

        // Second request while in transit is dropped
        assert!(!state.change_stage(Stage::Campaign(4)));
        assert_eq!(state.stage(), Stage::Campaign(3));
    }

    #[test]
    fn test_arrival_starts_spawning_far() {
        let mut state = test_state();
        state.config.stages.spawns_per_frame = 3;
        state.change_stage(Stage::Campaign(2));
        state.player.pos = state.plan.center;
        assert_eq!(state.spawn_index, 0);
        state.arrive();
        assert!(!state.player.traveling);
        assert_eq!(state.spawn_index, 3.min(state.plan.spawn_list.len()));
        let start = state.config.enemies.iter().map(|e| e.start_dist).fold(f32::MAX, f32::min);
        for slot in 0..state.spawn_index {
            let d = Vec2::from(state.enemies.position(slot)).distance(state.plan.center);
            assert!(d >= start * 1.5 - 1.0);
        }
    }

    #[test]
    fn test_soft_reset_restores_run() {
        let mut state = test_state();
        state.change_stage(Stage::Campaign(4));
        state.arrive();
        state.spawn_pending();
        state.kill_count = 900;
        state.stage_kill_count = 40;
        state.player.health = -5.0;

        state.soft_reset();
        assert_eq!(state.stage(), Stage::Campaign(1));
        assert_eq!(state.kill_count, 0);
        assert_eq!(state.stage_kill_count, 0);
        assert_eq!(state.spawn_index, 0);
        assert!(!state.enemies.is_live(0));
        assert_eq!(state.player.health, state.player.health_max);
        assert_eq!(state.soft_resets, 1);
    }

    #[test]
    fn test_soft_reset_bypasses_travel_guard() {
        let mut state = test_state();
        state.change_stage(Stage::Campaign(5));
        assert!(state.player.traveling);
        state.soft_reset();
        assert_eq!(state.stage(), Stage::Campaign(1));
    }

    #[test]
    fn test_loot_flush_reaches_hook() {
        let mut state = test_state();
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&received);
        state.loot.push(1, 7);
        // No sink yet: totals stay queued
        state.flush_loot();
        assert_eq!(state.loot.pending(1), 7);

        state.hooks.on_loot = Some(Box::new(move |key: &str, amount: u64| {
            sink.borrow_mut().push((key.to_string(), amount))
        }));
        state.flush_loot();
        assert!(state.loot.is_empty());
        let key = state.config.loot.items[1].key.clone();
        assert_eq!(received.borrow().as_slice(), &[(key, 7)]);
    }
}
