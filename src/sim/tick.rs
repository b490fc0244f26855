//! Frame driver
//!
//! One rendered frame runs `ceil(game_speed)` substeps (capped) of the full
//! step logic, each with a proportional share of the frame's time. Phase
//! order inside a step is fixed: grid before any query, timers before
//! weapons, AI movement before damage.

use glam::Vec2;

use super::combat::{process_aoe_damage, process_skill_damage, update_bullets};
use super::enemy::update_enemies;
use super::player::{damage_player, find_target, update_movement, update_weapons, validate_target};
use super::skills::SkillId;
use super::stage::Stage;
use super::state::GameState;
use crate::consts::*;
use crate::settings::ProgressionMode;

/// Host commands applied at the start of a frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Cast a skill manually
    pub cast: Option<SkillId>,
    /// Travel to another stage (ignored while traveling)
    pub change_stage: Option<Stage>,
    /// New global game speed
    pub game_speed: Option<f32>,
}

/// Substep count and per-substep dt for a frame
pub fn substeps(frame_dt: f32, game_speed: f32) -> (u32, f32) {
    let steps = (game_speed.ceil() as u32).clamp(1, MAX_SUBSTEPS);
    (steps, frame_dt * game_speed / steps as f32)
}

/// Advance the simulation by one rendered frame of `frame_dt` ms
pub fn tick(state: &mut GameState, input: &TickInput, frame_dt: f32) {
    if let Some(speed) = input.game_speed {
        state.settings.set_game_speed(speed);
    }
    if let Some(stage) = input.change_stage {
        state.change_stage(stage);
    }
    if let Some(id) = input.cast {
        let GameState {
            config,
            skills,
            rng,
            clock_ms,
            ..
        } = state;
        skills.activate(config, id, *clock_ms, rng);
    }

    // Tab switches and debugger pauses produce huge gaps
    let frame_dt = if (0.0..=MAX_FRAME_MS).contains(&frame_dt) {
        frame_dt
    } else {
        FRAME_MS
    };
    let speed = state.settings.game_speed;
    if speed <= 0.0 {
        return;
    }

    state.spawn_pending();

    let (steps, step_dt) = substeps(frame_dt, speed);
    for s in 0..steps {
        step(state, step_dt, s == 0);
    }

    let dt = frame_dt * speed;
    state.damage_numbers.update(dt);
    state.incoming_damage.update(dt);
    state.fx.update(dt);

    if state.loot.due(state.clock_ms) {
        state.flush_loot();
    }
}

/// Log frames whose simulation work blew the budget
pub fn report_frame_time(elapsed_ms: f64, state: &GameState) {
    if elapsed_ms > FRAME_BUDGET_MS {
        log::warn!(
            "Slow frame: {elapsed_ms:.1}ms for {} enemies at {}x",
            state.spawn_index,
            state.settings.game_speed
        );
    }
}

/// One substep of `dt` simulation ms
pub fn step(state: &mut GameState, dt: f32, first_step: bool) {
    if !state.player.is_alive() {
        state.clock_ms += dt as f64;
        return;
    }
    check_stage_clear(state);

    let now = state.clock_ms;
    if first_step && !state.player.traveling && state.spawn_index > 0 {
        state.grid.rebuild(&state.enemies, state.spawn_index);
    }

    if !state.player.traveling && now - state.last_target_ms > TARGET_INTERVAL_MS {
        state.last_target_ms = now;
        state.player.target = find_target(state);
    }
    validate_target(state);

    state.player.update_shield(&state.config.ship, dt);
    state.player.regen_ammo(&state.config.weapons, dt);
    state.skills.tick_cooldowns(dt);

    let auto_target = state
        .player
        .target
        .filter(|_| state.settings.auto_skills && !state.player.traveling);
    if let Some(target) = auto_target {
        let dist_sq = Vec2::from(state.enemies.position(target)).distance_squared(state.player.pos);
        let GameState {
            config,
            skills,
            rng,
            ..
        } = state;
        skills.auto_activate(config, dist_sq, now, rng);
    }
    {
        let GameState {
            config,
            skills,
            rng,
            ..
        } = state;
        skills.spawn_due_rings(config, now, rng);
        skills.update(config, dt);
    }

    update_movement(state, dt);
    update_enemies(state, dt, first_step);
    apply_player_hits(state);

    let combat_interval = state.config.combat.damage_interval_ms as f64;
    if !state.player.traveling && now - state.last_combat_ms > combat_interval {
        state.last_combat_ms = now;
        process_aoe_damage(state);
        process_skill_damage(state);
    }

    update_weapons(state);
    if !state.player.traveling {
        update_bullets(state, dt);
    }

    state.clock_ms += dt as f64;
}

/// Apply attack damage gathered during the AI pass. Stops at a soft reset.
fn apply_player_hits(state: &mut GameState) {
    if state.pending_player_hits.is_empty() {
        return;
    }
    let mut hits = std::mem::take(&mut state.pending_player_hits);
    for &amount in &hits {
        if damage_player(state, amount) {
            break;
        }
    }
    hits.clear();
    state.pending_player_hits = hits;
}

/// Move on once the stage's kill target is met
fn check_stage_clear(state: &mut GameState) -> bool {
    let target = state.plan.kill_target;
    if state.player.traveling || target == 0 || state.stage_kill_count < target {
        return false;
    }
    let current = state.plan.stage;
    let next = match state.settings.progression_mode {
        ProgressionMode::Farm => current,
        ProgressionMode::Progress => current.next(&state.config).unwrap_or(current),
    };
    log::info!(
        "{current} cleared with {} kills ({}), next: {next}",
        state.stage_kill_count,
        state.settings.progression_mode.as_str()
    );
    state.change_stage(next)
}
