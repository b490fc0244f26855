//! Enemy AI
//!
//! Per-slot lifecycle: seek to a standoff ring around the ship, ram through
//! it with a fixed-direction charge, die, respawn in place on the far ring.
//! Steering is a pull toward the standoff distance plus a capped separation
//! force from grid neighbors.

use glam::Vec2;

use super::config::{EnemyTypeConfig, GameConfig, MAX_TIER};
use super::grid::SpatialGrid;
use super::rng::SimRng;
use super::stage::StagePlan;
use super::state::GameState;
use super::store::{EnemyStore, field};
use crate::anim_stride;
use crate::consts::FRAME_MS;

/// Live non-charging enemies beyond this squared distance respawn far away
pub const FAR_RECYCLE_DIST_SQ: f32 = 1e12;
/// Separation only runs for enemies within this squared distance of the ship
const SEPARATION_RANGE_SQ: f32 = 144e6;
/// Most grid entries inspected per separation pass
const HARD_SCAN_CAP: usize = 20;
/// Most neighbors pushing on one enemy
const NEIGHBOR_CAP: usize = 5;
const SEPARATION_STRENGTH: f32 = 40.0;
/// Steering magnitude to speed gain before the cap applies
const STEER_GAIN: f32 = 20.0;
/// Attacks start inside this multiple of the attack range
const ATTACK_TRIGGER_MULT: f32 = 1.2;
/// Attack progress written when a charge starts
const ATTACK_START: f32 = 0.1;

/// Lifecycle phase derived from the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyPhase {
    Seeking,
    Charging,
    Dying,
    /// Never spawned, or killed and not yet animating
    Dead,
}

pub fn enemy_phase(store: &EnemyStore, index: usize) -> EnemyPhase {
    if store.is_alive(index) {
        if store.is_charging(index) {
            EnemyPhase::Charging
        } else {
            EnemyPhase::Seeking
        }
    } else if store.get(index, field::DEATH) > 0.0 {
        EnemyPhase::Dying
    } else {
        EnemyPhase::Dead
    }
}

/// Reset a slot to fresh spawn values on the ring around the stage center.
///
/// `far` pushes the ring out by half again (respawns after death/recycling).
pub fn spawn_enemy(
    store: &mut EnemyStore,
    slot: usize,
    type_index: usize,
    far: bool,
    config: &GameConfig,
    plan: &StagePlan,
    rng: &mut SimRng,
) {
    let Some(cfg) = config.enemies.get(type_index) else {
        log::warn!("spawn of unknown enemy type {type_index} ignored");
        return;
    };
    let angle = rng.angle();
    let ring = if far { 1.5 } else { 1.0 };
    let dist = (cfg.start_dist + rng.uniform() * cfg.start_dist * 0.5) * ring;
    let tier = plan.tier_chances.tier_for_roll(rng.uniform()).min(MAX_TIER);
    let health_mult = config.loot.tier(tier).map_or(1.0, |t| t.health_mult) as f64;
    let health = (cfg.health_max as f64 * health_mult * plan.stat_multiplier).min(f32::MAX as f64);
    let speed_scale = 1.0 + plan.stage.id() as f32 * 0.001;
    let position = plan.center + Vec2::from_angle(angle) * dist;
    let frame = rng.uniform() * cfg.walk_frames;

    let record = store.record_mut(slot);
    record.fill(0.0);
    record[field::X] = position.x;
    record[field::Y] = position.y;
    record[field::SPEED] = cfg.move_speed.resolve(tier) * speed_scale;
    record[field::HEALTH] = health as f32;
    record[field::FRAME] = frame;
    record[field::TYPE] = type_index as f32;
    record[field::TIER] = tier as f32;
}

/// Advance every spawned enemy by one step.
///
/// Attack damage dealt to the ship is pushed onto `state.pending_player_hits`
/// for the caller to apply once the pass is over.
pub fn update_enemies(state: &mut GameState, dt: f32, first_step: bool) {
    let GameState {
        config,
        settings,
        plan,
        enemies,
        grid,
        rng,
        player,
        spawn_index,
        pending_player_hits,
        ..
    } = state;
    let (config, settings, plan) = (&*config, &*settings, &*plan);
    if player.traveling {
        return;
    }

    let scale = dt / FRAME_MS;
    let stride = anim_stride(settings.game_speed);
    let stat_mult = plan.stat_multiplier_f32();
    let ship = player.pos;
    let count = (*spawn_index).min(enemies.capacity());

    for i in 0..count {
        let type_index = enemies.type_index(i);
        let Some(cfg) = config.enemies.get(type_index) else {
            continue;
        };
        let tier = enemies.tier(i).min(MAX_TIER);

        if !enemies.is_alive(i) {
            let death = enemies.get(i, field::DEATH);
            if death > 0.0 {
                let death = death + cfg.death_anim_speed.resolve(tier) * scale;
                enemies.set(i, field::DEATH, death);
                if death >= cfg.death_frames {
                    spawn_enemy(enemies, i, type_index, true, config, plan, rng);
                }
            }
            continue;
        }

        let pos = Vec2::from(enemies.position(i));
        let to_ship = ship - pos;
        let dist_sq = to_ship.length_squared();
        let dist = dist_sq.sqrt();
        let charging = enemies.is_charging(i);

        if !charging && dist_sq > FAR_RECYCLE_DIST_SQ {
            spawn_enemy(enemies, i, type_index, true, config, plan, rng);
            continue;
        }

        let look = if dist > 0.0 { to_ship / dist } else { Vec2::ZERO };
        let target_radius = cfg.attack_range.resolve(tier);
        let tier_size = config.loot.tier(tier).map_or(1.0, |t| t.size_mult);
        let personal_space = cfg.size * plan.size_multiplier * tier_size + cfg.spacing;
        let charge_dir = Vec2::new(enemies.get(i, field::CHARGE_DX), enemies.get(i, field::CHARGE_DY));

        let (mut steer, speed_cap) = if charging {
            let charge_speed = cfg.charge_speed.resolve(tier);
            (charge_dir * charge_speed, charge_speed)
        } else {
            let diff = dist - target_radius;
            let pull = (if diff > 0.0 { 0.5 } else { -0.25 }) * diff.abs();
            (look * pull, enemies.get(i, field::SPEED) * 2.0)
        };

        if !charging && dist_sq < SEPARATION_RANGE_SQ && (first_step || i % 2 == 0) {
            steer += separation(enemies, grid, i, pos, personal_space);
        }

        let mag_sq = steer.length_squared();
        if mag_sq > 0.01 {
            let mag = mag_sq.sqrt();
            let step = steer * (speed_cap.min(mag * STEER_GAIN) / mag) * scale;
            enemies.add(i, field::X, step.x);
            enemies.add(i, field::Y, step.y);

            let facing = if charging { charge_dir } else { to_ship };
            let angle = facing.y.atan2(facing.x);
            enemies.set(i, field::LOOK, angle);
            enemies.set(i, field::ROTATION, angle + cfg.base_rotation);

            let walk = cfg.walk_anim_speed.resolve(tier);
            let frame = enemies.get(i, field::FRAME) + step.length() * walk * stride * rng.jitter();
            enemies.set(i, field::FRAME, frame % cfg.walk_frames);
        }

        if cfg.can_charge && (charging || dist <= target_radius * ATTACK_TRIGGER_MULT) {
            let ctx = AttackContext {
                cfg,
                tier,
                target_radius,
                stat_mult,
                stride,
                scale,
            };
            if let Some(damage) = process_attack(enemies, i, ship, &ctx, rng) {
                pending_player_hits.push(damage);
            }
        }
    }
}

/// Inverse-distance push away from grid neighbors inside `personal_space`
fn separation(
    store: &EnemyStore,
    grid: &SpatialGrid,
    index: usize,
    pos: Vec2,
    personal_space: f32,
) -> Vec2 {
    let space_sq = personal_space * personal_space;
    let mut force = Vec2::ZERO;
    let mut neighbors = 0;
    let candidates = grid
        .cells_around(pos.x, pos.y, grid.cell_size())
        .flat_map(|cell| grid.chain(cell))
        .take(HARD_SCAN_CAP);
    for other in candidates {
        if other == index {
            continue;
        }
        let away = pos - Vec2::from(store.position(other));
        let d_sq = away.length_squared();
        if d_sq > 0.0 && d_sq < space_sq {
            let d = d_sq.sqrt();
            force += away * ((personal_space - d) / (personal_space * d) * SEPARATION_STRENGTH);
            neighbors += 1;
            if neighbors >= NEIGHBOR_CAP {
                break;
            }
        }
    }
    force
}

struct AttackContext<'a> {
    cfg: &'a EnemyTypeConfig,
    tier: usize,
    target_radius: f32,
    stat_mult: f32,
    stride: f32,
    scale: f32,
}

/// Start or advance a charge. Returns damage when the attack animation
/// crosses its halfway frame.
fn process_attack(
    store: &mut EnemyStore,
    index: usize,
    ship: Vec2,
    ctx: &AttackContext<'_>,
    rng: &mut SimRng,
) -> Option<f32> {
    let pos = Vec2::from(store.position(index));
    let attack = store.get(index, field::ATTACK);
    if attack == 0.0 {
        let dir = (ship - pos).normalize_or(Vec2::X);
        let record = store.record_mut(index);
        record[field::ATTACK] = ATTACK_START;
        record[field::CHARGE_DX] = dir.x;
        record[field::CHARGE_DY] = dir.y;
        record[field::CHARGE_SX] = pos.x;
        record[field::CHARGE_SY] = pos.y;
        return None;
    }

    let cfg = ctx.cfg;
    let prev_frame = attack.floor();
    let speed = cfg.attack_anim_speed.resolve(ctx.tier);
    let mut next = attack + speed * ctx.stride * rng.jitter() * ctx.scale;
    if next >= cfg.attack_frames {
        next %= cfg.attack_frames;
    }
    // Wrapping to exactly zero would read as idle
    store.set(index, field::ATTACK, next.max(f32::MIN_POSITIVE));

    let half = cfg.attack_frames / 2.0;
    let damage = (prev_frame < half && next.floor() >= half).then(|| {
        let roll = cfg.damage_min + rng.uniform() * (cfg.damage_max - cfg.damage_min);
        (roll * ctx.stat_mult).min(f32::MAX)
    });

    let start = Vec2::new(store.get(index, field::CHARGE_SX), store.get(index, field::CHARGE_SY));
    let traveled = pos.distance(start);
    if traveled >= ctx.target_radius * cfg.charge_distance_mult.resolve(ctx.tier) {
        let record = store.record_mut(index);
        record[field::ATTACK] = 0.0;
        record[field::CHARGE_DX] = 0.0;
        record[field::CHARGE_DY] = 0.0;
    }
    damage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::testing::{place_enemy, test_state};
    use crate::sim::store::DEATH_START;

    #[test]
    fn test_spawn_on_ring_around_center() {
        let mut state = test_state();
        let GameState { config, plan, enemies, rng, .. } = &mut state;
        for slot in 0..32 {
            spawn_enemy(enemies, slot, 0, false, config, plan, rng);
            let cfg = &config.enemies[0];
            let dist = Vec2::from(enemies.position(slot)).distance(plan.center);
            assert!(dist >= cfg.start_dist - 1.0 && dist <= cfg.start_dist * 1.5 + 1.0);
            assert_eq!(enemies.type_index(slot), 0);
            assert_eq!(enemies.get(slot, field::DEATH), 0.0);
            assert_eq!(enemies.get(slot, field::ATTACK), 0.0);
            assert!(enemies.get(slot, field::FRAME) < cfg.walk_frames);
        }
    }

    #[test]
    fn test_far_spawn_ring() {
        let mut state = test_state();
        let GameState { config, plan, enemies, rng, .. } = &mut state;
        spawn_enemy(enemies, 0, 0, true, config, plan, rng);
        let start = config.enemies[0].start_dist;
        let dist = Vec2::from(enemies.position(0)).distance(plan.center);
        assert!(dist >= start * 1.5 - 1.0);
    }

    #[test]
    fn test_spawn_health_scales_with_tier_and_stage() {
        let mut state = test_state();
        state.plan.stat_multiplier = 3.0;
        state.plan.tier_chances.alpha = 1.0;
        let GameState { config, plan, enemies, rng, .. } = &mut state;
        spawn_enemy(enemies, 0, 0, false, config, plan, rng);
        assert_eq!(enemies.tier(0), 4);
        let expected = config.enemies[0].health_max * config.loot.tiers[4].health_mult * 3.0;
        assert!((enemies.health(0) - expected).abs() < 1.0);
    }

    #[test]
    fn test_spawn_health_clamped_to_f32() {
        let mut state = test_state();
        state.plan.stat_multiplier = 1e300;
        let GameState { config, plan, enemies, rng, .. } = &mut state;
        spawn_enemy(enemies, 0, 0, false, config, plan, rng);
        assert!(enemies.health(0).is_finite());
        assert_eq!(enemies.health(0), f32::MAX);
    }

    #[test]
    fn test_seeker_closes_to_standoff() {
        let mut state = test_state();
        place_enemy(&mut state, 0, 0, 20000.0, 0.0, 50.0);
        for _ in 0..5 {
            update_enemies(&mut state, FRAME_MS, true);
        }
        let (x, y) = state.enemies.position(0);
        assert!(x < 20000.0);
        assert!(y.abs() < 1e-3);
        // Facing the ship (west)
        assert!((state.enemies.get(0, field::LOOK).abs() - std::f32::consts::PI).abs() < 1e-4);
        assert_eq!(enemy_phase(&state.enemies, 0), EnemyPhase::Seeking);
    }

    #[test]
    fn test_enemy_inside_standoff_backs_off() {
        let mut state = test_state();
        state.config.enemies[0].can_charge = false;
        place_enemy(&mut state, 0, 0, 500.0, 0.0, 50.0);
        update_enemies(&mut state, FRAME_MS, true);
        let (x, _) = state.enemies.position(0);
        assert!(x > 500.0);
    }

    #[test]
    fn test_charge_keeps_direction_and_ends() {
        let mut state = test_state();
        let range = state.config.enemies[0].attack_range.resolve(0);
        place_enemy(&mut state, 0, 0, range, 0.0, 1e9);
        update_enemies(&mut state, FRAME_MS, true);
        assert_eq!(enemy_phase(&state.enemies, 0), EnemyPhase::Charging);
        assert_eq!(state.enemies.get(0, field::CHARGE_DX), -1.0);

        // Moving the ship does not re-aim the charge
        state.player.pos = Vec2::new(0.0, 50000.0);
        let mut ended = false;
        for _ in 0..400 {
            update_enemies(&mut state, FRAME_MS, true);
            if !state.enemies.is_charging(0) {
                ended = true;
                break;
            }
            assert!(state.enemies.position(0).1.abs() < 1e-3);
        }
        assert!(ended);
        let (x, _) = state.enemies.position(0);
        let mult = state.config.enemies[0].charge_distance_mult.resolve(0);
        assert!(range - x >= range * mult - 1.0);
    }

    #[test]
    fn test_attack_damages_once_per_cycle() {
        let mut state = test_state();
        state.config.enemies[0].charge_speed = crate::sim::config::TieredStat::flat(0.0);
        let range = state.config.enemies[0].attack_range.resolve(0);
        place_enemy(&mut state, 0, 0, range, 0.0, 1e9);
        let frames = state.config.enemies[0].attack_frames;
        let speed = state.config.enemies[0].attack_anim_speed.resolve(0);
        // Enough steps for two full cycles even at minimum jitter
        let steps = (2.0 * frames / (speed * 0.8)).ceil() as usize + 2;
        for _ in 0..steps {
            update_enemies(&mut state, FRAME_MS, true);
        }
        let hits = state.pending_player_hits.len();
        assert!((2..=3).contains(&hits), "hits = {hits}");
        let cfg = &state.config.enemies[0];
        for &hit in &state.pending_player_hits {
            assert!(hit >= cfg.damage_min && hit <= cfg.damage_max);
        }
    }

    #[test]
    fn test_attack_damage_uses_stage_multiplier() {
        let mut state = test_state();
        state.plan.stat_multiplier = 10.0;
        state.config.enemies[0].charge_speed = crate::sim::config::TieredStat::flat(0.0);
        let range = state.config.enemies[0].attack_range.resolve(0);
        place_enemy(&mut state, 0, 0, range, 0.0, 1e9);
        for _ in 0..200 {
            update_enemies(&mut state, FRAME_MS, true);
        }
        let cfg = &state.config.enemies[0];
        assert!(!state.pending_player_hits.is_empty());
        for &hit in &state.pending_player_hits {
            assert!(hit >= cfg.damage_min * 10.0 && hit <= cfg.damage_max * 10.0);
        }
    }

    #[test]
    fn test_dying_enemy_respawns_after_animation() {
        let mut state = test_state();
        place_enemy(&mut state, 0, 0, 3000.0, 0.0, 0.0);
        state.enemies.set(0, field::DEATH, DEATH_START);
        assert_eq!(enemy_phase(&state.enemies, 0), EnemyPhase::Dying);
        let frames = state.config.enemies[0].death_frames;
        let speed = state.config.enemies[0].death_anim_speed.resolve(0);
        let steps = (frames / speed).ceil() as usize;
        for _ in 0..steps - 1 {
            update_enemies(&mut state, FRAME_MS, true);
        }
        assert_eq!(enemy_phase(&state.enemies, 0), EnemyPhase::Dying);
        update_enemies(&mut state, FRAME_MS, true);
        assert_eq!(enemy_phase(&state.enemies, 0), EnemyPhase::Seeking);
        assert_eq!(state.enemies.get(0, field::DEATH), 0.0);
    }

    #[test]
    fn test_far_enemy_recycled() {
        let mut state = test_state();
        place_enemy(&mut state, 0, 0, 2e6, 0.0, 50.0);
        update_enemies(&mut state, FRAME_MS, true);
        let dist = Vec2::from(state.enemies.position(0)).distance(state.player.pos);
        assert!(dist < 2e5);
    }

    #[test]
    fn test_separation_pushes_apart() {
        let mut state = test_state();
        for cfg in &mut state.config.enemies {
            cfg.can_charge = false;
        }
        let range = state.config.enemies[0].attack_range.resolve(0);
        // Two enemies parked on the standoff ring, almost on top of each other
        place_enemy(&mut state, 0, 0, range, 10.0, 50.0);
        place_enemy(&mut state, 1, 0, range, -10.0, 50.0);
        update_enemies(&mut state, FRAME_MS, true);
        let (_, y0) = state.enemies.position(0);
        let (_, y1) = state.enemies.position(1);
        assert!(y0 > 10.0);
        assert!(y1 < -10.0);
    }

    #[test]
    fn test_traveling_freezes_enemies() {
        let mut state = test_state();
        place_enemy(&mut state, 0, 0, 20000.0, 0.0, 50.0);
        state.player.traveling = true;
        update_enemies(&mut state, FRAME_MS, true);
        assert_eq!(state.enemies.position(0), (20000.0, 0.0));
    }

    #[test]
    fn test_paused_step_moves_nothing() {
        let mut state = test_state();
        place_enemy(&mut state, 0, 0, 20000.0, 0.0, 50.0);
        update_enemies(&mut state, 0.0, true);
        assert_eq!(state.enemies.position(0), (20000.0, 0.0));
    }
}
