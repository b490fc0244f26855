//! Damage resolution
//!
//! Every damage source (player aura, projectiles, skill instances) funnels
//! into [`resolve_hit`]: crit and lucky rolls, health subtraction, damage
//! number, and exactly one kill event when health crosses zero.

use glam::Vec2;

use super::config::{CombatConfig, CritConfig, MAX_TIER};
use super::effects::FxKind;
use super::loot::roll_drops;
use super::pool::bullet;
use super::rng::SimRng;
use super::skills::SkillHit;
use super::state::{GameState, KillEvent};
use super::store::{DEATH_START, field};
use crate::consts::FRAME_MS;

/// Damage numbers float this far above the hit point
const POPUP_OFFSET_Y: f32 = 50.0;
const EXPLOSION_LIFE_MS: f32 = 500.0;
const EXPLOSION_SIZE: f32 = 80.0;
const SPARK_LIFE_MS: f32 = 300.0;
const SPARK_SIZE: f32 = 10.0;
const SPARK_SPEED: f32 = 10.0;

/// Random modifiers of a single hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitRoll {
    pub crit_tier: usize,
    pub lucky: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Target was already dead
    Miss,
    Damaged,
    Killed,
}

/// Recursive crit: tier 1 on the base chance, then one tier per successful
/// escalation roll up to the top tier.
pub fn roll_crit_tier(crit: &CritConfig, rng: &mut SimRng) -> usize {
    if !rng.chance(crit.base_chance) {
        return 0;
    }
    let mut tier = 1;
    while tier < MAX_TIER && rng.chance(crit.recursive_chance) {
        tier += 1;
    }
    tier
}

pub fn roll_hit(combat: &CombatConfig, rng: &mut SimRng) -> HitRoll {
    let lucky = rng.chance(combat.lucky_chance);
    HitRoll {
        crit_tier: roll_crit_tier(&combat.crit, rng),
        lucky,
    }
}

/// Apply `base` damage, multiplied by the crit tier, to a live enemy.
///
/// Health is clamped at zero on a kill so death is detected exactly once.
pub fn resolve_hit(state: &mut GameState, index: usize, base: f32, roll: HitRoll, popup: Vec2) -> HitOutcome {
    let health = state.enemies.health(index);
    if health <= 0.0 {
        return HitOutcome::Miss;
    }
    let multiplier = state
        .config
        .combat
        .crit
        .multipliers
        .get(roll.crit_tier)
        .copied()
        .unwrap_or(1.0);
    let damage = base * multiplier;

    if state.settings.damage_numbers {
        state.damage_numbers.spawn(
            &mut state.rng,
            state.clock_ms,
            popup.x,
            popup.y,
            damage,
            roll.crit_tier,
            roll.lucky,
        );
    }

    let remaining = health - damage;
    if remaining > 0.0 {
        state.enemies.set(index, field::HEALTH, remaining);
        HitOutcome::Damaged
    } else {
        kill_enemy(state, index, roll.lucky);
        HitOutcome::Killed
    }
}

fn kill_enemy(state: &mut GameState, index: usize, lucky: bool) {
    state.enemies.set(index, field::HEALTH, 0.0);
    state.enemies.set(index, field::DEATH, DEATH_START);
    state.kill_count += 1;
    state.stage_kill_count += 1;

    let position = Vec2::from(state.enemies.position(index));
    if state.settings.particles {
        state.fx.spawn(
            position.x,
            position.y,
            0.0,
            0.0,
            EXPLOSION_LIFE_MS,
            FxKind::Explosion,
            EXPLOSION_SIZE,
        );
    }

    let type_index = state.enemies.type_index(index);
    let tier = state.enemies.tier(index).min(MAX_TIER);
    let GameState {
        config,
        rng,
        loot,
        plan,
        ..
    } = state;
    if let Some(cfg) = config.enemies.get(type_index) {
        let reward_scale = plan.reward_scale;
        roll_drops(&config.loot, &cfg.key, tier, lucky, rng, |item, amount| {
            loot.push(item, (amount as f64 * reward_scale).floor() as u64);
        });
    }

    if let Some(hook) = state.hooks.on_kill.as_mut() {
        hook(KillEvent {
            index,
            type_index,
            tier,
            lucky,
            position,
        });
    }
}

/// Collision radius of an enemy, scaled by tier and stage size
fn hit_radius(state: &GameState, index: usize) -> f32 {
    let size = state
        .config
        .enemies
        .get(state.enemies.type_index(index))
        .map_or(0.0, |cfg| cfg.size);
    let tier_size = state
        .config
        .loot
        .tier(state.enemies.tier(index))
        .map_or(1.0, |t| t.size_mult);
    size * tier_size * state.plan.size_multiplier * state.config.combat.hit_radius_factor
}

/// Damage every live enemy within `radius` of `center` by `base`
fn damage_area(state: &mut GameState, center: Vec2, radius: f32, base: f32) {
    let mut candidates = std::mem::take(&mut state.scratch);
    candidates.clear();
    candidates.extend(state.grid.query_radius(center.x, center.y, radius).map(|i| i as u32));

    let radius_sq = radius * radius;
    for &i in &candidates {
        let i = i as usize;
        if !state.enemies.is_alive(i) {
            continue;
        }
        let position = Vec2::from(state.enemies.position(i));
        if position.distance_squared(center) >= radius_sq {
            continue;
        }
        let roll = roll_hit(&state.config.combat, &mut state.rng);
        let popup = position - Vec2::new(0.0, POPUP_OFFSET_Y);
        resolve_hit(state, i, base, roll, popup);
    }
    state.scratch = candidates;
}

/// Passive aura: flat damage to every enemy touching the ship
pub fn process_aoe_damage(state: &mut GameState) {
    let center = state.player.pos;
    let combat = &state.config.combat;
    let (radius, base) = (combat.aoe_radius, combat.damage_per_pop);
    damage_area(state, center, radius, base);
}

/// Every live skill instance damages the enemies under it
pub fn process_skill_damage(state: &mut GameState) {
    if state.skills.pool().is_empty() {
        return;
    }
    let mut hits = std::mem::take(&mut state.skill_hits);
    hits.clear();
    let center = state.player.pos;
    for &slot in state.skills.pool().active_indices() {
        hits.push(state.skills.hit(slot as usize, &state.config, center));
    }
    for &SkillHit {
        position,
        radius,
        damage,
    } in &hits
    {
        damage_area(state, position, radius, damage);
    }
    state.skill_hits = hits;
}

/// Spawn one projectile from a weapon mount in ship space
pub fn fire_weapon(state: &mut GameState, weapon: usize) {
    let Some(cfg) = state.config.weapons.get(weapon) else {
        return;
    };
    let (sin, cos) = state.player.rotation.sin_cos();
    let side = Vec2::new(-sin, cos) * cfg.offset_side;
    let front = Vec2::new(cos, sin) * cfg.offset_front;
    let origin = state.player.pos + side + front;

    let Some(slot) = state.bullets.allocate() else {
        log::trace!("bullet pool exhausted");
        return;
    };
    let record = state.bullets.record_mut(slot);
    record[bullet::X] = origin.x;
    record[bullet::Y] = origin.y;
    record[bullet::VX] = cos * cfg.speed;
    record[bullet::VY] = sin * cfg.speed;
    record[bullet::LIFE] = cfg.life_ms;
    record[bullet::KIND] = cfg.kind.tag();
    record[bullet::PENETRATION] = cfg.penetration.max(1.0);
    record[bullet::DAMAGE] = cfg.damage;
}

fn spawn_sparks(state: &mut GameState, at: Vec2) {
    if !state.settings.particles {
        return;
    }
    for _ in 0..state.settings.quality.sparks_per_kill() {
        let vx = (state.rng.uniform() - 0.5) * SPARK_SPEED;
        let vy = (state.rng.uniform() - 0.5) * SPARK_SPEED;
        state
            .fx
            .spawn(at.x, at.y, vx, vy, SPARK_LIFE_MS, FxKind::Spark, SPARK_SIZE);
    }
}

/// Move projectiles, age them, and resolve hits against enemies in the
/// projectile's own grid cell.
pub fn update_bullets(state: &mut GameState, dt: f32) {
    let scale = dt / FRAME_MS;
    for k in (0..state.bullets.len()).rev() {
        let slot = state.bullets.active_at(k);
        let record = state.bullets.record_mut(slot);
        record[bullet::X] += record[bullet::VX] * scale;
        record[bullet::Y] += record[bullet::VY] * scale;
        record[bullet::LIFE] -= dt;
        let at = Vec2::new(record[bullet::X], record[bullet::Y]);
        let damage = record[bullet::DAMAGE];
        if record[bullet::LIFE] <= 0.0 {
            state.bullets.release(slot);
            continue;
        }

        let Some(cell) = state.grid.cell_index(at.x, at.y) else {
            continue;
        };
        let mut candidates = std::mem::take(&mut state.scratch);
        candidates.clear();
        candidates.extend(state.grid.chain(cell).map(|i| i as u32));

        let mut spent = false;
        for &i in &candidates {
            let i = i as usize;
            if !state.enemies.is_alive(i) {
                continue;
            }
            let radius = hit_radius(state, i);
            if Vec2::from(state.enemies.position(i)).distance_squared(at) >= radius * radius {
                continue;
            }
            let roll = roll_hit(&state.config.combat, &mut state.rng);
            let popup = at - Vec2::new(0.0, POPUP_OFFSET_Y);
            if resolve_hit(state, i, damage, roll, popup) == HitOutcome::Killed {
                spawn_sparks(state, at);
            }
            let penetration = state.bullets.get(slot, bullet::PENETRATION) - 1.0;
            state.bullets.set(slot, bullet::PENETRATION, penetration);
            if penetration <= 0.0 {
                spent = true;
                break;
            }
        }
        state.scratch = candidates;

        if spent {
            state.bullets.release(slot);
        }
    }
}
