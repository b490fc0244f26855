//! Skill instances
//!
//! Supernova fires staggered rings of flame that orbit the ship and burn out
//! after their animation; the Sword of Light hangs eight blades at fixed
//! compass angles for a fixed duration. All instances share one pool.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use glam::Vec2;

use super::config::{GameConfig, SKILL_SLOTS, SWORD_SLOT, SkillConfig};
use super::pool::{Pool, skill};
use super::rng::SimRng;
use crate::consts::FRAME_MS;

/// Instance type tag stored in the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillKind {
    Supernova,
    Sword,
}

impl SkillKind {
    pub fn tag(&self) -> f32 {
        match self {
            SkillKind::Supernova => 0.0,
            SkillKind::Sword => 1.0,
        }
    }

    fn from_tag(tag: f32) -> Self {
        if tag == 1.0 {
            SkillKind::Sword
        } else {
            SkillKind::Supernova
        }
    }
}

/// A castable skill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillId {
    /// Supernova tier 1..=3
    Supernova(u8),
    SwordOfLight,
}

impl SkillId {
    pub const ALL: [SkillId; SKILL_SLOTS] = [
        SkillId::Supernova(1),
        SkillId::Supernova(2),
        SkillId::Supernova(3),
        SkillId::SwordOfLight,
    ];

    /// Cooldown slot
    pub fn slot(&self) -> usize {
        match *self {
            SkillId::Supernova(tier) => (tier.clamp(1, 3) - 1) as usize,
            SkillId::SwordOfLight => SWORD_SLOT,
        }
    }

    pub fn cooldown_ms(&self, skills: &SkillConfig) -> f32 {
        match *self {
            SkillId::Supernova(tier) => supernova_tier(skills, tier as f32).cooldown_ms,
            SkillId::SwordOfLight => skills.sword.cooldown_ms,
        }
    }

    /// Auto-cast range
    pub fn range(&self, skills: &SkillConfig) -> f32 {
        match *self {
            SkillId::Supernova(tier) => supernova_tier(skills, tier as f32).skill_range,
            SkillId::SwordOfLight => skills.sword.skill_range,
        }
    }
}

/// Config for a supernova tier tag; unknown tags use tier 3
fn supernova_tier(skills: &SkillConfig, tier: f32) -> &super::config::SupernovaTier {
    let index = match tier as i32 {
        1 => 0,
        2 => 1,
        _ => 2,
    };
    &skills.supernova[index]
}

/// Blade angles, clockwise from north
const SWORD_ANGLES: [f32; 8] = [
    -FRAC_PI_2,
    -FRAC_PI_4,
    0.0,
    FRAC_PI_4,
    FRAC_PI_2,
    3.0 * FRAC_PI_4,
    PI,
    -3.0 * FRAC_PI_4,
];
/// Tier tag written on sword instances
const SWORD_TIER: f32 = 4.0;

/// A ring waiting for its stagger delay
#[derive(Debug, Clone, Copy)]
struct RingWave {
    due_ms: f64,
    tier: u8,
    ring: u32,
}

/// Damage footprint of one live instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillHit {
    pub position: Vec2,
    pub radius: f32,
    pub damage: f32,
}

#[derive(Debug, Clone)]
pub struct SkillSystem {
    pool: Pool,
    cooldowns: [f32; SKILL_SLOTS],
    waves: Vec<RingWave>,
    wave_capacity: usize,
}

impl SkillSystem {
    pub fn new(capacity: usize, wave_capacity: usize) -> Self {
        Self {
            pool: Pool::new(capacity, skill::STRIDE, skill::ACTIVE),
            cooldowns: [0.0; SKILL_SLOTS],
            waves: Vec::with_capacity(wave_capacity),
            wave_capacity,
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Remaining cooldown per slot (ms)
    pub fn cooldowns(&self) -> &[f32; SKILL_SLOTS] {
        &self.cooldowns
    }

    pub fn is_ready(&self, id: SkillId) -> bool {
        self.cooldowns[id.slot()] <= 0.0
    }

    /// Rings still waiting to spawn
    pub fn pending_waves(&self) -> usize {
        self.waves.len()
    }

    /// Cast a skill. Returns false while it is on cooldown.
    pub fn activate(&mut self, config: &GameConfig, id: SkillId, now_ms: f64, rng: &mut SimRng) -> bool {
        if !self.is_ready(id) {
            return false;
        }
        self.cooldowns[id.slot()] = id.cooldown_ms(&config.skills);

        match id {
            SkillId::Supernova(tier) => {
                let tier = tier.clamp(1, 3);
                let rings = supernova_tier(&config.skills, tier as f32).rings;
                let stagger = config.skills.rings.stagger_ms as f64;
                for ring in 0..rings {
                    if self.waves.len() >= self.wave_capacity {
                        log::trace!("ring wave queue full, dropping {} rings", rings - ring);
                        break;
                    }
                    self.waves.push(RingWave {
                        due_ms: now_ms + stagger * ring as f64,
                        tier,
                        ring,
                    });
                }
                self.spawn_due_rings(config, now_ms, rng);
            }
            SkillId::SwordOfLight => self.spawn_swords(config),
        }
        log::debug!("skill {id:?} activated");
        true
    }

    /// Cast every ready skill whose range covers the target
    pub fn auto_activate(&mut self, config: &GameConfig, target_dist_sq: f32, now_ms: f64, rng: &mut SimRng) {
        for id in SkillId::ALL {
            let range = id.range(&config.skills);
            if self.is_ready(id) && target_dist_sq < range * range {
                self.activate(config, id, now_ms, rng);
            }
        }
    }

    /// Spawn every ring whose stagger delay has elapsed
    pub fn spawn_due_rings(&mut self, config: &GameConfig, now_ms: f64, rng: &mut SimRng) {
        let mut k = 0;
        while k < self.waves.len() {
            if self.waves[k].due_ms <= now_ms {
                let wave = self.waves.swap_remove(k);
                self.spawn_ring(config, wave, rng);
            } else {
                k += 1;
            }
        }
    }

    fn spawn_ring(&mut self, config: &GameConfig, wave: RingWave, rng: &mut SimRng) {
        let layout = &config.skills.rings;
        let count = layout.base_count + layout.count_step * wave.ring;
        let radius = layout.base_radius + layout.radius_step * wave.ring as f32;
        let size = layout.base_size + layout.size_step * wave.ring as f32;
        for i in 0..count {
            let Some(slot) = self.pool.allocate() else {
                log::trace!("skill pool exhausted");
                return;
            };
            let orbit_speed = layout.orbit_speed_min + rng.uniform() * layout.orbit_speed_jitter;
            let record = self.pool.record_mut(slot);
            record[skill::ANGLE] = i as f32 / count as f32 * TAU;
            record[skill::RADIUS] = radius;
            record[skill::SCALE] = size;
            record[skill::ORBIT_SPEED] = orbit_speed;
            record[skill::TIER] = wave.tier as f32;
            record[skill::KIND] = SkillKind::Supernova.tag();
        }
    }

    fn spawn_swords(&mut self, config: &GameConfig) {
        let sword = &config.skills.sword;
        for angle in SWORD_ANGLES {
            let Some(slot) = self.pool.allocate() else {
                log::trace!("skill pool exhausted");
                return;
            };
            let record = self.pool.record_mut(slot);
            record[skill::ANGLE] = angle;
            record[skill::RADIUS] = sword.orbit_radius;
            record[skill::SCALE] = sword.visual_size;
            record[skill::TIER] = SWORD_TIER;
            record[skill::KIND] = SkillKind::Sword.tag();
            record[skill::DURATION] = sword.duration_ms;
        }
    }

    /// Count cooldowns down by simulation time
    pub fn tick_cooldowns(&mut self, dt: f32) {
        for cooldown in &mut self.cooldowns {
            *cooldown = (*cooldown - dt).max(0.0);
        }
    }

    /// Animate, orbit and retire instances
    pub fn update(&mut self, config: &GameConfig, dt: f32) {
        let scale = dt / FRAME_MS;
        let skills = &config.skills;
        for k in (0..self.pool.len()).rev() {
            let slot = self.pool.active_at(k);
            let record = self.pool.record_mut(slot);
            let expired = match SkillKind::from_tag(record[skill::KIND]) {
                SkillKind::Sword => {
                    let sword = &skills.sword;
                    record[skill::FRAME] += sword.anim_speed * scale;
                    if record[skill::FRAME] >= sword.skill_frames {
                        record[skill::FRAME] %= sword.skill_frames;
                    }
                    record[skill::ELAPSED] += dt;
                    record[skill::ELAPSED] >= record[skill::DURATION]
                }
                SkillKind::Supernova => {
                    let tier = supernova_tier(skills, record[skill::TIER]);
                    record[skill::FRAME] += tier.anim_speed * scale;
                    record[skill::ANGLE] += record[skill::ORBIT_SPEED] * scale;
                    record[skill::FRAME] >= tier.skill_frames
                }
            };
            if expired {
                self.pool.release(slot);
            }
        }
    }

    /// World position of an instance orbiting `center`
    pub fn instance_position(&self, slot: usize, center: Vec2) -> Vec2 {
        let angle = self.pool.get(slot, skill::ANGLE);
        center + Vec2::from_angle(angle) * self.pool.get(slot, skill::RADIUS)
    }

    /// Damage footprint of an instance
    pub fn hit(&self, slot: usize, config: &GameConfig, center: Vec2) -> SkillHit {
        let skills = &config.skills;
        let (damage_mult, aoe_mult) = match SkillKind::from_tag(self.pool.get(slot, skill::KIND)) {
            SkillKind::Sword => (skills.sword.damage_mult, skills.sword.aoe_mult),
            SkillKind::Supernova => {
                let tier = supernova_tier(skills, self.pool.get(slot, skill::TIER));
                (tier.damage_mult, tier.aoe_mult)
            }
        };
        SkillHit {
            position: self.instance_position(slot, center),
            radius: self.pool.get(slot, skill::SCALE) * skills.hit_radius_factor * aoe_mult,
            damage: damage_mult * config.combat.damage_per_pop,
        }
    }

    /// Drop instances and queued rings; cooldowns are kept
    pub fn clear(&mut self) {
        self.pool.clear();
        self.waves.clear();
    }

    /// Drop everything including cooldowns
    pub fn reset(&mut self) {
        self.clear();
        self.cooldowns = [0.0; SKILL_SLOTS];
    }
}
