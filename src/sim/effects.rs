//! Damage numbers and FX particles
//!
//! Both are pure pools the renderer reads every frame. Nothing here
//! affects gameplay.

use super::pool::{Pool, damage_number as dn, fx};
use super::rng::SimRng;
use crate::consts::{DAMAGE_BATCH_WINDOW_MS, FRAME_MS};

/// FX particle kind tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FxKind {
    Explosion,
    Spark,
}

impl FxKind {
    pub fn tag(&self) -> f32 {
        match self {
            FxKind::Explosion => 1.0,
            FxKind::Spark => 2.0,
        }
    }
}

/// Fade per reference frame
const DAMAGE_NUMBER_FADE: f32 = 0.02;
/// FX animation frames per reference frame
const FX_FRAME_RATE: f32 = 0.5;

/// Floating damage numbers with same-tier merging
#[derive(Debug, Clone)]
pub struct DamageNumbers {
    pool: Pool,
    /// Most recently spawned slot, merge candidate
    last: Option<usize>,
    /// Sim time of `last`; the clock outgrows f32 precision on long runs
    last_spawned_ms: f64,
}

impl DamageNumbers {
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: Pool::new(capacity, dn::STRIDE, dn::ACTIVE),
            last: None,
            last_spawned_ms: 0.0,
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Emit a number, merging into the most recent one when it has the same
    /// crit tier and was spawned within the batch window.
    ///
    /// Returns the slot that now carries the value, `None` if the pool is full.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &mut self,
        rng: &mut SimRng,
        now_ms: f64,
        x: f32,
        y: f32,
        value: f32,
        crit_tier: usize,
        lucky: bool,
    ) -> Option<usize> {
        if let Some(slot) = self.merge_target(now_ms, crit_tier) {
            self.pool.add(slot, dn::VALUE, value);
            self.pool.set(slot, dn::LIFE, 1.0);
            if lucky {
                self.pool.set(slot, dn::LUCKY, 1.0);
            }
            return Some(slot);
        }

        let Some(slot) = self.pool.allocate() else {
            log::trace!("damage number pool exhausted");
            return None;
        };
        let record = self.pool.record_mut(slot);
        record[dn::X] = x;
        record[dn::Y] = y;
        record[dn::VX] = (rng.uniform() - 0.5) * 5.0;
        record[dn::VY] = -5.0 - rng.uniform() * 2.0;
        record[dn::LIFE] = 1.0;
        record[dn::VALUE] = value;
        record[dn::CRIT_TIER] = crit_tier as f32;
        record[dn::LUCKY] = if lucky { 1.0 } else { 0.0 };
        record[dn::SPAWNED_MS] = now_ms as f32;
        self.last = Some(slot);
        self.last_spawned_ms = now_ms;
        Some(slot)
    }

    fn merge_target(&self, now_ms: f64, crit_tier: usize) -> Option<usize> {
        let slot = self.last?;
        let fresh = now_ms - self.last_spawned_ms < DAMAGE_BATCH_WINDOW_MS;
        (self.pool.is_active(slot)
            && self.pool.get(slot, dn::CRIT_TIER) as usize == crit_tier
            && fresh)
            .then_some(slot)
    }

    /// Drift and fade; expired numbers are released
    pub fn update(&mut self, dt: f32) {
        let scale = dt / FRAME_MS;
        for k in (0..self.pool.len()).rev() {
            let slot = self.pool.active_at(k);
            let record = self.pool.record_mut(slot);
            record[dn::LIFE] -= DAMAGE_NUMBER_FADE * scale;
            record[dn::X] += record[dn::VX] * scale;
            record[dn::Y] += record[dn::VY] * scale;
            if record[dn::LIFE] <= 0.0 {
                self.pool.release(slot);
            }
        }
    }

    pub fn clear(&mut self) {
        self.pool.clear();
        self.last = None;
    }
}

/// Explosion and spark particles
#[derive(Debug, Clone)]
pub struct FxPool {
    pool: Pool,
}

impl FxPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: Pool::new(capacity, fx::STRIDE, fx::ACTIVE),
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &mut self,
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        life_ms: f32,
        kind: FxKind,
        size: f32,
    ) -> Option<usize> {
        let Some(slot) = self.pool.allocate() else {
            log::trace!("fx pool exhausted");
            return None;
        };
        let record = self.pool.record_mut(slot);
        record[fx::X] = x;
        record[fx::Y] = y;
        record[fx::VX] = vx;
        record[fx::VY] = vy;
        record[fx::LIFE] = life_ms;
        record[fx::KIND] = kind.tag();
        record[fx::SIZE] = size;
        Some(slot)
    }

    pub fn update(&mut self, dt: f32) {
        let scale = dt / FRAME_MS;
        for k in (0..self.pool.len()).rev() {
            let slot = self.pool.active_at(k);
            let record = self.pool.record_mut(slot);
            record[fx::X] += record[fx::VX] * scale;
            record[fx::Y] += record[fx::VY] * scale;
            record[fx::LIFE] -= dt;
            record[fx::FRAME] += FX_FRAME_RATE * scale;
            if record[fx::LIFE] <= 0.0 {
                self.pool.release(slot);
            }
        }
    }

    pub fn clear(&mut self) {
        self.pool.clear();
    }
}
