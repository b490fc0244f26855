//! Enemy entity store
//!
//! One flat `f32` buffer, `STRIDE` fields per enemy slot. Slots are
//! allocated once for the maximum population and reused in place on
//! respawn, so a slot index is a stable entity id for the grid.

/// Fields per enemy record
pub const STRIDE: usize = 17;

/// Field offsets within an enemy record
pub mod field {
    pub const X: usize = 0;
    pub const Y: usize = 1;
    /// Reserved, not driven by the AI
    pub const VX: usize = 2;
    pub const VY: usize = 3;
    pub const ROTATION: usize = 4;
    /// Walk animation frame (fractional)
    pub const FRAME: usize = 5;
    pub const SPEED: usize = 6;
    pub const LOOK: usize = 7;
    /// `<= 0` means dead
    pub const HEALTH: usize = 8;
    /// 0 = not dying, > 0 = death frames elapsed
    pub const DEATH: usize = 9;
    /// 0 = idle, > 0 = charging, value is the attack frame
    pub const ATTACK: usize = 10;
    pub const TYPE: usize = 11;
    pub const TIER: usize = 12;
    pub const CHARGE_DX: usize = 13;
    pub const CHARGE_DY: usize = 14;
    pub const CHARGE_SX: usize = 15;
    pub const CHARGE_SY: usize = 16;
}

/// Death progress written on the killing blow
pub const DEATH_START: f32 = 0.001;

/// Fixed-capacity enemy record buffer
#[derive(Debug, Clone)]
pub struct EnemyStore {
    data: Vec<f32>,
    capacity: usize,
}

impl EnemyStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity * STRIDE],
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn get(&self, index: usize, field: usize) -> f32 {
        self.data[index * STRIDE + field]
    }

    #[inline]
    pub fn set(&mut self, index: usize, field: usize, value: f32) {
        self.data[index * STRIDE + field] = value;
    }

    #[inline]
    pub fn add(&mut self, index: usize, field: usize, delta: f32) {
        self.data[index * STRIDE + field] += delta;
    }

    /// Full record for a slot
    #[inline]
    pub fn record(&self, index: usize) -> &[f32] {
        let start = index * STRIDE;
        &self.data[start..start + STRIDE]
    }

    #[inline]
    pub fn record_mut(&mut self, index: usize) -> &mut [f32] {
        let start = index * STRIDE;
        &mut self.data[start..start + STRIDE]
    }

    #[inline]
    pub fn position(&self, index: usize) -> (f32, f32) {
        let base = index * STRIDE;
        (self.data[base + field::X], self.data[base + field::Y])
    }

    #[inline]
    pub fn health(&self, index: usize) -> f32 {
        self.get(index, field::HEALTH)
    }

    /// Alive and targetable
    #[inline]
    pub fn is_alive(&self, index: usize) -> bool {
        self.get(index, field::HEALTH) > 0.0
    }

    /// Alive or playing its death animation (indexed by the grid)
    #[inline]
    pub fn is_live(&self, index: usize) -> bool {
        self.get(index, field::HEALTH) > 0.0 || self.get(index, field::DEATH) > 0.0
    }

    #[inline]
    pub fn is_charging(&self, index: usize) -> bool {
        self.get(index, field::ATTACK) > 0.0
    }

    #[inline]
    pub fn type_index(&self, index: usize) -> usize {
        self.get(index, field::TYPE) as usize
    }

    #[inline]
    pub fn tier(&self, index: usize) -> usize {
        self.get(index, field::TIER) as usize
    }

    /// Zero every record
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Records `0..count` as one flat slice
    pub fn as_slice(&self, count: usize) -> &[f32] {
        &self.data[..count.min(self.capacity) * STRIDE]
    }

    /// Records `0..count` as raw bytes for renderer upload
    pub fn as_bytes(&self, count: usize) -> &[u8] {
        bytemuck::cast_slice(self.as_slice(count))
    }
}
