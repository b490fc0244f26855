//! Fixed-capacity record pools
//!
//! Bullets, skill instances, FX and damage numbers all live in flat `f32`
//! buffers with one "active" field per record. Allocation scans for the
//! first inactive slot; an active-indices array (plus a reverse map) gives
//! O(active) iteration and O(1) swap-remove release.

/// Bullet record layout
pub mod bullet {
    pub const STRIDE: usize = 9;
    pub const X: usize = 0;
    pub const Y: usize = 1;
    pub const VX: usize = 2;
    pub const VY: usize = 3;
    /// Remaining life in ms
    pub const LIFE: usize = 4;
    pub const ACTIVE: usize = 5;
    /// Weapon type tag
    pub const KIND: usize = 6;
    /// Hits left before the bullet is spent
    pub const PENETRATION: usize = 7;
    pub const DAMAGE: usize = 8;
}

/// Skill instance record layout
pub mod skill {
    pub const STRIDE: usize = 10;
    pub const ANGLE: usize = 0;
    pub const FRAME: usize = 1;
    pub const RADIUS: usize = 2;
    /// Visual scale, also drives hit radius
    pub const SCALE: usize = 3;
    pub const ORBIT_SPEED: usize = 4;
    pub const TIER: usize = 5;
    pub const KIND: usize = 6;
    pub const ELAPSED: usize = 7;
    pub const DURATION: usize = 8;
    pub const ACTIVE: usize = 9;
}

/// FX particle record layout
pub mod fx {
    pub const STRIDE: usize = 9;
    pub const X: usize = 0;
    pub const Y: usize = 1;
    pub const VX: usize = 2;
    pub const VY: usize = 3;
    /// Remaining life in ms
    pub const LIFE: usize = 4;
    pub const KIND: usize = 5;
    pub const FRAME: usize = 6;
    pub const SIZE: usize = 7;
    pub const ACTIVE: usize = 8;
}

/// Damage number record layout
pub mod damage_number {
    pub const STRIDE: usize = 10;
    pub const X: usize = 0;
    pub const Y: usize = 1;
    pub const VX: usize = 2;
    pub const VY: usize = 3;
    /// 1.0 at spawn, fades to 0
    pub const LIFE: usize = 4;
    pub const VALUE: usize = 5;
    pub const CRIT_TIER: usize = 6;
    /// 1.0 for lucky hits
    pub const LUCKY: usize = 7;
    pub const ACTIVE: usize = 8;
    /// Simulation time of the first merged hit (ms)
    pub const SPAWNED_MS: usize = 9;
}

const NO_POSITION: u32 = u32::MAX;

/// Fixed-capacity pool of flat `f32` records
#[derive(Debug, Clone)]
pub struct Pool {
    data: Vec<f32>,
    stride: usize,
    active_field: usize,
    capacity: usize,
    /// Active slot indices, unordered
    active: Vec<u32>,
    /// Position of each slot in `active`, `NO_POSITION` when inactive
    positions: Vec<u32>,
}

impl Pool {
    pub fn new(capacity: usize, stride: usize, active_field: usize) -> Self {
        debug_assert!(active_field < stride);
        Self {
            data: vec![0.0; capacity * stride],
            stride,
            active_field,
            capacity,
            active: Vec::with_capacity(capacity),
            positions: vec![NO_POSITION; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of active records
    #[inline]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Claim the first inactive slot. `None` when the pool is full.
    pub fn allocate(&mut self) -> Option<usize> {
        if self.active.len() >= self.capacity {
            return None;
        }
        let slot = (0..self.capacity).find(|&i| self.data[i * self.stride + self.active_field] == 0.0)?;
        let base = slot * self.stride;
        self.data[base..base + self.stride].fill(0.0);
        self.data[base + self.active_field] = 1.0;
        self.positions[slot] = self.active.len() as u32;
        self.active.push(slot as u32);
        Some(slot)
    }

    /// Free a slot. Releasing an inactive slot is a no-op.
    pub fn release(&mut self, slot: usize) {
        if slot >= self.capacity {
            return;
        }
        let pos = self.positions[slot];
        if pos == NO_POSITION {
            return;
        }
        self.data[slot * self.stride + self.active_field] = 0.0;
        self.positions[slot] = NO_POSITION;
        let pos = pos as usize;
        let Some(last) = self.active.pop() else {
            return;
        };
        if pos < self.active.len() {
            self.active[pos] = last;
            self.positions[last as usize] = pos as u32;
        }
    }

    #[inline]
    pub fn is_active(&self, slot: usize) -> bool {
        slot < self.capacity && self.positions[slot] != NO_POSITION
    }

    /// Active slot indices (unordered)
    #[inline]
    pub fn active_indices(&self) -> &[u32] {
        &self.active
    }

    /// Slot at position `k` of the active list
    #[inline]
    pub fn active_at(&self, k: usize) -> usize {
        self.active[k] as usize
    }

    #[inline]
    pub fn get(&self, slot: usize, field: usize) -> f32 {
        self.data[slot * self.stride + field]
    }

    #[inline]
    pub fn set(&mut self, slot: usize, field: usize, value: f32) {
        self.data[slot * self.stride + field] = value;
    }

    #[inline]
    pub fn add(&mut self, slot: usize, field: usize, delta: f32) {
        self.data[slot * self.stride + field] += delta;
    }

    #[inline]
    pub fn record(&self, slot: usize) -> &[f32] {
        let base = slot * self.stride;
        &self.data[base..base + self.stride]
    }

    #[inline]
    pub fn record_mut(&mut self, slot: usize) -> &mut [f32] {
        let base = slot * self.stride;
        &mut self.data[base..base + self.stride]
    }

    /// Release every record
    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.active.clear();
        self.positions.fill(NO_POSITION);
    }

    /// Whole backing buffer (renderers index it with `active_indices`)
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}
