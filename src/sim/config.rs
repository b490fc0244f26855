//! Static configuration tables
//!
//! Everything the simulation reads but never writes: enemy types, weapons,
//! ship, skills, crit/loot tables, stages, grid and pool sizes. The built-in
//! tables come from `Default`; hosts may replace them with JSON.

use std::collections::BTreeMap;
use std::f32::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of enemy tiers (base + four elite ranks)
pub const TIER_COUNT: usize = 5;
/// Highest tier index
pub const MAX_TIER: usize = TIER_COUNT - 1;

/// Number of skill slots (three Supernova tiers + Sword of Light)
pub const SKILL_SLOTS: usize = 4;
/// Skill slot used by the Sword of Light
pub const SWORD_SLOT: usize = 3;

// ============================================================================
// Errors
// ============================================================================

/// Failure while loading or validating configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Malformed JSON or a field of the wrong shape
    Json(serde_json::Error),
    /// The enemy type table is empty
    EmptyEnemyTable,
    /// A table references an enemy type that does not exist
    UnknownEnemy { context: String, key: String },
    /// A drop table references an item that does not exist
    UnknownItem { context: String, key: String },
    /// The loot tier table must have one entry per tier
    TierTableLength { found: usize },
    /// A tier multiplier decreases from one tier to the next
    NonMonotonicTier { field: &'static str, tier: usize },
    /// A pool or store was configured with zero capacity
    ZeroCapacity { pool: &'static str },
    /// The stage list is empty or a stage has no enemies
    EmptyStage { stage: usize },
    /// A divisor-like value (frame count, cell size) is zero, negative or NaN
    NonPositive { context: String, field: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid config JSON: {err}"),
            Self::EmptyEnemyTable => write!(f, "enemy type table is empty"),
            Self::UnknownEnemy { context, key } => {
                write!(f, "{context} references unknown enemy type '{key}'")
            }
            Self::UnknownItem { context, key } => {
                write!(f, "{context} references unknown loot item '{key}'")
            }
            Self::TierTableLength { found } => {
                write!(f, "loot tier table has {found} entries, expected {TIER_COUNT}")
            }
            Self::NonMonotonicTier { field, tier } => {
                write!(f, "tier {tier} {field} is lower than tier {}", tier - 1)
            }
            Self::ZeroCapacity { pool } => write!(f, "{pool} capacity must be non-zero"),
            Self::EmptyStage { stage } => write!(f, "stage {stage} has no enemies"),
            Self::NonPositive { context, field } => write!(f, "{context} {field} must be positive"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

// ============================================================================
// Tiered stats
// ============================================================================

/// A stat with optional per-tier overrides for tiers 1..=4
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TieredStat {
    pub base: f32,
    #[serde(default)]
    pub overrides: [Option<f32>; 4],
}

impl TieredStat {
    pub const fn flat(base: f32) -> Self {
        Self {
            base,
            overrides: [None; 4],
        }
    }

    pub const fn tiered(base: f32, overrides: [Option<f32>; 4]) -> Self {
        Self { base, overrides }
    }

    /// Value for a tier: the override when present, otherwise the base
    #[inline]
    pub fn resolve(&self, tier: usize) -> f32 {
        match tier {
            1..=MAX_TIER => self.overrides[tier - 1].unwrap_or(self.base),
            _ => self.base,
        }
    }
}

/// Loot/stat scaling for one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierScaling {
    pub id: String,
    pub chance_mult: f32,
    pub amount_mult: f32,
    pub health_mult: f32,
    pub size_mult: f32,
}

/// Elite roll probabilities for a stage
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TierChances {
    pub arch: f32,
    pub god: f32,
    pub omega: f32,
    pub alpha: f32,
}

impl TierChances {
    /// Map a uniform roll in [0, 1) to a tier, highest tier first
    pub fn tier_for_roll(&self, roll: f32) -> usize {
        let mut threshold = self.alpha;
        if roll < threshold {
            return 4;
        }
        threshold += self.omega;
        if roll < threshold {
            return 3;
        }
        threshold += self.god;
        if roll < threshold {
            return 2;
        }
        threshold += self.arch;
        if roll < threshold {
            return 1;
        }
        0
    }
}

// ============================================================================
// Enemies
// ============================================================================

/// Static stats and animation metadata for one enemy type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyTypeConfig {
    /// Internal key (matches stage compositions and drop tables)
    pub key: String,
    /// Visual/collision size in world units
    pub size: f32,
    pub health_max: f32,
    /// Per-frame movement speed
    pub move_speed: TieredStat,
    /// Extra personal space added to size for separation
    pub spacing: f32,
    pub start_dist: f32,
    /// Standoff distance and charge trigger range
    pub attack_range: TieredStat,
    pub damage_min: f32,
    pub damage_max: f32,
    pub walk_frames: f32,
    pub death_frames: f32,
    pub attack_frames: f32,
    pub walk_anim_speed: TieredStat,
    pub attack_anim_speed: TieredStat,
    pub death_anim_speed: TieredStat,
    /// Sprite rotation offset added to the look angle
    pub base_rotation: f32,
    /// Whether the type performs ram attacks
    pub can_charge: bool,
    pub charge_speed: TieredStat,
    /// Charge length as a multiple of attack range
    pub charge_distance_mult: TieredStat,
}

// ============================================================================
// Weapons & ship
// ============================================================================

/// Weapon mount, also the bullet type tag read by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    LeftTurret,
    RightTurret,
    Laser,
}

impl WeaponKind {
    pub fn tag(&self) -> f32 {
        match self {
            WeaponKind::LeftTurret => 0.0,
            WeaponKind::RightTurret => 1.0,
            WeaponKind::Laser => 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponConfig {
    pub key: String,
    pub kind: WeaponKind,
    /// Shots per second
    pub fire_rate: f32,
    pub damage: f32,
    /// Per-frame projectile speed
    pub speed: f32,
    pub life_ms: f32,
    pub offset_side: f32,
    pub offset_front: f32,
    pub penetration: f32,
    pub max_ammo: f32,
    /// Ammo regained per second
    pub recovery_rate: f32,
    /// Ammo needed to leave recharge lockout
    pub min_ammo_to_fire: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipConfig {
    pub health_max: f32,
    /// Per-frame combat movement speed
    pub speed: f32,
    /// Travel speed as a multiple of `speed`
    pub travel_speed_mult: f32,
    /// Travel ends inside this distance of the stage center
    pub arrival_dist: f32,
    pub full_power_dist: f32,
    pub thrust_dist: f32,
    /// Radians per second
    pub turn_speed: f32,
    pub anim_speed: f32,
    pub on_frames: f32,
    pub full_frames: f32,
    pub idle_frames: f32,
    /// Preferred combat distance as a multiple of `full_power_dist`
    pub ideal_range_mult: f32,
    /// Hold-position tolerance as a multiple of `full_power_dist`
    pub deadzone_mult: f32,
    /// While retreating, back off only inside this fraction of the ideal range
    pub retreat_range_mult: f32,
    pub shield_health_mult: f32,
    pub shield_duration_ms: f32,
    pub shield_cooldown_ms: f32,
    pub shield_turn_on_frames: f32,
    pub shield_on_frames: f32,
    pub detection_radius: f32,
}

// ============================================================================
// Skills & combat
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupernovaTier {
    pub cooldown_ms: f32,
    pub damage_mult: f32,
    /// Scales the hit radius of each flame
    pub aoe_mult: f32,
    /// Auto-cast trigger distance
    pub skill_range: f32,
    pub rings: u32,
    pub skill_frames: f32,
    pub anim_speed: f32,
}

/// Geometry of the expanding ring waves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingLayout {
    pub base_count: u32,
    pub count_step: u32,
    pub base_radius: f32,
    pub radius_step: f32,
    pub base_size: f32,
    pub size_step: f32,
    pub stagger_ms: f32,
    pub orbit_speed_min: f32,
    pub orbit_speed_jitter: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwordConfig {
    pub cooldown_ms: f32,
    pub duration_ms: f32,
    pub orbit_radius: f32,
    pub visual_size: f32,
    pub damage_mult: f32,
    pub aoe_mult: f32,
    pub skill_range: f32,
    pub skill_frames: f32,
    pub anim_speed: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillConfig {
    pub supernova: [SupernovaTier; 3],
    pub rings: RingLayout,
    pub sword: SwordConfig,
    /// Fraction of an instance's visual scale used as hit radius
    pub hit_radius_factor: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritConfig {
    pub base_chance: f32,
    pub recursive_chance: f32,
    pub multipliers: [f32; TIER_COUNT],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    pub damage_per_pop: f32,
    pub damage_interval_ms: f32,
    pub aoe_radius: f32,
    pub lucky_chance: f32,
    pub crit: CritConfig,
    /// Fraction of an enemy's tier-scaled size used as its hit radius
    pub hit_radius_factor: f32,
}

// ============================================================================
// Loot
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootItem {
    pub key: String,
    pub base_chance: f32,
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootConfig {
    pub items: Vec<LootItem>,
    /// One entry per tier, index = tier
    pub tiers: Vec<TierScaling>,
    pub enemy_drops: BTreeMap<String, Vec<String>>,
    pub global_drops: Vec<String>,
}

impl LootConfig {
    pub fn item_index(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|item| item.key == key)
    }

    /// Scaling for a tier, falling back to the base tier
    pub fn tier(&self, tier: usize) -> Option<&TierScaling> {
        self.tiers.get(tier).or_else(|| self.tiers.first())
    }
}

// ============================================================================
// Stages & simulation levels
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnGroup {
    pub enemy: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDef {
    pub kills: u32,
    pub enemies: Vec<SpawnGroup>,
    pub tier_chances: TierChances,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Distance between neighbouring stage centers
    pub grid_size: f32,
    /// Stage layout cell per stage, in visiting order
    pub clockwise_grid: Vec<[i32; 2]>,
    /// Campaign stages, index 0 = stage 1
    pub stages: Vec<StageDef>,
    pub spawns_per_frame: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub total_levels: u32,
    pub difficulties: Vec<String>,
    pub tier_chances: TierChances,
    /// Level enemy roster: butterflies first, then dragons
    pub roster: Vec<String>,
    /// Number of butterfly entries at the start of the roster
    pub butterfly_count: usize,
}

// ============================================================================
// Grid & pools
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub cell_size: f32,
    /// Cells along one axis
    pub dim: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub enemies: usize,
    pub bullets: usize,
    pub skills: usize,
    pub fx: usize,
    pub damage_numbers: usize,
    pub incoming_damage: usize,
    /// Pending supernova ring waves
    pub ring_waves: usize,
}

// ============================================================================
// GameConfig
// ============================================================================

/// All static tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub enemies: Vec<EnemyTypeConfig>,
    pub weapons: Vec<WeaponConfig>,
    pub ship: ShipConfig,
    pub skills: SkillConfig,
    pub combat: CombatConfig,
    pub loot: LootConfig,
    pub stages: StageConfig,
    pub simulation: SimulationConfig,
    pub grid: GridConfig,
    pub pools: PoolConfig,
}

impl GameConfig {
    /// Parse and validate a config from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::info!(
            "Loaded config: {} enemy types, {} stages, {} weapons",
            config.enemies.len(),
            config.stages.stages.len(),
            config.weapons.len()
        );
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Index of an enemy type by key
    pub fn enemy_index(&self, key: &str) -> Option<usize> {
        self.enemies.iter().position(|e| e.key == key)
    }

    /// Campaign stage definition (1-based)
    pub fn stage(&self, stage: u32) -> Option<&StageDef> {
        (stage as usize)
            .checked_sub(1)
            .and_then(|i| self.stages.stages.get(i))
    }

    /// Check cross-table references and tier table shape
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enemies.is_empty() {
            return Err(ConfigError::EmptyEnemyTable);
        }

        let capacities = [
            ("enemy store", self.pools.enemies),
            ("bullet pool", self.pools.bullets),
            ("skill pool", self.pools.skills),
            ("fx pool", self.pools.fx),
            ("damage number pool", self.pools.damage_numbers),
            ("incoming damage pool", self.pools.incoming_damage),
            ("grid", self.grid.dim),
        ];
        for (pool, capacity) in capacities {
            if capacity == 0 {
                return Err(ConfigError::ZeroCapacity { pool });
            }
        }

        if self.grid.cell_size.is_nan() || self.grid.cell_size <= 0.0 {
            return Err(ConfigError::NonPositive {
                context: "grid".to_string(),
                field: "cell_size",
            });
        }
        for enemy in &self.enemies {
            let frames = [
                ("walk_frames", enemy.walk_frames),
                ("death_frames", enemy.death_frames),
                ("attack_frames", enemy.attack_frames),
            ];
            for (field, value) in frames {
                if value.is_nan() || value <= 0.0 {
                    return Err(ConfigError::NonPositive {
                        context: enemy.key.clone(),
                        field,
                    });
                }
            }
        }

        let tiers = &self.loot.tiers;
        if tiers.len() != TIER_COUNT {
            return Err(ConfigError::TierTableLength { found: tiers.len() });
        }
        for tier in 1..TIER_COUNT {
            let (prev, cur) = (&tiers[tier - 1], &tiers[tier]);
            let checks = [
                ("health_mult", prev.health_mult, cur.health_mult),
                ("size_mult", prev.size_mult, cur.size_mult),
                ("amount_mult", prev.amount_mult, cur.amount_mult),
            ];
            for (field, a, b) in checks {
                if b < a {
                    return Err(ConfigError::NonMonotonicTier { field, tier });
                }
            }
        }

        if self.stages.stages.is_empty() {
            return Err(ConfigError::EmptyStage { stage: 0 });
        }
        for (i, stage) in self.stages.stages.iter().enumerate() {
            if stage.enemies.is_empty() {
                return Err(ConfigError::EmptyStage { stage: i + 1 });
            }
            for group in &stage.enemies {
                if self.enemy_index(&group.enemy).is_none() {
                    return Err(ConfigError::UnknownEnemy {
                        context: format!("stage {}", i + 1),
                        key: group.enemy.clone(),
                    });
                }
            }
        }

        for key in &self.simulation.roster {
            if self.enemy_index(key).is_none() {
                return Err(ConfigError::UnknownEnemy {
                    context: "simulation roster".to_string(),
                    key: key.clone(),
                });
            }
        }

        for (enemy, drops) in &self.loot.enemy_drops {
            for item in drops {
                if self.loot.item_index(item).is_none() {
                    return Err(ConfigError::UnknownItem {
                        context: format!("{enemy} drop table"),
                        key: item.clone(),
                    });
                }
            }
        }
        for item in &self.loot.global_drops {
            if self.loot.item_index(item).is_none() {
                return Err(ConfigError::UnknownItem {
                    context: "global drop table".to_string(),
                    key: item.clone(),
                });
            }
        }

        Ok(())
    }
}

// ============================================================================
// Built-in tables
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn enemy(
    key: &str,
    size: f32,
    health_max: f32,
    move_speed: TieredStat,
    spacing: f32,
    start_dist: f32,
    attack_range: TieredStat,
    damage: (f32, f32),
    frames: (f32, f32, f32),
    anim: (TieredStat, TieredStat, TieredStat),
    charge: (TieredStat, TieredStat),
) -> EnemyTypeConfig {
    EnemyTypeConfig {
        key: key.to_string(),
        size,
        health_max,
        move_speed,
        spacing,
        start_dist,
        attack_range,
        damage_min: damage.0,
        damage_max: damage.1,
        walk_frames: frames.0,
        death_frames: frames.1,
        attack_frames: frames.2,
        walk_anim_speed: anim.0,
        attack_anim_speed: anim.1,
        death_anim_speed: anim.2,
        base_rotation: PI / 2.0,
        can_charge: true,
        charge_speed: charge.0,
        charge_distance_mult: charge.1,
    }
}

fn default_enemies() -> Vec<EnemyTypeConfig> {
    let flat = TieredStat::flat;
    let dragon_charge = TieredStat::tiered(120.0, [Some(140.0), Some(160.0), Some(180.0), Some(220.0)]);
    let butterfly_charge = TieredStat::tiered(90.0, [Some(100.0), Some(110.0), None, None]);
    vec![
        enemy(
            "GalaxyDragon",
            3200.0,
            50.0,
            TieredStat::tiered(12.0, [Some(13.0), Some(14.0), Some(15.0), Some(16.0)]),
            200.0,
            55000.0,
            TieredStat::tiered(2000.0, [Some(2400.0), Some(2800.0), Some(3200.0), Some(3600.0)]),
            (10.0, 30.0),
            (53.0, 145.0, 13.0),
            (flat(0.02), flat(1.0), flat(1.0)),
            (dragon_charge, TieredStat::tiered(2.0, [None, Some(2.2), Some(2.4), Some(2.6)])),
        ),
        enemy(
            "PhoenixSurrender",
            3000.0,
            85.0,
            flat(16.0),
            180.0,
            50000.0,
            TieredStat::tiered(1800.0, [None, Some(2200.0), None, Some(3000.0)]),
            (25.0, 70.0),
            (23.0, 145.0, 84.0),
            (flat(0.03), TieredStat::tiered(2.0, [None, Some(2.4), None, None]), flat(1.5)),
            (dragon_charge, flat(2.0)),
        ),
        enemy(
            "BlueDragon",
            3500.0,
            120.0,
            flat(14.0),
            250.0,
            60000.0,
            flat(2200.0),
            (40.0, 90.0),
            (32.0, 138.0, 90.0),
            (flat(0.025), flat(1.8), flat(1.2)),
            (dragon_charge, flat(2.0)),
        ),
        enemy(
            "GalaxyButterfly",
            1800.0,
            20.0,
            flat(20.0),
            120.0,
            45000.0,
            flat(1200.0),
            (5.0, 15.0),
            (30.0, 90.0, 40.0),
            (flat(0.04), flat(1.5), flat(1.5)),
            (butterfly_charge, flat(1.5)),
        ),
        enemy(
            "BlueWhiteButterfly",
            1700.0,
            18.0,
            flat(22.0),
            110.0,
            45000.0,
            flat(1100.0),
            (4.0, 12.0),
            (30.0, 90.0, 40.0),
            (flat(0.04), flat(1.5), flat(1.5)),
            (butterfly_charge, flat(1.5)),
        ),
        enemy(
            "GoldButterfly",
            1900.0,
            25.0,
            flat(18.0),
            130.0,
            47000.0,
            flat(1300.0),
            (6.0, 18.0),
            (30.0, 90.0, 40.0),
            (flat(0.04), flat(1.5), flat(1.5)),
            (butterfly_charge, flat(1.5)),
        ),
        enemy(
            "GreenBlackButterfly",
            1800.0,
            22.0,
            flat(20.0),
            120.0,
            46000.0,
            flat(1200.0),
            (5.0, 16.0),
            (30.0, 90.0, 40.0),
            (flat(0.04), flat(1.5), flat(1.5)),
            (butterfly_charge, flat(1.5)),
        ),
        enemy(
            "BlackRedButterfly",
            2000.0,
            28.0,
            flat(19.0),
            140.0,
            48000.0,
            flat(1400.0),
            (7.0, 20.0),
            (30.0, 90.0, 40.0),
            (flat(0.04), flat(1.5), flat(1.5)),
            (butterfly_charge, flat(1.5)),
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn weapon(
    key: &str,
    kind: WeaponKind,
    fire_rate: f32,
    speed: f32,
    life_ms: f32,
    offset_side: f32,
    penetration: f32,
    ammo: (f32, f32, f32),
) -> WeaponConfig {
    WeaponConfig {
        key: key.to_string(),
        kind,
        fire_rate,
        damage: 10.0,
        speed,
        life_ms,
        offset_side,
        offset_front: 80.0,
        penetration,
        max_ammo: ammo.0,
        recovery_rate: ammo.1,
        min_ammo_to_fire: ammo.2,
    }
}

fn default_weapons() -> Vec<WeaponConfig> {
    vec![
        weapon(
            "bullet_left_side",
            WeaponKind::LeftTurret,
            5.0,
            340.0,
            8000.0,
            -180.0,
            5.0,
            (50.0, 5.0, 10.0),
        ),
        weapon(
            "bullet_right_side",
            WeaponKind::RightTurret,
            5.0,
            340.0,
            8000.0,
            180.0,
            5.0,
            (50.0, 5.0, 10.0),
        ),
        weapon(
            "laser",
            WeaponKind::Laser,
            95.0,
            500.0,
            4000.0,
            0.0,
            25.0,
            (200.0, 1.0, 50.0),
        ),
    ]
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            health_max: 35000.0,
            speed: 240.0,
            travel_speed_mult: 50.0,
            arrival_dist: 1000.0,
            full_power_dist: 8000.0,
            thrust_dist: 1500.0,
            turn_speed: PI * 3.0,
            anim_speed: 0.5,
            on_frames: 27.0,
            full_frames: 18.0,
            idle_frames: 3.0,
            ideal_range_mult: 1.2,
            deadzone_mult: 0.1,
            retreat_range_mult: 0.3,
            shield_health_mult: 3.0,
            shield_duration_ms: 10000.0,
            shield_cooldown_ms: 15000.0,
            shield_turn_on_frames: 145.0,
            shield_on_frames: 14.0,
            detection_radius: 100000.0,
        }
    }
}

fn supernova(
    cooldown_ms: f32,
    damage_mult: f32,
    aoe_mult: f32,
    skill_range: f32,
    rings: u32,
) -> SupernovaTier {
    SupernovaTier {
        cooldown_ms,
        damage_mult,
        aoe_mult,
        skill_range,
        rings,
        skill_frames: 109.0,
        anim_speed: 2.0,
    }
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            supernova: [
                supernova(25000.0, 100.0, 3.0, 15000.0, 25),
                supernova(12000.0, 50.0, 1.75, 12000.0, 8),
                supernova(8000.0, 30.0, 1.25, 10000.0, 3),
            ],
            rings: RingLayout {
                base_count: 15,
                count_step: 3,
                base_radius: 1200.0,
                radius_step: 1300.0,
                base_size: 1400.0,
                size_step: 800.0,
                stagger_ms: 80.0,
                orbit_speed_min: 0.02,
                orbit_speed_jitter: 0.02,
            },
            sword: SwordConfig {
                cooldown_ms: 5000.0,
                duration_ms: 2000.0,
                orbit_radius: 5000.0,
                visual_size: 7000.0,
                damage_mult: 500.0,
                aoe_mult: 5.0,
                skill_range: 9000.0,
                skill_frames: 16.0,
                anim_speed: 1.2,
            },
            hit_radius_factor: 0.4,
        }
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            damage_per_pop: 10.0,
            damage_interval_ms: 100.0,
            aoe_radius: 900.0,
            lucky_chance: 0.1,
            crit: CritConfig {
                base_chance: 0.75,
                recursive_chance: 0.05,
                multipliers: [1.0, 2.0, 4.0, 8.0, 16.0],
            },
            hit_radius_factor: 0.4,
        }
    }
}

fn item(key: &str, base_chance: f32, min: u32, max: u32) -> LootItem {
    LootItem {
        key: key.to_string(),
        base_chance,
        min,
        max,
    }
}

fn tier(id: &str, chance_mult: f32, amount_mult: f32, health_mult: f32, size_mult: f32) -> TierScaling {
    TierScaling {
        id: id.to_string(),
        chance_mult,
        amount_mult,
        health_mult,
        size_mult,
    }
}

fn drops(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for LootConfig {
    fn default() -> Self {
        let mut enemy_drops = BTreeMap::new();
        enemy_drops.insert(
            "GalaxyDragon".to_string(),
            drops(&["Galaxy Dragon Claw", "Dragon Heart", "Galaxy Dragon Horn"]),
        );
        enemy_drops.insert(
            "BlueDragon".to_string(),
            drops(&["Blue Dragon Claw", "Dragon Heart", "Blue Dragon Horn"]),
        );
        enemy_drops.insert("PhoenixSurrender".to_string(), drops(&["Phoenix Feather"]));
        enemy_drops.insert("GalaxyButterfly".to_string(), drops(&["Butterfly Wing"]));
        enemy_drops.insert(
            "BlueWhiteButterfly".to_string(),
            drops(&["Blue White Butterfly Wing"]),
        );
        enemy_drops.insert("GoldButterfly".to_string(), drops(&["Gold Butterfly Wing"]));
        enemy_drops.insert(
            "GreenBlackButterfly".to_string(),
            drops(&["Green Black Butterfly Wing"]),
        );
        enemy_drops.insert(
            "BlackRedButterfly".to_string(),
            drops(&["Black Red Butterfly Wing"]),
        );

        Self {
            items: vec![
                item("Dragon Claw", 0.15, 1, 2),
                item("Dragon Heart", 0.05, 1, 1),
                item("Dragon Horn", 0.10, 1, 2),
                item("Galaxy Dragon Claw", 0.15, 1, 2),
                item("Galaxy Dragon Horn", 0.10, 1, 2),
                item("Blue Dragon Claw", 0.15, 1, 2),
                item("Blue Dragon Horn", 0.10, 1, 2),
                item("Phoenix Feather", 0.15, 1, 3),
                item("Butterfly Wing", 0.20, 2, 5),
                item("Blue White Butterfly Wing", 0.20, 2, 5),
                item("Gold Butterfly Wing", 0.20, 2, 5),
                item("Green Black Butterfly Wing", 0.20, 2, 5),
                item("Black Red Butterfly Wing", 0.20, 2, 5),
                item("Main Game Currency", 0.05, 10, 50),
                item("Crystal", 0.01, 1, 1),
            ],
            tiers: vec![
                tier("normal", 1.0, 1.0, 1.0, 1.0),
                tier("epic", 2.5, 10.0, 30.0, 5.0),
                tier("god", 5.0, 100.0, 200.0, 8.0),
                tier("alpha", 10.0, 1000.0, 1000.0, 12.0),
                tier("omega", 25.0, 10000.0, 10000.0, 20.0),
            ],
            enemy_drops,
            global_drops: drops(&["Main Game Currency", "Crystal"]),
        }
    }
}

fn stage(kills: u32, enemies: &[(&str, u32)], arch: f32, god: f32, omega: f32) -> StageDef {
    StageDef {
        kills,
        enemies: enemies
            .iter()
            .map(|(enemy, count)| SpawnGroup {
                enemy: enemy.to_string(),
                count: *count,
            })
            .collect(),
        tier_chances: TierChances {
            arch,
            god,
            omega,
            alpha: 0.0,
        },
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            grid_size: 150000.0,
            clockwise_grid: vec![
                [1, 1],
                [1, 0],
                [2, 0],
                [2, 1],
                [2, 2],
                [1, 2],
                [0, 2],
                [0, 1],
                [0, 0],
                [1, 1],
            ],
            stages: vec![
                stage(
                    300,
                    &[
                        ("GalaxyDragon", 40),
                        ("PhoenixSurrender", 40),
                        ("BlueDragon", 40),
                        ("BlackRedButterfly", 40),
                        ("BlueWhiteButterfly", 40),
                        ("GoldButterfly", 40),
                        ("GreenBlackButterfly", 30),
                        ("GalaxyButterfly", 30),
                    ],
                    0.05,
                    0.005,
                    0.001,
                ),
                stage(500, &[("PhoenixSurrender", 200), ("GalaxyDragon", 300)], 0.03, 0.03, 0.0),
                stage(700, &[("GalaxyDragon", 500), ("BlueDragon", 100)], 0.04, 0.04, 0.0),
                stage(
                    900,
                    &[("GalaxyDragon", 600), ("PhoenixSurrender", 200), ("GalaxyButterfly", 200)],
                    0.05,
                    0.05,
                    0.0,
                ),
                stage(
                    1100,
                    &[
                        ("BlueDragon", 400),
                        ("PhoenixSurrender", 400),
                        ("BlackRedButterfly", 300),
                        ("BlueWhiteButterfly", 300),
                    ],
                    0.06,
                    0.06,
                    0.0,
                ),
                stage(
                    1300,
                    &[
                        ("BlueDragon", 600),
                        ("PhoenixSurrender", 400),
                        ("GoldButterfly", 400),
                        ("GreenBlackButterfly", 400),
                    ],
                    0.07,
                    0.07,
                    0.0,
                ),
                stage(
                    1500,
                    &[("GalaxyDragon", 800), ("PhoenixSurrender", 500), ("GalaxyButterfly", 500)],
                    0.08,
                    0.08,
                    0.0,
                ),
                stage(
                    1700,
                    &[
                        ("BlueDragon", 800),
                        ("GalaxyDragon", 500),
                        ("BlackRedButterfly", 400),
                        ("BlueWhiteButterfly", 400),
                    ],
                    0.09,
                    0.09,
                    0.0,
                ),
                stage(
                    2000,
                    &[
                        ("PhoenixSurrender", 800),
                        ("BlueDragon", 1000),
                        ("GoldButterfly", 500),
                        ("GreenBlackButterfly", 500),
                    ],
                    0.10,
                    0.10,
                    0.0,
                ),
                stage(
                    1,
                    &[("PhoenixSurrender", 1500), ("BlueDragon", 1500), ("GalaxyButterfly", 1000)],
                    0.15,
                    0.15,
                    0.0,
                ),
            ],
            spawns_per_frame: 500,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            total_levels: 500,
            difficulties: drops(&["Standard", "Arch", "Nightmare", "Lethal", "Extinction"]),
            tier_chances: TierChances {
                arch: 0.1,
                god: 0.05,
                omega: 0.02,
                alpha: 0.01,
            },
            roster: drops(&[
                "GalaxyButterfly",
                "BlueWhiteButterfly",
                "GoldButterfly",
                "GreenBlackButterfly",
                "BlackRedButterfly",
                "GalaxyDragon",
                "BlueDragon",
                "PhoenixSurrender",
            ]),
            butterfly_count: 5,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 4800.0,
            dim: 400,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            enemies: 15000,
            bullets: 4096,
            skills: 2048,
            fx: 2048,
            damage_numbers: 512,
            incoming_damage: 64,
            ring_waves: 64,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            enemies: default_enemies(),
            weapons: default_weapons(),
            ship: ShipConfig::default(),
            skills: SkillConfig::default(),
            combat: CombatConfig::default(),
            loot: LootConfig::default(),
            stages: StageConfig::default(),
            simulation: SimulationConfig::default(),
            grid: GridConfig::default(),
            pools: PoolConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn test_tiered_stat_falls_back_to_base() {
        let stat = TieredStat::tiered(10.0, [Some(20.0), None, Some(40.0), None]);
        assert_eq!(stat.resolve(0), 10.0);
        assert_eq!(stat.resolve(1), 20.0);
        assert_eq!(stat.resolve(2), 10.0);
        assert_eq!(stat.resolve(3), 40.0);
        assert_eq!(stat.resolve(4), 10.0);
        // Out-of-range tiers use the base value
        assert_eq!(stat.resolve(9), 10.0);
    }

    #[test]
    fn test_tier_multipliers_monotonic() {
        let loot = LootConfig::default();
        for pair in loot.tiers.windows(2) {
            assert!(pair[1].health_mult >= pair[0].health_mult);
            assert!(pair[1].size_mult >= pair[0].size_mult);
            assert!(pair[1].amount_mult >= pair[0].amount_mult);
        }
    }

    #[test]
    fn test_tier_roll_highest_first() {
        let chances = TierChances {
            arch: 0.1,
            god: 0.05,
            omega: 0.02,
            alpha: 0.01,
        };
        assert_eq!(chances.tier_for_roll(0.005), 4);
        assert_eq!(chances.tier_for_roll(0.02), 3);
        assert_eq!(chances.tier_for_roll(0.07), 2);
        assert_eq!(chances.tier_for_roll(0.15), 1);
        assert_eq!(chances.tier_for_roll(0.5), 0);
    }

    #[test]
    fn test_json_round_trip() {
        let json = GameConfig::default().to_json().unwrap();
        let config = GameConfig::from_json(&json).unwrap();
        assert_eq!(config.enemies.len(), 8);
        assert_eq!(config.stages.stages.len(), 10);
        assert_eq!(config.stage(2).map(|s| s.kills), Some(500));
        assert!(config.stage(0).is_none());
    }

    #[test]
    fn test_unknown_stage_enemy_rejected() {
        let mut config = GameConfig::default();
        config.stages.stages[0].enemies.push(SpawnGroup {
            enemy: "Kraken".to_string(),
            count: 1,
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownEnemy { .. })
        ));
    }

    #[test]
    fn test_bad_tier_table_rejected() {
        let mut config = GameConfig::default();
        config.loot.tiers.pop();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TierTableLength { found: 4 })
        ));

        let mut config = GameConfig::default();
        config.loot.tiers[2].health_mult = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonMonotonicTier {
                field: "health_mult",
                tier: 2
            })
        ));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = GameConfig::default();
        config.pools.bullets = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "bullet pool capacity must be non-zero");
    }

    #[test]
    fn test_zero_frames_rejected() {
        let mut config = GameConfig::default();
        config.enemies[0].attack_frames = 0.0;
        let key = config.enemies[0].key.clone();
        match config.validate() {
            Err(ConfigError::NonPositive { context, field }) => {
                assert_eq!(context, key);
                assert_eq!(field, "attack_frames");
            }
            other => panic!("expected NonPositive, got {other:?}"),
        }

        let mut config = GameConfig::default();
        config.enemies[1].walk_frames = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "walk_frames",
                ..
            })
        ));

        let mut config = GameConfig::default();
        config.enemies[0].death_frames = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "death_frames",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_cell_size_rejected() {
        let mut config = GameConfig::default();
        config.grid.cell_size = 0.0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "grid cell_size must be positive");
    }

    #[test]
    fn test_malformed_json_is_error() {
        let err = GameConfig::from_json("{\"enemies\": 3}").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
