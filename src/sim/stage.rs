//! Stage definitions
//!
//! Campaign stages come from the config table; simulation (training) levels
//! are generated from the roster. Both resolve to a `StagePlan`: a shuffled
//! spawn list plus the multipliers the enemy systems read every step.

use glam::Vec2;

use super::config::{GameConfig, TierChances};
use super::rng::SimRng;

/// A playable stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Campaign stage, 1-based
    Campaign(u32),
    /// Generated training level, 1-based, with a difficulty index
    Simulation { level: u32, difficulty: u32 },
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Campaign(1)
    }
}

impl Stage {
    pub fn is_simulation(&self) -> bool {
        matches!(self, Stage::Simulation { .. })
    }

    /// Stage number or level number
    pub fn id(&self) -> u32 {
        match *self {
            Stage::Campaign(stage) => stage,
            Stage::Simulation { level, .. } => level,
        }
    }

    /// Stage whose map slot hosts this stage (simulation levels use stage 1)
    pub fn nav_stage(&self) -> u32 {
        match *self {
            Stage::Campaign(stage) => stage,
            Stage::Simulation { .. } => 1,
        }
    }

    /// Following stage, `None` past the last one
    pub fn next(&self, config: &GameConfig) -> Option<Stage> {
        match *self {
            Stage::Campaign(stage) => {
                let last = config.stages.stages.len() as u32;
                (stage < last).then_some(Stage::Campaign(stage + 1))
            }
            Stage::Simulation { level, difficulty } => {
                (level < config.simulation.total_levels).then_some(Stage::Simulation {
                    level: level + 1,
                    difficulty,
                })
            }
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Campaign(stage) => write!(f, "stage {stage}"),
            Stage::Simulation { level, difficulty } => {
                write!(f, "simulation level {level} (difficulty {difficulty})")
            }
        }
    }
}

/// World position of a stage's center on the clockwise map layout
pub fn stage_center(config: &GameConfig, stage: Stage) -> Vec2 {
    let slots = &config.stages.clockwise_grid;
    let slot = (stage.nav_stage() as usize)
        .checked_sub(1)
        .and_then(|i| slots.get(i))
        .or_else(|| slots.first())
        .copied()
        .unwrap_or([1, 1]);
    Vec2::new(
        (slot[0] - 1) as f32 * config.stages.grid_size,
        (slot[1] - 1) as f32 * config.stages.grid_size,
    )
}

/// Enemy size multiplier for a campaign stage
pub fn size_multiplier(stage: Stage) -> f32 {
    match stage.nav_stage() {
        0 | 1 => 1.0,
        2 => 2.0,
        s => 2.0 + (s - 2) as f32 * 0.2,
    }
}

/// Stat scale of a training level: 1.2 per global level plus milestone hurdles
pub fn simulation_stat_scale(level: u32, difficulty: u32) -> f64 {
    let global = difficulty as u64 * 500 + level as u64;
    let mut factor = 1.2f64.powf(global as f64);
    let milestones: [(u64, f64); 8] = [
        (2500, 500.0),
        (1000, 250.0),
        (500, 100.0),
        (250, 50.0),
        (100, 25.0),
        (25, 10.0),
        (10, 5.0),
        (5, 2.0),
    ];
    if let Some(&(_, mult)) = milestones.iter().find(|(every, _)| global % every == 0) {
        factor *= mult;
    }
    factor
}

/// Loot reward scale of a training level
pub fn simulation_reward_scale(level: u32, difficulty: u32) -> f64 {
    1.0 + (simulation_stat_scale(level, difficulty) + 1.0).log10() * 2.0
}

/// Enemy composition of a generated level as `(type index, count)`
pub fn simulation_composition(config: &GameConfig, level: u32) -> Vec<(usize, u32)> {
    let roster: Vec<usize> = config
        .simulation
        .roster
        .iter()
        .filter_map(|key| config.enemy_index(key))
        .collect();
    if roster.is_empty() {
        return Vec::new();
    }
    let butterflies = config.simulation.butterfly_count.clamp(1, roster.len());
    let dragons = roster.len() - butterflies;
    let i = level as usize;

    if i % 10 == 0 && dragons > 0 {
        vec![(roster[butterflies + i % dragons], 1)]
    } else if i % 5 == 0 {
        vec![(roster[i % butterflies], 50 + level * 2)]
    } else {
        vec![
            (roster[i % roster.len()], 10 + level / 2),
            (roster[(i + 3) % roster.len()], 5 + level / 5),
        ]
    }
}

/// Everything a stage needs at runtime
#[derive(Debug, Clone)]
pub struct StagePlan {
    pub stage: Stage,
    /// Enemy type per slot, already shuffled and capped at store capacity
    pub spawn_list: Vec<u32>,
    pub kill_target: u32,
    pub tier_chances: TierChances,
    /// Health and attack damage multiplier
    pub stat_multiplier: f64,
    pub size_multiplier: f32,
    /// Loot amount multiplier for training levels
    pub reward_scale: f64,
    pub center: Vec2,
    /// Every slot spawns on entry instead of progressively
    pub spawn_all: bool,
}

impl StagePlan {
    /// Build and shuffle the spawn list for a stage. Unknown stages fall back
    /// to stage 1.
    pub fn build(config: &GameConfig, stage: Stage, rng: &mut SimRng) -> Self {
        let capacity = config.pools.enemies;
        let mut spawn_list = Vec::new();

        let plan = match stage {
            Stage::Campaign(id) => {
                let resolved = config.stage(id).map(|def| (stage, def)).or_else(|| {
                    log::warn!("Unknown {stage}, falling back to stage 1");
                    config.stages.stages.first().map(|def| (Stage::Campaign(1), def))
                });
                let Some((stage, def)) = resolved else {
                    return Self::empty(config, stage);
                };
                for group in &def.enemies {
                    if let Some(index) = config.enemy_index(&group.enemy) {
                        spawn_list.extend(std::iter::repeat_n(index as u32, group.count as usize));
                    }
                }
                Self {
                    stage,
                    spawn_list: Vec::new(),
                    kill_target: def.kills,
                    tier_chances: def.tier_chances,
                    stat_multiplier: stage.id() as f64,
                    size_multiplier: size_multiplier(stage),
                    reward_scale: 1.0,
                    center: stage_center(config, stage),
                    spawn_all: false,
                }
            }
            Stage::Simulation { level, difficulty } => {
                let level = level.clamp(1, config.simulation.total_levels.max(1));
                let stage = Stage::Simulation { level, difficulty };
                let mut total = 0u32;
                for (index, count) in simulation_composition(config, level) {
                    spawn_list.extend(std::iter::repeat_n(index as u32, count as usize));
                    total += count;
                }
                Self {
                    stage,
                    spawn_list: Vec::new(),
                    kill_target: total,
                    tier_chances: config.simulation.tier_chances,
                    stat_multiplier: simulation_stat_scale(level, difficulty),
                    size_multiplier: 1.0,
                    reward_scale: simulation_reward_scale(level, difficulty),
                    center: stage_center(config, stage),
                    spawn_all: true,
                }
            }
        };

        rng.shuffle(&mut spawn_list);
        spawn_list.truncate(capacity);
        Self { spawn_list, ..plan }
    }

    /// A plan with nothing to spawn and no kill target
    fn empty(config: &GameConfig, stage: Stage) -> Self {
        Self {
            stage,
            spawn_list: Vec::new(),
            kill_target: 0,
            tier_chances: TierChances::default(),
            stat_multiplier: 1.0,
            size_multiplier: 1.0,
            reward_scale: 1.0,
            center: stage_center(config, stage),
            spawn_all: false,
        }
    }

    /// Stat multiplier narrowed for the f32 store
    pub fn stat_multiplier_f32(&self) -> f32 {
        (self.stat_multiplier as f32).min(f32::MAX)
    }
}
