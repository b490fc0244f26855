//! Loot rolls and batching
//!
//! `roll_drops` is a pure function of config, enemy type, tier, lucky flag
//! and RNG. Drops are aggregated per item in a `LootQueue` and flushed to the
//! host sink at a fixed cadence.

use super::config::LootConfig;
use super::rng::SimRng;
use crate::consts::LOOT_FLUSH_INTERVAL_MS;

/// Roll every global drop plus the enemy's own drop table.
///
/// `sink` receives `(item index, amount)` for every successful roll with a
/// non-zero amount.
pub fn roll_drops(
    loot: &LootConfig,
    enemy_key: &str,
    tier: usize,
    lucky: bool,
    rng: &mut SimRng,
    mut sink: impl FnMut(usize, u64),
) {
    let Some(scaling) = loot.tier(tier) else {
        return;
    };
    let enemy_drops = loot.enemy_drops.get(enemy_key).map(Vec::as_slice).unwrap_or(&[]);

    for key in loot.global_drops.iter().chain(enemy_drops) {
        let Some(index) = loot.item_index(key) else {
            continue;
        };
        let item = &loot.items[index];
        if rng.uniform() >= item.base_chance * scaling.chance_mult {
            continue;
        }
        let span = (item.max.saturating_sub(item.min) + 1) as f64;
        let base = item.min as f64 + rng.uniform() as f64 * span;
        let mut amount = (base * scaling.amount_mult as f64).floor() as u64;
        if lucky {
            amount = amount.saturating_mul(2);
        }
        if amount > 0 {
            sink(index, amount);
        }
    }
}

/// Per-item drop totals waiting to be handed to the host
#[derive(Debug, Clone)]
pub struct LootQueue {
    pending: Vec<u64>,
    last_flush_ms: f64,
}

impl LootQueue {
    pub fn new(item_count: usize) -> Self {
        Self {
            pending: vec![0; item_count],
            last_flush_ms: 0.0,
        }
    }

    pub fn push(&mut self, item: usize, amount: u64) {
        if let Some(total) = self.pending.get_mut(item) {
            *total = total.saturating_add(amount);
        }
    }

    /// Queued amount for an item
    pub fn pending(&self, item: usize) -> u64 {
        self.pending.get(item).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.iter().all(|&amount| amount == 0)
    }

    /// Whether the flush interval has elapsed
    pub fn due(&self, now_ms: f64) -> bool {
        now_ms - self.last_flush_ms >= LOOT_FLUSH_INTERVAL_MS
    }

    /// Hand every non-zero total to `sink` and reset
    pub fn flush(&mut self, now_ms: f64, mut sink: impl FnMut(usize, u64)) {
        self.last_flush_ms = now_ms;
        for (item, total) in self.pending.iter_mut().enumerate() {
            if *total > 0 {
                sink(item, *total);
                *total = 0;
            }
        }
    }

    pub fn clear(&mut self) {
        self.pending.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::{LootConfig, LootItem, TierScaling};
    use std::collections::BTreeMap;

    fn sure_thing() -> LootConfig {
        let mut enemy_drops = BTreeMap::new();
        enemy_drops.insert("Moth".to_string(), vec!["Wing".to_string()]);
        let tiers = (0..5)
            .map(|i| TierScaling {
                id: format!("t{i}"),
                chance_mult: 1.0,
                amount_mult: 10f32.powi(i),
                health_mult: 1.0,
                size_mult: 1.0,
            })
            .collect();
        LootConfig {
            items: vec![
                LootItem {
                    key: "Coin".to_string(),
                    base_chance: 1.0,
                    min: 3,
                    max: 3,
                },
                LootItem {
                    key: "Wing".to_string(),
                    base_chance: 1.0,
                    min: 1,
                    max: 1,
                },
                LootItem {
                    key: "Dust".to_string(),
                    base_chance: 0.0,
                    min: 1,
                    max: 1,
                },
            ],
            tiers,
            enemy_drops,
            global_drops: vec!["Coin".to_string(), "Dust".to_string()],
        }
    }

    fn collect(loot: &LootConfig, enemy: &str, tier: usize, lucky: bool) -> Vec<(usize, u64)> {
        let mut rng = SimRng::new(11);
        let mut out = Vec::new();
        roll_drops(loot, enemy, tier, lucky, &mut rng, |i, a| out.push((i, a)));
        out
    }

    #[test]
    fn test_global_and_enemy_drops() {
        let loot = sure_thing();
        assert_eq!(collect(&loot, "Moth", 0, false), vec![(0, 3), (1, 1)]);
        // Unknown enemy still rolls global drops
        assert_eq!(collect(&loot, "Ghost", 0, false), vec![(0, 3)]);
    }

    #[test]
    fn test_tier_and_lucky_scale_amount() {
        let loot = sure_thing();
        // floor((min + r * (max - min + 1)) * amount_mult)
        let god = collect(&loot, "Moth", 2, false);
        assert_eq!(god.len(), 2);
        assert!((300..400).contains(&god[0].1));
        assert!((100..200).contains(&god[1].1));

        let lucky = collect(&loot, "Moth", 1, true);
        assert!((60..80).contains(&lucky[0].1));
        assert_eq!(lucky[0].1 % 2, 0);
        assert!((20..40).contains(&lucky[1].1));
    }

    #[test]
    fn test_zero_amounts_discarded() {
        let mut loot = sure_thing();
        loot.tiers[0].amount_mult = 0.1;
        assert!(collect(&loot, "Moth", 0, false).is_empty());
    }

    #[test]
    fn test_default_tables_roll() {
        let loot = LootConfig::default();
        let mut rng = SimRng::new(5);
        let mut total = 0u64;
        for _ in 0..2000 {
            roll_drops(&loot, "GalaxyDragon", 4, false, &mut rng, |_, a| total += a);
        }
        assert!(total > 0);
    }

    #[test]
    fn test_queue_aggregates_and_flushes() {
        let mut queue = LootQueue::new(3);
        queue.push(1, 5);
        queue.push(1, 7);
        queue.push(2, 1);
        queue.push(9, 1);
        assert_eq!(queue.pending(1), 12);
        assert!(!queue.due(100.0));
        assert!(queue.due(250.0));

        let mut flushed = Vec::new();
        queue.flush(250.0, |i, a| flushed.push((i, a)));
        assert_eq!(flushed, vec![(1, 12), (2, 1)]);
        assert!(queue.is_empty());
        assert!(!queue.due(400.0));
    }
}
