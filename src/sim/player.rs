//! Player ship
//!
//! Shield state machine, weapon ammo economy, nearest-target search,
//! steering (engaged and inter-stage travel) and the weapon fire clock.

use glam::Vec2;

use super::combat;
use super::config::{GameConfig, ShipConfig, WeaponConfig};
use super::state::GameState;
use crate::consts::{FRAME_MS, MAX_CATCHUP_SHOTS, WEAPON_RESYNC_MS};
use crate::{anim_stride, angle_delta, normalize_angle};

/// Shield animation frames per reference frame while powering up
const SHIELD_TURN_ON_RATE: f32 = 0.8;
/// Shield animation frames per reference frame while up
const SHIELD_ON_RATE: f32 = 0.4;
/// Positions closer than this count as "on top of" a target
const MIN_STEER_DIST: f32 = 0.1;

/// Engine visual state, picked from distance to target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShipState {
    #[default]
    Idle,
    Thrust,
    Full,
}

impl ShipState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipState::Idle => "IDLE",
            ShipState::Thrust => "THRUST",
            ShipState::Full => "FULL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShieldState {
    #[default]
    Off,
    TurningOn,
    On,
}

impl ShieldState {
    /// Absorbing damage
    pub fn is_active(&self) -> bool {
        !matches!(self, ShieldState::Off)
    }
}

/// Ammo and fire clock of one weapon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponState {
    pub ammo: f32,
    /// Locked out until ammo climbs back to the weapon's firing threshold
    pub recharging: bool,
    /// Simulation time the fire clock last advanced to; `None` after a reset
    pub last_fire_ms: Option<f64>,
}

impl WeaponState {
    pub fn full(cfg: &WeaponConfig) -> Self {
        Self {
            ammo: cfg.max_ammo,
            recharging: false,
            last_fire_ms: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub rotation: f32,
    pub health: f32,
    pub health_max: f32,
    pub ship_state: ShipState,
    pub ship_frame: f32,

    pub shield: ShieldState,
    pub shield_frame: f32,
    pub shield_hp: f32,
    pub shield_max: f32,
    pub shield_duration_ms: f32,
    /// Time until the shield may come up again
    pub shield_cooldown_ms: f32,

    /// Enemy slot being engaged, re-validated every step
    pub target: Option<usize>,
    pub traveling: bool,
    /// Current stage center; travel destination and NaN fallback
    pub travel_target: Vec2,

    /// One entry per configured weapon
    pub weapons: Vec<WeaponState>,
}

impl Player {
    pub fn new(config: &GameConfig, pos: Vec2) -> Self {
        let ship = &config.ship;
        Self {
            pos,
            rotation: 0.0,
            health: ship.health_max,
            health_max: ship.health_max,
            ship_state: ShipState::Idle,
            ship_frame: 0.0,
            shield: ShieldState::Off,
            shield_frame: 0.0,
            shield_hp: 0.0,
            shield_max: ship.health_max * ship.shield_health_mult,
            shield_duration_ms: 0.0,
            shield_cooldown_ms: 0.0,
            target: None,
            traveling: false,
            travel_target: pos,
            weapons: config.weapons.iter().map(WeaponState::full).collect(),
        }
    }

    /// Refill ammo and clear fire clocks
    pub fn reset_weapons(&mut self, weapons: &[WeaponConfig]) {
        self.weapons = weapons.iter().map(WeaponState::full).collect();
    }

    /// Full health, shield down and ready
    pub fn restore(&mut self) {
        self.health = self.health_max;
        self.shield = ShieldState::Off;
        self.shield_frame = 0.0;
        self.shield_hp = 0.0;
        self.shield_duration_ms = 0.0;
        self.shield_cooldown_ms = 0.0;
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Every weapon is locked out by the recharge hysteresis
    pub fn all_weapons_recharging(&self) -> bool {
        !self.weapons.is_empty() && self.weapons.iter().all(|w| w.recharging)
    }

    pub fn raise_shield(&mut self, ship: &ShipConfig) {
        self.shield = ShieldState::TurningOn;
        self.shield_frame = 0.0;
        self.shield_hp = self.shield_max;
        self.shield_duration_ms = ship.shield_duration_ms;
    }

    fn drop_shield(&mut self, ship: &ShipConfig) {
        self.shield = ShieldState::Off;
        self.shield_frame = 0.0;
        self.shield_cooldown_ms = ship.shield_cooldown_ms;
    }

    /// Shield timers and animation
    pub fn update_shield(&mut self, ship: &ShipConfig, dt: f32) {
        let scale = dt / FRAME_MS;
        if self.shield_cooldown_ms > 0.0 {
            self.shield_cooldown_ms = (self.shield_cooldown_ms - dt).max(0.0);
        }
        match self.shield {
            ShieldState::Off => return,
            ShieldState::TurningOn => {
                self.shield_frame += SHIELD_TURN_ON_RATE * scale;
                if self.shield_frame >= ship.shield_turn_on_frames {
                    self.shield = ShieldState::On;
                    self.shield_frame = 0.0;
                }
            }
            ShieldState::On => {
                self.shield_frame = (self.shield_frame + SHIELD_ON_RATE * scale) % ship.shield_on_frames;
            }
        }
        self.shield_duration_ms -= dt;
        if self.shield_duration_ms <= 0.0 || self.shield_hp <= 0.0 {
            self.drop_shield(ship);
        }
    }

    /// Continuous ammo regeneration with the recharge lockout
    pub fn regen_ammo(&mut self, weapons: &[WeaponConfig], dt: f32) {
        for (state, cfg) in self.weapons.iter_mut().zip(weapons) {
            if state.ammo < cfg.max_ammo {
                state.ammo = (state.ammo + cfg.recovery_rate * dt / 1000.0).min(cfg.max_ammo);
            }
            if state.recharging && state.ammo >= cfg.min_ammo_to_fire {
                state.recharging = false;
            }
        }
    }

    /// Apply incoming damage, shield first. Raises the shield if it is ready.
    ///
    /// Returns true when the hit is lethal.
    pub fn absorb_damage(&mut self, ship: &ShipConfig, amount: f32) -> bool {
        if !self.shield.is_active() && self.shield_cooldown_ms <= 0.0 {
            self.raise_shield(ship);
        }
        if self.shield.is_active() {
            self.shield_hp -= amount;
            if self.shield_hp <= 0.0 {
                self.drop_shield(ship);
            }
            false
        } else {
            self.health -= amount;
            self.health <= 0.0
        }
    }
}

// ============================================================================
// Systems
// ============================================================================

/// Damage the ship from an enemy attack. A lethal hit soft-resets the run.
pub fn damage_player(state: &mut GameState, amount: f32) -> bool {
    let lethal = state.player.absorb_damage(&state.config.ship, amount);
    let pos = state.player.pos;
    state
        .incoming_damage
        .spawn(&mut state.rng, state.clock_ms, pos.x, pos.y - 50.0, amount, 0, false);
    if let Some(hook) = state.hooks.on_player_hit.as_mut() {
        hook(amount);
    }
    if lethal {
        state.soft_reset();
    }
    lethal
}

/// Nearest alive enemy within detection radius
pub fn find_target(state: &GameState) -> Option<usize> {
    let radius = state.config.ship.detection_radius;
    let max_sq = radius * radius;
    let pos = state.player.pos;
    let mut best: Option<(usize, f32)> = None;
    for i in state.grid.query_radius(pos.x, pos.y, radius) {
        if !state.enemies.is_alive(i) {
            continue;
        }
        let d_sq = Vec2::from(state.enemies.position(i)).distance_squared(pos);
        if d_sq < max_sq && best.is_none_or(|(_, b)| d_sq < b) {
            best = Some((i, d_sq));
        }
    }
    best.map(|(i, _)| i)
}

/// Drop a cached target that has died since it was picked
pub fn validate_target(state: &mut GameState) {
    let stale = state.player.target.is_some_and(|t| !state.enemies.is_alive(t));
    if stale {
        state.player.target = None;
    }
}

/// Travel to the stage center, or hold the ideal engagement range
pub fn update_movement(state: &mut GameState, dt: f32) {
    let scale = dt / FRAME_MS;
    let stride = anim_stride(state.settings.game_speed);

    if state.player.traveling {
        let ship = &state.config.ship;
        let player = &mut state.player;
        let to = player.travel_target - player.pos;
        let d = to.length();
        player.rotation = to.y.atan2(to.x);
        let arrived = d < ship.arrival_dist;
        if !arrived {
            let step = ship.speed * ship.travel_speed_mult * scale;
            if d > MIN_STEER_DIST {
                player.pos += to / d * d.min(step);
            } else {
                player.pos = player.travel_target;
            }
        }
        player.ship_state = ShipState::Full;
        let jitter = state.rng.jitter();
        player.ship_frame = (player.ship_frame + ship.anim_speed * scale * stride * jitter) % ship.full_frames;
        if arrived {
            state.arrive();
        }
    } else if state.settings.auto_skills {
        if let Some(target) = state.player.target {
            engage(state, target, dt, scale * stride);
        }
    }

    let player = &mut state.player;
    if !player.pos.is_finite() {
        log::warn!("player position became non-finite, snapping to {:?}", player.travel_target);
        player.pos = player.travel_target;
    }
}

fn engage(state: &mut GameState, target: usize, dt: f32, anim_scale: f32) {
    let ship = &state.config.ship;
    let player = &mut state.player;
    let to = Vec2::from(state.enemies.position(target)) - player.pos;
    let d = to.length();
    let retreating = player.all_weapons_recharging();

    let mut desired = to.y.atan2(to.x);
    if retreating {
        desired += std::f32::consts::PI;
    }
    let diff = angle_delta(player.rotation, desired);
    let turn_step = ship.turn_speed * dt / 1000.0;
    player.rotation = if diff.abs() < turn_step {
        normalize_angle(desired)
    } else {
        normalize_angle(player.rotation + diff.signum() * turn_step)
    };

    let ideal = ship.full_power_dist * ship.ideal_range_mult;
    let deadzone = ship.full_power_dist * ship.deadzone_mult;
    let direction = if retreating {
        if d < ideal * ship.retreat_range_mult { -1.0 } else { 0.0 }
    } else if d < ideal - deadzone {
        -1.0
    } else if d > ideal + deadzone {
        1.0
    } else {
        0.0
    };
    if direction != 0.0 && d > MIN_STEER_DIST {
        player.pos += to / d * ship.speed * direction * (dt / FRAME_MS);
    }

    let (state_now, frames) = if d > ship.full_power_dist {
        (ShipState::Full, ship.full_frames)
    } else if d > ship.thrust_dist {
        (ShipState::Thrust, ship.on_frames)
    } else {
        (ShipState::Idle, ship.idle_frames)
    };
    player.ship_state = state_now;
    player.ship_frame = (player.ship_frame + ship.anim_speed * anim_scale) % frames;
}

/// Fire every weapon whose clock is due, catching up a bounded number of
/// shots after long steps.
pub fn update_weapons(state: &mut GameState) {
    if state.player.traveling || state.player.target.is_none() {
        return;
    }
    let now = state.clock_ms;
    for k in 0..state.player.weapons.len() {
        let Some(cfg) = state.config.weapons.get(k) else {
            continue;
        };
        let interval = 1000.0 / cfg.fire_rate as f64;
        let mut weapon = state.player.weapons[k];
        let mut last = match weapon.last_fire_ms {
            Some(t) if now - t <= WEAPON_RESYNC_MS => t,
            _ => now - interval,
        };

        let mut shots = 0;
        while now - last >= interval && shots < MAX_CATCHUP_SHOTS {
            shots += 1;
            if weapon.recharging {
                last = now;
                break;
            }
            if weapon.ammo >= 1.0 {
                combat::fire_weapon(state, k);
                weapon.ammo -= 1.0;
                last += interval;
                if weapon.ammo < 1.0 {
                    weapon.ammo = 0.0;
                    weapon.recharging = true;
                    break;
                }
            } else {
                weapon.ammo = 0.0;
                weapon.recharging = true;
                last = now;
                break;
            }
        }
        weapon.last_fire_ms = Some(last);
        state.player.weapons[k] = weapon;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::testing::{place_enemy, test_state};
    use crate::sim::store::field;

    #[test]
    fn test_shield_raises_on_first_hit() {
        let config = GameConfig::default();
        let mut player = Player::new(&config, Vec2::ZERO);
        assert!(!player.absorb_damage(&config.ship, 100.0));
        assert_eq!(player.shield, ShieldState::TurningOn);
        assert_eq!(player.health, player.health_max);
        assert_eq!(player.shield_hp, player.shield_max - 100.0);
    }

    #[test]
    fn test_shield_depletion_starts_cooldown() {
        let config = GameConfig::default();
        let mut player = Player::new(&config, Vec2::ZERO);
        player.absorb_damage(&config.ship, player.shield_max + 1.0);
        assert_eq!(player.shield, ShieldState::Off);
        assert_eq!(player.shield_cooldown_ms, config.ship.shield_cooldown_ms);
        // Cooling down: damage goes to health
        player.absorb_damage(&config.ship, 10.0);
        assert_eq!(player.shield, ShieldState::Off);
        assert_eq!(player.health, player.health_max - 10.0);
    }

    #[test]
    fn test_shield_state_machine_timing() {
        let config = GameConfig::default();
        let ship = &config.ship;
        let mut player = Player::new(&config, Vec2::ZERO);
        player.raise_shield(ship);
        // 145 frames at 0.8 per reference frame
        let steps = (ship.shield_turn_on_frames / 0.8).ceil() as usize;
        for _ in 0..steps {
            player.update_shield(ship, FRAME_MS);
        }
        assert_eq!(player.shield, ShieldState::On);
        for _ in 0..2000 {
            player.update_shield(ship, FRAME_MS);
            assert!(player.shield_frame < ship.shield_on_frames);
            if player.shield == ShieldState::Off {
                break;
            }
        }
        assert_eq!(player.shield, ShieldState::Off);
        assert!(player.shield_cooldown_ms > 0.0);
        player.update_shield(ship, ship.shield_cooldown_ms);
        assert_eq!(player.shield_cooldown_ms, 0.0);
    }

    #[test]
    fn test_lethal_hit_without_shield() {
        let config = GameConfig::default();
        let mut player = Player::new(&config, Vec2::ZERO);
        player.shield_cooldown_ms = 1000.0;
        assert!(player.absorb_damage(&config.ship, player.health_max));
    }

    #[test]
    fn test_ammo_recharge_hysteresis() {
        let config = GameConfig::default();
        let mut player = Player::new(&config, Vec2::ZERO);
        let laser = &config.weapons[2];
        player.weapons[2].ammo = 0.0;
        player.weapons[2].recharging = true;
        // 1 ammo/s: 49 s leaves the laser locked
        player.regen_ammo(&config.weapons, 49_000.0);
        assert!(player.weapons[2].recharging);
        player.regen_ammo(&config.weapons, 1_000.0);
        assert!(!player.weapons[2].recharging);
        player.regen_ammo(&config.weapons, 1e9);
        assert_eq!(player.weapons[2].ammo, laser.max_ammo);
    }

    #[test]
    fn test_targeting_picks_nearest_alive() {
        let mut state = test_state();
        place_enemy(&mut state, 0, 0, 5000.0, 0.0, 10.0);
        place_enemy(&mut state, 1, 0, 3000.0, 0.0, 0.0);
        place_enemy(&mut state, 2, 0, -4000.0, 0.0, 10.0);
        place_enemy(&mut state, 3, 0, 200_000.0, 0.0, 10.0);
        assert_eq!(find_target(&state), Some(2));
    }

    #[test]
    fn test_stale_target_dropped() {
        let mut state = test_state();
        place_enemy(&mut state, 0, 0, 5000.0, 0.0, 10.0);
        state.player.target = Some(0);
        validate_target(&mut state);
        assert_eq!(state.player.target, Some(0));
        state.enemies.set(0, field::HEALTH, 0.0);
        validate_target(&mut state);
        assert_eq!(state.player.target, None);
    }

    #[test]
    fn test_travel_moves_and_arrives() {
        let mut state = test_state();
        state.change_stage(crate::sim::stage::Stage::Campaign(2));
        assert!(state.player.traveling);
        let target = state.player.travel_target;
        let mut frames = 0;
        while state.player.traveling && frames < 1000 {
            update_movement(&mut state, FRAME_MS);
            frames += 1;
        }
        assert!(!state.player.traveling);
        assert!(state.player.pos.distance(target) < state.config.ship.arrival_dist);
        assert_eq!(state.player.ship_state, ShipState::Full);
    }

    #[test]
    fn test_engage_holds_ideal_range() {
        let mut state = test_state();
        let ideal = state.config.ship.full_power_dist * 1.2;
        place_enemy(&mut state, 0, 0, 30000.0, 0.0, 10.0);
        state.player.target = Some(0);
        update_movement(&mut state, FRAME_MS);
        assert!(state.player.pos.x > 0.0);
        assert_eq!(state.player.ship_state, ShipState::Full);

        // Inside the deadzone the ship holds still
        state.player.pos = Vec2::new(30000.0 - ideal, 0.0);
        update_movement(&mut state, FRAME_MS);
        assert_eq!(state.player.pos.x, 30000.0 - ideal);
    }

    #[test]
    fn test_engage_backs_off_when_too_close() {
        let mut state = test_state();
        place_enemy(&mut state, 0, 0, 1000.0, 0.0, 10.0);
        state.player.target = Some(0);
        update_movement(&mut state, FRAME_MS);
        assert!(state.player.pos.x < 0.0);
        assert_eq!(state.player.ship_state, ShipState::Idle);
    }

    #[test]
    fn test_retreat_faces_away() {
        let mut state = test_state();
        state.config.ship.turn_speed = 1e6;
        place_enemy(&mut state, 0, 0, 20000.0, 0.0, 10.0);
        state.player.target = Some(0);
        for weapon in &mut state.player.weapons {
            weapon.recharging = true;
        }
        update_movement(&mut state, FRAME_MS);
        assert!((state.player.rotation.abs() - std::f32::consts::PI).abs() < 1e-4);
        // Far enough: no retreat movement
        assert_eq!(state.player.pos, Vec2::ZERO);
    }

    #[test]
    fn test_manual_mode_does_not_steer() {
        let mut state = test_state();
        state.settings.auto_skills = false;
        place_enemy(&mut state, 0, 0, 30000.0, 0.0, 10.0);
        state.player.target = Some(0);
        update_movement(&mut state, FRAME_MS);
        assert_eq!(state.player.pos, Vec2::ZERO);
    }

    #[test]
    fn test_nan_position_recovers() {
        let mut state = test_state();
        state.player.pos = Vec2::new(f32::NAN, 0.0);
        update_movement(&mut state, FRAME_MS);
        assert_eq!(state.player.pos, state.player.travel_target);
    }

    #[test]
    fn test_weapons_fire_at_rate() {
        let mut state = test_state();
        place_enemy(&mut state, 0, 0, 5000.0, 0.0, 10.0);
        state.player.target = Some(0);
        // First evaluation fires one shot per weapon
        update_weapons(&mut state);
        assert_eq!(state.bullets.len(), 3);
        // Turrets fire at 5/s: 200 ms later one more each; laser at 95/s
        state.clock_ms += 200.0;
        update_weapons(&mut state);
        let laser_shots = 1 + MAX_CATCHUP_SHOTS as usize;
        assert_eq!(state.bullets.len(), 2 * 2 + laser_shots);
    }

    #[test]
    fn test_weapon_empties_into_recharge() {
        let mut state = test_state();
        place_enemy(&mut state, 0, 0, 5000.0, 0.0, 10.0);
        state.player.target = Some(0);
        state.player.weapons[0].ammo = 1.5;
        update_weapons(&mut state);
        assert_eq!(state.player.weapons[0].ammo, 0.0);
        assert!(state.player.weapons[0].recharging);
        let before = state.bullets.len();
        state.clock_ms += 1000.0;
        update_weapons(&mut state);
        // Locked out turret stays silent
        let turret_shots = state
            .bullets
            .active_indices()
            .iter()
            .filter(|&&s| state.bullets.get(s as usize, crate::sim::pool::bullet::KIND) == 0.0)
            .count();
        assert_eq!(turret_shots, 1);
        assert!(state.bullets.len() > before);
    }

    #[test]
    fn test_no_fire_without_target() {
        let mut state = test_state();
        update_weapons(&mut state);
        assert!(state.bullets.is_empty());
    }
}
