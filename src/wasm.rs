//! Browser bindings
//!
//! Wraps a `GameState` for the JS renderer. Flat buffers are exposed as
//! pointers into wasm memory so the page can build typed-array views without
//! copying; everything else is plain getters.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::format::format_number;
use crate::settings::{ProgressionMode, QualityPreset, Settings};
use crate::sim::skills::SkillId;
use crate::sim::stage::Stage;
use crate::sim::store::STRIDE;
use crate::sim::{GameConfig, GameState, KillEvent, Pool, TickInput, report_frame_time, tick};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
    log::info!("Nova Swarm core loaded");
}

#[wasm_bindgen(js_name = formatNumber)]
pub fn format_number_js(value: f64) -> String {
    format_number(value)
}

fn now_ms() -> Option<f64> {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
}

fn pool_ptr(pool: &Pool) -> usize {
    pool.as_slice().as_ptr() as usize
}

fn pool_active_ptr(pool: &Pool) -> usize {
    pool.active_indices().as_ptr() as usize
}

#[wasm_bindgen]
pub struct Simulation {
    state: GameState,
    input: TickInput,
    loot: Rc<RefCell<Vec<(String, u64)>>>,
    kills: Rc<RefCell<Vec<KillEvent>>>,
}

#[wasm_bindgen]
impl Simulation {
    /// Build from optional config/settings JSON; missing documents use the
    /// built-in tables. Without a seed the run is seeded from the clock.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config_json: Option<String>,
        settings_json: Option<String>,
        seed: Option<f64>,
    ) -> Result<Simulation, JsValue> {
        let config = match config_json {
            Some(json) => GameConfig::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => GameConfig::default(),
        };
        let settings = match settings_json {
            Some(json) => Settings::from_json(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring saved settings: {e}");
                Settings::default()
            }),
            None => Settings::default(),
        };

        let seed = seed.unwrap_or_else(js_sys::Date::now) as u64;
        let mut state = GameState::new(config, settings, seed);
        let loot = Rc::new(RefCell::new(Vec::new()));
        let kills = Rc::new(RefCell::new(Vec::new()));
        let loot_sink = Rc::clone(&loot);
        state.hooks.on_loot = Some(Box::new(move |key: &str, amount: u64| {
            loot_sink.borrow_mut().push((key.to_string(), amount));
        }));
        let kill_sink = Rc::clone(&kills);
        state.hooks.on_kill = Some(Box::new(move |event| kill_sink.borrow_mut().push(event)));

        Ok(Simulation {
            state,
            input: TickInput::default(),
            loot,
            kills,
        })
    }

    /// Advance one rendered frame
    pub fn tick(&mut self, frame_dt: f32) {
        let started = now_ms();
        let input = std::mem::take(&mut self.input);
        tick(&mut self.state, &input, frame_dt);
        if let (Some(start), Some(end)) = (started, now_ms()) {
            report_frame_time(end - start, &self.state);
        }
    }

    // === Commands (applied on the next tick) ===

    #[wasm_bindgen(js_name = setGameSpeed)]
    pub fn set_game_speed(&mut self, speed: f32) {
        self.input.game_speed = Some(speed);
    }

    #[wasm_bindgen(js_name = changeStage)]
    pub fn change_stage(&mut self, stage: u32) {
        self.input.change_stage = Some(Stage::Campaign(stage));
    }

    #[wasm_bindgen(js_name = enterSimulation)]
    pub fn enter_simulation(&mut self, level: u32, difficulty: u32) {
        self.input.change_stage = Some(Stage::Simulation { level, difficulty });
    }

    /// Slots 0..=2 are Supernova tiers 1..=3, slot 3 the Sword of Light
    #[wasm_bindgen(js_name = castSkill)]
    pub fn cast_skill(&mut self, slot: u8) {
        self.input.cast = SkillId::ALL.get(slot as usize).copied();
    }

    #[wasm_bindgen(js_name = setAutoSkills)]
    pub fn set_auto_skills(&mut self, enabled: bool) {
        self.state.settings.auto_skills = enabled;
    }

    #[wasm_bindgen(js_name = setProgressionMode)]
    pub fn set_progression_mode(&mut self, mode: &str) {
        match ProgressionMode::from_str(mode) {
            Some(mode) => self.state.settings.progression_mode = mode,
            None => log::warn!("Unknown progression mode '{mode}'"),
        }
    }

    #[wasm_bindgen(js_name = setQuality)]
    pub fn set_quality(&mut self, preset: &str) {
        match QualityPreset::from_str(preset) {
            Some(preset) => self.state.settings.quality = preset,
            None => log::warn!("Unknown quality preset '{preset}'"),
        }
    }

    #[wasm_bindgen(js_name = settingsJson)]
    pub fn settings_json(&self) -> Result<String, JsValue> {
        self.state
            .settings
            .to_json()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // === Flat buffers ===

    #[wasm_bindgen(js_name = enemyPtr)]
    pub fn enemy_ptr(&self) -> usize {
        self.state.enemies.as_slice(self.state.spawn_index).as_ptr() as usize
    }

    #[wasm_bindgen(js_name = enemyCount)]
    pub fn enemy_count(&self) -> usize {
        self.state.spawn_index
    }

    #[wasm_bindgen(js_name = enemyStride)]
    pub fn enemy_stride(&self) -> usize {
        STRIDE
    }

    #[wasm_bindgen(js_name = bulletPtr)]
    pub fn bullet_ptr(&self) -> usize {
        pool_ptr(&self.state.bullets)
    }

    #[wasm_bindgen(js_name = bulletActivePtr)]
    pub fn bullet_active_ptr(&self) -> usize {
        pool_active_ptr(&self.state.bullets)
    }

    #[wasm_bindgen(js_name = bulletCount)]
    pub fn bullet_count(&self) -> usize {
        self.state.bullets.len()
    }

    #[wasm_bindgen(js_name = skillPtr)]
    pub fn skill_ptr(&self) -> usize {
        pool_ptr(self.state.skills.pool())
    }

    #[wasm_bindgen(js_name = skillActivePtr)]
    pub fn skill_active_ptr(&self) -> usize {
        pool_active_ptr(self.state.skills.pool())
    }

    #[wasm_bindgen(js_name = skillCount)]
    pub fn skill_count(&self) -> usize {
        self.state.skills.pool().len()
    }

    #[wasm_bindgen(js_name = fxPtr)]
    pub fn fx_ptr(&self) -> usize {
        pool_ptr(self.state.fx.pool())
    }

    #[wasm_bindgen(js_name = fxActivePtr)]
    pub fn fx_active_ptr(&self) -> usize {
        pool_active_ptr(self.state.fx.pool())
    }

    #[wasm_bindgen(js_name = fxCount)]
    pub fn fx_count(&self) -> usize {
        self.state.fx.pool().len()
    }

    #[wasm_bindgen(js_name = damageNumberPtr)]
    pub fn damage_number_ptr(&self) -> usize {
        pool_ptr(self.state.damage_numbers.pool())
    }

    #[wasm_bindgen(js_name = damageNumberActivePtr)]
    pub fn damage_number_active_ptr(&self) -> usize {
        pool_active_ptr(self.state.damage_numbers.pool())
    }

    #[wasm_bindgen(js_name = damageNumberCount)]
    pub fn damage_number_count(&self) -> usize {
        self.state.damage_numbers.pool().len()
    }

    #[wasm_bindgen(js_name = incomingDamagePtr)]
    pub fn incoming_damage_ptr(&self) -> usize {
        pool_ptr(self.state.incoming_damage.pool())
    }

    #[wasm_bindgen(js_name = incomingDamageActivePtr)]
    pub fn incoming_damage_active_ptr(&self) -> usize {
        pool_active_ptr(self.state.incoming_damage.pool())
    }

    #[wasm_bindgen(js_name = incomingDamageCount)]
    pub fn incoming_damage_count(&self) -> usize {
        self.state.incoming_damage.pool().len()
    }

    // === HUD ===

    #[wasm_bindgen(js_name = playerX)]
    pub fn player_x(&self) -> f32 {
        self.state.player.pos.x
    }

    #[wasm_bindgen(js_name = playerY)]
    pub fn player_y(&self) -> f32 {
        self.state.player.pos.y
    }

    #[wasm_bindgen(js_name = playerRotation)]
    pub fn player_rotation(&self) -> f32 {
        self.state.player.rotation
    }

    #[wasm_bindgen(js_name = shipState)]
    pub fn ship_state(&self) -> String {
        self.state.player.ship_state.as_str().to_string()
    }

    #[wasm_bindgen(js_name = shipFrame)]
    pub fn ship_frame(&self) -> f32 {
        self.state.player.ship_frame
    }

    pub fn health(&self) -> f32 {
        self.state.player.health
    }

    #[wasm_bindgen(js_name = healthMax)]
    pub fn health_max(&self) -> f32 {
        self.state.player.health_max
    }

    #[wasm_bindgen(js_name = shieldHp)]
    pub fn shield_hp(&self) -> f32 {
        self.state.player.shield_hp
    }

    #[wasm_bindgen(js_name = shieldActive)]
    pub fn shield_active(&self) -> bool {
        self.state.player.shield.is_active()
    }

    #[wasm_bindgen(js_name = shieldFrame)]
    pub fn shield_frame(&self) -> f32 {
        self.state.player.shield_frame
    }

    /// Ammo per weapon, in config order
    pub fn ammo(&self) -> Vec<f32> {
        self.state.player.weapons.iter().map(|w| w.ammo).collect()
    }

    /// Remaining cooldown per skill slot (ms)
    pub fn cooldowns(&self) -> Vec<f32> {
        self.state.skills.cooldowns().to_vec()
    }

    #[wasm_bindgen(js_name = isTraveling)]
    pub fn is_traveling(&self) -> bool {
        self.state.player.traveling
    }

    #[wasm_bindgen(js_name = stageId)]
    pub fn stage_id(&self) -> u32 {
        self.state.stage().id()
    }

    #[wasm_bindgen(js_name = isSimulation)]
    pub fn is_simulation(&self) -> bool {
        self.state.stage().is_simulation()
    }

    #[wasm_bindgen(js_name = killCount)]
    pub fn kill_count(&self) -> f64 {
        self.state.kill_count as f64
    }

    #[wasm_bindgen(js_name = stageKillCount)]
    pub fn stage_kill_count(&self) -> u32 {
        self.state.stage_kill_count
    }

    #[wasm_bindgen(js_name = killTarget)]
    pub fn kill_target(&self) -> u32 {
        self.state.plan.kill_target
    }

    /// Drain batched loot as `[[key, amount], ...]` JSON
    #[wasm_bindgen(js_name = takeLoot)]
    pub fn take_loot(&mut self) -> Result<String, JsValue> {
        let drained = std::mem::take(&mut *self.loot.borrow_mut());
        serde_json::to_string(&drained).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Drain kill positions as a flat `[x, y, tier, ...]` list for hit flashes
    #[wasm_bindgen(js_name = takeKills)]
    pub fn take_kills(&mut self) -> Vec<f32> {
        self.kills
            .borrow_mut()
            .drain(..)
            .flat_map(|k| [k.position.x, k.position.y, k.tier as f32])
            .collect()
    }
}
