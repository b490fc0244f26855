//! Nova Swarm entry point
//!
//! Native builds run a headless session and print a summary; the browser
//! build starts from `nova_swarm::wasm::start`.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::process::ExitCode;
    use std::rc::Rc;
    use std::time::Instant;

    use nova_swarm::consts::FRAME_MS;
    use nova_swarm::format_number;
    use nova_swarm::sim::{GameConfig, GameState, TickInput, report_frame_time, tick};
    use nova_swarm::{ProgressionMode, Settings};

    /// Simulated frames (one minute of rendering at 60 fps)
    const FRAMES: u32 = 3600;
    const SEED: u64 = 0x5EED;

    fn load_config(path: Option<String>) -> Result<GameConfig, String> {
        let Some(path) = path else {
            return Ok(GameConfig::default());
        };
        let json = std::fs::read_to_string(&path).map_err(|e| format!("cannot read {path}: {e}"))?;
        GameConfig::from_json(&json).map_err(|e| format!("{path}: {e}"))
    }

    pub fn run() -> ExitCode {
        env_logger::init();
        log::info!("Nova Swarm (native) starting...");

        let mut args = std::env::args().skip(1);
        let config = match load_config(args.next()) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{err}");
                return ExitCode::FAILURE;
            }
        };
        let speed = args.next().and_then(|s| s.parse::<f32>().ok()).unwrap_or(10.0);

        let mut settings = Settings::default();
        settings.set_game_speed(speed);
        settings.progression_mode = ProgressionMode::Progress;

        let mut state = GameState::new(config, settings, SEED);
        let totals = Rc::new(RefCell::new(BTreeMap::<String, u64>::new()));
        let sink = Rc::clone(&totals);
        state.hooks.on_loot = Some(Box::new(move |key: &str, amount: u64| {
            let mut totals = sink.borrow_mut();
            let total = totals.entry(key.to_string()).or_default();
            *total = total.saturating_add(amount);
        }));

        let input = TickInput::default();
        let started = Instant::now();
        for _ in 0..FRAMES {
            let frame_start = Instant::now();
            tick(&mut state, &input, FRAME_MS);
            report_frame_time(frame_start.elapsed().as_secs_f64() * 1000.0, &state);
        }
        state.flush_loot();

        println!(
            "{} frames at {}x in {:.2}s",
            FRAMES,
            state.settings.game_speed,
            started.elapsed().as_secs_f64()
        );
        println!(
            "{}: {} kills this stage, {} total, {} resets",
            state.stage(),
            state.stage_kill_count,
            format_number(state.kill_count as f64),
            state.soft_resets
        );
        for (item, amount) in totals.borrow().iter() {
            println!("  {item}: {}", format_number(*amount as f64));
        }
        ExitCode::SUCCESS
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    headless::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser entry point is nova_swarm::wasm::start
}
