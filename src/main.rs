//! Gravity Gauntlet - headless native runner
//!
//! Plays a level without a window: simulated frames at 60 Hz, an autopilot
//! that jumps whenever it can, and a summary of what happened.
//!
//! Usage: `gravity-gauntlet [level.json] [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
use gravity_gauntlet::{
    Settings,
    renderer::DrawList,
    sim::{FrameClock, GameEvent, GamePhase, GameState, Level, SeedOptions, run_frame},
};

/// Built-in level used when no file is given
#[cfg(not(target_arch = "wasm32"))]
const DEMO_LEVEL: &str = r#"{
    "name": "Funnel",
    "type": "gravityGauntlet",
    "goals": [
        {"shape": "circle", "radius": 40, "x": "center", "y": "bottom"}
    ],
    "hazards": [
        {"shape": "box", "width": 160, "height": 16, "x": "left+40", "y": "60%"},
        {"shape": "box", "width": 160, "height": 16, "x": "right-40", "y": "60%"},
        {"shape": "circle", "radius": 18, "x": "center", "y": "35%", "damage": 0.5}
    ],
    "powerups": [
        {"type": "shield", "shape": "circle", "radius": 12, "x": "25%", "y": "bottom-20"},
        {"type": "speed", "shape": "circle", "radius": 12, "x": "75%", "y": "bottom-20"}
    ],
    "physics": {"elasticity": 0.85, "iterations": 6}
}"#;

/// Frames simulated before giving up
#[cfg(not(target_arch = "wasm32"))]
const MAX_FRAMES: u32 = 60 * 120;

#[cfg(not(target_arch = "wasm32"))]
fn read_arg(index: usize) -> Option<String> {
    let path = std::env::args().nth(index)?;
    match std::fs::read_to_string(&path) {
        Ok(text) => Some(text),
        Err(e) => {
            log::error!("Can't read {}: {}", path, e);
            None
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Gravity Gauntlet (headless) starting...");

    let level_json = read_arg(1).unwrap_or_else(|| DEMO_LEVEL.to_string());
    let level = match Level::from_json(&level_json) {
        Ok(level) => level,
        Err(e) => {
            log::error!("Invalid level: {}", e);
            std::process::exit(1);
        }
    };
    let settings = match read_arg(2).map(|json| Settings::from_json(&json)) {
        Some(Ok(settings)) => settings,
        Some(Err(e)) => {
            log::warn!("Invalid settings, using defaults: {}", e);
            Settings::default()
        }
        None => Settings::default(),
    };

    let mut state = GameState::new(0x5EED);
    state.load_level(level);
    state.initialize(SeedOptions {
        count: 8,
        starting_size: Some(18.0),
        ..SeedOptions::default()
    });

    let mut clock = FrameClock::new(settings.max_fps);
    let mut canvas = DrawList::new();
    let mut events: Vec<GameEvent> = Vec::new();
    let mut jumps = 0u32;
    let mut frame = 0u32;

    while frame < MAX_FRAMES {
        let now = f64::from(frame) * 1000.0 / 60.0;
        if !run_frame(&mut state, &mut clock, now, &mut canvas, &settings, &mut events) {
            break;
        }
        if frame % 45 == 0 && state.jump(&settings).succeeded() {
            jumps += 1;
        }
        frame += 1;
    }

    let collisions = events
        .iter()
        .filter(|e| matches!(e, GameEvent::Collision { .. }))
        .count();
    let outcome = match state.phase {
        GamePhase::Won => "won",
        GamePhase::Lost => "lost",
        GamePhase::Running => "time up",
    };
    println!(
        "{} after {} frames ({:.1}s simulated): score {}, {} collisions, {} wall hits, {} jumps, {} entities left, {} vertices in last frame",
        outcome,
        frame,
        state.now_ms / 1000.0,
        state.score,
        collisions,
        state.wall_hits,
        jumps,
        state.entities.len(),
        canvas.vertices.len()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly on wasm
}
