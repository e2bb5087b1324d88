//! Space Invaders headless driver
//!
//! Runs the simulation at a fixed frame count with scripted input, playing
//! the role a rendering front end would: feed intents, call `update()`,
//! reconcile pending queues, and read the HUD through an observer.
//!
//! Usage: `space-invaders [easy|medium|hard] [frames]`

use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;

use space_invaders::sim::EntityTag;
use space_invaders::{Difficulty, GameEngine, Scoreboard};

const DEFAULT_FRAMES: u32 = 1200;
/// Frames between HUD log lines
const HUD_INTERVAL: u32 = 120;
/// Frames per sweep before the scripted player turns around
const SWEEP_FRAMES: u32 = 90;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let difficulty = match args.next() {
        Some(arg) => match Difficulty::from_str(&arg) {
            Some(d) => d,
            None => {
                eprintln!("Unknown difficulty '{}', expected easy, medium or hard", arg);
                return ExitCode::FAILURE;
            }
        },
        None => Difficulty::default(),
    };
    let frames = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    let mut engine = match GameEngine::from_difficulty(difficulty) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    log::info!("Space Invaders ({}) running {} frames", difficulty.as_str(), frames);

    let hud = Rc::new(RefCell::new(Scoreboard::default()));
    engine.attach(Box::new(hud.clone()));

    let save_at = frames / 3;
    let revert_at = 2 * frames / 3;

    for frame in 1..=frames {
        drive_player(&mut engine, frame);
        engine.update();
        engine.apply_pending();

        if frame == save_at {
            engine.save_snapshot();
        }
        if frame == revert_at {
            engine.revert_snapshot();
            engine.apply_pending();
        }
        if frame % HUD_INTERVAL == 0 {
            log::info!("{}", hud.borrow().hud_line());
        }
        if !engine.player_alive() {
            log::info!("Game over at frame {}", frame);
            break;
        }
        if engine.count(EntityTag::Enemy) == 0 {
            log::info!("Wave cleared at frame {}", frame);
            break;
        }
    }

    let hud = hud.borrow();
    println!(
        "{} | {} | enemies left: {}",
        difficulty.as_str(),
        hud.hud_line(),
        engine.count(EntityTag::Enemy)
    );
    ExitCode::SUCCESS
}

/// Sweep left and right, firing whenever the cooldown allows
fn drive_player(engine: &mut GameEngine, frame: u32) {
    if (frame / SWEEP_FRAMES) % 2 == 0 {
        engine.right_released();
        engine.left_pressed();
    } else {
        engine.left_released();
        engine.right_pressed();
    }
    engine.shoot_pressed();
}
