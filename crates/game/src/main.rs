//! Textroll - roll a soft-body ball across terrain grown from text.
//!
//! Headless runner: pipe text in (`fortune | textroll`) or point
//! `text_file` in config.ron at a file. An autopilot plays the level and the
//! result is logged.

use std::io::{BufReader, IsTerminal};
use std::time::Duration;

use anyhow::{Context, Result};
use engine_core::FrameClock;
use game::{Autopilot, GameConfig, GameSession, SessionState};
use procgen::{LineReader, LineSource, StaticLines, FALLBACK_TEXT};

/// Frames between progress reports.
const REPORT_INTERVAL: u64 = 600;

fn open_source(config: &GameConfig) -> Result<Box<dyn LineSource>> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        log::info!("reading terrain text from stdin");
        let reader = LineReader::spawn(BufReader::new(stdin)).context("failed to start stdin reader")?;
        return Ok(Box::new(reader));
    }
    if let Some(path) = &config.text_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read text file {}", path.display()))?;
        log::info!("reading terrain text from {}", path.display());
        return Ok(Box::new(StaticLines::from_text(&text)));
    }
    log::info!("no input text, using the built-in passage");
    Ok(Box::new(StaticLines::from_text(FALLBACK_TEXT)))
}

fn run(session: &mut GameSession<Box<dyn LineSource>>, config: &GameConfig) -> Result<()> {
    let mut clock = FrameClock::with_rate(config.tick_rate);
    let step = Duration::from_secs_f64(1.0 / config.tick_rate);
    let dt = clock.fixed_timestep_seconds();
    let mut pilot = Autopilot::new();
    let mut attempt = 1;

    while clock.frame_count() < config.max_frames {
        // Headless: each frame advances exactly one tick of simulated time.
        clock.advance(step);
        while clock.should_fixed_update() {
            let x = session.ball_position()?.x;
            let input = pilot.next_input(x, session.is_on_ground());
            session.update(dt, &input).context("simulation step failed")?;
        }

        if clock.frame_count() % REPORT_INTERVAL == 0 {
            let position = session.ball_position()?;
            log::info!(
                "t={:.0}s x={:.1} y={:.1} score={} x{:.2}",
                clock.elapsed_seconds(),
                position.x,
                position.y,
                session.score(),
                session.multiplier()
            );
        }

        match session.state() {
            SessionState::Running => {}
            SessionState::LevelComplete => {
                log::info!("attempt {attempt}: level complete, final score {}", session.score());
                return Ok(());
            }
            SessionState::GameOver if attempt < config.attempts => {
                log::info!("attempt {attempt}: game over with score {}, restarting", session.score());
                attempt += 1;
                session.restart().context("restart failed")?;
                pilot.reset();
            }
            SessionState::GameOver => {
                log::info!("attempt {attempt}: game over, final score {}", session.score());
                return Ok(());
            }
        }
    }

    log::info!(
        "stopped after {} frames, score {} over {} segments",
        clock.frame_count(),
        session.score(),
        session.segments().len()
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Textroll");

    let config = GameConfig::load();
    let source = open_source(&config)?;
    let mut session =
        GameSession::new(source, config.session_config()).context("failed to build the level")?;
    run(&mut session, &config)
}
