//! Eco Venture entry point
//!
//! Headless demo host: plays rounds on autopilot at the fixed tick rate and
//! saves progress after every round. Usage: `eco-venture [settings.json]`

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use eco_venture::game::{HostEvent, Observer, Snapshot};
use eco_venture::persistence::{JsonFileStore, SnapshotStore};
use eco_venture::sim::{GameEvent, RoundPhase, autopilot};
use eco_venture::{FixedStep, Game, LocalCalendar, Settings};

/// Stands in for the UI: writes what it would show to the log
struct LogObserver;

impl Observer for LogObserver {
    fn notify(&mut self, events: &[HostEvent], snapshot: &Snapshot) {
        for event in events {
            match event {
                HostEvent::Round(GameEvent::Caught { score, .. }) => {
                    if let Some(round) = snapshot.round {
                        log::debug!("Score {}/{}", score, round.target_score);
                    }
                }
                HostEvent::Round(GameEvent::Missed { missed, power, .. }) => {
                    log::debug!("Missed {} (power {}%)", missed, power);
                }
                HostEvent::Round(_) => {}
                HostEvent::NewHighScore { score } => log::info!("🏆 High score {}", score),
                HostEvent::LevelUnlocked { level } => log::info!("🔓 Level {} unlocked", level),
                HostEvent::StreakBonus { streak, coins } => {
                    log::info!("🔥 {} day streak, +{} coins", streak, coins)
                }
                HostEvent::ActivityLogged { day, coins } => {
                    log::info!("🌿 Activity on {} (+{} coins)", day, coins)
                }
                HostEvent::PurchaseRejected {
                    level,
                    cost,
                    balance,
                } => log::warn!(
                    "You need {} coins to unlock level {} (balance {})",
                    cost,
                    level,
                    balance
                ),
            }
        }
    }
}

/// Tick the current round until it ends. `None` if it was abandoned.
fn play_round(game: &mut Game<Pcg32>, settings: &Settings) -> Option<RoundPhase> {
    let interval = Duration::from_millis(settings.tick_interval_ms.max(1));
    let mut step = FixedStep::new(interval.as_secs_f32());
    let mut last = Instant::now();
    let mut ticks = 0u64;

    while game.is_running() {
        let substeps = if settings.realtime {
            std::thread::sleep(interval);
            let now = Instant::now();
            let dt = now.duration_since(last).as_secs_f32();
            last = now;
            step.advance(dt)
        } else {
            1
        };

        for _ in 0..substeps {
            let input = autopilot::steer(game.round()?, settings.autopilot_speed);
            game.tick(&input);
            ticks += 1;
            if !game.is_running() {
                break;
            }
        }

        if ticks >= settings.max_ticks_per_round && game.is_running() {
            log::warn!("Abandoning round after {} ticks", ticks);
            game.stop();
            return None;
        }
    }

    game.round().map(|r| r.phase)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("eco-venture.json"));
    let settings = Settings::load(&settings_path);

    let store = JsonFileStore::new(settings.resolve_save_path()?);
    let progression = store.load()?.unwrap_or_default();

    let rng = Pcg32::seed_from_u64(settings.seed);
    let mut game = Game::new(progression, rng, Box::new(LocalCalendar));
    game.add_observer(Box::new(LogObserver));

    for round_no in 1..=settings.rounds {
        let level = game.progression().max_unlocked_level;
        if !game.start_round(level) {
            break;
        }

        match play_round(&mut game, &settings) {
            Some(RoundPhase::Won) => log::info!("Round {}: level {} cleared", round_no, level),
            Some(RoundPhase::Lost) => log::info!("Round {}: level {} failed", round_no, level),
            Some(RoundPhase::Running) | None => {
                log::info!("Round {}: level {} abandoned", round_no, level)
            }
        }

        if game.take_bonus_signal() {
            log::info!("Streak bonus collected");
        }
        store.save(game.progression())?;
    }

    let snapshot = game.snapshot().progression;
    log::info!(
        "Done: level {}/{}, high score {}, {} coins, {} day streak",
        snapshot.max_unlocked_level,
        eco_venture::consts::LEVEL_CAP,
        snapshot.high_score,
        snapshot.coins,
        snapshot.current_streak
    );
    Ok(())
}
