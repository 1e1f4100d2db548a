//! Host composition
//!
//! `Game` owns the round, the progression and the random source, and is the
//! only way the outside world mutates them. Observers (the UI) get the events
//! and a read-only snapshot after every mutation.

use std::cell::Cell;
use std::rc::Rc;

use chrono::NaiveDate;
use rand::Rng;

use crate::consts::{LEVEL_CAP, MAX_SUBSTEPS, TICK_DT};
use crate::progression::{ActivityEntry, ProgressionState, UnlockOutcome};
use crate::sim::{GameEvent, RoundPhase, RoundState, TickInput, tick};

/// Source of "today" for streak bookkeeping
pub trait Calendar {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCalendar;

impl Calendar for LocalCalendar {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Settable date. Clones share the same day.
#[derive(Debug, Clone)]
pub struct FixedCalendar {
    day: Rc<Cell<NaiveDate>>,
}

impl FixedCalendar {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day: Rc::new(Cell::new(day)),
        }
    }

    pub fn set(&self, day: NaiveDate) {
        self.day.set(day);
    }

    /// Move forward one day
    pub fn advance(&self) {
        if let Some(next) = self.day.get().succ_opt() {
            self.day.set(next);
        }
    }
}

impl Calendar for FixedCalendar {
    fn today(&self) -> NaiveDate {
        self.day.get()
    }
}

/// Everything observers are told about
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    Round(GameEvent),
    NewHighScore { score: u32 },
    LevelUnlocked { level: u32 },
    StreakBonus { streak: u32, coins: u32 },
    ActivityLogged { day: NaiveDate, coins: u32 },
    PurchaseRejected { level: u32, cost: u32, balance: u32 },
}

/// Round counters for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundSnapshot {
    pub level: u32,
    pub score: u32,
    pub target_score: u32,
    pub power: u32,
    pub missed: u32,
    pub max_missed: u32,
    pub phase: RoundPhase,
}

/// Progression counters for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressionSnapshot {
    pub coins: u32,
    pub current_streak: u32,
    pub current_level: u32,
    pub max_unlocked_level: u32,
    pub high_score: u32,
    pub bonus_pending: bool,
}

/// Read-only view handed to observers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub round: Option<RoundSnapshot>,
    pub progression: ProgressionSnapshot,
}

/// Gets notified after each mutation
pub trait Observer {
    fn notify(&mut self, events: &[HostEvent], snapshot: &Snapshot);
}

/// Turns wall-clock deltas into a whole number of fixed ticks
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: f32,
    accumulator: f32,
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(TICK_DT)
    }
}

impl FixedStep {
    pub fn new(step: f32) -> Self {
        Self {
            step,
            accumulator: 0.0,
        }
    }

    /// Add `dt` seconds, return how many ticks to run now
    pub fn advance(&mut self, dt: f32) -> u32 {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= self.step && substeps < MAX_SUBSTEPS {
            self.accumulator -= self.step;
            substeps += 1;
        }
        substeps
    }
}

/// The game session
pub struct Game<R: Rng> {
    progression: ProgressionState,
    round: Option<RoundState>,
    /// Tick clock; off between rounds and after a round ends
    running: bool,
    rng: R,
    calendar: Box<dyn Calendar>,
    observers: Vec<Box<dyn Observer>>,
}

impl<R: Rng> Game<R> {
    pub fn new(progression: ProgressionState, rng: R, calendar: Box<dyn Calendar>) -> Self {
        Self {
            progression,
            round: None,
            running: false,
            rng,
            calendar,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn progression(&self) -> &ProgressionState {
        &self.progression
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    /// True while ticks are being processed
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn snapshot(&self) -> Snapshot {
        let p = &self.progression;
        Snapshot {
            round: self.round.as_ref().map(|r| RoundSnapshot {
                level: r.level,
                score: r.score,
                target_score: r.params.target_score,
                power: r.power,
                missed: r.missed,
                max_missed: r.params.max_missed,
                phase: r.phase,
            }),
            progression: ProgressionSnapshot {
                coins: p.coins,
                current_streak: p.current_streak,
                current_level: p.current_level,
                max_unlocked_level: p.max_unlocked_level,
                high_score: p.high_score,
                bonus_pending: p.bonus_pending(),
            },
        }
    }

    /// Pick the level for the next round. Locked levels are refused.
    pub fn select_level(&mut self, level: u32) -> bool {
        let ok = self.progression.select_level(level);
        self.notify(&[]);
        ok
    }

    /// Start a fresh round. Returns false if the level is still locked.
    /// Panics on level 0 or above the cap.
    pub fn start_round(&mut self, level: u32) -> bool {
        assert!(
            (1..=LEVEL_CAP).contains(&level),
            "level must be in 1..={LEVEL_CAP}, got {level}"
        );
        if !self.progression.select_level(level) {
            log::warn!("Level {} is locked", level);
            return false;
        }

        let mut round = RoundState::new(level);
        let events: Vec<_> = round.drain_events().into_iter().map(HostEvent::Round).collect();
        self.round = Some(round);
        self.running = true;
        log::info!("Starting level {}", level);
        self.notify(&events);
        true
    }

    /// Restart the current level
    pub fn reset(&mut self) -> bool {
        let level = self.progression.current_level;
        self.start_round(level)
    }

    /// Leave the round; pending entities are dropped
    pub fn stop(&mut self) {
        self.running = false;
        self.round = None;
    }

    /// Run one tick. Returns the round phase afterwards, `None` when no
    /// round has been started (or it was stopped).
    pub fn tick(&mut self, input: &TickInput) -> Option<RoundPhase> {
        let round = self.round.as_mut()?;
        if !self.running {
            return Some(round.phase);
        }

        let target_was_reached = round.target_reached;
        tick(round, input, &mut self.rng);

        let phase = round.phase;
        let score = round.score;
        // The target can be reached on the same tick the round is lost; it still counts
        let target_reached_now = round.target_reached && !target_was_reached;
        let mut events: Vec<_> = round.drain_events().into_iter().map(HostEvent::Round).collect();

        if phase.is_terminal() {
            self.running = false;
            if self.progression.record_high_score(score) {
                events.push(HostEvent::NewHighScore { score });
            }
        }

        if target_reached_now {
            if self.progression.unlock_next_level() {
                events.push(HostEvent::LevelUnlocked {
                    level: self.progression.max_unlocked_level,
                });
            }
            if self.progression.record_play(self.calendar.today()) {
                events.push(self.streak_bonus_event());
            }
        }

        self.notify(&events);
        Some(phase)
    }

    /// Mark today as played outside of a round
    pub fn record_play(&mut self) {
        let mut events = Vec::new();
        if self.progression.record_play(self.calendar.today()) {
            events.push(self.streak_bonus_event());
        }
        self.notify(&events);
    }

    /// Log a nature activity for `day` (may be in the past)
    pub fn log_activity(&mut self, entry: ActivityEntry, day: NaiveDate) {
        let today = self.calendar.today();
        let bonus = self.progression.log_activity(entry, day, today);

        let mut events = vec![HostEvent::ActivityLogged {
            day,
            coins: crate::consts::COINS_PER_ACTIVITY,
        }];
        if bonus {
            events.push(self.streak_bonus_event());
        }
        self.notify(&events);
    }

    /// Buy a level with coins
    pub fn purchase_unlock(&mut self, level: u32) -> UnlockOutcome {
        let outcome = self.progression.purchase_unlock(level);
        let events = match outcome {
            UnlockOutcome::Unlocked { .. } => vec![HostEvent::LevelUnlocked { level }],
            UnlockOutcome::InsufficientFunds { cost, balance } => {
                vec![HostEvent::PurchaseRejected {
                    level,
                    cost,
                    balance,
                }]
            }
            UnlockOutcome::BeyondCap => Vec::new(),
        };
        self.notify(&events);
        outcome
    }

    /// Read and clear the streak bonus signal
    pub fn take_bonus_signal(&mut self) -> bool {
        let pending = self.progression.take_bonus_signal();
        if pending {
            self.notify(&[]);
        }
        pending
    }

    /// Hand back the progression for saving
    pub fn into_progression(self) -> ProgressionState {
        self.progression
    }

    #[cfg(test)]
    pub(crate) fn round_mut(&mut self) -> Option<&mut RoundState> {
        self.round.as_mut()
    }

    fn streak_bonus_event(&self) -> HostEvent {
        HostEvent::StreakBonus {
            streak: self.progression.current_streak,
            coins: crate::consts::STREAK_BONUS_COINS,
        }
    }

    fn notify(&mut self, events: &[HostEvent]) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer.notify(events, &snapshot);
        }
    }
}
