//! Levels, coins, high score and the nature streak calendar
//!
//! One instance lives for the whole session and is persisted between runs.
//! All days are calendar days (`NaiveDate`) in the player's local time; the
//! host normalizes timestamps before calling in.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// One logged nature activity (photo + note)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Encoded image bytes, opaque to the core
    pub image: Vec<u8>,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(image: Vec<u8>, description: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            image,
            description: description.into(),
            timestamp,
        }
    }
}

/// Result of trying to buy a level with coins
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// Coins deducted, level playable
    Unlocked { cost: u32 },
    /// Nothing changed
    InsufficientFunds { cost: u32, balance: u32 },
    /// Level does not exist; nothing changed
    BeyondCap,
}

/// Session-wide progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionState {
    pub high_score: u32,
    /// Level the player has selected
    pub current_level: u32,
    /// Highest playable level, never decreases
    pub max_unlocked_level: u32,
    pub coins: u32,
    /// Days with a won round or a logged activity
    pub played_days: BTreeSet<NaiveDate>,
    pub current_streak: u32,
    /// Start days of streak windows that have already paid out
    pub reward_days: BTreeSet<NaiveDate>,
    pub activities: BTreeMap<NaiveDate, Vec<ActivityEntry>>,
    /// Set when a streak bonus was paid; the UI shows it once and clears it
    #[serde(skip)]
    bonus_pending: bool,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressionState {
    pub fn new() -> Self {
        Self {
            high_score: 0,
            current_level: 1,
            max_unlocked_level: 1,
            coins: 0,
            played_days: BTreeSet::new(),
            current_streak: 0,
            reward_days: BTreeSet::new(),
            activities: BTreeMap::new(),
            bonus_pending: false,
        }
    }

    /// Keep the best score. Returns true on a new record.
    pub fn record_high_score(&mut self, score: u32) -> bool {
        if score > self.high_score {
            self.high_score = score;
            log::info!("New high score: {}", score);
            true
        } else {
            false
        }
    }

    /// Unlock the level after the current one, but only when the current level
    /// is the frontier. Replaying an older level unlocks nothing.
    pub fn unlock_next_level(&mut self) -> bool {
        if self.current_level == self.max_unlocked_level && self.max_unlocked_level < LEVEL_CAP {
            self.max_unlocked_level += 1;
            log::info!("Unlocked level {}", self.max_unlocked_level);
            true
        } else {
            false
        }
    }

    /// Mark `today` as played and refresh the streak. Returns true if this
    /// call paid the streak bonus.
    pub fn record_play(&mut self, today: NaiveDate) -> bool {
        self.mark_played(today, today)
    }

    /// Store an activity under `day`, count the day as played and pay the
    /// per-activity coins. The streak is measured back from `today`.
    /// Returns true if this call also paid the streak bonus.
    pub fn log_activity(&mut self, entry: ActivityEntry, day: NaiveDate, today: NaiveDate) -> bool {
        self.activities.entry(day).or_default().push(entry);
        let bonus = self.mark_played(day, today);
        self.add_coins(COINS_PER_ACTIVITY);
        log::info!(
            "Logged activity for {} (+{} coins, balance {})",
            day,
            COINS_PER_ACTIVITY,
            self.coins
        );
        bonus
    }

    /// Activities logged on `day`, oldest first
    pub fn activities_on(&self, day: NaiveDate) -> &[ActivityEntry] {
        self.activities.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    fn mark_played(&mut self, day: NaiveDate, today: NaiveDate) -> bool {
        self.played_days.insert(day);
        self.update_streak(today)
    }

    /// Count back from today while the previous day was played. Today always
    /// counts. A seven day run pays the bonus once per window start.
    fn update_streak(&mut self, today: NaiveDate) -> bool {
        let mut streak = 1;
        let mut cursor = today;
        loop {
            match cursor.pred_opt() {
                Some(prev) if self.played_days.contains(&prev) => {
                    streak += 1;
                    cursor = prev;
                }
                _ => break,
            }
        }
        self.current_streak = streak;

        if streak < STREAK_BONUS_DAYS {
            return false;
        }

        let Some(reward_day) = today.checked_sub_days(Days::new(u64::from(STREAK_BONUS_DAYS - 1)))
        else {
            return false;
        };
        if !self.reward_days.insert(reward_day) {
            return false;
        }

        self.add_coins(STREAK_BONUS_COINS);
        self.bonus_pending = true;
        log::info!(
            "{} day streak! +{} bonus coins (window from {})",
            streak,
            STREAK_BONUS_COINS,
            reward_day
        );
        true
    }

    pub fn add_coins(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
    }

    /// Read and clear the streak bonus signal
    pub fn take_bonus_signal(&mut self) -> bool {
        std::mem::take(&mut self.bonus_pending)
    }

    /// Peek at the streak bonus signal without clearing it
    pub fn bonus_pending(&self) -> bool {
        self.bonus_pending
    }

    /// Coins needed to buy `level`. Level 1 is free.
    pub fn cost_to_unlock(level: u32) -> u32 {
        if level <= 1 {
            0
        } else {
            (level - 2).saturating_mul(25).saturating_add(75)
        }
    }

    /// Enough coins for a level that exists
    pub fn can_unlock(&self, level: u32) -> bool {
        level <= LEVEL_CAP && self.coins >= Self::cost_to_unlock(level)
    }

    pub fn is_locked(&self, level: u32) -> bool {
        level > self.max_unlocked_level
    }

    /// Buy `level` with coins. Leaves everything untouched unless it succeeds.
    pub fn purchase_unlock(&mut self, level: u32) -> UnlockOutcome {
        assert!(level >= 1, "level must be >= 1, got {level}");

        if level > LEVEL_CAP {
            log::warn!("Cannot unlock level {}: cap is {}", level, LEVEL_CAP);
            return UnlockOutcome::BeyondCap;
        }

        let cost = Self::cost_to_unlock(level);
        if self.coins < cost {
            log::warn!(
                "Not enough coins for level {}: need {}, have {}",
                level,
                cost,
                self.coins
            );
            return UnlockOutcome::InsufficientFunds {
                cost,
                balance: self.coins,
            };
        }

        self.coins -= cost;
        self.max_unlocked_level = self.max_unlocked_level.max(level);
        log::info!("Bought level {} for {} coins ({} left)", level, cost, self.coins);
        UnlockOutcome::Unlocked { cost }
    }

    /// Pick the level to play next. Locked levels are refused.
    pub fn select_level(&mut self, level: u32) -> bool {
        if level >= 1 && !self.is_locked(level) {
            self.current_level = level;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(n: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Days::new(n)
    }

    fn entry(text: &str) -> ActivityEntry {
        ActivityEntry::new(vec![0xFF, 0xD8], text, Utc::now())
    }

    #[test]
    fn test_high_score_keeps_max() {
        let mut p = ProgressionState::new();
        assert!(p.record_high_score(7));
        assert!(!p.record_high_score(3));
        assert_eq!(p.high_score, 7);
    }

    #[test]
    fn test_unlock_next_only_from_frontier() {
        let mut p = ProgressionState::new();
        assert!(p.unlock_next_level());
        assert_eq!(p.max_unlocked_level, 2);

        // Replaying level 1 must not unlock level 3
        assert!(!p.unlock_next_level());
        assert_eq!(p.max_unlocked_level, 2);

        assert!(p.select_level(2));
        assert!(p.unlock_next_level());
        assert_eq!(p.max_unlocked_level, 3);
    }

    #[test]
    fn test_unlock_stops_at_cap() {
        let mut p = ProgressionState::new();
        p.max_unlocked_level = LEVEL_CAP;
        p.current_level = LEVEL_CAP;
        assert!(!p.unlock_next_level());
        assert_eq!(p.max_unlocked_level, LEVEL_CAP);
    }

    #[test]
    fn test_unlock_costs() {
        assert_eq!(ProgressionState::cost_to_unlock(1), 0);
        assert_eq!(ProgressionState::cost_to_unlock(2), 75);
        assert_eq!(ProgressionState::cost_to_unlock(3), 100);
        assert_eq!(ProgressionState::cost_to_unlock(10), 275);
    }

    #[test]
    fn test_unlock_cost_saturates_for_huge_levels() {
        assert_eq!(ProgressionState::cost_to_unlock(u32::MAX), u32::MAX);

        let mut p = ProgressionState::new();
        p.coins = u32::MAX;
        assert!(!p.can_unlock(u32::MAX));
        assert!(!p.can_unlock(LEVEL_CAP + 1));
        assert!(p.can_unlock(LEVEL_CAP));
    }

    #[test]
    fn test_purchase_with_eighty_coins() {
        let mut p = ProgressionState::new();
        p.coins = 80;

        let outcome = p.purchase_unlock(3);
        assert_eq!(
            outcome,
            UnlockOutcome::InsufficientFunds {
                cost: 100,
                balance: 80
            }
        );
        assert_eq!(p.coins, 80);
        assert!(p.is_locked(3));

        assert_eq!(p.purchase_unlock(2), UnlockOutcome::Unlocked { cost: 75 });
        assert_eq!(p.coins, 5);
        assert_eq!(p.max_unlocked_level, 2);
    }

    #[test]
    fn test_purchase_beyond_cap() {
        let mut p = ProgressionState::new();
        p.coins = 100_000;
        assert_eq!(p.purchase_unlock(LEVEL_CAP + 1), UnlockOutcome::BeyondCap);
        assert_eq!(p.coins, 100_000);
    }

    #[test]
    fn test_purchase_never_lowers_max_unlocked() {
        let mut p = ProgressionState::new();
        p.max_unlocked_level = 5;
        p.coins = 200;
        assert_eq!(p.purchase_unlock(2), UnlockOutcome::Unlocked { cost: 75 });
        assert_eq!(p.max_unlocked_level, 5);
    }

    #[test]
    fn test_select_locked_level_refused() {
        let mut p = ProgressionState::new();
        assert!(!p.select_level(2));
        assert_eq!(p.current_level, 1);
    }

    #[test]
    fn test_seventh_day_pays_bonus_once() {
        let mut p = ProgressionState::new();
        for n in 0..6 {
            p.played_days.insert(day(n));
        }

        assert!(p.record_play(day(6)));
        assert_eq!(p.current_streak, 7);
        assert!(p.reward_days.contains(&day(0)));
        assert_eq!(p.coins, STREAK_BONUS_COINS);
        assert!(p.take_bonus_signal());
        assert!(!p.take_bonus_signal());

        // Same day again: nothing new
        assert!(!p.record_play(day(6)));
        assert!(!p.record_play(day(6)));
        assert_eq!(p.current_streak, 7);
        assert_eq!(p.coins, STREAK_BONUS_COINS);
        assert_eq!(p.reward_days.len(), 1);
        assert!(!p.bonus_pending());
    }

    #[test]
    fn test_streak_window_slides() {
        let mut p = ProgressionState::new();
        for n in 0..7 {
            p.record_play(day(n));
        }
        assert_eq!(p.coins, STREAK_BONUS_COINS);

        // Day 7 starts a new window at day 1
        p.record_play(day(7));
        assert_eq!(p.current_streak, 8);
        assert!(p.reward_days.contains(&day(1)));
        assert_eq!(p.coins, 2 * STREAK_BONUS_COINS);
    }

    #[test]
    fn test_gap_resets_streak() {
        let mut p = ProgressionState::new();
        p.record_play(day(0));
        p.record_play(day(1));
        assert_eq!(p.current_streak, 2);

        p.record_play(day(3));
        assert_eq!(p.current_streak, 1);
    }

    #[test]
    fn test_log_activity_pays_every_time() {
        let mut p = ProgressionState::new();
        p.log_activity(entry("walk"), day(0), day(0));
        p.log_activity(entry("birds"), day(0), day(0));

        assert_eq!(p.coins, 2 * COINS_PER_ACTIVITY);
        assert_eq!(p.activities_on(day(0)).len(), 2);
        assert_eq!(p.activities_on(day(0))[1].description, "birds");
        assert!(p.activities_on(day(1)).is_empty());
        assert!(p.played_days.contains(&day(0)));
        assert_eq!(p.current_streak, 1);
    }

    #[test]
    fn test_backfilled_activity_extends_streak() {
        let mut p = ProgressionState::new();
        p.record_play(day(2));
        p.log_activity(entry("late entry"), day(1), day(2));
        assert_eq!(p.current_streak, 2);
    }

    #[test]
    fn test_activity_completing_week_pays_both() {
        let mut p = ProgressionState::new();
        for n in 0..6 {
            p.record_play(day(n));
        }
        assert!(p.log_activity(entry("hike"), day(6), day(6)));
        assert_eq!(p.coins, COINS_PER_ACTIVITY + STREAK_BONUS_COINS);
        assert!(p.take_bonus_signal());

        // Another activity the same day pays only the activity coins
        assert!(!p.log_activity(entry("swim"), day(6), day(6)));
        assert_eq!(p.coins, 2 * COINS_PER_ACTIVITY + STREAK_BONUS_COINS);
    }

    proptest! {
        #[test]
        fn purchase_never_goes_negative(coins in 0u32..2_000, level in 1u32..=LEVEL_CAP + 5) {
            let mut p = ProgressionState::new();
            p.coins = coins;
            let before = p.clone();

            match p.purchase_unlock(level) {
                UnlockOutcome::Unlocked { cost } => {
                    prop_assert!(cost <= coins);
                    prop_assert_eq!(p.coins, coins - cost);
                    prop_assert!(p.max_unlocked_level >= level);
                }
                _ => {
                    prop_assert_eq!(p, before);
                }
            }
        }

        #[test]
        fn record_play_is_idempotent(days in proptest::collection::vec(0u64..30, 0..20), today in 0u64..30) {
            let mut once = ProgressionState::new();
            let mut twice = ProgressionState::new();
            for n in &days {
                once.played_days.insert(day(*n));
                twice.played_days.insert(day(*n));
            }

            once.record_play(day(today));
            twice.record_play(day(today));
            twice.record_play(day(today));

            prop_assert_eq!(once.current_streak, twice.current_streak);
            prop_assert_eq!(once.coins, twice.coins);
            prop_assert_eq!(once.reward_days, twice.reward_days);
        }
    }
}
