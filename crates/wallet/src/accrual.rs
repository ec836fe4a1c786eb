/// XP → Silver Coin accrual.
///
/// Baselines are per skill and only live for one world session; the first
/// stat update after a reset only establishes the baseline, so XP earned
/// while the tracker was not watching is never counted.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::skill::{Skill, WorldKind};

pub const XP_PER_COIN: u32 = 1000;

#[derive(Debug, Default)]
pub struct XpTracker {
    baselines: HashMap<Skill, u32>,
    /// Set on event worlds until the user opts in
    awaiting_confirmation: bool,
}

impl XpTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a skill's total XP, returns the XP gained since the last sighting.
    pub fn observe(&mut self, skill: Skill, total_xp: u32) -> Option<u32> {
        if self.awaiting_confirmation {
            return None;
        }

        let Some(&previous) = self.baselines.get(&skill) else {
            self.baselines.insert(skill, total_xp);
            return None;
        };

        if total_xp <= previous {
            return None;
        }

        self.baselines.insert(skill, total_xp);
        Some(total_xp - previous)
    }

    pub fn reset(&mut self) {
        self.baselines.clear();
    }

    /// Login or world hop. Event worlds pause tracking until confirmed.
    pub fn enter_world(&mut self, kind: WorldKind) {
        self.reset();
        self.awaiting_confirmation = kind.is_event();
        if self.awaiting_confirmation {
            debug!("Entered {:?} world, XP tracking paused until confirmed", kind);
        }
    }

    pub fn leave_world(&mut self) {
        self.reset();
        self.awaiting_confirmation = false;
    }

    pub fn confirm_event_world(&mut self) {
        self.reset();
        self.awaiting_confirmation = false;
    }

    pub fn is_paused(&self) -> bool {
        self.awaiting_confirmation
    }
}

/// XP towards the next coin plus the coin balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub xp: u32,
    pub coins: u32,
}

impl Progress {
    /// Add gained XP, converting each full `XP_PER_COIN` into a coin.
    /// Returns the coins earned by this call.
    pub fn credit_xp(&mut self, gained: u32) -> u32 {
        let total = self.xp.saturating_add(gained);
        let earned = total / XP_PER_COIN;

        self.coins = self.coins.saturating_add(earned);
        self.xp = total % XP_PER_COIN;
        earned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_sets_baseline() {
        let mut tracker = XpTracker::new();
        assert_eq!(tracker.observe(Skill::Mining, 5_000), None);
        assert_eq!(tracker.observe(Skill::Mining, 5_250), Some(250));
        assert_eq!(tracker.observe(Skill::Mining, 5_300), Some(50));
    }

    #[test]
    fn test_skills_tracked_independently() {
        let mut tracker = XpTracker::new();
        tracker.observe(Skill::Attack, 100);
        assert_eq!(tracker.observe(Skill::Defence, 900), None);
        assert_eq!(tracker.observe(Skill::Attack, 160), Some(60));
    }

    #[test]
    fn test_non_positive_delta_keeps_baseline() {
        let mut tracker = XpTracker::new();
        tracker.observe(Skill::Magic, 1_000);
        assert_eq!(tracker.observe(Skill::Magic, 1_000), None);
        assert_eq!(tracker.observe(Skill::Magic, 900), None);
        assert_eq!(tracker.observe(Skill::Magic, 1_100), Some(100));
    }

    #[test]
    fn test_world_hop_resets_baselines() {
        let mut tracker = XpTracker::new();
        tracker.observe(Skill::Fishing, 10);
        tracker.enter_world(WorldKind::Standard);
        assert_eq!(tracker.observe(Skill::Fishing, 500), None);
        assert_eq!(tracker.observe(Skill::Fishing, 510), Some(10));
    }

    #[test]
    fn test_event_world_requires_confirmation() {
        let mut tracker = XpTracker::new();
        tracker.enter_world(WorldKind::Seasonal);
        assert!(tracker.is_paused());

        assert_eq!(tracker.observe(Skill::Slayer, 100), None);
        assert_eq!(tracker.observe(Skill::Slayer, 200), None);

        tracker.confirm_event_world();
        assert!(!tracker.is_paused());
        assert_eq!(tracker.observe(Skill::Slayer, 200), None);
        assert_eq!(tracker.observe(Skill::Slayer, 260), Some(60));
    }

    #[test]
    fn test_leave_world_unpauses() {
        let mut tracker = XpTracker::new();
        tracker.enter_world(WorldKind::Deadman);
        tracker.leave_world();
        assert!(!tracker.is_paused());
    }

    #[test]
    fn test_progress_conversion() {
        let mut progress = Progress::default();
        assert_eq!(progress.credit_xp(999), 0);
        assert_eq!(progress, Progress { xp: 999, coins: 0 });

        assert_eq!(progress.credit_xp(1), 1);
        assert_eq!(progress, Progress { xp: 0, coins: 1 });

        assert_eq!(progress.credit_xp(2_550), 2);
        assert_eq!(progress, Progress { xp: 550, coins: 3 });
    }

    #[test]
    fn test_progress_saturates() {
        let mut progress = Progress {
            xp: 999,
            coins: u32::MAX,
        };
        progress.credit_xp(u32::MAX);
        assert_eq!(progress.coins, u32::MAX);
        assert!(progress.xp < XP_PER_COIN);
    }
}
