//! # Mood Stabilizer
//!
//! Per-frame classifications flicker. The stabilizer keeps a short window of
//! recent labels and only moves its output when a clear majority of the
//! window agrees on a different mood.
//!
//! ## Voting Rules
//!
//! - `Unknown` frames do not vote, unless the whole (full) window is `Unknown`
//! - The winner must hold strictly more than `min_support` of the votes
//! - Count ties are broken by emotion priority (a tie never passes 50%)
//! - No transition is considered before `min_observations` frames arrived
//!   (capped at the window size)
//!
//! Every transition bumps the epoch by one.

use crate::mood::{Mood, StableMood};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Window and hysteresis settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilizerConfig {
    /// Number of recent labels kept for the vote.
    pub window: usize,
    /// Minimum labels in the window before any transition.
    pub min_observations: usize,
    /// Fraction of non-unknown votes the winner must exceed.
    pub min_support: f64,
}

impl StabilizerConfig {
    /// Window of at least one frame, warmup no longer than the window.
    /// A warmup longer than the window could never be reached.
    fn clamped(self) -> Self {
        let window = self.window.max(1);
        Self {
            window,
            min_observations: self.min_observations.min(window),
            ..self
        }
    }
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            window: 7,
            min_observations: 3,
            min_support: 0.5,
        }
    }
}

/// Debounces per-frame mood labels into a [`StableMood`].
#[derive(Debug, Clone)]
pub struct MoodStabilizer {
    config: StabilizerConfig,
    history: VecDeque<Mood>,
    stable: StableMood,
}

impl MoodStabilizer {
    #[must_use]
    pub fn new(config: StabilizerConfig) -> Self {
        let config = config.clamped();
        Self {
            history: VecDeque::with_capacity(config.window),
            config,
            stable: StableMood::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    /// Current output without observing anything.
    #[must_use]
    pub fn current(&self) -> StableMood {
        self.stable
    }

    /// Labels currently in the window, oldest first.
    pub fn history(&self) -> impl Iterator<Item = Mood> + '_ {
        self.history.iter().copied()
    }

    /// Record one frame label and return the (possibly updated) stable mood.
    pub fn observe(&mut self, label: Mood) -> StableMood {
        if self.history.len() == self.config.window {
            self.history.pop_front();
        }
        self.history.push_back(label);

        if self.history.len() < self.config.min_observations {
            return self.stable;
        }

        if let Some(winner) = self.consensus() {
            if winner != self.stable.label {
                let previous = self.stable.label;
                self.stable = StableMood {
                    label: winner,
                    epoch: self.stable.epoch + 1,
                };
                info!(
                    "Stable mood changed: {previous} -> {winner} (epoch {})",
                    self.stable.epoch
                );
            }
        }

        self.stable
    }

    /// Swap in new settings. History is cleared; the last stable output and
    /// its epoch are kept so downstream epoch comparisons stay valid.
    pub fn reconfigure(&mut self, config: StabilizerConfig) {
        debug!("Reconfiguring stabilizer: {config:?}");
        self.config = config.clamped();
        self.history = VecDeque::with_capacity(self.config.window);
    }

    /// Forget everything, including the stable output.
    pub fn reset(&mut self) {
        self.history.clear();
        self.stable = StableMood::default();
    }

    /// The label that currently wins the vote with enough support, if any.
    fn consensus(&self) -> Option<Mood> {
        let mut votes: BTreeMap<Mood, usize> = BTreeMap::new();
        for mood in self.history.iter().filter(|m| !m.is_unknown()) {
            *votes.entry(*mood).or_default() += 1;
        }

        let voters: usize = votes.values().sum();
        if voters == 0 {
            // only a full window of unknown frames clears the mood
            return (self.history.len() == self.config.window).then_some(Mood::Unknown);
        }

        // BTreeMap iterates in priority order; strict `>` keeps the first on ties
        let (winner, count) = votes
            .into_iter()
            .fold((Mood::Unknown, 0usize), |best, (mood, count)| {
                if count > best.1 {
                    (mood, count)
                } else {
                    best
                }
            });

        let support = count as f64 / voters as f64;
        (support > self.config.min_support).then_some(winner)
    }
}

impl Default for MoodStabilizer {
    fn default() -> Self {
        Self::new(StabilizerConfig::default())
    }
}
