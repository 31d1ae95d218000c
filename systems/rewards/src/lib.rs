#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reward shaping over world events.
//!
//! The shaping system is a pure fold: it reads the event batch of one tick
//! and emits explicit reward deltas, never touching agent state itself.
//! Movement shaping uses the obstruction-blind Manhattan distance carried on
//! the [`Event::PlayerMoved`] payload, so a step that rounds a wall can read
//! as retreating even though it shortens the walkable path. Distance ties
//! are penalized like retreats to keep dithering unprofitable.

use laser_arena_core::Event;
use serde::{Deserialize, Serialize};

/// Scalar reward assigned to each shaped outcome.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RewardTable {
    /// Reward for a step that shortens the Manhattan distance to the coin.
    pub approach: f32,
    /// Penalty for a step that keeps or grows the distance.
    pub retreat: f32,
    /// Reward for collecting the coin.
    pub coin: f32,
    /// Penalty for taking a hazard hit.
    pub damage: f32,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            approach: 0.1,
            retreat: -0.05,
            coin: 50.0,
            damage: -5.0,
        }
    }
}

/// Outcome a reward delta was assigned for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardCause {
    /// The player stepped closer to the coin.
    Approach,
    /// The player stepped away from the coin, or held its distance.
    Retreat,
    /// The player collected the coin.
    CoinCollected,
    /// The player took a hazard hit.
    Damaged,
}

/// One scalar reward contribution with its cause attached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RewardDelta {
    /// Signed reward amount.
    pub amount: f32,
    /// Outcome the amount was assigned for.
    pub cause: RewardCause,
}

/// Sums a batch of deltas into the tick's scalar reward.
#[must_use]
pub fn total(deltas: &[RewardDelta]) -> f32 {
    deltas.iter().map(|delta| delta.amount).sum()
}

/// Pure system that folds world events into reward deltas.
#[derive(Clone, Copy, Debug, Default)]
pub struct Shaping {
    table: RewardTable,
}

impl Shaping {
    /// Creates a new shaping system using the supplied reward table.
    #[must_use]
    pub const fn new(table: RewardTable) -> Self {
        Self { table }
    }

    /// Folds the tick's events into reward deltas, appended to `out`.
    pub fn evaluate(&self, events: &[Event], out: &mut Vec<RewardDelta>) {
        for event in events {
            match event {
                Event::PlayerMoved { from, to, coin } => {
                    let before = from.manhattan_steps(*coin);
                    let after = to.manhattan_steps(*coin);
                    let delta = if after < before {
                        RewardDelta {
                            amount: self.table.approach,
                            cause: RewardCause::Approach,
                        }
                    } else {
                        RewardDelta {
                            amount: self.table.retreat,
                            cause: RewardCause::Retreat,
                        }
                    };
                    out.push(delta);
                }
                Event::CoinCollected { .. } => out.push(RewardDelta {
                    amount: self.table.coin,
                    cause: RewardCause::CoinCollected,
                }),
                Event::PlayerDamaged { .. } => out.push(RewardDelta {
                    amount: self.table.damage,
                    cause: RewardCause::Damaged,
                }),
                _ => {}
            }
        }
    }
}
