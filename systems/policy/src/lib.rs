#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Action selection for the player token.
//!
//! A [`Policy`] maps the per-tick observation to one discrete action. The
//! trait is the seam where a trained agent plugs in; the crate ships two
//! built-in implementations, a coin-chasing heuristic and a uniform random
//! baseline. Held directional input always overrides the policy through
//! [`resolve`], so a human can take the controls mid-run without pausing
//! whatever policy is driving.

use laser_arena_core::{Action, Direction, Observation};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Chooses one action per decision point from the current observation.
pub trait Policy {
    /// Selects the next action for the provided observation.
    fn decide(&mut self, observation: &Observation) -> Action;
}

/// Heuristic that closes the coordinate gap to the coin one axis at a time.
///
/// Axes are checked in a fixed order, so the path is an L-shape: vertical
/// progress first, then horizontal. Obstructions are ignored; in the open
/// interior every greedy step is legal.
#[derive(Clone, Copy, Debug, Default)]
pub struct Greedy;

impl Policy for Greedy {
    fn decide(&mut self, observation: &Observation) -> Action {
        let player = observation.player;
        let coin = observation.coin;
        if coin.y() > player.y() {
            Action::Up
        } else if coin.x() > player.x() {
            Action::Right
        } else if coin.y() < player.y() {
            Action::Down
        } else if coin.x() < player.x() {
            Action::Left
        } else {
            Action::Stay
        }
    }
}

/// Baseline that samples uniformly over the whole action space.
#[derive(Debug)]
pub struct Random {
    rng: ChaCha8Rng,
}

impl Random {
    /// Creates a new random policy from the provided seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Policy for Random {
    fn decide(&mut self, _observation: &Observation) -> Action {
        Action::from_index(self.rng.gen_range(0..5)).unwrap_or(Action::Stay)
    }
}

/// Directional input currently held by a human operator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    held: Option<Direction>,
}

impl InputState {
    /// Records the direction currently being held.
    pub fn press(&mut self, direction: Direction) {
        self.held = Some(direction);
    }

    /// Clears any held direction.
    pub fn release(&mut self) {
        self.held = None;
    }

    /// Direction currently held, if any.
    #[must_use]
    pub const fn held(&self) -> Option<Direction> {
        self.held
    }
}

/// Resolves the action for this decision point.
///
/// Held input wins outright; the policy is not consulted while the operator
/// is steering.
pub fn resolve(input: &InputState, policy: &mut dyn Policy, observation: &Observation) -> Action {
    match input.held() {
        Some(direction) => Action::from_direction(direction),
        None => policy.decide(observation),
    }
}
