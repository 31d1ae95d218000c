#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Episode orchestration facade.
//!
//! [`Environment`] owns the authoritative world plus the pure systems around
//! it and exposes the classic reinforcement-learning surface: construct,
//! tick with a policy, reset. One tick is one decision point: the resolved
//! action is applied, time advances, the scheduler reacts to the tick's
//! events, and the reward shaper folds everything that happened into one
//! scalar. Episode termination inside a tick is reported, not hidden; the
//! world has already rolled into the next episode by the time the report is
//! returned.

use std::time::Duration;

use laser_arena_core::{Action, Command, Event, Observation};
use laser_arena_system_policy::{resolve, InputState, Policy};
use laser_arena_system_rewards::{total, RewardDelta, RewardTable, Shaping};
use laser_arena_system_scheduling::Scheduling;
use laser_arena_world::{self as world, query, World};
use serde::{Deserialize, Serialize};

/// Configuration for a complete environment.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Authoritative world configuration.
    pub world: world::Config,
    /// Hazard activation scheduling configuration.
    pub scheduling: laser_arena_system_scheduling::Config,
    /// Reward table used for shaping.
    pub rewards: RewardTable,
}

/// Outcome of one environment tick.
#[derive(Clone, Debug)]
pub struct TickReport {
    /// Action that was resolved and applied this tick.
    pub action: Action,
    /// Scalar reward earned this tick.
    pub reward: f32,
    /// Itemized reward contributions behind the scalar.
    pub deltas: Vec<RewardDelta>,
    /// Final score of the episode that ended this tick, if one did.
    pub ended_with_score: Option<u32>,
}

/// Simulation environment driving one player through repeated episodes.
#[derive(Debug)]
pub struct Environment {
    world: World,
    scheduling: Scheduling,
    shaping: Shaping,
    input: InputState,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl Environment {
    /// Creates a new environment from the provided configuration.
    ///
    /// Fails when the arena bounds cannot hold the ring structure or leave
    /// no open cell for the coin.
    pub fn new(config: Config) -> Result<Self, world::Error> {
        Ok(Self {
            world: World::new(config.world)?,
            scheduling: Scheduling::new(config.scheduling),
            shaping: Shaping::new(config.rewards),
            input: InputState::default(),
            events: Vec::new(),
            commands: Vec::new(),
        })
    }

    /// Advances the simulation by one decision point.
    pub fn tick(&mut self, dt: Duration, policy: &mut dyn Policy) -> TickReport {
        self.events.clear();

        let observation = query::observation(&self.world);
        let action = resolve(&self.input, policy, &observation);
        if let Some(direction) = action.direction() {
            world::apply(
                &mut self.world,
                Command::MovePlayer { direction },
                &mut self.events,
            );
        }

        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);

        self.commands.clear();
        self.scheduling.handle(
            &self.events,
            &query::hazard_view(&self.world),
            query::episode(&self.world),
            &mut self.commands,
        );
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }

        let mut deltas = Vec::new();
        self.shaping.evaluate(&self.events, &mut deltas);
        let reward = total(&deltas);

        let ended_with_score = self.events.iter().find_map(|event| match event {
            Event::EpisodeEnded { score, .. } => Some(*score),
            _ => None,
        });

        TickReport {
            action,
            reward,
            deltas,
            ended_with_score,
        }
    }

    /// Forces the current episode to end and the next one to begin.
    pub fn reset(&mut self) {
        self.events.clear();
        world::apply(&mut self.world, Command::ResetEpisode, &mut self.events);
        // No time advances here; the scheduler only collapses its roster.
        self.commands.clear();
        self.scheduling.handle(
            &self.events,
            &query::hazard_view(&self.world),
            query::episode(&self.world),
            &mut self.commands,
        );
        debug_assert!(self.commands.is_empty());
    }

    /// State visible to a policy at the next decision point.
    #[must_use]
    pub fn observation(&self) -> Observation {
        query::observation(&self.world)
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the held-input override state.
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Events emitted during the most recent tick or reset.
    #[must_use]
    pub fn last_events(&self) -> &[Event] {
        &self.events
    }

    /// Number of scheduling lanes currently applying hazard pressure.
    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.scheduling.lane_count()
    }
}
