#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Hazard activation scheduling.
//!
//! A fixed roster of scheduling lanes drives hazard pressure. Each lane
//! repeatedly waits a sampled delay, then activates one randomly chosen
//! dormant hazard unit. A shared activation counter escalates the pressure:
//! every few activations a new lane is staged and, after a stagger delay,
//! joins the roster, up to a hard cap. Episode boundaries collapse the
//! roster back to a single lane.
//!
//! The system is pure: it consumes world events and a hazard view and emits
//! [`Command::ActivateHazard`] batches stamped with the current episode
//! generation, so activations queued by a dying episode are discarded by the
//! world instead of leaking into the next one.

use std::time::Duration;

use laser_arena_core::{Command, EpisodeId, Event, HazardId, HazardView};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Configuration parameters required to construct the scheduling system.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Shortest wait between a lane's consecutive activations.
    pub min_activation_delay: Duration,
    /// Longest wait between a lane's consecutive activations.
    pub max_activation_delay: Duration,
    /// Fewest shared activations before a new lane is staged.
    pub min_escalation_activations: u32,
    /// Most shared activations before a new lane is staged.
    pub max_escalation_activations: u32,
    /// Shortest stagger between staging a lane and it joining the roster.
    pub min_lane_stagger: Duration,
    /// Longest stagger between staging a lane and it joining the roster.
    pub max_lane_stagger: Duration,
    /// Hard cap on concurrently running lanes.
    pub max_lanes: usize,
    /// Seed for the scheduler's sampling randomness.
    pub rng_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_activation_delay: Duration::from_secs(1),
            max_activation_delay: Duration::from_secs(4),
            min_escalation_activations: 3,
            max_escalation_activations: 6,
            min_lane_stagger: Duration::from_secs(2),
            max_lane_stagger: Duration::from_secs(5),
            max_lanes: 5,
            rng_seed: 0x4c41_4e45,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Lane {
    until_activation: Duration,
}

/// Pure system that emits hazard activation commands on escalating lanes.
#[derive(Debug)]
pub struct Scheduling {
    config: Config,
    rng: ChaCha8Rng,
    lanes: Vec<Lane>,
    activations_until_escalation: u32,
    pending_lane: Option<Duration>,
}

impl Scheduling {
    /// Creates a new scheduling system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        let first_lane = Lane {
            until_activation: sample_duration(
                &mut rng,
                config.min_activation_delay,
                config.max_activation_delay,
            ),
        };
        let activations_until_escalation = sample_count(
            &mut rng,
            config.min_escalation_activations,
            config.max_escalation_activations,
        );

        Self {
            config,
            rng,
            lanes: vec![first_lane],
            activations_until_escalation,
            pending_lane: None,
        }
    }

    /// Number of lanes currently driving activations.
    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Consumes events and the hazard view to emit activation commands.
    ///
    /// `episode` stamps every emitted command; the world discards commands
    /// stamped with a generation that has already ended.
    pub fn handle(
        &mut self,
        events: &[Event],
        hazards: &HazardView,
        episode: EpisodeId,
        out: &mut Vec<Command>,
    ) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    accumulated = accumulated.saturating_add(*dt);
                }
                Event::EpisodeStarted { .. } => self.collapse(),
                _ => {}
            }
        }

        if accumulated.is_zero() {
            return;
        }

        self.advance_pending_lane(accumulated);

        // Units picked earlier in this batch still read as idle in the view.
        let mut claimed: Vec<HazardId> = Vec::new();
        for index in 0..self.lanes.len() {
            let remaining = self.lanes[index]
                .until_activation
                .saturating_sub(accumulated);
            self.lanes[index].until_activation = remaining;
            if !remaining.is_zero() {
                continue;
            }

            let Some(hazard) = self.select_unit(hazards, &claimed) else {
                // Every unit is busy; the lane retries on the next batch.
                continue;
            };

            claimed.push(hazard);
            out.push(Command::ActivateHazard { hazard, episode });
            self.lanes[index].until_activation = sample_duration(
                &mut self.rng,
                self.config.min_activation_delay,
                self.config.max_activation_delay,
            );
            self.record_activation();
        }
    }

    fn advance_pending_lane(&mut self, dt: Duration) {
        let Some(remaining) = self.pending_lane else {
            return;
        };
        let remaining = remaining.saturating_sub(dt);
        if !remaining.is_zero() {
            self.pending_lane = Some(remaining);
            return;
        }

        self.pending_lane = None;
        if self.lanes.len() < self.config.max_lanes {
            let until_activation = sample_duration(
                &mut self.rng,
                self.config.min_activation_delay,
                self.config.max_activation_delay,
            );
            self.lanes.push(Lane { until_activation });
        }
    }

    fn record_activation(&mut self) {
        self.activations_until_escalation = self.activations_until_escalation.saturating_sub(1);
        if self.activations_until_escalation > 0 {
            return;
        }

        self.activations_until_escalation = sample_count(
            &mut self.rng,
            self.config.min_escalation_activations,
            self.config.max_escalation_activations,
        );
        // At most one staged lane at a time; a full roster stops escalating.
        if self.pending_lane.is_none() && self.lanes.len() < self.config.max_lanes {
            self.pending_lane = Some(sample_duration(
                &mut self.rng,
                self.config.min_lane_stagger,
                self.config.max_lane_stagger,
            ));
        }
    }

    fn select_unit(&mut self, hazards: &HazardView, claimed: &[HazardId]) -> Option<HazardId> {
        let eligible: Vec<HazardId> = hazards
            .idle_units()
            .filter(|id| !claimed.contains(id))
            .collect();
        if eligible.is_empty() {
            return None;
        }
        Some(eligible[self.rng.gen_range(0..eligible.len())])
    }

    fn collapse(&mut self) {
        self.lanes.truncate(1);
        self.pending_lane = None;
        self.lanes[0].until_activation = sample_duration(
            &mut self.rng,
            self.config.min_activation_delay,
            self.config.max_activation_delay,
        );
        self.activations_until_escalation = sample_count(
            &mut self.rng,
            self.config.min_escalation_activations,
            self.config.max_escalation_activations,
        );
    }
}

fn sample_duration<R: Rng>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let millis = rng.gen_range(min.as_millis()..=max.as_millis());
    Duration::from_millis(millis as u64)
}

fn sample_count<R: Rng>(rng: &mut R, min: u32, max: u32) -> u32 {
    if max <= min {
        return min.max(1);
    }
    rng.gen_range(min..=max).max(1)
}
