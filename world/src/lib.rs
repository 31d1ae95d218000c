#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Laser Arena simulation.
//!
//! The world owns the ring-structured grid, the player, the coin, every
//! hazard unit's timeline, and the episode bookkeeping. All mutation flows
//! through [`apply`]; systems and adapters read state only through [`query`].
//! One episode runs from reset to termination (timeout or health depletion);
//! no state survives the boundary except the previous score kept for
//! display.

use std::time::Duration;

use laser_arena_core::{Command, EpisodeId, Event, GridBounds, GridCoord, HazardId, Health};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod grid;
mod hazards;

pub use grid::ArenaGrid;
pub use hazards::HazardTiming;

use hazards::HazardUnit;

/// Errors that prevent a world from being constructed.
///
/// Both variants are startup-fatal: a running world never produces them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The requested bounds cannot contain the perimeter, wall, and interior
    /// rings.
    #[error("arena bounds {bounds:?} span fewer than five cells on an axis")]
    GridTooSmall {
        /// Bounds that were rejected.
        bounds: GridBounds,
    },
    /// No open cell is available outside the excluded cell.
    #[error("no open cell available for placement")]
    NoOpenCell,
}

/// Configuration fixed for the lifetime of a world.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Inclusive arena bounds on both axes.
    pub bounds: GridBounds,
    /// Health the player starts every episode with.
    pub starting_health: Health,
    /// Countdown budget of a single episode.
    pub episode_length: Duration,
    /// Timing shared by every hazard unit.
    pub hazards: HazardTiming,
    /// Seed for the world's placement randomness.
    pub rng_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bounds: GridBounds::new(-5, 5, -5, 5),
            starting_health: Health::new(3),
            episode_length: Duration::from_secs(25),
            hazards: HazardTiming::default(),
            rng_seed: 0x4c41_5345_525f_4152,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct EpisodeState {
    episode: EpisodeId,
    score: u32,
    previous_score: u32,
    remaining: Duration,
}

/// Represents the authoritative Laser Arena world state.
#[derive(Debug)]
pub struct World {
    grid: ArenaGrid,
    player: GridCoord,
    health: Health,
    coin: GridCoord,
    hazards: Vec<HazardUnit>,
    episode: EpisodeState,
    starting_health: Health,
    episode_length: Duration,
    timing: HazardTiming,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a new world ready for simulation.
    ///
    /// Validates the ring structure, places the player at the arena center,
    /// and places the coin on a random open cell away from the player. Both
    /// failures are fatal per the error taxonomy.
    pub fn new(config: Config) -> Result<Self, Error> {
        let grid = ArenaGrid::generate(config.bounds)?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        let player = config.bounds.center();
        let coin = grid.random_open_cell(&mut rng, player)?;
        let hazards = grid
            .perimeter_cells()
            .into_iter()
            .enumerate()
            .map(|(index, cell)| HazardUnit::new(HazardId::new(index as u32), cell))
            .collect();

        Ok(Self {
            grid,
            player,
            health: config.starting_health,
            coin,
            hazards,
            episode: EpisodeState {
                episode: EpisodeId::new(0),
                score: 0,
                previous_score: 0,
                remaining: config.episode_length,
            },
            starting_health: config.starting_health,
            episode_length: config.episode_length,
            timing: config.hazards,
            rng,
        })
    }

    fn advance_hazards(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let player = self.player;
        let timing = self.timing;
        for index in 0..self.hazards.len() {
            let Some(discharge) = self.hazards[index].advance(dt, player, &timing) else {
                continue;
            };

            let hit = discharge.target == player;
            out_events.push(Event::HazardDischarged {
                hazard: discharge.hazard,
                target: discharge.target,
                hit,
            });

            if !hit {
                continue;
            }

            self.health = self.health.damaged();
            out_events.push(Event::PlayerDamaged {
                hazard: discharge.hazard,
                remaining: self.health,
            });

            if self.health.is_depleted() {
                // Remaining discharges this tick belong to abandoned state.
                self.end_episode(out_events);
                return;
            }
        }
    }

    fn relocate_coin(&mut self, out_events: &mut Vec<Event>) {
        match self.grid.random_open_cell(&mut self.rng, self.player) {
            Ok(cell) => {
                self.coin = cell;
                out_events.push(Event::CoinRelocated { cell });
            }
            // Unreachable once construction succeeded: mid-episode the player
            // always vacated an open cell, and resets exclude only the center.
            Err(_) => {}
        }
    }

    fn end_episode(&mut self, out_events: &mut Vec<Event>) {
        let score = self.episode.score;
        out_events.push(Event::EpisodeEnded {
            episode: self.episode.episode,
            score,
        });

        self.episode.previous_score = score;
        self.episode.score = 0;
        self.episode.remaining = self.episode_length;
        self.episode.episode = self.episode.episode.next();
        self.health = self.starting_health;
        self.player = self.grid.bounds().center();
        for unit in &mut self.hazards {
            unit.force_idle();
        }
        self.relocate_coin(out_events);

        out_events.push(Event::EpisodeStarted {
            episode: self.episode.episode,
        });
    }
}

/// Applies the provided command to the world, mutating state
/// deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            world.episode.remaining = world.episode.remaining.saturating_sub(dt);
            if world.episode.remaining.is_zero() {
                world.end_episode(out_events);
                return;
            }
            world.advance_hazards(dt, out_events);
        }
        Command::MovePlayer { direction } => {
            if world.health.is_depleted() {
                return;
            }
            let destination = world.player.offset(direction);
            if !world.grid.can_enter(destination) {
                return;
            }

            let from = world.player;
            let coin = world.coin;
            world.player = destination;
            out_events.push(Event::PlayerMoved {
                from,
                to: destination,
                coin,
            });

            if destination == coin {
                world.episode.score += 1;
                out_events.push(Event::CoinCollected {
                    cell: destination,
                    score: world.episode.score,
                });
                world.relocate_coin(out_events);
            }
        }
        Command::ActivateHazard { hazard, episode } => {
            // A lane that outlived its episode must not touch the new one.
            if episode != world.episode.episode {
                return;
            }
            let player = world.player;
            if let Some(unit) = world.hazards.iter_mut().find(|unit| unit.id() == hazard) {
                if unit.is_idle() {
                    unit.activate(player);
                    out_events.push(Event::HazardActivated {
                        hazard,
                        cell: unit.cell(),
                    });
                }
            }
        }
        Command::ResetEpisode => {
            world.end_episode(out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{ArenaGrid, World};
    use laser_arena_core::{
        CellKind, Direction, EpisodeId, GridBounds, GridCoord, HazardView, Health,
        Observation,
    };
    use std::time::Duration;

    /// Cell currently occupied by the player.
    #[must_use]
    pub fn player(world: &World) -> GridCoord {
        world.player
    }

    /// Cell currently occupied by the coin.
    #[must_use]
    pub fn coin(world: &World) -> GridCoord {
        world.coin
    }

    /// Health remaining in the current episode.
    #[must_use]
    pub fn health(world: &World) -> Health {
        world.health
    }

    /// Coin pickups scored in the current episode.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.episode.score
    }

    /// Final score of the previous episode, retained for display.
    #[must_use]
    pub fn previous_score(world: &World) -> u32 {
        world.episode.previous_score
    }

    /// Time budget remaining before the episode times out.
    #[must_use]
    pub fn remaining_time(world: &World) -> Duration {
        world.episode.remaining
    }

    /// Generation tag of the current episode.
    #[must_use]
    pub fn episode(world: &World) -> EpisodeId {
        world.episode.episode
    }

    /// Inclusive arena bounds.
    #[must_use]
    pub fn bounds(world: &World) -> GridBounds {
        world.grid.bounds()
    }

    /// Provides read-only access to the arena grid.
    #[must_use]
    pub fn grid(world: &World) -> &ArenaGrid {
        &world.grid
    }

    /// Kind of the provided cell, or `None` outside the bounds.
    #[must_use]
    pub fn cell_kind(world: &World, cell: GridCoord) -> Option<CellKind> {
        world.grid.kind(cell)
    }

    /// Reports whether the player may currently step in the direction.
    ///
    /// False when the destination leaves the bounds, is a wall or perimeter
    /// cell, or when the player is already defeated.
    #[must_use]
    pub fn can_move(world: &World, direction: Direction) -> bool {
        !world.health.is_depleted() && world.grid.can_enter(world.player.offset(direction))
    }

    /// State visible to a policy when choosing its next action.
    #[must_use]
    pub fn observation(world: &World) -> Observation {
        Observation {
            player: world.player,
            coin: world.coin,
        }
    }

    /// Captures a read-only view of every hazard unit.
    #[must_use]
    pub fn hazard_view(world: &World) -> HazardView {
        HazardView::from_snapshots(world.hazards.iter().map(|unit| unit.snapshot()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laser_arena_core::{CellKind, Direction, HazardPhase};
    use rand::Rng;
    use std::collections::HashSet;

    fn quiet_config() -> Config {
        // Long episode and slow hazards so tests control every transition.
        Config {
            bounds: GridBounds::new(-3, 3, -3, 3),
            episode_length: Duration::from_secs(1_000),
            hazards: HazardTiming {
                prep: Duration::from_secs(1),
                fire_delay: Duration::from_secs(1),
                cooldown: Duration::from_secs(1),
                follow_rate: 100.0,
            },
            ..Config::default()
        }
    }

    fn ring_depth(bounds: GridBounds, cell: GridCoord) -> i32 {
        let from_edge_x = (cell.x() - bounds.min_x()).min(bounds.max_x() - cell.x());
        let from_edge_y = (cell.y() - bounds.min_y()).min(bounds.max_y() - cell.y());
        from_edge_x.min(from_edge_y)
    }

    #[test]
    fn generate_builds_the_ring_structure() {
        for bounds in [
            GridBounds::new(-2, 2, -2, 2),
            GridBounds::new(-3, 3, -3, 3),
            GridBounds::new(0, 6, -5, 4),
        ] {
            let grid = ArenaGrid::generate(bounds).expect("valid bounds");
            for y in bounds.min_y()..=bounds.max_y() {
                for x in bounds.min_x()..=bounds.max_x() {
                    let cell = GridCoord::new(x, y);
                    let expected = match ring_depth(bounds, cell) {
                        0 => CellKind::HazardPerimeter,
                        1 => CellKind::Wall,
                        _ => CellKind::Open,
                    };
                    assert_eq!(grid.kind(cell), Some(expected), "cell {cell:?}");
                }
            }
        }
    }

    #[test]
    fn generate_rejects_undersized_bounds() {
        let bounds = GridBounds::new(-1, 2, -3, 3);
        assert_eq!(
            ArenaGrid::generate(bounds),
            Err(Error::GridTooSmall { bounds })
        );
    }

    #[test]
    fn minimal_arena_has_no_room_for_the_coin() {
        // A 5x5 arena has exactly one open cell and the player starts on it.
        let config = Config {
            bounds: GridBounds::new(-2, 2, -2, 2),
            ..Config::default()
        };
        assert_eq!(World::new(config).err(), Some(Error::NoOpenCell));
    }

    #[test]
    fn random_walks_never_leave_open_cells() {
        let mut world = World::new(quiet_config()).expect("world");
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let directions = [
            Direction::Up,
            Direction::Right,
            Direction::Down,
            Direction::Left,
        ];

        let mut events = Vec::new();
        for _ in 0..500 {
            let direction = directions[rng.gen_range(0..directions.len())];
            let legal = query::can_move(&world, direction);
            let before = query::player(&world);
            apply(&mut world, Command::MovePlayer { direction }, &mut events);
            let after = query::player(&world);

            assert_eq!(query::cell_kind(&world, after), Some(CellKind::Open));
            if !legal {
                assert_eq!(before, after, "illegal move must be a no-op");
            }
            events.clear();
        }
    }

    #[test]
    fn illegal_moves_are_silent() {
        let mut world = World::new(quiet_config()).expect("world");
        // Center of a 7x7 arena: the interior is a single 3x3 block, so two
        // steps in one direction hit the wall ring.
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MovePlayer {
                direction: Direction::Right,
            },
            &mut events,
        );
        assert!(!events.is_empty());

        events.clear();
        apply(
            &mut world,
            Command::MovePlayer {
                direction: Direction::Right,
            },
            &mut events,
        );
        assert!(events.is_empty(), "blocked step must emit nothing");
    }

    #[test]
    fn coin_relocation_excludes_the_player_and_covers_the_interior() {
        let mut world = World::new(quiet_config()).expect("world");
        // 7x7 arena: nine open cells, one occupied by the player.
        let player = query::player(&world);
        let open: HashSet<GridCoord> = world.grid.open_cells().collect();
        assert_eq!(open.len(), 9);

        let mut seen = HashSet::new();
        let mut events = Vec::new();
        for _ in 0..500 {
            world.relocate_coin(&mut events);
            let coin = query::coin(&world);
            assert_ne!(coin, player);
            assert!(open.contains(&coin));
            let _ = seen.insert(coin);
        }
        assert_eq!(seen.len(), open.len() - 1, "every candidate cell reached");
    }

    fn activate_first_hazard(world: &mut World, events: &mut Vec<Event>) -> HazardId {
        let hazard = query::hazard_view(world)
            .idle_units()
            .next()
            .expect("idle unit");
        apply(
            world,
            Command::ActivateHazard {
                hazard,
                episode: query::episode(world),
            },
            events,
        );
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::HazardActivated { .. })));
        events.clear();
        hazard
    }

    fn tick(world: &mut World, secs: u64, events: &mut Vec<Event>) {
        apply(
            world,
            Command::Tick {
                dt: Duration::from_secs(secs),
            },
            events,
        );
    }

    #[test]
    fn locked_discharge_damages_a_stationary_player() {
        let mut world = World::new(quiet_config()).expect("world");
        let mut events = Vec::new();
        let hazard = activate_first_hazard(&mut world, &mut events);

        // Prep locks onto the player, then the fire delay elapses.
        tick(&mut world, 1, &mut events);
        events.clear();
        tick(&mut world, 1, &mut events);

        assert!(events.contains(&Event::HazardDischarged {
            hazard,
            target: query::player(&world),
            hit: true,
        }));
        assert!(events.contains(&Event::PlayerDamaged {
            hazard,
            remaining: Health::new(2),
        }));
        assert_eq!(query::health(&world), Health::new(2));

        // Cooldown returns the unit to dormancy.
        events.clear();
        tick(&mut world, 1, &mut events);
        assert_eq!(
            query::hazard_view(&world).phase_of(hazard),
            Some(HazardPhase::Idle)
        );
    }

    #[test]
    fn dodging_after_the_lock_avoids_damage() {
        let mut world = World::new(quiet_config()).expect("world");
        let mut events = Vec::new();
        let _ = activate_first_hazard(&mut world, &mut events);

        tick(&mut world, 1, &mut events);
        events.clear();

        // The aim locked the center; step away before the discharge.
        apply(
            &mut world,
            Command::MovePlayer {
                direction: Direction::Up,
            },
            &mut events,
        );
        events.clear();
        tick(&mut world, 1, &mut events);

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::HazardDischarged { hit: false, .. })));
        assert_eq!(query::health(&world), Health::new(3));
    }

    #[test]
    fn three_hits_end_the_episode_and_stale_activations_are_discarded() {
        let mut world = World::new(quiet_config()).expect("world");
        let first_episode = query::episode(&world);
        let mut events = Vec::new();

        for expected_remaining in [2u32, 1] {
            let _ = activate_first_hazard(&mut world, &mut events);
            tick(&mut world, 1, &mut events);
            tick(&mut world, 1, &mut events);
            assert_eq!(query::health(&world), Health::new(expected_remaining));
            tick(&mut world, 1, &mut events);
            events.clear();
        }

        let _ = activate_first_hazard(&mut world, &mut events);
        tick(&mut world, 1, &mut events);
        tick(&mut world, 1, &mut events);

        assert!(events.contains(&Event::EpisodeEnded {
            episode: first_episode,
            score: 0,
        }));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::EpisodeStarted { .. })));

        // Every unit was forced back to dormancy.
        assert!(query::hazard_view(&world)
            .iter()
            .all(|snapshot| snapshot.phase == HazardPhase::Idle));
        assert_eq!(query::health(&world), Health::new(3));

        // A lane from the dead episode cannot reach into the new one.
        events.clear();
        let hazard = query::hazard_view(&world)
            .idle_units()
            .next()
            .expect("idle unit");
        apply(
            &mut world,
            Command::ActivateHazard {
                hazard,
                episode: first_episode,
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(
            query::hazard_view(&world).phase_of(hazard),
            Some(HazardPhase::Idle)
        );
    }

    #[test]
    fn countdown_expiry_ends_the_episode_exactly() {
        let config = Config {
            episode_length: Duration::from_secs(5),
            ..quiet_config()
        };
        let mut world = World::new(config).expect("world");
        let first_episode = query::episode(&world);
        let mut events = Vec::new();

        for _ in 0..4 {
            tick(&mut world, 1, &mut events);
            assert!(!events
                .iter()
                .any(|event| matches!(event, Event::EpisodeEnded { .. })));
            events.clear();
        }

        tick(&mut world, 1, &mut events);
        assert!(events.contains(&Event::EpisodeEnded {
            episode: first_episode,
            score: 0,
        }));
        assert_eq!(query::remaining_time(&world), Duration::from_secs(5));
    }

    #[test]
    fn reset_preserves_the_previous_score_only() {
        let mut world = World::new(quiet_config()).expect("world");
        let mut events = Vec::new();

        // Walk onto the coin by brute force: follow the coin's direction.
        let mut picked_up = false;
        for _ in 0..50 {
            let observation = query::observation(&world);
            let direction = if observation.coin.y() > observation.player.y() {
                Direction::Up
            } else if observation.coin.x() > observation.player.x() {
                Direction::Right
            } else if observation.coin.y() < observation.player.y() {
                Direction::Down
            } else {
                Direction::Left
            };
            apply(&mut world, Command::MovePlayer { direction }, &mut events);
            if events
                .iter()
                .any(|event| matches!(event, Event::CoinCollected { .. }))
            {
                picked_up = true;
                break;
            }
            events.clear();
        }
        assert!(picked_up, "greedy walk reaches the coin in a 7x7 arena");
        assert_eq!(query::score(&world), 1);

        events.clear();
        apply(&mut world, Command::ResetEpisode, &mut events);
        assert_eq!(query::score(&world), 0);
        assert_eq!(query::previous_score(&world), 1);
        assert_eq!(query::player(&world), GridBounds::new(-3, 3, -3, 3).center());
    }
}
