#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Laser Arena simulation.
//!
//! This crate defines the message surface that connects the authoritative
//! world, pure systems, and adapters. Adapters and systems submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems
//! to react to deterministically. Systems consume event streams and immutable
//! snapshots and respond exclusively with new command batches or reward
//! deltas.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Location of a single grid cell expressed as signed arena coordinates.
///
/// The arena is centered on the origin, so coordinates may be negative on
/// either axis.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCoord {
    x: i32,
    y: i32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal component of the coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical component of the coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the cell one step away in the provided direction.
    #[must_use]
    pub const fn offset(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Counts the axis-aligned unit steps separating two coordinates.
    ///
    /// This is the shaping-reward distance metric: obstructions are not
    /// considered, so walls count as passable for distance purposes even
    /// though they block movement.
    #[must_use]
    pub const fn manhattan_steps(self, other: GridCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Cardinal movement directions available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward increasing y.
    Up,
    /// Movement toward increasing x.
    Right,
    /// Movement toward decreasing y.
    Down,
    /// Movement toward decreasing x.
    Left,
}

impl Direction {
    /// Unit offset applied to a coordinate when stepping in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::Right => (1, 0),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
        }
    }
}

/// Discrete action chosen by a policy each tick.
///
/// The numeric mapping matches the discrete action buffer of the training
/// harness: 0 stays put, 1 through 4 move in the corresponding direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Remain on the current cell this tick.
    Stay,
    /// Step toward increasing y.
    Up,
    /// Step toward increasing x.
    Right,
    /// Step toward decreasing y.
    Down,
    /// Step toward decreasing x.
    Left,
}

impl Action {
    /// Decodes an action from its discrete buffer index.
    #[must_use]
    pub const fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Stay),
            1 => Some(Self::Up),
            2 => Some(Self::Right),
            3 => Some(Self::Down),
            4 => Some(Self::Left),
            _ => None,
        }
    }

    /// Encodes the action as its discrete buffer index.
    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            Self::Stay => 0,
            Self::Up => 1,
            Self::Right => 2,
            Self::Down => 3,
            Self::Left => 4,
        }
    }

    /// Action that steps in the provided direction.
    #[must_use]
    pub const fn from_direction(direction: Direction) -> Self {
        match direction {
            Direction::Up => Self::Up,
            Direction::Right => Self::Right,
            Direction::Down => Self::Down,
            Direction::Left => Self::Left,
        }
    }

    /// Movement direction requested by the action, if any.
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Stay => None,
            Self::Up => Some(Direction::Up),
            Self::Right => Some(Direction::Right),
            Self::Down => Some(Direction::Down),
            Self::Left => Some(Direction::Left),
        }
    }
}

/// Classification assigned to every cell when the arena is generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Interior cell the player and coin may occupy.
    Open,
    /// Solid ring just inside the perimeter; blocks movement.
    Wall,
    /// Outermost ring hosting one hazard unit per cell; blocks movement.
    HazardPerimeter,
}

impl CellKind {
    /// Reports whether the cell kind blocks player movement.
    #[must_use]
    pub const fn is_obstructed(self) -> bool {
        matches!(self, Self::Wall | Self::HazardPerimeter)
    }
}

/// Inclusive coordinate bounds of the arena on both axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridBounds {
    min_x: i32,
    max_x: i32,
    min_y: i32,
    max_y: i32,
}

impl GridBounds {
    /// Creates new inclusive bounds.
    #[must_use]
    pub const fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Smallest x coordinate contained in the bounds.
    #[must_use]
    pub const fn min_x(&self) -> i32 {
        self.min_x
    }

    /// Largest x coordinate contained in the bounds.
    #[must_use]
    pub const fn max_x(&self) -> i32 {
        self.max_x
    }

    /// Smallest y coordinate contained in the bounds.
    #[must_use]
    pub const fn min_y(&self) -> i32 {
        self.min_y
    }

    /// Largest y coordinate contained in the bounds.
    #[must_use]
    pub const fn max_y(&self) -> i32 {
        self.max_y
    }

    /// Number of cells spanned along the x axis.
    #[must_use]
    pub const fn cells_x(&self) -> i64 {
        self.max_x as i64 - self.min_x as i64 + 1
    }

    /// Number of cells spanned along the y axis.
    #[must_use]
    pub const fn cells_y(&self) -> i64 {
        self.max_y as i64 - self.min_y as i64 + 1
    }

    /// Reports whether the coordinate lies inside the bounds.
    #[must_use]
    pub const fn contains(&self, cell: GridCoord) -> bool {
        cell.x() >= self.min_x
            && cell.x() <= self.max_x
            && cell.y() >= self.min_y
            && cell.y() <= self.max_y
    }

    /// Central cell of the arena, used as the player reset position.
    #[must_use]
    pub const fn center(&self) -> GridCoord {
        GridCoord::new(
            ((self.min_x as i64 + self.max_x as i64) / 2) as i32,
            ((self.min_y as i64 + self.max_y as i64) / 2) as i32,
        )
    }
}

/// Unique identifier assigned to a hazard unit on the perimeter.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct HazardId(u32);

impl HazardId {
    /// Creates a new hazard identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Generation tag identifying one episode from reset to termination.
///
/// Every hazard activation is stamped with the episode it belongs to so the
/// world can discard activations from lanes that outlived their episode.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EpisodeId(u64);

impl EpisodeId {
    /// Creates a new episode identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Identifier of the episode that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Player health counter; the episode ends when it reaches zero.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Health(u32);

impl Health {
    /// Creates a new health counter with the provided value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric health value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the counter reduced by one point, floored at zero.
    #[must_use]
    pub const fn damaged(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// Reports whether the counter has reached zero.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.0 == 0
    }
}

/// Lifecycle phase of a hazard unit's discharge cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardPhase {
    /// Dormant and eligible for activation by a scheduling lane.
    Idle,
    /// Aiming at the player; the aim point tracks the player's cell.
    Prepping,
    /// Aim locked; discharges once the fire delay elapses.
    Firing,
    /// Decaying back to dormancy after the discharge.
    Cooldown,
}

/// State visible to a policy when choosing its next action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Observation {
    /// Cell currently occupied by the player.
    pub player: GridCoord,
    /// Cell currently occupied by the coin.
    pub coin: GridCoord,
}

impl Observation {
    /// Flattens the observation into the sensor vector consumed by trainers.
    #[must_use]
    pub fn to_vector(&self) -> [f32; 4] {
        [
            self.player.x() as f32,
            self.player.y() as f32,
            self.coin.x() as f32,
            self.coin.y() as f32,
        ]
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the player step one cell in the specified direction.
    MovePlayer {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Requests that an idle hazard unit begin its discharge cycle.
    ActivateHazard {
        /// Identifier of the hazard unit to activate.
        hazard: HazardId,
        /// Episode the issuing lane belongs to; stale tags are discarded.
        episode: EpisodeId,
    },
    /// Forces the current episode to end and a fresh one to begin.
    ResetEpisode,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the player moved between two cells.
    PlayerMoved {
        /// Cell the player occupied before moving.
        from: GridCoord,
        /// Cell the player occupies after the move.
        to: GridCoord,
        /// Cell the coin occupied when the move was made.
        coin: GridCoord,
    },
    /// Confirms that the player collected the coin.
    CoinCollected {
        /// Cell where the coin was collected.
        cell: GridCoord,
        /// Episode score after the pickup.
        score: u32,
    },
    /// Announces the coin's new cell after placement or relocation.
    CoinRelocated {
        /// Cell the coin now occupies.
        cell: GridCoord,
    },
    /// Confirms that a hazard unit began its discharge cycle.
    HazardActivated {
        /// Identifier of the activated hazard unit.
        hazard: HazardId,
        /// Perimeter cell hosting the unit.
        cell: GridCoord,
    },
    /// Reports that a hazard unit discharged at its locked target cell.
    HazardDischarged {
        /// Identifier of the discharging hazard unit.
        hazard: HazardId,
        /// Cell the discharge was locked onto.
        target: GridCoord,
        /// Whether the player occupied the target cell at discharge time.
        hit: bool,
    },
    /// Reports that a hazard discharge damaged the player.
    PlayerDamaged {
        /// Identifier of the hazard unit that caused the damage.
        hazard: HazardId,
        /// Health remaining after the hit.
        remaining: Health,
    },
    /// Announces that the episode terminated.
    EpisodeEnded {
        /// Identifier of the episode that ended.
        episode: EpisodeId,
        /// Final score achieved during the episode.
        score: u32,
    },
    /// Announces that a fresh episode began.
    EpisodeStarted {
        /// Identifier of the new episode.
        episode: EpisodeId,
    },
}

/// Immutable representation of a single hazard unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HazardSnapshot {
    /// Identifier of the hazard unit.
    pub id: HazardId,
    /// Perimeter cell hosting the unit.
    pub cell: GridCoord,
    /// Current lifecycle phase.
    pub phase: HazardPhase,
}

/// Read-only snapshot describing every hazard unit on the perimeter.
#[derive(Clone, Debug, Default)]
pub struct HazardView {
    snapshots: Vec<HazardSnapshot>,
}

impl HazardView {
    /// Creates a new hazard view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<HazardSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &HazardSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the identifiers of units currently eligible for
    /// activation.
    pub fn idle_units(&self) -> impl Iterator<Item = HazardId> + '_ {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.phase == HazardPhase::Idle)
            .map(|snapshot| snapshot.id)
    }

    /// Current phase of the provided unit, if it exists.
    #[must_use]
    pub fn phase_of(&self, hazard: HazardId) -> Option<HazardPhase> {
        self.snapshots
            .binary_search_by_key(&hazard, |snapshot| snapshot.id)
            .ok()
            .map(|index| self.snapshots[index].phase)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<HazardSnapshot> {
        self.snapshots
    }
}
