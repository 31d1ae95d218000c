//! Hazard unit discharge timelines.
//!
//! Each perimeter cell hosts one [`HazardUnit`]. A unit is dormant until a
//! scheduling lane activates it, then walks an explicit prep, fire, cooldown
//! timeline advanced once per tick. Suspension is "phase unchanged until the
//! elapsed time crosses the threshold"; cancellation is a forced return to
//! idle with all timers discarded.

use std::time::Duration;

use laser_arena_core::{GridCoord, HazardId, HazardPhase, HazardSnapshot};
use serde::{Deserialize, Serialize};

/// Timing parameters shared by every hazard unit's discharge cycle.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct HazardTiming {
    /// Duration of the aiming phase before the target cell is locked.
    pub prep: Duration,
    /// Delay between the lock and the discharge itself.
    pub fire_delay: Duration,
    /// Duration of the decay back to dormancy after the discharge.
    pub cooldown: Duration,
    /// Speed, in cells per second, at which the aim point chases the player.
    pub follow_rate: f32,
}

impl Default for HazardTiming {
    fn default() -> Self {
        Self {
            prep: Duration::from_secs(2),
            fire_delay: Duration::from_millis(500),
            cooldown: Duration::from_secs(1),
            follow_rate: 3.0,
        }
    }
}

/// Discharge produced by a unit whose fire delay just elapsed.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Discharge {
    pub(crate) hazard: HazardId,
    pub(crate) target: GridCoord,
}

/// One hazard unit anchored to a perimeter cell.
#[derive(Clone, Debug)]
pub(crate) struct HazardUnit {
    id: HazardId,
    cell: GridCoord,
    phase: HazardPhase,
    elapsed: Duration,
    aim: (f32, f32),
    lock: Option<GridCoord>,
}

impl HazardUnit {
    pub(crate) fn new(id: HazardId, cell: GridCoord) -> Self {
        Self {
            id,
            cell,
            phase: HazardPhase::Idle,
            elapsed: Duration::ZERO,
            aim: (cell.x() as f32, cell.y() as f32),
            lock: None,
        }
    }

    pub(crate) const fn cell(&self) -> GridCoord {
        self.cell
    }

    pub(crate) const fn id(&self) -> HazardId {
        self.id
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.phase == HazardPhase::Idle
    }

    /// Begins the prep phase with the aim snapped onto the player's cell.
    pub(crate) fn activate(&mut self, player: GridCoord) {
        self.phase = HazardPhase::Prepping;
        self.elapsed = Duration::ZERO;
        self.aim = (player.x() as f32, player.y() as f32);
        self.lock = None;
    }

    /// Advances the timeline by `dt`, yielding a discharge when the fire
    /// delay elapses. Overflow time carries into the next phase so slow tick
    /// rates do not stretch the cycle.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        player: GridCoord,
        timing: &HazardTiming,
    ) -> Option<Discharge> {
        match self.phase {
            HazardPhase::Idle => None,
            HazardPhase::Prepping => {
                let goal = (player.x() as f32, player.y() as f32);
                let step = timing.follow_rate * dt.as_secs_f32();
                self.aim = move_towards(self.aim, goal, step);
                self.elapsed = self.elapsed.saturating_add(dt);
                if self.elapsed >= timing.prep {
                    self.elapsed -= timing.prep;
                    self.phase = HazardPhase::Firing;
                    self.lock = Some(nearest_cell(self.aim));
                }
                None
            }
            HazardPhase::Firing => {
                self.elapsed = self.elapsed.saturating_add(dt);
                if self.elapsed >= timing.fire_delay {
                    self.elapsed -= timing.fire_delay;
                    self.phase = HazardPhase::Cooldown;
                    self.lock.map(|target| Discharge {
                        hazard: self.id,
                        target,
                    })
                } else {
                    None
                }
            }
            HazardPhase::Cooldown => {
                self.elapsed = self.elapsed.saturating_add(dt);
                if self.elapsed >= timing.cooldown {
                    self.force_idle();
                }
                None
            }
        }
    }

    /// Abandons any in-flight cycle and returns the unit to dormancy.
    pub(crate) fn force_idle(&mut self) {
        self.phase = HazardPhase::Idle;
        self.elapsed = Duration::ZERO;
        self.aim = (self.cell.x() as f32, self.cell.y() as f32);
        self.lock = None;
    }

    pub(crate) fn snapshot(&self) -> HazardSnapshot {
        HazardSnapshot {
            id: self.id,
            cell: self.cell,
            phase: self.phase,
        }
    }
}

fn move_towards(from: (f32, f32), to: (f32, f32), step: f32) -> (f32, f32) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let distance = (dx * dx + dy * dy).sqrt();
    if distance <= step || distance == 0.0 {
        to
    } else {
        (from.0 + dx / distance * step, from.1 + dy / distance * step)
    }
}

fn nearest_cell(aim: (f32, f32)) -> GridCoord {
    GridCoord::new(aim.0.round() as i32, aim.1.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing() -> HazardTiming {
        HazardTiming {
            prep: Duration::from_secs(1),
            fire_delay: Duration::from_secs(1),
            cooldown: Duration::from_secs(1),
            follow_rate: 100.0,
        }
    }

    #[test]
    fn cycle_walks_prep_fire_cooldown_idle() {
        let player = GridCoord::new(0, 0);
        let mut unit = HazardUnit::new(HazardId::new(0), GridCoord::new(-5, 0));
        let timing = timing();

        unit.activate(player);
        assert_eq!(unit.phase, HazardPhase::Prepping);

        assert!(unit
            .advance(Duration::from_secs(1), player, &timing)
            .is_none());
        assert_eq!(unit.phase, HazardPhase::Firing);
        assert_eq!(unit.lock, Some(player));

        let discharge = unit
            .advance(Duration::from_secs(1), player, &timing)
            .expect("discharge after fire delay");
        assert_eq!(discharge.target, player);
        assert_eq!(unit.phase, HazardPhase::Cooldown);

        assert!(unit
            .advance(Duration::from_secs(1), player, &timing)
            .is_none());
        assert!(unit.is_idle());
    }

    #[test]
    fn slow_follow_rate_locks_behind_a_moving_player() {
        let mut unit = HazardUnit::new(HazardId::new(0), GridCoord::new(-5, 0));
        let timing = HazardTiming {
            follow_rate: 0.25,
            ..timing()
        };

        unit.activate(GridCoord::new(0, 0));
        // Player teleports far away; a quarter-cell-per-second aim cannot
        // catch up within the one-second prep.
        let distant = GridCoord::new(3, 0);
        assert!(unit
            .advance(Duration::from_secs(1), distant, &timing)
            .is_none());
        assert_eq!(unit.phase, HazardPhase::Firing);
        assert_eq!(unit.lock, Some(GridCoord::new(0, 0)));
    }

    #[test]
    fn force_idle_abandons_the_cycle() {
        let player = GridCoord::new(0, 0);
        let mut unit = HazardUnit::new(HazardId::new(0), GridCoord::new(-5, 0));
        unit.activate(player);
        assert!(unit
            .advance(Duration::from_secs(1), player, &timing())
            .is_none());
        assert_eq!(unit.phase, HazardPhase::Firing);

        unit.force_idle();
        assert!(unit.is_idle());
        assert_eq!(unit.lock, None);
        assert!(unit
            .advance(Duration::from_secs(5), player, &timing())
            .is_none());
    }
}
