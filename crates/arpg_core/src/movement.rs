//! Single-step greedy movement on the tile grid.
//!
//! The planner picks one cardinal step toward or away from a reference
//! tile. It does no search beyond the current neighbourhood: primary
//! axis first, then the other axis, then the four cardinals in shuffled
//! order. Walkability (static collision plus occupancy by other agents)
//! is supplied by the caller.
//!
//! Executing a step takes time. [`MoveGuard`] enforces that a new step is
//! not planned for an agent while its previous one is still running.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Facing};
use crate::error::{CombatError, Result};
use crate::math::TileCoord;

/// A unit cardinal step on the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    /// Column delta, one of -1, 0, 1.
    pub dx: i32,
    /// Row delta, one of -1, 0, 1.
    pub dy: i32,
}

impl Step {
    /// Step in the direction of `facing`.
    #[must_use]
    pub const fn from_facing(facing: Facing) -> Self {
        let (dx, dy) = facing.tile_delta();
        Self { dx, dy }
    }

    /// Facing that matches this step.
    #[must_use]
    pub fn facing(self) -> Facing {
        Facing::from_delta(self.dx, self.dy).unwrap_or_default()
    }

    /// Tile reached by taking this step from `from`.
    #[must_use]
    pub const fn apply(self, from: TileCoord) -> TileCoord {
        from.offset(self.dx, self.dy)
    }
}

/// Whether a step should close or open distance to the reference tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepIntent {
    /// Close distance (pursuit).
    Towards,
    /// Open distance (kiting, fleeing).
    Away,
}

/// Pick the next single-tile step from `from` relative to `reference`.
///
/// The axis with the larger absolute difference is tried first (ties go
/// horizontal), then the other axis. An axis with no difference offers no
/// step. When neither works, the four cardinals are shuffled and the first
/// walkable one wins. Returns `None` when every neighbour is blocked, or
/// when moving towards a reference the agent already stands on.
pub fn next_step<F, R>(
    from: TileCoord,
    reference: TileCoord,
    walkable: F,
    intent: StepIntent,
    rng: &mut R,
) -> Option<Step>
where
    F: Fn(TileCoord) -> bool,
    R: Rng + ?Sized,
{
    let mut diff_x = reference.x - from.x;
    let mut diff_y = reference.y - from.y;
    if intent == StepIntent::Away {
        diff_x = -diff_x;
        diff_y = -diff_y;
    }

    if intent == StepIntent::Towards && diff_x == 0 && diff_y == 0 {
        return None;
    }

    let horizontal = Step {
        dx: diff_x.signum(),
        dy: 0,
    };
    let vertical = Step {
        dx: 0,
        dy: diff_y.signum(),
    };
    let (primary, secondary) = if diff_x.abs() >= diff_y.abs() {
        (horizontal, vertical)
    } else {
        (vertical, horizontal)
    };

    for candidate in [primary, secondary] {
        if candidate.dx == 0 && candidate.dy == 0 {
            continue;
        }
        if walkable(candidate.apply(from)) {
            return Some(candidate);
        }
    }

    random_step(from, walkable, rng)
}

/// First walkable cardinal step in a uniformly shuffled order.
pub fn random_step<F, R>(from: TileCoord, walkable: F, rng: &mut R) -> Option<Step>
where
    F: Fn(TileCoord) -> bool,
    R: Rng + ?Sized,
{
    let mut directions = Facing::ALL;
    directions.shuffle(rng);
    directions
        .into_iter()
        .map(Step::from_facing)
        .find(|step| walkable(step.apply(from)))
}

/// Move-in-progress flag for one agent.
///
/// Set when a step starts, cleared by the step's completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveGuard {
    owner: EntityId,
    in_progress: bool,
}

impl MoveGuard {
    /// Create an idle guard for `owner`.
    #[must_use]
    pub const fn new(owner: EntityId) -> Self {
        Self {
            owner,
            in_progress: false,
        }
    }

    /// Whether a step is currently executing.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.in_progress
    }

    /// Mark a step as started.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::MoveInProgress`] if the previous step has not
    /// completed yet.
    pub fn try_begin(&mut self) -> Result<()> {
        if self.in_progress {
            return Err(CombatError::MoveInProgress(self.owner));
        }
        self.in_progress = true;
        Ok(())
    }

    /// Mark the current step as finished. Returns whether one was running.
    pub fn complete(&mut self) -> bool {
        std::mem::replace(&mut self.in_progress, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn open(_: TileCoord) -> bool {
        true
    }

    #[test]
    fn test_prefers_larger_axis() {
        let from = TileCoord::new(0, 0);
        let step = next_step(from, TileCoord::new(5, 2), open, StepIntent::Towards, &mut rng());
        assert_eq!(step, Some(Step { dx: 1, dy: 0 }));

        let step = next_step(from, TileCoord::new(1, -4), open, StepIntent::Towards, &mut rng());
        assert_eq!(step, Some(Step { dx: 0, dy: -1 }));
    }

    #[test]
    fn test_away_negates_direction() {
        let from = TileCoord::new(0, 0);
        let step = next_step(from, TileCoord::new(5, 2), open, StepIntent::Away, &mut rng());
        assert_eq!(step, Some(Step { dx: -1, dy: 0 }));
    }

    #[test]
    fn test_falls_back_to_secondary_axis() {
        let from = TileCoord::new(0, 0);
        let blocked = TileCoord::new(1, 0);
        let step = next_step(
            from,
            TileCoord::new(5, 2),
            |t| t != blocked,
            StepIntent::Towards,
            &mut rng(),
        );
        assert_eq!(step, Some(Step { dx: 0, dy: 1 }));
    }

    #[test]
    fn test_straight_line_blocked_uses_shuffle() {
        // Target straight right, right is blocked, no vertical difference.
        let from = TileCoord::new(0, 0);
        let blocked = TileCoord::new(1, 0);
        let step = next_step(
            from,
            TileCoord::new(5, 0),
            |t| t != blocked,
            StepIntent::Towards,
            &mut rng(),
        )
        .expect("three neighbours are open");
        assert_ne!(step.apply(from), blocked);
        assert_eq!(step.dx.abs() + step.dy.abs(), 1);
    }

    #[test]
    fn test_boxed_in_returns_none() {
        let from = TileCoord::new(3, 3);
        let step = next_step(from, TileCoord::new(8, 3), |_| false, StepIntent::Towards, &mut rng());
        assert_eq!(step, None);
        assert_eq!(random_step(from, |_| false, &mut rng()), None);
    }

    #[test]
    fn test_towards_own_tile_is_none() {
        let from = TileCoord::new(2, 2);
        assert_eq!(next_step(from, from, open, StepIntent::Towards, &mut rng()), None);
    }

    #[test]
    fn test_away_from_own_tile_picks_any_open_direction() {
        let from = TileCoord::new(2, 2);
        let step = next_step(from, from, open, StepIntent::Away, &mut rng());
        assert!(step.is_some());
    }

    #[test]
    fn test_only_exit_is_found() {
        let from = TileCoord::new(0, 0);
        let exit = TileCoord::new(0, -1);
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let step = next_step(from, TileCoord::new(4, 4), |t| t == exit, StepIntent::Towards, &mut rng);
            assert_eq!(step, Some(Step { dx: 0, dy: -1 }));
        }
    }

    #[test]
    fn test_step_facing() {
        for facing in Facing::ALL {
            assert_eq!(Step::from_facing(facing).facing(), facing);
        }
    }

    #[test]
    fn test_move_guard_rejects_overlap() {
        let mut guard = MoveGuard::new(9);
        assert!(guard.try_begin().is_ok());
        assert!(guard.is_moving());
        assert!(matches!(guard.try_begin(), Err(CombatError::MoveInProgress(9))));
        assert!(guard.complete());
        assert!(!guard.complete());
        assert!(guard.try_begin().is_ok());
    }
}
