//! Forward-only search cursor for splitting intervals at grid knots.

use crate::trajectory::SkygridTrajectory;

/// Interior knots of a half-open interval, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridSpan {
    /// No knot falls inside the interval; the caller integrates the whole
    /// span on the segment at the cursor.
    Empty,
    /// First and last knot indices with `start <= knot_time < finish`.
    Interior {
        /// Earliest interior knot.
        first: usize,
        /// Latest interior knot.
        last: usize,
    },
}

/// Monotone search cursor into the grid-knot sequence.
///
/// The cursor only advances across successive intervals processed in time
/// order and never resets, so a whole tree costs O(intervals + knots)
/// rather than O(intervals · knots). The cursor index doubles as the
/// segment containing the current position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridCursor {
    index: usize,
}

impl GridCursor {
    /// Cursor at the start of the grid.
    pub fn new() -> Self {
        Self { index: 0 }
    }

    /// Segment the cursor currently sits on.
    pub fn segment(&self) -> usize {
        self.index
    }

    /// Scan forward from the cursor for knots interior to `[start, finish)`.
    pub fn interior_knots(
        &self,
        trajectory: &SkygridTrajectory,
        start: f64,
        finish: f64,
    ) -> GridSpan {
        let knot_count = trajectory.knot_count();
        let mut first = None;
        let mut last = self.index;
        let mut i = self.index;
        while i < knot_count && trajectory.knot_time(i) < finish {
            if trajectory.knot_time(i) >= start {
                if first.is_none() {
                    first = Some(i);
                }
                last = i;
            }
            i += 1;
        }
        match first {
            None => GridSpan::Empty,
            Some(first) => GridSpan::Interior { first, last },
        }
    }

    /// Move the cursor forward to `knot`. Moving backwards is a logic error
    /// in the caller's interval ordering.
    pub fn advance_to(&mut self, knot: usize) {
        debug_assert!(knot >= self.index, "grid cursor moved backwards");
        self.index = knot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trajectory() -> SkygridTrajectory {
        SkygridTrajectory::with_intercept(
            vec![0.0, 1.0, 2.0, 3.0],
            vec![1.0, 1.0, 1.0, 1.0],
            2.0,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_span_before_first_knot() {
        let traj = trajectory();
        let cursor = GridCursor::new();
        assert_eq!(cursor.interior_knots(&traj, -2.0, -1.0), GridSpan::Empty);
    }

    #[test]
    fn test_empty_span_within_segment() {
        let traj = trajectory();
        let mut cursor = GridCursor::new();
        cursor.advance_to(1);
        assert_eq!(cursor.interior_knots(&traj, 1.2, 1.9), GridSpan::Empty);
    }

    #[test]
    fn test_interior_span_is_half_open() {
        let traj = trajectory();
        let cursor = GridCursor::new();
        // Knot 2.0 is inside, knot 3.0 is the exclusive finish.
        assert_eq!(
            cursor.interior_knots(&traj, 1.5, 3.0),
            GridSpan::Interior { first: 2, last: 2 }
        );
        // A knot exactly at the start counts as interior.
        assert_eq!(
            cursor.interior_knots(&traj, 1.0, 2.5),
            GridSpan::Interior { first: 1, last: 2 }
        );
    }

    #[test]
    fn test_scan_ignores_knots_behind_cursor() {
        let traj = trajectory();
        let mut cursor = GridCursor::new();
        cursor.advance_to(2);
        // Knot 1 would match the window but lies behind the cursor.
        assert_eq!(
            cursor.interior_knots(&traj, 0.5, 2.5),
            GridSpan::Interior { first: 2, last: 2 }
        );
    }

    #[test]
    fn test_scan_past_grid_end() {
        let traj = trajectory();
        let mut cursor = GridCursor::new();
        cursor.advance_to(3);
        assert_eq!(cursor.interior_knots(&traj, 5.0, 9.0), GridSpan::Empty);
    }
}
