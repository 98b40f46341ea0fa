//! Maps pointer positions onto forward progress along a sampled curve.
//!
//! The search is confined to a window around the current progress index so
//! that a pointer can never be matched to a coincidentally close sample on
//! another stretch of a looping track. The cost of one evaluation is bounded
//! by the window size, not by the curve resolution.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::sampler::Curve;

pub const DEFAULT_BACKTRACK: usize = 20;
pub const DEFAULT_LOOKAHEAD: usize = 100;
/// Slightly larger than half the 40-unit visual track width.
pub const DEFAULT_SAFE_RADIUS: f64 = 22.0;

/// How many samples behind and ahead of the progress index are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchWindow {
    pub backtrack: usize,
    pub lookahead: usize,
}

impl Default for SearchWindow {
    fn default() -> Self {
        Self {
            backtrack: DEFAULT_BACKTRACK,
            lookahead: DEFAULT_LOOKAHEAD,
        }
    }
}

impl SearchWindow {
    /// Inclusive index bounds around `current`, clamped to `[0, last]`.
    pub fn bounds(&self, current: usize, last: usize) -> (usize, usize) {
        let current = current.min(last);
        let lo = current.saturating_sub(self.backtrack);
        let hi = current.saturating_add(self.lookahead).min(last);
        (lo, hi)
    }
}

/// Best matching sample for one cursor position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub best_index: usize,
    pub best_distance: f64,
}

impl Evaluation {
    pub fn is_within(&self, safe_radius: f64) -> bool {
        self.best_distance <= safe_radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tracker {
    pub window: SearchWindow,
    pub safe_radius: f64,
}

impl Default for Tracker {
    fn default() -> Self {
        Self {
            window: SearchWindow::default(),
            safe_radius: DEFAULT_SAFE_RADIUS,
        }
    }
}

impl Tracker {
    pub fn new(window: SearchWindow, safe_radius: f64) -> Self {
        Self {
            window,
            safe_radius,
        }
    }

    /// Nearest sample to `cursor` within the window around `current_index`.
    ///
    /// Equal distances resolve to the larger index so a cursor sitting
    /// exactly between two samples never drags progress backwards.
    pub fn evaluate(&self, cursor: Point, current_index: usize, curve: &Curve) -> Evaluation {
        let (lo, hi) = self.window.bounds(current_index, curve.resolution());

        let mut best_index = lo;
        let mut best_sq = f64::INFINITY;
        for (offset, sample) in curve.points()[lo..=hi].iter().enumerate() {
            let d = cursor.distance_squared(*sample);
            if d <= best_sq {
                best_sq = d;
                best_index = lo + offset;
            }
        }

        Evaluation {
            best_index,
            best_distance: best_sq.sqrt(),
        }
    }

    pub fn is_contained(&self, evaluation: &Evaluation) -> bool {
        evaluation.is_within(self.safe_radius)
    }
}
