use serde::Serialize;

pub const TIER_THREE_FROM: f64 = 70.0;
pub const TIER_TWO_FROM: f64 = 35.0;

/// Scoring bucket derived from final completion percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, strum_macros::Display)]
pub enum ScoreTier {
    One,
    Two,
    Three,
}

impl ScoreTier {
    pub fn from_progress(progress: f64) -> Self {
        if progress >= TIER_THREE_FROM {
            ScoreTier::Three
        } else if progress >= TIER_TWO_FROM {
            ScoreTier::Two
        } else {
            ScoreTier::One
        }
    }

    pub fn points(self) -> u8 {
        match self {
            ScoreTier::One => 1,
            ScoreTier::Two => 2,
            ScoreTier::Three => 3,
        }
    }
}
