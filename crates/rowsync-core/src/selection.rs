//! Selection movement types.

use serde::{Deserialize, Serialize};

/// Direction of a selection move.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards the end of the list.
    #[default]
    Forward,
    /// Towards the start of the list.
    Reverse,
}

impl Direction {
    /// `Reverse` when `reverse` is set, `Forward` otherwise.
    pub fn from_reverse(reverse: bool) -> Self {
        if reverse {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }

    pub fn is_reverse(self) -> bool {
        self == Direction::Reverse
    }
}
