//! Hand-authored battlefield adjacency.
//!
//! Rows are numbered from the rear (row 1) to the front (row 3). Slots are
//! numbered row-major from 1.
//!
//! One-player team:
//!
//! ```text
//!       [1]
//!     [2] [3]
//!   [4] [5] [6]
//! ```
//!
//! Two-player team:
//!
//! ```text
//!         [1] [2]
//!     [3] [4] [5] [6]
//! [7] [8] [9] [10][11][12]
//! ```

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, EngineResult};

/// One of the eight neighbor directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    TopLeft,
    Top,
    TopRight,
    Left,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::TopLeft,
        Direction::Top,
        Direction::TopRight,
        Direction::Left,
        Direction::Right,
        Direction::BottomLeft,
        Direction::Bottom,
        Direction::BottomRight,
    ];

    /// Position of this direction in a connection array.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::TopLeft => Direction::BottomRight,
            Direction::Top => Direction::Bottom,
            Direction::TopRight => Direction::BottomLeft,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::BottomLeft => Direction::TopRight,
            Direction::Bottom => Direction::Top,
            Direction::BottomRight => Direction::TopLeft,
        }
    }
}

/// Board shape, fixed by team size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardLayout {
    /// Six slots for a one-player team.
    Solo,
    /// Twelve slots for a two-player team.
    Duo,
}

use Direction::{
    Bottom as B, BottomLeft as BL, BottomRight as BR, Left as L, Right as R, Top as T,
    TopLeft as TL, TopRight as TR,
};

type Edges = &'static [(Direction, u8)];

const SOLO: [Edges; 6] = [
    &[(BL, 2), (BR, 3)],
    &[(TR, 1), (R, 3), (BL, 4), (BR, 5)],
    &[(TL, 1), (L, 2), (BL, 5), (BR, 6)],
    &[(TR, 2), (R, 5)],
    &[(TL, 2), (TR, 3), (L, 4), (R, 6)],
    &[(TL, 3), (L, 5)],
];

const DUO: [Edges; 12] = [
    &[(R, 2), (BL, 3), (B, 4), (BR, 5)],
    &[(L, 1), (BL, 4), (B, 5), (BR, 6)],
    &[(TR, 1), (R, 4), (BL, 7), (B, 8), (BR, 9)],
    &[(T, 1), (TR, 2), (L, 3), (R, 5), (BL, 8), (B, 9), (BR, 10)],
    &[(TL, 1), (T, 2), (L, 4), (R, 6), (BL, 9), (B, 10), (BR, 11)],
    &[(TL, 2), (L, 5), (BL, 10), (B, 11), (BR, 12)],
    &[(TR, 3), (R, 8)],
    &[(T, 3), (TR, 4), (L, 7), (R, 9)],
    &[(TL, 3), (T, 4), (TR, 5), (L, 8), (R, 10)],
    &[(TL, 4), (T, 5), (TR, 6), (L, 9), (R, 11)],
    &[(TL, 5), (T, 6), (L, 10), (R, 12)],
    &[(TL, 6), (L, 11)],
];

impl BoardLayout {
    /// Layout for a team of `team_size` players.
    pub fn for_team_size(team_size: usize) -> EngineResult<Self> {
        match team_size {
            1 => Ok(BoardLayout::Solo),
            2 => Ok(BoardLayout::Duo),
            n => Err(EngineError::validation(format!("team size must be 1 or 2, got {}", n))),
        }
    }

    #[must_use]
    pub const fn slot_count(self) -> u8 {
        match self {
            BoardLayout::Solo => 6,
            BoardLayout::Duo => 12,
        }
    }

    #[must_use]
    pub fn contains(self, space: u8) -> bool {
        (1..=self.slot_count()).contains(&space)
    }

    /// Row of a space, 1 (rear) to 3 (front). `None` if out of range.
    #[must_use]
    pub fn row_of(self, space: u8) -> Option<u8> {
        match (self, space) {
            (BoardLayout::Solo, 1) | (BoardLayout::Duo, 1..=2) => Some(1),
            (BoardLayout::Solo, 2..=3) | (BoardLayout::Duo, 3..=6) => Some(2),
            (BoardLayout::Solo, 4..=6) | (BoardLayout::Duo, 7..=12) => Some(3),
            _ => None,
        }
    }

    /// Neighbor table entries for `space`.
    #[must_use]
    pub fn edges(self, space: u8) -> Edges {
        if !self.contains(space) {
            return &[];
        }
        let index = usize::from(space - 1);
        match self {
            BoardLayout::Solo => SOLO[index],
            BoardLayout::Duo => DUO[index],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbor(layout: BoardLayout, space: u8, dir: Direction) -> Option<u8> {
        layout
            .edges(space)
            .iter()
            .find(|(d, _)| *d == dir)
            .map(|(_, n)| *n)
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        for layout in [BoardLayout::Solo, BoardLayout::Duo] {
            for space in 1..=layout.slot_count() {
                for &(dir, other) in layout.edges(space) {
                    assert!(layout.contains(other), "{layout:?} {space} -> {other}");
                    assert_eq!(
                        neighbor(layout, other, dir.opposite()),
                        Some(space),
                        "{layout:?} {space} {dir:?} {other}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_no_duplicate_directions() {
        for layout in [BoardLayout::Solo, BoardLayout::Duo] {
            for space in 1..=layout.slot_count() {
                let edges = layout.edges(space);
                for (i, (dir, _)) in edges.iter().enumerate() {
                    assert!(edges[i + 1..].iter().all(|(d, _)| d != dir));
                }
            }
        }
    }

    #[test]
    fn test_rows() {
        assert_eq!(BoardLayout::Solo.row_of(1), Some(1));
        assert_eq!(BoardLayout::Solo.row_of(5), Some(3));
        assert_eq!(BoardLayout::Duo.row_of(2), Some(1));
        assert_eq!(BoardLayout::Duo.row_of(6), Some(2));
        assert_eq!(BoardLayout::Duo.row_of(12), Some(3));
        assert_eq!(BoardLayout::Duo.row_of(13), None);
        assert_eq!(BoardLayout::Solo.row_of(0), None);
    }

    #[test]
    fn test_for_team_size() {
        assert_eq!(BoardLayout::for_team_size(1), Ok(BoardLayout::Solo));
        assert_eq!(BoardLayout::for_team_size(2), Ok(BoardLayout::Duo));
        assert!(BoardLayout::for_team_size(3).is_err());
    }
}
