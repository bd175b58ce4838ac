use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Index, IndexMut};

pub const NUM_PLAYERS: usize = 4;

/// Fixed seat position, `0..NUM_PLAYERS`. Seat order is circular.
pub type Seat = usize;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Wind {
    East,
    South,
    West,
    North,
}

impl Wind {
    /// The prevailing wind after this one. There is nothing after North.
    pub fn next(self) -> Option<Wind> {
        match self {
            Wind::East => Some(Wind::South),
            Wind::South => Some(Wind::West),
            Wind::West => Some(Wind::North),
            Wind::North => None,
        }
    }
}

/// fu/han pair produced by the hand evaluator.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct Hand {
    pub fu: u32,
    pub han: u32,
}

impl Hand {
    pub fn new(fu: u32, han: u32) -> Self {
        Self { fu, han }
    }
}

/// Per-seat point movement, index-aligned to seat.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ScoreDeltas([i32; NUM_PLAYERS]);

impl ScoreDeltas {
    pub fn new(deltas: [i32; NUM_PLAYERS]) -> Self {
        Self(deltas)
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn into_array(self) -> [i32; NUM_PLAYERS] {
        self.0
    }

    pub fn total(&self) -> i32 {
        self.0.iter().sum()
    }

    /// Seats in ascending order paired with their delta.
    pub fn iter(&self) -> impl Iterator<Item = (Seat, i32)> + '_ {
        self.0.iter().copied().enumerate()
    }
}

impl From<[i32; NUM_PLAYERS]> for ScoreDeltas {
    fn from(deltas: [i32; NUM_PLAYERS]) -> Self {
        Self(deltas)
    }
}

impl PartialEq<[i32; NUM_PLAYERS]> for ScoreDeltas {
    fn eq(&self, other: &[i32; NUM_PLAYERS]) -> bool {
        &self.0 == other
    }
}

impl Index<Seat> for ScoreDeltas {
    type Output = i32;

    fn index(&self, seat: Seat) -> &i32 {
        &self.0[seat]
    }
}

impl IndexMut<Seat> for ScoreDeltas {
    fn index_mut(&mut self, seat: Seat) -> &mut i32 {
        &mut self.0[seat]
    }
}

impl Add for ScoreDeltas {
    type Output = ScoreDeltas;

    fn add(mut self, rhs: ScoreDeltas) -> ScoreDeltas {
        self += rhs;
        self
    }
}

impl AddAssign for ScoreDeltas {
    fn add_assign(&mut self, rhs: ScoreDeltas) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a += b;
        }
    }
}

/// Minimal state needed to open a round.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct NewRound {
    pub wind: Wind,
    /// 1..=4; the dealer sits at `seat_number - 1`.
    pub seat_number: u8,
    pub repeat_counter: u32,
    pub starting_stake_count: u32,
}

impl NewRound {
    /// East 1, no repeats, nothing on the table.
    pub fn opening() -> Self {
        Self {
            wind: Wind::East,
            seat_number: 1,
            repeat_counter: 0,
            starting_stake_count: 0,
        }
    }

    pub fn dealer(&self) -> SettlementResult<Seat> {
        error::dealer_for(self.seat_number)
    }
}

pub mod error;
mod honba;
mod points;
mod progression;
mod round;
mod rules;
mod session;
mod standings;
mod transaction;

pub use error::{SettlementError, SettlementResult};
pub use honba::{apply_repeat_counter, find_headbump_winner, governing_transaction, with_repeat_bonus};
pub use points::{base_points, hand_value, round_up_100};
pub use progression::{generate_next_round, is_match_end, is_match_end_from};
pub use round::{ConcludedRound, RoundAccumulator, SeatSet};
pub use rules::Ruleset;
pub use session::Match;
pub use standings::{overall_score_delta, running_totals, table_is_balanced, tenpai_payments};
pub use transaction::{Transaction, TransactionKind};
