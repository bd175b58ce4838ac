use thiserror::Error;

use crate::Seat;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettlementError {
    /// fu または han が 0 の手牌
    #[error("invalid hand: fu={fu}, han={han}")]
    InvalidHand { fu: u32, han: u32 },
    #[error("seat {seat} is out of range")]
    InvalidSeat { seat: Seat },
    #[error("seat number {seat_number} is out of range 1..=4")]
    InvalidRoundNumber { seat_number: u8 },
    /// 局の状態の不整合（和了者・放銃者が見つからない等）
    #[error("invalid state: {message}")]
    InvalidState { message: String },
    #[error("invalid ruleset: {message}")]
    InvalidRuleset { message: String },
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl SettlementError {
    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        SettlementError::InvalidState {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SettlementError {
    fn from(err: serde_json::Error) -> Self {
        SettlementError::Serialization {
            message: err.to_string(),
        }
    }
}

pub type SettlementResult<T> = Result<T, SettlementError>;

/// Dealer seat for a 1-based seat number.
pub(crate) fn dealer_for(seat_number: u8) -> SettlementResult<Seat> {
    if (1..=crate::NUM_PLAYERS as u8).contains(&seat_number) {
        Ok(usize::from(seat_number) - 1)
    } else {
        Err(SettlementError::InvalidRoundNumber { seat_number })
    }
}

pub(crate) fn check_seat(seat: Seat) -> SettlementResult<Seat> {
    if seat < crate::NUM_PLAYERS {
        Ok(seat)
    } else {
        Err(SettlementError::InvalidSeat { seat })
    }
}
