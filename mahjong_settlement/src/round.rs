use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{check_seat, dealer_for, SettlementResult};
use crate::honba::{apply_repeat_counter, governing_transaction};
use crate::points::hand_value;
use crate::rules::Ruleset;
use crate::transaction::{Transaction, TransactionKind};
use crate::{Hand, NewRound, ScoreDeltas, Seat, Wind, NUM_PLAYERS};

/// Seats in ascending order.
pub type SeatSet = BTreeSet<Seat>;

/// Collects the events of one round, then [`finalize`](Self::finalize)s into
/// a [`ConcludedRound`]. Consumed on finalize, so it cannot be reused.
#[derive(Debug, Clone)]
pub struct RoundAccumulator {
    round: NewRound,
    dealer: Seat,
    rules: Ruleset,
    riichi_declarants: SeatSet,
    ready_seats: Option<SeatSet>,
    transactions: Vec<Transaction>,
}

impl RoundAccumulator {
    pub fn new(round: NewRound) -> SettlementResult<Self> {
        Self::with_rules(round, Ruleset::default())
    }

    pub fn with_rules(round: NewRound, rules: Ruleset) -> SettlementResult<Self> {
        rules.validate()?;
        let dealer = round.dealer()?;
        Ok(Self {
            round,
            dealer,
            rules,
            riichi_declarants: SeatSet::new(),
            ready_seats: None,
            transactions: Vec::new(),
        })
    }

    pub fn round(&self) -> &NewRound {
        &self.round
    }

    pub fn dealer(&self) -> Seat {
        self.dealer
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Ron payment multiplier for a winner in `seat`.
    pub fn deal_in_multiplier(&self, seat: Seat) -> u32 {
        if seat == self.dealer() {
            6
        } else {
            4
        }
    }

    /// Tsumo share owed by `seat`.
    pub fn self_draw_multiplier(&self, seat: Seat, winner_is_dealer: bool) -> u32 {
        if winner_is_dealer || seat == self.dealer() {
            2
        } else {
            1
        }
    }

    pub fn record_direct_hit(&mut self, winner: Seat, loser: Seat, hand: Hand) -> SettlementResult<&Transaction> {
        check_seat(winner)?;
        check_seat(loser)?;
        let value = hand_value(self.deal_in_multiplier(winner), hand)?;

        let mut deltas = ScoreDeltas::zero();
        deltas[winner] = value;
        deltas[loser] = -value;
        Ok(self.push(TransactionKind::DirectHit { hand }, deltas))
    }

    pub fn record_self_draw(&mut self, winner: Seat, hand: Hand) -> SettlementResult<&Transaction> {
        check_seat(winner)?;
        let winner_is_dealer = winner == self.dealer();

        let mut deltas = ScoreDeltas::zero();
        for seat in (0..NUM_PLAYERS).filter(|&s| s != winner) {
            let value = hand_value(self.self_draw_multiplier(seat, winner_is_dealer), hand)?;
            deltas[seat] = -value;
            deltas[winner] += value;
        }
        Ok(self.push(TransactionKind::SelfDraw { hand }, deltas))
    }

    /// Nagashi mangan: paid like a mangan tsumo, without a hand.
    pub fn record_round_exhausted_special(&mut self, winner: Seat) -> SettlementResult<&Transaction> {
        check_seat(winner)?;
        let winner_is_dealer = winner == self.dealer();
        let base = self.rules.nagashi_base_points;

        let mut deltas = ScoreDeltas::zero();
        for seat in (0..NUM_PLAYERS).filter(|&s| s != winner) {
            let value = base * self.self_draw_multiplier(seat, winner_is_dealer) as i32;
            deltas[seat] = -value;
            deltas[winner] += value;
        }
        Ok(self.push(TransactionKind::RoundExhaustedSpecial, deltas))
    }

    /// Ron where `liable` pays half of the deal-in.
    ///
    /// Each half is rounded on its own, so the halves may not add up to the
    /// winner's credit exactly.
    pub fn record_liable_direct_hit(
        &mut self,
        winner: Seat,
        loser: Seat,
        liable: Seat,
        hand: Hand,
    ) -> SettlementResult<&Transaction> {
        check_seat(winner)?;
        check_seat(loser)?;
        check_seat(liable)?;
        let multiplier = self.deal_in_multiplier(winner);
        let half = hand_value(multiplier / 2, hand)?;

        let mut deltas = ScoreDeltas::zero();
        deltas[loser] = -half;
        deltas[liable] = -half;
        deltas[winner] = hand_value(multiplier, hand)?;
        Ok(self.push(TransactionKind::DirectHitLiable { hand, liable }, deltas))
    }

    /// Tsumo paid in full by `liable`, at the ron rate.
    pub fn record_liable_self_draw(&mut self, winner: Seat, liable: Seat, hand: Hand) -> SettlementResult<&Transaction> {
        check_seat(winner)?;
        check_seat(liable)?;
        let value = hand_value(self.deal_in_multiplier(winner), hand)?;

        let mut deltas = ScoreDeltas::zero();
        deltas[liable] = -value;
        deltas[winner] = value;
        Ok(self.push(TransactionKind::SelfDrawLiable { hand, liable }, deltas))
    }

    /// Abortive draw; the dealer always keeps the seat.
    pub fn record_abortive_draw(&mut self) -> &Transaction {
        self.push(TransactionKind::AbortiveDraw, ScoreDeltas::zero())
    }

    pub fn set_ready_seats<I: IntoIterator<Item = Seat>>(&mut self, seats: I) -> SettlementResult<()> {
        self.ready_seats = Some(collect_seats(seats)?);
        Ok(())
    }

    pub fn set_riichi_declarants<I: IntoIterator<Item = Seat>>(&mut self, seats: I) -> SettlementResult<()> {
        self.riichi_declarants = collect_seats(seats)?;
        Ok(())
    }

    fn push(&mut self, kind: TransactionKind, score_deltas: ScoreDeltas) -> &Transaction {
        self.transactions.push(Transaction::new(kind, score_deltas));
        &self.transactions[self.transactions.len() - 1]
    }

    fn ending_stake_count(&self) -> u32 {
        if self.transactions.iter().any(|tx| tx.kind.is_win()) {
            0
        } else {
            self.round.starting_stake_count + self.riichi_declarants.len() as u32
        }
    }

    pub fn finalize(self) -> SettlementResult<ConcludedRound> {
        let ending_stake_count = self.ending_stake_count();
        let governing = governing_transaction(&self.transactions)?;
        debug!(
            wind = ?self.round.wind,
            seat_number = self.round.seat_number,
            repeat_counter = self.round.repeat_counter,
            transactions = self.transactions.len(),
            ?governing,
            ending_stake_count,
            "finalizing round"
        );
        let transactions = apply_repeat_counter(self.transactions, self.round.repeat_counter, &self.rules)?;

        Ok(ConcludedRound {
            wind: self.round.wind,
            seat_number: self.round.seat_number,
            repeat_counter: self.round.repeat_counter,
            starting_stake_count: self.round.starting_stake_count,
            ending_stake_count,
            riichi_declarants: self.riichi_declarants,
            ready_seats: self.ready_seats,
            transactions,
        })
    }
}

fn collect_seats<I: IntoIterator<Item = Seat>>(seats: I) -> SettlementResult<SeatSet> {
    seats.into_iter().map(check_seat).collect()
}

/// Settled record of one round.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConcludedRound {
    pub wind: Wind,
    pub seat_number: u8,
    pub repeat_counter: u32,
    pub starting_stake_count: u32,
    pub ending_stake_count: u32,
    pub riichi_declarants: SeatSet,
    /// `None` when the round did not end in an exhaustive draw.
    pub ready_seats: Option<SeatSet>,
    /// Honba already applied. Order is not significant.
    pub transactions: Vec<Transaction>,
}

impl ConcludedRound {
    pub fn dealer(&self) -> SettlementResult<Seat> {
        dealer_for(self.seat_number)
    }

    /// Checks the fields a deserialized record can get wrong: the seat
    /// number and the seats named in the declarant and tenpai sets.
    pub fn validate(&self) -> SettlementResult<()> {
        self.dealer()?;
        let ready = self.ready_seats.iter().flatten();
        for &seat in self.riichi_declarants.iter().chain(ready) {
            check_seat(seat)?;
        }
        Ok(())
    }

    pub fn has_win(&self) -> bool {
        self.transactions.iter().any(|tx| tx.kind.is_win())
    }

    pub fn has_kind(&self, pred: impl Fn(&TransactionKind) -> bool) -> bool {
        self.transactions.iter().any(|tx| pred(&tx.kind))
    }

    pub fn is_ready(&self, seat: Seat) -> bool {
        self.ready_seats.as_ref().is_some_and(|ready| ready.contains(&seat))
    }

    /// Sum of the transactions' deltas, before deposits and noten payments.
    pub fn raw_deltas(&self) -> ScoreDeltas {
        self.transactions
            .iter()
            .fold(ScoreDeltas::zero(), |acc, tx| acc + tx.score_deltas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SettlementError;

    fn round(wind: Wind, seat_number: u8, repeat_counter: u32, starting_stake_count: u32) -> RoundAccumulator {
        RoundAccumulator::new(NewRound {
            wind,
            seat_number,
            repeat_counter,
            starting_stake_count,
        })
        .unwrap()
    }

    #[test]
    fn multipliers_follow_dealer() {
        let acc = round(Wind::East, 2, 0, 0);
        assert_eq!(acc.dealer(), 1);
        assert_eq!(acc.deal_in_multiplier(1), 6);
        assert_eq!(acc.deal_in_multiplier(0), 4);
        assert_eq!(acc.self_draw_multiplier(0, true), 2);
        assert_eq!(acc.self_draw_multiplier(1, false), 2);
        assert_eq!(acc.self_draw_multiplier(3, false), 1);
    }

    #[test]
    fn rejects_seat_number_out_of_range() {
        let mut bad = NewRound::opening();
        bad.seat_number = 5;
        assert_eq!(
            RoundAccumulator::new(bad).unwrap_err(),
            SettlementError::InvalidRoundNumber { seat_number: 5 }
        );
        bad.seat_number = 0;
        assert!(RoundAccumulator::new(bad).is_err());
    }

    #[test]
    fn validate_catches_edited_records() {
        let mut record = round(Wind::East, 1, 0, 0).finalize().unwrap();
        assert_eq!(record.dealer().unwrap(), 0);
        assert!(record.validate().is_ok());

        record.seat_number = 0;
        assert_eq!(
            record.dealer().unwrap_err(),
            SettlementError::InvalidRoundNumber { seat_number: 0 }
        );
        record.seat_number = 5;
        assert!(record.validate().is_err());

        record.seat_number = 1;
        record.ready_seats = Some(SeatSet::from([0, 4]));
        assert_eq!(record.validate().unwrap_err(), SettlementError::InvalidSeat { seat: 4 });
    }

    #[test]
    fn rejects_uneven_noten_pool() {
        let rules = Ruleset {
            noten_penalty_pool: 1000,
            ..Ruleset::default()
        };
        let err = RoundAccumulator::with_rules(NewRound::opening(), rules).unwrap_err();
        assert!(matches!(err, SettlementError::InvalidRuleset { .. }));
    }

    #[test]
    fn rejects_bad_seats() {
        let mut acc = round(Wind::East, 1, 0, 0);
        assert_eq!(
            acc.record_direct_hit(4, 0, Hand::new(30, 1)).unwrap_err(),
            SettlementError::InvalidSeat { seat: 4 }
        );
        assert!(acc.set_riichi_declarants([0, 7]).is_err());
        assert!(acc.transactions().is_empty());
    }

    #[test]
    fn self_draw_by_dealer_and_non_dealer() {
        let mut acc = round(Wind::East, 2, 0, 0);
        let tx = acc.record_self_draw(1, Hand::new(30, 3)).unwrap();
        assert_eq!(tx.score_deltas, [-2000, 6000, -2000, -2000]);
        let tx = acc.record_self_draw(3, Hand::new(30, 3)).unwrap();
        assert_eq!(tx.score_deltas, [-1000, -2000, -1000, 4000]);
    }

    #[test]
    fn nagashi_uses_fixed_base() {
        let mut acc = round(Wind::East, 1, 0, 0);
        let tx = acc.record_round_exhausted_special(2).unwrap();
        assert_eq!(tx.score_deltas, [-4000, -2000, 8000, -2000]);
        let tx = acc.record_round_exhausted_special(0).unwrap();
        assert_eq!(tx.score_deltas, [12000, -4000, -4000, -4000]);
    }

    #[test]
    fn liable_payments() {
        let mut acc = round(Wind::East, 4, 0, 0);
        let tx = *acc.record_liable_direct_hit(3, 1, 0, Hand::new(40, 13)).unwrap();
        assert_eq!(tx.score_deltas, [-24000, -24000, 0, 48000]);
        assert_eq!(tx.kind.liable_seat(), Some(0));

        let tx = *acc.record_liable_self_draw(3, 0, Hand::new(40, 13)).unwrap();
        assert_eq!(tx.score_deltas, [-48000, 0, 0, 48000]);
    }

    #[test]
    fn stakes_cleared_only_by_a_win() {
        let mut acc = round(Wind::East, 1, 0, 2);
        acc.set_riichi_declarants([1]).unwrap();
        acc.record_round_exhausted_special(3).unwrap();
        assert_eq!(acc.finalize().unwrap().ending_stake_count, 3);

        let mut acc = round(Wind::East, 1, 0, 2);
        acc.set_riichi_declarants([1]).unwrap();
        acc.record_direct_hit(1, 2, Hand::new(30, 1)).unwrap();
        assert_eq!(acc.finalize().unwrap().ending_stake_count, 0);
    }

    #[test]
    fn declarations_are_last_write_wins() {
        let mut acc = round(Wind::East, 1, 0, 0);
        acc.set_ready_seats([0, 1]).unwrap();
        acc.set_ready_seats([2]).unwrap();
        acc.set_riichi_declarants([3, 3]).unwrap();
        let done = acc.finalize().unwrap();
        assert_eq!(done.ready_seats, Some(SeatSet::from([2])));
        assert_eq!(done.riichi_declarants, SeatSet::from([3]));
        assert!(done.is_ready(2));
        assert!(!done.is_ready(0));
    }

    #[test]
    fn undeclared_ready_seats_serialize_as_null() {
        let mut acc = round(Wind::South, 3, 1, 0);
        acc.record_direct_hit(0, 1, Hand::new(30, 1)).unwrap();
        let done = acc.finalize().unwrap();
        let json = serde_json::to_value(&done).unwrap();
        assert!(json["ready_seats"].is_null());
        assert_eq!(json["wind"], "SOUTH");
        let back: ConcludedRound = serde_json::from_value(json).unwrap();
        assert_eq!(back, done);
    }
}
