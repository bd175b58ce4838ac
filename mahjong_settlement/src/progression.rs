use tracing::debug;

use crate::error::{SettlementError, SettlementResult};
use crate::round::ConcludedRound;
use crate::rules::Ruleset;
use crate::standings::running_totals;
use crate::transaction::TransactionKind;
use crate::{NewRound, Seat, Wind, NUM_PLAYERS};

/// 連荘: the dealer won, an abortive draw happened, or the dealer was tenpai.
fn dealership_retained(round: &ConcludedRound, dealer: Seat) -> bool {
    let dealer_won = round.transactions.iter().any(|tx| {
        !matches!(tx.kind, TransactionKind::RoundExhaustedSpecial) && tx.score_deltas[dealer] > 0
    });
    dealer_won || round.has_kind(|kind| matches!(kind, TransactionKind::AbortiveDraw)) || round.is_ready(dealer)
}

fn next_repeat_counter(round: &ConcludedRound, dealer: Seat) -> u32 {
    let continues = round.transactions.is_empty()
        || round.transactions.iter().any(|tx| {
            matches!(
                tx.kind,
                TransactionKind::RoundExhaustedSpecial | TransactionKind::AbortiveDraw
            ) || tx.score_deltas[dealer] > 0
        });
    if continues {
        round.repeat_counter + 1
    } else {
        0
    }
}

pub fn generate_next_round(round: &ConcludedRound) -> SettlementResult<NewRound> {
    round.validate()?;
    let dealer = round.dealer()?;
    let repeat_counter = next_repeat_counter(round, dealer);
    let retained = dealership_retained(round, dealer);
    debug!(
        wind = ?round.wind,
        seat_number = round.seat_number,
        retained,
        repeat_counter,
        "generating next round"
    );

    let (wind, seat_number) = if retained {
        (round.wind, round.seat_number)
    } else if usize::from(round.seat_number) == NUM_PLAYERS {
        let wind = round
            .wind
            .next()
            .ok_or_else(|| SettlementError::invalid_state("no round after North 4"))?;
        (wind, 1)
    } else {
        (round.wind, round.seat_number + 1)
    };

    Ok(NewRound {
        wind,
        seat_number,
        repeat_counter,
        starting_stake_count: round.ending_stake_count,
    })
}

pub fn is_match_end(next: &NewRound, history: &[ConcludedRound], rules: &Ruleset) -> SettlementResult<bool> {
    is_match_end_from(next, history, rules.starting_scores(), rules)
}

/// Decides whether `next` should be played.
///
/// The match ends at North regardless of scores, or when someone is below
/// zero. Otherwise it needs someone at the returning points: past South it
/// then ends immediately, and at South 4 only if seat 3 leads (seat 3 loses
/// ties).
pub fn is_match_end_from(
    next: &NewRound,
    history: &[ConcludedRound],
    starting: [i32; NUM_PLAYERS],
    rules: &Ruleset,
) -> SettlementResult<bool> {
    if next.wind == Wind::North {
        debug!("match ends: next round is North");
        return Ok(true);
    }

    let mut totals = running_totals(history, starting, rules)?;
    if totals.iter().any(|&score| score < 0) {
        debug!(?totals, "match ends: a seat is below zero");
        return Ok(true);
    }
    if !totals.iter().any(|&score| score >= rules.returning_points) {
        return Ok(false);
    }
    if next.wind == Wind::West {
        debug!(?totals, "match ends: extension with a seat at returning points");
        return Ok(true);
    }

    let Some(last) = history.last() else {
        return Ok(false);
    };
    if last.wind != Wind::South || usize::from(last.seat_number) != NUM_PLAYERS {
        return Ok(false);
    }

    // TODO: confirm whether this tie-break should follow the final dealer rather than seat 3
    totals[NUM_PLAYERS - 1] -= 1;
    let leader = totals.iter().copied().max().unwrap_or_default();
    let ends = leader == totals[NUM_PLAYERS - 1];
    debug!(?totals, ends, "South 4 tie-break");
    Ok(ends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Hand, RoundAccumulator};

    fn open(wind: Wind, seat_number: u8, repeat_counter: u32, starting_stake_count: u32) -> RoundAccumulator {
        RoundAccumulator::new(NewRound {
            wind,
            seat_number,
            repeat_counter,
            starting_stake_count,
        })
        .unwrap()
    }

    #[test]
    fn non_dealer_win_passes_the_deal() {
        let mut acc = open(Wind::East, 1, 0, 0);
        acc.record_direct_hit(2, 0, Hand::new(30, 1)).unwrap();
        let next = generate_next_round(&acc.finalize().unwrap()).unwrap();
        assert_eq!(next, NewRound {
            wind: Wind::East,
            seat_number: 2,
            repeat_counter: 0,
            starting_stake_count: 0,
        });
    }

    #[test]
    fn dealer_win_repeats() {
        let mut acc = open(Wind::East, 1, 0, 0);
        acc.record_direct_hit(0, 2, Hand::new(30, 1)).unwrap();
        let next = generate_next_round(&acc.finalize().unwrap()).unwrap();
        assert_eq!((next.wind, next.seat_number, next.repeat_counter), (Wind::East, 1, 1));
    }

    #[test]
    fn abortive_draw_keeps_dealer() {
        let mut acc = open(Wind::South, 3, 2, 1);
        acc.record_abortive_draw();
        acc.set_riichi_declarants([0]).unwrap();
        let next = generate_next_round(&acc.finalize().unwrap()).unwrap();
        assert_eq!(next, NewRound {
            wind: Wind::South,
            seat_number: 3,
            repeat_counter: 3,
            starting_stake_count: 2,
        });
    }

    #[test]
    fn nagashi_by_dealer_passes_the_deal() {
        let mut acc = open(Wind::East, 1, 0, 0);
        acc.record_round_exhausted_special(0).unwrap();
        acc.set_ready_seats(Vec::new()).unwrap();
        let next = generate_next_round(&acc.finalize().unwrap()).unwrap();
        assert_eq!((next.seat_number, next.repeat_counter), (2, 1));
    }

    #[test]
    fn fourth_seat_advances_wind() {
        let mut acc = open(Wind::East, 4, 0, 0);
        acc.set_ready_seats(Vec::new()).unwrap();
        let next = generate_next_round(&acc.finalize().unwrap()).unwrap();
        assert_eq!((next.wind, next.seat_number, next.repeat_counter), (Wind::South, 1, 1));
    }

    #[test]
    fn no_round_after_north_four() {
        let mut acc = open(Wind::North, 4, 0, 0);
        acc.record_direct_hit(0, 1, Hand::new(30, 1)).unwrap();
        let err = generate_next_round(&acc.finalize().unwrap()).unwrap_err();
        assert!(matches!(err, SettlementError::InvalidState { .. }));
    }

    #[test]
    fn stored_round_with_bad_seat_number_is_rejected() {
        let mut acc = open(Wind::East, 4, 0, 0);
        acc.record_direct_hit(1, 0, Hand::new(30, 1)).unwrap();
        let mut done = acc.finalize().unwrap();
        for seat_number in [0, 5] {
            done.seat_number = seat_number;
            assert_eq!(
                generate_next_round(&done).unwrap_err(),
                SettlementError::InvalidRoundNumber { seat_number }
            );
        }
    }

    #[test]
    fn north_always_ends() {
        let next = NewRound {
            wind: Wind::North,
            seat_number: 1,
            repeat_counter: 0,
            starting_stake_count: 0,
        };
        assert!(is_match_end(&next, &[], &Ruleset::default()).unwrap());
    }

    #[test]
    fn fresh_match_does_not_end() {
        assert!(!is_match_end(&NewRound::opening(), &[], &Ruleset::default()).unwrap());
    }
}
