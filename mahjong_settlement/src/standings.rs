use crate::error::SettlementResult;
use crate::honba::find_headbump_winner;
use crate::round::{ConcludedRound, SeatSet};
use crate::rules::Ruleset;
use crate::transaction::TransactionKind;
use crate::{ScoreDeltas, NUM_PLAYERS};

/// 不聴罰符: noten seats pay the pool to tenpai seats. Nothing moves when
/// everyone or no one is tenpai.
pub fn tenpai_payments(ready_seats: Option<&SeatSet>, rules: &Ruleset) -> ScoreDeltas {
    let mut deltas = ScoreDeltas::zero();
    let Some(ready) = ready_seats else {
        return deltas;
    };
    let tenpai = ready.len();
    if tenpai == 0 || tenpai == NUM_PLAYERS {
        return deltas;
    }

    let gain = rules.noten_penalty_pool / tenpai as i32;
    let loss = rules.noten_penalty_pool / (NUM_PLAYERS - tenpai) as i32;
    for seat in 0..NUM_PLAYERS {
        deltas[seat] = if ready.contains(&seat) { gain } else { -loss };
    }
    deltas
}

/// Net movement of every seat's score over one concluded round.
pub fn overall_score_delta(round: &ConcludedRound, rules: &Ruleset) -> SettlementResult<ScoreDeltas> {
    round.validate()?;
    let mut deltas = round.raw_deltas();
    for &seat in &round.riichi_declarants {
        deltas[seat] -= rules.riichi_deposit;
    }
    if round.has_kind(|kind| matches!(kind, TransactionKind::RoundExhaustedSpecial)) {
        return Ok(deltas);
    }

    if !round.has_win() {
        deltas += tenpai_payments(round.ready_seats.as_ref(), rules);
        return Ok(deltas);
    }

    // a win takes every deposit on the table, including this round's
    let pot = round.starting_stake_count + round.riichi_declarants.len() as u32;
    if round.ending_stake_count == 0 && pot > 0 {
        let winner = find_headbump_winner(&round.transactions)?;
        deltas[winner] += rules.riichi_deposit * pot as i32;
    }
    Ok(deltas)
}

/// Scores after every round of `history`.
pub fn running_totals(
    history: &[ConcludedRound],
    starting: [i32; NUM_PLAYERS],
    rules: &Ruleset,
) -> SettlementResult<[i32; NUM_PLAYERS]> {
    history
        .iter()
        .try_fold(ScoreDeltas::new(starting), |totals, round| -> SettlementResult<ScoreDeltas> {
            Ok(totals + overall_score_delta(round, rules)?)
        })
        .map(ScoreDeltas::into_array)
}

/// Seat scores plus deposits on the table add up to the points in play.
pub fn table_is_balanced(totals: &[i32; NUM_PLAYERS], stakes_on_table: u32, rules: &Ruleset) -> bool {
    totals.iter().sum::<i32>() + rules.riichi_deposit * stakes_on_table as i32 == rules.table_total()
}
