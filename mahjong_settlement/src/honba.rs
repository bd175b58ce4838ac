use tracing::trace;

use crate::error::{SettlementError, SettlementResult};
use crate::rules::Ruleset;
use crate::transaction::{Transaction, TransactionKind};
use crate::{Seat, NUM_PLAYERS};

/// The winner seated closest after the paying seat (頭ハネ).
///
/// Liable seats are not counted as payers, so a liability payout never
/// shifts the lookup. The payer is the lowest seat with a negative delta;
/// on a multi-ron there is only one. A liable tsumo has no other payer, so
/// the liable seat stands in.
pub fn find_headbump_winner(transactions: &[Transaction]) -> SettlementResult<Seat> {
    let mut winners = [false; NUM_PLAYERS];
    let mut payer: Option<Seat> = None;
    let mut liable_payer: Option<Seat> = None;

    for tx in transactions {
        for (seat, delta) in tx.score_deltas.iter() {
            if delta < 0 {
                let slot = if tx.is_liable(seat) { &mut liable_payer } else { &mut payer };
                *slot = Some(slot.map_or(seat, |p| p.min(seat)));
            } else if delta > 0 && !tx.is_liable(seat) {
                winners[seat] = true;
            }
        }
    }

    let payer = payer
        .or(liable_payer)
        .ok_or_else(|| SettlementError::invalid_state("no paying seat among transactions"))?;
    (1..=NUM_PLAYERS)
        .map(|offset| (payer + offset) % NUM_PLAYERS)
        .find(|&seat| winners[seat])
        .ok_or_else(|| SettlementError::invalid_state("no winning seat among transactions"))
}

/// Index of the transaction that carries the honba bonus, if any does.
pub fn governing_transaction(transactions: &[Transaction]) -> SettlementResult<Option<usize>> {
    if transactions.len() == 1 {
        return Ok(Some(0));
    }
    // draws and nagashi never take honba
    if !transactions.iter().any(|tx| tx.kind.is_win()) {
        return Ok(None);
    }
    if let Some(idx) = transactions
        .iter()
        .position(|tx| matches!(tx.kind, TransactionKind::SelfDraw { .. }))
    {
        return Ok(Some(idx));
    }

    let winner = find_headbump_winner(transactions)?;
    let preferred = transactions
        .iter()
        .position(|tx| tx.credits(winner) && !matches!(tx.kind, TransactionKind::DirectHitLiable { .. }));
    match preferred.or_else(|| transactions.iter().position(|tx| tx.credits(winner))) {
        Some(idx) => Ok(Some(idx)),
        None => Err(SettlementError::invalid_state(format!(
            "no transaction credits headbump winner {winner}"
        ))),
    }
}

/// A copy of `tx` with `repeat_counter` honba applied.
pub fn with_repeat_bonus(tx: &Transaction, repeat_counter: u32, rules: &Ruleset) -> Transaction {
    let mut out = *tx;
    if repeat_counter == 0 {
        return out;
    }
    let repeats = repeat_counter as i32;
    let ron_bonus = rules.honba_ron_bonus * repeats;
    let tsumo_bonus = rules.honba_tsumo_bonus * repeats;

    let deltas = &mut out.score_deltas;
    match tx.kind {
        TransactionKind::RoundExhaustedSpecial | TransactionKind::AbortiveDraw => {}
        TransactionKind::SelfDraw { .. } => {
            for seat in 0..NUM_PLAYERS {
                if deltas[seat] > 0 {
                    deltas[seat] += ron_bonus;
                } else if deltas[seat] < 0 {
                    deltas[seat] -= tsumo_bonus;
                }
            }
        }
        // the liable seat is the only payer and covers the whole bonus
        TransactionKind::SelfDrawLiable { .. } => {
            for seat in 0..NUM_PLAYERS {
                if deltas[seat] > 0 {
                    deltas[seat] += ron_bonus;
                } else if deltas[seat] < 0 {
                    deltas[seat] -= ron_bonus;
                }
            }
        }
        TransactionKind::DirectHit { .. } | TransactionKind::DirectHitLiable { .. } => {
            for seat in 0..NUM_PLAYERS {
                if tx.is_liable(seat) {
                    continue;
                }
                if deltas[seat] > 0 {
                    deltas[seat] += ron_bonus;
                } else if deltas[seat] < 0 {
                    deltas[seat] -= ron_bonus;
                }
            }
        }
    }
    trace!(repeat_counter, before = ?tx.score_deltas, after = ?out.score_deltas, "honba applied");
    out
}

/// Applies honba to the governing transaction only.
pub fn apply_repeat_counter(
    mut transactions: Vec<Transaction>,
    repeat_counter: u32,
    rules: &Ruleset,
) -> SettlementResult<Vec<Transaction>> {
    if let Some(idx) = governing_transaction(&transactions)? {
        transactions[idx] = with_repeat_bonus(&transactions[idx], repeat_counter, rules);
    }
    Ok(transactions)
}
