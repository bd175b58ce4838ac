use serde::{Deserialize, Serialize};

use crate::{Hand, ScoreDeltas, Seat};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// ロン
    DirectHit { hand: Hand },
    /// ツモ
    SelfDraw { hand: Hand },
    /// Ron where `liable` shares the deal-in payment (包).
    DirectHitLiable { hand: Hand, liable: Seat },
    /// Tsumo paid entirely by `liable`.
    SelfDrawLiable { hand: Hand, liable: Seat },
    /// 流し満貫
    RoundExhaustedSpecial,
    /// 途中流局
    AbortiveDraw,
}

impl TransactionKind {
    pub fn hand(&self) -> Option<Hand> {
        match *self {
            TransactionKind::DirectHit { hand }
            | TransactionKind::SelfDraw { hand }
            | TransactionKind::DirectHitLiable { hand, .. }
            | TransactionKind::SelfDrawLiable { hand, .. } => Some(hand),
            TransactionKind::RoundExhaustedSpecial | TransactionKind::AbortiveDraw => None,
        }
    }

    pub fn liable_seat(&self) -> Option<Seat> {
        match *self {
            TransactionKind::DirectHitLiable { liable, .. }
            | TransactionKind::SelfDrawLiable { liable, .. } => Some(liable),
            _ => None,
        }
    }

    /// Any agari; a win clears the deposits on the table.
    pub fn is_win(&self) -> bool {
        self.hand().is_some()
    }
}

/// One scoring event within a round.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct Transaction {
    #[serde(flatten)]
    pub kind: TransactionKind,
    pub score_deltas: ScoreDeltas,
}

impl Transaction {
    pub fn new(kind: TransactionKind, score_deltas: ScoreDeltas) -> Self {
        Self { kind, score_deltas }
    }

    pub fn is_liable(&self, seat: Seat) -> bool {
        self.kind.liable_seat() == Some(seat)
    }

    /// Whether `seat` is paid in this transaction.
    pub fn credits(&self, seat: Seat) -> bool {
        self.score_deltas[seat] > 0
    }
}
