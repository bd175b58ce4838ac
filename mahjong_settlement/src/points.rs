use crate::error::{SettlementError, SettlementResult};
use crate::Hand;

const MANGAN: u32 = 2000;
const HANEMAN: u32 = 3000;
const BAIMAN: u32 = 4000;
const SANBAIMAN: u32 = 6000;
const YAKUMAN: u32 = 8000;

/// Base points from fu/han with mangan+ caps.
///
/// - 13+ han: yakuman (counted)
/// - 11-12: sanbaiman
/// - 8-10: baiman
/// - 6-7: haneman
/// - 5, or fu * 2^(han+2) above 2000: mangan
pub fn base_points(hand: Hand) -> SettlementResult<u32> {
    if hand.fu == 0 || hand.han == 0 {
        return Err(SettlementError::InvalidHand {
            fu: hand.fu,
            han: hand.han,
        });
    }

    let capped = match hand.han {
        13.. => YAKUMAN,
        11 | 12 => SANBAIMAN,
        8..=10 => BAIMAN,
        6 | 7 => HANEMAN,
        5 => MANGAN,
        han => {
            // han <= 4 here, so the shift cannot overflow
            let base = u64::from(hand.fu) * (1u64 << (han + 2));
            base.min(u64::from(MANGAN)) as u32
        }
    };
    Ok(capped)
}

/// Points one payer owes for `hand` at the given liability multiplier.
///
/// Multipliers: 6 dealer ron, 4 non-dealer ron, 2/1 for tsumo shares,
/// 3/2 for each half of a split liability.
pub fn hand_value(multiplier: u32, hand: Hand) -> SettlementResult<i32> {
    let base = base_points(hand)?;
    Ok(round_up_100(base * multiplier) as i32)
}

pub fn round_up_100(x: u32) -> u32 {
    x.div_ceil(100) * 100
}
