use serde::{Deserialize, Serialize};

use crate::error::{SettlementError, SettlementResult};
use crate::NUM_PLAYERS;

/// Table constants. Defaults are the standard 25000/30000 four-player game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Ruleset {
    pub starting_points: i32,
    /// 返し点: someone must reach this before the match may end early.
    pub returning_points: i32,
    pub riichi_deposit: i32,
    /// Honba bonus on a ron, and the winner's total on a tsumo.
    pub honba_ron_bonus: i32,
    /// Honba paid by each tsumo payer.
    pub honba_tsumo_bonus: i32,
    /// 不聴罰符. Split evenly among one to three seats on either side, so it
    /// must be divisible by 2 and 3.
    pub noten_penalty_pool: i32,
    /// Base points of a nagashi mangan.
    pub nagashi_base_points: i32,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            starting_points: 25000,
            returning_points: 30000,
            riichi_deposit: 1000,
            honba_ron_bonus: 300,
            honba_tsumo_bonus: 100,
            noten_penalty_pool: 3000,
            nagashi_base_points: 2000,
        }
    }
}

impl Ruleset {
    pub fn from_json(json: &str) -> SettlementResult<Self> {
        let rules: Ruleset = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> SettlementResult<()> {
        if self.noten_penalty_pool < 0 || self.noten_penalty_pool % 6 != 0 {
            return Err(SettlementError::InvalidRuleset {
                message: format!(
                    "noten penalty pool {} does not split evenly among 1, 2 or 3 seats",
                    self.noten_penalty_pool
                ),
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> SettlementResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn starting_scores(&self) -> [i32; NUM_PLAYERS] {
        [self.starting_points; NUM_PLAYERS]
    }

    /// Points in play: every seat's score plus deposits on the table.
    pub fn table_total(&self) -> i32 {
        self.starting_points * NUM_PLAYERS as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let rules = Ruleset::from_json(r#"{"starting_points": 30000, "returning_points": 30000}"#).unwrap();
        assert_eq!(rules.starting_points, 30000);
        assert_eq!(rules.riichi_deposit, 1000);
        assert_eq!(rules.table_total(), 120000);
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        let err = Ruleset::from_json("{starting_points").unwrap_err();
        assert!(matches!(err, SettlementError::Serialization { .. }));
    }

    #[test]
    fn uneven_noten_pool_is_rejected() {
        let err = Ruleset::from_json(r#"{"noten_penalty_pool": 1000}"#).unwrap_err();
        assert!(matches!(err, SettlementError::InvalidRuleset { .. }));
        assert!(Ruleset::from_json(r#"{"noten_penalty_pool": 6000}"#).is_ok());
        assert!(Ruleset::from_json(r#"{"noten_penalty_pool": 0}"#).is_ok());
    }

    #[test]
    fn default_table_total() {
        assert_eq!(Ruleset::default().table_total(), 100000);
        let json = Ruleset::default().to_json().unwrap();
        assert_eq!(Ruleset::from_json(&json).unwrap(), Ruleset::default());
    }
}
