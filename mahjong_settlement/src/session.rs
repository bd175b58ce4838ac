use tracing::{debug, warn};

use crate::error::{SettlementError, SettlementResult};
use crate::progression::{generate_next_round, is_match_end_from};
use crate::round::{ConcludedRound, RoundAccumulator};
use crate::rules::Ruleset;
use crate::standings::{overall_score_delta, table_is_balanced};
use crate::{NewRound, ScoreDeltas, NUM_PLAYERS};

/// One match: concluded rounds, running scores and the round to play next.
#[derive(Debug, Clone)]
pub struct Match {
    rules: Ruleset,
    starting: [i32; NUM_PLAYERS],
    scores: ScoreDeltas,
    history: Vec<ConcludedRound>,
    next: NewRound,
    finished: bool,
}

impl Match {
    pub fn new(rules: Ruleset) -> Self {
        let starting = rules.starting_scores();
        Self {
            rules,
            starting,
            scores: ScoreDeltas::new(starting),
            history: Vec::new(),
            next: NewRound::opening(),
            finished: false,
        }
    }

    pub fn rules(&self) -> &Ruleset {
        &self.rules
    }

    pub fn current_round(&self) -> &NewRound {
        &self.next
    }

    pub fn history(&self) -> &[ConcludedRound] {
        &self.history
    }

    pub fn scores(&self) -> [i32; NUM_PLAYERS] {
        self.scores.into_array()
    }

    pub fn stakes_on_table(&self) -> u32 {
        self.next.starting_stake_count
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn start_round(&self) -> SettlementResult<RoundAccumulator> {
        if self.finished {
            return Err(SettlementError::invalid_state("match already finished"));
        }
        RoundAccumulator::with_rules(self.next, self.rules)
    }

    /// Records a finalized round and moves to the next one.
    /// Returns whether the match has ended.
    pub fn conclude(&mut self, round: ConcludedRound) -> SettlementResult<bool> {
        if self.finished {
            return Err(SettlementError::invalid_state("match already finished"));
        }
        let played = (
            round.wind,
            round.seat_number,
            round.repeat_counter,
            round.starting_stake_count,
        );
        let expected = (
            self.next.wind,
            self.next.seat_number,
            self.next.repeat_counter,
            self.next.starting_stake_count,
        );
        if played != expected {
            return Err(SettlementError::invalid_state(format!(
                "concluded round {played:?} does not match current round {expected:?}"
            )));
        }

        let delta = overall_score_delta(&round, &self.rules)?;
        let next = generate_next_round(&round)?;
        self.history.push(round);
        self.scores += delta;
        self.next = next;

        let totals = self.scores.into_array();
        if !table_is_balanced(&totals, self.next.starting_stake_count, &self.rules) {
            warn!(?totals, stakes = self.next.starting_stake_count, "points on table are not balanced");
        }

        self.finished = is_match_end_from(&self.next, &self.history, self.starting, &self.rules)?;
        debug!(?totals, next = ?self.next, finished = self.finished, "round concluded");
        Ok(self.finished)
    }
}
