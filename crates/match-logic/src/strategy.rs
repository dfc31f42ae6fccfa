//! Strategy definitions and execution

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::history::{History, Side};
use crate::random::SeededRng;

/// A move in the Prisoner's Dilemma
///
/// Numeric interfaces encode cooperate as 0 and defect as 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Cooperate,
    Defect,
}

impl Move {
    pub fn index(self) -> usize {
        match self {
            Move::Cooperate => 0,
            Move::Defect => 1,
        }
    }

    pub fn as_f32(self) -> f32 {
        self.index() as f32
    }

    pub fn flip(self) -> Self {
        match self {
            Move::Cooperate => Move::Defect,
            Move::Defect => Move::Cooperate,
        }
    }
}

impl TryFrom<u8> for Move {
    type Error = MatchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Move::Cooperate),
            1 => Ok(Move::Defect),
            other => Err(MatchError::DomainViolation {
                value: other as f32,
            }),
        }
    }
}

/// The closed catalog of reference strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyBase {
    /// Always cooperate, never defect.
    AlwaysCooperate,
    /// Always defect, never cooperate.
    AlwaysDefect,
    /// Copy opponent's last move. Start with cooperate.
    TitForTat,
    /// Cooperate until anyone defects once, then always defect.
    GrimTrigger,
    /// Win-stay, lose-shift. Repeat move after a good outcome.
    WinStayLoseShift,
    /// Fair coin each round.
    Random,
}

impl StrategyBase {
    /// Every catalog member, in reporting order
    pub const ALL: [StrategyBase; 6] = [
        StrategyBase::AlwaysCooperate,
        StrategyBase::AlwaysDefect,
        StrategyBase::TitForTat,
        StrategyBase::GrimTrigger,
        StrategyBase::WinStayLoseShift,
        StrategyBase::Random,
    ];

    /// Strategies whose play is treated as authentic expert behavior
    pub const EXPERTS: [StrategyBase; 3] = [
        StrategyBase::TitForTat,
        StrategyBase::GrimTrigger,
        StrategyBase::WinStayLoseShift,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyBase::AlwaysCooperate => "AlwaysCooperate",
            StrategyBase::AlwaysDefect => "AlwaysDefect",
            StrategyBase::TitForTat => "TitForTat",
            StrategyBase::GrimTrigger => "GrimTrigger",
            StrategyBase::WinStayLoseShift => "WinStayLoseShift",
            StrategyBase::Random => "Random",
        }
    }

    pub fn is_expert(self) -> bool {
        Self::EXPERTS.contains(&self)
    }

    /// Look a strategy up by name. Case, `_` and `-` are ignored.
    pub fn from_name(name: &str) -> Result<Self, MatchError> {
        let wanted = normalize(name);
        Self::ALL
            .into_iter()
            .find(|base| normalize(base.name()) == wanted)
            .ok_or_else(|| MatchError::StrategyNotFound(name.to_string()))
    }

    /// Execute a strategy for one round
    ///
    /// # Arguments
    /// * `history` - Every round played so far
    /// * `side` - Which seat this strategy occupies
    /// * `rng` - Random number generator, only consumed by `Random`
    pub fn next_move(self, history: &History, side: Side, rng: &mut SeededRng) -> Move {
        match self {
            StrategyBase::AlwaysCooperate => Move::Cooperate,
            StrategyBase::AlwaysDefect => Move::Defect,
            StrategyBase::TitForTat => execute_tit_for_tat(history, side),
            StrategyBase::GrimTrigger => execute_grim_trigger(history),
            StrategyBase::WinStayLoseShift => execute_win_stay_lose_shift(history, side),
            StrategyBase::Random => execute_random(rng),
        }
    }
}

impl fmt::Display for StrategyBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyBase {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Tit-for-Tat: Copy opponent's last move, start with cooperate
fn execute_tit_for_tat(history: &History, side: Side) -> Move {
    history.opponent_last(side).unwrap_or(Move::Cooperate)
}

/// Grim Trigger: Cooperate until a defection shows up, then always defect
///
/// Latches on a defection by either side; once set it never clears.
fn execute_grim_trigger(history: &History) -> Move {
    if history.any_defection() {
        Move::Defect
    } else {
        Move::Cooperate
    }
}

/// Win-stay, lose-shift
/// - Good outcome last round (mutual cooperation or successful defection): repeat
/// - Otherwise: switch
fn execute_win_stay_lose_shift(history: &History, side: Side) -> Move {
    let (Some(my_last), Some(opp_last)) = (history.own_last(side), history.opponent_last(side))
    else {
        return Move::Cooperate;
    };

    let (my_score, _) = crate::payoff(my_last, opp_last);

    // 3 and 5 are the two good outcomes
    if my_score >= 3 {
        my_last
    } else {
        my_last.flip()
    }
}

/// Random: fair coin
fn execute_random(rng: &mut SeededRng) -> Move {
    if rng.random_bool(0.5) {
        Move::Cooperate
    } else {
        Move::Defect
    }
}
