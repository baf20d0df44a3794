// Timed Raffle - Trigger predicate
use solana_program::clock::UnixTimestamp;

use crate::state::{RafflePhase, RoundState};

/// First condition keeping a round from closing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerReason {
    Ready,
    NotOpen,
    IntervalNotElapsed { remaining: i64 },
    NoPlayers,
    EmptyPot,
}

impl TriggerReason {
    /// Compact code used in program return data
    pub fn code(&self) -> u8 {
        match self {
            TriggerReason::Ready => 0,
            TriggerReason::NotOpen => 1,
            TriggerReason::IntervalNotElapsed { .. } => 2,
            TriggerReason::NoPlayers => 3,
            TriggerReason::EmptyPot => 4,
        }
    }
}

/// Result of evaluating the trigger predicate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerCheck {
    pub ready: bool,
    pub reason: TriggerReason,
}

impl TriggerCheck {
    fn blocked(reason: TriggerReason) -> Self {
        Self { ready: false, reason }
    }
}

impl RoundState {
    /// Decides whether the round may close at `now`.
    ///
    /// Pure: the round must be open, `interval` seconds must have passed
    /// since it started, and it must hold at least one player and a
    /// non-empty pot.
    pub fn check_trigger(&self, now: UnixTimestamp) -> TriggerCheck {
        if self.phase != RafflePhase::Open {
            return TriggerCheck::blocked(TriggerReason::NotOpen);
        }

        let elapsed = now.saturating_sub(self.last_round_timestamp);
        if elapsed < self.interval {
            return TriggerCheck::blocked(TriggerReason::IntervalNotElapsed {
                remaining: self.interval.saturating_sub(elapsed),
            });
        }

        if self.players.is_empty() {
            return TriggerCheck::blocked(TriggerReason::NoPlayers);
        }

        // Only reachable with a zero entry fee
        if self.pot == 0 {
            return TriggerCheck::blocked(TriggerReason::EmptyPot);
        }

        TriggerCheck {
            ready: true,
            reason: TriggerReason::Ready,
        }
    }
}
