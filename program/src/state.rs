// Timed Raffle - State
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::IsInitialized,
    pubkey::Pubkey,
};

use crate::ports::RandomnessRequest;

/// Seed of the raffle PDA
pub const RAFFLE_SEED: &[u8] = b"raffle";
/// Entries a single round can hold on-chain
pub const MAX_PLAYERS: usize = 256;

/// Phase of the current round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RafflePhase {
    /// Round is accepting entries
    Open,
    /// Round is closed, waiting for randomness
    Calculating,
}

/// Authoritative data of the raffle, carried from round to round
///
/// Mutation happens through `enter`, `close_and_request_randomness` and
/// `on_randomness_fulfilled`, implemented next to the component that owns
/// each step.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RoundState {
    pub(crate) entry_fee: u64,
    pub(crate) interval: i64,
    pub(crate) players: Vec<Pubkey>,
    pub(crate) pot: u64,
    pub(crate) last_round_timestamp: UnixTimestamp,
    pub(crate) phase: RafflePhase,
    pub(crate) pending_request_id: Option<u64>,
    pub(crate) recent_winner: Option<Pubkey>,
}

impl RoundState {
    /// Serialized size of a round holding `players` entries
    pub const fn space(players: usize) -> usize {
        8 + 8 + (4 + 32 * players) + 8 + 8 + 1 + (1 + 8) + (1 + 32)
    }

    /// Open the first round at `now`
    pub fn new(entry_fee: u64, interval: i64, now: UnixTimestamp) -> Self {
        Self {
            entry_fee,
            interval,
            players: Vec::new(),
            pot: 0,
            last_round_timestamp: now,
            phase: RafflePhase::Open,
            pending_request_id: None,
            recent_winner: None,
        }
    }

    pub fn entry_fee(&self) -> u64 {
        self.entry_fee
    }

    /// Minimum seconds between round start and close
    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn phase(&self) -> RafflePhase {
        self.phase
    }

    pub fn pot(&self) -> u64 {
        self.pot
    }

    pub fn players(&self) -> &[Pubkey] {
        &self.players
    }

    pub fn player(&self, index: usize) -> Option<&Pubkey> {
        self.players.get(index)
    }

    pub fn number_of_players(&self) -> usize {
        self.players.len()
    }

    pub fn last_round_timestamp(&self) -> UnixTimestamp {
        self.last_round_timestamp
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        self.pending_request_id
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    /// Closed round whose payout failed; no fulfillment can settle it.
    pub fn is_frozen(&self) -> bool {
        self.phase == RafflePhase::Calculating && self.pending_request_id.is_none()
    }

    /// Checks the bookkeeping invariants of the round.
    ///
    /// An open round never has a pending request, a calculating round holds
    /// a pending request unless it is frozen, the pot covers at least one
    /// fee per player, and an empty round holds no value.
    pub fn check_invariants(&self) -> bool {
        let phase_consistent = match self.phase {
            RafflePhase::Open => self.pending_request_id.is_none(),
            RafflePhase::Calculating => !self.players.is_empty(),
        };
        let minimum_pot = (self.players.len() as u128) * (self.entry_fee as u128);
        let pot_covered = (self.pot as u128) >= minimum_pot;
        let empty_is_zero = !self.players.is_empty() || self.pot == 0;

        phase_consistent && pot_covered && empty_is_zero
    }
}

/// Contents of the raffle PDA
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RaffleAccount {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Bump of the raffle PDA
    pub bump: u8,
    /// Only key allowed to deliver randomness
    pub oracle_authority: Pubkey,
    /// Last request id handed out
    pub request_nonce: u64,
    /// Parameters attached to every randomness request
    pub randomness: RandomnessRequest,
    /// The raffle itself
    pub round: RoundState,
}

impl IsInitialized for RaffleAccount {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl RaffleAccount {
    pub const LEN: usize =
        1 + 1 + 32 + 8 + RandomnessRequest::LEN + RoundState::space(MAX_PLAYERS);

    /// Reads the account from its data buffer; trailing capacity is ignored.
    pub fn load(data: &[u8]) -> Result<Self, ProgramError> {
        let mut buf = data;
        Self::deserialize(&mut buf).map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }

    pub fn store(&self, data: &mut [u8]) -> Result<(), ProgramError> {
        let mut buf = data;
        self.serialize(&mut buf)
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }
}
