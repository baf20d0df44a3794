// Timed Raffle - Configuration
use solana_program::{msg, native_token::LAMPORTS_PER_SOL};
use std::str::FromStr;

use crate::{error::RaffleError, ports::RandomnessRequest};

/// Oracle key the presets request randomness against
pub const DEFAULT_KEY_HASH: [u8; 32] = [
    0x47, 0x4e, 0x34, 0xa0, 0x77, 0xdf, 0x58, 0x80, 0x7d, 0xbe, 0x9c, 0x96, 0xd3, 0xc0, 0x09, 0xb2,
    0x3b, 0x3c, 0x6d, 0x0c, 0xce, 0x43, 0x3e, 0x59, 0xbb, 0xf5, 0xb3, 0x4f, 0x82, 0x3b, 0xc5, 0x6c,
];

/// Clusters the raffle ships presets for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cluster {
    Localnet,
    Devnet,
    Mainnet,
}

impl Cluster {
    /// Development clusters run against the mock coordinator
    pub fn is_development(&self) -> bool {
        matches!(self, Cluster::Localnet)
    }
}

impl FromStr for Cluster {
    type Err = RaffleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "localnet" | "localhost" => Ok(Cluster::Localnet),
            "devnet" => Ok(Cluster::Devnet),
            "mainnet" | "mainnet-beta" => Ok(Cluster::Mainnet),
            _ => Err(RaffleError::InvalidConfig),
        }
    }
}

/// Settings fixed when the raffle is created
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Minimum lamports per entry
    pub entry_fee: u64,
    /// Minimum seconds a round stays open
    pub interval: i64,
    /// Parameters attached to every randomness request
    pub randomness: RandomnessRequest,
}

impl RaffleConfig {
    /// Preset for `cluster`; mainnet carries no oracle settings
    pub fn for_cluster(cluster: Cluster) -> Option<Self> {
        match cluster {
            Cluster::Localnet => Some(Self {
                entry_fee: LAMPORTS_PER_SOL / 100, // 0.01 SOL
                interval: 30,
                // Subscription is created on the mock coordinator at startup
                randomness: RandomnessRequest::new(DEFAULT_KEY_HASH, 0, 500_000),
            }),
            Cluster::Devnet => Some(Self {
                entry_fee: LAMPORTS_PER_SOL / 100, // 0.01 SOL
                interval: 10,
                randomness: RandomnessRequest::new(DEFAULT_KEY_HASH, 8891, 1_000_000),
            }),
            Cluster::Mainnet => None,
        }
    }

    pub fn validate(&self) -> Result<(), RaffleError> {
        if self.entry_fee == 0 {
            msg!("Entry fee must be greater than zero");
            return Err(RaffleError::InvalidConfig);
        }
        if self.interval <= 0 {
            msg!("Interval must be greater than zero, got {}", self.interval);
            return Err(RaffleError::InvalidConfig);
        }
        if self.randomness.num_words == 0 || self.randomness.request_confirmations == 0 {
            msg!("Randomness request must ask for at least one word and one confirmation");
            return Err(RaffleError::InvalidConfig);
        }
        Ok(())
    }
}
