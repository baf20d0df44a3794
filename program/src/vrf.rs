// VRF integration for the timed raffle program
use arrayref::array_ref;
use solana_program::{msg, pubkey::Pubkey};

use crate::{
    error::OracleError,
    ports::{RandomnessOracle, RandomnessRequest},
};

/// Reduce a 32-byte VRF output to the random value the raffle consumes
pub fn random_value_from_result(vrf_result: &[u8; 32]) -> u64 {
    // First 8 bytes, little endian
    u64::from_le_bytes(*array_ref![vrf_result, 0, 8])
}

/// On-chain side of the oracle handshake.
///
/// Hands out sequential request ids from the raffle account's nonce and
/// logs each request so the off-chain oracle authority can answer it with
/// a `FulfillRandomWords` instruction.
pub struct ProgramOracle {
    request_nonce: u64,
}

impl ProgramOracle {
    pub fn new(request_nonce: u64) -> Self {
        Self { request_nonce }
    }

    /// Last request id handed out
    pub fn request_nonce(&self) -> u64 {
        self.request_nonce
    }
}

impl RandomnessOracle for ProgramOracle {
    fn request_random_words(
        &mut self,
        consumer: &Pubkey,
        request: &RandomnessRequest,
    ) -> Result<u64, OracleError> {
        let request_id = self
            .request_nonce
            .checked_add(1)
            .ok_or(OracleError::RequestIdOverflow)?;
        self.request_nonce = request_id;

        msg!(
            "RandomnessRequested: request_id={} consumer={} subscription={} confirmations={} callback_gas_limit={} num_words={}",
            request_id,
            consumer,
            request.subscription_id,
            request.request_confirmations,
            request.callback_gas_limit,
            request.num_words
        );
        Ok(request_id)
    }
}
