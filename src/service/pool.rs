use alloy::primitives::Address;
use tracing::instrument;

use super::ServiceResult;
use super::types::PoolState;
use crate::repository::ChainClient;

/// Reads a concentrated-liquidity pool's current state.
///
/// The slot0 and liquidity reads are issued back-to-back over the same
/// client; an HTTP provider cannot pin them to one block, so a staleness
/// window of one block between the two reads is accepted. State is never
/// cached: every call performs fresh reads, since a stale price risks an
/// invalid trade.
pub struct PoolStateReader<'a> {
    chain: &'a dyn ChainClient,
}

impl<'a> PoolStateReader<'a> {
    pub fn new(chain: &'a dyn ChainClient) -> Self {
        Self { chain }
    }

    /// Fetches sqrt price, tick and in-range liquidity. Read failures
    /// propagate unchanged; retry policy belongs to the caller.
    #[instrument(skip(self), err)]
    pub async fn read(&self, pool: Address) -> ServiceResult<PoolState> {
        let (sqrt_price_x96, tick) = self.chain.get_pool_slot0(pool).await?;
        let liquidity = self.chain.get_pool_liquidity(pool).await?;

        tracing::debug!(
            "Pool {pool}: sqrt_price_x96={sqrt_price_x96}, tick={tick}, liquidity={liquidity}"
        );

        Ok(PoolState {
            sqrt_price_x96,
            tick,
            liquidity,
        })
    }
}
