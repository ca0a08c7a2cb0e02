use alloy::primitives::{
    Address, Bytes, U256, U512,
    aliases::{U24, U160},
};
use alloy::sol_types::SolCall;

use super::ServiceResult;
use super::error::OrchestratorError;
use super::types::{CallKind, PoolState, SlippageTolerance, SubTransaction, TradeQuote};
use super::utils::mul_div;
use crate::repository::contract::ISwapRouter;

/// Fee denominator used by Uniswap V3: fee tiers are expressed in
/// hundredths of a bip (3000 = 0.30%).
const FEE_PIPS_DENOMINATOR: u32 = 1_000_000;

fn q96() -> U256 {
    U256::from(1u8) << 96
}

/// The fixed pool and direction a trade runs through.
#[derive(Debug, Clone)]
pub struct TradeRoute {
    pub token_in: Address,
    pub token_out: Address,
    /// Pool fee tier in hundredths of a bip.
    pub fee_pips: u32,
    pub pool: Address,
    pub router: Address,
}

impl TradeRoute {
    /// V3 pools order token0 < token1 by address; the direction of the
    /// price move depends on which side the input token is.
    fn input_is_token0(&self) -> bool {
        self.token_in < self.token_out
    }
}

#[derive(Debug, Clone)]
pub struct TradeParams {
    pub amount_in: U256,
    pub slippage: SlippageTolerance,
    pub deadline_offset_secs: u64,
    pub recipient: Address,
}

/// Computes a concrete swap call from pool state and trade parameters.
///
/// Pure: no chain I/O. The output amount is a single-tick approximation of
/// the concentrated-liquidity formula, valid while the trade stays within
/// the current tick's liquidity range; callers must not assume multi-tick
/// traversal correctness. The caller supplies `now` so quotes are
/// deterministic under test.
#[derive(Debug, Clone)]
pub struct TradeBuilder {
    route: TradeRoute,
}

impl TradeBuilder {
    pub fn new(route: TradeRoute) -> Self {
        Self { route }
    }

    pub fn build(
        &self,
        state: &PoolState,
        params: &TradeParams,
        now: i64,
    ) -> ServiceResult<TradeQuote> {
        if params.amount_in.is_zero() {
            return Err(OrchestratorError::InvalidTradeParameters(
                "input amount must be positive".to_string(),
            ));
        }
        if !params.slippage.is_valid() {
            return Err(OrchestratorError::InvalidTradeParameters(format!(
                "slippage tolerance {}/{} outside [0, 1)",
                params.slippage.numerator, params.slippage.denominator
            )));
        }
        if self.route.fee_pips >= FEE_PIPS_DENOMINATOR {
            return Err(OrchestratorError::InvalidTradeParameters(format!(
                "fee tier {} consumes the whole input",
                self.route.fee_pips
            )));
        }
        if state.liquidity == 0 || state.sqrt_price_x96.is_zero() {
            return Err(OrchestratorError::InvalidTradeParameters(format!(
                "pool {} has no usable state (liquidity={}, sqrt_price={})",
                self.route.pool, state.liquidity, state.sqrt_price_x96
            )));
        }

        let amount_in_after_fee = mul_div(
            params.amount_in,
            U256::from(FEE_PIPS_DENOMINATOR - self.route.fee_pips),
            U256::from(FEE_PIPS_DENOMINATOR),
        )?;

        let theoretical_output = if self.route.input_is_token0() {
            output_for_token0_in(state, amount_in_after_fee)?
        } else {
            output_for_token1_in(state, amount_in_after_fee)?
        };

        let min_output = mul_div(
            theoretical_output,
            U256::from(params.slippage.denominator - params.slippage.numerator),
            U256::from(params.slippage.denominator),
        )?;

        let deadline = u64::try_from(now)
            .map_err(|_| {
                OrchestratorError::InvalidTradeParameters(format!("invalid timestamp {now}"))
            })?
            .saturating_add(params.deadline_offset_secs);

        let swap = self.encode_router_call(params, min_output, deadline);

        Ok(TradeQuote {
            amount_in: params.amount_in,
            theoretical_output,
            min_output,
            deadline,
            route: vec![self.route.pool],
            swap,
        })
    }

    fn encode_router_call(
        &self,
        params: &TradeParams,
        min_output: U256,
        deadline: u64,
    ) -> SubTransaction {
        let call = ISwapRouter::exactInputSingleCall {
            params: ISwapRouter::ExactInputSingleParams {
                tokenIn: self.route.token_in,
                tokenOut: self.route.token_out,
                fee: U24::from(self.route.fee_pips),
                recipient: params.recipient,
                deadline: U256::from(deadline),
                amountIn: params.amount_in,
                amountOutMinimum: min_output,
                sqrtPriceLimitX96: U160::ZERO,
            },
        };

        SubTransaction {
            to: self.route.router,
            value: U256::ZERO,
            data: Bytes::from(call.abi_encode()),
            kind: CallKind::Call,
        }
    }
}

/// Token1 in: the sqrt price moves up by `amount * Q96 / L`, and the
/// token0 output is `L * Q96 * (sqrt' - sqrt) / (sqrt' * sqrt)`. All
/// divisions floor, so the result never exceeds the exact value.
fn output_for_token1_in(state: &PoolState, amount_in: U256) -> ServiceResult<U256> {
    let liquidity = U256::from(state.liquidity);
    let sqrt_price = state.sqrt_price_x96;

    let delta = mul_div(amount_in, q96(), liquidity)?;
    let sqrt_price_next = sqrt_price
        .checked_add(delta)
        .ok_or_else(|| price_overflow(state))?;

    let scaled = mul_div(liquidity, delta, sqrt_price_next)?;
    mul_div(scaled, q96(), sqrt_price)
}

/// Token0 in: the sqrt price moves down to
/// `L * Q96 * sqrt / (L * Q96 + amount * sqrt)`, and the token1 output is
/// `L * (sqrt - sqrt') / Q96`.
fn output_for_token0_in(state: &PoolState, amount_in: U256) -> ServiceResult<U256> {
    let liquidity = U256::from(state.liquidity);
    let sqrt_price = state.sqrt_price_x96;

    // 512-bit intermediates: L * Q96 fits 256 bits, but the denominator sum
    // and the numerator product do not in general.
    let l_q96 = U512::from(liquidity) * U512::from(q96());
    let denominator = l_q96 + U512::from(amount_in) * U512::from(sqrt_price);
    let sqrt_price_next_wide = (l_q96 * U512::from(sqrt_price)) / denominator;

    let limbs = sqrt_price_next_wide.as_limbs();
    if limbs[4..].iter().any(|l| *l != 0) {
        return Err(price_overflow(state));
    }
    let mut low = [0u64; 4];
    low.copy_from_slice(&limbs[..4]);
    let sqrt_price_next = U256::from_limbs(low);

    mul_div(liquidity, sqrt_price - sqrt_price_next, q96())
}

fn price_overflow(state: &PoolState) -> OrchestratorError {
    OrchestratorError::InvalidTradeParameters(format!(
        "trade too large for pool state (sqrt_price={}, liquidity={})",
        state.sqrt_price_x96, state.liquidity
    ))
}
