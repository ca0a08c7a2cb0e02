use alloy::sol;

// Smart contract ABI definitions, fixed and versioned (Safe v1.3.0,
// Uniswap V3, WETH9).
sol! {
    /// Minimal ERC20 interface: balance reporting plus the approval needed
    /// ahead of a router swap.
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string memory);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Wrapped-native-asset interface. `deposit` wraps the attached native
    /// value into the token; everything else goes through [`IERC20`].
    #[sol(rpc)]
    interface IWETH9 {
        function deposit() external payable;
    }

    /// Uniswap V3 pool state reads. `slot0` carries the current sqrt price
    /// and tick; `liquidity` is the in-range liquidity.
    #[sol(rpc)]
    interface IUniswapV3Pool {
        function slot0() external view returns (
            uint160 sqrtPriceX96,
            int24 tick,
            uint16 observationIndex,
            uint16 observationCardinality,
            uint16 observationCardinalityNext,
            uint8 feeProtocol,
            bool unlocked
        );

        function liquidity() external view returns (uint128);
    }

    /// Uniswap V3 SwapRouter, exact-input single-hop only.
    #[sol(rpc)]
    interface ISwapRouter {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 deadline;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }

        function exactInputSingle(ExactInputSingleParams calldata params)
            external
            payable
            returns (uint256 amountOut);
    }

    /// Safe smart-contract wallet (v1.3.0).
    #[sol(rpc)]
    interface ISafe {
        /// One-time initializer invoked through the proxy at deployment.
        function setup(
            address[] calldata _owners,
            uint256 _threshold,
            address to,
            bytes calldata data,
            address fallbackHandler,
            address paymentToken,
            uint256 payment,
            address payable paymentReceiver
        ) external;

        /// Executes a wallet transaction once `signatures` satisfies the
        /// owner threshold. `operation` is 0 for call, 1 for delegatecall.
        function execTransaction(
            address to,
            uint256 value,
            bytes calldata data,
            uint8 operation,
            uint256 safeTxGas,
            uint256 baseGas,
            uint256 gasPrice,
            address gasToken,
            address payable refundReceiver,
            bytes memory signatures
        ) external payable returns (bool success);
    }

    /// Safe proxy factory. CREATE2 deployment keyed on the initializer hash
    /// and a caller-chosen salt nonce.
    #[sol(rpc)]
    interface ISafeProxyFactory {
        function createProxyWithNonce(
            address _singleton,
            bytes memory initializer,
            uint256 saltNonce
        ) external returns (address proxy);
    }

    /// MultiSendCallOnly: executes a packed batch of plain calls, reverting
    /// as a unit if any sub-call reverts.
    #[sol(rpc)]
    interface IMultiSend {
        function multiSend(bytes memory transactions) external payable;
    }
}
