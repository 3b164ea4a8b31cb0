//! Seeded well-known signatures
//!
//! The common ERC-20 / WETH / DEX router entry points resolve locally so a
//! typical swap decodes without ever touching the registry. Selectors and
//! topic hashes are computed from the canonical signatures at startup.

use super::schema::{EventSchema, FunctionSchema};

pub fn seeded_functions() -> Vec<FunctionSchema> {
    let table: &[(&str, &[&str])] = &[
        // ERC-20
        ("transfer(address,uint256)", &["to", "amount"]),
        ("approve(address,uint256)", &["spender", "amount"]),
        (
            "transferFrom(address,address,uint256)",
            &["from", "to", "amount"],
        ),
        ("balanceOf(address)", &["owner"]),
        // WETH
        ("deposit()", &[]),
        ("withdraw(uint256)", &["wad"]),
        // Uniswap V2-style routers
        (
            "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
            &["amountIn", "amountOutMin", "path", "to", "deadline"],
        ),
        (
            "swapTokensForExactTokens(uint256,uint256,address[],address,uint256)",
            &["amountOut", "amountInMax", "path", "to", "deadline"],
        ),
        (
            "swapExactETHForTokens(uint256,address[],address,uint256)",
            &["amountOutMin", "path", "to", "deadline"],
        ),
        (
            "swapETHForExactTokens(uint256,address[],address,uint256)",
            &["amountOut", "path", "to", "deadline"],
        ),
        (
            "swapExactTokensForETH(uint256,uint256,address[],address,uint256)",
            &["amountIn", "amountOutMin", "path", "to", "deadline"],
        ),
        (
            "swapTokensForExactETH(uint256,uint256,address[],address,uint256)",
            &["amountOut", "amountInMax", "path", "to", "deadline"],
        ),
        (
            "addLiquidity(address,address,uint256,uint256,uint256,uint256,address,uint256)",
            &[
                "tokenA",
                "tokenB",
                "amountADesired",
                "amountBDesired",
                "amountAMin",
                "amountBMin",
                "to",
                "deadline",
            ],
        ),
        (
            "addLiquidityETH(address,uint256,uint256,uint256,address,uint256)",
            &[
                "token",
                "amountTokenDesired",
                "amountTokenMin",
                "amountETHMin",
                "to",
                "deadline",
            ],
        ),
        (
            "removeLiquidity(address,address,uint256,uint256,uint256,address,uint256)",
            &[
                "tokenA",
                "tokenB",
                "liquidity",
                "amountAMin",
                "amountBMin",
                "to",
                "deadline",
            ],
        ),
        (
            "removeLiquidityETH(address,uint256,uint256,uint256,address,uint256)",
            &[
                "token",
                "liquidity",
                "amountTokenMin",
                "amountETHMin",
                "to",
                "deadline",
            ],
        ),
        // Uniswap V3 router
        (
            "exactInputSingle((address,address,uint24,address,uint256,uint256,uint256,uint160))",
            &["params"],
        ),
        (
            "exactInput((bytes,address,uint256,uint256,uint256))",
            &["params"],
        ),
        ("multicall(bytes[])", &["data"]),
        // Aave-style lending pools
        (
            "deposit(address,uint256,address,uint16)",
            &["asset", "amount", "onBehalfOf", "referralCode"],
        ),
        (
            "supply(address,uint256,address,uint16)",
            &["asset", "amount", "onBehalfOf", "referralCode"],
        ),
        (
            "withdraw(address,uint256,address)",
            &["asset", "amount", "to"],
        ),
        (
            "borrow(address,uint256,uint256,uint16,address)",
            &["asset", "amount", "interestRateMode", "referralCode", "onBehalfOf"],
        ),
        (
            "repay(address,uint256,uint256,address)",
            &["asset", "amount", "rateMode", "onBehalfOf"],
        ),
        (
            "flashLoan(address,address[],uint256[],uint256[],address,bytes,uint16)",
            &[
                "receiverAddress",
                "assets",
                "amounts",
                "modes",
                "onBehalfOf",
                "params",
                "referralCode",
            ],
        ),
    ];

    table
        .iter()
        .filter_map(|(signature, names)| FunctionSchema::parse_named(signature, names).ok())
        .collect()
}

pub fn seeded_events() -> Vec<EventSchema> {
    let table: &[(&str, &[&str], &[bool])] = &[
        (
            "Transfer(address,address,uint256)",
            &["from", "to", "value"],
            &[true, true, false],
        ),
        (
            "Approval(address,address,uint256)",
            &["owner", "spender", "value"],
            &[true, true, false],
        ),
        // Uniswap V2 pair
        (
            "Swap(address,uint256,uint256,uint256,uint256,address)",
            &[
                "sender",
                "amount0In",
                "amount1In",
                "amount0Out",
                "amount1Out",
                "to",
            ],
            &[true, false, false, false, false, true],
        ),
        (
            "Sync(uint112,uint112)",
            &["reserve0", "reserve1"],
            &[false, false],
        ),
        (
            "Mint(address,uint256,uint256)",
            &["sender", "amount0", "amount1"],
            &[true, false, false],
        ),
        (
            "Burn(address,uint256,uint256,address)",
            &["sender", "amount0", "amount1", "to"],
            &[true, false, false, true],
        ),
        // WETH
        ("Deposit(address,uint256)", &["dst", "wad"], &[true, false]),
        (
            "Withdrawal(address,uint256)",
            &["src", "wad"],
            &[true, false],
        ),
    ];

    table
        .iter()
        .filter_map(|(signature, names, indexed)| EventSchema::parse(signature, names, indexed).ok())
        .collect()
}
