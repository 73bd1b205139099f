/// Replay cooldown per (wallet, quest): 24 hours.
pub const COOLDOWN_MS: i64 = 24 * 60 * 60 * 1000;
pub const MS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Anti-bot floor on reported play time.
pub const MIN_DURATION_SECONDS: f64 = 10.0;
/// An 8-card board needs at least 4 moves; more than 200 looks like a stuck loop.
pub const MIN_MOVES: f64 = 4.0;
pub const MAX_MOVES: f64 = 200.0;

pub const TOKEN_DECIMALS: u32 = 18;
pub const WEI_PER_TOKEN: u128 = 10u128.pow(TOKEN_DECIMALS);
/// 0.01 token, the display and catalog granularity.
pub const WEI_PER_CENT: u128 = WEI_PER_TOKEN / 100;

/// Catalog rewards are capped at 10 tokens.
pub const MAX_REWARD_WEI: u128 = 10 * WEI_PER_TOKEN;
/// 0.10 token.
pub const DEFAULT_REWARD_WEI: u128 = 10 * WEI_PER_CENT;

pub const BUILTIN_CATALOG: [(&str, u128); 4] = [
    ("celo-basics", 10 * WEI_PER_CENT),
    ("stablecoins-101", 15 * WEI_PER_CENT),
    ("defi-fundamentals", 20 * WEI_PER_CENT),
    ("security-essentials", 25 * WEI_PER_CENT),
];

pub const PERSONAL_SIGN_PREFIX: &str = "\x19Ethereum Signed Message:\n";

pub const ADDRESS_LEN: usize = 20;
pub const NONCE_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 65;

/// `n / 2` for the secp256k1 group order, big-endian. Signatures with a larger
/// `s` are malleable copies and the vault refuses them.
pub const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];
