use std::{env, path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use reward_core::{units::parse_token_amount, Address, OracleSigner, RewardCatalog};

use crate::SessionStore;

pub(crate) const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4000";
pub(crate) const DEFAULT_DATA_DIR: &str = "./data";
pub(crate) const DEFAULT_JSON_LIMIT_BYTES: usize = 16 * 1024;
pub(crate) const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";
pub(crate) const DEFAULT_ADMIN_MESSAGE: &str = "Admin authentication for quest oracle";

/// Vault deployment the oracle signs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VaultBinding {
    pub(crate) address: Address,
    pub(crate) chain_id: u64,
}

/// Everything read from the environment at startup. The oracle key lives only
/// inside `signer`.
#[derive(Debug)]
pub(crate) struct ServerConfig {
    pub(crate) bind_addr: String,
    pub(crate) data_dir: PathBuf,
    pub(crate) signer: OracleSigner,
    pub(crate) vault: VaultBinding,
    pub(crate) admin_wallets: Vec<Address>,
    pub(crate) cors_origins: Vec<String>,
    pub(crate) catalog: RewardCatalog,
    pub(crate) json_limit: usize,
    pub(crate) http_workers: Option<usize>,
}

impl ServerConfig {
    pub(crate) fn from_env() -> Result<Self> {
        let signer = OracleSigner::from_hex_key(&required_env("ORACLE_PRIVATE_KEY")?)
            .map_err(|err| anyhow!("ORACLE_PRIVATE_KEY: {err}"))?;
        let vault_address = Address::parse(&required_env("VAULT_ADDRESS")?)
            .map_err(|err| anyhow!("VAULT_ADDRESS must be a valid address: {err}"))?;
        let chain_id = required_env("CHAIN_ID")?
            .trim()
            .parse::<u64>()
            .context("CHAIN_ID must be an unsigned integer")?;

        let admin_wallets = parse_admin_wallets(&env::var("ADMIN_WALLETS").unwrap_or_default())?;
        let catalog = parse_catalog(
            env::var("REWARD_CATALOG").ok().as_deref(),
            env::var("DEFAULT_REWARD").ok().as_deref(),
        )?;

        Ok(Self {
            bind_addr: env::var("API_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
            signer,
            vault: VaultBinding {
                address: vault_address,
                chain_id,
            },
            admin_wallets,
            cors_origins: split_list(
                &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
            ),
            catalog,
            json_limit: read_env_usize("JSON_LIMIT_BYTES", DEFAULT_JSON_LIMIT_BYTES),
            http_workers: read_env_optional_usize("HTTP_WORKERS"),
        })
    }
}

/// Shared, read-only after startup; cloned into every worker.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) signer: Arc<OracleSigner>,
    pub(crate) sessions: Arc<SessionStore>,
    pub(crate) catalog: Arc<RewardCatalog>,
    pub(crate) vault: VaultBinding,
    pub(crate) admin_wallets: Arc<Vec<Address>>,
}

impl AppState {
    pub(crate) fn new(config: ServerConfig, sessions: SessionStore) -> Self {
        Self {
            signer: Arc::new(config.signer),
            sessions: Arc::new(sessions),
            catalog: Arc::new(config.catalog),
            vault: config.vault,
            admin_wallets: Arc::new(config.admin_wallets),
        }
    }
}

fn required_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("missing required environment variable: {name}"),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn parse_admin_wallets(value: &str) -> Result<Vec<Address>> {
    split_list(value)
        .iter()
        .map(|wallet| {
            Address::parse(wallet).map_err(|err| anyhow!("invalid admin wallet {wallet}: {err}"))
        })
        .collect()
}

/// `REWARD_CATALOG=celo-basics=0.10,nft-101=0.30` replaces the built-in table;
/// `DEFAULT_REWARD` overrides the fallback for unknown quests.
pub(crate) fn parse_catalog(
    entries: Option<&str>,
    default_reward: Option<&str>,
) -> Result<RewardCatalog> {
    let mut catalog = match entries.map(split_list).filter(|list| !list.is_empty()) {
        None => RewardCatalog::default(),
        Some(list) => {
            let base = RewardCatalog::default().default_reward_wei();
            let mut catalog = RewardCatalog::new(base);
            for entry in list {
                let (quest_id, amount) = entry
                    .split_once('=')
                    .ok_or_else(|| anyhow!("REWARD_CATALOG entry must be id=amount: {entry}"))?;
                let wei = parse_token_amount(amount)
                    .map_err(|err| anyhow!("REWARD_CATALOG entry {quest_id}: {err}"))?;
                catalog = catalog.with_reward(quest_id.trim(), wei);
            }
            catalog
        }
    };

    if let Some(value) = default_reward.filter(|value| !value.trim().is_empty()) {
        let wei = parse_token_amount(value).map_err(|err| anyhow!("DEFAULT_REWARD: {err}"))?;
        let mut rebuilt = RewardCatalog::new(wei);
        for (quest_id, reward) in catalog.entries() {
            rebuilt = rebuilt.with_reward(quest_id, reward);
        }
        catalog = rebuilt;
    }

    Ok(catalog)
}

pub(crate) fn read_env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub(crate) fn read_env_optional_usize(name: &str) -> Option<usize> {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
}
