//! Order construction and signing for the Polymarket CLOB.
//!
//! The crate turns a trader's intent (side, price, size or notional) into a
//! [`clob::types::SignedOrder`]: it resolves the market's tick size, fee rate, and neg-risk
//! classification, computes integer settlement amounts, optionally prices a market order
//! from order book depth, assembles the EIP-712 `Order` record, and signs it against the
//! exchange contract selected for the chain.
//!
//! Network access is limited to the [`clob::MarketData`] collaborator; submission is
//! delegated to an [`clob::OrderSubmitter`].

pub mod clob;
pub mod config;
pub mod error;
pub mod types;

use phf::phf_map;

use crate::error::Error;
use crate::types::{Address, ChainId, address};

pub type Result<T> = std::result::Result<T, Error>;

/// Polygon mainnet.
pub const POLYGON: ChainId = 137;

/// Polygon Amoy testnet.
pub const AMOY: ChainId = 80002;

/// On-chain contracts an order is settled against for a given chain and risk pool.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractConfig {
    /// Exchange contract; also the EIP-712 verifying contract for orders.
    pub exchange: Address,
    pub collateral: Address,
    pub conditional_tokens: Address,
    /// Only set for neg-risk markets.
    pub neg_risk_adapter: Option<Address>,
}

static CONFIG: phf::Map<ChainId, ContractConfig> = phf_map! {
    137_u64 => ContractConfig {
        exchange: address!("0x4bFb41d5B3570DeFd03C39a9A4D8dE6Bd8B8982E"),
        collateral: address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"),
        conditional_tokens: address!("0x4D97DCd97eC945f40cF65F87097ACe5EA0476045"),
        neg_risk_adapter: None,
    },
    80002_u64 => ContractConfig {
        exchange: address!("0xdFE02Eb6733538f8Ea35D585af8DE5958AD99E40"),
        collateral: address!("0x9c4e1703476e875070ee25b56a58b008cfb8fa78"),
        conditional_tokens: address!("0x69308FB512518e39F9b16112fA8d994F4e2Bf8bB"),
        neg_risk_adapter: None,
    },
};

static NEG_RISK_CONFIG: phf::Map<ChainId, ContractConfig> = phf_map! {
    137_u64 => ContractConfig {
        exchange: address!("0xC5d563A36AE78145C45a50134d48A1215220f80a"),
        collateral: address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"),
        conditional_tokens: address!("0x4D97DCd97eC945f40cF65F87097ACe5EA0476045"),
        neg_risk_adapter: Some(address!("0xd91E80cF2E7be2e162c6513ceD06f1dD0dA35296")),
    },
    80002_u64 => ContractConfig {
        exchange: address!("0xd91E80cF2E7be2e162c6513ceD06f1dD0dA35296"),
        collateral: address!("0x9c4e1703476e875070ee25b56a58b008cfb8fa78"),
        conditional_tokens: address!("0x69308FB512518e39F9b16112fA8d994F4e2Bf8bB"),
        neg_risk_adapter: Some(address!("0xd91E80cF2E7be2e162c6513ceD06f1dD0dA35296")),
    },
};

/// Looks up the contracts for `chain_id`, picking the neg-risk table when `is_neg_risk` is set.
///
/// Returns `None` for chains without a deployment; there is no fallback chain.
#[must_use]
pub fn contract_config(chain_id: ChainId, is_neg_risk: bool) -> Option<&'static ContractConfig> {
    if is_neg_risk {
        NEG_RISK_CONFIG.get(&chain_id)
    } else {
        CONFIG.get(&chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_chains_have_both_tables() {
        for chain_id in [POLYGON, AMOY] {
            let standard = contract_config(chain_id, false).expect("standard config");
            let neg_risk = contract_config(chain_id, true).expect("neg risk config");

            assert_ne!(
                standard.exchange, neg_risk.exchange,
                "neg risk must change the verifying contract on chain {chain_id}"
            );
            assert!(standard.neg_risk_adapter.is_none(), "standard markets have no adapter");
            assert!(neg_risk.neg_risk_adapter.is_some(), "neg risk markets have an adapter");
        }
    }

    #[test]
    fn unknown_chain_has_no_config() {
        assert!(contract_config(0, false).is_none(), "chain 0 is not deployed");
        assert!(contract_config(1, true).is_none(), "mainnet is not deployed");
    }

    #[test]
    fn polygon_exchange_address() {
        let config = contract_config(POLYGON, false).expect("polygon config");
        assert_eq!(
            config.exchange,
            address!("0x4bFb41d5B3570DeFd03C39a9A4D8dE6Bd8B8982E"),
            "polygon CTF exchange"
        );
    }
}
