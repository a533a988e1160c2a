use std::str::FromStr as _;
use std::time::Duration;

use alloy::signers::Signer as _;
use alloy::signers::local::PrivateKeySigner;
use secrecy::{ExposeSecret as _, SecretString};

use crate::Result;
use crate::clob::types::SignatureType;
use crate::contract_config;
use crate::error::{Error, Kind};
use crate::types::{Address, ChainId};

/// Raw signing values typically passed from app-level bot config.
#[derive(Clone, Debug, Default)]
pub struct RawSigningConfig {
    pub private_key: Option<SecretString>,
    /// `0|eoa`, `1|proxy`, or `2|gnosis|safe`.
    pub signature_type: String,
    /// Proxy wallet address; empty when the signer trades for itself.
    pub funder: String,
}

/// Validated engine configuration.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub chain_id: ChainId,
    pub private_key: Option<SecretString>,
    pub signature_type: SignatureType,
    pub funder: Option<Address>,
    /// Lifetime of cached market parameters; `None` keeps them until invalidated.
    pub cache_ttl: Option<Duration>,
}

impl EngineConfig {
    pub fn from_raw(chain_id: ChainId, raw: RawSigningConfig) -> Result<Self> {
        let signature_type = SignatureType::parse(&raw.signature_type)?;
        let funder = match raw.funder.trim() {
            "" => None,
            funder => Some(
                Address::from_str(funder)
                    .map_err(|e| Error::validation(format!("invalid funder address: {e}")))?,
            ),
        };

        Self::new(chain_id, raw.private_key, signature_type, funder)
    }

    pub fn new(
        chain_id: ChainId,
        private_key: Option<SecretString>,
        signature_type: SignatureType,
        funder: Option<Address>,
    ) -> Result<Self> {
        if contract_config(chain_id, false).is_none() {
            return Err(Error::missing_contract_config(chain_id, false));
        }

        let config = Self {
            chain_id,
            private_key,
            signature_type,
            funder,
            cache_ttl: None,
        };
        let signer = config.signer()?;
        validate_funder(
            signature_type,
            funder,
            signer.as_ref().map(PrivateKeySigner::address),
        )?;

        Ok(config)
    }

    #[must_use]
    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = Some(cache_ttl);
        self
    }

    /// Parses the signing key, bound to this chain.
    pub fn signer(&self) -> Result<Option<PrivateKeySigner>> {
        self.private_key
            .as_ref()
            .map(|key| {
                PrivateKeySigner::from_str(key.expose_secret())
                    .map(|signer| signer.with_chain_id(Some(self.chain_id)))
                    .map_err(|e| Error::with_source(Kind::Signing, e))
            })
            .transpose()
    }
}

/// Checks that `funder` is usable with `signature_type`.
///
/// An EOA trades for itself, so its only acceptable funder is the signer's own address.
/// Proxy and Safe wallets need a non-zero funder.
pub(crate) fn validate_funder(
    signature_type: SignatureType,
    funder: Option<Address>,
    signer: Option<Address>,
) -> Result<()> {
    match signature_type {
        SignatureType::Eoa => {
            if funder.is_some_and(|funder| signer.is_some_and(|signer| signer != funder)) {
                return Err(Error::validation(
                    "Cannot have a funder address with an Eoa signature type",
                ));
            }
        }
        SignatureType::Proxy | SignatureType::GnosisSafe => {
            if funder.is_none_or(|funder| funder == Address::ZERO) {
                return Err(Error::validation(
                    "Cannot have a zero funder address with a proxy signature type",
                ));
            }
        }
    }

    Ok(())
}
