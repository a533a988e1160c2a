//! EIP-712 signing of [`Order`] records.
//!
//! The domain is `Polymarket CTF Exchange` version `1` on the order's chain, verified by the
//! exchange contract of the standard or neg-risk deployment.

use std::borrow::Cow;

use alloy::dyn_abi::Eip712Domain;
use alloy::signers::Signer;
use alloy::sol_types::SolStruct as _;

use crate::clob::types::{Order, SignedOrder};
use crate::error::Error;
use crate::types::{B256, ChainId, U256};
use crate::{Result, contract_config};

pub const ORDER_NAME: &str = "Polymarket CTF Exchange";
pub const ORDER_VERSION: &str = "1";

/// Domain separator for orders on `chain_id`, settled through the neg-risk exchange when
/// `neg_risk` is set.
pub fn order_domain(chain_id: ChainId, neg_risk: bool) -> Result<Eip712Domain> {
    let exchange = contract_config(chain_id, neg_risk)
        .ok_or_else(|| Error::missing_contract_config(chain_id, neg_risk))?
        .exchange;

    Ok(Eip712Domain {
        name: Some(Cow::Borrowed(ORDER_NAME)),
        version: Some(Cow::Borrowed(ORDER_VERSION)),
        chain_id: Some(U256::from(chain_id)),
        verifying_contract: Some(exchange),
        ..Eip712Domain::default()
    })
}

/// Digest a wallet signs for `order`.
pub fn signing_hash(order: &Order, chain_id: ChainId, neg_risk: bool) -> Result<B256> {
    let domain = order_domain(chain_id, neg_risk)?;
    Ok(order.eip712_signing_hash(&domain))
}

#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        level = "debug",
        skip_all,
        fields(chain_id = chain_id, neg_risk = neg_risk, signer = %signer.address()),
        err(level = "warn")
    )
)]
pub async fn sign_order<S: Signer + ?Sized>(
    signer: &S,
    order: Order,
    chain_id: ChainId,
    neg_risk: bool,
) -> Result<SignedOrder> {
    if order.signer != signer.address() {
        return Err(Error::signing(format!(
            "order signer {} does not match signing key {}",
            order.signer,
            signer.address()
        )));
    }

    let hash = signing_hash(&order, chain_id, neg_risk)?;
    let signature = signer.sign_hash(&hash).await?;

    Ok(SignedOrder::new(order, signature))
}
