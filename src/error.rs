use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use reqwest::{Method, StatusCode};

use crate::clob::types::{Side, TickSize};
use crate::types::{ChainId, Decimal, U256};

/// Broad category of an [`Error`]. Use [`Error::downcast_ref`] to reach the concrete condition.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Order arguments or market constraints rejected the order.
    Validation,
    /// The order book cannot price or fill the order.
    Liquidity,
    /// The operation needs a signing key and none is configured.
    Auth,
    /// Key parsing, signing, or signature recovery failed.
    Signing,
    /// A collaborator answered with a non-success HTTP status.
    Status,
    /// Transport or decoding failures.
    Internal,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    #[must_use]
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Returns the concrete condition behind this error, e.g. [`FeeRateMismatch`].
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.as_deref()?.downcast_ref::<E>()
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Validation {
            reason: message.into(),
        }
        .into()
    }

    pub fn signing<S: Into<String>>(message: S) -> Self {
        Signing {
            reason: message.into(),
        }
        .into()
    }

    pub fn status<S: Into<String>>(
        status_code: StatusCode,
        method: Method,
        path: String,
        message: S,
    ) -> Self {
        Status {
            status_code,
            method,
            path,
            message: message.into(),
        }
        .into()
    }

    #[must_use]
    pub fn missing_contract_config(chain_id: ChainId, neg_risk: bool) -> Self {
        MissingContractConfig { chain_id, neg_risk }.into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{:?}: {source}", self.kind),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid: {}", self.reason)
    }
}

/// No signing key is configured.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthLevel;

impl fmt::Display for AuthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a signing key is required to create orders")
    }
}

/// The requested tick size is finer than the market allows.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTickSize {
    pub requested: TickSize,
    pub minimum: TickSize,
}

impl fmt::Display for InvalidTickSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid tick size ({}), minimum for the market is {}",
            self.requested, self.minimum
        )
    }
}

/// Price is outside `[min, max]` or not a multiple of the tick size.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPrice {
    pub price: Decimal,
    pub tick_size: TickSize,
    pub min: Decimal,
    pub max: Decimal,
}

impl fmt::Display for InvalidPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "price ({}) must be a multiple of {}, min: {} - max: {}",
            self.price, self.tick_size, self.min, self.max
        )
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSide {
    pub side: String,
}

impl fmt::Display for InvalidSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "side must be BUY or SELL, got {}", self.side)
    }
}

/// The tick size has no rounding configuration.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedTickSize {
    pub tick_size: String,
}

impl fmt::Display for UnsupportedTickSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported tick size: {}", self.tick_size)
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRateMismatch {
    pub user: u32,
    pub market: u32,
}

impl fmt::Display for FeeRateMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid user provided fee rate: ({}), fee rate for the market must be {}",
            self.user, self.market
        )
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingContractConfig {
    pub chain_id: ChainId,
    pub neg_risk: bool,
}

impl fmt::Display for MissingContractConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "missing contract config for chain id {} with neg_risk = {}",
            self.chain_id, self.neg_risk
        )
    }
}

/// Both sides of the book are empty.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoOrderBook {
    pub token_id: U256,
}

impl fmt::Display for NoOrderBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no orderbook for {}", self.token_id)
    }
}

/// The side of the book an order would execute against is empty.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoMatchingLiquidity {
    pub token_id: U256,
    pub side: Side,
}

impl fmt::Display for NoMatchingLiquidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no opposing orders to match a {} for {}",
            self.side, self.token_id
        )
    }
}

/// The book cannot fill the full amount of a fill-or-kill order.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientLiquidity {
    pub token_id: U256,
    pub requested: Decimal,
    pub available: Decimal,
}

impl fmt::Display for InsufficientLiquidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insufficient liquidity to fill {} for {}, book depth covers {}",
            self.requested, self.token_id, self.available
        )
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signing {
    pub reason: String,
}

impl fmt::Display for Signing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signing failed: {}", self.reason)
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub status_code: StatusCode,
    pub method: Method,
    pub path: String,
    pub message: String,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error({}) making {} call to {} with {}",
            self.status_code, self.method, self.path, self.message
        )
    }
}

macro_rules! impl_error {
    ($($source:ty => $kind:ident),+ $(,)?) => {
        $(
            impl StdError for $source {}

            impl From<$source> for Error {
                fn from(err: $source) -> Self {
                    Error::with_source(Kind::$kind, err)
                }
            }
        )+
    };
}

impl_error! {
    Validation => Validation,
    AuthLevel => Auth,
    InvalidTickSize => Validation,
    InvalidPrice => Validation,
    InvalidSide => Validation,
    UnsupportedTickSize => Validation,
    FeeRateMismatch => Validation,
    MissingContractConfig => Validation,
    NoOrderBook => Liquidity,
    NoMatchingLiquidity => Liquidity,
    InsufficientLiquidity => Liquidity,
    Signing => Signing,
    Status => Status,
}

impl From<alloy::signers::Error> for Error {
    fn from(err: alloy::signers::Error) -> Self {
        Error::with_source(Kind::Signing, err)
    }
}

impl From<alloy::primitives::SignatureError> for Error {
    fn from(err: alloy::primitives::SignatureError) -> Self {
        Error::with_source(Kind::Signing, err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::with_source(Kind::Internal, err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(Kind::Internal, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(Kind::Internal, err)
    }
}
