use crate::solana::PublicKey;

/// The closed set of failures the adapter reports to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum WalletErrorKind {
    #[error("The wallet is not ready")]
    NotReady,
    #[error("The wallet refused or failed to connect")]
    ConnectionFailed,
    #[error("The wallet did not provide an account")]
    AccountUnavailable,
    #[error("The wallet provided a malformed public key")]
    PublicKeyMalformed,
    #[error("The wallet is not connected")]
    NotConnected,
    #[error("Failed to send the transaction")]
    SendTransactionFailed,
    #[error("Failed to sign the transaction")]
    SignTransactionFailed,
    #[error("Failed to sign the message")]
    SignMessageFailed,
    #[error("Failed to disconnect the wallet")]
    DisconnectionFailed,
    /// The wallet dropped the session without the application asking for it.
    #[error("The wallet disconnected unexpectedly")]
    UnexpectedDisconnect,
}

/// Error returned (and emitted) by every operation of the
/// [`WalletAdapter`](crate::WalletAdapter).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}{}", detail(.message))]
pub struct WalletError {
    pub kind: WalletErrorKind,
    pub message: String,
    #[source]
    pub cause: Option<ErrorCause>,
}

fn detail(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(": {message}")
    }
}

impl WalletError {
    pub fn new(kind: WalletErrorKind) -> Self {
        Self {
            kind,
            message: String::new(),
            cause: None,
        }
    }

    /// classify the given cause as `kind`, keeping its message
    pub fn with_cause(kind: WalletErrorKind, cause: impl Into<ErrorCause>) -> Self {
        let cause = cause.into();
        Self {
            kind,
            message: cause.to_string(),
            cause: Some(cause),
        }
    }

    pub fn kind(&self) -> WalletErrorKind {
        self.kind
    }
}

impl From<WalletErrorKind> for WalletError {
    fn from(kind: WalletErrorKind) -> Self {
        Self::new(kind)
    }
}

/// The underlying failure a [`WalletError`] was classified from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorCause {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Numeric codes used by injected Solana wallets when they reject a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum ProviderErrorCode {
    #[error("The user rejected the request.")]
    UserRejected,
    #[error("The requested method and/or account has not been authorized by the user.")]
    Unauthorized,
    #[error("The wallet does not support the requested method.")]
    UnsupportedMethod,
    #[error("The wallet is disconnected.")]
    Disconnected,
    #[error("Missing or invalid parameters.")]
    InvalidInput,
    #[error("The requested resource is not available.")]
    ResourceUnavailable,
    #[error("The transaction was rejected.")]
    TransactionRejected,
    #[error("The method does not exist.")]
    MethodNotFound,
    #[error("An error occured within the wallet.")]
    InternalError,
    #[error("Unknown error code `{0}'")]
    Unknown(i64),
}

impl From<i64> for ProviderErrorCode {
    fn from(code: i64) -> Self {
        match code {
            4001 => Self::UserRejected,
            4100 => Self::Unauthorized,
            4200 => Self::UnsupportedMethod,
            4900 => Self::Disconnected,
            -32000 => Self::InvalidInput,
            -32002 => Self::ResourceUnavailable,
            -32003 => Self::TransactionRejected,
            -32601 => Self::MethodNotFound,
            -32603 => Self::InternalError,
            unknown => Self::Unknown(unknown),
        }
    }
}

/// Rejection value of one of the injected wallet's primitives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, serde::Deserialize)]
#[error("{message}")]
pub struct ProviderError {
    #[serde(default)]
    pub code: Option<ProviderErrorCode>,
    #[serde(default)]
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum KeyError {
    #[error("Invalid base58 encoding: {0}")]
    InvalidBase58(String),
    #[error("Invalid length, expected {expected} bytes but received {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("Invalid public key input: {0}")]
    UnsupportedInput(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum TransactionError {
    #[error("Transaction recent blockhash required")]
    MissingRecentBlockhash,
    #[error("Transaction fee payer required")]
    MissingFeePayer,
    #[error("Cannot sign with non signer key {0}")]
    UnknownSigner(PublicKey),
    #[error("Transaction has {slots} signature slots for {signers} signers")]
    SignatureSlotsMismatch { signers: usize, slots: usize },
    #[error("Signer {public_key} failed: {reason}")]
    Signer {
        public_key: PublicKey,
        reason: String,
    },
}

/// Failure of the application's RPC [`Connection`](crate::solana::Connection).
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
#[error("{0}")]
pub struct ConnectionError(pub String);

impl<'de> serde::Deserialize<'de> for ProviderErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;
        impl serde::de::Visitor<'_> for Visitor {
            type Value = ProviderErrorCode;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "Expecting an integer ProviderErrorCode")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ProviderErrorCode::from(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                i64::try_from(v)
                    .map(ProviderErrorCode::from)
                    .map_err(|_| E::custom(format!("error code `{v}' out of range")))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
                    Ok(ProviderErrorCode::from(v as i64))
                } else {
                    Err(E::custom(format!("error code `{v}' is not an integer")))
                }
            }
        }

        deserializer.deserialize_i64(Visitor)
    }
}
