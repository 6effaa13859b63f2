use crate::error::KeyError;
use std::{fmt, str::FromStr};

macro_rules! base58_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn to_bytes(&self) -> [u8; $len] {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name))
                    .field(&bs58::encode(self.as_ref()).into_string())
                    .finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", bs58::encode(self.as_ref()).into_string())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = KeyError;

            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                <[u8; $len]>::try_from(bytes)
                    .map(Self)
                    .map_err(|_| KeyError::InvalidLength {
                        expected: $len,
                        actual: bytes.len(),
                    })
            }
        }

        impl FromStr for $name {
            type Err = KeyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = bs58::decode(s)
                    .into_vec()
                    .map_err(|error| KeyError::InvalidBase58(error.to_string()))?;
                Self::try_from(bytes.as_slice())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let encoded = String::deserialize(deserializer)?;
                encoded.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

base58_bytes!(
    /// An ed25519 account address, displayed in base58.
    PublicKey,
    32
);
base58_bytes!(
    /// Hash of a recent block, a transaction is only valid for a short while
    /// after it.
    Blockhash,
    32
);
base58_bytes!(
    /// An ed25519 signature. The signature of a transaction's fee payer is
    /// also the transaction identifier.
    Signature,
    64
);

/// The account identity as the wallet hands it over.
///
/// Injected wallets are not consistent in how they represent the public key:
/// some give the base58 string, some an object that can be turned into bytes
/// and some a plain object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletIdentity {
    Base58(String),
    Bytes(Vec<u8>),
    Raw(serde_json::Value),
}

impl TryFrom<&WalletIdentity> for PublicKey {
    type Error = KeyError;

    fn try_from(identity: &WalletIdentity) -> Result<Self, Self::Error> {
        match identity {
            WalletIdentity::Base58(encoded) => encoded.parse(),
            WalletIdentity::Bytes(bytes) => PublicKey::try_from(bytes.as_slice()),
            WalletIdentity::Raw(value) => from_raw(value),
        }
    }
}

fn from_raw(value: &serde_json::Value) -> Result<PublicKey, KeyError> {
    use serde_json::Value;

    match value {
        Value::String(encoded) => encoded.parse(),
        Value::Array(elements) => {
            let bytes = elements
                .iter()
                .map(|element| {
                    element
                        .as_u64()
                        .and_then(|byte| u8::try_from(byte).ok())
                        .ok_or_else(|| KeyError::UnsupportedInput(format!("{element}")))
                })
                .collect::<Result<Vec<u8>, _>>()?;
            PublicKey::try_from(bytes.as_slice())
        }
        // a serialized `PublicKey` may come back as its inner byte buffer
        Value::Object(map) if map.len() == 1 => match map.values().next() {
            Some(inner @ Value::Array(_)) => from_raw(inner),
            _ => Err(KeyError::UnsupportedInput(value.to_string())),
        },
        _ => Err(KeyError::UnsupportedInput(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

    #[test]
    fn public_key_base58() {
        let key: PublicKey = KEY.parse().unwrap();
        assert_eq!(key.to_string(), KEY);
        assert_eq!(
            "11111111111111111111111111111111".parse::<PublicKey>().unwrap(),
            PublicKey::new([0; 32])
        );
    }

    #[test]
    fn public_key_invalid() {
        assert!(matches!(
            "not base58 0OIl".parse::<PublicKey>(),
            Err(KeyError::InvalidBase58(_))
        ));
        assert_eq!(
            PublicKey::try_from([1u8; 31].as_slice()),
            Err(KeyError::InvalidLength {
                expected: 32,
                actual: 31
            })
        );
    }

    #[test]
    fn identity_forms_normalize_to_the_same_key() {
        let key: PublicKey = KEY.parse().unwrap();
        let bytes = key.to_bytes().to_vec();

        let from_string = PublicKey::try_from(&WalletIdentity::Base58(KEY.to_owned())).unwrap();
        let from_bytes = PublicKey::try_from(&WalletIdentity::Bytes(bytes.clone())).unwrap();
        let from_raw_array = PublicKey::try_from(&WalletIdentity::Raw(json!(bytes))).unwrap();
        let from_raw_object =
            PublicKey::try_from(&WalletIdentity::Raw(json!({ "_bn": bytes }))).unwrap();
        let from_raw_string = PublicKey::try_from(&WalletIdentity::Raw(json!(KEY))).unwrap();

        assert_eq!(from_string, key);
        assert_eq!(from_bytes, key);
        assert_eq!(from_raw_array, key);
        assert_eq!(from_raw_object, key);
        assert_eq!(from_raw_string, key);
    }

    #[test]
    fn identity_malformed() {
        assert!(PublicKey::try_from(&WalletIdentity::Raw(json!({ "a": 1, "b": 2 }))).is_err());
        assert!(PublicKey::try_from(&WalletIdentity::Raw(json!([1, 2, 300]))).is_err());
        assert!(PublicKey::try_from(&WalletIdentity::Raw(json!(null))).is_err());
    }

    #[test]
    fn signature_serde() {
        let signature = Signature::new([7; 64]);
        let json = serde_json::to_value(signature).unwrap();
        assert_eq!(json, json!(signature.to_string()));
        assert_eq!(serde_json::from_value::<Signature>(json).unwrap(), signature);
    }
}
