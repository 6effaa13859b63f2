use crate::error::{ConnectionError, TransactionError};
use serde::{Deserialize, Serialize};

mod key;

pub use self::key::{Blockhash, PublicKey, Signature, WalletIdentity};

/// Transaction formats the wallet accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionVersion {
    Legacy,
    #[serde(rename = "0")]
    V0,
}

/// Level of confirmation of the bank state a request is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

/// Options handed over to the wallet's `signAndSendTransaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_preflight: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preflight_commitment: Option<Commitment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_context_slot: Option<u64>,
}

/// [`SendOptions`] plus the extra signers to apply before the wallet signs.
#[derive(Default)]
pub struct SendTransactionOptions<'a> {
    pub signers: Vec<&'a dyn Signer>,
    pub send_options: SendOptions,
}

/// Something able to sign on behalf of a [`PublicKey`], typically a keypair
/// owned by the application (e.g. a freshly generated account).
pub trait Signer {
    fn public_key(&self) -> PublicKey;

    fn try_sign_message(&self, message: &[u8]) -> Result<Signature, String>;
}

fn sign_with(signer: &dyn Signer, message: &[u8]) -> Result<Signature, TransactionError> {
    signer
        .try_sign_message(message)
        .map_err(|reason| TransactionError::Signer {
            public_key: signer.public_key(),
            reason,
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignaturePair {
    pub public_key: PublicKey,
    pub signature: Option<Signature>,
}

/// A legacy transaction. The fee payer and recent blockhash may be left
/// unset, the adapter fills them in before sending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTransaction {
    pub fee_payer: Option<PublicKey>,
    pub recent_blockhash: Option<Blockhash>,
    /// serialized instructions of the message
    pub instructions: Vec<u8>,
    pub signatures: Vec<SignaturePair>,
}

impl LegacyTransaction {
    pub fn new(instructions: impl Into<Vec<u8>>) -> Self {
        Self {
            instructions: instructions.into(),
            ..Self::default()
        }
    }

    /// the bytes every signer of this transaction signs
    pub fn message_data(&self) -> Result<Vec<u8>, TransactionError> {
        let fee_payer = self.fee_payer.ok_or(TransactionError::MissingFeePayer)?;
        let blockhash = self
            .recent_blockhash
            .ok_or(TransactionError::MissingRecentBlockhash)?;

        let mut data = Vec::with_capacity(PublicKey::LEN + Blockhash::LEN + self.instructions.len());
        data.extend_from_slice(fee_payer.as_ref());
        data.extend_from_slice(blockhash.as_ref());
        data.extend_from_slice(&self.instructions);
        Ok(data)
    }

    /// Sign with the given signers, leaving the other signature slots
    /// untouched. The fee payer always owns the first slot.
    pub fn partial_sign(&mut self, signers: &[&dyn Signer]) -> Result<(), TransactionError> {
        let message = self.message_data()?;
        let fee_payer = self.fee_payer.ok_or(TransactionError::MissingFeePayer)?;

        if self.signatures.first().map(|pair| pair.public_key) != Some(fee_payer) {
            self.signatures.retain(|pair| pair.public_key != fee_payer);
            self.signatures.insert(
                0,
                SignaturePair {
                    public_key: fee_payer,
                    signature: None,
                },
            );
        }

        for signer in signers {
            let public_key = signer.public_key();
            let signature = sign_with(*signer, &message)?;

            match self
                .signatures
                .iter_mut()
                .find(|pair| pair.public_key == public_key)
            {
                Some(pair) => pair.signature = Some(signature),
                None => self.signatures.push(SignaturePair {
                    public_key,
                    signature: Some(signature),
                }),
            }
        }

        Ok(())
    }

    pub fn signature(&self, public_key: &PublicKey) -> Option<Signature> {
        self.signatures
            .iter()
            .find(|pair| &pair.public_key == public_key)
            .and_then(|pair| pair.signature)
    }
}

/// A versioned (v0) transaction: its message is already compiled, including
/// the list of the accounts required to sign it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedTransaction {
    pub signer_keys: Vec<PublicKey>,
    pub message: Vec<u8>,
    pub signatures: Vec<Option<Signature>>,
}

impl VersionedTransaction {
    pub fn new(signer_keys: Vec<PublicKey>, message: impl Into<Vec<u8>>) -> Self {
        let signatures = vec![None; signer_keys.len()];
        Self {
            signer_keys,
            message: message.into(),
            signatures,
        }
    }

    pub fn sign(&mut self, signers: &[&dyn Signer]) -> Result<(), TransactionError> {
        if self.signatures.len() != self.signer_keys.len() {
            return Err(TransactionError::SignatureSlotsMismatch {
                signers: self.signer_keys.len(),
                slots: self.signatures.len(),
            });
        }

        for signer in signers {
            let public_key = signer.public_key();
            let Some(index) = self.signer_keys.iter().position(|key| key == &public_key) else {
                return Err(TransactionError::UnknownSigner(public_key));
            };

            self.signatures[index] = Some(sign_with(*signer, &self.message)?);
        }

        Ok(())
    }

    pub fn signature(&self, public_key: &PublicKey) -> Option<Signature> {
        let index = self.signer_keys.iter().position(|key| key == public_key)?;
        self.signatures.get(index).copied().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "version", rename_all = "lowercase")]
pub enum Transaction {
    Legacy(LegacyTransaction),
    #[serde(rename = "0")]
    Versioned(VersionedTransaction),
}

impl Transaction {
    pub fn version(&self) -> TransactionVersion {
        match self {
            Self::Legacy(_) => TransactionVersion::Legacy,
            Self::Versioned(_) => TransactionVersion::V0,
        }
    }

    pub fn is_versioned(&self) -> bool {
        matches!(self, Self::Versioned(_))
    }
}

impl From<LegacyTransaction> for Transaction {
    fn from(transaction: LegacyTransaction) -> Self {
        Self::Legacy(transaction)
    }
}

impl From<VersionedTransaction> for Transaction {
    fn from(transaction: VersionedTransaction) -> Self {
        Self::Versioned(transaction)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockhashConfig {
    pub commitment: Option<Commitment>,
    pub min_context_slot: Option<u64>,
}

/// The application's RPC connection to a Solana cluster.
#[allow(async_fn_in_trait)]
pub trait Connection {
    /// the default commitment of this connection, if any
    fn commitment(&self) -> Option<Commitment>;

    async fn latest_blockhash(&self, config: BlockhashConfig)
    -> Result<Blockhash, ConnectionError>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use cryptoxide::ed25519;

    /// ed25519 keypair backed by cryptoxide
    pub(crate) struct Keypair {
        secret: [u8; 64],
        public: [u8; 32],
    }

    impl Keypair {
        pub(crate) fn from_seed(seed: u8) -> Self {
            let (secret, public) = ed25519::keypair(&[seed; 32]);
            Self { secret, public }
        }
    }

    impl Signer for Keypair {
        fn public_key(&self) -> PublicKey {
            PublicKey::new(self.public)
        }

        fn try_sign_message(&self, message: &[u8]) -> Result<Signature, String> {
            Ok(Signature::new(ed25519::signature(message, &self.secret)))
        }
    }

    struct Broken;

    impl Signer for Broken {
        fn public_key(&self) -> PublicKey {
            PublicKey::new([9; 32])
        }

        fn try_sign_message(&self, _: &[u8]) -> Result<Signature, String> {
            Err("hardware device unplugged".to_owned())
        }
    }

    #[test]
    fn legacy_partial_sign_requires_prepared_fields() {
        let signer = Keypair::from_seed(1);
        let mut transaction = LegacyTransaction::new(vec![1, 2, 3]);

        assert_eq!(
            transaction.partial_sign(&[&signer]),
            Err(TransactionError::MissingFeePayer)
        );

        transaction.fee_payer = Some(PublicKey::new([5; 32]));
        assert_eq!(
            transaction.partial_sign(&[&signer]),
            Err(TransactionError::MissingRecentBlockhash)
        );
    }

    #[test]
    fn legacy_partial_sign() {
        let fee_payer = PublicKey::new([5; 32]);
        let signer = Keypair::from_seed(1);
        let mut transaction = LegacyTransaction {
            fee_payer: Some(fee_payer),
            recent_blockhash: Some(Blockhash::new([8; 32])),
            ..LegacyTransaction::new(vec![1, 2, 3])
        };

        transaction.partial_sign(&[&signer]).unwrap();

        assert_eq!(transaction.signatures.len(), 2);
        assert_eq!(transaction.signatures[0].public_key, fee_payer);
        assert_eq!(transaction.signatures[0].signature, None);

        let signature = transaction.signature(&signer.public_key()).unwrap();
        let message = transaction.message_data().unwrap();
        assert!(ed25519::verify(
            &message,
            &signer.public,
            &signature.to_bytes()
        ));
    }

    #[test]
    fn versioned_sign() {
        let signer = Keypair::from_seed(2);
        let fee_payer = PublicKey::new([5; 32]);
        let mut transaction =
            VersionedTransaction::new(vec![fee_payer, signer.public_key()], vec![4, 5, 6]);

        transaction.sign(&[&signer]).unwrap();

        assert_eq!(transaction.signatures[0], None);
        let signature = transaction.signature(&signer.public_key()).unwrap();
        assert!(ed25519::verify(
            &transaction.message,
            &signer.public,
            &signature.to_bytes()
        ));
    }

    #[test]
    fn versioned_sign_rejects_unknown_signer() {
        let signer = Keypair::from_seed(3);
        let mut transaction = VersionedTransaction::new(vec![PublicKey::new([5; 32])], vec![1]);

        assert_eq!(
            transaction.sign(&[&signer]),
            Err(TransactionError::UnknownSigner(signer.public_key()))
        );
    }

    #[test]
    fn versioned_sign_with_missing_signature_slots() {
        let signer = Keypair::from_seed(4);
        let mut transaction = VersionedTransaction {
            signatures: vec![],
            ..VersionedTransaction::new(vec![signer.public_key()], vec![1])
        };

        assert_eq!(
            transaction.sign(&[&signer]),
            Err(TransactionError::SignatureSlotsMismatch {
                signers: 1,
                slots: 0
            })
        );
        assert!(transaction.signatures.is_empty());
    }

    #[test]
    fn signer_failure() {
        let mut transaction = VersionedTransaction::new(vec![PublicKey::new([9; 32])], vec![1]);

        assert_eq!(
            transaction.sign(&[&Broken]),
            Err(TransactionError::Signer {
                public_key: PublicKey::new([9; 32]),
                reason: "hardware device unplugged".to_owned()
            })
        );
    }

    #[test]
    fn transaction_version() {
        let legacy = Transaction::from(LegacyTransaction::new(vec![]));
        let versioned = Transaction::from(VersionedTransaction::new(vec![], vec![]));

        assert_eq!(legacy.version(), TransactionVersion::Legacy);
        assert!(!legacy.is_versioned());
        assert_eq!(versioned.version(), TransactionVersion::V0);
        assert!(versioned.is_versioned());
    }
}
