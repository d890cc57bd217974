//! Key store interface and an in-memory implementation.
//!
//! Real deployments keep keys in a separate daemon; tests and the CLI use
//! [`InMemoryKeyStore`]. Either way, callers only ever hold addresses and
//! ask the store to sign.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::config::PRIVATE_KEY_LENGTH;
use crate::crypto::{Address, Keypair, Signature};
use crate::error::CryptoError;
use crate::transaction::{Authorization, SignedTransaction, Transaction};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyStoreError {
    #[error("no key for {0}")]
    UnknownKey(Address),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Import a 64-byte private key; returns its address.
    async fn import_key(&self, private_key: &[u8]) -> Result<Address, KeyStoreError>;

    async fn export_key(&self, address: &Address) -> Result<[u8; PRIVATE_KEY_LENGTH], KeyStoreError>;

    async fn generate_key(&self) -> Result<Address, KeyStoreError>;

    async fn list_keys(&self) -> Result<Vec<Address>, KeyStoreError>;

    /// Sign raw bytes. Callers supply any domain tag.
    async fn sign(&self, address: &Address, message: &[u8]) -> Result<Signature, KeyStoreError>;

    /// Sign `txn` with the key for `signer`, recording it as the authorizer
    /// when it is not the sender.
    async fn sign_transaction(
        &self,
        txn: &Transaction,
        signer: &Address,
    ) -> Result<SignedTransaction, KeyStoreError> {
        let sig = self.sign(signer, &txn.bytes_to_sign()).await?;
        Ok(SignedTransaction {
            txn: txn.clone(),
            auth: Authorization::Single(sig),
            auth_addr: (signer != txn.sender()).then_some(*signer),
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryKeyStore {
    keys: RwLock<HashMap<Address, Keypair>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, keypair: Keypair) -> Address {
        let address = keypair.address();
        self.keys.write().insert(address, keypair);
        address
    }
}

#[async_trait]
impl KeyStore for InMemoryKeyStore {
    async fn import_key(&self, private_key: &[u8]) -> Result<Address, KeyStoreError> {
        let address = self.insert(Keypair::from_private_key(private_key)?);
        debug!(%address, "imported key");
        Ok(address)
    }

    async fn export_key(&self, address: &Address) -> Result<[u8; PRIVATE_KEY_LENGTH], KeyStoreError> {
        self.keys
            .read()
            .get(address)
            .map(Keypair::private_key)
            .ok_or(KeyStoreError::UnknownKey(*address))
    }

    async fn generate_key(&self) -> Result<Address, KeyStoreError> {
        Ok(self.insert(Keypair::generate()))
    }

    async fn list_keys(&self) -> Result<Vec<Address>, KeyStoreError> {
        let mut keys: Vec<Address> = self.keys.read().keys().copied().collect();
        keys.sort();
        Ok(keys)
    }

    async fn sign(&self, address: &Address, message: &[u8]) -> Result<Signature, KeyStoreError> {
        self.keys
            .read()
            .get(address)
            .map(|kp| kp.sign(message))
            .ok_or(KeyStoreError::UnknownKey(*address))
    }
}
