//! Node client interface.
//!
//! The library never talks to a network itself. Anything that does (an
//! HTTP client, a test double) implements [`NodeClient`], and the rest of
//! the crate works in terms of the values it returns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::encoding;
use crate::transaction::SignedTransaction;

/// Fee and validity suggestion from a node, consumed by
/// [`crate::transaction::TransactionBuilder::from_params`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedParams {
    /// Per-byte rate, or the exact fee when `flat_fee` is set.
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: Option<[u8; 32]>,
    pub flat_fee: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub last_round: u64,
    pub time_since_last_round_ms: u64,
    pub catchup_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("node unavailable: {0}")]
    Unavailable(String),

    #[error("node rejected transaction: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn suggested_params(&self) -> Result<SuggestedParams, ClientError>;

    /// Submit raw signed bytes (one encoding, or several concatenated for a
    /// group). Returns the id of the first transaction.
    async fn submit(&self, signed: &[u8]) -> Result<String, ClientError>;

    async fn status(&self) -> Result<NodeStatus, ClientError>;

    async fn submit_transaction(&self, stx: &SignedTransaction) -> Result<String, ClientError> {
        debug!(txid = %stx.id_string(), "submitting transaction");
        self.submit(&encoding::encode(stx)).await
    }

    /// Submit a whole group in one call.
    async fn submit_group(&self, group: &[SignedTransaction]) -> Result<String, ClientError> {
        let mut bytes = Vec::new();
        for stx in group {
            bytes.extend(encoding::encode(stx));
        }
        debug!(members = group.len(), "submitting group");
        self.submit(&bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Address, Keypair};
    use crate::transaction::{PaymentFields, TransactionBuilder};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        submitted: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl NodeClient for RecordingClient {
        async fn suggested_params(&self) -> Result<SuggestedParams, ClientError> {
            Ok(SuggestedParams {
                fee: 0,
                first_valid: 1_000,
                last_valid: 2_000,
                genesis_id: "devnet-v1".to_string(),
                genesis_hash: Some([7; 32]),
                flat_fee: false,
            })
        }

        async fn submit(&self, signed: &[u8]) -> Result<String, ClientError> {
            let stx: Vec<SignedTransaction> =
                encoding::decode_stream(signed).map_err(|e| ClientError::Rejected(e.to_string()))?;
            self.submitted.lock().push(signed.to_vec());
            Ok(stx[0].id_string())
        }

        async fn status(&self) -> Result<NodeStatus, ClientError> {
            Ok(NodeStatus::default())
        }
    }

    #[tokio::test]
    async fn builds_from_suggested_params_and_submits() {
        let client = RecordingClient::default();
        let kp = Keypair::from_seed(&[3; 32]);
        let params = client.suggested_params().await.unwrap();
        let stx = TransactionBuilder::from_params(kp.address(), &params)
            .payment(PaymentFields::new(Address::new([4; 32]), 10))
            .build()
            .unwrap()
            .sign(&kp);

        let id = client.submit_transaction(&stx).await.unwrap();
        assert_eq!(id, stx.id_string());
        assert_eq!(client.submitted.lock().len(), 1);
    }

    #[tokio::test]
    async fn group_is_sent_as_one_payload() {
        let client = RecordingClient::default();
        let kp = Keypair::from_seed(&[3; 32]);
        let params = client.suggested_params().await.unwrap();
        let txns: Vec<_> = (1..=2u64)
            .map(|amt| {
                TransactionBuilder::from_params(kp.address(), &params)
                    .payment(PaymentFields::new(Address::new([4; 32]), amt))
                    .build()
                    .unwrap()
            })
            .collect();
        let grouped = crate::transaction::assign_group_id(&txns).unwrap();
        let signed: Vec<_> = grouped.iter().map(|t| t.sign(&kp)).collect();

        client.submit_group(&signed).await.unwrap();
        let sent = client.submitted.lock();
        assert_eq!(sent.len(), 1);
        let back: Vec<SignedTransaction> = encoding::decode_stream(&sent[0]).unwrap();
        assert_eq!(back, signed);
    }
}
