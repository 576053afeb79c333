//! Direct settlement broadcast.
//!
//! Builds, signs and sends the legacy EIP-155 transaction carrying
//! `submitVerdict(verdict, signature)`. Before sending, the raw bytes are
//! decoded back and the recovered sender compared with the operator
//! address. RPC failures are returned as-is; there is no resubmission and
//! no gas bump.

use std::sync::Arc;

use tribunal_arbitration::{submit_verdict_calldata, LegacyTransaction, SignedTransaction, SignedVerdict};
use tribunal_client::ChainRpcClient;
use tribunal_core::{Address, Bytes32};
use tribunal_crypto::KeyProvider;

use crate::capability::Broadcaster;
use crate::error::WorkflowError;
use crate::stage::WorkflowStage;

/// Chain parameters for the settlement transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementParams {
    /// Contract receiving `submitVerdict`.
    pub verifier: Address,
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Gas limit.
    pub gas_limit: u64,
    /// Multiplier applied to `eth_gasPrice`, in percent.
    pub gas_price_pct: u32,
}

impl SettlementParams {
    /// `network_price * gas_price_pct / 100`, saturating.
    pub fn gas_price(&self, network_price: u128) -> u128 {
        network_price.saturating_mul(u128::from(self.gas_price_pct)) / 100
    }

    /// The unsigned settlement transaction.
    pub fn transaction(&self, signed: &SignedVerdict, nonce: u64, network_price: u128) -> LegacyTransaction {
        LegacyTransaction {
            nonce,
            gas_price: self.gas_price(network_price),
            gas_limit: self.gas_limit,
            to: self.verifier,
            value: 0,
            data: submit_verdict_calldata(signed),
            chain_id: self.chain_id,
        }
    }
}

/// [`Broadcaster`] over JSON-RPC, signing with the operator key.
pub struct DirectBroadcaster {
    rpc: Arc<ChainRpcClient>,
    signer: Arc<dyn KeyProvider>,
    params: SettlementParams,
}

impl DirectBroadcaster {
    pub fn new(rpc: Arc<ChainRpcClient>, signer: Arc<dyn KeyProvider>, params: SettlementParams) -> Self {
        Self { rpc, signer, params }
    }
}

#[async_trait::async_trait]
impl Broadcaster for DirectBroadcaster {
    async fn broadcast(&self, signed: &SignedVerdict) -> Result<Bytes32, WorkflowError> {
        let stage = WorkflowStage::Broadcast;
        let operator = self.signer.address();

        let (nonce, network_price) = tokio::try_join!(
            self.rpc.transaction_count(&operator),
            self.rpc.gas_price(),
        )
        .map_err(WorkflowError::client(stage))?;

        let tx = self
            .params
            .transaction(signed, nonce, network_price)
            .sign(self.signer.as_ref())
            .map_err(WorkflowError::arbitration(stage))?;

        let recovered = SignedTransaction::decode(tx.raw())
            .and_then(|decoded| decoded.recover_sender())
            .map_err(WorkflowError::arbitration(stage))?;
        if recovered != operator {
            return Err(WorkflowError::SenderMismatch {
                expected: operator,
                recovered,
            });
        }

        let tx_hash = self
            .rpc
            .send_raw_transaction(tx.raw())
            .await
            .map_err(WorkflowError::client(stage))?;
        if tx_hash != tx.hash() {
            tracing::warn!(
                expected = %tx.hash(),
                reported = %tx_hash,
                "node reported a different transaction hash"
            );
        }
        tracing::info!(
            dispute_id = %signed.verdict().dispute_id,
            tx_hash = %tx_hash,
            nonce,
            gas_price = tx.transaction().gas_price,
            operator = %operator,
            "settlement transaction broadcast"
        );
        Ok(tx_hash)
    }
}
