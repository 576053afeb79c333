//! RegistryReader and DirectBroadcaster against a mock JSON-RPC node.

use std::sync::Arc;
use std::time::Duration;

use tribunal_arbitration::{
    apply_consensus, sign_verdict, submit_verdict_calldata, DisputeRecord, DisputeStatus,
    EscrowRecord, Outcome, ParsedModelVerdict, SignedTransaction, SignedVerdict, WorkflowVerdict,
};
use tribunal_client::{ChainRpcClient, ClientError};
use tribunal_core::abi::{encode, Token};
use tribunal_core::{keccak256, Address, Bytes32};
use tribunal_crypto::{KeyProvider, LocalKeyProvider};
use tribunal_workflow::{
    Broadcaster, DirectBroadcaster, DisputeSource, RegistryReader, SettlementParams, WorkflowError,
    WorkflowStage,
};
use wiremock::matchers::{body_partial_json, body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OPERATOR_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

fn rpc(server: &MockServer) -> Arc<ChainRpcClient> {
    Arc::new(ChainRpcClient::new(server.uri().parse().unwrap(), Duration::from_secs(5)).unwrap())
}

fn rpc_result(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result,
    }))
}

fn hex0x(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

// ── RegistryReader ──────────────────────────────────────────────────

#[tokio::test]
async fn registry_reader_decodes_dispute_and_escrow() {
    let server = MockServer::start().await;
    let registry = Address([0x5f; 20]);
    let id = keccak256(b"dispute-001");
    let evidence_a = keccak256(b"evidence a");

    let dispute_return = encode(&[Token::Tuple(vec![
        Token::FixedBytes(id),
        Token::Address(Address([0xaa; 20])),
        Token::Address(Address([0xbb; 20])),
        Token::Uint(5_000_000_000_000_000_000),
        Token::Uint(2),
        Token::FixedBytes(evidence_a),
        Token::FixedBytes(Bytes32::ZERO),
        Token::Uint(1_735_600_000),
        Token::String("Short delivery".into()),
    ])]);
    let escrow_return = encode(&[
        Token::Uint(7),
        Token::Uint(9),
        Token::Bool(true),
        Token::Bool(false),
        Token::Bool(false),
    ]);

    Mock::given(method("POST"))
        .and(body_string_contains(hex::encode(DisputeRecord::call_data(&id))))
        .respond_with(rpc_result(serde_json::json!(hex0x(&dispute_return))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains(hex::encode(EscrowRecord::call_data(&id))))
        .respond_with(rpc_result(serde_json::json!(hex0x(&escrow_return))))
        .expect(1)
        .mount(&server)
        .await;

    let reader = RegistryReader::new(rpc(&server), registry);
    let dispute = reader.dispute(&id).await.unwrap();
    assert_eq!(dispute.id, id);
    assert_eq!(dispute.status, DisputeStatus::AwaitingArbitration);
    assert_eq!(dispute.evidence_hash_a, Some(evidence_a));
    assert_eq!(dispute.evidence_hash_b, None);
    assert_eq!(dispute.description, "Short delivery");

    let escrow = reader.escrow(&id).await.unwrap();
    assert_eq!(escrow.total(), 16);
    assert!(escrow.party_a_funded && !escrow.party_b_funded);
}

#[tokio::test]
async fn registry_reader_tags_decode_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(rpc_result(serde_json::json!("0x")))
        .mount(&server)
        .await;

    let reader = RegistryReader::new(rpc(&server), Address([0x5f; 20]));
    let err = reader.dispute(&keccak256(b"x")).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Arbitration {
            stage: WorkflowStage::FetchDispute,
            ..
        }
    ));
}

// ── DirectBroadcaster ───────────────────────────────────────────────

fn signed_verdict(key: &LocalKeyProvider) -> SignedVerdict {
    let votes = [
        ParsedModelVerdict::new("gpt-4o", Outcome::FavorPartyB, 80, "b1"),
        ParsedModelVerdict::new("claude-3-5-sonnet", Outcome::FavorPartyB, 70, "b2"),
        ParsedModelVerdict::new("gemini-1.5-pro", Outcome::FavorPartyA, 65, "a1"),
    ];
    let verdict = WorkflowVerdict::assemble(
        keccak256(b"dispute-001"),
        &apply_consensus(&votes),
        &votes,
        keccak256(b"evidence a"),
        keccak256(b"evidence b"),
        1_735_689_600,
        keccak256(b"run-001"),
    );
    sign_verdict(verdict, key).unwrap()
}

fn params() -> SettlementParams {
    SettlementParams {
        verifier: Address([0xe7; 20]),
        chain_id: 31337,
        gas_limit: 800_000,
        gas_price_pct: 120,
    }
}

async fn mount_nonce_and_gas(server: &MockServer, operator: &Address) {
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "method": "eth_getTransactionCount",
            "params": [operator.to_hex(), "pending"],
        })))
        .respond_with(rpc_result(serde_json::json!("0x7")))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "method": "eth_gasPrice" })))
        .respond_with(rpc_result(serde_json::json!("0x77359400")))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn broadcaster_sends_verified_settlement_transaction() {
    let server = MockServer::start().await;
    let key = Arc::new(LocalKeyProvider::from_hex(OPERATOR_KEY).unwrap());
    let operator = key.address();
    let signed = signed_verdict(&key);
    let node_hash = keccak256(b"node says");

    mount_nonce_and_gas(&server, &operator).await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "method": "eth_sendRawTransaction" })))
        .respond_with(rpc_result(serde_json::json!(node_hash.to_hex())))
        .expect(1)
        .mount(&server)
        .await;

    let broadcaster = DirectBroadcaster::new(rpc(&server), key.clone(), params());
    assert_eq!(broadcaster.broadcast(&signed).await.unwrap(), node_hash);

    let requests = server.received_requests().await.unwrap();
    let raw_hex = requests
        .iter()
        .filter_map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).ok())
        .find(|body| body["method"] == "eth_sendRawTransaction")
        .and_then(|body| body["params"][0].as_str().map(str::to_string))
        .unwrap();
    let raw = hex::decode(raw_hex.trim_start_matches("0x")).unwrap();
    let tx = SignedTransaction::decode(&raw).unwrap();

    assert_eq!(tx.recover_sender().unwrap(), operator);
    let inner = tx.transaction();
    assert_eq!(inner.nonce, 7);
    assert_eq!(inner.gas_price, 2_400_000_000);
    assert_eq!(inner.gas_limit, 800_000);
    assert_eq!(inner.to, Address([0xe7; 20]));
    assert_eq!(inner.value, 0);
    assert_eq!(inner.chain_id, 31337);
    assert_eq!(inner.data, submit_verdict_calldata(&signed));
}

#[tokio::test]
async fn broadcaster_surfaces_rpc_rejection() {
    let server = MockServer::start().await;
    let key = Arc::new(LocalKeyProvider::from_hex(OPERATOR_KEY).unwrap());
    let signed = signed_verdict(&key);

    mount_nonce_and_gas(&server, &key.address()).await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "method": "eth_sendRawTransaction" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 3,
            "error": { "code": -32000, "message": "insufficient funds for gas * price + value" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = DirectBroadcaster::new(rpc(&server), key, params())
        .broadcast(&signed)
        .await
        .unwrap_err();
    match err {
        WorkflowError::Client {
            stage: WorkflowStage::Broadcast,
            source: ClientError::Rpc { method, message, .. },
        } => {
            assert_eq!(method, "eth_sendRawTransaction");
            assert!(message.starts_with("insufficient funds"));
        }
        other => panic!("expected Rpc error, got {other:?}"),
    }
}
