use crate::{ExecClientError, ExecutionClient, ReplayInstruction};
use httpmock::prelude::*;
use serde_json::{json, Value};

fn instruction(timestamp: u64) -> ReplayInstruction {
    ReplayInstruction {
        timestamp,
        gas_limit: 30_000_000,
        base_fee_per_gas: 100_000_000,
        system_txs: vec![],
        raw_txs: vec![],
    }
}

fn client_for(server: &MockServer) -> ExecutionClient {
    ExecutionClient::new(server.base_url().parse().unwrap())
}

/// The exact request body for one chunk, ids increasing by chunk offset.
fn setup_block_request(id: usize, chunk: &[ReplayInstruction]) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "anvil_setupBlock",
        "params": chunk,
    })
}

#[tokio::test]
async fn test_submit_chunks_by_100_in_order() {
    let server = MockServer::start_async().await;
    let instructions: Vec<_> = (0..250).map(instruction).collect();

    let chunk1 = server
        .mock_async(|when, then| {
            when.method(POST).json_body(setup_block_request(1, &instructions[..100]));
            then.status(200).json_body(json!([{ "result": null }]));
        })
        .await;
    let chunk2 = server
        .mock_async(|when, then| {
            when.method(POST).json_body(setup_block_request(101, &instructions[100..200]));
            then.status(200).json_body(json!([{ "result": null }]));
        })
        .await;
    let chunk3 = server
        .mock_async(|when, then| {
            when.method(POST).json_body(setup_block_request(201, &instructions[200..]));
            then.status(200).json_body(json!([{ "result": null }]));
        })
        .await;

    client_for(&server).submit_setup_blocks(&instructions).await.unwrap();

    chunk1.assert_async().await;
    chunk2.assert_async().await;
    chunk3.assert_async().await;
}

#[tokio::test]
async fn test_submit_single_chunk_for_small_batches() {
    let server = MockServer::start_async().await;
    let instructions: Vec<_> = (10..13).map(instruction).collect();

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).json_body(setup_block_request(1, &instructions));
            then.status(200).json_body(json!([{ "result": null }, { "result": null }, { "result": null }]));
        })
        .await;

    client_for(&server).submit_setup_blocks(&instructions).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_batch_error_is_fatal() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!([
                { "result": null },
                { "error": { "code": -32000, "message": "nonce too low" } },
            ]));
        })
        .await;

    let err = client_for(&server).submit_setup_blocks(&[instruction(0), instruction(1)]).await.unwrap_err();
    assert!(!err.is_recoverable());
    match err {
        ExecClientError::Batch { id, error } => {
            assert_eq!(id, 1);
            assert_eq!(error["message"], json!("nonce too low"));
        }
        other => panic!("expected a batch error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_submission_sends_nothing() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!([]));
        })
        .await;

    client_for(&server).submit_setup_blocks(&[]).await.unwrap();
    assert_eq!(mock.hits_async().await, 0);
}
