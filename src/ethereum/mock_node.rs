//! In-process JSON-RPC node for tests.

use alloy::primitives::U256;
use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub enum Reply {
    Data(Vec<u8>),
    Revert(String),
}

#[derive(Debug, Clone, Default)]
pub struct MockNode {
    chain_id: u64,
    replies: Arc<HashMap<[u8; 4], Reply>>,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockNode {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            ..Default::default()
        }
    }

    /// Answer `eth_call`s whose selector matches `signature` with `reply`.
    pub fn reply(mut self, signature: &str, reply: Reply) -> Self {
        let hash = alloy::primitives::keccak256(signature);
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&hash[..4]);
        Arc::make_mut(&mut self.replies).insert(selector, reply);
        self
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r["method"].as_str().map(str::to_string))
            .collect()
    }

    /// Serve on an ephemeral local port and return the endpoint URL.
    pub async fn spawn(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/", post(handle))
            .with_state(self.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }
}

pub fn words(values: &[U256]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|v| v.to_be_bytes::<32>())
        .collect()
}

async fn handle(State(node): State<MockNode>, Json(request): Json<Value>) -> Json<Value> {
    node.requests.lock().unwrap().push(request.clone());
    let id = request["id"].clone();

    let outcome = match request["method"].as_str() {
        Some("eth_chainId") => Ok(json!(format!("0x{:x}", node.chain_id))),
        Some("eth_call") => eth_call(&node, &request["params"][0]),
        other => Err(json!({
            "code": -32601,
            "message": format!("method not found: {:?}", other),
        })),
    };

    Json(match outcome {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err(error) => json!({ "jsonrpc": "2.0", "id": id, "error": error }),
    })
}

fn eth_call(node: &MockNode, tx: &Value) -> Result<Value, Value> {
    let input = tx["input"]
        .as_str()
        .or_else(|| tx["data"].as_str())
        .unwrap_or("0x");
    let input = hex::decode(input.trim_start_matches("0x")).unwrap_or_default();

    let reply = input
        .get(..4)
        .and_then(|selector| <[u8; 4]>::try_from(selector).ok())
        .and_then(|selector| node.replies.get(&selector));

    match reply {
        Some(Reply::Data(data)) => Ok(json!(format!("0x{}", hex::encode(data)))),
        Some(Reply::Revert(reason)) => Err(json!({
            "code": 3,
            "message": format!("execution reverted: {}", reason),
            "data": "0x",
        })),
        None => Ok(json!("0x")),
    }
}
