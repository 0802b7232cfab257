// crates/chitfund-daemon/tests/integration.rs
//
// End-to-end tests for the chit fund daemon stack.
//
// Exercises the registry, draw engine, import, RPC dispatcher, and both
// store backends together. The daemon is a binary crate with no lib.rs,
// so these tests wire the library crates the same way main.rs does.

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use uuid::Uuid;

use chitfund_core::crypto::generate_secret;
use chitfund_core::error::ChitError;
use chitfund_core::fund::FundConfig;
use chitfund_core::member::MemberDetails;
use chitfund_core::member_id::is_valid_member_id;
use chitfund_engine::{import_members, DrawMode, FundRegistry};
use chitfund_rpc::{FundRpcServer, JsonRpcRequest, RpcConfig, SessionManager};
use chitfund_store::{InMemoryStore, RocksStore};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a temporary directory path using UUID to avoid conflicts.
fn temp_db_path(label: &str) -> String {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("chitfund_test_{}_{}", label, Uuid::now_v7()));
    path.to_string_lossy().to_string()
}

fn memory_registry(seed: u64) -> FundRegistry {
    let store = Arc::new(InMemoryStore::new());
    FundRegistry::new(store.clone(), store).with_rng(StdRng::seed_from_u64(seed))
}

fn details(i: usize) -> MemberDetails {
    MemberDetails {
        name: format!("Member {}", i),
        mobile: format!("98{:08}", i),
        email: format!("m{}@example.com", i),
        location: "Agra".to_string(),
        national_id: format!("{:012}", i),
    }
}

async fn fund_with_members(
    registry: &FundRegistry,
    total_members: u32,
    monthly_amount: u64,
    roster: usize,
) -> Uuid {
    let ids = if roster == 0 {
        Vec::new()
    } else {
        registry
            .create_members((0..roster).map(details).collect())
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.member_id)
            .collect()
    };
    let fund = registry
        .create_fund(
            FundConfig {
                name: format!("{}K Group", monthly_amount / 1000),
                total_members,
                draw_day: 10,
                monthly_amount,
            },
            ids,
        )
        .await
        .unwrap();
    fund.id
}

fn rpc_server() -> FundRpcServer {
    let store = Arc::new(InMemoryStore::new());
    let registry = Arc::new(
        FundRegistry::new(store.clone(), store.clone()).with_rng(StdRng::seed_from_u64(7)),
    );
    let sessions = Arc::new(SessionManager::new(generate_secret(), 24));
    FundRpcServer::new(RpcConfig::default(), registry, store, sessions)
}

async fn call(server: &FundRpcServer, token: Option<&str>, method: &str, params: Value) -> (u16, Value) {
    let out = server
        .call(
            JsonRpcRequest {
                method: method.to_string(),
                params,
            },
            token,
        )
        .await;
    (out.response.code, out.response.result.unwrap_or(Value::Null))
}

async fn login(server: &FundRpcServer, username: &str, password: &str) -> String {
    let (code, result) = call(
        server,
        None,
        "auth/login",
        json!({"username": username, "password": password}),
    )
    .await;
    assert_eq!(code, 200, "login as {} failed", username);
    result["token"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Draw scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_three_winner_draw_on_full_fund() {
    let registry = memory_registry(1);
    let fund_id = fund_with_members(&registry, 200, 50_000, 200).await;

    let outcome = registry.draw(&fund_id, DrawMode::Three).await.unwrap();

    assert_eq!(outcome.winners.len(), 3);
    assert!(outcome.winners.iter().all(|w| w.amount == 2_500_000));
    let total: u64 = outcome.winners.iter().map(|w| w.amount).sum();
    assert_eq!(total, 7_500_000);
    assert_eq!(outcome.remaining_members, 197);

    let distinct: HashSet<_> = outcome.winners.iter().map(|w| &w.member_id).collect();
    assert_eq!(distinct.len(), 3);

    let fund = registry.get_fund(&fund_id).await.unwrap();
    assert_eq!(fund.active_members.len(), 197);
    assert_eq!(fund.winner_history.len(), 3);
    for w in &outcome.winners {
        assert!(!fund.active_members.contains(&w.member_id));
    }
}

#[tokio::test]
async fn test_single_draws_never_reselect() {
    let registry = memory_registry(2);
    let fund_id = fund_with_members(&registry, 5, 10_000, 5).await;

    let mut seen = HashSet::new();
    for round in 0..5 {
        let outcome = registry.draw(&fund_id, DrawMode::Single).await.unwrap();
        assert_eq!(outcome.winners.len(), 1);
        assert_eq!(outcome.winners[0].amount, 10_000);
        assert_eq!(outcome.remaining_members, 4 - round);
        assert!(seen.insert(outcome.winners[0].member_id.clone()));
    }

    let err = registry.draw(&fund_id, DrawMode::Single).await.unwrap_err();
    assert!(matches!(err, ChitError::InsufficientMembers { .. }));
}

#[tokio::test]
async fn test_roster_of_two() {
    let registry = memory_registry(3);
    let fund_id = fund_with_members(&registry, 20, 5_000, 2).await;

    let err = registry.draw(&fund_id, DrawMode::Three).await.unwrap_err();
    assert!(matches!(
        err,
        ChitError::InsufficientMembers {
            required: 3,
            available: 2
        }
    ));
    // A failed draw leaves the fund untouched.
    assert_eq!(registry.get_fund(&fund_id).await.unwrap().active_members.len(), 2);

    let outcome = registry.draw(&fund_id, DrawMode::Single).await.unwrap();
    assert_eq!(outcome.remaining_members, 1);
}

#[tokio::test]
async fn test_schedule_tracks_progress() {
    let registry = memory_registry(4);
    let fund_id = fund_with_members(&registry, 200, 50_000, 200).await;

    let before = registry.schedule(&fund_id).await.unwrap();
    assert_eq!(before.rows.len(), 67);
    assert_eq!(before.completed_rounds, 0);
    assert_eq!(before.rows.last().unwrap().remaining_participants, 2);

    registry.draw(&fund_id, DrawMode::Single).await.unwrap();
    let after = registry.schedule(&fund_id).await.unwrap();
    assert_eq!(after.completed_rounds, 1);
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

const CSV: &str = "Name,Mobile,Email,Location,Aadhar\n\
Asha,9800000001,asha@example.com,Agra,111122223333\n\
Ravi,9800000002,ravi@example.com,Mathura,222233334444\n\
Meena,9800000003,meena@example.com,Agra,333344445555\n";

#[tokio::test]
async fn test_import_twice_yields_distinct_ids() {
    let registry = memory_registry(5);
    let fund_id = fund_with_members(&registry, 20, 10_000, 0).await;

    let first = import_members(&registry, CSV, &[fund_id]).await.unwrap();
    let second = import_members(&registry, CSV, &[fund_id]).await.unwrap();
    assert_eq!(first.count, 3);
    assert_eq!(second.count, 3);
    assert!(first.warnings.is_empty());

    let ids: HashSet<String> = first
        .members
        .iter()
        .chain(second.members.iter())
        .map(|m| m.member_id.clone())
        .collect();
    assert_eq!(ids.len(), 6);
    assert!(ids.iter().all(|id| is_valid_member_id(id)));

    let fund = registry.get_fund(&fund_id).await.unwrap();
    assert_eq!(fund.active_members.len(), 6);
}

#[tokio::test]
async fn test_import_reports_missing_fund() {
    let registry = memory_registry(6);
    let missing = Uuid::now_v7();

    let report = import_members(&registry, CSV, &[missing]).await.unwrap();
    assert_eq!(report.count, 3);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains(&missing.to_string()));
    assert_eq!(registry.list_members().await.unwrap().len(), 3);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_rocks_state_survives_reopen() {
    let path = temp_db_path("reopen");

    let (fund_id, winner) = {
        let store = Arc::new(RocksStore::open(&path).unwrap());
        let registry = FundRegistry::new(store.clone(), store.clone())
            .with_rng(StdRng::seed_from_u64(8));
        let fund_id = fund_with_members(&registry, 10, 2_000, 4).await;
        let outcome = registry.draw(&fund_id, DrawMode::Single).await.unwrap();
        store.flush().unwrap();
        (fund_id, outcome.winners[0].member_id.clone())
    };

    let store = Arc::new(RocksStore::open(&path).unwrap());
    let registry = FundRegistry::new(store.clone(), store.clone());
    let fund = registry.get_fund(&fund_id).await.unwrap();
    assert_eq!(fund.active_members.len(), 3);
    assert_eq!(fund.winner_history.len(), 1);
    assert_eq!(fund.winner_history[0].member_id, winner);
    assert_eq!(registry.list_members().await.unwrap().len(), 4);

    drop(registry);
    drop(store);
    let _ = std::fs::remove_dir_all(&path);
}

// ---------------------------------------------------------------------------
// RPC dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_rpc_role_enforcement() {
    let server = rpc_server();

    let (code, _) = call(
        &server,
        None,
        "auth/bootstrap",
        json!({"username": "owner", "password": "s3cret", "name": "Owner"}),
    )
    .await;
    assert_eq!(code, 200);

    // A second bootstrap is refused.
    let (code, _) = call(
        &server,
        None,
        "auth/bootstrap",
        json!({"username": "other", "password": "x", "name": "Other"}),
    )
    .await;
    assert_eq!(code, 409);

    let root = login(&server, "owner", "s3cret").await;

    let (code, _) = call(
        &server,
        Some(&root),
        "users/create",
        json!({"username": "clerk", "password": "pw", "name": "Clerk", "role": "user"}),
    )
    .await;
    assert_eq!(code, 200);

    let clerk = login(&server, "clerk", "pw").await;

    // Users may read but not write.
    let (code, _) = call(&server, Some(&clerk), "funds/list", json!({})).await;
    assert_eq!(code, 200);
    let (code, _) = call(
        &server,
        Some(&clerk),
        "funds/create",
        json!({"name": "X", "total_members": 10, "draw_day": 5, "monthly_amount": 1000}),
    )
    .await;
    assert_eq!(code, 403);
    let (code, _) = call(&server, Some(&clerk), "admin/purge", json!({"scope": "all"})).await;
    assert_eq!(code, 403);

    // Logging out invalidates the token.
    let (code, _) = call(&server, Some(&clerk), "auth/logout", json!({})).await;
    assert_eq!(code, 200);
    let (code, _) = call(&server, Some(&clerk), "funds/list", json!({})).await;
    assert_eq!(code, 401);
}

#[tokio::test]
async fn test_rpc_fund_lifecycle() {
    let server = rpc_server();
    call(
        &server,
        None,
        "auth/bootstrap",
        json!({"username": "owner", "password": "pw", "name": "Owner"}),
    )
    .await;
    let token = login(&server, "owner", "pw").await;
    let t = Some(token.as_str());

    let mut ids = Vec::new();
    for i in 0..4 {
        let d = details(i);
        let (code, member) = call(&server, t, "members/create", serde_json::to_value(&d).unwrap()).await;
        assert_eq!(code, 200);
        ids.push(member["member_id"].as_str().unwrap().to_string());
    }

    let (code, fund) = call(
        &server,
        t,
        "funds/create",
        json!({
            "name": "10K Group",
            "total_members": 10,
            "draw_day": 15,
            "monthly_amount": 10000,
            "member_ids": ids,
        }),
    )
    .await;
    assert_eq!(code, 200);
    let fund_id = fund["id"].as_str().unwrap().to_string();

    let (code, drawn) = call(&server, t, "draw/three", json!({"fund_id": fund_id})).await;
    assert_eq!(code, 200);
    assert_eq!(drawn["winners"].as_array().unwrap().len(), 3);
    assert_eq!(drawn["remaining_members"], 1);
    // round(10 * 10000 / 4)
    assert_eq!(drawn["winners"][0]["amount"], 25000);

    let (code, _) = call(&server, t, "draw/three", json!({"fund_id": fund_id})).await;
    assert_eq!(code, 400);

    let winner_id = drawn["winners"][0]["member_id"].as_str().unwrap().to_string();
    let (code, found) = call(&server, t, "search/member", json!({"member_id": winner_id})).await;
    assert_eq!(code, 200);
    assert_eq!(found["found"], true);
    assert_eq!(found["winning_history"].as_array().unwrap().len(), 1);

    let (code, ledger) = call(&server, t, "ledger/list", json!({})).await;
    assert_eq!(code, 200);
    assert_eq!(ledger["entries"].as_array().unwrap().len(), 3);
    assert_eq!(ledger["total_paid"], 75000);

    let (code, counts) = call(&server, t, "admin/counts", json!({})).await;
    assert_eq!(code, 200);
    assert_eq!(counts["members"], 4);
    assert_eq!(counts["funds"], 1);
    assert_eq!(counts["total_winners"], 3);

    let (code, _) = call(&server, t, "admin/purge", json!({"scope": "winners"})).await;
    assert_eq!(code, 200);
    let (_, counts) = call(&server, t, "admin/counts", json!({})).await;
    assert_eq!(counts["total_winners"], 0);

    let (code, _) = call(&server, t, "funds/delete", json!({"fund_id": fund_id})).await;
    assert_eq!(code, 200);
    let (code, _) = call(&server, t, "funds/get", json!({"fund_id": fund_id})).await;
    assert_eq!(code, 404);
}

// ---------------------------------------------------------------------------
// HTTP transport
// ---------------------------------------------------------------------------

/// Find a free local port by binding to port 0.
fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_http_round_trip_with_cookie() {
    let port = free_port();
    let store = Arc::new(InMemoryStore::new());
    let registry = Arc::new(FundRegistry::new(store.clone(), store.clone()));
    let sessions = Arc::new(SessionManager::new(generate_secret(), 24));
    let server = FundRpcServer::new(
        RpcConfig {
            host: "127.0.0.1".to_string(),
            port,
        },
        registry,
        store,
        sessions,
    );

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        server
            .start_with_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
            .map_err(|e| e.to_string())
    });

    let url = format!("http://127.0.0.1:{}/chitfund.rpc.FundService/Call", port);
    let client = reqwest::Client::new();

    // Wait for the listener.
    let mut ready = false;
    for _ in 0..50 {
        if tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            ready = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert!(ready, "server did not start");

    let post = |body: Value, token: Option<String>| {
        let mut req = client.post(&url).json(&body);
        if let Some(t) = token {
            req = req.header("Cookie", format!("session={}", t));
        }
        req.send()
    };

    let resp = post(
        json!({"method": "auth/bootstrap", "params": {"username": "owner", "password": "pw", "name": "Owner"}}),
        None,
    )
    .await
    .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);

    let resp = post(
        json!({"method": "auth/login", "params": {"username": "owner", "password": "pw"}}),
        None,
    )
    .await
    .unwrap();
    let cookie = resp
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.contains("HttpOnly"));
    let body: Value = resp.json().await.unwrap();
    let token = body["result"]["token"].as_str().unwrap().to_string();

    let body: Value = post(json!({"method": "admin/counts"}), Some(token))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["code"], 200);
    assert_eq!(body["result"]["members"], 0);

    let body: Value = post(json!({"method": "admin/counts"}), None)
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], 401);

    let _ = stop_tx.send(());
    handle.await.unwrap().unwrap();
}
