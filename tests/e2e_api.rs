use serde_json::{json, Value};
use tempfile::TempDir;

mod common;

use common::Server;

fn entitlement(i: usize) -> Value {
    json!({
        "sponsor_name": "AWS",
        "sponsor_external_id": format!("EXTERNAL_ID_{i}"),
        "sponsor_container_id": format!("SPONSOR_CONTAINER_ID_{i}"),
    })
}

#[test]
fn e2e_entitlement_lifecycle() {
    let data_dir = TempDir::new().expect("temp dir");
    let server = Server::start(data_dir.path(), &[]);

    let (status, health) = server.request("GET", "/v1/health", None);
    assert_eq!(status, 200);
    assert_eq!(health["status"], "ok");

    let (status, created) = server.request("POST", "/v1/entitlements/", Some(&entitlement(1)));
    assert_eq!(status, 201, "{created}");
    let id = created["id"].as_str().expect("id").to_string();

    let (status, fetched) = server.request("GET", &format!("/v1/entitlements/{id}"), None);
    assert_eq!(status, 200);
    assert_eq!(fetched, created);

    let (status, updated) = server.request(
        "PATCH",
        &format!("/v1/entitlements/{id}"),
        Some(&json!({"sponsor_name": "GCP"})),
    );
    assert_eq!(status, 200);
    assert_eq!(updated["sponsor_name"], "GCP");
    assert_eq!(updated["sponsor_container_id"], "SPONSOR_CONTAINER_ID_1");

    let (status, missing) = server.request(
        "GET",
        "/v1/entitlements/123e4567-e89b-12d3-a456-426614174000",
        None,
    );
    assert_eq!(status, 404);
    assert!(missing["detail"]
        .as_str()
        .unwrap()
        .contains("123e4567-e89b-12d3-a456-426614174000"));

    let (status, invalid) = server.request(
        "POST",
        "/v1/entitlements",
        Some(&json!({"sponsor_name": "AWS", "sponsor_external_id": "X"})),
    );
    assert_eq!(status, 422);
    assert_eq!(invalid["detail"][0]["loc"], json!(["body", "sponsor_container_id"]));
}

#[test]
fn e2e_data_survives_restart_and_reset_clears_it() {
    let data_dir = TempDir::new().expect("temp dir");

    {
        let server = Server::start(data_dir.path(), &[]);
        for i in 0..10 {
            let (status, _) = server.request("POST", "/v1/entitlements", Some(&entitlement(i)));
            assert_eq!(status, 201);
        }
    }

    {
        let server = Server::start(data_dir.path(), &[]);
        let mut seen = Vec::new();
        for offset in [0, 3, 6, 9] {
            let (status, page) =
                server.request("GET", &format!("/v1/entitlements?limit=3&offset={offset}"), None);
            assert_eq!(status, 200);
            assert_eq!(page["total"], 10);
            for item in page["items"].as_array().unwrap() {
                seen.push(item["sponsor_external_id"].as_str().unwrap().to_string());
            }
        }
        let expected: Vec<_> = (0..10).map(|i| format!("EXTERNAL_ID_{i}")).collect();
        assert_eq!(seen, expected);
    }

    let server = Server::start(data_dir.path(), &["--reset"]);
    let (_, page) = server.request("GET", "/v1/entitlements", None);
    assert_eq!(page["total"], 0);
}

#[test]
fn e2e_custom_prefix() {
    let data_dir = TempDir::new().expect("temp dir");
    let server = Server::start(data_dir.path(), &["--api-prefix", "api/v2/"]);

    let (status, created) = server.request(
        "POST",
        "/api/v2/organizations",
        Some(&json!({"name": "Apple Inc.", "external_id": "EXTERNAL_ID_1"})),
    );
    assert_eq!(status, 201, "{created}");
    assert_eq!(created["currency"], Value::Null);

    let (status, body) = server.request("GET", "/v1/organizations", None);
    assert_eq!(status, 404);
    assert_eq!(body, json!({"detail": "Not Found"}));
}
