mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{multipart_upload, MockObjectStore, MockRepoHost, TestApp};
use serde_json::Value;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower::ServiceExt;

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn upload(
    app: &TestApp,
    api_key: &str,
    category: Option<&str>,
    filename: &str,
    content: &[u8],
) -> axum::response::Response {
    let (content_type, body) = multipart_upload(category, filename, content);
    app.router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/tenants/me/files")
                .header(header::AUTHORIZATION, format!("Bearer {}", api_key))
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_first_upload_writes_file_and_provisions_bucket_once() {
    let app = TestApp::new().await;
    let created = app.create_tenant("Acme", "a@x.com").await;
    let api_key = created["api_key"].as_str().unwrap().to_string();

    let res = upload(&app, &api_key, Some("activos_corrientes"), "libro.csv", b"cuenta,monto\n").await;
    assert_eq!(res.status(), StatusCode::OK);
    let receipt = parse_body(res).await;
    assert_eq!(receipt["path"], "activos_corrientes/libro.csv");
    assert_eq!(receipt["bucket_provisioned"], true);

    let files = app.repo_host.files.lock().unwrap().clone();
    assert!(files.iter().any(|f| f.ends_with("activos_corrientes/libro.csv")));
    assert_eq!(app.object_store.create_calls.load(Ordering::SeqCst), 1);

    // Second upload: flag already set, no second provider call.
    let res = upload(&app, &api_key, Some("activos_corrientes"), "libro2.csv", b"x").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(app.object_store.create_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_bucket_failure_never_blocks_the_receipt() {
    let object_store = Arc::new(MockObjectStore::default());
    object_store.fail.store(true, Ordering::SeqCst);
    let app = TestApp::with_mocks(Arc::new(MockRepoHost::default()), object_store.clone()).await;

    let created = app.create_tenant("Panaderia Sur", "sur@pan.com").await;
    let api_key = created["api_key"].as_str().unwrap().to_string();
    assert!(created["api_key"].as_str().unwrap().starts_with("tnt_"));
    assert!(created["repo_url"].as_str().is_some());
    assert_eq!(created["bucket_status"], "pending_first_upload");

    // Storage credentials absent: the write still succeeds, the bucket
    // attempt fails, and the receipt reports it.
    let res = upload(&app, &api_key, Some("activos_corrientes"), "balance.xlsx", b"data").await;
    assert_eq!(res.status(), StatusCode::OK);
    let receipt = parse_body(res).await;
    assert_eq!(receipt["path"], "activos_corrientes/balance.xlsx");
    assert_eq!(receipt["bucket_provisioned"], false);
    assert_eq!(object_store.create_calls.load(Ordering::SeqCst), 1);

    // Still unprovisioned, so the next upload retries.
    let res = upload(&app, &api_key, None, "otro.csv", b"x").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(object_store.create_calls.load(Ordering::SeqCst), 2);

    // Credentials appear: the next upload succeeds and later ones skip.
    object_store.fail.store(false, Ordering::SeqCst);
    let res = upload(&app, &api_key, None, "tercero.csv", b"x").await;
    assert_eq!(parse_body(res).await["bucket_provisioned"], true);
    assert_eq!(object_store.create_calls.load(Ordering::SeqCst), 3);

    let res = upload(&app, &api_key, None, "cuarto.csv", b"x").await;
    assert_eq!(parse_body(res).await["bucket_provisioned"], true);
    assert_eq!(object_store.create_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_empty_filename_rejected_before_any_network_call() {
    let app = TestApp::new().await;
    let created = app.create_tenant("Acme", "a@x.com").await;
    let api_key = created["api_key"].as_str().unwrap().to_string();

    let res = upload(&app, &api_key, Some("activos_corrientes"), "", b"data").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.repo_host.put_calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.object_store.create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_category_defaults_to_uncategorized() {
    let app = TestApp::new().await;
    let created = app.create_tenant("Acme", "a@x.com").await;
    let api_key = created["api_key"].as_str().unwrap().to_string();

    let res = upload(&app, &api_key, None, "notas.txt", b"hola").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["path"], "uncategorized/notas.txt");
}

#[tokio::test]
async fn test_repo_write_failure_fails_the_request_and_skips_bucket() {
    let repo_host = Arc::new(MockRepoHost::default());
    let app = TestApp::with_mocks(repo_host.clone(), Arc::new(MockObjectStore::default())).await;

    let created = app.create_tenant("Acme", "a@x.com").await;
    let api_key = created["api_key"].as_str().unwrap().to_string();

    repo_host.fail_put.store(true, Ordering::SeqCst);
    let res = upload(&app, &api_key, Some("pasivos_corrientes"), "deudas.csv", b"x").await;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    // The repository is the primary record; nothing else happens after a
    // failed write.
    assert_eq!(app.object_store.create_calls.load(Ordering::SeqCst), 0);
    let me = app.state.tenant_repo.list().await.unwrap();
    assert!(!me[0].bucket_provisioned);
}

#[tokio::test]
async fn test_upload_requires_known_api_key() {
    let app = TestApp::new().await;
    app.create_tenant("Acme", "a@x.com").await;

    let res = upload(&app, "tnt_invalid", Some("activos_corrientes"), "a.csv", b"x").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.repo_host.put_calls.load(Ordering::SeqCst), 0);
}
