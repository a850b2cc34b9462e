use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tiledict_core::alphabet::Alphabet;
use tiledict_core::config;
use tiledict_core::storage::{Dictionary, SyncWriteAheadLog};
use tiledict_server::api::create_router;
use tiledict_server::api::handlers::AppState;

struct TestApp {
    base_url: String,
    dictionary: Dictionary,
    seed_running: Arc<AtomicBool>,
    _tmp: TempDir,
}

async fn spawn_app(seed_words: &str) -> TestApp {
    let tmp_dir = TempDir::new().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();
    let seed_file = tmp_dir.path().join("words.txt");
    std::fs::write(&seed_file, seed_words).expect("Failed to write seed file");

    let wal = Arc::new(SyncWriteAheadLog::new(&data_dir).expect("Failed to create WAL"));
    let dictionary = Dictionary::with_wal(Alphabet::polish().clone(), wal);

    let prometheus_handle =
        match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(_) => metrics_exporter_prometheus::PrometheusBuilder::new()
                .build_recorder()
                .handle(),
        };

    let state = AppState::new(dictionary.clone(), data_dir, seed_file, prometheus_handle);
    let seed_running = state.seed_running.clone();

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        base_url,
        dictionary,
        seed_running,
        _tmp: tmp_dir,
    }
}

fn client() -> Client {
    Client::new()
}

async fn seed(app: &TestApp, body: Option<serde_json::Value>) -> reqwest::Response {
    let req = client().post(format!("{}/db/seed", app.base_url));
    let req = match body {
        Some(body) => req.json(&body),
        None => req,
    };
    req.send().await.expect("Failed to seed")
}

async fn validate(app: &TestApp, word: &str, letters: Option<&str>) -> reqwest::Response {
    let mut req = client().get(format!("{}/words/{}/validate", app.base_url, word));
    if let Some(letters) = letters {
        req = req.query(&[("letters", letters)]);
    }
    req.send().await.expect("Failed to validate")
}

fn numbered_words(n: usize) -> String {
    (0..n).map(|i| format!("słowo{i}\n")).collect()
}

#[tokio::test]
async fn health_returns_ok() {
    let app = spawn_app("").await;

    let resp = client()
        .get(format!("{}/health", app.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["entries"], 0);
    assert_eq!(body["alphabet_size"], 35);
    assert_eq!(body["seed_running"], false);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = spawn_app("").await;

    let resp = client()
        .get(format!("{}/health", app.base_url))
        .send()
        .await
        .unwrap();

    let id = resp.headers().get("x-request-id").expect("missing x-request-id");
    assert_eq!(id.to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn caller_request_id_is_echoed() {
    let app = spawn_app("").await;

    let resp = client()
        .get(format!("{}/health", app.base_url))
        .header("x-request-id", "trace-abc-123")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.headers()["x-request-id"], "trace-abc-123");
}

#[tokio::test]
async fn seed_then_validate() {
    let app = spawn_app("kot\npies\nżółw\n").await;

    let resp = seed(&app, None).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["batches_committed"], 1);
    assert_eq!(body["words_inserted"], 3);
    assert_eq!(body["lines_read"], 3);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Seed completed in "));
    assert_eq!(app.dictionary.len(), 3);

    let resp = validate(&app, "kot", Some("tok")).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["word"], "kot");
    assert_eq!(body["valid"], true);
    assert!(body["elapsed_ms"].as_f64().unwrap() >= 0.0);

    let body: serde_json::Value = validate(&app, "pies", Some("tok"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["valid"], false);

    let body: serde_json::Value = validate(&app, "żółw", Some("wółżx"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["valid"], true);
}

#[tokio::test]
async fn validate_unknown_word_is_false_not_error() {
    let app = spawn_app("kot\n").await;
    seed(&app, None).await;

    let resp = validate(&app, "dom", Some("tacocatdom")).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn validate_missing_letters_returns_400() {
    let app = spawn_app("kot\n").await;
    seed(&app, None).await;

    let resp = validate(&app, "kot", None).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("letters"));

    let resp = validate(&app, "kot", Some("")).await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn seed_with_options_resumes_from_batch() {
    let app = spawn_app(&numbered_words(25)).await;

    let resp = seed(
        &app,
        Some(serde_json::json!({ "batch_size": 10, "start_batch": 1 })),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["batches_committed"], 2);
    assert_eq!(body["words_inserted"], 15);
    assert_eq!(body["lines_read"], 25);
    assert!(app.dictionary.get_by_word("słowo9").is_none());
    assert!(app.dictionary.get_by_word("słowo10").is_some());
}

#[tokio::test]
async fn seed_duplicate_returns_500_with_resume_batch() {
    let app = spawn_app("a\nb\nc\na\nd\n").await;

    let resp = seed(&app, Some(serde_json::json!({ "batch_size": 2 }))).await;
    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["resume_from_batch"], 1);
    assert!(body["error"].as_str().unwrap().contains("duplicate"));

    assert_eq!(app.dictionary.len(), 2);
    assert!(app.dictionary.get_by_word("c").is_none());
    assert!(!app.seed_running.load(Ordering::SeqCst));
}

#[tokio::test]
async fn seed_missing_file_returns_500() {
    let app = spawn_app("").await;
    std::fs::remove_file(app._tmp.path().join("words.txt")).unwrap();

    let resp = seed(&app, None).await;
    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["resume_from_batch"], 0);
}

#[tokio::test]
async fn seed_invalid_options_returns_400() {
    let app = spawn_app("kot\n").await;

    let resp = seed(&app, Some(serde_json::json!({ "batch_size": 0 }))).await;
    assert_eq!(resp.status(), 400);

    let resp = seed(
        &app,
        Some(serde_json::json!({ "batch_size": config::MAX_BATCH_SIZE + 1 })),
    )
    .await;
    assert_eq!(resp.status(), 400);

    let resp = client()
        .post(format!("{}/db/seed", app.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(app.dictionary.is_empty());
}

#[tokio::test]
async fn concurrent_seed_returns_409() {
    let app = spawn_app("kot\n").await;
    app.seed_running.store(true, Ordering::SeqCst);

    let resp = seed(&app, None).await;
    assert_eq!(resp.status(), 409);
    assert!(app.dictionary.is_empty());

    app.seed_running.store(false, Ordering::SeqCst);
    let resp = seed(&app, None).await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn formable_words_lists_in_ingestion_order() {
    let app = spawn_app("tok\nkoty\nkot\nlas\nok\n").await;
    seed(&app, None).await;

    let resp = client()
        .get(format!("{}/words/formable", app.base_url))
        .query(&[("letters", "otk")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["letters"], "otk");
    assert_eq!(body["words"], serde_json::json!(["tok", "kot", "ok"]));
    assert_eq!(body["count"], 3);

    let resp = client()
        .get(format!("{}/words/formable", app.base_url))
        .query(&[("letters", "otk"), ("limit", "1")])
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["words"], serde_json::json!(["tok"]));

    let resp = client()
        .get(format!("{}/words/formable", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn snapshot_writes_file_and_truncates_wal() {
    let app = spawn_app("kot\npies\n").await;
    seed(&app, None).await;
    let wal_size = app.dictionary.wal().unwrap().size_bytes();
    assert!(wal_size > 0);

    let resp = client()
        .post(format!("{}/admin/snapshot", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    assert!(app._tmp.path().join(config::SNAPSHOT_FILE_NAME).exists());
    assert_eq!(app.dictionary.wal().unwrap().size_bytes(), 0);
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let app = spawn_app("kot\n").await;

    let resp = client()
        .get(format!("{}/metrics", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn unknown_route_returns_404_json() {
    let app = spawn_app("").await;

    let resp = client()
        .get(format!("{}/nope", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}
