mod common;

use std::time::Duration;

use common::{build_session, seed_session};
use healthpass::fetch::{FetchOptions, Fetcher};
use mockito::Server;

const ALICE: &str = r#"{"id":1,"username":"alice","roles":["ROLE_STUDENT"],"token":"t1"}"#;

/// A second fetch for the same key within the expiry window is served from
/// the cache without a network call.
#[tokio::test]
async fn test_repeat_fetch_served_from_cache() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/api/dashboard")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"pending": 3}"#)
        .expect(1)
        .create_async()
        .await;

    let (manager, _storage) = build_session(&server.url());
    let fetcher = Fetcher::new(manager);
    let options = FetchOptions::default();

    let first = fetcher
        .fetch("/api/dashboard", &options)
        .await
        .expect("fetch should succeed");
    let second = fetcher
        .fetch("/api/dashboard", &options)
        .await
        .expect("fetch should succeed");
    m.assert_async().await;

    assert!(!first.was_cached);
    assert!(second.was_cached);
    assert_eq!(first.value, second.value);
    assert_eq!(second.value["pending"], 3);
}

/// skip_cache bypasses the cache in both directions: every call hits the
/// network and nothing is stored for later calls.
#[tokio::test]
async fn test_skip_cache_never_reads_or_writes() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/api/checkups")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"items": []}"#)
        .expect(3)
        .create_async()
        .await;

    let (manager, _storage) = build_session(&server.url());
    let fetcher = Fetcher::new(manager);
    let skipping = FetchOptions {
        skip_cache: true,
        ..Default::default()
    };

    let first = fetcher
        .fetch("/api/checkups", &skipping)
        .await
        .expect("fetch should succeed");
    let second = fetcher
        .fetch("/api/checkups", &skipping)
        .await
        .expect("fetch should succeed");
    assert!(!first.was_cached);
    assert!(!second.was_cached);

    // The skipping calls stored nothing: a normal fetch still goes out.
    let third = fetcher
        .fetch("/api/checkups", &FetchOptions::default())
        .await
        .expect("fetch should succeed");
    m.assert_async().await;
    assert!(!third.was_cached);
}

/// force_refresh always issues a network call and replaces the stored
/// value.
#[tokio::test]
async fn test_force_refresh_always_hits_network() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/api/vaccinations")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"doses": 2}"#)
        .expect(2)
        .create_async()
        .await;

    let (manager, _storage) = build_session(&server.url());
    let fetcher = Fetcher::new(manager);

    let first = fetcher
        .fetch("/api/vaccinations", &FetchOptions::default())
        .await
        .expect("fetch should succeed");
    let refreshed = fetcher
        .refetch("/api/vaccinations", &FetchOptions::default())
        .await
        .expect("refetch should succeed");
    let cached = fetcher
        .fetch("/api/vaccinations", &FetchOptions::default())
        .await
        .expect("fetch should succeed");
    m.assert_async().await;

    assert!(!first.was_cached);
    assert!(!refreshed.was_cached);
    assert!(cached.was_cached);
}

/// An entry older than its cache_expiry is refetched from the network.
#[tokio::test]
async fn test_expired_entry_is_refetched() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/api/medications")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"requests": 1}"#)
        .expect(2)
        .create_async()
        .await;

    let (manager, _storage) = build_session(&server.url());
    let fetcher = Fetcher::new(manager);
    let options = FetchOptions {
        cache_expiry: Some(Duration::from_millis(40)),
        ..Default::default()
    };

    let first = fetcher
        .fetch("/api/medications", &options)
        .await
        .expect("fetch should succeed");
    tokio::time::sleep(Duration::from_millis(80)).await;
    let second = fetcher
        .fetch("/api/medications", &options)
        .await
        .expect("fetch should succeed");
    m.assert_async().await;

    assert!(!first.was_cached);
    assert!(!second.was_cached);
}

/// clear_cache evicts exactly the named key; other entries stay served
/// from cache.
#[tokio::test]
async fn test_clear_cache_evicts_single_key() {
    let mut server = Server::new_async().await;
    let students = server
        .mock("GET", "/api/students")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"count": 12}"#)
        .expect(2)
        .create_async()
        .await;
    let nurses = server
        .mock("GET", "/api/nurses")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"count": 2}"#)
        .expect(1)
        .create_async()
        .await;

    let (manager, _storage) = build_session(&server.url());
    let fetcher = Fetcher::new(manager);
    let options = FetchOptions::default();

    fetcher
        .fetch("/api/students", &options)
        .await
        .expect("fetch should succeed");
    fetcher
        .fetch("/api/nurses", &options)
        .await
        .expect("fetch should succeed");

    fetcher.clear_cache("/api/students");

    let students_again = fetcher
        .fetch("/api/students", &options)
        .await
        .expect("fetch should succeed");
    let nurses_again = fetcher
        .fetch("/api/nurses", &options)
        .await
        .expect("fetch should succeed");
    students.assert_async().await;
    nurses.assert_async().await;

    assert!(!students_again.was_cached);
    assert!(nurses_again.was_cached);
}

/// A custom cache_key is honored: a different URL with the same key is
/// served from the cache without its own network call.
#[tokio::test]
async fn test_custom_cache_key_shared_between_urls() {
    let mut server = Server::new_async().await;
    let first_url = server
        .mock("GET", "/api/declarations?page=1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"page": 1}"#)
        .expect(1)
        .create_async()
        .await;
    let second_url = server
        .mock("GET", "/api/declarations?page=2")
        .expect(0)
        .create_async()
        .await;

    let (manager, _storage) = build_session(&server.url());
    let fetcher = Fetcher::new(manager);
    let options = FetchOptions {
        cache_key: Some("declarations".to_string()),
        ..Default::default()
    };

    let first = fetcher
        .fetch("/api/declarations?page=1", &options)
        .await
        .expect("fetch should succeed");
    let second = fetcher
        .fetch("/api/declarations?page=2", &options)
        .await
        .expect("fetch should succeed");
    first_url.assert_async().await;
    second_url.assert_async().await;

    assert!(!first.was_cached);
    assert!(second.was_cached);
    assert_eq!(second.value["page"], 1);
}

/// A 401 through the fetcher evicts the session like any other
/// authenticated request.
#[tokio::test]
async fn test_unauthorized_fetch_evicts_session() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/api/records")
        .with_status(401)
        .with_body(r#"{"message": "Token expired"}"#)
        .create_async()
        .await;

    let (manager, storage) = build_session(&server.url());
    seed_session(&storage, "t1", ALICE).await;
    let fetcher = Fetcher::new(manager.clone());

    let error = fetcher
        .fetch("/api/records", &FetchOptions::default())
        .await
        .expect_err("fetch should fail");
    m.assert_async().await;

    assert_eq!(error, "Token expired");
    assert!(!manager.is_authenticated().await);
}
