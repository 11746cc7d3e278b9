// tests/store_supabase.rs
//
// Supabase (PostgREST) store against a local mock server.

use chrono::Utc;
use crypto_news_bot::config::SupabaseConfig;
use crypto_news_bot::store::{collect_stats, PostStore, PostedRecord, SupabaseStore};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TABLE_PATH: &str = "/rest/v1/posted_news";

fn store(server: &MockServer) -> SupabaseStore {
    let cfg = SupabaseConfig {
        url: server.uri(),
        key: "sb-key".into(),
        table: "posted_news".into(),
    };
    SupabaseStore::new(&cfg, Duration::from_secs(2)).expect("http client")
}

#[tokio::test]
async fn title_lookup_is_exact_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(header("apikey", "sb-key"))
        .and(query_param("title", "eq.Bitcoin ETF Approved by Regulator"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 7 }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let s = store(&server);
    assert!(s.exists_by_title("Bitcoin ETF Approved by Regulator").await.unwrap());
    assert!(!s.exists_by_title("Bitcoin ETF approved by regulator").await.unwrap());
}

#[tokio::test]
async fn insert_posts_the_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TABLE_PATH))
        .and(header("Prefer", "return=minimal"))
        .and(body_partial_json(json!([{ "title": "Bitcoin ETF Approved by Regulator", "source": "coingecko" }])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    store(&server)
        .insert_posted(&PostedRecord {
            title: "Bitcoin ETF Approved by Regulator".into(),
            url: "http://x".into(),
            content: "post #Crypto".into(),
            source: "coingecko".into(),
            posted_at: Utc::now(),
        })
        .await
        .expect("insert ok");
}

#[tokio::test]
async fn counts_come_from_content_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(header("Prefer", "count=exact"))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Range", "0-0/12").set_body_json(json!([{ "id": 1 }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("select", "source"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "source": "coingecko" }, { "source": "coingecko" }, { "source": "coinpaprika" }
        ])))
        .mount(&server)
        .await;

    let s = store(&server);
    assert_eq!(s.count_all().await.unwrap(), 12);

    let stats = collect_stats(&s, Utc::now()).await;
    assert_eq!(stats.database, "supabase");
    assert_eq!(stats.total_posts, 12);
    assert_eq!(stats.last_24h_posts, 12);
    assert_eq!(stats.success_rate, 50.0);
    assert_eq!(stats.source_stats["coingecko"], 2);
}

#[tokio::test]
async fn cleanup_counts_returned_rows() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(TABLE_PATH))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }, { "id": 2 }])))
        .mount(&server)
        .await;

    let n = store(&server).delete_older_than(Utc::now()).await.unwrap();
    assert_eq!(n, 2);
}

#[tokio::test]
async fn health_and_stats_degrade_on_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let s = store(&server);
    let h = s.health().await;
    assert!(!h.is_healthy());
    assert!(h.error.unwrap().contains("401"));

    let stats = collect_stats(&s, Utc::now()).await;
    assert_eq!(stats.database, "error");
    assert_eq!(stats.total_posts, 0);
}
