// tests/publish_x.rs
//
// X (Twitter) publisher against a local mock server.

use crypto_news_bot::config::XCredentials;
use crypto_news_bot::publish::{DryRunPublisher, OAuth1Signer, Publisher, TwitterPublisher};
use regex::Regex;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SIGNED: &str = r#"^OAuth oauth_consumer_key="ck", oauth_nonce="[A-Za-z0-9]{32}", oauth_signature="[A-Za-z0-9%]+", oauth_signature_method="HMAC-SHA1", oauth_timestamp="\d+", oauth_token="at", oauth_version="1.0"$"#;

fn creds(access_token: &str) -> XCredentials {
    XCredentials {
        api_key: "ck".into(),
        api_secret: "cs".into(),
        access_token: access_token.into(),
        access_token_secret: "ats".into(),
    }
}

fn publisher(server: &MockServer, creds: Option<XCredentials>) -> TwitterPublisher {
    TwitterPublisher::new(creds, Duration::from_secs(2))
        .expect("http client")
        .with_base_url(server.uri())
}

#[tokio::test]
async fn publish_returns_post_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(header_regex("authorization", SIGNED))
        .and(body_json(json!({ "text": "Hello #Crypto" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "data": { "id": "1790000000000000001", "text": "Hello #Crypto" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let receipt = publisher(&server, Some(creds("at")))
        .publish("Hello #Crypto")
        .await
        .expect("published");
    assert_eq!(receipt.post_id, "1790000000000000001");
}

#[tokio::test]
async fn signature_covers_method_and_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": "7" } })))
        .mount(&server)
        .await;

    publisher(&server, Some(creds("at")))
        .publish("Signed #Crypto")
        .await
        .expect("published");

    let requests = server.received_requests().await.expect("recording on");
    let sent = requests[0]
        .headers
        .get("authorization")
        .expect("authorization header")
        .to_str()
        .unwrap()
        .to_string();
    let nonce = Regex::new(r#"oauth_nonce="([^"]+)""#).unwrap().captures(&sent).unwrap()[1].to_string();
    let ts: i64 = Regex::new(r#"oauth_timestamp="(\d+)""#).unwrap().captures(&sent).unwrap()[1]
        .parse()
        .unwrap();

    let expected = OAuth1Signer::new(creds("at"))
        .authorization_header("POST", &format!("{}/2/tweets", server.uri()), &[], &nonce, ts)
        .unwrap();
    assert_eq!(sent, expected);
}

#[tokio::test]
async fn accepted_post_without_id_still_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = publisher(&server, Some(creds("at")))
        .publish("Hello #Crypto")
        .await
        .expect("2xx counts as published");
    assert_eq!(receipt.post_id, "");
}

#[tokio::test]
async fn rejected_post_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "detail": "duplicate content" })))
        .mount(&server)
        .await;

    let err = publisher(&server, Some(creds("at")))
        .publish("Hello #Crypto")
        .await
        .unwrap_err();
    assert!(format!("{err}").contains("403"));
}

#[tokio::test]
async fn credentials_check_uses_users_me() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/me"))
        .and(header_regex("authorization", SIGNED))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "42", "username": "bot" } })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert!(publisher(&server, Some(creds("at"))).verify_credentials().await);
    assert!(!publisher(&server, Some(creds("revoked"))).verify_credentials().await);
}

#[tokio::test]
async fn missing_keys_fail_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let p = publisher(&server, None);
    assert!(p.publish("Hello #Crypto").await.is_err());
    assert!(!p.verify_credentials().await);
}

#[tokio::test]
async fn dry_run_never_fails() {
    let p = DryRunPublisher::default();
    assert_eq!(p.publish("a #Crypto").await.unwrap().post_id, "dry-run-1");
    assert_eq!(p.publish("b #Crypto").await.unwrap().post_id, "dry-run-2");
    assert!(p.verify_credentials().await);
}
