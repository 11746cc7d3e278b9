// src/publish/oauth1.rs
//! OAuth 1.0a request signing (HMAC-SHA1), as the X API expects for
//! user-context calls made with long-lived app and access keys.
//!
//! JSON bodies are not part of the signature; only the oauth fields and any
//! query or form parameters are.

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distr::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

use crate::config::XCredentials;

/// Everything except RFC 3986 unreserved characters gets escaped.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn encode(s: &str) -> String {
    utf8_percent_encode(s, UNRESERVED).to_string()
}

fn nonce() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// `METHOD&url&params`, each part percent-encoded, params sorted by key then value.
pub fn signature_base(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut pairs: Vec<(String, String)> = params.iter().map(|(k, v)| (encode(k), encode(v))).collect();
    pairs.sort();
    let joined = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}&{}&{}", method.to_ascii_uppercase(), encode(url), encode(&joined))
}

#[derive(Debug, Clone)]
pub struct OAuth1Signer {
    creds: XCredentials,
}

impl OAuth1Signer {
    pub fn new(creds: XCredentials) -> Self {
        Self { creds }
    }

    /// `Authorization` value for a request without extra parameters,
    /// using a fresh nonce and the current time.
    pub fn authorize(&self, method: &str, url: &str) -> Result<String> {
        self.authorization_header(method, url, &[], &nonce(), chrono::Utc::now().timestamp())
    }

    /// Deterministic form of `authorize`. `params` are the request's query or
    /// form parameters, which take part in the signature but not the header.
    pub fn authorization_header(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String> {
        let timestamp = timestamp.to_string();
        let oauth = [
            ("oauth_consumer_key", self.creds.api_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_token", self.creds.access_token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let mut all: Vec<(&str, &str)> = oauth.to_vec();
        all.extend_from_slice(params);
        let signature = self.sign(&signature_base(method, url, &all))?;

        let mut fields: Vec<(&str, &str)> = oauth.to_vec();
        fields.push(("oauth_signature", signature.as_str()));
        fields.sort_by(|a, b| a.0.cmp(b.0));
        let fields = fields
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {fields}"))
    }

    fn sign(&self, base: &str) -> Result<String> {
        let key = format!(
            "{}&{}",
            encode(&self.creds.api_secret),
            encode(&self.creds.access_token_secret)
        );
        let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
            .map_err(|e| anyhow!("hmac key rejected: {e}"))?;
        mac.update(base.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}
