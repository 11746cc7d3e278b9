// src/store/file.rs
//! JSON-file store (or purely in-memory when no path is given).
//! The whole table is rewritten atomically (tmp file + rename) after each change.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::{PostStore, PostedRecord, StoreHealth};

#[derive(Debug)]
pub struct JsonFileStore {
    rows: RwLock<Vec<PostedRecord>>,
    path: Option<PathBuf>,
}

impl JsonFileStore {
    pub fn in_memory() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            path: None,
        }
    }

    /// Open (or start) a store backed by `path`. A missing file starts empty;
    /// an unreadable one is an error so history is never silently dropped.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let rows = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Vec::new(),
            Ok(bytes) => serde_json::from_slice::<Vec<PostedRecord>>(&bytes)
                .with_context(|| format!("parsing post store {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading post store {}", path.display()))
            }
        };
        tracing::info!(path = %path.display(), rows = rows.len(), "file store opened");
        Ok(Self {
            rows: RwLock::new(rows),
            path: Some(path),
        })
    }

    async fn persist(&self, rows: &[PostedRecord]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let json = serde_json::to_vec_pretty(rows).context("serializing post store")?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PostStore for JsonFileStore {
    async fn exists_by_title(&self, title: &str) -> Result<bool> {
        let rows = self.rows.read().await;
        Ok(rows.iter().any(|r| r.title == title))
    }

    async fn insert_posted(&self, record: &PostedRecord) -> Result<()> {
        let mut rows = self.rows.write().await;
        rows.push(record.clone());
        if let Err(e) = self.persist(&rows).await {
            rows.pop();
            return Err(e);
        }
        Ok(())
    }

    async fn count_all(&self) -> Result<u64> {
        Ok(self.rows.read().await.len() as u64)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|r| r.posted_at >= since).count() as u64)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<PostedRecord>> {
        let mut out = self.rows.read().await.clone();
        out.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        out.truncate(limit);
        Ok(out)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        let kept: Vec<PostedRecord> = rows.iter().filter(|r| r.posted_at >= cutoff).cloned().collect();
        let removed = (before - kept.len()) as u64;
        if removed > 0 {
            self.persist(&kept).await?;
            *rows = kept;
        }
        Ok(removed)
    }

    async fn source_counts(&self) -> Result<BTreeMap<String, u64>> {
        let rows = self.rows.read().await;
        let mut out = BTreeMap::new();
        for r in rows.iter() {
            *out.entry(r.source.clone()).or_insert(0) += 1;
        }
        Ok(out)
    }

    async fn health(&self) -> StoreHealth {
        // A file that vanished while rows are held in memory means writes are going nowhere.
        let empty = self.rows.read().await.is_empty();
        let Some(p) = &self.path else {
            return StoreHealth::healthy(self.backend());
        };
        match tokio::fs::try_exists(p).await {
            Ok(false) if !empty => {
                StoreHealth::unhealthy(self.backend(), format!("{} missing", p.display()))
            }
            Err(e) => StoreHealth::unhealthy(self.backend(), format!("{}: {e}", p.display())),
            _ => StoreHealth::healthy(self.backend()),
        }
    }

    fn backend(&self) -> &'static str {
        if self.path.is_some() {
            "json-file"
        } else {
            "memory"
        }
    }
}
