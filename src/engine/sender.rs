//! Sender capability: where extracted documents go.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::ExtractedDocument;

/// Takes ownership of extracted documents. Must tolerate a document being delivered twice.
#[async_trait]
pub trait DocumentSender: Send + Sync {
    async fn send(&self, docs: Vec<ExtractedDocument>) -> Result<()>;
}

/// Logs what would be sent.
#[derive(Clone, Debug, Default)]
pub struct LogSender;

#[async_trait]
impl DocumentSender for LogSender {
    async fn send(&self, docs: Vec<ExtractedDocument>) -> Result<()> {
        for doc in docs {
            log::info!(
                "sent {} ({} chars)",
                doc.source.absolute_name(),
                doc.text.chars().count()
            );
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Record<'a> {
    path: &'a str,
    handle: Option<&'a str>,
    text: &'a str,
}

/// Appends one JSON object per document: `{"path", "handle", "text"}`.
pub struct JsonLinesSender {
    file: Mutex<tokio::fs::File>,
}

impl JsonLinesSender {
    pub async fn create(path: &Path) -> Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("open output {}", path.display()))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl DocumentSender for JsonLinesSender {
    async fn send(&self, docs: Vec<ExtractedDocument>) -> Result<()> {
        let mut buf = Vec::new();
        for doc in &docs {
            serde_json::to_writer(
                &mut buf,
                &Record {
                    path: doc.source.absolute_name(),
                    handle: doc.source.handle(),
                    text: &doc.text,
                },
            )?;
            buf.push(b'\n');
        }
        let mut file = self.file.lock().await;
        file.write_all(&buf).await.context("write output")?;
        file.flush().await.context("flush output")?;
        Ok(())
    }
}
