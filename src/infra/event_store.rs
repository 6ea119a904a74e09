use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::app::ports::EventStorePort;
use crate::domain::{SearchRequest, WeatherEvent};

/// One persisted event together with the search that surfaced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub request: SearchRequest,
    pub event: WeatherEvent,
}

impl StoredEvent {
    pub fn new(request: &SearchRequest, event: &WeatherEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            request: request.clone(),
            event: event.clone(),
        }
    }
}

/// In-memory store for development and tests.
#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<StoredEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<StoredEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventStorePort for InMemoryEventStore {
    async fn save_event(&self, request: &SearchRequest, event: &WeatherEvent) -> Result<()> {
        self.events.lock().await.push(StoredEvent::new(request, event));
        Ok(())
    }
}

/// Appends each saved event as one JSON line.
pub struct JsonlEventStore {
    path: PathBuf,
    // Serializes appends so concurrent writers never interleave lines.
    write_lock: Mutex<()>,
}

impl JsonlEventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every stored event. A missing file is an empty store.
    pub async fn load(&self) -> Result<Vec<StoredEvent>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Invalid stored event on line {} of {}", i + 1, self.path.display()))
            })
            .collect()
    }
}

#[async_trait]
impl EventStorePort for JsonlEventStore {
    async fn save_event(&self, request: &SearchRequest, event: &WeatherEvent) -> Result<()> {
        let mut line = serde_json::to_string(&StoredEvent::new(request, event))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open event store {}", self.path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!("Stored {} event for {} in {}", event.event_type(), event.date(), self.path.display());
        Ok(())
    }
}
