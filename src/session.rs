//! Session handoff between the funnel and the report viewer.
//!
//! The funnel writes `{client, analysis}` under [`SESSION_KEY`]; the viewer
//! reads it back. The store is a directory of small files, one per key,
//! written atomically so a reader never sees half a payload.
//!
//! A viewer opened without a usable payload (nothing stored, unparsable
//! JSON, or no `analysis`) waits [`ReportConfig::fallback_delay_ms`] and
//! then shows the canned [`sample_report`].

use crate::analysis::{sample_report, ReportInput};
use crate::config::ReportConfig;
use crate::error::ProposalError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Key the report payload is stored under.
pub const SESSION_KEY: &str = "aiReportData";

/// File-backed key-value store.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$TMPDIR/proposal-pdf-session`.
    pub fn default_dir() -> PathBuf {
        std::env::temp_dir().join("proposal-pdf-session")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Store `value` under `key`, replacing any previous value.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), ProposalError> {
        let failed = |detail: String| ProposalError::SessionStoreFailed {
            key: key.to_string(),
            detail,
        };
        let dir = self.dir.clone();
        let path = self.path_for(key);
        let data = value.as_bytes().to_vec();

        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            std::fs::create_dir_all(&dir)?;
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&data)?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| failed(format!("write task panicked: {e}")))?
        .map_err(|e| failed(e.to_string()))?;

        debug!("Session: stored {} bytes under '{}'", value.len(), key);
        Ok(())
    }

    /// The value under `key`, or `None` when nothing is stored.
    pub async fn get(&self, key: &str) -> Result<Option<String>, ProposalError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ProposalError::SessionStoreFailed {
                key: key.to_string(),
                detail: e.to_string(),
            }),
        }
    }

    /// Remove `key`; removing a missing key is not an error.
    pub async fn remove(&self, key: &str) -> Result<(), ProposalError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ProposalError::SessionStoreFailed {
                key: key.to_string(),
                detail: e.to_string(),
            }),
        }
    }

    /// Serialise `input` under [`SESSION_KEY`].
    pub async fn save_report_input(&self, input: &ReportInput) -> Result<(), ProposalError> {
        let json = serde_json::to_string(input).map_err(|e| ProposalError::SessionStoreFailed {
            key: SESSION_KEY.to_string(),
            detail: e.to_string(),
        })?;
        self.set(SESSION_KEY, &json).await
    }
}

/// Where the viewer's report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOrigin {
    Session,
    Sample,
}

/// The report the viewer will show.
#[derive(Debug, Clone)]
pub struct LoadedReport {
    pub input: ReportInput,
    pub origin: ReportOrigin,
}

/// Parse a stored payload; `None` unless it has an analysis.
pub fn parse_session_payload(raw: &str) -> Option<ReportInput> {
    match serde_json::from_str::<ReportInput>(raw) {
        Ok(input) if input.analysis.is_some() => Some(input),
        Ok(_) => {
            debug!("Session payload has no analysis");
            None
        }
        Err(e) => {
            warn!("Session payload is unparsable: {}", e);
            None
        }
    }
}

/// Load the viewer's report, falling back to the sample after the
/// configured delay. Never fails: a broken store is treated like an empty
/// one.
pub async fn load_report_input(store: &SessionStore, config: &ReportConfig) -> LoadedReport {
    let stored = match store.get(SESSION_KEY).await {
        Ok(v) => v,
        Err(e) => {
            warn!("{}", e);
            None
        }
    };

    if let Some(input) = stored.as_deref().and_then(parse_session_payload) {
        info!("Loaded report for '{}' from session", input.client.name);
        return LoadedReport {
            input,
            origin: ReportOrigin::Session,
        };
    }

    info!(
        "No usable session payload; showing the sample in {}ms",
        config.fallback_delay_ms
    );
    sleep(Duration::from_millis(config.fallback_delay_ms)).await;
    LoadedReport {
        input: sample_report(),
        origin: ReportOrigin::Sample,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn fast() -> ReportConfig {
        ReportConfig::builder().fallback_delay_ms(0).build().unwrap()
    }

    #[tokio::test]
    async fn set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session"));
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
        tokio_test::assert_ok!(store.remove("k").await);
        tokio_test::assert_ok!(store.remove("k").await);
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn stored_payload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let input = sample_report();
        store.save_report_input(&input).await.unwrap();
        let loaded = load_report_input(&store, &fast()).await;
        assert_eq!(loaded.origin, ReportOrigin::Session);
        assert_eq!(loaded.input, input);
    }

    #[tokio::test]
    async fn missing_analysis_falls_back_after_delay() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store
            .set(SESSION_KEY, r#"{"client": {"name": "Priya"}}"#)
            .await
            .unwrap();
        let config = ReportConfig::builder().fallback_delay_ms(50).build().unwrap();

        let start = Instant::now();
        let loaded = load_report_input(&store, &config).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(loaded.origin, ReportOrigin::Sample);
        assert_eq!(loaded.input.client.name, "Alex Morgan");
    }

    #[tokio::test]
    async fn garbage_payload_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.set(SESSION_KEY, "{not json").await.unwrap();
        let loaded = load_report_input(&store, &fast()).await;
        assert_eq!(loaded.origin, ReportOrigin::Sample);
    }

    #[test]
    fn payload_parsing() {
        assert!(parse_session_payload(r#"{"client": {}, "analysis": null}"#).is_none());
        assert!(parse_session_payload(r#"{"client": {}, "analysis": {"projectName": "X"}}"#).is_some());
    }
}
