//! Lead capture: validate a submission and persist it.
//!
//! A lead is the contact half of a funnel submission. Validation runs
//! before any network call; persistence goes through the [`LeadStore`]
//! trait so the funnel can write to a local JSON-lines file
//! ([`JsonlLeadStore`]) or a document database's REST collection
//! ([`HttpLeadStore`]) without knowing which.

use crate::error::ProposalError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

/// Where funnel leads come from unless stated otherwise.
pub const DEFAULT_LEAD_SOURCE: &str = "Website Funnel";

/// Sales pipeline state of a lead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Converted,
    Lost,
}

/// Contact details as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub project_description: String,
    /// Service category or business domain.
    #[serde(default)]
    pub domain: Option<String>,
    pub country: String,
}

/// A stored lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub project_description: String,
    pub domain: Option<String>,
    pub country: String,
    pub source: String,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@.][^\s@]*\.[^\s@]*[^\s@.]$").unwrap());

/// `local@domain.tld`, no whitespace, exactly one `@`.
pub fn is_plausible_email(email: &str) -> bool {
    RE_EMAIL.is_match(email)
}

impl LeadSubmission {
    /// Check required fields and the email shape.
    pub fn validate(&self) -> Result<(), ProposalError> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("projectDescription", &self.project_description),
            ("country", &self.country),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ProposalError::MissingLeadField { field: *field });
        }
        if !is_plausible_email(self.email.trim()) {
            return Err(ProposalError::InvalidEmail {
                email: self.email.clone(),
            });
        }
        Ok(())
    }

    /// Validate and stamp a new record: fresh id, status `New`, the default
    /// source, both timestamps now.
    pub fn into_record(self) -> Result<LeadRecord, ProposalError> {
        self.validate()?;
        let now = Utc::now();
        let blank_to_none = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Ok(LeadRecord {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: blank_to_none(self.phone),
            project_description: self.project_description,
            domain: blank_to_none(self.domain),
            country: self.country.trim().to_string(),
            source: DEFAULT_LEAD_SOURCE.to_string(),
            status: LeadStatus::New,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Persists leads and returns the stored id.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn save_lead(&self, lead: &LeadRecord) -> Result<String, ProposalError>;
}

// ── JSON lines ───────────────────────────────────────────────────────────

/// Appends one JSON object per line to a local file.
#[derive(Debug, Clone)]
pub struct JsonlLeadStore {
    path: PathBuf,
}

impl JsonlLeadStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored lead, oldest first. A missing file is an empty store.
    pub async fn load_all(&self) -> Result<Vec<LeadRecord>, ProposalError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(store_failed(e)),
        };
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(store_failed))
            .collect()
    }
}

fn store_failed(e: impl std::fmt::Display) -> ProposalError {
    ProposalError::LeadStoreFailed {
        detail: e.to_string(),
    }
}

#[async_trait]
impl LeadStore for JsonlLeadStore {
    async fn save_lead(&self, lead: &LeadRecord) -> Result<String, ProposalError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(store_failed)?;
        }
        let mut line = serde_json::to_string(lead).map_err(store_failed)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(store_failed)?;
        file.write_all(line.as_bytes()).await.map_err(store_failed)?;
        file.flush().await.map_err(store_failed)?;

        debug!("Appended lead {} to {}", lead.id, self.path.display());
        Ok(lead.id.to_string())
    }
}

// ── REST collection ──────────────────────────────────────────────────────

/// POSTs leads as JSON to a collection endpoint.
///
/// The id is read from the response body (`leadId`, `id`, `_id` or
/// `insertedId`); when the body has none, the record's own id is returned.
#[derive(Debug, Clone)]
pub struct HttpLeadStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpLeadStore {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProposalError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(store_failed)?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

/// Pull an id out of a store's JSON response.
fn response_id(body: &Value) -> Option<String> {
    ["leadId", "id", "_id", "insertedId"]
        .iter()
        .filter_map(|k| body.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Object(o) => o.get("$oid").and_then(Value::as_str).map(String::from),
            _ => None,
        })
}

#[async_trait]
impl LeadStore for HttpLeadStore {
    async fn save_lead(&self, lead: &LeadRecord) -> Result<String, ProposalError> {
        let mut request = self.client.post(&self.endpoint).json(lead);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.map_err(store_failed)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProposalError::LeadStoreFailed {
                detail: format!("HTTP {status} from {}", self.endpoint),
            });
        }
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let id = response_id(&body).unwrap_or_else(|| lead.id.to_string());
        info!("Stored lead {} via {}", id, self.endpoint);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission() -> LeadSubmission {
        LeadSubmission {
            name: "Alex Morgan".into(),
            email: "alex.morgan@example.com".into(),
            phone: Some("".into()),
            project_description: "A SaaS project manager".into(),
            domain: Some("Web & Software Development".into()),
            country: "United States".into(),
        }
    }

    #[test]
    fn emails() {
        assert!(is_plausible_email("a@b.co"));
        assert!(!is_plausible_email("a@b"));
        assert!(!is_plausible_email("@b.co"));
        assert!(!is_plausible_email("a b@c.io"));
        assert!(!is_plausible_email("a@@b.io"));
        assert!(!is_plausible_email("a@.b.io"));
        assert!(!is_plausible_email("a@b.io."));
        assert!(is_plausible_email("first.last+tag@mail.example.org"));
    }

    #[test]
    fn missing_country_is_reported_by_name() {
        let mut s = submission();
        s.country = "  ".into();
        assert!(matches!(
            s.validate(),
            Err(ProposalError::MissingLeadField { field: "country" })
        ));
    }

    #[test]
    fn record_defaults() {
        let r = submission().into_record().unwrap();
        assert_eq!(r.status, LeadStatus::New);
        assert_eq!(r.source, "Website Funnel");
        assert_eq!(r.phone, None);
        assert_eq!(r.created_at, r.updated_at);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["projectDescription"], "A SaaS project manager");
        assert_eq!(v["status"], "New");
    }

    #[test]
    fn response_ids() {
        assert_eq!(response_id(&json!({"leadId": "abc"})).as_deref(), Some("abc"));
        assert_eq!(
            response_id(&json!({"_id": {"$oid": "65f0"}})).as_deref(),
            Some("65f0")
        );
        assert_eq!(response_id(&json!({"ok": true})), None);
    }

    #[tokio::test]
    async fn jsonl_store_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlLeadStore::new(dir.path().join("leads/leads.jsonl"));
        let a = submission().into_record().unwrap();
        let b = submission().into_record().unwrap();
        assert_eq!(store.save_lead(&a).await.unwrap(), a.id.to_string());
        store.save_lead(&b).await.unwrap();
        let all = store.load_all().await.unwrap();
        assert_eq!(all, vec![a, b]);
    }

    #[tokio::test]
    async fn missing_jsonl_file_is_empty() {
        let store = JsonlLeadStore::new("/nonexistent/dir/leads.jsonl");
        assert!(store.load_all().await.unwrap().is_empty());
    }
}
