//! Report input: the client record and the model's analysis document.
//!
//! The analysis comes from a language model and is treated as untrusted.
//! Two schema shapes have been seen in the wild:
//!
//! * **Flat**: eight free-text fields (`projectName`, `scopeOfWork`, …),
//!   some of which are expected to hold markdown tables.
//! * **Structured**: nested objects (`projectUnderstanding`,
//!   `technicalArchitecture`, …) with list fields.
//!
//! [`AnalysisDocument`] is resolved once, by looking for a characteristic
//! key, and everything downstream matches on the variant.
//!
//! ## Lenient fields
//!
//! Every field deserialises through one of the `lenient_*` helpers below:
//! `null` becomes empty, a string where a list is expected becomes one item
//! per line, a list where a string is expected is joined with newlines, and
//! a nested object of the wrong shape becomes its default. A missing
//! sub-field therefore renders as an empty block and never fails the report.

use crate::error::ProposalError;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Client ───────────────────────────────────────────────────────────────

/// Who the proposal is prepared for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, alias = "contact", deserialize_with = "lenient_string")]
    pub contact_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: String,
    #[serde(default, alias = "currency", deserialize_with = "lenient_string")]
    pub currency_code: String,
    #[serde(default, alias = "flag", deserialize_with = "lenient_string")]
    pub flag_glyph: String,
}

impl ClientRecord {
    /// Placeholder shown while no report data is available.
    pub fn guest() -> Self {
        Self {
            name: "Guest User".into(),
            email: "guest@example.com".into(),
            contact_number: "+1 (555) 000-0000".into(),
            country: "Unknown".into(),
            currency_code: "USD".into(),
            flag_glyph: "🏳️".into(),
        }
    }
}

// ── Flat schema ──────────────────────────────────────────────────────────

/// Keys that identify a flat document.
pub const FLAT_FIELDS: [&str; 8] = [
    "projectName",
    "projectOverview",
    "scopeOfWork",
    "timeline",
    "technologies",
    "investment",
    "paymentTerms",
    "deliverables",
];

/// Key that identifies a structured document.
pub const STRUCTURED_MARKER: &str = "projectUnderstanding";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlatAnalysis {
    #[serde(deserialize_with = "lenient_string")]
    pub project_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub project_overview: String,
    #[serde(deserialize_with = "lenient_string")]
    pub scope_of_work: String,
    #[serde(deserialize_with = "lenient_string")]
    pub timeline: String,
    #[serde(deserialize_with = "lenient_string")]
    pub technologies: String,
    #[serde(deserialize_with = "lenient_string")]
    pub investment: String,
    #[serde(deserialize_with = "lenient_string")]
    pub payment_terms: String,
    #[serde(deserialize_with = "lenient_string")]
    pub deliverables: String,
}

// ── Structured schema ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectUnderstanding {
    #[serde(deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(deserialize_with = "lenient_list")]
    pub business_objectives: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub target_users: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub key_challenges: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionApproach {
    #[serde(deserialize_with = "lenient_string")]
    pub methodology: String,
    #[serde(deserialize_with = "lenient_string")]
    pub rationale: String,
    #[serde(deserialize_with = "lenient_list")]
    pub key_principles: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub collaboration_model: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TechnicalArchitecture {
    #[serde(deserialize_with = "lenient_string")]
    pub overview: String,
    #[serde(deserialize_with = "lenient_string")]
    pub frontend: String,
    #[serde(deserialize_with = "lenient_string")]
    pub backend: String,
    #[serde(deserialize_with = "lenient_string")]
    pub database: String,
    #[serde(deserialize_with = "lenient_string")]
    pub infrastructure: String,
    #[serde(deserialize_with = "lenient_list")]
    pub integrations: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub security_considerations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeaturePlan {
    #[serde(deserialize_with = "lenient_string")]
    pub feature_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub implementation_details: String,
    #[serde(deserialize_with = "lenient_list")]
    pub dependencies: Vec<String>,
}

impl From<String> for FeaturePlan {
    fn from(feature_name: String) -> Self {
        Self {
            feature_name,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectPhase {
    #[serde(deserialize_with = "lenient_string")]
    pub phase_name: String,
    #[serde(deserialize_with = "lenient_list")]
    pub activities: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub deliverables: Vec<String>,
}

impl From<String> for ProjectPhase {
    fn from(phase_name: String) -> Self {
        Self {
            phase_name,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssumptionsAndFlexibility {
    #[serde(deserialize_with = "lenient_list")]
    pub assumptions: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub flexibility_notes: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub out_of_scope: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HighLevelEstimation {
    #[serde(deserialize_with = "lenient_string")]
    pub complexity: String,
    #[serde(deserialize_with = "lenient_string")]
    pub estimated_timeline: String,
    #[serde(deserialize_with = "lenient_string")]
    pub estimation_notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructuredAnalysis {
    /// Optional title; not part of every structured answer.
    #[serde(deserialize_with = "lenient_string")]
    pub project_name: String,
    #[serde(deserialize_with = "lenient_object")]
    pub project_understanding: ProjectUnderstanding,
    #[serde(deserialize_with = "lenient_object")]
    pub execution_approach: ExecutionApproach,
    #[serde(deserialize_with = "lenient_object")]
    pub technical_architecture: TechnicalArchitecture,
    #[serde(deserialize_with = "lenient_records")]
    pub feature_execution_plan: Vec<FeaturePlan>,
    #[serde(deserialize_with = "lenient_records")]
    pub project_phases: Vec<ProjectPhase>,
    #[serde(deserialize_with = "lenient_object")]
    pub assumptions_and_flexibility: AssumptionsAndFlexibility,
    #[serde(deserialize_with = "lenient_object")]
    pub high_level_estimation: HighLevelEstimation,
}

// ── Document ─────────────────────────────────────────────────────────────

/// The model's analysis, in one of the two known shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnalysisDocument {
    Flat(FlatAnalysis),
    Structured(StructuredAnalysis),
}

/// Which shape a document has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    Flat,
    Structured,
}

impl AnalysisDocument {
    /// Resolve the schema variant of a raw JSON value and parse it.
    ///
    /// `projectUnderstanding` selects the structured shape; otherwise any
    /// flat key selects the flat shape. Anything else is malformed.
    pub fn from_value(value: Value) -> Result<Self, ProposalError> {
        let Some(obj) = value.as_object() else {
            return Err(ProposalError::MalformedAnalysis {
                detail: format!("expected a JSON object, got {}", json_kind(&value)),
            });
        };

        let variant = if obj.contains_key(STRUCTURED_MARKER) {
            SchemaVariant::Structured
        } else if FLAT_FIELDS.iter().any(|k| obj.contains_key(*k)) {
            SchemaVariant::Flat
        } else {
            return Err(ProposalError::MalformedAnalysis {
                detail: "no known analysis field present".into(),
            });
        };

        let parsed = match variant {
            SchemaVariant::Structured => {
                serde_json::from_value(value).map(AnalysisDocument::Structured)
            }
            SchemaVariant::Flat => serde_json::from_value(value).map(AnalysisDocument::Flat),
        };
        parsed.map_err(|e| ProposalError::MalformedAnalysis {
            detail: e.to_string(),
        })
    }

    /// Parse model output text as an analysis document.
    pub fn from_json_str(text: &str) -> Result<Self, ProposalError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ProposalError::MalformedAnalysis {
                detail: e.to_string(),
            })?;
        Self::from_value(value)
    }

    pub fn variant(&self) -> SchemaVariant {
        match self {
            AnalysisDocument::Flat(_) => SchemaVariant::Flat,
            AnalysisDocument::Structured(_) => SchemaVariant::Structured,
        }
    }

    /// Project title as the model wrote it; may be empty.
    pub fn project_name(&self) -> &str {
        match self {
            AnalysisDocument::Flat(f) => &f.project_name,
            AnalysisDocument::Structured(s) => &s.project_name,
        }
    }
}

impl<'de> Deserialize<'de> for AnalysisDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        AnalysisDocument::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Everything the report needs: `{client, analysis}`.
///
/// This is the session payload written after analysis and read by the
/// viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportInput {
    pub client: ClientRecord,
    #[serde(default)]
    pub analysis: Option<AnalysisDocument>,
}

// ── Lenient deserialisers ────────────────────────────────────────────────

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Flatten any JSON value into display text.
fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .into_iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| format!("{k}: {}", value_to_text(v)))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn value_to_list(value: Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .map(value_to_text)
            .filter(|s| !s.trim().is_empty())
            .collect(),
        other => value_to_text(other)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(value_to_text(Value::deserialize(d)?))
}

fn lenient_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(value_to_list(Value::deserialize(d)?))
}

fn lenient_object<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(d)?;
    if !value.is_object() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_records<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + From<String>,
{
    let items = match Value::deserialize(d)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(_) => serde_json::from_value(item).ok(),
            Value::Null => None,
            other => {
                let text = value_to_text(other);
                (!text.trim().is_empty()).then(|| T::from(text))
            }
        })
        .collect())
}

// ── Canned sample ────────────────────────────────────────────────────────

/// The example report shown when no session payload is available.
pub fn sample_report() -> ReportInput {
    ReportInput {
        client: ClientRecord {
            name: "Alex Morgan".into(),
            email: "alex.morgan@example.com".into(),
            contact_number: "+1 (555) 012-3456".into(),
            country: "United States".into(),
            currency_code: "USD".into(),
            flag_glyph: "🇺🇸".into(),
        },
        analysis: Some(AnalysisDocument::Flat(FlatAnalysis {
            project_name: "SaaS Project Manager".into(),
            project_overview: "The client aims to build a comprehensive SaaS platform for project management. The goal is to streamline collaboration and improve productivity for remote teams.\nKey objectives include centralized tracking, real-time updates, and automated reporting.".into(),
            scope_of_work: "Phase 1: Discovery & Design\n- Requirement gathering\n- UI/UX Wireframes\n\nPhase 2: MVP Development\n- User Authentication\n- Task Management Board\n- Basic Reporting\n\nPhase 3: Testing & Launch\n- QA Testing\n- Deployment to AWS\n- User Training".into(),
            timeline: "Total Duration: 12-14 Weeks\n- Discovery: 2 Weeks\n- Design: 3 Weeks\n- Development: 8 Weeks\n- UAT & Launch: 1 Week".into(),
            technologies: "Frontend: Next.js, Tailwind CSS\nBackend: Node.js, Express\nDatabase: PostgreSQL\nCloud: AWS (EC2, S3, RDS)".into(),
            investment: "Total Estimated Cost: $15,000 - $20,000\n- Design: $3,000\n- Development: $12,000\n- Deployment & Support: $3,000".into(),
            payment_terms: "50% Advance to Initiate\n50% After Project Completion".into(),
            deliverables: "1. **Source Code Repository**: Complete ownership of Github repository with full version history.\n2. **Admin Dashboard**: Web-based control panel to manage users, content, and analytics.\n3. **User Application**: Fully functional mobile/web app deployed to production.\n4. **Technical Documentation**: Architecture diagrams, API references, and setup guides.\n5. **3 Months Support**: Priority bug fixing and server monitoring post-launch.".into(),
        })),
    }
}
