//! Funnel entry points: validate a project submission, capture the lead,
//! run the analysis and hand the result to the viewer.
//!
//! ## Flow
//!
//! ```text
//! ProjectSubmission
//!  │
//!  ├─ 1. Validate     description length, country, contact fields
//!  ├─ 2. Attachment   load + size/type check (before any model call)
//!  ├─ 3. Lead         LeadStore::save_lead (failure is logged, not fatal)
//!  ├─ 4. Analysis     provider chat with retry → AnalysisDocument
//!  └─ 5. Session      {client, analysis} under `aiReportData`
//! ```
//!
//! Everything that can be rejected locally is rejected before the provider
//! is resolved, so a bad form never costs an API call.

use crate::analysis::{ClientRecord, ReportInput};
use crate::config::ReportConfig;
use crate::error::ProposalError;
use crate::lead::{LeadStore, LeadSubmission};
use crate::pipeline::attachment::load_attachment;
use crate::pipeline::llm::{generate_analysis, AnalysisRequest, GeneratedAnalysis};
use crate::session::SessionStore;
use edgequake_llm::{LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Default model when only a provider is named.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// A description must have at least this many characters...
pub const MIN_DESCRIPTION_CHARS: usize = 500;
/// ...and at least this many words.
pub const MIN_DESCRIPTION_WORDS: usize = 50;

/// Service categories offered in the project form.
pub const SERVICE_CATEGORIES: [&str; 6] = [
    "AI & Next-Gen Tech",
    "Web & Software Development",
    "Mobile App Development",
    "Blockchain & Web3",
    "Automation",
    "Recruitment Services",
];

/// Flag shown for funnel clients; the form does not ask for one.
const DEFAULT_FLAG: &str = "🏳️";
const DEFAULT_CURRENCY: &str = "USD";

/// Everything the project form collects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSubmission {
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    pub country: String,
    /// Local path or HTTP(S) URL.
    #[serde(default)]
    pub attachment: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ProjectSubmission {
    /// Check the description and country.
    pub fn validate_project(&self) -> Result<(), ProposalError> {
        let chars = self.description.trim().chars().count();
        let words = self.description.split_whitespace().count();
        if chars < MIN_DESCRIPTION_CHARS || words < MIN_DESCRIPTION_WORDS {
            return Err(ProposalError::DescriptionTooShort {
                chars,
                words,
                min_chars: MIN_DESCRIPTION_CHARS,
                min_words: MIN_DESCRIPTION_WORDS,
            });
        }
        if self.country.trim().is_empty() {
            return Err(ProposalError::MissingLeadField { field: "country" });
        }
        Ok(())
    }

    /// Project checks followed by the lead checks.
    pub fn validate(&self) -> Result<(), ProposalError> {
        self.validate_project()?;
        self.lead().validate()
    }

    /// The contact half, as a lead.
    pub fn lead(&self) -> LeadSubmission {
        LeadSubmission {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            project_description: self.description.clone(),
            domain: self.category.clone(),
            country: self.country.clone(),
        }
    }

    /// The client record shown on the cover and contact pages.
    pub fn client_record(&self) -> ClientRecord {
        ClientRecord {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            contact_number: self.phone.clone().unwrap_or_default(),
            country: self.country.trim().to_string(),
            currency_code: DEFAULT_CURRENCY.to_string(),
            flag_glyph: DEFAULT_FLAG.to_string(),
        }
    }
}

/// Result of a completed submission.
#[derive(Debug, Clone)]
pub struct FunnelOutcome {
    /// Stored lead id; `None` when the lead store failed.
    pub lead_id: Option<String>,
    /// The payload written to the session.
    pub report: ReportInput,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
    pub retries: u32,
}

/// Run the whole funnel for `submission`.
///
/// # Errors
/// Validation and attachment errors are returned before any network call.
/// Analysis and session errors are fatal; a lead store error is not.
pub async fn submit_project(
    submission: &ProjectSubmission,
    leads: &dyn LeadStore,
    session: &SessionStore,
    config: &ReportConfig,
) -> Result<FunnelOutcome, ProposalError> {
    let start = Instant::now();

    // ── Step 1: Validate ─────────────────────────────────────────────────
    submission.validate()?;
    let record = submission.lead().into_record()?;

    // ── Step 2: Attachment ───────────────────────────────────────────────
    let attachment = match submission.attachment.as_deref().filter(|a| !a.trim().is_empty()) {
        Some(source) => Some(load_attachment(source.trim(), config).await?),
        None => None,
    };

    // ── Step 3: Lead ─────────────────────────────────────────────────────
    let lead_id = match leads.save_lead(&record).await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Lead for '{}' not stored: {}", record.email, e);
            None
        }
    };

    // ── Step 4: Analysis ─────────────────────────────────────────────────
    let request = AnalysisRequest {
        description: submission.description.clone(),
        category: submission.category.clone(),
        country: Some(submission.country.clone()),
        attachment,
    };
    let generated = analyze(&request, config).await?;

    // ── Step 5: Session ──────────────────────────────────────────────────
    let report = ReportInput {
        client: submission.client_record(),
        analysis: Some(generated.document),
    };
    session.save_report_input(&report).await?;

    info!(
        "Funnel complete for '{}' in {:?} ({} in / {} out tokens)",
        report.client.name,
        start.elapsed(),
        generated.input_tokens,
        generated.output_tokens
    );

    Ok(FunnelOutcome {
        lead_id,
        report,
        input_tokens: generated.input_tokens,
        output_tokens: generated.output_tokens,
        duration_ms: generated.duration_ms,
        retries: generated.retries,
    })
}

/// Resolve a provider and generate the analysis for `request`.
pub async fn analyze(
    request: &AnalysisRequest,
    config: &ReportConfig,
) -> Result<GeneratedAnalysis, ProposalError> {
    let provider = resolve_provider(config)?;
    generate_analysis(&provider, request, config).await
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ProposalError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ProposalError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key from the environment.
/// 3. **`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`**, when both are set.
/// 4. **`OPENAI_API_KEY`** present: OpenAI with the configured model.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &ReportConfig) -> Result<Arc<dyn LLMProvider>, ProposalError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ProposalError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
