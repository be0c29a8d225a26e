//! Analysis call: build the chat messages, call the provider, parse the
//! answer into an [`AnalysisDocument`].
//!
//! All wording lives in [`crate::prompts`] and all output cleanup in
//! [`crate::pipeline::postprocess`].
//!
//! ## Retry Strategy
//!
//! Provider errors (HTTP 429 / 503), timeouts and unparsable answers are all
//! retried with exponential backoff (`retry_backoff_ms * 2^attempt`): with
//! the 500 ms default and 2 retries the waits are 500 ms → 1 s. A bad answer
//! is retried because sampling makes the next one likely to differ. No
//! partial document is ever accepted.

use crate::config::ReportConfig;
use crate::analysis::AnalysisDocument;
use crate::error::ProposalError;
use crate::pipeline::attachment::Attachment;
use crate::pipeline::postprocess::clean_model_output;
use crate::prompts::{analysis_system_prompt, build_user_prompt, IMAGE_ATTACHMENT_NOTE};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// What the submitter told us about the project.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub description: String,
    /// Service category picked in the form, e.g. "Mobile App".
    pub category: Option<String>,
    pub country: Option<String>,
    pub attachment: Option<Attachment>,
}

/// A parsed analysis plus call statistics.
#[derive(Debug, Clone)]
pub struct GeneratedAnalysis {
    pub document: AnalysisDocument,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
    /// Attempts beyond the first.
    pub retries: u32,
}

/// Generate the analysis for `request`.
///
/// ## Message Layout
///
/// 1. **System message**: the proposal prompt (or the configured override)
/// 2. **User message**: description, category, country and truncated
///    attachment text; an image attachment rides along as vision input
pub async fn generate_analysis(
    provider: &Arc<dyn LLMProvider>,
    request: &AnalysisRequest,
    config: &ReportConfig,
) -> Result<GeneratedAnalysis, ProposalError> {
    let start = Instant::now();
    let messages = build_messages(request, config);
    let options = build_options(config);
    let call_timeout = Duration::from_secs(config.api_timeout_secs);

    let mut last_err: Option<ProposalError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Analysis: retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let response = match timeout(call_timeout, provider.chat(&messages, Some(&options))).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("Analysis: attempt {} failed: {}", attempt + 1, e);
                last_err = Some(ProposalError::AnalysisFailed {
                    attempts: attempt + 1,
                    detail: e.to_string(),
                });
                continue;
            }
            Err(_) => {
                warn!(
                    "Analysis: attempt {} timed out after {}s",
                    attempt + 1,
                    config.api_timeout_secs
                );
                last_err = Some(ProposalError::AnalysisFailed {
                    attempts: attempt + 1,
                    detail: format!("timed out after {}s", config.api_timeout_secs),
                });
                continue;
            }
        };

        debug!(
            "Analysis: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        match parse_analysis(&response.content) {
            Ok(document) => {
                let duration = start.elapsed();
                info!(
                    "Analysis complete: {:?} schema, '{}', {:?}",
                    document.variant(),
                    document.project_name(),
                    duration
                );
                return Ok(GeneratedAnalysis {
                    document,
                    input_tokens: response.prompt_tokens,
                    output_tokens: response.completion_tokens,
                    duration_ms: duration.as_millis() as u64,
                    retries: attempt,
                });
            }
            Err(e) => {
                warn!("Analysis: attempt {} unusable: {}", attempt + 1, e);
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or(ProposalError::AnalysisFailed {
        attempts: config.max_retries + 1,
        detail: "Unknown error".into(),
    }))
}

/// Clean the raw model answer and parse it.
pub fn parse_analysis(content: &str) -> Result<AnalysisDocument, ProposalError> {
    let cleaned = clean_model_output(content);
    if cleaned.is_empty() {
        return Err(ProposalError::EmptyAnalysis);
    }
    AnalysisDocument::from_json_str(&cleaned)
}

/// System + user messages for `request`.
fn build_messages(request: &AnalysisRequest, config: &ReportConfig) -> Vec<ChatMessage> {
    let system = match &config.system_prompt {
        Some(custom) => custom.clone(),
        None => analysis_system_prompt(&config.brand.legal_name),
    };

    let document = request.attachment.as_ref().and_then(Attachment::text);
    let prompt = build_user_prompt(
        &request.description,
        request.category.as_deref(),
        request.country.as_deref(),
        document,
        config.attachment_char_limit,
    );

    let user = match request.attachment.as_ref().and_then(Attachment::image) {
        Some(image) => ChatMessage::user_with_images(
            format!("{prompt}\n{IMAGE_ATTACHMENT_NOTE}"),
            vec![image.clone()],
        ),
        None => ChatMessage::user(prompt),
    };

    vec![ChatMessage::system(system), user]
}

/// Build `CompletionOptions` from the report config.
fn build_options(config: &ReportConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SchemaVariant;

    #[test]
    fn build_options_defaults() {
        let opts = build_options(&ReportConfig::default());
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(4096));
    }

    #[test]
    fn two_messages_per_request() {
        let request = AnalysisRequest {
            description: "Booking app for a dental clinic".into(),
            country: Some("India".into()),
            ..Default::default()
        };
        assert_eq!(build_messages(&request, &ReportConfig::default()).len(), 2);
    }

    #[test]
    fn fenced_flat_answer_parses() {
        let doc = parse_analysis("```json\n{\"projectName\": \"Clinic Booking\"}\n```").unwrap();
        assert_eq!(doc.variant(), SchemaVariant::Flat);
        assert_eq!(doc.project_name(), "Clinic Booking");
    }

    #[test]
    fn structured_answer_parses() {
        let doc = parse_analysis(r#"{"projectUnderstanding": {"summary": "x"}}"#).unwrap();
        assert_eq!(doc.variant(), SchemaVariant::Structured);
    }

    #[test]
    fn empty_answer_is_empty_analysis() {
        assert!(matches!(
            parse_analysis("  \u{200B} "),
            Err(ProposalError::EmptyAnalysis)
        ));
    }

    #[test]
    fn prose_answer_is_malformed() {
        assert!(matches!(
            parse_analysis("I cannot help with that."),
            Err(ProposalError::MalformedAnalysis { .. })
        ));
    }
}
