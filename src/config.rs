//! Configuration for analysis, layout and export.
//!
//! Every knob lives in [`ReportConfig`], built through
//! [`ReportConfigBuilder`]. Setters clamp obviously bad values;
//! [`ReportConfigBuilder::build`] rejects combinations that cannot produce
//! a page.

use crate::brand::BrandProfile;
use crate::error::ProposalError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Virtual page width in CSS pixels (A4 at 96 dpi).
pub const PAGE_WIDTH_PX: u32 = 794;
/// Virtual page height in CSS pixels (A4 at 96 dpi).
pub const PAGE_HEIGHT_PX: u32 = 1123;

/// Configuration for one proposal run.
///
/// # Example
/// ```rust
/// use proposal_pdf::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .model("gpt-4o")
///     .first_page_capacity(12)
///     .build()
///     .unwrap();
/// assert_eq!(config.continuation_capacity, 25);
/// ```
#[derive(Clone)]
pub struct ReportConfig {
    // ── Analysis ─────────────────────────────────────────────────────────
    /// LLM model identifier. If None, `gpt-4o` is used with named providers.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is detected from the
    /// environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the analysis call. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    ///
    /// A full flat analysis with three tables runs to roughly 2 500 tokens.
    pub max_tokens: usize,

    /// Retry attempts after a failed analysis call. Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Custom system prompt. If None, the built-in proposal prompt is used.
    pub system_prompt: Option<String>,

    /// Timeout for one analysis call in seconds. Default: 120.
    pub api_timeout_secs: u64,

    // ── Attachments ──────────────────────────────────────────────────────
    /// Characters of attachment text forwarded to the model. Default: 20 000.
    pub attachment_char_limit: usize,

    /// Largest accepted attachment in bytes. Default: 5 MiB.
    pub max_attachment_bytes: u64,

    /// Download timeout for URL attachments in seconds. Default: 120.
    pub download_timeout_secs: u64,

    // ── Layout ───────────────────────────────────────────────────────────
    /// Scope lines on the overview page. Default: 15.
    ///
    /// Smaller than `continuation_capacity` because the overview shares the
    /// page. Both values were fitted to the built-in typography at 794×1123;
    /// re-derive them if either changes.
    pub first_page_capacity: usize,

    /// Scope lines per continuation page. Default: 25.
    pub continuation_capacity: usize,

    /// Virtual page width in pixels. Default: 794.
    pub page_width_px: u32,

    /// Virtual page height in pixels. Default: 1123.
    pub page_height_px: u32,

    /// Oversampling factor for rasterisation. Range: 1.0–4.0. Default: 2.0.
    pub pixel_ratio: f32,

    /// TrueType/OpenType font for the built-in rasteriser. If None, common
    /// system locations are probed.
    pub font_path: Option<PathBuf>,

    // ── Viewer ───────────────────────────────────────────────────────────
    /// Delay before the canned sample replaces a missing session payload.
    /// Default: 1000.
    pub fallback_delay_ms: u64,

    /// Copy for the fixed marketing pages.
    pub brand: BrandProfile,

    /// Optional per-page export events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 4096,
            max_retries: 2,
            retry_backoff_ms: 500,
            system_prompt: None,
            api_timeout_secs: 120,
            attachment_char_limit: 20_000,
            max_attachment_bytes: 5 * 1024 * 1024,
            download_timeout_secs: 120,
            first_page_capacity: 15,
            continuation_capacity: 25,
            page_width_px: PAGE_WIDTH_PX,
            page_height_px: PAGE_HEIGHT_PX,
            pixel_ratio: 2.0,
            font_path: None,
            fallback_delay_ms: 1000,
            brand: BrandProfile::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("attachment_char_limit", &self.attachment_char_limit)
            .field("max_attachment_bytes", &self.max_attachment_bytes)
            .field("first_page_capacity", &self.first_page_capacity)
            .field("continuation_capacity", &self.continuation_capacity)
            .field("page_width_px", &self.page_width_px)
            .field("page_height_px", &self.page_height_px)
            .field("pixel_ratio", &self.pixel_ratio)
            .field("font_path", &self.font_path)
            .field("brand", &self.brand.name)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExportProgressCallback>"),
            )
            .finish()
    }
}

impl ReportConfig {
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }

    /// Raster size of one page: virtual size × pixel ratio.
    pub fn raster_size(&self) -> (u32, u32) {
        let scale = |px: u32| ((px as f32) * self.pixel_ratio).round().max(1.0) as u32;
        (scale(self.page_width_px), scale(self.page_height_px))
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn attachment_char_limit(mut self, chars: usize) -> Self {
        self.config.attachment_char_limit = chars;
        self
    }

    pub fn max_attachment_bytes(mut self, bytes: u64) -> Self {
        self.config.max_attachment_bytes = bytes;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn first_page_capacity(mut self, lines: usize) -> Self {
        self.config.first_page_capacity = lines.max(1);
        self
    }

    pub fn continuation_capacity(mut self, lines: usize) -> Self {
        self.config.continuation_capacity = lines.max(1);
        self
    }

    pub fn page_size(mut self, width_px: u32, height_px: u32) -> Self {
        self.config.page_width_px = width_px;
        self.config.page_height_px = height_px;
        self
    }

    pub fn pixel_ratio(mut self, ratio: f32) -> Self {
        self.config.pixel_ratio = ratio.clamp(1.0, 4.0);
        self
    }

    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.font_path = Some(path.into());
        self
    }

    pub fn fallback_delay_ms(mut self, ms: u64) -> Self {
        self.config.fallback_delay_ms = ms;
        self
    }

    pub fn brand(mut self, brand: BrandProfile) -> Self {
        self.config.brand = brand;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, ProposalError> {
        let c = &self.config;
        if c.page_width_px < 200 || c.page_height_px < 200 {
            return Err(ProposalError::InvalidConfig(format!(
                "Page must be at least 200×200 px, got {}×{}",
                c.page_width_px, c.page_height_px
            )));
        }
        if c.first_page_capacity > c.continuation_capacity {
            return Err(ProposalError::InvalidConfig(format!(
                "First-page capacity ({}) must not exceed continuation capacity ({})",
                c.first_page_capacity, c.continuation_capacity
            )));
        }
        if c.brand.name.trim().is_empty() {
            return Err(ProposalError::InvalidConfig(
                "Brand name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_layout_constants() {
        let c = ReportConfig::default();
        assert_eq!(c.first_page_capacity, 15);
        assert_eq!(c.continuation_capacity, 25);
        assert_eq!(c.attachment_char_limit, 20_000);
        assert_eq!(c.raster_size(), (1588, 2246));
    }

    #[test]
    fn setters_clamp() {
        let c = ReportConfig::builder()
            .temperature(9.0)
            .pixel_ratio(0.1)
            .first_page_capacity(0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.pixel_ratio, 1.0);
        assert_eq!(c.first_page_capacity, 1);
    }

    #[test]
    fn build_rejects_inverted_capacities() {
        let err = ReportConfig::builder()
            .first_page_capacity(30)
            .continuation_capacity(10)
            .build()
            .unwrap_err();
        assert!(matches!(err, ProposalError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_tiny_pages() {
        assert!(ReportConfig::builder().page_size(100, 1123).build().is_err());
    }

    #[test]
    fn debug_hides_provider() {
        let s = format!("{:?}", ReportConfig::default());
        assert!(s.contains("ReportConfig"));
        assert!(s.contains("Talentronaut"));
    }
}
