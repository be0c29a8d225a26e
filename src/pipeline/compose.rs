//! Page composition: client + analysis → ordered, fixed-size pages.
//!
//! Composition is pure. It reads the analysis, renders every text field into
//! [`Block`]s, splits the scope of work across continuation pages, and
//! numbers the pages in display order. Nothing here measures text; page
//! fit is governed by the line capacities in [`ReportConfig`].
//!
//! ## Page order
//!
//! ```text
//! Flat:        cover · profile · details · details (cont.)* · plan
//!              · commercials · deliverables · global presence · contact
//! Structured:  cover · profile · understanding · execution · phases
//!              · architecture · features · estimation · global presence
//!              · contact
//! ```
//!
//! The scope of work is split by [`paginate`] first and each chunk is
//! lettered on its own, so every continuation page starts again at `a)`.
//!
//! Page numbers and heading ordinals are separate counters. A continuation
//! page takes the next page number but keeps the ordinal of the section it
//! continues.

use crate::analysis::{AnalysisDocument, ClientRecord, FlatAnalysis, StructuredAnalysis};
use crate::brand::{BrandProfile, PaymentCard, ProcessStep, Stat};
use crate::config::ReportConfig;
use crate::export::export_filename;
use crate::pipeline::markdown::split_lines;
use crate::pipeline::paginate::paginate;
use crate::pipeline::section::{
    content_lines, render_field, render_lettered, render_table_or_field, Block,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What a page is, independent of its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageKind {
    Cover,
    Profile,
    Content,
    ContinuationContent,
    Commercials,
    Deliverables,
    GlobalPresence,
    Contact,
}

/// A titled run of blocks on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    /// Drawn at reduced opacity; used for continued sections.
    pub dimmed: bool,
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(title: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            title: title.into(),
            dimmed: false,
            blocks,
        }
    }

    fn dimmed(mut self) -> Self {
        self.dimmed = true;
        self
    }
}

/// Page content, by page type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PagePayload {
    Cover {
        title: String,
        subtitle: String,
        reference: String,
        prepared_for: String,
        country: String,
        date: String,
    },
    Profile {
        about: Vec<String>,
        process: Vec<ProcessStep>,
        mission: String,
    },
    Sections(Vec<Section>),
    Commercials {
        investment: Section,
        payment_cards: Vec<PaymentCard>,
    },
    GlobalPresence {
        headquarters: Vec<String>,
        client_regions: Vec<String>,
        home_city: String,
        stats: Vec<Stat>,
        clients: Vec<String>,
    },
    Contact {
        client: ClientRecord,
        website: String,
        headquarters: Vec<String>,
    },
}

/// One virtual page, numbered in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescriptor {
    /// Stable element id, `pdf-page-N`.
    pub page_id: String,
    /// 1-indexed folio number.
    pub number: usize,
    pub kind: PageKind,
    /// Small-caps label at the top of the page, e.g. `03 • Project Details`.
    pub heading: Option<String>,
    pub payload: PagePayload,
}

/// The composed report: pages plus what the exporter needs around them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedReport {
    pub pages: Vec<PageDescriptor>,
    pub client: ClientRecord,
    pub filename: String,
    pub brand: BrandProfile,
}

impl ComposedReport {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Accumulates pages and hands out running numbers.
struct PageSink {
    pages: Vec<PageDescriptor>,
    /// Ordinal of the last section page; continuation pages reuse it.
    ordinal: usize,
}

impl PageSink {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ordinal: 0,
        }
    }

    fn next_number(&self) -> usize {
        self.pages.len() + 1
    }

    fn push(&mut self, kind: PageKind, title: Option<&str>, payload: PagePayload) {
        if kind != PageKind::ContinuationContent {
            self.ordinal += 1;
        }
        let number = self.next_number();
        let ordinal = self.ordinal;
        self.pages.push(PageDescriptor {
            page_id: format!("pdf-page-{number}"),
            number,
            kind,
            heading: title.map(|t| format!("{ordinal:02} • {t}")),
            payload,
        });
    }
}

/// Compose the report for `client`.
///
/// Returns `None` when there is no analysis; export must not be attempted.
/// Never fails on missing or mistyped analysis fields.
pub fn compose_report(
    client: &ClientRecord,
    analysis: Option<&AnalysisDocument>,
    config: &ReportConfig,
    date: NaiveDate,
) -> Option<ComposedReport> {
    let analysis = analysis?;
    let brand = &config.brand;
    let mut sink = PageSink::new();

    let raw_title = analysis.project_name();
    let title = match brand.strip_title_prefix(raw_title) {
        "" => brand.document_subtitle.clone(),
        t => t.to_string(),
    };
    sink.push(
        PageKind::Cover,
        None,
        PagePayload::Cover {
            title,
            subtitle: brand.document_subtitle.clone(),
            reference: brand.reference(date.year()),
            prepared_for: client.name.clone(),
            country: client.country.clone(),
            date: statement_date(date),
        },
    );
    sink.push(
        PageKind::Profile,
        Some("Company Profile"),
        PagePayload::Profile {
            about: brand.about.clone(),
            process: brand.process.clone(),
            mission: brand.mission.clone(),
        },
    );

    match analysis {
        AnalysisDocument::Flat(flat) => compose_flat(&mut sink, flat, config, brand),
        AnalysisDocument::Structured(s) => compose_structured(&mut sink, s),
    }

    sink.push(
        PageKind::GlobalPresence,
        None,
        PagePayload::GlobalPresence {
            headquarters: brand.headquarters.clone(),
            client_regions: brand.client_regions.clone(),
            home_city: brand.home_city.clone(),
            stats: brand.stats.clone(),
            clients: brand.clients.clone(),
        },
    );
    sink.push(
        PageKind::Contact,
        Some("Contact"),
        PagePayload::Contact {
            client: client.clone(),
            website: brand.website.clone(),
            headquarters: brand.headquarters.clone(),
        },
    );

    debug!(
        "Composed {} pages ({:?} analysis) for '{}'",
        sink.pages.len(),
        analysis.variant(),
        client.name
    );

    Some(ComposedReport {
        pages: sink.pages,
        client: client.clone(),
        filename: export_filename(&brand.name, &client.name),
        brand: brand.clone(),
    })
}

/// `October 16, 2026`.
pub fn statement_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn compose_flat(sink: &mut PageSink, flat: &FlatAnalysis, config: &ReportConfig, brand: &BrandProfile) {
    let scope = content_lines(&flat.scope_of_work);
    let pages = paginate(&scope, config.first_page_capacity, config.continuation_capacity);

    sink.push(
        PageKind::Content,
        Some("Project Details"),
        PagePayload::Sections(vec![
            Section::new("Project Overview", render_field(&flat.project_overview)),
            Section::new("Scope of Work", render_lettered(&pages.first_chunk)),
        ]),
    );
    for chunk in pages.continuation_chunks {
        sink.push(
            PageKind::ContinuationContent,
            Some("Project Details (Cont.)"),
            PagePayload::Sections(vec![Section::new(
                "Scope of Work (Continued)",
                render_lettered(&chunk),
            )
            .dimmed()]),
        );
    }

    sink.push(
        PageKind::Content,
        Some("Plan & Technology"),
        PagePayload::Sections(vec![
            Section::new("Project Timeline", render_table_or_field(&flat.timeline)),
            Section::new(
                "Technologies & Frameworks",
                render_table_or_field(&flat.technologies),
            ),
        ]),
    );

    sink.push(
        PageKind::Commercials,
        Some("Commercials"),
        PagePayload::Commercials {
            investment: Section::new(
                "Approximate Investment",
                render_table_or_field(&flat.investment),
            ),
            payment_cards: brand.payment_cards.clone(),
        },
    );

    let deliverables = if flat.deliverables.is_empty() {
        Vec::new()
    } else {
        render_lettered(&split_lines(&flat.deliverables))
    };
    sink.push(
        PageKind::Deliverables,
        Some("Deliverables"),
        PagePayload::Sections(vec![Section::new("List of Deliverables", deliverables)]),
    );
}

fn bullets(items: &[String]) -> Vec<Block> {
    items.iter().map(|i| Block::bullet(i)).collect()
}

/// `label: value` lines for the non-empty values.
fn key_values(pairs: &[(&str, &str)]) -> Vec<Block> {
    pairs
        .iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(label, value)| Block::KeyValue {
            label: label.to_string(),
            value: format!(" {}", value.trim()),
        })
        .collect()
}

fn compose_structured(sink: &mut PageSink, s: &StructuredAnalysis) {
    let u = &s.project_understanding;
    sink.push(
        PageKind::Content,
        Some("Project Understanding"),
        PagePayload::Sections(vec![
            Section::new("Summary", render_field(&u.summary)),
            Section::new("Business Objectives", bullets(&u.business_objectives)),
            Section::new("Target Users", bullets(&u.target_users)),
            Section::new("Key Challenges", bullets(&u.key_challenges)),
        ]),
    );

    let e = &s.execution_approach;
    sink.push(
        PageKind::Content,
        Some("Execution Strategy"),
        PagePayload::Sections(vec![
            Section::new("Methodology", render_field(&e.methodology)),
            Section::new("Rationale", render_field(&e.rationale)),
            Section::new("Key Principles", bullets(&e.key_principles)),
            Section::new("Collaboration Model", render_field(&e.collaboration_model)),
        ]),
    );

    let phases = s
        .project_phases
        .iter()
        .map(|p| {
            let mut blocks = Vec::new();
            if !p.activities.is_empty() {
                blocks.push(Block::Heading("Activities".into()));
                blocks.extend(bullets(&p.activities));
            }
            if !p.deliverables.is_empty() {
                blocks.push(Block::Heading("Deliverables".into()));
                blocks.extend(bullets(&p.deliverables));
            }
            Section::new(p.phase_name.clone(), blocks)
        })
        .collect();
    sink.push(
        PageKind::Content,
        Some("Project Phases"),
        PagePayload::Sections(phases),
    );

    let a = &s.technical_architecture;
    sink.push(
        PageKind::Content,
        Some("Technical Architecture"),
        PagePayload::Sections(vec![
            Section::new("Overview", render_field(&a.overview)),
            Section::new(
                "Technology Stack",
                key_values(&[
                    ("Frontend", a.frontend.as_str()),
                    ("Backend", a.backend.as_str()),
                    ("Database", a.database.as_str()),
                    ("Infrastructure", a.infrastructure.as_str()),
                ]),
            ),
            Section::new("Integrations", bullets(&a.integrations)),
            Section::new("Security Considerations", bullets(&a.security_considerations)),
        ]),
    );

    let features = s
        .feature_execution_plan
        .iter()
        .map(|f| {
            let mut blocks = render_field(&f.implementation_details);
            if !f.dependencies.is_empty() {
                blocks.push(Block::Heading("Dependencies".into()));
                blocks.extend(bullets(&f.dependencies));
            }
            Section::new(f.feature_name.clone(), blocks)
        })
        .collect();
    sink.push(
        PageKind::Content,
        Some("Feature Execution Plan"),
        PagePayload::Sections(features),
    );

    let h = &s.high_level_estimation;
    let f = &s.assumptions_and_flexibility;
    let mut estimation = key_values(&[
        ("Complexity", h.complexity.as_str()),
        ("Estimated Timeline", h.estimated_timeline.as_str()),
    ]);
    estimation.extend(render_field(&h.estimation_notes));
    sink.push(
        PageKind::Content,
        Some("Summary & Estimation"),
        PagePayload::Sections(vec![
            Section::new("High-Level Estimation", estimation),
            Section::new("Assumptions", bullets(&f.assumptions)),
            Section::new("Flexibility", bullets(&f.flexibility_notes)),
            Section::new("Out of Scope", bullets(&f.out_of_scope)),
        ]),
    );
}
