//! Page rasterisation: [`PageDescriptor`] → RGBA image.
//!
//! The exporter only knows the [`PageRasterizer`] capability, so page
//! ordering and failure handling can be tested with a stub. The built-in
//! implementation, [`LayoutRasterizer`], paints pages directly with
//! `imageproc` primitives and `ab_glyph` text. There is no layout engine:
//! content flows top-down from a cursor and anything that would cross the
//! footer rule is clipped, like a fixed-height page with hidden overflow.
//!
//! ## Coordinates
//!
//! Layout happens in CSS pixels on the virtual page (794×1123 by default).
//! Every primitive is multiplied by the pixel ratio when it is drawn, so a
//! 2× capture has identical geometry at twice the resolution.
//!
//! ## Why spawn_blocking?
//!
//! Painting a 1588×2246 page with glyph rasterisation is pure CPU work in
//! the tens of milliseconds. It runs on the blocking pool so the runtime
//! keeps serving other tasks between pages.

use crate::brand::{parse_hex_color, PaymentCard, ProcessStep, Stat};
use crate::config::ReportConfig;
use crate::error::ProposalError;
use crate::pipeline::compose::{ComposedReport, PageDescriptor, PagePayload, Section};
use crate::pipeline::inline::Span;
use crate::pipeline::section::{Block, Marker};
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut,
};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

// ── Capability ───────────────────────────────────────────────────────────

/// Everything a rasteriser needs besides the page itself.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub width_px: u32,
    pub height_px: u32,
    pub pixel_ratio: f32,
    /// Page paper colour.
    pub paper: Rgba<u8>,
    pub accent: Rgba<u8>,
    /// Footer text, normally the brand website.
    pub footer: String,
    pub brand_name: String,
}

impl CaptureOptions {
    pub fn new(config: &ReportConfig, report: &ComposedReport) -> Self {
        Self {
            width_px: config.page_width_px,
            height_px: config.page_height_px,
            pixel_ratio: config.pixel_ratio,
            paper: opaque(parse_hex_color(&report.brand.paper)),
            accent: opaque(parse_hex_color(&report.brand.accent)),
            footer: report.brand.website.clone(),
            brand_name: report.brand.name.clone(),
        }
    }

    /// Output image size in device pixels.
    pub fn raster_size(&self) -> (u32, u32) {
        let scale = |px: u32| ((px as f32) * self.pixel_ratio).round().max(1.0) as u32;
        (scale(self.width_px), scale(self.height_px))
    }
}

/// Turns one composed page into pixels.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Capture `page` at `options.pixel_ratio`.
    async fn capture(
        &self,
        page: &PageDescriptor,
        options: &CaptureOptions,
    ) -> Result<RgbaImage, ProposalError>;
}

// ── Fonts ────────────────────────────────────────────────────────────────

/// Regular faces probed when no font is configured, in order.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Regular → bold file-name pairs for locating a bold sibling.
const BOLD_SIBLINGS: &[(&str, &str)] = &[
    ("DejaVuSans.ttf", "DejaVuSans-Bold.ttf"),
    ("LiberationSans-Regular.ttf", "LiberationSans-Bold.ttf"),
    ("Arial.ttf", "Arial Bold.ttf"),
    ("arial.ttf", "arialbd.ttf"),
];

/// A regular face and an optional bold face.
pub struct FontSet {
    regular: FontVec,
    bold: Option<FontVec>,
}

impl FontSet {
    /// Load `path` as the regular face; a bold sibling is picked up if one
    /// sits next to it.
    pub fn load(path: &Path) -> Result<Self, ProposalError> {
        let regular = read_font(path).ok_or_else(|| ProposalError::FontUnavailable {
            tried: path.display().to_string(),
        })?;
        let bold = bold_sibling(path).and_then(|p| read_font(&p));
        debug!(
            "Loaded font {} (bold face: {})",
            path.display(),
            if bold.is_some() { "yes" } else { "no" }
        );
        Ok(Self { regular, bold })
    }

    /// Load the configured font, or the first usable system font.
    pub fn discover(configured: Option<&Path>) -> Result<Self, ProposalError> {
        if let Some(path) = configured {
            return Self::load(path);
        }
        for candidate in FONT_CANDIDATES {
            let path = Path::new(candidate);
            if path.is_file() {
                if let Ok(set) = Self::load(path) {
                    info!("Using system font {}", path.display());
                    return Ok(set);
                }
            }
        }
        Err(ProposalError::FontUnavailable {
            tried: FONT_CANDIDATES.join(", "),
        })
    }

    fn pick(&self, strong: bool) -> &FontVec {
        match (&self.bold, strong) {
            (Some(bold), true) => bold,
            _ => &self.regular,
        }
    }
}

fn read_font(path: &Path) -> Option<FontVec> {
    let data = std::fs::read(path).ok()?;
    FontVec::try_from_vec(data).ok()
}

fn bold_sibling(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    BOLD_SIBLINGS
        .iter()
        .find(|(regular, _)| *regular == name)
        .map(|(_, bold)| path.with_file_name(bold))
        .filter(|p| p.is_file())
}

// ── Built-in rasteriser ──────────────────────────────────────────────────

/// Paints pages with `imageproc` and `ab_glyph`.
#[derive(Clone)]
pub struct LayoutRasterizer {
    fonts: Arc<FontSet>,
}

impl LayoutRasterizer {
    pub fn new(fonts: FontSet) -> Self {
        Self {
            fonts: Arc::new(fonts),
        }
    }

    /// Build from `config.font_path`, probing system fonts when unset.
    pub fn from_config(config: &ReportConfig) -> Result<Self, ProposalError> {
        FontSet::discover(config.font_path.as_deref()).map(Self::new)
    }

    /// Paint synchronously. Used by [`PageRasterizer::capture`] on the
    /// blocking pool.
    pub fn paint(&self, page: &PageDescriptor, options: &CaptureOptions) -> RgbaImage {
        Painter::new(&self.fonts, options).paint(page)
    }
}

#[async_trait]
impl PageRasterizer for LayoutRasterizer {
    async fn capture(
        &self,
        page: &PageDescriptor,
        options: &CaptureOptions,
    ) -> Result<RgbaImage, ProposalError> {
        let this = self.clone();
        let page_owned = page.clone();
        let opts = options.clone();
        let number = page.number;

        tokio::task::spawn_blocking(move || this.paint(&page_owned, &opts))
            .await
            .map_err(|e| ProposalError::RasterisationFailed {
                page: number,
                detail: format!("paint task panicked: {e}"),
            })
    }
}

// ── Palette & metrics ────────────────────────────────────────────────────

const INK: [u8; 3] = [0x0f, 0x17, 0x2a];
const SLATE: [u8; 3] = [0x1e, 0x29, 0x3b];
const BODY: [u8; 3] = [0x33, 0x41, 0x55];
const MUTED: [u8; 3] = [0x64, 0x74, 0x8b];
const FAINT: [u8; 3] = [0x94, 0xa3, 0xb8];
const RULE: [u8; 3] = [0xe2, 0xe8, 0xf0];
const TABLE_HEAD: [u8; 3] = [0xf1, 0xf5, 0xf9];
const CARD: [u8; 3] = [0xf8, 0xfa, 0xfc];
const WARM: [u8; 3] = [0xff, 0xf7, 0xed];
const WHITE: [u8; 3] = [0xff, 0xff, 0xff];

const MARGIN: f32 = 64.0;
const FOOTER_SPACE: f32 = 76.0;
const BODY_SIZE: f32 = 14.0;
const BODY_LINE: f32 = 23.0;
/// Width of the right-aligned column holding `a)` markers.
const LETTER_COLUMN: f32 = 20.0;

fn opaque(rgb: [u8; 3]) -> Rgba<u8> {
    Rgba([rgb[0], rgb[1], rgb[2], 255])
}

/// Halfway between `color` and `paper`.
fn faded(color: Rgba<u8>, paper: Rgba<u8>) -> Rgba<u8> {
    let mix = |a: u8, b: u8| ((a as u16 + b as u16) / 2) as u8;
    Rgba([
        mix(color[0], paper[0]),
        mix(color[1], paper[1]),
        mix(color[2], paper[2]),
        255,
    ])
}

/// A styled run within one wrapped line.
#[derive(Debug, Clone, PartialEq)]
struct Run {
    text: String,
    strong: bool,
}

// ── Painter ──────────────────────────────────────────────────────────────

/// Cursor-based painter for one page.
struct Painter<'a> {
    img: RgbaImage,
    fonts: &'a FontSet,
    opts: &'a CaptureOptions,
    ratio: f32,
    /// Cursor in CSS px.
    y: f32,
    /// Content may not extend below this line.
    limit: f32,
}

impl<'a> Painter<'a> {
    fn new(fonts: &'a FontSet, opts: &'a CaptureOptions) -> Self {
        let (w, h) = opts.raster_size();
        Self {
            img: RgbaImage::from_pixel(w, h, opts.paper),
            fonts,
            opts,
            ratio: opts.pixel_ratio,
            y: MARGIN,
            limit: opts.height_px as f32 - FOOTER_SPACE,
        }
    }

    fn page_w(&self) -> f32 {
        self.opts.width_px as f32
    }

    fn page_h(&self) -> f32 {
        self.opts.height_px as f32
    }

    fn content_w(&self) -> f32 {
        self.page_w() - 2.0 * MARGIN
    }

    fn dev(&self, v: f32) -> i32 {
        (v * self.ratio).round() as i32
    }

    fn dev_len(&self, v: f32) -> u32 {
        ((v * self.ratio).round() as i64).max(1) as u32
    }

    // ── primitives ──

    fn measure(&self, text: &str, size: f32, strong: bool) -> f32 {
        let font = self.fonts.pick(strong).as_scaled(PxScale::from(size));
        text.chars().map(|c| font.h_advance(font.glyph_id(c))).sum()
    }

    fn text(&mut self, x: f32, y: f32, size: f32, strong: bool, color: Rgba<u8>, text: &str) {
        if text.is_empty() {
            return;
        }
        let fonts = self.fonts;
        let (dx, dy) = (self.dev(x), self.dev(y));
        let scale = PxScale::from(size * self.ratio);
        draw_text_mut(&mut self.img, color, dx, dy, scale, fonts.pick(strong), text);
    }

    fn text_centered(&mut self, cx: f32, y: f32, size: f32, strong: bool, color: Rgba<u8>, text: &str) {
        let w = self.measure(text, size, strong);
        self.text(cx - w / 2.0, y, size, strong, color, text);
    }

    /// Left edge of a lettered marker, right-aligned in its column.
    fn letter_left(&self, x: f32, label: &str) -> f32 {
        x + LETTER_COLUMN - self.measure(label, BODY_SIZE, true)
    }

    fn text_right(&mut self, right: f32, y: f32, size: f32, strong: bool, color: Rgba<u8>, text: &str) {
        let w = self.measure(text, size, strong);
        self.text(right - w, y, size, strong, color, text);
    }

    fn fill(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        let rect = Rect::at(self.dev(x), self.dev(y)).of_size(self.dev_len(w), self.dev_len(h));
        draw_filled_rect_mut(&mut self.img, rect, color);
    }

    fn outline(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        let rect = Rect::at(self.dev(x), self.dev(y)).of_size(self.dev_len(w), self.dev_len(h));
        draw_hollow_rect_mut(&mut self.img, rect, color);
    }

    fn rule(&mut self, y: f32) {
        let w = self.content_w();
        self.fill(MARGIN, y, w, 1.0, opaque(RULE));
    }

    fn dot(&mut self, cx: f32, cy: f32, r: f32, color: Rgba<u8>) {
        let center = (self.dev(cx), self.dev(cy));
        let radius = self.dev(r).max(1);
        draw_filled_circle_mut(&mut self.img, center, radius, color);
    }

    fn fits(&self, h: f32) -> bool {
        self.y + h <= self.limit
    }

    // ── text flow ──

    /// Greedy word wrap of styled spans into lines no wider than `max_w`.
    fn wrap(&self, spans: &[Span], size: f32, max_w: f32) -> Vec<Vec<Run>> {
        let mut lines = Vec::new();
        let mut line: Vec<Run> = Vec::new();
        let mut width = 0.0;

        for span in spans {
            let strong = span.is_strong();
            for word in span.text().split_inclusive(' ') {
                let visible = self.measure(word.trim_end(), size, strong);
                if !line.is_empty() && width + visible > max_w {
                    lines.push(std::mem::take(&mut line));
                    width = 0.0;
                }
                let word = if line.is_empty() { word.trim_start() } else { word };
                if word.is_empty() {
                    continue;
                }
                width += self.measure(word, size, strong);
                match line.last_mut() {
                    Some(run) if run.strong == strong => run.text.push_str(word),
                    _ => line.push(Run {
                        text: word.to_string(),
                        strong,
                    }),
                }
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
        lines
    }

    /// Flow spans from the cursor at column `x`, clipping at the limit.
    fn flow(&mut self, spans: &[Span], x: f32, max_w: f32, size: f32, line_h: f32, color: Rgba<u8>) {
        for line in self.wrap(spans, size, max_w) {
            if self.fits(line_h) {
                let mut cx = x;
                for run in &line {
                    self.text(cx, self.y, size, run.strong, color, &run.text);
                    cx += self.measure(&run.text, size, run.strong);
                }
            }
            self.y += line_h;
        }
    }

    fn flow_plain(&mut self, text: &str, x: f32, max_w: f32, size: f32, line_h: f32, color: Rgba<u8>) {
        self.flow(&[Span::Plain(text.to_string())], x, max_w, size, line_h, color);
    }

    // ── page frame ──

    fn paint(mut self, page: &PageDescriptor) -> RgbaImage {
        if let Some(heading) = &page.heading {
            self.text(MARGIN, self.y, 12.0, true, opaque(FAINT), &heading.to_uppercase());
            self.y += 28.0;
            self.rule(self.y);
            self.y += 32.0;
        }

        match &page.payload {
            PagePayload::Cover {
                title,
                subtitle,
                reference,
                prepared_for,
                country,
                date,
            } => self.cover(title, subtitle, reference, prepared_for, country, date),
            PagePayload::Profile {
                about,
                process,
                mission,
            } => self.profile(about, process, mission),
            PagePayload::Sections(sections) => self.sections(sections),
            PagePayload::Commercials {
                investment,
                payment_cards,
            } => self.commercials(investment, payment_cards),
            PagePayload::GlobalPresence {
                headquarters,
                client_regions,
                home_city,
                stats,
                clients,
            } => self.global_presence(headquarters, client_regions, home_city, stats, clients),
            PagePayload::Contact {
                client,
                website,
                headquarters,
            } => self.contact(client, website, headquarters),
        }

        self.footer(page.number);
        self.img
    }

    fn footer(&mut self, number: usize) {
        let y = self.page_h() - FOOTER_SPACE + 24.0;
        self.rule(y);
        let footer = self.opts.footer.clone();
        let cx = self.page_w() / 2.0;
        self.text_centered(cx, y + 16.0, 11.0, false, opaque(FAINT), &footer);
        let right = self.page_w() - MARGIN;
        self.text_right(right, y + 16.0, 11.0, true, opaque(FAINT), &format!("{number:02}"));
    }

    // ── page bodies ──

    fn cover(
        &mut self,
        title: &str,
        subtitle: &str,
        reference: &str,
        prepared_for: &str,
        country: &str,
        date: &str,
    ) {
        let accent = self.opts.accent;
        let right = self.page_w() - MARGIN;
        let brand = format!("{}.", self.opts.brand_name);
        self.text(MARGIN, MARGIN, 30.0, true, accent, &brand);
        self.text_right(right, MARGIN, 12.0, false, opaque(FAINT), "CONFIDENTIAL");
        self.text_right(right, MARGIN + 18.0, 12.0, false, opaque(FAINT), &format!("Ref: {reference}"));

        self.y = 360.0;
        let top = self.y;
        let max_w = self.content_w() - 48.0;
        self.flow_plain(title, MARGIN + 32.0, max_w, 48.0, 60.0, opaque(SLATE));
        self.y += 12.0;
        self.flow_plain(subtitle, MARGIN + 32.0, max_w, 22.0, 32.0, opaque(MUTED));
        let bottom = self.y;
        self.fill(MARGIN, top - 8.0, 4.0, bottom - top + 8.0, accent);

        let base = self.page_h() - 250.0;
        self.rule(base);
        let label = opaque(FAINT);
        self.text(MARGIN, base + 32.0, 11.0, true, label, "PREPARED FOR");
        self.text(MARGIN, base + 54.0, 20.0, true, opaque(SLATE), prepared_for);
        self.text(MARGIN, base + 84.0, 13.0, false, opaque(MUTED), country);
        self.text_right(right, base + 32.0, 11.0, true, label, "STATEMENT DATE");
        self.text_right(right, base + 54.0, 20.0, false, opaque(SLATE), date);
    }

    fn profile(&mut self, about: &[String], process: &[ProcessStep], mission: &str) {
        let w = self.content_w();
        self.text(MARGIN, self.y, 24.0, true, opaque(SLATE), "Who We Are");
        self.y += 40.0;
        for para in about {
            self.flow_plain(para, MARGIN, w, BODY_SIZE, BODY_LINE, opaque(BODY));
            self.y += 12.0;
        }

        self.y += 20.0;
        self.text(MARGIN, self.y, 24.0, true, opaque(SLATE), "Development Process");
        self.y += 48.0;
        let accent = self.opts.accent;
        for (i, step) in process.iter().enumerate() {
            if !self.fits(64.0) {
                break;
            }
            self.dot(MARGIN + 20.0, self.y + 16.0, 20.0, accent);
            self.text_centered(MARGIN + 20.0, self.y + 8.0, 13.0, true, opaque(WHITE), &format!("{:02}", i + 1));
            self.text(MARGIN + 60.0, self.y, 17.0, true, opaque(SLATE), &step.title);
            self.y += 26.0;
            self.flow_plain(&step.description, MARGIN + 60.0, w - 60.0, BODY_SIZE, BODY_LINE, opaque(MUTED));
            self.y += 22.0;
        }

        self.y += 12.0;
        if self.fits(40.0) {
            self.rule(self.y);
            self.y += 28.0;
            let quoted = format!("\u{201c}{mission}\u{201d}");
            for line in self.wrap(&[Span::Plain(quoted)], 17.0, w - 40.0) {
                let text: String = line.iter().map(|r| r.text.as_str()).collect();
                if self.fits(28.0) {
                    let cx = self.page_w() / 2.0;
                    self.text_centered(cx, self.y, 17.0, false, opaque(SLATE), &text);
                }
                self.y += 28.0;
            }
        }
    }

    fn sections(&mut self, sections: &[Section]) {
        for (i, section) in sections.iter().enumerate() {
            if i > 0 {
                self.y += 8.0;
                if self.fits(1.0) {
                    self.rule(self.y);
                }
                self.y += 28.0;
            }
            self.section(section);
        }
    }

    fn section(&mut self, section: &Section) {
        let mut color = opaque(INK);
        if section.dimmed {
            color = faded(color, self.opts.paper);
        }
        if !section.title.is_empty() && self.fits(34.0) {
            self.text(MARGIN, self.y, 23.0, true, color, &section.title);
        }
        self.y += 40.0;
        let w = self.content_w();
        for block in &section.blocks {
            self.block(block, MARGIN, w);
        }
    }

    fn block(&mut self, block: &Block, x: f32, w: f32) {
        let body = opaque(BODY);
        let accent = self.opts.accent;
        match block {
            Block::Spacer => self.y += 12.0,
            Block::Heading(text) => {
                self.y += 6.0;
                if self.fits(BODY_LINE) {
                    self.text(x, self.y, 17.0, true, opaque(SLATE), text);
                }
                self.y += 30.0;
            }
            Block::KeyValue { label, value } => {
                let spans = [Span::Strong(format!("{label}:")), Span::Plain(value.clone())];
                self.flow(&spans, x, w, BODY_SIZE, BODY_LINE, body);
                self.y += 4.0;
            }
            Block::Numbered { number, content } => {
                if self.fits(BODY_LINE) {
                    self.text_right(x + 26.0, self.y, BODY_SIZE, true, accent, &format!("{number}."));
                }
                self.flow(content, x + 36.0, w - 36.0, BODY_SIZE, BODY_LINE, body);
                self.y += 6.0;
            }
            Block::Bullet { marker, content } => {
                if self.fits(BODY_LINE) {
                    match marker {
                        Marker::Glyph => self.dot(x + 8.0, self.y + 9.0, 3.0, accent),
                        Marker::Letter(_) => {
                            let label = marker.label();
                            let left = self.letter_left(x, &label);
                            self.text(left, self.y, BODY_SIZE, true, accent, &label)
                        }
                    }
                }
                self.flow(content, x + 26.0, w - 26.0, BODY_SIZE, BODY_LINE, body);
                self.y += 4.0;
            }
            Block::Paragraph(spans) => {
                self.flow(spans, x, w, BODY_SIZE, BODY_LINE, body);
                self.y += 6.0;
            }
            Block::Table { headers, rows } => {
                let cols = rows
                    .iter()
                    .map(Vec::len)
                    .chain(std::iter::once(headers.len()))
                    .max()
                    .unwrap_or(1)
                    .max(1);
                let col_w = w / cols as f32;
                self.table_row(headers, cols, col_w, x, true);
                for row in rows {
                    self.table_row(row, cols, col_w, x, false);
                }
                self.y += 12.0;
            }
        }
    }

    fn table_row(&mut self, cells: &[Vec<Span>], cols: usize, col_w: f32, x: f32, header: bool) {
        const PAD: f32 = 8.0;
        const SIZE: f32 = 12.5;
        const LINE: f32 = 19.0;

        let wrapped: Vec<Vec<Vec<Run>>> = (0..cols)
            .map(|c| {
                let cell = cells.get(c).map(Vec::as_slice).unwrap_or(&[]);
                let spans: Vec<Span> = if header {
                    cell.iter().map(|s| Span::Strong(s.text().to_string())).collect()
                } else {
                    cell.to_vec()
                };
                self.wrap(&spans, SIZE, col_w - 2.0 * PAD)
            })
            .collect();
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let row_h = lines as f32 * LINE + 2.0 * PAD;

        if !self.fits(row_h) {
            self.y += row_h;
            return;
        }
        if header {
            self.fill(x, self.y, col_w * cols as f32, row_h, opaque(TABLE_HEAD));
        }
        let color = if header { opaque(INK) } else { opaque(BODY) };
        for (c, cell_lines) in wrapped.iter().enumerate() {
            let cx = x + c as f32 * col_w;
            self.outline(cx, self.y, col_w, row_h, opaque(RULE));
            for (l, line) in cell_lines.iter().enumerate() {
                let mut tx = cx + PAD;
                let ty = self.y + PAD + l as f32 * LINE;
                for run in line {
                    self.text(tx, ty, SIZE, run.strong, color, &run.text);
                    tx += self.measure(&run.text, SIZE, run.strong);
                }
            }
        }
        self.y += row_h;
    }

    fn commercials(&mut self, investment: &Section, cards: &[PaymentCard]) {
        let top = self.y + 40.0;
        self.section(investment);
        let bottom = self.y.min(self.limit);
        if bottom > top {
            let accent = self.opts.accent;
            self.fill(MARGIN - 14.0, top, 4.0, bottom - top, accent);
        }

        self.y += 8.0;
        if !self.fits(240.0) {
            return;
        }
        self.rule(self.y);
        self.y += 28.0;
        self.text(MARGIN, self.y, 23.0, true, opaque(INK), "Payment Terms");
        self.y += 48.0;

        let gap = 24.0;
        let shown = cards.len().clamp(1, 2);
        let card_w = (self.content_w() - gap * (shown - 1) as f32) / shown as f32;
        let card_h = 170.0;
        let top = self.y;
        for (i, card) in cards.iter().take(2).enumerate() {
            let x = MARGIN + i as f32 * (card_w + gap);
            let bg = if i == 0 { CARD } else { WARM };
            self.fill(x, top, card_w, card_h, opaque(bg));
            self.outline(x, top, card_w, card_h, opaque(RULE));
            let badge = format!("{:02}", i + 1);
            self.text_right(x + card_w - 12.0, top + 8.0, 11.0, true, opaque(MUTED), &badge);
            self.y = top + 24.0;
            self.flow_plain(&card.title, x + 20.0, card_w - 40.0, 17.0, 24.0, opaque(INK));
            self.y += 6.0;
            self.flow_plain(&card.description, x + 20.0, card_w - 40.0, 13.0, 20.0, opaque(MUTED));
        }
        self.y = top + card_h;
    }

    fn global_presence(
        &mut self,
        headquarters: &[String],
        regions: &[String],
        home_city: &str,
        stats: &[Stat],
        clients: &[String],
    ) {
        let accent = self.opts.accent;
        let w = self.content_w();
        self.text(MARGIN, self.y, 52.0, true, accent, "Global Presence");
        self.y += 96.0;

        let top = self.y;
        self.text(MARGIN, top, 30.0, true, opaque(INK), "HQ");
        let hq_right = MARGIN + w * 0.4 - 24.0;
        for (i, place) in headquarters.iter().enumerate() {
            self.text_right(hq_right, top + 4.0 + i as f32 * 24.0, 15.0, false, opaque(BODY), place);
        }
        let divider_x = MARGIN + w * 0.4;
        let column_h = (headquarters.len().max(2) as f32) * 24.0;
        self.fill(divider_x, top, 1.0, column_h, opaque(RULE));

        let clients_x = divider_x + 32.0;
        self.text(clients_x, top, 30.0, true, opaque(INK), "Clients In");
        self.y = top + 44.0;
        self.flow_plain(&regions.join(", "), clients_x, MARGIN + w - clients_x, 15.0, 24.0, opaque(BODY));
        self.y = self.y.max(top + column_h) + 48.0;

        let bar_h = 130.0;
        if self.fits(bar_h) {
            let bar_top = self.y;
            self.fill(MARGIN, bar_top, w, bar_h, accent);
            let white = opaque(WHITE);
            self.text(MARGIN + 28.0, bar_top + 32.0, 26.0, true, white, "Websites in Numbers");
            self.text(MARGIN + 28.0, bar_top + 74.0, 14.0, false, white, home_city);
            let slot = 96.0;
            let right = MARGIN + w - 28.0;
            for (i, stat) in stats.iter().rev().enumerate() {
                let cx = right - slot / 2.0 - i as f32 * slot;
                self.text_centered(cx, bar_top + 34.0, 32.0, true, white, &stat.value);
                self.text_centered(cx, bar_top + 80.0, 11.0, true, white, &stat.label.to_uppercase());
            }
            self.y = bar_top + bar_h + 48.0;
        }

        let per_row = 4;
        let cell_w = w / per_row as f32;
        for row in clients.chunks(per_row) {
            if !self.fits(40.0) {
                break;
            }
            for (i, name) in row.iter().enumerate() {
                let cx = MARGIN + cell_w * (i as f32 + 0.5);
                self.text_centered(cx, self.y, 15.0, true, opaque(FAINT), name);
            }
            self.y += 44.0;
        }
    }

    fn contact(&mut self, client: &crate::analysis::ClientRecord, website: &str, headquarters: &[String]) {
        let w = self.content_w();
        self.text(MARGIN, self.y, 34.0, true, opaque(INK), "Let's Build It Together");
        self.y += 60.0;
        let invite = format!(
            "Thank you for considering {}. Reply to this proposal or reach us through our website to schedule a discovery call.",
            self.opts.brand_name
        );
        self.flow_plain(&invite, MARGIN, w, 15.0, 25.0, opaque(BODY));
        self.y += 36.0;

        let rows = [
            ("Prepared For", client.name.as_str()),
            ("Email", client.email.as_str()),
            ("Phone", client.contact_number.as_str()),
            ("Country", client.country.as_str()),
            ("Currency", client.currency_code.as_str()),
        ];
        for (label, value) in rows.iter().filter(|(_, v)| !v.trim().is_empty()) {
            if !self.fits(36.0) {
                break;
            }
            self.text(MARGIN, self.y, 12.0, true, opaque(FAINT), &label.to_uppercase());
            self.text(MARGIN + 170.0, self.y - 2.0, 16.0, false, opaque(SLATE), value);
            self.y += 36.0;
        }

        self.y += 24.0;
        if self.fits(80.0) {
            self.rule(self.y);
            self.y += 28.0;
            let accent = self.opts.accent;
            self.text(MARGIN, self.y, 18.0, true, accent, website);
            self.y += 32.0;
            self.flow_plain(&headquarters.join("  ·  "), MARGIN, w, 14.0, 22.0, opaque(MUTED));
        }
    }
}
