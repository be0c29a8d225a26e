//! Pipeline stages, from form input to PDF bytes.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the rendering backend can change without touching composition.
//!
//! ## Data Flow
//!
//! ```text
//! attachment ──▶ encode ──▶ llm ──▶ postprocess            (analysis)
//!  (path/URL)    (images)   (chat)  (fences, JSON)
//!
//! markdown ──▶ inline/table ──▶ section ──▶ paginate ──▶ compose
//!  (classify)   (spans, grid)   (blocks)    (chunks)     (pages)
//!
//! compose ──▶ raster ──▶ assemble                          (export)
//!  (pages)    (RGBA)     (A4 PDF)
//! ```
//!
//! 1. [`attachment`]: load a local file or URL, check size and type,
//!    extract PDF text via pdfium in `spawn_blocking`
//! 2. [`encode`]: downscale and base64-wrap image attachments
//! 3. [`llm`]: the analysis call with retry/backoff; the only stage with
//!    model I/O
//! 4. [`postprocess`]: strip fences and stray prose around the JSON
//! 5. [`markdown`], [`inline`], [`table`]: the line classifier, `**` spans
//!    and pipe tables
//! 6. [`section`]: turn a field into blocks, with lettered bullets where
//!    asked
//! 7. [`paginate`]: split long content over a first page and continuations
//! 8. [`compose`]: the fixed page sequence for either analysis shape
//! 9. [`raster`]: paint one page descriptor into an image
//! 10. [`assemble`]: place the images on A4 pages of one PDF

pub mod assemble;
pub mod attachment;
pub mod compose;
pub mod encode;
pub mod inline;
pub mod llm;
pub mod markdown;
pub mod paginate;
pub mod postprocess;
pub mod raster;
pub mod section;
pub mod table;
