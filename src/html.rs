//! Standalone HTML rendering of a composed report.
//!
//! Each page becomes one fixed-size `<section class="print-page">` with the
//! page's `pdf-page-N` id and `overflow: hidden`, so the browser preview
//! clips exactly where the rasteriser does. All text is escaped; the model
//! output never reaches the document as markup.

use crate::error::ProposalError;
use crate::export::write_atomic;
use crate::pipeline::compose::{ComposedReport, PageDescriptor, PagePayload, Section};
use crate::pipeline::inline::Span;
use crate::pipeline::section::Block;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;
use std::path::Path;
use tracing::info;

fn esc(text: &str) -> std::borrow::Cow<'_, str> {
    encode_text(text)
}

fn spans(out: &mut String, content: &[Span]) {
    for span in content {
        match span {
            Span::Plain(t) => out.push_str(&esc(t)),
            Span::Strong(t) => {
                let _ = write!(out, "<strong>{}</strong>", esc(t));
            }
        }
    }
}

fn block(out: &mut String, b: &Block) {
    match b {
        Block::Spacer => out.push_str("<div class=\"spacer\"></div>\n"),
        Block::Heading(t) => {
            let _ = writeln!(out, "<h4>{}</h4>", esc(t));
        }
        Block::KeyValue { label, value } => {
            let _ = writeln!(
                out,
                "<p class=\"kv\"><strong>{}:</strong>{}</p>",
                esc(label),
                esc(value)
            );
        }
        Block::Numbered { number, content } => {
            let _ = write!(out, "<p class=\"item\"><span class=\"num\">{}.</span> ", esc(number));
            spans(out, content);
            out.push_str("</p>\n");
        }
        Block::Bullet { marker, content } => {
            let _ = write!(
                out,
                "<p class=\"item\"><span class=\"marker\">{}</span> ",
                esc(&marker.label())
            );
            spans(out, content);
            out.push_str("</p>\n");
        }
        Block::Paragraph(content) => {
            out.push_str("<p>");
            spans(out, content);
            out.push_str("</p>\n");
        }
        Block::Table { headers, rows } => {
            out.push_str("<table>\n<thead><tr>");
            for h in headers {
                out.push_str("<th>");
                spans(out, h);
                out.push_str("</th>");
            }
            out.push_str("</tr></thead>\n<tbody>\n");
            for row in rows {
                out.push_str("<tr>");
                for cell in row {
                    out.push_str("<td>");
                    spans(out, cell);
                    out.push_str("</td>");
                }
                out.push_str("</tr>\n");
            }
            out.push_str("</tbody>\n</table>\n");
        }
    }
}

fn section(out: &mut String, s: &Section) {
    let class = if s.dimmed { "section dimmed" } else { "section" };
    let _ = writeln!(out, "<div class=\"{class}\">");
    if !s.title.is_empty() {
        let _ = writeln!(out, "<h3>{}</h3>", esc(&s.title));
    }
    for b in &s.blocks {
        block(out, b);
    }
    out.push_str("</div>\n");
}

fn list(out: &mut String, items: &[String]) {
    out.push_str("<ul>");
    for item in items {
        let _ = write!(out, "<li>{}</li>", esc(item));
    }
    out.push_str("</ul>\n");
}

fn payload(out: &mut String, p: &PagePayload) {
    match p {
        PagePayload::Cover {
            title,
            subtitle,
            reference,
            prepared_for,
            country,
            date,
        } => {
            let _ = writeln!(
                out,
                "<div class=\"cover\">\n<p class=\"ref\">{}</p>\n<h1>{}</h1>\n<h2>{}</h2>\n\
                 <dl><dt>Prepared for</dt><dd>{}</dd><dt>Country</dt><dd>{}</dd>\
                 <dt>Date</dt><dd>{}</dd></dl>\n</div>",
                esc(reference),
                esc(title),
                esc(subtitle),
                esc(prepared_for),
                esc(country),
                esc(date)
            );
        }
        PagePayload::Profile {
            about,
            process,
            mission,
        } => {
            for para in about {
                let _ = writeln!(out, "<p>{}</p>", esc(para));
            }
            out.push_str("<ol class=\"process\">");
            for step in process {
                let _ = write!(
                    out,
                    "<li><strong>{}</strong> {}</li>",
                    esc(&step.title),
                    esc(&step.description)
                );
            }
            out.push_str("</ol>\n");
            let _ = writeln!(out, "<blockquote>{}</blockquote>", esc(mission));
        }
        PagePayload::Sections(sections) => sections.iter().for_each(|s| section(out, s)),
        PagePayload::Commercials {
            investment,
            payment_cards,
        } => {
            section(out, investment);
            out.push_str("<div class=\"cards\">\n");
            for card in payment_cards {
                let _ = writeln!(
                    out,
                    "<div class=\"card\"><h4>{}</h4><p>{}</p></div>",
                    esc(&card.title),
                    esc(&card.description)
                );
            }
            out.push_str("</div>\n");
        }
        PagePayload::GlobalPresence {
            headquarters,
            client_regions,
            home_city,
            stats,
            clients,
        } => {
            out.push_str("<h3>Headquarters</h3>\n");
            list(out, headquarters);
            out.push_str("<h3>Client Regions</h3>\n");
            list(out, client_regions);
            let _ = writeln!(out, "<p class=\"city\">{}</p>", esc(home_city));
            out.push_str("<div class=\"stats\">");
            for stat in stats {
                let _ = write!(
                    out,
                    "<div class=\"stat\"><strong>{}</strong><span>{}</span></div>",
                    esc(&stat.value),
                    esc(&stat.label)
                );
            }
            out.push_str("</div>\n<h3>Clients</h3>\n");
            list(out, clients);
        }
        PagePayload::Contact {
            client,
            website,
            headquarters,
        } => {
            let _ = writeln!(
                out,
                "<dl class=\"contact\"><dt>Name</dt><dd>{} {}</dd><dt>Email</dt><dd>{}</dd>\
                 <dt>Contact</dt><dd>{}</dd><dt>Country</dt><dd>{}</dd>\
                 <dt>Currency</dt><dd>{}</dd></dl>",
                esc(&client.flag_glyph),
                esc(&client.name),
                esc(&client.email),
                esc(&client.contact_number),
                esc(&client.country),
                esc(&client.currency_code)
            );
            let _ = writeln!(
                out,
                "<p><a href=\"{}\">{}</a></p>",
                encode_double_quoted_attribute(website),
                esc(website)
            );
            list(out, headquarters);
        }
    }
}

fn page(out: &mut String, p: &PageDescriptor, website: &str) {
    let _ = writeln!(
        out,
        "<section class=\"print-page\" id=\"{}\">",
        encode_double_quoted_attribute(&p.page_id)
    );
    if let Some(heading) = &p.heading {
        let _ = writeln!(out, "<header>{}</header>", esc(heading));
    }
    out.push_str("<div class=\"body\">\n");
    payload(out, &p.payload);
    out.push_str("</div>\n");
    let _ = writeln!(
        out,
        "<footer><span>{}</span><span class=\"folio\">{:02}</span></footer>\n</section>",
        esc(website),
        p.number
    );
}

/// Render `report` as one standalone HTML document.
pub fn render_html(report: &ComposedReport) -> String {
    let brand = &report.brand;
    let mut out = String::with_capacity(64 * 1024);
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>\n\
         body {{ margin: 0; background: #e5e5e5; font-family: Inter, Helvetica, Arial, sans-serif; }}\n\
         .print-page {{ position: relative; width: 794px; height: 1123px; overflow: hidden; \
         margin: 24px auto; padding: 48px 56px 76px; box-sizing: border-box; background: {paper}; }}\n\
         .print-page header {{ font-size: 11px; letter-spacing: 0.12em; text-transform: uppercase; \
         color: {accent}; border-bottom: 1px solid {accent}; padding-bottom: 6px; margin-bottom: 20px; }}\n\
         .print-page footer {{ position: absolute; left: 56px; right: 56px; bottom: 28px; \
         display: flex; justify-content: center; font-size: 10px; color: #777; }}\n\
         .print-page footer .folio {{ position: absolute; right: 0; }}\n\
         h1 {{ font-size: 40px; }} h3 {{ color: {accent}; font-size: 16px; }}\n\
         .section.dimmed {{ opacity: 0.55; }} .spacer {{ height: 10px; }}\n\
         .marker, .num {{ color: {accent}; font-weight: 600; }}\n\
         table {{ width: 100%; border-collapse: collapse; font-size: 11px; }}\n\
         th, td {{ border: 1px solid #ddd; padding: 4px 6px; text-align: left; }}\n\
         .cards {{ display: flex; gap: 12px; }} .card {{ flex: 1; border: 1px solid {accent}; padding: 12px; }}\n\
         @media print {{ body {{ background: none; }} .print-page {{ margin: 0; page-break-after: always; }} }}\n\
         </style>\n</head>\n<body>\n",
        title = esc(&report.filename),
        paper = encode_text(&brand.paper),
        accent = encode_text(&brand.accent),
    );
    for p in &report.pages {
        page(&mut out, p, brand.website_host());
    }
    out.push_str("</body>\n</html>\n");
    out
}

/// Render `report` and write it to `path`.
pub async fn write_html(report: &ComposedReport, path: &Path) -> Result<(), ProposalError> {
    let html = render_html(report);
    write_atomic(path, html.as_bytes()).await?;
    info!("Wrote {} pages of HTML to {}", report.page_count(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{sample_report, AnalysisDocument};
    use crate::config::ReportConfig;
    use crate::pipeline::compose::compose_report;
    use chrono::NaiveDate;

    fn composed(analysis: &AnalysisDocument) -> ComposedReport {
        let input = sample_report();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        compose_report(&input.client, Some(analysis), &ReportConfig::default(), date).unwrap()
    }

    #[test]
    fn one_section_per_page() {
        let input = sample_report();
        let report = composed(input.analysis.as_ref().unwrap());
        let html = render_html(&report);
        assert_eq!(html.matches("class=\"print-page\"").count(), report.page_count());
        for p in &report.pages {
            assert!(html.contains(&format!("id=\"{}\"", p.page_id)));
        }
        assert!(html.contains("overflow: hidden"));
    }

    #[test]
    fn model_text_is_escaped() {
        let doc = AnalysisDocument::from_json_str(
            r#"{"projectName": "<script>alert(1)</script>", "scopeOfWork": "- **A & B**"}"#,
        )
        .unwrap();
        let html = render_html(&composed(&doc));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<strong>A &amp; B</strong>"));
    }

    #[tokio::test]
    async fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = sample_report();
        let report = composed(input.analysis.as_ref().unwrap());
        let path = dir.path().join("out/report.html");
        write_html(&report, &path).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("<!DOCTYPE html>"));
    }
}
