//! Static marketing copy for the fixed proposal pages.
//!
//! Cover, company profile, commercials cards, global presence and contact
//! pages are parameterised only by the client and the date; everything else
//! they show comes from a [`BrandProfile`]. The default profile carries the
//! agency copy the funnel shipped with.

use serde::{Deserialize, Serialize};

/// One numbered step of the development process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStep {
    pub title: String,
    pub description: String,
}

/// A headline figure on the global-presence page, e.g. `450+ Projects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub value: String,
    pub label: String,
}

/// A payment-terms card on the commercials page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCard {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandProfile {
    /// Short brand name; also the filename prefix.
    pub name: String,
    pub legal_name: String,
    pub website: String,
    /// Prefixes the model tends to prepend to project titles.
    pub title_prefixes: Vec<String>,
    pub document_subtitle: String,
    /// Fixed suffix of the cover reference, `PROJ-{year}-{suffix}`.
    pub reference_suffix: String,
    pub about: Vec<String>,
    pub process: Vec<ProcessStep>,
    pub mission: String,
    pub headquarters: Vec<String>,
    pub client_regions: Vec<String>,
    pub home_city: String,
    pub stats: Vec<Stat>,
    pub clients: Vec<String>,
    pub payment_cards: Vec<PaymentCard>,
    /// Primary accent colour as `#RRGGBB`.
    pub accent: String,
    /// Page background colour as `#RRGGBB`.
    pub paper: String,
}

impl Default for BrandProfile {
    fn default() -> Self {
        let step = |title: &str, description: &str| ProcessStep {
            title: title.into(),
            description: description.into(),
        };
        let stat = |value: &str, label: &str| Stat {
            value: value.into(),
            label: label.into(),
        };
        Self {
            name: "Talentronaut".into(),
            legal_name: "Talentronaut Technologies".into(),
            website: "https://www.talentronaut.in".into(),
            title_prefixes: vec!["Talentronaut".into(), "Talentronout".into()],
            document_subtitle: "Project Proposal & Execution Plan".into(),
            reference_suffix: "8832".into(),
            about: vec![
                "Talentronaut Technologies is a premium, full-stack software development agency based in India, serving clients across the globe. We specialize in building secure, scalable, and high-performance custom software solutions that drive digital transformation.".into(),
                "With deep expertise in modern technologies and cross-industry insights, we turn bold ideas into future-ready digital products.".into(),
            ],
            process: vec![
                step("Discover & Define", "Ideation workshops, requirement mapping & stakeholder alignment."),
                step("Design", "Prototyping, UI/UX creation, system architecture blueprints."),
                step("Develop", "Agile-based development cycles with regular releases."),
                step("Test & Deploy", "QA, performance audits, secure deployment."),
            ],
            mission: "To engineer powerful software experiences that drive business growth, user engagement, and operational efficiency.".into(),
            headquarters: vec!["Chennai, TN".into(), "Pune, MH".into(), "Aurangabad, MH".into()],
            client_regions: ["USA", "UAE", "UK", "Australia", "Singapore", "Germany"]
                .into_iter()
                .map(String::from)
                .collect(),
            home_city: "Chennai, TN, India".into(),
            stats: vec![stat("4+", "Years"), stat("250", "Clients"), stat("450+", "Projects")],
            clients: [
                "Spazorlab",
                "Yugandhara",
                "LinksUs",
                "SM Consultancy",
                "EnviFuture",
                "Mask Prod.",
                "SportzDen",
                "Immortals",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            payment_cards: vec![
                PaymentCard {
                    title: "50% Advance to Initiate".into(),
                    description: "Required to mobilize the development team, set up the infrastructure, and kickstart the design phase.".into(),
                },
                PaymentCard {
                    title: "50% Title Transfer".into(),
                    description: "Payable upon successful User Acceptance Testing (UAT) sign-off and before the final source code handover.".into(),
                },
            ],
            accent: "#D94632".into(),
            paper: "#fffcfb".into(),
        }
    }
}

impl BrandProfile {
    /// Website without the scheme, for compact footers.
    pub fn website_host(&self) -> &str {
        self.website
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
    }

    /// Cover reference for the given year, e.g. `PROJ-2026-8832`.
    pub fn reference(&self, year: i32) -> String {
        format!("PROJ-{year}-{}", self.reference_suffix)
    }

    /// Strip a leading brand prefix (and any `:`/whitespace after it) from a
    /// model-written project title. Case-insensitive.
    pub fn strip_title_prefix<'a>(&self, title: &'a str) -> &'a str {
        let trimmed = title.trim_start();
        for prefix in &self.title_prefixes {
            let n = prefix.len();
            let matches = trimmed
                .get(..n)
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
            if matches {
                return trimmed[n..].trim_start_matches(|c: char| c == ':' || c.is_whitespace());
            }
        }
        trimmed
    }
}

/// Parse `#RRGGBB` into RGB bytes. Falls back to black on malformed input.
pub fn parse_hex_color(hex: &str) -> [u8; 3] {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return [0, 0, 0];
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0);
    [channel(0), channel(2), channel(4)]
}
