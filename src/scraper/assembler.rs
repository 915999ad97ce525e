//! Member page → [`MemberRecord`].

use crate::error::ScrapeError;
use crate::models::{IdentifierUniverse, MemberId, MemberProfile, MemberRecord};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::extract::{POLITICAL_RULES, PERSONAL_RULES, Rule};

/// Parsed member page. Lives only until its record is assembled.
pub struct MemberPage {
    doc: Html,
}

impl MemberPage {
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }

    /// `div.partia ul.data`
    fn political_block(&self) -> Result<ElementRef<'_>, ScrapeError> {
        let partia = selector("div.partia")?;
        let data = selector("ul.data")?;
        self.doc
            .select(&partia)
            .find_map(|div| div.select(&data).next())
            .ok_or(ScrapeError::MissingRequiredSection("political info (div.partia ul.data)"))
    }

    /// `div.cv`
    fn personal_block(&self) -> Result<ElementRef<'_>, ScrapeError> {
        let cv = selector("div.cv")?;
        self.doc
            .select(&cv)
            .next()
            .ok_or(ScrapeError::MissingRequiredSection("personal info (div.cv)"))
    }
}

pub(crate) fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(format!("{}: {:?}", css, e)))
}

/// Build the record for `id` from its page. Both info blocks must exist;
/// every field inside them is optional.
pub fn assemble_record(
    id: MemberId,
    link: &str,
    page: &MemberPage,
    email_anchor_id: &str,
    universe: &IdentifierUniverse,
) -> Result<MemberRecord, ScrapeError> {
    let political = page.political_block()?;
    let personal = page.personal_block()?;
    let root = page.doc.root_element();

    let mut profile = MemberProfile::default();

    for rule in POLITICAL_RULES {
        rule.apply(political, &mut profile)?;
    }
    for rule in PERSONAL_RULES {
        rule.apply(personal, &mut profile)?;
    }

    let page_rules = [Rule::Heading, Rule::Email { anchor_id: email_anchor_id }];
    for rule in &page_rules {
        rule.apply(root, &mut profile)?;
    }

    debug!(
        "{}: {:?} {:?}, club={:?}, email={}",
        id,
        profile.name,
        profile.surname,
        profile.club,
        profile.email.is_some()
    );

    MemberRecord::new(id, link, profile, universe)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
