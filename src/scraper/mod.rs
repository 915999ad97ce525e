pub mod assembler;
pub mod extract;
pub mod http_client;
pub mod resolver;
pub mod throttle;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::models::MemberId;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use self::http_client::HttpClient;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Where listing and member pages come from.
#[async_trait]
pub trait MemberSource: Send + Sync {
    /// URL of the active-members listing; relative links resolve against it.
    fn listing_url(&self) -> &Url;

    fn member_url(&self, id: &MemberId) -> String;

    async fn fetch_listing(&self) -> Result<String, ScrapeError>;

    async fn fetch_member_page(&self, id: &MemberId) -> Result<String, ScrapeError>;
}

// ── sejm.gov.pl scraper ───────────────────────────────────────────────────────

pub struct SejmScraper {
    client: HttpClient,
    term_url: String,
    term: u32,
    listing_url: Url,
}

impl SejmScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let term_url = format!(
            "{}/Sejm{}.nsf",
            config.base_url.trim_end_matches('/'),
            config.term
        );
        let listing_url = Url::parse(&format!("{}/poslowie.xsp?type=A", term_url))
            .with_context(|| format!("Invalid base_url {:?}", config.base_url))?;

        Ok(Self {
            client: HttpClient::new(config)?,
            term_url,
            term: config.term,
            listing_url,
        })
    }

    /// Speeches given by the member.
    pub fn speeches_url(&self, id: &MemberId) -> String {
        format!(
            "{}/wypowiedzi.xsp?id={}&type=P&symbol=WYPOWIEDZI_POSLA",
            self.term_url, id
        )
    }

    /// The member's voting record.
    pub fn votings_url(&self, id: &MemberId) -> String {
        format!(
            "{}/agent.xsp?symbol=POSELGL&NrKadencji={}&Nrl={}",
            self.term_url, self.term, id
        )
    }
}

#[async_trait]
impl MemberSource for SejmScraper {
    fn listing_url(&self) -> &Url {
        &self.listing_url
    }

    fn member_url(&self, id: &MemberId) -> String {
        format!("{}/posel.xsp?id={}", self.term_url, id)
    }

    async fn fetch_listing(&self) -> Result<String, ScrapeError> {
        info!("Fetching member listing ({})", self.listing_url);
        self.client.get_text(self.listing_url.as_str()).await
    }

    async fn fetch_member_page(&self, id: &MemberId) -> Result<String, ScrapeError> {
        let url = self.member_url(id);
        debug!("Fetching member page: {}", url);
        self.client.get_text(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_layout() {
        let config = ScraperConfig {
            base_url: "https://sejm.gov.pl/".into(),
            ..Default::default()
        };
        let scraper = SejmScraper::new(&config).unwrap();
        let id = MemberId::parse("1").unwrap();

        assert_eq!(
            scraper.listing_url().as_str(),
            "https://sejm.gov.pl/Sejm9.nsf/poslowie.xsp?type=A"
        );
        assert_eq!(
            scraper.member_url(&id),
            "https://sejm.gov.pl/Sejm9.nsf/posel.xsp?id=001"
        );
        assert_eq!(
            scraper.speeches_url(&id),
            "https://sejm.gov.pl/Sejm9.nsf/wypowiedzi.xsp?id=001&type=P&symbol=WYPOWIEDZI_POSLA"
        );
        assert_eq!(
            scraper.votings_url(&id),
            "https://sejm.gov.pl/Sejm9.nsf/agent.xsp?symbol=POSELGL&NrKadencji=9&Nrl=001"
        );
    }
}
