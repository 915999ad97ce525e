//! Run loop: listing → ids → member pages → records → table.
//!
//! Strictly sequential. Each new record is persisted before the next id is
//! fetched, so a crashed run resumes where it stopped: ids already in the
//! table are skipped.
//!
//! Per-record failures (missing section, malformed date, 4xx) are logged and
//! skipped. [`ScrapeError::is_fatal`] failures end the run.

use crate::error::ScrapeError;
use crate::models::{IdentifierUniverse, MemberId, MemberRecord};
use crate::scraper::MemberSource;
use crate::scraper::assembler::{MemberPage, assemble_record};
use crate::scraper::resolver::resolve_identifiers;
use crate::storage::RecordStore;
use anyhow::{Context, Result};
use tracing::{info, warn};

pub struct Pipeline<S> {
    source: S,
    store: RecordStore,
    email_anchor_id: String,
    limit: Option<usize>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineStats {
    pub total: usize,
    pub scraped: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Resolve the identifier universe from the source's listing page.
pub async fn load_universe<S: MemberSource>(source: &S) -> Result<IdentifierUniverse, ScrapeError> {
    let html = source.fetch_listing().await?;
    resolve_identifiers(&html, source.listing_url())
}

/// Fetch and assemble one member without touching the table.
pub async fn scrape_member<S: MemberSource>(
    source: &S,
    id: &MemberId,
    email_anchor_id: &str,
    universe: &IdentifierUniverse,
) -> Result<MemberRecord, ScrapeError> {
    let html = source.fetch_member_page(id).await?;
    let page = MemberPage::parse(&html);
    assemble_record(
        id.clone(),
        &source.member_url(id),
        &page,
        email_anchor_id,
        universe,
    )
}

impl<S: MemberSource> Pipeline<S> {
    pub fn new(source: S, store: RecordStore, email_anchor_id: impl Into<String>) -> Self {
        Self {
            source,
            store,
            email_anchor_id: email_anchor_id.into(),
            limit: None,
        }
    }

    /// Stop after this many newly scraped records.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub async fn run(&mut self) -> Result<PipelineStats> {
        let universe = load_universe(&self.source)
            .await
            .context("Could not resolve member identifiers")?;
        info!("{} active members listed", universe.len());

        let mut stats = PipelineStats {
            total: universe.len(),
            ..Default::default()
        };

        for id in universe.iter() {
            if self.limit.is_some_and(|limit| stats.scraped >= limit) {
                info!("Reached limit of {} new records, stopping", stats.scraped);
                break;
            }

            if self.store.contains(id) {
                info!("ID {} already in table, skipping", id);
                stats.skipped += 1;
                continue;
            }

            info!("Scraping member {}", id);
            match scrape_member(&self.source, id, &self.email_anchor_id, &universe).await {
                Ok(record) => {
                    if self.store.append(&record) {
                        self.store
                            .persist()
                            .with_context(|| format!("Failed to save table after {}", id))?;
                        info!(
                            "Scraped {}: {} {}",
                            id,
                            record.profile().name.as_deref().unwrap_or("?"),
                            record.profile().surname.as_deref().unwrap_or("?")
                        );
                        stats.scraped += 1;
                    } else {
                        stats.skipped += 1;
                    }
                }
                Err(e) if e.is_fatal() => {
                    return Err(e).with_context(|| format!("Giving up at member {}", id));
                }
                Err(e) => {
                    warn!("Failed {}: {}", id, e);
                    stats.failed += 1;
                }
            }
        }

        info!(
            "=== Done: {} listed | {} scraped | {} skipped | {} failed | {} rows in {:?} ===",
            stats.total,
            stats.scraped,
            stats.skipped,
            stats.failed,
            self.store.len(),
            self.store.path(),
        );

        Ok(stats)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
