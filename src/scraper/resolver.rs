//! Active-member listing page → [`IdentifierUniverse`].

use crate::error::ScrapeError;
use crate::models::{IdentifierUniverse, MemberId};
use scraper::Html;
use tracing::{debug, warn};
use url::Url;

use super::assembler::selector;

/// Collect member ids from `div#contentBody ul.deputies li a[href]`.
///
/// Relative hrefs are resolved against `page_url`; the id is the `id` query
/// parameter. Repeats keep their first position. An empty result is an error.
pub fn resolve_identifiers(html: &str, page_url: &Url) -> Result<IdentifierUniverse, ScrapeError> {
    let doc = Html::parse_document(html);

    let content = selector("div#contentBody")?;
    let deputies = selector("ul.deputies")?;
    let item = selector("li")?;
    let anchor = selector("a")?;

    let main = doc
        .select(&content)
        .next()
        .ok_or(ScrapeError::MissingRequiredSection("listing content (div#contentBody)"))?;

    let mut ids = Vec::new();
    for group in main.select(&deputies) {
        for li in group.select(&item) {
            let Some(href) = li.select(&anchor).next().and_then(|a| a.value().attr("href")) else {
                continue;
            };
            match id_from_href(href, page_url) {
                Some(id) => ids.push(id),
                None => warn!("No member id in listing link {:?}", href),
            }
        }
    }

    let universe = IdentifierUniverse::from_ids(ids);
    if universe.is_empty() {
        return Err(ScrapeError::EmptyIdentifierUniverse);
    }
    debug!("Resolved {} member ids", universe.len());
    Ok(universe)
}

fn id_from_href(href: &str, base: &Url) -> Option<MemberId> {
    let url = base.join(href).ok()?;
    let (_, value) = url.query_pairs().find(|(key, _)| key == "id")?;
    MemberId::parse(&value).ok()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn listing_html(groups: &[&[&str]]) -> String {
        let mut body = String::new();
        for group in groups {
            body.push_str("<ul class=\"deputies\">");
            for id in *group {
                body.push_str(&format!(
                    "<li><div class=\"deputyName\"><a href=\"/Sejm9.nsf/posel.xsp?id={}&amp;type=A\">Poseł {}</a></div></li>",
                    id, id
                ));
            }
            body.push_str("</ul>");
        }
        format!(
            "<html><body><div id=\"contentBody\">{}</div></body></html>",
            body
        )
    }

    fn base() -> Url {
        Url::parse("https://sejm.gov.pl/Sejm9.nsf/poslowie.xsp?type=A").unwrap()
    }

    #[test]
    fn test_resolves_ids_in_order() {
        let html = listing_html(&[&["001", "002"], &["003"]]);
        let universe = resolve_identifiers(&html, &base()).unwrap();
        let ids: Vec<&str> = universe.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["001", "002", "003"]);
    }

    #[test]
    fn test_duplicate_across_groups_kept_once() {
        let html = listing_html(&[&["005", "002"], &["002", "007"]]);
        let universe = resolve_identifiers(&html, &base()).unwrap();
        let ids: Vec<&str> = universe.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["005", "002", "007"]);
    }

    #[test]
    fn test_id_without_trailing_params() {
        let html = r#"<div id="contentBody"><ul class="deputies"><li><a href="posel.xsp?id=460">X</a></li></ul></div>"#;
        let universe = resolve_identifiers(html, &base()).unwrap();
        assert!(universe.contains(&MemberId::parse("460").unwrap()));
    }

    #[test]
    fn test_empty_listing_is_error() {
        let html = r#"<div id="contentBody"><ul class="deputies"></ul></div>"#;
        assert!(matches!(
            resolve_identifiers(html, &base()),
            Err(ScrapeError::EmptyIdentifierUniverse)
        ));
    }

    #[test]
    fn test_ignores_lists_outside_content() {
        let html = r#"<ul class="deputies"><li><a href="posel.xsp?id=001">X</a></li></ul><div id="contentBody"></div>"#;
        assert!(matches!(
            resolve_identifiers(html, &base()),
            Err(ScrapeError::EmptyIdentifierUniverse)
        ));
    }
}
