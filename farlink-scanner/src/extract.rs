use crate::link::Link;
use std::collections::HashSet;
use tracing::debug;

/// Resolves every raw href against `page_url` and keeps only the links whose
/// authority (user info, host and port) differs from the page's.
///
/// Authorities are compared as resolved strings. A link without a host
/// (`mailto:`, `javascript:`) never matches a hosted page, so it is kept.
/// Hrefs that do not resolve are skipped.
pub fn extract_external_links<I, S>(page_url: &Link, raw_hrefs: I) -> HashSet<Link>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let page_authority = page_url.authority();
    let mut links = HashSet::new();

    for href in raw_hrefs {
        let href = href.as_ref();
        let Some(resolved) = page_url.join(href) else {
            debug!("Skipping unresolvable href {:?} on {}", href, page_url);
            continue;
        };

        if resolved.authority() != page_authority {
            links.insert(resolved);
        }
    }

    links
}
