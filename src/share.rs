//! Share-link binding for job resumption.
//!
//! A watchable job is identified by a `queryId` query parameter on the page
//! URL. Reading the parameter resumes an existing job; rewriting it after a
//! fresh submission makes the new job shareable.

use anyhow::{Context, Result};
use url::Url;

pub const QUERY_ID_PARAM: &str = "queryId";

/// Extract a job id from a share URL, if one is present and well-formed.
pub fn query_id_from_url(raw: &str) -> Option<u64> {
    let url = Url::parse(raw).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == QUERY_ID_PARAM)
        .and_then(|(_, v)| v.parse().ok())
}

/// Rewrite `page_url` so its `queryId` parameter carries `query_id`,
/// preserving any other query parameters.
pub fn share_url(page_url: &str, query_id: u64) -> Result<String> {
    let mut url = Url::parse(page_url).context("invalid page URL for share link")?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != QUERY_ID_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(QUERY_ID_PARAM, &query_id.to_string());
    }
    Ok(url.to_string())
}
