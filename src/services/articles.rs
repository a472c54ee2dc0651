use std::cmp::Ordering;
use std::collections::HashSet;

use crate::model::Article;

/// Merge freshly fetched rows into an accumulated table.
///
/// Rows are deduplicated by link, keeping the first occurrence of the
/// concatenated sequence: existing rows win over incoming duplicates, so
/// the first-seen keyword attribution is stable. The result is re-sorted
/// by recency.
pub fn merge(existing: Vec<Article>, incoming: Vec<Article>) -> Vec<Article> {
    let mut merged = existing;
    merged.extend(incoming);
    dedup_by_link(&mut merged);
    sort_by_recency(&mut merged);
    merged
}

fn dedup_by_link(rows: &mut Vec<Article>) {
    let mut seen = HashSet::new();
    rows.retain(|row| seen.insert(row.link.clone()));
}

/// Most recent first; rows without a publication date all sort last,
/// whatever their actual recency. The sort is stable, so equal keys keep
/// their merge order.
pub fn sort_by_recency(rows: &mut [Article]) {
    rows.sort_by(|a, b| match (&a.published, &b.published) {
        (Some(left), Some(right)) => right.cmp(left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// The rows whose (normalized) keyword belongs to the given set.
pub fn filter_by_keywords(rows: &[Article], keywords: &[String]) -> Vec<Article> {
    rows.iter()
        .filter(|row| keywords.contains(&row.keyword))
        .cloned()
        .collect()
}

/// The rows whose link belongs to the given selection.
pub fn filter_by_links(rows: &[Article], links: &HashSet<String>) -> Vec<Article> {
    rows.iter()
        .filter(|row| links.contains(&row.link))
        .cloned()
        .collect()
}

/// Drop the rows whose link is listed. Removing an absent link is a no-op.
pub fn remove_links(rows: &mut Vec<Article>, links: &[String]) {
    rows.retain(|row| !links.contains(&row.link));
}
