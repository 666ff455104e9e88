use crate::types::{ArticleRecord, RawItem};
use crate::utils::{normalize_url, title_similarity};
use std::collections::HashSet;
use tracing::info;

/// Title similarity at or above this collapses two items into one.
pub const DEDUP_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Title similarity at or above this groups two articles into one topic
/// cluster. Deliberately below the dedup threshold so related-but-distinct
/// coverage of one event is merged for the digest narrative only.
pub const CLUSTER_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Collapse duplicates by normalized URL and near-duplicate titles.
///
/// Stable linear scan: an exact URL collision drops the newcomer; a title
/// match at or above `threshold` keeps whichever copy carries the greater
/// heat value (absent heat compares as zero, first-seen wins ties).
pub fn deduplicate_items(items: Vec<RawItem>, threshold: f64) -> Vec<RawItem> {
    let total = items.len();
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut result: Vec<RawItem> = Vec::new();

    for item in items {
        if item.title.is_empty() || item.url.is_empty() {
            continue;
        }

        let normalized = normalize_url(&item.url);
        if seen_urls.contains(&normalized) {
            continue;
        }

        let mut is_duplicate = false;
        for kept in result.iter_mut() {
            let similarity = title_similarity(&item.title, &kept.title);
            if similarity >= threshold {
                // Keep the higher-heat copy in place.
                if item.heat_value.unwrap_or(0) > kept.heat_value.unwrap_or(0) {
                    *kept = item.clone();
                    seen_urls.insert(normalized.clone());
                }
                is_duplicate = true;
                break;
            }
        }

        if !is_duplicate {
            seen_urls.insert(normalized);
            result.push(item);
        }
    }

    info!("dedup: {} -> {} items", total, result.len());
    result
}

/// A group of articles judged to cover the same underlying story.
#[derive(Debug, Clone)]
pub struct TopicCluster {
    pub representative: ArticleRecord,
    pub related: Vec<ArticleRecord>,
}

impl TopicCluster {
    pub fn size(&self) -> usize {
        1 + self.related.len()
    }
}

/// Greedy single-pass topic clustering.
///
/// Each unclustered article opens a cluster; the remainder is compared
/// against the *current* representative (which may be replaced mid-scan when
/// a higher-heat match is found, the previous representative demoting into
/// the related list).
pub fn cluster_articles(articles: &[ArticleRecord], threshold: f64) -> Vec<TopicCluster> {
    let mut clusters: Vec<TopicCluster> = Vec::new();
    let mut used: HashSet<usize> = HashSet::new();

    for i in 0..articles.len() {
        if used.contains(&i) {
            continue;
        }
        used.insert(i);

        let mut cluster = TopicCluster {
            representative: articles[i].clone(),
            related: Vec::new(),
        };

        for (j, candidate) in articles.iter().enumerate().skip(i + 1) {
            if used.contains(&j) {
                continue;
            }
            let sim = title_similarity(&cluster.representative.title, &candidate.title);
            if sim >= threshold {
                used.insert(j);
                if candidate.heat_value.unwrap_or(0)
                    > cluster.representative.heat_value.unwrap_or(0)
                {
                    let demoted =
                        std::mem::replace(&mut cluster.representative, candidate.clone());
                    cluster.related.push(demoted);
                } else {
                    cluster.related.push(candidate.clone());
                }
            }
        }

        clusters.push(cluster);
    }

    clusters
}
