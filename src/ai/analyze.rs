use crate::ai::client::{parse_json_response, ChatCompletion, ChatMessage, CompletionOptions};
use crate::dedup::{cluster_articles, TopicCluster, CLUSTER_SIMILARITY_THRESHOLD};
use crate::types::{ArticleRecord, Category, ReportHighlights, SourceType};
use serde::Deserialize;
use tracing::{error, info};

/// Titles shorter than this are treated as low quality and excluded from the
/// digest narrative.
const MIN_TITLE_CHARS: usize = 5;

/// Topic clusters kept per category in the narrative outline.
const TOP_CLUSTERS_PER_CATEGORY: usize = 5;

const ANALYZE_SYSTEM_PROMPT: &str = r#"You are a senior technology industry analyst writing a concise daily digest of AI and tech developments.

Return a JSON object with two fields:

1. "markdown": a concise daily report in Markdown, at most 1500 words, with these sections (each under a ## heading):
   - "Today at a Glance": 2-3 sentences covering the core of the day
   - "Key Stories": the 5-8 most noteworthy items as a numbered list, each with a bold title plus one or two descriptive sentences; merge similar coverage into a single entry
   - "Trend Insights": 1-2 short paragraphs on the industry trends behind today's items

2. "highlights": structured data {"hotTopics": ["topic1", "topic2", ...], "trendInsights": [], "crossDomainLinks": [], "signalsToWatch": []}
   - hotTopics are displayed as page tags; keep them to 4-6 short keywords"#;

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    markdown: String,
    highlights: ReportHighlights,
}

/// Narrative content and highlight topics for one day's report.
#[derive(Debug, Clone)]
pub struct DailyAnalysis {
    pub content: String,
    pub highlights: ReportHighlights,
}

fn filter_low_quality(articles: &[ArticleRecord]) -> Vec<&ArticleRecord> {
    articles
        .iter()
        .filter(|a| {
            if a.title.chars().count() < MIN_TITLE_CHARS {
                return false;
            }
            // Hotlist entries without any heat signal are noise.
            if a.source_type == SourceType::Hotlist && a.heat_value.unwrap_or(0) <= 0 {
                return false;
            }
            true
        })
        .collect()
}

/// Build the per-category narrative outline fed to the model: articles are
/// clustered by topic so related coverage collapses into single bullets.
fn build_outline(articles: &[&ArticleRecord]) -> String {
    let mut parts: Vec<String> = Vec::new();

    for category in Category::ALL {
        let in_category: Vec<ArticleRecord> = articles
            .iter()
            .filter(|a| a.category == category)
            .map(|a| (*a).clone())
            .collect();
        if in_category.is_empty() {
            continue;
        }

        let mut clusters = cluster_articles(&in_category, CLUSTER_SIMILARITY_THRESHOLD);
        let topic_count = clusters.len();
        // Rank by representative popularity, breaking ties by cluster size.
        clusters.sort_by(|a, b| {
            let heat_a = a.representative.heat_value.unwrap_or(0);
            let heat_b = b.representative.heat_value.unwrap_or(0);
            heat_b.cmp(&heat_a).then(b.size().cmp(&a.size()))
        });

        parts.push(format!(
            "\n### {} ({} topics from {} items)",
            category.display_name(),
            topic_count,
            in_category.len()
        ));
        for cluster in clusters.iter().take(TOP_CLUSTERS_PER_CATEGORY) {
            parts.push(format_cluster_line(cluster));
        }
    }

    parts.join("\n")
}

fn format_cluster_line(cluster: &TopicCluster) -> String {
    let article = &cluster.representative;
    let summary = article
        .summary
        .as_deref()
        .map(|s| format!(": {s}"))
        .unwrap_or_default();
    let related = match cluster.related.len() {
        0 => String::new(),
        n => format!(" (plus {n} related reports)"),
    };
    format!("- {}{summary}{related}", article.title)
}

/// Generate the daily analysis for the persisted articles of one day.
///
/// Never fails: when the model call or response parsing fails, a basic
/// report built from the clustered outline is returned instead.
pub async fn generate_daily_analysis(
    articles: &[ArticleRecord],
    ai: &dyn ChatCompletion,
) -> DailyAnalysis {
    let quality_articles = filter_low_quality(articles);
    info!(
        "analyze: quality filter {} -> {} items",
        articles.len(),
        quality_articles.len()
    );

    let outline = build_outline(&quality_articles);

    let messages = [
        ChatMessage::system(ANALYZE_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "{} items collected today (deduplicated and clustered). Generate the daily digest:\n{outline}",
            quality_articles.len()
        )),
    ];
    let options = CompletionOptions {
        temperature: 0.5,
        json_mode: true,
        ..Default::default()
    };

    let outcome = match ai.complete(&messages, &options).await {
        Ok(response) => parse_json_response::<AnalysisResponse>(&response),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(analysis) => {
            info!("analyze: daily analysis generated");
            DailyAnalysis {
                content: analysis.markdown,
                highlights: analysis.highlights,
            }
        }
        Err(e) => {
            error!("analyze: daily analysis failed, using basic report: {}", e);
            DailyAnalysis {
                content: format!(
                    "# Daily Digest\n\n{} items collected today.\n{outline}",
                    articles.len()
                ),
                highlights: ReportHighlights::default(),
            }
        }
    }
}
