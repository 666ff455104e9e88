mod common;

use common::{article, raw_item, FailingAi, ScriptedAi};
use insight_hub::ai::{
    classify_items, generate_daily_analysis, parse_json_response, summarize_items,
    translate_items,
};
use insight_hub::types::Category;
use std::collections::HashMap;

#[derive(Debug, serde::Deserialize, PartialEq)]
struct Pair {
    index: usize,
    category: String,
}

#[test]
fn json_parsing_handles_fenced_blocks() {
    let text = "Here you go:\n```json\n[{\"index\": 0, \"category\": \"ai\"}]\n```";
    let parsed: Vec<Pair> = parse_json_response(text).unwrap();
    assert_eq!(parsed[0].category, "ai");
}

#[test]
fn json_parsing_handles_bare_payloads() {
    let parsed: Vec<Pair> =
        parse_json_response("  [{\"index\": 1, \"category\": \"news\"}]  ").unwrap();
    assert_eq!(parsed[0].index, 1);
}

#[test]
fn json_parsing_extracts_payload_embedded_in_prose() {
    let text = "Sure! The result is [{\"index\": 2, \"category\": \"product\"}] as requested.";
    let parsed: Vec<Pair> = parse_json_response(text).unwrap();
    assert_eq!(parsed[0].category, "product");
}

#[test]
fn json_parsing_repairs_trailing_commas_and_stray_fences() {
    let text = "```json\n[{\"index\": 0, \"category\": \"growth\",}]";
    let parsed: Vec<Pair> = parse_json_response(text).unwrap();
    assert_eq!(parsed[0].category, "growth");
}

#[test]
fn json_parsing_fails_on_unsalvageable_text() {
    let result: insight_hub::types::Result<Vec<Pair>> =
        parse_json_response("no structured data here");
    assert!(result.is_err());
}

#[tokio::test]
async fn classify_skips_items_with_preset_categories() {
    let mut item = raw_item("GitHub trending repo", "https://g.com/1");
    item.default_category = Some(Category::Programming);

    // An AI call would fail loudly; none must happen.
    let classified = classify_items(vec![item], &FailingAi).await;
    assert_eq!(classified[0].default_category, Some(Category::Programming));
}

#[tokio::test]
async fn classify_applies_ai_categories_by_index() {
    let items = vec![
        raw_item("New LLM beats benchmarks", "https://a.com/1"),
        raw_item("CSS container queries land", "https://a.com/2"),
    ];
    let ai = ScriptedAi::new(vec![
        r#"[{"index": 0, "category": "ai"}, {"index": 1, "category": "frontend"}]"#,
    ]);

    let classified = classify_items(items, &ai).await;
    assert_eq!(classified[0].default_category, Some(Category::Ai));
    assert_eq!(classified[1].default_category, Some(Category::Frontend));
}

#[tokio::test]
async fn classify_ignores_unknown_slugs_and_out_of_range_indexes() {
    let items = vec![raw_item("Some story", "https://a.com/1")];
    let ai = ScriptedAi::new(vec![
        r#"[{"index": 0, "category": "astrology"}, {"index": 9, "category": "ai"}]"#,
    ]);

    let classified = classify_items(items, &ai).await;
    assert_eq!(classified[0].default_category, None);
}

#[tokio::test]
async fn classify_degrades_to_catch_all_when_ai_is_down() {
    let items = vec![
        raw_item("First story", "https://a.com/1"),
        raw_item("Second story", "https://a.com/2"),
    ];
    let classified = classify_items(items, &FailingAi).await;
    assert!(classified
        .iter()
        .all(|item| item.default_category == Some(Category::News)));
}

#[tokio::test]
async fn summarize_truncates_inline_content_without_ai() {
    let mut item = raw_item("A story with body text", "https://a.com/1");
    item.content = Some("x".repeat(400));

    let summaries = summarize_items(&[item], &FailingAi).await;
    assert_eq!(summaries.get(&0).map(|s| s.chars().count()), Some(150));
}

#[tokio::test]
async fn summarize_parses_indexed_lines_from_the_model() {
    let items = vec![
        raw_item("OpenAI releases GPT-5", "https://a.com/1"),
        raw_item("Kubernetes 2.0 announced", "https://a.com/2"),
        raw_item("Deno merges with Node", "https://a.com/3"),
    ];
    // Mixed ASCII and fullwidth separators, plus a too-short summary.
    let ai = ScriptedAi::new(vec![
        "0|A new flagship model launches\n1｜ Major release of the orchestrator \n2|ok",
    ]);

    let summaries = summarize_items(&items, &ai).await;
    assert_eq!(
        summaries.get(&0).map(String::as_str),
        Some("A new flagship model launches")
    );
    assert_eq!(
        summaries.get(&1).map(String::as_str),
        Some("Major release of the orchestrator")
    );
    assert!(!summaries.contains_key(&2));
}

#[tokio::test]
async fn summarize_skips_titles_too_short_for_a_model_call() {
    let items = vec![raw_item("Hi", "https://a.com/1")];
    let summaries = summarize_items(&items, &FailingAi).await;
    assert!(summaries.is_empty());
}

#[tokio::test]
async fn summarize_falls_back_to_source_templates() {
    let mut github = raw_item("owner / repo", "https://github.com/owner/repo");
    github.source_name = "GitHub".to_string();
    let mut ph = raw_item("Shiny New App", "https://producthunt.com/p/1");
    ph.source_name = "Product Hunt".to_string();
    let mut hn = raw_item("Show HN: my thing", "https://news.ycombinator.com/1");
    hn.source_name = "Hacker News".to_string();
    let plain = raw_item("An uncovered story", "https://a.com/1");

    let items = vec![github, ph, hn, plain];
    let summaries = summarize_items(&items, &FailingAi).await;

    assert_eq!(
        summaries.get(&0).map(String::as_str),
        Some("Trending open source project on GitHub: owner/repo")
    );
    assert_eq!(
        summaries.get(&1).map(String::as_str),
        Some("Trending launch on Product Hunt: Shiny New App")
    );
    assert_eq!(
        summaries.get(&2).map(String::as_str),
        Some("Popular Hacker News discussion: Show HN: my thing")
    );
    assert!(!summaries.contains_key(&3));
}

#[tokio::test]
async fn translate_only_touches_english_items() {
    let mut en = raw_item("Rust ships a new edition", "https://a.com/1");
    en.language = Some("en".to_string());
    let zh = raw_item("本土新闻标题", "https://a.com/2");

    let ai = ScriptedAi::new(vec!["0|Rust 发布新版本|生态工具链全面升级"]);
    let summaries = HashMap::new();
    let translations = translate_items(&[en, zh], &summaries, &ai).await;

    assert_eq!(translations.len(), 1);
    let t = translations.get(&0).unwrap();
    assert_eq!(t.title_zh, "Rust 发布新版本");
    assert_eq!(t.summary_zh.as_deref(), Some("生态工具链全面升级"));
}

#[tokio::test]
async fn translate_keeps_title_and_drops_empty_or_tiny_summaries() {
    let mut a = raw_item("First headline", "https://a.com/1");
    a.language = Some("en".to_string());
    let mut b = raw_item("Second headline", "https://a.com/2");
    b.language = Some("en".to_string());
    let mut c = raw_item("Third headline", "https://a.com/3");
    c.language = Some("en".to_string());

    // Line 0: empty summary. Line 1: one-char title, rejected. Line 2: fine.
    let ai = ScriptedAi::new(vec!["0|第一条标题|\n1|短|摘要内容很完整\n2|第三条标题|第三条摘要"]);
    let translations = translate_items(&[a, b, c], &HashMap::new(), &ai).await;

    assert_eq!(translations.get(&0).unwrap().summary_zh, None);
    assert!(!translations.contains_key(&1));
    assert_eq!(translations.get(&2).unwrap().title_zh, "第三条标题");
}

#[tokio::test]
async fn translate_survives_an_ai_outage_with_no_translations() {
    let mut item = raw_item("English headline", "https://a.com/1");
    item.language = Some("en".to_string());
    let translations = translate_items(&[item], &HashMap::new(), &FailingAi).await;
    assert!(translations.is_empty());
}

#[tokio::test]
async fn analysis_uses_model_markdown_and_highlights() {
    let articles = vec![
        article("Apple unveils new iPhone 17", Some(900)),
        article("Quantum chips reach new milestone", Some(50)),
    ];
    let ai = ScriptedAi::new(vec![
        r###"{"markdown": "## Today at a Glance\nBig day.", "highlights": {"hotTopics": ["iPhone", "quantum"]}}"###,
    ]);

    let analysis = generate_daily_analysis(&articles, &ai).await;
    assert!(analysis.content.starts_with("## Today at a Glance"));
    assert_eq!(analysis.highlights.hot_topics, vec!["iPhone", "quantum"]);
}

#[tokio::test]
async fn analysis_falls_back_to_a_basic_outline_report() {
    let articles = vec![article("Apple unveils new iPhone 17", Some(900))];
    let analysis = generate_daily_analysis(&articles, &FailingAi).await;

    assert!(analysis.content.starts_with("# Daily Digest"));
    assert!(analysis.content.contains("Apple unveils new iPhone 17"));
    assert!(analysis.highlights.hot_topics.is_empty());
}
