use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Query parameters stripped during URL normalization.
const TRACKING_PARAMS: [&str; 7] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "utm_term",
    "ref",
    "source",
];

/// Normalize a URL for dedup purposes: drop known tracking query parameters
/// and a trailing slash. Unparsable input is returned verbatim.
pub fn normalize_url(raw: &str) -> String {
    let mut parsed = match Url::parse(raw) {
        Ok(u) => u,
        Err(_) => return raw.to_string(),
    };

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let query = kept
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k.clone()
                } else {
                    format!("{k}={v}")
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    }

    let mut normalized = parsed.to_string();
    if normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Length-normalized Levenshtein similarity of two titles in [0, 1].
/// Whitespace is stripped and case folded before comparison, so reflowed
/// copies of the same headline score 1.0.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let clean_a: String = a.split_whitespace().collect::<String>().to_lowercase();
    let clean_b: String = b.split_whitespace().collect::<String>().to_lowercase();
    if clean_a.is_empty() && clean_b.is_empty() {
        return 1.0;
    }
    strsim::normalized_levenshtein(&clean_a, &clean_b)
}

static HEAT_WAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\d.]+)\s*万").unwrap());
static HEAT_YI: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\d.]+)\s*亿").unwrap());
static HEAT_PLAIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\d,]+)").unwrap());

/// Extract a numeric popularity score from a free-text heat descriptor, e.g.
/// "1029 万热度" -> 10_290_000 or "✰ 3,058" -> 3058. Unparsable descriptors
/// yield None rather than zero.
pub fn parse_heat_value(info: Option<&str>) -> Option<i64> {
    let info = info?;
    if let Some(caps) = HEAT_YI.captures(info) {
        if let Ok(n) = caps[1].parse::<f64>() {
            return Some((n * 100_000_000.0).round() as i64);
        }
    }
    if let Some(caps) = HEAT_WAN.captures(info) {
        if let Ok(n) = caps[1].parse::<f64>() {
            return Some((n * 10_000.0).round() as i64);
        }
    }
    if let Some(caps) = HEAT_PLAIN.captures(info) {
        if let Ok(n) = caps[1].replace(',', "").parse::<i64>() {
            return Some(n);
        }
    }
    None
}

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Strip HTML tags and truncate to at most `max_chars` characters.
pub fn strip_html(text: &str, max_chars: usize) -> String {
    let plain = HTML_TAG.replace_all(text, "");
    plain.trim().chars().take(max_chars).collect()
}

/// Take the first `max_chars` characters of a string (char-boundary safe).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// The calendar date a run started today targets.
pub fn today_date() -> NaiveDate {
    Local::now().date_naive()
}
