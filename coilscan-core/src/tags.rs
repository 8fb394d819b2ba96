//! Report tags: advisory themes and featured symbols from weekly reports.
//!
//! The language-model call that produces tags lives outside this crate. What
//! lives here is the contract around it: the prompt text, the structured reply
//! format, a parser for that format and a JSON store of tagged reports whose
//! symbols can narrow a scan's candidate list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sector labels the tagger is asked to choose from.
pub const STANDARD_THEMES: [&str; 10] = [
    "AI伺服器",
    "半導體",
    "設備",
    "機器人",
    "電力電纜",
    "重電",
    "散熱",
    "PCB",
    "車用",
    "原物料",
];

/// Report text beyond this many characters is not sent to the tagger.
pub const MAX_REPORT_CHARS: usize = 12_000;

const SENTIMENT_SECTION: &str = "大盤情緒";
const HEADLINE_SECTION: &str = "核心觀點";
const THEMES_SECTION: &str = "族群標籤";
const FEATURED_SECTION: &str = "重點個股";
const ANALYSIS_SECTION: &str = "詳細分析";

#[derive(Debug, Error)]
pub enum TagError {
    #[error("tagger unavailable: {0}")]
    Unavailable(String),

    #[error("tagger reply has no recognizable sections")]
    UnrecognizedReply,

    #[error("read tag store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("tag store JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    ExtremelyBullish,
    Bullish,
    Rangebound,
    Bearish,
    ExtremelyBearish,
}

impl Sentiment {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "極度樂觀" => Some(Sentiment::ExtremelyBullish),
            "偏多" => Some(Sentiment::Bullish),
            "震盪" => Some(Sentiment::Rangebound),
            "偏空" => Some(Sentiment::Bearish),
            "極度悲觀" => Some(Sentiment::ExtremelyBearish),
            _ => None,
        }
    }
}

/// A stock the report singles out, e.g. `3035 智原 - 先進製程案量提升`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedStock {
    pub code: String,
    pub name: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportTags {
    pub sentiment: Option<Sentiment>,
    pub headline: String,
    pub themes: Vec<String>,
    pub featured: Vec<FeaturedStock>,
    pub analysis: String,
}

impl ReportTags {
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.featured.iter().map(|f| f.code.as_str())
    }
}

/// Produces tags for a report's extracted text.
pub trait ReportTagger: Send + Sync {
    fn tag(&self, report_text: &str) -> Result<ReportTags, TagError>;
}

/// Tagger for text that already is a structured reply (produced offline or
/// pasted from the model's output).
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyTagger;

impl ReportTagger for ReplyTagger {
    fn tag(&self, report_text: &str) -> Result<ReportTags, TagError> {
        parse_tagged_report(report_text)
    }
}

/// Prompt asking the model for the structured reply format parsed by
/// [`parse_tagged_report`].
pub fn build_tagging_prompt(report_text: &str) -> String {
    let excerpt: String = report_text.chars().take(MAX_REPORT_CHARS).collect();
    let themes = STANDARD_THEMES.join("、");
    format!(
        "你是一位嚴謹的台股量化分析師。請從「週報原文」中提取核心資訊，並將其標準化以供資料庫儲存。\n\
         \n\
         ### 執行規則：\n\
         1. 只提取原文提到的事實與數據，不加入個人推測。\n\
         2. 族群標籤只能從以下清單選擇：{themes}。\n\
         3. 嚴格依照下方結構輸出，不要有多餘的解釋文字。\n\
         \n\
         ### 輸出結構：\n\
         【{SENTIMENT_SECTION}】：(極度樂觀、偏多、震盪、偏空、極度悲觀 擇一)\n\
         【{HEADLINE_SECTION}】：(一句話，限 30 字內)\n\
         【{THEMES_SECTION}】：(逗號隔開)\n\
         【{FEATURED_SECTION}】：(每行一檔，格式：代碼 名稱 - 核心動能摘要)\n\
         【{ANALYSIS_SECTION}】：(300 字以內)\n\
         \n\
         ### 週報原文：\n\
         {excerpt}\n"
    )
}

/// Split a reply into `(section label, body)` pairs.
fn sections(reply: &str) -> Vec<(&str, &str)> {
    reply
        .split('【')
        .filter_map(|chunk| {
            let (label, rest) = chunk.split_once('】')?;
            let body = rest
                .trim_start()
                .trim_start_matches(['：', ':'])
                .trim();
            Some((label.trim(), body))
        })
        .collect()
}

fn split_list(body: &str) -> impl Iterator<Item = &str> {
    body.split([',', '，', '、', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Find a standalone 4-digit code: four ASCII digits not adjacent to another digit.
fn find_code(line: &str) -> Option<(usize, &str)> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i + 4 <= bytes.len() {
        let window = &bytes[i..i + 4];
        let before_ok = i == 0 || !bytes[i - 1].is_ascii_digit();
        let after_ok = i + 4 == bytes.len() || !bytes[i + 4].is_ascii_digit();
        if window.iter().all(u8::is_ascii_digit) && before_ok && after_ok {
            return Some((i, &line[i..i + 4]));
        }
        i += 1;
    }
    None
}

const SPACED_SEPARATORS: [&str; 3] = [" - ", " － ", " — "];

/// Split `名稱 - 摘要`. Names may carry a bare hyphen (`矽力*-KY`), so a
/// spaced separator wins over an unspaced one.
fn split_name_summary(rest: &str) -> (&str, &str) {
    let spaced = SPACED_SEPARATORS
        .iter()
        .filter_map(|sep| rest.find(sep).map(|i| (i, sep.len())))
        .min_by_key(|&(i, _)| i);
    if let Some((i, len)) = spaced {
        return (&rest[..i], &rest[i + len..]);
    }
    if let Some(split) = rest.split_once(['－', '—']) {
        return split;
    }
    match rest.rsplit_once('-') {
        Some((name, summary)) if !summary.trim_start().starts_with("KY") => (name, summary),
        _ => (rest, ""),
    }
}

fn parse_featured_line(line: &str) -> Option<FeaturedStock> {
    let (start, code) = find_code(line)?;
    let rest = &line[start + code.len()..];
    let (name, summary) = split_name_summary(rest);
    Some(FeaturedStock {
        code: code.to_string(),
        name: name.trim().to_string(),
        summary: summary.trim().to_string(),
    })
}

/// Parse the tagger's structured reply.
///
/// Themes outside [`STANDARD_THEMES`] are dropped. Featured stocks without a
/// 4-digit code are skipped. A reply with none of the known sections is an error.
pub fn parse_tagged_report(reply: &str) -> Result<ReportTags, TagError> {
    let mut tags = ReportTags::default();
    let mut recognized = false;

    for (label, body) in sections(reply) {
        match label {
            SENTIMENT_SECTION => {
                recognized = true;
                tags.sentiment = Sentiment::from_label(body);
            }
            HEADLINE_SECTION => {
                recognized = true;
                tags.headline = body.to_string();
            }
            THEMES_SECTION => {
                recognized = true;
                for theme in split_list(body) {
                    if STANDARD_THEMES.contains(&theme) && !tags.themes.iter().any(|t| t == theme) {
                        tags.themes.push(theme.to_string());
                    }
                }
            }
            FEATURED_SECTION => {
                recognized = true;
                for line in body.split(['\n', '；', ';']) {
                    if let Some(stock) = parse_featured_line(line) {
                        if !tags.featured.iter().any(|f| f.code == stock.code) {
                            tags.featured.push(stock);
                        }
                    }
                }
            }
            ANALYSIS_SECTION => {
                recognized = true;
                tags.analysis = body.to_string();
            }
            _ => {}
        }
    }

    if recognized {
        Ok(tags)
    } else {
        Err(TagError::UnrecognizedReply)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedReport {
    /// Report identifier, usually the source file name.
    pub report: String,
    pub tagged_on: NaiveDate,
    pub tags: ReportTags,
}

/// Previously tagged reports, persisted as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagStore {
    pub reports: Vec<TaggedReport>,
}

impl TagStore {
    pub fn load(path: &Path) -> Result<Self, TagError> {
        let content = std::fs::read_to_string(path).map_err(|source| TagError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load, treating a missing or unreadable store as empty.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "tag store unavailable, using empty tag set");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), TagError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| TagError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Add or replace the entry for `report`.
    pub fn upsert(&mut self, entry: TaggedReport) {
        match self.reports.iter_mut().find(|r| r.report == entry.report) {
            Some(existing) => *existing = entry,
            None => self.reports.push(entry),
        }
    }

    /// Every featured symbol across all reports.
    pub fn symbols(&self) -> BTreeSet<String> {
        self.reports
            .iter()
            .flat_map(|r| r.tags.symbols())
            .map(String::from)
            .collect()
    }

    /// Featured symbols of reports tagged with `theme`.
    pub fn symbols_for_theme(&self, theme: &str) -> BTreeSet<String> {
        self.reports
            .iter()
            .filter(|r| r.tags.themes.iter().any(|t| t == theme))
            .flat_map(|r| r.tags.symbols())
            .map(String::from)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
