//! Regex-based statute parser.
//!
//! Input is the plain text of a statute: chapter headers `第 <中文數字> 章`
//! and article headers `第 <digits>[-<digits>] 條`, each on its own line and
//! followed by body text. Headers delimit content blocks; text before the
//! first article header of a block is dropped.

use super::article::ArticleNumber;
use super::numeral::chinese_to_int;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

static CHAPTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t\u{3000}]*第[ \t\u{3000}]*([一二三四五六七八九十百千零〇兩]+)[ \t\u{3000}]*章")
        .expect("chapter header pattern is valid")
});

static ARTICLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t\u{3000}]*第[ \t\u{3000}]*([0-9]+(?:-[0-9]+)?)[ \t\u{3000}]*條")
        .expect("article header pattern is valid")
});

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"第([一二三四五六七八九十百千零〇兩]+)條(之一)?")
        .expect("reference pattern is valid")
});

/// One parsed article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatuteArticle {
    /// Chapter number, 0 when the article precedes every chapter header or
    /// the chapter numeral is outside the supported grammar.
    pub chapter: u32,

    pub article: ArticleNumber,

    /// Body text with surrounding whitespace trimmed.
    pub text: String,

    /// Sorted, de-duplicated articles cited in the body, excluding itself.
    pub references: Vec<ArticleNumber>,
}

impl StatuteArticle {
    /// Metadata document stored alongside the article text.
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "chapter": self.chapter,
            "article": self.article,
            "references": self.references,
        })
    }
}

/// A span of text owned by one chapter.
struct ChapterBlock {
    chapter: u32,
    start: usize,
    end: usize,
}

/// Parse statute text into article records in document order.
///
/// Empty or header-less input yields an empty list. Parsing is pure, so
/// the same input always yields the same records.
pub fn parse_statute(raw: &str) -> Vec<StatuteArticle> {
    let mut articles = Vec::new();

    for block in chapter_blocks(raw) {
        let text = &raw[block.start..block.end];
        let headers: Vec<(usize, usize, &str)> = ARTICLE_RE
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let number = caps.get(1)?;
                Some((whole.start(), whole.end(), number.as_str()))
            })
            .collect();

        for (i, (_, body_start, number)) in headers.iter().enumerate() {
            let body_end = headers
                .get(i + 1)
                .map(|(next_start, _, _)| *next_start)
                .unwrap_or(text.len());
            let body = text[*body_start..body_end].trim();
            let article = ArticleNumber::new(*number);
            let references = extract_references(body, &article);

            articles.push(StatuteArticle {
                chapter: block.chapter,
                article,
                text: body.to_string(),
                references,
            });
        }
    }

    tracing::debug!(count = articles.len(), "Parsed statute articles");
    articles
}

/// Collect the articles cited by `body` as `第<中文數字>條` or
/// `第<中文數字>條之一`, skipping unparseable numerals and `own`.
pub fn extract_references(body: &str, own: &ArticleNumber) -> Vec<ArticleNumber> {
    let mut found = BTreeSet::new();

    for caps in REFERENCE_RE.captures_iter(body) {
        let main = caps
            .get(1)
            .map(|m| chinese_to_int(m.as_str()))
            .unwrap_or(0);
        if main == 0 {
            continue;
        }

        let sub = caps.get(2).map(|_| 1);
        let number = ArticleNumber::from_parts(main, sub);
        if &number != own {
            found.insert(number);
        }
    }

    found.into_iter().collect()
}

fn chapter_blocks(raw: &str) -> Vec<ChapterBlock> {
    let headers: Vec<(usize, usize, u32)> = CHAPTER_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let numeral = caps.get(1)?;
            Some((whole.start(), whole.end(), chinese_to_int(numeral.as_str())))
        })
        .collect();

    let mut blocks = Vec::with_capacity(headers.len() + 1);

    let first_header = headers.first().map(|(start, _, _)| *start).unwrap_or(raw.len());
    if first_header > 0 {
        blocks.push(ChapterBlock {
            chapter: 0,
            start: 0,
            end: first_header,
        });
    }

    for (i, (_, body_start, chapter)) in headers.iter().enumerate() {
        let end = headers
            .get(i + 1)
            .map(|(next_start, _, _)| *next_start)
            .unwrap_or(raw.len());
        blocks.push(ChapterBlock {
            chapter: *chapter,
            start: *body_start,
            end,
        });
    }

    blocks
}
