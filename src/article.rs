//! Defines the values derived from an article source file: the
//! [`ArticleSummary`] shown in listings, the [`ArticleDetail`] shown on an
//! article page, and the table-of-contents [`Heading`].
//!
//! All of them serialize to camelCase JSON for the presentation layer.

use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

/// A table-of-contents entry.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    /// The anchor id (see [`crate::markdown::Slugger`]).
    pub id: String,
    pub text: String,
    /// Between [`crate::markdown::MIN_TOC_LEVEL`] and
    /// [`crate::markdown::MAX_TOC_LEVEL`].
    pub level: u8,
}

/// The listing view of an article. It carries no body content.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    /// The source file name without its `.md` extension.
    pub id: String,

    /// The body's first level-1 heading, the front-matter title, or the id,
    /// in that order of preference.
    pub title: String,

    /// The posting date as written in the front-matter. Empty when the
    /// article has none.
    pub date_posted: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<String>,

    pub tags: Vec<String>,

    pub aliases: Vec<String>,

    /// Front-matter keys with no named field, emitted alongside the named
    /// fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ArticleSummary {
    /// Reports whether the article carries `tag`. Tags are compared by their
    /// slugs so that e.g., `macOS` and `MacOS` are the same tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = slug::slugify(tag);
        self.tags.iter().any(|t| slug::slugify(t) == wanted)
    }

    /// Reports whether every whitespace-separated term in `query` occurs,
    /// case-insensitively, in the title, the id, or one of the tags.
    pub fn matches(&self, query: &str) -> bool {
        let haystacks: Vec<String> = std::iter::once(&self.title)
            .chain(std::iter::once(&self.id))
            .chain(self.tags.iter())
            .map(|s| s.to_lowercase())
            .collect();
        query
            .split_whitespace()
            .map(str::to_lowercase)
            .all(|term| haystacks.iter().any(|h| h.contains(&term)))
    }
}

/// The page view of an article.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub summary: ArticleSummary,

    /// The markdown body with the title line removed, trimmed.
    pub body_content: String,

    /// Level 2-4 headings in document order.
    pub headings: Vec<Heading>,
}

impl ArticleDetail {
    /// Renders `body_content` to HTML with heading anchors matching
    /// `headings`.
    pub fn to_html(&self) -> String {
        crate::markdown::to_html(&self.body_content)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn summary() -> ArticleSummary {
        ArticleSummary {
            id: String::from("hello-world"),
            title: String::from("Hello World"),
            date_posted: String::from("2024-01-05"),
            date_updated: None,
            tags: vec![String::from("macOS"), String::from("Rust Tips")],
            aliases: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_has_tag_compares_slugs() {
        let summary = summary();
        assert!(summary.has_tag("MacOS"));
        assert!(summary.has_tag("rust-tips"));
        assert!(!summary.has_tag("linux"));
    }

    #[test]
    fn test_matches() {
        let summary = summary();
        assert!(summary.matches(""));
        assert!(summary.matches("hello"));
        assert!(summary.matches("WORLD macos"));
        assert!(!summary.matches("hello linux"));
    }

    #[test]
    fn test_summary_json_is_camel_case() -> serde_json::Result<()> {
        let json = serde_json::to_value(summary())?;
        assert_eq!(json["datePosted"], "2024-01-05");
        assert_eq!(json["tags"][0], "macOS");
        assert!(json.get("dateUpdated").is_none());
        assert!(json.get("extra").is_none());
        Ok(())
    }

    #[test]
    fn test_detail_json_flattens_summary() -> serde_json::Result<()> {
        let detail = ArticleDetail {
            summary: summary(),
            body_content: String::from("Some text."),
            headings: vec![Heading {
                id: String::from("first-section"),
                text: String::from("First Section"),
                level: 2,
            }],
        };
        let json = serde_json::to_value(&detail)?;
        assert_eq!(json["id"], "hello-world");
        assert_eq!(json["bodyContent"], "Some text.");
        assert_eq!(json["headings"][0]["level"], 2);
        Ok(())
    }
}
