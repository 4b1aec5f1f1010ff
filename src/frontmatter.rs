//! Splits the `---`-fenced front-matter block off an article and parses it
//! into a typed [`FrontMatter`].
//!
//! An article looks like this:
//!
//! ```md
//! ---
//! datePosted: 2024-01-05
//! tags: [intro, meta]
//! ---
//! # Hello World
//! Some text.
//! ```
//!
//! The block is optional. When the first line isn't a fence the whole input
//! is body.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::collections::BTreeMap;

const FENCE: &str = "---";

/// The maximum number of unrecognized keys kept in [`FrontMatter::extra`].
pub const MAX_EXTRA_FIELDS: usize = 32;

/// The front-matter of one article. The recognized keys are named fields;
/// everything else lands in `extra`.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FrontMatter {
    /// Title from the older `{date, title}` schema. The body's first level-1
    /// heading takes precedence over it.
    #[serde(default, deserialize_with = "scalar")]
    pub title: Option<String>,

    /// The date the article was posted.
    #[serde(
        default,
        rename = "datePosted",
        alias = "date_posted",
        deserialize_with = "scalar"
    )]
    pub date_posted: Option<String>,

    /// The date the article was last updated.
    #[serde(
        default,
        rename = "dateUpdated",
        alias = "date_updated",
        deserialize_with = "scalar"
    )]
    pub date_updated: Option<String>,

    /// Posting date from the older schema. Only consulted when `datePosted`
    /// is absent.
    #[serde(default, deserialize_with = "scalar")]
    pub date: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub aliases: Vec<String>,

    /// Unrecognized keys, capped at [`MAX_EXTRA_FIELDS`].
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl FrontMatter {
    /// Parses the YAML between the fences. A block that is empty or holds
    /// only comments yields the default front-matter.
    pub fn parse(yaml: &str) -> Result<FrontMatter, Error> {
        let blank = yaml
            .lines()
            .map(str::trim)
            .all(|line| line.is_empty() || line.starts_with('#'));
        if blank {
            return Ok(FrontMatter::default());
        }

        let mut front_matter: FrontMatter = serde_yaml::from_str(yaml)?;
        if front_matter.extra.len() > MAX_EXTRA_FIELDS {
            tracing::warn!(
                kept = MAX_EXTRA_FIELDS,
                found = front_matter.extra.len(),
                "dropping excess front-matter keys"
            );
            front_matter.extra = front_matter
                .extra
                .into_iter()
                .take(MAX_EXTRA_FIELDS)
                .collect();
        }
        Ok(front_matter)
    }

    /// The posting date, preferring `datePosted` over the legacy `date`.
    pub fn posted(&self) -> Option<&str> {
        self.date_posted.as_deref().or(self.date.as_deref())
    }
}

/// The two halves of an article source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    /// The text between the fences, if the file has a front-matter block.
    pub yaml: Option<&'a str>,

    /// Everything after the closing fence (or the whole input).
    pub body: &'a str,
}

/// Splits `input` into front-matter and body. Fences must sit on their own
/// lines; trailing whitespace after a fence is allowed.
pub fn split(input: &str) -> Result<Split<'_>, Error> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut offset = 0;
    let mut lines = input.split_inclusive('\n').map(|line| {
        let start = offset;
        offset += line.len();
        (start, offset, line.trim_end())
    });

    let yaml_start = match lines.next() {
        Some((_, end, FENCE)) => end,
        _ => {
            return Ok(Split {
                yaml: None,
                body: input,
            })
        }
    };

    for (start, end, line) in lines {
        if line == FENCE {
            return Ok(Split {
                yaml: Some(&input[yaml_start..start]),
                body: &input[end..],
            });
        }
    }
    Err(Error::MissingEndFence)
}

/// Deserializes an optional scalar as a string. YAML reads `2024` or `true`
/// as non-strings; both are kept verbatim.
fn scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => scalar_to_string(value).map(Some).map_err(D::Error::custom),
    }
}

/// Deserializes a list of strings from either a sequence (flow `[a, b]` or
/// block `- a`) or a single scalar.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(|item| scalar_to_string(item).map_err(D::Error::custom))
            .collect(),
        value => Ok(vec![scalar_to_string(value).map_err(D::Error::custom)?]),
    }
}

fn scalar_to_string(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected a scalar, found {:?}", other)),
    }
}

/// Represents a problem reading a front-matter block.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the opening fence was found but the closing one was not.
    #[error("missing closing `---`")]
    MissingEndFence,

    /// Returned when the block isn't valid YAML or has the wrong shape.
    #[error(transparent)]
    DeserializeYaml(#[from] serde_yaml::Error),
}
