//! Defines [`ArticleStore`], which reads markdown articles from a directory
//! and derives [`ArticleSummary`] listings and [`ArticleDetail`] pages from
//! them. Nothing is cached: every call re-reads the files, so the directory
//! is always the single source of truth.

use crate::article::{ArticleDetail, ArticleSummary};
use crate::error::{Error, Result};
use crate::frontmatter::{self, FrontMatter};
use crate::{date, markdown};
use std::fs;
use std::path::{Path, PathBuf};

const MARKDOWN_EXTENSION: &str = "md";

/// Output field names an unrecognized front-matter key may not shadow.
const RESERVED_KEYS: &[&str] = &["id", "bodyContent", "headings", "html"];

/// Reads articles from a root directory. Each `{root}/{id}.md` file is one
/// article whose id is the file stem.
#[derive(Clone, Debug)]
pub struct ArticleStore {
    root: PathBuf,
}

impl ArticleStore {
    /// Constructs a store over `root` without touching the file system.
    pub fn new(root: impl Into<PathBuf>) -> ArticleStore {
        ArticleStore { root: root.into() }
    }

    /// Constructs a store over `root`, failing with [`Error::NotFound`] if
    /// it isn't a directory. Use this at startup so that a misconfigured
    /// directory fails early rather than on every request.
    pub fn open(root: impl Into<PathBuf>) -> Result<ArticleStore> {
        let root = root.into();
        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => Ok(ArticleStore { root }),
            Ok(_) => Err(Error::NotFound { path: root }),
            Err(err) => Err(Error::from_io(&root, err)),
        }
    }

    /// The directory articles are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns a summary for every article, most recently posted first.
    ///
    /// A file whose front-matter can't be parsed is listed with empty
    /// front-matter, and a file that can't be read is skipped; both are
    /// logged. Only a missing or unreadable directory fails the listing.
    pub fn list_articles(&self) -> Result<Vec<ArticleSummary>> {
        let mut summaries = Vec::new();
        for (id, path) in self.markdown_files()? {
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!("skipping article: {}", Error::from_io(&path, err));
                    continue;
                }
            };
            tracing::debug!(id = %id, "read article");
            let (front_matter, body) = read_front_matter(&id, &text);
            let title = markdown::Structure::scan(body).title();
            summaries.push(summarize(&id, front_matter, title));
        }

        // `sort_by` is stable, so articles posted at the same time stay in id
        // order.
        summaries.sort_by(|a, b| date::newest_first(&a.date_posted, &b.date_posted));
        Ok(summaries)
    }

    /// Returns the listing restricted to articles tagged with `tag` (see
    /// [`ArticleSummary::has_tag`]).
    pub fn list_articles_tagged(&self, tag: &str) -> Result<Vec<ArticleSummary>> {
        self.list_filtered(Some(tag), None)
    }

    /// Returns the listing restricted to articles matching every term of
    /// `query` (see [`ArticleSummary::matches`]).
    pub fn search(&self, query: &str) -> Result<Vec<ArticleSummary>> {
        self.list_filtered(None, Some(query))
    }

    /// Returns the listing restricted by an optional tag and an optional
    /// search query. Order is preserved.
    pub fn list_filtered(
        &self,
        tag: Option<&str>,
        query: Option<&str>,
    ) -> Result<Vec<ArticleSummary>> {
        let mut summaries = self.list_articles()?;
        summaries.retain(|s| {
            tag.map_or(true, |tag| s.has_tag(tag))
                && query.map_or(true, |query| s.matches(query))
        });
        Ok(summaries)
    }

    /// Returns the id of every article, sorted.
    pub fn article_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .markdown_files()?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }

    /// Reads the article `{root}/{id}.md` and derives its page view: the body
    /// without its title line, and the level 2-4 headings with unique anchor
    /// ids.
    ///
    /// Fails with [`Error::NotFound`] if there's no such article. Ids that
    /// would escape the root directory are never found.
    pub fn get_article(&self, id: &str) -> Result<ArticleDetail> {
        let path = self.root.join(format!("{}.{}", id, MARKDOWN_EXTENSION));
        if !is_valid_id(id) {
            return Err(Error::NotFound { path });
        }

        let text = fs::read_to_string(&path).map_err(|err| Error::from_io(&path, err))?;
        tracing::debug!(id = %id, "read article");
        let (front_matter, body) = read_front_matter(id, &text);
        let title = markdown::Structure::scan(body).title();
        let body_content = markdown::strip_title(body);
        let headings = markdown::headings(&body_content);

        Ok(ArticleDetail {
            summary: summarize(id, front_matter, title),
            body_content,
            headings,
        })
    }

    /// Lists `(id, path)` for every markdown file directly inside the root,
    /// sorted by id. Directories, hidden files and other extensions are
    /// ignored.
    fn markdown_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let entries = fs::read_dir(&self.root)
            .map_err(|err| Error::from_io(&self.root, err))?;

        let mut files: Vec<(String, PathBuf)> = entries
            .filter_map(|entry| markdown_file(&self.root, entry.map(|e| e.path())))
            .collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }
}

/// Classifies one directory entry, returning `(id, path)` for a markdown
/// article. An entry that can't be read is logged and skipped so that it
/// doesn't hide the rest of the directory.
fn markdown_file(
    root: &Path,
    entry: std::io::Result<PathBuf>,
) -> Option<(String, PathBuf)> {
    let path = match entry {
        Ok(path) => path,
        Err(err) => {
            tracing::warn!("skipping entry: {}", Error::from_io(root, err));
            return None;
        }
    };
    if path.extension().map_or(true, |ext| ext != MARKDOWN_EXTENSION)
        || !path.is_file()
    {
        return None;
    }
    match path.file_stem().and_then(|stem| stem.to_str()) {
        Some(id) if !id.is_empty() && !id.starts_with('.') => {
            Some((id.to_owned(), path))
        }
        Some(_) => None,
        None => {
            tracing::warn!("skipping article with non-UTF-8 name: {:?}", path);
            None
        }
    }
}

/// Splits and parses the front-matter of article `id`. A malformed block is
/// logged and replaced by empty front-matter. The returned body starts after
/// the closing fence, or is the whole text when there's no closing fence.
fn read_front_matter<'a>(id: &str, text: &'a str) -> (FrontMatter, &'a str) {
    let degraded = |err: frontmatter::Error| {
        let err = Error::MalformedFrontMatter {
            id: id.to_owned(),
            reason: err.to_string(),
        };
        tracing::warn!("{}; using empty front-matter", err);
        FrontMatter::default()
    };

    match frontmatter::split(text) {
        Ok(split) => match split.yaml.map(FrontMatter::parse).transpose() {
            Ok(front_matter) => (front_matter.unwrap_or_default(), split.body),
            Err(err) => (degraded(err), split.body),
        },
        Err(err) => (degraded(err), text),
    }
}

fn summarize(
    id: &str,
    front_matter: FrontMatter,
    title: Option<&str>,
) -> ArticleSummary {
    let mut extra = front_matter.extra;
    extra.retain(|key, _| {
        let reserved = RESERVED_KEYS.contains(&key.as_str());
        if reserved {
            tracing::debug!(
                id = %id,
                key = %key,
                "ignoring reserved front-matter key"
            );
        }
        !reserved
    });

    ArticleSummary {
        id: id.to_owned(),
        title: title
            .map(str::to_owned)
            .or(front_matter.title)
            .unwrap_or_else(|| id.to_owned()),
        date_posted: front_matter
            .date_posted
            .or(front_matter.date)
            .unwrap_or_default(),
        date_updated: front_matter.date_updated,
        tags: front_matter.tags,
        aliases: front_matter.aliases,
        extra,
    }
}

/// An id must name a file directly inside the root.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains(|c: char| c == '/' || c == '\\' || c == '\0')
}
