//! The structural pass over an article body (title line, table-of-contents
//! headings, heading slugs) and the HTML renderer that injects the matching
//! heading anchors.

use crate::article::Heading;
use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Options, Parser, Tag};
use std::collections::HashMap;
use std::ops::Range;

/// The shallowest heading level included in a table of contents. Level 1 is
/// reserved for the title.
pub const MIN_TOC_LEVEL: u8 = 2;

/// The deepest heading level included in a table of contents.
pub const MAX_TOC_LEVEL: u8 = 4;

/// Converts heading text into an anchor id: lower-cased, stripped of
/// everything but word characters, whitespace and hyphens, with whitespace
/// runs collapsed into a single hyphen.
///
/// This is a pure function, so different texts that normalize identically
/// (`"Setup!"` and `"Setup"`) produce the same slug. Use [`Slugger`] when ids
/// need to be unique within a document.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.to_lowercase().chars() {
        if c.is_whitespace() {
            pending_space = true;
        } else if c.is_alphanumeric() || c == '_' || c == '-' {
            if pending_space {
                slug.push('-');
                pending_space = false;
            }
            slug.push(c);
        }
    }
    if pending_space {
        slug.push('-');
    }
    slug
}

/// Hands out document-unique slugs. The first occurrence of a slug is
/// returned bare; repeats get `-1`, `-2`, ... appended.
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    pub fn new() -> Slugger {
        Slugger::default()
    }

    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut candidate = base.clone();
        while let Some(count) = self.seen.get_mut(&candidate) {
            *count += 1;
            candidate = format!("{}-{}", base, count);
        }
        self.seen.insert(candidate.clone(), 0);
        candidate
    }

    /// Marks `id` as taken without handing it out.
    pub fn reserve(&mut self, id: &str) {
        self.seen.entry(id.to_owned()).or_insert(0);
    }
}

/// An ATX heading line found by [`Structure::scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingLine<'a> {
    /// Number of leading `#`s.
    pub level: u8,

    /// Heading text with surrounding whitespace and any closing `#`s removed.
    pub text: &'a str,

    /// Byte range of the whole line (including its line terminator) in the
    /// scanned body.
    pub line: Range<usize>,
}

/// The structure of a markdown body: its first level-1 heading and every
/// level 2-4 heading, in document order. Lines inside fenced code blocks are
/// skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Structure<'a> {
    pub title: Option<HeadingLine<'a>>,
    pub headings: Vec<HeadingLine<'a>>,
}

impl<'a> Structure<'a> {
    /// Scans `body` once, line by line.
    pub fn scan(body: &'a str) -> Structure<'a> {
        let mut structure = Structure::default();
        let mut fence: Option<(char, usize)> = None;
        let mut offset = 0;

        for raw in body.split_inclusive('\n') {
            let start = offset;
            offset += raw.len();
            let line = raw.trim_end();

            if let Some(marker) = fence_marker(line) {
                fence = match fence {
                    None => Some(marker),
                    Some((c, n))
                        if c == marker.0 && marker.1 >= n && is_bare_fence(line) =>
                    {
                        None
                    }
                    open => open,
                };
                continue;
            }
            if fence.is_some() {
                continue;
            }

            let heading = match atx_heading(line) {
                Some((level, text)) => HeadingLine {
                    level,
                    text,
                    line: start..offset,
                },
                None => continue,
            };
            match heading.level {
                1 if structure.title.is_none() => structure.title = Some(heading),
                MIN_TOC_LEVEL..=MAX_TOC_LEVEL => structure.headings.push(heading),
                _ => {}
            }
        }
        structure
    }

    /// The title text, if the body has a level-1 heading.
    pub fn title(&self) -> Option<&'a str> {
        self.title.as_ref().map(|h| h.text)
    }
}

/// Removes the first level-1 heading line from `body` and trims the result.
pub fn strip_title(body: &str) -> String {
    match Structure::scan(body).title {
        Some(title) => {
            let mut stripped = String::with_capacity(body.len());
            stripped.push_str(&body[..title.line.start]);
            stripped.push_str(&body[title.line.end..]);
            stripped.trim().to_owned()
        }
        None => body.trim().to_owned(),
    }
}

/// Builds the table of contents for `body`: every level 2-4 heading in
/// document order, with document-unique ids.
pub fn headings(body: &str) -> Vec<Heading> {
    toc_entries(body).into_iter().map(|(_, h)| h).collect()
}

/// The table of contents paired with the source line of each entry. Ids are
/// slugged from the text the heading renders to, so link targets, emphasis
/// markers and entities don't leak into them.
fn toc_entries(body: &str) -> Vec<(Range<usize>, Heading)> {
    let mut slugger = Slugger::new();
    Structure::scan(body)
        .headings
        .into_iter()
        .map(|h| {
            let rendered = plain_text(Parser::new_ext(&body[h.line.clone()], options()));
            let heading = Heading {
                id: slugger.slug(&rendered),
                text: h.text.to_owned(),
                level: h.level,
            };
            (h.line, heading)
        })
        .collect()
}

/// Concatenates the text and inline code of a run of events.
fn plain_text<'a>(events: impl IntoIterator<Item = Event<'a>>) -> String {
    events
        .into_iter()
        .filter_map(|ev| match ev {
            Event::Text(t) | Event::Code(t) => Some(t),
            _ => None,
        })
        .fold(String::new(), |mut text, t| {
            text.push_str(&t);
            text
        })
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Parses an ATX heading (`#` through `######`). The marker must be followed
/// by whitespace and non-empty text; up to three leading spaces are allowed.
fn atx_heading(line: &str) -> Option<(u8, &str)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let line = &line[indent..];
    let level = line.len() - line.trim_start_matches('#').len();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &line[level..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let mut text = rest.trim();
    let closed = text.trim_end_matches('#');
    if closed.is_empty() || closed.ends_with(char::is_whitespace) {
        text = closed.trim_end();
    }
    if text.is_empty() {
        return None;
    }
    Some((level as u8, text))
}

/// Returns the fence character and run length if `line` opens or closes a
/// fenced code block.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let c = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let run = trimmed.len() - trimmed.trim_start_matches(c).len();
    if run < 3 {
        return None;
    }
    if c == '`' && trimmed[run..].contains('`') {
        return None;
    }
    Some((c, run))
}

/// A closing fence carries no info string.
fn is_bare_fence(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.trim_start_matches(|c: char| c == '`' || c == '~').is_empty()
}

/// Renders a markdown body to HTML. Level 2-4 headings get `id`
/// attributes: a heading on a table-of-contents line reuses that entry's id
/// from [`headings`]; any other (setext, or nested in a block quote) gets a
/// fresh slug that can't collide with them.
pub fn to_html(markdown: &str) -> String {
    let toc = toc_entries(markdown);
    let mut slugger = Slugger::new();
    for (_, heading) in &toc {
        slugger.reserve(&heading.id);
    }

    let events: Vec<(Event, Range<usize>)> = Parser::new_ext(markdown, options())
        .into_offset_iter()
        .collect();
    let mut out: Vec<Event> = Vec::with_capacity(events.len());

    let mut i = 0;
    while i < events.len() {
        let (event, range) = &events[i];
        let level = match event {
            Event::Start(Tag::Heading(level, _, _)) => toc_level(*level),
            _ => None,
        };
        let level = match level {
            Some(level) => level,
            None => {
                out.push(event.clone());
                i += 1;
                continue;
            }
        };

        let end = events[i..]
            .iter()
            .position(|(ev, _)| matches!(ev, Event::End(Tag::Heading(..))))
            .map(|n| i + n)
            .unwrap_or(events.len());
        let inner = &events[i + 1..end];

        let id = match toc.iter().find(|(line, _)| line.contains(&range.start)) {
            Some((_, heading)) => heading.id.clone(),
            None => slugger.slug(&plain_text(inner.iter().map(|(ev, _)| ev.clone()))),
        };

        out.push(Event::Html(CowStr::Boxed(
            format!("<h{} id=\"{}\">", level, id).into_boxed_str(),
        )));
        out.extend(inner.iter().map(|(ev, _)| ev.clone()));
        out.push(Event::Html(CowStr::Boxed(
            format!("</h{}>\n", level).into_boxed_str(),
        )));
        i = end + 1;
    }

    let mut rendered = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut rendered, out.into_iter());
    rendered
}

fn toc_level(level: HeadingLevel) -> Option<u8> {
    match level {
        HeadingLevel::H2 => Some(2),
        HeadingLevel::H3 => Some(3),
        HeadingLevel::H4 => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("First Section"), "first-section");
        assert_eq!(slugify("What's  new in v2.0?"), "whats-new-in-v20");
        assert_eq!(slugify("snake_case and kebab-case"), "snake_case-and-kebab-case");
        assert_eq!(slugify("Café au lait"), "café-au-lait");
    }

    #[test]
    fn test_slugify_is_not_unique() {
        assert_eq!(slugify("Setup!"), slugify("Setup"));
        assert_eq!(slugify("Setup"), slugify("Setup"));
    }

    #[test]
    fn test_slugger_suffixes_repeats() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Setup"), "setup");
        assert_eq!(slugger.slug("Setup!"), "setup-1");
        assert_eq!(slugger.slug("Setup"), "setup-2");
        assert_eq!(slugger.slug("Setup 1"), "setup-1-1");
    }

    #[test]
    fn test_scan_excludes_title_from_headings() {
        let structure = Structure::scan("# Title\n## Intro\ntext\n### Details\n");
        assert_eq!(structure.title(), Some("Title"));
        let found: Vec<(u8, &str)> = structure
            .headings
            .iter()
            .map(|h| (h.level, h.text))
            .collect();
        assert_eq!(found, vec![(2, "Intro"), (3, "Details")]);
    }

    #[test]
    fn test_scan_levels_outside_toc() {
        let structure =
            Structure::scan("##### Deep\n###### Deeper\n####### Not\n#NoSpace\n");
        assert!(structure.title.is_none());
        assert!(structure.headings.is_empty());
    }

    #[test]
    fn test_scan_skips_fenced_code() {
        let body = "```sh\n# install\n## not a heading\n```\n~~~\n# nope\n~~~\n## Real\n";
        let structure = Structure::scan(body);
        assert!(structure.title.is_none());
        assert_eq!(structure.headings.len(), 1);
        assert_eq!(structure.headings[0].text, "Real");
    }

    #[test]
    fn test_scan_trims_closing_hashes() {
        let structure = Structure::scan("## Intro ##\n## C# tips\n");
        assert_eq!(structure.headings[0].text, "Intro");
        assert_eq!(structure.headings[1].text, "C# tips");
    }

    #[test]
    fn test_strip_title() {
        let body = "\n# My Title\nSome text.\n## First Section\nMore text.\n";
        let stripped = strip_title(body);
        assert!(stripped.starts_with("Some text."));
        assert!(!stripped.contains("# My Title"));
        assert!(stripped.contains("## First Section"));
    }

    #[test]
    fn test_strip_title_only_first() {
        let stripped = strip_title("# One\ntext\n# Two\n");
        assert_eq!(stripped, "text\n# Two");
    }

    #[test]
    fn test_headings_unique_ids() {
        let found = headings("## Setup\n### Setup!\n## Usage\n");
        let ids: Vec<&str> = found.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["setup", "setup-1", "usage"]);
        assert_eq!(found[1].level, 3);
        assert_eq!(found[1].text, "Setup!");
    }

    #[test]
    fn test_to_html_injects_heading_ids() {
        let rendered = to_html(
            "Intro.\n\n## First Section\n\n### First Section\n\n##### Tiny\n",
        );
        assert!(rendered.contains("<h2 id=\"first-section\">First Section</h2>"));
        assert!(rendered.contains("<h3 id=\"first-section-1\">First Section</h3>"));
        assert!(rendered.contains("<h5>Tiny</h5>"));
    }

    #[test]
    fn test_headings_slug_rendered_text() {
        let found =
            headings("## See [the docs](https://example.com)\n## Tom &amp; Jerry\n");
        let ids: Vec<&str> = found.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["see-the-docs", "tom-jerry"]);
        assert_eq!(found[0].text, "See [the docs](https://example.com)");
    }

    #[test]
    fn test_to_html_anchors_for_inline_markup() {
        let body = "## See [the docs](https://example.com)\n\n\
                    ## Tom &amp; Jerry\n\n\
                    ## *Emphasis* and \\_escapes\\_\n";
        let rendered = to_html(body);
        for heading in headings(body) {
            assert!(
                rendered.contains(&format!("id=\"{}\"", heading.id)),
                "no anchor for `{}` in {}",
                heading.id,
                rendered
            );
        }
    }

    #[test]
    fn test_to_html_headings_outside_toc() {
        let rendered = to_html("## Setup\n\nSetup\n-----\n\n> ## Setup\n");
        assert!(rendered.contains("<h2 id=\"setup\">"));
        assert!(rendered.contains("<h2 id=\"setup-1\">"));
        assert!(rendered.contains("<h2 id=\"setup-2\">"));
    }

    #[test]
    fn test_to_html_ids_match_headings() {
        let body = "## Getting `cargo`\ntext\n## Done!\n";
        let rendered = to_html(body);
        for heading in headings(body) {
            assert!(rendered.contains(&format!("id=\"{}\"", heading.id)));
        }
    }
}
