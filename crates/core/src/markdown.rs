//! Computed document fields: reading time, table of contents, rendered body.

use crate::types::TocEntry;
use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use std::borrow::Cow;
use std::collections::HashMap;

/// Average reading speed used for `time_to_read`
pub const WORDS_PER_MINUTE: usize = 265;

/// Deepest heading level listed in the table of contents
pub const TOC_MAX_DEPTH: u32 = 3;

/// Everything computed from a document body in one pass over the markdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBody {
    pub html: String,
    pub time_to_read: u32,
    pub table_of_contents: Vec<TocEntry>,
}

struct Heading {
    depth: u32,
    title: String,
    anchor: String,
}

/// Render an MDX body: top-level `import`/`export` blocks are module code,
/// not content, and are dropped before the markdown pass.
pub fn render_mdx(body: &str) -> RenderedBody {
    render(&strip_esm(body))
}

pub fn render(body: &str) -> RenderedBody {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES;

    let mut events: Vec<Event> = Parser::new_ext(body, options).collect();

    let mut words = 0;
    let mut headings = Vec::new();
    let mut slugger = Slugger::default();
    let mut open_heading: Option<(usize, u32, String)> = None;

    for i in 0..events.len() {
        if matches!(events[i], Event::End(TagEnd::Heading(_))) {
            let Some((start, depth, title)) = open_heading.take() else {
                continue;
            };
            let anchor = match &mut events[start] {
                Event::Start(Tag::Heading { id: Some(id), .. }) => {
                    slugger.reserve(id);
                    id.to_string()
                }
                Event::Start(Tag::Heading { id, .. }) => {
                    let anchor = slugger.slug(&title);
                    *id = Some(CowStr::from(anchor.clone()));
                    anchor
                }
                _ => continue,
            };
            headings.push(Heading {
                depth,
                title,
                anchor,
            });
            continue;
        }

        match &events[i] {
            Event::Start(Tag::Heading { level, .. }) => {
                open_heading = Some((i, heading_depth(*level), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                words += text.split_whitespace().count();
                if let Some((_, _, title)) = open_heading.as_mut() {
                    title.push_str(text);
                }
            }
            _ => {}
        }
    }

    let mut html_out = String::new();
    html::push_html(&mut html_out, events.into_iter());

    let shown: Vec<Heading> = headings
        .into_iter()
        .filter(|h| h.depth <= TOC_MAX_DEPTH)
        .collect();

    RenderedBody {
        html: html_out,
        time_to_read: reading_time(words),
        table_of_contents: build_toc(&shown),
    }
}

/// Remove top-level ESM blocks: a paragraph whose first line starts with
/// `import ` or `export `, up to the next blank line. Fenced code is kept.
fn strip_esm(body: &str) -> Cow<'_, str> {
    let mut out = String::with_capacity(body.len());
    let mut in_fence: Option<&str> = None;
    let mut in_esm = false;
    let mut at_block_start = true;
    let mut stripped = false;

    for line in body.split_inclusive('\n') {
        let trimmed = line.trim_end();

        if let Some(fence) = in_fence {
            if trimmed.trim_start().starts_with(fence) {
                in_fence = None;
            }
            out.push_str(line);
            continue;
        }

        if in_esm {
            if trimmed.is_empty() {
                in_esm = false;
                at_block_start = true;
            }
            continue;
        }

        if trimmed.is_empty() {
            at_block_start = true;
            out.push_str(line);
            continue;
        }

        if at_block_start && (line.starts_with("import ") || line.starts_with("export ")) {
            in_esm = true;
            stripped = true;
            continue;
        }

        let opener = trimmed.trim_start();
        if opener.starts_with("```") {
            in_fence = Some("```");
        } else if opener.starts_with("~~~") {
            in_fence = Some("~~~");
        }
        at_block_start = false;
        out.push_str(line);
    }

    if stripped {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(body)
    }
}

/// Minutes to read `words`, never less than one
pub fn reading_time(words: usize) -> u32 {
    let minutes = (words as f64 / WORDS_PER_MINUTE as f64).round() as u32;
    minutes.max(1)
}

fn heading_depth(level: HeadingLevel) -> u32 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Nest headings: each heading owns the deeper headings that follow it
/// until the next heading at its own depth or shallower.
fn build_toc(headings: &[Heading]) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut i = 0;
    while i < headings.len() {
        let current = &headings[i];
        let end = headings[i + 1..]
            .iter()
            .position(|h| h.depth <= current.depth)
            .map(|offset| i + 1 + offset)
            .unwrap_or(headings.len());

        entries.push(TocEntry {
            url: format!("#{}", current.anchor),
            title: current.title.clone(),
            items: build_toc(&headings[i + 1..end]),
        });
        i = end;
    }
    entries
}

/// GitHub-style heading anchors, unique within one document
#[derive(Default)]
struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    fn slug(&mut self, text: &str) -> String {
        let base: String = text
            .trim()
            .to_lowercase()
            .chars()
            .filter_map(|c| {
                if c.is_whitespace() {
                    Some('-')
                } else if c.is_alphanumeric() || c == '-' || c == '_' {
                    Some(c)
                } else {
                    None
                }
            })
            .collect();

        let mut slug = base.clone();
        while self.seen.contains_key(&slug) {
            let count = self.seen.entry(base.clone()).or_insert(0);
            *count += 1;
            slug = format!("{}-{}", base, count);
        }
        self.seen.insert(slug.clone(), 0);
        slug
    }

    /// Record an anchor the author set explicitly
    fn reserve(&mut self, id: &str) {
        self.seen.entry(id.to_string()).or_insert(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_time_rounds_and_floors_at_one() {
        assert_eq!(reading_time(0), 1);
        assert_eq!(reading_time(100), 1);
        assert_eq!(reading_time(265), 1);
        assert_eq!(reading_time(400), 2);
        assert_eq!(reading_time(265 * 7), 7);
    }

    #[test]
    fn test_render_counts_words() {
        let body = "word ".repeat(800);
        let rendered = render(&body);
        assert_eq!(rendered.time_to_read, 3);
    }

    #[test]
    fn test_render_adds_heading_ids() {
        let rendered = render("## Getting Started\n\ntext\n");
        assert!(
            rendered
                .html
                .contains(r#"<h2 id="getting-started">Getting Started</h2>"#)
        );
    }

    #[test]
    fn test_render_keeps_explicit_heading_id() {
        let rendered = render("## Setup {#custom}\n");
        assert!(rendered.html.contains(r#"id="custom""#));
        assert_eq!(rendered.table_of_contents[0].url, "#custom");
    }

    #[test]
    fn test_toc_nests_and_respects_max_depth() {
        let body = "\
# Intro
## Install
### From source
#### Too deep
## Usage
# Outro
";
        let toc = render(body).table_of_contents;
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].title, "Intro");
        assert_eq!(toc[0].items.len(), 2);
        assert_eq!(toc[0].items[0].title, "Install");
        assert_eq!(toc[0].items[0].items.len(), 1);
        assert_eq!(toc[0].items[0].items[0].url, "#from-source");
        assert!(toc[0].items[0].items[0].items.is_empty());
        assert_eq!(toc[1].title, "Outro");
    }

    #[test]
    fn test_toc_starting_below_top_level() {
        let toc = render("## A\n### B\n## C\n").table_of_contents;
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].items[0].title, "B");
    }

    #[test]
    fn test_duplicate_headings_get_suffixes() {
        let toc = render("## Notes\n## Notes\n## Notes\n").table_of_contents;
        let urls: Vec<&str> = toc.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["#notes", "#notes-1", "#notes-2"]);
    }

    #[test]
    fn test_slugger_strips_punctuation() {
        let mut slugger = Slugger::default();
        assert_eq!(slugger.slug("What's new in v2.0?"), "whats-new-in-v20");
        assert_eq!(slugger.slug("snake_case name"), "snake_case-name");
    }

    #[test]
    fn test_explicit_id_is_not_reused_by_generated_anchor() {
        let rendered = render("## Setup {#setup}\n## Setup\n");
        let urls: Vec<&str> = rendered
            .table_of_contents
            .iter()
            .map(|e| e.url.as_str())
            .collect();
        assert_eq!(urls, vec!["#setup", "#setup-1"]);
        assert_eq!(rendered.html.matches(r#"id="setup""#).count(), 1);
    }

    #[test]
    fn test_generated_suffix_skips_taken_anchor() {
        let urls: Vec<String> = render("## Notes 1\n## Notes\n## Notes\n")
            .table_of_contents
            .into_iter()
            .map(|e| e.url)
            .collect();
        assert_eq!(urls, vec!["#notes-1", "#notes", "#notes-2"]);
    }

    #[test]
    fn test_mdx_module_lines_are_dropped() {
        let body = "import { Chart } from \"../components/chart\"\n\
export const meta = { a: 1 }\n\
\n\
# Title\n\
\n\
<Chart data={points} />\n\
\n\
Text here.\n";
        let rendered = render_mdx(body);
        assert!(!rendered.html.contains("import"));
        assert!(!rendered.html.contains("export"));
        assert!(rendered.html.contains(r#"<h1 id="title">Title</h1>"#));
        assert!(rendered.html.contains("<Chart data={points} />"));
        assert!(rendered.html.contains("Text here."));
    }

    #[test]
    fn test_mdx_keeps_import_inside_code_and_paragraphs() {
        let body = "Use it:\nimport this\n\n```js\nimport x from \"y\"\n```\n";
        let rendered = render_mdx(body);
        assert!(rendered.html.contains("import this"));
        assert!(rendered.html.contains("import x from"));
    }

    #[test]
    fn test_mdx_module_words_are_not_counted() {
        let body = format!("import a from \"b\"\n{}\n\nshort\n", "word ".repeat(600));
        assert_eq!(render_mdx(&body).time_to_read, 1);
    }

    #[test]
    fn test_plain_markdown_keeps_import_paragraph() {
        let rendered = render("import numpy as np\n");
        assert!(rendered.html.contains("import numpy"));
    }

    #[test]
    fn test_heading_with_inline_code_title() {
        let toc = render("## Using `cargo`\n").table_of_contents;
        assert_eq!(toc[0].title, "Using cargo");
        assert_eq!(toc[0].url, "#using-cargo");
    }
}
