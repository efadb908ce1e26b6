//! YAML frontmatter extraction.
//!
//! A document starts with a `---` fence, YAML fields, and a closing `---`
//! fence. Everything after the closing fence is the body. Data files
//! (`.yaml`/`.yml`) are frontmatter in their entirety.

use crate::error::{Error, Result};
use crate::types::{ContentType, Frontmatter};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

const FENCE: &str = "---";

/// Raw frontmatter as written in the source file
#[derive(Debug, Deserialize)]
struct RawFrontmatter {
    title: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    date: Option<String>, // Parse as NaiveDate
    link: Option<String>,
    #[serde(default)]
    pinned: bool,
    image: Option<String>,
    demo: Option<String>,
    source: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    stack: Option<Vec<String>>,
}

/// Split a source file into its frontmatter block and body.
///
/// Returns `None` for the frontmatter when the file has no leading fence.
pub fn split(content: &str) -> (Option<&str>, &str) {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let Some(rest) = strip_fence_line(content) else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }

    // Opening fence without a closing one: treat the whole file as body
    (None, content)
}

fn strip_fence_line(content: &str) -> Option<&str> {
    let first_line_end = content.find('\n')?;
    if content[..first_line_end].trim_end() == FENCE {
        Some(&content[first_line_end + 1..])
    } else {
        None
    }
}

/// Parse a document's frontmatter, returning it along with the body text
pub fn parse<'a>(
    content: &'a str,
    content_type: ContentType,
    path: &Path,
) -> Result<(Frontmatter, &'a str)> {
    let (yaml, body) = if content_type.has_body() {
        match split(content) {
            (Some(yaml), body) => (yaml, body),
            (None, _) => {
                return Err(Error::Frontmatter {
                    path: path.to_path_buf(),
                    message: "missing frontmatter block".to_string(),
                });
            }
        }
    } else {
        (content, "")
    };

    let raw: RawFrontmatter = serde_yaml::from_str(yaml).map_err(|e| Error::Frontmatter {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let title = raw.title.ok_or_else(|| Error::Frontmatter {
        path: path.to_path_buf(),
        message: "missing required field 'title'".to_string(),
    })?;

    let date = match raw.date {
        Some(date) => Some(parse_date(&date).ok_or_else(|| Error::Frontmatter {
            path: path.to_path_buf(),
            message: format!("invalid date '{}', expected YYYY-MM-DD", date),
        })?),
        None if content_type.has_body() => {
            return Err(Error::Frontmatter {
                path: path.to_path_buf(),
                message: "missing required field 'date'".to_string(),
            });
        }
        None => None,
    };

    let frontmatter = Frontmatter {
        title,
        tags: raw.tags.unwrap_or_default(),
        date,
        link: raw.link,
        pinned: raw.pinned,
        image: raw.image,
        demo: raw.demo,
        source: raw.source,
        summary: raw.summary,
        stack: raw.stack.unwrap_or_default(),
    };

    Ok((frontmatter, body))
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part
/// (`2021-03-04T10:00:00Z`, `2021-03-04 10:00`).
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
