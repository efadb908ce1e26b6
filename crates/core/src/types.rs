use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifier of a record inside the content store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Kind of document a source file is ingested as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Mdx,
    Markdown,
    Data,
}

impl ContentType {
    /// Map a file extension to the content type it is ingested as
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mdx" => Some(ContentType::Mdx),
            "md" | "markdown" => Some(ContentType::Markdown),
            "yaml" | "yml" => Some(ContentType::Data),
            _ => None,
        }
    }

    pub fn has_body(self) -> bool {
        !matches!(self, ContentType::Data)
    }
}

/// Filesystem record a document originates from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileNode {
    pub id: NodeId,
    pub absolute_path: PathBuf,
    /// Path relative to the content root
    pub relative_path: PathBuf,
    /// Base name without directory or extension
    pub name: String,
    pub extension: String,
}

/// Frontmatter fields of a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frontmatter {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// One-line description shown on project cards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Technologies a project is built with
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stack: Vec<String>,
}

/// Fields derived by node-creation hooks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// One entry of a document's table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Anchor URL, e.g. `#getting-started`
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<TocEntry>,
}

/// A unit of content: one ingested source file plus everything derived from it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: NodeId,
    /// Parent file record
    pub parent: NodeId,
    pub content_type: ContentType,
    pub absolute_path: PathBuf,
    pub frontmatter: Frontmatter,
    pub fields: Fields,
    /// Estimated reading time in minutes
    pub time_to_read: u32,
    pub table_of_contents: Vec<TocEntry>,
    /// Rendered body HTML
    pub body: String,
}

impl Document {
    pub fn slug(&self) -> Option<&str> {
        self.fields.slug.as_deref()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.frontmatter.tags.iter().any(|t| t == tag)
    }
}

/// Result row of a document query: `{ fields: { slug } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub slug: String,
    pub absolute_path: PathBuf,
}

/// Documents sharing one tag value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagGroup {
    pub name: String,
    pub total_count: usize,
}

/// Rendering template a route is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Template {
    SinglePost,
    PostList,
    TagPage,
}

/// Context handed to a template; templates re-query the store from it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RouteContext {
    Post { slug: String },
    Tag { tag: String },
    Empty {},
}

/// One page to generate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Route {
    pub path: String,
    pub template: Template,
    pub context: RouteContext,
}

/// Lower-cased route path segment for a tag
pub fn tag_path_segment(tag: &str) -> String {
    tag.to_lowercase()
}

/// Links written into pages must be absolute http(s) URLs or site-relative
pub fn is_valid_link(link: &str) -> bool {
    link.starts_with("https://") || link.starts_with("http://") || link.starts_with('/')
}
