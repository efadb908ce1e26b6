use crate::error::{Error, Result};
use crate::types::ContentType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file at the site root
pub const CONFIG_FILE: &str = "folio.toml";

pub const DEFAULT_POSTS_PATTERN: &str = "/content/posts/";
pub const DEFAULT_PROJECTS_PATTERN: &str = "/content/projects/";

/// Complete site configuration
#[derive(Debug, Clone, Serialize)]
pub struct SiteConfig {
    pub site: SiteMetadata,
    pub content: ContentConfig,
    pub build: BuildConfig,
}

/// Site-wide metadata used by the page chrome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteMetadata {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Card image for documents without their own `image`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_image: Option<String>,
}

/// Which documents a query covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ContentScope {
    /// Every document of the content type
    All,
    /// Documents whose absolute source path matches the regex
    Matching(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentConfig {
    /// Content root, relative to the site root
    pub dir: PathBuf,
    /// Recognized content type: gets slugs and routes
    pub content_type: ContentType,
    /// Scope of the per-post and listing routes
    pub posts_scope: ContentScope,
    /// Scope of the tag aggregation
    pub tag_scope: ContentScope,
    /// Documents listed on the projects page
    pub projects_scope: ContentScope,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildConfig {
    pub output: PathBuf,
    pub top_tags: usize,
}

/// Raw TOML configuration structure
/// This matches the folio.toml file structure exactly
#[derive(Debug, Deserialize)]
struct RawConfig {
    site: SiteMetadata,
    #[serde(default)]
    content: RawContentConfig,
    #[serde(default)]
    build: RawBuildConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawContentConfig {
    dir: String,
    content_type: String,
    posts_pattern: String,
    tag_scope: String,
    projects_pattern: String,
}

impl Default for RawContentConfig {
    fn default() -> Self {
        Self {
            dir: "content".to_string(),
            content_type: "mdx".to_string(),
            posts_pattern: DEFAULT_POSTS_PATTERN.to_string(),
            tag_scope: "all".to_string(),
            projects_pattern: DEFAULT_PROJECTS_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawBuildConfig {
    output: String,
    top_tags: usize,
}

impl Default for RawBuildConfig {
    fn default() -> Self {
        Self {
            output: "public".to_string(),
            top_tags: 10,
        }
    }
}

/// Parse folio.toml from a file path
pub fn parse_site_toml<P: AsRef<Path>>(path: P) -> Result<SiteConfig> {
    let content = fs::read_to_string(path)?;
    parse_site_toml_str(&content)
}

/// Parse folio.toml from a string (useful for testing)
pub fn parse_site_toml_str(content: &str) -> Result<SiteConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.site.title.trim().is_empty() {
        return Err(Error::ConfigParse("site.title must not be empty".to_string()));
    }

    let content_type = match raw.content.content_type.as_str() {
        "mdx" => ContentType::Mdx,
        "markdown" | "md" => ContentType::Markdown,
        other => {
            return Err(Error::ConfigParse(format!(
                "Unknown content.content_type '{}', expected \"mdx\" or \"markdown\"",
                other
            )));
        }
    };

    let posts_scope = pattern_scope(raw.content.posts_pattern, "content.posts_pattern")?;
    let projects_scope =
        pattern_scope(raw.content.projects_pattern, "content.projects_pattern")?;

    let tag_scope = match raw.content.tag_scope.as_str() {
        "all" => ContentScope::All,
        "posts" => posts_scope.clone(),
        other => {
            return Err(Error::ConfigParse(format!(
                "Unknown content.tag_scope '{}', expected \"all\" or \"posts\"",
                other
            )));
        }
    };

    Ok(SiteConfig {
        site: raw.site,
        content: ContentConfig {
            dir: validate_path(&raw.content.dir, "content.dir")?,
            content_type,
            posts_scope,
            tag_scope,
            projects_scope,
        },
        build: BuildConfig {
            output: validate_path(&raw.build.output, "build.output")?,
            top_tags: raw.build.top_tags,
        },
    })
}

/// A path pattern scope; broken patterns fail at load time
fn pattern_scope(pattern: String, field_name: &str) -> Result<ContentScope> {
    if pattern.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "{} must not be empty",
            field_name
        )));
    }
    regex::Regex::new(&pattern)
        .map_err(|e| Error::ConfigParse(format!("Invalid {}: {}", field_name, e)))?;
    Ok(ContentScope::Matching(pattern))
}

/// Validate and convert a path string to PathBuf.
///
/// Rejects absolute paths and parent directory references (`..`) so a
/// folio.toml cannot point the build outside the site directory.
fn validate_path(path_str: &str, field_name: &str) -> Result<PathBuf> {
    let path = Path::new(path_str);

    // Reject absolute paths
    if path.is_absolute() {
        return Err(Error::ConfigParse(format!(
            "Absolute paths not allowed in '{}': '{}'. Use relative paths only.",
            field_name, path_str
        )));
    }

    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::ConfigParse(format!(
                "Parent directory references (..) not allowed in '{}': '{}'",
                field_name, path_str
            )));
        }
    }

    if path_str.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    Ok(path.to_path_buf())
}
