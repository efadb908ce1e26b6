//! In-memory content store.
//!
//! Source files are ingested into file records and documents. Every new
//! document passes through the registered node-creation hooks before it is
//! stored, and the store answers the two queries routing depends on through
//! [`ContentQuery`].

use crate::config::ContentScope;
use crate::error::{Error, Result};
use crate::frontmatter;
use crate::markdown;
use crate::types::*;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Hook run once for every document as it is created
pub trait NodeHook {
    fn on_create_node(&mut self, document: &mut Document, parents: &ParentLookup<'_>)
    -> Result<()>;
}

/// Resolves a document to the file record it was created from.
///
/// `files` must be in ascending id order, which is the order the store
/// creates them in.
pub struct ParentLookup<'a> {
    files: &'a [FileNode],
}

impl<'a> ParentLookup<'a> {
    pub fn new(files: &'a [FileNode]) -> Self {
        Self { files }
    }

    pub fn parent_of(&self, document: &Document) -> Option<&'a FileNode> {
        self.files
            .binary_search_by_key(&document.parent, |f| f.id)
            .ok()
            .map(|index| &self.files[index])
    }
}

/// Which documents a query selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFilter {
    pub content_type: ContentType,
    pub scope: ContentScope,
}

impl ContentFilter {
    pub fn new(content_type: ContentType, scope: ContentScope) -> Self {
        Self {
            content_type,
            scope,
        }
    }

    fn compile(&self) -> Result<CompiledFilter> {
        let pattern = match &self.scope {
            ContentScope::All => None,
            ContentScope::Matching(pattern) => Some(Regex::new(pattern)?),
        };
        Ok(CompiledFilter {
            content_type: self.content_type,
            pattern,
        })
    }
}

struct CompiledFilter {
    content_type: ContentType,
    pattern: Option<Regex>,
}

impl CompiledFilter {
    fn matches(&self, document: &Document) -> bool {
        if document.content_type != self.content_type {
            return false;
        }
        match &self.pattern {
            None => true,
            Some(re) => re.is_match(&path_for_matching(&document.absolute_path)),
        }
    }
}

/// Source paths are matched with forward slashes on every platform
fn path_for_matching(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// The two read-only queries route materialization is built on
pub trait ContentQuery {
    /// All documents selected by `filter`, as `{ slug, path }` rows
    fn documents(&self, filter: &ContentFilter) -> Result<Vec<DocumentSummary>>;

    /// Distinct tag values across the documents selected by `filter`,
    /// sorted by name
    fn tag_groups(&self, filter: &ContentFilter) -> Result<Vec<TagGroup>>;
}

#[derive(Default)]
pub struct ContentStore {
    root: PathBuf,
    files: Vec<FileNode>,
    documents: Vec<Document>,
    hooks: Vec<Box<dyn NodeHook>>,
    next_id: usize,
}

impl ContentStore {
    /// Create an empty store whose content lives under `root`
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn register_hook<H: NodeHook + 'static>(&mut self, hook: H) {
        self.hooks.push(Box::new(hook));
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[FileNode] {
        &self.files
    }

    pub fn all_documents(&self) -> &[Document] {
        &self.documents
    }

    /// Walk the content root and ingest every file, in file-name order.
    ///
    /// Hidden files and directories are skipped. Returns the number of
    /// documents created.
    pub fn load(&mut self) -> Result<usize> {
        if !self.root.is_dir() {
            return Err(Error::InvalidData(format!(
                "Content directory does not exist: {}",
                self.root.display()
            )));
        }
        self.root = fs::canonicalize(&self.root)?;

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

        let before = self.documents.len();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            // Only documents are read; other files (images etc.) may be binary
            let is_document = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .and_then(ContentType::from_extension)
                .is_some();
            let content = if is_document {
                fs::read_to_string(entry.path())?
            } else {
                String::new()
            };
            self.ingest(entry.path(), &content)?;
        }

        let created = self.documents.len() - before;
        info!(
            root = %self.root.display(),
            files = self.files.len(),
            documents = created,
            "content loaded"
        );
        Ok(created)
    }

    /// Ingest one source file.
    ///
    /// A file record is always created; a document is created only when the
    /// extension maps to a content type. Returns the document id, if any.
    pub fn ingest(&mut self, absolute_path: &Path, content: &str) -> Result<Option<NodeId>> {
        let extension = absolute_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        let name = absolute_path
            .file_stem()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::InvalidData(format!("Invalid file name: {}", absolute_path.display()))
            })?
            .to_string();
        let relative_path = absolute_path
            .strip_prefix(&self.root)
            .unwrap_or(absolute_path)
            .to_path_buf();

        let file_id = self.allocate_id();
        self.files.push(FileNode {
            id: file_id,
            absolute_path: absolute_path.to_path_buf(),
            relative_path,
            name,
            extension: extension.clone(),
        });

        let Some(content_type) = ContentType::from_extension(&extension) else {
            debug!(path = %absolute_path.display(), "file record only");
            return Ok(None);
        };

        let (frontmatter, body) = frontmatter::parse(content, content_type, absolute_path)?;
        let rendered = match content_type {
            ContentType::Mdx => markdown::render_mdx(body),
            ContentType::Markdown => markdown::render(body),
            ContentType::Data => markdown::RenderedBody {
                html: String::new(),
                time_to_read: 0,
                table_of_contents: Vec::new(),
            },
        };

        let mut document = Document {
            id: self.allocate_id(),
            parent: file_id,
            content_type,
            absolute_path: absolute_path.to_path_buf(),
            frontmatter,
            fields: Fields::default(),
            time_to_read: rendered.time_to_read,
            table_of_contents: rendered.table_of_contents,
            body: rendered.html,
        };

        let parents = ParentLookup::new(&self.files);
        for hook in self.hooks.iter_mut() {
            hook.on_create_node(&mut document, &parents)?;
        }

        debug!(
            path = %absolute_path.display(),
            slug = document.slug().unwrap_or(""),
            "document created"
        );
        let id = document.id;
        self.documents.push(document);
        Ok(Some(id))
    }

    /// Full documents selected by `filter`, in ingest order
    pub fn find_documents(&self, filter: &ContentFilter) -> Result<Vec<&Document>> {
        let compiled = filter.compile()?;
        Ok(self
            .documents
            .iter()
            .filter(|d| compiled.matches(d))
            .collect())
    }

    /// Look up a document of `content_type` by its derived slug
    pub fn document_by_slug(&self, content_type: ContentType, slug: &str) -> Option<&Document> {
        self.documents
            .iter()
            .find(|d| d.content_type == content_type && d.slug() == Some(slug))
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl ContentQuery for ContentStore {
    fn documents(&self, filter: &ContentFilter) -> Result<Vec<DocumentSummary>> {
        self.find_documents(filter)?
            .into_iter()
            .map(|d| {
                let slug = d.slug().ok_or_else(|| {
                    Error::Query(format!(
                        "Document has no slug: {}",
                        d.absolute_path.display()
                    ))
                })?;
                Ok(DocumentSummary {
                    slug: slug.to_string(),
                    absolute_path: d.absolute_path.clone(),
                })
            })
            .collect()
    }

    fn tag_groups(&self, filter: &ContentFilter) -> Result<Vec<TagGroup>> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for document in self.find_documents(filter)? {
            let mut tags: Vec<&str> = document
                .frontmatter
                .tags
                .iter()
                .map(String::as_str)
                .collect();
            tags.sort_unstable();
            tags.dedup();
            for tag in tags {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }

        Ok(counts
            .into_iter()
            .map(|(name, total_count)| TagGroup {
                name: name.to_string(),
                total_count,
            })
            .collect())
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}
