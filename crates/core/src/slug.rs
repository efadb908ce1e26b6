use crate::error::{Error, Result};
use crate::store::{NodeHook, ParentLookup};
use crate::types::{ContentType, Document};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Node-creation hook that names each document after its source file.
///
/// For documents of the recognized type, `fields.slug` becomes the source
/// file's base name: no directory, no extension, case preserved. Other
/// documents are left alone. Slugs must be unique; a second document with
/// an already-seen slug aborts ingestion with [`Error::DuplicateSlug`].
pub struct SlugDeriver {
    content_type: ContentType,
    seen: HashMap<String, PathBuf>,
}

impl SlugDeriver {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            seen: HashMap::new(),
        }
    }
}

impl NodeHook for SlugDeriver {
    fn on_create_node(
        &mut self,
        document: &mut Document,
        parents: &ParentLookup<'_>,
    ) -> Result<()> {
        if document.content_type != self.content_type {
            return Ok(());
        }

        let file = parents.parent_of(document).ok_or_else(|| {
            Error::InvalidData(format!(
                "No file record for {}",
                document.absolute_path.display()
            ))
        })?;
        let slug = file.name.clone();

        if let Some(first) = self.seen.get(&slug) {
            return Err(Error::DuplicateSlug {
                slug,
                first: first.clone(),
                second: file.absolute_path.clone(),
            });
        }
        self.seen.insert(slug.clone(), file.absolute_path.clone());

        debug!(slug = %slug, "slug derived");
        document.fields.slug = Some(slug);
        Ok(())
    }
}
