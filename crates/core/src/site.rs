use crate::config::{CONFIG_FILE, SiteConfig, parse_site_toml};
use crate::error::{Error, Result};
use crate::routes::{RouteMaterializer, RouteTable};
use crate::slug::SlugDeriver;
use crate::store::{ContentFilter, ContentStore};
use std::path::{Path, PathBuf};

/// A loaded site: configuration plus a fully populated content store
pub struct Site {
    pub root: PathBuf,
    pub config: SiteConfig,
    pub store: ContentStore,
}

impl Site {
    /// Read `folio.toml` under `root` and ingest the content directory.
    ///
    /// Ingestion runs to completion (slugs included) before this returns.
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            return Err(Error::InvalidData(format!(
                "{} not found in {}",
                CONFIG_FILE,
                root.display()
            )));
        }
        let config = parse_site_toml(&config_path)?;

        let mut store = ContentStore::new(root.join(&config.content.dir));
        store.register_hook(SlugDeriver::new(config.content.content_type));
        store.load()?;

        Ok(Self {
            root,
            config,
            store,
        })
    }

    pub fn materializer(&self) -> RouteMaterializer {
        RouteMaterializer::from_config(&self.config.content)
    }

    /// Materialize the site's routes into a path-keyed table
    pub fn routes(&self) -> Result<RouteTable> {
        let mut table = RouteTable::new();
        self.materializer().materialize(&self.store, &mut table)?;
        Ok(table)
    }

    /// Documents listed on the projects page
    pub fn projects_filter(&self) -> ContentFilter {
        ContentFilter::new(
            self.config.content.content_type,
            self.config.content.projects_scope.clone(),
        )
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.config.build.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_site(dir: &Path) {
        fs::write(
            dir.join(CONFIG_FILE),
            "[site]\ntitle = \"Blog\"\nauthor = \"Me\"\n",
        )
        .unwrap();
        fs::create_dir_all(dir.join("content/posts")).unwrap();
        fs::create_dir_all(dir.join("content/projects")).unwrap();
        fs::write(
            dir.join("content/posts/hello-world.mdx"),
            "---\ntitle: Hello\ndate: 2021-01-01\ntags: [Go, go]\n---\nHi\n",
        )
        .unwrap();
        fs::write(
            dir.join("content/posts/second-post.mdx"),
            "---\ntitle: Second\ndate: 2021-02-01\ntags: [Rust]\n---\nHi\n",
        )
        .unwrap();
        fs::write(
            dir.join("content/projects/tool.mdx"),
            "---\ntitle: Tool\ndate: 2020-02-01\ntags: [Cli]\n---\nHi\n",
        )
        .unwrap();
    }

    #[test]
    fn test_load_and_route_site() {
        let dir = TempDir::new().unwrap();
        write_site(dir.path());

        let site = Site::load(dir.path()).unwrap();
        assert_eq!(site.store.all_documents().len(), 3);

        let routes = site.routes().unwrap();
        assert_eq!(
            routes.paths(),
            vec![
                "/post/",
                "/post/hello-world",
                "/post/second-post",
                "/t/cli",
                "/t/go",
                "/t/rust"
            ]
        );
        assert_eq!(site.output_dir(), dir.path().join("public"));
    }

    #[test]
    fn test_projects_filter_selects_project_documents() {
        let dir = TempDir::new().unwrap();
        write_site(dir.path());

        let site = Site::load(dir.path()).unwrap();
        let projects = site.store.find_documents(&site.projects_filter()).unwrap();
        let slugs: Vec<&str> = projects.iter().filter_map(|d| d.slug()).collect();
        assert_eq!(slugs, vec!["tool"]);
    }

    #[test]
    fn test_load_without_config_fails() {
        let dir = TempDir::new().unwrap();
        let err = Site::load(dir.path()).err().unwrap();
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn test_load_fails_on_duplicate_slug() {
        let dir = TempDir::new().unwrap();
        write_site(dir.path());
        fs::write(
            dir.path().join("content/projects/hello-world.mdx"),
            "---\ntitle: Clash\ndate: 2021-01-01\n---\n",
        )
        .unwrap();

        let err = Site::load(dir.path()).err().unwrap();
        assert!(matches!(err, Error::DuplicateSlug { .. }));
    }
}
