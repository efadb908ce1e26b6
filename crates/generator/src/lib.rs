// Static page rendering for materialized routes

pub mod template;

use anyhow::{Context, Result, bail};
use folio_core::{ContentQuery, Route, RouteContext, Site, TagGroup, Template};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

pub struct GeneratedSite {
    pub pages: Vec<(String, String)>,   // (route path, html)
    pub assets: Vec<(String, Vec<u8>)>, // (file path, data)
}

/// Render every route of `site`, then the static projects page.
///
/// Templates only receive the route context; each one re-queries the store
/// for the documents it shows.
pub fn generate_site(site: &Site, is_preview: bool) -> Result<GeneratedSite> {
    let routes = site.routes().context("Failed to materialize routes")?;

    let tag_groups = site
        .store
        .tag_groups(site.materializer().tags_filter())
        .context("Failed to group tags")?;
    let top = template::top_tags(&tag_groups, site.config.build.top_tags);

    let mut pages = routes
        .iter()
        .map(|route| -> Result<(String, String)> {
            let html = render_route(site, route, &top, is_preview)
                .with_context(|| format!("Failed to render {}", route.path))?;
            Ok((route.path.clone(), html))
        })
        .collect::<Result<Vec<_>>>()?;

    pages.push((
        template::PROJECTS_PATH.to_string(),
        render_projects(site, is_preview)?,
    ));

    let assets = vec![
        (
            "style.css".to_string(),
            template::stylesheet().as_bytes().to_vec(),
        ),
        (
            "index.html".to_string(),
            template::root_redirect().into_bytes(),
        ),
    ];

    info!(pages = pages.len(), "site generated");
    Ok(GeneratedSite { pages, assets })
}

/// Render one route; `top` is the top-tag sidebar shared by the listings
pub fn render_route(
    site: &Site,
    route: &Route,
    top: &[&TagGroup],
    is_preview: bool,
) -> Result<String> {
    let meta = &site.config.site;
    let materializer = site.materializer();
    let content_type = site.config.content.content_type;

    match (&route.template, &route.context) {
        (Template::SinglePost, RouteContext::Post { slug }) => {
            let Some(document) = site.store.document_by_slug(content_type, slug) else {
                bail!("No document with slug '{}'", slug);
            };
            Ok(template::post_page(meta, document, is_preview))
        }
        (Template::PostList, _) => {
            let mut posts = site.store.find_documents(materializer.posts_filter())?;
            template::sort_for_listing(&mut posts);
            Ok(template::post_list_page(meta, &posts, top, is_preview))
        }
        (Template::TagPage, RouteContext::Tag { tag }) => {
            let mut posts: Vec<_> = site
                .store
                .find_documents(materializer.tags_filter())?
                .into_iter()
                .filter(|d| d.has_tag(tag))
                .collect();
            template::sort_for_listing(&mut posts);
            Ok(template::tag_page(meta, tag, &posts, top, is_preview))
        }
        (template, context) => bail!(
            "Route {} has context {:?} that does not fit template {:?}",
            route.path,
            context,
            template
        ),
    }
}

/// Projects page: every document in the projects scope
pub fn render_projects(site: &Site, is_preview: bool) -> Result<String> {
    let mut projects = site.store.find_documents(&site.projects_filter())?;
    template::sort_projects(&mut projects);
    Ok(template::projects_page(
        &site.config.site,
        &projects,
        is_preview,
    ))
}

/// Output file for a route path: `/post/hello` → `post/hello/index.html`
pub fn page_file(route_path: &str) -> Result<PathBuf> {
    let mut file = PathBuf::new();
    for segment in route_path.split('/').filter(|s| !s.is_empty()) {
        let segment_path = Path::new(segment);
        if segment_path.components().count() != 1
            || !matches!(segment_path.components().next(), Some(Component::Normal(_)))
        {
            bail!("Route path segment '{}' is not a plain name", segment);
        }
        file.push(segment);
    }
    file.push("index.html");
    Ok(file)
}

/// Write pages and assets under `output`
pub fn write_site(generated: &GeneratedSite, output: &Path) -> Result<usize> {
    fs::create_dir_all(output).context("Failed to create output directory")?;

    let mut written = 0;
    for (route_path, html) in &generated.pages {
        let path = output.join(page_file(route_path)?);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), "page written");
        written += 1;
    }

    for (asset_path, data) in &generated.assets {
        let path = output.join(asset_path);
        fs::write(&path, data).with_context(|| format!("Failed to write {}", path.display()))?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn blog() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "folio.toml",
            "[site]\ntitle = \"Blog\"\nauthor = \"Me\"\n",
        );
        write(
            dir.path(),
            "content/posts/hello-world.mdx",
            "---\ntitle: Hello World\ndate: 2021-01-01\ntags: [Go, go]\n---\n## Intro\n\nHi there\n",
        );
        write(
            dir.path(),
            "content/posts/second-post.mdx",
            "---\ntitle: Second Post\ndate: 2021-03-01\ntags: [Rust]\npinned: true\n---\nMore\n",
        );
        write(
            dir.path(),
            "content/projects/tool.mdx",
            "---\ntitle: Tool\ndate: 2020-01-01\ntags: [Rust, Cli]\n---\nA tool\n",
        );
        dir
    }

    #[test]
    fn test_page_file_mapping() {
        assert_eq!(page_file("/post/").unwrap(), PathBuf::from("post/index.html"));
        assert_eq!(
            page_file("/post/hello-world").unwrap(),
            PathBuf::from("post/hello-world/index.html")
        );
        assert_eq!(page_file("/t/go").unwrap(), PathBuf::from("t/go/index.html"));
    }

    #[test]
    fn test_page_file_rejects_traversal() {
        assert!(page_file("/post/..").is_err());
        assert!(page_file("/post/.").is_err());
    }

    #[test]
    fn test_generate_renders_every_route() {
        let dir = blog();
        let site = Site::load(dir.path()).unwrap();
        let generated = generate_site(&site, false).unwrap();

        let paths: Vec<&str> = generated.pages.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/post/",
                "/post/hello-world",
                "/post/second-post",
                "/t/cli",
                "/t/go",
                "/t/rust",
                "/projects/"
            ]
        );

        let page = |path: &str| {
            generated
                .pages
                .iter()
                .find(|(p, _)| p == path)
                .map(|(_, html)| html.clone())
                .unwrap()
        };

        let post = page("/post/hello-world");
        assert!(post.contains("Hello World"));
        assert!(post.contains(r##"<a href="#intro">Intro</a>"##));

        // Pinned post first; the project is outside the posts scope
        let listing = page("/post/");
        let second = listing.find("Second Post").unwrap();
        let hello = listing.find("Hello World").unwrap();
        assert!(second < hello);
        assert!(!listing.contains(">Tool<"));

        // Tag pages cover the whole tag scope, including projects
        let rust = page("/t/rust");
        assert!(rust.contains("Second Post"));
        assert!(rust.contains("Tool"));
        assert!(rust.contains("2 posts"));

        // The shared /t/go page shows the last group's exact tag
        let go = page("/t/go");
        assert!(go.contains("#go<"));

        let projects = page("/projects/");
        assert!(projects.contains(">Tool<"));
        assert!(!projects.contains("Hello World"));
    }

    #[test]
    fn test_write_site_creates_index_files() {
        let dir = blog();
        let site = Site::load(dir.path()).unwrap();
        let generated = generate_site(&site, false).unwrap();

        let output = dir.path().join("public");
        let written = write_site(&generated, &output).unwrap();
        assert_eq!(written, generated.pages.len() + generated.assets.len());

        assert!(output.join("index.html").exists());
        assert!(output.join("style.css").exists());
        assert!(output.join("post/index.html").exists());
        assert!(output.join("post/hello-world/index.html").exists());
        assert!(output.join("t/go/index.html").exists());
        assert!(output.join("projects/index.html").exists());
    }

    #[test]
    fn test_listing_sidebar_uses_shared_top_tags() {
        let dir = blog();
        let site = Site::load(dir.path()).unwrap();
        let route = Route {
            path: "/post/".to_string(),
            template: Template::PostList,
            context: RouteContext::Empty {},
        };
        let groups = vec![TagGroup {
            name: "Only".to_string(),
            total_count: 9,
        }];
        let top: Vec<&TagGroup> = groups.iter().collect();

        let html = render_route(&site, &route, &top, false).unwrap();
        assert!(html.contains(r#"href="/t/only""#));
        assert!(!html.contains(r#"class="top-tag" href="/t/rust""#));
    }

    #[test]
    fn test_mismatched_route_context_is_an_error() {
        let dir = blog();
        let site = Site::load(dir.path()).unwrap();
        let route = Route {
            path: "/t/x".to_string(),
            template: Template::TagPage,
            context: RouteContext::Empty {},
        };
        assert!(render_route(&site, &route, &[], false).is_err());
    }

    #[test]
    fn test_unknown_slug_is_an_error() {
        let dir = blog();
        let site = Site::load(dir.path()).unwrap();
        let route = Route {
            path: "/post/missing".to_string(),
            template: Template::SinglePost,
            context: RouteContext::Post {
                slug: "missing".to_string(),
            },
        };
        let err = render_route(&site, &route, &[], false).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
