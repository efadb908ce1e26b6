//! Route materialization.
//!
//! Runs once the store is populated: one route per post in the posts scope,
//! one post listing, one route per distinct tag in the tag scope.

use crate::config::ContentConfig;
use crate::error::Result;
use crate::store::{ContentFilter, ContentQuery};
use crate::types::{Route, RouteContext, Template, tag_path_segment};
use std::collections::BTreeMap;
use tracing::debug;

pub const POST_PREFIX: &str = "/post/";
pub const TAG_PREFIX: &str = "/t/";

/// Receives routes as they are emitted
pub trait RouteSink {
    fn create_page(&mut self, route: Route);
}

impl RouteSink for Vec<Route> {
    fn create_page(&mut self, route: Route) {
        self.push(route);
    }
}

/// Routes keyed by path.
///
/// A route whose path is already registered replaces the earlier one, so
/// tags that differ only by case end up as a single page carrying the last
/// emitted tag's context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: BTreeMap<String, Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Route> {
        self.routes.get(path)
    }

    /// Routes in path order
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.routes.keys().map(String::as_str).collect()
    }
}

impl RouteSink for RouteTable {
    fn create_page(&mut self, route: Route) {
        if let Some(previous) = self.routes.insert(route.path.clone(), route) {
            debug!(path = %previous.path, "route replaced");
        }
    }
}

pub fn post_path(slug: &str) -> String {
    format!("{}{}", POST_PREFIX, slug)
}

pub fn tag_path(tag: &str) -> String {
    format!("{}{}", TAG_PREFIX, tag_path_segment(tag))
}

/// Computes the full route set from two store queries
#[derive(Debug, Clone)]
pub struct RouteMaterializer {
    posts: ContentFilter,
    tags: ContentFilter,
}

impl RouteMaterializer {
    pub fn new(posts: ContentFilter, tags: ContentFilter) -> Self {
        Self { posts, tags }
    }

    pub fn from_config(config: &ContentConfig) -> Self {
        Self::new(
            ContentFilter::new(config.content_type, config.posts_scope.clone()),
            ContentFilter::new(config.content_type, config.tag_scope.clone()),
        )
    }

    pub fn posts_filter(&self) -> &ContentFilter {
        &self.posts
    }

    pub fn tags_filter(&self) -> &ContentFilter {
        &self.tags
    }

    /// Query the store and emit every route into `sink`.
    ///
    /// Returns the number of routes emitted, counting ones a path-keyed
    /// sink later collapses. Any query error aborts the whole run.
    pub fn materialize<Q, S>(&self, store: &Q, sink: &mut S) -> Result<usize>
    where
        Q: ContentQuery + ?Sized,
        S: RouteSink + ?Sized,
    {
        let mut emitted = 0;

        for post in store.documents(&self.posts)? {
            sink.create_page(Route {
                path: post_path(&post.slug),
                template: Template::SinglePost,
                context: RouteContext::Post { slug: post.slug },
            });
            emitted += 1;
        }

        sink.create_page(Route {
            path: POST_PREFIX.to_string(),
            template: Template::PostList,
            context: RouteContext::Empty {},
        });
        emitted += 1;

        for group in store.tag_groups(&self.tags)? {
            sink.create_page(Route {
                path: tag_path(&group.name),
                template: Template::TagPage,
                context: RouteContext::Tag { tag: group.name },
            });
            emitted += 1;
        }

        debug!(emitted, "routes materialized");
        Ok(emitted)
    }
}
