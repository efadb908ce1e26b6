pub mod config;
pub mod error;
pub mod frontmatter;
pub mod markdown;
pub mod routes;
pub mod site;
pub mod slug;
pub mod store;
pub mod types;

pub use config::{ContentScope, SiteConfig, parse_site_toml};
pub use error::{Error, Result};
pub use routes::{RouteMaterializer, RouteSink, RouteTable};
pub use site::Site;
pub use slug::SlugDeriver;
pub use store::{ContentFilter, ContentQuery, ContentStore, NodeHook, ParentLookup};
pub use types::*;
