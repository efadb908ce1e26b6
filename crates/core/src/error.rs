use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    ConfigParse(String),
    IoError(std::io::Error),
    InvalidData(String),
    Frontmatter {
        path: PathBuf,
        message: String,
    },
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
    Query(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigParse(msg) => write!(f, "Configuration parse error: {}", msg),
            Error::IoError(err) => write!(f, "IO error: {}", err),
            Error::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            Error::Frontmatter { path, message } => {
                write!(f, "Invalid frontmatter in {}: {}", path.display(), message)
            }
            Error::DuplicateSlug {
                slug,
                first,
                second,
            } => write!(
                f,
                "Duplicate slug '{}': {} and {}",
                slug,
                first.display(),
                second.display()
            ),
            Error::Query(msg) => write!(f, "Query error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParse(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Query(err.to_string())
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        match err.into_io_error() {
            Some(io) => Error::IoError(io),
            None => Error::InvalidData("filesystem loop while walking content".to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
