use crate::error::Error;

/// Directory path used for files that sit at the repository root.
pub const ROOT_DIRECTORY: &str = "/";

/// A repository-relative file path split into its directory (with trailing
/// separator) and base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePath {
    pub directory_path: String,
    pub file_name: String,
}

impl ChangePath {
    pub fn parse(path: &str) -> Result<Self, Error> {
        let invalid = |reason| Error::InvalidPath {
            path: path.to_string(),
            reason,
        };

        if path.trim().is_empty() {
            return Err(invalid("path is empty"));
        }
        if path.contains('\0') {
            return Err(invalid("path contains a NUL byte"));
        }
        if path.ends_with('/') {
            return Err(invalid("path names a directory, not a file"));
        }
        for segment in path.split('/') {
            match segment {
                "" => return Err(invalid("path has an empty segment")),
                "." | ".." => return Err(invalid("path has a relative segment")),
                _ => {}
            }
        }

        Ok(match path.rsplit_once('/') {
            Some((dir, name)) => ChangePath {
                directory_path: format!("{}/", dir),
                file_name: name.to_string(),
            },
            None => ChangePath {
                directory_path: ROOT_DIRECTORY.to_string(),
                file_name: path.to_string(),
            },
        })
    }
}

/// Directory segments of a path: everything before the final separator.
pub fn directory_segments(path: &str) -> impl Iterator<Item = &str> {
    let dir = path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    dir.split('/').filter(|segment| !segment.is_empty())
}

/// Final component of a path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
