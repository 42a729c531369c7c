//! Znode path normalization and validation.

use crate::coordination::{ZnodeError, ZnodeResult};

/// Prefix a leading `/` when missing. Idempotent.
pub fn normalize(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Check that `path` is an absolute znode path the service will accept.
pub fn validate(path: &str) -> ZnodeResult<()> {
    if path == "/" {
        return Ok(());
    }
    if !path.starts_with('/') {
        return Err(invalid(path, "must start with '/'"));
    }
    if path.ends_with('/') {
        return Err(invalid(path, "must not end with '/'"));
    }
    if path.contains('\0') {
        return Err(invalid(path, "must not contain NUL characters"));
    }
    for segment in path[1..].split('/') {
        match segment {
            "" => return Err(invalid(path, "empty path segment")),
            "." | ".." => return Err(invalid(path, "relative path segment")),
            _ => {}
        }
    }
    Ok(())
}

/// Normalize then validate.
pub fn resolve(path: &str) -> ZnodeResult<String> {
    let path = normalize(path);
    validate(&path)?;
    Ok(path)
}

/// Resolve a create target. A sequential create may end in `/`, naming only
/// the parent; the service-assigned counter then forms the whole name.
pub fn resolve_create(path: &str, sequential: bool) -> ZnodeResult<String> {
    let path = normalize(path);
    match path.strip_suffix('/') {
        Some(parent) if sequential && !parent.is_empty() => validate(parent)?,
        _ => validate(&path)?,
    }
    Ok(path)
}

/// Parent of a valid path; `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    match path.rfind('/') {
        _ if path == "/" => None,
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Proper ancestors of a valid path, outermost first, root excluded.
pub fn ancestors(path: &str) -> Vec<&str> {
    path.match_indices('/')
        .map(|(idx, _)| idx)
        .filter(|&idx| idx > 0)
        .map(|idx| &path[..idx])
        .collect()
}

/// Join a parent path and a child name.
pub fn child(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}

fn invalid(path: &str, reason: &str) -> ZnodeError {
    ZnodeError::InvalidInput(format!("invalid path {:?}: {}", path, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefixes_slash() {
        assert_eq!(normalize("app/config"), "/app/config");
        assert_eq!(normalize(""), "/");
    }

    #[test]
    fn test_normalize_idempotent() {
        for p in ["/", "/a", "/a/b", "a", "a/b/c"] {
            let once = normalize(p);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_validate_accepts_wellformed() {
        assert!(validate("/").is_ok());
        assert!(validate("/zookeeper").is_ok());
        assert!(validate("/jobs/task-").is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed() {
        for p in ["/a/", "/a//b", "/a/./b", "/..", "relative", "/a\0b"] {
            let err = validate(p).unwrap_err();
            assert_eq!(err.kind(), "InvalidInput", "path {:?}", p);
        }
    }

    #[test]
    fn test_resolve_create_trailing_slash() {
        assert_eq!(resolve_create("jobs/", true).unwrap(), "/jobs/");
        assert_eq!(resolve_create("/jobs/task-", true).unwrap(), "/jobs/task-");
        assert_eq!(resolve_create("/", true).unwrap(), "/");
        assert_eq!(resolve_create("/jobs/", false).unwrap_err().kind(), "InvalidInput");
        assert_eq!(resolve_create("/jobs//", true).unwrap_err().kind(), "InvalidInput");
        assert_eq!(resolve_create("/a/../", true).unwrap_err().kind(), "InvalidInput");
    }

    #[test]
    fn test_parent_and_ancestors_of_sequence_prefix() {
        assert_eq!(parent("/jobs/"), Some("/jobs"));
        assert_eq!(ancestors("/jobs/"), vec!["/jobs"]);
    }

    #[test]
    fn test_parent() {
        assert_eq!(parent("/"), None);
        assert_eq!(parent("/a"), Some("/"));
        assert_eq!(parent("/a/b/c"), Some("/a/b"));
    }

    #[test]
    fn test_ancestors() {
        assert_eq!(ancestors("/a/b/c"), vec!["/a", "/a/b"]);
        assert!(ancestors("/a").is_empty());
        assert!(ancestors("/").is_empty());
    }

    #[test]
    fn test_child() {
        assert_eq!(child("/", "a"), "/a");
        assert_eq!(child("/a", "b"), "/a/b");
    }
}
