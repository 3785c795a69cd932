//! Path normalization and class/method splitting
//!
//! ```text
//! normalize_path("")      == "/"
//! normalize_path("a/b/")  == "/a/b"
//! split_path("/a/b/")     == ("/a", "b")
//! split_path("/")         == ("/", "")
//! ```

/// Normalize a class prefix or request path
///
/// Strips one trailing `/`, maps the empty path to `/` and prepends `/` when
/// missing.
pub fn normalize_path(path: &str) -> String {
    let path = path.strip_suffix('/').unwrap_or(path);
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Split a request path into its class path and method name
///
/// The method is the segment after the last `/`; everything before it is the
/// class. A single leading `/` belongs to the root class `/`.
pub fn split_path(path: &str) -> (String, String) {
    let path = normalize_path(path);
    match path.rfind('/') {
        None => ("/".to_string(), path),
        Some(0) => ("/".to_string(), path[1..].to_string()),
        Some(i) => (path[..i].to_string(), path[i + 1..].to_string()),
    }
}
