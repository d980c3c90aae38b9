//! Path normalization

/// Convert backslashes to forward slashes so scope keys are platform independent.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Last `/`-separated component of a normalized path.
pub fn last_component(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("src\\scan\\mod.rs"), "src/scan/mod.rs");
        assert_eq!(normalize_path("src/lib.rs"), "src/lib.rs");
    }

    #[test]
    fn test_last_component() {
        assert_eq!(last_component("a/b/c.go"), "c.go");
        assert_eq!(last_component("c.go"), "c.go");
        assert_eq!(last_component("a/"), "");
    }
}
