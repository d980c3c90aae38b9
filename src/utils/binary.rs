//! Binary content detection.

/// Number of leading bytes inspected, the same window git uses.
pub const BINARY_SNIFF_LEN: usize = 8000;

/// Detect binary content by looking for a NUL byte in the first
/// [`BINARY_SNIFF_LEN`] bytes. Empty content is text.
pub fn is_binary_content(content: &[u8]) -> bool {
    let window = &content[..content.len().min(BINARY_SNIFF_LEN)];
    window.contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_text() {
        assert!(!is_binary_content(b""));
    }

    #[test]
    fn test_null_byte_is_binary() {
        assert!(is_binary_content(b"PK\x03\x04\x00\x00"));
        assert!(!is_binary_content(b"fn main() {}\n"));
    }

    #[test]
    fn test_null_past_window_is_text() {
        let mut content = vec![b'a'; BINARY_SNIFF_LEN];
        content.push(0);
        assert!(!is_binary_content(&content));

        content[BINARY_SNIFF_LEN - 1] = 0;
        assert!(is_binary_content(&content));
    }
}
