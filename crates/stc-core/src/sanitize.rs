//! Filename and doc-id sanitization shared by the corpus builder and the
//! post-processor (they must agree on what counts as an unsafe character).

const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '\n', '\r', '\t'];

/// Replace every character in [`UNSAFE_CHARS`] with `_`.
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_all_unsafe_chars() {
        let out = sanitize("FB<Name>:weird/path\\a|b?c*d\ne\rf\tg");
        assert!(!out.chars().any(|c| UNSAFE_CHARS.contains(&c)));
    }

    #[test]
    fn leaves_safe_chars_alone() {
        assert_eq!(sanitize("FB_Counter-v2.st"), "FB_Counter-v2.st");
    }
}
