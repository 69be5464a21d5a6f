//! Extraction and application of `<code_segment>/<patch>` pairs from an LLM
//! repair reply.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub segment: String,
    pub replacement: String,
}

fn patch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<code_segment>(.*?)</code_segment>\s*<patch>(.*?)</patch>").unwrap()
    })
}

/// Parse every `(segment, patch)` pair out of an LLM reply. Both captures are
/// trimmed. Returns an empty vec (not an error) when the reply has no tags —
/// the caller treats that as a wasted, budget-consuming iteration.
pub fn parse_patches(reply: &str) -> Vec<Patch> {
    patch_re()
        .captures_iter(reply)
        .map(|caps| Patch {
            segment: caps[1].trim().to_string(),
            replacement: caps[2].trim().to_string(),
        })
        .collect()
}

/// Apply each patch by replacing the *first* occurrence only of `segment`
/// with `replacement`, in the order the patches were extracted.
pub fn apply_patches(code: &str, patches: &[Patch]) -> String {
    let mut current = code.to_string();
    for patch in patches {
        current = current.replacen(&patch.segment, &patch.replacement, 1);
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_patch_pair() {
        let reply = "- Fix suggestion 1: typo\n(1)\n<code_segment>\nnConut\n</code_segment>\n<patch>\nnCount\n</patch>\n";
        let patches = parse_patches(reply);
        assert_eq!(patches, vec![Patch { segment: "nConut".into(), replacement: "nCount".into() }]);
    }

    #[test]
    fn parses_multiple_patch_pairs() {
        let reply = "<code_segment>a</code_segment><patch>b</patch>\n(2)\n<code_segment>c</code_segment><patch>d</patch>";
        let patches = parse_patches(reply);
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[1].segment, "c");
    }

    #[test]
    fn no_tags_yields_empty() {
        assert!(parse_patches("I think this looks fine already.").is_empty());
    }

    #[test]
    fn apply_replaces_first_occurrence_only() {
        let code = "nConut := nConut + 1; nConut := nConut + 2;";
        let patches = vec![Patch { segment: "nConut".into(), replacement: "nCount".into() }];
        let patched = apply_patches(code, &patches);
        assert_eq!(patched, "nCount := nConut + 1; nConut := nConut + 2;");
    }

    #[test]
    fn apply_multiple_patches_in_order() {
        let code = "VAR_INPUT\nEND_VAR\nnCount := nConut + 1;";
        let patches = vec![
            Patch { segment: "END_VAR".into(), replacement: "  nLocal : INT;\nEND_VAR".into() },
            Patch { segment: "nConut".into(), replacement: "nLocal".into() },
        ];
        let patched = apply_patches(code, &patches);
        assert!(patched.contains("nLocal : INT;"));
        assert!(patched.contains("nCount := nLocal + 1;"));
    }
}
