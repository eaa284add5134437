use crate::fragment::ListTree;

/// Backslash-escapes a fixed set of characters in prose content.
///
/// Escaping runs once, when text is appended to a document. Urls, code,
/// language tags and raw text never pass through here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Escaper {
    chars: Vec<char>,
}

impl Escaper {
    pub fn new(chars: impl IntoIterator<Item = char>) -> Self {
        let mut chars: Vec<char> = chars.into_iter().collect();
        chars.sort_unstable();
        chars.dedup();
        Self { chars }
    }

    /// True when no character is configured, so escaping changes nothing.
    pub fn is_noop(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn escape(&self, text: &str) -> String {
        if self.is_noop() {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            if self.chars.binary_search(&ch).is_ok() {
                out.push('\\');
            }
            out.push(ch);
        }
        out
    }

    /// Escape every label, value, description and sub-item of a list tree.
    pub fn escape_list(&self, tree: ListTree) -> ListTree {
        if self.is_noop() {
            return tree;
        }
        tree.map_text(|text| self.escape(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::no_chars("", "a*b_c", "a*b_c")]
    #[case::single("*", "a*b*c", "a\\*b\\*c")]
    #[case::several("*_", "**bold** _it_", "\\*\\*bold\\*\\* \\_it\\_")]
    #[case::backslash_itself("\\*", "\\*", "\\\\\\*")]
    #[case::untouched("#", "plain text", "plain text")]
    #[case::multibyte("é", "café", "caf\\é")]
    fn test_escape(#[case] chars: &str, #[case] input: &str, #[case] expected: &str) {
        let escaper = Escaper::new(chars.chars());
        assert_eq!(escaper.escape(input), expected);
    }

    #[test]
    fn escaping_twice_escapes_twice() {
        let escaper = Escaper::new(['\\', '*']);
        let once = escaper.escape("*");
        assert_eq!(once, "\\*");
        assert_eq!(escaper.escape(&once), "\\\\\\*");
    }

    #[test]
    fn escapes_list_tree() {
        let escaper = Escaper::new(['*']);
        let tree = ListTree::new()
            .item("*a*")
            .labeled("**K**", "v*")
            .nested("*N*", "d*", ["*s"]);

        let expected = ListTree::new()
            .item("\\*a\\*")
            .labeled("\\*\\*K\\*\\*", "v\\*")
            .nested("\\*N\\*", "d\\*", ["\\*s"]);
        assert_eq!(escaper.escape_list(tree), expected);
    }
}
