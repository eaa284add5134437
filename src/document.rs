use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::config::Config;
use crate::escape::Escaper;
use crate::fragment::{Fragment, ListTree, RawContent};
use crate::render;

#[derive(Debug)]
struct Settings {
    config: Config,
    escaper: Escaper,
}

/// An ordered sequence of Markdown fragments plus its rendering config.
///
/// Every append operation consumes the document and hands it back, so calls
/// chain left to right:
///
/// ```
/// use mdbuilder::{Config, Document};
///
/// let doc = Document::with_config(Config::default().with_newline("\n"))
///     .heading("Title")
///     .line("Content")
///     .link("https://example.com", Some("Example"));
///
/// assert_eq!(doc.to_string(), "# Title\n\nContent\n\n[Example](https://example.com)");
/// ```
///
/// Fragments are only ever added through these operations. Empty input is
/// ignored: no fragment is added and the document is returned unchanged.
#[derive(Debug)]
pub struct Document {
    settings: Rc<Settings>,
    fragments: Rc<RefCell<Vec<Fragment>>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document using the default config.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty document with the given config.
    pub fn with_config(config: Config) -> Self {
        let escaper = Escaper::new(config.escape_chars.iter().copied());
        Self {
            settings: Rc::new(Settings { config, escaper }),
            fragments: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn config(&self) -> &Config {
        &self.settings.config
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.borrow().is_empty()
    }

    pub fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    /// Number of fragments appended so far. An embedded document counts once.
    pub fn len(&self) -> usize {
        self.fragments.borrow().len()
    }

    /// Append a level 1 heading.
    pub fn heading(self, text: impl AsRef<str>) -> Self {
        self.heading_level(text, 1)
    }

    /// Append a heading. Levels outside 1..=6 are clamped.
    pub fn heading_level(self, text: impl AsRef<str>, level: u8) -> Self {
        let text = text.as_ref();
        if text.is_empty() {
            return self.omitted("heading");
        }
        let text = self.escape(text);
        self.push(Fragment::Heading {
            level: level.clamp(1, 6),
            text,
        })
    }

    /// Append a paragraph line.
    pub fn line(self, text: impl AsRef<str>) -> Self {
        self.line_with_prefix(text, "")
    }

    /// Same as [`Document::line`].
    pub fn paragraph(self, text: impl AsRef<str>) -> Self {
        self.line(text)
    }

    /// Append a paragraph line preceded by `prefix`, which is not escaped.
    pub fn line_with_prefix(self, text: impl AsRef<str>, prefix: impl Into<String>) -> Self {
        let text = text.as_ref();
        if text.is_empty() {
            return self.omitted("line");
        }
        let text = self.escape(text);
        self.push(Fragment::Paragraph {
            text,
            prefix: prefix.into(),
        })
    }

    /// Append a numbered list (`1.`, `2.`, ...).
    pub fn numeric_list(self, tree: impl Into<ListTree>) -> Self {
        self.list_fragment(tree.into(), true)
    }

    /// Append a bullet list (`-`).
    pub fn list(self, tree: impl Into<ListTree>) -> Self {
        self.list_fragment(tree.into(), false)
    }

    fn list_fragment(self, tree: ListTree, ordered: bool) -> Self {
        if tree.is_empty() {
            return self.omitted(if ordered { "numeric_list" } else { "list" });
        }
        let tree = self.settings.escaper.escape_list(tree);
        self.push(Fragment::List { ordered, tree })
    }

    /// Append a single-line quote.
    pub fn quote(self, text: impl AsRef<str>) -> Self {
        self.quote_lines([text])
    }

    /// Append a quote with one `> ` line per item.
    ///
    /// Omitted when there is no non-empty line.
    pub fn quote_lines<I, S>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<String> = lines
            .into_iter()
            .map(|line| self.escape(line.as_ref()))
            .collect();
        if lines.iter().all(String::is_empty) {
            return self.omitted("quote");
        }
        self.push(Fragment::Quote { lines })
    }

    /// Append a fenced code block. An empty `language` writes a bare fence.
    pub fn block(self, code: impl Into<String>, language: impl Into<String>) -> Self {
        let code = code.into();
        if code.is_empty() {
            return self.omitted("block");
        }
        self.push(Fragment::Code {
            code,
            language: language.into(),
        })
    }

    /// Append a link. Without a name the url is shown as the link text.
    pub fn link(self, url: impl Into<String>, name: Option<&str>) -> Self {
        let url = url.into();
        if url.is_empty() {
            return self.omitted("link");
        }
        let name = name.filter(|n| !n.is_empty()).map(str::to_string);
        self.push(Fragment::Link { url, name })
    }

    /// Append an image. Empty title or alt text is treated as absent.
    pub fn image(self, url: impl Into<String>, title: Option<&str>, alt: Option<&str>) -> Self {
        let url = url.into();
        if url.is_empty() {
            return self.omitted("image");
        }
        let title = title.filter(|t| !t.is_empty()).map(|t| self.escape(t));
        let alt = alt.filter(|a| !a.is_empty()).map(|a| self.escape(a));
        self.push(Fragment::Image { url, title, alt })
    }

    /// Append raw text or embed another document.
    ///
    /// Text is always appended and never escaped. An embedded document is
    /// shared, not copied: fragments added to it later still show up when
    /// this document is rendered. Empty documents, and documents that already
    /// contain this one, are not embedded.
    pub fn raw<'a>(self, content: impl Into<RawContent<'a>>) -> Self {
        match content.into() {
            RawContent::Text(text) => self.push(Fragment::Raw(text)),
            RawContent::Document(document) => {
                if document.is_empty() {
                    return self.omitted("raw");
                }
                if document.contains(&self.fragments) {
                    tracing::warn!("refusing to embed a document that contains its host");
                    return self;
                }
                let shared = document.share();
                self.push(Fragment::Embedded(shared))
            }
        }
    }

    /// Append a forced gap: a single newline, even in suppressed mode.
    pub fn force_break(self) -> Self {
        self.push(Fragment::Break)
    }

    /// Append a pipe table. Omitted when there are no headers or no rows.
    ///
    /// Row lengths are not checked against the header; cells are written as
    /// given and never escaped.
    pub fn table<H, R, C>(self, headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        if headers.is_empty() || rows.is_empty() {
            return self.omitted("table");
        }
        self.push(Fragment::Table { headers, rows })
    }

    /// Continue in a new suppressed document seeded with this one.
    ///
    /// Content so far keeps its normal spacing; fragments appended afterwards
    /// are separated by a single newline.
    pub fn start_suppressing(self) -> Self {
        self.rescoped(true)
    }

    /// Continue in a new normally spaced document seeded with this one.
    pub fn end_suppressing(self) -> Self {
        self.rescoped(false)
    }

    /// Run `f` in a suppressed scope and return to normal spacing afterwards.
    pub fn suppress(self, f: impl FnOnce(Self) -> Self) -> Self {
        f(self.start_suppressing()).end_suppressing()
    }

    fn rescoped(self, suppressed: bool) -> Self {
        let config = self.settings.config.clone().with_suppressed(suppressed);
        Self::with_config(config).raw(&self)
    }

    /// Apply `f` when `condition` holds.
    pub fn when(self, condition: bool, f: impl FnOnce(Self) -> Self) -> Self {
        if condition { f(self) } else { self }
    }

    /// Apply `f` with the value when there is one.
    pub fn when_some<T>(self, value: Option<T>, f: impl FnOnce(Self, T) -> Self) -> Self {
        match value {
            Some(value) => f(self, value),
            None => self,
        }
    }

    /// Resolve a condition against the current document, then apply `f` with
    /// its value when there is one.
    pub fn when_with<T>(
        self,
        condition: impl FnOnce(&Self) -> Option<T>,
        f: impl FnOnce(Self, T) -> Self,
    ) -> Self {
        let value = condition(&self);
        self.when_some(value, f)
    }

    /// Render the document to Markdown. Rendering does not change the document.
    pub fn render(&self) -> String {
        render::fragments_to_markdown(&self.fragments.borrow(), &self.settings.config)
    }

    fn escape(&self, text: &str) -> String {
        self.settings.escaper.escape(text)
    }

    fn push(self, fragment: Fragment) -> Self {
        self.fragments.borrow_mut().push(fragment);
        self
    }

    fn omitted(self, operation: &'static str) -> Self {
        tracing::debug!(operation, "empty input, fragment omitted");
        self
    }

    /// A second handle onto the same fragments and settings.
    pub(crate) fn share(&self) -> Self {
        Self {
            settings: Rc::clone(&self.settings),
            fragments: Rc::clone(&self.fragments),
        }
    }

    pub(crate) fn fragments(&self) -> Ref<'_, Vec<Fragment>> {
        self.fragments.borrow()
    }

    /// Whether `target` is this document or is embedded anywhere inside it.
    fn contains(&self, target: &Rc<RefCell<Vec<Fragment>>>) -> bool {
        // A single handle means nothing else can have embedded the target
        if Rc::strong_count(target) == 1 && !Rc::ptr_eq(&self.fragments, target) {
            return false;
        }

        let mut visited = HashSet::new();
        let mut pending = vec![Rc::clone(&self.fragments)];
        while let Some(fragments) = pending.pop() {
            if Rc::ptr_eq(&fragments, target) {
                return true;
            }
            if !visited.insert(Rc::as_ptr(&fragments)) {
                continue;
            }
            pending.extend(fragments.borrow().iter().filter_map(|fragment| match fragment {
                Fragment::Embedded(inner) => Some(Rc::clone(&inner.fragments)),
                _ => None,
            }));
        }
        false
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        if Rc::strong_count(&self.fragments) != 1 {
            return;
        }
        // Unlink nested documents one at a time so deep chains do not recurse
        let mut pending = std::mem::take(&mut *self.fragments.borrow_mut());
        while let Some(fragment) = pending.pop() {
            if let Fragment::Embedded(inner) = &fragment {
                if Rc::strong_count(&inner.fragments) == 1 {
                    pending.append(&mut inner.fragments.borrow_mut());
                }
            }
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&Document> for String {
    fn from(document: &Document) -> Self {
        document.render()
    }
}

impl From<Document> for String {
    fn from(document: Document) -> Self {
        document.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::ListEntry;
    use rstest::rstest;

    fn doc() -> Document {
        Document::with_config(Config::default().with_newline("\n"))
    }

    fn escaping(chars: &str) -> Document {
        Document::with_config(
            Config::default()
                .with_newline("\n")
                .with_escape_chars(chars.chars()),
        )
    }

    #[test]
    fn new_document_is_empty() {
        let doc = doc();
        assert!(doc.is_empty());
        assert!(!doc.is_not_empty());
        assert_eq!(doc.len(), 0);
        assert_eq!(doc.to_string(), "");
    }

    #[test]
    fn empty_input_is_omitted() {
        let doc = doc()
            .heading("")
            .heading_level("", 2)
            .line("")
            .line_with_prefix("", "> ")
            .paragraph("")
            .numeric_list(ListTree::new())
            .list(Vec::<&str>::new())
            .quote("")
            .quote_lines(Vec::<String>::new())
            .quote_lines(["", ""])
            .block("", "rust")
            .link("", Some("name"))
            .image("", Some("title"), Some("alt"))
            .raw(&Document::new())
            .table(["A"], Vec::<Vec<&str>>::new())
            .table(Vec::<&str>::new(), [["1"]]);

        assert!(doc.is_empty());
        assert_eq!(doc.to_string(), "");
    }

    #[test]
    fn raw_text_is_always_appended() {
        let doc = doc().raw("");
        assert!(doc.is_not_empty());
        assert_eq!(doc.len(), 1);
    }

    #[rstest]
    #[case(1, "# T")]
    #[case(2, "## T")]
    #[case(3, "### T")]
    #[case(6, "###### T")]
    #[case(0, "# T")]
    #[case(9, "###### T")]
    fn test_heading_level(#[case] level: u8, #[case] expected: &str) {
        assert_eq!(doc().heading_level("T", level).to_string(), expected);
    }

    #[test]
    fn heading_defaults_to_level_one() {
        assert_eq!(doc().heading("T").to_string(), "# T");
    }

    #[test]
    fn lines() {
        assert_eq!(doc().line("T").to_string(), "T");
        assert_eq!(doc().line_with_prefix("T", "> ").to_string(), "> T");
        assert_eq!(doc().paragraph("T").to_string(), "T");
    }

    #[test]
    fn numeric_list() {
        assert_eq!(
            doc().numeric_list(["A", "B", "C"]).to_string(),
            "1. A\n2. B\n3. C"
        );
    }

    #[test]
    fn bullet_list_with_sub_items() {
        let tree = ListTree::new().nested("**X**", "Desc", ["S1", "S2"]);
        assert_eq!(
            doc().list(tree).to_string(),
            "- **X** - Desc\n   - S1\n   - S2"
        );
    }

    #[test]
    fn list_from_entries() {
        let entries = vec![ListEntry::item("a"), ListEntry::labeled("k", "v")];
        assert_eq!(doc().list(entries).to_string(), "- a\n- k - v");
    }

    #[test]
    fn quotes() {
        assert_eq!(doc().quote_lines(["L1", "L2"]).to_string(), "> L1\n> L2");
        assert_eq!(doc().quote("single").to_string(), "> single");
        assert_eq!(doc().quote_lines(["", "x"]).to_string(), "> \n> x");
    }

    #[test]
    fn code_block() {
        assert_eq!(
            doc().block("CODE", "lang").to_string(),
            "```lang\nCODE\n```"
        );
        assert_eq!(doc().block("CODE", "").to_string(), "```\nCODE\n```");
    }

    #[test]
    fn links() {
        assert_eq!(
            doc().link("https://x.com", None).to_string(),
            "[https://x.com](https://x.com)"
        );
        assert_eq!(
            doc().link("https://x.com", Some("Name")).to_string(),
            "[Name](https://x.com)"
        );
        assert_eq!(
            doc().link("https://x.com", Some("")).to_string(),
            "[https://x.com](https://x.com)"
        );
    }

    #[test]
    fn images() {
        assert_eq!(doc().image("url", None, None).to_string(), "![](url)");
        assert_eq!(
            doc().image("url", Some("Title"), Some("Alt")).to_string(),
            "![Title](url \"Alt\")"
        );
        assert_eq!(
            doc().image("url", Some(""), Some("")).to_string(),
            "![](url)"
        );
        assert_eq!(
            doc().image("url", None, Some("Alt")).to_string(),
            "![](url \"Alt\")"
        );
    }

    #[test]
    fn table() {
        let doc = doc().table(["A", "B"], [["1", "2"], ["3", "4"]]);
        assert_eq!(
            doc.to_string(),
            "| A | B |\n| --- | --- |\n| 1 | 2 |\n| 3 | 4 |"
        );
    }

    #[test]
    fn scenario_title_content_link() {
        let doc = doc()
            .heading("Title")
            .line("Content")
            .link("https://example.com", Some("Example"));
        assert_eq!(
            doc.to_string(),
            "# Title\n\nContent\n\n[Example](https://example.com)"
        );
    }

    #[test]
    fn rendering_is_repeatable() {
        let doc = doc().heading("T").list(["a", "b"]).line("x");
        let first = doc.to_string();
        assert_eq!(doc.to_string(), first);
        assert_eq!(doc.render(), first);
        assert_eq!(String::from(&doc), first);
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn suppressed_config() {
        let doc = Document::with_config(Config::default().with_newline("\n").with_suppressed(true))
            .heading("T")
            .line("a")
            .force_break()
            .line("b");
        assert_eq!(doc.to_string(), "# T\na\n\nb");
    }

    #[test]
    fn suppression_scoping() {
        let doc = doc()
            .heading("T")
            .line("intro")
            .start_suppressing()
            .line("a")
            .line("b")
            .end_suppressing()
            .line("after");
        assert!(!doc.config().suppressed);
        assert_eq!(doc.to_string(), "# T\n\nintro\na\nb\n\nafter");
    }

    #[test]
    fn suppress_closure() {
        let doc = doc()
            .line("intro")
            .suppress(|d| d.line("a").line("b").force_break().line("c"))
            .line("after");
        assert_eq!(doc.to_string(), "intro\na\nb\n\nc\n\nafter");
    }

    #[test]
    fn suppressing_an_empty_document() {
        let doc = doc().start_suppressing().line("a").line("b");
        assert!(doc.config().suppressed);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.to_string(), "a\nb");
    }

    #[test]
    fn scoped_documents_keep_config() {
        let doc = escaping("*").line("*a*").start_suppressing().line("*b*");
        assert_eq!(doc.config().escape_chars, vec!['*']);
        assert_eq!(doc.to_string(), "\\*a\\*\n\\*b\\*");
    }

    #[test]
    fn escapes_prose_only() {
        let tree = ListTree::new().labeled("*k*", "*v*");
        let doc = escaping("*_")
            .heading("*H*")
            .line_with_prefix("_p_", "*")
            .list(tree)
            .quote("*q*")
            .image("*url*", Some("*t*"), Some("_a_"))
            .link("https://x.com/_a_", Some("*n*"))
            .block("*code*", "c_")
            .raw("*raw*");

        assert_eq!(
            doc.to_string(),
            [
                "# \\*H\\*",
                "*\\_p\\_",
                "- \\*k\\* - \\*v\\*",
                "> \\*q\\*",
                "![\\*t\\*](*url* \"\\_a\\_\")",
                "[*n*](https://x.com/_a_)",
                "```c_\n*code*\n```",
                "*raw*",
            ]
            .join("\n\n")
        );
    }

    #[test]
    fn table_cells_are_not_escaped() {
        let doc = escaping("*").table(["*A*"], [["*1*"]]);
        assert_eq!(doc.to_string(), "| *A* |\n| --- |\n| *1* |");
    }

    #[test]
    fn embedded_document_is_shared() {
        let inner = doc().line("first");
        let outer = doc().heading("T").raw(&inner).line("end");

        let inner = inner.line("second");
        assert_eq!(outer.to_string(), "# T\n\nfirst\n\nsecond\n\nend");
        assert_eq!(inner.to_string(), "first\n\nsecond");
    }

    #[test]
    fn embedded_document_keeps_its_own_spacing() {
        let inner = Document::with_config(Config::default().with_newline("\n").with_suppressed(true))
            .line("a")
            .line("b");
        let outer = doc().raw(&inner).line("c");
        assert_eq!(outer.to_string(), "a\nb\n\nc");
    }

    #[test]
    fn refuses_cyclic_embedding() {
        let a = doc().line("a");
        let b = doc().line("b").raw(&a);
        let a = a.raw(&b);

        assert_eq!(a.len(), 1);
        assert_eq!(b.to_string(), "b\n\na");
    }

    #[test]
    fn same_document_embedded_twice() {
        let inner = doc().line("x");
        let outer = doc().raw(&inner).raw(&inner).line("y");
        assert_eq!(outer.to_string(), "x\n\nx\n\ny");
    }

    #[test]
    fn deep_suppression_chain() {
        let mut doc = doc();
        for i in 0..10_000 {
            doc = doc
                .line(format!("p{i}"))
                .suppress(|d| d.line("a").line("b"));
        }

        let expected = (0..10_000)
            .map(|i| format!("p{i}\na\nb"))
            .collect::<Vec<_>>()
            .join("\n\n");
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.render(), expected);
    }

    #[test]
    fn refuses_self_embedding() {
        let a = doc().line("a");
        let alias = a.share();
        let a = a.raw(&alias);
        assert_eq!(a.len(), 1);
        assert_eq!(a.to_string(), "a");
    }

    #[test]
    fn conditionals() {
        let doc = doc()
            .when(true, |d| d.line("yes"))
            .when(false, |d| d.line("no"))
            .when_some(Some("val"), |d, v| d.line(v))
            .when_some(None::<&str>, |d, v| d.line(v))
            .when_with(|d| d.is_not_empty().then_some(d.len()), |d, n| d.line(n.to_string()))
            .when_with(|d| d.is_empty().then_some(()), |d, _| d.line("never"));
        assert_eq!(doc.to_string(), "yes\n\nval\n\n2");
    }

    #[test]
    fn default_config_document() {
        let doc = Document::default().heading("T");
        assert_eq!(doc.config(), &Config::default());
        assert_eq!(doc.to_string(), "# T");
    }
}
