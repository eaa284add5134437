use crate::document::Document;

/// What a list entry renders after its marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListContent {
    /// A single line of text.
    Text(String),
    /// A description line followed by one level of indented sub-items.
    Nested {
        description: Option<String>,
        items: Vec<String>,
    },
}

/// One entry of a bullet or numbered list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub label: Option<String>,
    pub content: ListContent,
}

impl ListEntry {
    /// Plain item: `- text`.
    pub fn item(text: impl Into<String>) -> Self {
        Self {
            label: None,
            content: ListContent::Text(text.into()),
        }
    }

    /// Labeled item: `- label - text`.
    pub fn labeled(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            content: ListContent::Text(text.into()),
        }
    }

    /// Labeled item with an optional description and indented sub-items.
    ///
    /// An empty description is treated as absent.
    pub fn nested<I, S>(label: impl Into<String>, description: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let description = description.into();
        Self {
            label: Some(label.into()),
            content: ListContent::Nested {
                description: (!description.is_empty()).then_some(description),
                items: items.into_iter().map(Into::into).collect(),
            },
        }
    }
}

/// Ordered collection of list entries, rendered in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTree {
    entries: Vec<ListEntry>,
}

impl ListTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(self, text: impl Into<String>) -> Self {
        self.entry(ListEntry::item(text))
    }

    pub fn labeled(self, label: impl Into<String>, text: impl Into<String>) -> Self {
        self.entry(ListEntry::labeled(label, text))
    }

    pub fn nested<I, S>(self, label: impl Into<String>, description: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry(ListEntry::nested(label, description, items))
    }

    pub fn entry(mut self, entry: ListEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ListEntry> {
        self.entries.iter()
    }

    /// Rebuild the tree with `f` applied to every string it holds.
    pub(crate) fn map_text(self, f: impl Fn(&str) -> String) -> Self {
        let entries = self
            .entries
            .into_iter()
            .map(|entry| ListEntry {
                label: entry.label.as_deref().map(&f),
                content: match entry.content {
                    ListContent::Text(text) => ListContent::Text(f(&text)),
                    ListContent::Nested { description, items } => ListContent::Nested {
                        description: description.as_deref().map(&f),
                        items: items.iter().map(|item| f(item)).collect(),
                    },
                },
            })
            .collect();
        Self { entries }
    }
}

impl FromIterator<ListEntry> for ListTree {
    fn from_iter<T: IntoIterator<Item = ListEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<ListEntry>> for ListTree {
    fn from(entries: Vec<ListEntry>) -> Self {
        Self { entries }
    }
}

impl From<Vec<String>> for ListTree {
    fn from(items: Vec<String>) -> Self {
        items.into_iter().map(ListEntry::item).collect()
    }
}

impl From<Vec<&str>> for ListTree {
    fn from(items: Vec<&str>) -> Self {
        items.into_iter().map(ListEntry::item).collect()
    }
}

impl<const N: usize> From<[&str; N]> for ListTree {
    fn from(items: [&str; N]) -> Self {
        items.into_iter().map(ListEntry::item).collect()
    }
}

impl<'a> IntoIterator for &'a ListTree {
    type Item = &'a ListEntry;
    type IntoIter = std::slice::Iter<'a, ListEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Input accepted by [`Document::raw`]
///
/// ```
/// use mdbuilder::{Config, Document};
///
/// let inner = Document::with_config(Config::default().with_newline("\n")).line("first");
/// let outer = Document::with_config(Config::default().with_newline("\n")).raw(&inner);
/// let inner = inner.line("added later");
///
/// assert_eq!(outer.to_string(), "first\n\nadded later");
/// assert_eq!(inner.len(), 2);
/// ```
pub enum RawContent<'a> {
    /// Literal text, written byte for byte.
    Text(String),
    /// Another document, shared rather than copied.
    Document(&'a Document),
}

impl From<&str> for RawContent<'_> {
    fn from(text: &str) -> Self {
        RawContent::Text(text.to_string())
    }
}

impl From<String> for RawContent<'_> {
    fn from(text: String) -> Self {
        RawContent::Text(text)
    }
}

impl<'a> From<&'a Document> for RawContent<'a> {
    fn from(document: &'a Document) -> Self {
        RawContent::Document(document)
    }
}

/// Structural units a document is assembled from
#[derive(Debug)]
pub(crate) enum Fragment {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
        prefix: String,
    },
    List {
        ordered: bool,
        tree: ListTree,
    },
    Quote {
        lines: Vec<String>,
    },
    Code {
        code: String,
        language: String,
    },
    Link {
        url: String,
        name: Option<String>,
    },
    Image {
        url: String,
        title: Option<String>,
        alt: Option<String>,
    },
    Raw(String),
    /// Shared handle; the inner document is rendered when the outer one is.
    Embedded(Document),
    Break,
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}
