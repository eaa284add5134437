use crate::config::Config;
use crate::document::Document;
use crate::fragment::{Fragment, ListContent, ListTree};

/// Characters stripped from the very end of a rendered document
const TRAILING: [char; 4] = ['\n', '\r', '\t', ' '];

/// Convert fragments to Markdown text
pub(crate) fn fragments_to_markdown(fragments: &[Fragment], config: &Config) -> String {
    tracing::trace!(
        fragments = fragments.len(),
        suppressed = config.suppressed,
        "rendering document"
    );

    let mut out = String::new();
    for fragment in fragments {
        match fragment {
            Fragment::Embedded(inner) => {
                embedded_to_markdown(inner, &mut out);
                end_fragment(config, &mut out);
            }
            _ => emit_fragment(fragment, config, &mut out),
        }
    }

    trim_from(&mut out, 0);
    out
}

/// A document being rendered in place, and where its output starts.
struct Frame {
    document: Document,
    next: usize,
    start: usize,
}

enum Step {
    Emitted,
    Descend(Document),
    Finished,
}

/// Render an embedded document, and everything embedded inside it, into `out`.
///
/// Suppression scoping nests one document per scope, so chains can be very
/// deep. Frames live on an explicit stack instead of the call stack.
fn embedded_to_markdown(root: &Document, out: &mut String) {
    let mut stack = vec![Frame {
        document: root.share(),
        next: 0,
        start: out.len(),
    }];

    while let Some(frame) = stack.last_mut() {
        let step = match frame.document.fragments().get(frame.next) {
            None => Step::Finished,
            Some(Fragment::Embedded(inner)) => Step::Descend(inner.share()),
            Some(fragment) => {
                emit_fragment(fragment, frame.document.config(), out);
                Step::Emitted
            }
        };

        match step {
            Step::Emitted => frame.next += 1,
            Step::Descend(inner) => {
                frame.next += 1;
                stack.push(Frame {
                    document: inner,
                    next: 0,
                    start: out.len(),
                });
            }
            Step::Finished => {
                let start = frame.start;
                stack.pop();
                trim_from(out, start);
                if let Some(parent) = stack.last() {
                    end_fragment(parent.document.config(), out);
                }
            }
        }
    }
}

/// Strip trailing whitespace, but never before `start`.
fn trim_from(out: &mut String, start: usize) {
    let len = start + out[start..].trim_end_matches(TRAILING).len();
    out.truncate(len);
}

fn end_fragment(config: &Config, out: &mut String) {
    out.push_str(&config.newline);
    out.push_str(config.line_end());
}

fn emit_fragment(fragment: &Fragment, config: &Config, out: &mut String) {
    let newline = config.newline.as_str();

    match fragment {
        Fragment::Heading { level, text } => {
            for _ in 0..*level {
                out.push('#');
            }
            out.push(' ');
            out.push_str(text);
        }
        Fragment::Paragraph { text, prefix } => {
            out.push_str(prefix);
            out.push_str(text);
        }
        Fragment::List { ordered, tree } => {
            // Every entry already ends with a newline
            list_to_markdown(tree, *ordered, config, out);
            out.push_str(config.line_end());
            return;
        }
        Fragment::Quote { lines } => {
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    out.push_str(newline);
                }
                out.push_str("> ");
                out.push_str(line);
            }
        }
        Fragment::Code { code, language } => {
            out.push_str("```");
            out.push_str(language);
            out.push_str(newline);
            out.push_str(code);
            if !code.ends_with(newline) {
                out.push_str(newline);
            }
            out.push_str("```");
        }
        Fragment::Link { url, name } => {
            out.push('[');
            out.push_str(name.as_deref().unwrap_or(url));
            out.push_str("](");
            out.push_str(url);
            out.push(')');
        }
        Fragment::Image { url, title, alt } => {
            out.push_str("![");
            out.push_str(title.as_deref().unwrap_or_default());
            out.push_str("](");
            out.push_str(url);
            if let Some(alt) = alt {
                out.push_str(" \"");
                out.push_str(alt);
                out.push('"');
            }
            out.push(')');
        }
        Fragment::Raw(text) => {
            out.push_str(text);
        }
        Fragment::Embedded(_) => {
            // Rendered in place by the callers, which track nesting
            return;
        }
        Fragment::Break => {
            out.push_str(newline);
            return;
        }
        Fragment::Table { headers, rows } => {
            table_to_markdown(headers, rows, newline, out);
        }
    }

    end_fragment(config, out);
}

fn list_to_markdown(tree: &ListTree, ordered: bool, config: &Config, out: &mut String) {
    let newline = config.newline.as_str();

    for (i, entry) in tree.iter().enumerate() {
        if ordered {
            out.push_str(&format!("{}.", i + 1));
        } else {
            out.push('-');
        }

        match &entry.content {
            ListContent::Nested { description, items } => {
                if let Some(label) = &entry.label {
                    out.push(' ');
                    out.push_str(label);
                }
                if let Some(description) = description.as_deref().filter(|d| !d.is_empty()) {
                    out.push_str(" - ");
                    out.push_str(description);
                }
                out.push_str(newline);

                for item in items {
                    out.push_str(&config.indent);
                    out.push_str("- ");
                    out.push_str(item);
                    out.push_str(newline);
                }
            }
            ListContent::Text(text) => {
                out.push(' ');
                if let Some(label) = &entry.label {
                    out.push_str(label);
                    out.push_str(" - ");
                }
                out.push_str(text);
                out.push_str(newline);
            }
        }
    }
}

fn table_to_markdown(headers: &[String], rows: &[Vec<String>], newline: &str, out: &mut String) {
    table_row(headers.iter().map(String::as_str), out);

    out.push_str(newline);
    table_row(headers.iter().map(|_| "---"), out);

    for row in rows {
        out.push_str(newline);
        table_row(row.iter().map(String::as_str), out);
    }
}

fn table_row<'a>(cells: impl Iterator<Item = &'a str>, out: &mut String) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(cell);
        out.push_str(" |");
    }
}
