use super::INDENT_STEP;
use super::tree::{Entry, Tree};

/// Renders a tree in the indented text format read by [`super::parse`]
pub fn serialize(tree: &Tree) -> String {
    let mut out = String::new();
    for (id, depth) in tree.pre_order(tree.root()) {
        if let Some(entry) = tree.entry(id) {
            write_entry(&mut out, entry, depth);
        }
    }
    out
}

fn write_entry(out: &mut String, entry: &Entry, depth: usize) {
    push_indent(out, depth);
    match entry {
        Entry::Folder { name } => {
            out.push_str(name);
            out.push('/');
            out.push('\n');
        }
        Entry::File { name, content } => {
            out.push_str(name);
            out.push('\n');
            for line in content {
                push_indent(out, depth + 1);
                if needs_quotes(line) {
                    out.push('"');
                    out.push_str(line);
                    out.push('"');
                } else {
                    out.push_str(line);
                }
                out.push('\n');
            }
        }
    }
}

fn push_indent(out: &mut String, depth: usize) {
    out.extend(std::iter::repeat_n(' ', depth * INDENT_STEP));
}

/// Content lines the parser would otherwise misread get wrapped in quotes
pub fn needs_quotes(line: &str) -> bool {
    line.is_empty() || line.contains(' ') || line.starts_with('"') || line.ends_with('"')
}
