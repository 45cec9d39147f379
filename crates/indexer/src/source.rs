//! Reading definition bodies back from disk and rendering reduced views of them.

use crate::error::{IndexerError, Result};
use crate::syntax::{docstring_lines, end_line, parse_python, start_line};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tree_sitter::Node;

const SKELETON_MARKER: &str = "  ... (logic inside function) ...";

/// Most lines [`SourceReader::read_file`] returns in one request
pub const MAX_READ_LINES: usize = 2000;

/// Reads line ranges of project files, confined to the project root
#[derive(Debug, Clone)]
pub struct SourceReader {
    root: PathBuf,
}

impl SourceReader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a project-relative path onto the root, rejecting anything that escapes it
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let cleaned = relative.replace('\\', "/");
        let cleaned = cleaned.trim_start_matches("./");
        let mut path = self.root.clone();
        for component in Path::new(cleaned).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(IndexerError::InvalidPath(format!(
                        "{relative} is outside the project root"
                    )))
                }
            }
        }
        Ok(path)
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.resolve(relative)?;
        let bytes = std::fs::read(&path).map_err(|e| {
            IndexerError::InvalidPath(format!("cannot read {relative}: {e}"))
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Lines `start..=end` (1-indexed, clamped to the file)
    pub fn read_span(&self, relative: &str, start: usize, end: usize) -> Result<String> {
        let content = self.read(relative)?;
        let (_, lines) = span_lines(&content, start, end);
        Ok(lines.join("\n"))
    }

    /// Numbered lines `start..=end` of a whole file, `end` defaulting to the last line.
    ///
    /// The range is clamped to the file. A range that is empty after clamping, or longer
    /// than [`MAX_READ_LINES`], is an [`IndexerError::InvalidRange`].
    pub fn read_file(&self, relative: &str, start: usize, end: Option<usize>) -> Result<String> {
        let content = self.read(relative)?;
        let total = content.lines().count();
        let first = start.max(1);
        let last = end.unwrap_or(total).min(total);

        if first > last {
            return Err(IndexerError::InvalidRange(format!(
                "start line {first} is after end line {last} in {relative}"
            )));
        }
        if last - first > MAX_READ_LINES {
            return Err(IndexerError::InvalidRange(format!(
                "{relative} has {total} lines and at most {MAX_READ_LINES} can be read at once; \
                 request the span of a single definition (see `codemap node`)"
            )));
        }

        let (first, lines) = span_lines(&content, first, last);
        Ok(number_lines(&lines, first))
    }

    /// Lines `start..=end` rendered as `{line:4} | {text}`
    pub fn read_numbered(&self, relative: &str, start: usize, end: usize) -> Result<String> {
        let content = self.read(relative)?;
        let (first, lines) = span_lines(&content, start, end);
        Ok(number_lines(&lines, first))
    }
}

fn span_lines(content: &str, start: usize, end: usize) -> (usize, Vec<&str>) {
    let lines: Vec<&str> = content.lines().collect();
    let first = start.max(1);
    let last = end.min(lines.len());
    if first > last {
        return (first, Vec::new());
    }
    (first, lines[first - 1..last].to_vec())
}

pub fn number_lines(lines: &[&str], first_line: usize) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:4} | {}", first_line + i, line.trim_end()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Module text with every function and class body replaced by a marker line.
///
/// Source that fails to parse is returned unchanged.
pub fn skeleton(source: &str) -> String {
    let Ok(tree) = parse_python("<skeleton>", source) else {
        return source.to_string();
    };

    let mut excluded = BTreeSet::new();
    collect_bodies(tree.root_node(), &mut excluded);

    let mut out = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let number = index + 1;
        if !excluded.contains(&number) {
            out.push(line);
        } else if !excluded.contains(&(number - 1)) {
            out.push(SKELETON_MARKER);
        }
    }
    out.join("\n")
}

fn collect_bodies(node: Node, excluded: &mut BTreeSet<usize>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if matches!(child.kind(), "function_definition" | "class_definition") {
            if let Some(body) = child.child_by_field_name("body") {
                excluded.extend(start_line(body)..=end_line(child));
            }
        }
        collect_bodies(child, excluded);
    }
}

/// Reduced rendering of a long definition body.
///
/// Keeps the signature and docstring of the definition and of every documented
/// definition nested in it; each elided run becomes one `...` line. When nothing is
/// documented, or the code does not parse, keeps the first `head_lines` lines and a
/// truncation note.
pub fn stub(code: &str, head_lines: usize) -> String {
    let lines: Vec<&str> = code.lines().collect();

    if let Some(kept) = documented_outline(code) {
        return render_kept(&lines, &kept);
    }

    let kept = head_lines.min(lines.len());
    let mut out: Vec<String> = lines[..kept].iter().map(|l| l.to_string()).collect();
    if lines.len() > kept {
        out.push(format!("    ... ({} more lines truncated)", lines.len() - kept));
    }
    out.join("\n")
}

/// Line numbers of every documented header and docstring, `None` if there are none
fn documented_outline(code: &str) -> Option<BTreeSet<usize>> {
    // Methods are read back with their class indentation still in place.
    let margin = code
        .lines()
        .find(|l| !l.trim().is_empty())
        .map(indent_width)
        .unwrap_or(0);
    let dedented = code
        .lines()
        .map(|l| &l[indent_width(l).min(margin)..])
        .collect::<Vec<_>>()
        .join("\n");

    let tree = parse_python("<stub>", &dedented).ok()?;
    let top = first_definition(tree.root_node())?;

    let mut kept = BTreeSet::new();
    let mut documented = false;
    if let Some((start, end)) = docstring_lines(top) {
        kept.extend(start..=end);
        documented = true;
    }
    if let Some(body) = top.child_by_field_name("body") {
        documented |= keep_documented(body, &mut kept);
    }
    if !documented {
        return None;
    }
    keep_header(top, &mut kept);
    Some(kept)
}

fn first_definition(root: Node) -> Option<Node> {
    let mut cursor = root.walk();
    let first = root
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment")?;
    match first.kind() {
        "function_definition" | "class_definition" => Some(first),
        "decorated_definition" => first.child_by_field_name("definition"),
        _ => None,
    }
}

fn keep_documented(node: Node, kept: &mut BTreeSet<usize>) -> bool {
    let mut found = false;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if matches!(child.kind(), "function_definition" | "class_definition") {
            if let Some((start, end)) = docstring_lines(child) {
                keep_header(child, kept);
                kept.extend(start..=end);
                found = true;
            }
        }
        found |= keep_documented(child, kept);
    }
    found
}

/// Decorators through the line before the body
fn keep_header(definition: Node, kept: &mut BTreeSet<usize>) {
    let outer = definition
        .parent()
        .filter(|p| p.kind() == "decorated_definition")
        .unwrap_or(definition);
    let first = start_line(definition);
    let last = match definition.child_by_field_name("body").map(start_line) {
        Some(body) if body > first => body - 1,
        _ => first,
    };
    kept.extend(start_line(outer)..=last);
}

fn render_kept(lines: &[&str], kept: &BTreeSet<usize>) -> String {
    let mut out = Vec::new();
    let mut eliding = false;
    for (index, line) in lines.iter().enumerate() {
        if kept.contains(&(index + 1)) {
            out.push(line.to_string());
            eliding = false;
        } else if !eliding && !line.trim().is_empty() {
            out.push(format!("{}...", &line[..indent_width(line)]));
            eliding = true;
        }
    }
    out.join("\n")
}

fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}
