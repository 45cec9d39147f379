//! Tree-sitter helpers shared by the semantic indexer and the source renderer.

use crate::error::{IndexerError, Result};
use tree_sitter::{Node, Parser, Tree};

/// Node kinds counted by [`complexity`]
const BRANCH_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "try_statement",
    "except_clause",
    "except_group_clause",
    "with_statement",
];

/// Create a parser configured for Python
pub fn python_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
    parser
        .set_language(&language)
        .map_err(|e| IndexerError::LanguageError(e.to_string()))?;
    Ok(parser)
}

/// Parse Python source, rejecting trees that contain syntax errors
pub fn parse_python(path: &str, source: &str) -> Result<Tree> {
    let mut parser = python_parser()?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| IndexerError::parse(path, "parser returned no tree"))?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(root).unwrap_or(root.start_position().row + 1);
        return Err(IndexerError::parse(path, format!("syntax error near line {line}")));
    }

    Ok(tree)
}

fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(line) = first_error_line(child) {
                return Some(line);
            }
        }
    }
    None
}

pub fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// 1-indexed start line
pub fn start_line(node: Node) -> usize {
    node.start_position().row + 1
}

/// 1-indexed inclusive end line
pub fn end_line(node: Node) -> usize {
    let end = node.end_position();
    // A node ending at column 0 stops at the newline of the previous row.
    if end.column == 0 && end.row > node.start_position().row {
        end.row
    } else {
        end.row + 1
    }
}

/// Best-effort dotted name of an expression.
///
/// `a.b.c` → `a.b.c`, `f()` → `f`, `foo().bar` → `foo.bar`, `List[User]` → `User`.
pub fn dotted_name(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "identifier" => Some(node_text(node, source).to_string()),
        "attribute" => {
            let attr = node.child_by_field_name("attribute")?;
            let attr = node_text(attr, source);
            match node
                .child_by_field_name("object")
                .and_then(|object| dotted_name(object, source))
            {
                Some(parent) => Some(format!("{parent}.{attr}")),
                None => Some(attr.to_string()),
            }
        }
        "call" => dotted_name(node.child_by_field_name("function")?, source),
        "subscript" => dotted_name(node.child_by_field_name("subscript")?, source),
        "type" | "parenthesized_expression" => dotted_name(node.named_child(0)?, source),
        "generic_type" => {
            let mut cursor = node.walk();
            let params = node
                .named_children(&mut cursor)
                .find(|child| child.kind() == "type_parameter")?;
            let mut param_cursor = params.walk();
            let types: Vec<Node> = params.named_children(&mut param_cursor).collect();
            if types.len() == 1 {
                dotted_name(types[0], source)
            } else {
                None
            }
        }
        "member_type" => {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            let (base, attr) = (children.first()?, children.last()?);
            let base = dotted_name(*base, source)?;
            Some(format!("{base}.{}", node_text(*attr, source)))
        }
        _ => None,
    }
}

/// 1 + number of branch, loop and exception constructs inside `node`
pub fn complexity(node: Node) -> usize {
    1 + count_branches(node)
}

fn count_branches(node: Node) -> usize {
    let mut count = 0;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if BRANCH_KINDS.contains(&child.kind()) {
            count += 1;
        }
        count += count_branches(child);
    }
    count
}

/// Docstring of a module, class or function node, cleaned like `inspect.cleandoc`
pub fn docstring(node: Node, source: &str) -> String {
    let body = if node.kind() == "module" {
        Some(node)
    } else {
        node.child_by_field_name("body")
    };

    let Some(body) = body else {
        return String::new();
    };

    let mut cursor = body.walk();
    let Some(first) = body.named_children(&mut cursor).find(|c| c.kind() != "comment") else {
        return String::new();
    };

    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return String::new();
    }

    match first.named_child(0) {
        Some(literal) if literal.kind() == "string" => {
            clean_docstring(&string_literal_value(node_text(literal, source)))
        }
        _ => String::new(),
    }
}

/// Line range `(start, end)` of the docstring statement, if any
pub fn docstring_lines(node: Node) -> Option<(usize, usize)> {
    let body = node.child_by_field_name("body")?;
    let mut cursor = body.walk();
    let first = body.named_children(&mut cursor).find(|c| c.kind() != "comment")?;
    if first.kind() == "expression_statement"
        && first.named_child(0).is_some_and(|c| c.kind() == "string")
    {
        Some((start_line(first), end_line(first)))
    } else {
        None
    }
}

/// Strip prefix letters and quotes from a Python string literal
pub fn string_literal_value(raw: &str) -> String {
    let unprefixed = raw.trim_start_matches(|c: char| "rRbBuUfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = unprefixed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.to_string();
        }
    }
    unprefixed.to_string()
}

/// Normalize docstring indentation the way Python's `inspect.cleandoc` does
pub fn clean_docstring(doc: &str) -> String {
    let expanded: Vec<String> = doc.lines().map(expand_tabs).collect();
    if expanded.is_empty() {
        return String::new();
    }

    let margin = expanded
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut lines: Vec<String> = Vec::with_capacity(expanded.len());
    lines.push(expanded[0].trim_start().to_string());
    for line in expanded.iter().skip(1) {
        if line.len() >= margin {
            lines.push(line[margin..].trim_end().to_string());
        } else {
            lines.push(line.trim().to_string());
        }
    }

    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }

    lines.join("\n")
}

fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for ch in line.chars() {
        if ch == '\t' {
            let pad = 8 - (out.chars().count() % 8);
            out.extend(std::iter::repeat(' ').take(pad));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Module path for a `/`-separated relative file path: `pkg/a.py` → `pkg.a`
pub fn module_name_for(relative_path: &str) -> String {
    let trimmed = relative_path.trim_start_matches("./");
    let without_ext = match trimmed.rfind('.') {
        Some(dot) if !trimmed[dot..].contains('/') => &trimmed[..dot],
        _ => trimmed,
    };
    without_ext.replace(['/', '\\'], ".")
}
