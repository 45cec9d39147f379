//! Text handed to the keyword scorer and to the embedding service, one per graph node.

use codemap_graph::{CodeGraph, DependencyMap, GraphNode, NodeKind};
use codemap_indexer::{skeleton, SourceReader};
use serde::{Deserialize, Serialize};

/// Bodies longer than this are split into numbered parts
pub const MAX_VECTOR_BODY_CHARS: usize = 3000;

/// Callees listed in a vector document header
const HEADER_USES: usize = 5;

/// One text to embed; a node yields several when its body is split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDocument {
    pub node_id: String,
    pub file: String,
    /// 1-based
    pub part: usize,
    pub total_parts: usize,
    pub text: String,
}

/// Builds keyword and vector documents from the graph and the project sources
pub struct CorpusBuilder<'a> {
    graph: &'a CodeGraph,
    reader: &'a SourceReader,
    deps: &'a DependencyMap,
}

impl<'a> CorpusBuilder<'a> {
    pub fn new(graph: &'a CodeGraph, reader: &'a SourceReader, deps: &'a DependencyMap) -> Self {
        Self {
            graph,
            reader,
            deps,
        }
    }

    /// `(node_id, text)` for every module, class and function node
    pub fn keyword_documents(&self) -> Vec<(String, String)> {
        self.indexable()
            .map(|(node, file)| {
                let body = self.body(node, file).unwrap_or_default();
                (node.id.clone(), keyword_text(node, file, &body))
            })
            .collect()
    }

    pub fn vector_documents(&self) -> Vec<VectorDocument> {
        let mut documents = Vec::new();
        for (node, file) in self.indexable() {
            let Some(body) = self.body(node, file) else {
                continue;
            };
            if body.trim().is_empty() {
                continue;
            }

            let header = self.header(node, file);
            if body.chars().count() <= MAX_VECTOR_BODY_CHARS {
                documents.push(VectorDocument {
                    node_id: node.id.clone(),
                    file: file.to_string(),
                    part: 1,
                    total_parts: 1,
                    text: format!("{header}\n--- FULL BODY ---\n{body}"),
                });
                continue;
            }

            let parts = split_on_lines(&body, MAX_VECTOR_BODY_CHARS);
            let total_parts = parts.len();
            for (i, part) in parts.into_iter().enumerate() {
                documents.push(VectorDocument {
                    node_id: node.id.clone(),
                    file: file.to_string(),
                    part: i + 1,
                    total_parts,
                    text: format!("{header}\n--- PART {} ---\n{part}", i + 1),
                });
            }
        }
        documents
    }

    fn indexable(&self) -> impl Iterator<Item = (&'a GraphNode, &'a str)> {
        self.graph.nodes().filter_map(|(_, node)| {
            let file = node.file.as_deref()?;
            (!node.is_external()).then_some((node, file))
        })
    }

    /// Node source; modules are reduced to their skeleton
    fn body(&self, node: &GraphNode, file: &str) -> Option<String> {
        match self.reader.read_span(file, node.start_line, node.end_line) {
            Ok(code) if node.kind == NodeKind::Module => Some(skeleton(&code)),
            Ok(code) => Some(code),
            Err(e) => {
                log::warn!("Skipping body of {}: {e}", node.id);
                None
            }
        }
    }

    fn header(&self, node: &GraphNode, file: &str) -> String {
        if node.kind == NodeKind::Module {
            return format!("FILE_CONTEXT: {file}\n(Contains Imports, Globals, and Script Logic)\n");
        }

        let mut header = format!("FILE: {file}\nID: {}\nTYPE: {}\n", node.id, node.kind);
        if let Some(callees) = self.deps.get(&node.id) {
            let uses: Vec<&str> = callees
                .iter()
                .take(HEADER_USES)
                .map(|id| codemap_graph::short_name(id))
                .collect();
            header.push_str(&format!("USES: {}\n", uses.join(", ")));
        }
        header
    }
}

/// Searchable text: kind marker, id, label, docstring, parameters, then the body
pub fn keyword_text(node: &GraphNode, file: &str, body: &str) -> String {
    let mut text = match node.kind {
        NodeKind::Module => format!("FILE: {file} MODULE GLOBAL "),
        kind => format!("{kind} "),
    };
    text.push_str(&format!("{} {} ", node.id, node.label));
    if !node.docstring.is_empty() {
        text.push_str(&node.docstring);
        text.push(' ');
    }
    if !node.parameters.is_empty() {
        text.push_str(&node.parameters.join(" "));
        text.push(' ');
    }
    text.push(' ');
    text.push_str(body);
    text
}

/// Split on line boundaries into chunks of at most `max_chars` characters; a single
/// longer line becomes its own chunk
pub fn split_on_lines(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.lines() {
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { line_len + 1 };
        if !current.is_empty() && current_len + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemap_graph::{BuiltinNames, Linker};
    use codemap_indexer::{index_source, ClassRegistry};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn setup(files: &[(&str, &str)]) -> (TempDir, codemap_graph::LinkedGraph) {
        let dir = TempDir::new().unwrap();
        let mut indexes = Vec::new();
        for (path, source) in files {
            std::fs::write(dir.path().join(path), source).unwrap();
            indexes.push(
                index_source(path, source, &ClassRegistry::new(), 300)
                    .unwrap()
                    .index,
            );
        }
        (dir, Linker::new(&BuiltinNames::python()).link(&indexes))
    }

    const SOURCE: &str = "\
import os

def load_config(path):
    \"\"\"Read settings.\"\"\"
    return parse(path)

def parse(path):
    return os.path.exists(path)
";

    #[test]
    fn keyword_documents_cover_modules_and_functions() {
        let (dir, linked) = setup(&[("cfg.py", SOURCE)]);
        let reader = SourceReader::new(dir.path());
        let builder = CorpusBuilder::new(&linked.graph, &reader, &linked.dependency_map);

        let docs = builder.keyword_documents();
        let ids: Vec<&str> = docs.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["cfg", "cfg.load_config", "cfg.parse"]);

        assert!(docs[0].1.starts_with("FILE: cfg.py MODULE GLOBAL cfg cfg "));
        assert!(docs[0].1.contains("... (logic inside function) ..."));
        assert!(docs[1]
            .1
            .starts_with("function cfg.load_config load_config Read settings. path "));
    }

    #[test]
    fn vector_documents_carry_headers() {
        let (dir, linked) = setup(&[("cfg.py", SOURCE)]);
        let reader = SourceReader::new(dir.path());
        let builder = CorpusBuilder::new(&linked.graph, &reader, &linked.dependency_map);

        let docs = builder.vector_documents();
        assert!(docs[0].text.starts_with("FILE_CONTEXT: cfg.py\n"));
        let load = docs.iter().find(|d| d.node_id == "cfg.load_config").unwrap();
        assert!(load
            .text
            .starts_with("FILE: cfg.py\nID: cfg.load_config\nTYPE: function\nUSES: parse\n\n--- FULL BODY ---\n"));
    }

    #[test]
    fn long_bodies_are_split_into_parts() {
        let body: String = (0..400)
            .map(|i| format!("    value_{i} = compute_something({i})\n"))
            .collect();
        let source = format!("def huge():\n{body}");
        let (dir, linked) = setup(&[("big.py", &source)]);
        let reader = SourceReader::new(dir.path());
        let builder = CorpusBuilder::new(&linked.graph, &reader, &linked.dependency_map);

        let parts: Vec<_> = builder
            .vector_documents()
            .into_iter()
            .filter(|d| d.node_id == "big.huge")
            .collect();
        assert!(parts.len() > 1);
        assert_eq!(parts[0].part, 1);
        assert!(parts.iter().all(|p| p.total_parts == parts.len()));
        assert!(parts[1].text.contains("--- PART 2 ---"));
    }

    #[test]
    fn splitting_respects_the_limit() {
        let text = "aaaa\nbbbb\ncccc\ndddddddddddd";
        assert_eq!(
            split_on_lines(text, 9),
            vec!["aaaa\nbbbb", "cccc", "dddddddddddd"]
        );
    }
}
