//! Per-file semantic pass: definitions, scopes, aliases and call sites.

use crate::error::Result;
use crate::registry::ClassRegistry;
use crate::scope::{ScopeArena, ScopeId};
use crate::syntax::{
    complexity, docstring, dotted_name, end_line, module_name_for, node_text, parse_python,
    start_line,
};
use crate::types::{CallSite, Definition, DefinitionKind, FileIndex, Role, SyntacticContext};
use std::collections::HashMap;
use tree_sitter::{Node, Tree};

/// Result of indexing one file
#[derive(Debug, Clone, Default)]
pub struct FileAnalysis {
    pub index: FileIndex,
    /// Class attributes assigned in this file
    pub discovered: ClassRegistry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Class,
    Function,
}

struct Parameter {
    name: String,
    annotation: Option<String>,
}

/// Walks one parsed file and extracts its definitions and call sites.
///
/// `shared` holds class attributes discovered across the whole project by an earlier
/// pass; attributes assigned in this file are collected separately and consulted first.
pub struct SemanticIndexer<'a> {
    source: &'a str,
    file: &'a str,
    module: String,
    shared: &'a ClassRegistry,
    discovered: ClassRegistry,
    oversized_threshold: usize,
    scopes: ScopeArena,
    scope: ScopeId,
    scope_path: Vec<String>,
    frames: Vec<Frame>,
    current_class: Option<String>,
    context: Vec<SyntacticContext>,
    /// Function id → alias-resolved return annotation, this file only
    return_types: HashMap<String, Option<String>>,
    definitions: Vec<Definition>,
    positions: HashMap<String, usize>,
    calls: Vec<CallSite>,
}

impl<'a> SemanticIndexer<'a> {
    pub fn new(
        file: &'a str,
        source: &'a str,
        shared: &'a ClassRegistry,
        oversized_threshold: usize,
    ) -> Self {
        let module = module_name_for(file);
        let scopes = ScopeArena::new();
        let scope = scopes.root();
        Self {
            source,
            file,
            scope_path: vec![module.clone()],
            module,
            shared,
            discovered: ClassRegistry::new(),
            oversized_threshold,
            scopes,
            scope,
            frames: Vec::new(),
            current_class: None,
            context: Vec::new(),
            return_types: HashMap::new(),
            definitions: Vec::new(),
            positions: HashMap::new(),
            calls: Vec::new(),
        }
    }

    pub fn analyze(mut self, tree: &Tree) -> FileAnalysis {
        let root = tree.root_node();
        let lines = self.source.lines().count().max(1);

        let module_def = self.definition(
            self.module.clone(),
            DefinitionKind::Module,
            1,
            lines,
            Role::Module,
            complexity(root),
        );
        self.push_definition(Definition {
            docstring: docstring(root, self.source),
            ..module_def
        });

        self.visit_children(root);

        log::debug!(
            "Indexed {}: {} definitions, {} calls",
            self.file,
            self.definitions.len(),
            self.calls.len()
        );

        FileAnalysis {
            index: FileIndex {
                file: self.file.to_string(),
                module: self.module,
                definitions: self.definitions,
                calls: self.calls,
                lines,
            },
            discovered: self.discovered,
        }
    }

    fn visit(&mut self, node: Node) {
        match node.kind() {
            "import_statement" => self.visit_import(node),
            "import_from_statement" => self.visit_import_from(node),
            "decorated_definition" => self.visit_decorated(node),
            "class_definition" => self.visit_class(node, Vec::new()),
            "function_definition" => self.visit_function(node, Vec::new()),
            "assignment" => {
                self.visit_assignment(node);
                self.visit_children(node);
            }
            "call" => {
                self.record_call(node);
                self.visit_children(node);
            }
            "try_statement" => self.visit_in_context(SyntacticContext::TryBlock, node),
            "if_statement" => self.visit_in_context(SyntacticContext::Condition, node),
            "for_statement" | "while_statement" => {
                self.visit_in_context(SyntacticContext::Loop, node)
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(child);
        }
    }

    fn visit_in_context(&mut self, context: SyntacticContext, node: Node) {
        self.context.push(context);
        self.visit_children(node);
        self.context.pop();
    }

    fn visit_import(&mut self, node: Node) {
        let mut cursor = node.walk();
        let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            match name.kind() {
                "dotted_name" => {
                    let full = node_text(name, self.source);
                    self.scopes.add_alias(self.scope, full, full);
                }
                "aliased_import" => {
                    let (Some(target), Some(alias)) = (
                        name.child_by_field_name("name"),
                        name.child_by_field_name("alias"),
                    ) else {
                        continue;
                    };
                    let target = node_text(target, self.source);
                    let alias = node_text(alias, self.source);
                    self.scopes.add_alias(self.scope, alias, target);
                }
                _ => {}
            }
        }
    }

    fn visit_import_from(&mut self, node: Node) {
        let Some(module_node) = node.child_by_field_name("module_name") else {
            return;
        };

        let base = if module_node.kind() == "relative_import" {
            let mut level = 0;
            let mut module = "";
            let mut cursor = module_node.walk();
            for child in module_node.children(&mut cursor) {
                match child.kind() {
                    "import_prefix" => {
                        level = node_text(child, self.source).matches('.').count()
                    }
                    "dotted_name" => module = node_text(child, self.source),
                    _ => {}
                }
            }
            self.resolve_relative(module, level)
        } else {
            node_text(module_node, self.source).to_string()
        };

        let mut cursor = node.walk();
        let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            let (imported, alias) = match name.kind() {
                "dotted_name" => {
                    let imported = node_text(name, self.source);
                    (imported, imported)
                }
                "aliased_import" => {
                    let (Some(target), Some(alias)) = (
                        name.child_by_field_name("name"),
                        name.child_by_field_name("alias"),
                    ) else {
                        continue;
                    };
                    (
                        node_text(target, self.source),
                        node_text(alias, self.source),
                    )
                }
                _ => continue,
            };
            let full = if base.is_empty() {
                imported.to_string()
            } else {
                format!("{base}.{imported}")
            };
            self.scopes.add_alias(self.scope, alias, full);
        }
    }

    /// Resolve `from ..pkg import x` against this file's module path
    fn resolve_relative(&self, module: &str, level: usize) -> String {
        if level == 0 {
            return module.to_string();
        }
        let parts: Vec<&str> = self.module.split('.').collect();
        if level > parts.len() {
            return module.to_string();
        }
        let base = parts[..parts.len() - level].join(".");
        match (base.is_empty(), module.is_empty()) {
            (_, true) => base,
            (true, false) => module.to_string(),
            (false, false) => format!("{base}.{module}"),
        }
    }

    fn visit_decorated(&mut self, node: Node) {
        let mut decorators = Vec::new();
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in &children {
            if child.kind() != "decorator" {
                continue;
            }
            if let Some(name) = child
                .named_child(0)
                .and_then(|expr| dotted_name(expr, self.source))
            {
                decorators.push(name);
            }
            // Decorator expressions run in the enclosing scope.
            self.visit_children(*child);
        }

        match node.child_by_field_name("definition") {
            Some(def) if def.kind() == "class_definition" => self.visit_class(def, decorators),
            Some(def) if def.kind() == "function_definition" => {
                self.visit_function(def, decorators)
            }
            Some(def) => self.visit(def),
            None => {}
        }
    }

    fn visit_class(&mut self, node: Node, decorators: Vec<String>) {
        let Some(name) = node.child_by_field_name("name") else {
            return self.visit_children(node);
        };
        let name = node_text(name, self.source).to_string();
        let id = self.qualified(&name);

        let mut bases = Vec::new();
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for base in superclasses.named_children(&mut cursor) {
                if base.kind() == "keyword_argument" {
                    continue;
                }
                if let Some(base) = dotted_name(base, self.source) {
                    bases.push(base);
                }
            }
            self.visit_children(superclasses);
        }

        let def = self.definition(
            id.clone(),
            DefinitionKind::Class,
            start_line(node),
            end_line(node),
            Role::for_class(&bases),
            complexity(node),
        );
        self.push_definition(Definition {
            docstring: docstring(node, self.source),
            decorators,
            bases,
            ..def
        });

        let outer_scope = self.scope;
        let outer_class = self.current_class.replace(id);
        self.scope = self.scopes.push_child(outer_scope);
        self.scope_path.push(name);
        self.frames.push(Frame::Class);

        if let Some(body) = node.child_by_field_name("body") {
            self.visit_children(body);
        }

        self.frames.pop();
        self.scope_path.pop();
        self.scope = outer_scope;
        self.current_class = outer_class;
    }

    fn visit_function(&mut self, node: Node, decorators: Vec<String>) {
        let Some(name) = node.child_by_field_name("name") else {
            return self.visit_children(node);
        };
        let name = node_text(name, self.source).to_string();
        let id = self.qualified(&name);
        let is_async = node.child(0).is_some_and(|c| c.kind() == "async");

        let return_type = node
            .child_by_field_name("return_type")
            .and_then(|t| dotted_name(t, self.source))
            .map(|t| self.resolve_alias(&t));
        self.return_types.insert(id.clone(), return_type.clone());

        let params_node = node.child_by_field_name("parameters");
        let parameters = params_node
            .map(|p| self.collect_parameters(p))
            .unwrap_or_default();

        let def = self.definition(
            id,
            DefinitionKind::Function,
            start_line(node),
            end_line(node),
            Role::for_function(&decorators),
            complexity(node),
        );
        let is_method = self.frames.last() == Some(&Frame::Class)
            && !decorators
                .iter()
                .any(|d| d.rsplit('.').next() == Some("staticmethod"));
        self.push_definition(Definition {
            is_async,
            docstring: docstring(node, self.source),
            decorators,
            parameters: parameters.iter().map(|p| p.name.clone()).collect(),
            return_type,
            ..def
        });

        // Default values are evaluated in the enclosing scope.
        if let Some(params) = params_node {
            self.visit_children(params);
        }

        let outer_scope = self.scope;
        self.scope = self.scopes.push_child(outer_scope);
        self.scope_path.push(name);
        self.frames.push(Frame::Function);
        self.context.push(SyntacticContext::Function);

        if is_method {
            if let (Some(first), Some(class)) = (parameters.first(), self.current_class.clone()) {
                if !first.name.starts_with('*') {
                    self.scopes.add_variable(self.scope, first.name.clone(), class);
                }
            }
        }
        for param in &parameters {
            if param.name.starts_with('*') {
                continue;
            }
            if let Some(annotation) = &param.annotation {
                let ty = self.resolve_alias(annotation);
                self.scopes.add_variable(self.scope, param.name.clone(), ty);
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.visit_children(body);
        }

        self.context.pop();
        self.frames.pop();
        self.scope_path.pop();
        self.scope = outer_scope;
    }

    fn collect_parameters(&self, params: Node) -> Vec<Parameter> {
        let mut out = Vec::new();
        let mut cursor = params.walk();
        for child in params.named_children(&mut cursor) {
            let param = match child.kind() {
                "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => Parameter {
                    name: node_text(child, self.source).to_string(),
                    annotation: None,
                },
                "typed_parameter" => {
                    let Some(name) = child.named_child(0) else {
                        continue;
                    };
                    Parameter {
                        name: node_text(name, self.source).to_string(),
                        annotation: child
                            .child_by_field_name("type")
                            .and_then(|t| dotted_name(t, self.source)),
                    }
                }
                "default_parameter" | "typed_default_parameter" => {
                    let Some(name) = child.child_by_field_name("name") else {
                        continue;
                    };
                    Parameter {
                        name: node_text(name, self.source).to_string(),
                        annotation: child
                            .child_by_field_name("type")
                            .and_then(|t| dotted_name(t, self.source)),
                    }
                }
                _ => continue,
            };
            out.push(param);
        }
        out
    }

    fn visit_assignment(&mut self, node: Node) {
        // `a = b = f()` nests assignments on the right-hand side.
        let mut targets = Vec::new();
        let mut current = node;
        let value = loop {
            if let Some(left) = current.child_by_field_name("left") {
                targets.push(left);
            }
            match current.child_by_field_name("right") {
                Some(right) if right.kind() == "assignment" => current = right,
                other => break other,
            }
        };

        let inferred = value.and_then(|v| self.infer_value_type(v)).or_else(|| {
            node.child_by_field_name("type")
                .and_then(|t| dotted_name(t, self.source))
                .map(|t| self.resolve_alias(&t))
        });
        let Some(ty) = inferred else {
            return;
        };

        for target in targets {
            match target.kind() {
                "identifier" => {
                    let name = node_text(target, self.source).to_string();
                    self.scopes.add_variable(self.scope, name, ty.clone());
                }
                "attribute" => {
                    let (Some(object), Some(attr)) = (
                        target.child_by_field_name("object"),
                        target.child_by_field_name("attribute"),
                    ) else {
                        continue;
                    };
                    if object.kind() != "identifier" || node_text(object, self.source) != "self" {
                        continue;
                    }
                    if let Some(class) = &self.current_class {
                        self.discovered
                            .insert(class, node_text(attr, self.source), &ty);
                    }
                }
                _ => {}
            }
        }
    }

    fn infer_value_type(&self, value: Node) -> Option<String> {
        match value.kind() {
            "call" => {
                let function = value.child_by_field_name("function")?;
                let name = dotted_name(function, self.source)?;
                let callee = self.call_hint(&name);
                self.return_type_of(&callee)
            }
            "identifier" => self.variable_type(node_text(value, self.source)),
            _ => None,
        }
    }

    /// Return type of a function defined earlier in this file.
    ///
    /// A known function without an annotation yields `None`; anything else is taken to
    /// be a constructor and yields its own name.
    fn return_type_of(&self, callee: &str) -> Option<String> {
        if let Some(rt) = self.return_types.get(callee) {
            return rt.clone();
        }
        for depth in (1..=self.scope_path.len()).rev() {
            let candidate = format!("{}.{callee}", self.scope_path[..depth].join("."));
            if let Some(rt) = self.return_types.get(&candidate) {
                return rt.clone();
            }
        }
        Some(callee.to_string())
    }

    fn record_call(&mut self, node: Node) {
        let Some(raw) = node
            .child_by_field_name("function")
            .and_then(|f| dotted_name(f, self.source))
        else {
            return;
        };

        let target_hint = self.call_hint(&raw);
        let root = raw.split('.').next().unwrap_or(&raw);
        let import_source = self
            .scopes
            .find_alias(self.scope, root)
            .map(str::to_string);

        self.calls.push(CallSite {
            source_scope: self.scope_path.join("."),
            target_hint,
            line: start_line(node),
            file: self.file.to_string(),
            syntactic_context: self.context.clone(),
            is_guarded: self.context.contains(&SyntacticContext::TryBlock),
            import_source,
        });
    }

    /// Best-effort callee name: alias table, then the receiver's inferred type,
    /// then the alias of the leading segment.
    fn call_hint(&self, raw: &str) -> String {
        if let Some(target) = self.scopes.find_alias(self.scope, raw) {
            return target.to_string();
        }
        if let Some((object, method)) = raw.rsplit_once('.') {
            if let Some(ty) = self.variable_type(object) {
                return format!("{ty}.{method}");
            }
        }
        self.resolve_alias(raw)
    }

    fn resolve_alias(&self, name: &str) -> String {
        if let Some(target) = self.scopes.find_alias(self.scope, name) {
            return target.to_string();
        }
        if let Some((root, rest)) = name.split_once('.') {
            if let Some(target) = self.scopes.find_alias(self.scope, root) {
                return format!("{target}.{rest}");
            }
        }
        name.to_string()
    }

    fn variable_type(&self, name: &str) -> Option<String> {
        if let Some(ty) = self.scopes.find_variable(self.scope, name) {
            return Some(ty.to_string());
        }
        let (object, attr) = name.rsplit_once('.')?;
        let owner = self.variable_type(object)?;
        self.discovered
            .attribute_type(&owner, attr)
            .or_else(|| self.shared.attribute_type(&owner, attr))
            .map(str::to_string)
    }

    fn qualified(&self, name: &str) -> String {
        format!("{}.{name}", self.scope_path.join("."))
    }

    fn definition(
        &self,
        id: String,
        kind: DefinitionKind,
        start: usize,
        end: usize,
        role: Role,
        complexity: usize,
    ) -> Definition {
        let line_count = end.saturating_sub(start);
        Definition {
            id,
            kind,
            file: self.file.to_string(),
            start_line: start,
            end_line: end,
            is_async: false,
            docstring: String::new(),
            decorators: Vec::new(),
            role,
            complexity,
            line_count,
            is_oversized: line_count > self.oversized_threshold,
            parameters: Vec::new(),
            return_type: None,
            bases: Vec::new(),
        }
    }

    fn push_definition(&mut self, def: Definition) {
        if let Some(&pos) = self.positions.get(&def.id) {
            log::warn!(
                "Duplicate definition {} in {} (lines {} and {}); keeping the later one",
                def.id,
                self.file,
                self.definitions[pos].start_line,
                def.start_line
            );
            self.definitions[pos] = def;
        } else {
            self.positions.insert(def.id.clone(), self.definitions.len());
            self.definitions.push(def);
        }
    }
}

/// Parse and index a single file's source
pub fn index_source(
    file: &str,
    source: &str,
    shared: &ClassRegistry,
    oversized_threshold: usize,
) -> Result<FileAnalysis> {
    let tree = parse_python(file, source)?;
    Ok(SemanticIndexer::new(file, source, shared, oversized_threshold).analyze(&tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn analyze(file: &str, source: &str) -> FileAnalysis {
        index_source(file, source, &ClassRegistry::new(), 300).unwrap()
    }

    fn hints(analysis: &FileAnalysis) -> Vec<(String, String)> {
        analysis
            .index
            .calls
            .iter()
            .map(|c| (c.source_scope.clone(), c.target_hint.clone()))
            .collect()
    }

    #[test]
    fn extracts_module_class_and_function_definitions() {
        let source = "\
\"\"\"Service layer.\"\"\"

class Service(BaseModel):
    \"\"\"Does work.\"\"\"

    async def run(self, job: str, *args, retries=3):
        return job
";
        let analysis = analyze("app/service.py", source);
        let ids: Vec<&str> = analysis
            .index
            .definitions
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["app.service", "app.service.Service", "app.service.Service.run"]);

        let module = &analysis.index.definitions[0];
        assert_eq!(module.kind, DefinitionKind::Module);
        assert_eq!(module.docstring, "Service layer.");
        assert_eq!(module.start_line, 1);
        assert_eq!(module.end_line, 7);

        let class = &analysis.index.definitions[1];
        assert_eq!(class.role, Role::DbModel);
        assert_eq!(class.bases, vec!["BaseModel".to_string()]);
        assert_eq!(class.docstring, "Does work.");

        let method = &analysis.index.definitions[2];
        assert!(method.is_async);
        assert_eq!(method.parameters, vec!["self", "job", "*args", "retries"]);
        assert_eq!(method.start_line, 6);
        assert_eq!(method.line_count, 1);
        assert!(!method.is_oversized);
    }

    #[test]
    fn decorators_drive_roles() {
        let source = "\
@app.route('/users')
def list_users():
    return fetch()

@celery.task
def cleanup():
    pass
";
        let analysis = analyze("api.py", source);
        let roles: Vec<Role> = analysis.index.definitions.iter().map(|d| d.role).collect();
        assert_eq!(roles, vec![Role::Module, Role::ApiEndpoint, Role::BackgroundTask]);
        assert_eq!(analysis.index.definitions[1].decorators, vec!["app.route"]);
        // The decorator call belongs to the module, the body call to the function.
        assert_eq!(
            hints(&analysis),
            vec![
                ("api".to_string(), "app.route".to_string()),
                ("api.list_users".to_string(), "fetch".to_string()),
            ]
        );
    }

    #[test]
    fn self_calls_resolve_to_the_enclosing_class() {
        let source = "\
class Worker:
    def run(self):
        try:
            for item in self.items():
                self.handle(item)
        except Exception:
            pass

    @staticmethod
    def helper(self):
        self.other()
";
        let analysis = analyze("w.py", source);
        let calls = &analysis.index.calls;
        let handle = calls.iter().find(|c| c.target_hint == "w.Worker.handle").unwrap();
        assert!(handle.is_guarded);
        assert_eq!(
            handle.syntactic_context,
            vec![
                SyntacticContext::Function,
                SyntacticContext::TryBlock,
                SyntacticContext::Loop
            ]
        );
        assert!(calls.iter().any(|c| c.target_hint == "w.Worker.items"));
        // Static methods do not bind their first parameter.
        assert!(calls.iter().any(|c| c.target_hint == "self.other"));
    }

    #[test]
    fn imports_rewrite_hints() {
        let source = "\
import numpy as np
from .models import User as U
from ..core import engine

def build():
    np.array([1])
    U()
    engine.start()
";
        let analysis = analyze("pkg/sub/b.py", source);
        assert_eq!(
            hints(&analysis)
                .into_iter()
                .map(|(_, hint)| hint)
                .collect::<Vec<_>>(),
            vec!["numpy.array", "pkg.sub.models.User", "pkg.core.engine.start"]
        );
        let user = &analysis.index.calls[1];
        assert_eq!(user.import_source.as_deref(), Some("pkg.sub.models.User"));
        assert!(!user.is_guarded);
    }

    #[test]
    fn return_annotations_and_parameters_bind_types() {
        let source = "\
from services import Mailer

def make_mailer() -> Mailer:
    return Mailer()

def plain():
    return 1

def send(request: Request):
    m = make_mailer()
    m.deliver()
    request.json()
    p = plain()
    p.method()
    alias = m
    alias.close()
";
        let analysis = analyze("mail.py", source);
        let targets: Vec<String> = analysis
            .index
            .calls
            .iter()
            .filter(|c| c.source_scope == "mail.send")
            .map(|c| c.target_hint.clone())
            .collect();
        assert_eq!(
            targets,
            vec![
                "make_mailer",
                "services.Mailer.deliver",
                "Request.json",
                "plain",
                "p.method",
                "services.Mailer.close",
            ]
        );
        assert_eq!(
            analysis.index.definitions[1].return_type.as_deref(),
            Some("services.Mailer")
        );
    }

    #[test]
    fn constructor_assignments_bind_the_class_name() {
        let source = "\
def main():
    repo = Repository()
    repo.save()
";
        let analysis = analyze("main.py", source);
        assert!(analysis
            .index
            .calls
            .iter()
            .any(|c| c.target_hint == "Repository.save"));
    }

    #[test]
    fn attribute_assignments_feed_the_registry() {
        let source = "\
from db import Repo

class Service:
    def __init__(self):
        self.repo = Repo()

    def save(self):
        self.repo.commit()
";
        let first = analyze("svc.py", source);
        assert_eq!(
            first.discovered.attribute_type("svc.Service", "repo"),
            Some("db.Repo")
        );
        assert!(first
            .index
            .calls
            .iter()
            .any(|c| c.target_hint == "db.Repo.commit"));
    }

    #[test]
    fn shared_registry_resolves_attributes_from_other_files() {
        let mut shared = ClassRegistry::new();
        shared.insert("base.Handler", "client", "http.Client");
        let source = "\
def use(h: Handler):
    h.client.get()
";
        let mut analysis = index_source("use.py", source, &shared, 300).unwrap();
        assert!(analysis.index.calls.iter().all(|c| c.target_hint != "http.Client.get"));

        let source = "\
from base import Handler

def use(h: Handler):
    h.client.get()
";
        analysis = index_source("use.py", source, &shared, 300).unwrap();
        assert_eq!(analysis.index.calls[0].target_hint, "http.Client.get");
    }

    #[test]
    fn duplicate_definitions_keep_the_later_one() {
        let source = "\
def f():
    pass

def f():
    return 2
";
        let analysis = analyze("dup.py", source);
        let fs: Vec<&Definition> = analysis
            .index
            .definitions
            .iter()
            .filter(|d| d.id == "dup.f")
            .collect();
        assert_eq!(fs.len(), 1);
        assert_eq!(fs[0].start_line, 4);
    }

    #[test]
    fn oversized_definitions_are_flagged() {
        let body: String = (0..5).map(|i| format!("    x{i} = {i}\n")).collect();
        let source = format!("def big():\n{body}");
        let analysis = index_source("big.py", &source, &ClassRegistry::new(), 4).unwrap();
        let big = &analysis.index.definitions[1];
        assert_eq!((big.start_line, big.end_line), (1, 6));
        assert_eq!(big.line_count, 5);
        assert!(big.is_oversized);

        let at_threshold = index_source("big.py", &source, &ClassRegistry::new(), 5).unwrap();
        assert!(!at_threshold.index.definitions[1].is_oversized);
    }
}
