use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of Python construct a definition is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    Module,
    Function,
    Class,
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Module => "module",
            Self::Function => "function",
            Self::Class => "class",
        };
        f.write_str(name)
    }
}

/// Heuristic role inferred from decorators and base classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Module,
    Function,
    Class,
    ApiEndpoint,
    BackgroundTask,
    DbModel,
    Exception,
}

impl Role {
    /// Role of a function given its decorator names
    pub fn for_function(decorators: &[String]) -> Self {
        let lowered: Vec<String> = decorators.iter().map(|d| d.to_lowercase()).collect();
        if lowered
            .iter()
            .any(|d| d.contains("route") || d.contains("get") || d.contains("post"))
        {
            Self::ApiEndpoint
        } else if lowered
            .iter()
            .any(|d| d.contains("task") || d.contains("celery"))
        {
            Self::BackgroundTask
        } else {
            Self::Function
        }
    }

    /// Role of a class given its base class names
    pub fn for_class(bases: &[String]) -> Self {
        if bases.iter().any(|b| b.contains("Model")) {
            Self::DbModel
        } else if bases.iter().any(|b| b.contains("Exception")) {
            Self::Exception
        } else {
            Self::Class
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Module => "module",
            Self::Function => "function",
            Self::Class => "class",
            Self::ApiEndpoint => "api_endpoint",
            Self::BackgroundTask => "background_task",
            Self::DbModel => "db_model",
            Self::Exception => "exception",
        };
        f.write_str(name)
    }
}

/// A module, class or function discovered in a source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Dotted path: `pkg.mod.Class.method`
    pub id: String,
    pub kind: DefinitionKind,
    /// `/`-separated path relative to the project root
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub is_async: bool,
    pub docstring: String,
    pub decorators: Vec<String>,
    pub role: Role,
    pub complexity: usize,
    pub line_count: usize,
    pub is_oversized: bool,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
}

impl Definition {
    /// Last segment of the dotted id
    pub fn short_name(&self) -> &str {
        self.id.rsplit('.').next().unwrap_or(&self.id)
    }
}

/// Syntactic construct enclosing a call site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntacticContext {
    Function,
    TryBlock,
    Condition,
    Loop,
}

impl fmt::Display for SyntacticContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Function => "function",
            Self::TryBlock => "try_block",
            Self::Condition => "condition",
            Self::Loop => "loop",
        };
        f.write_str(name)
    }
}

/// An unresolved call observed while walking a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSite {
    /// Dotted id of the scope the call is made from
    pub source_scope: String,
    /// Best-effort, alias- and type-rewritten callee name
    pub target_hint: String,
    pub line: usize,
    pub file: String,
    /// Enclosing constructs, outermost first
    pub syntactic_context: Vec<SyntacticContext>,
    /// True when any enclosing construct is a `try` block
    pub is_guarded: bool,
    /// Module the callee's root name was imported from, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_source: Option<String>,
}

impl CallSite {
    /// Context recorded on the resulting edge: innermost construct, or `global`
    pub fn context_label(&self) -> String {
        self.syntactic_context
            .last()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "global".to_string())
    }
}

/// Everything extracted from one source file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileIndex {
    pub file: String,
    pub module: String,
    pub definitions: Vec<Definition>,
    pub calls: Vec<CallSite>,
    pub lines: usize,
}

/// A file skipped because it failed to parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub file: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_roles_follow_decorators() {
        assert_eq!(
            Role::for_function(&["app.route".to_string()]),
            Role::ApiEndpoint
        );
        assert_eq!(
            Role::for_function(&["router.post".to_string()]),
            Role::ApiEndpoint
        );
        assert_eq!(
            Role::for_function(&["celery.shared_task".to_string()]),
            Role::BackgroundTask
        );
        assert_eq!(Role::for_function(&["staticmethod".to_string()]), Role::Function);
    }

    #[test]
    fn class_roles_follow_bases() {
        assert_eq!(Role::for_class(&["db.Model".to_string()]), Role::DbModel);
        assert_eq!(Role::for_class(&["ValueError".to_string()]), Role::Class);
        assert_eq!(
            Role::for_class(&["BaseException".to_string()]),
            Role::Exception
        );
    }

    #[test]
    fn roles_serialize_in_snake_case() {
        let json = serde_json::to_string(&Role::ApiEndpoint).unwrap();
        assert_eq!(json, "\"api_endpoint\"");
        assert_eq!(SyntacticContext::TryBlock.to_string(), "try_block");
    }

    #[test]
    fn context_label_uses_innermost_construct() {
        let call = CallSite {
            source_scope: "m.f".into(),
            target_hint: "g".into(),
            line: 3,
            file: "m.py".into(),
            syntactic_context: vec![SyntacticContext::Function, SyntacticContext::Loop],
            is_guarded: false,
            import_source: None,
        };
        assert_eq!(call.context_label(), "loop");
    }
}
