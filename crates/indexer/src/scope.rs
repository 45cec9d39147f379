use std::collections::HashMap;

/// Handle of a scope inside a [`ScopeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    aliases: HashMap<String, String>,
    variables: HashMap<String, String>,
}

/// Lexical scopes of one file, addressed by index with parent links.
///
/// Lookups walk from a scope outwards to the module scope.
#[derive(Debug)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeArena {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// The module-level scope
    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn push_child(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        ScopeId(self.scopes.len() - 1)
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes.get(scope.0).and_then(|s| s.parent)
    }

    /// Record `name` as an alias of the fully-qualified `target`
    pub fn add_alias(&mut self, scope: ScopeId, name: impl Into<String>, target: impl Into<String>) {
        if let Some(s) = self.scopes.get_mut(scope.0) {
            s.aliases.insert(name.into(), target.into());
        }
    }

    /// Bind a local name to an inferred type
    pub fn add_variable(&mut self, scope: ScopeId, name: impl Into<String>, ty: impl Into<String>) {
        if let Some(s) = self.scopes.get_mut(scope.0) {
            s.variables.insert(name.into(), ty.into());
        }
    }

    pub fn find_alias(&self, scope: ScopeId, name: &str) -> Option<&str> {
        self.walk(scope)
            .find_map(|s| s.aliases.get(name))
            .map(String::as_str)
    }

    pub fn find_variable(&self, scope: ScopeId, name: &str) -> Option<&str> {
        self.walk(scope)
            .find_map(|s| s.variables.get(name))
            .map(String::as_str)
    }

    fn walk(&self, scope: ScopeId) -> impl Iterator<Item = &Scope> {
        let mut next = Some(scope);
        std::iter::from_fn(move || {
            let current = next?;
            let s = self.scopes.get(current.0)?;
            next = s.parent;
            Some(s)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_walk_outwards() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        arena.add_alias(root, "np", "numpy");
        let func = arena.push_child(root);
        arena.add_variable(func, "repo", "app.Repo");

        assert_eq!(arena.find_alias(func, "np"), Some("numpy"));
        assert_eq!(arena.find_variable(func, "repo"), Some("app.Repo"));
        assert_eq!(arena.find_variable(root, "repo"), None);
        assert_eq!(arena.parent(func), Some(root));
    }

    #[test]
    fn inner_bindings_shadow_outer_ones() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        arena.add_variable(root, "x", "Outer");
        let inner = arena.push_child(root);
        arena.add_variable(inner, "x", "Inner");

        assert_eq!(arena.find_variable(inner, "x"), Some("Inner"));
        assert_eq!(arena.find_variable(root, "x"), Some("Outer"));
    }
}
