use std::fmt;
use std::sync::Arc;

use crate::ast::Expr;
use crate::udm::Udm;

/// A lexical environment: an immutable, shared chain of bindings.
///
/// Binding a name returns a new environment whose parent is the old one, so
/// closures can hold on to the environment they were created in.
#[derive(Clone, Default)]
pub struct Env(Option<Arc<Scope>>);

struct Scope {
    name: String,
    binding: Binding,
    parent: Env,
}

/// What a name is bound to.
#[derive(Debug, Clone)]
pub enum Binding {
    Value(Udm),
    /// The bound expression failed and was already reported
    Tainted,
}

impl Env {
    pub fn new() -> Self {
        Env(None)
    }

    /// Root environment with `$input` bound.
    pub fn with_input(input: Udm) -> Self {
        Env::new().bind("$input", input)
    }

    pub fn bind(&self, name: impl Into<String>, value: Udm) -> Env {
        self.push(name.into(), Binding::Value(value))
    }

    pub fn bind_tainted(&self, name: impl Into<String>) -> Env {
        self.push(name.into(), Binding::Tainted)
    }

    fn push(&self, name: String, binding: Binding) -> Env {
        Env(Some(Arc::new(Scope {
            name,
            binding,
            parent: self.clone(),
        })))
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        let mut current = self.0.as_deref();
        while let Some(scope) = current {
            if scope.name == name {
                return Some(&scope.binding);
            }
            current = scope.parent.0.as_deref();
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        let mut current = self.0.as_deref();
        while let Some(scope) = current {
            names.push(scope.name.as_str());
            current = scope.parent.0.as_deref();
        }
        f.debug_tuple("Env").field(&names).finish()
    }
}

/// The value of a lambda expression: parameters, body and captured scope.
#[derive(Debug)]
pub struct Closure {
    pub params: Vec<String>,
    pub body: Arc<Expr>,
    pub env: Env,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_bindings_shadow_outer() {
        let outer = Env::with_input(Udm::Integer(1)).bind("x", Udm::Integer(2));
        let inner = outer.bind("x", Udm::Integer(3));

        assert!(matches!(inner.lookup("x"), Some(Binding::Value(Udm::Integer(3)))));
        assert!(matches!(outer.lookup("x"), Some(Binding::Value(Udm::Integer(2)))));
        assert!(inner.contains("$input"));
        assert!(inner.lookup("y").is_none());
    }

    #[test]
    fn tainted_bindings_are_visible() {
        let env = Env::new().bind_tainted("total");
        assert!(matches!(env.lookup("total"), Some(Binding::Tainted)));
    }
}
