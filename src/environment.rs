use crate::object::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A lexical scope: a bindings namespace plus an optional parent scope.
///
/// Lookup walks the parent chain (nearest enclosing binding shadows);
/// writes always land in the current scope only, so reassignment inside a
/// nested scope creates a local shadow instead of mutating an outer
/// variable.  The outermost environment holds the preloaded built-ins and
/// has no parent.
#[derive(Debug, Clone)]
pub struct Environment {
    values: HashMap<String, Object>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Derive a fresh child scope.  Used both for function-call activation
    /// records and for class-body scratch scopes.
    pub fn derive_child(parent: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::with_enclosing(parent.clone())))
    }

    /// Bind `name` in the *current* scope, shadowing any enclosing binding.
    pub fn define(&mut self, name: &str, value: Object) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up through the scope chain.  `None` means unresolved;
    /// the evaluator turns that into a NameError.
    pub fn get(&self, name: &str) -> Option<Object> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// A snapshot of this scope's own bindings, ignoring the parent chain.
    /// Harvested after executing a class body to form the class namespace.
    pub fn bindings(&self) -> HashMap<String, Object> {
        self.values.clone()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}
