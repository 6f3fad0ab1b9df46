//! The runtime object model.
//!
//! Every value the evaluator produces is an [`Object`]: built-in
//! numeric/string/collection values, user classes and their instances,
//! functions and bound methods, exception objects, and the `super` proxy.
//! Classes are themselves objects whose own-class is the `type` singleton;
//! the attribute-resolution and method-binding protocol that ties the
//! kinds together lives here, while the two-phase bootstrap of the root
//! singletons lives in [`crate::builtins`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::builtins::Builtins;
use crate::environment::Environment;
use crate::stmt::Stmt;

/// Shared handle to a class object.  Classes are compared by referential
/// identity (`Rc::ptr_eq`), never structurally.
pub type ClassRef = Rc<ClassObj>;

/// Signature of a native (Rust-implemented) callable.  Natives validate
/// their own arguments and report failures as bare exception objects; the
/// evaluator attaches the traceback at the point of the call.
pub type NativeFn = fn(&Builtins, &[Object]) -> std::result::Result<Object, ExceptionObj>;

/// A user- or built-in-defined class: name, optional single base, and an
/// own namespace of attributes.
///
/// Only the two bootstrap roots (`object`, `type`) have no base.  The
/// own-class link is filled in exactly once after allocation so that the
/// `type`-is-an-instance-of-itself cycle can be closed without ordinary
/// instantiation.
#[derive(Debug)]
pub struct ClassObj {
    pub name: String,
    pub base: Option<ClassRef>,
    pub namespace: RefCell<HashMap<String, Object>>,
    class_of: RefCell<Option<ClassRef>>,
}

impl ClassObj {
    /// Create a fully-linked class whose own-class is `metaclass`.
    pub fn new(name: impl Into<String>, base: Option<ClassRef>, metaclass: ClassRef) -> ClassRef {
        Rc::new(ClassObj {
            name: name.into(),
            base,
            namespace: RefCell::new(HashMap::new()),
            class_of: RefCell::new(Some(metaclass)),
        })
    }

    /// Phase one of the bootstrap: allocate a root class with no base and
    /// no own-class link yet.
    pub(crate) fn allocate_root(name: &str) -> ClassRef {
        Rc::new(ClassObj {
            name: name.to_string(),
            base: None,
            namespace: RefCell::new(HashMap::new()),
            class_of: RefCell::new(None),
        })
    }

    /// Phase two of the bootstrap: close the own-class link.
    pub(crate) fn link_metaclass(&self, metaclass: &ClassRef) {
        *self.class_of.borrow_mut() = Some(metaclass.clone());
    }

    /// The class this class is an instance of (`type` for every class,
    /// including `type` itself).
    pub fn class_of(&self) -> ClassRef {
        self.class_of
            .borrow()
            .clone()
            .expect("class used before bootstrap linked its metaclass")
    }

    /// Resolve `name` through this class's own namespace, then iteratively
    /// through the base chain.  No method binding happens here.
    pub fn resolve(self: &Rc<Self>, name: &str) -> Option<Object> {
        let mut current: Option<ClassRef> = Some(self.clone());

        while let Some(class) = current {
            if let Some(value) = class.namespace.borrow().get(name) {
                return Some(value.clone());
            }

            current = class.base.clone();
        }

        None
    }

    /// Attribute write on a class inserts into its own namespace, visible
    /// to every instance that resolves through it.
    pub fn set_attribute(&self, name: &str, value: Object) {
        self.namespace.borrow_mut().insert(name.to_string(), value);
    }

    /// Is `self` the same class as `other`, or derived from it?
    pub fn derives_from(self: &Rc<Self>, other: &ClassRef) -> bool {
        let mut current: Option<ClassRef> = Some(self.clone());

        while let Some(class) = current {
            if Rc::ptr_eq(&class, other) {
                return true;
            }

            current = class.base.clone();
        }

        false
    }
}

/// An instance of a user class: owning class reference plus a per-instance
/// attribute namespace.  The owning class never changes after creation.
#[derive(Debug)]
pub struct InstanceObj {
    pub class: ClassRef,
    pub attributes: RefCell<HashMap<String, Object>>,
}

impl InstanceObj {
    /// The default allocator result: a bare instance with an empty
    /// attribute namespace.
    pub fn new(class: ClassRef) -> Rc<Self> {
        Rc::new(InstanceObj {
            class,
            attributes: RefCell::new(HashMap::new()),
        })
    }

    /// Attribute read: instance namespace first, then the owning class's
    /// chain.  A resolved plain function is synthesized into a bound
    /// method carrying this instance; anything else is returned unwrapped.
    pub fn get_attribute(self: &Rc<Self>, name: &str) -> Option<Object> {
        if let Some(value) = self.attributes.borrow().get(name) {
            return Some(value.clone());
        }

        match self.class.resolve(name)? {
            Object::Function(function) => {
                debug!("Binding method '{}' to instance of {}", name, self.class.name);

                Some(Object::BoundMethod {
                    function,
                    receiver: self.clone(),
                })
            }

            other => Some(other),
        }
    }

    /// Attribute write always lands in the instance namespace, never up
    /// the class chain.
    pub fn set_attribute(&self, name: &str, value: Object) {
        self.attributes.borrow_mut().insert(name.to_string(), value);
    }
}

/// A user-defined function: parameter names, body statements, and the
/// environment captured at definition time (lexical closure).
#[derive(Debug)]
pub struct FunctionObj {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Vec<Stmt>>,
    pub closure: Rc<RefCell<Environment>>,
}

/// A Rust-implemented built-in callable.
pub struct NativeObj {
    pub name: &'static str,
    pub func: NativeFn,
}

impl fmt::Debug for NativeObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeObj({})", self.name)
    }
}

/// The proxy produced by `super`: attribute resolution re-enters the
/// class chain starting at the *base* of the bound class, skipping the
/// bound class's own namespace entirely.
#[derive(Debug)]
pub struct SuperObj {
    pub class: ClassRef,
    pub instance: Option<Rc<InstanceObj>>,
}

impl SuperObj {
    pub fn get_attribute(&self, name: &str) -> Option<Object> {
        let resolved = self.class.base.as_ref()?.resolve(name)?;

        match (resolved, &self.instance) {
            (Object::Function(function), Some(receiver)) => Some(Object::BoundMethod {
                function,
                receiver: receiver.clone(),
            }),

            (other, _) => Some(other),
        }
    }
}

/// Exhaustible cursor over a snapshot of a collection's elements; the
/// vehicle for the `iter`/`next` built-ins and their StopIteration
/// exhaustion signal.
#[derive(Debug)]
pub struct IterObj {
    items: Vec<Object>,
    index: usize,
}

impl IterObj {
    pub fn new(items: Vec<Object>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(IterObj { items, index: 0 }))
    }

    pub fn next(&mut self) -> Option<Object> {
        let item = self.items.get(self.index).cloned()?;
        self.index += 1;
        Some(item)
    }
}

/// The kind tag carried by every exception object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    /// The generic kind produced by calling the `Exception` built-in.
    Exception,
    NameError,
    TypeError,
    AttributeError,
    ZeroDivisionError,
    OverflowError,
    IndexError,
    KeyError,
    StopIteration,
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExceptionKind::Exception => "Exception",
            ExceptionKind::NameError => "NameError",
            ExceptionKind::TypeError => "TypeError",
            ExceptionKind::AttributeError => "AttributeError",
            ExceptionKind::ZeroDivisionError => "ZeroDivisionError",
            ExceptionKind::OverflowError => "OverflowError",
            ExceptionKind::IndexError => "IndexError",
            ExceptionKind::KeyError => "KeyError",
            ExceptionKind::StopIteration => "StopIteration",
        };

        write!(f, "{}", name)
    }
}

/// A runtime exception: kind tag plus human-readable message.  Raising
/// one unwinds the whole evaluation; there is no in-language catch.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionObj {
    pub kind: ExceptionKind,
    pub message: String,
}

impl ExceptionObj {
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Self {
        ExceptionObj {
            kind,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::TypeError, message)
    }

    pub fn name_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::NameError, message)
    }

    pub fn attribute_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::AttributeError, message)
    }
}

/// A hashable dictionary key.  Unhashable kinds (lists, dicts, instances)
/// are rejected with a TypeError at the insertion site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    Int(i64),
    Str(String),
    Bool(bool),
    None,
}

impl DictKey {
    pub fn to_object(&self) -> Object {
        match self {
            DictKey::Int(n) => Object::Int(*n),
            DictKey::Str(s) => Object::Str(Rc::new(s.clone())),
            DictKey::Bool(b) => Object::Bool(*b),
            DictKey::None => Object::None,
        }
    }
}

/// A runtime value.  Cheap to clone: compound kinds are reference-counted
/// handles sharing their payload.
#[derive(Debug, Clone)]
pub enum Object {
    None,

    Bool(bool),

    Int(i64),

    Str(Rc<String>),

    List(Rc<RefCell<Vec<Object>>>),

    Dict(Rc<RefCell<HashMap<DictKey, Object>>>),

    Class(ClassRef),

    Instance(Rc<InstanceObj>),

    Function(Rc<FunctionObj>),

    BoundMethod {
        function: Rc<FunctionObj>,
        receiver: Rc<InstanceObj>,
    },

    Native(Rc<NativeObj>),

    Exception(Rc<ExceptionObj>),

    Super(Rc<SuperObj>),

    Iterator(Rc<RefCell<IterObj>>),
}

impl Object {
    pub fn str(s: impl Into<String>) -> Object {
        Object::Str(Rc::new(s.into()))
    }

    pub fn list(items: Vec<Object>) -> Object {
        Object::List(Rc::new(RefCell::new(items)))
    }

    pub fn dict(map: HashMap<DictKey, Object>) -> Object {
        Object::Dict(Rc::new(RefCell::new(map)))
    }

    /// The rule mapping any object to a boolean for conditionals and
    /// logical operators: None, False, 0, the empty string and empty
    /// collections are falsy; everything else is truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Object::None => false,
            Object::Bool(b) => *b,
            Object::Int(n) => *n != 0,
            Object::Str(s) => !s.is_empty(),
            Object::List(items) => !items.borrow().is_empty(),
            Object::Dict(map) => !map.borrow().is_empty(),
            _ => true,
        }
    }

    /// Equality: structural for built-in value kinds (deep for lists and
    /// dicts), referential for classes, instances, functions and the rest.
    /// Never raises.
    pub fn eq_object(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::None, Object::None) => true,
            (Object::Bool(a), Object::Bool(b)) => a == b,
            (Object::Int(a), Object::Int(b)) => a == b,
            (Object::Str(a), Object::Str(b)) => a == b,

            (Object::List(a), Object::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }

                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.eq_object(y))
            }

            (Object::Dict(a), Object::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }

                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.eq_object(w)))
            }

            (Object::Class(a), Object::Class(b)) => Rc::ptr_eq(a, b),
            (Object::Instance(a), Object::Instance(b)) => Rc::ptr_eq(a, b),
            (Object::Function(a), Object::Function(b)) => Rc::ptr_eq(a, b),

            (
                Object::BoundMethod {
                    function: fa,
                    receiver: ra,
                },
                Object::BoundMethod {
                    function: fb,
                    receiver: rb,
                },
            ) => Rc::ptr_eq(fa, fb) && Rc::ptr_eq(ra, rb),

            (Object::Native(a), Object::Native(b)) => Rc::ptr_eq(a, b),
            (Object::Exception(a), Object::Exception(b)) => Rc::ptr_eq(a, b),
            (Object::Iterator(a), Object::Iterator(b)) => Rc::ptr_eq(a, b),

            _ => false,
        }
    }

    /// Convert to a dictionary key, or `None` when the kind is unhashable.
    pub fn as_dict_key(&self) -> Option<DictKey> {
        match self {
            Object::Int(n) => Some(DictKey::Int(*n)),
            Object::Str(s) => Some(DictKey::Str(s.as_ref().clone())),
            Object::Bool(b) => Some(DictKey::Bool(*b)),
            Object::None => Some(DictKey::None),
            _ => None,
        }
    }

    /// The type name used in diagnostics (`int`, `str`, user class name...).
    pub fn type_name(&self) -> String {
        match self {
            Object::None => "NoneType".to_string(),
            Object::Bool(_) => "bool".to_string(),
            Object::Int(_) => "int".to_string(),
            Object::Str(_) => "str".to_string(),
            Object::List(_) => "list".to_string(),
            Object::Dict(_) => "dict".to_string(),
            Object::Class(_) => "type".to_string(),
            Object::Instance(instance) => instance.class.name.clone(),
            Object::Function(_) | Object::BoundMethod { .. } | Object::Native(_) => {
                "function".to_string()
            }
            Object::Exception(_) => "Exception".to_string(),
            Object::Super(_) => "super".to_string(),
            Object::Iterator(_) => "iterator".to_string(),
        }
    }

    /// The debug form: strings come out quoted, containers recurse into
    /// the debug form of their elements.
    pub fn repr(&self) -> String {
        match self {
            Object::Str(s) => quote_str(s),

            Object::List(items) => {
                let parts: Vec<String> = items.borrow().iter().map(Object::repr).collect();
                format!("[{}]", parts.join(", "))
            }

            Object::Dict(map) => {
                let parts: Vec<String> = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.to_object().repr(), v.repr()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }

            Object::Exception(e) => format!("{}({})", e.kind, quote_str(&e.message)),

            other => other.to_string(),
        }
    }
}

/// The display (stringify) form.  Differs from [`Object::repr`] only for
/// strings (raw contents) and exceptions (bare message).
impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::None => write!(f, "None"),

            Object::Bool(true) => write!(f, "True"),
            Object::Bool(false) => write!(f, "False"),

            Object::Int(n) => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                write!(f, "{}", buf.format(*n))
            }

            Object::Str(s) => write!(f, "{}", s),

            Object::List(_) | Object::Dict(_) => write!(f, "{}", self.repr()),

            Object::Class(class) => write!(f, "<class '{}'>", class.name),

            Object::Instance(instance) => write!(f, "<{} object>", instance.class.name),

            Object::Function(function) => write!(f, "<function {}>", function.name),

            Object::BoundMethod { function, receiver } => write!(
                f,
                "<bound method {}.{}>",
                receiver.class.name, function.name
            ),

            Object::Native(native) => write!(f, "<built-in function {}>", native.name),

            Object::Exception(e) => write!(f, "{}", e.message),

            Object::Super(s) => write!(f, "<super: {}>", s.class.name),

            Object::Iterator(_) => write!(f, "<iterator>"),
        }
    }
}

/// Quote a string for its debug form, escaping the characters the scanner
/// itself understands.
fn quote_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');

    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }

    out.push('\'');
    out
}
