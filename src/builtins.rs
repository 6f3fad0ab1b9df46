//! Bootstrap of the built-in class hierarchy and the built-ins root
//! environment.
//!
//! The two root singletons close the type system on themselves: `object`
//! has no base and `type` is an instance of itself.  That one required
//! cycle is constructed by a two-phase allocate-then-link sequence rather
//! than ordinary instantiation; every other class is created fully linked.
//! Built-in types participate in the same instantiation protocol as user
//! classes: their namespaces carry a native `__new__` implementing the
//! explicit-construction coercion rules, and the root `object` carries the
//! default allocator, so `object.__new__(cls)` is an ordinary inherited
//! attribute.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::environment::Environment;
use crate::object::{
    ClassObj, ClassRef, ExceptionKind, ExceptionObj, InstanceObj, IterObj, NativeObj, Object,
};

type NativeResult = std::result::Result<Object, ExceptionObj>;

/// The built-in class singletons shared by every evaluation run of one
/// interpreter.  Treated as immutable after bootstrap.
pub struct Builtins {
    /// The type of types; its own-class is itself.
    pub type_class: ClassRef,

    /// The base object type terminating every base chain.
    pub object_class: ClassRef,

    pub int_class: ClassRef,
    pub str_class: ClassRef,
    pub bool_class: ClassRef,
    pub list_class: ClassRef,
    pub dict_class: ClassRef,
    pub none_class: ClassRef,
    pub exception_class: ClassRef,
    pub function_class: ClassRef,
    pub iterator_class: ClassRef,
    pub super_class: ClassRef,
}

impl Builtins {
    /// Construct the singleton hierarchy.  Runs once per interpreter.
    pub fn bootstrap() -> Rc<Self> {
        info!("Bootstrapping built-in class hierarchy");

        // Phase one: allocate the two roots without their own-class links.
        let object_class = ClassObj::allocate_root("object");
        let type_class = ClassObj::allocate_root("type");

        // Phase two: close the cycle. `type` is an instance of itself;
        // `object` is an instance of `type`.
        object_class.link_metaclass(&type_class);
        type_class.link_metaclass(&type_class);

        // The default allocator lives on the root, inherited by every
        // class that does not override `__new__`.
        object_class.set_attribute("__new__", native("__new__", object_new));

        let int_class = ClassObj::new("int", Some(object_class.clone()), type_class.clone());
        int_class.set_attribute("__new__", native("__new__", int_new));

        let str_class = ClassObj::new("str", Some(object_class.clone()), type_class.clone());
        str_class.set_attribute("__new__", native("__new__", str_new));

        // bool sits under int, matching the numeric coercion rules.
        let bool_class = ClassObj::new("bool", Some(int_class.clone()), type_class.clone());
        bool_class.set_attribute("__new__", native("__new__", bool_new));

        let list_class = ClassObj::new("list", Some(object_class.clone()), type_class.clone());
        list_class.set_attribute("__new__", native("__new__", list_new));

        let dict_class = ClassObj::new("dict", Some(object_class.clone()), type_class.clone());
        dict_class.set_attribute("__new__", native("__new__", dict_new));

        let none_class = ClassObj::new("NoneType", Some(object_class.clone()), type_class.clone());

        let exception_class =
            ClassObj::new("Exception", Some(object_class.clone()), type_class.clone());
        exception_class.set_attribute("__new__", native("__new__", exception_new));
        let function_class =
            ClassObj::new("function", Some(object_class.clone()), type_class.clone());
        let iterator_class =
            ClassObj::new("iterator", Some(object_class.clone()), type_class.clone());
        let super_class = ClassObj::new("super", Some(object_class.clone()), type_class.clone());

        Rc::new(Builtins {
            type_class,
            object_class,
            int_class,
            str_class,
            bool_class,
            list_class,
            dict_class,
            none_class,
            exception_class,
            function_class,
            iterator_class,
            super_class,
        })
    }

    /// The class any object is an instance of.  For classes this is the
    /// `type` singleton; for everything else, the matching built-in.
    pub fn class_of(&self, object: &Object) -> ClassRef {
        match object {
            Object::None => self.none_class.clone(),
            Object::Bool(_) => self.bool_class.clone(),
            Object::Int(_) => self.int_class.clone(),
            Object::Str(_) => self.str_class.clone(),
            Object::List(_) => self.list_class.clone(),
            Object::Dict(_) => self.dict_class.clone(),
            Object::Class(class) => class.class_of(),
            Object::Instance(instance) => instance.class.clone(),
            Object::Function(_) | Object::BoundMethod { .. } | Object::Native(_) => {
                self.function_class.clone()
            }
            Object::Exception(_) => self.exception_class.clone(),
            Object::Super(_) => self.super_class.clone(),
            Object::Iterator(_) => self.iterator_class.clone(),
        }
    }

    /// Walk the object's class chain looking for `class` by referential
    /// identity.
    pub fn isinstance(&self, object: &Object, class: &ClassRef) -> bool {
        self.class_of(object).derives_from(class)
    }

    /// Build the outermost environment, pre-populated with every built-in
    /// name.  Each program execution derives a fresh child of this root.
    pub fn global_environment(self: &Rc<Self>) -> Rc<RefCell<Environment>> {
        debug!("Populating built-ins root environment");

        let mut root = Environment::new();

        root.define("object", Object::Class(self.object_class.clone()));
        root.define("type", Object::Class(self.type_class.clone()));
        root.define("int", Object::Class(self.int_class.clone()));
        root.define("str", Object::Class(self.str_class.clone()));
        root.define("bool", Object::Class(self.bool_class.clone()));
        root.define("list", Object::Class(self.list_class.clone()));
        root.define("dict", Object::Class(self.dict_class.clone()));
        root.define("Exception", Object::Class(self.exception_class.clone()));

        root.define("None", Object::None);
        root.define("True", Object::Bool(true));
        root.define("False", Object::Bool(false));

        root.define("print", native("print", print));
        root.define("len", native("len", len));
        root.define("isinstance", native("isinstance", isinstance));
        root.define("repr", native("repr", repr));
        root.define("hash", native("hash", hash));
        root.define("range", native("range", range));
        root.define("iter", native("iter", iter));
        root.define("next", native("next", next));

        Rc::new(RefCell::new(root))
    }
}

fn native(name: &'static str, func: crate::object::NativeFn) -> Object {
    Object::Native(Rc::new(NativeObj { name, func }))
}

// ───────────────────────── `__new__` implementations ─────────────────────────
//
// The instantiation protocol invokes `__new__` with the class being
// instantiated prepended to the caller's arguments, so `args[0]` is
// always the class below.

/// Default allocator on the `object` root: a bare instance of the given
/// class with an empty attribute namespace.  Extra arguments are left for
/// `__init__` to consume.
fn object_new(_builtins: &Builtins, args: &[Object]) -> NativeResult {
    match args.first() {
        Some(Object::Class(class)) => Ok(Object::Instance(InstanceObj::new(class.clone()))),

        _ => Err(ExceptionObj::type_error("object.__new__(X): X is not a type")),
    }
}

fn int_new(_builtins: &Builtins, args: &[Object]) -> NativeResult {
    match &args[1..] {
        [] => Ok(Object::Int(0)),

        [Object::Int(n)] => Ok(Object::Int(*n)),

        [Object::Bool(b)] => Ok(Object::Int(i64::from(*b))),

        [Object::Str(s)] => s.trim().parse::<i64>().map(Object::Int).map_err(|_| {
            ExceptionObj::type_error(format!("invalid literal for int(): '{}'", s))
        }),

        [other] => Err(ExceptionObj::type_error(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),

        _ => Err(ExceptionObj::type_error("int() takes at most 1 argument")),
    }
}

fn str_new(_builtins: &Builtins, args: &[Object]) -> NativeResult {
    match &args[1..] {
        [] => Ok(Object::str("")),

        [value] => Ok(Object::str(value.to_string())),

        _ => Err(ExceptionObj::type_error("str() takes at most 1 argument")),
    }
}

fn bool_new(_builtins: &Builtins, args: &[Object]) -> NativeResult {
    match &args[1..] {
        [] => Ok(Object::Bool(false)),

        [value] => Ok(Object::Bool(value.truthy())),

        _ => Err(ExceptionObj::type_error("bool() takes at most 1 argument")),
    }
}

fn list_new(_builtins: &Builtins, args: &[Object]) -> NativeResult {
    match &args[1..] {
        [] => Ok(Object::list(Vec::new())),

        [value] => Ok(Object::list(elements_of(value)?)),

        _ => Err(ExceptionObj::type_error("list() takes at most 1 argument")),
    }
}

fn dict_new(_builtins: &Builtins, args: &[Object]) -> NativeResult {
    match &args[1..] {
        [] => Ok(Object::dict(HashMap::new())),

        [Object::Dict(map)] => Ok(Object::dict(map.borrow().clone())),

        [other] => Err(ExceptionObj::type_error(format!(
            "dict() argument must be a dict, not '{}'",
            other.type_name()
        ))),

        _ => Err(ExceptionObj::type_error("dict() takes at most 1 argument")),
    }
}

/// `Exception()` / `Exception(message)` constructs an exception value of
/// the generic kind.  Stringifies a non-string message argument.
fn exception_new(_builtins: &Builtins, args: &[Object]) -> NativeResult {
    match &args[1..] {
        [] => Ok(Object::Exception(Rc::new(ExceptionObj::new(
            ExceptionKind::Exception,
            "",
        )))),

        [message] => Ok(Object::Exception(Rc::new(ExceptionObj::new(
            ExceptionKind::Exception,
            message.to_string(),
        )))),

        _ => Err(ExceptionObj::type_error(
            "Exception() takes at most 1 argument",
        )),
    }
}

// ───────────────────────── free built-in functions ───────────────────────────

fn print(_builtins: &Builtins, args: &[Object]) -> NativeResult {
    let parts: Vec<String> = args.iter().map(Object::to_string).collect();
    println!("{}", parts.join(" "));

    Ok(Object::None)
}

fn len(_builtins: &Builtins, args: &[Object]) -> NativeResult {
    expect_arity("len", args, 1)?;

    match &args[0] {
        Object::Str(s) => Ok(Object::Int(s.chars().count() as i64)),
        Object::List(items) => Ok(Object::Int(items.borrow().len() as i64)),
        Object::Dict(map) => Ok(Object::Int(map.borrow().len() as i64)),

        other => Err(ExceptionObj::type_error(format!(
            "object of type '{}' has no len()",
            other.type_name()
        ))),
    }
}

fn isinstance(builtins: &Builtins, args: &[Object]) -> NativeResult {
    expect_arity("isinstance", args, 2)?;

    match &args[1] {
        Object::Class(class) => Ok(Object::Bool(builtins.isinstance(&args[0], class))),

        other => Err(ExceptionObj::type_error(format!(
            "isinstance() arg 2 must be a type, not '{}'",
            other.type_name()
        ))),
    }
}

fn repr(_builtins: &Builtins, args: &[Object]) -> NativeResult {
    expect_arity("repr", args, 1)?;

    Ok(Object::str(args[0].repr()))
}

/// Hash values are implementation-defined: FNV-1a 64-bit over string
/// bytes, identity for integers and booleans.
fn hash(_builtins: &Builtins, args: &[Object]) -> NativeResult {
    expect_arity("hash", args, 1)?;

    match &args[0] {
        Object::Int(n) => Ok(Object::Int(*n)),
        Object::Bool(b) => Ok(Object::Int(i64::from(*b))),
        Object::None => Ok(Object::Int(0)),
        Object::Str(s) => Ok(Object::Int(fnv1a(s.as_bytes()) as i64)),

        other => Err(ExceptionObj::type_error(format!(
            "unhashable type: '{}'",
            other.type_name()
        ))),
    }
}

fn range(_builtins: &Builtins, args: &[Object]) -> NativeResult {
    let (start, stop) = match args {
        [Object::Int(stop)] => (0, *stop),
        [Object::Int(start), Object::Int(stop)] => (*start, *stop),

        _ => {
            return Err(ExceptionObj::type_error(
                "range() expects one or two integer arguments",
            ))
        }
    };

    Ok(Object::list((start..stop).map(Object::Int).collect()))
}

fn iter(_builtins: &Builtins, args: &[Object]) -> NativeResult {
    expect_arity("iter", args, 1)?;

    Ok(Object::Iterator(IterObj::new(elements_of(&args[0])?)))
}

fn next(_builtins: &Builtins, args: &[Object]) -> NativeResult {
    expect_arity("next", args, 1)?;

    match &args[0] {
        Object::Iterator(it) => it
            .borrow_mut()
            .next()
            .ok_or_else(|| ExceptionObj::new(ExceptionKind::StopIteration, "")),

        other => Err(ExceptionObj::type_error(format!(
            "'{}' object is not an iterator",
            other.type_name()
        ))),
    }
}

// ───────────────────────────────── helpers ───────────────────────────────────

fn expect_arity(name: &str, args: &[Object], arity: usize) -> Result<(), ExceptionObj> {
    if args.len() == arity {
        Ok(())
    } else {
        Err(ExceptionObj::type_error(format!(
            "{}() takes exactly {} argument{} ({} given)",
            name,
            arity,
            if arity == 1 { "" } else { "s" },
            args.len()
        )))
    }
}

/// The element sequence backing `iter()` and `list()`: list elements,
/// one-character strings, or dict keys.
fn elements_of(value: &Object) -> Result<Vec<Object>, ExceptionObj> {
    match value {
        Object::List(items) => Ok(items.borrow().clone()),

        Object::Str(s) => Ok(s.chars().map(|c| Object::str(c.to_string())).collect()),

        Object::Dict(map) => Ok(map.borrow().keys().map(|k| k.to_object()).collect()),

        other => Err(ExceptionObj::type_error(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;

    for &b in bytes {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }

    h
}
