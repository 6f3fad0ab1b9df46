//! The tree-walking evaluator.
//!
//! Executes the statement/expression tree against an [`Environment`],
//! producing [`Object`] values and owning all control-flow semantics.
//! Non-local flow — `return` and raised exceptions — travels as the `Err`
//! arm of every evaluation step.  A raised exception captures the
//! evaluator's diagnostic frame stack at the moment of raising; frames are
//! pushed on entering each top-level statement and each call boundary and
//! popped on normal exit, so the snapshot inside an unwinding exception is
//! never mutated afterwards.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::builtins::Builtins;
use crate::environment::Environment;
use crate::error::{Raised, TraceFrame};
use crate::expr::{BinOp, Expr, Loc};
use crate::object::{
    ClassObj, ClassRef, ExceptionKind, ExceptionObj, FunctionObj, InstanceObj, Object, SuperObj,
};
use crate::stmt::{Stmt, Target};

/// Non-local control flow threaded through every `Exec`/`Eval` step.
#[derive(Error, Debug)]
pub enum Signal {
    /// A raised exception unwinding towards the top-level driver.
    #[error("{0}")]
    Raise(Raised),

    /// A `return` unwinding to the enclosing function-call activation.
    #[error("return signal")]
    Return(Object),
}

/// Convenient alias for evaluator results.
pub type EResult<T> = Result<T, Signal>;

/// An assignment destination whose object/index subexpressions have been
/// evaluated, so a read-modify-write touches them exactly once.
enum Place {
    Name(String),

    Attribute { object: Object, name: String },

    Index { object: Object, index: Object },
}

pub struct Interpreter {
    builtins: Rc<Builtins>,

    /// The shared built-ins root; parent of every program environment.
    globals: Rc<RefCell<Environment>>,

    /// The environment statements currently execute in.
    environment: Rc<RefCell<Environment>>,

    /// Diagnostic frames for traceback capture, outermost first.
    frames: Vec<TraceFrame>,

    /// Instantiation contexts for the zero-argument `super` form: the
    /// class being instantiated and, once `__new__` has produced it, the
    /// instance being built.  Pushed around `__new__`/`__init__` calls.
    ctor_stack: Vec<(ClassRef, Option<Rc<InstanceObj>>)>,
}

impl Interpreter {
    /// Bootstrap the built-in hierarchy and create a fresh program
    /// environment whose parent is the pre-populated built-ins root.
    pub fn new() -> Self {
        info!("Initializing interpreter");

        let builtins = Builtins::bootstrap();
        let globals = builtins.global_environment();
        let environment = Environment::derive_child(&globals);

        Self {
            builtins,
            globals,
            environment,
            frames: Vec::new(),
            ctor_stack: Vec::new(),
        }
    }

    pub fn builtins(&self) -> &Rc<Builtins> {
        &self.builtins
    }

    /// The shared built-ins root environment.
    pub fn globals(&self) -> &Rc<RefCell<Environment>> {
        &self.globals
    }

    /// Retrieve a top-level binding by name for inspection or printing.
    pub fn get_global(&self, name: &str) -> Option<Object> {
        self.environment.borrow().get(name)
    }

    /// Run a statement sequence to completion or until an exception
    /// unwinds past it.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), Raised> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.interpret_one(stmt)?;
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Execute one top-level statement, yielding the value of an
    /// expression statement so an interactive front end can display it.
    pub fn interpret_one(&mut self, stmt: &Stmt) -> Result<Option<Object>, Raised> {
        let loc = stmt.loc();
        self.frames.push(TraceFrame {
            line: loc.line,
            text: loc.text.clone(),
        });

        let outcome = match stmt {
            Stmt::Expression { expr, .. } => self.evaluate(expr).map(Some),
            _ => self.execute(stmt).map(|()| None),
        };

        let result = match outcome {
            Ok(value) => Ok(value),
            Err(Signal::Raise(raised)) => Err(raised),
            Err(Signal::Return(_)) => {
                Err(self.raised(ExceptionObj::type_error("'return' outside function")))
            }
        };

        self.frames.pop();
        result
    }

    // ───────────────────────── statement execution ──────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> EResult<()> {
        match stmt {
            Stmt::Expression { expr, .. } => {
                debug!("Evaluating expression statement");
                let _ = self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Assign { target, value, .. } => {
                let value = self.evaluate(value)?;
                let place = self.resolve_target(target)?;
                self.write_place(place, value, stmt.loc().line)
            }

            Stmt::AugAssign {
                target, op, value, ..
            } => {
                let line = stmt.loc().line;
                let place = self.resolve_target(target)?;
                let current = self.read_place(&place, line)?;
                let rhs = self.evaluate(value)?;
                let combined = self.binary_op(current, *op, rhs, line)?;
                self.write_place(place, combined, line)
            }

            Stmt::If {
                branches,
                else_body,
                ..
            } => {
                for (condition, body) in branches {
                    if self.evaluate(condition)?.truthy() {
                        return self.execute_block(body);
                    }
                }

                if let Some(body) = else_body {
                    return self.execute_block(body);
                }

                Ok(())
            }

            // The body runs in the same environment as the loop, so
            // bindings mutated inside it are visible to the next
            // condition check and after the loop exits.
            Stmt::While {
                condition, body, ..
            } => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.truthy() {
                    self.execute_block(body)?;
                }

                Ok(())
            }

            Stmt::FunctionDef {
                name, params, body, ..
            } => {
                debug!("Defining function '{}'", name);

                // The captured environment is fixed at definition time.
                let function = Object::Function(Rc::new(FunctionObj {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    closure: self.environment.clone(),
                }));

                self.environment.borrow_mut().define(name, function);
                Ok(())
            }

            Stmt::ClassDef {
                name, base, body, ..
            } => self.execute_class_def(name, base.as_ref(), body, stmt.loc().line),

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::None,
                };

                debug!("Returning value: {}", value);
                Err(Signal::Return(value))
            }
        }
    }

    /// Execute a statement sequence in the current environment.
    fn execute_block(&mut self, statements: &[Stmt]) -> EResult<()> {
        for stmt in statements {
            self.execute(stmt)?;
        }

        Ok(())
    }

    /// Run a class body in a derived scratch scope, harvest its bindings
    /// as the new class's namespace, and bind the class in the defining
    /// environment.
    fn execute_class_def(
        &mut self,
        name: &str,
        base: Option<&Expr>,
        body: &[Stmt],
        line: usize,
    ) -> EResult<()> {
        debug!("Defining class '{}'", name);

        let base_class = match base {
            Some(expr) => match self.evaluate(expr)? {
                Object::Class(class) => class,

                other => {
                    return Err(self.raise(ExceptionObj::type_error(format!(
                        "class base must be a class, not '{}' [line {}]",
                        other.type_name(),
                        line
                    ))))
                }
            },

            None => self.builtins.object_class.clone(),
        };

        let previous = self.environment.clone();
        self.environment = Environment::derive_child(&previous);

        let outcome = self.execute_block(body);

        let namespace = self.environment.borrow().bindings();
        self.environment = previous;
        outcome?;

        let class = ClassObj::new(name, Some(base_class), self.builtins.type_class.clone());
        *class.namespace.borrow_mut() = namespace;

        self.environment
            .borrow_mut()
            .define(name, Object::Class(class));

        Ok(())
    }

    // ───────────────────────── expression evaluation ────────────────────────

    /// Evaluates an expression and returns an Object.
    pub fn evaluate(&mut self, expr: &Expr) -> EResult<Object> {
        match expr {
            Expr::Int(n) => Ok(Object::Int(*n)),

            Expr::Str(s) => Ok(Object::str(s.clone())),

            Expr::Identifier { name, line } => {
                self.environment.borrow().get(name).ok_or_else(|| {
                    self.raise(ExceptionObj::name_error(format!(
                        "name '{}' is not defined [line {}]",
                        name, line
                    )))
                })
            }

            Expr::List(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate(element)?);
                }

                Ok(Object::list(items))
            }

            Expr::Dict(pairs) => {
                let mut map = std::collections::HashMap::with_capacity(pairs.len());
                for (key_expr, value_expr) in pairs {
                    let key = self.evaluate(key_expr)?;
                    let value = self.evaluate(value_expr)?;

                    let key = key.as_dict_key().ok_or_else(|| {
                        self.raise(ExceptionObj::type_error(format!(
                            "unhashable type: '{}'",
                            key.type_name()
                        )))
                    })?;

                    map.insert(key, value);
                }

                Ok(Object::dict(map))
            }

            Expr::Binary {
                left,
                op,
                right,
                line,
            } => match op {
                // Short-circuit: the right operand is evaluated only if
                // needed, and the deciding operand's value is the result.
                BinOp::And => {
                    let left = self.evaluate(left)?;
                    if !left.truthy() {
                        return Ok(left);
                    }
                    self.evaluate(right)
                }

                BinOp::Or => {
                    let left = self.evaluate(left)?;
                    if left.truthy() {
                        return Ok(left);
                    }
                    self.evaluate(right)
                }

                _ => {
                    let left = self.evaluate(left)?;
                    let right = self.evaluate(right)?;
                    self.binary_op(left, *op, right, *line)
                }
            },

            Expr::Not { operand, .. } => {
                let value = self.evaluate(operand)?;
                Ok(Object::Bool(!value.truthy()))
            }

            Expr::Call { callee, args, loc } => {
                // `super` re-enters the type system rather than the
                // environment, unless the name has been shadowed.
                if let Expr::Identifier { name, .. } = callee.as_ref() {
                    if name == "super" && self.environment.borrow().get("super").is_none() {
                        return self.evaluate_super_call(args, loc);
                    }
                }

                let callee = self.evaluate(callee)?;

                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.call_object(callee, arg_values, loc)
            }

            Expr::AttributeGet { object, name, line } => {
                let object = self.evaluate(object)?;
                self.get_attribute(&object, name, *line)
            }

            Expr::Index {
                object,
                index,
                line,
            } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                self.index_get(&object, &index, *line)
            }
        }
    }

    /// Construct the `super` proxy.  The zero-argument form reads the
    /// innermost instantiation context; the one-argument form binds
    /// immediately to the given instance's class.
    fn evaluate_super_call(&mut self, args: &[Expr], loc: &Loc) -> EResult<Object> {
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.evaluate(arg)?);
        }

        let proxy = match arg_values.as_slice() {
            [] => match self.ctor_stack.last() {
                Some((class, instance)) => SuperObj {
                    class: class.clone(),
                    instance: instance.clone(),
                },

                None => {
                    return Err(self.raise(ExceptionObj::type_error(format!(
                        "super(): no instantiation in progress [line {}]",
                        loc.line
                    ))))
                }
            },

            [Object::Instance(instance)] => SuperObj {
                class: instance.class.clone(),
                instance: Some(instance.clone()),
            },

            [other] => {
                return Err(self.raise(ExceptionObj::type_error(format!(
                    "super() argument must be an instance, not '{}' [line {}]",
                    other.type_name(),
                    loc.line
                ))))
            }

            _ => {
                return Err(self.raise(ExceptionObj::type_error(format!(
                    "super() takes at most 1 argument [line {}]",
                    loc.line
                ))))
            }
        };

        Ok(Object::Super(Rc::new(proxy)))
    }

    // ───────────────────────────── calling ──────────────────────────────────

    /// Dispatch a call by the callee's capability: classes trigger the
    /// instantiation protocol, everything callable is invoked directly.
    pub fn call_object(&mut self, callee: Object, args: Vec<Object>, loc: &Loc) -> EResult<Object> {
        match callee {
            Object::Class(class) => self.instantiate(class, args, loc),

            Object::Function(function) => self.call_function(&function, args, loc),

            Object::BoundMethod { function, receiver } => {
                // The bound instance becomes the implicit first argument.
                let mut full_args = Vec::with_capacity(args.len() + 1);
                full_args.push(Object::Instance(receiver));
                full_args.extend(args);

                self.call_function(&function, full_args, loc)
            }

            Object::Native(native) => {
                debug!("Calling native function '{}'", native.name);

                self.frames.push(TraceFrame {
                    line: loc.line,
                    text: loc.text.clone(),
                });

                let result = (native.func)(&self.builtins, &args)
                    .map_err(|exception| self.raise(exception));

                self.frames.pop();
                result
            }

            other => Err(self.raise(ExceptionObj::type_error(format!(
                "'{}' object is not callable [line {}]",
                other.type_name(),
                loc.line
            )))),
        }
    }

    /// Invoke a user-defined function: derive an activation record from
    /// the *captured* environment, bind parameters positionally, run the
    /// body, and convert a `return` signal into the call's value.
    fn call_function(
        &mut self,
        function: &Rc<FunctionObj>,
        args: Vec<Object>,
        loc: &Loc,
    ) -> EResult<Object> {
        debug!("Calling function '{}'", function.name);

        if args.len() != function.params.len() {
            return Err(self.raise(ExceptionObj::type_error(format!(
                "{}() takes {} argument{} ({} given) [line {}]",
                function.name,
                function.params.len(),
                if function.params.len() == 1 { "" } else { "s" },
                args.len(),
                loc.line
            ))));
        }

        self.frames.push(TraceFrame {
            line: loc.line,
            text: loc.text.clone(),
        });

        let saved = self.environment.clone();
        self.environment = Environment::derive_child(&function.closure);

        for (param, value) in function.params.iter().zip(args) {
            self.environment.borrow_mut().define(param, value);
        }

        let mut result = Ok(Object::None);

        for stmt in function.body.iter() {
            if let Err(signal) = self.execute(stmt) {
                result = match signal {
                    Signal::Return(value) => Ok(value),
                    raise => Err(raise),
                };
                break;
            }
        }

        self.environment = saved;
        self.frames.pop();

        result
    }

    /// The two-step instantiation protocol, expressed through the object
    /// system itself: resolve and invoke `__new__` (the root `object`
    /// carries the default allocator), then resolve and invoke `__init__`
    /// for side effects — but only when `__new__` produced an instance of
    /// the class being instantiated or a subclass of it.
    fn instantiate(&mut self, class: ClassRef, args: Vec<Object>, loc: &Loc) -> EResult<Object> {
        // type(x) with a single argument reports the class of x instead
        // of instantiating.
        if Rc::ptr_eq(&class, &self.builtins.type_class) && args.len() == 1 {
            return Ok(Object::Class(self.builtins.class_of(&args[0])));
        }

        debug!("Instantiating class '{}'", class.name);

        let mut new_args = Vec::with_capacity(args.len() + 1);
        new_args.push(Object::Class(class.clone()));
        new_args.extend(args.iter().cloned());

        let created = match class.resolve("__new__") {
            Some(Object::Function(function)) => {
                self.ctor_stack.push((class.clone(), None));
                let result = self.call_function(&function, new_args, loc);
                self.ctor_stack.pop();
                result?
            }

            Some(other) => self.call_object(other, new_args, loc)?,

            // Unreachable for classes rooted at `object`, which always
            // carries the default allocator.
            None => Object::Instance(InstanceObj::new(class.clone())),
        };

        if let Object::Instance(instance) = &created {
            if instance.class.derives_from(&class) {
                match class.resolve("__init__") {
                    Some(Object::Function(init)) => {
                        let mut init_args = Vec::with_capacity(args.len() + 1);
                        init_args.push(Object::Instance(instance.clone()));
                        init_args.extend(args);

                        self.ctor_stack.push((class.clone(), Some(instance.clone())));
                        let result = self.call_function(&init, init_args, loc);
                        self.ctor_stack.pop();

                        // Invoked for side effects only; the result is
                        // discarded.
                        let _ = result?;
                    }

                    Some(other) => {
                        return Err(self.raise(ExceptionObj::type_error(format!(
                            "'{}' object is not callable [line {}]",
                            other.type_name(),
                            loc.line
                        ))))
                    }

                    None => {}
                }
            }
        }

        Ok(created)
    }

    // ─────────────────────── attributes and indexing ────────────────────────

    /// Attribute read via the object model's resolution protocol.
    fn get_attribute(&self, object: &Object, name: &str, line: usize) -> EResult<Object> {
        let resolved = match object {
            Object::Instance(instance) => instance.get_attribute(name),

            // Class-level access yields the plain function, unbound.
            Object::Class(class) => class.resolve(name),

            Object::Super(proxy) => proxy.get_attribute(name),

            // Built-in values resolve through their class chain.
            other => self.builtins.class_of(other).resolve(name),
        };

        resolved.ok_or_else(|| {
            self.raise(ExceptionObj::attribute_error(format!(
                "'{}' object has no attribute '{}' [line {}]",
                object.type_name(),
                name,
                line
            )))
        })
    }

    fn index_get(&mut self, object: &Object, index: &Object, line: usize) -> EResult<Object> {
        match (object, index) {
            (Object::List(items), Object::Int(i)) => {
                let items = items.borrow();
                let idx = normalize_index(*i, items.len()).ok_or_else(|| {
                    self.raise(ExceptionObj::new(
                        ExceptionKind::IndexError,
                        format!("list index out of range [line {}]", line),
                    ))
                })?;

                Ok(items[idx].clone())
            }

            (Object::Str(s), Object::Int(i)) => {
                let chars: Vec<char> = s.chars().collect();
                let idx = normalize_index(*i, chars.len()).ok_or_else(|| {
                    self.raise(ExceptionObj::new(
                        ExceptionKind::IndexError,
                        format!("string index out of range [line {}]", line),
                    ))
                })?;

                Ok(Object::str(chars[idx].to_string()))
            }

            (Object::Dict(map), key) => {
                let key = key.as_dict_key().ok_or_else(|| {
                    self.raise(ExceptionObj::type_error(format!(
                        "unhashable type: '{}' [line {}]",
                        index.type_name(),
                        line
                    )))
                })?;

                map.borrow().get(&key).cloned().ok_or_else(|| {
                    self.raise(ExceptionObj::new(
                        ExceptionKind::KeyError,
                        format!("{} [line {}]", key.to_object().repr(), line),
                    ))
                })
            }

            _ => Err(self.raise(ExceptionObj::type_error(format!(
                "'{}' object is not subscriptable [line {}]",
                object.type_name(),
                line
            )))),
        }
    }

    /// Evaluate an assignment target's object/index subexpressions.  Both
    /// halves of an augmented assignment reuse the resulting handles, so
    /// side effects in the target run once and the read and the write hit
    /// the same objects.
    fn resolve_target(&mut self, target: &Target) -> EResult<Place> {
        Ok(match target {
            Target::Name(name) => Place::Name(name.clone()),

            Target::Attribute { object, name } => Place::Attribute {
                object: self.evaluate(object)?,
                name: name.clone(),
            },

            Target::Index { object, index } => Place::Index {
                object: self.evaluate(object)?,
                index: self.evaluate(index)?,
            },
        })
    }

    /// Read the current value at a resolved place, for augmented
    /// assignment.
    fn read_place(&mut self, place: &Place, line: usize) -> EResult<Object> {
        match place {
            Place::Name(name) => self.environment.borrow().get(name).ok_or_else(|| {
                self.raise(ExceptionObj::name_error(format!(
                    "name '{}' is not defined [line {}]",
                    name, line
                )))
            }),

            Place::Attribute { object, name } => self.get_attribute(object, name, line),

            Place::Index { object, index } => self.index_get(object, index, line),
        }
    }

    /// Bind a value at a resolved place.  Name writes land in the current
    /// scope only; attribute writes on an instance land in that instance's
    /// namespace, never the class's.
    fn write_place(&mut self, place: Place, value: Object, line: usize) -> EResult<()> {
        match place {
            Place::Name(name) => {
                self.environment.borrow_mut().define(&name, value);
                Ok(())
            }

            Place::Attribute { object, name } => match object {
                Object::Instance(instance) => {
                    instance.set_attribute(&name, value);
                    Ok(())
                }

                Object::Class(class) => {
                    class.set_attribute(&name, value);
                    Ok(())
                }

                other => Err(self.raise(ExceptionObj::type_error(format!(
                    "cannot set attribute '{}' on '{}' object [line {}]",
                    name,
                    other.type_name(),
                    line
                )))),
            },

            Place::Index { object, index } => self.index_set(&object, &index, value, line),
        }
    }

    fn index_set(
        &mut self,
        object: &Object,
        index: &Object,
        value: Object,
        line: usize,
    ) -> EResult<()> {
        match (object, index) {
            (Object::List(items), Object::Int(i)) => {
                let mut items = items.borrow_mut();
                let len = items.len();
                let idx = normalize_index(*i, len).ok_or_else(|| {
                    self.raise(ExceptionObj::new(
                        ExceptionKind::IndexError,
                        format!("list assignment index out of range [line {}]", line),
                    ))
                })?;

                items[idx] = value;
                Ok(())
            }

            (Object::Dict(map), key) => {
                let key = key.as_dict_key().ok_or_else(|| {
                    self.raise(ExceptionObj::type_error(format!(
                        "unhashable type: '{}' [line {}]",
                        index.type_name(),
                        line
                    )))
                })?;

                map.borrow_mut().insert(key, value);
                Ok(())
            }

            _ => Err(self.raise(ExceptionObj::type_error(format!(
                "'{}' object does not support item assignment [line {}]",
                object.type_name(),
                line
            )))),
        }
    }

    // ───────────────────────── binary operators ─────────────────────────────

    /// Dispatch a (non-short-circuit) binary operator on the runtime
    /// kinds of both operands.
    fn binary_op(&mut self, left: Object, op: BinOp, right: Object, line: usize) -> EResult<Object> {
        match op {
            BinOp::Add => match (&left, &right) {
                (Object::Int(a), Object::Int(b)) => self.checked_int(a.checked_add(*b), line),

                (Object::Str(a), Object::Str(b)) => {
                    let mut s = String::with_capacity(a.len() + b.len());
                    s.push_str(a);
                    s.push_str(b);
                    Ok(Object::str(s))
                }

                _ => Err(self.operand_type_error(op, &left, &right, line)),
            },

            BinOp::Sub => match (&left, &right) {
                (Object::Int(a), Object::Int(b)) => self.checked_int(a.checked_sub(*b), line),
                _ => Err(self.operand_type_error(op, &left, &right, line)),
            },

            BinOp::Mul => match (&left, &right) {
                (Object::Int(a), Object::Int(b)) => self.checked_int(a.checked_mul(*b), line),
                _ => Err(self.operand_type_error(op, &left, &right, line)),
            },

            BinOp::Div => match (&left, &right) {
                (Object::Int(a), Object::Int(b)) => {
                    if *b == 0 {
                        return Err(self.raise(ExceptionObj::new(
                            ExceptionKind::ZeroDivisionError,
                            format!("division by zero [line {}]", line),
                        )));
                    }

                    self.checked_int(a.checked_div(*b), line)
                }

                _ => Err(self.operand_type_error(op, &left, &right, line)),
            },

            BinOp::Lt => match (&left, &right) {
                (Object::Int(a), Object::Int(b)) => Ok(Object::Bool(a < b)),
                (Object::Str(a), Object::Str(b)) => Ok(Object::Bool(a < b)),
                _ => Err(self.operand_type_error(op, &left, &right, line)),
            },

            BinOp::Gt => match (&left, &right) {
                (Object::Int(a), Object::Int(b)) => Ok(Object::Bool(a > b)),
                (Object::Str(a), Object::Str(b)) => Ok(Object::Bool(a > b)),
                _ => Err(self.operand_type_error(op, &left, &right, line)),
            },

            BinOp::Eq => Ok(Object::Bool(left.eq_object(&right))),

            BinOp::And | BinOp::Or => {
                unreachable!("short-circuit operators are evaluated before dispatch")
            }
        }
    }

    fn checked_int(&self, value: Option<i64>, line: usize) -> EResult<Object> {
        value.map(Object::Int).ok_or_else(|| {
            self.raise(ExceptionObj::new(
                ExceptionKind::OverflowError,
                format!("integer result out of range [line {}]", line),
            ))
        })
    }

    fn operand_type_error(&self, op: BinOp, left: &Object, right: &Object, line: usize) -> Signal {
        self.raise(ExceptionObj::type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}' [line {}]",
            op.symbol(),
            left.type_name(),
            right.type_name(),
            line
        )))
    }

    // ─────────────────────────── raising ────────────────────────────────────

    /// Capture the current frame stack into a raised exception.
    fn raised(&self, exception: ExceptionObj) -> Raised {
        Raised::new(exception, self.frames.clone())
    }

    fn raise(&self, exception: ExceptionObj) -> Signal {
        Signal::Raise(self.raised(exception))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

/// Map a possibly-negative index onto `0..len`.
fn normalize_index(i: i64, len: usize) -> Option<usize> {
    let idx = if i < 0 { i + len as i64 } else { i };

    if idx >= 0 && (idx as usize) < len {
        Some(idx as usize)
    } else {
        None
    }
}
