#[cfg(test)]
mod interpreter_tests {
    use minipy::error::Raised;
    use minipy::interpreter::Interpreter;
    use minipy::object::{ExceptionKind, Object};
    use minipy::parser::Parser;
    use minipy::scanner::Scanner;

    fn feed(interpreter: &mut Interpreter, source: &str) -> Result<(), Raised> {
        let tokens = Scanner::new(source.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .expect("lex error");

        let statements = Parser::new(tokens, source).parse().expect("parse error");

        interpreter.interpret(&statements)
    }

    /// Run a program to completion, panicking on any uncaught exception.
    fn run(source: &str) -> Interpreter {
        let mut interpreter = Interpreter::new();

        if let Err(raised) = feed(&mut interpreter, source) {
            panic!("unexpected exception: {}", raised);
        }

        interpreter
    }

    /// Run a program that must terminate with an uncaught exception.
    fn run_err(source: &str) -> Raised {
        let mut interpreter = Interpreter::new();

        feed(&mut interpreter, source).expect_err("expected an uncaught exception")
    }

    fn global(interpreter: &Interpreter, name: &str) -> Object {
        interpreter
            .get_global(name)
            .unwrap_or_else(|| panic!("name '{}' not bound at top level", name))
    }

    fn global_int(interpreter: &Interpreter, name: &str) -> i64 {
        match global(interpreter, name) {
            Object::Int(n) => n,
            other => panic!("expected '{}' to be an int, got {:?}", name, other),
        }
    }

    fn global_str(interpreter: &Interpreter, name: &str) -> String {
        match global(interpreter, name) {
            Object::Str(s) => s.as_ref().clone(),
            other => panic!("expected '{}' to be a str, got {:?}", name, other),
        }
    }

    fn global_bool(interpreter: &Interpreter, name: &str) -> bool {
        match global(interpreter, name) {
            Object::Bool(b) => b,
            other => panic!("expected '{}' to be a bool, got {:?}", name, other),
        }
    }

    // ───────────────────────── arithmetic and strings ─────────────────────────

    #[test]
    fn test_integer_arithmetic() {
        let interp = run("\
a = 2 + 3 * 4
b = 10 - 4
c = 7 / 2
d = -5
e = 2 - -3
f = -(1 + 2)
");

        assert_eq!(global_int(&interp, "a"), 14);
        assert_eq!(global_int(&interp, "b"), 6);
        assert_eq!(global_int(&interp, "c"), 3); // truncating division
        assert_eq!(global_int(&interp, "d"), -5);
        assert_eq!(global_int(&interp, "e"), 5);
        assert_eq!(global_int(&interp, "f"), -3);
    }

    #[test]
    fn test_division_by_zero_raises() {
        let raised = run_err("x = 1 / 0\n");
        assert_eq!(raised.exception.kind, ExceptionKind::ZeroDivisionError);
    }

    #[test]
    fn test_integer_overflow_raises() {
        let raised = run_err("x = 9223372036854775807 + 1\n");
        assert_eq!(raised.exception.kind, ExceptionKind::OverflowError);
    }

    #[test]
    fn test_string_concatenation() {
        let interp = run("s = 'foo' + 'bar'\n");
        assert_eq!(global_str(&interp, "s"), "foobar");
    }

    #[test]
    fn test_string_plus_int_raises_type_error() {
        let raised = run_err("s = 'foo' + 1\n");
        assert_eq!(raised.exception.kind, ExceptionKind::TypeError);
    }

    #[test]
    fn test_comparisons() {
        let interp = run("\
a = 1 < 2
b = 2 > 3
c = 'abc' < 'abd'
d = 1 == 1
e = 1 == 'one'
f = [1, 2] == [1, 2]
");

        assert!(global_bool(&interp, "a"));
        assert!(!global_bool(&interp, "b"));
        assert!(global_bool(&interp, "c"));
        assert!(global_bool(&interp, "d"));
        assert!(!global_bool(&interp, "e")); // mixed kinds compare unequal, never raise
        assert!(global_bool(&interp, "f")); // deep structural equality
    }

    #[test]
    fn test_ordering_mixed_kinds_raises() {
        let raised = run_err("x = 1 < 'a'\n");
        assert_eq!(raised.exception.kind, ExceptionKind::TypeError);
    }

    #[test]
    fn test_logical_operators_return_deciding_operand() {
        let interp = run("\
a = 0 or 'fallback'
b = 'first' and 'second'
c = None and 1
d = not ''
");

        assert_eq!(global_str(&interp, "a"), "fallback");
        assert_eq!(global_str(&interp, "b"), "second");
        assert!(matches!(global(&interp, "c"), Object::None));
        assert!(global_bool(&interp, "d"));
    }

    #[test]
    fn test_short_circuit_skips_right_operand() {
        // The right operand would raise if evaluated.
        let interp = run("x = 0 and undefined_name\n");
        assert_eq!(global_int(&interp, "x"), 0);
    }

    // ───────────────────────── control flow ─────────────────────────

    #[test]
    fn test_while_accumulates() {
        let interp = run("\
i = 0
total = 0
while i < 10:
    total += i
    i += 1
");

        assert_eq!(global_int(&interp, "total"), 45);
        assert_eq!(global_int(&interp, "i"), 10);
    }

    #[test]
    fn test_if_elif_else_selects_first_true_branch() {
        let interp = run("\
x = 1
if x == 1:
    r = 'first'
elif x == 1:
    r = 'second'
else:
    r = 'third'
");

        assert_eq!(global_str(&interp, "r"), "first");
    }

    #[test]
    fn test_else_runs_when_all_conditions_falsy() {
        let interp = run("\
if 0:
    r = 'a'
elif '':
    r = 'b'
else:
    r = 'c'
");

        assert_eq!(global_str(&interp, "r"), "c");
    }

    // ───────────────────────── functions and scoping ─────────────────────────

    #[test]
    fn test_function_call_and_implicit_none() {
        let interp = run("\
def double(n):
    return n * 2

def nothing():
    pass

a = double(21)
b = nothing()
");

        assert_eq!(global_int(&interp, "a"), 42);
        assert!(matches!(global(&interp, "b"), Object::None));
    }

    #[test]
    fn test_closures_capture_defining_environment() {
        let interp = run("\
def outer():
    x = 1
    def inner():
        return x
    return inner

f = outer()
x = 99
r = f()
");

        assert_eq!(global_int(&interp, "r"), 1);
    }

    #[test]
    fn test_assignment_shadows_instead_of_mutating_outer_scope() {
        let interp = run("\
x = 1
def f():
    x = 2
    return x

y = f()
");

        assert_eq!(global_int(&interp, "y"), 2);
        assert_eq!(global_int(&interp, "x"), 1);
    }

    #[test]
    fn test_return_unwinds_past_control_flow() {
        let interp = run("\
def find(limit):
    i = 0
    while i < limit:
        if i == 3:
            return i
        i += 1
    return -1

r = find(10)
");

        assert_eq!(global_int(&interp, "r"), 3);
    }

    #[test]
    fn test_arity_mismatch_raises_type_error() {
        let raised = run_err("\
def f(a, b):
    return a

f(1)
");

        assert_eq!(raised.exception.kind, ExceptionKind::TypeError);
    }

    #[test]
    fn test_return_outside_function_raises_type_error() {
        let raised = run_err("return 1\n");
        assert_eq!(raised.exception.kind, ExceptionKind::TypeError);
    }

    #[test]
    fn test_name_error_on_undefined_identifier() {
        let raised = run_err("x = nope\n");
        assert_eq!(raised.exception.kind, ExceptionKind::NameError);
    }

    // ───────────────────────── classes and instances ─────────────────────────

    #[test]
    fn test_instance_attribute_shadows_class_attribute() {
        let interp = run("\
class C:
    x = 1

c = C()
before = c.x
c.x = 2
after = c.x
class_level = C.x
");

        assert_eq!(global_int(&interp, "before"), 1);
        assert_eq!(global_int(&interp, "after"), 2);
        assert_eq!(global_int(&interp, "class_level"), 1);
    }

    #[test]
    fn test_method_call_sums_fields() {
        let interp = run("\
class C:
    def __init__(self):
        self.a = 1
        self.b = 2
        self.c = 3
    def total(self):
        return self.a + self.b + self.c

r = C().total()
");

        assert_eq!(global_int(&interp, "r"), 6);
    }

    #[test]
    fn test_explicit_base_init_call() {
        let interp = run("\
class Base:
    def __init__(self, a):
        self.a = a

class Foo(Base):
    def __init__(self, a, b):
        Base.__init__(self, a)
        self.b = b

foo = Foo(1, 2)
x = foo.a
y = foo.b
");

        assert_eq!(global_int(&interp, "x"), 1);
        assert_eq!(global_int(&interp, "y"), 2);
    }

    #[test]
    fn test_inherited_init() {
        let interp = run("\
class Base:
    def __init__(self, a):
        self.a = a

class Derived(Base):
    pass

d = Derived(7)
r = d.a
");

        assert_eq!(global_int(&interp, "r"), 7);
    }

    #[test]
    fn test_method_override() {
        let interp = run("\
class Base:
    def greet(self):
        return 'base'

class Derived(Base):
    def greet(self):
        return 'derived'

r = Derived().greet()
");

        assert_eq!(global_str(&interp, "r"), "derived");
    }

    #[test]
    fn test_zero_arg_super_resolves_to_base_method() {
        let interp = run("\
class Base:
    def greet(self):
        return 'base'

class Derived(Base):
    def greet(self):
        return 'derived'
    def __init__(self):
        self.result = super().greet()

r = Derived().result
");

        assert_eq!(global_str(&interp, "r"), "base");
    }

    #[test]
    fn test_one_arg_super_resolves_to_base_method() {
        let interp = run("\
class Base:
    def name(self):
        return 'base'

class Derived(Base):
    def name(self):
        return 'derived'
    def parent_name(self):
        return super(self).name()

r = Derived().parent_name()
");

        assert_eq!(global_str(&interp, "r"), "base");
    }

    #[test]
    fn test_zero_arg_super_outside_instantiation_raises() {
        let raised = run_err("\
class C:
    def m(self):
        return super().m()

c = C()
c.m()
");

        assert_eq!(raised.exception.kind, ExceptionKind::TypeError);
    }

    #[test]
    fn test_new_override_via_object_new() {
        let interp = run("\
class Foo:
    def __new__(cls, a):
        return object.__new__(cls)
    def __init__(self, a):
        self.a = a

r = Foo(1).a
");

        assert_eq!(global_int(&interp, "r"), 1);
    }

    #[test]
    fn test_new_returning_foreign_value_skips_init() {
        // When __new__ does not produce an instance of the class, __init__
        // must not run.
        let interp = run("\
class Foo:
    def __new__(cls):
        return 42
    def __init__(self):
        self.a = 1

r = Foo()
");

        assert_eq!(global_int(&interp, "r"), 42);
    }

    #[test]
    fn test_missing_attribute_raises_attribute_error() {
        let raised = run_err("\
class C:
    pass

c = C()
c.missing
");

        assert_eq!(raised.exception.kind, ExceptionKind::AttributeError);
    }

    #[test]
    fn test_instance_identity_equality() {
        let interp = run("\
class C:
    pass

a = C()
b = a
c = C()
same = a == b
different = a == c
");

        assert!(global_bool(&interp, "same"));
        assert!(!global_bool(&interp, "different"));
    }

    #[test]
    fn test_class_attribute_write_visible_through_instances() {
        let interp = run("\
class C:
    pass

c = C()
C.shared = 5
r = c.shared
");

        assert_eq!(global_int(&interp, "r"), 5);
    }

    #[test]
    fn test_augmented_assignment_on_attribute() {
        let interp = run("\
class Counter:
    def __init__(self):
        self.count = 0

c = Counter()
c.count += 3
c.count += 4
r = c.count
");

        assert_eq!(global_int(&interp, "r"), 7);
    }

    #[test]
    fn test_augmented_assignment_evaluates_target_object_once() {
        // A side-effecting callee in the target must run once, and the
        // read and the write must hit the same object.
        let interp = run("\
state = {'calls': 0}

class Box:
    def __init__(self):
        self.x = 10

box = Box()

def get_box():
    state['calls'] = state['calls'] + 1
    return box

get_box().x += 5
calls = state['calls']
result = box.x
");

        assert_eq!(global_int(&interp, "calls"), 1);
        assert_eq!(global_int(&interp, "result"), 15);
    }

    #[test]
    fn test_augmented_assignment_evaluates_index_once() {
        let interp = run("\
state = {'calls': 0}
xs = [1, 2, 3]

def index():
    state['calls'] = state['calls'] + 1
    return 1

xs[index()] += 10
calls = state['calls']
result = xs[1]
");

        assert_eq!(global_int(&interp, "calls"), 1);
        assert_eq!(global_int(&interp, "result"), 12);
    }

    // ───────────────────────── containers and indexing ─────────────────────────

    #[test]
    fn test_list_indexing_and_assignment() {
        let interp = run("\
xs = [10, 20, 30]
a = xs[0]
b = xs[-1]
xs[1] = 99
c = xs[1]
n = len(xs)
");

        assert_eq!(global_int(&interp, "a"), 10);
        assert_eq!(global_int(&interp, "b"), 30);
        assert_eq!(global_int(&interp, "c"), 99);
        assert_eq!(global_int(&interp, "n"), 3);
    }

    #[test]
    fn test_list_index_out_of_range_raises() {
        let raised = run_err("x = [1, 2][5]\n");
        assert_eq!(raised.exception.kind, ExceptionKind::IndexError);
    }

    #[test]
    fn test_string_indexing() {
        let interp = run("\
s = 'abc'
a = s[0]
b = s[-1]
");

        assert_eq!(global_str(&interp, "a"), "a");
        assert_eq!(global_str(&interp, "b"), "c");
    }

    #[test]
    fn test_dict_literal_index_and_assignment() {
        let interp = run("\
d = {'one': 1, 2: 'two'}
a = d['one']
b = d[2]
d['three'] = 3
c = d['three']
n = len(d)
");

        assert_eq!(global_int(&interp, "a"), 1);
        assert_eq!(global_str(&interp, "b"), "two");
        assert_eq!(global_int(&interp, "c"), 3);
        assert_eq!(global_int(&interp, "n"), 3);
    }

    #[test]
    fn test_dict_missing_key_raises_key_error() {
        let raised = run_err("x = {}['nope']\n");
        assert_eq!(raised.exception.kind, ExceptionKind::KeyError);
    }

    #[test]
    fn test_unhashable_dict_key_raises_type_error() {
        let raised = run_err("\
d = {}
d[[1, 2]] = 3
");

        assert_eq!(raised.exception.kind, ExceptionKind::TypeError);
    }

    #[test]
    fn test_iter_and_next() {
        let interp = run("\
it = iter([7, 8])
a = next(it)
b = next(it)
");

        assert_eq!(global_int(&interp, "a"), 7);
        assert_eq!(global_int(&interp, "b"), 8);
    }

    #[test]
    fn test_exhausted_iterator_raises_stop_iteration() {
        let raised = run_err("\
it = iter([1])
next(it)
next(it)
");

        assert_eq!(raised.exception.kind, ExceptionKind::StopIteration);
    }

    #[test]
    fn test_range_builtin() {
        let interp = run("\
a = len(range(5))
b = range(2, 5)[0]
");

        assert_eq!(global_int(&interp, "a"), 5);
        assert_eq!(global_int(&interp, "b"), 2);
    }

    // ───────────────────────── built-in constructors ─────────────────────────

    #[test]
    fn test_builtin_coercions() {
        let interp = run("\
a = int('42')
b = int()
c = int(True)
d = str(12)
e = str()
f = bool(0)
g = bool('x')
h = len(list('ab'))
");

        assert_eq!(global_int(&interp, "a"), 42);
        assert_eq!(global_int(&interp, "b"), 0);
        assert_eq!(global_int(&interp, "c"), 1);
        assert_eq!(global_str(&interp, "d"), "12");
        assert_eq!(global_str(&interp, "e"), "");
        assert!(!global_bool(&interp, "f"));
        assert!(global_bool(&interp, "g"));
        assert_eq!(global_int(&interp, "h"), 2);
    }

    #[test]
    fn test_int_of_bad_literal_raises_type_error() {
        let raised = run_err("x = int('forty-two')\n");
        assert_eq!(raised.exception.kind, ExceptionKind::TypeError);
    }

    #[test]
    fn test_type_builtin_reports_class() {
        let interp = run("\
a = type(1) == int
b = type('s') == str
c = type(type) == type
d = type(True) == bool
");

        assert!(global_bool(&interp, "a"));
        assert!(global_bool(&interp, "b"));
        assert!(global_bool(&interp, "c"));
        assert!(global_bool(&interp, "d"));
    }

    #[test]
    fn test_isinstance_walks_base_chain() {
        let interp = run("\
class Base:
    pass

class Derived(Base):
    pass

d = Derived()
a = isinstance(d, Derived)
b = isinstance(d, Base)
c = isinstance(d, object)
e = isinstance(1, Base)
f = isinstance(True, int)
");

        assert!(global_bool(&interp, "a"));
        assert!(global_bool(&interp, "b"));
        assert!(global_bool(&interp, "c"));
        assert!(!global_bool(&interp, "e"));
        assert!(global_bool(&interp, "f")); // bool derives from int
    }

    #[test]
    fn test_exception_constructor_builds_exception_values() {
        let interp = run("\
e = Exception('boom')
a = isinstance(e, Exception)
b = str(e)
c = repr(e)
d = type(e) == Exception
same = e == e
other = e == Exception('boom')
");

        assert!(global_bool(&interp, "a"));
        assert_eq!(global_str(&interp, "b"), "boom");
        assert_eq!(global_str(&interp, "c"), "Exception('boom')");
        assert!(global_bool(&interp, "d"));
        assert!(global_bool(&interp, "same"));
        assert!(!global_bool(&interp, "other")); // referential identity
    }

    #[test]
    fn test_repr_and_hash_builtins() {
        let interp = run("\
a = repr('hi')
b = repr([1, 'two'])
c = hash(42)
d = hash(True)
");

        assert_eq!(global_str(&interp, "a"), "'hi'");
        assert_eq!(global_str(&interp, "b"), "[1, 'two']");
        assert_eq!(global_int(&interp, "c"), 42);
        assert_eq!(global_int(&interp, "d"), 1);
    }

    // ───────────────────────── tracebacks ─────────────────────────

    #[test]
    fn test_traceback_records_call_boundaries() {
        let raised = run_err("\
def inner():
    return 1 / 0

def outer():
    return inner()

outer()
");

        assert_eq!(raised.exception.kind, ExceptionKind::ZeroDivisionError);

        // Statement boundary, the outer() call, the inner() call.
        assert_eq!(raised.traceback.len(), 3);
        assert_eq!(raised.traceback[0].line, 7);
        assert_eq!(raised.traceback[1].line, 7);
        assert_eq!(raised.traceback[2].line, 5);
        assert_eq!(raised.traceback[2].text.trim(), "return inner()");
    }

    #[test]
    fn test_traceback_for_top_level_statement() {
        let raised = run_err("\
x = 1
y = x / 0
");

        assert_eq!(raised.exception.kind, ExceptionKind::ZeroDivisionError);
        assert_eq!(raised.traceback.len(), 1);
        assert_eq!(raised.traceback[0].line, 2);
        assert_eq!(raised.traceback[0].text, "y = x / 0");
    }
}
