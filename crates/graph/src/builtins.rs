use std::collections::HashSet;

/// Names in Python's `builtins` namespace: functions, types and exceptions.
///
/// Calls whose short name is in this set (and whose receiver was not imported) are not
/// turned into external nodes. Methods of built-in types are not included, so
/// `client.get(url)` stays an external call.
#[derive(Debug, Clone)]
pub struct BuiltinNames {
    names: HashSet<&'static str>,
}

impl BuiltinNames {
    pub fn python() -> Self {
        let names = FUNCTIONS
            .iter()
            .chain(TYPES)
            .chain(EXCEPTIONS)
            .copied()
            .collect();
        Self { names }
    }

    pub fn empty() -> Self {
        Self {
            names: HashSet::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for BuiltinNames {
    fn default() -> Self {
        Self::python()
    }
}

const FUNCTIONS: &[&str] = &[
    "abs", "aiter", "all", "anext", "any", "ascii", "bin", "breakpoint", "callable", "chr",
    "compile", "delattr", "dir", "divmod", "enumerate", "eval", "exec", "filter", "format",
    "getattr", "globals", "hasattr", "hash", "help", "hex", "id", "input", "isinstance",
    "issubclass", "iter", "len", "locals", "map", "max", "min", "next", "oct", "open", "ord",
    "pow", "print", "repr", "reversed", "round", "setattr", "sorted", "sum", "super", "vars",
    "zip", "__import__", "exit", "quit",
];

const TYPES: &[&str] = &[
    "bool", "bytearray", "bytes", "classmethod", "complex", "dict", "float", "frozenset", "int",
    "list", "memoryview", "object", "property", "range", "set", "slice", "staticmethod", "str",
    "tuple", "type", "NotImplemented", "Ellipsis",
];

const EXCEPTIONS: &[&str] = &[
    "ArithmeticError", "AssertionError", "AttributeError", "BaseException",
    "BlockingIOError", "BrokenPipeError", "BufferError", "ChildProcessError",
    "ConnectionAbortedError", "ConnectionError", "ConnectionRefusedError",
    "ConnectionResetError", "DeprecationWarning", "EOFError", "EnvironmentError", "Exception",
    "FileExistsError", "FileNotFoundError", "FloatingPointError", "GeneratorExit", "IOError",
    "ImportError", "IndentationError", "IndexError", "InterruptedError", "IsADirectoryError",
    "KeyError", "KeyboardInterrupt", "LookupError", "MemoryError", "ModuleNotFoundError",
    "NameError", "NotADirectoryError", "NotImplementedError", "OSError", "OverflowError",
    "PermissionError", "ProcessLookupError", "RecursionError", "ReferenceError",
    "RuntimeError", "RuntimeWarning", "StopAsyncIteration", "StopIteration", "SyntaxError",
    "SystemError", "SystemExit", "TabError", "TimeoutError", "TypeError", "UnboundLocalError",
    "UnicodeDecodeError", "UnicodeEncodeError", "UnicodeError", "UserWarning", "ValueError",
    "Warning", "ZeroDivisionError",
];
