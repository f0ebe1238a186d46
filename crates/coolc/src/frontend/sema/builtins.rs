//! Built-in classes supplied by the runtime

use crate::types::names;

/// File name reported for built-in classes
pub const BUILTIN_FILE: &str = "<basic class>";

/// A built-in method signature
#[derive(Debug, Clone, Copy)]
pub struct BuiltinMethod {
    pub name: &'static str,
    /// (formal name, formal type)
    pub formals: &'static [(&'static str, &'static str)],
    pub return_type: &'static str,
}

/// A built-in class
#[derive(Debug, Clone, Copy)]
pub struct BuiltinClass {
    pub name: &'static str,
    /// `None` only for Object
    pub parent: Option<&'static str>,
    pub methods: &'static [BuiltinMethod],
}

const fn method(
    name: &'static str,
    formals: &'static [(&'static str, &'static str)],
    return_type: &'static str,
) -> BuiltinMethod {
    BuiltinMethod { name, formals, return_type }
}

const OBJECT_METHODS: &[BuiltinMethod] = &[
    method("abort", &[], names::OBJECT),
    method("type_name", &[], names::STRING),
    method("copy", &[], names::SELF_TYPE),
];

const IO_METHODS: &[BuiltinMethod] = &[
    method("out_string", &[("x", names::STRING)], names::SELF_TYPE),
    method("out_int", &[("x", names::INT)], names::SELF_TYPE),
    method("in_string", &[], names::STRING),
    method("in_int", &[], names::INT),
];

const STRING_METHODS: &[BuiltinMethod] = &[
    method("length", &[], names::INT),
    method("concat", &[("s", names::STRING)], names::STRING),
    method("substr", &[("i", names::INT), ("l", names::INT)], names::STRING),
];

/// Built-in classes, parents before children
pub const BUILTINS: &[BuiltinClass] = &[
    BuiltinClass { name: names::OBJECT, parent: None, methods: OBJECT_METHODS },
    BuiltinClass { name: names::IO, parent: Some(names::OBJECT), methods: IO_METHODS },
    BuiltinClass { name: names::INT, parent: Some(names::OBJECT), methods: &[] },
    BuiltinClass { name: names::BOOL, parent: Some(names::OBJECT), methods: &[] },
    BuiltinClass { name: names::STRING, parent: Some(names::OBJECT), methods: STRING_METHODS },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_name_is_present() {
        for name in names::BUILTIN_CLASSES {
            assert!(BUILTINS.iter().any(|c| c.name == name), "missing {}", name);
        }
    }

    #[test]
    fn test_parents_precede_children() {
        for (i, class) in BUILTINS.iter().enumerate() {
            if let Some(parent) = class.parent {
                let pos = BUILTINS.iter().position(|c| c.name == parent).unwrap();
                assert!(pos < i);
            }
        }
    }
}
