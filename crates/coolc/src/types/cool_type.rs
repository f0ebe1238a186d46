//! Cool static types

use std::fmt;

/// Names with fixed meaning in every Cool program
pub mod names {
    pub const OBJECT: &str = "Object";
    pub const IO: &str = "IO";
    pub const INT: &str = "Int";
    pub const STRING: &str = "String";
    pub const BOOL: &str = "Bool";
    pub const SELF_TYPE: &str = "SELF_TYPE";
    pub const MAIN: &str = "Main";

    pub const SELF: &str = "self";
    pub const MAIN_METHOD: &str = "main";

    /// Classes supplied by the runtime
    pub const BUILTIN_CLASSES: [&str; 5] = [OBJECT, IO, INT, STRING, BOOL];

    /// Value classes that cannot be inherited from and compare by value
    pub const PRIMITIVES: [&str; 3] = [INT, STRING, BOOL];
}

/// A static type: a class name or `SELF_TYPE` of the enclosing class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Class(String),
    SelfType,
}

impl Type {
    /// Type for a name written in source, mapping `SELF_TYPE` to the marker
    pub fn from_name(name: &str) -> Self {
        if name == names::SELF_TYPE {
            Type::SelfType
        } else {
            Type::Class(name.to_string())
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Type::Class(name.into())
    }

    pub fn object() -> Self {
        Type::class(names::OBJECT)
    }

    pub fn int() -> Self {
        Type::class(names::INT)
    }

    pub fn string() -> Self {
        Type::class(names::STRING)
    }

    pub fn bool() -> Self {
        Type::class(names::BOOL)
    }

    pub fn is_self_type(&self) -> bool {
        matches!(self, Type::SelfType)
    }

    /// True if this is the class `name`
    pub fn is(&self, name: &str) -> bool {
        matches!(self, Type::Class(c) if c == name)
    }

    /// True for Int, String and Bool
    pub fn is_primitive(&self) -> bool {
        match self {
            Type::Class(c) => names::PRIMITIVES.contains(&c.as_str()),
            Type::SelfType => false,
        }
    }

    /// Class name with `SELF_TYPE` replaced by `enclosing`
    pub fn resolve<'a>(&'a self, enclosing: &'a str) -> &'a str {
        match self {
            Type::Class(c) => c,
            Type::SelfType => enclosing,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Type::Class(c) => c,
            Type::SelfType => names::SELF_TYPE,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Type::from_name("SELF_TYPE"), Type::SelfType);
        assert_eq!(Type::from_name("Foo"), Type::class("Foo"));
    }

    #[test]
    fn test_primitives() {
        assert!(Type::int().is_primitive());
        assert!(Type::string().is_primitive());
        assert!(Type::bool().is_primitive());
        assert!(!Type::object().is_primitive());
        assert!(!Type::SelfType.is_primitive());
    }

    #[test]
    fn test_resolve_and_display() {
        assert_eq!(Type::SelfType.resolve("Main"), "Main");
        assert_eq!(Type::class("A").resolve("Main"), "A");
        assert_eq!(Type::SelfType.to_string(), "SELF_TYPE");
    }
}
