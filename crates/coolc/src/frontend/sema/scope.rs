//! Lexical environments for identifier lookup

use super::class_table::ClassTable;
use super::features::FeatureTable;
use crate::types::{names, Type};
use std::collections::HashMap;

/// Stack of identifier → type frames
///
/// The outermost frame holds the attributes visible in the enclosing class.
/// `self` is never stored: it always resolves to `SELF_TYPE`.
#[derive(Debug)]
pub struct Scope {
    frames: Vec<HashMap<String, Type>>,
}

impl Scope {
    pub fn new() -> Self {
        Self { frames: vec![HashMap::new()] }
    }

    /// Scope whose base frame holds every attribute of `class` and its ancestors
    pub fn for_class(class: &str, classes: &ClassTable, features: &FeatureTable) -> Self {
        let mut scope = Self::new();
        for attr in features.visible_attributes(classes, class) {
            scope.declare(&attr.name, attr.ty.clone());
        }
        scope
    }

    pub fn push_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Leave the innermost scope; the class frame is never popped
    pub fn pop_scope(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Bind `name` in the innermost scope, shadowing outer bindings
    ///
    /// Returns false, binding nothing, for `self`.
    pub fn declare(&mut self, name: &str, ty: Type) -> bool {
        if name == names::SELF {
            return false;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), ty);
        }
        true
    }

    /// True if `name` is already bound in the innermost scope
    pub fn declared_locally(&self, name: &str) -> bool {
        self.frames.last().is_some_and(|frame| frame.contains_key(name))
    }

    /// Innermost binding of `name`
    pub fn lookup(&self, name: &str) -> Option<Type> {
        if name == names::SELF {
            return Some(Type::SelfType);
        }
        self.frames.iter().rev().find_map(|frame| frame.get(name).cloned())
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
