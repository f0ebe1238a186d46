//! Conformance and least upper bound over the class hierarchy

use super::class_table::ClassTable;
use crate::types::{names, Type};
use std::collections::HashSet;
use thiserror::Error;

/// A type query named a class that is not in the table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Undefined type {0}.")]
pub struct UndefinedType(pub String);

/// Subtyping queries answered against a [`ClassTable`]
///
/// Classes that are declared but unresolved (on or below a broken ancestor
/// chain) conform to everything and join to Object, so a structural error
/// does not cascade into type errors elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct TypeLattice<'a> {
    classes: &'a ClassTable,
}

impl<'a> TypeLattice<'a> {
    pub fn new(classes: &'a ClassTable) -> Self {
        Self { classes }
    }

    fn known<'n>(&self, name: &'n str) -> Result<&'n str, UndefinedType> {
        if self.classes.contains(name) {
            Ok(name)
        } else {
            Err(UndefinedType(name.to_string()))
        }
    }

    /// `sub <= sup` with `SELF_TYPE` standing for a subtype of `enclosing`
    pub fn conforms(&self, sub: &Type, sup: &Type, enclosing: &str) -> Result<bool, UndefinedType> {
        let sup_name = match (sub, sup) {
            (Type::SelfType, Type::SelfType) => return Ok(true),
            (Type::Class(c), Type::SelfType) => {
                self.known(c)?;
                return Ok(false);
            }
            (_, Type::Class(c)) => self.known(c)?,
        };
        let sub_name = self.known(sub.resolve(enclosing))?;

        if !self.classes.is_resolved(sub_name) || !self.classes.is_resolved(sup_name) {
            return Ok(true);
        }
        Ok(self.classes.ancestors(sub_name).any(|c| c.name == sup_name))
    }

    /// The most specific common ancestor of `a` and `b`
    pub fn lub(&self, a: &Type, b: &Type, enclosing: &str) -> Result<Type, UndefinedType> {
        if a.is_self_type() && b.is_self_type() {
            return Ok(Type::SelfType);
        }
        let a_name = self.known(a.resolve(enclosing))?;
        let b_name = self.known(b.resolve(enclosing))?;

        if !self.classes.is_resolved(a_name) || !self.classes.is_resolved(b_name) {
            return Ok(Type::object());
        }

        let a_chain: HashSet<&str> = self.classes.ancestors(a_name).map(|c| c.name.as_str()).collect();
        let common = self
            .classes
            .ancestors(b_name)
            .find(|c| a_chain.contains(c.name.as_str()))
            .map_or(names::OBJECT, |c| c.name.as_str());
        Ok(Type::class(common))
    }
}
