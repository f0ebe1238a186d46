//! Inheritance graph construction and validation

use super::builtins::{BUILTINS, BUILTIN_FILE};
use super::diagnostics::{Diagnostic, Diagnostics, ErrorKind};
use crate::common::Span;
use crate::frontend::ast::{ClassDecl, Program};
use crate::types::names;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Where a class was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassOrigin {
    Builtin,
    /// Index into `Program::classes`
    User(usize),
}

/// A node of the inheritance graph
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    /// `None` only for Object
    pub parent: Option<String>,
    pub file: String,
    pub span: Span,
    pub origin: ClassOrigin,
}

impl ClassInfo {
    pub fn is_builtin(&self) -> bool {
        self.origin == ClassOrigin::Builtin
    }
}

/// Cycle detection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// The validated class hierarchy
///
/// Built once by [`ClassTable::build`] and read-only afterwards. Classes on
/// an inheritance cycle, with an illegal or undefined parent, or descending
/// from such a class stay in the table but are marked unresolved.
#[derive(Debug, Default)]
pub struct ClassTable {
    classes: HashMap<String, ClassInfo>,
    /// Built-ins, then accepted user classes in declaration order
    order: Vec<String>,
    unresolved: HashSet<String>,
}

impl ClassTable {
    /// Table holding only the built-in classes
    pub fn with_builtins() -> Self {
        let mut table = Self::default();
        for builtin in BUILTINS {
            table.insert(ClassInfo {
                name: builtin.name.to_string(),
                parent: builtin.parent.map(str::to_string),
                file: BUILTIN_FILE.to_string(),
                span: Span::default(),
                origin: ClassOrigin::Builtin,
            });
        }
        table
    }

    /// Build the inheritance graph for `program`, recording structural errors
    pub fn build(program: &Program, diagnostics: &mut Diagnostics) -> Self {
        let mut table = Self::with_builtins();

        for (index, class) in program.classes.iter().enumerate() {
            table.declare(index, class, diagnostics);
        }
        table.check_parents_defined(diagnostics);
        table.check_main(program, diagnostics);
        table.detect_cycles(diagnostics);

        debug!(
            classes = table.order.len(),
            unresolved = table.unresolved.len(),
            "built class table"
        );
        table
    }

    fn insert(&mut self, info: ClassInfo) {
        self.order.push(info.name.clone());
        self.classes.insert(info.name.clone(), info);
    }

    fn declare(&mut self, index: usize, class: &ClassDecl, diagnostics: &mut Diagnostics) {
        let structural = |message: String| {
            Diagnostic::error(ErrorKind::Structural, message).at(&class.file, class.span)
        };

        if names::BUILTIN_CLASSES.contains(&class.name.as_str()) || class.name == names::SELF_TYPE {
            diagnostics.push(structural(format!("Redefinition of basic class {}.", class.name)));
            return;
        }
        if self.classes.contains_key(&class.name) {
            diagnostics.push(structural(format!("Class {} was previously defined.", class.name)));
            return;
        }

        let illegal_parent = names::PRIMITIVES.contains(&class.parent.as_str())
            || class.parent == names::SELF_TYPE;
        if illegal_parent {
            diagnostics.push(structural(format!(
                "Class {} cannot inherit class {}.",
                class.name, class.parent
            )));
            self.unresolved.insert(class.name.clone());
        }

        self.insert(ClassInfo {
            name: class.name.clone(),
            parent: Some(class.parent.clone()),
            file: class.file.clone(),
            span: class.span,
            origin: ClassOrigin::User(index),
        });
    }

    fn check_parents_defined(&mut self, diagnostics: &mut Diagnostics) {
        for name in &self.order {
            let Some(info) = self.classes.get(name) else { continue };
            let Some(parent) = &info.parent else { continue };
            if self.unresolved.contains(name) || self.classes.contains_key(parent) {
                continue;
            }
            diagnostics.report(
                ErrorKind::Structural,
                &info.file,
                info.span,
                format!("Class {} inherits from an undefined class {}.", name, parent),
            );
            self.unresolved.insert(name.clone());
        }
    }

    fn check_main(&self, program: &Program, diagnostics: &mut Diagnostics) {
        let main = self
            .classes
            .get(names::MAIN)
            .and_then(|info| match info.origin {
                ClassOrigin::User(index) => program.classes.get(index),
                ClassOrigin::Builtin => None,
            });

        let Some(main) = main else {
            diagnostics.push(Diagnostic::error(ErrorKind::Structural, "Class Main is not defined."));
            return;
        };

        match main.methods().find(|m| m.name == names::MAIN_METHOD) {
            None => diagnostics.report(
                ErrorKind::Structural,
                &main.file,
                main.span,
                "No 'main' method in class Main.",
            ),
            Some(method) if !method.formals.is_empty() => diagnostics.report(
                ErrorKind::Structural,
                &main.file,
                method.span,
                "'main' method in class Main should have no arguments.",
            ),
            Some(_) => {}
        }
    }

    /// Walk parent edges from every user class with an explicit path stack,
    /// reporting each cycle once
    fn detect_cycles(&mut self, diagnostics: &mut Diagnostics) {
        let mut marks: HashMap<String, Mark> = self
            .order
            .iter()
            .map(|name| {
                let done = self.unresolved.contains(name)
                    || self.classes.get(name).is_some_and(ClassInfo::is_builtin);
                (name.clone(), if done { Mark::Done } else { Mark::Unvisited })
            })
            .collect();

        for name in self.order.clone() {
            if marks.get(&name) != Some(&Mark::Unvisited) {
                continue;
            }

            let mut path: Vec<String> = Vec::new();
            let mut current = Some(name);
            let broken = loop {
                let Some(cur) = current else { break false };
                match marks.get(&cur).copied().unwrap_or(Mark::Done) {
                    Mark::Done => break self.unresolved.contains(&cur),
                    Mark::InProgress => {
                        let start = path.iter().position(|n| *n == cur).unwrap_or(0);
                        self.report_cycle(&path[start..], diagnostics);
                        break true;
                    }
                    Mark::Unvisited => {
                        marks.insert(cur.clone(), Mark::InProgress);
                        current = self.classes.get(&cur).and_then(|c| c.parent.clone());
                        path.push(cur);
                    }
                }
            };

            for member in path {
                if broken {
                    self.unresolved.insert(member.clone());
                }
                marks.insert(member, Mark::Done);
            }
        }
    }

    fn report_cycle(&self, members: &[String], diagnostics: &mut Diagnostics) {
        let first = members
            .iter()
            .filter_map(|name| self.classes.get(name))
            .min_by_key(|info| match info.origin {
                ClassOrigin::User(index) => index,
                ClassOrigin::Builtin => usize::MAX,
            });
        if let Some(info) = first {
            diagnostics.report(
                ErrorKind::Structural,
                &info.file,
                info.span,
                format!(
                    "Class {0}, or an ancestor of {0}, is involved in an inheritance cycle.",
                    info.name
                ),
            );
        }
    }

    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Declared, and with a well-formed ancestor chain ending at Object
    pub fn is_resolved(&self, name: &str) -> bool {
        self.contains(name) && !self.unresolved.contains(name)
    }

    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.classes.get(name).and_then(|c| c.parent.as_deref())
    }

    /// `name`, its parent, and so on up to Object
    ///
    /// The walk is bounded by the table size so it terminates even on the
    /// unresolved classes of a cycle.
    pub fn ancestors<'t>(&'t self, name: &'t str) -> Ancestors<'t> {
        Ancestors {
            table: self,
            next: Some(name),
            remaining: self.classes.len(),
        }
    }

    /// All classes, built-ins first, then user classes in declaration order
    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.order.iter().filter_map(|name| self.classes.get(name))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Resolved classes ordered so that every parent precedes its children
    pub fn resolved_order(&self) -> Vec<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();
        for name in &self.order {
            if !self.is_resolved(name) {
                continue;
            }
            let mut chain: Vec<&str> = self.ancestors(name).map(|c| c.name.as_str()).collect();
            chain.reverse();
            for class in chain {
                if seen.insert(class) {
                    out.push(class);
                }
            }
        }
        out
    }
}

/// Iterator over an ancestor chain, see [`ClassTable::ancestors`]
pub struct Ancestors<'t> {
    table: &'t ClassTable,
    next: Option<&'t str>,
    remaining: usize,
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = &'t ClassInfo;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let info = self.table.classes.get(self.next?)?;
        self.next = info.parent.as_deref();
        Some(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::CoolParser;
    use pretty_assertions::assert_eq;

    const MAIN: &str = "class Main { main() : Object { 0 }; };\n";

    fn build(source: &str) -> (ClassTable, Vec<String>) {
        let program = CoolParser::new(source, "test.cl").parse_program().unwrap();
        let mut diags = Diagnostics::unbounded();
        let table = ClassTable::build(&program, &mut diags);
        let messages = diags.into_vec().into_iter().map(|d| d.to_string()).collect();
        (table, messages)
    }

    fn chain(table: &ClassTable, name: &str) -> Vec<String> {
        table.ancestors(name).map(|c| c.name.clone()).collect()
    }

    #[test]
    fn test_valid_hierarchy() {
        let (table, messages) = build(&format!("{}class A {{ }}; class B inherits A {{ }};", MAIN));
        assert!(messages.is_empty(), "{:?}", messages);
        assert_eq!(chain(&table, "B"), vec!["B", "A", "Object"]);
        assert_eq!(chain(&table, "IO"), vec!["IO", "Object"]);
        assert!(table.is_resolved("B"));
        assert_eq!(table.parent_of("Object"), None);
    }

    #[test]
    fn test_reserved_names() {
        let (table, messages) = build(&format!(
            "{}class Int inherits Object {{ }};\nclass SELF_TYPE {{ }};",
            MAIN
        ));
        assert_eq!(
            messages,
            vec![
                "test.cl:2: Redefinition of basic class Int.",
                "test.cl:3: Redefinition of basic class SELF_TYPE.",
            ]
        );
        assert!(table.get("Int").is_some_and(ClassInfo::is_builtin));
        assert!(!table.contains("SELF_TYPE"));
    }

    #[test]
    fn test_duplicate_class_keeps_first() {
        let (table, messages) = build(&format!("{}class A {{ }};\nclass A inherits IO {{ }};", MAIN));
        assert_eq!(messages, vec!["test.cl:3: Class A was previously defined."]);
        assert_eq!(table.parent_of("A"), Some("Object"));
    }

    #[test]
    fn test_illegal_parent() {
        let (table, messages) = build(&format!(
            "{}class C inherits String {{ }};\nclass D inherits C {{ }};",
            MAIN
        ));
        assert_eq!(messages, vec!["test.cl:2: Class C cannot inherit class String."]);
        assert!(!table.is_resolved("C"));
        assert!(!table.is_resolved("D"));
    }

    #[test]
    fn test_undefined_parent() {
        let (table, messages) = build(&format!("{}class A inherits Missing {{ }};", MAIN));
        assert_eq!(messages, vec!["test.cl:2: Class A inherits from an undefined class Missing."]);
        assert!(!table.is_resolved("A"));
    }

    #[test]
    fn test_cycle_reported_once() {
        let (table, messages) = build(&format!(
            "{}class A inherits B {{ }};\nclass B inherits A {{ }};\nclass C inherits B {{ }};",
            MAIN
        ));
        assert_eq!(
            messages,
            vec!["test.cl:2: Class A, or an ancestor of A, is involved in an inheritance cycle."]
        );
        for name in ["A", "B", "C"] {
            assert!(!table.is_resolved(name), "{} should be unresolved", name);
        }
        assert!(table.is_resolved("Main"));
        assert!(table.ancestors("A").count() <= table.len());
    }

    #[test]
    fn test_self_cycle_and_second_cycle() {
        let (_, messages) = build(&format!(
            "{}class A inherits A {{ }};\nclass X inherits Y {{ }};\nclass Y inherits X {{ }};",
            MAIN
        ));
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("Class A, or an ancestor of A"));
        assert!(messages[1].contains("Class X, or an ancestor of X"));
    }

    #[test]
    fn test_missing_main_class() {
        let (_, messages) = build("class A { };");
        assert_eq!(messages, vec!["Class Main is not defined."]);
    }

    #[test]
    fn test_main_without_main_method() {
        let (_, messages) = build("class Main { foo() : Int { 1 }; };");
        assert_eq!(messages, vec!["test.cl:1: No 'main' method in class Main."]);
    }

    #[test]
    fn test_main_method_with_arguments() {
        let (_, messages) = build("class Main {\n main(x : Int) : Object { x };\n};");
        assert_eq!(
            messages,
            vec!["test.cl:2: 'main' method in class Main should have no arguments."]
        );
    }

    #[test]
    fn test_resolved_order_puts_parents_first() {
        let (table, _) = build(&format!("{}class C inherits B {{ }}; class B inherits A {{ }}; class A {{ }};", MAIN));
        let order = table.resolved_order();
        let pos = |n: &str| order.iter().position(|c| *c == n).unwrap();
        assert!(pos("Object") < pos("A"));
        assert!(pos("A") < pos("B"));
        assert!(pos("B") < pos("C"));
    }
}
