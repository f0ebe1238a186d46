//! Per-class attribute and method tables with inheritance and override checks

use super::builtins::BUILTINS;
use super::class_table::{ClassOrigin, ClassTable};
use super::diagnostics::{Diagnostics, ErrorKind};
use crate::frontend::ast::{AttrDecl, ClassDecl, Feature, MethodDecl, Program};
use crate::types::{names, Type};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::trace;

/// Type written in source: `SELF_TYPE` or a class in the table
pub fn resolve_type_name(classes: &ClassTable, name: &str) -> Option<Type> {
    if name == names::SELF_TYPE {
        Some(Type::SelfType)
    } else if classes.contains(name) {
        Some(Type::class(name))
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormalSig {
    pub name: String,
    pub ty: Type,
}

/// A validated method signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub name: String,
    pub formals: Vec<FormalSig>,
    pub return_type: Type,
    /// Class whose declaration this entry belongs to
    pub owner: String,
}

impl MethodSig {
    /// Describe how `self` fails to override `inherited`, if it does
    fn override_mismatch(&self, inherited: &MethodSig) -> Option<String> {
        if self.formals.len() != inherited.formals.len() {
            return Some(format!(
                "Incompatible number of formal parameters in redefined method {}.",
                self.name
            ));
        }
        for (ours, theirs) in self.formals.iter().zip(&inherited.formals) {
            if ours.ty != theirs.ty {
                return Some(format!(
                    "In redefined method {}, parameter type {} is different from original type {}.",
                    self.name, ours.ty, theirs.ty
                ));
            }
        }
        if self.return_type != inherited.return_type {
            return Some(format!(
                "In redefined method {}, return type {} is different from original return type {}.",
                self.name, self.return_type, inherited.return_type
            ));
        }
        None
    }
}

/// A validated attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSig {
    pub name: String,
    pub ty: Type,
    pub owner: String,
}

#[derive(Debug, Default)]
struct ClassFeatures {
    /// In declaration order
    attributes: Vec<AttrSig>,
    methods: HashMap<String, MethodSig>,
}

/// Attribute and method tables of every resolved class
#[derive(Debug, Default)]
pub struct FeatureTable {
    classes: HashMap<String, ClassFeatures>,
}

impl FeatureTable {
    /// Validate the features of every accepted user class
    ///
    /// Resolved classes are processed ancestors first so inherited entries
    /// are known when a class is checked. Unresolved classes only get the
    /// checks that need no ancestors and stay out of the table. Diagnostics
    /// are emitted in declaration order.
    pub fn build(program: &Program, classes: &ClassTable, diagnostics: &mut Diagnostics) -> Self {
        let mut table = Self::default();
        table.add_builtins();

        let mut buffers: BTreeMap<usize, Diagnostics> = BTreeMap::new();
        for name in classes.resolved_order() {
            let Some(ClassOrigin::User(index)) = classes.get(name).map(|c| c.origin) else {
                continue;
            };
            let Some(decl) = program.classes.get(index) else { continue };

            let mut buffer = Diagnostics::unbounded();
            let own = table.validate_class(decl, classes, true, &mut buffer);
            table.classes.insert(decl.name.clone(), own);
            buffers.insert(index, buffer);
        }

        for info in classes.classes().filter(|c| !classes.is_resolved(&c.name)) {
            let ClassOrigin::User(index) = info.origin else { continue };
            let Some(decl) = program.classes.get(index) else { continue };

            let mut buffer = Diagnostics::unbounded();
            table.validate_class(decl, classes, false, &mut buffer);
            buffers.insert(index, buffer);
        }

        for buffer in buffers.into_values() {
            diagnostics.extend(buffer);
        }
        table
    }

    fn add_builtins(&mut self) {
        for builtin in BUILTINS {
            let methods = builtin
                .methods
                .iter()
                .map(|m| {
                    let sig = MethodSig {
                        name: m.name.to_string(),
                        formals: m
                            .formals
                            .iter()
                            .map(|(name, ty)| FormalSig {
                                name: name.to_string(),
                                ty: Type::from_name(ty),
                            })
                            .collect(),
                        return_type: Type::from_name(m.return_type),
                        owner: builtin.name.to_string(),
                    };
                    (sig.name.clone(), sig)
                })
                .collect();
            self.classes.insert(
                builtin.name.to_string(),
                ClassFeatures { attributes: Vec::new(), methods },
            );
        }
    }

    /// Own features of `class`; `resolved` enables the inherited-attribute
    /// and override checks
    fn validate_class(
        &self,
        class: &ClassDecl,
        classes: &ClassTable,
        resolved: bool,
        diags: &mut Diagnostics,
    ) -> ClassFeatures {
        trace!(class = %class.name, resolved, "validating features");
        let mut own = ClassFeatures::default();

        for feature in &class.features {
            match feature {
                Feature::Attribute(attr) => {
                    let sig = self.validate_attribute(class, attr, &own, classes, resolved, diags);
                    if let Some(sig) = sig {
                        own.attributes.push(sig);
                    }
                }
                Feature::Method(method) => {
                    if own.methods.contains_key(&method.name) {
                        diags.report(
                            ErrorKind::Declaration,
                            &class.file,
                            method.span,
                            format!("Method {} is multiply defined.", method.name),
                        );
                        continue;
                    }
                    let sig = self.validate_method(class, method, classes, resolved, diags);
                    own.methods.insert(method.name.clone(), sig);
                }
            }
        }

        own
    }

    fn validate_attribute(
        &self,
        class: &ClassDecl,
        attr: &AttrDecl,
        own: &ClassFeatures,
        classes: &ClassTable,
        resolved: bool,
        diags: &mut Diagnostics,
    ) -> Option<AttrSig> {
        let mut error = |message: String| {
            diags.report(ErrorKind::Declaration, &class.file, attr.span, message);
        };

        if attr.name == names::SELF {
            error("'self' cannot be the name of an attribute.".to_string());
            return None;
        }
        if own.attributes.iter().any(|a| a.name == attr.name) {
            error(format!("Attribute {} is multiply defined in class.", attr.name));
            return None;
        }
        if resolved && self.lookup_attribute(classes, &class.parent, &attr.name).is_some() {
            error(format!("Attribute {} is an attribute of an inherited class.", attr.name));
            return None;
        }

        let ty = resolve_type_name(classes, &attr.type_name).unwrap_or_else(|| {
            error(format!(
                "Class {} of attribute {} is undefined.",
                attr.type_name, attr.name
            ));
            Type::object()
        });

        Some(AttrSig {
            name: attr.name.clone(),
            ty,
            owner: class.name.clone(),
        })
    }

    fn validate_method(
        &self,
        class: &ClassDecl,
        method: &MethodDecl,
        classes: &ClassTable,
        resolved: bool,
        diags: &mut Diagnostics,
    ) -> MethodSig {
        let mut seen = HashSet::new();
        let mut formals = Vec::with_capacity(method.formals.len());

        for formal in &method.formals {
            let mut error = |message: String| {
                diags.report(ErrorKind::Declaration, &class.file, formal.span, message);
            };

            if formal.name == names::SELF {
                error("'self' cannot be the name of a formal parameter.".to_string());
            } else if !seen.insert(formal.name.as_str()) {
                error(format!("Formal parameter {} is multiply defined.", formal.name));
            }

            let ty = match resolve_type_name(classes, &formal.type_name) {
                Some(Type::SelfType) => {
                    error(format!(
                        "Formal parameter {} cannot have type SELF_TYPE.",
                        formal.name
                    ));
                    Type::object()
                }
                Some(ty) => ty,
                None => {
                    error(format!(
                        "Class {} of formal parameter {} is undefined.",
                        formal.type_name, formal.name
                    ));
                    Type::object()
                }
            };
            formals.push(FormalSig { name: formal.name.clone(), ty });
        }

        let return_type = resolve_type_name(classes, &method.return_type).unwrap_or_else(|| {
            diags.report(
                ErrorKind::Declaration,
                &class.file,
                method.span,
                format!(
                    "Undefined return type {} in method {}.",
                    method.return_type, method.name
                ),
            );
            Type::object()
        });

        let sig = MethodSig {
            name: method.name.clone(),
            formals,
            return_type,
            owner: class.name.clone(),
        };

        if !resolved {
            return sig;
        }
        match self.lookup_method(classes, &class.parent, &method.name) {
            Some(inherited) => match sig.override_mismatch(inherited) {
                Some(message) => {
                    diags.report(ErrorKind::Declaration, &class.file, method.span, message);
                    MethodSig {
                        owner: class.name.clone(),
                        ..inherited.clone()
                    }
                }
                None => sig,
            },
            None => sig,
        }
    }

    /// Nearest declaration of `method` in the ancestor chain of `class`
    pub fn lookup_method(&self, classes: &ClassTable, class: &str, method: &str) -> Option<&MethodSig> {
        classes
            .ancestors(class)
            .find_map(|info| self.classes.get(&info.name)?.methods.get(method))
    }

    /// Declaration of `attribute` in the ancestor chain of `class`
    pub fn lookup_attribute(&self, classes: &ClassTable, class: &str, attribute: &str) -> Option<&AttrSig> {
        classes.ancestors(class).find_map(|info| {
            self.classes
                .get(&info.name)?
                .attributes
                .iter()
                .find(|a| a.name == attribute)
        })
    }

    /// Method declared by `class` itself
    pub fn own_method(&self, class: &str, method: &str) -> Option<&MethodSig> {
        self.classes.get(class)?.methods.get(method)
    }

    /// Attribute declared by `class` itself
    pub fn own_attribute(&self, class: &str, attribute: &str) -> Option<&AttrSig> {
        self.classes
            .get(class)?
            .attributes
            .iter()
            .find(|a| a.name == attribute)
    }

    /// Every attribute visible in `class`, Object's first
    pub fn visible_attributes(&self, classes: &ClassTable, class: &str) -> Vec<&AttrSig> {
        let mut chain: Vec<&str> = classes.ancestors(class).map(|c| c.name.as_str()).collect();
        chain.reverse();
        chain
            .into_iter()
            .filter_map(|name| self.classes.get(name))
            .flat_map(|features| features.attributes.iter())
            .collect()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::CoolParser;
    use pretty_assertions::assert_eq;

    const MAIN: &str = "class Main { main() : Object { 0 }; };\n";

    fn build(source: &str) -> (ClassTable, FeatureTable, Vec<String>) {
        let program = CoolParser::new(source, "f.cl").parse_program().unwrap();
        let mut diags = Diagnostics::unbounded();
        let classes = ClassTable::build(&program, &mut diags);
        let features = FeatureTable::build(&program, &classes, &mut diags);
        let messages = diags.into_vec().into_iter().map(|d| d.to_string()).collect();
        (classes, features, messages)
    }

    #[test]
    fn test_builtin_methods() {
        let (classes, features, _) = build(MAIN);
        let out = features.lookup_method(&classes, "Main", "type_name").unwrap();
        assert_eq!(out.owner, "Object");
        assert_eq!(out.return_type, Type::string());

        let substr = features.lookup_method(&classes, "String", "substr").unwrap();
        assert_eq!(substr.formals.len(), 2);
        assert_eq!(
            features.lookup_method(&classes, "IO", "out_int").unwrap().return_type,
            Type::SelfType
        );
        assert!(features.lookup_method(&classes, "Int", "length").is_none());
    }

    #[test]
    fn test_identical_override_accepted() {
        let (classes, features, messages) = build(&format!(
            "{}class A {{ foo(x : Int) : Int {{ x }}; }};\nclass B inherits A {{ foo(y : Int) : Int {{ y }}; }};",
            MAIN
        ));
        assert!(messages.is_empty(), "{:?}", messages);
        assert_eq!(features.lookup_method(&classes, "B", "foo").unwrap().owner, "B");
    }

    #[test]
    fn test_override_parameter_mismatch_uses_inherited_signature() {
        let (classes, features, messages) = build(&format!(
            "{}class A {{ foo(x : Int) : Int {{ x }}; }};\nclass B inherits A {{\n foo(x : String) : Int {{ 1 }}; }};",
            MAIN
        ));
        assert_eq!(
            messages,
            vec!["f.cl:4: In redefined method foo, parameter type String is different from original type Int."]
        );
        let sig = features.lookup_method(&classes, "B", "foo").unwrap();
        assert_eq!(sig.formals[0].ty, Type::int());
        assert_eq!(sig.owner, "B");
    }

    #[test]
    fn test_override_arity_and_return_mismatch() {
        let (_, _, messages) = build(&format!(
            "{}class A {{ f(x : Int) : Int {{ x }}; g() : Int {{ 1 }}; }};\nclass B inherits A {{ f() : Int {{ 1 }}; g() : Bool {{ true }}; }};",
            MAIN
        ));
        assert_eq!(
            messages,
            vec![
                "f.cl:3: Incompatible number of formal parameters in redefined method f.",
                "f.cl:3: In redefined method g, return type Bool is different from original return type Int.",
            ]
        );
    }

    #[test]
    fn test_override_of_builtin() {
        let (_, _, messages) = build(&format!("{}class A {{ copy() : A {{ self }}; }};", MAIN));
        assert_eq!(
            messages,
            vec!["f.cl:2: In redefined method copy, return type A is different from original return type SELF_TYPE."]
        );
    }

    #[test]
    fn test_duplicate_and_inherited_attributes() {
        let (classes, features, messages) = build(&format!(
            "{}class A {{ x : Int; x : String; }};\nclass B inherits A {{ x : Bool; y : Int; }};",
            MAIN
        ));
        assert_eq!(
            messages,
            vec![
                "f.cl:2: Attribute x is multiply defined in class.",
                "f.cl:3: Attribute x is an attribute of an inherited class.",
            ]
        );
        let visible: Vec<_> = features
            .visible_attributes(&classes, "B")
            .into_iter()
            .map(|a| (a.name.as_str(), a.ty.to_string()))
            .collect();
        assert_eq!(visible, vec![("x", "Int".to_string()), ("y", "Int".to_string())]);
    }

    #[test]
    fn test_duplicate_method_and_formals() {
        let (_, _, messages) = build(&format!(
            "{}class A {{ f(a : Int, a : Int) : Int {{ a }}; f() : Int {{ 1 }}; }};",
            MAIN
        ));
        assert_eq!(
            messages,
            vec![
                "f.cl:2: Formal parameter a is multiply defined.",
                "f.cl:2: Method f is multiply defined.",
            ]
        );
    }

    #[test]
    fn test_unknown_and_illegal_declared_types() {
        let (classes, features, messages) = build(&format!(
            "{}class A {{ x : Nope; f(s : SELF_TYPE, t : Gone) : Missing {{ 1 }}; self : Int; g(self : Int) : SELF_TYPE {{ self }}; }};",
            MAIN
        ));
        assert_eq!(
            messages,
            vec![
                "f.cl:2: Class Nope of attribute x is undefined.",
                "f.cl:2: Formal parameter s cannot have type SELF_TYPE.",
                "f.cl:2: Class Gone of formal parameter t is undefined.",
                "f.cl:2: Undefined return type Missing in method f.",
                "f.cl:2: 'self' cannot be the name of an attribute.",
                "f.cl:2: 'self' cannot be the name of a formal parameter.",
            ]
        );
        assert_eq!(features.own_attribute("A", "x").unwrap().ty, Type::object());
        let f = features.lookup_method(&classes, "A", "f").unwrap();
        assert_eq!(f.formals[0].ty, Type::object());
        assert_eq!(f.return_type, Type::object());
        assert_eq!(features.own_method("A", "g").unwrap().return_type, Type::SelfType);
    }

    #[test]
    fn test_errors_follow_declaration_order() {
        // B is declared before its parent A but validated after it
        let (_, _, messages) = build(&format!(
            "{}class B inherits A {{ y : Nope; }};\nclass A {{ x : Gone; }};",
            MAIN
        ));
        assert_eq!(
            messages,
            vec![
                "f.cl:2: Class Nope of attribute y is undefined.",
                "f.cl:3: Class Gone of attribute x is undefined.",
            ]
        );
    }

    #[test]
    fn test_unresolved_classes_get_own_checks() {
        let (_, features, messages) = build(&format!(
            "{}class A inherits Missing {{ x : Nope; x : Int; f(self : Int) : Int {{ 1 }}; }};",
            MAIN
        ));
        assert_eq!(
            messages,
            vec![
                "f.cl:2: Class A inherits from an undefined class Missing.",
                "f.cl:2: Class Nope of attribute x is undefined.",
                "f.cl:2: Attribute x is multiply defined in class.",
                "f.cl:2: 'self' cannot be the name of a formal parameter.",
            ]
        );
        assert!(!features.has_class("A"));
    }

    #[test]
    fn test_cycle_members_skip_inherited_checks() {
        // Redeclaring x would be an inherited-attribute error in a healthy chain
        let (_, features, messages) = build(&format!(
            "{}class A inherits B {{ x : Int; f() : Gone {{ 1 }}; }};\nclass B inherits A {{ x : Int; f() : Bool {{ true }}; }};",
            MAIN
        ));
        assert_eq!(messages.len(), 2, "{:?}", messages);
        assert!(messages[0].contains("inheritance cycle"));
        assert_eq!(messages[1], "f.cl:2: Undefined return type Gone in method f.");
        assert!(!features.has_class("A"));
        assert!(!features.has_class("B"));
    }

    #[test]
    fn test_unresolved_errors_keep_declaration_order() {
        let (_, _, messages) = build(&format!(
            "{}class A inherits Missing {{ a : Nope; }};\nclass B {{ b : Gone; }};",
            MAIN
        ));
        assert_eq!(
            messages,
            vec![
                "f.cl:2: Class A inherits from an undefined class Missing.",
                "f.cl:2: Class Nope of attribute a is undefined.",
                "f.cl:3: Class Gone of attribute b is undefined.",
            ]
        );
    }
}
