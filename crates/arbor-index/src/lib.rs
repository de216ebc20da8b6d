//! Immutable static type index.
//!
//! The index is the processor's only view of the world: fully-qualified names
//! mapped to class metadata (supertypes, interfaces, fields, methods,
//! annotations). It is built once per deployment, frozen, and then passed by
//! reference through every analysis phase; there is no ambient global state.

mod annotations;
mod builder;
mod class;
mod types;

use std::collections::{HashMap, HashSet};

pub use annotations::{AnnotationInstance, AnnotationValue, Target, Value};
pub use builder::{ClassBuilder, FieldBuilder, MethodBuilder};
pub use class::{
    ClassInfo, ClassKind, FieldInfo, MethodInfo, Nesting, ParameterInfo, CONSTRUCTOR_NAME,
};
pub use smol_str::SmolStr;
pub use types::{Primitive, Type, TypeName, TypeParameter};

/// A frozen snapshot of all known classes.
///
/// Query results are consistent for the lifetime of the snapshot; rebuilding
/// the index is the only way to observe a different world.
#[derive(Debug)]
pub struct TypeIndex {
    classes: Vec<ClassInfo>,
    by_name: HashMap<TypeName, usize>,
    by_annotation: HashMap<TypeName, Vec<usize>>,
}

impl TypeIndex {
    pub fn builder() -> TypeIndexBuilder {
        TypeIndexBuilder::default()
    }

    pub fn class_by_name(&self, name: &str) -> Option<&ClassInfo> {
        self.by_name.get(&TypeName::new(name)).map(|&idx| &self.classes[idx])
    }

    pub fn class(&self, name: &TypeName) -> Option<&ClassInfo> {
        self.by_name.get(name).map(|&idx| &self.classes[idx])
    }

    /// All classes, in deterministic (name) order.
    pub fn known_classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.iter()
    }

    /// Classes whose class-level annotations include `annotation`.
    pub fn classes_with_annotation(&self, annotation: &str) -> Vec<&ClassInfo> {
        self.by_annotation
            .get(&TypeName::new(annotation))
            .map(|indices| indices.iter().map(|&idx| &self.classes[idx]).collect())
            .unwrap_or_default()
    }

    /// The superclass chain of `name`, nearest first, excluding `name` itself.
    /// Stops silently at classes missing from the index.
    pub fn superclasses_of<'a>(&'a self, name: &TypeName) -> SuperclassIter<'a> {
        SuperclassIter {
            index: self,
            next: self
                .class(name)
                .and_then(|c| c.super_name())
                .cloned(),
        }
    }

    /// Structural "is `sub` (or one of its supertypes/interfaces) named
    /// `sup`" walk over the hierarchy, cycle-safe.
    pub fn is_assignable_to_name(&self, sub: &TypeName, sup: &TypeName) -> bool {
        if sup == &TypeName::new("java.lang.Object") || sub == sup {
            return true;
        }
        let mut seen: HashSet<TypeName> = HashSet::new();
        let mut stack = vec![sub.clone()];
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if &current == sup {
                return true;
            }
            let Some(class) = self.class(&current) else {
                continue;
            };
            if let Some(super_name) = class.super_name() {
                stack.push(super_name.clone());
            }
            for interface in &class.interfaces {
                if let Some(name) = interface.name() {
                    stack.push(name.clone());
                }
            }
        }
        false
    }

    /// Raw (untransformed) annotations on a target. Unknown targets yield an
    /// empty slice.
    pub fn raw_annotations(&self, target: &Target) -> &[AnnotationInstance] {
        match target {
            Target::Class(name) => self.class(name).map(|c| c.annotations.as_slice()),
            Target::Field { class, field } => self
                .class(class)
                .and_then(|c| c.field(field))
                .map(|f| f.annotations.as_slice()),
            Target::Method { class, method } => self
                .class(class)
                .and_then(|c| c.method_at(*method))
                .map(|m| m.annotations.as_slice()),
            Target::Parameter {
                class,
                method,
                param,
            } => self
                .class(class)
                .and_then(|c| c.method_at(*method))
                .and_then(|m| m.params.get(*param as usize))
                .map(|p| p.annotations.as_slice()),
            Target::Synthetic(_) => None,
        }
        .unwrap_or(&[])
    }
}

pub struct SuperclassIter<'a> {
    index: &'a TypeIndex,
    next: Option<TypeName>,
}

impl<'a> Iterator for SuperclassIter<'a> {
    type Item = &'a ClassInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.next.take()?;
        let class = self.index.class(&name)?;
        self.next = class.super_name().cloned();
        Some(class)
    }
}

/// Accumulates classes and freezes them into a [`TypeIndex`].
#[derive(Debug, Default)]
pub struct TypeIndexBuilder {
    classes: Vec<ClassInfo>,
}

impl TypeIndexBuilder {
    pub fn add(&mut self, class: ClassInfo) -> &mut Self {
        self.classes.push(class);
        self
    }

    pub fn add_all(&mut self, classes: impl IntoIterator<Item = ClassInfo>) -> &mut Self {
        self.classes.extend(classes);
        self
    }

    pub fn build(mut self) -> TypeIndex {
        // Deterministic iteration order regardless of insertion order; the
        // last definition of a name wins.
        self.classes.sort_by(|a, b| a.name.cmp(&b.name));
        let mut by_name = HashMap::new();
        for (idx, class) in self.classes.iter().enumerate() {
            by_name.insert(class.name.clone(), idx);
        }
        let mut by_annotation: HashMap<TypeName, Vec<usize>> = HashMap::new();
        for (idx, class) in self.classes.iter().enumerate() {
            if by_name[&class.name] != idx {
                continue;
            }
            for annotation in &class.annotations {
                by_annotation
                    .entry(annotation.name.clone())
                    .or_default()
                    .push(idx);
            }
        }
        TypeIndex {
            classes: self.classes,
            by_name,
            by_annotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn index() -> TypeIndex {
        let mut builder = TypeIndex::builder();
        builder
            .add(
                ClassBuilder::new("com.acme.Shape")
                    .interface()
                    .build(),
            )
            .add(
                ClassBuilder::new("com.acme.AbstractShape")
                    .abstract_class()
                    .implements(Type::class("com.acme.Shape"))
                    .build(),
            )
            .add(
                ClassBuilder::new("com.acme.Circle")
                    .extends(Type::class("com.acme.AbstractShape"))
                    .annotate(AnnotationInstance::marker("com.acme.Marker"))
                    .build(),
            );
        builder.build()
    }

    #[test]
    fn class_lookup_and_annotation_query() {
        let index = index();
        assert!(index.class_by_name("com.acme.Circle").is_some());
        assert!(index.class_by_name("com.acme.Missing").is_none());
        let marked: Vec<_> = index
            .classes_with_annotation("com.acme.Marker")
            .iter()
            .map(|c| c.name.as_str().to_string())
            .collect();
        assert_eq!(marked, vec!["com.acme.Circle".to_string()]);
    }

    #[test]
    fn superclass_chain_stops_at_missing_classes() {
        let index = index();
        let chain: Vec<_> = index
            .superclasses_of(&TypeName::new("com.acme.Circle"))
            .map(|c| c.name.as_str().to_string())
            .collect();
        // java.lang.Object is not in this index, so the chain ends after the
        // abstract base.
        assert_eq!(chain, vec!["com.acme.AbstractShape".to_string()]);
    }

    #[test]
    fn assignability_walks_interfaces() {
        let index = index();
        let circle = TypeName::new("com.acme.Circle");
        assert!(index.is_assignable_to_name(&circle, &TypeName::new("com.acme.Shape")));
        assert!(index.is_assignable_to_name(&circle, &TypeName::new("java.lang.Object")));
        assert!(!index.is_assignable_to_name(&circle, &TypeName::new("com.acme.Square")));
    }

    #[test]
    fn implicit_no_args_constructor() {
        let with_ctor = ClassBuilder::new("com.acme.A")
            .constructor(MethodBuilder::ctor().param("dep", Type::class("com.acme.B")))
            .build();
        assert!(!with_ctor.has_no_args_constructor());

        let without_ctor = ClassBuilder::new("com.acme.B").build();
        assert!(without_ctor.has_no_args_constructor());
    }
}
