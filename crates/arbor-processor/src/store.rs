//! Effective annotation view over the raw index.
//!
//! External collaborators may register transformations that rewrite the
//! annotations of a target (add a qualifier, veto a class, ...). Every later
//! stage reads annotations exclusively through this store so it sees the
//! transformed view. Transformations run lazily and the result is cached per
//! target.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use arbor_index::{AnnotationInstance, Target, TypeIndex};

/// A pluggable annotation rewrite, applied in registration order.
pub type AnnotationTransformer =
    Box<dyn Fn(&Target, Vec<AnnotationInstance>) -> Vec<AnnotationInstance>>;

pub struct AnnotationStore<'a> {
    index: &'a TypeIndex,
    transformers: Vec<AnnotationTransformer>,
    cache: RefCell<HashMap<Target, Rc<Vec<AnnotationInstance>>>>,
}

impl<'a> AnnotationStore<'a> {
    pub fn new(index: &'a TypeIndex, transformers: Vec<AnnotationTransformer>) -> Self {
        Self {
            index,
            transformers,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// The effective annotations of `target`.
    pub fn annotations(&self, target: &Target) -> Rc<Vec<AnnotationInstance>> {
        if let Some(cached) = self.cache.borrow().get(target) {
            return Rc::clone(cached);
        }
        let mut current = self.index.raw_annotations(target).to_vec();
        for transformer in &self.transformers {
            current = transformer(target, current);
        }
        let current = Rc::new(current);
        self.cache
            .borrow_mut()
            .insert(target.clone(), Rc::clone(&current));
        current
    }

    pub fn has_annotation(&self, target: &Target, name: &str) -> bool {
        self.annotations(target).iter().any(|a| a.name == name)
    }

    pub fn annotation(&self, target: &Target, name: &str) -> Option<AnnotationInstance> {
        self.annotations(target)
            .iter()
            .find(|a| a.name == name)
            .cloned()
    }
}

impl std::fmt::Debug for AnnotationStore<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("transformers", &self.transformers.len())
            .field("cached_targets", &self.cache.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use arbor_index::{ClassBuilder, TypeIndex, TypeName};

    use super::*;

    #[test]
    fn transformers_run_in_order_and_results_are_cached() {
        let mut builder = TypeIndex::builder();
        builder.add(ClassBuilder::new("com.acme.Foo").build());
        let index = builder.build();

        let add_marker: AnnotationTransformer = Box::new(|_, mut annotations| {
            annotations.push(AnnotationInstance::marker("com.acme.Added"));
            annotations
        });
        let drop_marker: AnnotationTransformer = Box::new(|_, annotations| {
            annotations
                .into_iter()
                .filter(|a| a.name != "com.acme.Dropped")
                .collect()
        });
        let store = AnnotationStore::new(&index, vec![add_marker, drop_marker]);

        let target = Target::Class(TypeName::new("com.acme.Foo"));
        assert!(store.has_annotation(&target, "com.acme.Added"));
        // Second read hits the cache and returns the same Rc.
        let first = store.annotations(&target);
        let second = store.annotations(&target);
        assert!(Rc::ptr_eq(&first, &second));
    }
}
