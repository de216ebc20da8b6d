//! Typesafe resolution: matching beans against a required type plus
//! qualifiers, and the ambiguity tie-break.

use arbor_index::{AnnotationInstance, Type, TypeIndex};
use tracing::trace;

use crate::bean::{BeanId, BeanInfo};
use crate::names;
use crate::registry::Registry;
use crate::types;

pub struct Resolver<'a> {
    index: &'a TypeIndex,
    registry: &'a Registry,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a TypeIndex, registry: &'a Registry) -> Self {
        Self { index, registry }
    }

    /// All beans assignable to `required_type` whose qualifiers satisfy
    /// `required_qualifiers`. An empty qualifier set matches every bean
    /// (programmatic lookup); injection points always carry at least one
    /// qualifier after defaulting.
    pub fn resolve(
        &self,
        beans: &[BeanInfo],
        required_type: &Type,
        required_qualifiers: &[AnnotationInstance],
    ) -> Vec<BeanId> {
        let mut matching: Vec<BeanId> = beans
            .iter()
            .filter(|bean| self.matches(bean, required_type, required_qualifiers))
            .map(|bean| bean.id)
            .collect();
        matching.sort();
        trace!(
            required = %required_type,
            candidates = matching.len(),
            "typesafe resolution"
        );
        matching
    }

    pub fn matches(
        &self,
        bean: &BeanInfo,
        required_type: &Type,
        required_qualifiers: &[AnnotationInstance],
    ) -> bool {
        self.matches_type(bean, required_type)
            && self.has_qualifiers(&bean.qualifiers, required_qualifiers)
    }

    pub fn matches_type(&self, bean: &BeanInfo, required_type: &Type) -> bool {
        bean.types
            .iter()
            .any(|bean_type| types::matches_type(self.index, required_type, bean_type))
    }

    /// Does `bean_qualifiers` satisfy every required qualifier? Member values
    /// marked non-binding (directly or via deployment-wide overrides) are
    /// ignored during comparison.
    pub fn has_qualifiers(
        &self,
        bean_qualifiers: &[AnnotationInstance],
        required_qualifiers: &[AnnotationInstance],
    ) -> bool {
        required_qualifiers
            .iter()
            .all(|required| self.has_qualifier(bean_qualifiers, required))
    }

    pub fn has_qualifier(
        &self,
        bean_qualifiers: &[AnnotationInstance],
        required: &AnnotationInstance,
    ) -> bool {
        bean_qualifiers.iter().any(|candidate| {
            candidate.name == required.name
                && self.binding_values(candidate) == self.binding_values(required)
        })
    }

    fn binding_values<'q>(
        &self,
        qualifier: &'q AnnotationInstance,
    ) -> Vec<(&'q str, &'q arbor_index::Value)> {
        let non_binding = self.registry.non_binding_members(qualifier.name.as_str());
        let mut values: Vec<_> = qualifier
            .values
            .iter()
            .filter(|v| {
                non_binding
                    .map(|members| !members.contains(v.name.as_str()))
                    .unwrap_or(true)
            })
            .map(|v| (v.name.as_str(), &v.value))
            .collect();
        values.sort_by_key(|(name, _)| *name);
        values
    }

    /// The three-step ambiguity tie-break. Returns the unique survivor, or
    /// `None` when the candidate set stays ambiguous (a recoverable
    /// condition reported by the caller).
    pub fn resolve_ambiguity(&self, beans: &[BeanInfo], candidates: &[BeanId]) -> Option<BeanId> {
        if candidates.is_empty() {
            return None;
        }
        if let [single] = candidates {
            return Some(*single);
        }

        // 1. Fallback beans lose to any non-default candidate.
        let mut remaining: Vec<BeanId> = candidates.to_vec();
        let non_default: Vec<BeanId> = remaining
            .iter()
            .copied()
            .filter(|id| !beans[id.index()].default_bean)
            .collect();
        if !non_default.is_empty() {
            remaining = non_default;
        }
        if let [single] = remaining.as_slice() {
            return Some(*single);
        }

        // 2. Only alternatives (or producers declared by alternatives)
        // survive.
        remaining.retain(|id| self.is_alternative_or_declared_by_one(beans, *id));
        if remaining.is_empty() {
            return None;
        }
        if let [single] = remaining.as_slice() {
            return Some(*single);
        }

        // 3. Highest alternative priority wins; a missing priority sorts
        // below any declared one, and an all-missing tie stays ambiguous.
        let highest = remaining
            .iter()
            .filter_map(|id| self.alternative_priority(beans, *id))
            .max();
        if let Some(highest) = highest {
            remaining.retain(|id| self.alternative_priority(beans, *id) == Some(highest));
        }
        match remaining.as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }

    fn is_alternative_or_declared_by_one(&self, beans: &[BeanInfo], id: BeanId) -> bool {
        let bean = &beans[id.index()];
        if bean.alternative {
            return true;
        }
        bean.kind
            .declaring_bean()
            .map(|declaring| beans[declaring.index()].alternative)
            .unwrap_or(false)
    }

    /// Producer beans without their own priority inherit the declaring
    /// bean's.
    pub fn alternative_priority(&self, beans: &[BeanInfo], id: BeanId) -> Option<i64> {
        let bean = &beans[id.index()];
        bean.priority.or_else(|| {
            bean.kind
                .declaring_bean()
                .and_then(|declaring| beans[declaring.index()].priority)
        })
    }

    /// Beans that match the required type but miss a qualifier, for
    /// unsatisfied-resolution diagnostics.
    pub fn almost_matching(
        &self,
        beans: &[BeanInfo],
        required_type: &Type,
        required_qualifiers: &[AnnotationInstance],
    ) -> Vec<BeanId> {
        beans
            .iter()
            .filter(|bean| {
                self.matches_type(bean, required_type)
                    && !self.has_qualifiers(&bean.qualifiers, required_qualifiers)
            })
            .map(|bean| bean.id)
            .collect()
    }
}

/// The default qualifier set carried by beans and injection points that
/// declare none.
pub fn default_qualifiers() -> Vec<AnnotationInstance> {
    vec![
        AnnotationInstance::marker(names::DEFAULT),
        AnnotationInstance::marker(names::ANY),
    ]
}
