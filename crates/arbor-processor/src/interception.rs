//! Per-bean interceptor and decorator resolution.
//!
//! Runs during `init`, once every interceptor and decorator is known.
//! Class-level bindings are gathered along the superclass chain with
//! replacement semantics (a binding declared closer to the bean class wins
//! over an inherited binding of the same type), method-level bindings are
//! merged with them unless the method opts out, and every effective set is
//! expanded with transitive bindings before chain resolution.

use std::collections::HashSet;

use arbor_index::{AnnotationInstance, ClassInfo, MethodInfo, SmolStr, Target, Type, TypeIndex, TypeName};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bean::{
    BeanInfo, DecoratorId, DecoratorInfo, InterceptionType, InterceptorId, InterceptorInfo,
    MethodRef,
};
use crate::errors::Problems;
use crate::names;
use crate::registry::Registry;
use crate::resolver::Resolver;
use crate::store::AnnotationStore;
use crate::types;

/// A method with a non-empty interceptor chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InterceptedMethod {
    pub method: MethodRef,
    /// The effective binding set of the method, expanded.
    pub bindings: Vec<AnnotationInstance>,
    /// Interceptors in invocation order (ascending priority).
    pub chain: Vec<InterceptorId>,
}

/// A method forwarded through the decorator chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecoratedMethod {
    pub method: MethodRef,
    /// Decorators in delegate-wiring order (descending priority).
    pub decorators: Vec<DecoratorId>,
}

/// Lifecycle event chains, in invocation order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LifecycleChains {
    pub post_construct: Vec<InterceptorId>,
    pub pre_destroy: Vec<InterceptorId>,
    pub around_construct: Vec<InterceptorId>,
}

/// The interception and decoration metadata of one bean, populated exactly
/// once.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InterceptionModel {
    pub intercepted_methods: Vec<InterceptedMethod>,
    pub decorated_methods: Vec<DecoratedMethod>,
    pub lifecycle: LifecycleChains,
    /// All distinct interceptors bound to this bean, in id order.
    pub bound_interceptors: Vec<InterceptorId>,
    /// Bound decorators, descending priority then descending class name.
    pub bound_decorators: Vec<DecoratorId>,
    /// A generated subclass is needed to honor this model.
    pub subclass_required: bool,
}

/// A downgraded unproxyability conflict: strip the offending final modifier
/// instead of failing, applied to the bean class only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BytecodePatch {
    RemoveFinalFromClass { class: TypeName },
    RemoveFinalFromMethod { class: TypeName, method: MethodRef },
}

pub struct InterceptionResolver<'a> {
    index: &'a TypeIndex,
    store: &'a AnnotationStore<'a>,
    registry: &'a Registry,
    interceptors: &'a [InterceptorInfo],
    decorators: &'a [DecoratorInfo],
    /// Downgrade final-method conflicts on the bean class to patches.
    transform_unproxyable: bool,
}

impl<'a> InterceptionResolver<'a> {
    pub fn new(
        index: &'a TypeIndex,
        store: &'a AnnotationStore<'a>,
        registry: &'a Registry,
        interceptors: &'a [InterceptorInfo],
        decorators: &'a [DecoratorInfo],
        transform_unproxyable: bool,
    ) -> Self {
        Self {
            index,
            store,
            registry,
            interceptors,
            decorators,
            transform_unproxyable,
        }
    }

    /// Compute the interception model of a class bean. Non-class beans get
    /// an empty model.
    pub fn resolve_bean(
        &self,
        bean: &BeanInfo,
        problems: &mut Problems,
        patches: &mut Vec<BytecodePatch>,
    ) -> InterceptionModel {
        let Some(class_name) = bean.class_name().filter(|_| bean.is_class_bean()) else {
            return InterceptionModel::default();
        };
        let Some(class) = self.index.class(class_name) else {
            return InterceptionModel::default();
        };

        let class_bindings = self.class_level_bindings(class);
        let resolver = Resolver::new(self.index, self.registry);

        let bound_decorators = self.bound_decorators(bean, &resolver);
        let decorated_methods = self.decorated_methods(class, &bound_decorators);

        let mut intercepted_methods = Vec::new();
        for (owner, idx, _) in self.candidate_methods(class) {
            let bindings = self.method_bindings(&owner, idx, &class_bindings);
            if bindings.is_empty() {
                continue;
            }
            let chain = self.chain(InterceptionType::AroundInvoke, &bindings, &resolver);
            if chain.is_empty() {
                continue;
            }
            intercepted_methods.push(InterceptedMethod {
                method: MethodRef::new(owner, idx),
                bindings,
                chain,
            });
        }

        let lifecycle = LifecycleChains {
            post_construct: self.chain(InterceptionType::PostConstruct, &class_bindings, &resolver),
            pre_destroy: self.chain(InterceptionType::PreDestroy, &class_bindings, &resolver),
            around_construct: self.around_construct_chain(bean, &class_bindings, &resolver),
        };

        self.check_final_methods(
            class,
            &intercepted_methods,
            &decorated_methods,
            problems,
            patches,
        );

        let mut bound_interceptors: Vec<InterceptorId> = intercepted_methods
            .iter()
            .flat_map(|m| m.chain.iter().copied())
            .chain(lifecycle.post_construct.iter().copied())
            .chain(lifecycle.pre_destroy.iter().copied())
            .chain(lifecycle.around_construct.iter().copied())
            .collect();
        bound_interceptors.sort();
        bound_interceptors.dedup();

        let subclass_required = !intercepted_methods.is_empty()
            || !decorated_methods.is_empty()
            || !lifecycle.pre_destroy.is_empty()
            || self.declares_around_invoke(class);
        if subclass_required {
            debug!(bean = %bean.describe(), "bean requires a generated subclass");
        }

        InterceptionModel {
            intercepted_methods,
            decorated_methods,
            lifecycle,
            bound_interceptors,
            bound_decorators,
            subclass_required,
        }
    }

    /// Class-level bindings: own bindings first, then stereotype bindings,
    /// then inherited ones, each added only when no binding of the same type
    /// is present yet. The result is expanded transitively.
    fn class_level_bindings(&self, class: &ClassInfo) -> Vec<AnnotationInstance> {
        let mut bindings: Vec<AnnotationInstance> = Vec::new();
        let chain = std::iter::once(class).chain(self.index.superclasses_of(&class.name));
        for current in chain {
            let target = Target::Class(current.name.clone());
            let annotations = self.store.annotations(&target);
            let mut stereotype_names: Vec<TypeName> = Vec::new();
            for annotation in annotations.iter() {
                if self.registry.is_interceptor_binding(annotation.name.as_str()) {
                    push_unless_present(&mut bindings, annotation.clone());
                } else if self
                    .registry
                    .stereotype(annotation.name.as_str())
                    .is_some()
                {
                    stereotype_names.push(TypeName::new(annotation.name.as_str()));
                }
            }
            for stereotype in self.registry.transitive_stereotypes(stereotype_names.iter()) {
                for binding in &stereotype.interceptor_bindings {
                    push_unless_present(&mut bindings, binding.clone());
                }
            }
        }
        self.registry.expand_bindings(self.index, self.store, bindings)
    }

    /// Effective bindings of one method: declared bindings plus class-level
    /// bindings, unless the method suppresses the class level.
    fn method_bindings(
        &self,
        owner: &TypeName,
        method_idx: u32,
        class_bindings: &[AnnotationInstance],
    ) -> Vec<AnnotationInstance> {
        let target = Target::Method {
            class: owner.clone(),
            method: method_idx,
        };
        let mut bindings: Vec<AnnotationInstance> = self
            .store
            .annotations(&target)
            .iter()
            .filter(|a| self.registry.is_interceptor_binding(a.name.as_str()))
            .cloned()
            .collect();
        if !self.store.has_annotation(&target, names::NO_CLASS_INTERCEPTORS) {
            for binding in class_bindings {
                push_unless_present(&mut bindings, binding.clone());
            }
        }
        self.registry.expand_bindings(self.index, self.store, bindings)
    }

    fn around_construct_chain(
        &self,
        bean: &BeanInfo,
        class_bindings: &[AnnotationInstance],
        resolver: &Resolver<'_>,
    ) -> Vec<InterceptorId> {
        let bindings = match &bean.constructor {
            Some(ctor) => self.method_bindings(&ctor.class, ctor.method, class_bindings),
            None => class_bindings.to_vec(),
        };
        self.chain(InterceptionType::AroundConstruct, &bindings, resolver)
    }

    /// Interceptors whose declared bindings are all satisfied by the
    /// effective set, in invocation order: ascending priority, ties broken
    /// by class name.
    fn chain(
        &self,
        ty: InterceptionType,
        bindings: &[AnnotationInstance],
        resolver: &Resolver<'_>,
    ) -> Vec<InterceptorId> {
        if bindings.is_empty() {
            return Vec::new();
        }
        let mut matched: Vec<&InterceptorInfo> = self
            .interceptors
            .iter()
            .filter(|interceptor| {
                interceptor.intercepts(ty)
                    && resolver.has_qualifiers(bindings, &interceptor.bindings)
            })
            .collect();
        matched.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.class.cmp(&b.class))
        });
        matched.iter().map(|i| i.id).collect()
    }

    /// Decorators whose delegate type and qualifiers accept this bean,
    /// descending priority then descending class name: the highest-priority
    /// decorator receives the next-lower one as its delegate.
    fn bound_decorators(&self, bean: &BeanInfo, resolver: &Resolver<'_>) -> Vec<DecoratorId> {
        let mut matched: Vec<&DecoratorInfo> = self
            .decorators
            .iter()
            .filter(|decorator| {
                let type_matches = bean.types.iter().any(|bean_type| {
                    types::matches_delegate_type(self.index, &decorator.delegate_type, bean_type)
                });
                type_matches
                    && resolver.has_qualifiers(&bean.qualifiers, &decorator.delegate_qualifiers)
            })
            .collect();
        matched.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.class.cmp(&a.class))
        });
        matched.iter().map(|d| d.id).collect()
    }

    /// Bean methods whose signature appears on a decorated type of a bound
    /// decorator.
    fn decorated_methods(
        &self,
        class: &ClassInfo,
        bound: &[DecoratorId],
    ) -> Vec<DecoratedMethod> {
        if bound.is_empty() {
            return Vec::new();
        }
        let mut result = Vec::new();
        for (owner, idx, method) in self.candidate_methods(class) {
            let signature = (method.name.clone(), method.parameter_types());
            let decorators: Vec<DecoratorId> = bound
                .iter()
                .copied()
                .filter(|id| {
                    self.decorators[id.index()]
                        .decorated_types
                        .iter()
                        .any(|ty| self.declares_method(ty, &signature))
                })
                .collect();
            if !decorators.is_empty() {
                result.push(DecoratedMethod {
                    method: MethodRef::new(owner, idx),
                    decorators,
                });
            }
        }
        result
    }

    fn declares_method(&self, interface: &Type, signature: &(SmolStr, Vec<Type>)) -> bool {
        let Some(name) = interface.name() else {
            return false;
        };
        let mut seen: HashSet<TypeName> = HashSet::new();
        let mut stack = vec![name.clone()];
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(class) = self.index.class(&current) else {
                continue;
            };
            if class
                .methods
                .iter()
                .any(|m| m.name == signature.0 && m.parameter_types() == signature.1)
            {
                return true;
            }
            for parent in &class.interfaces {
                if let Some(parent_name) = parent.name() {
                    stack.push(parent_name.clone());
                }
            }
        }
        false
    }

    /// Interceptable methods of the bean class and its superclasses,
    /// overridden methods de-duplicated by signature.
    fn candidate_methods(&self, class: &ClassInfo) -> Vec<(TypeName, u32, MethodInfo)> {
        let mut seen: HashSet<(SmolStr, Vec<Type>)> = HashSet::new();
        let mut result = Vec::new();
        let chain = std::iter::once(class).chain(self.index.superclasses_of(&class.name));
        for current in chain {
            if current.name == names::OBJECT {
                continue;
            }
            for (idx, method) in current.methods.iter().enumerate() {
                if method.is_constructor() || method.is_static || method.is_private {
                    continue;
                }
                let signature = (method.name.clone(), method.parameter_types());
                if !seen.insert(signature) {
                    continue;
                }
                result.push((current.name.clone(), idx as u32, method.clone()));
            }
        }
        result
    }

    fn declares_around_invoke(&self, class: &ClassInfo) -> bool {
        class.methods.iter().enumerate().any(|(idx, _)| {
            self.store.has_annotation(
                &Target::Method {
                    class: class.name.clone(),
                    method: idx as u32,
                },
                names::AROUND_INVOKE,
            )
        })
    }

    /// A final method may not be intercepted or decorated. With the
    /// transform option enabled the conflict turns into a patch, but only
    /// for methods declared on the bean class itself.
    fn check_final_methods(
        &self,
        class: &ClassInfo,
        intercepted: &[InterceptedMethod],
        decorated: &[DecoratedMethod],
        problems: &mut Problems,
        patches: &mut Vec<BytecodePatch>,
    ) {
        let affected = intercepted
            .iter()
            .map(|m| &m.method)
            .chain(decorated.iter().map(|m| &m.method));
        for method_ref in affected {
            let Some(owner) = self.index.class(&method_ref.class) else {
                continue;
            };
            let Some(method) = owner.method_at(method_ref.method) else {
                continue;
            };
            if !method.is_final {
                continue;
            }
            if self.transform_unproxyable && method_ref.class == class.name {
                patches.push(BytecodePatch::RemoveFinalFromMethod {
                    class: class.name.clone(),
                    method: method_ref.clone(),
                });
            } else {
                problems.deployment(format!(
                    "Intercepted or decorated method {}#{} may not be final",
                    method_ref.class, method.name
                ));
            }
        }
    }
}

fn push_unless_present(bindings: &mut Vec<AnnotationInstance>, binding: AnnotationInstance) {
    if !bindings.iter().any(|b| b.name == binding.name) {
        bindings.push(binding);
    }
}
