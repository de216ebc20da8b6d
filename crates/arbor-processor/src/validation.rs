//! Deployment-wide validation of the resolved model.
//!
//! Runs after `init` and pruning. Collects problems instead of failing fast;
//! the caller converts them at the final checkpoint.

use std::collections::HashMap;

use arbor_index::TypeIndex;
use smol_str::SmolStr;

use crate::bean::{BeanId, BeanInfo};
use crate::errors::Problems;
use crate::interception::BytecodePatch;
use crate::resolver::Resolver;

/// External validator hook: receives the resolved model and the problem
/// accumulator.
pub trait DeploymentValidator {
    fn validate(&self, deployment: &crate::deployment::ResolvedDeployment, problems: &mut Problems);
}

/// Two beans sharing a name must still resolve unambiguously; otherwise one
/// problem naming all contenders is reported per name.
pub fn validate_bean_names(resolver: &Resolver<'_>, beans: &[BeanInfo], problems: &mut Problems) {
    let mut by_name: HashMap<&SmolStr, Vec<BeanId>> = HashMap::new();
    for bean in beans {
        if let Some(name) = &bean.name {
            by_name.entry(name).or_default().push(bean.id);
        }
    }
    let mut names: Vec<_> = by_name.into_iter().collect();
    names.sort_by(|(a, _), (b, _)| a.cmp(b));
    for (name, ids) in names {
        if ids.len() < 2 {
            continue;
        }
        if resolver.resolve_ambiguity(beans, &ids).is_some() {
            continue;
        }
        let mut contenders: Vec<String> = ids
            .iter()
            .map(|id| beans[id.index()].describe())
            .collect();
        contenders.sort();
        problems.deployment(format!(
            "Unresolvable ambiguous bean name \"{name}\":\n\t- {}",
            contenders.join("\n\t- ")
        ));
    }
}

/// Normal-scoped beans get a client proxy, so their class must be
/// subclassable and instantiable without arguments.
pub fn validate_proxyability(
    index: &TypeIndex,
    beans: &[BeanInfo],
    transform_unproxyable: bool,
    problems: &mut Problems,
    patches: &mut Vec<BytecodePatch>,
) {
    for bean in beans {
        if !bean.scope.is_normal || !bean.is_class_bean() {
            continue;
        }
        let Some(class_name) = bean.class_name() else {
            continue;
        };
        let Some(class) = index.class(class_name) else {
            continue;
        };
        if class.is_final {
            if transform_unproxyable {
                patches.push(BytecodePatch::RemoveFinalFromClass {
                    class: class.name.clone(),
                });
            } else {
                problems.deployment(format!(
                    "Normal scoped bean class {} may not be final",
                    class.name
                ));
            }
        }
        match class.no_args_constructor() {
            Some(ctor) if ctor.is_private => {
                problems.deployment(format!(
                    "Normal scoped bean {} declares a private no-args constructor",
                    class.name
                ));
            }
            Some(_) => {}
            None if class.has_no_args_constructor() => {}
            None => {
                problems.deployment(format!(
                    "Normal scoped bean {} must declare a non-private no-args constructor",
                    class.name
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use arbor_index::{AnnotationInstance, ClassBuilder, MethodBuilder, Type, TypeName};

    use super::*;
    use crate::bean::{BeanKind, LifecycleCallbacks};
    use crate::names;
    use crate::registry::{Registry, ScopeInfo};
    use crate::resolver::default_qualifiers;
    use crate::store::AnnotationStore;

    fn named_bean(id: u32, class: &str, name: &str) -> BeanInfo {
        BeanInfo {
            id: BeanId(id),
            kind: BeanKind::Class {
                class: TypeName::new(class),
            },
            provider_type: Type::class(class),
            types: vec![Type::class(class), Type::class(names::OBJECT)],
            qualifiers: default_qualifiers(),
            scope: ScopeInfo::dependent(),
            stereotypes: Vec::new(),
            alternative: false,
            priority: None,
            name: Some(SmolStr::new(name)),
            default_bean: false,
            removable: true,
            injections: Vec::new(),
            disposer: None,
            constructor: None,
            lifecycle: LifecycleCallbacks::default(),
        }
    }

    #[test]
    fn duplicate_names_yield_one_problem_per_name() {
        let index = arbor_index::TypeIndex::builder().build();
        let store = AnnotationStore::new(&index, Vec::new());
        let mut problems = Problems::new();
        let registry = Registry::build(&index, &store, &[], &HashMap::new(), &mut problems);
        let resolver = Resolver::new(&index, &registry);

        let beans = vec![
            named_bean(0, "com.acme.A", "foo"),
            named_bean(1, "com.acme.B", "foo"),
        ];
        validate_bean_names(&resolver, &beans, &mut problems);
        assert_eq!(problems.len(), 1);
        let err = problems.checkpoint().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ambiguous bean name \"foo\""));
        assert!(message.contains("com.acme.A"));
        assert!(message.contains("com.acme.B"));
    }

    #[test]
    fn final_normal_scoped_class_is_rejected_or_patched() {
        let mut builder = arbor_index::TypeIndex::builder();
        builder.add(
            ClassBuilder::new("com.acme.Svc")
                .final_class()
                .annotate(AnnotationInstance::marker(names::APPLICATION_SCOPED))
                .method(MethodBuilder::new("work", Type::Void))
                .build(),
        );
        let index = builder.build();
        let mut bean = named_bean(0, "com.acme.Svc", "svc");
        bean.name = None;
        bean.scope = ScopeInfo::new(names::APPLICATION_SCOPED, true, true);
        let beans = vec![bean];

        let mut problems = Problems::new();
        let mut patches = Vec::new();
        validate_proxyability(&index, &beans, false, &mut problems, &mut patches);
        assert_eq!(problems.len(), 1);
        assert!(patches.is_empty());

        let mut problems = Problems::new();
        let mut patches = Vec::new();
        validate_proxyability(&index, &beans, true, &mut problems, &mut patches);
        assert!(problems.is_empty());
        assert_eq!(
            patches,
            vec![BytecodePatch::RemoveFinalFromClass {
                class: TypeName::new("com.acme.Svc"),
            }]
        );
    }
}
