//! Qualifier, interceptor-binding, stereotype and scope registry.
//!
//! Built once per deployment, after context registrars ran (custom scopes must
//! be known before stereotypes are interpreted) and before discovery. All
//! transitive closures here are guarded by seen-sets, including the
//! bindings-on-bindings closure.

use std::collections::{HashMap, HashSet};

use arbor_index::{AnnotationInstance, ClassInfo, SmolStr, Target, TypeIndex, TypeName};
use tracing::debug;

use crate::errors::Problems;
use crate::names;
use crate::store::AnnotationStore;

/// A discovered qualifier or interceptor-binding annotation class, with the
/// set of members excluded from value matching.
#[derive(Debug, Clone)]
pub struct QualifierInfo {
    pub class: TypeName,
    pub non_binding: HashSet<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScopeInfo {
    pub name: TypeName,
    pub is_normal: bool,
    /// Whether class beans inherit this scope from superclasses.
    pub is_inherited: bool,
}

impl ScopeInfo {
    pub fn new(name: impl Into<TypeName>, is_normal: bool, is_inherited: bool) -> Self {
        Self {
            name: name.into(),
            is_normal,
            is_inherited,
        }
    }

    pub fn dependent() -> Self {
        Self::new(names::DEPENDENT, false, false)
    }
}

#[derive(Debug, Clone)]
pub struct StereotypeInfo {
    pub name: TypeName,
    pub default_scope: Option<TypeName>,
    pub interceptor_bindings: Vec<AnnotationInstance>,
    pub is_alternative: bool,
    pub alternative_priority: Option<i64>,
    pub is_named: bool,
    /// Other stereotypes this one is annotated with.
    pub parents: Vec<TypeName>,
}

#[derive(Debug)]
pub struct Registry {
    qualifiers: HashMap<TypeName, QualifierInfo>,
    interceptor_bindings: HashMap<TypeName, QualifierInfo>,
    stereotypes: HashMap<TypeName, StereotypeInfo>,
    scopes: HashMap<TypeName, ScopeInfo>,
}

impl Registry {
    /// Scan the index for qualifier, binding, stereotype and scope
    /// declarations. `custom_scopes` come from context registrars;
    /// `non_binding_overrides` maps qualifier names to member names treated
    /// as non-binding deployment-wide.
    pub fn build(
        index: &TypeIndex,
        store: &AnnotationStore<'_>,
        custom_scopes: &[ScopeInfo],
        non_binding_overrides: &HashMap<String, HashSet<String>>,
        problems: &mut Problems,
    ) -> Registry {
        let mut scopes = HashMap::new();
        for scope in built_in_scopes() {
            scopes.insert(scope.name.clone(), scope);
        }
        for scope in custom_scopes {
            scopes.insert(scope.name.clone(), scope.clone());
        }

        let qualifiers = annotation_classes(index, store, names::QUALIFIER, non_binding_overrides);
        let interceptor_bindings =
            annotation_classes(index, store, names::INTERCEPTOR_BINDING, non_binding_overrides);
        debug!(
            qualifiers = qualifiers.len(),
            bindings = interceptor_bindings.len(),
            "scanned qualifier and binding declarations"
        );

        let stereotype_names: HashSet<TypeName> = index
            .classes_with_annotation(names::STEREOTYPE)
            .iter()
            .map(|class| class.name.clone())
            .collect();
        let mut stereotypes = HashMap::new();
        for class in index.classes_with_annotation(names::STEREOTYPE) {
            let stereotype = read_stereotype(
                class,
                store,
                &scopes,
                &interceptor_bindings,
                &stereotype_names,
                problems,
            );
            stereotypes.insert(stereotype.name.clone(), stereotype);
        }

        Registry {
            qualifiers,
            interceptor_bindings,
            stereotypes,
            scopes,
        }
    }

    pub fn qualifier(&self, name: &TypeName) -> Option<&QualifierInfo> {
        self.qualifiers.get(name)
    }

    pub fn is_qualifier(&self, name: &str) -> bool {
        // Built-in qualifiers need no annotation class in the index.
        name == names::DEFAULT
            || name == names::ANY
            || name == names::NAMED
            || self.qualifiers.contains_key(&TypeName::new(name))
    }

    /// Member names ignored when matching values of `qualifier`.
    pub fn non_binding_members(&self, qualifier: &str) -> Option<&HashSet<SmolStr>> {
        let name = TypeName::new(qualifier);
        self.qualifiers
            .get(&name)
            .or_else(|| self.interceptor_bindings.get(&name))
            .map(|info| &info.non_binding)
    }

    pub fn interceptor_binding(&self, name: &str) -> Option<&QualifierInfo> {
        self.interceptor_bindings.get(&TypeName::new(name))
    }

    pub fn is_interceptor_binding(&self, name: &str) -> bool {
        self.interceptor_bindings.contains_key(&TypeName::new(name))
    }

    pub fn scope(&self, name: &str) -> Option<&ScopeInfo> {
        self.scopes.get(&TypeName::new(name))
    }

    pub fn stereotype(&self, name: &str) -> Option<&StereotypeInfo> {
        self.stereotypes.get(&TypeName::new(name))
    }

    /// Reflexive-transitive closure over stereotype parent edges, cycle-safe.
    /// The result is name-sorted for determinism.
    pub fn transitive_stereotypes<'a>(
        &self,
        direct: impl IntoIterator<Item = &'a TypeName>,
    ) -> Vec<&StereotypeInfo> {
        let mut seen: HashSet<TypeName> = HashSet::new();
        let mut queue: Vec<TypeName> = direct.into_iter().cloned().collect();
        let mut result = Vec::new();
        while let Some(name) = queue.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(info) = self.stereotypes.get(&name) {
                queue.extend(info.parents.iter().cloned());
                result.push(name);
            }
        }
        let mut infos: Vec<&StereotypeInfo> = result
            .iter()
            .filter_map(|name| self.stereotypes.get(name))
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Expand a binding set with bindings declared on the binding annotation
    /// classes themselves (bindings on bindings), transitively. A seen-set
    /// keyed by annotation name makes cyclic declarations terminate.
    pub fn expand_bindings(
        &self,
        index: &TypeIndex,
        store: &AnnotationStore<'_>,
        bindings: Vec<AnnotationInstance>,
    ) -> Vec<AnnotationInstance> {
        let mut seen: HashSet<TypeName> = HashSet::new();
        let mut result: Vec<AnnotationInstance> = Vec::new();
        let mut queue = bindings;
        while let Some(binding) = queue.pop() {
            if !seen.insert(binding.name.clone()) {
                continue;
            }
            if index.class(&binding.name).is_some() {
                let target = Target::Class(binding.name.clone());
                for meta in store.annotations(&target).iter() {
                    if self.is_interceptor_binding(meta.name.as_str()) {
                        queue.push(meta.clone());
                    }
                }
            }
            result.push(binding);
        }
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }
}

fn built_in_scopes() -> Vec<ScopeInfo> {
    vec![
        ScopeInfo::new(names::DEPENDENT, false, false),
        ScopeInfo::new(names::SINGLETON, false, false),
        ScopeInfo::new(names::APPLICATION_SCOPED, true, true),
        ScopeInfo::new(names::REQUEST_SCOPED, true, true),
        ScopeInfo::new(names::SESSION_SCOPED, true, true),
    ]
}

fn annotation_classes(
    index: &TypeIndex,
    store: &AnnotationStore<'_>,
    meta_annotation: &str,
    non_binding_overrides: &HashMap<String, HashSet<String>>,
) -> HashMap<TypeName, QualifierInfo> {
    let mut result = HashMap::new();
    for class in index.classes_with_annotation(meta_annotation) {
        let mut non_binding: HashSet<SmolStr> = HashSet::new();
        // Annotation members are modeled as no-arg methods.
        for (idx, method) in class.methods.iter().enumerate() {
            let target = Target::Method {
                class: class.name.clone(),
                method: idx as u32,
            };
            if store.has_annotation(&target, names::NONBINDING) {
                non_binding.insert(method.name.clone());
            }
        }
        if let Some(overrides) = non_binding_overrides.get(class.name.as_str()) {
            non_binding.extend(overrides.iter().map(SmolStr::new));
        }
        result.insert(
            class.name.clone(),
            QualifierInfo {
                class: class.name.clone(),
                non_binding,
            },
        );
    }
    result
}

fn read_stereotype(
    class: &ClassInfo,
    store: &AnnotationStore<'_>,
    scopes: &HashMap<TypeName, ScopeInfo>,
    interceptor_bindings: &HashMap<TypeName, QualifierInfo>,
    stereotype_names: &HashSet<TypeName>,
    problems: &mut Problems,
) -> StereotypeInfo {
    let target = Target::Class(class.name.clone());
    let annotations = store.annotations(&target);

    let mut default_scope: Option<TypeName> = None;
    let mut bindings = Vec::new();
    let mut is_alternative = false;
    let mut alternative_priority = None;
    let mut is_named = false;
    let mut parents = Vec::new();

    for annotation in annotations.iter() {
        let name = TypeName::new(annotation.name.as_str());
        if scopes.contains_key(&name) {
            if default_scope.is_some() {
                problems.definition(format!(
                    "Multiple scopes found on stereotype {}",
                    class.name
                ));
            } else {
                default_scope = Some(name);
            }
        } else if interceptor_bindings.contains_key(&name) {
            bindings.push(annotation.clone());
        } else if annotation.name == names::ALTERNATIVE {
            is_alternative = true;
        } else if annotation.name == names::PRIORITY {
            alternative_priority = annotation.int_value("value");
        } else if annotation.name == names::NAMED {
            match annotation.string_value("value") {
                Some(value) if !value.is_empty() => problems.definition(format!(
                    "Stereotype {} declares @Named with a non-empty value",
                    class.name
                )),
                _ => is_named = true,
            }
        } else if name != class.name && stereotype_names.contains(&name) {
            parents.push(name);
        }
    }

    StereotypeInfo {
        name: class.name.clone(),
        default_scope,
        interceptor_bindings: bindings,
        is_alternative,
        alternative_priority,
        is_named,
        parents,
    }
}

#[cfg(test)]
mod tests {
    use arbor_index::{ClassBuilder, MethodBuilder, Type, TypeIndex, Value};

    use super::*;

    fn stereotype_class(name: &str) -> ClassBuilder {
        ClassBuilder::new(name)
            .annotation_type()
            .annotate(AnnotationInstance::marker(names::STEREOTYPE))
    }

    fn build_registry(index: &TypeIndex) -> (Registry, Problems) {
        let store = AnnotationStore::new(index, Vec::new());
        let mut problems = Problems::new();
        let registry = Registry::build(index, &store, &[], &HashMap::new(), &mut problems);
        (registry, problems)
    }

    #[test]
    fn non_binding_members_are_collected() {
        let mut builder = TypeIndex::builder();
        builder.add(
            ClassBuilder::new("com.acme.Tag")
                .annotation_type()
                .annotate(AnnotationInstance::marker(names::QUALIFIER))
                .method(
                    MethodBuilder::new("description", Type::class("java.lang.String"))
                        .annotate(AnnotationInstance::marker(names::NONBINDING)),
                )
                .method(MethodBuilder::new("value", Type::class("java.lang.String")))
                .build(),
        );
        let index = builder.build();
        let (registry, problems) = build_registry(&index);
        assert!(problems.is_empty());
        let non_binding = registry.non_binding_members("com.acme.Tag").unwrap();
        assert!(non_binding.contains("description"));
        assert!(!non_binding.contains("value"));
    }

    #[test]
    fn cyclic_stereotype_parents_terminate() {
        let mut builder = TypeIndex::builder();
        builder
            .add(
                stereotype_class("com.acme.A")
                    .annotate(AnnotationInstance::marker("com.acme.B"))
                    .build(),
            )
            .add(
                stereotype_class("com.acme.B")
                    .annotate(AnnotationInstance::marker("com.acme.A"))
                    .build(),
            );
        let index = builder.build();
        let (registry, problems) = build_registry(&index);
        assert!(problems.is_empty());
        let a = TypeName::new("com.acme.A");
        let closure = registry.transitive_stereotypes([&a]);
        let names: Vec<_> = closure.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["com.acme.A", "com.acme.B"]);
    }

    #[test]
    fn cyclic_binding_on_binding_terminates() {
        let mut builder = TypeIndex::builder();
        builder
            .add(
                ClassBuilder::new("com.acme.Logged")
                    .annotation_type()
                    .annotate(AnnotationInstance::marker(names::INTERCEPTOR_BINDING))
                    .annotate(AnnotationInstance::marker("com.acme.Timed"))
                    .build(),
            )
            .add(
                ClassBuilder::new("com.acme.Timed")
                    .annotation_type()
                    .annotate(AnnotationInstance::marker(names::INTERCEPTOR_BINDING))
                    .annotate(AnnotationInstance::marker("com.acme.Logged"))
                    .build(),
            );
        let index = builder.build();
        let store = AnnotationStore::new(&index, Vec::new());
        let (registry, _) = build_registry(&index);
        let expanded = registry.expand_bindings(
            &index,
            &store,
            vec![AnnotationInstance::marker("com.acme.Logged")],
        );
        let names: Vec<_> = expanded.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["com.acme.Logged", "com.acme.Timed"]);
    }

    #[test]
    fn stereotype_with_scope_and_priority() {
        let mut builder = TypeIndex::builder();
        builder.add(
            stereotype_class("com.acme.Service")
                .annotate(AnnotationInstance::marker(names::APPLICATION_SCOPED))
                .annotate(AnnotationInstance::marker(names::ALTERNATIVE))
                .annotate(AnnotationInstance::with_value(
                    names::PRIORITY,
                    "value",
                    Value::Int(50),
                ))
                .annotate(AnnotationInstance::marker(names::NAMED))
                .build(),
        );
        let index = builder.build();
        let (registry, problems) = build_registry(&index);
        assert!(problems.is_empty());
        let stereotype = registry.stereotype("com.acme.Service").unwrap();
        assert_eq!(
            stereotype.default_scope.as_ref().map(|s| s.as_str()),
            Some(names::APPLICATION_SCOPED)
        );
        assert!(stereotype.is_alternative);
        assert_eq!(stereotype.alternative_priority, Some(50));
        assert!(stereotype.is_named);
    }

    #[test]
    fn stereotype_with_two_scopes_is_rejected() {
        let mut builder = TypeIndex::builder();
        builder.add(
            stereotype_class("com.acme.Broken")
                .annotate(AnnotationInstance::marker(names::APPLICATION_SCOPED))
                .annotate(AnnotationInstance::marker(names::REQUEST_SCOPED))
                .build(),
        );
        let index = builder.build();
        let (_, mut problems) = build_registry(&index);
        let err = problems.checkpoint().unwrap_err();
        assert!(err.to_string().contains("Multiple scopes found on stereotype"));
    }

    #[test]
    fn stereotype_named_with_value_is_rejected() {
        let mut builder = TypeIndex::builder();
        builder.add(
            stereotype_class("com.acme.Broken")
                .annotate(AnnotationInstance::with_value(
                    names::NAMED,
                    "value",
                    Value::Str("explicit".into()),
                ))
                .build(),
        );
        let index = builder.build();
        let (_, mut problems) = build_registry(&index);
        let err = problems.checkpoint().unwrap_err();
        assert!(err.to_string().contains("non-empty value"));
    }
}
