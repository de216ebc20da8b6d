//! Bean, producer, disposer, observer, interceptor and decorator discovery.
//!
//! One pass over the index. Candidate filtering happens here; structural
//! problems found while reading members are accumulated, never thrown. The
//! member scan is two-phase: producers and disposers are read from declared
//! members only (never inherited), observers are collected along the
//! superclass chain with overridden methods de-duplicated by signature.

use std::collections::HashSet;

use arbor_index::{
    AnnotationInstance, ClassInfo, ClassKind, MethodInfo, Nesting, SmolStr, Target, Type,
    TypeIndex, TypeName,
};
use tracing::{debug, warn};

use crate::bean::{
    BeanId, BeanInfo, BeanKind, DecoratorId, DecoratorInfo, DisposerId, DisposerInfo, Injection,
    InjectionKind, InjectionPointId, InjectionPointInfo, InjectionPointOwner, InterceptorId,
    InterceptorInfo, LifecycleCallbacks, MethodRef, ObserverId, ObserverInfo,
};
use crate::errors::Problems;
use crate::names;
use crate::registry::{Registry, ScopeInfo};
use crate::resolver::{default_qualifiers, Resolver};
use crate::store::AnnotationStore;
use crate::types;

/// Everything the discovery pass produced. Arena vectors are indexed by the
/// corresponding id types.
#[derive(Debug, Default)]
pub struct Discovery {
    pub beans: Vec<BeanInfo>,
    pub interceptors: Vec<InterceptorInfo>,
    pub decorators: Vec<DecoratorInfo>,
    pub observers: Vec<ObserverInfo>,
    pub disposers: Vec<DisposerInfo>,
    pub injection_points: Vec<InjectionPointInfo>,
}

impl Discovery {
    pub fn bean(&self, id: BeanId) -> &BeanInfo {
        &self.beans[id.index()]
    }

    pub fn injection_point(&self, id: InjectionPointId) -> &InjectionPointInfo {
        &self.injection_points[id.index()]
    }

    /// Used by registrars to contribute synthetic beans before `init`.
    pub(crate) fn add_bean(&mut self, build: impl FnOnce(BeanId) -> BeanInfo) -> BeanId {
        let id = BeanId(self.beans.len() as u32);
        self.beans.push(build(id));
        id
    }

    pub(crate) fn add_injection_point(
        &mut self,
        build: impl FnOnce(InjectionPointId) -> InjectionPointInfo,
    ) -> InjectionPointId {
        let id = InjectionPointId(self.injection_points.len() as u32);
        self.injection_points.push(build(id));
        id
    }
}

pub struct Discoverer<'a> {
    index: &'a TypeIndex,
    store: &'a AnnotationStore<'a>,
    registry: &'a Registry,
    /// Extra class annotations that make a class a bean candidate.
    additional_bean_defining: &'a HashSet<String>,
    out: Discovery,
}

impl<'a> Discoverer<'a> {
    pub fn new(
        index: &'a TypeIndex,
        store: &'a AnnotationStore<'a>,
        registry: &'a Registry,
        additional_bean_defining: &'a HashSet<String>,
    ) -> Self {
        Self {
            index,
            store,
            registry,
            additional_bean_defining,
            out: Discovery::default(),
        }
    }

    pub fn run(mut self, problems: &mut Problems) -> Discovery {
        let index = self.index;
        let mut candidates: Vec<&ClassInfo> = Vec::new();
        for class in index.known_classes() {
            let target = Target::Class(class.name.clone());
            if self.store.has_annotation(&target, names::INTERCEPTOR) {
                self.read_interceptor(class, problems);
                continue;
            }
            if self.store.has_annotation(&target, names::DECORATOR) {
                self.read_decorator(class, problems);
                continue;
            }
            if self.is_excluded(class) {
                continue;
            }
            let members = self.scan_members(class);
            let bean_defining = self.has_bean_defining_annotation(class);
            if !bean_defining && members.is_empty() {
                continue;
            }
            if !bean_defining {
                warn!(
                    class = %class.name,
                    "class declares producers or observers but no bean-defining annotation, using @Dependent"
                );
            }
            candidates.push(class);
        }

        for class in &candidates {
            self.read_class_bean(class, problems);
        }
        // Producers and disposers need their declaring bean's id, so they run
        // after every class bean exists.
        let class_beans: Vec<(BeanId, TypeName)> = self
            .out
            .beans
            .iter()
            .filter_map(|bean| match &bean.kind {
                BeanKind::Class { class } => Some((bean.id, class.clone())),
                _ => None,
            })
            .collect();
        for (_, class_name) in &class_beans {
            if let Some(class) = index.class(class_name) {
                self.read_disposers(class);
            }
        }
        for (bean_id, class_name) in &class_beans {
            if let Some(class) = index.class(class_name) {
                self.read_producers(*bean_id, class, problems);
                self.read_observers(*bean_id, class);
            }
        }
        debug!(
            beans = self.out.beans.len(),
            interceptors = self.out.interceptors.len(),
            decorators = self.out.decorators.len(),
            observers = self.out.observers.len(),
            "discovery finished"
        );
        self.out
    }

    fn is_excluded(&self, class: &ClassInfo) -> bool {
        if class.kind != ClassKind::Class || class.is_abstract {
            return true;
        }
        match class.nesting {
            Nesting::TopLevel | Nesting::Nested { is_static: true } => {}
            _ => return true,
        }
        let target = Target::Class(class.name.clone());
        if self.store.has_annotation(&target, names::VETOED) {
            return true;
        }
        if self
            .index
            .is_assignable_to_name(&class.name, &TypeName::new(names::EXTENSION))
        {
            return true;
        }
        !self.has_eligible_constructor(class)
    }

    // A class without a no-args constructor is only eligible with exactly one
    // constructor, or exactly one marked for injection.
    fn has_eligible_constructor(&self, class: &ClassInfo) -> bool {
        if class.has_no_args_constructor() {
            return true;
        }
        let ctors = class.constructors();
        if ctors.count() == 1 {
            return true;
        }
        self.injectable_constructors(class).len() == 1
    }

    fn injectable_constructors<'b>(&self, class: &'b ClassInfo) -> Vec<(u32, &'b MethodInfo)> {
        class
            .methods
            .iter()
            .enumerate()
            .filter(|(idx, method)| {
                method.is_constructor()
                    && self.store.has_annotation(
                        &Target::Method {
                            class: class.name.clone(),
                            method: *idx as u32,
                        },
                        names::INJECT,
                    )
            })
            .map(|(idx, method)| (idx as u32, method))
            .collect()
    }

    /// Index of the first parameter carrying `annotation`, seen through the
    /// store.
    fn parameter_with(
        &self,
        class_name: &TypeName,
        method_idx: u32,
        method: &MethodInfo,
        annotation: &str,
    ) -> Option<u32> {
        (0..method.params.len() as u32).find(|&param| {
            self.store.has_annotation(
                &Target::Parameter {
                    class: class_name.clone(),
                    method: method_idx,
                    param,
                },
                annotation,
            )
        })
    }

    fn has_bean_defining_annotation(&self, class: &ClassInfo) -> bool {
        let target = Target::Class(class.name.clone());
        self.store.annotations(&target).iter().any(|annotation| {
            self.registry.scope(annotation.name.as_str()).is_some()
                || self.registry.stereotype(annotation.name.as_str()).is_some()
                || self
                    .additional_bean_defining
                    .contains(annotation.name.as_str())
        })
    }

    /// Producer/disposer/observer members that make a class a candidate even
    /// without a bean-defining annotation.
    fn scan_members(&self, class: &ClassInfo) -> MemberScan {
        let mut scan = MemberScan::default();
        for (idx, method) in class.methods.iter().enumerate() {
            let target = Target::Method {
                class: class.name.clone(),
                method: idx as u32,
            };
            if self.store.has_annotation(&target, names::PRODUCES) {
                scan.producers += 1;
            }
            if self
                .parameter_with(&class.name, idx as u32, method, names::DISPOSES)
                .is_some()
            {
                scan.disposers += 1;
            }
        }
        for field in &class.fields {
            let target = Target::Field {
                class: class.name.clone(),
                field: field.name.clone(),
            };
            if self.store.has_annotation(&target, names::PRODUCES) {
                scan.producers += 1;
            }
        }
        scan.observers = self.observer_methods(class).len();
        scan
    }

    fn read_class_bean(&mut self, class: &ClassInfo, problems: &mut Problems) {
        let target = Target::Class(class.name.clone());
        let provider_type = if class.type_params.is_empty() {
            Type::class(class.name.clone())
        } else {
            Type::Parameterized {
                raw: class.name.clone(),
                args: class
                    .type_params
                    .iter()
                    .map(|p| Type::bounded_variable(p.name.clone(), p.bounds.iter().cloned()))
                    .collect(),
            }
        };
        let closure = types::type_closure(self.index, &provider_type);
        let bean_types = self.apply_typed_restriction(&target, closure, &class.name, problems);

        let attributes = self.bean_attributes(
            &target,
            || decapitalize(class.name.simple_name()),
            problems,
        );
        let scope = match attributes.scope.clone() {
            Some(scope) => scope,
            None => self.inherited_scope(class).unwrap_or_else(ScopeInfo::dependent),
        };

        let constructor = self.select_constructor(class);
        let bean_id = BeanId(self.out.beans.len() as u32);
        let mut injections = Vec::new();
        if let Some(ctor) = &constructor {
            injections.push(self.method_injection(
                InjectionPointOwner::Bean(bean_id),
                InjectionKind::Constructor,
                ctor,
                class,
            ));
        }
        injections.extend(self.field_and_initializer_injections(bean_id, class));

        let lifecycle = self.lifecycle_callbacks(class);

        self.out.beans.push(BeanInfo {
            id: bean_id,
            kind: BeanKind::Class {
                class: class.name.clone(),
            },
            provider_type,
            types: bean_types,
            qualifiers: attributes.qualifiers,
            scope,
            stereotypes: attributes.stereotypes,
            alternative: attributes.alternative,
            priority: attributes.priority,
            name: attributes.name,
            default_bean: attributes.default_bean,
            removable: true,
            injections,
            disposer: None,
            constructor,
            lifecycle,
        });
    }

    fn read_producers(&mut self, declaring: BeanId, class: &ClassInfo, problems: &mut Problems) {
        for (idx, method) in class.methods.iter().enumerate() {
            let target = Target::Method {
                class: class.name.clone(),
                method: idx as u32,
            };
            if !self.store.has_annotation(&target, names::PRODUCES) {
                continue;
            }
            match &method.return_type {
                Type::Void => {
                    problems.definition(format!(
                        "Producer method {}#{} returns void",
                        class.name, method.name
                    ));
                    continue;
                }
                Type::Wildcard { .. } | Type::Variable { .. } => {
                    problems.definition(format!(
                        "Producer method {}#{} returns a wildcard or type variable",
                        class.name, method.name
                    ));
                    continue;
                }
                _ => {}
            }
            let method_ref = MethodRef::new(class.name.clone(), idx as u32);
            let closure = types::producer_type_closure(self.index, &method.return_type);
            let bean_types =
                self.apply_typed_restriction(&target, closure, &class.name, problems);
            let attributes = self.bean_attributes(
                &target,
                || default_member_name(&method.name),
                problems,
            );
            let bean_id = BeanId(self.out.beans.len() as u32);
            let injections = if method.params.is_empty() {
                Vec::new()
            } else {
                vec![self.method_injection(
                    InjectionPointOwner::Bean(bean_id),
                    InjectionKind::InitializerMethod,
                    &method_ref,
                    class,
                )]
            };
            let bean = BeanInfo {
                id: bean_id,
                kind: BeanKind::ProducerMethod {
                    declaring,
                    method: method_ref,
                },
                provider_type: method.return_type.clone(),
                types: bean_types,
                qualifiers: attributes.qualifiers,
                scope: attributes.scope.unwrap_or_else(ScopeInfo::dependent),
                stereotypes: attributes.stereotypes,
                alternative: attributes.alternative,
                priority: attributes.priority,
                name: attributes.name,
                default_bean: attributes.default_bean,
                removable: true,
                injections,
                disposer: None,
                constructor: None,
                lifecycle: LifecycleCallbacks::default(),
            };
            let disposer = self.find_disposer(&bean, declaring, problems);
            let mut bean = bean;
            bean.disposer = disposer;
            self.out.beans.push(bean);
        }

        for field in &class.fields {
            let target = Target::Field {
                class: class.name.clone(),
                field: field.name.clone(),
            };
            if !self.store.has_annotation(&target, names::PRODUCES) {
                continue;
            }
            let closure = types::producer_type_closure(self.index, &field.ty);
            let bean_types =
                self.apply_typed_restriction(&target, closure, &class.name, problems);
            let attributes =
                self.bean_attributes(&target, || field.name.clone(), problems);
            let bean_id = BeanId(self.out.beans.len() as u32);
            let bean = BeanInfo {
                id: bean_id,
                kind: BeanKind::ProducerField {
                    declaring,
                    class: class.name.clone(),
                    field: field.name.clone(),
                },
                provider_type: field.ty.clone(),
                types: bean_types,
                qualifiers: attributes.qualifiers,
                scope: attributes.scope.unwrap_or_else(ScopeInfo::dependent),
                stereotypes: attributes.stereotypes,
                alternative: attributes.alternative,
                priority: attributes.priority,
                name: attributes.name,
                default_bean: attributes.default_bean,
                removable: true,
                injections: Vec::new(),
                disposer: None,
                constructor: None,
                lifecycle: LifecycleCallbacks::default(),
            };
            let disposer = self.find_disposer(&bean, declaring, problems);
            let mut bean = bean;
            bean.disposer = disposer;
            self.out.beans.push(bean);
        }
    }

    fn read_disposers(&mut self, class: &ClassInfo) {
        for (idx, method) in class.methods.iter().enumerate() {
            let disposed_param =
                self.parameter_with(&class.name, idx as u32, method, names::DISPOSES);
            let Some(disposed_param) = disposed_param else {
                continue;
            };
            let method_ref = MethodRef::new(class.name.clone(), idx as u32);
            let disposer_id = DisposerId(self.out.disposers.len() as u32);
            let disposed_qualifiers = self.parameter_qualifiers(class, idx as u32, disposed_param);
            let mut points = Vec::new();
            for (param_idx, param) in method.params.iter().enumerate() {
                if param_idx as u32 == disposed_param {
                    continue;
                }
                let point = self.parameter_injection_point(
                    InjectionPointOwner::Disposer(disposer_id),
                    class,
                    idx as u32,
                    param_idx as u32,
                    &param.ty,
                );
                points.push(point);
            }
            let injections = vec![Injection {
                kind: InjectionKind::DisposerMethod,
                target: method_ref.target(),
                points,
            }];
            self.out.disposers.push(DisposerInfo {
                id: disposer_id,
                declaring_class: class.name.clone(),
                method: method_ref,
                disposed_type: method.params[disposed_param as usize].ty.clone(),
                disposed_qualifiers,
                injections,
            });
        }
    }

    /// At most one disposer declared on the same class may match a producer.
    fn find_disposer(
        &self,
        producer: &BeanInfo,
        declaring: BeanId,
        problems: &mut Problems,
    ) -> Option<DisposerId> {
        let declaring_class = self.out.beans[declaring.index()].class_name()?.clone();
        let resolver = Resolver::new(self.index, self.registry);
        let mut matched: Vec<DisposerId> = Vec::new();
        for disposer in &self.out.disposers {
            if disposer.declaring_class != declaring_class {
                continue;
            }
            if resolver.matches(producer, &disposer.disposed_type, &disposer.disposed_qualifiers) {
                matched.push(disposer.id);
            }
        }
        if matched.len() > 1 {
            problems.definition(format!(
                "Multiple disposer methods found for {}",
                producer.describe()
            ));
            return None;
        }
        matched.first().copied()
    }

    fn read_observers(&mut self, declaring: BeanId, class: &ClassInfo) {
        let index = self.index;
        for (owner_class, idx, method, event_param, is_async) in self.observer_methods(class) {
            let observer_id = ObserverId(self.out.observers.len() as u32);
            let method_ref = MethodRef::new(owner_class.clone(), idx);
            let owner = index.class(&owner_class).unwrap_or(class);
            let observed_qualifiers = self.parameter_qualifiers(owner, idx, event_param);
            let mut points = Vec::new();
            for (param_idx, param) in method.params.iter().enumerate() {
                if param_idx as u32 == event_param {
                    continue;
                }
                let point = self.parameter_injection_point(
                    InjectionPointOwner::Observer(observer_id),
                    owner,
                    idx,
                    param_idx as u32,
                    &param.ty,
                );
                points.push(point);
            }
            let injections = vec![Injection {
                kind: InjectionKind::ObserverMethod,
                target: method_ref.target(),
                points,
            }];
            self.out.observers.push(ObserverInfo {
                id: observer_id,
                declaring_bean: Some(declaring),
                method: Some(method_ref),
                observed_type: method.params[event_param as usize].ty.clone(),
                observed_qualifiers,
                is_async,
                injections,
            });
        }
    }

    /// Observer methods declared on `class` or inherited from superclasses,
    /// overridden methods de-duplicated by signature.
    fn observer_methods(&self, class: &ClassInfo) -> Vec<(TypeName, u32, MethodInfo, u32, bool)> {
        let mut result = Vec::new();
        let mut seen_signatures: HashSet<(SmolStr, Vec<Type>)> = HashSet::new();
        let chain =
            std::iter::once(class).chain(self.index.superclasses_of(&class.name));
        for current in chain {
            for (idx, method) in current.methods.iter().enumerate() {
                if method.is_constructor() || method.is_static {
                    continue;
                }
                let signature = (method.name.clone(), method.parameter_types());
                if seen_signatures.contains(&signature) {
                    continue;
                }
                let observes =
                    self.parameter_with(&current.name, idx as u32, method, names::OBSERVES);
                let observes_async =
                    self.parameter_with(&current.name, idx as u32, method, names::OBSERVES_ASYNC);
                let (event_param, is_async) = match (observes, observes_async) {
                    (Some(p), _) => (p, false),
                    (None, Some(p)) => (p, true),
                    (None, None) => {
                        seen_signatures.insert(signature);
                        continue;
                    }
                };
                seen_signatures.insert(signature);
                result.push((current.name.clone(), idx as u32, method.clone(), event_param, is_async));
            }
        }
        result
    }

    fn read_interceptor(&mut self, class: &ClassInfo, problems: &mut Problems) {
        let target = Target::Class(class.name.clone());
        let Some(priority) = self
            .store
            .annotation(&target, names::PRIORITY)
            .and_then(|a| a.int_value("value"))
        else {
            warn!(class = %class.name, "interceptor has no @Priority, it is disabled");
            return;
        };
        let declared: Vec<AnnotationInstance> = self
            .store
            .annotations(&target)
            .iter()
            .filter(|a| self.registry.is_interceptor_binding(a.name.as_str()))
            .cloned()
            .collect();
        if declared.is_empty() {
            problems.definition(format!(
                "Interceptor {} declares no interceptor binding",
                class.name
            ));
        }
        let bindings = self
            .registry
            .expand_bindings(self.index, self.store, declared);

        let mut around_invoke = Vec::new();
        let mut around_construct = Vec::new();
        let mut post_construct = Vec::new();
        let mut pre_destroy = Vec::new();
        for (idx, _) in class.methods.iter().enumerate() {
            let method_target = Target::Method {
                class: class.name.clone(),
                method: idx as u32,
            };
            let method_ref = MethodRef::new(class.name.clone(), idx as u32);
            if self.store.has_annotation(&method_target, names::AROUND_INVOKE) {
                around_invoke.push(method_ref.clone());
            }
            if self
                .store
                .has_annotation(&method_target, names::AROUND_CONSTRUCT)
            {
                around_construct.push(method_ref.clone());
            }
            if self
                .store
                .has_annotation(&method_target, names::POST_CONSTRUCT)
            {
                post_construct.push(method_ref.clone());
            }
            if self.store.has_annotation(&method_target, names::PRE_DESTROY) {
                pre_destroy.push(method_ref);
            }
        }

        let interceptor_id = InterceptorId(self.out.interceptors.len() as u32);
        let injections =
            self.member_injections(InjectionPointOwner::Interceptor(interceptor_id), class);
        self.out.interceptors.push(InterceptorInfo {
            id: interceptor_id,
            class: class.name.clone(),
            bindings,
            priority,
            around_invoke,
            around_construct,
            post_construct,
            pre_destroy,
            injections,
        });
    }

    fn read_decorator(&mut self, class: &ClassInfo, problems: &mut Problems) {
        let target = Target::Class(class.name.clone());
        let Some(priority) = self
            .store
            .annotation(&target, names::PRIORITY)
            .and_then(|a| a.int_value("value"))
        else {
            warn!(class = %class.name, "decorator has no @Priority, it is disabled");
            return;
        };

        // The delegate injection point: a constructor parameter or an
        // injected field annotated @Delegate.
        let mut delegate: Option<(Type, Vec<AnnotationInstance>)> = None;
        for (idx, method) in class.methods.iter().enumerate() {
            if !method.is_constructor() {
                continue;
            }
            for (param_idx, param) in method.params.iter().enumerate() {
                let param_target = Target::Parameter {
                    class: class.name.clone(),
                    method: idx as u32,
                    param: param_idx as u32,
                };
                if self.store.has_annotation(&param_target, names::DELEGATE) {
                    let qualifiers =
                        self.parameter_qualifiers(class, idx as u32, param_idx as u32);
                    delegate = Some((param.ty.clone(), qualifiers));
                }
            }
        }
        for field in &class.fields {
            let field_target = Target::Field {
                class: class.name.clone(),
                field: field.name.clone(),
            };
            if self.store.has_annotation(&field_target, names::DELEGATE) {
                let qualifiers = self.target_qualifiers(&field_target);
                delegate = Some((field.ty.clone(), qualifiers));
            }
        }
        let Some((delegate_type, delegate_qualifiers)) = delegate else {
            problems.definition(format!(
                "Decorator {} declares no delegate injection point",
                class.name
            ));
            return;
        };

        let decorated_types: Vec<Type> = class
            .interfaces
            .iter()
            .filter(|interface| {
                interface
                    .name()
                    .map(|name| name != &TypeName::new("java.io.Serializable"))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        let decorator_id = DecoratorId(self.out.decorators.len() as u32);
        let injections =
            self.member_injections(InjectionPointOwner::Decorator(decorator_id), class);
        self.out.decorators.push(DecoratorInfo {
            id: decorator_id,
            class: class.name.clone(),
            delegate_type,
            delegate_qualifiers,
            decorated_types,
            priority,
            injections,
        });
    }

    // ---- shared attribute readers -------------------------------------

    fn apply_typed_restriction(
        &self,
        target: &Target,
        closure: Vec<Type>,
        described: &TypeName,
        problems: &mut Problems,
    ) -> Vec<Type> {
        let Some(typed) = self.store.annotation(target, names::TYPED) else {
            return closure;
        };
        let restriction = typed
            .value("value")
            .and_then(|value| value.as_class_array())
            .unwrap_or_default();
        types::restrict_types(closure, &restriction, described.as_str(), problems)
    }

    fn bean_attributes(
        &self,
        target: &Target,
        default_name: impl FnOnce() -> SmolStr,
        problems: &mut Problems,
    ) -> BeanAttributes {
        let annotations = self.store.annotations(target);

        let mut direct_scopes: Vec<ScopeInfo> = Vec::new();
        let mut stereotype_names: Vec<TypeName> = Vec::new();
        for annotation in annotations.iter() {
            if let Some(scope) = self.registry.scope(annotation.name.as_str()) {
                direct_scopes.push(scope.clone());
            }
            if self
                .registry
                .stereotype(annotation.name.as_str())
                .is_some()
            {
                stereotype_names.push(TypeName::new(annotation.name.as_str()));
            }
        }
        if direct_scopes.len() > 1 {
            problems.definition(format!("Multiple scopes found on {target}"));
        }
        let stereotypes = self.registry.transitive_stereotypes(stereotype_names.iter());

        let scope = direct_scopes.into_iter().next().or_else(|| {
            let mut stereotype_scopes: Vec<&TypeName> = stereotypes
                .iter()
                .filter_map(|s| s.default_scope.as_ref())
                .collect();
            stereotype_scopes.sort();
            stereotype_scopes.dedup();
            match stereotype_scopes.as_slice() {
                [] => None,
                [single] => self.registry.scope(single.as_str()).cloned(),
                _ => {
                    problems.definition(format!(
                        "All stereotypes must specify the same scope or {target} must declare a scope"
                    ));
                    None
                }
            }
        });

        let mut qualifiers: Vec<AnnotationInstance> = annotations
            .iter()
            .filter(|a| self.registry.is_qualifier(a.name.as_str()))
            .cloned()
            .collect();
        let has_real_qualifier = qualifiers
            .iter()
            .any(|q| q.name != names::NAMED && q.name != names::ANY);
        if !has_real_qualifier {
            qualifiers.push(AnnotationInstance::marker(names::DEFAULT));
        }
        if !qualifiers.iter().any(|q| q.name == names::ANY) {
            qualifiers.push(AnnotationInstance::marker(names::ANY));
        }

        let named = annotations.iter().find(|a| a.name == names::NAMED);
        let stereotype_named = stereotypes.iter().any(|s| s.is_named);
        let name = match named {
            Some(named) => match named.string_value("value") {
                Some(value) if !value.is_empty() => Some(SmolStr::new(value)),
                _ => Some(default_name()),
            },
            None if stereotype_named => Some(default_name()),
            None => None,
        };

        let alternative = annotations.iter().any(|a| a.name == names::ALTERNATIVE)
            || stereotypes.iter().any(|s| s.is_alternative);
        let priority = annotations
            .iter()
            .find(|a| a.name == names::PRIORITY)
            .and_then(|a| a.int_value("value"))
            .or_else(|| stereotypes.iter().find_map(|s| s.alternative_priority));

        let default_bean = annotations.iter().any(|a| a.name == names::DEFAULT_BEAN);

        BeanAttributes {
            scope,
            stereotypes: stereotypes.iter().map(|s| s.name.clone()).collect(),
            qualifiers,
            name,
            alternative,
            priority,
            default_bean,
        }
    }

    /// Scope inherited from the nearest superclass declaring an inheritable
    /// scope directly.
    fn inherited_scope(&self, class: &ClassInfo) -> Option<ScopeInfo> {
        for ancestor in self.index.superclasses_of(&class.name) {
            let target = Target::Class(ancestor.name.clone());
            for annotation in self.store.annotations(&target).iter() {
                if let Some(scope) = self.registry.scope(annotation.name.as_str()) {
                    if scope.is_inherited {
                        return Some(scope.clone());
                    }
                }
            }
        }
        None
    }

    fn select_constructor(&self, class: &ClassInfo) -> Option<MethodRef> {
        let injectable = self.injectable_constructors(class);
        if let [(idx, _)] = injectable.as_slice() {
            return Some(MethodRef::new(class.name.clone(), *idx));
        }
        let ctors: Vec<(usize, &MethodInfo)> = class
            .methods
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_constructor())
            .collect();
        match ctors.as_slice() {
            [(idx, _)] => Some(MethodRef::new(class.name.clone(), *idx as u32)),
            _ => ctors
                .iter()
                .find(|(_, m)| m.params.is_empty())
                .map(|(idx, _)| MethodRef::new(class.name.clone(), *idx as u32)),
        }
    }

    fn field_and_initializer_injections(
        &mut self,
        bean_id: BeanId,
        class: &ClassInfo,
    ) -> Vec<Injection> {
        self.member_injections(InjectionPointOwner::Bean(bean_id), class)
    }

    /// `@Inject` fields and initializer methods.
    fn member_injections(
        &mut self,
        owner: InjectionPointOwner,
        class: &ClassInfo,
    ) -> Vec<Injection> {
        let mut injections = Vec::new();
        for field in &class.fields {
            let target = Target::Field {
                class: class.name.clone(),
                field: field.name.clone(),
            };
            if !self.store.has_annotation(&target, names::INJECT) {
                continue;
            }
            let qualifiers = self.target_qualifiers(&target);
            let is_delegate = self.store.has_annotation(&target, names::DELEGATE);
            let required_type = field.ty.clone();
            let point_target = target.clone();
            let point = self.out.add_injection_point(|id| InjectionPointInfo {
                id,
                owner,
                required_type,
                required_qualifiers: qualifiers,
                target: point_target,
                is_delegate,
                is_transient: false,
            });
            injections.push(Injection {
                kind: InjectionKind::Field,
                target,
                points: vec![point],
            });
        }
        for (idx, method) in class.methods.iter().enumerate() {
            if method.is_constructor() {
                continue;
            }
            let target = Target::Method {
                class: class.name.clone(),
                method: idx as u32,
            };
            if !self.store.has_annotation(&target, names::INJECT) {
                continue;
            }
            let method_ref = MethodRef::new(class.name.clone(), idx as u32);
            injections.push(self.method_injection(
                owner,
                InjectionKind::InitializerMethod,
                &method_ref,
                class,
            ));
        }
        injections
    }

    fn method_injection(
        &mut self,
        owner: InjectionPointOwner,
        kind: InjectionKind,
        method_ref: &MethodRef,
        class: &ClassInfo,
    ) -> Injection {
        let Some(method) = class.method_at(method_ref.method) else {
            return Injection {
                kind,
                target: method_ref.target(),
                points: Vec::new(),
            };
        };
        let method = method.clone();
        let mut points = Vec::new();
        for (param_idx, param) in method.params.iter().enumerate() {
            let point = self.parameter_injection_point(
                owner,
                class,
                method_ref.method,
                param_idx as u32,
                &param.ty,
            );
            points.push(point);
        }
        Injection {
            kind,
            target: method_ref.target(),
            points,
        }
    }

    fn parameter_injection_point(
        &mut self,
        owner: InjectionPointOwner,
        class: &ClassInfo,
        method: u32,
        param: u32,
        ty: &Type,
    ) -> InjectionPointId {
        let target = Target::Parameter {
            class: class.name.clone(),
            method,
            param,
        };
        let qualifiers = self.parameter_qualifiers(class, method, param);
        let is_delegate = self.store.has_annotation(&target, names::DELEGATE);
        let is_transient = self
            .store
            .has_annotation(&target, names::TRANSIENT_REFERENCE);
        self.out.add_injection_point(|id| InjectionPointInfo {
            id,
            owner,
            required_type: ty.clone(),
            required_qualifiers: qualifiers,
            target,
            is_delegate,
            is_transient,
        })
    }

    fn parameter_qualifiers(
        &self,
        class: &ClassInfo,
        method: u32,
        param: u32,
    ) -> Vec<AnnotationInstance> {
        self.target_qualifiers(&Target::Parameter {
            class: class.name.clone(),
            method,
            param,
        })
    }

    fn target_qualifiers(&self, target: &Target) -> Vec<AnnotationInstance> {
        let qualifiers: Vec<AnnotationInstance> = self
            .store
            .annotations(target)
            .iter()
            .filter(|a| self.registry.is_qualifier(a.name.as_str()))
            .cloned()
            .collect();
        if qualifiers.is_empty() {
            default_qualifiers()
        } else {
            qualifiers
        }
    }

    /// `@PostConstruct`/`@PreDestroy` callbacks, superclass-first.
    fn lifecycle_callbacks(&self, class: &ClassInfo) -> LifecycleCallbacks {
        let mut chain: Vec<&ClassInfo> = self.index.superclasses_of(&class.name).collect();
        chain.reverse();
        chain.push(class);
        let mut callbacks = LifecycleCallbacks::default();
        for current in chain {
            for (idx, method) in current.methods.iter().enumerate() {
                if method.is_constructor() || method.is_static {
                    continue;
                }
                let target = Target::Method {
                    class: current.name.clone(),
                    method: idx as u32,
                };
                let method_ref = MethodRef::new(current.name.clone(), idx as u32);
                if self.store.has_annotation(&target, names::POST_CONSTRUCT) {
                    callbacks.post_construct.push(method_ref.clone());
                }
                if self.store.has_annotation(&target, names::PRE_DESTROY) {
                    callbacks.pre_destroy.push(method_ref);
                }
            }
        }
        callbacks
    }
}

#[derive(Default)]
struct MemberScan {
    producers: usize,
    disposers: usize,
    observers: usize,
}

impl MemberScan {
    fn is_empty(&self) -> bool {
        self.producers == 0 && self.disposers == 0 && self.observers == 0
    }
}

struct BeanAttributes {
    scope: Option<ScopeInfo>,
    stereotypes: Vec<TypeName>,
    qualifiers: Vec<AnnotationInstance>,
    name: Option<SmolStr>,
    alternative: bool,
    priority: Option<i64>,
    default_bean: bool,
}

/// JavaBean-style decapitalization: `Foo` becomes `foo`, but a leading pair
/// of capitals (`URLMatcher`) is preserved.
pub(crate) fn decapitalize(simple_name: &str) -> SmolStr {
    let mut chars: Vec<char> = simple_name.chars().collect();
    match chars.as_slice() {
        [] => SmolStr::default(),
        [_] => SmolStr::new(simple_name.to_lowercase()),
        [first, second, ..] => {
            if first.is_uppercase() && second.is_uppercase() {
                SmolStr::new(simple_name)
            } else {
                chars[0] = chars[0].to_lowercase().next().unwrap_or(chars[0]);
                SmolStr::new(chars.into_iter().collect::<String>())
            }
        }
    }
}

/// Default name for a producer method: JavaBean getter prefixes are
/// stripped, the rest decapitalized.
pub(crate) fn default_member_name(method_name: &str) -> SmolStr {
    for prefix in ["get", "is"] {
        if let Some(rest) = method_name.strip_prefix(prefix) {
            if rest.chars().next().map(char::is_uppercase).unwrap_or(false) {
                return decapitalize(rest);
            }
        }
    }
    SmolStr::new(method_name)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn decapitalization_preserves_leading_acronyms() {
        assert_eq!(decapitalize("Foo"), "foo");
        assert_eq!(decapitalize("URLMatcher"), "URLMatcher");
        assert_eq!(decapitalize("X"), "x");
    }

    #[test]
    fn producer_names_strip_getter_prefixes() {
        assert_eq!(default_member_name("getConnection"), "connection");
        assert_eq!(default_member_name("isEnabled"), "enabled");
        assert_eq!(default_member_name("produce"), "produce");
        assert_eq!(default_member_name("getter"), "getter");
    }
}
