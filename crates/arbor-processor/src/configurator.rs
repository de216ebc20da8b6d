//! Registration hooks for synthetic beans and custom scopes.
//!
//! External collaborators contribute through registrars invoked at fixed
//! points of the pipeline: context registrars before the registry is built
//! (their scopes must be known to stereotype interpretation and candidate
//! filtering), bean and observer registrars after discovery and before
//! `init`.

use arbor_index::{AnnotationInstance, SmolStr, Target, Type, TypeName};

use crate::bean::{
    BeanId, BeanInfo, BeanKind, Injection, InjectionKind, InjectionPointInfo, InjectionPointOwner,
    LifecycleCallbacks, ObserverId, ObserverInfo,
};
use crate::discovery::Discovery;
use crate::names;
use crate::registry::ScopeInfo;

pub trait BeanRegistrar {
    fn register(&self, context: &mut RegistrationContext<'_>);
}

pub trait ObserverRegistrar {
    fn register(&self, context: &mut RegistrationContext<'_>);
}

pub trait ContextRegistrar {
    fn register(&self, context: &mut ContextRegistrationContext);
}

/// Collects custom scopes contributed by context registrars.
#[derive(Debug, Default)]
pub struct ContextRegistrationContext {
    scopes: Vec<ScopeInfo>,
}

impl ContextRegistrationContext {
    pub fn configure(&mut self, scope_annotation: impl Into<TypeName>) -> ContextConfigurator<'_> {
        ContextConfigurator {
            out: &mut self.scopes,
            scope: ScopeInfo::new(scope_annotation, false, false),
        }
    }

    pub(crate) fn into_scopes(self) -> Vec<ScopeInfo> {
        self.scopes
    }
}

pub struct ContextConfigurator<'a> {
    out: &'a mut Vec<ScopeInfo>,
    scope: ScopeInfo,
}

impl ContextConfigurator<'_> {
    /// Mark the scope as normal (client-proxied).
    pub fn normal(mut self) -> Self {
        self.scope.is_normal = true;
        self
    }

    pub fn inherited(mut self) -> Self {
        self.scope.is_inherited = true;
        self
    }

    pub fn done(self) {
        self.out.push(self.scope);
    }
}

/// Handed to bean registrars; synthetic beans land directly in the
/// discovered set.
pub struct RegistrationContext<'a> {
    discovery: &'a mut Discovery,
}

impl<'a> RegistrationContext<'a> {
    pub(crate) fn new(discovery: &'a mut Discovery) -> Self {
        Self { discovery }
    }

    /// Start a synthetic observer for events of `observed_type`.
    pub fn configure_observer(&mut self, observed_type: Type) -> ObserverConfigurator<'_> {
        ObserverConfigurator {
            discovery: self.discovery,
            observed_type,
            observed_qualifiers: Vec::new(),
            is_async: false,
        }
    }

    pub fn configure(&mut self, bean_class: impl Into<TypeName>) -> BeanConfigurator<'_> {
        let bean_class = bean_class.into();
        BeanConfigurator {
            discovery: self.discovery,
            provider_type: Type::class(bean_class.clone()),
            label: SmolStr::new(bean_class.as_str()),
            types: vec![Type::class(bean_class)],
            qualifiers: Vec::new(),
            scope: ScopeInfo::dependent(),
            name: None,
            alternative: false,
            priority: None,
            default_bean: false,
            removable: true,
            injected: Vec::new(),
        }
    }
}

/// Builder for one synthetic observer. An empty qualifier set observes
/// every event of the type.
pub struct ObserverConfigurator<'a> {
    discovery: &'a mut Discovery,
    observed_type: Type,
    observed_qualifiers: Vec<AnnotationInstance>,
    is_async: bool,
}

impl ObserverConfigurator<'_> {
    pub fn qualifier(mut self, qualifier: AnnotationInstance) -> Self {
        self.observed_qualifiers.push(qualifier);
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    pub fn done(self) -> ObserverId {
        let id = ObserverId(self.discovery.observers.len() as u32);
        self.discovery.observers.push(ObserverInfo {
            id,
            declaring_bean: None,
            method: None,
            observed_type: self.observed_type,
            observed_qualifiers: self.observed_qualifiers,
            is_async: self.is_async,
            injections: Vec::new(),
        });
        id
    }
}

/// Builder for one synthetic bean. Nothing is registered until [`done`]
/// runs.
///
/// [`done`]: BeanConfigurator::done
pub struct BeanConfigurator<'a> {
    discovery: &'a mut Discovery,
    provider_type: Type,
    label: SmolStr,
    types: Vec<Type>,
    qualifiers: Vec<AnnotationInstance>,
    scope: ScopeInfo,
    name: Option<SmolStr>,
    alternative: bool,
    priority: Option<i64>,
    default_bean: bool,
    removable: bool,
    injected: Vec<(Type, Vec<AnnotationInstance>)>,
}

impl BeanConfigurator<'_> {
    pub fn add_type(mut self, ty: Type) -> Self {
        self.types.push(ty);
        self
    }

    pub fn qualifier(mut self, qualifier: AnnotationInstance) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    pub fn scope(mut self, scope: ScopeInfo) -> Self {
        self.scope = scope;
        self
    }

    pub fn named(mut self, name: impl Into<SmolStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn alternative(mut self, priority: i64) -> Self {
        self.alternative = true;
        self.priority = Some(priority);
        self
    }

    pub fn default_bean(mut self) -> Self {
        self.default_bean = true;
        self
    }

    /// Keep the bean even when nothing refers to it.
    pub fn unremovable(mut self) -> Self {
        self.removable = false;
        self
    }

    /// Declare a dependency of the synthetic instance.
    pub fn inject(mut self, required: Type, qualifiers: Vec<AnnotationInstance>) -> Self {
        self.injected.push((required, qualifiers));
        self
    }

    pub fn done(self) -> BeanId {
        let BeanConfigurator {
            discovery,
            provider_type,
            label,
            mut types,
            mut qualifiers,
            scope,
            name,
            alternative,
            priority,
            default_bean,
            removable,
            injected,
        } = self;

        let object = Type::class(names::OBJECT);
        if !types.contains(&object) {
            types.push(object);
        }
        let has_real_qualifier = qualifiers
            .iter()
            .any(|q| q.name != names::NAMED && q.name != names::ANY);
        if !has_real_qualifier {
            qualifiers.push(AnnotationInstance::marker(names::DEFAULT));
        }
        if !qualifiers.iter().any(|q| q.name == names::ANY) {
            qualifiers.push(AnnotationInstance::marker(names::ANY));
        }

        let bean_id = BeanId(discovery.beans.len() as u32);
        let mut points = Vec::new();
        for (required, point_qualifiers) in injected {
            let target = Target::Synthetic(label.clone());
            let point_qualifiers = if point_qualifiers.is_empty() {
                crate::resolver::default_qualifiers()
            } else {
                point_qualifiers
            };
            let point = discovery.add_injection_point(|id| InjectionPointInfo {
                id,
                owner: InjectionPointOwner::Bean(bean_id),
                required_type: required,
                required_qualifiers: point_qualifiers,
                target,
                is_delegate: false,
                is_transient: false,
            });
            points.push(point);
        }
        let injections = if points.is_empty() {
            Vec::new()
        } else {
            vec![Injection {
                kind: InjectionKind::Synthetic,
                target: Target::Synthetic(label.clone()),
                points,
            }]
        };

        discovery.add_bean(|id| BeanInfo {
            id,
            kind: BeanKind::Synthetic { label },
            provider_type,
            types,
            qualifiers,
            scope,
            stereotypes: Vec::new(),
            alternative,
            priority,
            name,
            default_bean,
            removable,
            injections,
            disposer: None,
            constructor: None,
            lifecycle: LifecycleCallbacks::default(),
        })
    }
}
