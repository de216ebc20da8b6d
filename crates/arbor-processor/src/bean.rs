//! The discovered bean model.
//!
//! Everything here is produced by the discovery pass and append-only
//! afterwards. Identity is an arena index assigned at creation; it never
//! changes and never depends on a description string. Interception and
//! decoration data lives on the separate resolved model, not here.

use std::fmt;

use arbor_index::{AnnotationInstance, SmolStr, Target, Type, TypeName};
use serde::{Deserialize, Serialize};

use crate::registry::ScopeInfo;

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident, $tag:literal) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "#{}"), self.0)
            }
        }
    };
}

arena_id!(BeanId, "bean");
arena_id!(ObserverId, "observer");
arena_id!(InterceptorId, "interceptor");
arena_id!(DecoratorId, "decorator");
arena_id!(DisposerId, "disposer");
arena_id!(InjectionPointId, "injection-point");

/// A method addressed by declaring class and declaration index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub class: TypeName,
    pub method: u32,
}

impl MethodRef {
    pub fn new(class: TypeName, method: u32) -> Self {
        Self { class, method }
    }

    pub fn target(&self) -> Target {
        Target::Method {
            class: self.class.clone(),
            method: self.method,
        }
    }
}

/// How a bean's instances come into existence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeanKind {
    Class {
        class: TypeName,
    },
    ProducerMethod {
        declaring: BeanId,
        method: MethodRef,
    },
    ProducerField {
        declaring: BeanId,
        class: TypeName,
        field: SmolStr,
    },
    Synthetic {
        label: SmolStr,
    },
}

impl BeanKind {
    /// The bean whose instance supplies the producer receiver, if any.
    pub fn declaring_bean(&self) -> Option<BeanId> {
        match self {
            BeanKind::ProducerMethod { declaring, .. }
            | BeanKind::ProducerField { declaring, .. } => Some(*declaring),
            BeanKind::Class { .. } | BeanKind::Synthetic { .. } => None,
        }
    }

    pub fn class_name(&self) -> Option<&TypeName> {
        match self {
            BeanKind::Class { class } => Some(class),
            BeanKind::ProducerMethod { method, .. } => Some(&method.class),
            BeanKind::ProducerField { class, .. } => Some(class),
            BeanKind::Synthetic { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InjectionKind {
    Constructor,
    Field,
    InitializerMethod,
    DisposerMethod,
    ObserverMethod,
    Synthetic,
}

/// One injection site (a constructor, a field, an initializer method, ...)
/// and the points it contributes, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injection {
    pub kind: InjectionKind,
    pub target: Target,
    pub points: Vec<InjectionPointId>,
}

/// Who declares an injection point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InjectionPointOwner {
    Bean(BeanId),
    Interceptor(InterceptorId),
    Decorator(DecoratorId),
    Observer(ObserverId),
    Disposer(DisposerId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionPointInfo {
    pub id: InjectionPointId,
    pub owner: InjectionPointOwner,
    pub required_type: Type,
    pub required_qualifiers: Vec<AnnotationInstance>,
    pub target: Target,
    /// Decorator delegate injection point.
    pub is_delegate: bool,
    /// Dependent instance destroyed right after the invocation completes.
    pub is_transient: bool,
}

/// Lifecycle callback methods declared on the bean class and its
/// superclasses, superclass-first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleCallbacks {
    pub post_construct: Vec<MethodRef>,
    pub pre_destroy: Vec<MethodRef>,
}

/// A discovered bean. Immutable once discovery finishes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BeanInfo {
    pub id: BeanId,
    pub kind: BeanKind,
    /// The concrete type instances of this bean are assignable to.
    pub provider_type: Type,
    /// The restricted bean-type closure, always containing `Object`.
    pub types: Vec<Type>,
    pub qualifiers: Vec<AnnotationInstance>,
    pub scope: ScopeInfo,
    pub stereotypes: Vec<TypeName>,
    pub alternative: bool,
    pub priority: Option<i64>,
    pub name: Option<SmolStr>,
    pub default_bean: bool,
    /// Candidates for unused-bean removal. Synthetic beans may opt out.
    pub removable: bool,
    pub injections: Vec<Injection>,
    pub disposer: Option<DisposerId>,
    /// Injectable constructor, for class beans.
    pub constructor: Option<MethodRef>,
    pub lifecycle: LifecycleCallbacks,
}

impl BeanInfo {
    pub fn is_class_bean(&self) -> bool {
        matches!(self.kind, BeanKind::Class { .. })
    }

    pub fn is_producer(&self) -> bool {
        matches!(
            self.kind,
            BeanKind::ProducerMethod { .. } | BeanKind::ProducerField { .. }
        )
    }

    pub fn class_name(&self) -> Option<&TypeName> {
        self.kind.class_name()
    }

    /// Diagnostic description, e.g. `CLASS bean [types=[...], qualifiers=[...]] com.acme.Foo`.
    pub fn describe(&self) -> String {
        let kind = match &self.kind {
            BeanKind::Class { .. } => "CLASS",
            BeanKind::ProducerMethod { .. } => "PRODUCER METHOD",
            BeanKind::ProducerField { .. } => "PRODUCER FIELD",
            BeanKind::Synthetic { .. } => "SYNTHETIC",
        };
        let location = match &self.kind {
            BeanKind::Class { class } => class.to_string(),
            BeanKind::ProducerMethod { method, .. } => {
                format!("{}#method[{}]", method.class, method.method)
            }
            BeanKind::ProducerField { class, field, .. } => format!("{class}#{field}"),
            BeanKind::Synthetic { label } => label.to_string(),
        };
        format!(
            "{kind} bean [types={:?}, qualifiers={:?}] {location}",
            self.types, self.qualifiers
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterceptionType {
    AroundInvoke,
    AroundConstruct,
    PostConstruct,
    PreDestroy,
}

/// A discovered interceptor class.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InterceptorInfo {
    pub id: InterceptorId,
    pub class: TypeName,
    /// Declared bindings, already expanded with transitive bindings.
    pub bindings: Vec<AnnotationInstance>,
    pub priority: i64,
    pub around_invoke: Vec<MethodRef>,
    pub around_construct: Vec<MethodRef>,
    pub post_construct: Vec<MethodRef>,
    pub pre_destroy: Vec<MethodRef>,
    pub injections: Vec<Injection>,
}

impl InterceptorInfo {
    pub fn intercepts(&self, ty: InterceptionType) -> bool {
        match ty {
            InterceptionType::AroundInvoke => !self.around_invoke.is_empty(),
            InterceptionType::AroundConstruct => !self.around_construct.is_empty(),
            InterceptionType::PostConstruct => !self.post_construct.is_empty(),
            InterceptionType::PreDestroy => !self.pre_destroy.is_empty(),
        }
    }
}

/// A discovered decorator class.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecoratorInfo {
    pub id: DecoratorId,
    pub class: TypeName,
    pub delegate_type: Type,
    pub delegate_qualifiers: Vec<AnnotationInstance>,
    /// Decorated interfaces, in declaration order.
    pub decorated_types: Vec<Type>,
    pub priority: i64,
    pub injections: Vec<Injection>,
}

/// An observer method, carrying its own injection points for the non-event
/// parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObserverInfo {
    pub id: ObserverId,
    /// Absent for synthetic observers contributed through a registrar.
    pub declaring_bean: Option<BeanId>,
    pub method: Option<MethodRef>,
    pub observed_type: Type,
    pub observed_qualifiers: Vec<AnnotationInstance>,
    pub is_async: bool,
    pub injections: Vec<Injection>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisposerInfo {
    pub id: DisposerId,
    pub declaring_class: TypeName,
    pub method: MethodRef,
    pub disposed_type: Type,
    pub disposed_qualifiers: Vec<AnnotationInstance>,
    pub injections: Vec<Injection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_render_with_their_arena_tag() {
        assert_eq!(BeanId(3).to_string(), "bean#3");
        assert_eq!(InjectionPointId(0).to_string(), "injection-point#0");
    }

    #[test]
    fn describe_names_the_kind_and_location() {
        let bean = BeanInfo {
            id: BeanId(0),
            kind: BeanKind::Class {
                class: TypeName::new("com.acme.Foo"),
            },
            provider_type: Type::class("com.acme.Foo"),
            types: vec![Type::class("com.acme.Foo"), Type::class("java.lang.Object")],
            qualifiers: Vec::new(),
            scope: ScopeInfo::dependent(),
            stereotypes: Vec::new(),
            alternative: false,
            priority: None,
            name: None,
            default_bean: false,
            removable: true,
            injections: Vec::new(),
            disposer: None,
            constructor: None,
            lifecycle: LifecycleCallbacks::default(),
        };
        let description = bean.describe();
        assert!(description.starts_with("CLASS bean"));
        assert!(description.ends_with("com.acme.Foo"));
    }
}
