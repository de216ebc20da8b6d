//! Build-time CDI container generator core.
//!
//! Given an immutable [`arbor_index::TypeIndex`] snapshot, the processor
//! discovers beans, observers, interceptors and decorators, runs typesafe
//! resolution over every injection point, computes per-bean interception and
//! decoration chains, prunes unused beans and validates the result. The
//! output is a frozen [`deployment::ResolvedDeployment`] consumed by a code
//! emission layer; no runtime reflection is involved anywhere.
//!
//! The pipeline is a single-threaded batch:
//!
//! ```text
//! index -> annotation store -> registry -> discovery -> init -> prune -> validate -> freeze
//! ```
//!
//! Errors are accumulated and converted at the checkpoints after `init` and
//! after `validate`, so one run reports every problem it found.

pub mod bean;
pub mod configurator;
pub mod deployment;
pub mod discovery;
pub mod errors;
pub mod interception;
pub mod names;
pub mod pruning;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod types;
pub mod validation;

pub use configurator::{BeanRegistrar, ContextRegistrar, ObserverRegistrar};
pub use validation::DeploymentValidator;

pub use bean::{
    BeanId, BeanInfo, BeanKind, DecoratorId, DecoratorInfo, DisposerId, DisposerInfo, Injection,
    InjectionKind, InjectionPointId, InjectionPointInfo, InjectionPointOwner, InterceptionType,
    InterceptorId, InterceptorInfo, MethodRef, ObserverId, ObserverInfo,
};
pub use deployment::{DeploymentBuilder, ResolvedBean, ResolvedDeployment, ResolvedInjectionPoint};
pub use errors::{DeploymentError, Problem, Problems};
pub use interception::{BytecodePatch, InterceptionModel};
pub use registry::{QualifierInfo, Registry, ScopeInfo, StereotypeInfo};
pub use resolver::Resolver;
pub use store::{AnnotationStore, AnnotationTransformer};
