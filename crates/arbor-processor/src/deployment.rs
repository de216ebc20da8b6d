//! The deployment pipeline and the frozen hand-off model.
//!
//! Phases run strictly in order over one index snapshot: context registrars,
//! registry, discovery, bean and observer registrars, `init` (per-injection-point
//! resolution and per-bean interception), pruning, validation, freeze.
//! Problems accumulate across a phase and convert at the checkpoints after
//! `init` and after `validate`; the whole deployment fails atomically.

use std::collections::{HashMap, HashSet};

use arbor_index::{Type, TypeIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bean::{BeanId, BeanInfo, DecoratorInfo, DisposerInfo, InjectionPointId, InjectionPointInfo, InterceptorInfo, ObserverInfo};
use crate::configurator::{
    BeanRegistrar, ContextRegistrar, ContextRegistrationContext, ObserverRegistrar,
    RegistrationContext,
};
use crate::discovery::{Discoverer, Discovery};
use crate::errors::{DeploymentError, Problem, Problems};
use crate::interception::{BytecodePatch, InterceptionModel, InterceptionResolver};
use crate::names;
use crate::pruning::{prune_unused_beans, RemovalExclusion};
use crate::registry::Registry;
use crate::resolver::Resolver;
use crate::store::{AnnotationStore, AnnotationTransformer};
use crate::validation::{self, DeploymentValidator};

/// One retained bean together with its interception metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolvedBean {
    pub info: BeanInfo,
    pub interception: InterceptionModel,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolvedInjectionPoint {
    pub info: InjectionPointInfo,
    /// Absent for delegate points and built-in lookups.
    pub resolved: Option<BeanId>,
}

/// The frozen model handed to the emission layer. Plain owned data, safe
/// for parallel read.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolvedDeployment {
    /// Retained beans, ascending id.
    pub beans: Vec<ResolvedBean>,
    /// Removed during pruning, kept for diagnostics.
    pub removed_beans: Vec<BeanInfo>,
    pub interceptors: Vec<InterceptorInfo>,
    pub decorators: Vec<DecoratorInfo>,
    pub observers: Vec<ObserverInfo>,
    pub disposers: Vec<DisposerInfo>,
    pub injection_points: Vec<ResolvedInjectionPoint>,
    pub patches: Vec<BytecodePatch>,
}

impl ResolvedDeployment {
    pub fn bean(&self, id: BeanId) -> Option<&ResolvedBean> {
        self.beans
            .binary_search_by_key(&id, |bean| bean.info.id)
            .ok()
            .map(|idx| &self.beans[idx])
    }
}

/// Everything external collaborators may plug into a deployment.
#[derive(Default)]
pub struct DeploymentBuilder {
    additional_bean_defining: HashSet<String>,
    transformers: Vec<AnnotationTransformer>,
    context_registrars: Vec<Box<dyn ContextRegistrar>>,
    bean_registrars: Vec<Box<dyn BeanRegistrar>>,
    observer_registrars: Vec<Box<dyn ObserverRegistrar>>,
    validators: Vec<Box<dyn DeploymentValidator>>,
    remove_unused_beans: bool,
    removal_exclusions: Vec<RemovalExclusion>,
    transform_unproxyable: bool,
    non_binding_overrides: HashMap<String, HashSet<String>>,
}

impl DeploymentBuilder {
    pub fn new() -> Self {
        Self {
            remove_unused_beans: true,
            ..Self::default()
        }
    }

    /// An extra class annotation that makes annotated classes bean
    /// candidates.
    pub fn bean_defining_annotation(mut self, name: impl Into<String>) -> Self {
        self.additional_bean_defining.insert(name.into());
        self
    }

    pub fn annotation_transformer(mut self, transformer: AnnotationTransformer) -> Self {
        self.transformers.push(transformer);
        self
    }

    pub fn context_registrar(mut self, registrar: impl ContextRegistrar + 'static) -> Self {
        self.context_registrars.push(Box::new(registrar));
        self
    }

    pub fn bean_registrar(mut self, registrar: impl BeanRegistrar + 'static) -> Self {
        self.bean_registrars.push(Box::new(registrar));
        self
    }

    pub fn observer_registrar(mut self, registrar: impl ObserverRegistrar + 'static) -> Self {
        self.observer_registrars.push(Box::new(registrar));
        self
    }

    pub fn validator(mut self, validator: impl DeploymentValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn remove_unused_beans(mut self, enabled: bool) -> Self {
        self.remove_unused_beans = enabled;
        self
    }

    /// Beans matching the predicate survive pruning.
    pub fn removal_exclusion(
        mut self,
        exclusion: impl Fn(&BeanInfo) -> bool + 'static,
    ) -> Self {
        self.removal_exclusions.push(Box::new(exclusion));
        self
    }

    /// Downgrade unproxyable-class and final-method conflicts to bytecode
    /// patches.
    pub fn transform_unproxyable(mut self, enabled: bool) -> Self {
        self.transform_unproxyable = enabled;
        self
    }

    /// Treat `member` of `qualifier` as non-binding deployment-wide.
    pub fn non_binding_member(
        mut self,
        qualifier: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        self.non_binding_overrides
            .entry(qualifier.into())
            .or_default()
            .insert(member.into());
        self
    }

    /// Run the whole pipeline against one index snapshot.
    pub fn process(self, index: &TypeIndex) -> Result<ResolvedDeployment, DeploymentError> {
        let mut deployment = Deployment::new(index, self);
        deployment.init()?;
        deployment.validate()?;
        Ok(deployment.freeze())
    }
}

struct Deployment<'a> {
    index: &'a TypeIndex,
    store: AnnotationStore<'a>,
    registry: Registry,
    discovery: Discovery,
    options: DeploymentOptions,
    problems: Problems,
    resolutions: HashMap<InjectionPointId, BeanId>,
    models: HashMap<BeanId, InterceptionModel>,
    removed: HashSet<BeanId>,
    patches: Vec<BytecodePatch>,
}

/// The subset of builder state still needed after construction.
struct DeploymentOptions {
    validators: Vec<Box<dyn DeploymentValidator>>,
    remove_unused_beans: bool,
    removal_exclusions: Vec<RemovalExclusion>,
    transform_unproxyable: bool,
}

impl<'a> Deployment<'a> {
    fn new(index: &'a TypeIndex, builder: DeploymentBuilder) -> Self {
        let DeploymentBuilder {
            additional_bean_defining,
            transformers,
            context_registrars,
            bean_registrars,
            observer_registrars,
            validators,
            remove_unused_beans,
            removal_exclusions,
            transform_unproxyable,
            non_binding_overrides,
        } = builder;

        let mut context = ContextRegistrationContext::default();
        for registrar in &context_registrars {
            registrar.register(&mut context);
        }
        let custom_scopes = context.into_scopes();
        // Custom scope annotations are bean-defining.
        let mut additional_bean_defining = additional_bean_defining;
        for scope in &custom_scopes {
            additional_bean_defining.insert(scope.name.as_str().to_string());
        }

        let store = AnnotationStore::new(index, transformers);
        let mut problems = Problems::new();
        let registry = Registry::build(
            index,
            &store,
            &custom_scopes,
            &non_binding_overrides,
            &mut problems,
        );
        let mut discovery =
            Discoverer::new(index, &store, &registry, &additional_bean_defining)
                .run(&mut problems);

        let mut registration = RegistrationContext::new(&mut discovery);
        for registrar in &bean_registrars {
            registrar.register(&mut registration);
        }
        for registrar in &observer_registrars {
            registrar.register(&mut registration);
        }
        debug!(beans = discovery.beans.len(), "deployment constructed");

        Self {
            index,
            store,
            registry,
            discovery,
            options: DeploymentOptions {
                validators,
                remove_unused_beans,
                removal_exclusions,
                transform_unproxyable,
            },
            problems,
            resolutions: HashMap::new(),
            models: HashMap::new(),
            removed: HashSet::new(),
            patches: Vec::new(),
        }
    }

    /// Resolve every injection point, compute interception models, prune.
    /// First checkpoint.
    fn init(&mut self) -> Result<(), DeploymentError> {
        let resolver = Resolver::new(self.index, &self.registry);
        for point in &self.discovery.injection_points {
            if point.is_delegate || is_built_in_lookup(&point.required_type) {
                continue;
            }
            if matches!(point.required_type, Type::Variable { .. }) {
                self.problems.push(Problem::Definition(format!(
                    "Type variable is not a legal injection point type: {}",
                    point.target
                )));
                continue;
            }
            let candidates = resolver.resolve(
                &self.discovery.beans,
                &point.required_type,
                &point.required_qualifiers,
            );
            if candidates.is_empty() {
                let almost = resolver.almost_matching(
                    &self.discovery.beans,
                    &point.required_type,
                    &point.required_qualifiers,
                );
                self.problems.push(Problem::UnsatisfiedResolution {
                    required_type: point.required_type.clone(),
                    qualifiers: point.required_qualifiers.clone(),
                    target: point.target.to_string(),
                    almost_matched: almost
                        .iter()
                        .map(|id| self.discovery.bean(*id).describe())
                        .collect(),
                });
                continue;
            }
            match resolver.resolve_ambiguity(&self.discovery.beans, &candidates) {
                Some(bean) => {
                    self.resolutions.insert(point.id, bean);
                }
                None => {
                    self.problems.push(Problem::AmbiguousResolution {
                        required_type: point.required_type.clone(),
                        qualifiers: point.required_qualifiers.clone(),
                        target: point.target.to_string(),
                        candidates: candidates
                            .iter()
                            .map(|id| self.discovery.bean(*id).describe())
                            .collect(),
                    });
                }
            }
        }

        let interception = InterceptionResolver::new(
            self.index,
            &self.store,
            &self.registry,
            &self.discovery.interceptors,
            &self.discovery.decorators,
            self.options.transform_unproxyable,
        );
        for bean in &self.discovery.beans {
            let model = interception.resolve_bean(bean, &mut self.problems, &mut self.patches);
            self.models.insert(bean.id, model);
        }

        self.problems.checkpoint()?;

        if self.options.remove_unused_beans {
            let outcome = prune_unused_beans(
                self.index,
                &self.registry,
                &self.discovery,
                &self.resolutions,
                &self.options.removal_exclusions,
            );
            self.removed = outcome.removed;
        }
        Ok(())
    }

    /// Cross-cutting validation of the pruned model. Second checkpoint.
    fn validate(&mut self) -> Result<(), DeploymentError> {
        let resolver = Resolver::new(self.index, &self.registry);
        let live: Vec<BeanInfo> = self
            .discovery
            .beans
            .iter()
            .filter(|bean| !self.removed.contains(&bean.id))
            .cloned()
            .collect();
        validation::validate_bean_names(&resolver, &self.discovery.beans, &mut self.problems);
        validation::validate_proxyability(
            self.index,
            &live,
            self.options.transform_unproxyable,
            &mut self.problems,
            &mut self.patches,
        );
        if !self.options.validators.is_empty() {
            let preview = self.freeze_model();
            let validators = std::mem::take(&mut self.options.validators);
            for validator in &validators {
                validator.validate(&preview, &mut self.problems);
            }
            self.options.validators = validators;
        }
        self.problems.checkpoint()
    }

    fn freeze(self) -> ResolvedDeployment {
        self.freeze_model()
    }

    fn freeze_model(&self) -> ResolvedDeployment {
        let mut beans = Vec::new();
        let mut removed_beans = Vec::new();
        for bean in &self.discovery.beans {
            if self.removed.contains(&bean.id) {
                removed_beans.push(bean.clone());
            } else {
                beans.push(ResolvedBean {
                    info: bean.clone(),
                    interception: self.models.get(&bean.id).cloned().unwrap_or_default(),
                });
            }
        }
        let injection_points = self
            .discovery
            .injection_points
            .iter()
            .map(|point| ResolvedInjectionPoint {
                info: point.clone(),
                resolved: self.resolutions.get(&point.id).copied(),
            })
            .collect();
        ResolvedDeployment {
            beans,
            removed_beans,
            interceptors: self.discovery.interceptors.clone(),
            decorators: self.discovery.decorators.clone(),
            observers: self.discovery.observers.clone(),
            disposers: self.discovery.disposers.clone(),
            injection_points,
            patches: self.patches.clone(),
        }
    }
}

/// `Instance`, `Provider` and `Event` lookups are satisfied by built-in
/// beans, not by resolution.
fn is_built_in_lookup(required: &Type) -> bool {
    required
        .name()
        .map(|name| {
            name.as_str() == names::INSTANCE
                || name.as_str() == names::PROVIDER
                || name.as_str() == names::EVENT
        })
        .unwrap_or(false)
}
