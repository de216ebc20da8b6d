//! Unused-bean removal.
//!
//! Two-pass reachability over the finished bean, observer and
//! injection-point graph. The second pass handles producer-declaring beans
//! whose only remaining purpose was a producer removed in the first pass, so
//! an unused producer chain disappears in a single pruning run. Removed
//! beans are kept aside for diagnostics, never discarded.

use std::collections::{HashMap, HashSet};

use arbor_index::{Type, TypeIndex};
use tracing::debug;

use crate::bean::{BeanId, BeanInfo, InjectionPointId};
use crate::discovery::Discovery;
use crate::names;
use crate::registry::Registry;
use crate::resolver::Resolver;

/// Caller-supplied predicate that protects matching beans from removal.
pub type RemovalExclusion = Box<dyn Fn(&BeanInfo) -> bool>;

pub struct PruneOutcome {
    pub retained: HashSet<BeanId>,
    pub removed: HashSet<BeanId>,
}

pub fn prune_unused_beans(
    index: &TypeIndex,
    registry: &Registry,
    discovery: &Discovery,
    resolutions: &HashMap<InjectionPointId, BeanId>,
    exclusions: &[RemovalExclusion],
) -> PruneOutcome {
    let resolver = Resolver::new(index, registry);

    let injected: HashSet<BeanId> = resolutions.values().copied().collect();
    let observer_declaring: HashSet<BeanId> = discovery
        .observers
        .iter()
        .filter_map(|observer| observer.declaring_bean)
        .collect();
    let producers_by_declaring: HashMap<BeanId, Vec<BeanId>> = {
        let mut map: HashMap<BeanId, Vec<BeanId>> = HashMap::new();
        for bean in &discovery.beans {
            if let Some(declaring) = bean.kind.declaring_bean() {
                map.entry(declaring).or_default().push(bean.id);
            }
        }
        map
    };

    let is_retained = |bean: &BeanInfo| -> bool {
        bean.name.is_some()
            || !bean.removable
            || exclusions.iter().any(|excluded| excluded(bean))
            || injected.contains(&bean.id)
            || observer_declaring.contains(&bean.id)
            || matches_instance_lookup(&resolver, discovery, bean)
    };

    // First pass: everything except producer-declaring beans.
    let mut removed: HashSet<BeanId> = HashSet::new();
    let mut deferred: Vec<BeanId> = Vec::new();
    for bean in &discovery.beans {
        if is_retained(bean) {
            continue;
        }
        if producers_by_declaring.contains_key(&bean.id) {
            deferred.push(bean.id);
            continue;
        }
        removed.insert(bean.id);
    }

    // Second pass: a declaring bean goes only when every producer it
    // declares went in the first pass.
    for id in deferred {
        let producers = &producers_by_declaring[&id];
        if producers.iter().all(|producer| removed.contains(producer)) {
            removed.insert(id);
        }
    }

    let retained: HashSet<BeanId> = discovery
        .beans
        .iter()
        .map(|bean| bean.id)
        .filter(|id| !removed.contains(id))
        .collect();
    debug!(
        retained = retained.len(),
        removed = removed.len(),
        "unused-bean pruning finished"
    );
    for id in &removed {
        debug!(bean = %discovery.bean(*id).describe(), "removed unused bean");
    }
    PruneOutcome { retained, removed }
}

/// Does any `Instance<T>`/`Provider<T>` injection point cover this bean?
/// A raw or wildcard inner type constrains by qualifiers only.
fn matches_instance_lookup(
    resolver: &Resolver<'_>,
    discovery: &Discovery,
    bean: &BeanInfo,
) -> bool {
    discovery.injection_points.iter().any(|point| {
        let raw = match point.required_type.name() {
            Some(name) => name,
            None => return false,
        };
        if raw.as_str() != names::INSTANCE && raw.as_str() != names::PROVIDER {
            return false;
        }
        let inner = match &point.required_type {
            Type::Parameterized { args, .. } => args.first(),
            _ => None,
        };
        match inner {
            Some(inner) if inner.is_class_or_parameterized() => {
                resolver.matches(bean, inner, &point.required_qualifiers)
            }
            _ => resolver.has_qualifiers(&bean.qualifiers, &point.required_qualifiers),
        }
    })
}
