//! Dependency resolver
//!
//! Orders templates so that every template comes after its declared
//! dependencies. Ties are broken by template code, so the order is the same
//! on every run. Templates are also grouped into waves by dependency depth;
//! the members of one wave have no dependency on each other and may be built
//! concurrently.

use crate::core::registry::TemplateRegistry;
use crate::domain::{RegistryError, TemplateCode};
use std::collections::{BTreeMap, BTreeSet};

/// Build order of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    /// Topological order
    pub order: Vec<TemplateCode>,
    /// Templates grouped by dependency depth
    pub waves: Vec<Vec<TemplateCode>>,
}

impl BuildPlan {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, code: TemplateCode) -> bool {
        self.order.contains(&code)
    }

    /// Position of a template in the build order
    pub fn position(&self, code: TemplateCode) -> Option<usize> {
        self.order.iter().position(|c| *c == code)
    }
}

/// Plans every registered template
pub fn plan(registry: &TemplateRegistry) -> Result<BuildPlan, RegistryError> {
    let all: BTreeSet<TemplateCode> = registry.codes().collect();
    resolve(registry, &all)
}

/// Plans the requested templates together with everything they depend on
pub fn plan_for(
    registry: &TemplateRegistry,
    requested: &[TemplateCode],
) -> Result<BuildPlan, RegistryError> {
    let closure = dependency_closure(registry, requested)?;
    resolve(registry, &closure)
}

/// Requested templates plus their transitive dependencies
pub fn dependency_closure(
    registry: &TemplateRegistry,
    requested: &[TemplateCode],
) -> Result<BTreeSet<TemplateCode>, RegistryError> {
    let mut closure = BTreeSet::new();
    let mut pending: Vec<TemplateCode> = requested.to_vec();

    while let Some(code) = pending.pop() {
        if !closure.insert(code) {
            continue;
        }
        let descriptor = registry.descriptor(code)?;
        for &dependency in descriptor.dependencies {
            if !registry.contains(dependency) {
                return Err(RegistryError::MissingDescriptor {
                    template: code.to_string(),
                    dependency: dependency.to_string(),
                });
            }
            pending.push(dependency);
        }
    }

    Ok(closure)
}

fn resolve(
    registry: &TemplateRegistry,
    nodes: &BTreeSet<TemplateCode>,
) -> Result<BuildPlan, RegistryError> {
    // dependency -> dependents, restricted to the planned nodes
    let mut dependents: BTreeMap<TemplateCode, Vec<TemplateCode>> = BTreeMap::new();
    let mut in_degree: BTreeMap<TemplateCode, usize> = BTreeMap::new();

    for &code in nodes {
        let descriptor = registry.descriptor(code)?;
        let mut deps: BTreeSet<TemplateCode> = BTreeSet::new();
        for &dependency in descriptor.dependencies {
            if !registry.contains(dependency) {
                return Err(RegistryError::MissingDescriptor {
                    template: code.to_string(),
                    dependency: dependency.to_string(),
                });
            }
            if nodes.contains(&dependency) {
                deps.insert(dependency);
            }
        }
        in_degree.insert(code, deps.len());
        for dependency in deps {
            dependents.entry(dependency).or_default().push(code);
        }
    }

    let mut ready: BTreeSet<TemplateCode> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&code, _)| code)
        .collect();
    let mut depth: BTreeMap<TemplateCode, usize> = BTreeMap::new();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(code) = ready.pop_first() {
        let level = depth.get(&code).copied().unwrap_or(0);
        order.push(code);
        for &dependent in dependents.get(&code).map(Vec::as_slice).unwrap_or_default() {
            let entry = depth.entry(dependent).or_insert(0);
            *entry = (*entry).max(level + 1);
            if let Some(degree) = in_degree.get_mut(&dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(dependent);
                }
            }
        }
    }

    if order.len() < nodes.len() {
        let placed: BTreeSet<TemplateCode> = order.iter().copied().collect();
        let remaining: BTreeSet<TemplateCode> = nodes.difference(&placed).copied().collect();
        return Err(RegistryError::DependencyCycle(find_cycle(
            registry, &remaining,
        )));
    }

    let wave_count = order
        .iter()
        .map(|c| depth.get(c).copied().unwrap_or(0) + 1)
        .max()
        .unwrap_or(0);
    let mut waves = vec![Vec::new(); wave_count];
    for &code in &order {
        waves[depth.get(&code).copied().unwrap_or(0)].push(code);
    }
    for wave in &mut waves {
        wave.sort();
    }

    tracing::debug!(
        templates = order.len(),
        waves = waves.len(),
        "Build order resolved"
    );

    Ok(BuildPlan { order, waves })
}

/// Walks dependencies among the unplaceable templates until one repeats.
/// Every such template has a remaining dependency, so the walk always closes.
fn find_cycle(registry: &TemplateRegistry, remaining: &BTreeSet<TemplateCode>) -> Vec<String> {
    let Some(&start) = remaining.iter().next() else {
        return Vec::new();
    };

    let mut path: Vec<TemplateCode> = vec![start];
    let mut current = start;
    loop {
        let next = registry.get(current).and_then(|d| {
            d.dependencies
                .iter()
                .copied()
                .filter(|dep| remaining.contains(dep))
                .min()
        });
        let Some(next) = next else {
            break;
        };
        if let Some(at) = path.iter().position(|c| *c == next) {
            let mut cycle: Vec<String> = path[at..].iter().map(|c| c.to_string()).collect();
            cycle.push(next.to_string());
            return cycle;
        }
        path.push(next);
        current = next;
    }

    path.iter().map(|c| c.to_string()).collect()
}
