//! Identity fusion of records that describe the same real-world entity.
//!
//! Two source individuals are considered the same entity if they share the object of an
//! inverse-functional property (IFP). Every such group of individuals is assigned one federated
//! individual URI, which replaces the source URIs in the derived triples.

use crate::WorkingGraph;
use mediator_common::{MediationError, MediationResult, OntologyOracle};
use mediator_model::{
    FederatedIndividualUri, IndividualUri, NamedNode, Subject, Term, Triple,
};
use rustc_hash::FxHashMap;
use std::collections::HashSet;
use tracing::{debug, trace};

/// The distinct subjects that assert an IFP with the same object value, in discovery order.
#[derive(Debug, Default)]
struct FusionGroups<'a> {
    index: FxHashMap<&'a str, usize>,
    groups: Vec<Vec<&'a NamedNode>>,
}

impl<'a> FusionGroups<'a> {
    fn collect(derived: &'a [Triple], ifps: &HashSet<NamedNode>) -> Self {
        let mut result = Self::default();
        for triple in derived {
            if !ifps.contains(&triple.predicate) {
                continue;
            }
            let Subject::NamedNode(subject) = &triple.subject else {
                continue;
            };
            let Some(key) = group_key(&triple.object) else {
                continue;
            };
            let next = result.groups.len();
            let index = *result.index.entry(key).or_insert(next);
            if index == next {
                result.groups.push(Vec::new());
            }
            let group = &mut result.groups[index];
            if !group.contains(&subject) {
                group.push(subject);
            }
        }
        result
    }
}

/// The value that is used to detect equal entities.
fn group_key(object: &Term) -> Option<&str> {
    match object {
        Term::NamedNode(node) => Some(node.as_str()),
        Term::Literal(literal) => Some(literal.value()),
        _ => None,
    }
}

/// Fuses the individuals described by `derived` and asserts the result into `graph`.
///
/// Triples whose subject is a fused individual, or a federated individual whose source
/// identities all belong to one fused entity, are rewritten to the fused entity. Returns the
/// number of fused entities.
pub fn fuse(
    oracle: &dyn OntologyOracle,
    derived: Vec<Triple>,
    graph: &mut WorkingGraph,
) -> MediationResult<usize> {
    let ifps = oracle.inverse_functional_properties();
    let unified = unify_identities(oracle, &derived, &ifps)?;
    let mut entities: Vec<(FederatedIndividualUri, &NamedNode)> = Vec::new();
    for federated in unified.values() {
        if entities.iter().any(|(_, entity)| *entity == federated) {
            continue;
        }
        match FederatedIndividualUri::parse(federated.as_str()) {
            Ok(uri) => entities.push((uri, federated)),
            Err(error) => debug!(
                %error,
                "Federated subjects cannot be folded into a fused entity with an undecodable URI"
            ),
        }
    }
    debug!(
        ifps = ifps.len(),
        individuals = unified.len(),
        fused_entities = entities.len(),
        "Computed unified identities"
    );

    for triple in derived {
        let subject = match &triple.subject {
            Subject::NamedNode(subject) => fused_entity(subject, &unified, &entities),
            _ => None,
        };
        let Some(subject) = subject else {
            graph.assert(&triple);
            continue;
        };

        let object = match &triple.object {
            Term::NamedNode(object) => fused_entity(object, &unified, &entities)
                .map_or_else(|| triple.object.clone(), |o| o.clone().into()),
            _ => triple.object.clone(),
        };
        let fused = Triple::new(subject.clone(), triple.predicate, object);
        trace!(triple = %fused, "Fused triple");
        graph.assert(&fused);
    }

    Ok(entities.len())
}

/// Returns the fused entity `node` belongs to.
fn fused_entity<'a>(
    node: &NamedNode,
    unified: &'a FxHashMap<String, NamedNode>,
    entities: &[(FederatedIndividualUri, &'a NamedNode)],
) -> Option<&'a NamedNode> {
    if let Some(entity) = unified.get(node.as_str()) {
        return Some(entity);
    }
    let federated = FederatedIndividualUri::parse(node.as_str()).ok()?;
    entities
        .iter()
        .find(|(entity, _)| {
            federated
                .members()
                .iter()
                .all(|member| entity.members().contains(member))
        })
        .map(|(_, entity)| *entity)
}

/// Computes the map from source individual to federated individual.
///
/// If an individual is part of multiple groups, the first group wins.
fn unify_identities(
    oracle: &dyn OntologyOracle,
    derived: &[Triple],
    ifps: &HashSet<NamedNode>,
) -> MediationResult<FxHashMap<String, NamedNode>> {
    let mut unified = FxHashMap::default();
    if ifps.is_empty() {
        return Ok(unified);
    }

    for group in FusionGroups::collect(derived, ifps).groups {
        if group.len() < 2 {
            continue;
        }

        let mut members = Vec::new();
        let mut common_superclasses: Option<Vec<NamedNode>> = None;
        for subject in &group {
            let Ok(individual) = IndividualUri::parse(subject.as_str()) else {
                continue;
            };
            let superclasses = oracle.superclasses(&individual.class_iri());
            if superclasses.is_empty() {
                continue;
            }
            common_superclasses = Some(match common_superclasses {
                None => superclasses,
                Some(mut common) => {
                    common.retain(|c| superclasses.contains(c));
                    common
                }
            });
            members.push((*subject, individual));
        }

        let Some(common_superclasses) = common_superclasses else {
            continue;
        };
        let Some(stem) = common_superclasses.first() else {
            return Err(MediationError::FusionStemDerivationFailed(
                members
                    .iter()
                    .map(|(subject, _)| subject.as_str().to_owned())
                    .collect(),
            ));
        };

        let federated = FederatedIndividualUri::new(
            stem.as_str(),
            members.iter().map(|(_, i)| i.identity()).collect(),
        );
        let federated = NamedNode::new(federated.to_string())?;
        debug!(%federated, members = members.len(), "Fused individuals");
        for (subject, _) in members {
            unified
                .entry(subject.as_str().to_owned())
                .or_insert_with(|| federated.clone());
        }
    }
    Ok(unified)
}
