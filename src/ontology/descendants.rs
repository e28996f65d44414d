use std::collections::HashSet;

use super::OntologyStore;
use crate::error::{OntologyError, OntologyResult};
use crate::models::OntologyTerm;

/// Collect a term and all of its transitive descendants.
///
/// The result is in depth-first pre-order, starting with `term_id`, children
/// in the store's natural order. A term reachable through several parents is
/// listed once per path; callers that need a set should deduplicate.
///
/// Fails with `NotFound` if `term_id` does not exist and with
/// `StructuralCycle` if a term is reached again from below itself.
pub fn collect_descendants<S>(store: &S, term_id: &str) -> OntologyResult<Vec<String>>
where
    S: OntologyStore + ?Sized,
{
    if store.term(term_id)?.is_none() {
        return Err(OntologyError::term_not_found(term_id));
    }

    let mut ids = vec![term_id.to_string()];

    // One frame per term on the current path, holding its unvisited children.
    let mut path = vec![term_id.to_string()];
    let mut on_path: HashSet<String> = HashSet::from([term_id.to_string()]);
    let mut stack: Vec<std::vec::IntoIter<OntologyTerm>> =
        vec![store.children(term_id)?.into_iter()];

    while let Some(frame) = stack.last_mut() {
        match frame.next() {
            Some(child) => {
                if on_path.contains(&child.id) {
                    tracing::error!(term = %child.id, start = %term_id, "cycle in ontology links");
                    return Err(OntologyError::StructuralCycle { term: child.id });
                }
                ids.push(child.id.clone());
                stack.push(store.children(&child.id)?.into_iter());
                on_path.insert(child.id.clone());
                path.push(child.id);
            }
            None => {
                stack.pop();
                if let Some(done) = path.pop() {
                    on_path.remove(&done);
                }
            }
        }
    }

    tracing::debug!(term = %term_id, count = ids.len(), "collected descendants");
    Ok(ids)
}

/// Collect descendants for several starting terms, concatenated in input order.
pub fn collect_forest<S, I>(store: &S, term_ids: I) -> OntologyResult<Vec<String>>
where
    S: OntologyStore + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut ids = Vec::new();
    for term_id in term_ids {
        ids.extend(collect_descendants(store, term_id.as_ref())?);
    }
    Ok(ids)
}
