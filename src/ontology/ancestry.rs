use std::collections::HashSet;

use super::OntologyStore;
use crate::error::{OntologyError, OntologyResult};
use crate::models::{NodeState, OntologyTerm, TreeChildren, TreeNode};

/// Build the tree-widget document with the path to `term_id` expanded.
///
/// Starting at the target, the builder walks up through the first parent of
/// every term. Each parent becomes an opened node whose children are the
/// node built so far followed by collapsed stubs for its other children.
/// The walk ends at a term without parents.
///
/// The output has one entry per element of `roots`: the root that ends the
/// walk is replaced by the expanded path, the others are stubs. A target
/// without parents is emitted selected, without wrapping.
pub fn build_tree_to_root<S>(
    store: &S,
    term_id: &str,
    roots: &[OntologyTerm],
) -> OntologyResult<Vec<TreeNode>>
where
    S: OntologyStore + ?Sized,
{
    let mut term = store
        .term(term_id)?
        .ok_or_else(|| OntologyError::term_not_found(term_id))?;

    let mut node = TreeNode {
        id: term.id.clone(),
        text: term.name.clone(),
        state: Some(NodeState {
            selected: true,
            opened: false,
        }),
        children: TreeChildren::Lazy(store.child_count(&term.id)? > 0),
    };

    let mut visited: HashSet<String> = HashSet::from([term.id.clone()]);

    while let Some(parent) = store.parents(&term.id)?.into_iter().next() {
        if !visited.insert(parent.id.clone()) {
            tracing::error!(term = %parent.id, selected = %term_id, "cycle in ontology links");
            return Err(OntologyError::StructuralCycle { term: parent.id });
        }

        let mut children = vec![node];
        for sibling in store.children(&parent.id)? {
            if sibling.id != term.id {
                children.push(stub(store, &sibling)?);
            }
        }

        node = TreeNode {
            id: parent.id.clone(),
            text: parent.name.clone(),
            state: Some(NodeState {
                selected: false,
                opened: true,
            }),
            children: TreeChildren::Loaded(children),
        };
        term = parent;
    }

    let mut path = Some(node);
    let mut tree = Vec::with_capacity(roots.len());
    for root in roots {
        if root.id == term.id {
            if let Some(expanded) = path.take() {
                tree.push(expanded);
                continue;
            }
        }
        tree.push(stub(store, root)?);
    }

    if path.is_some() {
        tracing::warn!(
            selected = %term_id,
            root = %term.id,
            "ancestor path ends outside the supplied roots"
        );
    }

    Ok(tree)
}

/// Collapsed stubs for a list of roots, used when no term is selected.
pub fn root_stubs<S>(store: &S, roots: &[OntologyTerm]) -> OntologyResult<Vec<TreeNode>>
where
    S: OntologyStore + ?Sized,
{
    roots.iter().map(|root| stub(store, root)).collect()
}

/// Collapsed stubs for the direct children of a term, for lazy expansion.
pub fn children_stubs<S>(store: &S, term_id: &str) -> OntologyResult<Vec<TreeNode>>
where
    S: OntologyStore + ?Sized,
{
    if store.term(term_id)?.is_none() {
        return Err(OntologyError::term_not_found(term_id));
    }
    store
        .children(term_id)?
        .iter()
        .map(|child| stub(store, child))
        .collect()
}

/// The tree for a whole source: the expanded path when a term is given,
/// otherwise the collapsed roots.
pub fn source_tree<S>(
    store: &S,
    acronym: &str,
    term_id: Option<&str>,
) -> OntologyResult<Vec<TreeNode>>
where
    S: OntologyStore + ?Sized,
{
    let source = store
        .source_by_acronym(acronym)?
        .ok_or_else(|| OntologyError::source_not_found(acronym))?;
    let roots = store.root_terms(source.id)?;

    match term_id {
        Some(term_id) => build_tree_to_root(store, term_id, &roots),
        None => root_stubs(store, &roots),
    }
}

fn stub<S>(store: &S, term: &OntologyTerm) -> OntologyResult<TreeNode>
where
    S: OntologyStore + ?Sized,
{
    Ok(TreeNode::stub(
        term.id.clone(),
        term.name.clone(),
        store.child_count(&term.id)? > 0,
    ))
}
