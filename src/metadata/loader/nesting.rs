//! Assembly of the type tree from `NestedClass` rows.
//!
//! Nesting depth is unbounded in metadata, so the tree is built bottom-up over an explicit
//! depth ordering instead of by recursion.

use std::cmp::Reverse;

use log::warn;

use crate::{
    metadata::{
        tables::NestedClassRaw,
        typesystem::{Slot, TypeDeclaration},
    },
    Result,
};

#[derive(Clone, Copy)]
enum Visit {
    Pending,
    Active,
    Done(usize),
}

/// Move every nested type under its enclosing type and return the top-level slots.
///
/// `types` holds one declaration per `TypeDef` row in row order. Children keep the order of
/// their `NestedClass` rows, top-level types keep row order.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if a type encloses itself, directly or through a cycle.
pub(super) fn build_tree(
    mut types: Vec<TypeDeclaration>,
    nested_rows: &[NestedClassRaw],
) -> Result<Vec<Slot<TypeDeclaration>>> {
    let count = types.len();
    let index_of = |rid: u32| (rid != 0 && rid as usize <= count).then(|| rid as usize - 1);

    let mut parent: Vec<Option<usize>> = vec![None; count];
    let mut children: Vec<Vec<Option<usize>>> = vec![Vec::new(); count];

    for row in nested_rows {
        match (index_of(row.nested_class), index_of(row.enclosing_class)) {
            (Some(nested), Some(enclosing)) => {
                if nested == enclosing {
                    return Err(malformed_error!(
                        "{} is nested inside itself",
                        types[nested].token
                    ));
                }
                if let Some(existing) = parent[nested] {
                    warn!(
                        "{} is nested in both {} and {}, keeping {}",
                        types[nested].token,
                        types[existing].token,
                        types[enclosing].token,
                        types[existing].token
                    );
                    continue;
                }

                parent[nested] = Some(enclosing);
                children[enclosing].push(Some(nested));
                types[nested].is_nested = true;
            }
            (None, Some(enclosing)) => {
                warn!(
                    "{}: nested type row {} does not exist",
                    types[enclosing].token, row.nested_class
                );
                children[enclosing].push(None);
            }
            (Some(nested), None) => {
                warn!(
                    "{}: enclosing type row {} does not exist, kept at top level",
                    types[nested].token, row.enclosing_class
                );
                types[nested].is_nested = true;
            }
            (None, None) => {
                warn!("{}: references no existing type", row.token);
            }
        }
    }

    let depth = nesting_depths(&parent, &types)?;

    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by_key(|&index| Reverse(depth[index]));

    // deepest first, so every child is complete before its parent takes it
    let mut slots: Vec<Option<TypeDeclaration>> = types.into_iter().map(Some).collect();
    for &node in &order {
        if children[node].is_empty() {
            continue;
        }

        let nested: Vec<Slot<TypeDeclaration>> = children[node]
            .iter()
            .map(|child| Slot::from(child.and_then(|index| slots[index].take())))
            .collect();

        if let Some(ty) = slots[node].as_mut() {
            ty.nested_types = nested;
        }
    }

    Ok((0..count)
        .filter(|&index| parent[index].is_none())
        .map(|index| Slot::from(slots[index].take()))
        .collect())
}

/// Depth of every type below the top level, rejecting cycles.
fn nesting_depths(parent: &[Option<usize>], types: &[TypeDeclaration]) -> Result<Vec<usize>> {
    let mut state = vec![Visit::Pending; parent.len()];
    let mut path = Vec::new();

    for start in 0..parent.len() {
        let mut current = Some(start);
        let base = loop {
            let Some(node) = current else {
                break 0;
            };

            match state[node] {
                Visit::Done(depth) => break depth + 1,
                Visit::Active => {
                    return Err(malformed_error!(
                        "Nesting cycle through {}",
                        types[node].token
                    ));
                }
                Visit::Pending => {
                    state[node] = Visit::Active;
                    path.push(node);
                    current = parent[node];
                }
            }
        };

        for (distance, node) in path.drain(..).rev().enumerate() {
            state[node] = Visit::Done(base + distance);
        }
    }

    Ok(state
        .into_iter()
        .map(|visit| match visit {
            Visit::Done(depth) => depth,
            Visit::Pending | Visit::Active => 0,
        })
        .collect())
}
