// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A deterministic topological sort over the cluster graph's prerequisite edges.

use crate::cluster::ClusterId;
use crate::errors::PlanError;
use std::collections::HashSet;

/// Sorts `ids` so that every prerequisite of a node (as returned by `prereqs`) appears before it.
///
/// Ties are broken by ascending [`ClusterId`] (first-seen order), matching §9's design note that
/// output stability should fall back to insertion order rather than a name sort. Returns
/// [`PlanError::DependencyCycle`] if `prereqs` describes a cycle within `ids`.
pub fn topo_sort(
    ids: &[ClusterId],
    prereqs: &dyn Fn(ClusterId) -> Vec<ClusterId>,
    name_of: &dyn Fn(ClusterId) -> String,
) -> Result<Vec<ClusterId>, PlanError> {
    let set: HashSet<ClusterId> = ids.iter().copied().collect();
    let mut visited = HashSet::new();
    let mut in_progress = HashSet::new();
    let mut output = Vec::with_capacity(ids.len());
    let mut path = Vec::new();

    let mut sorted_ids = ids.to_vec();
    sorted_ids.sort_by_key(ClusterId::index);

    for id in sorted_ids {
        visit(
            id,
            &set,
            prereqs,
            name_of,
            &mut visited,
            &mut in_progress,
            &mut output,
            &mut path,
        )?;
    }
    Ok(output)
}

#[allow(clippy::too_many_arguments)]
fn visit(
    id: ClusterId,
    set: &HashSet<ClusterId>,
    prereqs: &dyn Fn(ClusterId) -> Vec<ClusterId>,
    name_of: &dyn Fn(ClusterId) -> String,
    visited: &mut HashSet<ClusterId>,
    in_progress: &mut HashSet<ClusterId>,
    output: &mut Vec<ClusterId>,
    path: &mut Vec<ClusterId>,
) -> Result<(), PlanError> {
    if visited.contains(&id) {
        return Ok(());
    }
    if in_progress.contains(&id) {
        let start = path.iter().position(|p| *p == id).unwrap_or(0);
        let cycle = path[start..].iter().map(|p| name_of(*p)).collect();
        return Err(PlanError::DependencyCycle { cycle });
    }

    in_progress.insert(id);
    path.push(id);

    let mut deps = prereqs(id);
    deps.retain(|d| set.contains(d));
    deps.sort_by_key(ClusterId::index);
    for dep in deps {
        visit(dep, set, prereqs, name_of, visited, in_progress, output, path)?;
    }

    path.pop();
    in_progress.remove(&id);
    visited.insert(id);
    output.push(id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Cluster, ClusterArena, RequestType};
    use vcpkg_model::identifiers::{PackageName, PackageSpec, Triplet};

    fn spec(name: &str) -> PackageSpec {
        PackageSpec::new(PackageName::new(name).unwrap(), Triplet::new("x64-linux").unwrap())
    }

    fn arena_of(names: &[&str]) -> (ClusterArena, Vec<ClusterId>) {
        let mut arena = ClusterArena::new();
        let mut ids = Vec::new();
        for name in names {
            let package = spec(name);
            let id = arena.get_or_insert_with(&package, || Cluster {
                package: package.clone(),
                scfl: None,
                installed: None,
                install_info: None,
                request_type: RequestType::Auto,
            });
            ids.push(id);
        }
        (arena, ids)
    }

    #[test]
    fn linear_chain_sorts_dependency_first() {
        let (arena, ids) = arena_of(&["a", "b", "c"]);
        // a depends on b, b depends on c.
        let prereqs = |id: ClusterId| -> Vec<ClusterId> {
            if id == ids[0] {
                vec![ids[1]]
            } else if id == ids[1] {
                vec![ids[2]]
            } else {
                vec![]
            }
        };
        let name_of = |id: ClusterId| arena.get(id).package.name.to_string();
        let sorted = topo_sort(&ids, &prereqs, &name_of).unwrap();
        assert_eq!(sorted, vec![ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn cycle_is_rejected() {
        let (_arena, ids) = arena_of(&["a", "b"]);
        let prereqs = |id: ClusterId| -> Vec<ClusterId> {
            if id == ids[0] {
                vec![ids[1]]
            } else {
                vec![ids[0]]
            }
        };
        let name_of = |_: ClusterId| String::new();
        assert!(matches!(
            topo_sort(&ids, &prereqs, &name_of),
            Err(PlanError::DependencyCycle { .. })
        ));
    }

    #[test]
    fn unrelated_nodes_preserve_insertion_order() {
        let (_arena, ids) = arena_of(&["z", "a", "m"]);
        let prereqs = |_: ClusterId| -> Vec<ClusterId> { vec![] };
        let name_of = |_: ClusterId| String::new();
        let sorted = topo_sort(&ids, &prereqs, &name_of).unwrap();
        assert_eq!(sorted, ids);
    }
}
