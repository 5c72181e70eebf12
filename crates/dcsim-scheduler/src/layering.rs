//! Dependency layering into branches and waves
//!
//! Branches are linear chains built by following precedence pairs head to
//! tail. Waves are the layers of a topological ordering, walked from the root
//! of the first branch. Both assume a connected, acyclic dependency graph; on
//! other inputs the layering stops early instead of looping.

use std::collections::BTreeSet;

use dcsim_core::{Dependency, JobId};

/// Branches and waves derived from the dependency pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layering {
    pub branches: Vec<Vec<JobId>>,
    pub waves: Vec<Vec<JobId>>,
}

impl Layering {
    /// Build the layering for `dependencies`
    pub fn new(dependencies: &[Dependency]) -> Self {
        let branches = build_branches(dependencies);
        let waves = build_waves(&branches);
        Self { branches, waves }
    }

    /// Index of the first branch containing `id`
    pub fn branch_of(&self, id: JobId) -> Option<usize> {
        self.branches.iter().position(|branch| branch.contains(&id))
    }

    /// Position of `id` within the first wave containing it
    pub fn wave_position(&self, id: JobId) -> Option<usize> {
        self.waves
            .iter()
            .find_map(|wave| wave.iter().position(|&member| member == id))
    }
}

/// Chain dependency pairs into branches.
///
/// Each branch starts at the first unconsumed pair and takes, in one forward
/// pass, every later pair whose head is the branch's current tail.
pub fn build_branches(dependencies: &[Dependency]) -> Vec<Vec<JobId>> {
    let mut consumed = vec![false; dependencies.len()];
    let mut branches = Vec::new();

    while let Some(first) = consumed.iter().position(|done| !done) {
        let mut branch = vec![dependencies[first].0];

        for (index, &(from, to)) in dependencies.iter().enumerate().skip(first) {
            if !consumed[index] && branch.last() == Some(&from) {
                branch.push(to);
                consumed[index] = true;
            }
        }

        branches.push(branch);
    }

    branches
}

/// Layer the branches into waves.
///
/// The first wave is the root of the first branch. Each next wave holds, for
/// every branch containing the previous wave's first job, the job following it.
pub fn build_waves(branches: &[Vec<JobId>]) -> Vec<Vec<JobId>> {
    let Some(root) = branches.first().and_then(|branch| branch.first()) else {
        return Vec::new();
    };

    let all: BTreeSet<JobId> = branches.iter().flatten().copied().collect();
    let mut covered = BTreeSet::from([*root]);
    let mut roots = BTreeSet::new();
    let mut waves = vec![vec![*root]];

    while covered != all {
        let Some(&root) = waves.last().and_then(|wave| wave.first()) else {
            break;
        };
        if !roots.insert(root) {
            break;
        }

        let wave: Vec<JobId> = branches
            .iter()
            .filter_map(|branch| {
                let at = branch.iter().position(|&id| id == root)?;
                branch.get(at + 1).copied()
            })
            .collect();
        if wave.is_empty() {
            break;
        }

        covered.extend(wave.iter().copied());
        waves.push(wave);
    }

    waves
}
