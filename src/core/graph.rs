//! Dependency DAG construction and breadth-first traversal.
//!
//! Edges point from a dependency to the targets that depend on it, so a
//! traversal rooted at zero-dependency targets walks "install first" to
//! "install last". Traversal is Kahn-layered: a node is emitted only after
//! every dependency inside the traversal scope has been emitted, with
//! declaration-order tie-breaking for determinism.

use super::index::DependencyIndex;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};

/// Directed graph over target names.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// target → dependencies that are themselves nodes
    dependencies: IndexMap<String, Vec<String>>,
    /// dependency → targets that depend on it
    dependents: IndexMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build the graph from the dependency index.
    ///
    /// Every index key becomes a node. References to names outside the index
    /// produce no edge; the validator reports them.
    pub fn build(index: &DependencyIndex) -> Self {
        let mut dependencies: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut dependents: IndexMap<String, Vec<String>> = IndexMap::new();

        for name in index.keys() {
            dependencies.insert(name.clone(), Vec::new());
            dependents.insert(name.clone(), Vec::new());
        }

        for (target, deps) in index {
            for dep in deps {
                if !index.contains_key(dep) {
                    continue;
                }
                if let Some(list) = dependencies.get_mut(target) {
                    list.push(dep.clone());
                }
                if let Some(list) = dependents.get_mut(dep) {
                    list.push(target.clone());
                }
            }
        }

        log::debug!(
            "dependency graph: {} nodes, {} edges",
            dependencies.len(),
            dependencies.values().map(Vec::len).sum::<usize>()
        );

        Self {
            dependencies,
            dependents,
        }
    }

    /// Node names in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.dependencies.len()
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(Vec::len).sum()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Direct dependencies of `name` (empty for unknown names).
    pub fn dependencies(&self, name: &str) -> &[String] {
        self.dependencies.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Targets directly depending on `name` (empty for unknown names).
    pub fn dependents(&self, name: &str) -> &[String] {
        self.dependents.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes without outgoing dependency edges, in declaration order.
    pub fn roots(&self) -> Vec<&str> {
        self.dependencies
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Targets with an empty dependency list, in index order.
pub fn zero_dependency_targets(index: &DependencyIndex) -> Vec<&str> {
    index
        .iter()
        .filter(|(_, deps)| deps.is_empty())
        .map(|(name, _)| name.as_str())
        .collect()
}

/// Lazy breadth-first traversal; see [`bfs_iterator`].
#[derive(Debug, Clone)]
pub struct Bfs<'a> {
    graph: &'a DependencyGraph,
    queue: VecDeque<&'a str>,
    /// in-scope nodes not yet queued → in-scope dependencies not yet emitted
    pending: HashMap<&'a str, usize>,
}

impl<'a> Iterator for Bfs<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let graph = self.graph;
        let current = self.queue.pop_front()?;
        for dependent in graph.dependents(current) {
            if let Some(remaining) = self.pending.get_mut(dependent.as_str()) {
                *remaining -= 1;
                if *remaining == 0 {
                    self.pending.remove(dependent.as_str());
                    self.queue.push_back(dependent.as_str());
                }
            }
        }
        Some(current)
    }
}

/// Breadth-first traversal starting at `root`, or at every zero-dependency
/// node when `root` is `None`.
///
/// Visits each node reachable from the start set exactly once, dependencies
/// before dependents. An unknown root yields nothing. Each call starts fresh.
pub fn bfs_iterator<'a>(graph: &'a DependencyGraph, root: Option<&str>) -> Bfs<'a> {
    let starts: Vec<&'a str> = match root {
        Some(name) => graph
            .dependencies
            .get_key_value(name)
            .map(|(k, _)| vec![k.as_str()])
            .unwrap_or_default(),
        None => graph.roots(),
    };

    // Everything reachable along dependency → dependent edges.
    let mut scope: HashSet<&'a str> = starts.iter().copied().collect();
    let mut frontier: VecDeque<&'a str> = starts.iter().copied().collect();
    while let Some(node) = frontier.pop_front() {
        for dependent in graph.dependents(node) {
            if scope.insert(dependent.as_str()) {
                frontier.push_back(dependent.as_str());
            }
        }
    }

    let started: HashSet<&'a str> = starts.iter().copied().collect();
    let pending = graph
        .nodes()
        .filter(|n| scope.contains(n) && !started.contains(n))
        .map(|n| {
            let in_scope = graph
                .dependencies(n)
                .iter()
                .filter(|d| scope.contains(d.as_str()))
                .count();
            (n, in_scope)
        })
        .collect();

    Bfs {
        graph,
        queue: starts.into_iter().collect(),
        pending,
    }
}

/// Find one dependency cycle, returned as a path that starts and ends on the
/// same target (`a -> b -> a` reads "a depends on b depends on a").
pub fn find_cycle(graph: &DependencyGraph) -> Option<Vec<String>> {
    find_cycle_in(graph.nodes(), |n| graph.dependencies(n))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first cycle search over an arbitrary adjacency function.
pub(crate) fn find_cycle_in<'a, I, F>(nodes: I, edges: F) -> Option<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
    F: Fn(&str) -> &'a [String] + Copy,
{
    fn visit<'a, F>(
        node: &'a str,
        edges: F,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>>
    where
        F: Fn(&str) -> &'a [String] + Copy,
    {
        marks.insert(node, Mark::Visiting);
        stack.push(node);
        for next in edges(node) {
            match marks.get(next.as_str()) {
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|n| *n == next.as_str()).unwrap_or(0);
                    let mut path: Vec<String> =
                        stack[start..].iter().map(|s| s.to_string()).collect();
                    path.push(next.clone());
                    return Some(path);
                }
                Some(Mark::Done) => {}
                None => {
                    if let Some(path) = visit(next.as_str(), edges, marks, stack) {
                        return Some(path);
                    }
                }
            }
        }
        stack.pop();
        marks.insert(node, Mark::Done);
        None
    }

    let mut marks: HashMap<&'a str, Mark> = HashMap::new();
    let mut stack: Vec<&'a str> = Vec::new();
    for node in nodes {
        if !marks.contains_key(node) {
            if let Some(path) = visit(node, edges, &mut marks, &mut stack) {
                return Some(path);
            }
        }
    }
    None
}
