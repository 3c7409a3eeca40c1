//! Reference graph, cycle classification and emission order.
//!
//! A name is *cyclic* if it sits on a reference cycle, is reachable from one,
//! or reaches into one. Everything else is ordered so that each name follows
//! every name it references.
use std::collections::HashSet;
use indexmap::{IndexMap, IndexSet};

use crate::schema::{Additional, Document, Items, SchemaNode, Shape};

/// name → names it references, in first-encounter order.
pub type DependencyGraph = IndexMap<String, IndexSet<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// No ordering contract.
    pub cyclic: Vec<String>,
    /// Dependencies precede dependents.
    pub non_cyclic: Vec<String>,
    /// Reference targets absent from the document. Also present in the partition.
    pub missing: Vec<String>,
}

pub fn analyze(doc: &Document) -> Analysis {
    let graph = dependency_graph(doc);
    let missing: Vec<String> = graph
        .keys()
        .filter(|name| !doc.types.contains_key(*name))
        .cloned()
        .collect();

    let core = cyclic_core(&graph);
    let reversed = reverse(&graph);
    let mut cyclic_set: HashSet<&str> = HashSet::new();
    for name in &core {
        cyclic_set.insert(name.as_str());
    }
    cyclic_set.extend(reachable(&graph, &core));
    cyclic_set.extend(reachable(&reversed, &core));

    let cyclic: Vec<String> = graph
        .keys()
        .filter(|name| cyclic_set.contains(name.as_str()))
        .cloned()
        .collect();
    let non_cyclic = emission_order(&graph, &cyclic_set);

    tracing::debug!(
        cyclic = cyclic.len(),
        non_cyclic = non_cyclic.len(),
        missing = missing.len(),
        "analyzed reference graph"
    );
    Analysis { cyclic, non_cyclic, missing }
}

/// Build the reference graph. Missing targets become leaf nodes after the
/// document's own names.
pub fn dependency_graph(doc: &Document) -> DependencyGraph {
    let mut graph: DependencyGraph = doc
        .types
        .iter()
        .map(|(name, ty)| {
            let mut refs = IndexSet::new();
            collect_refs(&ty.node, &mut refs);
            (name.clone(), refs)
        })
        .collect();

    let dangling: Vec<String> = graph
        .values()
        .flatten()
        .filter(|target| !doc.types.contains_key(*target))
        .cloned()
        .collect();
    for target in dangling {
        graph.entry(target).or_default();
    }
    graph
}

/// A plain named reference; anything with structural separators is not one.
pub fn is_plain_reference(name: &str) -> bool {
    !name.contains(['#', '/', ' '])
}

fn collect_refs(node: &SchemaNode, out: &mut IndexSet<String>) {
    collect_shape_refs(&node.shape, out);
    for branch in node.any_of.iter().chain(node.all_of.iter()).flatten() {
        collect_refs(branch, out);
    }
}

fn collect_shape_refs(shape: &Shape, out: &mut IndexSet<String>) {
    match shape {
        Shape::Ref(name) if is_plain_reference(name) => {
            out.insert(name.clone());
        }
        Shape::Multi(shapes) => {
            for s in shapes {
                collect_shape_refs(s, out);
            }
        }
        Shape::Array(rules) => {
            match &rules.items {
                Items::Single(item) => collect_refs(item, out),
                Items::Tuple(items) => items.iter().for_each(|item| collect_refs(item, out)),
                Items::Unspecified => {}
            }
            if let Some(Additional::Schema(extra)) = &rules.additional_items {
                collect_refs(extra, out);
            }
        }
        Shape::Object(rules) => {
            for prop in rules.properties.values() {
                collect_refs(&prop.node, out);
            }
            if let Some(Additional::Schema(extra)) = &rules.additional_properties {
                collect_refs(extra, out);
            }
        }
        _ => {}
    }
}

// ————————————————————————————————————————————————————————————————————————————
// STRONGLY CONNECTED COMPONENTS (Tarjan)
// ————————————————————————————————————————————————————————————————————————————

struct Tarjan<'g> {
    graph: &'g DependencyGraph,
    index: IndexMap<&'g str, (usize, usize)>, // name → (index, lowlink)
    stack: Vec<&'g str>,
    on_stack: HashSet<&'g str>,
    cyclic: Vec<String>,
}

impl<'g> Tarjan<'g> {
    /// Explicit work stack of (name, next dependency position); long `$ref`
    /// chains must not grow the call stack.
    fn visit(&mut self, root: &'g str) {
        let graph = self.graph;
        self.open(root);
        let mut work: Vec<(&'g str, usize)> = vec![(root, 0)];

        while let Some(frame) = work.last_mut() {
            let name = frame.0;
            if let Some(dep) = graph.get(name).and_then(|deps| deps.get_index(frame.1)) {
                frame.1 += 1;
                let dep = dep.as_str();
                if !self.index.contains_key(dep) {
                    self.open(dep);
                    work.push((dep, 0));
                } else if self.on_stack.contains(dep) {
                    let dep_idx = self.index[dep].0;
                    self.lower(name, dep_idx);
                }
                continue;
            }

            work.pop();
            let (idx, low) = self.index[name];
            if let Some(&(parent, _)) = work.last() {
                self.lower(parent, low);
            }
            if idx == low {
                self.close(name);
            }
        }
    }

    fn open(&mut self, name: &'g str) {
        let idx = self.index.len();
        self.index.insert(name, (idx, idx));
        self.stack.push(name);
        self.on_stack.insert(name);
    }

    fn lower(&mut self, name: &str, value: usize) {
        let entry = &mut self.index[name];
        entry.1 = entry.1.min(value);
    }

    /// Pop the component rooted at `name`.
    fn close(&mut self, name: &str) {
        let mut component = Vec::new();
        while let Some(member) = self.stack.pop() {
            self.on_stack.remove(member);
            component.push(member);
            if member == name {
                break;
            }
        }
        let self_loop = self.graph.get(name).is_some_and(|deps| deps.contains(name));
        if component.len() > 1 || self_loop {
            self.cyclic.extend(component.into_iter().map(String::from));
        }
    }
}

/// Names that sit on at least one reference cycle.
fn cyclic_core(graph: &DependencyGraph) -> Vec<String> {
    let mut tarjan = Tarjan {
        graph,
        index: IndexMap::new(),
        stack: Vec::new(),
        on_stack: HashSet::new(),
        cyclic: Vec::new(),
    };
    for name in graph.keys() {
        if !tarjan.index.contains_key(name.as_str()) {
            tarjan.visit(name);
        }
    }
    tarjan.cyclic
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn reverse(graph: &DependencyGraph) -> DependencyGraph {
    let mut out: DependencyGraph = graph.keys().map(|k| (k.clone(), IndexSet::new())).collect();
    for (from, deps) in graph {
        for to in deps {
            out.entry(to.clone()).or_default().insert(from.clone());
        }
    }
    out
}

fn reachable<'g>(graph: &'g DependencyGraph, roots: &[String]) -> HashSet<&'g str> {
    let mut seen = HashSet::new();
    let mut pending: Vec<&str> = roots.iter().map(String::as_str).collect();
    while let Some(name) = pending.pop() {
        if let Some((key, deps)) = graph.get_key_value(name) {
            if seen.insert(key.as_str()) {
                pending.extend(deps.iter().map(String::as_str));
            }
        }
    }
    seen
}

/// Depth-first post-order over the non-cyclic subgraph, in graph order.
fn emission_order(graph: &DependencyGraph, cyclic: &HashSet<&str>) -> Vec<String> {
    let mut done: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for root in graph.keys() {
        let root = root.as_str();
        if cyclic.contains(root) || !done.insert(root) {
            continue;
        }
        let mut work: Vec<(&str, usize)> = vec![(root, 0)];
        while let Some(frame) = work.last_mut() {
            match graph.get(frame.0).and_then(|deps| deps.get_index(frame.1)) {
                Some(dep) => {
                    frame.1 += 1;
                    let dep = dep.as_str();
                    if !cyclic.contains(dep) && done.insert(dep) {
                        work.push((dep, 0));
                    }
                }
                None => {
                    out.push(frame.0.to_string());
                    work.pop();
                }
            }
        }
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
