//! Pipeline graph declaration and compilation.

use crate::errors::{ContractErrorInfo, CycleDetectedError, PipelineValidationError};
use crate::stages::Stage;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// Strongly typed name of a stage node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageKey(String);

impl StageKey {
    /// Creates a key.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StageKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A node in the pipeline graph.
///
/// `Start` and `End` are reserved markers; every other node is a declared stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeId {
    /// The single entry marker.
    Start,
    /// The terminal marker.
    End,
    /// A declared stage.
    Stage(StageKey),
}

impl NodeId {
    /// Creates a stage node id.
    #[must_use]
    pub fn stage(name: impl Into<String>) -> Self {
        Self::Stage(StageKey::new(name))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("__start__"),
            Self::End => f.write_str("__end__"),
            Self::Stage(key) => key.fmt(f),
        }
    }
}

impl From<&str> for NodeId {
    fn from(name: &str) -> Self {
        Self::stage(name)
    }
}

impl From<StageKey> for NodeId {
    fn from(key: StageKey) -> Self {
        Self::Stage(key)
    }
}

/// Declares stages and the edges between them.
///
/// Edges are only checked by [`PipelineGraph::compile`], so they may be added
/// in any order.
#[derive(Debug, Clone)]
pub struct PipelineGraph {
    name: String,
    nodes: Vec<(StageKey, Arc<dyn Stage>)>,
    index: HashMap<StageKey, usize>,
    edges: Vec<(NodeId, NodeId)>,
}

impl PipelineGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
        }
    }

    /// Builds `Start -> stages[0] -> ... -> End`, keyed by each stage's name.
    ///
    /// # Errors
    ///
    /// Returns an error if two stages share a name.
    pub fn linear(
        name: impl Into<String>,
        stages: impl IntoIterator<Item = Arc<dyn Stage>>,
    ) -> Result<Self, PipelineValidationError> {
        let mut graph = Self::new(name);
        let mut previous = NodeId::Start;
        for stage in stages {
            let key = StageKey::new(stage.name());
            graph = graph.add_node(key.clone(), stage)?;
            graph = graph.add_edge(previous, key.clone());
            previous = NodeId::Stage(key);
        }
        Ok(graph.add_edge(previous, NodeId::End))
    }

    /// Declares a stage node.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is already declared.
    pub fn add_node(
        mut self,
        key: impl Into<StageKey>,
        stage: Arc<dyn Stage>,
    ) -> Result<Self, PipelineValidationError> {
        let key = key.into();
        if self.index.contains_key(&key) {
            return Err(PipelineValidationError::new(format!(
                "Stage '{key}' is declared twice"
            ))
            .with_stages(vec![key.to_string()])
            .with_error_info(
                ContractErrorInfo::new("GRAPH-DUPLICATE", format!("Duplicate stage '{key}'"))
                    .with_fix_hint("Give every stage node a unique name."),
            ));
        }

        self.index.insert(key.clone(), self.nodes.len());
        self.nodes.push((key, stage));
        Ok(self)
    }

    /// Adds a directed edge.
    #[must_use]
    pub fn add_edge(mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    /// Returns the graph name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of declared stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.nodes.len()
    }

    /// Validates the graph and fixes its execution order.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph is empty, an edge names an undeclared
    /// node or leaves `End` / enters `Start`, a cycle exists, a stage is not
    /// reachable from `Start`, or a stage has no path to `End`.
    pub fn compile(self) -> Result<CompiledPipeline, PipelineValidationError> {
        if self.nodes.is_empty() {
            return Err(PipelineValidationError::new("Pipeline has no stages").with_error_info(
                ContractErrorInfo::new("GRAPH-EMPTY", "Cannot compile an empty pipeline")
                    .with_fix_hint("Add at least one stage before compiling."),
            ));
        }

        self.check_edges()?;

        let successors = self.successors();
        self.detect_cycles(&successors)?;

        let reachable = reachable_from(&NodeId::Start, &successors);
        let unreachable = self.stages_outside(&reachable);
        if !unreachable.is_empty() {
            return Err(PipelineValidationError::new(format!(
                "Stages not reachable from start: {}",
                unreachable.join(", ")
            ))
            .with_stages(unreachable)
            .with_error_info(
                ContractErrorInfo::new("GRAPH-UNREACHABLE", "Some stages can never run")
                    .with_fix_hint("Add an edge from start or from a reachable stage."),
            ));
        }

        let predecessors = invert(&successors);
        let finishing = reachable_from(&NodeId::End, &predecessors);
        let stranded = self.stages_outside(&finishing);
        if !stranded.is_empty() {
            return Err(PipelineValidationError::new(format!(
                "Stages with no path to end: {}",
                stranded.join(", ")
            ))
            .with_stages(stranded)
            .with_error_info(
                ContractErrorInfo::new("GRAPH-NO_TERMINAL", "Some stages never reach the end marker")
                    .with_fix_hint("Add an edge from every leaf stage to end."),
            ));
        }

        let order = self.topological_order(&successors);
        let mut slots: Vec<Option<(StageKey, Arc<dyn Stage>)>> =
            self.nodes.into_iter().map(Some).collect();
        let stages = order
            .into_iter()
            .filter_map(|position| slots[position].take())
            .collect();

        Ok(CompiledPipeline {
            name: self.name,
            stages,
        })
    }

    fn check_edges(&self) -> Result<(), PipelineValidationError> {
        for (from, to) in &self.edges {
            if *from == NodeId::End || *to == NodeId::Start {
                return Err(PipelineValidationError::new(format!(
                    "Edge {from} -> {to} uses a reserved marker in the wrong direction"
                ))
                .with_error_info(
                    ContractErrorInfo::new("GRAPH-MARKER_EDGE", "Edges may not leave end or enter start")
                        .with_context_entry("from", from.to_string())
                        .with_context_entry("to", to.to_string()),
                ));
            }

            for node in [from, to] {
                if let NodeId::Stage(key) = node {
                    if !self.index.contains_key(key) {
                        return Err(PipelineValidationError::new(format!(
                            "Edge {from} -> {to} references unknown stage '{key}'"
                        ))
                        .with_stages(vec![key.to_string()])
                        .with_error_info(
                            ContractErrorInfo::new(
                                "GRAPH-DANGLING_EDGE",
                                format!("Stage '{key}' not declared"),
                            )
                            .with_fix_hint("Declare the stage with add_node before compiling."),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn successors(&self) -> HashMap<NodeId, Vec<NodeId>> {
        let mut successors: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for (from, to) in &self.edges {
            let targets = successors.entry(from.clone()).or_default();
            if !targets.contains(to) {
                targets.push(to.clone());
            }
        }
        successors
    }

    fn stages_outside(&self, set: &HashSet<NodeId>) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|(key, _)| !set.contains(&NodeId::Stage(key.clone())))
            .map(|(key, _)| key.to_string())
            .collect()
    }

    fn detect_cycles(&self, successors: &HashMap<NodeId, Vec<NodeId>>) -> Result<(), CycleDetectedError> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for (key, _) in &self.nodes {
            let node = NodeId::Stage(key.clone());
            if !visited.contains(&node) {
                if let Some(cycle) = dfs_cycle(&node, successors, &mut visited, &mut rec_stack, &mut path) {
                    return Err(CycleDetectedError::new(cycle));
                }
            }
        }

        Ok(())
    }

    /// Kahn's algorithm over stage nodes, ties broken by declaration order.
    fn topological_order(&self, successors: &HashMap<NodeId, Vec<NodeId>>) -> Vec<usize> {
        let mut in_degree = vec![0_usize; self.nodes.len()];
        for (from, targets) in successors {
            if !matches!(from, NodeId::Stage(_)) {
                continue;
            }
            for target in targets {
                if let NodeId::Stage(key) = target {
                    in_degree[self.index[key]] += 1;
                }
            }
        }

        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree == 0)
            .map(|(position, _)| position)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(position) = ready.pop_first() {
            order.push(position);
            let node = NodeId::Stage(self.nodes[position].0.clone());
            for target in successors.get(&node).into_iter().flatten() {
                if let NodeId::Stage(key) = target {
                    let child = self.index[key];
                    in_degree[child] -= 1;
                    if in_degree[child] == 0 {
                        ready.insert(child);
                    }
                }
            }
        }

        order
    }
}

fn dfs_cycle(
    node: &NodeId,
    successors: &HashMap<NodeId, Vec<NodeId>>,
    visited: &mut HashSet<NodeId>,
    rec_stack: &mut HashSet<NodeId>,
    path: &mut Vec<NodeId>,
) -> Option<Vec<String>> {
    visited.insert(node.clone());
    rec_stack.insert(node.clone());
    path.push(node.clone());

    for next in successors.get(node).into_iter().flatten() {
        if !matches!(next, NodeId::Stage(_)) {
            continue;
        }
        if !visited.contains(next) {
            if let Some(cycle) = dfs_cycle(next, successors, visited, rec_stack, path) {
                return Some(cycle);
            }
        } else if rec_stack.contains(next) {
            let cycle_start = path.iter().position(|n| n == next).unwrap_or(0);
            let mut cycle: Vec<String> = path[cycle_start..].iter().map(ToString::to_string).collect();
            cycle.push(next.to_string());
            return Some(cycle);
        }
    }

    path.pop();
    rec_stack.remove(node);
    None
}

fn reachable_from(origin: &NodeId, adjacency: &HashMap<NodeId, Vec<NodeId>>) -> HashSet<NodeId> {
    let mut seen = HashSet::from([origin.clone()]);
    let mut queue = VecDeque::from([origin.clone()]);
    while let Some(node) = queue.pop_front() {
        for next in adjacency.get(&node).into_iter().flatten() {
            if seen.insert(next.clone()) {
                queue.push_back(next.clone());
            }
        }
    }
    seen
}

fn invert(successors: &HashMap<NodeId, Vec<NodeId>>) -> HashMap<NodeId, Vec<NodeId>> {
    let mut predecessors: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for (from, targets) in successors {
        for to in targets {
            predecessors.entry(to.clone()).or_default().push(from.clone());
        }
    }
    predecessors
}

/// A validated pipeline with a fixed execution order.
#[derive(Debug, Clone)]
pub struct CompiledPipeline {
    name: String,
    stages: Vec<(StageKey, Arc<dyn Stage>)>,
}

impl CompiledPipeline {
    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns stage keys in execution order.
    #[must_use]
    pub fn execution_order(&self) -> Vec<&str> {
        self.stages.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Iterates stages in execution order.
    pub fn stages(&self) -> impl Iterator<Item = (&StageKey, &Arc<dyn Stage>)> {
        self.stages.iter().map(|(key, stage)| (key, stage))
    }
}
