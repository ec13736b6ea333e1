use crate::state_machine::{FsmModel, StateId, Transition};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use std::collections::{HashMap, HashSet};

/// A directed multigraph over the states of a model.
///
/// Built fresh from a model for every analysis and never kept around, so it
/// cannot go stale when the model's transitions change.
pub struct TransitionGraph<'a> {
    /// Nodes are states; one edge per transition, in model order.
    pub graph: DiGraph<&'a StateId, &'a Transition>,

    /// Lookup from state name to its node.
    pub state_index: HashMap<&'a StateId, NodeIndex>,

    initial: &'a StateId,
}

/// Result of the bounded elementary-cycle search
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleAnalysis {
    /// Every elementary cycle was enumerated
    Exact { count: usize },
    /// The search ran out of budget after finding `found` cycles
    Truncated { found: usize, budget: usize },
}

impl CycleAnalysis {
    /// Cycles found so far; a lower bound when truncated
    pub fn found(&self) -> usize {
        match self {
            CycleAnalysis::Exact { count } => *count,
            CycleAnalysis::Truncated { found, .. } => *found,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, CycleAnalysis::Truncated { .. })
    }
}

impl<'a> TransitionGraph<'a> {
    pub fn from_model(model: &'a FsmModel) -> Self {
        let mut graph = DiGraph::new();
        let mut state_index = HashMap::new();

        for state in model.states() {
            let idx = graph.add_node(state);
            state_index.insert(state, idx);
        }

        for t in model.transitions() {
            let from = *state_index
                .entry(&t.state)
                .or_insert_with(|| graph.add_node(&t.state));
            let to = *state_index
                .entry(&t.next_state)
                .or_insert_with(|| graph.add_node(&t.next_state));
            graph.add_edge(from, to, t);
        }

        Self {
            graph,
            state_index,
            initial: model.initial_state(),
        }
    }

    /// States reachable from the initial state, including itself.
    ///
    /// Empty when the initial state is not a node of the graph.
    pub fn reachable_from_initial(&self) -> HashSet<&'a StateId> {
        let mut reachable = HashSet::new();
        let Some(&start) = self.state_index.get(self.initial) else {
            return reachable;
        };

        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(idx) = dfs.next(&self.graph) {
            reachable.insert(self.graph[idx]);
        }
        reachable
    }

    /// Count elementary cycles, spending at most `budget` search steps.
    ///
    /// Parallel edges are collapsed and self-loops count as cycles. Each cycle
    /// is found once, rooted at its lowest-indexed node.
    pub fn count_cycles(&self, budget: usize) -> CycleAnalysis {
        let n = self.graph.node_count();
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for edge in self.graph.edge_references() {
            let (from, to) = (edge.source().index(), edge.target().index());
            if !successors[from].contains(&to) {
                successors[from].push(to);
            }
        }

        let mut search = CycleSearch {
            successors: &successors,
            on_path: vec![false; n],
            found: 0,
            steps: 0,
            budget,
        };

        for root in 0..n {
            if !search.walk(root) {
                tracing::debug!(
                    "Cycle search stopped after {} steps with {} cycles",
                    search.steps,
                    search.found
                );
                return CycleAnalysis::Truncated {
                    found: search.found,
                    budget,
                };
            }
        }
        CycleAnalysis::Exact {
            count: search.found,
        }
    }

    /// Find all states without incoming transitions
    pub fn find_source_states(&self) -> Vec<&'a StateId> {
        self.states_without(Direction::Incoming)
    }

    /// Find all terminal states (no outgoing transitions)
    pub fn find_terminal_states(&self) -> Vec<&'a StateId> {
        self.states_without(Direction::Outgoing)
    }

    fn states_without(&self, direction: Direction) -> Vec<&'a StateId> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph.edges_directed(idx, direction).next().is_none())
            .map(|idx| self.graph[idx])
            .collect()
    }

    /// Export to DOT format for Graphviz
    pub fn to_dot(&self) -> String {
        let mut dot = "digraph StateMachine {\n".to_string();
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=filled];\n\n");

        for idx in self.graph.node_indices() {
            let state = self.graph[idx];
            let color = if state == self.initial {
                "lightblue"
            } else {
                "lightgray"
            };
            dot.push_str(&format!(
                "  \"{}\" [fillcolor=\"{}\"];\n",
                escape(state.as_str()),
                color
            ));
        }

        dot.push('\n');

        for edge in self.graph.edge_references() {
            let transition = edge.weight();
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\", color=\"{}\"];\n",
                escape(self.graph[edge.source()].as_str()),
                escape(self.graph[edge.target()].as_str()),
                escape(&transition.display_label()),
                transition.source.color()
            ));
        }

        dot.push_str("}\n");
        dot
    }

    /// Get graph statistics
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_states: self.graph.node_count(),
            total_transitions: self.graph.edge_count(),
            source_states: self.find_source_states().len(),
            terminal_states: self.find_terminal_states().len(),
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

struct CycleSearch<'s> {
    successors: &'s [Vec<usize>],
    on_path: Vec<bool>,
    found: usize,
    steps: usize,
    budget: usize,
}

impl CycleSearch<'_> {
    /// Enumerate the cycles through `root`, only visiting nodes `>= root`.
    ///
    /// Iterative; the path lives in an explicit stack of
    /// `(node, next successor position)` frames. Returns false once the step
    /// budget is exhausted.
    fn walk(&mut self, root: usize) -> bool {
        let successors = self.successors;
        let mut path: Vec<(usize, usize)> = vec![(root, 0)];
        self.on_path[root] = true;

        while let Some(frame) = path.last_mut() {
            let (node, cursor) = *frame;
            let Some(&next) = successors[node].get(cursor) else {
                self.on_path[node] = false;
                path.pop();
                continue;
            };
            frame.1 += 1;

            self.steps += 1;
            if self.steps > self.budget {
                for &(node, _) in &path {
                    self.on_path[node] = false;
                }
                return false;
            }

            if next == root {
                self.found += 1;
            } else if next > root && !self.on_path[next] {
                self.on_path[next] = true;
                path.push((next, 0));
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub total_states: usize,
    pub total_transitions: usize,
    pub source_states: usize,
    pub terminal_states: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::{EventId, GraphBuilder, TransitionSource};

    fn t(state: &str, event: &str, next: &str) -> Transition {
        Transition::new(
            StateId::new(state).unwrap(),
            EventId::new(event).unwrap(),
            "act",
            StateId::new(next).unwrap(),
        )
    }

    fn build(list: &[Transition]) -> FsmModel {
        GraphBuilder::default().build(list, "test").unwrap()
    }

    #[test]
    fn test_empty_graph() {
        let model = build(&[]);
        let graph = TransitionGraph::from_model(&model);
        assert_eq!(graph.graph.node_count(), 0);
        assert!(graph.reachable_from_initial().is_empty());
        assert_eq!(graph.count_cycles(100), CycleAnalysis::Exact { count: 0 });
    }

    #[test]
    fn test_multigraph_keeps_parallel_edges() {
        let model = build(&[t("a", "x", "b"), t("a", "y", "b")]);
        let graph = TransitionGraph::from_model(&model);
        assert_eq!(graph.graph.node_count(), 2);
        assert_eq!(graph.graph.edge_count(), 2);
    }

    #[test]
    fn test_reachability() {
        let model = build(&[t("idle", "go", "busy"), t("orphan", "go", "busy")]);
        let graph = TransitionGraph::from_model(&model);
        let reachable = graph.reachable_from_initial();
        assert!(reachable.contains(&StateId::new("idle").unwrap()));
        assert!(reachable.contains(&StateId::new("busy").unwrap()));
        assert!(!reachable.contains(&StateId::new("orphan").unwrap()));
    }

    #[test]
    fn test_count_cycles() {
        // a <-> b, b <-> c, self-loop on c, parallel a->b edges
        let model = build(&[
            t("a", "x", "b"),
            t("a", "y", "b"),
            t("b", "x", "a"),
            t("b", "z", "c"),
            t("c", "z", "b"),
            t("c", "loop", "c"),
        ]);
        let graph = TransitionGraph::from_model(&model);
        assert_eq!(graph.count_cycles(10_000), CycleAnalysis::Exact { count: 3 });
    }

    #[test]
    fn test_count_cycles_complete_graph() {
        // K4 without self-loops has 20 elementary cycles
        let names = ["a", "b", "c", "d"];
        let mut list = Vec::new();
        for from in names {
            for to in names {
                if from != to {
                    list.push(t(from, to, to));
                }
            }
        }
        let model = build(&list);
        let graph = TransitionGraph::from_model(&model);
        assert_eq!(graph.count_cycles(1_000_000).found(), 20);
    }

    #[test]
    fn test_count_cycles_truncates() {
        let names = ["a", "b", "c", "d", "e"];
        let mut list = Vec::new();
        for from in names {
            for to in names {
                list.push(t(from, to, to));
            }
        }
        let model = build(&list);
        let graph = TransitionGraph::from_model(&model);
        let analysis = graph.count_cycles(10);
        assert!(analysis.is_truncated());
        assert!(matches!(analysis, CycleAnalysis::Truncated { budget: 10, .. }));
    }

    #[test]
    fn test_count_cycles_on_long_ring() {
        let n = 100_000;
        let list: Vec<Transition> = (0..n)
            .map(|i| t(&format!("s{}", i), "next", &format!("s{}", (i + 1) % n)))
            .collect();
        let model = build(&list);
        let graph = TransitionGraph::from_model(&model);

        // The first root walks the whole ring, the second runs out of budget.
        let analysis = graph.count_cycles(150_000);
        assert_eq!(
            analysis,
            CycleAnalysis::Truncated {
                found: 1,
                budget: 150_000
            }
        );
    }

    #[test]
    fn test_to_dot_output() {
        let model = build(&[
            t("idle", "start", "running"),
            t("running", "error", "failed").with_source(TransitionSource::LlmInferred),
        ]);
        let dot = TransitionGraph::from_model(&model).to_dot();
        assert!(dot.contains("digraph StateMachine"));
        assert!(dot.contains("\"idle\" [fillcolor=\"lightblue\"]"));
        assert!(dot.contains("\"idle\" -> \"running\" [label=\"start / act\""));
        assert!(dot.contains("color=\"orange\""));
    }

    #[test]
    fn test_graph_stats() {
        let model = build(&[t("idle", "start", "running"), t("running", "done", "finished")]);
        let stats = TransitionGraph::from_model(&model).stats();
        assert_eq!(stats.total_states, 3);
        assert_eq!(stats.total_transitions, 2);
        assert_eq!(stats.source_states, 1);
        assert_eq!(stats.terminal_states, 1);
    }
}
