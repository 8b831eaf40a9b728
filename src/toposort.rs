use std::collections::HashMap;
use std::hash::Hash;

/// Layered topological order over the edges `before -> after`.
///
/// Each layer holds the items whose predecessors were all emitted in earlier layers.
/// A cycle stops the iteration early, see [`TopoLayers::is_cyclic`].
pub struct TopoLayers<T> {
    /// Number of predecessors not yet emitted, for every blocked item.
    blocked: HashMap<T, usize>,
    successors: HashMap<T, Vec<T>>,
    ready: Vec<T>,
}

impl<T> TopoLayers<T>
where
    T: Hash + Eq + Clone,
{
    fn from_edges(
        nodes: impl IntoIterator<Item = T>,
        edges: impl IntoIterator<Item = (T, T)>,
    ) -> Self {
        let mut blocked: HashMap<T, usize> = nodes.into_iter().map(|x| (x, 0)).collect();
        let mut successors: HashMap<T, Vec<T>> = HashMap::new();
        for (before, after) in edges {
            *blocked.entry(after.clone()).or_default() += 1;
            blocked.entry(before.clone()).or_default();
            successors.entry(before).or_default().push(after);
        }
        let ready = blocked
            .iter()
            .filter(|&(_, &count)| count == 0)
            .map(|(x, _)| x.clone())
            .collect();
        blocked.retain(|_, count| *count > 0);
        Self {
            blocked,
            successors,
            ready,
        }
    }

    /// Whether some items were never emitted because they lie on (or behind) a cycle.
    /// Meaningful once the iterator is exhausted.
    pub fn is_cyclic(&self) -> bool {
        !self.blocked.is_empty()
    }
}

impl<T> Iterator for TopoLayers<T>
where
    T: Hash + Eq + Clone,
{
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.ready.is_empty() {
            return None;
        }
        let layer = std::mem::take(&mut self.ready);
        for item in &layer {
            for succ in self.successors.remove(item).unwrap_or_default() {
                if let Some(count) = self.blocked.get_mut(&succ) {
                    *count -= 1;
                    if *count == 0 {
                        self.blocked.remove(&succ);
                        self.ready.push(succ);
                    }
                }
            }
        }
        Some(layer)
    }
}

/// Layers of `graph` (item -> its dependencies) starting from the items nothing depends on.
pub fn toposort_forward<T>(graph: &HashMap<T, Vec<T>>) -> TopoLayers<T>
where
    T: Hash + Eq + Clone,
{
    let edges = graph
        .iter()
        .flat_map(|(item, deps)| deps.iter().map(move |dep| (item.clone(), dep.clone())));
    TopoLayers::from_edges(graph.keys().cloned(), edges)
}

/// Layers of `graph` (item -> its dependencies) starting from the items without dependencies.
pub fn toposort_backward<T>(graph: &HashMap<T, Vec<T>>) -> TopoLayers<T>
where
    T: Hash + Eq + Clone,
{
    let edges = graph
        .iter()
        .flat_map(|(item, deps)| deps.iter().map(move |dep| (dep.clone(), item.clone())));
    TopoLayers::from_edges(graph.keys().cloned(), edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    #[test]
    fn test_forward_toposort() {
        let mut graph = HashMap::new();
        graph.insert("g1", vec!["x1", "x2"]);
        graph.insert("g2", vec!["g1", "x3"]);
        graph.insert("g3", vec!["x1", "g2"]);
        let mut sort = toposort_forward(&graph);
        let layers = sort
            .by_ref()
            .map(|layer| layer.into_iter().collect::<HashSet<_>>())
            .collect::<Vec<_>>();
        assert_eq!(layers[0], HashSet::from(["g3"]));
        assert_eq!(layers[1], HashSet::from(["g2"]));
        assert_eq!(layers[2], HashSet::from(["g1", "x3"]));
        assert_eq!(layers[3], HashSet::from(["x1", "x2"]));
        assert!(!sort.is_cyclic());
    }

    #[test]
    fn test_forward_toposort_cycle() {
        let mut graph = HashMap::new();
        graph.insert("x1", vec!["x2"]);
        graph.insert("x2", vec!["x3"]);
        graph.insert("x3", vec!["x1"]);
        let mut sort = toposort_forward(&graph);
        sort.by_ref().for_each(|_| {});
        assert!(sort.is_cyclic());
    }

    #[test]
    fn test_backward_toposort() {
        let mut graph = HashMap::new();
        graph.insert("g1", vec!["x1", "x2"]);
        graph.insert("g2", vec!["g1", "x3"]);
        graph.insert("g3", vec!["x1", "g2"]);
        let mut layers = toposort_backward(&graph);
        assert_eq!(
            layers.next().unwrap().into_iter().collect::<HashSet<_>>(),
            HashSet::from(["x1", "x2", "x3"])
        );
        assert_eq!(
            layers.next().unwrap().into_iter().collect::<HashSet<_>>(),
            HashSet::from(["g1"])
        );
        assert_eq!(
            layers.next().unwrap().into_iter().collect::<HashSet<_>>(),
            HashSet::from(["g2"])
        );
        assert_eq!(
            layers.next().unwrap().into_iter().collect::<HashSet<_>>(),
            HashSet::from(["g3"])
        );
        assert_eq!(layers.next(), None);
        assert!(!layers.is_cyclic());
    }

    #[test]
    fn test_backward_toposort_cycle() {
        let mut graph = HashMap::new();
        graph.insert("x0", vec![]);
        graph.insert("x1", vec!["x2", "x0"]);
        graph.insert("x2", vec!["x3"]);
        graph.insert("x3", vec!["x1"]);
        let mut sort = toposort_backward(&graph);
        let layers = sort.by_ref().collect::<Vec<_>>();
        assert_eq!(layers, vec![vec!["x0"]]);
        assert!(sort.is_cyclic());
    }

    #[test]
    fn test_repeated_dependency() {
        let mut graph = HashMap::new();
        graph.insert("g", vec!["x", "x"]);
        let mut sort = toposort_backward(&graph);
        let layers = sort.by_ref().collect::<Vec<_>>();
        assert_eq!(layers, vec![vec!["x"], vec!["g"]]);
        assert!(!sort.is_cyclic());
    }
}
