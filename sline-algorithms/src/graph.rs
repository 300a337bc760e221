//! Undirected proximity graphs over 2D positions, with connected components and Dijkstra shortest paths

use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap, VecDeque};

use sline_core::nalgebra::Vector2;

use crate::spatial::SpatialIndex;

/// Undirected graph connecting each node to its nearest neighbours, weighted by Euclidean distance
#[derive(Debug, Clone)]
pub struct ProximityGraph {
    adjacency: Vec<Vec<(usize, f64)>>,
    num_edges: usize,
}

impl ProximityGraph {
    /// Connects every position to the positions returned by a `k`-nearest-neighbour query around it. The query
    /// includes the position itself, so each node contributes at most `k - 1` edges. Self loops are skipped and
    /// an edge found from both of its endpoints is only added once. Equidistant neighbours are taken in index order
    pub fn k_nearest(positions: &[Vector2<f64>], k: usize) -> Self {
        let index = SpatialIndex::new(positions.iter().copied());
        let mut edges = BTreeSet::new();
        for (node, position) in positions.iter().enumerate() {
            for (neighbour, _) in index.k_nearest(position, k) {
                if neighbour != node {
                    edges.insert((node.min(neighbour), node.max(neighbour)));
                }
            }
        }

        let mut adjacency = vec![vec![]; positions.len()];
        for (from, to) in &edges {
            let weight = (positions[*from] - positions[*to]).norm();
            adjacency[*from].push((*to, weight));
            adjacency[*to].push((*from, weight));
        }
        for neighbours in adjacency.iter_mut() {
            neighbours.sort_by_key(|(neighbour, _)| *neighbour);
        }
        Self {
            adjacency,
            num_edges: edges.len(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Neighbours of `node` with the edge weights, in ascending neighbour order
    pub fn neighbours(&self, node: usize) -> &[(usize, f64)] {
        &self.adjacency[node]
    }

    /// Connected components in order of discovery (breadth-first search started from each unvisited node in
    /// index order). The nodes of each component are sorted ascending
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.num_nodes()];
        let mut components = vec![];
        for start in 0..self.num_nodes() {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            let mut component = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(node) = queue.pop_front() {
                for (neighbour, _) in self.neighbours(node) {
                    if !visited[*neighbour] {
                        visited[*neighbour] = true;
                        component.push(*neighbour);
                        queue.push_back(*neighbour);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }
        components
    }

    /// The largest connected component. Among components of equal size, the one discovered first wins.
    /// Returns `None` for an empty graph
    pub fn largest_component(&self) -> Option<Vec<usize>> {
        self.connected_components()
            .into_iter()
            .fold(None, |largest: Option<Vec<usize>>, component| match largest {
                Some(largest) if largest.len() >= component.len() => Some(largest),
                _ => Some(component),
            })
    }

    /// Shortest path from `start` to `goal` as a sequence of nodes (both included), or `None` if `goal` is not
    /// reachable. Among queue entries of equal cost, the lower node index is expanded first
    pub fn shortest_path(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        let n = self.num_nodes();
        if start >= n || goal >= n {
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }

        let mut dist = vec![f64::INFINITY; n];
        let mut prev: Vec<Option<usize>> = vec![None; n];
        dist[start] = 0.0;

        let mut heap = BinaryHeap::new();
        heap.push(DijkstraState {
            cost: 0.0,
            node: start,
        });

        while let Some(DijkstraState { cost, node }) = heap.pop() {
            if cost > dist[node] {
                continue;
            }
            if node == goal {
                break;
            }
            for &(neighbour, weight) in self.neighbours(node) {
                let new_dist = cost + weight;
                if new_dist < dist[neighbour] {
                    dist[neighbour] = new_dist;
                    prev[neighbour] = Some(node);
                    heap.push(DijkstraState {
                        cost: new_dist,
                        node: neighbour,
                    });
                }
            }
        }

        let mut path = vec![goal];
        let mut current = goal;
        while current != start {
            current = prev[current]?;
            path.push(current);
        }
        path.reverse();
        Some(path)
    }
}

#[derive(Clone, Copy, Debug)]
struct DijkstraState {
    cost: f64,
    node: usize,
}

impl PartialEq for DijkstraState {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DijkstraState {}

impl Ord for DijkstraState {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so both keys are reversed
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for DijkstraState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(count: usize, offset: f64) -> Vec<Vector2<f64>> {
        (0..count)
            .map(|idx| Vector2::new(idx as f64 + offset, 0.0))
            .collect()
    }

    #[test]
    fn test_k_nearest_graph_has_no_self_loops_or_duplicates() {
        let graph = ProximityGraph::k_nearest(&line(5, 0.0), 2);
        assert_eq!(4, graph.num_edges());
        for node in 0..graph.num_nodes() {
            assert!(graph.neighbours(node).iter().all(|(n, _)| *n != node));
        }
        assert_eq!(&[(0, 1.0), (2, 1.0)], graph.neighbours(1));
    }

    #[test]
    fn test_components() {
        let mut positions = line(3, 0.0);
        positions.extend(line(4, 100.0));
        positions.push(Vector2::new(-50.0, 0.0));
        let graph = ProximityGraph::k_nearest(&positions, 2);
        let components = graph.connected_components();
        assert_eq!(
            vec![vec![0, 1, 2, 7], vec![3, 4, 5, 6]],
            components
                .iter()
                .filter(|c| c.len() > 1)
                .cloned()
                .collect::<Vec<_>>()
        );
        assert_eq!(Some(vec![0, 1, 2, 7]), graph.largest_component());
    }

    #[test]
    fn test_largest_component_tie_prefers_first() {
        let mut positions = line(3, 50.0);
        positions.extend(line(3, 0.0));
        let graph = ProximityGraph::k_nearest(&positions, 2);
        assert_eq!(Some(vec![0, 1, 2]), graph.largest_component());
    }

    #[test]
    fn test_shortest_path_along_line() {
        let graph = ProximityGraph::k_nearest(&line(6, 0.0), 2);
        assert_eq!(Some(vec![0, 1, 2, 3, 4, 5]), graph.shortest_path(0, 5));
        assert_eq!(Some(vec![3]), graph.shortest_path(3, 3));
    }

    #[test]
    fn test_shortest_path_unreachable() {
        let mut positions = line(2, 0.0);
        positions.extend(line(2, 10.0));
        let graph = ProximityGraph::k_nearest(&positions, 2);
        assert_eq!(None, graph.shortest_path(0, 3));
        assert_eq!(None, graph.shortest_path(0, 17));
    }

    #[test]
    fn test_empty_graph() {
        let graph = ProximityGraph::k_nearest(&[], 6);
        assert_eq!(0, graph.num_nodes());
        assert_eq!(None, graph.largest_component());
    }
}
