use log::{debug, info};
use sline_core::{
    error::{Result, ShorelineError},
    math::percentile,
    nalgebra::Vector2,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{graph::ProximityGraph, rasterize::BoundaryCandidate, spatial::SpatialIndex};

/// Parameters for turning unordered boundary candidates into a single ordered curve
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurveParams {
    /// Radius (inclusive) of the neighbourhood used for outlier rejection
    pub neighbor_radius: f64,
    /// Candidates with fewer neighbours (excluding themselves) within `neighbor_radius` are dropped
    pub min_neighbors: usize,
    /// Candidates with an elevation strictly below this percentile of all candidate elevations are dropped
    pub low_elevation_percentile: f64,
    /// Size of the nearest neighbour query used to build the proximity graph, including the node itself
    pub graph_neighbors: usize,
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            neighbor_radius: 2.0,
            min_neighbors: 4,
            low_elevation_percentile: 10.0,
            graph_neighbors: 6,
        }
    }
}

/// Drops isolated candidates and candidates in the lowest elevation percentile. The remaining candidates
/// keep their relative order
pub fn reject_outliers(candidates: &[BoundaryCandidate], params: &CurveParams) -> Vec<BoundaryCandidate> {
    let index = SpatialIndex::new(candidates.iter().map(|c| c.position));
    let elevations = candidates.iter().map(|c| c.elevation).collect::<Vec<_>>();
    let elevation_floor = percentile(&elevations, params.low_elevation_percentile);

    candidates
        .iter()
        .enumerate()
        .filter(|(idx, candidate)| {
            let neighbours = index
                .within_radius(&candidate.position, params.neighbor_radius)
                .into_iter()
                .filter(|neighbour| neighbour != idx)
                .count();
            neighbours >= params.min_neighbors
        })
        .filter(|(_, candidate)| match elevation_floor {
            Some(floor) => candidate.elevation >= floor,
            None => true,
        })
        .map(|(_, candidate)| *candidate)
        .collect()
}

/// The pair of positions with the largest distance among `nodes`, compared exhaustively. Pairs `(i, j)` with
/// `i < j` are visited in row-major order over `nodes` and the first maximal pair wins. Quadratic in the number
/// of nodes, which stays small for boundary candidates
pub fn diameter_endpoints(positions: &[Vector2<f64>], nodes: &[usize]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize, f64)> = None;
    for (i, from) in nodes.iter().enumerate() {
        for to in &nodes[i + 1..] {
            let distance = (positions[*from] - positions[*to]).norm_squared();
            if best.map_or(true, |(_, _, best_distance)| distance > best_distance) {
                best = Some((*from, *to, distance));
            }
        }
    }
    best.map(|(from, to, _)| (from, to))
}

/// Orders boundary candidates into a single curve: outlier rejection, proximity graph, largest connected
/// component, and the shortest path between the two component nodes that are farthest apart
///
/// # Errors
///
/// `InsufficientBoundary` if no candidate survives outlier rejection, or the largest component has fewer
/// than two nodes
pub fn build_curve(candidates: &[BoundaryCandidate], params: &CurveParams) -> Result<Vec<BoundaryCandidate>> {
    let survivors = reject_outliers(candidates, params);
    debug!(
        "Outlier rejection kept {} of {} boundary candidates",
        survivors.len(),
        candidates.len()
    );
    if survivors.is_empty() {
        return Err(ShorelineError::InsufficientBoundary { nodes: 0 });
    }

    let positions = survivors.iter().map(|c| c.position).collect::<Vec<_>>();
    let graph = ProximityGraph::k_nearest(&positions, params.graph_neighbors);
    let component = graph.largest_component().unwrap_or_default();
    if component.len() < 2 {
        return Err(ShorelineError::InsufficientBoundary {
            nodes: component.len(),
        });
    }

    let (start, goal) = diameter_endpoints(&positions, &component).ok_or(
        ShorelineError::InsufficientBoundary {
            nodes: component.len(),
        },
    )?;
    let path = graph
        .shortest_path(start, goal)
        .ok_or(ShorelineError::InsufficientBoundary {
            nodes: component.len(),
        })?;
    info!(
        "Curve of {} nodes from a component of {} nodes ({} edges in graph)",
        path.len(),
        component.len(),
        graph.num_edges()
    );
    Ok(path.into_iter().map(|node| survivors[node]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn band(count: usize) -> Vec<BoundaryCandidate> {
        (0..count)
            .flat_map(|x| {
                [0.0, 1.0].map(|y| BoundaryCandidate::new(Vector2::new(x as f64, y), 1.0))
            })
            .collect()
    }

    #[test]
    fn test_collinear_endpoints() {
        let positions = (0..10)
            .map(|idx| Vector2::new(idx as f64 * 2.0, idx as f64))
            .collect::<Vec<_>>();
        let nodes = (0..10).collect::<Vec<_>>();
        assert_eq!(Some((0, 9)), diameter_endpoints(&positions, &nodes));
    }

    #[test]
    fn test_diameter_first_pair_wins() {
        let positions = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(1.0, 1.0),
        ];
        assert_eq!(Some((0, 3)), diameter_endpoints(&positions, &[0, 1, 2, 3]));
        assert_eq!(None, diameter_endpoints(&positions, &[2]));
    }

    #[test]
    fn test_isolated_candidates_are_rejected() {
        let mut candidates = band(10);
        candidates.push(BoundaryCandidate::new(Vector2::new(50.0, 50.0), 1.0));
        let survivors = reject_outliers(&candidates, &CurveParams::default());
        assert_eq!(20, survivors.len());
    }

    #[test]
    fn test_low_candidates_are_rejected() {
        let mut candidates = band(10);
        candidates[4].elevation = -5.0;
        candidates[5].elevation = -5.0;
        let survivors = reject_outliers(&candidates, &CurveParams::default());
        assert_eq!(18, survivors.len());
        assert!(survivors.iter().all(|c| c.elevation == 1.0));
    }

    #[test]
    fn test_uniform_elevations_are_kept() {
        let survivors = reject_outliers(&band(10), &CurveParams::default());
        assert_eq!(20, survivors.len());
    }

    #[test]
    fn test_curve_spans_band() {
        let curve = build_curve(&band(30), &CurveParams::default()).unwrap();
        let first = curve.first().unwrap().position;
        let last = curve.last().unwrap().position;
        assert_approx_eq!(29.0, (last.x - first.x).abs());
        for pair in curve.windows(2) {
            assert!((pair[1].position - pair[0].position).norm() <= 2.5);
        }
    }

    #[test]
    fn test_too_few_candidates() {
        let candidates = vec![BoundaryCandidate::new(Vector2::new(0.0, 0.0), 0.0)];
        assert_eq!(
            Err(ShorelineError::InsufficientBoundary { nodes: 0 }),
            build_curve(&candidates, &CurveParams::default())
        );
        assert!(matches!(
            build_curve(&[], &CurveParams::default()),
            Err(ShorelineError::InsufficientBoundary { .. })
        ));
    }

    #[test]
    fn test_outlier_removal_never_grows_largest_component() {
        let mut candidates = band(20);
        candidates.extend(
            (0..3).map(|i| BoundaryCandidate::new(Vector2::new(40.0 + i as f64 * 3.0, 0.0), 1.0)),
        );
        let positions = candidates.iter().map(|c| c.position).collect::<Vec<_>>();
        let before = ProximityGraph::k_nearest(&positions, 6)
            .largest_component()
            .unwrap()
            .len();
        let survivors = reject_outliers(&candidates, &CurveParams::default());
        let survivor_positions = survivors.iter().map(|c| c.position).collect::<Vec<_>>();
        let after = ProximityGraph::k_nearest(&survivor_positions, 6)
            .largest_component()
            .unwrap()
            .len();
        assert!(after <= before);
    }

    fn straight_line(count: usize, spacing: f64) -> Vec<BoundaryCandidate> {
        (0..count)
            .map(|idx| BoundaryCandidate::new(Vector2::new(spacing * idx as f64, 0.0), 1.0))
            .collect()
    }

    #[test]
    fn test_three_collinear_endpoints() {
        let positions = straight_line(3, 1.0).iter().map(|c| c.position).collect::<Vec<_>>();
        assert_eq!(Some((0, 2)), diameter_endpoints(&positions, &[0, 1, 2]));

        let params = CurveParams {
            min_neighbors: 2,
            ..Default::default()
        };
        let curve = build_curve(&straight_line(3, 1.0), &params).unwrap();
        assert_eq!(Vector2::new(0.0, 0.0), curve.first().unwrap().position);
        assert_eq!(Vector2::new(2.0, 0.0), curve.last().unwrap().position);
    }

    #[test]
    fn test_curve_on_evenly_spaced_line() {
        let candidates = straight_line(12, 0.5);
        assert_eq!(12, reject_outliers(&candidates, &CurveParams::default()).len());

        let curve = build_curve(&candidates, &CurveParams::default()).unwrap();
        assert_eq!(Vector2::new(0.0, 0.0), curve.first().unwrap().position);
        assert_eq!(Vector2::new(5.5, 0.0), curve.last().unwrap().position);
        assert!(curve.windows(2).all(|w| w[0].position.x < w[1].position.x));
    }

    #[test]
    fn test_evenly_spaced_line_graph_is_connected() {
        let positions = straight_line(30, 1.0).iter().map(|c| c.position).collect::<Vec<_>>();
        let graph = ProximityGraph::k_nearest(&positions, 6);
        assert_eq!(30, graph.largest_component().unwrap().len());
    }
}
