use float_ord::FloatOrd;
use kd_tree::{KdPoint, KdTree};
use sline_core::nalgebra::Vector2;

/// A 2D position together with its index in the source sequence, so that kd-tree results can be mapped back
/// to the points (or candidates) they came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedPosition {
    pub position: [f64; 2],
    pub index: usize,
}

impl IndexedPosition {
    fn squared_distance_to(&self, query: &Vector2<f64>) -> f64 {
        (self.position[0] - query.x).powi(2) + (self.position[1] - query.y).powi(2)
    }
}

impl KdPoint for IndexedPosition {
    type Scalar = f64;
    type Dim = typenum::U2;
    fn at(&self, k: usize) -> f64 {
        self.position[k]
    }
}

/// Smallest radius of the expanding neighbour search, used when all hits of the seed query coincide with the
/// query position
const MIN_SEARCH_RADIUS: f64 = 1e-6;

/// Planimetric spatial index over a sequence of 2D positions.
///
/// All queries are deterministic: among equidistant results, the position with the lower index comes first
pub struct SpatialIndex {
    tree: KdTree<IndexedPosition>,
    len: usize,
}

impl SpatialIndex {
    /// Builds the index. The index of each position is its position in `positions`
    pub fn new<I: IntoIterator<Item = Vector2<f64>>>(positions: I) -> Self {
        let items = positions
            .into_iter()
            .enumerate()
            .map(|(index, position)| IndexedPosition {
                position: [position.x, position.y],
                index,
            })
            .collect::<Vec<_>>();
        let len = items.len();
        Self {
            tree: KdTree::build_by_ordered_float(items),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the position closest to `query`, or `None` if the index is empty
    pub fn nearest(&self, query: &Vector2<f64>) -> Option<usize> {
        self.k_nearest(query, 1).first().map(|(index, _)| *index)
    }

    /// The `k` positions closest to `query` as `(index, distance)` pairs, sorted by distance and then by index.
    /// If `query` is itself one of the indexed positions, it is part of the result
    pub fn k_nearest(&self, query: &Vector2<f64>, k: usize) -> Vec<(usize, f64)> {
        if k == 0 || self.is_empty() {
            return vec![];
        }
        let k = k.min(self.len);
        if !query.x.is_finite() || !query.y.is_finite() {
            return self.all_sorted(query, k);
        }
        // `nearests` can return fewer than `k` items among equidistant positions, so its farthest hit only
        // seeds the search radius
        let mut radius = self
            .tree
            .nearests(&[query.x, query.y], k)
            .iter()
            .map(|neighbour| neighbour.squared_distance)
            .fold(0.0, f64::max)
            .sqrt()
            .max(MIN_SEARCH_RADIUS);
        loop {
            if !radius.is_finite() {
                return self.all_sorted(query, k);
            }
            let mut found = self.within_sorted(query, radius);
            // At least k hits within the radius means every position at the k-th distance is among them
            if found.len() >= k {
                found.truncate(k);
                return found
                    .into_iter()
                    .map(|(index, squared_distance)| (index, squared_distance.sqrt()))
                    .collect();
            }
            radius *= 2.0;
        }
    }

    /// Indices of all positions within `radius` (inclusive) of `query`, in ascending index order
    pub fn within_radius(&self, query: &Vector2<f64>, radius: f64) -> Vec<usize> {
        let valid_query = query.x.is_finite() && query.y.is_finite();
        if self.is_empty() || radius.is_nan() || radius < 0.0 || !valid_query {
            return vec![];
        }
        let mut indices = if radius.is_finite() {
            self.within_sorted(query, radius)
                .into_iter()
                .map(|(index, _)| index)
                .collect::<Vec<_>>()
        } else {
            self.tree.iter().map(|item| item.index).collect()
        };
        indices.sort_unstable();
        indices
    }

    /// `(index, squared distance)` of all positions within the inclusive `radius`, sorted by distance and then
    /// by index. The bounding square query of the kd-tree has inclusive bounds and does not prune on distance
    fn within_sorted(&self, query: &Vector2<f64>, radius: f64) -> Vec<(usize, f64)> {
        // The square is widened slightly so that rounding of its bounds cannot drop positions on the circle
        let reach = radius * (1.0 + 1e-9);
        let lower = [query.x - reach, query.y - reach];
        let upper = [query.x + reach, query.y + reach];
        let squared_radius = radius * radius;
        let mut found = self
            .tree
            .within(&[lower, upper])
            .into_iter()
            .map(|item| (item.index, item.squared_distance_to(query)))
            .filter(|(_, squared_distance)| *squared_distance <= squared_radius)
            .collect::<Vec<_>>();
        found.sort_by_key(|(index, squared_distance)| (FloatOrd(*squared_distance), *index));
        found
    }

    fn all_sorted(&self, query: &Vector2<f64>, k: usize) -> Vec<(usize, f64)> {
        let mut found = self
            .tree
            .iter()
            .map(|item| (item.index, item.squared_distance_to(query)))
            .collect::<Vec<_>>();
        found.sort_by_key(|(index, squared_distance)| (FloatOrd(*squared_distance), *index));
        found
            .into_iter()
            .take(k)
            .map(|(index, squared_distance)| (index, squared_distance.sqrt()))
            .collect()
    }
}
