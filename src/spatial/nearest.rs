use geo::Point;
use rstar::primitives::GeomWithData;
use rstar::RTree;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// R*-tree over sensor positions in a metric CRS.
///
/// Built once by bulk load; each query is a logarithmic nearest-neighbour
/// lookup. When two sensors are equidistant the tree's traversal order decides,
/// which is stable for a fixed input order.
pub struct NearestSensorIndex {
    tree: RTree<IndexedPoint>,
}

impl NearestSensorIndex {
    pub fn build(points: &[Point<f64>]) -> Self {
        let entries: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .map(|(idx, p)| GeomWithData::new([p.x(), p.y()], idx))
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Index of the nearest sensor and its Euclidean distance
    pub fn nearest(&self, point: Point<f64>) -> Option<(usize, f64)> {
        let query = [point.x(), point.y()];
        self.tree.nearest_neighbor(&query).map(|entry| {
            let [x, y] = *entry.geom();
            (entry.data, (x - query[0]).hypot(y - query[1]))
        })
    }

    /// Nearest distance for every query point, in input order
    pub fn distances(&self, points: &[Point<f64>]) -> Option<Vec<f64>> {
        points
            .iter()
            .map(|p| self.nearest(*p).map(|(_, distance)| distance))
            .collect()
    }
}
