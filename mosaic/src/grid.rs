use std::collections::HashMap;
use std::hash::Hash;

use crate::geometry::bbox::Bbox;

// Items spanning more cells than this go to a flat list scanned on every query.
const MAX_ITEM_CELLS: i64 = 1024;

/// Uniform-grid bounding box index.
#[derive(Clone, Debug)]
pub struct GridIndex<K> {
    cell: f64,
    cells: HashMap<(i32, i32), Vec<K>>,
    per_item_cells: HashMap<K, Vec<(i32, i32)>>,
    bboxes: HashMap<K, Bbox>,
    oversize: Vec<K>,
}

impl<K: Copy + Eq + Hash + Ord> GridIndex<K> {
    pub fn new(cell: f64) -> Self {
        GridIndex {
            cell: if cell.is_finite() && cell > 0.0 { cell } else { 1.0 },
            cells: HashMap::new(),
            per_item_cells: HashMap::new(),
            bboxes: HashMap::new(),
            oversize: Vec::new(),
        }
    }

    #[inline]
    fn cell_ix(&self, x: f64) -> i32 {
        (x / self.cell).floor().clamp(i32::MIN as f64, i32::MAX as f64) as i32
    }

    fn cell_range(&self, b: &Bbox) -> (i32, i32, i32, i32) {
        (self.cell_ix(b.min_x), self.cell_ix(b.min_y), self.cell_ix(b.max_x), self.cell_ix(b.max_y))
    }

    pub fn insert(&mut self, id: K, bbox: Bbox) {
        self.remove(id);
        self.bboxes.insert(id, bbox);
        let (ix0, iy0, ix1, iy1) = self.cell_range(&bbox);
        let span = (ix1 as i64 - ix0 as i64 + 1) * (iy1 as i64 - iy0 as i64 + 1);
        if span > MAX_ITEM_CELLS {
            self.oversize.push(id);
            return;
        }
        let mut cells = Vec::with_capacity(span as usize);
        for ix in ix0..=ix1 {
            for iy in iy0..=iy1 {
                self.cells.entry((ix, iy)).or_default().push(id);
                cells.push((ix, iy));
            }
        }
        self.per_item_cells.insert(id, cells);
    }

    pub fn remove(&mut self, id: K) {
        if self.bboxes.remove(&id).is_none() {
            return;
        }
        if let Some(prev) = self.per_item_cells.remove(&id) {
            for c in prev {
                if let Some(list) = self.cells.get_mut(&c) {
                    list.retain(|&x| x != id);
                    if list.is_empty() {
                        self.cells.remove(&c);
                    }
                }
            }
        }
        self.oversize.retain(|&x| x != id);
    }

    /// Ids whose box intersects `bbox`, sorted ascending.
    pub fn query(&self, bbox: &Bbox) -> Vec<K> {
        let mut out: Vec<K> = Vec::new();
        let (ix0, iy0, ix1, iy1) = self.cell_range(bbox);
        let span = (ix1 as i64 - ix0 as i64 + 1) * (iy1 as i64 - iy0 as i64 + 1);
        if span as usize > self.cells.len() {
            // Query larger than the populated grid: walk the items instead of the cells.
            out.extend(self.per_item_cells.keys().copied());
        } else {
            for ix in ix0..=ix1 {
                for iy in iy0..=iy1 {
                    if let Some(list) = self.cells.get(&(ix, iy)) {
                        out.extend(list.iter().copied());
                    }
                }
            }
        }
        out.extend(self.oversize.iter().copied());
        out.sort_unstable();
        out.dedup();
        out.retain(|id| self.bboxes.get(id).map_or(false, |b| b.intersects(bbox)));
        out
    }

    pub fn len(&self) -> usize { self.bboxes.len() }
    pub fn is_empty(&self) -> bool { self.bboxes.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_filters_by_box() {
        let mut idx: GridIndex<u32> = GridIndex::new(10.0);
        idx.insert(1, Bbox::new(0.0, 0.0, 5.0, 5.0));
        idx.insert(2, Bbox::new(50.0, 50.0, 55.0, 55.0));
        idx.insert(3, Bbox::new(-1e6, -1e6, 1e6, 1e6));
        assert_eq!(idx.query(&Bbox::new(1.0, 1.0, 2.0, 2.0)), vec![1, 3]);
        assert_eq!(idx.query(&Bbox::new(-100.0, -100.0, 100.0, 100.0)), vec![1, 2, 3]);
        idx.remove(3);
        assert_eq!(idx.query(&Bbox::new(20.0, 20.0, 30.0, 30.0)), Vec::<u32>::new());
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn reinsert_moves_item() {
        let mut idx: GridIndex<u32> = GridIndex::new(1.0);
        idx.insert(7, Bbox::new(0.0, 0.0, 0.5, 0.5));
        idx.insert(7, Bbox::new(9.0, 9.0, 9.5, 9.5));
        assert!(idx.query(&Bbox::new(0.0, 0.0, 0.5, 0.5)).is_empty());
        assert_eq!(idx.query(&Bbox::new(9.1, 9.1, 9.2, 9.2)), vec![7]);
    }
}
