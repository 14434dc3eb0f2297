use std::collections::{BTreeSet, HashMap, HashSet};

use geo::{Coord, LineString};

use crate::geometry::intersect::{intersect_segments, SegIntersection};
use crate::geometry::math::lerp;
use crate::geometry::tolerance::{EPS_DENOM, EPS_POS, QUANT_SCALE};

/// Noded line arrangement: merged vertices and undirected edges `(u, v)`, `u < v`.
#[derive(Debug, Clone, Default)]
pub struct Planarized {
    pub verts: Vec<Coord<f64>>,
    pub edges: Vec<(usize, usize)>,
}

#[derive(Clone, Copy)]
struct Seg {
    a: Coord<f64>,
    b: Coord<f64>,
}

fn segment_grid_cell(segs: &[Seg]) -> f64 {
    let (mut minx, mut miny, mut maxx, mut maxy) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for s in segs {
        minx = minx.min(s.a.x.min(s.b.x));
        maxx = maxx.max(s.a.x.max(s.b.x));
        miny = miny.min(s.a.y.min(s.b.y));
        maxy = maxy.max(s.a.y.max(s.b.y));
    }
    let extent = (maxx - minx).max(maxy - miny);
    let cell = extent / (segs.len() as f64).sqrt().max(1.0);
    if cell.is_finite() && cell > EPS_POS { cell } else { 1.0 }
}

/// Split every segment of `lines` at every crossing, touch and overlap end,
/// then merge endpoints that quantize to the same key.
pub fn planarize_lines(lines: &[LineString<f64>]) -> Planarized {
    // 1) Collect segments
    let mut segs: Vec<Seg> = Vec::new();
    for l in lines {
        for w in l.0.windows(2) {
            let finite = [w[0], w[1]].iter().all(|c| c.x.is_finite() && c.y.is_finite());
            if finite && (w[0].x - w[1].x).hypot(w[0].y - w[1].y) > EPS_POS {
                segs.push(Seg { a: w[0], b: w[1] });
            }
        }
    }
    if segs.is_empty() {
        return Planarized::default();
    }

    // 2) Intersections with uniform grid acceleration
    let n = segs.len();
    let mut splits: Vec<Vec<f64>> = vec![vec![0.0, 1.0]; n];
    let ep = EPS_POS;
    let cell = segment_grid_cell(&segs);
    let cell_ix = |x: f64| -> i64 { (x / cell).floor() as i64 };
    let mut buckets: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, s) in segs.iter().enumerate() {
        let ix0 = cell_ix(s.a.x.min(s.b.x) - ep);
        let ix1 = cell_ix(s.a.x.max(s.b.x) + ep);
        let iy0 = cell_ix(s.a.y.min(s.b.y) - ep);
        let iy1 = cell_ix(s.a.y.max(s.b.y) + ep);
        for ix in ix0..=ix1 {
            for iy in iy0..=iy1 {
                buckets.entry((ix, iy)).or_default().push(i);
            }
        }
    }

    let mut tested: HashSet<(usize, usize)> = HashSet::new();
    let inner = |t: f64| t > ep && t < 1.0 - ep;
    for list in buckets.values() {
        for (k, &i) in list.iter().enumerate() {
            for &j in &list[k + 1..] {
                let key = if i < j { (i, j) } else { (j, i) };
                if !tested.insert(key) {
                    continue;
                }
                let (s, t) = (segs[i], segs[j]);
                if s.a.x.max(s.b.x) < t.a.x.min(t.b.x) - ep
                    || t.a.x.max(t.b.x) < s.a.x.min(s.b.x) - ep
                    || s.a.y.max(s.b.y) < t.a.y.min(t.b.y) - ep
                    || t.a.y.max(t.b.y) < s.a.y.min(s.b.y) - ep
                {
                    continue;
                }
                match intersect_segments(s.a, s.b, t.a, t.b, ep, EPS_DENOM) {
                    SegIntersection::None => {}
                    SegIntersection::Proper { t: ti, u, .. } | SegIntersection::Touch { t: ti, u, .. } => {
                        if inner(ti) { splits[i].push(ti); }
                        if inner(u) { splits[j].push(u); }
                    }
                    SegIntersection::CollinearOverlap { t0, t1, u0, u1 } => {
                        for ti in [t0, t1] { if inner(ti) { splits[i].push(ti); } }
                        for u in [u0, u1] { if inner(u) { splits[j].push(u); } }
                    }
                }
            }
        }
    }

    // 3) Quantization and vertex creation
    let mut key_to_vid: HashMap<(i64, i64), usize> = HashMap::new();
    let mut verts: Vec<Coord<f64>> = Vec::new();
    let mut accum: Vec<(f64, f64, u32)> = Vec::new();
    let mut get_vid = |c: Coord<f64>| -> usize {
        let key = ((c.x * QUANT_SCALE).round() as i64, (c.y * QUANT_SCALE).round() as i64);
        if let Some(&vid) = key_to_vid.get(&key) {
            let e = &mut accum[vid];
            e.0 += c.x;
            e.1 += c.y;
            e.2 += 1;
            return vid;
        }
        let vid = verts.len();
        key_to_vid.insert(key, vid);
        verts.push(c);
        accum.push((c.x, c.y, 1));
        vid
    };

    let mut edges: BTreeSet<(usize, usize)> = BTreeSet::new();
    for (idx, s) in segs.iter().enumerate() {
        let ts = &mut splits[idx];
        ts.sort_by(|a, b| a.total_cmp(b));
        ts.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
        for w in ts.windows(2) {
            let p0 = lerp(s.a, s.b, w[0]);
            let p1 = lerp(s.a, s.b, w[1]);
            let u = get_vid(p0);
            let v = get_vid(p1);
            if u != v {
                edges.insert((u.min(v), u.max(v)));
            }
        }
    }

    // Average vertex positions per quantization key
    for (vid, (sx, sy, cnt)) in accum.into_iter().enumerate() {
        verts[vid] = Coord { x: sx / cnt as f64, y: sy / cnt as f64 };
    }

    Planarized { verts, edges: edges.into_iter().collect() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn planarize_cross() {
        let p = planarize_lines(&[
            line_string![(x: 0.0, y: 0.0), (x: 2.0, y: 2.0)],
            line_string![(x: 0.0, y: 2.0), (x: 2.0, y: 0.0)],
        ]);
        assert_eq!(p.edges.len(), 4);
        assert_eq!(p.verts.len(), 5);
    }

    #[test]
    fn overlapping_lines_share_edges() {
        let p = planarize_lines(&[
            line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0)],
            line_string![(x: 2.0, y: 0.0), (x: 6.0, y: 0.0)],
        ]);
        // 0-2, 2-4, 4-6
        assert_eq!(p.edges.len(), 3);
        assert_eq!(p.verts.len(), 4);
    }

    #[test]
    fn grid_counts_match() {
        let v = 12usize;
        let h = 10usize;
        let mut lines = Vec::new();
        for i in 0..v {
            let x = 100.0 * (i as f64 + 1.0) / ((v + 1) as f64);
            lines.push(line_string![(x: x, y: 0.0), (x: x, y: 80.0)]);
        }
        for j in 0..h {
            let y = 80.0 * (j as f64 + 1.0) / ((h + 1) as f64);
            lines.push(line_string![(x: 0.0, y: y), (x: 100.0, y: y)]);
        }
        let p = planarize_lines(&lines);
        assert_eq!(p.verts.len(), v * h + 2 * v + 2 * h, "vertex count");
        assert_eq!(p.edges.len(), 2 * v * h + v + h, "edge count");
    }
}
