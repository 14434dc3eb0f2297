//! Faces of a planar line arrangement.
//!
//! Lines are noded, dangling edges are pruned, and every half-edge is walked
//! keeping the face on its left. Counter-clockwise cycles are bounded faces;
//! clockwise cycles are the outer boundaries of connected components and become
//! holes of the smallest face that strictly contains them.

use geo::{Coord, LineString, Polygon};

use crate::algorithms::planarize::{planarize_lines, Planarized};
use crate::algorithms::winding::{point_in_ring, point_on_ring_edge};
use crate::geometry::tolerance::{EPS_ANG, EPS_FACE_AREA, EPS_POS};
use crate::model::Geometry;

fn signed_area(ring: &[Coord<f64>]) -> f64 {
    let mut a = 0.0;
    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        a += ring[i].x * ring[j].y - ring[j].x * ring[i].y;
    }
    0.5 * a
}

/// Drop edges with an endpoint of degree one until none are left.
fn prune_dangles(plan: &Planarized) -> Vec<(usize, usize)> {
    let mut alive = vec![true; plan.edges.len()];
    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); plan.verts.len()];
    for (e, &(u, v)) in plan.edges.iter().enumerate() {
        incident[u].push(e);
        incident[v].push(e);
    }
    let mut degree: Vec<usize> = incident.iter().map(|l| l.len()).collect();
    let mut stack: Vec<usize> = (0..plan.verts.len()).filter(|&v| degree[v] == 1).collect();
    while let Some(v) = stack.pop() {
        if degree[v] != 1 {
            continue;
        }
        let Some(&e) = incident[v].iter().find(|&&e| alive[e]) else { continue };
        alive[e] = false;
        let (a, b) = plan.edges[e];
        for w in [a, b] {
            degree[w] -= 1;
            if degree[w] == 1 {
                stack.push(w);
            }
        }
    }
    plan.edges.iter().zip(alive).filter(|(_, keep)| *keep).map(|(e, _)| *e).collect()
}

fn trace_cycles(verts: &[Coord<f64>], edges: &[(usize, usize)]) -> Vec<Vec<Coord<f64>>> {
    let mut half_from: Vec<usize> = Vec::with_capacity(edges.len() * 2);
    let mut half_to: Vec<usize> = Vec::with_capacity(edges.len() * 2);
    for &(u, v) in edges {
        half_from.push(u);
        half_to.push(v);
        half_from.push(v);
        half_to.push(u);
    }
    let angle = |u: usize, v: usize| (verts[v].y - verts[u].y).atan2(verts[v].x - verts[u].x);
    let m = half_from.len();
    let mut adj: Vec<Vec<(f64, usize)>> = vec![Vec::new(); verts.len()];
    for i in 0..m {
        adj[half_from[i]].push((angle(half_from[i], half_to[i]), i));
    }
    for lst in &mut adj {
        lst.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    }

    let mut used = vec![false; m];
    let mut cycles = Vec::new();
    for start in 0..m {
        if used[start] {
            continue;
        }
        let mut he = start;
        let mut cycle: Vec<Coord<f64>> = Vec::new();
        let mut closed = false;
        for _ in 0..=m {
            used[he] = true;
            let (u, v) = (half_from[he], half_to[he]);
            cycle.push(verts[u]);
            // Next edge clockwise from the reverse direction keeps the face on the left.
            let back = angle(v, u);
            let lst = &adj[v];
            let pos = lst.iter().position(|(a, _)| *a >= back - EPS_ANG).unwrap_or(lst.len());
            let k = if pos == 0 { lst.len() - 1 } else { pos - 1 };
            let next = lst[k].1;
            if next == start {
                closed = true;
                break;
            }
            if used[next] {
                break;
            }
            he = next;
        }
        if closed && cycle.len() >= 3 {
            cycles.push(cycle);
        }
    }
    cycles
}

/// Every bounded face of the arrangement formed by `lines`.
pub fn polygonize(lines: &[LineString<f64>]) -> Vec<Geometry> {
    let plan = planarize_lines(lines);
    let edges = prune_dangles(&plan);
    let cycles = trace_cycles(&plan.verts, &edges);

    let mut shells: Vec<(Vec<Coord<f64>>, f64, Vec<LineString<f64>>)> = Vec::new();
    let mut outers: Vec<Vec<Coord<f64>>> = Vec::new();
    for c in cycles {
        let a = signed_area(&c);
        if a > EPS_FACE_AREA {
            shells.push((c, a, Vec::new()));
        } else if a < -EPS_FACE_AREA {
            outers.push(c);
        }
    }

    for outer in outers {
        let host = shells
            .iter_mut()
            .filter(|(shell, _, _)| {
                outer
                    .iter()
                    .find(|p| !point_on_ring_edge(**p, shell, EPS_POS))
                    .map_or(false, |p| point_in_ring(*p, shell))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((_, _, holes)) = host {
            holes.push(LineString::from(outer));
        }
    }

    log::debug!("polygonize: {} vertices, {} edges, {} faces", plan.verts.len(), edges.len(), shells.len());
    shells
        .into_iter()
        .map(|(shell, _, holes)| Geometry::polygon(Polygon::new(LineString::from(shell), holes)))
        .collect()
}
