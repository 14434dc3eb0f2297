//! Integration tests for polygon set algebra.

use geo::polygon;
use mosaic::{difference, explode, intersection, union, Geometry};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry {
    Geometry::polygon(polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)])
}

fn has_vertex(g: &Geometry, x: f64, y: f64) -> bool {
    g.vertices().iter().any(|c| (c.x - x).abs() < 1e-6 && (c.y - y).abs() < 1e-6)
}

#[test]
fn test_notch_cut_vertices() {
    let f = rect(0.0, 0.0, 10.0, 10.0);
    let c = rect(8.0, 4.0, 12.0, 6.0);

    let rem = difference(&f, &c).unwrap();
    for (x, y) in [(0.0, 0.0), (10.0, 0.0), (10.0, 4.0), (8.0, 4.0), (8.0, 6.0), (10.0, 6.0), (10.0, 10.0), (0.0, 10.0)] {
        assert!(has_vertex(&rem, x, y), "remainder lacks ({}, {})", x, y);
    }
    let removed = intersection(&f, &c).unwrap();
    for (x, y) in [(8.0, 4.0), (10.0, 4.0), (10.0, 6.0), (8.0, 6.0)] {
        assert!(has_vertex(&removed, x, y), "removed part lacks ({}, {})", x, y);
    }
    assert!((removed.area() - 4.0).abs() < 1e-6);
}

#[test]
fn test_hole_punch() {
    let f = rect(0.0, 0.0, 10.0, 10.0);
    let c = rect(4.0, 4.0, 6.0, 6.0);
    let rem = difference(&f, &c).unwrap();
    let parts = explode(&rem);
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].as_polygon().unwrap().0[0].interiors().len(), 1);
    assert!(rem.is_valid());
    assert!((rem.area() - 96.0).abs() < 1e-6);
}

#[test]
fn test_disjoint_operands() {
    let a = rect(0.0, 0.0, 1.0, 1.0);
    let b = rect(5.0, 5.0, 6.0, 6.0);
    assert!(intersection(&a, &b).unwrap().is_empty());
    assert!((difference(&a, &b).unwrap().area() - 1.0).abs() < 1e-9);
    assert_eq!(explode(&union(&a, &b).unwrap()).len(), 2);
}

#[test]
fn test_union_is_valid_after_touching_corner() {
    let a = rect(0.0, 0.0, 1.0, 1.0);
    let b = rect(1.0, 1.0, 2.0, 2.0);
    let u = union(&a, &b).unwrap();
    assert!((u.area() - 2.0).abs() < 1e-9);
    assert!(has_vertex(&u, 1.0, 1.0));
}
