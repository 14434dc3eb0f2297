use geo::{polygon, Coord, LineString};
use mosaic::{
    buffer_point, difference, filter_degenerate, forward_arc, intersection, line_length, line_substring, repair,
    single_sided_buffer, union, Geometry, Side,
};
use proptest::prelude::*;

fn rect(x0: i16, y0: i16, w: u8, h: u8) -> Geometry {
    let (x0, y0) = (x0 as f64, y0 as f64);
    let (x1, y1) = (x0 + w as f64 + 1.0, y0 + h as f64 + 1.0);
    Geometry::polygon(polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)])
}

fn rect_strategy() -> impl Strategy<Value = Geometry> {
    (-50i16..50, -50i16..50, 0u8..40, 0u8..40).prop_map(|(x, y, w, h)| rect(x, y, w, h))
}

fn ring_strategy() -> impl Strategy<Value = LineString<f64>> {
    (1u8..30, 1u8..30).prop_map(|(w, h)| {
        let (w, h) = (w as f64, h as f64);
        LineString::from(vec![(0.0, 0.0), (w, 0.0), (w, h), (0.0, h), (0.0, 0.0)])
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

    #[test]
    fn intersection_and_difference_rebuild_source(f in rect_strategy(), c in rect_strategy()) {
        let i = intersection(&f, &c).unwrap();
        let d = difference(&f, &c).unwrap();
        prop_assert!((i.area() + d.area() - f.area()).abs() < 1e-6,
            "areas {} + {} != {}", i.area(), d.area(), f.area());
        let overlap = intersection(&i, &d).unwrap();
        prop_assert!(overlap.area() < 1e-6, "overlap {}", overlap.area());
        let rebuilt = union(&i, &d).unwrap();
        prop_assert!((rebuilt.area() - f.area()).abs() < 1e-6);
        prop_assert!(difference(&f, &rebuilt).unwrap().area() < 1e-6);
    }

    #[test]
    fn arcs_partition_the_ring(ring in ring_strategy(), a in 0.0f64..1.0, b in 0.0f64..1.0) {
        let total = line_length(&ring);
        let (a, b) = (a * total, b * total);
        let fwd = line_length(&forward_arc(&ring, a, b));
        let back = line_length(&forward_arc(&ring, b, a));
        if (a - b).abs() > 1e-9 {
            prop_assert!((fwd + back - total).abs() < 1e-6, "{} + {} != {}", fwd, back, total);
        }
        match line_substring(&ring, a, b) {
            Ok(s) => prop_assert!(line_length(&s) <= total / 2.0 + 1e-9),
            Err(_) => prop_assert!(fwd.min(back) <= 1e-8),
        }
    }

    #[test]
    fn repair_is_idempotent(x in -20i16..20, y in -20i16..20, w in 0u8..20, h in 0u8..20, flip in any::<bool>()) {
        let g = rect(x, y, w, h);
        let g = if flip {
            // Bow-tie by swapping two corners
            let v = g.vertices();
            Geometry::from_ring(&[v[0], v[2], v[1], v[3]])
        } else {
            g
        };
        if let Ok(once) = repair(&g) {
            let twice = repair(&once).unwrap();
            prop_assert_eq!(once, twice);
        }
    }

    #[test]
    fn zero_buffer_always_filtered(len in 1u8..50, left in any::<bool>()) {
        let line = LineString::from(vec![(0.0, 0.0), (len as f64, 0.0), (len as f64, 3.0)]);
        let side = if left { Side::Left } else { Side::Right };
        let b = single_sided_buffer(&line, 0.0, side, 20).unwrap();
        prop_assert!(filter_degenerate(vec![b], 0.1).is_empty());
    }
}

#[test]
fn disk_contains_its_center() {
    let d = buffer_point(Coord { x: 3.0, y: -2.0 }, 5.0, 20);
    let bb = d.bbox().unwrap();
    assert!((bb.width() - 10.0).abs() < 1e-9);
    assert!(d.is_valid());
}
