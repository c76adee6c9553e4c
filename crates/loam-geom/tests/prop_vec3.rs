use loam_geom::{Aabb, Vec3};
use proptest::num::f32::NORMAL;
use proptest::prelude::*;
use proptest::strategy::Strategy;

fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}
fn vapprox(a: Vec3, b: Vec3, eps: f32) -> bool {
    approx(a.x, b.x, eps) && approx(a.y, b.y, eps) && approx(a.z, b.z, eps)
}

fn bounded_f32() -> impl Strategy<Value = f32> {
    NORMAL.prop_filter("bounded", |v| v.is_finite() && v.abs() <= 1e4)
}

fn arb_vec3() -> impl Strategy<Value = Vec3> {
    (bounded_f32(), bounded_f32(), bounded_f32()).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn cell() -> impl Strategy<Value = i32> {
    -100_000i32..=100_000
}

proptest! {
    // a + b == b + a
    #[test]
    fn add_commutes(a in arb_vec3(), b in arb_vec3()) {
        prop_assert!(vapprox(a + b, b + a, 1e-3));
    }

    // (a + b) - b == a within float tolerance
    #[test]
    fn sub_inverts_add(a in arb_vec3(), b in arb_vec3()) {
        prop_assert!(vapprox((a + b) - b, a, 1e-2));
    }

    // Any point inside a unit cell floors back to that cell
    #[test]
    fn floor_of_point_inside_cell(x in cell(), y in cell(), z in cell(), fx in 0.0f32..0.99, fz in 0.0f32..0.99) {
        let p = Vec3::from_cell(x, y, z) + Vec3::new(fx, 0.0, fz);
        prop_assert_eq!(p.floor_i32(), (x, y, z));
    }

    // normalized() has unit length for non-degenerate inputs
    #[test]
    fn normalized_is_unit(v in arb_vec3()) {
        prop_assume!(v.length() > 1e-3);
        prop_assert!(approx(v.normalized().length(), 1.0, 1e-4));
    }
}

#[test]
fn aabb_contains_is_half_open() {
    let b = Aabb::new(Vec3::ZERO, Vec3::new(16.0, 128.0, 16.0));
    assert!(b.contains(Vec3::ZERO));
    assert!(b.contains(Vec3::new(15.9, 127.9, 15.9)));
    assert!(!b.contains(Vec3::new(16.0, 0.0, 0.0)));
    assert!(!b.contains(Vec3::new(-0.1, 0.0, 0.0)));
    assert!(vapprox(b.size(), Vec3::new(16.0, 128.0, 16.0), 1e-6));
}
