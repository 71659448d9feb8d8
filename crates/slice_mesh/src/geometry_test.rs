use super::*;

#[test]
fn test_face_normal_xy_plane() {
  let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0));
  assert_eq!(tri.face_normal(), Vec3::Z);
}

#[test]
fn test_face_normal_follows_winding() {
  let tri = Triangle::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0), Vec3::X);
  assert_eq!(tri.face_normal(), -Vec3::Z);
}

#[test]
fn test_face_normal_is_unit_length() {
  let tri = Triangle::new(
    Vec3::new(0.5, 0.0, 0.0),
    Vec3::new(0.0, 0.0, 0.5),
    Vec3::new(0.0, 0.5, 0.0),
  );
  assert!((tri.face_normal().length() - 1.0).abs() < 1e-6);
}

#[test]
fn test_degenerate_triangle_has_zero_normal() {
  let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
  let normal = tri.face_normal();
  assert_eq!(normal, Vec3::ZERO);
  assert!(normal.is_finite());
}

#[test]
fn test_normalize_or_zero() {
  assert_eq!(normalize_or_zero(Vec3::new(0.0, 3.0, 4.0)), Vec3::new(0.0, 0.6, 0.8));
  assert_eq!(normalize_or_zero(Vec3::ZERO), Vec3::ZERO);
}
