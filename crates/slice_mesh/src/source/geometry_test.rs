use std::path::Path;

use super::*;
use crate::decode::SliceMetadata;
use crate::error::DecodeError;

/// Every file is 4x3 except names starting with "bad".
struct FixedMetadata {
  position_from_name: bool,
}

impl MetadataReader for FixedMetadata {
  fn read_metadata(&self, file: &Path) -> Result<SliceMetadata, DecodeError> {
    let name = file.file_stem().unwrap().to_str().unwrap();
    if name.starts_with("bad") {
      return Err(DecodeError::Unreadable {
        path: file.to_path_buf(),
        message: "corrupt".into(),
      });
    }
    let position = self
      .position_from_name
      .then(|| Vec3::new(0.0, 0.0, name.parse::<f32>().unwrap()));
    Ok(SliceMetadata {
      dx: 4,
      dy: 3,
      pixel_spacing: Some((0.5, 0.25)),
      position,
    })
  }
}

fn at(name: &str, p: Vec3) -> SliceDescriptor {
  SliceDescriptor::new(name, p)
}

fn names(slices: &[SliceDescriptor]) -> Vec<String> {
  slices
    .iter()
    .map(|s| s.file.to_string_lossy().into_owned())
    .collect()
}

#[test]
fn test_dominant_axis_z() {
  let mut slices = vec![
    at("c", Vec3::new(0.0, 0.0, 4.0)),
    at("a", Vec3::new(0.0, 0.0, 0.0)),
    at("b", Vec3::new(0.0, 0.0, 2.0)),
  ];
  // Reordered so the first two entries span the z axis.
  slices.swap(0, 1);

  let spacing = order_slices(&mut slices);

  assert_eq!(names(&slices), ["a", "b", "c"]);
  assert_eq!(spacing, 2.0);
}

#[test]
fn test_evenly_spaced_z_positions() {
  let mut slices = vec![
    at("0", Vec3::new(0.0, 0.0, 0.0)),
    at("1", Vec3::new(0.0, 0.0, 2.0)),
    at("2", Vec3::new(0.0, 0.0, 4.0)),
  ];
  assert_eq!(order_slices(&mut slices), 2.0);
  assert_eq!(names(&slices), ["0", "1", "2"]);
}

#[test]
fn test_dominant_axis_x_descending_input() {
  let mut slices = vec![
    at("far", Vec3::new(9.0, 0.1, 0.0)),
    at("mid", Vec3::new(6.0, 0.2, 0.0)),
    at("near", Vec3::new(3.0, 0.3, 0.0)),
  ];

  let spacing = order_slices(&mut slices);

  assert_eq!(names(&slices), ["near", "mid", "far"]);
  assert_eq!(spacing, 3.0);
}

#[test]
fn test_dominant_axis_y() {
  let mut slices = vec![
    at("b", Vec3::new(0.0, 1.5, 7.0)),
    at("a", Vec3::new(0.0, -1.5, 7.0)),
  ];
  assert_eq!(order_slices(&mut slices), 3.0);
  assert_eq!(names(&slices), ["a", "b"]);
}

#[test]
fn test_degenerate_spacing_defaults_to_one() {
  let mut single = vec![at("a", Vec3::ZERO)];
  assert_eq!(order_slices(&mut single), 1.0);

  let mut coincident = vec![at("a", Vec3::ONE), at("b", Vec3::ONE)];
  assert_eq!(order_slices(&mut coincident), 1.0);

  assert_eq!(order_slices(&mut []), 1.0);
}

#[test]
fn test_resolve_skips_unreadable_and_defaults_positions() {
  let entries = vec![
    SourceEntry::file("x.png"),
    SourceEntry::file("bad.png"),
    SourceEntry::file("y.png"),
    SourceEntry::file("z.png"),
  ];

  let volume = resolve_volume(
    &entries,
    &FixedMetadata {
      position_from_name: false,
    },
  )
  .unwrap();

  assert_eq!((volume.dx, volume.dy), (4, 3));
  assert_eq!(volume.spacing, Vec3::new(0.5, 0.25, 1.0));
  assert_eq!(names(&volume.slices), ["x.png", "y.png", "z.png"]);
  assert_eq!(volume.slices[2].position, Vec3::new(0.0, 0.0, 2.0));
  assert_eq!(volume.layer_count(), 2);
  assert_eq!(volume.layout().cell_count(), 6);
}

#[test]
fn test_resolve_orders_by_file_positions() {
  let entries = vec![
    SourceEntry::file("6.png"),
    SourceEntry::file("0.png"),
    SourceEntry::file("3.png"),
  ];

  let volume = resolve_volume(
    &entries,
    &FixedMetadata {
      position_from_name: true,
    },
  )
  .unwrap();

  assert_eq!(names(&volume.slices), ["0.png", "3.png", "6.png"]);
  assert_eq!(volume.spacing.z, 3.0);
}

#[test]
fn test_entry_position_used_when_file_has_none() {
  let mut entry = SourceEntry::file("a.png");
  entry.position = Some(Vec3::new(0.0, 0.0, 10.0));
  let entries = vec![entry, SourceEntry::file("b.png")];

  let volume = resolve_volume(
    &entries,
    &FixedMetadata {
      position_from_name: false,
    },
  )
  .unwrap();

  // b defaults to (0, 0, 1), so it sorts first.
  assert_eq!(names(&volume.slices), ["b.png", "a.png"]);
  assert_eq!(volume.spacing.z, 9.0);
}

#[test]
fn test_resolve_with_nothing_readable() {
  let entries = vec![SourceEntry::file("bad1.png"), SourceEntry::file("bad2.png")];
  let err = resolve_volume(
    &entries,
    &FixedMetadata {
      position_from_name: false,
    },
  )
  .unwrap_err();
  assert!(matches!(err, SourceError::NoDecodableSlice(2)));
}
