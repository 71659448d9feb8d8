use std::fs;

use super::*;
use crate::pipeline::test_utils::ScratchDir;

const MANIFEST: &str = r#"
[[patient]]
name = "anon"

[[patient.study]]
id = "S1"

[[patient.study.series]]
id = "A"
pixel_spacing = [0.5, 0.75]

[[patient.study.series.slice]]
file = "a/0.png"
position = [0.0, 0.0, 4.0]

[[patient.study.series.slice]]
file = "a/1.png"

[[patient.study.series]]
id = "B"

[[patient.study.series.slice]]
file = "b/0.png"

[[patient.study]]
id = "S2"

[[patient.study.series]]
id = "A"

[[patient.study.series.slice]]
file = "c/0.png"
"#;

fn manifest() -> IndexManifest {
  IndexManifest::parse(MANIFEST, Path::new("index.toml")).unwrap()
}

#[test]
fn test_all_series_without_selection() {
  let entries = manifest()
    .entries(Path::new("/data/index.toml"), &Selection::default())
    .unwrap();

  let files: Vec<_> = entries.iter().map(|e| e.file.clone()).collect();
  assert_eq!(
    files,
    [
      PathBuf::from("/data/a/0.png"),
      PathBuf::from("/data/a/1.png"),
      PathBuf::from("/data/b/0.png"),
      PathBuf::from("/data/c/0.png"),
    ]
  );
}

#[test]
fn test_selection_narrows_to_one_series() {
  let selection = Selection::new(Some("S1".into()), Some("A".into()));
  let entries = manifest().entries(Path::new("/data/index.toml"), &selection).unwrap();

  assert_eq!(entries.len(), 2);
  assert_eq!(entries[0].position, Some(Vec3::new(0.0, 0.0, 4.0)));
  assert_eq!(entries[0].pixel_spacing, Some((0.5, 0.75)));
  assert_eq!(entries[1].position, None);
}

#[test]
fn test_series_only_selection_spans_studies() {
  let selection = Selection::new(None, Some("A".into()));
  let entries = manifest().entries(Path::new("/data/index.toml"), &selection).unwrap();
  assert_eq!(entries.len(), 3);
}

#[test]
fn test_unknown_selection_is_an_error() {
  let selection = Selection::new(Some("S9".into()), None);
  let err = manifest()
    .entries(Path::new("/data/index.toml"), &selection)
    .unwrap_err();
  assert!(matches!(err, SourceError::UnknownSelection { .. }));
}

#[test]
fn test_list_series() {
  let dir = ScratchDir::new("index_list");
  let path = dir.path().join("index.toml");
  fs::write(&path, MANIFEST).unwrap();

  let series = list_series(&path).unwrap();
  assert_eq!(series.len(), 3);
  assert_eq!(
    series[0],
    SeriesInfo {
      patient: "anon".into(),
      study: "S1".into(),
      series: "A".into(),
      slices: 2,
    }
  );
  assert_eq!(series[2].study, "S2");
}

#[test]
fn test_malformed_manifest() {
  let err = IndexManifest::parse("[[patient]]\nstudy = 3", Path::new("bad.toml")).unwrap_err();
  assert!(matches!(err, SourceError::IndexParse { .. }));
}

#[test]
fn test_missing_manifest() {
  let dir = ScratchDir::new("index_missing");
  let err = IndexManifest::load(&dir.path().join("none.toml")).unwrap_err();
  assert!(matches!(err, SourceError::IndexRead { .. }));
}
