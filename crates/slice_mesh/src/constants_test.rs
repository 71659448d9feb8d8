use super::*;

#[test]
fn test_record_len_matches_layout() {
  // normal + 3 vertices, 3 floats each, plus the attribute word
  assert_eq!(STL_RECORD_LEN, 4 * 3 * 4 + 2);
}

#[test]
fn test_count_follows_header() {
  assert_eq!(STL_COUNT_OFFSET as usize, STL_HEADER_LEN);
}

#[test]
fn test_cube_shape() {
  assert_eq!(CELL_CORNERS, 8);
  assert_eq!(CELL_EDGES, 12);
}
