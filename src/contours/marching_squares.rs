//! # Marching squares
//!
//! Level-set extraction on a regular grid. Coordinates are fractional grid
//! indices `(i, j)` along axes 0 and 1; callers map them to physical units.
//!
use ndarray::Array2;

/// Index distance under which two segment ends are joined.
const JOIN_EPSILON: f64 = 1e-9;

/// A point in fractional grid-index coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
  pub i: f64,
  pub j: f64,
}

impl GridPoint {
  pub fn new(i: f64, j: f64) -> Self {
    Self { i, j }
  }

  fn distance(&self, other: &GridPoint) -> f64 {
    ((self.i - other.i).powi(2) + (self.j - other.j).powi(2)).sqrt()
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
  pub start: GridPoint,
  pub end: GridPoint,
}

/// Connected piece of a level set.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
  pub points: Vec<GridPoint>,
  pub closed: bool,
}

impl Polyline {
  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }
}

/// Level-set segments of `grid` at `level`, one or two per crossed cell.
///
/// A corner is inside when its value is `>= level`. Cells with a NaN corner
/// are skipped.
pub fn march_squares(grid: &Array2<f64>, level: f64) -> Vec<Segment> {
  let (rows, cols) = grid.dim();
  if rows < 2 || cols < 2 {
    return Vec::new();
  }

  let mut segments = Vec::new();
  for i in 0..rows - 1 {
    for j in 0..cols - 1 {
      let tl = grid[[i, j]];
      let tr = grid[[i, j + 1]];
      let br = grid[[i + 1, j + 1]];
      let bl = grid[[i + 1, j]];

      if tl.is_nan() || tr.is_nan() || br.is_nan() || bl.is_nan() {
        continue;
      }

      let mut case = 0u8;
      if tl >= level {
        case |= 1;
      }
      if tr >= level {
        case |= 2;
      }
      if br >= level {
        case |= 4;
      }
      if bl >= level {
        case |= 8;
      }

      cell_segments(case, i as f64, j as f64, [tl, tr, br, bl], level, &mut segments);
    }
  }

  segments
}

fn cell_segments(case: u8, i: f64, j: f64, corners: [f64; 4], level: f64, out: &mut Vec<Segment>) {
  let [tl, tr, br, bl] = corners;
  let top = || interpolate_edge(GridPoint::new(i, j), GridPoint::new(i, j + 1.0), tl, tr, level);
  let right = || {
    interpolate_edge(
      GridPoint::new(i, j + 1.0),
      GridPoint::new(i + 1.0, j + 1.0),
      tr,
      br,
      level,
    )
  };
  let bottom = || {
    interpolate_edge(
      GridPoint::new(i + 1.0, j),
      GridPoint::new(i + 1.0, j + 1.0),
      bl,
      br,
      level,
    )
  };
  let left = || interpolate_edge(GridPoint::new(i, j), GridPoint::new(i + 1.0, j), tl, bl, level);
  let mut push = |start: GridPoint, end: GridPoint| out.push(Segment { start, end });

  match case {
    1 | 14 => push(left(), top()),
    2 | 13 => push(top(), right()),
    3 | 12 => push(left(), right()),
    4 | 11 => push(right(), bottom()),
    // Saddles
    5 => {
      push(left(), top());
      push(right(), bottom());
    }
    10 => {
      push(top(), right());
      push(left(), bottom());
    }
    6 | 9 => push(top(), bottom()),
    7 | 8 => push(left(), bottom()),
    _ => {}
  }
}

/// Point on the edge `a -> b` where the linear interpolant of the corner
/// values crosses `level`.
pub fn interpolate_edge(a: GridPoint, b: GridPoint, va: f64, vb: f64, level: f64) -> GridPoint {
  if va == vb {
    return GridPoint::new((a.i + b.i) / 2.0, (a.j + b.j) / 2.0);
  }
  let t = ((level - va) / (vb - va)).clamp(0.0, 1.0);
  GridPoint::new(a.i + t * (b.i - a.i), a.j + t * (b.j - a.j))
}

/// Joins unordered segments into polylines, growing each piece at both
/// ends. Neighbouring cells compute shared edge points identically, so the
/// join tolerance only absorbs rounding.
pub fn connect_segments(segments: &[Segment]) -> Vec<Polyline> {
  let mut used = vec![false; segments.len()];
  let mut polylines = Vec::new();

  for start in 0..segments.len() {
    if used[start] {
      continue;
    }
    used[start] = true;
    let mut points = vec![segments[start].start, segments[start].end];

    // Grow the tail, then reverse once and grow what was the head.
    for _ in 0..2 {
      while let Some(next) = extend(segments, &mut used, points[points.len() - 1]) {
        points.push(next);
      }
      points.reverse();
    }

    let closed = points.len() > 2 && points[0].distance(&points[points.len() - 1]) < JOIN_EPSILON;
    polylines.push(Polyline { points, closed });
  }

  polylines
}

fn extend(segments: &[Segment], used: &mut [bool], end: GridPoint) -> Option<GridPoint> {
  for (k, segment) in segments.iter().enumerate() {
    if used[k] {
      continue;
    }
    if segment.start.distance(&end) < JOIN_EPSILON {
      used[k] = true;
      return Some(segment.end);
    }
    if segment.end.distance(&end) < JOIN_EPSILON {
      used[k] = true;
      return Some(segment.start);
    }
  }
  None
}

/// Connected level-set pieces of `grid` at `level`.
pub fn level_set(grid: &Array2<f64>, level: f64) -> Vec<Polyline> {
  connect_segments(&march_squares(grid, level))
}
