// src/lattice.rs
//
// Discrete velocity sets shared (read-only) by every refinement level.
//
// D2Q9 numbering:
//
//   6   2   5
//    \  |  /
//   3 - 0 - 1
//    /  |  \
//   7   4   8
//
// D3Q19 numbering: 0 rest, 1-6 faces (+x, -x, +y, -y, +z, -z), 7-18 edges
// listed in opposite pairs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatticeKind {
    D1Q3,
    D2Q9,
    D3Q19,
}

impl LatticeKind {
    pub fn dims(self) -> usize {
        match self {
            Self::D1Q3 => 1,
            Self::D2Q9 => 2,
            Self::D3Q19 => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::D1Q3 => "d1q3",
            Self::D2Q9 => "d2q9",
            Self::D3Q19 => "d3q19",
        }
    }
}

const D1Q3_C: [[i32; 3]; 3] = [[0, 0, 0], [1, 0, 0], [-1, 0, 0]];
const D1Q3_W: [f64; 3] = [2.0 / 3.0, 1.0 / 6.0, 1.0 / 6.0];

const D2Q9_C: [[i32; 3]; 9] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [-1, 0, 0],
    [0, -1, 0],
    [1, 1, 0],
    [-1, 1, 0],
    [-1, -1, 0],
    [1, -1, 0],
];
const D2Q9_W: [f64; 9] = [
    4.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
];

const D3Q19_C: [[i32; 3]; 19] = [
    [0, 0, 0],
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
    [1, 1, 0],
    [-1, -1, 0],
    [1, -1, 0],
    [-1, 1, 0],
    [1, 0, 1],
    [-1, 0, -1],
    [1, 0, -1],
    [-1, 0, 1],
    [0, 1, 1],
    [0, -1, -1],
    [0, 1, -1],
    [0, -1, 1],
];
const D3Q19_W: [f64; 19] = [
    1.0 / 3.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
];

/// Discrete velocities `c`, weights `w`, sound speed and the opposite-direction map.
#[derive(Debug, Clone)]
pub struct VelocitySet {
    pub kind: LatticeKind,
    pub dims: usize,
    /// Lattice vectors; components beyond `dims` are zero.
    pub c: Vec<[i32; 3]>,
    pub w: Vec<f64>,
    /// `opposite[v]` is the direction with `c[opposite[v]] == -c[v]`.
    pub opposite: Vec<usize>,
    /// Lattice sound speed squared, cs² = 1/3.
    pub cs2: f64,
}

impl VelocitySet {
    pub fn new(kind: LatticeKind) -> Self {
        let (c, w): (Vec<[i32; 3]>, Vec<f64>) = match kind {
            LatticeKind::D1Q3 => (D1Q3_C.to_vec(), D1Q3_W.to_vec()),
            LatticeKind::D2Q9 => (D2Q9_C.to_vec(), D2Q9_W.to_vec()),
            LatticeKind::D3Q19 => (D3Q19_C.to_vec(), D3Q19_W.to_vec()),
        };

        let opposite = c
            .iter()
            .map(|cv| {
                let neg = [-cv[0], -cv[1], -cv[2]];
                c.iter()
                    .position(|other| *other == neg)
                    .expect("velocity set must be closed under negation")
            })
            .collect();

        Self {
            kind,
            dims: kind.dims(),
            c,
            w,
            opposite,
            cs2: 1.0 / 3.0,
        }
    }

    /// Number of discrete directions.
    #[inline]
    pub fn nvel(&self) -> usize {
        self.w.len()
    }

    /// `c_v · u` over the active dimensions.
    #[inline]
    pub fn c_dot(&self, v: usize, u: &[f64]) -> f64 {
        let cv = self.c[v];
        let mut s = 0.0;
        for (d, ud) in u.iter().enumerate().take(self.dims) {
            s += cv[d] as f64 * ud;
        }
        s
    }

    /// Number of independent u_a·u_b products tracked by the time-averages.
    #[inline]
    pub fn n_pairs(&self) -> usize {
        self.dims * (self.dims + 1) / 2
    }
}
