//! Normal-mode classification of picker points.

use glam::DVec2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalMode {
    /// In-phase motion, `x2 = x1`.
    Symmetric,
    /// Out-of-phase motion, `x2 = -x1`.
    Antisymmetric,
}

impl NormalMode {
    /// 1 for the symmetric mode, 2 for the antisymmetric mode.
    pub fn number(self) -> u8 {
        match self {
            NormalMode::Symmetric => 1,
            NormalMode::Antisymmetric => 2,
        }
    }
}

/// True when `uv` lies within `tol` of the `v = u` diagonal. The picker
/// center is the resting configuration, not a mode, and never matches.
#[inline]
pub fn is_symmetric_mode(uv: DVec2, tol: f64) -> bool {
    (uv.y - uv.x).abs() <= tol && !is_center(uv)
}

/// True when `uv` lies within `tol` of the anti-diagonal through the picker
/// center. The center itself lies on both diagonals and is excluded here.
#[inline]
pub fn is_antisymmetric_mode(uv: DVec2, tol: f64) -> bool {
    let c = uv - DVec2::splat(0.5);
    (c.y + c.x).abs() <= tol && c.x != c.y
}

/// Result of testing one point against both mode manifolds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModeMatches {
    pub symmetric: bool,
    pub antisymmetric: bool,
}

impl ModeMatches {
    pub fn any(&self) -> bool {
        self.symmetric || self.antisymmetric
    }

    pub fn modes(&self) -> impl Iterator<Item = NormalMode> {
        let sym = self.symmetric.then_some(NormalMode::Symmetric);
        let anti = self.antisymmetric.then_some(NormalMode::Antisymmetric);
        sym.into_iter().chain(anti)
    }
}

/// Evaluate both predicates independently.
pub fn classify(uv: DVec2, tol: f64) -> ModeMatches {
    ModeMatches {
        symmetric: is_symmetric_mode(uv, tol),
        antisymmetric: is_antisymmetric_mode(uv, tol),
    }
}

#[inline]
fn is_center(uv: DVec2) -> bool {
    uv == DVec2::splat(0.5)
}
