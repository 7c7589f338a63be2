//! Transforms between physical displacement space, the unit-square UV space
//! of the coordinate picker, and the picker's rect-local space.
//!
//! Physical `x` maps to UV `u` through `x_range`, physical `y` (the second
//! mass's displacement) maps to `v` through `y_range`. Rect-local space is
//! centered on the picker with +y up.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ConfigError, Result};

/// Closed interval `[min, max]` with `max > min`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_finite("range min", self.min)?;
        ensure_finite("range max", self.max)?;
        if self.max <= self.min {
            return Err(ConfigError::DegenerateRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl From<[f64; 2]> for AxisRange {
    fn from(r: [f64; 2]) -> Self {
        Self { min: r[0], max: r[1] }
    }
}

#[derive(Clone, Debug)]
pub struct CoordinateMapper {
    x_range: AxisRange,
    y_range: AxisRange,
    border_width: f64,
    uv_min: DVec2,
    uv_max: DVec2,
}

impl CoordinateMapper {
    pub fn new(x_range: AxisRange, y_range: AxisRange, border_width: f64) -> Result<Self> {
        x_range.validate()?;
        y_range.validate()?;
        let mut mapper = Self {
            x_range,
            y_range,
            border_width: 0.0,
            uv_min: DVec2::ZERO,
            uv_max: DVec2::ONE,
        };
        mapper.set_border_width(border_width)?;
        mapper.refresh_clamp();
        Ok(mapper)
    }

    /// Change the excluded margin. Takes effect at the next [`refresh_clamp`].
    ///
    /// [`refresh_clamp`]: CoordinateMapper::refresh_clamp
    pub fn set_border_width(&mut self, border_width: f64) -> Result<()> {
        let border_width = ensure_finite("border width", border_width)?;
        if border_width < 0.0 {
            return Err(ConfigError::NegativeBorder(border_width));
        }
        for r in [self.x_range, self.y_range] {
            if 2.0 * border_width > r.span() {
                return Err(ConfigError::BorderTooWide {
                    border: border_width,
                    min: r.min,
                    max: r.max,
                });
            }
        }
        self.border_width = border_width;
        Ok(())
    }

    /// Recompute the UV clamp rectangle from the border-inset physical
    /// extremes. Called once per drag start so the clamp stays fixed for a
    /// whole gesture.
    pub fn refresh_clamp(&mut self) {
        let b = self.border_width;
        self.uv_min = self.physical_to_uv(DVec2::new(self.x_range.min + b, self.y_range.min + b));
        self.uv_max = self.physical_to_uv(DVec2::new(self.x_range.max - b, self.y_range.max - b));
    }

    #[inline]
    pub fn physical_to_uv(&self, p: DVec2) -> DVec2 {
        DVec2::new(
            (p.x - self.x_range.min) / self.x_range.span(),
            (p.y - self.y_range.min) / self.y_range.span(),
        )
    }

    #[inline]
    pub fn uv_to_physical(&self, uv: DVec2) -> DVec2 {
        DVec2::new(
            uv.x * self.x_range.span() + self.x_range.min,
            uv.y * self.y_range.span() + self.y_range.min,
        )
    }

    /// Componentwise clamp into the current `[uv_min, uv_max]` rectangle.
    #[inline]
    pub fn clamp_uv(&self, uv: DVec2) -> DVec2 {
        uv.max(self.uv_min).min(self.uv_max)
    }

    pub fn clamp_bounds(&self) -> (DVec2, DVec2) {
        (self.uv_min, self.uv_max)
    }

    pub fn ranges(&self) -> (AxisRange, AxisRange) {
        (self.x_range, self.y_range)
    }

    pub fn border_width(&self) -> f64 {
        self.border_width
    }
}

#[inline]
pub fn uv_to_rect(uv: DVec2, rect_size: DVec2) -> DVec2 {
    (uv - DVec2::splat(0.5)) * rect_size
}

#[inline]
pub fn rect_to_uv(local: DVec2, rect_size: DVec2) -> DVec2 {
    local / rect_size + DVec2::splat(0.5)
}

/// Snap near-diagonal points onto `y = x` or `y = -x` through the picker
/// center. Points whose centered magnitudes differ by less than `tol` get
/// both magnitudes replaced by their mean, signs preserved.
pub fn snap_to_diagonal(uv: DVec2, tol: f64) -> DVec2 {
    let xy = 2.0 * uv - DVec2::ONE;
    let (ax, ay) = (xy.x.abs(), xy.y.abs());
    if (ax - ay).abs() >= tol || ax == ay {
        return uv;
    }
    let mean = 0.5 * (ax + ay);
    // Zero components stay on the axis side they came from.
    let sign = |v: f64| if v < 0.0 { -1.0 } else { 1.0 };
    let snapped = DVec2::new(sign(xy.x) * mean, sign(xy.y) * mean);
    0.5 * (snapped + DVec2::ONE)
}

/// Placement of the picker on its drawing surface (y-up coordinates).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PickerRect {
    pub center: [f64; 2],
    pub size: [f64; 2],
}

impl PickerRect {
    pub fn new(center: DVec2, size: DVec2) -> Self {
        Self {
            center: center.to_array(),
            size: size.to_array(),
        }
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::from(self.center)
    }

    #[inline]
    pub fn size(&self) -> DVec2 {
        DVec2::from(self.size)
    }

    /// Surface point to rect-local coordinates.
    #[inline]
    pub fn to_local(&self, point: DVec2) -> DVec2 {
        point - self.center()
    }

    pub fn contains(&self, point: DVec2) -> bool {
        let half = 0.5 * self.size();
        let local = self.to_local(point).abs();
        local.x <= half.x && local.y <= half.y
    }

    /// Surface point to UV, clamped to the unit square. A degenerate rect
    /// maps everything to the center.
    pub fn surface_to_uv(&self, point: DVec2) -> DVec2 {
        let size = self.size();
        if size.x <= 0.0 || size.y <= 0.0 {
            return DVec2::splat(0.5);
        }
        rect_to_uv(self.to_local(point), size).clamp(DVec2::ZERO, DVec2::ONE)
    }

    /// UV to a point on the drawing surface.
    pub fn uv_to_surface(&self, uv: DVec2) -> DVec2 {
        self.center() + uv_to_rect(uv, self.size())
    }
}
