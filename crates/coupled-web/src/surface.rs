//! Element-space pointer helpers. Pure math so they can be tested on the host.

use glam::DVec2;

/// World-space half width shown across the element; height follows the aspect.
pub const VIEW_HALF_WIDTH: f64 = 6.0;

/// Element-local CSS pixels to y-up UV in `[0,1]^2`. A collapsed element
/// maps to the center.
pub fn element_uv(local_x: f64, local_y: f64, width: f64, height: f64) -> DVec2 {
    if width > 0.0 && height > 0.0 {
        let u = (local_x / width).clamp(0.0, 1.0);
        let v = (local_y / height).clamp(0.0, 1.0);
        DVec2::new(u, 1.0 - v)
    } else {
        DVec2::splat(0.5)
    }
}

/// Element UV to world coordinates for a view centered on the origin.
pub fn uv_to_world(uv: DVec2, width: f64, height: f64) -> DVec2 {
    let aspect = if width > 0.0 { height / width } else { 1.0 };
    let half = DVec2::new(VIEW_HALF_WIDTH, VIEW_HALF_WIDTH * aspect);
    (2.0 * uv - DVec2::ONE) * half
}

pub fn element_to_world(local_x: f64, local_y: f64, width: f64, height: f64) -> DVec2 {
    uv_to_world(element_uv(local_x, local_y, width, height), width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_left_is_uv_zero_one() {
        assert_eq!(element_uv(0.0, 0.0, 200.0, 100.0), DVec2::new(0.0, 1.0));
        assert_eq!(element_uv(200.0, 100.0, 200.0, 100.0), DVec2::new(1.0, 0.0));
    }

    #[test]
    fn outside_points_clamp_and_collapsed_elements_center() {
        assert_eq!(element_uv(-50.0, 500.0, 200.0, 100.0), DVec2::new(0.0, 0.0));
        assert_eq!(element_uv(10.0, 10.0, 0.0, 100.0), DVec2::splat(0.5));
    }

    #[test]
    fn element_center_is_world_origin() {
        assert_eq!(element_to_world(100.0, 50.0, 200.0, 100.0), DVec2::ZERO);
        assert_eq!(
            element_to_world(200.0, 0.0, 200.0, 100.0),
            DVec2::new(6.0, 3.0)
        );
    }
}
