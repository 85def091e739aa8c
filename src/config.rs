use glam::{Mat4, Vec2, Vec3};
use winit::dpi::PhysicalSize;

/// Perspective frustum described by the view plane at `near`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionConfig {
    pub view_width: f32,
    pub view_height: f32,
    pub near: f32,
    pub far: f32,
}

impl ProjectionConfig {
    /// Left-handed perspective with depth mapped to `[0, 1]`.
    pub fn matrix(&self) -> Mat4 {
        let fov_y = 2.0 * (0.5 * self.view_height / self.near).atan();
        Mat4::perspective_lh(fov_y, self.view_width / self.view_height, self.near, self.far)
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            view_width: 1.0,
            view_height: 0.75,
            near: 0.5,
            far: 40.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub size: PhysicalSize<u32>,
    pub clear_color: Vec3,
    pub box_count: usize,
    pub sheet_count: usize,
    /// Fixed seed for the box motion, or `None` for entropy.
    pub seed: Option<u64>,
    pub vsync: bool,
    pub projection: ProjectionConfig,
    /// Show the cursor position in the window title. Ignored in release
    /// builds.
    pub mouse_title: bool,
}

impl AppConfig {
    /// Window title for a cursor at `position`, if the title should change.
    pub fn mouse_position_title(&self, position: Vec2) -> Option<String> {
        (cfg!(debug_assertions) && self.mouse_title)
            .then(|| format!("Mouse Position: ({}, {})", position.x, position.y))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "boxdance".to_string(),
            size: PhysicalSize::new(800, 600),
            clear_color: Vec3::splat(0.5),
            box_count: 48,
            sheet_count: 1,
            seed: None,
            vsync: true,
            projection: ProjectionConfig::default(),
            mouse_title: cfg!(debug_assertions),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;

    #[test]
    fn view_plane_corners_map_to_ndc_corners() {
        let config = ProjectionConfig::default();
        let corner = Vec4::new(0.5 * config.view_width, 0.5 * config.view_height, config.near, 1.0);

        let clip = config.matrix() * corner;
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn mouse_title_is_debug_only() {
        let config = AppConfig {
            mouse_title: true,
            ..AppConfig::default()
        };
        let title = config.mouse_position_title(Vec2::new(3.0, 4.0));

        if cfg!(debug_assertions) {
            assert_eq!(title.as_deref(), Some("Mouse Position: (3, 4)"));
        } else {
            assert_eq!(title, None);
        }

        let disabled = AppConfig {
            mouse_title: false,
            ..AppConfig::default()
        };
        assert_eq!(disabled.mouse_position_title(Vec2::ZERO), None);
    }

    #[test]
    fn far_plane_maps_to_depth_one() {
        let config = ProjectionConfig::default();
        let clip = config.matrix() * Vec4::new(0.0, 0.0, config.far, 1.0);
        assert!((clip.z / clip.w - 1.0).abs() < 1e-5);
    }
}
