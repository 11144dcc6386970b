use glam::{Mat4, Vec3};

/// Orbits the display box with Z up. Angles are in degrees; azimuth is
/// measured from +X toward +Y, elevation up from the XY plane.
pub struct OrbitCamera {
    pub focus_point: Vec3,
    pub azimuth: f32,
    pub elevation: f32,
    pub distance: f32,
}

impl OrbitCamera {
    pub fn new(focus_point: Vec3) -> Self {
        Self {
            focus_point,
            azimuth: -60.0,
            elevation: 30.0,
            distance: 4.0,
        }
    }

    pub fn eye_position(&self) -> Vec3 {
        let azimuth = self.azimuth.to_radians();
        let elevation = self.elevation.to_radians();
        let direction = Vec3::new(
            elevation.cos() * azimuth.cos(),
            elevation.cos() * azimuth.sin(),
            elevation.sin(),
        );
        self.focus_point + direction * self.distance
    }

    pub fn build_view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.focus_point, Vec3::Z)
    }
}

pub struct Projection {
    aspect: f32,
    fovy: f32,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy_degrees: f32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect_ratio(width, height),
            fovy: fovy_degrees.to_radians(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    pub fn build_projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}
