use super::math::{Ray, Vec3};

/// A pinhole camera looking from `position` towards `look_target`.
///
/// The orthonormal base and the viewport size are computed once at construction,
/// rays are then generated per pixel with [`Camera::ray_through_pixel`].
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub look_target: Vec3,
    pub global_up: Vec3,
    /// vertical field of view in radians
    pub fov_y: f64,
    pub focal_length: f64,
    pub image_width: u32,
    pub image_height: u32,

    forward: Vec3,
    right: Vec3,
    up: Vec3,
    viewport_width: f64,
    viewport_height: f64,
}

impl Camera {
    pub fn look_at(
        position: Vec3,
        look_target: Vec3,
        global_up: Vec3,
        fov_y: f64,
        focal_length: f64,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        let forward = (look_target - position).normalize();
        let right = forward.cross(global_up).normalize();
        // to get an orthonormal base, we should calculate the up vector with two perpendicular vectors
        let up = right.cross(forward).normalize();

        let aspect = image_width as f64 / image_height as f64;
        let viewport_height = 2.0 * focal_length * (fov_y / 2.0).tan();
        let viewport_width = aspect * viewport_height;

        Self {
            position,
            look_target,
            global_up,
            fov_y,
            focal_length,
            image_width,
            image_height,
            forward,
            right,
            up,
            viewport_width,
            viewport_height,
        }
    }

    /// True when `global_up` is parallel to the viewing direction and no base can be built.
    pub fn is_degenerate(position: Vec3, look_target: Vec3, global_up: Vec3) -> bool {
        let view = look_target - position;
        view.squared_len() < f64::EPSILON
            || view.normalize().cross(global_up).squared_len() < f64::EPSILON
    }

    /// Returns the same camera rendering at a different resolution.
    pub fn with_resolution(&self, image_width: u32, image_height: u32) -> Self {
        Self::look_at(
            self.position,
            self.look_target,
            self.global_up,
            self.fov_y,
            self.focal_length,
            image_width,
            image_height,
        )
    }

    /// Creates the ray from the camera position through the pixel `(pixel_x, pixel_y)`.
    ///
    /// `pixel_y` grows upwards from the bottom edge of the viewport, callers that fill
    /// an image top-down must pass `image_height - y - 1`.
    pub fn ray_through_pixel(&self, pixel_x: u32, pixel_y: u32) -> Ray {
        let width = self.image_width as f64;
        let height = self.image_height as f64;

        let lower_left = self.position + self.forward * self.focal_length
            - self.right * (self.viewport_width / 2.0)
            - self.up * (self.viewport_height / 2.0);

        let pixel_size_w = self.viewport_width / width;
        let pixel_size_h = self.viewport_height / height;

        let s = (pixel_x as f64 + pixel_size_w) / width * self.viewport_width;
        let t = (pixel_y as f64 + pixel_size_h) / height * self.viewport_height;
        let point = lower_left + self.right * s + self.up * t;

        Ray::towards(self.position, point - self.position)
    }
}
