/// Camera and projection utilities
use nalgebra::{Matrix4, Point3};

use crate::transform::Transform;

/// Perspective camera parameters
///
/// The camera carries no placement of its own; the view matrix comes from
/// whichever [`Transform`] it is paired with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub aspect: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(aspect: f32, fov: f32, near: f32, far: f32) -> Self {
        Self {
            aspect,
            fov,
            near,
            far,
        }
    }

    /// Camera with a 45 degree field of view sized for a viewport
    pub fn for_viewport(width: u32, height: u32) -> Self {
        Self::new(width as f32 / height.max(1) as f32, 45.0, 0.1, 100.0)
    }

    /// Create the projection matrix
    ///
    /// Not validated: `near <= 0` or `far <= near` give a meaningless matrix.
    pub fn perspective_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov.to_radians(), self.near, self.far)
    }

    /// Create the view matrix for a camera placed at `transform`
    ///
    /// The camera looks along the transform's forward axis.
    pub fn view_matrix(&self, transform: &Transform) -> Matrix4<f32> {
        let (_, up, forward) = transform.axes();
        let eye = Point3::from(transform.position);
        Matrix4::look_at_rh(&eye, &(eye + forward), &up)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::for_viewport(800, 600)
    }
}
