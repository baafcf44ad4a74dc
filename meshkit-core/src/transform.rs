/// Model transforms: position, Euler rotation and scale
use nalgebra::{Matrix4, UnitQuaternion, Vector3};

/// Position, rotation and scale of an object
///
/// Rotation is stored as Euler angles in degrees and converted with
/// [`UnitQuaternion::from_euler_angles`]: rotate about X first, then Y, then Z
/// (all about the fixed world axes), i.e. `R = Rz * Ry * Rx`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    /// Degrees around X, Y and Z
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn new(position: Vector3<f32>, rotation: Vector3<f32>, scale: Vector3<f32>) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros(), Vector3::repeat(1.0))
    }

    /// Rotate by delta amounts (in degrees)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.rotation += Vector3::new(dx, dy, dz);
    }

    pub fn rotation_quaternion(&self) -> UnitQuaternion<f32> {
        let radians = self.rotation.map(f32::to_radians);
        UnitQuaternion::from_euler_angles(radians.x, radians.y, radians.z)
    }

    /// Model matrix, translation * rotation * scale
    pub fn matrix(&self) -> Matrix4<f32> {
        translation_matrix(&self.position)
            * self.rotation_quaternion().to_homogeneous()
            * scale_matrix(&self.scale)
    }

    /// The rotated basis as `(right, up, forward)`, i.e. +X, +Y and +Z
    pub fn axes(&self) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
        let q = self.rotation_quaternion();
        (
            (q * Vector3::x()).normalize(),
            (q * Vector3::y()).normalize(),
            (q * Vector3::z()).normalize(),
        )
    }

    pub fn right(&self) -> Vector3<f32> {
        self.axes().0
    }

    pub fn up(&self) -> Vector3<f32> {
        self.axes().1
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.axes().2
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Create a translation matrix
pub fn translation_matrix(offset: &Vector3<f32>) -> Matrix4<f32> {
    Matrix4::new_translation(offset)
}

/// Create a scale matrix
pub fn scale_matrix(scale: &Vector3<f32>) -> Matrix4<f32> {
    Matrix4::new_nonuniform_scaling(scale)
}

/// Create a model-view-projection matrix
pub fn mvp_matrix(
    model: &Matrix4<f32>,
    view: &Matrix4<f32>,
    projection: &Matrix4<f32>,
) -> Matrix4<f32> {
    projection * view * model
}
