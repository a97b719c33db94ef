use bytemuck::{Pod, Zeroable};

/// A column-major 4x4 transform, laid out the way tracker pose arrays and
/// GL-style backends expect it (translation in elements 12..15).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Mat4(pub [f32; 16]);

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub const fn identity() -> Self {
        Self([
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub const fn from_columns(cols: [f32; 16]) -> Self {
        Self(cols)
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::identity();
        m.0[12] = x;
        m.0[13] = y;
        m.0[14] = z;
        m
    }

    /// Rotation about the x axis, in degrees.
    pub fn rotation_x(angle_degrees: f32) -> Self {
        let (s, c) = angle_degrees.to_radians().sin_cos();
        Self([
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, s, 0.0, //
            0.0, -s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Rotation about the y axis, in degrees.
    pub fn rotation_y(angle_degrees: f32) -> Self {
        let (s, c) = angle_degrees.to_radians().sin_cos();
        Self([
            c, 0.0, -s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Rotation about the z axis, in degrees.
    pub fn rotation_z(angle_degrees: f32) -> Self {
        let (s, c) = angle_degrees.to_radians().sin_cos();
        Self([
            c, s, 0.0, 0.0, //
            -s, c, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn scaling(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::identity();
        m.0[0] = x;
        m.0[5] = y;
        m.0[10] = z;
        m
    }

    /// `self * rhs`, so `a.mul(&b).transform_point(p)` applies `b` first.
    pub fn mul(&self, rhs: &Mat4) -> Mat4 {
        let a = &self.0;
        let b = &rhs.0;
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                let mut acc = 0.0;
                for k in 0..4 {
                    acc += a[k * 4 + row] * b[col * 4 + k];
                }
                out[col * 4 + row] = acc;
            }
        }
        Mat4(out)
    }

    pub fn transform_point(&self, v: [f32; 4]) -> [f32; 4] {
        let m = &self.0;
        [
            m[0] * v[0] + m[4] * v[1] + m[8] * v[2] + m[12] * v[3],
            m[1] * v[0] + m[5] * v[1] + m[9] * v[2] + m[13] * v[3],
            m[2] * v[0] + m[6] * v[1] + m[10] * v[2] + m[14] * v[3],
            m[3] * v[0] + m[7] * v[1] + m[11] * v[2] + m[15] * v[3],
        ]
    }

    /// The translation column, i.e. the world position of a pose matrix.
    pub fn translation_part(&self) -> [f32; 3] {
        [self.0[12], self.0[13], self.0[14]]
    }

    pub fn as_slice(&self) -> &[f32; 16] {
        &self.0
    }
}

/// Wraps an angle delta into (-180, 180] degrees so that incremental
/// two-finger rotation never jumps across the atan2 seam.
pub fn wrap_degrees(mut delta: f32) -> f32 {
    while delta > 180.0 {
        delta -= 360.0;
    }
    while delta <= -180.0 {
        delta += 360.0;
    }
    delta
}

/// Homogeneous w below this is treated as behind the camera.
const MIN_CLIP_W: f32 = 1e-4;

/// NDC magnitude beyond this is grossly off-screen and rejected outright.
const MAX_NDC: f32 = 2.0;

/// Projects a world-space point to screen pixels through the given view and
/// projection matrices. Returns `None` for points behind the camera or far
/// outside the frustum.
pub fn project_to_screen(
    world: [f32; 3],
    view: &Mat4,
    projection: &Mat4,
    viewport: (u32, u32),
) -> Option<(f32, f32)> {
    let eye = view.transform_point([world[0], world[1], world[2], 1.0]);
    let clip = projection.transform_point(eye);
    if clip[3] <= MIN_CLIP_W {
        return None;
    }
    let ndc_x = clip[0] / clip[3];
    let ndc_y = clip[1] / clip[3];
    if ndc_x.abs() > MAX_NDC || ndc_y.abs() > MAX_NDC {
        return None;
    }
    let screen_x = (ndc_x + 1.0) * 0.5 * viewport.0 as f32;
    // Screen y grows downward.
    let screen_y = (1.0 - ndc_y) * 0.5 * viewport.1 as f32;
    Some((screen_x, screen_y))
}
