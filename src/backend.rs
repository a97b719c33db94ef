use bytemuck::{Pod, Zeroable};

use crate::content::TextureId;
use crate::math::Mat4;

/// Vertex layout shared by the billboard quad and the camera background.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BillboardVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

/// Unit-ish billboard quad in model space, half-extent 0.3, facing +z.
/// Triangle-strip order; v is flipped so image content reads upright.
pub const BILLBOARD_QUAD: [BillboardVertex; 4] = [
    BillboardVertex {
        position: [-0.3, -0.3, 0.0],
        tex_coords: [0.0, 1.0],
    },
    BillboardVertex {
        position: [0.3, -0.3, 0.0],
        tex_coords: [1.0, 1.0],
    },
    BillboardVertex {
        position: [-0.3, 0.3, 0.0],
        tex_coords: [0.0, 0.0],
    },
    BillboardVertex {
        position: [0.3, 0.3, 0.0],
        tex_coords: [1.0, 0.0],
    },
];

/// Full-screen NDC quad for the camera background, triangle-strip order.
/// The matching texture coordinates come from the tracker per display
/// geometry.
pub const BACKGROUND_QUAD: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]];

/// The GPU seam. Implementations own shaders, buffers and the swapchain;
/// the engine only sequences draw calls. All methods are called from the
/// render thread.
pub trait RenderBackend {
    fn set_viewport(&mut self, width: u32, height: u32);

    fn clear(&mut self, color: [f32; 4]);

    /// Draws the camera image as a full-screen quad using [`BACKGROUND_QUAD`]
    /// positions and the given per-vertex texture coordinates.
    fn draw_camera_background(&mut self, texcoords: &[[f32; 2]; 4]);

    /// Uploads (or replaces) an RGBA8 texture.
    fn upload_texture(&mut self, texture: TextureId, size: (u32, u32), rgba: &[u8]);

    /// Draws [`BILLBOARD_QUAD`] with the given model-view-projection matrix
    /// and texture.
    fn draw_billboard(&mut self, mvp: &Mat4, texture: TextureId);

    /// Draws a detected surface's boundary polygon as a placement hint.
    /// `mvp` maps the surface's local space to clip space.
    fn draw_surface_marker(&mut self, mvp: &Mat4, polygon: &[[f32; 3]]);
}
