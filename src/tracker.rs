use smallvec::SmallVec;

use crate::error::{FrameError, SessionError};
use crate::math::Mat4;

/// Tracking quality reported per frame and per anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Tracking,
    Paused,
    Stopped,
}

/// Orientation mode of a hit-tested feature point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointOrientation {
    EstimatedSurfaceNormal,
    Unoriented,
}

/// What a screen-space hit test struck.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackableKind {
    /// A detected planar surface; `hit_in_polygon` is whether the hit pose
    /// lies inside the surface's detected boundary polygon.
    Surface { hit_in_polygon: bool },
    FeaturePoint { orientation: PointOrientation },
}

/// One ranked candidate from [`Tracker::hit_test`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackableHit {
    pub kind: TrackableKind,
    pub pose: Mat4,
}

impl TrackableHit {
    /// Whether this hit is good enough to anchor content to: a hit inside a
    /// surface polygon, or a feature point with an estimated normal.
    pub fn is_qualifying(&self) -> bool {
        match self.kind {
            TrackableKind::Surface { hit_in_polygon } => hit_in_polygon,
            TrackableKind::FeaturePoint { orientation } => {
                orientation == PointOrientation::EstimatedSurfaceNormal
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Per-frame update for one tracked surface.
#[derive(Debug, Clone)]
pub struct SurfaceUpdate {
    pub id: SurfaceId,
    pub tracking: TrackingState,
    /// Merged into a larger surface; subsumed surfaces are not drawn.
    pub subsumed: bool,
    pub center_pose: Mat4,
    /// Boundary polygon vertices in the surface's local space.
    pub polygon: Vec<[f32; 3]>,
}

/// Everything the renderer needs from one advanced tracker frame.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub tracking: TrackingState,
    pub view: Mat4,
    pub projection: Mat4,
    /// Display geometry changed since the last frame; the camera background
    /// texture coordinates must be recomputed.
    pub display_geometry_changed: bool,
    pub surfaces: Vec<SurfaceUpdate>,
}

/// Outcome of asking the tracker runtime to install or resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    Ready,
    /// Installation was kicked off; try resuming again once it finishes.
    InstallRequested,
}

/// Screen rotation quadrant, as reported by the host display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayRotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

/// An anchor bound to a fixed pose in tracked physical space. Owned
/// exclusively by the store; detached on replacement or teardown.
pub trait TrackedAnchor: Send + Sync {
    fn pose(&self) -> Mat4;
    fn tracking_state(&self) -> TrackingState;
    /// Releases the anchor in the tracking runtime. Failures are treated as
    /// best-effort by callers and never propagate.
    fn detach(&mut self) -> Result<(), FrameError>;
}

pub type HitCandidates = SmallVec<[TrackableHit; 4]>;

/// The external AR tracking session. Pose estimation, surface detection and
/// anchor lifetime live behind this seam; the engine only orchestrates.
pub trait Tracker {
    /// Installs the tracking runtime if needed and resumes the session.
    fn install_or_resume(&mut self) -> Result<InstallStatus, SessionError>;

    /// Stops frame advancement until the next `install_or_resume`.
    fn pause(&mut self);

    /// Advances to the next camera frame. A failure here is recoverable;
    /// the caller skips the frame.
    fn advance_frame(&mut self, near: f32, far: f32) -> Result<FrameSnapshot, FrameError>;

    /// Hit-tests a screen point against tracked surfaces and feature
    /// points, best candidates first.
    fn hit_test(&mut self, x: f32, y: f32) -> HitCandidates;

    fn create_anchor(&mut self, hit: &TrackableHit) -> Result<Box<dyn TrackedAnchor>, FrameError>;

    fn set_display_geometry(&mut self, rotation: DisplayRotation, width: u32, height: u32);

    /// Camera background texture coordinates for the current display
    /// geometry, matching [`crate::backend::BACKGROUND_QUAD`] vertex order.
    fn background_texcoords(&self) -> [[f32; 2]; 4];
}
