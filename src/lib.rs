mod anchors;
mod backend;
mod config;
mod content;
mod engine;
mod error;
mod events;
mod gesture;
mod math;
mod session;
mod tracker;

pub use anchors::{AnchorStore, AnchoredObject, Rotation};
pub use backend::{BillboardVertex, RenderBackend, BACKGROUND_QUAD, BILLBOARD_QUAD};
pub use config::EngineConfig;
pub use content::{ContentSlot, ContentSource, DecodedContent, TextureId};
pub use engine::{BillboardStyle, Engine};
pub use error::{ContentError, FrameError, SessionError};
pub use events::{ArEvent, EventKind, EventSink, NullSink, Readiness, ReadinessCell};
pub use gesture::{GestureState, MultiTouchGestures, PointerEvent, TurntableGestures};
pub use hit_test::{find_nearest, FrameMatrices, MatrixCell};
pub use math::{project_to_screen, wrap_degrees, Mat4};
pub use session::{Session, SessionPhase};
pub use tracker::{
    DisplayRotation, FrameSnapshot, HitCandidates, InstallStatus, PointOrientation, SurfaceId,
    SurfaceUpdate, TrackableHit, TrackableKind, TrackedAnchor, Tracker, TrackingState,
};
