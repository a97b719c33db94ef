use std::sync::atomic::{AtomicBool, Ordering};

/// Readiness flags attached to every emitted event so the host UI can show
/// loading feedback without tracking state itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Readiness {
    pub session_ready: bool,
    pub content_loaded: bool,
    pub surface_detected: bool,
}

/// Shared, lock-free view of the readiness flags. The render thread updates
/// it; anything emitting an event snapshots it.
#[derive(Debug, Default)]
pub struct ReadinessCell {
    session_ready: AtomicBool,
    content_loaded: AtomicBool,
    surface_detected: AtomicBool,
}

impl ReadinessCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_session_ready(&self, ready: bool) {
        self.session_ready.store(ready, Ordering::Release);
    }

    pub fn set_content_loaded(&self, loaded: bool) {
        self.content_loaded.store(loaded, Ordering::Release);
    }

    pub fn set_surface_detected(&self, detected: bool) {
        self.surface_detected.store(detected, Ordering::Release);
    }

    pub fn snapshot(&self) -> Readiness {
        Readiness {
            session_ready: self.session_ready.load(Ordering::Acquire),
            content_loaded: self.content_loaded.load(Ordering::Acquire),
            surface_detected: self.surface_detected.load(Ordering::Acquire),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    SessionInitializing,
    SessionReady,
    SessionError,
    /// First tracked surface seen this session; emitted once.
    SurfaceDetected,
    ContentLoading,
    ContentLoaded,
    ContentError,
    ObjectPlaced,
    /// A tap arrived before placement preconditions were met.
    PlacementBlocked,
    ObjectSelected,
    RotationStarted,
    RotationEnded,
}

/// A state-change notification for the host UI layer.
#[derive(Debug, Clone)]
pub struct ArEvent {
    pub kind: EventKind,
    pub message: String,
    pub readiness: Readiness,
}

impl ArEvent {
    pub fn new(kind: EventKind, message: impl Into<String>, readiness: Readiness) -> Self {
        Self {
            kind,
            message: message.into(),
            readiness,
        }
    }
}

/// Consumes engine events. Implemented by the host UI bridge; called from
/// both the render and input threads.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ArEvent);
}

/// Sink that drops everything; useful for headless tests and tools.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ArEvent) {}
}
