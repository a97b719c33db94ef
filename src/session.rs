use std::sync::Arc;

use tracing::{info, warn};

use crate::error::SessionError;
use crate::events::{ArEvent, EventKind, EventSink, ReadinessCell};
use crate::tracker::{InstallStatus, Tracker};

/// Lifecycle of the tracking session as seen by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    /// Runtime installation was requested; waiting for the next resume.
    Installing,
    Initializing,
    Ready,
    Paused,
    /// A fatal session error; only an explicit resume retries.
    Failed,
}

/// Drives the tracker through install/resume/pause and reports phase
/// changes as events. Owned by the engine, driven from the host lifecycle.
pub struct Session {
    phase: SessionPhase,
    readiness: Arc<ReadinessCell>,
}

impl Session {
    pub fn new(readiness: Arc<ReadinessCell>) -> Self {
        Self {
            phase: SessionPhase::default(),
            readiness,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    /// Installs the runtime if needed and resumes tracking. Safe to call
    /// from any phase; a failed session is retried here and nowhere else.
    pub fn resume<T: Tracker + ?Sized>(&mut self, tracker: &mut T, events: &dyn EventSink) {
        if self.phase == SessionPhase::Ready {
            return;
        }
        self.phase = SessionPhase::Initializing;
        events.emit(ArEvent::new(
            EventKind::SessionInitializing,
            "Initializing tracking session",
            self.readiness.snapshot(),
        ));
        match tracker.install_or_resume() {
            Ok(InstallStatus::Ready) => {
                self.phase = SessionPhase::Ready;
                self.readiness.set_session_ready(true);
                info!("tracking session resumed");
                events.emit(ArEvent::new(
                    EventKind::SessionReady,
                    "Tracking session ready",
                    self.readiness.snapshot(),
                ));
            }
            Ok(InstallStatus::InstallRequested) => {
                // The host restarts us after the install flow completes.
                self.phase = SessionPhase::Installing;
                info!("tracking runtime installation requested");
            }
            Err(err) => {
                self.phase = SessionPhase::Failed;
                self.readiness.set_session_ready(false);
                warn!(error = %err, "tracking session failed to resume");
                events.emit(ArEvent::new(
                    EventKind::SessionError,
                    session_error_message(&err),
                    self.readiness.snapshot(),
                ));
            }
        }
    }

    /// Pauses tracking. Anchors survive a pause; only frame advancement and
    /// the published matrices stop.
    pub fn pause<T: Tracker + ?Sized>(&mut self, tracker: &mut T) {
        if self.phase == SessionPhase::Ready {
            tracker.pause();
            self.phase = SessionPhase::Paused;
            self.readiness.set_session_ready(false);
            info!("tracking session paused");
        }
    }
}

fn session_error_message(err: &SessionError) -> String {
    match err {
        SessionError::RuntimeUnavailable(detail) => {
            format!("AR is not supported on this device: {detail}")
        }
        SessionError::InstallDeclined => "AR runtime installation was declined".to_string(),
        SessionError::Configuration(detail) => {
            format!("Failed to configure the tracking session: {detail}")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::anchors::test_support::FakeTracker;
    use crate::error::FrameError;
    use crate::tracker::{
        DisplayRotation, FrameSnapshot, HitCandidates, TrackableHit, TrackedAnchor,
    };

    struct RecordingSink {
        kinds: Mutex<Vec<EventKind>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                kinds: Mutex::new(Vec::new()),
            }
        }
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: ArEvent) {
            self.kinds.lock().unwrap().push(event.kind);
        }
    }

    struct FailingTracker;

    impl Tracker for FailingTracker {
        fn install_or_resume(&mut self) -> Result<InstallStatus, SessionError> {
            Err(SessionError::RuntimeUnavailable("no camera".into()))
        }

        fn pause(&mut self) {}

        fn advance_frame(&mut self, _near: f32, _far: f32) -> Result<FrameSnapshot, FrameError> {
            Err(FrameError::CameraUnavailable)
        }

        fn hit_test(&mut self, _x: f32, _y: f32) -> HitCandidates {
            HitCandidates::new()
        }

        fn create_anchor(
            &mut self,
            _hit: &TrackableHit,
        ) -> Result<Box<dyn TrackedAnchor>, FrameError> {
            Err(FrameError::CameraUnavailable)
        }

        fn set_display_geometry(&mut self, _rotation: DisplayRotation, _width: u32, _height: u32) {}

        fn background_texcoords(&self) -> [[f32; 2]; 4] {
            [[0.0; 2]; 4]
        }
    }

    #[test]
    fn resume_reaches_ready_and_emits_lifecycle_events() {
        let readiness = Arc::new(ReadinessCell::new());
        let mut session = Session::new(readiness.clone());
        let mut tracker = FakeTracker::new();
        let sink = RecordingSink::new();

        session.resume(&mut tracker, &sink);
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert!(readiness.snapshot().session_ready);
        assert_eq!(
            *sink.kinds.lock().unwrap(),
            vec![EventKind::SessionInitializing, EventKind::SessionReady]
        );

        // Resuming a ready session is a no-op.
        session.resume(&mut tracker, &sink);
        assert_eq!(sink.kinds.lock().unwrap().len(), 2);
    }

    #[test]
    fn resume_failure_moves_to_failed_and_reports() {
        let readiness = Arc::new(ReadinessCell::new());
        let mut session = Session::new(readiness.clone());
        let mut tracker = FailingTracker;
        let sink = RecordingSink::new();

        session.resume(&mut tracker, &sink);
        assert_eq!(session.phase(), SessionPhase::Failed);
        assert!(!readiness.snapshot().session_ready);
        assert_eq!(
            sink.kinds.lock().unwrap().last(),
            Some(&EventKind::SessionError)
        );
    }

    #[test]
    fn pause_only_applies_to_a_ready_session() {
        let readiness = Arc::new(ReadinessCell::new());
        let mut session = Session::new(readiness.clone());
        let mut tracker = FakeTracker::new();
        let sink = RecordingSink::new();

        session.pause(&mut tracker);
        assert_eq!(session.phase(), SessionPhase::Uninitialized);

        session.resume(&mut tracker, &sink);
        session.pause(&mut tracker);
        assert_eq!(session.phase(), SessionPhase::Paused);
        assert!(!readiness.snapshot().session_ready);

        session.resume(&mut tracker, &sink);
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[test]
    fn fresh_session_is_not_ready() {
        let readiness = Arc::new(ReadinessCell::new());
        let session = Session::new(readiness);
        assert!(!session.is_ready());
    }
}
