use std::sync::{Arc, RwLock};

use ahash::{HashSet, HashSetExt};
use tracing::{debug, info};

use crate::anchors::{AnchorStore, AnchoredObject, Rotation};
use crate::backend::RenderBackend;
use crate::config::EngineConfig;
use crate::content::{ContentSlot, ContentSource, TextureId};
use crate::events::{ArEvent, EventKind, EventSink, ReadinessCell};
use crate::gesture::{GestureState, MultiTouchGestures, TurntableGestures};
use crate::hit_test::{FrameMatrices, MatrixCell};
use crate::math::Mat4;
use crate::session::{Session, SessionPhase};
use crate::tracker::{DisplayRotation, SurfaceId, SurfaceUpdate, Tracker, TrackingState};

/// How accumulated rotation composes into the billboard's model matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillboardStyle {
    /// All three axes apply, z-then-y-then-x. Used by the image and model
    /// views with the two-finger grammar.
    Freeform,
    /// Only yaw applies. Used by the text view with the turntable grammar.
    Turntable,
}

/// Ties the tracker, the gesture hand-off, the anchor store and the GPU
/// backend together. One engine per view; `render_frame` runs on the render
/// thread, the gesture interpreters feed the shared state from the input
/// thread.
pub struct Engine<T: Tracker, B: RenderBackend, E: EventSink + 'static> {
    config: EngineConfig,
    style: BillboardStyle,
    tracker: T,
    backend: B,
    events: Arc<E>,
    session: Session,
    store: Arc<RwLock<AnchorStore>>,
    gestures: Arc<GestureState>,
    matrices: Arc<MatrixCell>,
    content: Arc<ContentSlot>,
    readiness: Arc<ReadinessCell>,
    /// Last uploaded content texture and its width/height aspect.
    uploaded: Option<(TextureId, f32)>,
    seen_surfaces: HashSet<SurfaceId>,
    surface_event_emitted: bool,
    default_scale: f32,
    viewport: (u32, u32),
    background_texcoords: [[f32; 2]; 4],
}

impl<T: Tracker, B: RenderBackend, E: EventSink + 'static> Engine<T, B, E> {
    pub fn new(
        tracker: T,
        backend: B,
        events: Arc<E>,
        config: EngineConfig,
        style: BillboardStyle,
    ) -> Self {
        let readiness = Arc::new(ReadinessCell::new());
        let default_scale = config.base_scale;
        let background_texcoords = tracker.background_texcoords();
        Self {
            config,
            style,
            tracker,
            backend,
            events,
            session: Session::new(readiness.clone()),
            store: Arc::new(RwLock::new(AnchorStore::new())),
            gestures: Arc::new(GestureState::new()),
            matrices: Arc::new(MatrixCell::new()),
            content: Arc::new(ContentSlot::new()),
            readiness,
            uploaded: None,
            seen_surfaces: HashSet::new(),
            surface_event_emitted: false,
            default_scale,
            viewport: (0, 0),
            background_texcoords,
        }
    }

    pub fn gesture_state(&self) -> Arc<GestureState> {
        self.gestures.clone()
    }

    pub fn content_slot(&self) -> Arc<ContentSlot> {
        self.content.clone()
    }

    pub fn session_phase(&self) -> SessionPhase {
        self.session.phase()
    }

    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn placed_count(&self) -> usize {
        self.store.read().unwrap().len()
    }

    /// Builds the two-finger gesture interpreter wired to this engine's
    /// shared state. Drive it with the raw pointer stream on the input
    /// thread.
    pub fn multi_touch_gestures(&self) -> MultiTouchGestures {
        MultiTouchGestures::new(self.gestures.clone(), &self.config)
    }

    /// Builds the turntable interpreter; it hit-tests projected anchors on
    /// the input thread through the shared matrix cell.
    pub fn turntable_gestures(&self) -> TurntableGestures {
        TurntableGestures::new(
            self.gestures.clone(),
            self.store.clone(),
            self.matrices.clone(),
            self.readiness.clone(),
            self.events.clone(),
            &self.config,
        )
    }

    /// Scale applied to objects placed from now on; already-placed objects
    /// keep theirs.
    pub fn set_default_scale(&mut self, scale: f32) {
        self.default_scale = scale;
    }

    /// Host surface changed size or rotation.
    pub fn set_viewport(&mut self, rotation: DisplayRotation, width: u32, height: u32) {
        self.viewport = (width, height);
        self.backend.set_viewport(width, height);
        self.tracker.set_display_geometry(rotation, width, height);
        self.background_texcoords = self.tracker.background_texcoords();
    }

    pub fn resume(&mut self) {
        self.session.resume(&mut self.tracker, self.events.as_ref());
    }

    /// Pauses tracking. Published matrices go stale immediately so the input
    /// thread stops selecting against an old camera pose; anchors survive.
    pub fn pause(&mut self) {
        self.session.pause(&mut self.tracker);
        self.matrices.invalidate();
    }

    /// Kicks off an asynchronous content load through the given source.
    pub fn load_content(&mut self, source: &mut dyn ContentSource, source_key: &str) {
        self.readiness.set_content_loaded(false);
        self.events.emit(ArEvent::new(
            EventKind::ContentLoading,
            format!("Loading {source_key}"),
            self.readiness.snapshot(),
        ));
        source.request(source_key, &self.content, self.events.as_ref());
    }

    /// Releases every anchor and pauses the session. The engine can be
    /// resumed again afterwards with an empty store.
    pub fn teardown(&mut self) {
        self.store.write().unwrap().detach_all();
        self.pause();
        info!("engine torn down");
    }

    /// One render-thread frame: clear, advance tracking, apply decoded
    /// content, drain gestures, draw background, markers and billboards.
    pub fn render_frame(&mut self) {
        if self.session.phase() == SessionPhase::Failed {
            self.backend.clear(self.config.error_clear_color);
            return;
        }
        self.backend.clear(self.config.clear_color);
        if !self.session.is_ready() {
            return;
        }

        let frame = match self.tracker.advance_frame(self.config.near, self.config.far) {
            Ok(frame) => frame,
            Err(err) => {
                debug!(error = %err, "camera frame unavailable, skipping");
                return;
            }
        };

        self.apply_decoded_content();
        self.note_surfaces(&frame.surfaces);

        let tracking = frame.tracking == TrackingState::Tracking;
        if tracking {
            self.drain_gestures();
        } else {
            // Taps raised while tracking is interrupted are stale by the
            // time it recovers.
            let _ = self.gestures.take_pending_tap();
        }

        if frame.display_geometry_changed {
            self.background_texcoords = self.tracker.background_texcoords();
        }
        self.backend.draw_camera_background(&self.background_texcoords);

        if !tracking {
            return;
        }

        self.matrices.publish(FrameMatrices {
            view: frame.view,
            projection: frame.projection,
            viewport: self.viewport,
        });

        let view_projection = frame.projection.mul(&frame.view);
        let store = self.store.read().unwrap();
        if store.is_empty() {
            for surface in tracked_surfaces(&frame.surfaces) {
                let mvp = view_projection.mul(&surface.center_pose);
                self.backend.draw_surface_marker(&mvp, &surface.polygon);
            }
        }
        if let Some((texture, aspect)) = self.uploaded {
            for object in store.iter().filter(|o| o.is_tracked()) {
                let model = model_matrix(self.style, object, aspect);
                let mvp = view_projection.mul(&model);
                self.backend.draw_billboard(&mvp, texture);
            }
        }
    }

    /// Uploads freshly decoded content on the render thread. A newer decode
    /// replaces the previous texture binding.
    fn apply_decoded_content(&mut self) {
        if let Some(content) = self.content.take() {
            let aspect = content.aspect();
            self.backend.upload_texture(
                content.texture,
                (content.width, content.height),
                &content.rgba,
            );
            self.uploaded = Some((content.texture, aspect));
            self.readiness.set_content_loaded(true);
            self.emit(EventKind::ContentLoaded, "Content ready".to_string());
        }
    }

    fn note_surfaces(&mut self, surfaces: &[SurfaceUpdate]) {
        let mut any_tracked = false;
        for surface in tracked_surfaces(surfaces) {
            any_tracked = true;
            if self.seen_surfaces.insert(surface.id) {
                debug!(surface = surface.id.0, "surface tracked");
            }
        }
        if any_tracked {
            self.readiness.set_surface_detected(true);
            if !self.surface_event_emitted {
                self.surface_event_emitted = true;
                self.emit(
                    EventKind::SurfaceDetected,
                    "Surface detected, tap to place".to_string(),
                );
            }
        }
    }

    /// Applies the input thread's pending gestures to the store. Runs only
    /// on tracked frames, so hit tests go against live geometry.
    fn drain_gestures(&mut self) {
        if let Some((x, y)) = self.gestures.take_pending_tap() {
            let readiness = self.readiness.snapshot();
            if !readiness.content_loaded {
                self.emit(
                    EventKind::PlacementBlocked,
                    "Content still loading, please wait".to_string(),
                );
            } else if !readiness.surface_detected {
                self.emit(
                    EventKind::PlacementBlocked,
                    "No surface detected, keep scanning".to_string(),
                );
            } else {
                let hits = self.tracker.hit_test(x, y);
                let placed =
                    self.store
                        .write()
                        .unwrap()
                        .place(&mut self.tracker, &hits, self.default_scale);
                if placed {
                    // The accumulator belongs to the new active object now.
                    self.gestures.reset_rotation();
                    let count = self.store.read().unwrap().len();
                    self.emit(EventKind::ObjectPlaced, format!("Placed object {count}"));
                }
            }
        }

        if let Some((x, y)) = self.gestures.drag_position() {
            let hits = self.tracker.hit_test(x, y);
            let rotation = self.gestures.rotation();
            self.store
                .write()
                .unwrap()
                .reposition(&mut self.tracker, &hits, rotation);
        }

        if self.gestures.is_rotating() {
            let rotation = self.gestures.rotation();
            match self.style {
                BillboardStyle::Freeform => {
                    self.store.write().unwrap().apply_rotation(None, rotation);
                }
                BillboardStyle::Turntable => {
                    if let Some(index) = self.gestures.selected() {
                        self.store
                            .write()
                            .unwrap()
                            .apply_rotation(Some(index), Rotation::around_y(rotation.y));
                    }
                }
            }
        }
    }

    fn emit(&self, kind: EventKind, message: String) {
        self.events
            .emit(ArEvent::new(kind, message, self.readiness.snapshot()));
    }
}

fn tracked_surfaces(surfaces: &[SurfaceUpdate]) -> impl Iterator<Item = &SurfaceUpdate> {
    surfaces
        .iter()
        .filter(|s| s.tracking == TrackingState::Tracking && !s.subsumed)
}

/// Billboard model matrix: anchor translation, then the user rotation, then
/// scale with the content aspect stretching width.
fn model_matrix(style: BillboardStyle, object: &AnchoredObject, aspect: f32) -> Mat4 {
    let [x, y, z] = object.pose().translation_part();
    let translation = Mat4::translation(x, y, z);
    let rotation = match style {
        BillboardStyle::Freeform => Mat4::rotation_z(object.rotation.z)
            .mul(&Mat4::rotation_y(object.rotation.y))
            .mul(&Mat4::rotation_x(object.rotation.x)),
        BillboardStyle::Turntable => Mat4::rotation_y(object.rotation.y),
    };
    let s = object.scale;
    let scale = Mat4::scaling(s * aspect, s, s);
    translation.mul(&rotation).mul(&scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchors::test_support::FakeTracker;

    #[test]
    fn freeform_model_matrix_scales_width_by_aspect() {
        let mut tracker = FakeTracker::new();
        let mut store = AnchorStore::new();
        let hits = smallvec::smallvec![crate::anchors::test_support::surface_hit(
            Mat4::translation(1.0, 2.0, -3.0),
            true
        )];
        store.place(&mut tracker, &hits, 0.3);
        let object = store.get(0).unwrap();

        let model = model_matrix(BillboardStyle::Freeform, object, 2.0);
        // Local x axis is stretched by scale * aspect = 0.6.
        let p = model.transform_point([1.0, 0.0, 0.0, 1.0]);
        assert!((p[0] - 1.6).abs() < 1e-5);
        assert!((p[1] - 2.0).abs() < 1e-5);
        assert!((p[2] - -3.0).abs() < 1e-5);
    }

    #[test]
    fn turntable_model_matrix_only_yaws() {
        let mut tracker = FakeTracker::new();
        let mut store = AnchorStore::new();
        let hits =
            smallvec::smallvec![crate::anchors::test_support::surface_hit(Mat4::identity(), true)];
        store.place(&mut tracker, &hits, 1.0);
        store.apply_rotation(
            None,
            Rotation {
                x: 45.0,
                y: 90.0,
                z: 45.0,
            },
        );
        let object = store.get(0).unwrap();

        let model = model_matrix(BillboardStyle::Turntable, object, 1.0);
        // +x turns toward -z under a 90-degree yaw; x and z tilt are ignored.
        let p = model.transform_point([1.0, 0.0, 0.0, 1.0]);
        assert!(p[0].abs() < 1e-5);
        assert!(p[1].abs() < 1e-5);
        assert!((p[2] - -1.0).abs() < 1e-5);
    }
}
