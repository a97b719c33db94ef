use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use crate::anchors::{AnchorStore, Rotation};
use crate::config::EngineConfig;
use crate::events::{ArEvent, EventKind, EventSink, ReadinessCell};
use crate::hit_test::{find_nearest, MatrixCell};
use crate::math::wrap_degrees;

/// A raw pointer-stream event as delivered by the host view. The stream is
/// produced on the input thread; interpreters fold it into [`GestureState`]
/// which the render thread drains once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// First pointer pressed.
    Down { x: f32, y: f32 },
    /// A second pointer joined; both current positions.
    SecondDown { first: [f32; 2], second: [f32; 2] },
    /// Pointer movement; positions of all active pointers.
    Move {
        first: [f32; 2],
        second: Option<[f32; 2]>,
    },
    /// One of two pointers lifted; the remaining pointer's position.
    SecondUp { remaining: [f32; 2] },
    /// Last pointer lifted.
    Up { x: f32, y: f32 },
    Cancel,
}

/// Cross-thread gesture hand-off cell. Every field is single-writer (input
/// thread) / single-reader (render thread), so plain atomics are enough;
/// moves arriving between frames coalesce into the latest value rather than
/// queueing. The render thread resets the rotation accumulator after a
/// placement, which is the only write outside the input thread and never
/// overlaps an active rotation.
#[derive(Debug, Default)]
pub struct GestureState {
    pending_tap: AtomicBool,
    tap_x: AtomicU32,
    tap_y: AtomicU32,
    dragging: AtomicBool,
    drag_x: AtomicU32,
    drag_y: AtomicU32,
    rotating: AtomicBool,
    rotation_x: AtomicU32,
    rotation_y: AtomicU32,
    rotation_z: AtomicU32,
    /// Selected anchor index for the turntable grammar; -1 means none.
    selected: AtomicI64,
}

impl GestureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_tap(&self, x: f32, y: f32) {
        self.tap_x.store(x.to_bits(), Ordering::Relaxed);
        self.tap_y.store(y.to_bits(), Ordering::Relaxed);
        self.pending_tap.store(true, Ordering::Release);
    }

    /// Takes the pending placement tap, clearing the flag.
    pub fn take_pending_tap(&self) -> Option<(f32, f32)> {
        if self.pending_tap.swap(false, Ordering::Acquire) {
            Some((
                f32::from_bits(self.tap_x.load(Ordering::Relaxed)),
                f32::from_bits(self.tap_y.load(Ordering::Relaxed)),
            ))
        } else {
            None
        }
    }

    pub fn set_drag(&self, x: f32, y: f32) {
        self.drag_x.store(x.to_bits(), Ordering::Relaxed);
        self.drag_y.store(y.to_bits(), Ordering::Relaxed);
        self.dragging.store(true, Ordering::Release);
    }

    pub fn end_drag(&self) {
        self.dragging.store(false, Ordering::Release);
    }

    pub fn drag_position(&self) -> Option<(f32, f32)> {
        if self.dragging.load(Ordering::Acquire) {
            Some((
                f32::from_bits(self.drag_x.load(Ordering::Relaxed)),
                f32::from_bits(self.drag_y.load(Ordering::Relaxed)),
            ))
        } else {
            None
        }
    }

    pub fn set_rotating(&self, rotating: bool) {
        self.rotating.store(rotating, Ordering::Release);
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating.load(Ordering::Acquire)
    }

    pub fn add_rotation(&self, dx: f32, dy: f32, dz: f32) {
        for (cell, delta) in [
            (&self.rotation_x, dx),
            (&self.rotation_y, dy),
            (&self.rotation_z, dz),
        ] {
            let current = f32::from_bits(cell.load(Ordering::Relaxed));
            cell.store((current + delta).to_bits(), Ordering::Relaxed);
        }
    }

    pub fn set_rotation_y(&self, degrees: f32) {
        self.rotation_y.store(degrees.to_bits(), Ordering::Relaxed);
    }

    pub fn reset_rotation(&self) {
        self.rotation_x.store(0f32.to_bits(), Ordering::Relaxed);
        self.rotation_y.store(0f32.to_bits(), Ordering::Relaxed);
        self.rotation_z.store(0f32.to_bits(), Ordering::Relaxed);
    }

    pub fn rotation(&self) -> Rotation {
        Rotation {
            x: f32::from_bits(self.rotation_x.load(Ordering::Relaxed)),
            y: f32::from_bits(self.rotation_y.load(Ordering::Relaxed)),
            z: f32::from_bits(self.rotation_z.load(Ordering::Relaxed)),
        }
    }

    pub fn select(&self, index: Option<usize>) {
        let value = index.map(|i| i as i64).unwrap_or(-1);
        self.selected.store(value, Ordering::Release);
    }

    pub fn selected(&self) -> Option<usize> {
        let value = self.selected.load(Ordering::Acquire);
        (value >= 0).then_some(value as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Dragging,
    Rotating,
}

fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

fn midpoint(a: [f32; 2], b: [f32; 2]) -> [f32; 2] {
    [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5]
}

/// Angle of the line between two pointers, in degrees.
fn angle_between(a: [f32; 2], b: [f32; 2]) -> f32 {
    (b[1] - a[1]).atan2(b[0] - a[0]).to_degrees()
}

/// Gesture grammar for the freeform (image/model) views: single-pointer tap
/// to place, single-pointer drag to reposition, two-finger twist and pan to
/// rotate the active object around all three axes.
pub struct MultiTouchGestures {
    state: Arc<GestureState>,
    mode: Mode,
    press: [f32; 2],
    tap_valid: bool,
    last_angle: f32,
    last_centroid: [f32; 2],
    tap_slop: f32,
    tilt_sensitivity: f32,
}

impl MultiTouchGestures {
    pub fn new(state: Arc<GestureState>, config: &EngineConfig) -> Self {
        Self {
            state,
            mode: Mode::Idle,
            press: [0.0, 0.0],
            tap_valid: false,
            last_angle: 0.0,
            last_centroid: [0.0, 0.0],
            tap_slop: config.movement_threshold_px,
            tilt_sensitivity: config.tilt_sensitivity,
        }
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { x, y } => {
                self.mode = Mode::Dragging;
                self.press = [x, y];
                self.tap_valid = true;
                self.state.set_rotating(false);
            }
            PointerEvent::SecondDown { first, second } => {
                if self.mode == Mode::Dragging {
                    self.mode = Mode::Rotating;
                    self.tap_valid = false;
                    self.state.end_drag();
                    self.state.set_rotating(true);
                    self.last_angle = angle_between(first, second);
                    self.last_centroid = midpoint(first, second);
                }
            }
            PointerEvent::Move { first, second } => match (self.mode, second) {
                (Mode::Rotating, Some(second)) => {
                    let centroid = midpoint(first, second);
                    let angle = angle_between(first, second);
                    let twist = wrap_degrees(angle - self.last_angle);
                    let dx = centroid[0] - self.last_centroid[0];
                    let dy = centroid[1] - self.last_centroid[1];
                    self.state.add_rotation(
                        dy * self.tilt_sensitivity,
                        dx * self.tilt_sensitivity,
                        twist,
                    );
                    // Incremental re-baselining avoids drift across the
                    // atan2 seam.
                    self.last_angle = angle;
                    self.last_centroid = centroid;
                }
                (Mode::Dragging, None) => {
                    if self.tap_valid && distance(first, self.press) > self.tap_slop {
                        self.tap_valid = false;
                    }
                    if !self.tap_valid {
                        self.state.set_drag(first[0], first[1]);
                    }
                }
                _ => {}
            },
            PointerEvent::SecondUp { remaining } => {
                if self.mode == Mode::Rotating {
                    self.mode = Mode::Dragging;
                    self.state.set_rotating(false);
                    // The tap candidate stays invalid; the remaining pointer
                    // becomes the new drag baseline.
                    self.press = remaining;
                }
            }
            PointerEvent::Up { x, y } => {
                if self.mode == Mode::Dragging
                    && self.tap_valid
                    && distance([x, y], self.press) <= self.tap_slop
                {
                    self.state.request_tap(x, y);
                }
                self.reset();
            }
            PointerEvent::Cancel => self.reset(),
        }
    }

    fn reset(&mut self) {
        self.mode = Mode::Idle;
        self.tap_valid = false;
        self.state.end_drag();
        self.state.set_rotating(false);
    }
}

/// Gesture grammar for the text view: press selects the projected anchor
/// nearest the touch (within the hit radius), horizontal movement past the
/// threshold turns it around the vertical axis, and a plain tap with no
/// selection places a new object.
pub struct TurntableGestures {
    state: Arc<GestureState>,
    store: Arc<RwLock<AnchorStore>>,
    matrices: Arc<MatrixCell>,
    readiness: Arc<ReadinessCell>,
    sink: Arc<dyn EventSink>,
    press: [f32; 2],
    selected: Option<usize>,
    base_rotation: f32,
    rotating: bool,
    tap_valid: bool,
    tap_slop: f32,
    hit_radius: f32,
    sensitivity: f32,
}

impl TurntableGestures {
    pub fn new(
        state: Arc<GestureState>,
        store: Arc<RwLock<AnchorStore>>,
        matrices: Arc<MatrixCell>,
        readiness: Arc<ReadinessCell>,
        sink: Arc<dyn EventSink>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            state,
            store,
            matrices,
            readiness,
            sink,
            press: [0.0, 0.0],
            selected: None,
            base_rotation: 0.0,
            rotating: false,
            tap_valid: false,
            tap_slop: config.movement_threshold_px,
            hit_radius: config.hit_test_radius_px,
            sensitivity: config.turn_sensitivity,
        }
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { x, y } => {
                self.press = [x, y];
                self.rotating = false;
                self.selected = None;
                self.tap_valid = true;
                self.select_at(x, y);
            }
            PointerEvent::Move { first, .. } => {
                if let Some(index) = self.selected {
                    let moved = distance(first, self.press);
                    if !self.rotating && moved > self.tap_slop {
                        self.rotating = true;
                        self.state.set_rotating(true);
                        self.emit(
                            EventKind::RotationStarted,
                            format!("Rotating object {index}"),
                        );
                    }
                    if self.rotating {
                        let angle =
                            self.base_rotation + (first[0] - self.press[0]) * self.sensitivity;
                        self.state.set_rotation_y(angle);
                    }
                } else if self.tap_valid && distance(first, self.press) > self.tap_slop {
                    self.tap_valid = false;
                }
            }
            PointerEvent::Up { x, y } => {
                if self.rotating {
                    self.emit(EventKind::RotationEnded, "Rotation completed".to_string());
                } else if self.selected.is_none()
                    && self.tap_valid
                    && distance([x, y], self.press) <= self.tap_slop
                {
                    self.state.request_tap(x, y);
                }
                self.reset();
            }
            PointerEvent::Cancel => self.reset(),
            // Extra pointers do not participate in this grammar.
            PointerEvent::SecondDown { .. } | PointerEvent::SecondUp { .. } => {}
        }
    }

    /// Hit-tests the projected anchors on the input thread using the last
    /// published frame matrices. A miss (or unpublished matrices) leaves the
    /// gesture as a plain tap-to-place.
    fn select_at(&mut self, x: f32, y: f32) {
        let store = self.store.read().unwrap();
        if store.is_empty() {
            return;
        }
        let Some(matrices) = self.matrices.snapshot() else {
            return;
        };
        let positions = store.tracked_positions();
        if let Some(index) = find_nearest((x, y), &matrices, &positions, self.hit_radius) {
            self.selected = Some(index);
            self.base_rotation = store.get(index).map(|o| o.rotation.y).unwrap_or(0.0);
            self.state.select(Some(index));
            self.state.set_rotation_y(self.base_rotation);
            self.emit(
                EventKind::ObjectSelected,
                format!("Object {index} selected for rotation"),
            );
        }
    }

    fn emit(&self, kind: EventKind, message: String) {
        self.sink
            .emit(ArEvent::new(kind, message, self.readiness.snapshot()));
    }

    fn reset(&mut self) {
        self.selected = None;
        self.rotating = false;
        self.tap_valid = false;
        self.state.select(None);
        self.state.set_rotating(false);
    }
}
