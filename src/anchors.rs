use tracing::debug;

use crate::math::Mat4;
use crate::tracker::{HitCandidates, TrackedAnchor, Tracker, TrackingState};

/// Accumulated user rotation in degrees. The turntable variant only ever
/// writes `y`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Rotation {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn around_y(degrees: f32) -> Self {
        Self {
            x: 0.0,
            y: degrees,
            z: 0.0,
        }
    }
}

/// One world-anchored piece of content. The anchor handle is owned
/// exclusively; it is detached when the object is re-anchored or the store
/// is torn down.
pub struct AnchoredObject {
    anchor: Box<dyn TrackedAnchor>,
    pub rotation: Rotation,
    pub scale: f32,
}

impl AnchoredObject {
    pub fn pose(&self) -> Mat4 {
        self.anchor.pose()
    }

    pub fn is_tracked(&self) -> bool {
        self.anchor.tracking_state() == TrackingState::Tracking
    }
}

/// The ordered collection of placed objects. Order is placement order; the
/// last element is the active object that drag and freeform rotation act on.
#[derive(Default)]
pub struct AnchorStore {
    objects: Vec<AnchoredObject>,
}

impl AnchorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AnchoredObject> {
        self.objects.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnchoredObject> {
        self.objects.iter()
    }

    /// World positions of the actively tracked objects, with their store
    /// indices, for input-thread hit testing.
    pub fn tracked_positions(&self) -> Vec<(usize, [f32; 3])> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_tracked())
            .map(|(i, o)| (i, o.pose().translation_part()))
            .collect()
    }

    /// Anchors a new object at the first qualifying hit. Returns whether the
    /// store changed; no qualifying hit leaves it untouched.
    pub fn place<T: Tracker + ?Sized>(
        &mut self,
        tracker: &mut T,
        hits: &HitCandidates,
        scale: f32,
    ) -> bool {
        for hit in hits.iter().filter(|h| h.is_qualifying()) {
            match tracker.create_anchor(hit) {
                Ok(anchor) => {
                    self.objects.push(AnchoredObject {
                        anchor,
                        rotation: Rotation::ZERO,
                        scale,
                    });
                    return true;
                }
                Err(err) => {
                    debug!(error = %err, "anchor creation failed, trying next hit");
                }
            }
        }
        false
    }

    /// Re-anchors the active object at the first qualifying hit, stamping
    /// the live accumulated rotation onto it. The old anchor is released
    /// best-effort.
    pub fn reposition<T: Tracker + ?Sized>(
        &mut self,
        tracker: &mut T,
        hits: &HitCandidates,
        rotation: Rotation,
    ) -> bool {
        let Some(active) = self.objects.last_mut() else {
            return false;
        };
        for hit in hits.iter().filter(|h| h.is_qualifying()) {
            match tracker.create_anchor(hit) {
                Ok(anchor) => {
                    let mut old = std::mem::replace(&mut active.anchor, anchor);
                    if let Err(err) = old.detach() {
                        debug!(error = %err, "releasing stale anchor failed");
                    }
                    active.rotation = rotation;
                    return true;
                }
                Err(err) => {
                    debug!(error = %err, "anchor creation failed, trying next hit");
                }
            }
        }
        false
    }

    /// Stamps a rotation on the object at `index`, or on the active object
    /// when `index` is `None`. Out-of-range indices are a no-op.
    pub fn apply_rotation(&mut self, index: Option<usize>, rotation: Rotation) {
        let target = match index {
            Some(i) => self.objects.get_mut(i),
            None => self.objects.last_mut(),
        };
        if let Some(object) = target {
            object.rotation = rotation;
        }
    }

    /// Releases every anchor best-effort and empties the store.
    pub fn detach_all(&mut self) {
        for mut object in self.objects.drain(..) {
            if let Err(err) = object.anchor.detach() {
                debug!(error = %err, "releasing anchor on teardown failed");
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use smallvec::smallvec;

    use super::test_support::{surface_hit, FakeTracker};
    use super::*;

    #[test]
    fn place_takes_the_first_qualifying_hit() {
        let mut tracker = FakeTracker::new();
        let mut store = AnchorStore::new();
        let hits = smallvec![
            surface_hit(Mat4::translation(9.0, 9.0, 9.0), false),
            surface_hit(Mat4::translation(1.0, 2.0, 3.0), true),
        ];
        assert!(store.place(&mut tracker, &hits, 0.3));
        assert_eq!(store.len(), 1);
        let object = store.get(0).unwrap();
        assert_eq!(object.pose().translation_part(), [1.0, 2.0, 3.0]);
        assert_eq!(object.rotation, Rotation::ZERO);
        assert_eq!(object.scale, 0.3);
    }

    #[test]
    fn place_without_qualifying_hit_leaves_store_untouched() {
        let mut tracker = FakeTracker::new();
        let mut store = AnchorStore::new();
        let hits = smallvec![surface_hit(Mat4::identity(), false)];
        assert!(!store.place(&mut tracker, &hits, 0.3));
        assert!(store.is_empty());
    }

    #[test]
    fn failed_anchor_creation_never_mutates_the_store() {
        let mut tracker = FakeTracker::new();
        tracker.fail_anchor_creation = true;
        let mut store = AnchorStore::new();
        let hits = smallvec![surface_hit(Mat4::identity(), true)];
        assert!(!store.place(&mut tracker, &hits, 0.3));
        assert!(store.is_empty());
    }

    #[test]
    fn reposition_replaces_the_active_anchor_and_stamps_rotation() {
        let mut tracker = FakeTracker::new();
        let mut store = AnchorStore::new();
        let first = smallvec![surface_hit(Mat4::translation(1.0, 0.0, 0.0), true)];
        store.place(&mut tracker, &first, 0.3);

        let rotation = Rotation {
            x: 5.0,
            y: 10.0,
            z: 30.0,
        };
        let second = smallvec![surface_hit(Mat4::translation(2.0, 0.0, 0.0), true)];
        assert!(store.reposition(&mut tracker, &second, rotation));
        assert_eq!(store.len(), 1);
        let object = store.get(0).unwrap();
        assert_eq!(object.pose().translation_part(), [2.0, 0.0, 0.0]);
        assert_eq!(object.rotation, rotation);
        assert_eq!(tracker.detached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reposition_on_an_empty_store_is_a_no_op() {
        let mut tracker = FakeTracker::new();
        let mut store = AnchorStore::new();
        let hits = smallvec![surface_hit(Mat4::identity(), true)];
        assert!(!store.reposition(&mut tracker, &hits, Rotation::ZERO));
    }

    #[test]
    fn apply_rotation_defaults_to_the_active_object() {
        let mut tracker = FakeTracker::new();
        let mut store = AnchorStore::new();
        let hits = smallvec![surface_hit(Mat4::identity(), true)];
        store.place(&mut tracker, &hits, 0.3);
        store.place(&mut tracker, &hits, 0.3);

        store.apply_rotation(None, Rotation::around_y(45.0));
        assert_eq!(store.get(0).unwrap().rotation, Rotation::ZERO);
        assert_eq!(store.get(1).unwrap().rotation, Rotation::around_y(45.0));

        store.apply_rotation(Some(0), Rotation::around_y(-10.0));
        assert_eq!(store.get(0).unwrap().rotation, Rotation::around_y(-10.0));

        // Out of range: no panic, no change.
        store.apply_rotation(Some(7), Rotation::around_y(99.0));
        assert_eq!(store.get(1).unwrap().rotation, Rotation::around_y(45.0));
    }

    #[test]
    fn detach_all_releases_every_anchor() {
        let mut tracker = FakeTracker::new();
        let mut store = AnchorStore::new();
        let hits = smallvec![surface_hit(Mat4::identity(), true)];
        store.place(&mut tracker, &hits, 0.3);
        store.place(&mut tracker, &hits, 0.3);
        store.detach_all();
        assert!(store.is_empty());
        assert_eq!(tracker.detached.load(Ordering::SeqCst), 2);
    }
}
