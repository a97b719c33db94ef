use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::events::EventSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded, texture-ready piece of content: a bitmap, a rasterized text
/// label, or (extension point) a model thumbnail. RGBA8, tightly packed.
#[derive(Debug, Clone)]
pub struct DecodedContent {
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedContent {
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Single-slot "latest decoded content" cell. Loader threads publish into
/// it; the render thread drains it at the start of the next frame and
/// uploads on its own thread. A newer publish simply replaces an undrained
/// older one.
#[derive(Default)]
pub struct ContentSlot {
    latest: Mutex<Option<DecodedContent>>,
}

impl ContentSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, content: DecodedContent) {
        *self.latest.lock() = Some(content);
    }

    pub fn take(&self) -> Option<DecodedContent> {
        self.latest.lock().take()
    }
}

/// The external content loader seam. Implementations decode or fetch off
/// the render thread and publish the result into the slot, emitting
/// content-loading/loaded/error events along the way. Failures surface as
/// events only; there is no automatic retry.
pub trait ContentSource {
    fn request(&mut self, source_key: &str, slot: &Arc<ContentSlot>, events: &dyn EventSink);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_hands_over_the_latest_publish_once() {
        let slot = ContentSlot::new();
        slot.publish(DecodedContent {
            texture: TextureId(1),
            width: 2,
            height: 2,
            rgba: vec![0; 16],
        });
        slot.publish(DecodedContent {
            texture: TextureId(2),
            width: 4,
            height: 2,
            rgba: vec![0; 32],
        });
        let content = slot.take().unwrap();
        assert_eq!(content.texture, TextureId(2));
        assert!((content.aspect() - 2.0).abs() < f32::EPSILON);
        assert!(slot.take().is_none());
    }
}
