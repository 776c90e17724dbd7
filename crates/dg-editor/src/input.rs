//! Input abstraction layer.
//!
//! Platform pointer events are translated into `InputEvent`s in window
//! coordinates before they reach the editor. Exclusive pointer capture is
//! modelled by the `PointerCapture` trait so the gesture layer can acquire
//! and release it without knowing the platform.

use dg_core::{ElementId, Point};

/// A normalized pointer event, positions in window space.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed. `target` is the element under the pointer when the
    /// platform knows it; otherwise the editor hit-tests the canvas.
    PointerDown {
        target: Option<ElementId>,
        x: f64,
        y: f64,
    },

    /// Pointer moved.
    PointerMove { x: f64, y: f64 },

    /// Pointer released.
    PointerUp {
        target: Option<ElementId>,
        x: f64,
        y: f64,
    },
}

impl InputEvent {
    pub fn down(target: ElementId, x: f64, y: f64) -> Self {
        Self::PointerDown {
            target: Some(target),
            x,
            y,
        }
    }

    pub fn down_at(x: f64, y: f64) -> Self {
        Self::PointerDown { target: None, x, y }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::PointerMove { x, y }
    }

    pub fn up(target: ElementId, x: f64, y: f64) -> Self {
        Self::PointerUp {
            target: Some(target),
            x,
            y,
        }
    }

    pub fn up_at(x: f64, y: f64) -> Self {
        Self::PointerUp { target: None, x, y }
    }

    pub fn position(&self) -> Point {
        match self {
            Self::PointerDown { x, y, .. } | Self::PointerMove { x, y } | Self::PointerUp { x, y, .. } => {
                Point::new(*x, *y)
            }
        }
    }
}

/// Exclusive pointer capture: while held, every pointer event goes to the
/// capturing element regardless of where the pointer is.
pub trait PointerCapture {
    fn capture(&mut self, element: ElementId);

    /// Release capture. Releasing when nothing is captured is a no-op.
    fn release_capture(&mut self);

    fn captured(&self) -> Option<ElementId>;
}

/// In-process pointer used when no platform device is attached.
#[derive(Debug, Default, Clone)]
pub struct VirtualPointer {
    captured: Option<ElementId>,
}

impl VirtualPointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop capture without the capturing gesture asking for it, as happens
    /// when the platform steals focus.
    pub fn lose_capture(&mut self) {
        if let Some(element) = self.captured.take() {
            log::warn!("pointer capture lost by {element}");
        }
    }
}

impl PointerCapture for VirtualPointer {
    fn capture(&mut self, element: ElementId) {
        self.captured = Some(element);
    }

    fn release_capture(&mut self) {
        self.captured = None;
    }

    fn captured(&self) -> Option<ElementId> {
        self.captured
    }
}
