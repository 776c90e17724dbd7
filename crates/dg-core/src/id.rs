//! Identifiers: interned element names for the visual tree, and the
//! numeric identities the graph hands out to shapes and lines.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static ELEMENT_NAMES: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Name of a visual-tree element (window, canvas, shape view).
///
/// Equal names intern to the same key, so ids are `Copy` and compare by key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(Spur);

impl ElementId {
    pub fn intern(name: &str) -> Self {
        Self(ELEMENT_NAMES.get_or_intern(name))
    }

    pub fn as_str(&self) -> &'static str {
        ELEMENT_NAMES.resolve(&self.0)
    }

    /// The view element of a shape, named `shape_<number>`.
    pub fn for_shape(number: ShapeNumber) -> Self {
        Self::intern(&format!("shape_{}", number.0))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Stable identity of a shape. Assigned by the owning graph, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeNumber(pub u32);

impl fmt::Display for ShapeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable identity of a line. Assigned by the owning graph, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub u32);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line#{}", self.0)
    }
}
