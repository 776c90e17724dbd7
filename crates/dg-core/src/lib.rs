pub mod hit;
pub mod id;
pub mod model;
pub mod tree;

pub use hit::hit_test;
pub use id::{ElementId, LineId, ShapeNumber};
pub use model::*;
pub use tree::{Element, ElementKind, ElementTree, ResolveError, VisualTree};
