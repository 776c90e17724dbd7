//! Visual element tree: reference-container resolution.
//!
//! Every pointer position is measured relative to some element. Shape views
//! live inside a canvas, the canvas inside a window. The tree answers two
//! questions for the gesture layer: which canvas encloses an element, and
//! where a window-space point falls inside a given element.
//!
//! Shape elements take their offset from the `Graph` rather than storing
//! one, so the tree never holds a stale copy of a shape's position.

use crate::id::{ElementId, ShapeNumber};
use crate::model::{Graph, Point};
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use std::collections::HashMap;
use thiserror::Error;

/// What an element of the visual tree is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Window,
    /// A coordinate space that shapes are positioned in.
    Canvas,
    /// The view of a shape in the graph.
    Shape(ShapeNumber),
}

#[derive(Debug, Clone)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    /// Offset relative to the parent. Unused for shape elements.
    pub offset: Point,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("element {0} is not in the visual tree")]
    UnknownElement(ElementId),
    #[error("no canvas encloses element {0}")]
    NotFound(ElementId),
    #[error("shape {0} is not in the graph")]
    ShapeMissing(ShapeNumber),
}

/// Container resolution as consumed by gestures.
pub trait VisualTree {
    /// The nearest canvas strictly above `element`.
    fn container_of(&self, element: ElementId) -> Result<ElementId, ResolveError>;

    /// Convert a window-space point into `element`'s coordinate space.
    fn to_local(&self, point: Point, element: ElementId, graph: &Graph) -> Result<Point, ResolveError>;

    /// The shape an element displays, if any.
    fn shape_of(&self, element: ElementId) -> Option<ShapeNumber>;
}

/// A petgraph-backed tree of elements rooted at a window.
#[derive(Debug, Clone)]
pub struct ElementTree {
    graph: StableDiGraph<Element, ()>,
    root: NodeIndex,
    index: HashMap<ElementId, NodeIndex>,
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTree {
    /// Create a tree holding a single `window` root at the origin.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let id = ElementId::intern("window");
        let root = graph.add_node(Element {
            id,
            kind: ElementKind::Window,
            offset: Point::ZERO,
        });
        let mut index = HashMap::new();
        index.insert(id, root);
        Self { graph, root, index }
    }

    pub fn root(&self) -> ElementId {
        self.graph[self.root].id
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.index.get(&id).map(|idx| &self.graph[*idx])
    }

    /// Add `element` as a child of `parent`. Adding an id that is already
    /// in the tree is a no-op.
    pub fn add(&mut self, parent: ElementId, element: Element) -> Result<(), ResolveError> {
        let parent_idx = self.index_of(parent)?;
        if self.index.contains_key(&element.id) {
            return Ok(());
        }
        let id = element.id;
        let idx = self.graph.add_node(element);
        self.graph.add_edge(parent_idx, idx, ());
        self.index.insert(id, idx);
        Ok(())
    }

    /// Convenience for adding a canvas at `offset` inside `parent`.
    pub fn add_canvas(&mut self, parent: ElementId, name: &str, offset: Point) -> Result<ElementId, ResolveError> {
        let id = ElementId::intern(name);
        self.add(
            parent,
            Element {
                id,
                kind: ElementKind::Canvas,
                offset,
            },
        )?;
        Ok(id)
    }

    /// Remove an element and everything below it. Returns false for an
    /// unknown id or the root.
    pub fn remove(&mut self, id: ElementId) -> bool {
        let Some(&idx) = self.index.get(&id) else {
            return false;
        };
        if idx == self.root {
            return false;
        }
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            stack.extend(self.graph.neighbors_directed(current, Direction::Outgoing));
            if let Some(removed) = self.graph.remove_node(current) {
                self.index.remove(&removed.id);
            }
        }
        true
    }

    /// Make the shape elements under `canvas` mirror the graph: one element
    /// per shape, none for shapes that are gone.
    pub fn sync_shapes(&mut self, canvas: ElementId, graph: &Graph) -> Result<(), ResolveError> {
        let canvas_idx = self.index_of(canvas)?;
        let stale: Vec<ElementId> = self
            .graph
            .neighbors_directed(canvas_idx, Direction::Outgoing)
            .filter_map(|idx| match self.graph[idx].kind {
                ElementKind::Shape(number) if graph.shape(number).is_none() => Some(self.graph[idx].id),
                _ => None,
            })
            .collect();
        for id in stale {
            log::trace!("element {id} dropped, shape gone");
            self.remove(id);
        }
        for shape in graph.shapes() {
            let id = ElementId::for_shape(shape.number);
            if !self.contains(id) {
                self.add(
                    canvas,
                    Element {
                        id,
                        kind: ElementKind::Shape(shape.number),
                        offset: Point::ZERO,
                    },
                )?;
            }
        }
        Ok(())
    }

    /// Window-space origin of an element.
    pub fn origin(&self, id: ElementId, graph: &Graph) -> Result<Point, ResolveError> {
        let mut idx = self.index_of(id)?;
        let mut origin = Point::ZERO;
        loop {
            origin = origin + self.local_offset(idx, graph)?;
            match self.parent(idx) {
                Some(parent) => idx = parent,
                None => return Ok(origin),
            }
        }
    }

    fn local_offset(&self, idx: NodeIndex, graph: &Graph) -> Result<Point, ResolveError> {
        let element = &self.graph[idx];
        match element.kind {
            ElementKind::Shape(number) => graph
                .shape(number)
                .map(|s| s.position())
                .ok_or(ResolveError::ShapeMissing(number)),
            _ => Ok(element.offset),
        }
    }

    fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph.neighbors_directed(idx, Direction::Incoming).next()
    }

    fn index_of(&self, id: ElementId) -> Result<NodeIndex, ResolveError> {
        self.index.get(&id).copied().ok_or(ResolveError::UnknownElement(id))
    }
}

impl VisualTree for ElementTree {
    fn container_of(&self, element: ElementId) -> Result<ElementId, ResolveError> {
        let mut idx = self.index_of(element)?;
        while let Some(parent) = self.parent(idx) {
            if self.graph[parent].kind == ElementKind::Canvas {
                return Ok(self.graph[parent].id);
            }
            idx = parent;
        }
        Err(ResolveError::NotFound(element))
    }

    fn to_local(&self, point: Point, element: ElementId, graph: &Graph) -> Result<Point, ResolveError> {
        Ok(point - self.origin(element, graph)?)
    }

    fn shape_of(&self, element: ElementId) -> Option<ShapeNumber> {
        match self.get(element)?.kind {
            ElementKind::Shape(number) => Some(number),
            _ => None,
        }
    }
}
