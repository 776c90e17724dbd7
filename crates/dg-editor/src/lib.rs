//! DG (Diagram) editor engine: reversible commands, undo/redo history,
//! drag gestures, and command enablement.

pub mod commands;
pub mod config;
pub mod editor;
pub mod enablement;
pub mod gesture;
pub mod input;
pub mod tools;

pub use commands::{Command, UndoRedoController};
pub use config::{ConfigError, EditorConfig, ShapeTemplate};
pub use editor::{Editor, EditorCommands, Selection};
pub use enablement::{ChangeNotifier, EnablementBridge, RelayCommand, Subscription};
pub use gesture::{Capture, DragGesture, GestureContext, GestureState};
pub use input::{InputEvent, PointerCapture, VirtualPointer};
pub use tools::{LineClick, LineTool, LineToolState};
