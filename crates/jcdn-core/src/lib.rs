//! jcdn-core: the live code playground without a browser.
//!
//! This crate provides:
//! - `SourceKind` - the markup / style / script dispatch table
//! - `KeyValueStore` and `NamespacedStore` - persistence abstraction
//! - `AppState` - editor text and selection, with change reporting
//! - `MarkdownRenderer`, `diff` and `RenderPipeline` - incremental preview rendering
//! - `EditorWidget`, `PreviewSurface` - the platform seams
//! - `Playground` - ties it all together
//! - `headless` - in-memory store, surface and widget

pub mod config;
pub mod diff;
pub mod error;
pub mod headless;
pub mod highlight;
pub mod html;
pub mod kind;
pub mod markdown;
pub mod pipeline;
pub mod playground;
pub mod slot;
pub mod state;
pub mod store;
pub mod surface;
pub mod tree;

pub use config::{DEFAULT_NAMESPACE, PlaygroundConfig, SourceDefaults};
pub use diff::{NodePath, Patch, diff};
pub use error::{HighlightError, PlaygroundError, Result, StoreError};
pub use highlight::{CodeHighlighter, SyntectHighlighter};
pub use kind::{KindInfo, NavigationKey, SourceKind};
pub use markdown::MarkdownRenderer;
pub use pipeline::{RenderPipeline, RenderStats};
pub use playground::Playground;
pub use slot::{EditorSlot, EditorWidget, KeyBinding, KeyCommand, ModeSpec, WidgetConfig};
pub use state::{AppState, FieldChange};
pub use store::{KeyValueStore, MemoryStore, NamespacedStore, SELECTED_EDITOR_KEY};
pub use surface::PreviewSurface;
pub use tree::{Element, RenderNode, to_html};
