//! Pose Explorer - scene object lifecycle and pose state for a shape and
//! character scene editor.
//!
//! The [`SceneEditor`] drives everything: it creates objects from the shape
//! catalog or glTF models, keeps them grounded, applies slider edits, swaps
//! named poses on rigged characters and saves the whole scene to a
//! [`KeyValueStore`]. Rendering sits behind the [`Viewport`] trait.

pub mod app;
pub mod assets;
pub mod config;
pub mod render;
pub mod scene;
pub mod store;
pub mod ui;

pub use app::{LoadOutcome, SaveError, SceneEditor};
pub use assets::{GltfModelLoader, ModelLoader, ModelSource};
pub use config::EditorConfig;
pub use render::{HeadlessViewport, Viewport};
pub use scene::{ObjectId, SceneObjectRecord};
pub use store::{FileStore, KeyValueStore, MemoryStore};
