pub mod error;
pub mod geometry;
pub mod id;
pub mod model;
pub mod serializer;
pub mod world;

pub use error::SceneError;
pub use id::{NodeKey, ObjectId, ObjectKind};
pub use model::*;
pub use serializer::{JsonSerializer, SceneSerializer};
pub use world::{Engine, Timing, World};

// Re-export kurbo geometry so downstream crates share one version
pub use kurbo::{Point, Rect, Vec2};
