// Eyeball Hunt library: scene graph, transforms, camera and game rules,
// plus the wgpu/winit renderer that puts them on screen

pub mod camera;
pub mod config;
pub mod error;
pub mod game;
pub mod input;
pub mod math;
pub mod mesh;
pub mod renderer;
pub mod scene;

pub use camera::Camera;
pub use config::GameConfig;
pub use error::{GameError, Result};
pub use game::{FrameInput, Game};
pub use math::Transform;
pub use scene::{DrawItem, Drawable, Scene, SceneNode};
