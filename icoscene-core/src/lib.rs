//! icoscene core library - scene graph, camera, controls and frame loop
//!
//! Builds a flat-shaded icosahedron with a wireframe overlay, lights it,
//! orbits a camera around it and rasterizes it into a character-cell
//! surface that front-ends present.

pub mod config;
pub mod controls;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod material;
pub mod projection;
pub mod raster;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use config::SceneConfig;
pub use controls::OrbitControls;
pub use error::{Error, Result};
pub use frame::{FrameClock, FrameDriver, FramePacer, FrameState, FrameStats, SceneContext};
pub use geometry::{Mesh, Triangle, Vertex};
pub use material::{Color, Material};
pub use projection::Camera;
pub use raster::{Cell, HeadlessSink, OutputSink, Surface};
pub use scene::{Light, Scene, SceneNode};
pub use transform::{RotationState, Transform};
