pub mod camera;
pub mod core;
pub mod framebuffer;
pub mod math;
pub mod parser;
pub mod render;
pub mod scenes;
pub mod solid;
pub mod tracer;

pub use math::*;
