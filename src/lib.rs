pub mod app;
pub mod compositor;
pub mod config;
pub mod emitter;
pub mod grid;
pub mod render;
pub mod session;
pub mod style;
pub mod surface;
pub mod terminal;
