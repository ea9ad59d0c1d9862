mod component;
mod controls;
mod driver;
mod render;

pub use component::SandboxPanel;
