pub mod bindable;
pub mod config;
pub mod demo;
pub mod drawable;
pub mod geometry;
pub mod rendering;
pub mod scene;
pub mod timer;
pub mod window;
