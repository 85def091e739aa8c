pub mod context;
pub mod error;
pub mod headless;
pub mod shader_loader;
pub mod texture;
pub mod wgpu_context;

pub use context::{InputElement, RenderContext, ShaderStage};
pub use error::{BindError, ErrorCode, GraphicsError, RemovalReason};
