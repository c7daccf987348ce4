pub mod class_environment;
pub mod class_info;
pub mod control_flow;
pub mod decompile_error;
pub mod decompiler;
pub mod expression;
pub mod reconstruction;
pub mod renderer;
pub mod stack_simulation;
pub mod structuring;
pub mod symbol_resolver;

pub use class_environment::{ClassEnvironment, MapEnvironment};
pub use decompile_error::DecompileError;
pub use decompiler::{decompile, decompile_with_options};
pub use renderer::RenderOptions;
