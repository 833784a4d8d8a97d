mod registry;
mod traits;

pub use registry::{HandlerRegistry, SAY_COMMAND_ACTION};
pub use traits::{ActionHandler, FnFunction, FunctionHandler, HandlerFuture};
