pub mod console;
pub mod context;
pub mod traits;

pub use console::ConsoleOutbound;
pub use context::TurnContext;
pub use traits::{Activity, Outbound};
