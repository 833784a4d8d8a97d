mod application;
mod builder;
pub mod dispatch;
mod routes;

pub use application::{Application, TurnReport};
pub use builder::ApplicationBuilder;
pub use routes::{MessageRoutes, RouteHandler, history_route};
