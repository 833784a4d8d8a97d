use crate::core::state::{Entities, TurnState, Value};
use crate::transport::TurnContext;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by handlers; borrows the turn for `'a`.
pub type HandlerFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// Implements one planner action.
///
/// Returns the continuation flag: `Ok(false)` stops the rest of the plan.
/// Errors halt the plan and are reported with the command index.
pub trait ActionHandler: Send + Sync {
    fn call<'a>(
        &'a self,
        ctx: &'a TurnContext,
        state: &'a mut TurnState,
        entities: &'a Entities,
        action: &'a str,
    ) -> HandlerFuture<'a, bool>;
}

/// A side function the model may call while a prompt is built.
pub trait FunctionHandler: Send + Sync {
    fn call<'a>(
        &'a self,
        ctx: &'a TurnContext,
        state: &'a mut TurnState,
        args: &'a Entities,
        name: &'a str,
    ) -> HandlerFuture<'a, Value>;
}

impl<F> ActionHandler for F
where
    F: for<'a> Fn(&'a TurnContext, &'a mut TurnState, &'a Entities, &'a str) -> HandlerFuture<'a, bool>
        + Send
        + Sync,
{
    fn call<'a>(
        &'a self,
        ctx: &'a TurnContext,
        state: &'a mut TurnState,
        entities: &'a Entities,
        action: &'a str,
    ) -> HandlerFuture<'a, bool> {
        self(ctx, state, entities, action)
    }
}

/// Adapter so closures can be registered as functions; a blanket impl would
/// overlap with the action one.
pub struct FnFunction<F>(pub F);

impl<F> FunctionHandler for FnFunction<F>
where
    F: for<'a> Fn(&'a TurnContext, &'a mut TurnState, &'a Entities, &'a str) -> HandlerFuture<'a, Value>
        + Send
        + Sync,
{
    fn call<'a>(
        &'a self,
        ctx: &'a TurnContext,
        state: &'a mut TurnState,
        args: &'a Entities,
        name: &'a str,
    ) -> HandlerFuture<'a, Value> {
        (self.0)(ctx, state, args, name)
    }
}
