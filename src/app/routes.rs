use crate::core::handlers::HandlerFuture;
use crate::core::history::Tokenizer;
use crate::core::state::TurnState;
use crate::error::RegistryError;
use crate::transport::TurnContext;
use std::sync::Arc;

/// Handles one exact-text message without consulting the planner.
pub trait RouteHandler: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a TurnContext, state: &'a mut TurnState)
    -> HandlerFuture<'a, bool>;
}

impl<F> RouteHandler for F
where
    F: for<'a> Fn(&'a TurnContext, &'a mut TurnState) -> HandlerFuture<'a, bool> + Send + Sync,
{
    fn call<'a>(
        &'a self,
        ctx: &'a TurnContext,
        state: &'a mut TurnState,
    ) -> HandlerFuture<'a, bool> {
        self(ctx, state)
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Exact-text routes, matched trimmed and case-insensitively.
#[derive(Default, Clone)]
pub struct MessageRoutes {
    routes: Vec<(String, Arc<dyn RouteHandler>)>,
}

impl MessageRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        text: &str,
        handler: impl RouteHandler + 'static,
    ) -> Result<(), RegistryError> {
        let key = normalize(text);
        if key.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.routes.iter().any(|(existing, _)| *existing == key) {
            return Err(RegistryError::DuplicateHandler { name: key });
        }
        self.routes.push((key, Arc::new(handler)));
        Ok(())
    }

    /// Route for `text`, with its normalized pattern.
    pub fn find(&self, text: &str) -> Option<(&str, Arc<dyn RouteHandler>)> {
        let key = normalize(text);
        self.routes
            .iter()
            .find(|(pattern, _)| *pattern == key)
            .map(|(pattern, handler)| (pattern.as_str(), Arc::clone(handler)))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Route replying with the rendered conversation history.
pub fn history_route(
    max_tokens: usize,
    tokenizer: Arc<dyn Tokenizer>,
    separator: impl Into<String>,
) -> impl RouteHandler {
    let separator = separator.into();
    route_fn(move |ctx, state| {
        let rendered = state
            .history()
            .render(max_tokens, tokenizer.as_ref(), &separator);
        Box::pin(async move {
            let reply = if rendered.is_empty() {
                "No history yet.".to_string()
            } else {
                rendered
            };
            ctx.send_activity(&reply).await?;
            Ok(true)
        })
    })
}

fn route_fn<F>(handler: F) -> F
where
    F: for<'a> Fn(&'a TurnContext, &'a mut TurnState) -> HandlerFuture<'a, bool> + Send + Sync,
{
    handler
}
