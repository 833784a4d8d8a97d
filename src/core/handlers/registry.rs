use super::traits::{ActionHandler, FnFunction, FunctionHandler, HandlerFuture};
use crate::core::state::{Entities, TurnState, Value};
use crate::error::RegistryError;
use crate::transport::TurnContext;
use std::collections::HashMap;
use std::sync::Arc;

/// Action name that, when registered, replaces the default SAY emission.
pub const SAY_COMMAND_ACTION: &str = "__SAY__";

#[derive(Clone)]
enum Registered {
    Action(Arc<dyn ActionHandler>),
    Function(Arc<dyn FunctionHandler>),
}

/// Name → handler table, filled during setup and read-only afterwards.
///
/// Actions and functions share one namespace so a name always means exactly
/// one thing to the planner.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Registered>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, name: &str, handler: Registered) -> Result<(), RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.handlers.contains_key(name) {
            return Err(RegistryError::DuplicateHandler {
                name: name.to_string(),
            });
        }
        self.handlers.insert(name.to_string(), handler);
        Ok(())
    }

    /// Register an action. Fails if `name` is already bound.
    pub fn register_action(
        &mut self,
        name: &str,
        handler: impl ActionHandler + 'static,
    ) -> Result<(), RegistryError> {
        self.insert(name, Registered::Action(Arc::new(handler)))
    }

    /// Closure form of [`Self::register_action`].
    pub fn register_action_fn<F>(&mut self, name: &str, handler: F) -> Result<(), RegistryError>
    where
        F: for<'a> Fn(&'a TurnContext, &'a mut TurnState, &'a Entities, &'a str) -> HandlerFuture<'a, bool>
            + Send
            + Sync
            + 'static,
    {
        self.insert(name, Registered::Action(Arc::new(handler)))
    }

    /// Register a model-callable function. Fails if `name` is already bound.
    pub fn register_function(
        &mut self,
        name: &str,
        handler: impl FunctionHandler + 'static,
    ) -> Result<(), RegistryError> {
        self.insert(name, Registered::Function(Arc::new(handler)))
    }

    /// Closure form of [`Self::register_function`].
    pub fn register_function_fn<F>(&mut self, name: &str, handler: F) -> Result<(), RegistryError>
    where
        F: for<'a> Fn(&'a TurnContext, &'a mut TurnState, &'a Entities, &'a str) -> HandlerFuture<'a, Value>
            + Send
            + Sync
            + 'static,
    {
        self.insert(name, Registered::Function(Arc::new(FnFunction(handler))))
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ActionHandler>, RegistryError> {
        match self.handlers.get(name) {
            Some(Registered::Action(handler)) => Ok(Arc::clone(handler)),
            _ => Err(RegistryError::UnknownAction {
                name: name.to_string(),
            }),
        }
    }

    pub fn resolve_function(&self, name: &str) -> Result<Arc<dyn FunctionHandler>, RegistryError> {
        match self.handlers.get(name) {
            Some(Registered::Function(handler)) => Ok(Arc::clone(handler)),
            _ => Err(RegistryError::UnknownFunction {
                name: name.to_string(),
            }),
        }
    }

    /// Handler overriding the default SAY behaviour, if one was registered.
    pub fn say_override(&self) -> Option<Arc<dyn ActionHandler>> {
        self.resolve(SAY_COMMAND_ACTION).ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Sorted action names, reserved names excluded. Suitable for prompts.
    pub fn action_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .handlers
            .iter()
            .filter(|(name, handler)| {
                matches!(handler, Registered::Action(_)) && name.as_str() != SAY_COMMAND_ACTION
            })
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .handlers
            .iter()
            .filter(|(_, handler)| matches!(handler, Registered::Function(_)))
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}
