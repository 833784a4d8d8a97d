use super::application::Application;
use super::routes::{MessageRoutes, RouteHandler};
use crate::config::{Config, ExecutionConfig, HistoryConfig};
use crate::core::handlers::{ActionHandler, FunctionHandler, HandlerFuture, HandlerRegistry};
use crate::core::history::tokenizer_for;
use crate::core::planner::Planner;
use crate::core::state::{Entities, StateLoader, TurnState, Value};
use crate::core::storage::Storage;
use crate::error::{ConfigError, RegistryError, StateError, TurnError};
use crate::runtime::observability::{NoopObserver, Observer, create_observer};
use crate::transport::{Activity, TurnContext};
use std::sync::Arc;

/// Wires handlers, routes and collaborators together once at startup.
///
/// Registration errors surface from the registering call; nothing is
/// registered after [`ApplicationBuilder::build`].
pub struct ApplicationBuilder {
    loader: StateLoader,
    planner: Arc<dyn Planner>,
    observer: Arc<dyn Observer>,
    registry: HandlerRegistry,
    routes: MessageRoutes,
    history: HistoryConfig,
    execution: ExecutionConfig,
}

impl ApplicationBuilder {
    pub fn new(storage: Arc<dyn Storage>, planner: Arc<dyn Planner>) -> Self {
        Self {
            loader: StateLoader::new(storage),
            planner,
            observer: Arc::new(NoopObserver),
            registry: HandlerRegistry::new(),
            routes: MessageRoutes::new(),
            history: HistoryConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }

    /// Take history, execution, observer and key namespace settings from `config`.
    pub fn from_config(
        config: &Config,
        storage: Arc<dyn Storage>,
        planner: Arc<dyn Planner>,
    ) -> Self {
        let mut builder = Self::new(storage, planner)
            .history(config.history.clone())
            .execution(config.execution.clone())
            .observer(create_observer(&config.observability));
        if let Some(bot_id) = &config.bot_id {
            builder.loader = builder.loader.with_namespace(bot_id.clone());
        }
        builder
    }

    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }

    pub fn execution(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.loader = self.loader.with_namespace(namespace);
        self
    }

    /// Extra persistent layer keyed by `key_fn`.
    pub fn scope(
        mut self,
        name: impl Into<String>,
        key_fn: impl Fn(&Activity) -> String + Send + Sync + 'static,
    ) -> Result<Self, StateError> {
        self.loader = self.loader.with_scope(name, key_fn)?;
        Ok(self)
    }

    pub fn action<F>(mut self, name: &str, handler: F) -> Result<Self, RegistryError>
    where
        F: for<'a> Fn(&'a TurnContext, &'a mut TurnState, &'a Entities, &'a str) -> HandlerFuture<'a, bool>
            + Send
            + Sync
            + 'static,
    {
        self.registry.register_action_fn(name, handler)?;
        Ok(self)
    }

    pub fn action_handler(
        mut self,
        name: &str,
        handler: impl ActionHandler + 'static,
    ) -> Result<Self, RegistryError> {
        self.registry.register_action(name, handler)?;
        Ok(self)
    }

    pub fn function<F>(mut self, name: &str, handler: F) -> Result<Self, RegistryError>
    where
        F: for<'a> Fn(&'a TurnContext, &'a mut TurnState, &'a Entities, &'a str) -> HandlerFuture<'a, Value>
            + Send
            + Sync
            + 'static,
    {
        self.registry.register_function_fn(name, handler)?;
        Ok(self)
    }

    pub fn function_handler(
        mut self,
        name: &str,
        handler: impl FunctionHandler + 'static,
    ) -> Result<Self, RegistryError> {
        self.registry.register_function(name, handler)?;
        Ok(self)
    }

    /// Handle messages equal to `text` (trimmed, any case) without the planner.
    pub fn route(
        mut self,
        text: &str,
        handler: impl RouteHandler + 'static,
    ) -> Result<Self, RegistryError> {
        self.routes.add(text, handler)?;
        Ok(self)
    }

    pub fn build(self) -> Result<Application, TurnError> {
        let tokenizer = tokenizer_for(&self.history.tokenizer).ok_or_else(|| {
            ConfigError::Validation(format!(
                "unknown history tokenizer \"{}\"",
                self.history.tokenizer
            ))
        })?;
        if self.history.max_entries == 0 {
            return Err(
                ConfigError::Validation("history.max_entries must be at least 1".into()).into(),
            );
        }

        tracing::debug!(
            planner = self.planner.name(),
            observer = self.observer.name(),
            handlers = self.registry.len(),
            routes = self.routes.len(),
            "application built"
        );

        Ok(Application {
            loader: self.loader.with_history_limit(self.history.max_entries),
            planner: self.planner,
            observer: self.observer,
            registry: self.registry,
            routes: self.routes,
            tokenizer: Arc::from(tokenizer),
            history: self.history,
            execution: self.execution,
        })
    }
}
