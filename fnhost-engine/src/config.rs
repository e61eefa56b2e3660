//! Configuration resolver
//!
//! Selects, at process start, which handler calling convention drives the
//! dispatcher. Version 1 is a flat configuration with a single handler;
//! version 2 carries named actions with per-action formats, credentials, and
//! an option schema. Any other version is a fatal startup error. Once
//! resolved, the engine only sees the [`Contract`] hooks.

use async_trait::async_trait;
use fnhost_core::{EngineError, Format};
use futures::future::BoxFuture;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::request::LambdaRequest;
use crate::responder::Reply;

/// The user-supplied function hosted behind the engine
pub type Handler =
    Arc<dyn Fn(LambdaRequest) -> BoxFuture<'static, Result<Reply, EngineError>> + Send + Sync>;

/// Wrap an async function as a [`Handler`]
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(LambdaRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Reply, EngineError>> + Send + 'static,
{
    Arc::new(move |request| Box::pin(f(request)))
}

/// Lambda configuration supplied at process start
pub struct LambdaConfig {
    /// Calling convention version; defaults to 1
    pub version: u32,
    /// Declared input format (version 1)
    pub input: Option<Format>,
    /// Declared output format (version 1)
    pub output: Option<Format>,
    /// The handler (version 1)
    pub handler: Option<Handler>,
    /// Named actions (version 2)
    pub actions: Vec<ActionConfig>,
}

impl LambdaConfig {
    /// Flat version-1 configuration around a single handler
    pub fn v1(handler: Handler) -> Self {
        Self {
            version: 1,
            input: None,
            output: None,
            handler: Some(handler),
            actions: Vec::new(),
        }
    }

    /// Version-2 configuration around named actions
    pub fn v2(actions: Vec<ActionConfig>) -> Self {
        Self {
            version: 2,
            input: None,
            output: None,
            handler: None,
            actions,
        }
    }
}

/// One named action of a version-2 configuration
pub struct ActionConfig {
    pub name: String,
    /// Runs when the request path names no other action
    pub is_default: bool,
    pub input: Option<Format>,
    pub output: Option<Format>,
    /// Names of credentials the action requires (introspection only)
    pub credentials: Vec<String>,
    /// Option schema: option name to its description (introspection only)
    pub options: HashMap<String, String>,
    pub handler: Handler,
}

impl ActionConfig {
    pub fn new(name: impl Into<String>, handler: Handler) -> Self {
        Self {
            name: name.into(),
            is_default: false,
            input: None,
            output: None,
            credentials: Vec::new(),
            options: HashMap::new(),
            handler,
        }
    }
}

/// Read-only introspection metadata for one configured action.
///
/// Derived from the configuration; never consulted during dispatch.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApiDescription {
    pub name: String,
    #[serde(rename = "default")]
    pub is_default: bool,
    pub input: Format,
    pub output: Format,
    pub credentials: Vec<String>,
    pub options: HashMap<String, String>,
}

/// The calling convention the dispatcher drives.
///
/// `prepare` assigns the request's input format (and the action for version
/// 2) and reports the output format; `run` invokes the user handler. The
/// engine stays agnostic to which contract is active.
#[async_trait]
pub trait Contract: Send + Sync {
    fn prepare(&self, request: &mut LambdaRequest) -> Format;

    async fn run(&self, request: LambdaRequest) -> Result<Reply, EngineError>;

    fn describe(&self) -> Vec<ApiDescription>;
}

impl std::fmt::Debug for dyn Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Contract")
    }
}

/// Build the contract for a configuration.
///
/// Unrecognized versions are rejected here, at startup, instead of yielding
/// a service that never answers.
pub fn resolve(config: LambdaConfig) -> Result<Arc<dyn Contract>, EngineError> {
    match config.version {
        1 => Ok(Arc::new(V1Contract::new(config)?)),
        2 => Ok(Arc::new(V2Contract::new(config)?)),
        version => Err(EngineError::UnknownConfigVersion(version)),
    }
}

/// Version 1: one handler, flat input/output formats
struct V1Contract {
    input: Option<Format>,
    output: Option<Format>,
    handler: Handler,
}

impl V1Contract {
    fn new(config: LambdaConfig) -> Result<Self, EngineError> {
        let handler = config.handler.ok_or_else(|| {
            EngineError::InvalidConfig("version 1 configuration requires a handler".to_string())
        })?;
        Ok(Self {
            input: config.input,
            output: config.output,
            handler,
        })
    }
}

#[async_trait]
impl Contract for V1Contract {
    fn prepare(&self, request: &mut LambdaRequest) -> Format {
        request.input = self.input;
        self.output.unwrap_or_default()
    }

    async fn run(&self, request: LambdaRequest) -> Result<Reply, EngineError> {
        (self.handler)(request).await
    }

    fn describe(&self) -> Vec<ApiDescription> {
        vec![ApiDescription {
            name: "default".to_string(),
            is_default: true,
            input: self.input.unwrap_or_default(),
            output: self.output.unwrap_or_default(),
            credentials: Vec::new(),
            options: HashMap::new(),
        }]
    }
}

/// Version 2: named actions, selected by the first URL path segment
struct V2Contract {
    actions: Vec<ActionConfig>,
    default_index: usize,
}

impl V2Contract {
    fn new(config: LambdaConfig) -> Result<Self, EngineError> {
        if config.actions.is_empty() {
            return Err(EngineError::InvalidConfig(
                "version 2 configuration requires at least one action".to_string(),
            ));
        }
        let default_index = config
            .actions
            .iter()
            .position(|action| action.is_default)
            .unwrap_or(0);
        Ok(Self {
            actions: config.actions,
            default_index,
        })
    }

    fn select(&self, path: &str) -> &ActionConfig {
        let segment = path.trim_start_matches('/').split('/').next().unwrap_or("");
        self.actions
            .iter()
            .find(|action| action.name == segment)
            .unwrap_or(&self.actions[self.default_index])
    }
}

#[async_trait]
impl Contract for V2Contract {
    fn prepare(&self, request: &mut LambdaRequest) -> Format {
        let action = self.select(request.uri.path());
        request.action = Some(action.name.clone());
        request.input = action.input;
        action.output.unwrap_or_default()
    }

    async fn run(&self, request: LambdaRequest) -> Result<Reply, EngineError> {
        let action = match request.action.as_deref() {
            Some(name) => self
                .actions
                .iter()
                .find(|action| action.name == name)
                .unwrap_or(&self.actions[self.default_index]),
            None => &self.actions[self.default_index],
        };
        (action.handler)(request).await
    }

    fn describe(&self) -> Vec<ApiDescription> {
        self.actions
            .iter()
            .enumerate()
            .map(|(index, action)| ApiDescription {
                name: action.name.clone(),
                is_default: index == self.default_index,
                input: action.input.unwrap_or_default(),
                output: action.output.unwrap_or_default(),
                credentials: action.credentials.clone(),
                options: action.options.clone(),
            })
            .collect()
    }
}
