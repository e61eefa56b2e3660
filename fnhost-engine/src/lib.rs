//! Request lifecycle engine for fnhost
//!
//! Turns a single user-supplied function into a minimal HTTP service. The
//! engine owns method routing, CORS, body decoding/encoding by declared
//! format, trace-id propagation, and per-request logging; the handler author
//! only writes business logic.
//!
//! Control flow: inbound request → dispatcher → (preflight | documentation
//! redirect | 405 | execute). The execute path sets the CORS header, runs
//! the contract's preparation hook, reads and decodes the body, invokes the
//! handler under a deadline, and completes the response exactly once.

pub mod config;
pub mod dispatch;
pub mod request;
pub mod responder;
pub mod server;

pub use config::{handler_fn, resolve, ActionConfig, ApiDescription, Contract, Handler, LambdaConfig};
pub use request::LambdaRequest;
pub use responder::{Completion, Reply, Responder};
pub use server::{EngineState, HttpServer, ServerConfig};
