// src/debatejudge/mod.rs

pub mod clients;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod error;
pub mod evaluator;
pub mod event;
pub mod executor;
pub mod http_client_pool;
pub mod judge;
pub mod orchestrator;
pub mod remote_agent;
pub mod request;
pub mod result;
pub mod state;
pub mod transcript;

pub use evaluator::DebateEvaluator;
pub use executor::DebateExecutor;
