pub mod action_executor;
pub mod builtin_commands;
pub mod catalog_store;
pub mod catalog_sync;
pub mod command_registry;
pub mod config;
pub mod contract;
pub mod core_service;
pub mod logging;
pub mod model;
pub mod provider;
pub mod runtime;
pub mod scheduler;
pub mod search;
pub mod transport;
