pub mod bridge;
pub mod codec;
pub mod config;
pub mod contracts;
pub mod ctx;
pub mod error;
pub mod models;
pub mod queries;
pub mod rpc;
