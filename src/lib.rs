//! Client-side data layer for the H2Notifier dashboard: a normalized HTTP
//! adapter, one service per backend resource, and a query/mutation cache
//! that keeps views consistent after writes.

pub mod app;
pub mod cache;
pub mod common;
pub mod config;
pub mod hooks;
pub mod network;
pub mod services;
pub mod ui;

pub use app::AppContext;
pub use common::{ApiError, Result};
