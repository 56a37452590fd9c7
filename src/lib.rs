//! # item-gateway
//!
//! REST CRUD service for items with a cache-aside read path and graceful
//! degradation when its backends are missing.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── ItemService (service/)        cache-aside reads, invalidate on write
//!     │     ├── CacheProvider (cache/)  Redis | in-process | absent
//!     │     └── ItemStore (persistence/) PostgreSQL | in-memory fallback
//!     │
//!     └── DegradationPolicy (degradation.rs), settled once at startup by
//!         the retrying connection establisher (connect/)
//! ```

pub mod api;
pub mod app_state;
pub mod cache;
pub mod config;
pub mod connect;
pub mod degradation;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod server;
pub mod service;
