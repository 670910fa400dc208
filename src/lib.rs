//! Offline caching coordinator.
//!
//! The coordinator sits between a host runtime and the network: the host
//! delivers lifecycle and fetch events, the coordinator answers them from
//! named cache generations, the network, or a blend of both. Three serving
//! strategies cover the usual offline-first split: cache-first for immutable
//! assets, network-first for backend traffic, stale-while-revalidate for
//! navigations and everything else.

pub mod cache;
pub mod config;
pub mod event;
pub mod fetch;
pub mod http;
pub mod lifecycle;
pub mod logging;
pub mod notify;
pub mod router;
pub mod worker;

pub use cache::{CacheLayer, CacheStorage, CachedResponse, MemoryStorage, ServeSource, Served, SqliteStorage};
pub use config::Config;
pub use event::Event;
pub use fetch::{Fetcher, HttpFetcher};
pub use http::{Method, Request, RequestMode, Response};
pub use notify::{Host, NoopHost, NoopSync, Notification, SyncTarget};
pub use router::{Matcher, Route, Router, Strategy};
pub use worker::{FetchOutcome, ServiceWorker};
