//! HTTP API: server, routing, session cookies and the live feedback channel.

pub mod app;
pub mod context;
pub mod live;
pub mod middleware;
pub mod session;
