//! Tool-call gateway: wire protocol, transport loop, and method dispatch.

pub mod protocol;

mod dispatch;
mod transport;

pub use transport::run;
