//! JSON-RPC gateway to chain endpoints.
//!
//! The tracker talks to the chain exclusively through the [`RpcGateway`]
//! trait; [`HttpGateway`] is the production implementation (JSON-RPC 2.0
//! over HTTP with request batching and bounded timeouts). Method names and
//! response shapes are selected by the network's [`vela_types::ChainKind`].

pub mod error;
pub mod gateway;
pub mod http;

pub use error::RpcError;
pub use gateway::{HeightTag, NonceTag, RpcGateway};
pub use http::HttpGateway;
