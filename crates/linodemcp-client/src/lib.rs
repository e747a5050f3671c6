//! # linodemcp-client
//!
//! Typed access to the Linode REST API (v4) for the linodemcp tool handlers.
//!
//! The API surface is split into one async trait per resource family
//! ([`ReferenceApi`], [`InstanceApi`], [`DomainApi`], ...). [`UpstreamClient`]
//! combines them and is what an account holds; code that only needs one
//! family (the reference cache, for instance) can depend on that trait alone.
//!
//! [`HttpClient`] is the production implementation. With the `fake` feature
//! enabled, [`fake::FakeClient`] provides an in-memory implementation with
//! per-operation call counters for tests.
//!
//! ```ignore
//! use linodemcp_client::{ClientFactory, Credential, HttpClientFactory};
//! use linodemcp_core::UpstreamConfig;
//!
//! let factory = HttpClientFactory::new(UpstreamConfig::default());
//! let client = factory.connect(&Credential::new(token))?;
//! let regions = client.list_regions().await?;
//! ```

pub mod api;
pub mod credential;
pub mod error;
#[cfg(feature = "fake")]
pub mod fake;
pub mod http;
pub mod models;

pub use api::{
    ClientFactory, DatabaseApi, DomainApi, FirewallApi, InstanceApi, NetworkingApi, ProfileApi,
    ReferenceApi, StackScriptApi, UpstreamClient,
};
pub use credential::Credential;
pub use error::UpstreamError;
pub use http::{HttpClient, HttpClientFactory};
pub use models::*;
