//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated endpoint metadata (`ProviderDescriptor`) for the accounts
//! service and the catalog API. `strategy` defines [`ProviderStrategy`], an HTTP-client-agnostic
//! hook used by flows to map token endpoint failures into the gateway error taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
