//! `orgchart-api` — HTTP surface for the company directory.
//!
//! HTTP Basic authentication resolves a principal per request; every company
//! operation then passes through the authorization-gated service before it
//! reaches storage.

pub mod app;
pub mod context;
pub mod middleware;
