#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
#![deny(unused_doc_comments)]
//! # Dispatch Console
//!
//! > **The coordination engine behind a restaurant delivery-dispatch console.**
//!
//! Two things in a dispatch console are hard to get right, and both come down
//! to asynchronous answers arriving out of order:
//!
//! - turning bursts of keystrokes into suggestions from slow lookup services
//!   without ever showing an answer to a question the user no longer asks, and
//! - keeping a live courier map current from a polled endpoint without
//!   fighting the user's pan and zoom.
//!
//! ## 🏗️ Design
//!
//! ### Latest wins, always
//! Every asynchronous call is tagged when it is issued. Free-text fields use a
//! [`SequenceCounter`](framework::SequenceCounter): only the latest tag may be
//! applied. Polled resources use a [`GenerationGate`](framework::GenerationGate):
//! an answer is applied unless a later one already was. Superseded answers are
//! dropped on arrival; in-flight calls are never relied on to be cancelled.
//!
//! ### One resolver, many fields
//! A [`QueryResolver`](framework::QueryResolver) is an actor task that owns a
//! field's debounce timer, counter and suggestions. Street, neighborhood, city,
//! customer, menu item and tracking search are all the same resolver with a
//! different [`Fetcher`](framework::Fetcher).
//!
//! ### Draw once, then only move the courier
//! A [`LiveTrackingSession`](tracking::LiveTrackingSession) draws the origin,
//! stops and route once and fits the viewport once. Refreshes touch the courier
//! marker and nothing else.
//!
//! ### Observability
//! `tracing` everywhere with structured fields (`source_id`, `sequence`,
//! `order_id`, `generation`). See [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! - **Role**: debounced, staleness-safe resolution and the ordering guards.
//! - **Key items**: [`QueryResolver`](framework::QueryResolver),
//!   [`ResolverClient`](framework::ResolverClient), [`mock`](framework::mock).
//!
//! ### 2. The Lookups ([`address`], [`search`])
//! - **Role**: postal code and fuzzy place lookup for the address form;
//!   customer, menu and tracking search.
//! - **Key items**: [`AddressLookupPipeline`](address::AddressLookupPipeline),
//!   [`AddressForm`](address::AddressForm).
//!
//! ### 3. The Live Views ([`tracking`], [`polling`], [`geometry`])
//! - **Role**: the tracking session state machine, the fixed-interval streams
//!   and the encoded route codec.
//! - **Key items**: [`PollingLoop`](polling::PollingLoop),
//!   [`DashboardStore`](polling::DashboardStore), [`decode`](geometry::decode).
//!
//! ### 4. The Interface ([`clients`], [`model`])
//! - **Role**: typed HTTP clients over an injectable transport, and the wire
//!   records they return.
//!
//! ### 5. The Orchestrator ([`lifecycle`], [`config`])
//! - **Role**: wires transports, resolvers and streams from a
//!   [`ConsoleConfig`](config::ConsoleConfig); graceful shutdown.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Postal code lookup
//! RUST_LOG=info cargo run -- postal 14090-000
//!
//! # Poll the dashboard three times
//! RUST_LOG=info cargo run -- dashboard --ticks 3
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod address;
pub mod clients;
pub mod config;
pub mod error;
pub mod framework;
pub mod geometry;
pub mod lifecycle;
pub mod model;
pub mod polling;
pub mod search;
pub mod text;
pub mod tracking;
