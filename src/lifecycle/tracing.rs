//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter whose
//! level comes from `RUST_LOG`. Module paths are hidden (`with_target(false)`);
//! the structured fields already say which field, order or resource a line is
//! about.
//!
//! ## What Gets Traced
//!
//! | Level | Events |
//! |-------|--------|
//! | `info` | Resolver start/shutdown, session open/close, polling mount/unmount, new active orders, dispatch summary |
//! | `warn` | Degraded paths: failed fetches, unreachable registry, malformed route, disconnected dashboard |
//! | `debug` | Every fetch issued and applied, stale results discarded, HTTP requests |
//!
//! ## Usage
//!
//! ```bash
//! # Lifecycle only
//! RUST_LOG=info dispatch-console dashboard --ticks 3
//!
//! # Watch stale completions being dropped
//! RUST_LOG=dispatch_console::framework=debug dispatch-console search customer an ana
//! ```
//!
//! With `RUST_LOG=debug` a keystroke burst reads like this:
//!
//! ```text
//! INFO Resolver started source_id="customer"
//! DEBUG Fetch issued source_id="customer" sequence=1 text="ana"
//! DEBUG Result applied source_id="customer" sequence=1 count=3
//! ```

/// Installs the global subscriber. Call once, at startup.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
