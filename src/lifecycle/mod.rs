//! # Console Lifecycle & Orchestration
//!
//! Individual resolvers, sessions and streams are small; wiring them to the
//! right transports and shutting them down in order is what this module is
//! for.
//!
//! **Key Responsibilities:**
//! 1. **Transport setup** - the console API gets the bearer token, the public
//!    lookup providers do not
//! 2. **Resolver spawning** - one actor task per search field
//! 3. **Polling** - dashboard stream and tracking views on demand
//! 4. **Graceful Shutdown** - drop the clients, await the resolver tasks
//! 5. **Observability Setup** - [`setup_tracing`]
//!
//! ```rust,ignore
//! setup_tracing();
//! let system = ConsoleSystem::new(ConsoleConfig::load(None)?)?;
//! let dashboard = system.mount_dashboard();
//! // ...
//! dashboard.unmount().await;
//! system.shutdown().await?;
//! ```

pub mod console_system;
pub mod tracing;

pub use console_system::{ConsoleSystem, SearchField, TrackingHandle};
pub use self::tracing::setup_tracing;
