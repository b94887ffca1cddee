//! Wire records exchanged with the console backend and the lookup providers.

pub mod dashboard;
pub mod suggestion;
pub mod tracking;

pub use dashboard::*;
pub use suggestion::*;
pub use tracking::*;
