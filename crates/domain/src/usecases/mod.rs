//! Application use cases / business logic

pub mod caption;
pub mod compose;
pub mod sync;

pub use caption::{CaptionConfig, CaptionUseCase};
pub use compose::{ComposeConfig, Composer};
pub use sync::{SyncEngine, SyncEngineConfig, SyncError};
