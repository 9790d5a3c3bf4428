//! HTTP handlers.

pub mod generate;
pub mod health;
pub mod progress;
pub mod video;

pub use generate::generate;
pub use health::health;
pub use progress::get_progress;
pub use video::get_video;
