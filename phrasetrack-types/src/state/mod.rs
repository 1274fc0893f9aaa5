pub mod chain;
pub mod phrase;
pub mod playback;
pub mod project;
pub mod song;

pub use chain::*;
pub use phrase::*;
pub use playback::*;
pub use project::*;
pub use song::*;
