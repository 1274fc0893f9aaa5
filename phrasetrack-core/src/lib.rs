//! # phrasetrack-core
//!
//! Application glue for the phrasetrack sequencer: configuration, logging,
//! project persistence and action dispatch, independent of any UI.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use phrasetrack_core::config::Config;
//! use phrasetrack_core::setup;
//! use phrasetrack_core::LocalDispatcher;
//! use phrasetrack_core::types::{Dispatcher, TransportAction, ViewCursor};
//!
//! phrasetrack_core::logging::init_logging(false);
//! let config = Config::load();
//!
//! // 1. Start the sequencer thread with an OSC connection to the engine
//! let handle = setup::start_sequencer(&config, setup::new_project(&config))?;
//!
//! // 2. Route input to it
//! let mut dispatcher = LocalDispatcher::new(&handle);
//! dispatcher.dispatch(&TransportAction::Toggle {
//!     cursor: ViewCursor::Song { track: 0, row: 0 },
//!     from_top: false,
//! });
//!
//! // 3. Render from the published state and feedback
//! let state = handle.playback_state();
//! for event in handle.drain_feedback() { /* ... */ }
//! ```

pub mod config;
pub mod dispatch;
pub mod logging;
pub mod persistence;
pub mod setup;

pub use dispatch::LocalDispatcher;
pub use phrasetrack_audio as audio;
pub use phrasetrack_types as types;
