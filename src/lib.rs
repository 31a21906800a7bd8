//! # Swapdeck
//!
//! A real-time safe audio file player core with lock-free source
//! hot-swapping.
//!
//! A control thread submits URLs/paths to load; a dedicated loader
//! thread does the blocking open/decode work; the audio callback swaps
//! in finished sources and renders them without ever blocking,
//! allocating, or taking a lock. Replaced sources are destroyed by a
//! housekeeping thread, never on the real-time path.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use swapdeck::{AudioEngine, FilePlayer, PlayerDesc, SymphoniaLoader};
//!
//! let desc = PlayerDesc::default();
//! let (mut player, renderer) = FilePlayer::new(desc.clone(), Arc::new(SymphoniaLoader))?;
//!
//! // The renderer moves into the audio callback.
//! let mut engine = AudioEngine::new(desc);
//! engine.start(renderer)?;
//!
//! // Everything on the control side is non-blocking.
//! player.submit_load("track.wav");
//! player.set_playing(true);
//!
//! if let Some(active) = player.active_source() {
//!     println!("playing {} at {} Hz", active.identifier, active.sample_rate);
//! }
//! # Ok::<(), swapdeck::SwapdeckError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`FilePlayer`]**: control-thread facade — submit loads, set the
//!   desired play state, read the active-source snapshot
//! - **[`Renderer`]**: the real-time half — drains finished loads,
//!   swaps the active source, renders each block
//! - **[`AudioSourceLoader`]**: trait boundary to the decoding
//!   collaborator; [`SymphoniaLoader`] is the built-in implementation
//! - **[`ReclamationPool`]**: deferred destruction of retired sources,
//!   swept off the real-time thread
//! - **[`spsc`]**: the bounded lock-free queues every hand-off rides on
//!
//! ## Architecture
//!
//! Three independently scheduled threads — control, loader, audio — plus
//! a low-frequency housekeeping thread. Every cross-thread hand-off is a
//! dedicated bounded SPSC queue; a full queue drops the item and bumps a
//! diagnostics counter rather than blocking. Sources are
//! reference-counted; the pool holds a reference to every loaded source
//! so the audio thread can drop its own references freely.

pub mod audio_data;
pub mod background;
pub mod config;
pub mod diag;
pub mod engine;
pub mod error;
pub mod player;
pub mod reclaim;
pub mod render;
pub mod source;
pub mod spsc;

pub use audio_data::{AudioData, AudioSourceLoader, SymphoniaLoader};
pub use background::{BackgroundLoader, LoadSubmitter};
pub use config::PlayerDesc;
pub use diag::DiagnosticsSnapshot;
pub use engine::AudioEngine;
pub use error::{Result, SwapdeckError};
pub use player::{ActiveSource, FilePlayer};
pub use reclaim::{Housekeeper, PoolInserter, ReclamationPool};
pub use render::Renderer;
pub use source::SourceHandle;
