//! Session: one connection's client state and the loop that drives it.
//!
//! A [`Session`] owns the world mirror, applies inbound packets, advances
//! the local player and emits outbound intents. A [`FrameDriver`] runs the
//! fixed frame order (pump, render, update, tickers) over any
//! [`Transport`] and [`Renderer`](tileworld_render::Renderer).
//!
//! # Invariants
//! - Inbound frames are applied on the driving thread between frames, so
//!   the world needs no synchronization.
//! - Protocol problems are logged and counted, never propagated.
//! - A closed transport ends the session; there is no reconnect.

pub mod chat;
pub mod config;
pub mod driver;
pub mod error;
pub mod frame_stats;
pub mod session;
pub mod ticker;
pub mod transport;

pub use chat::{ChatLine, ChatLog, ChatSource};
pub use config::{ClientConfig, ConfigError};
pub use driver::FrameDriver;
pub use error::SessionError;
pub use frame_stats::{FrameTimer, SessionStats};
pub use session::{Session, SessionState};
pub use ticker::Ticker;
pub use transport::{MemoryTransport, Transport, TransportError};
