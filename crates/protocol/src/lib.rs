//! Wire protocol between the client and the game server.
//!
//! Every message is a single JSON text frame tagged with `packet_type`.
//! Inbound frames go through an explicit [`decode`] step into the closed
//! [`InboundPacket`] enum; outbound frames are built as [`OutboundPacket`]
//! values and serialized with [`OutboundPacket::encode`].
//!
//! # Invariants
//! - Decoding never panics; every failure is a typed [`DecodeError`].
//! - An unrecognized discriminant is [`DecodeError::UnknownPacketType`], not
//!   a JSON error, so callers can log and ignore it.

pub mod inbound;
pub mod outbound;

pub use inbound::{DecodeError, InboundPacket, decode};
pub use outbound::{HEARTBEAT, OutboundPacket, WireVec2};
