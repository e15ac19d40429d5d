//! Session protocol: JSON envelopes, payload types, pairing codes and the
//! device-side session state machine.

pub mod codec;
pub mod messages;
pub mod pairing;
pub mod session;

pub use codec::{decode_envelope, encode_envelope, Envelope, ProtocolError};
pub use messages::*;
pub use pairing::{InvalidPairingCode, PairingCode};
pub use session::{SessionEngine, SessionError, SessionEvent, SessionState};
