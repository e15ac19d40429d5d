//! Domain entities for RemoteBrain.
//!
//! This module contains pure input logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain** (or "entities" layer).  Domain code:
//!
//! - Contains the core rules of the application.
//! - Has **no** imports from OS APIs, network libraries, or UI frameworks.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Here the domain is the language of user input: what a finger on glass
//! *means* ([`gesture`]) and the transport-agnostic intents it produces
//! ([`intent`]).  Both encoders (HID bytes and JSON envelopes) depend on the
//! domain, but the domain never depends on them.

/// Transport-agnostic input intents.
pub mod intent;

/// Touch sample stream to intent state machine.
///
/// See [`gesture::GestureInterpreter`] for the main type.
pub mod gesture;
