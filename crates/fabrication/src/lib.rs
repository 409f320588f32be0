//! Fabrication request/response protocol
//!
//! The pool replenishes itself by asking an external worker to fabricate new
//! provider accounts. The exchange is asynchronous and correlated logically:
//! an outbound request carries a caller-generated token, and the eventual
//! response (which may never arrive) echoes it back. This crate owns the wire
//! contract:
//!
//! - outbound message construction ([`FabricateRequest`]),
//! - inbound envelope validation ([`decode_envelope`]),
//! - mapping of `account_response` payloads into domain outcomes
//!   ([`map_account_response`]),
//! - the broker-agnostic transport seams ([`FabricationProducer`],
//!   [`FabricationConsumer`]).
//!
//! Transport mechanics (exchanges, queues, delivery guarantees) live behind
//! the traits; only the logical contract is fixed here.

mod protocol;
mod response;
mod transport;

pub use protocol::{
    CorrelationId, Envelope, FabricateRequest, InboundEvent, OutboundEvent, ProtocolError,
    decode_envelope,
};
pub use response::{FabricationOutcome, FabricationStatus, map_account_response};
pub use transport::{FabricationConsumer, FabricationProducer, TransportError};
