//! # oxmatch
//!
//! A zero-copy, layered packet parser and OXM field-binding engine for SDN
//! data paths.
//!
//! ## Features
//!
//! - Layered parsing: Ethernet, 802.1Q, IPv4, ARP, TCP, UDP, DHCP options
//! - Uniform field addressing via OXM basic-match ids
//! - Masked load and in-place read-modify-write of individual fields
//! - Borrowed frame buffer: parsing computes offsets, never copies payload
//! - Truncation-tolerant: short or malformed packets stop the descent,
//!   they never fail the parse
//!
//! ## Quick Start
//!
//! ```
//! use oxmatch::{OxmField, ParsedPacket};
//!
//! # fn main() -> oxmatch::Result<()> {
//! // An ARP request as received, with its ingress port.
//! let mut frame = [
//!     0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02, 0x00, 0x00, 0x00, 0x00, 0x01,
//!     0x08, 0x06, // ARP
//!     0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01, // ethernet/ipv4, request
//!     0x02, 0x00, 0x00, 0x00, 0x00, 0x01, 10, 0, 0, 1, // sender
//!     0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 10, 0, 0, 2, // target
//! ];
//!
//! let packet = ParsedPacket::parse(&mut frame, 1)?;
//! assert_eq!(packet.value(OxmField::ArpOp)?, 1);
//! assert_eq!(packet.value(OxmField::ArpTpa)?, 0x0a000002);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`ParsedPacket`] - Layered dispatcher, field accessor, and serializer
//! - [`OxmField`] - The supported match-field namespace with wire widths
//! - [`BindingTable`] - Field-to-location slots with bind/rebind contracts
//! - Header overlays ([`headers`]) - Zero-copy big-endian wire readers
//! - [`DhcpOptionRecord`] - Borrowed view of one scanned DHCP option

pub mod bindings;
pub mod error;
pub mod field;
pub mod headers;
pub mod options;
pub mod packet;

pub use bindings::{Binding, BindingTable, FieldLocation};
pub use error::{Error, Result};
pub use field::OxmField;
pub use options::DhcpOptionRecord;
pub use packet::ParsedPacket;
