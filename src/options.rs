//! DHCP fixed-part layout and option-list scanning.
//!
//! The engine treats DHCP as a 34-byte fixed prefix (through the first six
//! bytes of `chaddr`) followed by a variable area that is searched linearly
//! for the RFC 2131 magic cookie. Once the cookie is found, subsequent bytes
//! are walked as `(code, length, value)` triples into a map keyed by option
//! code; the value stays a borrowed view into the frame.
//!
//! Scanning tolerates malformed input: a missing cookie yields an empty map,
//! and an option whose declared length would overrun the buffer stops the
//! walk with a warning rather than failing the parse.
//!
//! # References
//!
//! - RFC 2131: Dynamic Host Configuration Protocol
//! - RFC 2132: DHCP Options and BOOTP Vendor Extensions

use std::collections::HashMap;

use tracing::{trace, warn};

/// Magic cookie marking the start of the DHCP option list.
pub const MAGIC_COOKIE: [u8; 4] = [0x63, 0x82, 0x53, 0x63];

/// Option code terminating the option list.
pub const END_OPTION: u8 = 0xff;

/// DHCP message-type option code, the one most callers look up.
pub const OPTION_MESSAGE_TYPE: u8 = 53;

const OP_SIZE: usize = 1;
const HTYPE_SIZE: usize = 1;
const HLEN_SIZE: usize = 1;
const HOPS_SIZE: usize = 1;
const XID_SIZE: usize = 4;
const SECS_SIZE: usize = 2;
const FLAGS_SIZE: usize = 2;
const ADDR_SIZE: usize = 4;
const CHADDR_SIZE: usize = 6;

pub(crate) const OP_OFFSET: usize = 0;
pub(crate) const XID_OFFSET: usize = OP_SIZE + HTYPE_SIZE + HLEN_SIZE + HOPS_SIZE;
pub(crate) const CIADDR_OFFSET: usize = XID_OFFSET + XID_SIZE + SECS_SIZE + FLAGS_SIZE;
pub(crate) const YIADDR_OFFSET: usize = CIADDR_OFFSET + ADDR_SIZE;
pub(crate) const SIADDR_OFFSET: usize = YIADDR_OFFSET + ADDR_SIZE;
pub(crate) const GIADDR_OFFSET: usize = SIADDR_OFFSET + ADDR_SIZE;
pub(crate) const CHADDR_OFFSET: usize = GIADDR_OFFSET + ADDR_SIZE;

/// Length of the fixed DHCP prefix this engine binds fields from.
///
/// Every scan bound derives from this constant.
pub const FIXED_HEADER_LEN: usize = CHADDR_OFFSET + CHADDR_SIZE;

/// Fixed-prefix overlay for a DHCP message.
#[derive(Debug, Clone, Copy)]
pub struct DhcpFixedHeader<'a> {
    data: &'a [u8],
}

impl<'a> DhcpFixedHeader<'a> {
    /// Overlays the prefix on `data`, or `None` if fewer than
    /// [`FIXED_HEADER_LEN`] bytes remain.
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.len() < FIXED_HEADER_LEN {
            return None;
        }
        Some(Self { data })
    }

    /// Message op code: 1 = BOOTREQUEST, 2 = BOOTREPLY.
    pub fn op(&self) -> u8 {
        self.data[OP_OFFSET]
    }

    /// Hardware address type; 1 for Ethernet.
    pub fn htype(&self) -> u8 {
        self.data[1]
    }

    /// Hardware address length; 6 for Ethernet.
    pub fn hlen(&self) -> u8 {
        self.data[2]
    }

    /// Relay hop count.
    pub fn hops(&self) -> u8 {
        self.data[3]
    }

    /// Transaction id chosen by the client.
    pub fn xid(&self) -> u32 {
        u32::from_be_bytes([
            self.data[XID_OFFSET],
            self.data[XID_OFFSET + 1],
            self.data[XID_OFFSET + 2],
            self.data[XID_OFFSET + 3],
        ])
    }

    /// Seconds elapsed since the client began acquisition.
    pub fn secs(&self) -> u16 {
        u16::from_be_bytes([self.data[8], self.data[9]])
    }

    /// Flags word; bit 15 is the broadcast flag.
    pub fn flags(&self) -> u16 {
        u16::from_be_bytes([self.data[10], self.data[11]])
    }

    /// Client hardware address (first six bytes of chaddr).
    pub fn chaddr(&self) -> [u8; 6] {
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&self.data[CHADDR_OFFSET..CHADDR_OFFSET + CHADDR_SIZE]);
        mac
    }
}

/// Internal record of one scanned option: its length and the absolute
/// frame offset of its value bytes. The map never holds a borrow of the
/// frame; views are materialized on lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OptionSlot {
    pub(crate) length: u8,
    pub(crate) offset: usize,
}

/// A DHCP option as seen by callers: code plus a borrowed value view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DhcpOptionRecord<'a> {
    /// Option code (RFC 2132 numbering).
    pub code: u8,
    /// The option's value bytes, borrowed from the frame.
    pub value: &'a [u8],
}

impl DhcpOptionRecord<'_> {
    /// Declared length of the value, as carried on the wire.
    pub fn length(&self) -> u8 {
        self.value.len() as u8
    }
}

/// Scans the option area of `frame` starting at `options_start`.
///
/// Looks for the magic cookie byte by byte, then walks TLV triples until the
/// end marker, the end of the buffer, or an option whose declared length
/// would overrun the buffer. Duplicate codes keep the last occurrence.
/// Returned offsets are absolute within `frame`.
pub(crate) fn scan_options(frame: &[u8], options_start: usize) -> HashMap<u8, OptionSlot> {
    let mut options = HashMap::new();
    let area = &frame[options_start..];

    let Some(cookie_at) = area
        .windows(MAGIC_COOKIE.len())
        .position(|window| window == MAGIC_COOKIE)
    else {
        trace!("no dhcp magic cookie in {} option bytes", area.len());
        return options;
    };

    let mut index = cookie_at + MAGIC_COOKIE.len();
    while index < area.len() {
        let code = area[index];

        if code == END_OPTION {
            break;
        }

        if index + 1 >= area.len() {
            warn!(code, "dhcp option list truncated before length byte");
            break;
        }

        let length = area[index + 1] as usize;

        if index + 2 + length > area.len() {
            warn!(
                code,
                length, "dhcp option overruns buffer, stopping option scan"
            );
            break;
        }

        options.insert(
            code,
            OptionSlot {
                length: length as u8,
                offset: options_start + index + 2,
            },
        );

        index += 2 + length;
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds an options area: `garbage` bytes, then the cookie, then `tail`.
    fn area_with_cookie(garbage: &[u8], tail: &[u8]) -> Vec<u8> {
        let mut area = garbage.to_vec();
        area.extend_from_slice(&MAGIC_COOKIE);
        area.extend_from_slice(tail);
        area
    }

    #[test]
    fn test_fixed_header_offsets() {
        assert_eq!(XID_OFFSET, 4);
        assert_eq!(CIADDR_OFFSET, 12);
        assert_eq!(YIADDR_OFFSET, 16);
        assert_eq!(SIADDR_OFFSET, 20);
        assert_eq!(GIADDR_OFFSET, 24);
        assert_eq!(CHADDR_OFFSET, 28);
        assert_eq!(FIXED_HEADER_LEN, 34);
    }

    #[test]
    fn test_fixed_header_accessors() {
        let mut data = [0u8; 34];
        data[0] = 1;
        data[1] = 1;
        data[2] = 6;
        data[3] = 2;
        data[4..8].copy_from_slice(&0xdeadbeefu32.to_be_bytes());
        data[8..10].copy_from_slice(&12u16.to_be_bytes());
        data[10..12].copy_from_slice(&0x8000u16.to_be_bytes());
        data[28..34].copy_from_slice(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);

        let dhcp = DhcpFixedHeader::new(&data).unwrap();
        assert_eq!(dhcp.op(), 1);
        assert_eq!(dhcp.htype(), 1);
        assert_eq!(dhcp.hlen(), 6);
        assert_eq!(dhcp.hops(), 2);
        assert_eq!(dhcp.xid(), 0xdeadbeef);
        assert_eq!(dhcp.secs(), 12);
        assert_eq!(dhcp.flags(), 0x8000);
        assert_eq!(dhcp.chaddr(), [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    }

    #[test]
    fn test_fixed_header_too_short() {
        assert!(DhcpFixedHeader::new(&[0u8; 33]).is_none());
    }

    #[test]
    fn test_scan_simple_option() {
        let area = area_with_cookie(&[], &[53, 1, 2, END_OPTION]);
        let options = scan_options(&area, 0);

        assert_eq!(options.len(), 1);
        let slot = options[&53];
        assert_eq!(slot.length, 1);
        assert_eq!(area[slot.offset], 2);
    }

    #[test]
    fn test_scan_cookie_after_garbage() {
        let area = area_with_cookie(&[0x00, 0x63, 0x82, 0x11], &[12, 3, b'f', b'o', b'o', 255]);
        let options = scan_options(&area, 0);

        let slot = options[&12];
        assert_eq!(slot.length, 3);
        assert_eq!(&area[slot.offset..slot.offset + 3], b"foo");
    }

    #[test]
    fn test_scan_respects_base_offset() {
        let mut frame = vec![0xee; 10];
        frame.extend_from_slice(&MAGIC_COOKIE);
        frame.extend_from_slice(&[53, 1, 5, 255]);

        let options = scan_options(&frame, 10);
        let slot = options[&53];
        assert_eq!(slot.offset, 16);
        assert_eq!(frame[slot.offset], 5);
    }

    #[test]
    fn test_scan_stops_at_end_marker() {
        let area = area_with_cookie(&[], &[53, 1, 1, 255, 12, 2, b'h', b'i']);
        let options = scan_options(&area, 0);

        assert!(options.contains_key(&53));
        assert!(!options.contains_key(&12));
    }

    #[test]
    fn test_scan_no_cookie_yields_nothing() {
        let area = [53u8, 1, 1, 255];
        assert!(scan_options(&area, 0).is_empty());
    }

    #[test]
    fn test_scan_last_duplicate_wins() {
        let area = area_with_cookie(&[], &[53, 1, 1, 53, 1, 3, 255]);
        let options = scan_options(&area, 0);

        let slot = options[&53];
        assert_eq!(area[slot.offset], 3);
    }

    #[test]
    fn test_scan_overlong_option_stops_walk() {
        // Declared length 200 with only 3 value bytes present.
        let area = area_with_cookie(&[], &[12, 200, 1, 2, 3]);
        let options = scan_options(&area, 0);
        assert!(options.is_empty());

        // Earlier well-formed options survive.
        let area = area_with_cookie(&[], &[53, 1, 1, 12, 200, 1, 2, 3]);
        let options = scan_options(&area, 0);
        assert_eq!(options.len(), 1);
        assert!(options.contains_key(&53));
    }

    #[test]
    fn test_scan_missing_length_byte() {
        let area = area_with_cookie(&[], &[12]);
        assert!(scan_options(&area, 0).is_empty());
    }

    #[test]
    fn test_scan_zero_length_option() {
        let area = area_with_cookie(&[], &[55, 0, 255]);
        let options = scan_options(&area, 0);
        assert_eq!(options[&55].length, 0);
    }

    #[test]
    fn test_scan_code_zero_is_ordinary_triple() {
        // Code 0 carries a length byte here, unlike RFC pad semantics.
        let area = area_with_cookie(&[], &[0, 1, 9, 53, 1, 2, 255]);
        let options = scan_options(&area, 0);
        assert_eq!(options.len(), 2);
        assert_eq!(area[options[&0].offset], 9);
        assert_eq!(area[options[&53].offset], 2);
    }
}
