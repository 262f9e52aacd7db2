//! Layered packet parsing and in-place field access.
//!
//! [`ParsedPacket::parse`] runs the whole layer dispatch synchronously over a
//! borrowed frame buffer: L2 (Ethernet, optional 802.1Q tag), L3 (IPv4 or
//! ARP), L4 (TCP or UDP), and the DHCP option list for client-to-server
//! DHCP traffic. Each stage checks the remaining length before overlaying a
//! header and records where the interesting fields live; nothing is copied
//! out of the buffer.
//!
//! Truncated or unrecognized input is routine, not an error: a stage that
//! cannot proceed simply stops descending and leaves deeper fields unbound.
//! The `Result` returned by `parse` and the accessors only ever reports
//! violated binding contracts — engine or caller bugs.
//!
//! After the parse pass, [`load`](ParsedPacket::load) and
//! [`modify`](ParsedPacket::modify) read and rewrite individual fields
//! through the binding table, and [`serialize_to`](ParsedPacket::serialize_to)
//! copies the (possibly mutated) frame back out for re-injection.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::bindings::{Binding, BindingTable, FieldLocation};
use crate::error::{Error, Result};
use crate::field::OxmField;
use crate::headers::{
    ArpHeader, Dot1qHeader, EthernetHeader, Ipv4Header, TcpHeader, UdpHeader, ETHERTYPE_ARP,
    ETHERTYPE_IPV4, ETHERTYPE_IPV6, ETHERTYPE_VLAN, IP_PROTO_ICMP, IP_PROTO_TCP, IP_PROTO_UDP,
};
use crate::options::{self, scan_options, DhcpFixedHeader, DhcpOptionRecord, OptionSlot};

/// UDP source port of a DHCP client request.
const DHCP_CLIENT_PORT: u16 = 68;

/// UDP destination port of a DHCP server.
const DHCP_SERVER_PORT: u16 = 67;

fn frame_loc(offset: usize, len: usize) -> Binding {
    Binding::Bound(FieldLocation::Frame { offset, len })
}

/// A parsed view over one frame: bindings, option map, and the buffer itself.
///
/// The lifetime ties the view to the caller-owned buffer; the view can never
/// outlive it. Field mutation through [`modify`](Self::modify) writes into
/// that buffer directly, so a parser holds the only reference to it for the
/// duration of processing.
#[derive(Debug)]
pub struct ParsedPacket<'a> {
    data: &'a mut [u8],
    /// Big-endian scratch copy of the ingress port; IN_PORT binds here.
    in_port: [u8; 4],
    bindings: BindingTable,
    dhcp_options: HashMap<u8, OptionSlot>,
    vlan_tagged: bool,
}

impl<'a> ParsedPacket<'a> {
    /// Parses `data` as a frame that arrived on `in_port`.
    ///
    /// Binds IN_PORT unconditionally, then descends through the layers as
    /// far as the buffer allows. Short, truncated, or unrecognized packets
    /// parse successfully with fewer fields bound.
    ///
    /// # Errors
    ///
    /// Only on a violated binding contract, which indicates a bug in the
    /// dispatch logic — never on malformed input.
    pub fn parse(data: &'a mut [u8], in_port: u32) -> Result<Self> {
        let mut packet = Self {
            data,
            in_port: in_port.to_be_bytes(),
            bindings: BindingTable::new(),
            dhcp_options: HashMap::new(),
            vlan_tagged: false,
        };

        packet
            .bindings
            .bind(&[(OxmField::InPort, Binding::Bound(FieldLocation::InPort))])?;

        if !packet.data.is_empty() {
            packet.parse_l2()?;
        }

        Ok(packet)
    }

    fn parse_l2(&mut self) -> Result<()> {
        let Some(eth) = EthernetHeader::new(self.data) else {
            trace!(len = self.data.len(), "frame shorter than ethernet header");
            return Ok(());
        };
        let ethertype = eth.ethertype();

        if ethertype == ETHERTYPE_VLAN {
            let Some(tag) = Dot1qHeader::new(self.data) else {
                trace!(len = self.data.len(), "tagged frame shorter than 802.1q header");
                return Ok(());
            };
            let inner_type = tag.inner_ethertype();

            self.vlan_tagged = true;
            self.bindings.bind(&[
                (
                    OxmField::EthType,
                    frame_loc(Dot1qHeader::INNER_TYPE_OFFSET, 2),
                ),
                (OxmField::EthSrc, frame_loc(EthernetHeader::SRC_OFFSET, 6)),
                (OxmField::EthDst, frame_loc(EthernetHeader::DST_OFFSET, 6)),
                (OxmField::VlanVid, frame_loc(Dot1qHeader::TCI_OFFSET, 2)),
            ])?;

            trace!(ethertype = inner_type, "802.1q tag consumed");
            self.parse_l3(inner_type, Dot1qHeader::LEN)
        } else {
            self.vlan_tagged = false;
            self.bindings.bind(&[
                (
                    OxmField::EthType,
                    frame_loc(EthernetHeader::ETHERTYPE_OFFSET, 2),
                ),
                (OxmField::EthSrc, frame_loc(EthernetHeader::SRC_OFFSET, 6)),
                (OxmField::EthDst, frame_loc(EthernetHeader::DST_OFFSET, 6)),
                (OxmField::VlanVid, Binding::Absent),
            ])?;

            self.parse_l3(ethertype, EthernetHeader::LEN)
        }
    }

    fn parse_l3(&mut self, ethertype: u16, base: usize) -> Result<()> {
        match ethertype {
            ETHERTYPE_IPV4 => {
                let Some(ipv4) = Ipv4Header::new(&self.data[base..]) else {
                    trace!(remaining = self.data.len() - base, "short ipv4 header");
                    return Ok(());
                };
                let protocol = ipv4.protocol();
                let header_len = ipv4.header_len();

                self.bindings.bind(&[
                    (
                        OxmField::IpProto,
                        frame_loc(base + Ipv4Header::PROTOCOL_OFFSET, 1),
                    ),
                    (OxmField::Ipv4Src, frame_loc(base + Ipv4Header::SRC_OFFSET, 4)),
                    (OxmField::Ipv4Dst, frame_loc(base + Ipv4Header::DST_OFFSET, 4)),
                ])?;

                let remaining = self.data.len() - base;
                if header_len < Ipv4Header::MIN_LEN {
                    // A lying IHL must not move the L4 origin inside the
                    // IPv4 header itself.
                    debug!(header_len, "ipv4 header length below minimum, not descending");
                    return Ok(());
                }
                if remaining > header_len {
                    return self.parse_l4(protocol, base + header_len);
                }
                Ok(())
            }
            ETHERTYPE_ARP => {
                let Some(arp) = ArpHeader::new(&self.data[base..]) else {
                    trace!(remaining = self.data.len() - base, "short arp header");
                    return Ok(());
                };
                if !arp.is_ethernet_ipv4() {
                    // Structurally present but unusable for binding.
                    debug!(
                        htype = arp.htype(),
                        ptype = arp.ptype(),
                        "arp is not ethernet/ipv4, leaving fields unbound"
                    );
                    return Ok(());
                }

                self.bindings.bind(&[
                    (OxmField::ArpOp, frame_loc(base + ArpHeader::OPCODE_OFFSET, 2)),
                    (OxmField::ArpSha, frame_loc(base + ArpHeader::SHA_OFFSET, 6)),
                    (OxmField::ArpTha, frame_loc(base + ArpHeader::THA_OFFSET, 6)),
                    (OxmField::ArpSpa, frame_loc(base + ArpHeader::SPA_OFFSET, 4)),
                    (OxmField::ArpTpa, frame_loc(base + ArpHeader::TPA_OFFSET, 4)),
                ])
            }
            ETHERTYPE_IPV6 => {
                trace!("ipv6 recognized but not parsed");
                Ok(())
            }
            other => {
                trace!(ethertype = other, "no l3 parser for ethertype");
                Ok(())
            }
        }
    }

    fn parse_l4(&mut self, protocol: u8, base: usize) -> Result<()> {
        match protocol {
            IP_PROTO_TCP => {
                if TcpHeader::new(&self.data[base..]).is_none() {
                    trace!(remaining = self.data.len() - base, "short tcp header");
                    return Ok(());
                }

                self.bindings.bind(&[
                    (OxmField::TcpSrc, frame_loc(base + TcpHeader::SRC_OFFSET, 2)),
                    (OxmField::TcpDst, frame_loc(base + TcpHeader::DST_OFFSET, 2)),
                ])
            }
            IP_PROTO_UDP => {
                let Some(udp) = UdpHeader::new(&self.data[base..]) else {
                    trace!(remaining = self.data.len() - base, "short udp header");
                    return Ok(());
                };
                let src_port = udp.src_port();
                let dst_port = udp.dst_port();

                self.bindings.bind(&[
                    (OxmField::UdpSrc, frame_loc(base + UdpHeader::SRC_OFFSET, 2)),
                    (OxmField::UdpDst, frame_loc(base + UdpHeader::DST_OFFSET, 2)),
                ])?;

                let remaining = self.data.len() - base;
                if remaining > UdpHeader::LEN
                    && src_port == DHCP_CLIENT_PORT
                    && dst_port == DHCP_SERVER_PORT
                {
                    return self.parse_dhcp(base + UdpHeader::LEN);
                }
                Ok(())
            }
            IP_PROTO_ICMP => {
                trace!("icmp recognized but not parsed");
                Ok(())
            }
            other => {
                trace!(protocol = other, "no l4 parser for protocol");
                Ok(())
            }
        }
    }

    fn parse_dhcp(&mut self, base: usize) -> Result<()> {
        if DhcpFixedHeader::new(&self.data[base..]).is_none() {
            trace!(remaining = self.data.len() - base, "short dhcp fixed header");
            return Ok(());
        }

        self.bindings.bind(&[
            (OxmField::DhcpOp, frame_loc(base + options::OP_OFFSET, 1)),
            (OxmField::DhcpXid, frame_loc(base + options::XID_OFFSET, 4)),
            (
                OxmField::DhcpCiaddr,
                frame_loc(base + options::CIADDR_OFFSET, 4),
            ),
            (
                OxmField::DhcpYiaddr,
                frame_loc(base + options::YIADDR_OFFSET, 4),
            ),
            (
                OxmField::DhcpChaddr,
                frame_loc(base + options::CHADDR_OFFSET, 6),
            ),
        ])?;

        self.dhcp_options = scan_options(self.data, base + options::FIXED_HEADER_LEN);
        debug!(options = self.dhcp_options.len(), "scanned dhcp option list");
        Ok(())
    }

    /// True when L2 parsing found an 802.1Q tag. Defined (and `false`)
    /// even when the frame was too short to reach L2.
    pub fn vlan_tagged(&self) -> bool {
        self.vlan_tagged
    }

    /// The ingress port this frame arrived on.
    pub fn in_port(&self) -> u32 {
        u32::from_be_bytes(self.in_port)
    }

    /// True when `field` is bound to live bytes for this packet.
    ///
    /// Explicitly absent fields (VLAN_VID on an untagged frame) and fields
    /// of layers the parse never reached both report `false`.
    pub fn is_bound(&self, field: OxmField) -> bool {
        matches!(self.bindings.get(field), Binding::Bound(_))
    }

    /// Every field currently bound to live bytes, in id order.
    pub fn bound_fields(&self) -> impl Iterator<Item = OxmField> + '_ {
        OxmField::ALL
            .into_iter()
            .filter(|&field| self.is_bound(field))
    }

    /// Loads the field's raw big-endian value and applies `mask`.
    ///
    /// # Errors
    ///
    /// [`Error::NotBound`] / [`Error::FieldAbsent`] when the field has no
    /// live bytes in this packet.
    pub fn load(&self, field: OxmField, mask: u64) -> Result<u64> {
        let location = self.bindings.access(field)?;
        let mut value = 0u64;
        for &byte in self.location_bytes(location) {
            value = (value << 8) | u64::from(byte);
        }
        Ok(value & mask & field.full_mask())
    }

    /// Loads the field's full-width value (mask of all ones).
    pub fn value(&self, field: OxmField) -> Result<u64> {
        self.load(field, field.full_mask())
    }

    /// Replaces exactly the masked bits of the field with `value`'s bits,
    /// writing the result back into the frame buffer in place.
    ///
    /// # Errors
    ///
    /// [`Error::NotBound`] / [`Error::FieldAbsent`] when the field has no
    /// live bytes in this packet.
    pub fn modify(&mut self, field: OxmField, value: u64, mask: u64) -> Result<()> {
        let location = self.bindings.access(field)?;
        let mask = mask & field.full_mask();

        let mut current = 0u64;
        for &byte in self.location_bytes(location) {
            current = (current << 8) | u64::from(byte);
        }
        let updated = (current & !mask) | (value & mask);

        let bytes = match location {
            FieldLocation::Frame { offset, len } => &mut self.data[offset..offset + len],
            FieldLocation::InPort => &mut self.in_port[..],
        };
        let width = bytes.len();
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = (updated >> ((width - 1 - i) * 8)) as u8;
        }
        Ok(())
    }

    /// Points an already-bound field at a new location.
    ///
    /// Intended for callers whose own deeper parsing supersedes a binding
    /// made here; none of the built-in layers rebind.
    ///
    /// # Errors
    ///
    /// [`Error::NotBound`] when the field was never bound, or
    /// [`Error::InvalidLocation`] when the location's width does not match
    /// the field or the range leaves the frame buffer.
    pub fn rebind(&mut self, field: OxmField, location: FieldLocation) -> Result<()> {
        if let FieldLocation::Frame { offset, len } = location {
            if len != field.byte_len() {
                return Err(Error::InvalidLocation(format!(
                    "{} is {} bytes wide, location is {}",
                    field,
                    field.byte_len(),
                    len
                )));
            }
            if offset + len > self.data.len() {
                return Err(Error::InvalidLocation(format!(
                    "{}..{} exceeds frame of {} bytes",
                    offset,
                    offset + len,
                    self.data.len()
                )));
            }
        }
        self.bindings.rebind(&[(field, Binding::Bound(location))])
    }

    /// Looks up a scanned DHCP option by code.
    ///
    /// Returns `None` when the packet carried no DHCP option list or the
    /// code was not present. The value borrows from the frame buffer.
    pub fn dhcp_option(&self, code: u8) -> Option<DhcpOptionRecord<'_>> {
        self.dhcp_options.get(&code).map(|slot| DhcpOptionRecord {
            code,
            value: &self.data[slot.offset..slot.offset + slot.length as usize],
        })
    }

    /// Every scanned DHCP option, in unspecified order.
    pub fn dhcp_options(&self) -> impl Iterator<Item = DhcpOptionRecord<'_>> + '_ {
        self.dhcp_options.iter().map(|(&code, slot)| DhcpOptionRecord {
            code,
            value: &self.data[slot.offset..slot.offset + slot.length as usize],
        })
    }

    /// Copies the frame (with any modifications) into `target`.
    ///
    /// Copies `min(total_bytes(), target.len())` bytes and returns the
    /// count; a too-small target truncates silently.
    pub fn serialize_to(&self, target: &mut [u8]) -> usize {
        let copied = self.data.len().min(target.len());
        target[..copied].copy_from_slice(&self.data[..copied]);
        copied
    }

    /// The original frame length, however much of it was understood.
    pub fn total_bytes(&self) -> usize {
        self.data.len()
    }

    fn location_bytes(&self, location: FieldLocation) -> &[u8] {
        match location {
            FieldLocation::Frame { offset, len } => &self.data[offset..offset + len],
            FieldLocation::InPort => &self.in_port,
        }
    }
}
