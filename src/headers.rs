//! Wire header overlays with zero-copy accessors.
//!
//! Each reader type borrows a byte slice and interprets a prefix of it as
//! one protocol header, reading multi-byte integers big-endian and unpacking
//! sub-byte flag fields in place. Constructors enforce the minimum header
//! length, so accessors never index past the end of the slice.
//!
//! Byte offsets within each header are published alongside the readers; the
//! dispatcher combines them with the layer's base offset to record binding
//! locations.

use std::net::Ipv4Addr;

/// EtherType for IPv4.
pub const ETHERTYPE_IPV4: u16 = 0x0800;
/// EtherType for ARP.
pub const ETHERTYPE_ARP: u16 = 0x0806;
/// EtherType (TPID) for 802.1Q-tagged frames.
pub const ETHERTYPE_VLAN: u16 = 0x8100;
/// EtherType for IPv6 (recognized, never descended into).
pub const ETHERTYPE_IPV6: u16 = 0x86DD;

/// IPv4 protocol number for ICMP.
pub const IP_PROTO_ICMP: u8 = 0x01;
/// IPv4 protocol number for TCP.
pub const IP_PROTO_TCP: u8 = 0x06;
/// IPv4 protocol number for UDP.
pub const IP_PROTO_UDP: u8 = 0x11;

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn read_mac(data: &[u8], offset: usize) -> [u8; 6] {
    let mut mac = [0u8; 6];
    mac.copy_from_slice(&data[offset..offset + 6]);
    mac
}

fn read_ipv4(data: &[u8], offset: usize) -> Ipv4Addr {
    Ipv4Addr::new(
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    )
}

/// Ethernet II header (14 bytes).
///
/// ```text
/// 0                6               12      14
/// +----------------+----------------+-------+
/// |    dst MAC     |    src MAC     | type  |
/// +----------------+----------------+-------+
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EthernetHeader<'a> {
    data: &'a [u8],
}

impl<'a> EthernetHeader<'a> {
    /// Header length in bytes.
    pub const LEN: usize = 14;

    pub(crate) const DST_OFFSET: usize = 0;
    pub(crate) const SRC_OFFSET: usize = 6;
    pub(crate) const ETHERTYPE_OFFSET: usize = 12;

    /// Overlays the header on `data`, or `None` if fewer than 14 bytes remain.
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.len() < Self::LEN {
            return None;
        }
        Some(Self { data })
    }

    /// Destination MAC address.
    pub fn dst(&self) -> [u8; 6] {
        read_mac(self.data, Self::DST_OFFSET)
    }

    /// Source MAC address.
    pub fn src(&self) -> [u8; 6] {
        read_mac(self.data, Self::SRC_OFFSET)
    }

    /// EtherType of the payload.
    pub fn ethertype(&self) -> u16 {
        read_u16(self.data, Self::ETHERTYPE_OFFSET)
    }
}

/// 802.1Q-tagged Ethernet header (18 bytes).
///
/// The four-byte tag sits between the source MAC and the original EtherType:
/// TPID (0x8100), then TCI packing 3-bit PCP, 1-bit DEI, and 12-bit VLAN id.
#[derive(Debug, Clone, Copy)]
pub struct Dot1qHeader<'a> {
    data: &'a [u8],
}

impl<'a> Dot1qHeader<'a> {
    /// Header length in bytes, tag included.
    pub const LEN: usize = 18;

    pub(crate) const TCI_OFFSET: usize = 14;
    pub(crate) const INNER_TYPE_OFFSET: usize = 16;

    /// Overlays the header on `data`, or `None` if fewer than 18 bytes remain.
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.len() < Self::LEN {
            return None;
        }
        Some(Self { data })
    }

    /// Destination MAC address.
    pub fn dst(&self) -> [u8; 6] {
        read_mac(self.data, EthernetHeader::DST_OFFSET)
    }

    /// Source MAC address.
    pub fn src(&self) -> [u8; 6] {
        read_mac(self.data, EthernetHeader::SRC_OFFSET)
    }

    /// Tag protocol identifier; 0x8100 on a well-formed tag.
    pub fn tpid(&self) -> u16 {
        read_u16(self.data, EthernetHeader::ETHERTYPE_OFFSET)
    }

    /// Raw tag-control-info word.
    pub fn tci(&self) -> u16 {
        read_u16(self.data, Self::TCI_OFFSET)
    }

    /// Priority code point (upper 3 bits of the TCI).
    pub fn pcp(&self) -> u8 {
        (self.tci() >> 13) as u8
    }

    /// Drop-eligible indicator bit.
    pub fn dei(&self) -> bool {
        self.tci() & 0x1000 != 0
    }

    /// Bare 12-bit VLAN id.
    pub fn vid(&self) -> u16 {
        self.tci() & 0x0fff
    }

    /// EtherType of the encapsulated payload (after the tag).
    pub fn inner_ethertype(&self) -> u16 {
        read_u16(self.data, Self::INNER_TYPE_OFFSET)
    }
}

/// IPv4 header (20 bytes minimum; options extend it to `IHL * 4`).
#[derive(Debug, Clone, Copy)]
pub struct Ipv4Header<'a> {
    data: &'a [u8],
}

impl<'a> Ipv4Header<'a> {
    /// Minimum header length in bytes (IHL = 5, no options).
    pub const MIN_LEN: usize = 20;

    pub(crate) const PROTOCOL_OFFSET: usize = 9;
    pub(crate) const SRC_OFFSET: usize = 12;
    pub(crate) const DST_OFFSET: usize = 16;

    /// Overlays the header on `data`, or `None` if fewer than 20 bytes remain.
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.len() < Self::MIN_LEN {
            return None;
        }
        Some(Self { data })
    }

    /// IP version (upper nibble of the first byte); 4 on a well-formed header.
    pub fn version(&self) -> u8 {
        self.data[0] >> 4
    }

    /// Internet header length, in 32-bit words.
    pub fn ihl(&self) -> u8 {
        self.data[0] & 0x0f
    }

    /// Header length in bytes as declared by the IHL field.
    ///
    /// May be less than [`MIN_LEN`](Self::MIN_LEN) on a malformed header;
    /// the dispatcher refuses to descend past such a header.
    pub fn header_len(&self) -> usize {
        self.ihl() as usize * 4
    }

    /// Differentiated services code point (upper 6 bits of the TOS byte).
    pub fn dscp(&self) -> u8 {
        self.data[1] >> 2
    }

    /// Explicit congestion notification (lower 2 bits of the TOS byte).
    pub fn ecn(&self) -> u8 {
        self.data[1] & 0x03
    }

    /// Total datagram length, header included.
    pub fn total_len(&self) -> u16 {
        read_u16(self.data, 2)
    }

    /// Identification field for fragment reassembly.
    pub fn identification(&self) -> u16 {
        read_u16(self.data, 4)
    }

    /// Flags (upper 3 bits of the flags/fragment word).
    pub fn flags(&self) -> u8 {
        (read_u16(self.data, 6) >> 13) as u8
    }

    /// Fragment offset in 8-byte units (lower 13 bits).
    pub fn fragment_offset(&self) -> u16 {
        read_u16(self.data, 6) & 0x1fff
    }

    /// Time to live.
    pub fn ttl(&self) -> u8 {
        self.data[8]
    }

    /// Next-layer protocol number.
    pub fn protocol(&self) -> u8 {
        self.data[Self::PROTOCOL_OFFSET]
    }

    /// Header checksum as carried on the wire (never validated here).
    pub fn checksum(&self) -> u16 {
        read_u16(self.data, 10)
    }

    /// Source address.
    pub fn src(&self) -> Ipv4Addr {
        read_ipv4(self.data, Self::SRC_OFFSET)
    }

    /// Destination address.
    pub fn dst(&self) -> Ipv4Addr {
        read_ipv4(self.data, Self::DST_OFFSET)
    }
}

/// ARP header for Ethernet/IPv4 (28 bytes).
#[derive(Debug, Clone, Copy)]
pub struct ArpHeader<'a> {
    data: &'a [u8],
}

impl<'a> ArpHeader<'a> {
    /// Header length in bytes.
    pub const LEN: usize = 28;

    pub(crate) const OPCODE_OFFSET: usize = 6;
    pub(crate) const SHA_OFFSET: usize = 8;
    pub(crate) const SPA_OFFSET: usize = 14;
    pub(crate) const THA_OFFSET: usize = 18;
    pub(crate) const TPA_OFFSET: usize = 24;

    /// Overlays the header on `data`, or `None` if fewer than 28 bytes remain.
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.len() < Self::LEN {
            return None;
        }
        Some(Self { data })
    }

    /// Hardware type; 1 for Ethernet.
    pub fn htype(&self) -> u16 {
        read_u16(self.data, 0)
    }

    /// Protocol type; 0x0800 for IPv4.
    pub fn ptype(&self) -> u16 {
        read_u16(self.data, 2)
    }

    /// Hardware address length; 6 for Ethernet.
    pub fn hlen(&self) -> u8 {
        self.data[4]
    }

    /// Protocol address length; 4 for IPv4.
    pub fn plen(&self) -> u8 {
        self.data[5]
    }

    /// Operation: 1 = request, 2 = reply.
    pub fn opcode(&self) -> u16 {
        read_u16(self.data, Self::OPCODE_OFFSET)
    }

    /// Sender hardware address.
    pub fn sender_hw(&self) -> [u8; 6] {
        read_mac(self.data, Self::SHA_OFFSET)
    }

    /// Sender protocol address.
    pub fn sender_ip(&self) -> Ipv4Addr {
        read_ipv4(self.data, Self::SPA_OFFSET)
    }

    /// Target hardware address.
    pub fn target_hw(&self) -> [u8; 6] {
        read_mac(self.data, Self::THA_OFFSET)
    }

    /// Target protocol address.
    pub fn target_ip(&self) -> Ipv4Addr {
        read_ipv4(self.data, Self::TPA_OFFSET)
    }

    /// True when the address layout is Ethernet/IPv4.
    ///
    /// Other hardware/protocol combinations leave the header parsed but
    /// unusable for field binding.
    pub fn is_ethernet_ipv4(&self) -> bool {
        self.htype() == 1 && self.ptype() == ETHERTYPE_IPV4 && self.hlen() == 6 && self.plen() == 4
    }
}

/// TCP header (20 bytes minimum).
///
/// The control bits occupy the low bit of the data-offset byte (NS) and all
/// of the following byte (CWR ECE URG ACK PSH RST SYN FIN, high to low).
#[derive(Debug, Clone, Copy)]
pub struct TcpHeader<'a> {
    data: &'a [u8],
}

impl<'a> TcpHeader<'a> {
    /// Minimum header length in bytes.
    pub const MIN_LEN: usize = 20;

    pub(crate) const SRC_OFFSET: usize = 0;
    pub(crate) const DST_OFFSET: usize = 2;

    /// Overlays the header on `data`, or `None` if fewer than 20 bytes remain.
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.len() < Self::MIN_LEN {
            return None;
        }
        Some(Self { data })
    }

    /// Source port.
    pub fn src_port(&self) -> u16 {
        read_u16(self.data, Self::SRC_OFFSET)
    }

    /// Destination port.
    pub fn dst_port(&self) -> u16 {
        read_u16(self.data, Self::DST_OFFSET)
    }

    /// Sequence number.
    pub fn seq(&self) -> u32 {
        read_u32(self.data, 4)
    }

    /// Acknowledgment number.
    pub fn ack_no(&self) -> u32 {
        read_u32(self.data, 8)
    }

    /// Data offset, in 32-bit words.
    pub fn data_offset(&self) -> u8 {
        self.data[12] >> 4
    }

    /// Header length in bytes as declared by the data offset.
    pub fn header_len(&self) -> usize {
        self.data_offset() as usize * 4
    }

    /// ECN nonce bit.
    pub fn ns(&self) -> bool {
        self.data[12] & 0x01 != 0
    }

    /// Congestion window reduced.
    pub fn cwr(&self) -> bool {
        self.data[13] & 0x80 != 0
    }

    /// ECN echo.
    pub fn ece(&self) -> bool {
        self.data[13] & 0x40 != 0
    }

    /// Urgent pointer significant.
    pub fn urg(&self) -> bool {
        self.data[13] & 0x20 != 0
    }

    /// Acknowledgment significant.
    pub fn ack(&self) -> bool {
        self.data[13] & 0x10 != 0
    }

    /// Push function.
    pub fn psh(&self) -> bool {
        self.data[13] & 0x08 != 0
    }

    /// Reset the connection.
    pub fn rst(&self) -> bool {
        self.data[13] & 0x04 != 0
    }

    /// Synchronize sequence numbers.
    pub fn syn(&self) -> bool {
        self.data[13] & 0x02 != 0
    }

    /// No more data from sender.
    pub fn fin(&self) -> bool {
        self.data[13] & 0x01 != 0
    }

    /// Receive window size.
    pub fn window(&self) -> u16 {
        read_u16(self.data, 14)
    }

    /// Checksum as carried on the wire (never validated here).
    pub fn checksum(&self) -> u16 {
        read_u16(self.data, 16)
    }

    /// Urgent pointer.
    pub fn urgent_pointer(&self) -> u16 {
        read_u16(self.data, 18)
    }
}

/// UDP header (8 bytes).
#[derive(Debug, Clone, Copy)]
pub struct UdpHeader<'a> {
    data: &'a [u8],
}

impl<'a> UdpHeader<'a> {
    /// Header length in bytes.
    pub const LEN: usize = 8;

    pub(crate) const SRC_OFFSET: usize = 0;
    pub(crate) const DST_OFFSET: usize = 2;

    /// Overlays the header on `data`, or `None` if fewer than 8 bytes remain.
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.len() < Self::LEN {
            return None;
        }
        Some(Self { data })
    }

    /// Source port.
    pub fn src_port(&self) -> u16 {
        read_u16(self.data, Self::SRC_OFFSET)
    }

    /// Destination port.
    pub fn dst_port(&self) -> u16 {
        read_u16(self.data, Self::DST_OFFSET)
    }

    /// Datagram length, header included.
    pub fn length(&self) -> u16 {
        read_u16(self.data, 4)
    }

    /// Checksum as carried on the wire (never validated here).
    pub fn checksum(&self) -> u16 {
        read_u16(self.data, 6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethernet_accessors() {
        let mut frame = [0u8; 14];
        frame[0..6].copy_from_slice(&[0xff; 6]);
        frame[6..12].copy_from_slice(&[0x02, 0x00, 0x5e, 0x00, 0x00, 0x01]);
        frame[12] = 0x08;
        frame[13] = 0x06;

        let eth = EthernetHeader::new(&frame).unwrap();
        assert_eq!(eth.dst(), [0xff; 6]);
        assert_eq!(eth.src(), [0x02, 0x00, 0x5e, 0x00, 0x00, 0x01]);
        assert_eq!(eth.ethertype(), ETHERTYPE_ARP);
    }

    #[test]
    fn test_ethernet_too_short() {
        assert!(EthernetHeader::new(&[0u8; 13]).is_none());
    }

    #[test]
    fn test_dot1q_tci_split() {
        let mut frame = [0u8; 18];
        frame[12..14].copy_from_slice(&ETHERTYPE_VLAN.to_be_bytes());
        // PCP = 5, DEI = 1, VID = 0x123
        frame[14..16].copy_from_slice(&0xb123u16.to_be_bytes());
        frame[16..18].copy_from_slice(&ETHERTYPE_IPV4.to_be_bytes());

        let tag = Dot1qHeader::new(&frame).unwrap();
        assert_eq!(tag.tpid(), ETHERTYPE_VLAN);
        assert_eq!(tag.tci(), 0xb123);
        assert_eq!(tag.pcp(), 5);
        assert!(tag.dei());
        assert_eq!(tag.vid(), 0x123);
        assert_eq!(tag.inner_ethertype(), ETHERTYPE_IPV4);
    }

    #[test]
    fn test_dot1q_requires_eighteen_bytes() {
        assert!(Dot1qHeader::new(&[0u8; 17]).is_none());
        assert!(Dot1qHeader::new(&[0u8; 18]).is_some());
    }

    #[test]
    fn test_ipv4_accessors() {
        let header: [u8; 20] = [
            0x46, 0x2e, 0x00, 0x54, // version 4, IHL 6, DSCP 11, ECN 2, len 84
            0xab, 0xcd, 0x40, 0x00, // id, flags DF, offset 0
            0x40, 0x06, 0xbe, 0xef, // ttl 64, proto TCP, checksum
            10, 0, 0, 1, //
            10, 0, 0, 2,
        ];

        let ipv4 = Ipv4Header::new(&header).unwrap();
        assert_eq!(ipv4.version(), 4);
        assert_eq!(ipv4.ihl(), 6);
        assert_eq!(ipv4.header_len(), 24);
        assert_eq!(ipv4.dscp(), 0x0b);
        assert_eq!(ipv4.ecn(), 2);
        assert_eq!(ipv4.total_len(), 84);
        assert_eq!(ipv4.identification(), 0xabcd);
        assert_eq!(ipv4.flags(), 0b010);
        assert_eq!(ipv4.fragment_offset(), 0);
        assert_eq!(ipv4.ttl(), 64);
        assert_eq!(ipv4.protocol(), IP_PROTO_TCP);
        assert_eq!(ipv4.checksum(), 0xbeef);
        assert_eq!(ipv4.src(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(ipv4.dst(), Ipv4Addr::new(10, 0, 0, 2));
    }

    #[test]
    fn test_arp_ethernet_ipv4_check() {
        let mut header = [0u8; 28];
        header[0..2].copy_from_slice(&1u16.to_be_bytes());
        header[2..4].copy_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
        header[4] = 6;
        header[5] = 4;
        header[6..8].copy_from_slice(&1u16.to_be_bytes());

        let arp = ArpHeader::new(&header).unwrap();
        assert!(arp.is_ethernet_ipv4());
        assert_eq!(arp.opcode(), 1);

        let mut wrong_ptype = header;
        wrong_ptype[2..4].copy_from_slice(&ETHERTYPE_ARP.to_be_bytes());
        let arp = ArpHeader::new(&wrong_ptype).unwrap();
        assert!(!arp.is_ethernet_ipv4());
    }

    #[test]
    fn test_arp_addresses() {
        let mut header = [0u8; 28];
        header[8..14].copy_from_slice(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        header[14..18].copy_from_slice(&[192, 168, 1, 1]);
        header[18..24].copy_from_slice(&[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
        header[24..28].copy_from_slice(&[192, 168, 1, 2]);

        let arp = ArpHeader::new(&header).unwrap();
        assert_eq!(arp.sender_hw(), [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(arp.sender_ip(), Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(arp.target_hw(), [0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
        assert_eq!(arp.target_ip(), Ipv4Addr::new(192, 168, 1, 2));
    }

    #[test]
    fn test_tcp_control_bits() {
        let mut header = [0u8; 20];
        header[0..2].copy_from_slice(&443u16.to_be_bytes());
        header[2..4].copy_from_slice(&51000u16.to_be_bytes());
        header[12] = 0x51; // data offset 5, NS set
        header[13] = 0x12; // SYN + ACK

        let tcp = TcpHeader::new(&header).unwrap();
        assert_eq!(tcp.src_port(), 443);
        assert_eq!(tcp.dst_port(), 51000);
        assert_eq!(tcp.data_offset(), 5);
        assert_eq!(tcp.header_len(), 20);
        assert!(tcp.ns());
        assert!(tcp.syn());
        assert!(tcp.ack());
        assert!(!tcp.fin());
        assert!(!tcp.rst());
        assert!(!tcp.psh());
        assert!(!tcp.urg());
        assert!(!tcp.ece());
        assert!(!tcp.cwr());
    }

    #[test]
    fn test_tcp_all_flag_bits_independent() {
        let mut header = [0u8; 20];
        header[13] = 0xff;
        let tcp = TcpHeader::new(&header).unwrap();
        assert!(
            tcp.cwr()
                && tcp.ece()
                && tcp.urg()
                && tcp.ack()
                && tcp.psh()
                && tcp.rst()
                && tcp.syn()
                && tcp.fin()
        );
        assert!(!tcp.ns());
    }

    #[test]
    fn test_udp_accessors() {
        let mut header = [0u8; 8];
        header[0..2].copy_from_slice(&68u16.to_be_bytes());
        header[2..4].copy_from_slice(&67u16.to_be_bytes());
        header[4..6].copy_from_slice(&308u16.to_be_bytes());
        header[6..8].copy_from_slice(&0x1234u16.to_be_bytes());

        let udp = UdpHeader::new(&header).unwrap();
        assert_eq!(udp.src_port(), 68);
        assert_eq!(udp.dst_port(), 67);
        assert_eq!(udp.length(), 308);
        assert_eq!(udp.checksum(), 0x1234);
    }

    #[test]
    fn test_udp_too_short() {
        assert!(UdpHeader::new(&[0u8; 7]).is_none());
    }
}
