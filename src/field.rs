//! OXM match fields from the OpenFlow Extensible Match vocabulary.
//!
//! Every protocol field the engine can bind is addressed by an [`OxmField`]
//! id with a fixed bit width. The standard fields carry their OpenFlow
//! basic-match numbering; the DHCP fields live in an extension range above
//! it. Ids outside this set are the unsupported namespace and are rejected
//! at conversion time.
//!
//! # References
//!
//! - OpenFlow Switch Specification 1.3, §7.2.3.7 (OXM basic match fields)

use crate::error::Error;

/// Supported OXM match fields.
///
/// Discriminants double as binding-table indices. The gaps (e.g. 1–2, 7–9)
/// belong to basic-match fields this engine does not extract, such as
/// metadata or IP DSCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OxmField {
    /// Ingress port the frame arrived on (not read from the buffer).
    InPort = 0,
    /// Ethernet destination address.
    EthDst = 3,
    /// Ethernet source address.
    EthSrc = 4,
    /// EtherType of the payload (inner type on 802.1Q-tagged frames).
    EthType = 5,
    /// Raw 802.1Q tag-control-info, PCP/DEI bits included.
    ///
    /// Callers that need the bare 12-bit VLAN id must mask with `0x0fff`.
    VlanVid = 6,
    /// IPv4 protocol number.
    IpProto = 10,
    /// IPv4 source address.
    Ipv4Src = 11,
    /// IPv4 destination address.
    Ipv4Dst = 12,
    /// TCP source port.
    TcpSrc = 13,
    /// TCP destination port.
    TcpDst = 14,
    /// UDP source port.
    UdpSrc = 15,
    /// UDP destination port.
    UdpDst = 16,
    /// ARP opcode.
    ArpOp = 21,
    /// ARP sender protocol address.
    ArpSpa = 22,
    /// ARP target protocol address.
    ArpTpa = 23,
    /// ARP sender hardware address.
    ArpSha = 24,
    /// ARP target hardware address.
    ArpTha = 25,
    /// DHCP message op code (BOOTREQUEST/BOOTREPLY).
    DhcpOp = 40,
    /// DHCP transaction id.
    DhcpXid = 41,
    /// DHCP client IP address.
    DhcpCiaddr = 42,
    /// DHCP "your" IP address.
    DhcpYiaddr = 43,
    /// DHCP client hardware address (six bytes).
    DhcpChaddr = 44,
}

/// Number of binding-table slots: one per possible id, including gaps.
pub(crate) const TABLE_SIZE: usize = 45;

impl OxmField {
    /// Every supported field, in id order. Used for availability enumeration.
    pub const ALL: [OxmField; 22] = [
        Self::InPort,
        Self::EthDst,
        Self::EthSrc,
        Self::EthType,
        Self::VlanVid,
        Self::IpProto,
        Self::Ipv4Src,
        Self::Ipv4Dst,
        Self::TcpSrc,
        Self::TcpDst,
        Self::UdpSrc,
        Self::UdpDst,
        Self::ArpOp,
        Self::ArpSpa,
        Self::ArpTpa,
        Self::ArpSha,
        Self::ArpTha,
        Self::DhcpOp,
        Self::DhcpXid,
        Self::DhcpCiaddr,
        Self::DhcpYiaddr,
        Self::DhcpChaddr,
    ];

    /// Width of the field on the wire, in bits. Never exceeds 48.
    pub fn bits(self) -> u32 {
        match self {
            Self::InPort | Self::Ipv4Src | Self::Ipv4Dst => 32,
            Self::EthDst | Self::EthSrc | Self::ArpSha | Self::ArpTha => 48,
            Self::EthType | Self::VlanVid | Self::ArpOp => 16,
            Self::IpProto | Self::DhcpOp => 8,
            Self::TcpSrc | Self::TcpDst | Self::UdpSrc | Self::UdpDst => 16,
            Self::ArpSpa | Self::ArpTpa => 32,
            Self::DhcpXid | Self::DhcpCiaddr | Self::DhcpYiaddr => 32,
            Self::DhcpChaddr => 48,
        }
    }

    /// Width of the field on the wire, in whole bytes.
    pub fn byte_len(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Mask selecting every bit of the field.
    pub fn full_mask(self) -> u64 {
        (1u64 << self.bits()) - 1
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for OxmField {
    type Error = Error;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::InPort),
            3 => Ok(Self::EthDst),
            4 => Ok(Self::EthSrc),
            5 => Ok(Self::EthType),
            6 => Ok(Self::VlanVid),
            10 => Ok(Self::IpProto),
            11 => Ok(Self::Ipv4Src),
            12 => Ok(Self::Ipv4Dst),
            13 => Ok(Self::TcpSrc),
            14 => Ok(Self::TcpDst),
            15 => Ok(Self::UdpSrc),
            16 => Ok(Self::UdpDst),
            21 => Ok(Self::ArpOp),
            22 => Ok(Self::ArpSpa),
            23 => Ok(Self::ArpTpa),
            24 => Ok(Self::ArpSha),
            25 => Ok(Self::ArpTha),
            40 => Ok(Self::DhcpOp),
            41 => Ok(Self::DhcpXid),
            42 => Ok(Self::DhcpCiaddr),
            43 => Ok(Self::DhcpYiaddr),
            44 => Ok(Self::DhcpChaddr),
            other => Err(Error::UnsupportedField(other)),
        }
    }
}

impl std::fmt::Display for OxmField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InPort => "IN_PORT",
            Self::EthDst => "ETH_DST",
            Self::EthSrc => "ETH_SRC",
            Self::EthType => "ETH_TYPE",
            Self::VlanVid => "VLAN_VID",
            Self::IpProto => "IP_PROTO",
            Self::Ipv4Src => "IPV4_SRC",
            Self::Ipv4Dst => "IPV4_DST",
            Self::TcpSrc => "TCP_SRC",
            Self::TcpDst => "TCP_DST",
            Self::UdpSrc => "UDP_SRC",
            Self::UdpDst => "UDP_DST",
            Self::ArpOp => "ARP_OP",
            Self::ArpSpa => "ARP_SPA",
            Self::ArpTpa => "ARP_TPA",
            Self::ArpSha => "ARP_SHA",
            Self::ArpTha => "ARP_THA",
            Self::DhcpOp => "DHCP_OP",
            Self::DhcpXid => "DHCP_XID",
            Self::DhcpCiaddr => "DHCP_CIADDR",
            Self::DhcpYiaddr => "DHCP_YIADDR",
            Self::DhcpChaddr => "DHCP_CHADDR",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for OxmField {
    type Err = String;

    /// Parses the wire-protocol spelling used by [`Display`](std::fmt::Display).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let field = Self::ALL
            .iter()
            .find(|field| field.to_string() == s.to_uppercase());
        field.copied().ok_or_else(|| format!("unknown field: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_id_conversions() {
        for field in OxmField::ALL {
            let roundtrip = OxmField::try_from(field as u8).unwrap();
            assert_eq!(roundtrip, field);
        }
        assert!(OxmField::try_from(1).is_err());
        assert!(OxmField::try_from(45).is_err());
        assert!(OxmField::try_from(255).is_err());
    }

    #[test]
    fn test_widths_are_whole_bytes() {
        for field in OxmField::ALL {
            assert_eq!(field.bits() % 8, 0, "{} width not byte-aligned", field);
            assert!(field.bits() <= 48, "{} wider than 48 bits", field);
        }
    }

    #[test]
    fn test_full_mask() {
        assert_eq!(OxmField::IpProto.full_mask(), 0xff);
        assert_eq!(OxmField::EthType.full_mask(), 0xffff);
        assert_eq!(OxmField::Ipv4Src.full_mask(), 0xffff_ffff);
        assert_eq!(OxmField::EthSrc.full_mask(), 0xffff_ffff_ffff);
    }

    #[test]
    fn test_indices_fit_table() {
        for field in OxmField::ALL {
            assert!(field.index() < TABLE_SIZE);
        }
    }

    #[test]
    fn test_display_and_from_str_roundtrip() {
        for field in OxmField::ALL {
            let name = field.to_string();
            assert_eq!(name.parse::<OxmField>().unwrap(), field);
        }
        assert!("ETH_MUMBLE".parse::<OxmField>().is_err());
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("vlan_vid".parse::<OxmField>().unwrap(), OxmField::VlanVid);
    }
}
