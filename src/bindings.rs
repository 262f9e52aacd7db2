//! The binding table: where each match field's live bytes reside.
//!
//! During the single parse pass every recognized field is bound to a
//! location — a byte range inside the frame buffer, or the parser-held
//! ingress-port value for [`OxmField::InPort`]. Slots track three states so
//! that "explicitly absent" (VLAN_VID on an untagged frame) is distinct from
//! "never touched" (layers the parse did not reach).
//!
//! The bind-once / rebind-only-if-bound contract is enforced here; violating
//! it is a dispatcher or caller bug and surfaces as a typed error naming the
//! field.

use crate::error::{Error, Result};
use crate::field::{OxmField, TABLE_SIZE};

/// Where a bound field's bytes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLocation {
    /// A byte range inside the frame buffer.
    Frame {
        /// Offset of the field's first byte from the start of the frame.
        offset: usize,
        /// Field length in bytes.
        len: usize,
    },
    /// The ingress-port scratch value held by the parser itself.
    ///
    /// IN_PORT comes from the packet-in envelope, not from frame bytes, so
    /// it has no frame offset.
    InPort,
}

/// State of one binding-table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Binding {
    /// No stage has touched this field.
    #[default]
    Vacant,
    /// A stage decided the field does not exist in this packet.
    Absent,
    /// The field's bytes live at the given location.
    Bound(FieldLocation),
}

/// Fixed-size table mapping field ids to binding slots.
#[derive(Debug)]
pub struct BindingTable {
    slots: [Binding; TABLE_SIZE],
}

impl BindingTable {
    /// Creates a table with every slot vacant.
    pub fn new() -> Self {
        Self {
            slots: [Binding::Vacant; TABLE_SIZE],
        }
    }

    /// Binds fields for the first time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyBound`] if any entry's slot is not vacant.
    /// Entries before the offending one are still applied.
    pub fn bind(&mut self, entries: &[(OxmField, Binding)]) -> Result<()> {
        for &(field, binding) in entries {
            let slot = &mut self.slots[field.index()];
            if !matches!(slot, Binding::Vacant) {
                return Err(Error::AlreadyBound(field));
            }
            *slot = binding;
        }
        Ok(())
    }

    /// Overwrites existing bindings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotBound`] if any entry's slot is vacant.
    /// Entries before the offending one are still applied.
    pub fn rebind(&mut self, entries: &[(OxmField, Binding)]) -> Result<()> {
        for &(field, binding) in entries {
            let slot = &mut self.slots[field.index()];
            if matches!(slot, Binding::Vacant) {
                return Err(Error::NotBound(field));
            }
            *slot = binding;
        }
        Ok(())
    }

    /// Returns the slot state for a field.
    pub fn get(&self, field: OxmField) -> Binding {
        self.slots[field.index()]
    }

    /// Resolves a field to its location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotBound`] for vacant slots and
    /// [`Error::FieldAbsent`] for explicitly absent ones.
    pub fn access(&self, field: OxmField) -> Result<FieldLocation> {
        match self.slots[field.index()] {
            Binding::Bound(location) => Ok(location),
            Binding::Absent => Err(Error::FieldAbsent(field)),
            Binding::Vacant => Err(Error::NotBound(field)),
        }
    }
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(offset: usize, len: usize) -> Binding {
        Binding::Bound(FieldLocation::Frame { offset, len })
    }

    #[test]
    fn test_bind_then_access() {
        let mut table = BindingTable::new();
        table.bind(&[(OxmField::EthType, frame(12, 2))]).unwrap();

        assert_eq!(
            table.access(OxmField::EthType).unwrap(),
            FieldLocation::Frame { offset: 12, len: 2 }
        );
    }

    #[test]
    fn test_bind_twice_fails() {
        let mut table = BindingTable::new();
        table.bind(&[(OxmField::EthType, frame(12, 2))]).unwrap();

        let result = table.bind(&[(OxmField::EthType, frame(16, 2))]);
        assert!(matches!(result, Err(Error::AlreadyBound(OxmField::EthType))));
    }

    #[test]
    fn test_bind_on_absent_fails() {
        let mut table = BindingTable::new();
        table.bind(&[(OxmField::VlanVid, Binding::Absent)]).unwrap();

        let result = table.bind(&[(OxmField::VlanVid, frame(14, 2))]);
        assert!(matches!(result, Err(Error::AlreadyBound(OxmField::VlanVid))));
    }

    #[test]
    fn test_rebind_unbound_fails() {
        let mut table = BindingTable::new();
        let result = table.rebind(&[(OxmField::TcpSrc, frame(34, 2))]);
        assert!(matches!(result, Err(Error::NotBound(OxmField::TcpSrc))));
    }

    #[test]
    fn test_rebind_supersedes() {
        let mut table = BindingTable::new();
        table.bind(&[(OxmField::EthType, frame(12, 2))]).unwrap();
        table.rebind(&[(OxmField::EthType, frame(16, 2))]).unwrap();

        assert_eq!(
            table.access(OxmField::EthType).unwrap(),
            FieldLocation::Frame { offset: 16, len: 2 }
        );
    }

    #[test]
    fn test_rebind_absent_allowed() {
        let mut table = BindingTable::new();
        table.bind(&[(OxmField::VlanVid, Binding::Absent)]).unwrap();
        table.rebind(&[(OxmField::VlanVid, frame(14, 2))]).unwrap();

        assert!(table.access(OxmField::VlanVid).is_ok());
    }

    #[test]
    fn test_access_distinguishes_absent_from_vacant() {
        let mut table = BindingTable::new();
        table.bind(&[(OxmField::VlanVid, Binding::Absent)]).unwrap();

        assert!(matches!(
            table.access(OxmField::VlanVid),
            Err(Error::FieldAbsent(OxmField::VlanVid))
        ));
        assert!(matches!(
            table.access(OxmField::TcpSrc),
            Err(Error::NotBound(OxmField::TcpSrc))
        ));
    }

    #[test]
    fn test_in_port_location() {
        let mut table = BindingTable::new();
        table
            .bind(&[(OxmField::InPort, Binding::Bound(FieldLocation::InPort))])
            .unwrap();

        assert_eq!(
            table.access(OxmField::InPort).unwrap(),
            FieldLocation::InPort
        );
    }
}
