use std::fmt;

/// A partition of request types by the subsystem that declares them.
///
/// Every zone owns its own slice of the cache and of the registration
/// table, so subsystems can add request types without renumbering each
/// other's.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum Zone {
    Parse,
    NameLookup,
    TypeChecker,
    IrGen,
    InterfaceGen,
    /// Reserved for unit tests of the evaluator itself.
    Testing,
}

impl Zone {
    /// Number of zones, used to size per-zone tables.
    pub const COUNT: usize = 6;

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Zone::Parse => "Parse",
            Zone::NameLookup => "NameLookup",
            Zone::TypeChecker => "TypeChecker",
            Zone::IrGen => "IrGen",
            Zone::InterfaceGen => "InterfaceGen",
            Zone::Testing => "Testing",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The compile-time identity of a request type: a zone plus an id that is
/// unique within that zone.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RequestTypeId {
    zone: Zone,
    local_id: u8,
}

impl RequestTypeId {
    pub const fn new(zone: Zone, local_id: u8) -> Self {
        Self { zone, local_id }
    }

    pub const fn zone(self) -> Zone {
        self.zone
    }

    pub const fn local_id(self) -> u8 {
        self.local_id
    }

    /// Packs the identity into 16 bits, zone in the high byte.
    pub const fn as_u16(self) -> u16 {
        ((self.zone as u16) << 8) | self.local_id as u16
    }
}

impl fmt::Debug for RequestTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestTypeId({}:{})", self.zone, self.local_id)
    }
}

impl fmt::Display for RequestTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.zone, self.local_id)
    }
}
