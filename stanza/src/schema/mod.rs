//! Schema descriptors.
//!
//! A schema is an ordered list of [`FieldDescriptor`]s, one per configurable
//! field of a destination type `T`. Each descriptor names the parameter as it
//! appears in the file, says how its value is converted and validated, and
//! carries an accessor that returns the destination field.
//!
//! ```
//! use stanza::schema::{FieldDescriptor, FieldFlags};
//!
//! #[derive(Default)]
//! struct Core {
//!     port: u32,
//!     name: Option<String>,
//!     verbose: bool,
//! }
//!
//! let fields: Vec<FieldDescriptor<Core>> = vec![
//!     FieldDescriptor::uint32("Port", 1, 65535, 2049, |c: &mut Core| &mut c.port).unique(),
//!     FieldDescriptor::string("Name", 1, 64, None, |c: &mut Core| &mut c.name).mandatory(),
//!     FieldDescriptor::boolean("Verbose", false, |c: &mut Core| &mut c.verbose),
//! ];
//! assert!(fields[0].flags.contains(FieldFlags::UNIQUE));
//! ```

mod ops;

pub use ops::{
    BlockDescriptor, BlockField, BlockOps, CommitOutcome, EmbeddedBlock, ListBlock, NestedBlock,
    Validator,
};

use crate::diagnostics::ConfigErrors;
use crate::tree::{NodeRef, Term};
use bitflags::bitflags;
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;

bitflags! {
    /// Per-field processing flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FieldFlags: u32 {
        /// At most one occurrence; later ones are errors.
        const UNIQUE = 1 << 0;
        /// Must occur at least once.
        const MANDATORY = 1 << 1;
        /// Unknown children of this block are not errors.
        const RELAX = 1 << 2;
        /// Record successful sets in a separate mask field.
        const MARK_SET = 1 << 3;
    }
}

impl Default for FieldFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Integer types a schema field can hold.
///
/// Conversion and range checks are done in `i128`, which holds every value
/// of every implementing type.
pub trait Integer: Copy + fmt::Debug + fmt::Display + PartialOrd + Send + Sync + 'static {
    /// True for signed types.
    const SIGNED: bool;
    /// Smallest representable value.
    const MIN_VALUE: i128;
    /// Largest representable value.
    const MAX_VALUE: i128;

    /// Widen to `i128`.
    fn to_i128(self) -> i128;

    /// Narrow from `i128`. Values outside the type's range give zero.
    fn from_i128(value: i128) -> Self;
}

macro_rules! impl_integer {
    ($($ty:ty => $signed:expr),* $(,)?) => {
        $(
            impl Integer for $ty {
                const SIGNED: bool = $signed;
                const MIN_VALUE: i128 = <$ty>::MIN as i128;
                const MAX_VALUE: i128 = <$ty>::MAX as i128;

                fn to_i128(self) -> i128 {
                    i128::from(self)
                }

                fn from_i128(value: i128) -> Self {
                    <$ty>::try_from(value).unwrap_or_default()
                }
            }
        )*
    };
}

impl_integer!(i16 => true, u16 => false, i32 => true, u32 => false, i64 => true, u64 => false);

/// Filesystem id, written `<major>.<minor>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Fsid {
    /// Major number.
    pub major: u64,
    /// Minor number.
    pub minor: u64,
}

impl fmt::Display for Fsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A port number held in network byte order.
///
/// ```
/// use stanza::schema::NetworkPort;
///
/// let port = NetworkPort::from_host(2049);
/// assert_eq!(port.to_be_bytes(), [0x08, 0x01]);
/// assert_eq!(port.host(), 2049);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NetworkPort([u8; 2]);

impl NetworkPort {
    /// Store a host-order port.
    #[must_use]
    pub const fn from_host(port: u16) -> Self {
        Self(port.to_be_bytes())
    }

    /// The port in host order.
    #[must_use]
    pub const fn host(self) -> u16 {
        u16::from_be_bytes(self.0)
    }

    /// The stored bytes, most significant first.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.0
    }
}

/// Returns the destination field of type `V` inside `T`.
pub type Accessor<T, V> = fn(&mut T) -> &mut V;

/// Token table for `Token`, `Enum` and `List` fields.
pub type TokenTable = &'static [(&'static str, u32)];

/// Custom value handler: called once per term of the matched statement.
/// It records its own diagnostics and returns how many errors it found.
pub type ProcHandler<T> = fn(&mut T, &Term, NodeRef<'_>, &mut ConfigErrors) -> usize;

/// Where to record that a field was explicitly set.
pub struct MarkSet<T> {
    /// Bit OR'd into the mask.
    pub bit: u32,
    /// The mask field.
    pub mask: Accessor<T, u32>,
}

/// Bounds, default and accessor of an integer field.
pub struct IntField<T, V> {
    /// Smallest accepted value.
    pub min: V,
    /// Largest accepted value.
    pub max: V,
    /// Value written during default initialization.
    pub default: V,
    /// Accept exactly 0 even when it is outside `[min, max]`.
    pub zero_ok: bool,
    /// Destination field.
    pub access: Accessor<T, V>,
}

/// Length bounds, default and accessor of a string or path field.
pub struct StrField<T> {
    /// Shortest accepted length in bytes.
    pub min_len: usize,
    /// Longest accepted length in bytes.
    pub max_len: usize,
    /// Value written during default initialization.
    pub default: Option<&'static str>,
    /// Destination field.
    pub access: Accessor<T, Option<String>>,
}

/// Table, default and accessor of a token, enum or list field.
pub struct TokenField<T> {
    /// Accepted words and their values, matched case-insensitively.
    pub table: TokenTable,
    /// Default bits.
    pub default: u32,
    /// Bits owned by this field inside the destination word.
    pub mask: u32,
    /// Destination field.
    pub access: Accessor<T, u32>,
}

/// Handler and optional initializer of a custom field.
pub struct ProcField<T> {
    /// Called during default initialization.
    pub init: Option<fn(&mut T)>,
    /// Called for each term of a matching statement.
    pub handler: ProcHandler<T>,
}

/// How a field's value is converted and where it goes.
pub enum FieldKind<T> {
    /// Recognized but ignored.
    Noop,
    /// Signed 16-bit integer.
    Int16(IntField<T, i16>),
    /// Unsigned 16-bit integer.
    UInt16(IntField<T, u16>),
    /// Signed 32-bit integer.
    Int32(IntField<T, i32>),
    /// Unsigned 32-bit integer.
    UInt32(IntField<T, u32>),
    /// Signed 64-bit integer.
    Int64(IntField<T, i64>),
    /// Unsigned 64-bit integer.
    UInt64(IntField<T, u64>),
    /// `<major>.<minor>` filesystem id.
    Fsid {
        /// Default id.
        default: Fsid,
        /// Destination field.
        access: Accessor<T, Fsid>,
    },
    /// Free-form string.
    String(StrField<T>),
    /// File system path (stored as text, not checked).
    Path(StrField<T>),
    /// One word from a table, replacing the destination.
    Token(TokenField<T>),
    /// One word from a table, merged into the masked bits.
    Enum(TokenField<T>),
    /// Comma-separated words from a table, OR'd together.
    List(TokenField<T>),
    /// `true`/`false` style boolean.
    Bool {
        /// Default value.
        default: bool,
        /// Destination field.
        access: Accessor<T, bool>,
    },
    /// Boolean stored as one bit of a flag word.
    BoolBit {
        /// Default value.
        default: bool,
        /// The bit.
        bit: u32,
        /// The flag word.
        access: Accessor<T, u32>,
    },
    /// IP address, numeric or resolved from a host name.
    IpAddr {
        /// Default address.
        default: IpAddr,
        /// Destination field.
        access: Accessor<T, IpAddr>,
    },
    /// 16-bit port stored in network byte order.
    InetPort {
        /// Smallest accepted port.
        min: u16,
        /// Largest accepted port.
        max: u16,
        /// Default port.
        default: u16,
        /// Destination field.
        access: Accessor<T, NetworkPort>,
    },
    /// Nested block with its own schema.
    Block(Box<dyn NestedBlock<T>>),
    /// Custom handler.
    Proc(ProcField<T>),
    /// Retired parameter; using it is reported and otherwise ignored.
    Deprecated(Option<&'static str>),
}

impl<T> FieldKind<T> {
    /// Short type name for traces and messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Int16(_) => "int16",
            Self::UInt16(_) => "uint16",
            Self::Int32(_) => "int32",
            Self::UInt32(_) => "uint32",
            Self::Int64(_) => "int64",
            Self::UInt64(_) => "uint64",
            Self::Fsid { .. } => "fsid",
            Self::String(_) => "string",
            Self::Path(_) => "path",
            Self::Token(_) => "token",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Bool { .. } => "bool",
            Self::BoolBit { .. } => "boolbit",
            Self::IpAddr { .. } => "ip_addr",
            Self::InetPort { .. } => "inet_port",
            Self::Block(_) => "block",
            Self::Proc(_) => "proc",
            Self::Deprecated(_) => "deprecated",
        }
    }
}

impl<T> fmt::Debug for FieldKind<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One named field of a schema.
pub struct FieldDescriptor<T> {
    /// Parameter name, matched case-insensitively.
    pub name: &'static str,
    /// Processing flags.
    pub flags: FieldFlags,
    /// Conversion and destination.
    pub kind: FieldKind<T>,
    /// Set-tracking mask, used when `flags` has [`FieldFlags::MARK_SET`].
    pub mark: Option<MarkSet<T>>,
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<T> FieldDescriptor<T> {
    /// Descriptor with no flags.
    #[must_use]
    pub fn new(name: &'static str, kind: FieldKind<T>) -> Self {
        Self {
            name,
            flags: FieldFlags::empty(),
            kind,
            mark: None,
        }
    }

    /// Add `flags`.
    #[must_use]
    pub fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Mark the field [`FieldFlags::UNIQUE`].
    #[must_use]
    pub fn unique(self) -> Self {
        self.with_flags(FieldFlags::UNIQUE)
    }

    /// Mark the field [`FieldFlags::MANDATORY`].
    #[must_use]
    pub fn mandatory(self) -> Self {
        self.with_flags(FieldFlags::MANDATORY)
    }

    /// Mark the field [`FieldFlags::RELAX`].
    #[must_use]
    pub fn relax(self) -> Self {
        self.with_flags(FieldFlags::RELAX)
    }

    /// OR `bit` into the mask returned by `mask` whenever this field is set
    /// from the file.
    #[must_use]
    pub fn mark_set(mut self, bit: u32, mask: Accessor<T, u32>) -> Self {
        self.flags |= FieldFlags::MARK_SET;
        self.mark = Some(MarkSet { bit, mask });
        self
    }

    /// Accept exactly 0 regardless of bounds. Only integer kinds use it.
    #[must_use]
    pub fn zero_ok(mut self) -> Self {
        match &mut self.kind {
            FieldKind::Int16(f) => f.zero_ok = true,
            FieldKind::UInt16(f) => f.zero_ok = true,
            FieldKind::Int32(f) => f.zero_ok = true,
            FieldKind::UInt32(f) => f.zero_ok = true,
            FieldKind::Int64(f) => f.zero_ok = true,
            FieldKind::UInt64(f) => f.zero_ok = true,
            _ => {}
        }
        self
    }

    /// Recognized parameter with no effect.
    #[must_use]
    pub fn noop(name: &'static str) -> Self {
        Self::new(name, FieldKind::Noop)
    }

    /// Signed 16-bit field.
    #[must_use]
    pub fn int16(name: &'static str, min: i16, max: i16, default: i16, access: Accessor<T, i16>) -> Self {
        Self::new(name, FieldKind::Int16(int_field(min, max, default, access)))
    }

    /// Unsigned 16-bit field.
    #[must_use]
    pub fn uint16(name: &'static str, min: u16, max: u16, default: u16, access: Accessor<T, u16>) -> Self {
        Self::new(name, FieldKind::UInt16(int_field(min, max, default, access)))
    }

    /// Signed 32-bit field.
    #[must_use]
    pub fn int32(name: &'static str, min: i32, max: i32, default: i32, access: Accessor<T, i32>) -> Self {
        Self::new(name, FieldKind::Int32(int_field(min, max, default, access)))
    }

    /// Unsigned 32-bit field.
    #[must_use]
    pub fn uint32(name: &'static str, min: u32, max: u32, default: u32, access: Accessor<T, u32>) -> Self {
        Self::new(name, FieldKind::UInt32(int_field(min, max, default, access)))
    }

    /// Signed 64-bit field.
    #[must_use]
    pub fn int64(name: &'static str, min: i64, max: i64, default: i64, access: Accessor<T, i64>) -> Self {
        Self::new(name, FieldKind::Int64(int_field(min, max, default, access)))
    }

    /// Unsigned 64-bit field.
    #[must_use]
    pub fn uint64(name: &'static str, min: u64, max: u64, default: u64, access: Accessor<T, u64>) -> Self {
        Self::new(name, FieldKind::UInt64(int_field(min, max, default, access)))
    }

    /// Filesystem id field.
    #[must_use]
    pub fn fsid(name: &'static str, default: Fsid, access: Accessor<T, Fsid>) -> Self {
        Self::new(name, FieldKind::Fsid { default, access })
    }

    /// String field with length bounds.
    #[must_use]
    pub fn string(
        name: &'static str,
        min_len: usize,
        max_len: usize,
        default: Option<&'static str>,
        access: Accessor<T, Option<String>>,
    ) -> Self {
        Self::new(
            name,
            FieldKind::String(StrField {
                min_len,
                max_len,
                default,
                access,
            }),
        )
    }

    /// Path field with length bounds.
    #[must_use]
    pub fn path(
        name: &'static str,
        min_len: usize,
        max_len: usize,
        default: Option<&'static str>,
        access: Accessor<T, Option<String>>,
    ) -> Self {
        Self::new(
            name,
            FieldKind::Path(StrField {
                min_len,
                max_len,
                default,
                access,
            }),
        )
    }

    /// Single word replacing the destination value.
    #[must_use]
    pub fn token(name: &'static str, table: TokenTable, default: u32, access: Accessor<T, u32>) -> Self {
        Self::new(
            name,
            FieldKind::Token(TokenField {
                table,
                default,
                mask: u32::MAX,
                access,
            }),
        )
    }

    /// Single word merged into the `mask` bits of the destination.
    #[must_use]
    pub fn enumeration(
        name: &'static str,
        table: TokenTable,
        default: u32,
        mask: u32,
        access: Accessor<T, u32>,
    ) -> Self {
        Self::new(
            name,
            FieldKind::Enum(TokenField {
                table,
                default,
                mask,
                access,
            }),
        )
    }

    /// Word list OR'd into the `mask` bits of the destination.
    #[must_use]
    pub fn list(
        name: &'static str,
        table: TokenTable,
        default: u32,
        mask: u32,
        access: Accessor<T, u32>,
    ) -> Self {
        Self::new(
            name,
            FieldKind::List(TokenField {
                table,
                default,
                mask,
                access,
            }),
        )
    }

    /// Boolean field.
    #[must_use]
    pub fn boolean(name: &'static str, default: bool, access: Accessor<T, bool>) -> Self {
        Self::new(name, FieldKind::Bool { default, access })
    }

    /// Boolean stored as `bit` of a flag word.
    #[must_use]
    pub fn bool_bit(name: &'static str, default: bool, bit: u32, access: Accessor<T, u32>) -> Self {
        Self::new(
            name,
            FieldKind::BoolBit {
                default,
                bit,
                access,
            },
        )
    }

    /// IP address field.
    #[must_use]
    pub fn ip_addr(name: &'static str, default: IpAddr, access: Accessor<T, IpAddr>) -> Self {
        Self::new(name, FieldKind::IpAddr { default, access })
    }

    /// Network port field.
    #[must_use]
    pub fn inet_port(
        name: &'static str,
        min: u16,
        max: u16,
        default: u16,
        access: Accessor<T, NetworkPort>,
    ) -> Self {
        Self::new(
            name,
            FieldKind::InetPort {
                min,
                max,
                default,
                access,
            },
        )
    }

    /// Custom field processed by `handler`.
    #[must_use]
    pub fn proc(name: &'static str, init: Option<fn(&mut T)>, handler: ProcHandler<T>) -> Self {
        Self::new(name, FieldKind::Proc(ProcField { init, handler }))
    }

    /// Retired parameter.
    #[must_use]
    pub fn deprecated(name: &'static str, message: Option<&'static str>) -> Self {
        Self::new(name, FieldKind::Deprecated(message))
    }
}

impl<T: 'static> FieldDescriptor<T> {
    /// Nested block stored through `link`.
    #[must_use]
    pub fn block<O>(name: &'static str, block: BlockDescriptor<O>, link: Accessor<T, O::Link>) -> Self
    where
        O: BlockOps + 'static,
        O::Link: 'static,
        O::Item: 'static,
    {
        Self::new(name, FieldKind::Block(Box::new(BlockField::new(block, link))))
    }
}

fn int_field<T, V: Integer>(min: V, max: V, default: V, access: Accessor<T, V>) -> IntField<T, V> {
    IntField {
        min,
        max,
        default,
        zero_ok: false,
        access,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Dest {
        a: u32,
        mask: u32,
    }

    #[test]
    fn test_builder_flags() {
        let f = FieldDescriptor::uint32("A", 0, 9, 1, |d: &mut Dest| &mut d.a)
            .unique()
            .mandatory()
            .mark_set(0x4, |d: &mut Dest| &mut d.mask);
        assert!(f.flags.contains(FieldFlags::UNIQUE | FieldFlags::MANDATORY | FieldFlags::MARK_SET));
        assert_eq!(f.mark.map(|m| m.bit), Some(0x4));
        assert_eq!(f.kind.type_name(), "uint32");
    }

    #[test]
    fn test_zero_ok_only_touches_integers() {
        let f = FieldDescriptor::uint32("A", 5, 9, 5, |d: &mut Dest| &mut d.a).zero_ok();
        assert!(matches!(f.kind, FieldKind::UInt32(IntField { zero_ok: true, .. })));

        let b = FieldDescriptor::<Dest>::noop("B").zero_ok();
        assert!(matches!(b.kind, FieldKind::Noop));
    }

    #[test]
    fn test_accessor_reaches_field() {
        let f = FieldDescriptor::uint32("A", 0, 9, 1, |d: &mut Dest| &mut d.a);
        let mut dest = Dest::default();
        if let FieldKind::UInt32(int) = &f.kind {
            *(int.access)(&mut dest) = 7;
        }
        assert_eq!(dest.a, 7);
    }

    #[test]
    fn test_integer_bounds() {
        assert_eq!(u16::MAX_VALUE, 65_535);
        assert_eq!(i64::MIN_VALUE, i128::from(i64::MIN));
        assert_eq!(u32::from_i128(-1), 0);
        assert_eq!(i16::from_i128(-7), -7);
        assert!(!u64::SIGNED);
    }

    #[test]
    fn test_network_port_order() {
        let p = NetworkPort::from_host(0x1234);
        assert_eq!(p.to_be_bytes(), [0x12, 0x34]);
        assert_eq!(p.host(), 0x1234);
    }

    #[test]
    fn test_fsid_display() {
        let id = Fsid { major: 1, minor: 2 };
        assert_eq!(id.to_string(), "1.2");
    }
}
