//! Register descriptors and register maps.
//!
//! A [`RegisterDescriptor`] describes one register (or reserved region) of the controller's BAR0
//! space together with the bits the device must hold at their reset value. Registers wider than
//! [`NATIVE_ACCESS_WIDTH`] are accessed in native-width chunks; the chunk layout is resolved once
//! when the descriptor is built (see [`RegisterShape`]).

use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, DescriptorError};

/// Widest single access the register transport performs, in bytes.
pub const NATIVE_ACCESS_WIDTH: usize = 8;

/// Identifier of a register within a [`RegisterMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisterId(pub u16);

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// NVM Express specification revision a descriptor's rules belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecRevision {
    V1_0b,
    V1_1,
}

impl fmt::Display for SpecRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecRevision::V1_0b => f.write_str("1.0b"),
            SpecRevision::V1_1 => f.write_str("1.1"),
        }
    }
}

impl FromStr for SpecRevision {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.0b" | "10b" => Ok(SpecRevision::V1_0b),
            "1.1" | "11" => Ok(SpecRevision::V1_1),
            other => Err(ConfigError::UnknownRevision(other.to_string())),
        }
    }
}

/// Bit pattern spanning a whole register.
///
/// `Word` repeats the same 64-bit value in every native-width chunk, which is how uniform regions
/// (e.g. an all-RO reserved range) are described. `Words` lists the chunks explicitly in
/// little-endian order; chunks past the end of the list read as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitPattern {
    Word(u64),
    Words(Vec<u64>),
}

impl BitPattern {
    pub const ZERO: BitPattern = BitPattern::Word(0);

    pub fn chunk(&self, index: usize) -> u64 {
        match self {
            BitPattern::Word(word) => *word,
            BitPattern::Words(words) => words.get(index).copied().unwrap_or(0),
        }
    }
}

impl Default for BitPattern {
    fn default() -> Self {
        BitPattern::ZERO
    }
}

impl From<u64> for BitPattern {
    fn from(word: u64) -> Self {
        BitPattern::Word(word)
    }
}

impl From<Vec<u64>> for BitPattern {
    fn from(words: Vec<u64>) -> Self {
        BitPattern::Words(words)
    }
}

/// Access layout of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterShape {
    /// Accessed with a single read/write of the register's own width.
    Native,
    /// Accessed as `chunks` consecutive native-width pieces.
    Wide { chunks: usize },
}

/// One native-width access making up (part of) a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub offset: u64,
    pub width: usize,
}

impl Chunk {
    /// Bits covered by this access.
    pub fn width_mask(&self) -> u64 {
        if self.width >= NATIVE_ACCESS_WIDTH {
            u64::MAX
        } else {
            (1u64 << (self.width * 8)) - 1
        }
    }
}

/// Static description of a controller register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDescriptor {
    desc: String,
    offset: u64,
    size: usize,
    shape: RegisterShape,
    spec_rev: SpecRevision,
    default_value: BitPattern,
    read_only_mask: BitPattern,
    impl_specific_mask: BitPattern,
    reserved: bool,
}

impl RegisterDescriptor {
    /// Describes a register with no RO bits and a zero default; use the `with_*` builders to fill
    /// in the masks.
    pub fn new(
        desc: impl Into<String>,
        offset: u64,
        size: usize,
        spec_rev: SpecRevision,
    ) -> Result<Self, DescriptorError> {
        let desc = desc.into();
        if size == 0 {
            return Err(DescriptorError::ZeroSize { desc });
        }
        // Native registers take one power-of-two access; wide ones are whole native chunks.
        let supported = if size <= NATIVE_ACCESS_WIDTH {
            size.is_power_of_two()
        } else {
            size % NATIVE_ACCESS_WIDTH == 0
        };
        if !supported {
            return Err(DescriptorError::UnsupportedWidth { desc, size });
        }
        let align = size.min(NATIVE_ACCESS_WIDTH);
        if offset % align as u64 != 0 {
            return Err(DescriptorError::UnalignedOffset {
                desc,
                offset,
                align,
            });
        }
        if offset.checked_add(size as u64).is_none() {
            return Err(DescriptorError::OffsetOverflow { desc, offset, size });
        }

        let shape = if size > NATIVE_ACCESS_WIDTH {
            RegisterShape::Wide {
                chunks: size / NATIVE_ACCESS_WIDTH,
            }
        } else {
            RegisterShape::Native
        };

        Ok(RegisterDescriptor {
            desc,
            offset,
            size,
            shape,
            spec_rev,
            default_value: BitPattern::ZERO,
            read_only_mask: BitPattern::ZERO,
            impl_specific_mask: BitPattern::ZERO,
            reserved: false,
        })
    }

    pub fn with_default(mut self, value: impl Into<BitPattern>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn with_read_only(mut self, mask: impl Into<BitPattern>) -> Self {
        self.read_only_mask = mask.into();
        self
    }

    pub fn with_impl_specific(mut self, mask: impl Into<BitPattern>) -> Self {
        self.impl_specific_mask = mask.into();
        self
    }

    /// Marks the register as a reserved region that software must not write.
    pub fn reserved(mut self) -> Self {
        self.reserved = true;
        self
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn shape(&self) -> RegisterShape {
        self.shape
    }

    pub fn spec_rev(&self) -> SpecRevision {
        self.spec_rev
    }

    pub fn default_value(&self) -> &BitPattern {
        &self.default_value
    }

    pub fn read_only_mask(&self) -> &BitPattern {
        &self.read_only_mask
    }

    pub fn impl_specific_mask(&self) -> &BitPattern {
        &self.impl_specific_mask
    }

    pub fn is_reserved(&self) -> bool {
        self.reserved
    }

    /// Accesses needed to cover the whole register, in ascending offset order.
    pub fn chunks(&self) -> impl Iterator<Item = Chunk> + '_ {
        let count = match self.shape {
            RegisterShape::Native => 1,
            RegisterShape::Wide { chunks } => chunks,
        };
        (0..count).map(move |index| {
            let start = index * NATIVE_ACCESS_WIDTH;
            Chunk {
                index,
                offset: self.offset + start as u64,
                width: (self.size - start).min(NATIVE_ACCESS_WIDTH),
            }
        })
    }

    /// Bits of `chunk` that take part in compliance checking: RO and not implementation specific.
    pub fn checked_bits(&self, chunk: &Chunk) -> u64 {
        self.read_only_mask.chunk(chunk.index)
            & !self.impl_specific_mask.chunk(chunk.index)
            & chunk.width_mask()
    }

    /// Mandated value of the checked bits of `chunk`.
    pub fn expected_bits(&self, chunk: &Chunk) -> u64 {
        self.default_value.chunk(chunk.index) & self.checked_bits(chunk)
    }
}

/// Ordered set of register descriptors.
///
/// Iteration follows insertion order so reports are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterMap {
    entries: Vec<(RegisterId, RegisterDescriptor)>,
}

impl RegisterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        id: RegisterId,
        descriptor: RegisterDescriptor,
    ) -> Result<(), DescriptorError> {
        if self.get(id).is_some() {
            return Err(DescriptorError::DuplicateId(id));
        }
        self.entries.push((id, descriptor));
        Ok(())
    }

    pub fn get(&self, id: RegisterId) -> Option<&RegisterDescriptor> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, descriptor)| descriptor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegisterId, &RegisterDescriptor)> + '_ {
        self.entries.iter().map(|(id, descriptor)| (*id, descriptor))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One past the highest byte offset covered by any register.
    pub fn extent(&self) -> u64 {
        self.entries
            .iter()
            .map(|(_, descriptor)| descriptor.offset + descriptor.size as u64)
            .max()
            .unwrap_or(0)
    }
}
