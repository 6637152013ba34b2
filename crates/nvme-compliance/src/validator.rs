//! Controller register compliance checks.
//!
//! Two properties are verified for every register that applies to the active specification
//! revision:
//! - RO bits that are not implementation specific hold their mandated default value;
//! - those bits cannot be changed by software, whichever polarity is written to them.
//!
//! The RO probes write to the device. On a compliant device they are unobservable: every value
//! that sticks is by definition a defect.

use tracing::{debug, error, info};

use crate::error::{ComplianceError, Probe, ValidationError};
use crate::regs::{Chunk, RegisterDescriptor, RegisterId, RegisterMap, SpecRevision};
use crate::transport::RegisterTransport;

/// Lowest bit position at which `actual` and `expected` differ, or `None` if they are equal.
pub fn offending_bit_pos(actual: u64, expected: u64) -> Option<u32> {
    let diff = actual ^ expected;
    (diff != 0).then(|| diff.trailing_zeros())
}

/// Runs compliance passes over a register map.
///
/// The validator holds the transport exclusively for its lifetime; the read/modify/check
/// sequence of the RO probes is only meaningful without a concurrent writer.
pub struct ComplianceValidator<'a, T: RegisterTransport + ?Sized> {
    map: &'a RegisterMap,
    transport: &'a mut T,
    revision: SpecRevision,
}

impl<'a, T: RegisterTransport + ?Sized> ComplianceValidator<'a, T> {
    pub fn new(map: &'a RegisterMap, transport: &'a mut T, revision: SpecRevision) -> Self {
        ComplianceValidator {
            map,
            transport,
            revision,
        }
    }

    pub fn revision(&self) -> SpecRevision {
        self.revision
    }

    /// Default values first, then RO immutability. Returns the number of registers that apply to
    /// the active revision; a pass over zero registers has verified nothing.
    pub fn run(&mut self) -> Result<usize, ValidationError> {
        let checked = self.validate_defaults()?;
        self.validate_ro_after_write()?;
        Ok(checked)
    }

    /// Checks the RO bits of every applicable register against their defaults. Returns the number
    /// of registers checked.
    pub fn validate_defaults(&mut self) -> Result<usize, ValidationError> {
        let map = self.map;
        let revision = self.revision;
        info!(%revision, "validating default register values");

        let mut checked = 0usize;
        for (id, reg) in map.iter().filter(|(_, reg)| reg.spec_rev() == revision) {
            self.check_register(id, reg, Probe::Defaults)?;
            checked += 1;
        }

        info!(checked, "default register values are compliant");
        Ok(checked)
    }

    /// Checks the defaults of a single register, regardless of its revision.
    pub fn validate_register(&mut self, id: RegisterId) -> Result<(), ValidationError> {
        let map = self.map;
        let reg = map.get(id).ok_or(ValidationError::UnknownRegister(id))?;
        self.check_register(id, reg, Probe::Defaults)
    }

    /// Tries to force the RO bits of every applicable, writable register to 1 and then to 0,
    /// re-checking the defaults after each write. Returns the number of registers written.
    pub fn validate_ro_after_write(&mut self) -> Result<usize, ValidationError> {
        let map = self.map;
        let revision = self.revision;
        info!(%revision, "validating RO bits after writing");

        let mut probed = 0usize;
        for (id, reg) in map.iter().filter(|(_, reg)| reg.spec_rev() == revision) {
            // Reserved areas are not supposed to be written.
            if reg.is_reserved() {
                debug!(register = reg.desc(), "skipping reserved register");
                continue;
            }

            let original = self.read_register(id, reg)?;

            debug!(register = reg.desc(), "validate RO attribute after trying to write 1");
            let ones: Vec<u64> = reg
                .chunks()
                .zip(&original)
                .map(|(chunk, value)| value | reg.read_only_mask().chunk(chunk.index))
                .collect();
            self.write_register(id, reg, &ones)?;
            self.check_register(id, reg, Probe::WriteOnes)?;

            debug!(register = reg.desc(), "validate RO attribute after trying to write 0");
            let zeros: Vec<u64> = reg
                .chunks()
                .zip(&original)
                .map(|(chunk, value)| value & !reg.read_only_mask().chunk(chunk.index))
                .collect();
            self.write_register(id, reg, &zeros)?;
            self.check_register(id, reg, Probe::WriteZeros)?;
            probed += 1;
        }

        info!(probed, "RO bits are immutable");
        Ok(probed)
    }

    fn check_register(
        &mut self,
        id: RegisterId,
        reg: &RegisterDescriptor,
        probe: Probe,
    ) -> Result<(), ValidationError> {
        for chunk in reg.chunks() {
            let value = self.read_chunk(id, reg, &chunk)?;
            let actual = value & reg.checked_bits(&chunk);
            let expected = reg.expected_bits(&chunk);

            if let Some(bit) = offending_bit_pos(actual, expected) {
                error!(
                    register = reg.desc(),
                    chunk = chunk.index,
                    bit,
                    %probe,
                    "{} RO bit #{} has incorrect value",
                    reg.desc(),
                    bit
                );
                return Err(ComplianceError::Register {
                    register: id,
                    desc: reg.desc().to_string(),
                    chunk: chunk.index,
                    expected,
                    actual,
                    bit,
                    probe,
                }
                .into());
            }
        }
        Ok(())
    }

    fn read_register(
        &mut self,
        id: RegisterId,
        reg: &RegisterDescriptor,
    ) -> Result<Vec<u64>, ValidationError> {
        reg.chunks()
            .map(|chunk| self.read_chunk(id, reg, &chunk))
            .collect()
    }

    fn write_register(
        &mut self,
        id: RegisterId,
        reg: &RegisterDescriptor,
        values: &[u64],
    ) -> Result<(), ValidationError> {
        for (chunk, value) in reg.chunks().zip(values) {
            self.transport
                .write(chunk.offset, chunk.width, value & chunk.width_mask())
                .map_err(|source| ValidationError::Transport {
                    register: id,
                    desc: reg.desc().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    fn read_chunk(
        &mut self,
        id: RegisterId,
        reg: &RegisterDescriptor,
        chunk: &Chunk,
    ) -> Result<u64, ValidationError> {
        self.transport
            .read(chunk.offset, chunk.width)
            .map_err(|source| ValidationError::Transport {
                register: id,
                desc: reg.desc().to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offending_bit_is_lowest_difference() {
        assert_eq!(offending_bit_pos(0b1010, 0b1000), Some(1));
        assert_eq!(offending_bit_pos(0b1000, 0b1010), Some(1));
        assert_eq!(offending_bit_pos(0, 1 << 63), Some(63));
        assert_eq!(offending_bit_pos(0xffff_0000, 0xfffe_0000), Some(16));
    }

    #[test]
    fn equal_values_have_no_offending_bit() {
        assert_eq!(offending_bit_pos(0, 0), None);
        assert_eq!(offending_bit_pos(u64::MAX, u64::MAX), None);
    }
}
