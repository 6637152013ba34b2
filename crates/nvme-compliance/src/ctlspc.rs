//! NVMe 1.0b controller register space (BAR0 offsets 0x00..0xF00).
//!
//! Masks follow section 3.1 of the 1.0b specification. Fields whose value depends on the
//! controller's capabilities or current state (CAP.MQES, CSTS.RDY, ...) are marked
//! implementation specific; every reserved bit is RO with a default of 0.

use crate::regs::{RegisterDescriptor, RegisterId, RegisterMap, SpecRevision};

pub const CAP: RegisterId = RegisterId(0);
pub const VS: RegisterId = RegisterId(1);
pub const INTMS: RegisterId = RegisterId(2);
pub const INTMC: RegisterId = RegisterId(3);
pub const CC: RegisterId = RegisterId(4);
pub const RES1: RegisterId = RegisterId(5);
pub const CSTS: RegisterId = RegisterId(6);
pub const RES2: RegisterId = RegisterId(7);
pub const AQA: RegisterId = RegisterId(8);
pub const ASQ: RegisterId = RegisterId(9);
pub const ACQ: RegisterId = RegisterId(10);
pub const RES3: RegisterId = RegisterId(11);

pub const REG_CAP: u64 = 0x00;
pub const REG_VS: u64 = 0x08;
pub const REG_INTMS: u64 = 0x0c;
pub const REG_INTMC: u64 = 0x10;
pub const REG_CC: u64 = 0x14;
pub const REG_RES1: u64 = 0x18;
pub const REG_CSTS: u64 = 0x1c;
pub const REG_RES2: u64 = 0x20;
pub const REG_AQA: u64 = 0x24;
pub const REG_ASQ: u64 = 0x28;
pub const REG_ACQ: u64 = 0x30;
pub const REG_RES3: u64 = 0x38;

/// First byte past the controller registers; doorbells start here.
pub const CTLSPC_END: u64 = 0xf00;

// CAP: MQES 15:0, CQR 16, AMS 18:17, TO 31:24, DSTRD 35:32, CSS 44:37, MPSMIN 51:48,
// MPSMAX 55:52.
const CAP_IMPL_SPEC: u64 = 0x00ff_1fef_ff07_ffff;
// CSTS: RDY 0, CFS 1, SHST 3:2 track controller state.
const CSTS_IMPL_SPEC: u64 = 0x0000_000f;
// CC: bits 3:1 and 31:24 are reserved.
const CC_RO: u64 = 0xff00_000e;
// AQA: bits 15:12 and 31:28 are reserved.
const AQA_RO: u64 = 0xf000_f000;
// ASQ/ACQ: base addresses are 4KiB aligned, bits 11:0 are reserved.
const QUEUE_BASE_RO: u64 = 0x0000_0000_0000_0fff;

/// NVMe 1.0b.
const VS_1_0: u64 = 0x0001_0000;

/// Builds the register map for NVMe revision 1.0b, in offset order.
pub fn nvme_1_0b() -> RegisterMap {
    let rev = SpecRevision::V1_0b;
    let table = [
        (
            CAP,
            reg("CAP", REG_CAP, 8, rev)
                .with_read_only(u64::MAX)
                .with_impl_specific(CAP_IMPL_SPEC),
        ),
        (
            VS,
            reg("VS", REG_VS, 4, rev)
                .with_read_only(0xffff_ffffu64)
                .with_default(VS_1_0),
        ),
        // INTMS/INTMC are RW1S/RW1C over the whole register.
        (INTMS, reg("INTMS", REG_INTMS, 4, rev)),
        (INTMC, reg("INTMC", REG_INTMC, 4, rev)),
        (CC, reg("CC", REG_CC, 4, rev).with_read_only(CC_RO)),
        (
            RES1,
            reg("RES1", REG_RES1, 4, rev)
                .with_read_only(0xffff_ffffu64)
                .reserved(),
        ),
        (
            CSTS,
            reg("CSTS", REG_CSTS, 4, rev)
                .with_read_only(0xffff_ffffu64)
                .with_impl_specific(CSTS_IMPL_SPEC),
        ),
        (
            RES2,
            reg("RES2", REG_RES2, 4, rev)
                .with_read_only(0xffff_ffffu64)
                .reserved(),
        ),
        (AQA, reg("AQA", REG_AQA, 4, rev).with_read_only(AQA_RO)),
        (ASQ, reg("ASQ", REG_ASQ, 8, rev).with_read_only(QUEUE_BASE_RO)),
        (ACQ, reg("ACQ", REG_ACQ, 8, rev).with_read_only(QUEUE_BASE_RO)),
        (
            RES3,
            reg("RES3", REG_RES3, (CTLSPC_END - REG_RES3) as usize, rev)
                .with_read_only(u64::MAX)
                .reserved(),
        ),
    ];

    let mut map = RegisterMap::new();
    for (id, descriptor) in table {
        map.insert(id, descriptor)
            .expect("NVMe 1.0b register ids are unique");
    }
    map
}

fn reg(desc: &str, offset: u64, size: usize, rev: SpecRevision) -> RegisterDescriptor {
    RegisterDescriptor::new(desc, offset, size, rev)
        .expect("NVMe 1.0b register table is well formed")
}
