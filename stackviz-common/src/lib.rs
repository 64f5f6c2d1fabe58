//! # Shared Wire Layout (instrumented target ↔ stackviz)
//!
//! Defines the datagram layout emitted by instrumented targets and consumed by
//! the `stackviz` receiver. The reference sender is a C++ `-finstrument-functions`
//! hook that `memcpy`s native x86-64 values into a 28-byte buffer, so every
//! field is little-endian and the record is packed (no padding).
//!
//! ## Layout
//!
//! ```text
//! offset  size  field
//! 0       4     stack_depth   (u32)
//! 4       8     timestamp_ns  (u64)
//! 12      8     pc            (u64)
//! 20      8     sp            (u64)
//! ```
//!
//! ## Key Types
//!
//! - [`Sample`] - one decoded measurement
//! - [`SAMPLE_SIZE`] - the only datagram length accepted by the receiver

#![no_std]

// ============================================================================
// Protocol Constants
// ============================================================================

/// Exact length of a sample datagram in bytes.
///
/// Any datagram with a different length is a protocol violation.
pub const SAMPLE_SIZE: usize = 4 + 8 + 8 + 8;

/// Default UDP port the instrumented target sends to.
pub const DEFAULT_PORT: u16 = 7155;

const DEPTH_OFFSET: usize = 0;
const TIMESTAMP_OFFSET: usize = 4;
const PC_OFFSET: usize = 12;
const SP_OFFSET: usize = 20;

// ============================================================================
// Shared Data Structures
// ============================================================================

/// One stack-depth sample captured by the instrumented target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sample {
    /// Call-stack depth at capture time
    pub stack_depth: u32,

    /// Capture time in nanoseconds since an arbitrary, sender-chosen epoch
    pub timestamp_ns: u64,

    /// Instruction pointer (call site) at capture time
    pub pc: u64,

    /// Stack pointer at capture time
    ///
    /// Stacks grow toward lower addresses: a smaller `sp` means more stack in use.
    pub sp: u64,
}

impl Sample {
    /// Encode into the fixed wire layout.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SAMPLE_SIZE] {
        let mut buf = [0u8; SAMPLE_SIZE];
        buf[DEPTH_OFFSET..TIMESTAMP_OFFSET].copy_from_slice(&self.stack_depth.to_le_bytes());
        buf[TIMESTAMP_OFFSET..PC_OFFSET].copy_from_slice(&self.timestamp_ns.to_le_bytes());
        buf[PC_OFFSET..SP_OFFSET].copy_from_slice(&self.pc.to_le_bytes());
        buf[SP_OFFSET..SAMPLE_SIZE].copy_from_slice(&self.sp.to_le_bytes());
        buf
    }

    /// Decode from the fixed wire layout.
    ///
    /// Returns `None` unless `bytes` is exactly [`SAMPLE_SIZE`] long.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; SAMPLE_SIZE] = bytes.try_into().ok()?;

        let mut depth = [0u8; 4];
        let mut timestamp = [0u8; 8];
        let mut pc = [0u8; 8];
        let mut sp = [0u8; 8];
        depth.copy_from_slice(&bytes[DEPTH_OFFSET..TIMESTAMP_OFFSET]);
        timestamp.copy_from_slice(&bytes[TIMESTAMP_OFFSET..PC_OFFSET]);
        pc.copy_from_slice(&bytes[PC_OFFSET..SP_OFFSET]);
        sp.copy_from_slice(&bytes[SP_OFFSET..SAMPLE_SIZE]);

        Some(Self {
            stack_depth: u32::from_le_bytes(depth),
            timestamp_ns: u64::from_le_bytes(timestamp),
            pc: u64::from_le_bytes(pc),
            sp: u64::from_le_bytes(sp),
        })
    }
}
