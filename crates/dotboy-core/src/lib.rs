//! Game Boy (DMG) emulation core.
//!
//! This crate contains the platform-agnostic emulator logic (CPU/MMU/PPU/timer
//! and the MBC1 cartridge). Frontends live in separate crates and drive the
//! core via the [`gameboy`] facade.

/// Pure flag-computing arithmetic shared by the CPU instructions.
pub mod alu;

/// Cartridge header parsing and the ROM-only/MBC1 bank controllers.
pub mod cartridge;

/// SM83 CPU core.
pub mod cpu;

/// Instruction decoder used by tracing and debug output.
pub mod disasm;

/// Load-time errors.
pub mod error;

/// High-level facade that wires the CPU and MMU into a single machine.
pub mod gameboy;

/// Interrupt sources, masks and vectors.
pub mod interrupt;

/// Joypad register and the shared button state.
pub mod joypad;

/// Memory map and hardware plumbing.
pub mod mmu;

/// Cycle cost of every opcode.
pub mod opcodes;

/// Pixel Processing Unit (PPU) emulation.
pub mod ppu;

/// CPU register file.
pub mod registers;

/// Divider/timer unit.
pub mod timer;

pub use error::{Error, Result};
