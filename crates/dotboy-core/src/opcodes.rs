//! Instruction descriptors: the M-cycle cost of every opcode.
//!
//! Both tables are indexed by the opcode byte, the second one by the byte
//! following a 0xCB prefix. Conditional branches list their not-taken cost
//! here; [`taken_cycles`] gives the cost when the branch is followed.

#[rustfmt::skip]
const BASE: [u8; 256] = [
//  x0 x1 x2 x3 x4 x5 x6 x7 x8 x9 xA xB xC xD xE xF
    1, 3, 2, 2, 1, 1, 2, 1, 5, 2, 2, 2, 1, 1, 2, 1, // 0x
    1, 3, 2, 2, 1, 1, 2, 1, 3, 2, 2, 2, 1, 1, 2, 1, // 1x
    2, 3, 2, 2, 1, 1, 2, 1, 2, 2, 2, 2, 1, 1, 2, 1, // 2x
    2, 3, 2, 2, 3, 3, 3, 1, 2, 2, 2, 2, 1, 1, 2, 1, // 3x
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 4x
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 5x
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 6x
    2, 2, 2, 2, 2, 2, 1, 2, 1, 1, 1, 1, 1, 1, 2, 1, // 7x
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 8x
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 9x
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // Ax
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // Bx
    2, 3, 3, 4, 3, 3, 2, 4, 2, 4, 3, 0, 3, 6, 2, 4, // Cx
    2, 3, 3, 1, 3, 3, 2, 4, 2, 4, 3, 1, 3, 1, 2, 4, // Dx
    2, 3, 2, 1, 1, 3, 2, 4, 4, 1, 4, 1, 1, 1, 2, 4, // Ex
    3, 3, 2, 1, 1, 3, 2, 4, 3, 2, 4, 1, 1, 1, 2, 4, // Fx
];

// Register operands cost 2, (HL) operands 4.
const EXTENDED: [u8; 256] = {
    let mut table = [2u8; 256];
    let mut op = 6;
    while op < 256 {
        table[op] = 4;
        op += 8;
    }
    table
};

/// Opcodes with no instruction behind them. They execute as 1-cycle no-ops.
pub const UNASSIGNED: [u8; 11] = [
    0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
];

/// Cost in M-cycles of `opcode`, or of the CB-prefixed `opcode` when
/// `extended` is set. The 0xCB byte itself has no cost of its own.
pub fn cycles(opcode: u8, extended: bool) -> u8 {
    if extended {
        EXTENDED[opcode as usize]
    } else {
        BASE[opcode as usize]
    }
}

/// Cost of a conditional branch whose condition held.
pub fn taken_cycles(opcode: u8) -> Option<u8> {
    match opcode {
        0x20 | 0x28 | 0x30 | 0x38 => Some(3),
        0xC2 | 0xCA | 0xD2 | 0xDA => Some(4),
        0xC4 | 0xCC | 0xD4 | 0xDC => Some(6),
        0xC0 | 0xC8 | 0xD0 | 0xD8 => Some(5),
        _ => None,
    }
}

pub fn is_unassigned(opcode: u8) -> bool {
    UNASSIGNED.contains(&opcode)
}
