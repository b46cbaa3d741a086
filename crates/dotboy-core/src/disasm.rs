use std::fmt;

use crate::opcodes;

const R8: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];
const R16: [&str; 4] = ["BC", "DE", "HL", "SP"];
const R16_STACK: [&str; 4] = ["BC", "DE", "HL", "AF"];
const CONDITIONS: [&str; 4] = ["NZ", "Z", "NC", "C"];
const ALU: [&str; 8] = ["ADD A,", "ADC A,", "SUB ", "SBC A,", "AND ", "XOR ", "OR ", "CP "];
const SHIFTS: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SWAP", "SRL"];
const ACCUMULATOR_OPS: [&str; 8] = ["RLCA", "RRCA", "RLA", "RRA", "DAA", "CPL", "SCF", "CCF"];
const INDIRECT_A: [&str; 4] = ["(BC)", "(DE)", "(HL+)", "(HL-)"];

/// One decoded SM83 instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: String,
    /// Encoded length in bytes, including any 0xCB prefix
    pub len: u16,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.mnemonic)
    }
}

/// Decode the instruction at `addr`, reading bytes through `read`.
pub fn disassemble(addr: u16, read: impl Fn(u16) -> u8) -> Instruction {
    let op = read(addr);
    let n8 = || read(addr.wrapping_add(1));
    let n16 = || u16::from_le_bytes([read(addr.wrapping_add(1)), read(addr.wrapping_add(2))]);
    let e8 = || n8() as i8;
    let ins = |mnemonic: String, len: u16| Instruction { mnemonic, len };

    if op == 0xCB {
        return decode_extended(n8());
    }
    if opcodes::is_unassigned(op) {
        return ins(format!("DB ${op:02X}"), 1);
    }

    let y = (op >> 3) & 0x07;
    let z = op & 0x07;
    let p = (y >> 1) as usize;
    let cond = CONDITIONS[(y & 0x03) as usize];

    match op {
        0x00 => ins("NOP".into(), 1),
        0x08 => ins(format!("LD (${:04X}),SP", n16()), 3),
        0x10 => ins("STOP".into(), 2),
        0x18 | 0x20 | 0x28 | 0x30 | 0x38 => {
            let target = addr.wrapping_add(2).wrapping_add(e8() as u16);
            if op == 0x18 {
                ins(format!("JR ${target:04X}"), 2)
            } else {
                ins(format!("JR {cond},${target:04X}"), 2)
            }
        }
        0x01 | 0x11 | 0x21 | 0x31 => ins(format!("LD {},${:04X}", R16[p], n16()), 3),
        0x09 | 0x19 | 0x29 | 0x39 => ins(format!("ADD HL,{}", R16[p]), 1),
        0x02 | 0x12 | 0x22 | 0x32 => ins(format!("LD {},A", INDIRECT_A[p]), 1),
        0x0A | 0x1A | 0x2A | 0x3A => ins(format!("LD A,{}", INDIRECT_A[p]), 1),
        0x03 | 0x13 | 0x23 | 0x33 => ins(format!("INC {}", R16[p]), 1),
        0x0B | 0x1B | 0x2B | 0x3B => ins(format!("DEC {}", R16[p]), 1),
        0x00..=0x3F if z == 4 => ins(format!("INC {}", R8[y as usize]), 1),
        0x00..=0x3F if z == 5 => ins(format!("DEC {}", R8[y as usize]), 1),
        0x00..=0x3F if z == 6 => ins(format!("LD {},${:02X}", R8[y as usize], n8()), 2),
        0x00..=0x3F => ins(ACCUMULATOR_OPS[y as usize].into(), 1),
        0x76 => ins("HALT".into(), 1),
        0x40..=0x7F => ins(format!("LD {},{}", R8[y as usize], R8[z as usize]), 1),
        0x80..=0xBF => ins(format!("{}{}", ALU[y as usize], R8[z as usize]), 1),
        0xC0 | 0xC8 | 0xD0 | 0xD8 => ins(format!("RET {cond}"), 1),
        0xC2 | 0xCA | 0xD2 | 0xDA => ins(format!("JP {cond},${:04X}", n16()), 3),
        0xC4 | 0xCC | 0xD4 | 0xDC => ins(format!("CALL {cond},${:04X}", n16()), 3),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => ins(format!("POP {}", R16_STACK[p & 0x03]), 1),
        0xC5 | 0xD5 | 0xE5 | 0xF5 => ins(format!("PUSH {}", R16_STACK[p & 0x03]), 1),
        0xC3 => ins(format!("JP ${:04X}", n16()), 3),
        0xC9 => ins("RET".into(), 1),
        0xD9 => ins("RETI".into(), 1),
        0xCD => ins(format!("CALL ${:04X}", n16()), 3),
        0xE0 => ins(format!("LDH ($FF{:02X}),A", n8()), 2),
        0xF0 => ins(format!("LDH A,($FF{:02X})", n8()), 2),
        0xE2 => ins("LD ($FF00+C),A".into(), 1),
        0xF2 => ins("LD A,($FF00+C)".into(), 1),
        0xE8 => ins(format!("ADD SP,{}", e8()), 2),
        0xF8 => ins(format!("LD HL,SP{:+}", e8()), 2),
        0xE9 => ins("JP HL".into(), 1),
        0xF9 => ins("LD SP,HL".into(), 1),
        0xEA => ins(format!("LD (${:04X}),A", n16()), 3),
        0xFA => ins(format!("LD A,(${:04X})", n16()), 3),
        0xF3 => ins("DI".into(), 1),
        0xFB => ins("EI".into(), 1),
        _ if z == 6 => ins(format!("{}${:02X}", ALU[y as usize], n8()), 2),
        _ => ins(format!("RST ${:02X}", y * 8), 1),
    }
}

fn decode_extended(op: u8) -> Instruction {
    let y = (op >> 3) & 0x07;
    let target = R8[(op & 0x07) as usize];
    let mnemonic = match op >> 6 {
        0 => format!("{} {target}", SHIFTS[y as usize]),
        1 => format!("BIT {y},{target}"),
        2 => format!("RES {y},{target}"),
        _ => format!("SET {y},{target}"),
    };
    Instruction { mnemonic, len: 2 }
}
