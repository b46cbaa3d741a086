use log::debug;
#[cfg(feature = "cpu-trace")]
use log::trace;

use crate::{
    alu,
    interrupt::Interrupt,
    mmu::Mmu,
    opcodes,
    registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Registers},
};

/// Extra M-cycles spent pushing PC and jumping to an interrupt vector.
const INTERRUPT_DISPATCH_CYCLES: u32 = 5;

/// M-cycles reported per step while halted.
const HALT_IDLE_CYCLES: u32 = 1;

pub struct Cpu {
    pub regs: Registers,
    /// Total M-cycles executed; wraps freely.
    pub cycles: u64,
    pub halted: bool,
    pub ime: bool,
}

impl Cpu {
    /// CPU state right after the boot ROM hands over to the cartridge.
    pub fn new() -> Self {
        Self {
            regs: Registers::post_boot(),
            cycles: 0,
            halted: false,
            ime: false,
        }
    }

    /// Zeroed CPU that starts executing at 0x0000, where a boot ROM lives.
    pub fn new_power_on() -> Self {
        Self {
            regs: Registers::default(),
            cycles: 0,
            halted: false,
            ime: false,
        }
    }

    #[inline(always)]
    fn fetch8(&mut self, mmu: &Mmu) -> u8 {
        let val = mmu.read_byte(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        val
    }

    #[inline(always)]
    fn fetch16(&mut self, mmu: &Mmu) -> u16 {
        let lo = self.fetch8(mmu) as u16;
        let hi = self.fetch8(mmu) as u16;
        (hi << 8) | lo
    }

    /// Formatted CPU state string for debugging.
    pub fn debug_state(&self) -> String {
        format!(
            "AF:{:04X} BC:{:04X} DE:{:04X} HL:{:04X} PC:{:04X} SP:{:04X} CY:{}",
            self.regs.af(),
            self.regs.bc(),
            self.regs.de(),
            self.regs.hl(),
            self.regs.pc,
            self.regs.sp,
            self.cycles
        )
    }

    fn push_stack(&mut self, mmu: &mut Mmu, val: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        mmu.write_byte(self.regs.sp, (val >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        mmu.write_byte(self.regs.sp, val as u8);
    }

    fn pop_stack(&mut self, mmu: &Mmu) -> u16 {
        let lo = mmu.read_byte(self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = mmu.read_byte(self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        (hi << 8) | lo
    }

    /// 8-bit operand by encoding index: B C D E H L (HL) A.
    fn read_reg(&self, mmu: &Mmu, index: u8) -> u8 {
        match index & 0x07 {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            6 => mmu.read_byte(self.regs.hl()),
            _ => self.regs.a,
        }
    }

    fn write_reg(&mut self, mmu: &mut Mmu, index: u8, val: u8) {
        match index & 0x07 {
            0 => self.regs.b = val,
            1 => self.regs.c = val,
            2 => self.regs.d = val,
            3 => self.regs.e = val,
            4 => self.regs.h = val,
            5 => self.regs.l = val,
            6 => mmu.write_byte(self.regs.hl(), val),
            _ => self.regs.a = val,
        }
    }

    /// 16-bit operand by encoding index: BC DE HL SP.
    fn read_r16(&self, index: u8) -> u16 {
        match index & 0x03 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.sp,
        }
    }

    fn write_r16(&mut self, index: u8, val: u16) {
        match index & 0x03 {
            0 => self.regs.set_bc(val),
            1 => self.regs.set_de(val),
            2 => self.regs.set_hl(val),
            _ => self.regs.sp = val,
        }
    }

    /// PUSH/POP operand: BC DE HL AF.
    fn read_r16_stack(&self, index: u8) -> u16 {
        match index & 0x03 {
            3 => self.regs.af(),
            i => self.read_r16(i),
        }
    }

    fn write_r16_stack(&mut self, index: u8, val: u16) {
        match index & 0x03 {
            3 => self.regs.set_af(val),
            i => self.write_r16(i, val),
        }
    }

    /// Branch condition by encoding index: NZ Z NC C.
    fn condition(&self, index: u8) -> bool {
        match index & 0x03 {
            0 => !self.regs.flag(FLAG_Z),
            1 => self.regs.flag(FLAG_Z),
            2 => !self.regs.flag(FLAG_C),
            _ => self.regs.flag(FLAG_C),
        }
    }

    /// ADD ADC SUB SBC AND XOR OR CP on A, by encoding index.
    fn alu_a(&mut self, op: u8, val: u8) {
        let a = self.regs.a;
        let carry = self.regs.flag(FLAG_C);
        let (res, f) = match op & 0x07 {
            0 => alu::add8(a, val),
            1 => alu::adc8(a, val, carry),
            2 => alu::sub8(a, val),
            3 => alu::sbc8(a, val, carry),
            4 => alu::and8(a, val),
            5 => alu::xor8(a, val),
            6 => alu::or8(a, val),
            _ => (a, alu::cp8(a, val)),
        };
        self.regs.a = res;
        self.regs.set_f(f);
    }

    fn jump_relative(&mut self, offset: u8) {
        self.regs.pc = self.regs.pc.wrapping_add(offset as i8 as u16);
    }

    fn handle_cb(&mut self, opcode: u8, mmu: &mut Mmu) -> u32 {
        let r = opcode & 0x07;
        let bit = (opcode >> 3) & 0x07;
        let val = self.read_reg(mmu, r);
        match opcode {
            0x00..=0x3F => {
                let carry = self.regs.flag(FLAG_C);
                let (res, f) = match bit {
                    0 => alu::rlc(val),
                    1 => alu::rrc(val),
                    2 => alu::rl(val, carry),
                    3 => alu::rr(val, carry),
                    4 => alu::sla(val),
                    5 => alu::sra(val),
                    6 => alu::swap(val),
                    _ => alu::srl(val),
                };
                self.write_reg(mmu, r, res);
                self.regs.set_f(f);
            }
            0x40..=0x7F => {
                let f = alu::bit(bit, val, self.regs.f());
                self.regs.set_f(f);
            }
            0x80..=0xBF => self.write_reg(mmu, r, val & !(1 << bit)),
            0xC0..=0xFF => self.write_reg(mmu, r, val | (1 << bit)),
        }
        opcodes::cycles(opcode, true) as u32
    }

    /// Service the highest-priority pending interrupt. Returns the extra
    /// cycles spent on dispatch.
    fn handle_interrupts(&mut self, mmu: &mut Mmu) -> u32 {
        if !self.ime && !self.halted {
            return 0;
        }
        let Some(irq) = Interrupt::next_pending(mmu.if_reg, mmu.ie_reg) else {
            return 0;
        };

        // A pending interrupt wakes the CPU even with IME off.
        self.halted = false;
        if !self.ime {
            return 0;
        }

        self.ime = false;
        mmu.if_reg &= !irq.bit();
        self.push_stack(mmu, self.regs.pc);
        self.regs.pc = irq.vector();
        INTERRUPT_DISPATCH_CYCLES
    }

    /// Execute one instruction (or one idle cycle while halted), run the timer
    /// and dispatch interrupts. Returns the M-cycles consumed.
    pub fn step(&mut self, mmu: &mut Mmu) -> u32 {
        let mut cycles = if self.halted {
            HALT_IDLE_CYCLES
        } else {
            #[cfg(feature = "cpu-trace")]
            self.trace(mmu);
            let opcode = self.fetch8(mmu);
            self.execute(opcode, mmu)
        };
        mmu.timer.advance(cycles, &mut mmu.if_reg);

        let dispatch = self.handle_interrupts(mmu);
        if dispatch > 0 {
            mmu.timer.advance(dispatch, &mut mmu.if_reg);
            cycles += dispatch;
        }

        self.cycles = self.cycles.wrapping_add(cycles as u64);
        cycles
    }

    #[cfg(feature = "cpu-trace")]
    fn trace(&self, mmu: &Mmu) {
        let ins = crate::disasm::disassemble(self.regs.pc, |addr| mmu.read_byte(addr));
        trace!("{:04X}: {:<20} {}", self.regs.pc, ins, self.debug_state());
    }

    fn execute(&mut self, opcode: u8, mmu: &mut Mmu) -> u32 {
        let mut taken = false;
        match opcode {
            0x00 => {}
            0x01 | 0x11 | 0x21 | 0x31 => {
                let val = self.fetch16(mmu);
                self.write_r16(opcode >> 4, val);
            }
            0x02 | 0x12 => {
                let addr = self.read_r16(opcode >> 4);
                mmu.write_byte(addr, self.regs.a);
            }
            0x22 | 0x32 => {
                let hl = self.regs.hl();
                mmu.write_byte(hl, self.regs.a);
                self.regs.set_hl(if opcode == 0x22 {
                    hl.wrapping_add(1)
                } else {
                    hl.wrapping_sub(1)
                });
            }
            0x0A | 0x1A => {
                let addr = self.read_r16(opcode >> 4);
                self.regs.a = mmu.read_byte(addr);
            }
            0x2A | 0x3A => {
                let hl = self.regs.hl();
                self.regs.a = mmu.read_byte(hl);
                self.regs.set_hl(if opcode == 0x2A {
                    hl.wrapping_add(1)
                } else {
                    hl.wrapping_sub(1)
                });
            }
            0x03 | 0x13 | 0x23 | 0x33 => {
                let val = self.read_r16(opcode >> 4).wrapping_add(1);
                self.write_r16(opcode >> 4, val);
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let val = self.read_r16(opcode >> 4).wrapping_sub(1);
                self.write_r16(opcode >> 4, val);
            }
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let r = opcode >> 3;
                let (res, f) = alu::inc8(self.read_reg(mmu, r), self.regs.f());
                self.write_reg(mmu, r, res);
                self.regs.set_f(f);
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let r = opcode >> 3;
                let (res, f) = alu::dec8(self.read_reg(mmu, r), self.regs.f());
                self.write_reg(mmu, r, res);
                self.regs.set_f(f);
            }
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let val = self.fetch8(mmu);
                self.write_reg(mmu, opcode >> 3, val);
            }
            0x07 | 0x0F | 0x17 | 0x1F => {
                let a = self.regs.a;
                let carry = self.regs.flag(FLAG_C);
                let (res, f) = match opcode {
                    0x07 => alu::rlc(a),
                    0x0F => alu::rrc(a),
                    0x17 => alu::rl(a, carry),
                    _ => alu::rr(a, carry),
                };
                self.regs.a = res;
                // The accumulator forms always clear Z.
                self.regs.set_f(f & !FLAG_Z);
            }
            0x08 => {
                let addr = self.fetch16(mmu);
                mmu.write_byte(addr, self.regs.sp as u8);
                mmu.write_byte(addr.wrapping_add(1), (self.regs.sp >> 8) as u8);
            }
            0x09 | 0x19 | 0x29 | 0x39 => {
                let val = self.read_r16(opcode >> 4);
                let (res, f) = alu::add16_hl(self.regs.hl(), val, self.regs.f());
                self.regs.set_hl(res);
                self.regs.set_f(f);
            }
            0x10 => {
                // STOP carries a padding byte.
                self.fetch8(mmu);
            }
            0x18 => {
                let offset = self.fetch8(mmu);
                self.jump_relative(offset);
            }
            0x20 | 0x28 | 0x30 | 0x38 => {
                let offset = self.fetch8(mmu);
                if self.condition(opcode >> 3) {
                    self.jump_relative(offset);
                    taken = true;
                }
            }
            0x27 => {
                let (res, f) = alu::daa(self.regs.a, self.regs.f());
                self.regs.a = res;
                self.regs.set_f(f);
            }
            0x2F => {
                self.regs.a = !self.regs.a;
                self.regs.set_f(self.regs.f() | FLAG_N | FLAG_H);
            }
            0x37 => self.regs.set_f((self.regs.f() & FLAG_Z) | FLAG_C),
            0x3F => {
                let f = self.regs.f();
                self.regs.set_f((f & FLAG_Z) | ((f ^ FLAG_C) & FLAG_C));
            }
            0x76 => self.halted = true,
            0x40..=0x7F => {
                let val = self.read_reg(mmu, opcode);
                self.write_reg(mmu, opcode >> 3, val);
            }
            0x80..=0xBF => {
                let val = self.read_reg(mmu, opcode);
                self.alu_a(opcode >> 3, val);
            }
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let val = self.fetch8(mmu);
                self.alu_a(opcode >> 3, val);
            }
            0xC0 | 0xC8 | 0xD0 | 0xD8 => {
                if self.condition(opcode >> 3) {
                    self.regs.pc = self.pop_stack(mmu);
                    taken = true;
                }
            }
            0xC9 => self.regs.pc = self.pop_stack(mmu),
            0xD9 => {
                self.regs.pc = self.pop_stack(mmu);
                self.ime = true;
            }
            0xC2 | 0xCA | 0xD2 | 0xDA => {
                let addr = self.fetch16(mmu);
                if self.condition(opcode >> 3) {
                    self.regs.pc = addr;
                    taken = true;
                }
            }
            0xC3 => self.regs.pc = self.fetch16(mmu),
            0xE9 => self.regs.pc = self.regs.hl(),
            0xC4 | 0xCC | 0xD4 | 0xDC => {
                let addr = self.fetch16(mmu);
                if self.condition(opcode >> 3) {
                    self.push_stack(mmu, self.regs.pc);
                    self.regs.pc = addr;
                    taken = true;
                }
            }
            0xCD => {
                let addr = self.fetch16(mmu);
                self.push_stack(mmu, self.regs.pc);
                self.regs.pc = addr;
            }
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let val = self.pop_stack(mmu);
                self.write_r16_stack(opcode >> 4, val);
            }
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let val = self.read_r16_stack(opcode >> 4);
                self.push_stack(mmu, val);
            }
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.push_stack(mmu, self.regs.pc);
                self.regs.pc = (opcode & 0x38) as u16;
            }
            0xCB => {
                let cb = self.fetch8(mmu);
                return self.handle_cb(cb, mmu);
            }
            0xE0 => {
                let offset = self.fetch8(mmu);
                mmu.write_byte(0xFF00 | offset as u16, self.regs.a);
            }
            0xF0 => {
                let offset = self.fetch8(mmu);
                self.regs.a = mmu.read_byte(0xFF00 | offset as u16);
            }
            0xE2 => mmu.write_byte(0xFF00 | self.regs.c as u16, self.regs.a),
            0xF2 => self.regs.a = mmu.read_byte(0xFF00 | self.regs.c as u16),
            0xEA => {
                let addr = self.fetch16(mmu);
                mmu.write_byte(addr, self.regs.a);
            }
            0xFA => {
                let addr = self.fetch16(mmu);
                self.regs.a = mmu.read_byte(addr);
            }
            0xE8 => {
                let offset = self.fetch8(mmu);
                let (res, f) = alu::add_sp_e8(self.regs.sp, offset);
                self.regs.sp = res;
                self.regs.set_f(f);
            }
            0xF8 => {
                let offset = self.fetch8(mmu);
                let (res, f) = alu::add_sp_e8(self.regs.sp, offset);
                self.regs.set_hl(res);
                self.regs.set_f(f);
            }
            0xF9 => self.regs.sp = self.regs.hl(),
            0xF3 => self.ime = false,
            0xFB => self.ime = true,
            _ => {
                debug!(
                    "Unassigned opcode {opcode:02X} at {:04X} treated as NOP",
                    self.regs.pc.wrapping_sub(1)
                );
            }
        }

        let base = opcodes::cycles(opcode, false) as u32;
        if taken {
            opcodes::taken_cycles(opcode).map_or(base, u32::from)
        } else {
            base
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
