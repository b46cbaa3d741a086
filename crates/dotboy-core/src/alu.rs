//! Flag-computing arithmetic used by the CPU.
//!
//! Every function is pure: it takes operands (and the incoming F where an
//! operation preserves or consumes flags) and returns `(result, new_f)`.

use crate::registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z};

#[inline]
fn zero(r: u8) -> u8 {
    if r == 0 { FLAG_Z } else { 0 }
}

#[inline]
fn half8(a: u8, b: u8, r: u8) -> u8 {
    if (a ^ b ^ r) & 0x10 != 0 { FLAG_H } else { 0 }
}

#[inline]
fn carry(set: bool) -> u8 {
    if set { FLAG_C } else { 0 }
}

pub fn add8(a: u8, b: u8) -> (u8, u8) {
    let r = a.wrapping_add(b);
    (r, zero(r) | half8(a, b, r) | carry(r < a))
}

pub fn adc8(a: u8, b: u8, carry_in: bool) -> (u8, u8) {
    let sum = a as u16 + b as u16 + carry_in as u16;
    let r = sum as u8;
    (
        r,
        zero(r) | half8(a, b, r) | carry(sum & 0xFF00 != 0),
    )
}

pub fn sub8(a: u8, b: u8) -> (u8, u8) {
    let r = a.wrapping_sub(b);
    (r, FLAG_N | zero(r) | half8(a, b, r) | carry(a < r))
}

pub fn sbc8(a: u8, b: u8, carry_in: bool) -> (u8, u8) {
    let diff = (a as u16)
        .wrapping_sub(b as u16)
        .wrapping_sub(carry_in as u16);
    let r = diff as u8;
    (
        r,
        FLAG_N | zero(r) | half8(a, b, r) | carry(diff & 0xFF00 != 0),
    )
}

/// CP is SUB with the result thrown away.
pub fn cp8(a: u8, b: u8) -> u8 {
    sub8(a, b).1
}

pub fn and8(a: u8, b: u8) -> (u8, u8) {
    let r = a & b;
    (r, zero(r) | FLAG_H)
}

pub fn xor8(a: u8, b: u8) -> (u8, u8) {
    let r = a ^ b;
    (r, zero(r))
}

pub fn or8(a: u8, b: u8) -> (u8, u8) {
    let r = a | b;
    (r, zero(r))
}

/// INC leaves C untouched.
pub fn inc8(val: u8, f: u8) -> (u8, u8) {
    let r = val.wrapping_add(1);
    (r, (f & FLAG_C) | zero(r) | half8(val, 1, r))
}

/// DEC leaves C untouched.
pub fn dec8(val: u8, f: u8) -> (u8, u8) {
    let r = val.wrapping_sub(1);
    (r, (f & FLAG_C) | FLAG_N | zero(r) | half8(val, 1, r))
}

/// ADD HL,rr: Z is preserved, H is the carry out of bit 11.
pub fn add16_hl(hl: u16, val: u16, f: u8) -> (u16, u8) {
    let r = hl.wrapping_add(val);
    let h = if (hl ^ val ^ r) & 0x1000 != 0 { FLAG_H } else { 0 };
    (r, (f & FLAG_Z) | h | carry(r < hl))
}

/// ADD SP,e8 and LD HL,SP+e8. H and C come from the unsigned add of the low
/// byte; Z and N are always cleared.
pub fn add_sp_e8(sp: u16, offset: u8) -> (u16, u8) {
    let val = offset as i8 as i16 as u16;
    let r = sp.wrapping_add(val);
    let bits = sp ^ val ^ r;
    let h = if bits & 0x10 != 0 { FLAG_H } else { 0 };
    (r, h | carry(bits & 0x100 != 0))
}

/// Decimal adjust after an 8-bit add or subtract.
pub fn daa(a: u8, f: u8) -> (u8, u8) {
    let mut adjust = 0u8;
    let mut c = f & FLAG_C != 0;
    let r = if f & FLAG_N == 0 {
        if f & FLAG_H != 0 || a & 0x0F > 0x09 {
            adjust |= 0x06;
        }
        if c || a > 0x99 {
            adjust |= 0x60;
            c = true;
        }
        a.wrapping_add(adjust)
    } else {
        if f & FLAG_H != 0 {
            adjust |= 0x06;
        }
        if c {
            adjust |= 0x60;
        }
        a.wrapping_sub(adjust)
    };
    (r, zero(r) | (f & FLAG_N) | carry(c))
}

pub fn rlc(val: u8) -> (u8, u8) {
    let r = val.rotate_left(1);
    (r, zero(r) | carry(val & 0x80 != 0))
}

pub fn rrc(val: u8) -> (u8, u8) {
    let r = val.rotate_right(1);
    (r, zero(r) | carry(val & 0x01 != 0))
}

pub fn rl(val: u8, carry_in: bool) -> (u8, u8) {
    let r = (val << 1) | carry_in as u8;
    (r, zero(r) | carry(val & 0x80 != 0))
}

pub fn rr(val: u8, carry_in: bool) -> (u8, u8) {
    let r = (val >> 1) | ((carry_in as u8) << 7);
    (r, zero(r) | carry(val & 0x01 != 0))
}

pub fn sla(val: u8) -> (u8, u8) {
    let r = val << 1;
    (r, zero(r) | carry(val & 0x80 != 0))
}

pub fn sra(val: u8) -> (u8, u8) {
    let r = (val >> 1) | (val & 0x80);
    (r, zero(r) | carry(val & 0x01 != 0))
}

pub fn srl(val: u8) -> (u8, u8) {
    let r = val >> 1;
    (r, zero(r) | carry(val & 0x01 != 0))
}

pub fn swap(val: u8) -> (u8, u8) {
    let r = val.rotate_left(4);
    (r, zero(r))
}

/// BIT n,r: C is preserved, H forced on, N forced off.
pub fn bit(n: u8, val: u8, f: u8) -> u8 {
    (f & FLAG_C) | FLAG_H | zero(val & (1 << n))
}
