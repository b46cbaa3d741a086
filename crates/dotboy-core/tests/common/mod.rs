#![allow(dead_code)]

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use dotboy_core::{cartridge::Cartridge, gameboy::GameBoy, ppu::SCREEN_HEIGHT, ppu::SCREEN_WIDTH};

pub const ROM_BANK: usize = 0x4000;
pub const ENTRY: usize = 0x0100;

/// Build a ROM image with a valid header and `program` at the entry point.
pub fn rom_with_program(cart_type: u8, banks: usize, program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0u8; banks.max(2) * ROM_BANK];
    rom[0x0134..0x0134 + 11].copy_from_slice(b"DOTBOY TEST");
    rom[0x0147] = cart_type;
    rom[0x0148] = (banks.max(2) / 2).trailing_zeros() as u8;
    place(&mut rom, ENTRY, program);
    rom
}

pub fn place(rom: &mut [u8], addr: usize, bytes: &[u8]) {
    rom[addr..addr + bytes.len()].copy_from_slice(bytes);
}

pub fn gameboy_with_rom(rom: Vec<u8>) -> GameBoy {
    let mut gb = GameBoy::new();
    gb.load_cart(Cartridge::load(rom).expect("test ROM should load"));
    gb
}

/// Step until the CPU halts. Panics if it never does.
pub fn run_until_halt(gb: &mut GameBoy, max_steps: usize) -> u32 {
    let mut cycles = 0;
    for _ in 0..max_steps {
        cycles += gb.step();
        if gb.cpu.halted {
            return cycles;
        }
    }
    panic!("CPU did not halt within {max_steps} steps: {}", gb.cpu.debug_state());
}

pub fn frame_to_rgb(frame: &[u32]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(frame.len() * 3);
    for &pixel in frame {
        rgb.push((pixel >> 16) as u8);
        rgb.push((pixel >> 8) as u8);
        rgb.push(pixel as u8);
    }
    rgb
}

pub fn write_png_rgb(path: &Path, rgb: &[u8]) {
    let file = File::create(path).expect("failed to create png");
    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        SCREEN_WIDTH as u32,
        SCREEN_HEIGHT as u32,
    );
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().expect("failed to write png header");
    writer
        .write_image_data(rgb)
        .expect("failed to write png data");
}

pub fn load_png_rgb(path: &Path) -> (u32, u32, Vec<u8>) {
    let file = File::open(path).expect("failed to open png");
    let decoder = png::Decoder::new(BufReader::new(file));
    let mut reader = decoder.read_info().expect("failed to read png info");
    let size = reader
        .output_buffer_size()
        .expect("failed to get png output buffer size");
    let mut buf = vec![0; size];
    let info = reader.next_frame(&mut buf).expect("failed to decode png frame");
    assert_eq!(info.color_type, png::ColorType::Rgb);
    buf.truncate(info.buffer_size());
    (info.width, info.height, buf)
}
