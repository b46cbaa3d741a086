mod common;

use std::collections::VecDeque;

use dotboy_core::{
    gameboy::{FramePacer, FrameSink, GameBoy, InputProvider},
    joypad::{Button, ButtonEvent},
    ppu::{DMG_PALETTE, SCREEN_HEIGHT, SCREEN_WIDTH},
};
use tempfile::tempdir;

/// JR -2: spin forever at the entry point.
const SPIN: [u8; 2] = [0x18, 0xFE];

#[derive(Default)]
struct CountingSink {
    frames: Vec<u64>,
    last: Vec<u32>,
}

impl FrameSink for CountingSink {
    fn present(&mut self, frame: &[u32], frame_count: u64) {
        self.frames.push(frame_count);
        self.last = frame.to_vec();
    }
}

#[derive(Default)]
struct CountingPacer {
    calls: Vec<u64>,
}

impl FramePacer for CountingPacer {
    fn frame_completed(&mut self, frame_count: u64) {
        self.calls.push(frame_count);
    }
}

#[derive(Default)]
struct Scripted {
    events: VecDeque<ButtonEvent>,
    unfocused: bool,
}

impl InputProvider for Scripted {
    fn has_focus(&self) -> bool {
        !self.unfocused
    }

    fn poll(&mut self) -> Option<ButtonEvent> {
        self.events.pop_front()
    }
}

#[test]
fn run_frame_presents_once_per_frame() {
    let mut gb = common::gameboy_with_rom(common::rom_with_program(0x00, 2, &SPIN));
    let mut sink = CountingSink::default();
    let mut pacer = CountingPacer::default();
    let mut input = Scripted::default();

    let first = gb.run_frame(&mut sink, &mut input, &mut pacer);
    assert!((16_380..16_383).contains(&first), "first frame took {first}");
    let second = gb.run_frame(&mut sink, &mut input, &mut pacer);
    assert!((17_517..17_523).contains(&second), "second frame took {second}");

    assert_eq!(sink.frames, vec![1, 2]);
    assert_eq!(pacer.calls, vec![1, 2]);
    assert_eq!(sink.last.len(), SCREEN_WIDTH * SCREEN_HEIGHT);
    assert_eq!(gb.frame_count(), 2);
    assert!(!gb.mmu.ppu.frame_ready());
}

#[test]
fn focused_input_reaches_the_joypad() {
    let mut gb = common::gameboy_with_rom(common::rom_with_program(0x00, 2, &SPIN));
    let mut input = Scripted::default();
    input.events.push_back(ButtonEvent::press(Button::A));
    input.events.push_back(ButtonEvent::press(Button::Down));
    input.events.push_back(ButtonEvent::release(Button::Down));

    gb.pump_input(&mut input);
    let state = gb.joypad_handle().snapshot();
    assert!(state.is_pressed(Button::A));
    assert!(!state.is_pressed(Button::Down));
    assert!(input.events.is_empty());
}

#[test]
fn unfocused_input_is_drained_and_dropped() {
    let mut gb = common::gameboy_with_rom(common::rom_with_program(0x00, 2, &SPIN));
    let mut input = Scripted {
        unfocused: true,
        ..Default::default()
    };
    input.events.push_back(ButtonEvent::press(Button::Start));

    gb.pump_input(&mut input);
    assert!(input.events.is_empty());
    assert!(!gb.joypad_handle().snapshot().is_pressed(Button::Start));
}

#[test]
fn reset_keeps_cartridge_and_joypad() {
    let mut rom = common::rom_with_program(0x01, 4, &SPIN);
    rom[2 * common::ROM_BANK] = 0x22;
    let mut gb = common::gameboy_with_rom(rom);
    let handle = gb.joypad_handle();

    gb.mmu.write_byte(0x2000, 0x02);
    assert_eq!(gb.mmu.read_byte(0x4000), 0x22);
    for _ in 0..100 {
        gb.step();
    }

    gb.reset();
    assert_eq!(gb.cpu.regs.pc, 0x0100);
    assert_eq!(gb.cpu.cycles, 0);
    assert_eq!(gb.mmu.read_byte(0x0100), 0x18);
    assert_eq!(gb.mmu.read_byte(0x4000), 0x00, "bank 1 mapped again");

    handle.set(Button::B, true);
    assert!(gb.joypad_handle().snapshot().is_pressed(Button::B));
}

#[test]
fn lcd_off_run_frame_gives_up_without_presenting() {
    let mut rom = common::rom_with_program(0x00, 2, &[]);
    common::place(&mut rom, 0x0000, &SPIN);
    let mut gb = GameBoy::new_power_on();
    gb.load_cart(dotboy_core::cartridge::Cartridge::load(rom).unwrap());
    assert!(!gb.mmu.ppu.lcd_enabled());

    let mut sink = CountingSink::default();
    let mut pacer = CountingPacer::default();
    let cycles = gb.run_frame(&mut sink, &mut Scripted::default(), &mut pacer);

    assert!(cycles >= 2 * 17_520);
    assert!(sink.frames.is_empty());
    assert!(pacer.calls.is_empty());
    assert_eq!(gb.frame_count(), 0);
    assert_eq!(gb.cpu.regs.pc, 0x0000);
}

#[test]
fn blank_frame_screenshot_round_trips_through_png() {
    let mut gb = common::gameboy_with_rom(common::rom_with_program(0x00, 2, &SPIN));
    let mut sink = CountingSink::default();
    gb.run_frame(
        &mut sink,
        &mut Scripted::default(),
        &mut CountingPacer::default(),
    );
    assert!(sink.last.iter().all(|&p| p == DMG_PALETTE[0]));

    let dir = tempdir().unwrap();
    let path = dir.path().join("frame.png");
    common::write_png_rgb(&path, &common::frame_to_rgb(&sink.last));

    let (w, h, rgb) = common::load_png_rgb(&path);
    assert_eq!((w as usize, h as usize), (SCREEN_WIDTH, SCREEN_HEIGHT));
    assert_eq!(&rgb[..3], &[0xE8, 0xFC, 0xCC]);
    assert_eq!(rgb.len(), SCREEN_WIDTH * SCREEN_HEIGHT * 3);
}
