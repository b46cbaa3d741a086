mod common;

use dotboy_core::{cartridge::Cartridge, joypad::Button, mmu::Mmu};

#[test]
fn wram_echo() {
    let mut mmu = Mmu::new();
    mmu.write_byte(0xC000, 0xAA);
    assert_eq!(mmu.read_byte(0xE000), 0xAA);
    mmu.write_byte(0xE123, 0xBB);
    assert_eq!(mmu.read_byte(0xC123), 0xBB);
    mmu.write_byte(0xDDFF, 0xCC);
    assert_eq!(mmu.read_byte(0xFDFF), 0xCC);
}

#[test]
fn unusable_region_reads_zero_and_ignores_writes() {
    let mut mmu = Mmu::new();
    for addr in [0xFEA0u16, 0xFEC0, 0xFEFF] {
        mmu.write_byte(addr, 0x5A);
        assert_eq!(mmu.read_byte(addr), 0x00);
    }
    // OAM right below the region is untouched.
    assert_eq!(mmu.read_byte(0xFE9F), 0x00);
}

#[test]
fn joypad_nibbles_follow_select_bits() {
    let mut mmu = Mmu::new();
    let handle = mmu.joypad_handle();

    mmu.write_byte(0xFF00, 0x30);
    assert_eq!(mmu.read_byte(0xFF00), 0x3F);

    handle.set(Button::Start, true);
    handle.set(Button::Left, true);

    // Bit 5 low: action buttons in the low nibble.
    mmu.write_byte(0xFF00, 0x10);
    assert_eq!(mmu.read_byte(0xFF00), 0x17);

    // Bit 4 low: directions.
    mmu.write_byte(0xFF00, 0x20);
    assert_eq!(mmu.read_byte(0xFF00), 0x2D);

    handle.release_all();
    assert_eq!(mmu.read_byte(0xFF00), 0x2F);
}

#[test]
fn cartridge_windows_route_to_mbc() {
    let mut rom = common::rom_with_program(0x01, 4, &[]);
    rom[2 * common::ROM_BANK + 0x10] = 0x77;
    let mut mmu = Mmu::new();
    mmu.load_cart(Cartridge::load(rom).unwrap());

    mmu.write_byte(0x2000, 0x02);
    assert_eq!(mmu.read_byte(0x4010), 0x77);
    assert_eq!(mmu.read_byte(0x0134), b'D');
}

#[test]
fn boot_rom_disable_restores_cartridge_header() {
    let mut rom = common::rom_with_program(0x00, 2, &[]);
    rom[0x0000] = 0xC3;
    let mut mmu = Mmu::new_power_on();
    mmu.load_boot_rom(vec![0x31; 0x100]);
    mmu.load_cart(Cartridge::load(rom).unwrap());

    assert_eq!(mmu.read_byte(0x0000), 0x31);
    assert_eq!(mmu.read_byte(0x0100), 0x00);

    // Writing zero leaves the boot ROM mapped.
    mmu.write_byte(0xFF50, 0x00);
    assert_eq!(mmu.read_byte(0x0000), 0x31);

    mmu.write_byte(0xFF50, 0x01);
    assert!(mmu.boot_rom_disabled());
    assert_eq!(mmu.read_byte(0x0000), 0xC3);
    assert_eq!(mmu.read_byte(0xFF50), 0xFF);

    // Once disabled it stays disabled.
    mmu.load_boot_rom(vec![0x31; 0x100]);
    assert_eq!(mmu.read_byte(0x0000), 0xC3);
}

#[test]
fn oam_dma_copies_through_bus() {
    let mut mmu = Mmu::new();
    for i in 0..0xA0u16 {
        mmu.write_byte(0xC100 + i, i as u8 ^ 0x5A);
    }
    mmu.write_byte(0xFF46, 0xC1);
    assert_eq!(mmu.read_byte(0xFF46), 0xC1);
    for i in 0..0xA0u16 {
        assert_eq!(mmu.read_byte(0xFE00 + i), i as u8 ^ 0x5A, "OAM byte {i:02X}");
    }
}

#[test]
fn timer_registers_are_routed() {
    let mut mmu = Mmu::new();
    mmu.write_byte(0xFF06, 0x42);
    mmu.write_byte(0xFF07, 0x05);
    assert_eq!(mmu.read_byte(0xFF06), 0x42);
    assert_eq!(mmu.read_byte(0xFF07), 0xFD);
    assert_eq!(mmu.timer.tma, 0x42);
}

#[test]
fn ly_is_read_only_through_the_bus() {
    let mut mmu = Mmu::new();
    mmu.ppu.advance(114 * 3, &mut mmu.if_reg);
    mmu.write_byte(0xFF44, 0x00);
    assert_eq!(mmu.read_byte(0xFF44), 3);
}
