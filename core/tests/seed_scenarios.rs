//! The end-to-end seed scenarios, run exactly as specified.

use invaders_core::prelude::*;

#[test]
fn scenario_1_mvi_a_then_hlt() {
    let mut cpu = Cpu8080::new();
    let mut mem = Memory::new();
    mem.load(0, &[0x3E, 0x42, 0x76]); // MVI A,0x42; HLT
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.a, 0x42);
    assert_eq!(cpu.pc, 2);
}

#[test]
fn scenario_2_push_psw_pop_b_carries_a_and_flags() {
    let mut cpu = Cpu8080::new();
    let mut mem = Memory::new();
    // LXI SP,0x3000; MVI A,0xAA; PUSH PSW; POP B
    mem.load(0, &[0x31, 0x00, 0x30, 0x3E, 0xAA, 0xF5, 0xC1]);
    for _ in 0..4 {
        step(&mut cpu, &mut mem);
    }
    assert_eq!(cpu.b, 0xAA);
    assert_eq!(cpu.c, cpu.flags.to_psw_byte());
}

#[test]
fn scenario_3_ram_write_lands_rom_write_is_discarded() {
    let mut cpu = Cpu8080::new();
    let mut mem = Memory::new();
    mem.load(0, &[0x21, 0x00, 0x24, 0x36, 0xFF]); // LXI H,0x2400; MVI M,0xFF
    for _ in 0..2 {
        step(&mut cpu, &mut mem);
    }
    assert_eq!(mem.read(0x2400), 0xFF);

    let mut cpu = Cpu8080::new();
    let mut mem = Memory::new();
    mem.load(0, &[0x21, 0x00, 0x00, 0x36, 0xFF]); // LXI H,0x0000; MVI M,0xFF
    let original = mem.read(0x0000);
    for _ in 0..2 {
        step(&mut cpu, &mut mem);
    }
    // the guarded MVI M write at 0x0000 must be discarded, leaving the
    // program byte that was there in place
    assert_eq!(mem.read(0x0000), original, "write into ROM must be a no-op");
}

#[test]
fn scenario_4_cmp_equal_operands() {
    let mut cpu = Cpu8080::new();
    cpu.a = 0x3A;
    cpu.b = 0x3A;
    let mut mem = Memory::new();
    mem.load(0, &[0xB8]); // CMP B
    step(&mut cpu, &mut mem);
    assert!(cpu.flags.z);
    assert!(!cpu.flags.s);
    assert!(!cpu.flags.cy);
    assert_eq!(cpu.a, 0x3A);
}

#[test]
fn scenario_5_interrupt_inject() {
    let mut cpu = Cpu8080::new();
    let mut mem = Memory::new();
    cpu.pc = 0x1234;
    cpu.sp = 0x3000;
    cpu.interrupt_enable = true;

    cpu.interrupt_inject(&mut mem, 2);

    assert_eq!(cpu.pc, 0x0010);
    assert_eq!(cpu.sp, 0x2FFE);
    assert_eq!(mem.read(0x2FFE), 0x34);
    assert_eq!(mem.read(0x2FFF), 0x12);
    assert!(!cpu.interrupt_enable);
}

#[test]
fn scenario_6_shift_register_sequence() {
    let mut shift = ShiftRegister::new();
    shift.shift_in(0xAA);
    shift.shift_in(0xBB);
    shift.set_offset(3);
    assert_eq!(shift.read(), 0xDD);
}
