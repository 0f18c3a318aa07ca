//! The Space Invaders cabinet: CPU + memory + I/O ports + interrupt timing
//! wired together into one runnable [`Machine`].

use invaders_core::core::{InputButton, Machine};
use invaders_core::cpu::{self, Cpu8080};
use invaders_core::device::{FramebufferSink, ShiftRegister, translate, video};
use invaders_core::memory::Memory;

use crate::rom_loader::{RomEntry, RomLoadError, RomRegion, RomSet};

const ROM_REGION: RomRegion = RomRegion {
    size: 0x2000,
    entries: &[
        RomEntry {
            name: "invaders.h",
            size: 0x800,
            offset: 0x0000,
            crc32: None,
        },
        RomEntry {
            name: "invaders.g",
            size: 0x800,
            offset: 0x0800,
            crc32: None,
        },
        RomEntry {
            name: "invaders.f",
            size: 0x800,
            offset: 0x1000,
            crc32: None,
        },
        RomEntry {
            name: "invaders.e",
            size: 0x800,
            offset: 0x1800,
            crc32: None,
        },
    ],
};

/// Half-frame period: 120 Hz alternating RST1/RST2, i.e. 8333 microseconds.
const HALF_FRAME_US: u64 = 8_333;
/// Half-frame period in CPU cycles, at the 8080's 2 cycles/microsecond.
const HALF_FRAME_CYCLES: i64 = 2 * HALF_FRAME_US as i64;
/// `run_frame` (Machine trait) advances this much simulated time per call.
const FRAME_US: u64 = 16_667;

const BTN_COIN: u8 = 0;
const BTN_P1_START: u8 = 1;
const BTN_P2_START: u8 = 2;
const BTN_P1_SHOT: u8 = 3;
const BTN_P1_LEFT: u8 = 4;
const BTN_P1_RIGHT: u8 = 5;
const BTN_P2_SHOT: u8 = 6;
const BTN_P2_LEFT: u8 = 7;
const BTN_P2_RIGHT: u8 = 8;
const BTN_TILT: u8 = 9;

static INPUT_MAP: [InputButton; 10] = [
    InputButton { id: BTN_COIN, name: "Coin" },
    InputButton { id: BTN_P1_START, name: "P1 Start" },
    InputButton { id: BTN_P2_START, name: "P2 Start" },
    InputButton { id: BTN_P1_SHOT, name: "P1 Fire" },
    InputButton { id: BTN_P1_LEFT, name: "P1 Left" },
    InputButton { id: BTN_P1_RIGHT, name: "P1 Right" },
    InputButton { id: BTN_P2_SHOT, name: "P2 Fire" },
    InputButton { id: BTN_P2_LEFT, name: "P2 Left" },
    InputButton { id: BTN_P2_RIGHT, name: "P2 Right" },
    InputButton { id: BTN_TILT, name: "Tilt" },
];

/// Owns the cabinet's CPU state, cabinet I/O state, and timing state, and
/// drives emulation via [`run_slice`](Self::run_slice).
pub struct SpaceInvadersCabinet {
    cpu: Cpu8080,
    mem: Memory,
    shift: ShiftRegister,
    port0: u8,
    port1: u8,
    port2: u8,
    port3_out: u8,
    port5_out: u8,
    last_tick_us: Option<u64>,
    which_interrupt: u8,
    cycles_until_interrupt: i64,
    frame_clock_us: u64,
    frame: Vec<u32>,
}

impl Default for SpaceInvadersCabinet {
    fn default() -> Self {
        Self::new()
    }
}

impl SpaceInvadersCabinet {
    pub fn new() -> Self {
        Self {
            cpu: Cpu8080::new(),
            mem: Memory::new(),
            shift: ShiftRegister::new(),
            port0: 0x01,
            port1: 0x08,
            port2: 0x00,
            port3_out: 0,
            port5_out: 0,
            last_tick_us: None,
            which_interrupt: 1,
            cycles_until_interrupt: HALF_FRAME_CYCLES,
            frame_clock_us: 0,
            frame: vec![0u32; video::WIDTH * video::HEIGHT],
        }
    }

    pub fn load_roms(&mut self, rom_set: &RomSet) -> Result<(), RomLoadError> {
        let rom = ROM_REGION.load(rom_set)?;
        self.mem.load(0, &rom);
        Ok(())
    }

    /// Latch the raw byte the Input Provider supplies for port 0.
    pub fn set_port0(&mut self, val: u8) {
        self.port0 = val;
    }

    /// Latch the raw byte the Input Provider supplies for port 1.
    pub fn set_port1(&mut self, val: u8) {
        self.port1 = val;
    }

    /// Latch the raw byte the Input Provider supplies for port 2.
    pub fn set_port2(&mut self, val: u8) {
        self.port2 = val;
    }

    /// Last byte written to the sound port at 0x03 (group 1 effects).
    pub fn port3_value(&self) -> u8 {
        self.port3_out
    }

    /// Last byte written to the sound port at 0x05 (group 2 effects).
    pub fn port5_value(&self) -> u8 {
        self.port5_out
    }

    fn set_bit(byte: &mut u8, mask: u8, set: bool) {
        if set {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    fn port_in(&self, port: u8) -> u8 {
        match port {
            0 => self.port0,
            1 => self.port1,
            2 => self.port2,
            3 => self.shift.read(),
            _ => 0xFF,
        }
    }

    fn port_out(&mut self, port: u8, val: u8) {
        match port {
            2 => self.shift.set_offset(val),
            3 => self.port3_out = val,
            4 => self.shift.shift_in(val),
            5 => self.port5_out = val,
            6 => {} // watchdog, observed but unused
            _ => {}
        }
    }

    /// Advance emulation to wall-clock time `now_us`, injecting the
    /// alternating RST1/RST2 interrupt every 8333 microseconds and
    /// charging instruction cycles at the 8080's 2 MHz rate. The interrupt
    /// countdown (`cycles_until_interrupt`) is cabinet state, not a local:
    /// callers are expected to invoke this every loop iteration with small
    /// time deltas, so the countdown must survive across calls.
    pub fn run_slice(&mut self, now_us: u64) {
        let last = match self.last_tick_us {
            Some(t) => t,
            None => {
                self.last_tick_us = Some(now_us);
                return;
            }
        };

        let mut budget = 2 * now_us.saturating_sub(last) as i64;
        self.last_tick_us = Some(now_us);

        while budget > 0 {
            let opcode = self.mem.read(self.cpu.pc);
            let cycles = if opcode == 0xDB {
                self.cpu.pc = self.cpu.pc.wrapping_add(1);
                let port = self.mem.read(self.cpu.pc);
                self.cpu.pc = self.cpu.pc.wrapping_add(1);
                self.cpu.a = self.port_in(port);
                10
            } else if opcode == 0xD3 {
                self.cpu.pc = self.cpu.pc.wrapping_add(1);
                let port = self.mem.read(self.cpu.pc);
                self.cpu.pc = self.cpu.pc.wrapping_add(1);
                self.port_out(port, self.cpu.a);
                10
            } else {
                cpu::step(&mut self.cpu, &mut self.mem)
            };

            budget -= cycles as i64;
            self.cycles_until_interrupt -= cycles as i64;

            if self.cycles_until_interrupt <= 0 {
                self.cycles_until_interrupt += HALF_FRAME_CYCLES;
                if self.cpu.interrupt_enable {
                    self.cpu.interrupt_inject(&mut self.mem, self.which_interrupt);
                    if self.which_interrupt == 2 {
                        self.frame = translate(self.mem.vram());
                    }
                }
                self.which_interrupt = if self.which_interrupt == 1 { 2 } else { 1 };
            }
        }
    }

    /// Hand the last translated frame (row-major ARGB) to a sink. Reads the
    /// frame cached at the last interrupt-#2 boundary; does not re-translate.
    pub fn blit(&self, sink: &mut dyn FramebufferSink) {
        sink.blit(&self.frame);
    }
}

impl Machine for SpaceInvadersCabinet {
    fn display_size(&self) -> (u32, u32) {
        (video::WIDTH as u32, video::HEIGHT as u32)
    }

    fn run_frame(&mut self) {
        self.frame_clock_us += FRAME_US;
        let now = self.frame_clock_us;
        self.run_slice(now);
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        for (i, &pixel) in self.frame.iter().enumerate() {
            let base = i * 3;
            if base + 2 >= buffer.len() {
                break;
            }
            buffer[base] = (pixel >> 16) as u8;
            buffer[base + 1] = (pixel >> 8) as u8;
            buffer[base + 2] = pixel as u8;
        }
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        match button {
            BTN_COIN => Self::set_bit(&mut self.port1, 0x01, pressed),
            BTN_P1_START => Self::set_bit(&mut self.port1, 0x04, pressed),
            BTN_P2_START => Self::set_bit(&mut self.port1, 0x02, pressed),
            BTN_P1_SHOT => Self::set_bit(&mut self.port1, 0x10, pressed),
            BTN_P1_LEFT => Self::set_bit(&mut self.port1, 0x20, pressed),
            BTN_P1_RIGHT => Self::set_bit(&mut self.port1, 0x40, pressed),
            BTN_P2_SHOT => Self::set_bit(&mut self.port2, 0x10, pressed),
            BTN_P2_LEFT => Self::set_bit(&mut self.port2, 0x20, pressed),
            BTN_P2_RIGHT => Self::set_bit(&mut self.port2, 0x40, pressed),
            BTN_TILT => Self::set_bit(&mut self.port2, 0x04, pressed),
            _ => {}
        }
    }

    fn input_map(&self) -> &[InputButton] {
        &INPUT_MAP
    }

    fn reset(&mut self) {
        self.cpu.reset();
        self.shift = ShiftRegister::new();
        self.last_tick_us = None;
        self.which_interrupt = 1;
        self.cycles_until_interrupt = HALF_FRAME_CYCLES;
        self.frame_clock_us = 0;
        self.frame = vec![0u32; video::WIDTH * video::HEIGHT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cabinet_with_rom(program: &[u8]) -> SpaceInvadersCabinet {
        let mut cab = SpaceInvadersCabinet::new();
        cab.mem.load(0, program);
        cab
    }

    #[test]
    fn run_slice_first_call_only_establishes_the_clock() {
        let mut cab = cabinet_with_rom(&[0x00]);
        cab.run_slice(1_000_000);
        assert_eq!(cab.cpu.pc, 0, "first run_slice call must not execute anything");
    }

    #[test]
    fn run_slice_executes_instructions_on_subsequent_calls() {
        let mut cab = cabinet_with_rom(&[0x00, 0x00, 0x00, 0x00]);
        cab.run_slice(0);
        cab.run_slice(4);
        assert!(cab.cpu.pc > 0);
    }

    #[test]
    fn interrupt_pacing_survives_many_small_slices_at_the_correct_rate() {
        // Mirrors the frontend's loop: run_slice is called every tick with a
        // small wall-clock delta, never one big slice. The interrupt
        // countdown must persist across those calls and fire at 120 Hz
        // (one RST every 8333us), not at double that rate.
        let mut program = vec![0u8; 0x30];
        program[0x00..0x03].copy_from_slice(&[0xC3, 0x20, 0x00]); // JMP 0x20
        program[0x08..0x0B].copy_from_slice(&[0x34, 0xFB, 0xC9]); // RST1: INR M; EI; RET
        program[0x10..0x13].copy_from_slice(&[0x34, 0xFB, 0xC9]); // RST2: INR M; EI; RET
        program[0x20..0x23].copy_from_slice(&[0x31, 0xF0, 0x23]); // LXI SP,0x23F0
        program[0x23..0x26].copy_from_slice(&[0x21, 0x00, 0x23]); // LXI H,0x2300
        program[0x26] = 0xFB; // EI
        program[0x27..0x2A].copy_from_slice(&[0xC3, 0x27, 0x00]); // JMP 0x27 (spin)

        let mut cab = cabinet_with_rom(&program);
        cab.run_slice(0); // establishes the clock only

        let mut now = 0u64;
        for _ in 0..2000 {
            now += 50; // 50us ticks, as a tight no-sleep frontend loop would send
            cab.run_slice(now);
        }

        // 2000 * 50us = 100ms of wall-clock time; at 120Hz that's ~12
        // interrupts. The pre-fix bugs (reset-every-call countdown, or a
        // microsecond threshold compared against a cycle count) would leave
        // this at 0 (never fires) or roughly double (~24).
        let interrupt_count = cab.mem.read(0x2300);
        assert!(
            (8..=16).contains(&interrupt_count),
            "expected ~12 interrupts over 100ms of wall-clock time, got {interrupt_count}"
        );
    }

    #[test]
    fn shift_register_round_trips_through_out_ports() {
        let mut cab = SpaceInvadersCabinet::new();
        cab.port_out(2, 7);
        cab.port_out(4, 0xAB);
        assert_eq!(cab.port_in(3), cab.shift.read());
    }

    #[test]
    fn sound_ports_are_observable_after_writes() {
        let mut cab = SpaceInvadersCabinet::new();
        cab.port_out(3, 0x01);
        cab.port_out(5, 0x02);
        assert_eq!(cab.port3_value(), 0x01);
        assert_eq!(cab.port5_value(), 0x02);
    }

    #[test]
    fn input_latch_feeds_port1_bits() {
        let mut cab = SpaceInvadersCabinet::new();
        cab.set_input(BTN_P1_SHOT, true);
        assert_eq!(cab.port_in(1) & 0x10, 0x10);
        cab.set_input(BTN_P1_SHOT, false);
        assert_eq!(cab.port_in(1) & 0x10, 0);
    }

    #[test]
    fn raw_port_setters_override_latched_byte() {
        let mut cab = SpaceInvadersCabinet::new();
        cab.set_port2(0x42);
        assert_eq!(cab.port_in(2), 0x42);
    }

    #[test]
    fn blit_forwards_the_cached_frame_to_the_sink() {
        struct Collector(usize);
        impl FramebufferSink for Collector {
            fn blit(&mut self, frame: &[u32]) {
                self.0 = frame.len();
            }
        }

        let cab = SpaceInvadersCabinet::new();
        let mut sink = Collector(0);
        cab.blit(&mut sink);
        assert_eq!(sink.0, video::WIDTH * video::HEIGHT);
    }

    #[test]
    fn interrupt_injection_advances_pc_to_the_rst_vector() {
        // A tight loop of NOPs; the first interrupt should fire well within
        // one run_slice call once interrupts are enabled.
        let mut cab = cabinet_with_rom(&[0xFB, 0x00, 0x00, 0x00]); // EI; NOP...
        cab.run_slice(0);
        cab.run_slice(20_000); // 20ms of wall-clock time, well over one half-frame
        // PC should be inside the low interrupt vector region (RST1=0x08 or RST2=0x10)
        // or just past it after further NOPs execute.
        assert!(cab.cpu.pc >= 0x08);
    }
}
