pub mod core;
pub mod cpu;
pub mod device;
pub mod memory;

pub mod prelude {
    pub use crate::core::{InputButton, Machine};
    pub use crate::cpu::{Cpu8080, Flags, step};
    pub use crate::device::{FramebufferSink, ShiftRegister, translate};
    pub use crate::memory::Memory;
}
