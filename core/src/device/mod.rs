pub mod shift_register;
pub mod video;

pub use shift_register::ShiftRegister;
pub use video::{FramebufferSink, translate};
