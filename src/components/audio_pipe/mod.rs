mod frame;
mod frame_pipe;

pub use frame::*;
pub use frame_pipe::*;
