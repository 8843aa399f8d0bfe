//! GAS assembly generation: the line-buffered streamer and the emitter
//! that walks `OutputSymbol`s through it.

pub mod emitter;
pub mod streamer;

pub use emitter::{emit_asm, EmitOptions, OutputSymbol};
pub use streamer::AsmStreamer;
