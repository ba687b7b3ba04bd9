//! Live rendering of streamed replies

pub mod renderer;
