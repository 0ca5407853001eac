//! Integration test crate for FrameStage.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It drives the renderer over the memory backend the way a decoder and
//! a presentation thread would.

#[cfg(test)]
mod playback;

#[cfg(test)]
mod resolution;

#[cfg(test)]
mod osd;
