//! ffdash - FFmpeg Dashboard backend
//!
//! An HTTP service that stores uploaded media and runs it through ffmpeg:
//! compress, resize, cut, volume, crop, and building a video from an audio
//! timeline over a flat-colour clip.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod storage;
pub mod workflow;
