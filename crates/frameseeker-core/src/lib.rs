//! Frame accounting and frame capture for the FrameSeeker video viewer.

pub mod convert;
pub mod error;
pub mod naming;
pub mod persist;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod video;
