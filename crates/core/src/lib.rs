pub mod config;
pub mod decode;
pub mod face;
pub mod fusion;
pub mod pipeline;
pub mod reaction;
pub mod session;
pub mod transcribe;
pub mod util;
pub mod voice;
