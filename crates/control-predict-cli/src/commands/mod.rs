pub mod breathe;
pub mod catalog;
pub mod config;
pub mod play;
pub mod timer;
