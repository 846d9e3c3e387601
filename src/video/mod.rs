mod assignments;
mod check;
pub mod cli;
pub mod commands;
mod config;
mod keywords;
mod render;
mod segment;
mod settings;
mod slots;
mod srt;
mod support;

pub use cli::VideoCommands;
pub use commands::handle_video_command;
