mod common;
mod ui;
mod video;

use clap::Parser;

use crate::ui::prelude::{Level, OutputFormat, emit};
use crate::video::{VideoCommands, handle_video_command};

/// Assemble a narrated video from a transcript, stock clips and a voice track
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for status events
    #[arg(long = "output", value_enum, default_value = "text", global = true)]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: VideoCommands,
}

fn main() {
    let cli = Cli::parse();

    ui::init(cli.output, !cli.no_color);
    ui::set_debug_mode(cli.debug);

    if let Err(error) = handle_video_command(cli.command) {
        emit(Level::Error, "broll.error", &format!("Error: {error:#}"), None);
        std::process::exit(1);
    }
}
