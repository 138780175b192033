use clap::Parser;

#[derive(Debug, Parser, Clone)]
#[command(name = "liteplay-demo")]
#[command(about = "Drive a liteplay player from the terminal")]
pub struct Cli {
    /// Local file path or http(s) URL to play.
    pub locator: String,

    /// How far the `seek` command jumps ahead.
    #[arg(long, default_value_t = 10_000)]
    pub seek_step_ms: u64,

    /// Seek targets are rounded down to a multiple of this.
    #[arg(long, default_value_t = 1_000)]
    pub seek_align_ms: u64,

    /// Engine worker tick.
    #[arg(long, default_value_t = 20)]
    pub tick_ms: u64,
}
