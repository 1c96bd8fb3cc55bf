use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "tinyblog", about = "A small multi-user blog server")]
pub struct Cli {
    /// Path to a TOML settings file.
    #[arg(long)]
    pub settings: Option<String>,
}
