use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "glint")]
#[command(about = "Render a JSON scene with the glint ray tracer")]
pub struct Args {
    /// Scene file (JSON)
    #[arg(required_unless_present = "create_config")]
    pub scene: Option<PathBuf>,

    /// Render config file (JSON); defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output image path
    #[arg(short, long, default_value = "output.png")]
    pub output: PathBuf,

    /// Also write the normalized depth image here
    #[arg(long)]
    pub depth_output: Option<PathBuf>,

    /// Resolution override, e.g. 1280x720
    #[arg(short, long, value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Worker threads (0 = all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Write the default render config to this path and exit
    #[arg(long)]
    pub create_config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

/// Parse `WIDTHxHEIGHT`.
pub fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width '{}': {}", w, e))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height '{}': {}", h, e))?;
    if w == 0 || h == 0 {
        return Err(format!("resolution {}x{} has no pixels", w, h));
    }
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_size("64X48"), Ok((64, 48)));
        assert!(parse_size("1280").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from(["glint", "scene.json", "-s", "32x24", "-t", "2"]).unwrap();
        assert_eq!(args.scene, Some(PathBuf::from("scene.json")));
        assert_eq!(args.size, Some((32, 24)));
        assert_eq!(args.threads, Some(2));
        assert_eq!(args.output, PathBuf::from("output.png"));

        let args = Args::try_parse_from(["glint", "--create-config", "render.json"]).unwrap();
        assert!(args.scene.is_none());

        assert!(Args::try_parse_from(["glint"]).is_err());
    }
}
