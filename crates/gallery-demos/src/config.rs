use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};

pub const USAGE: &str = "usage: gallery [triangle|gradient|circles|compute-circles|shapes] \
[--shaders DIR] [--count N] [--size WxH]\n       gallery probe";

/// Demo selected on the command line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DemoKind {
    Triangle,
    Gradient,
    Circles,
    ComputeCircles,
    Shapes,
}

impl DemoKind {
    pub fn name(self) -> &'static str {
        match self {
            DemoKind::Triangle => "triangle",
            DemoKind::Gradient => "gradient",
            DemoKind::Circles => "circles",
            DemoKind::ComputeCircles => "compute-circles",
            DemoKind::Shapes => "shapes",
        }
    }
}

impl FromStr for DemoKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "triangle" => DemoKind::Triangle,
            "gradient" => DemoKind::Gradient,
            "circles" => DemoKind::Circles,
            "compute-circles" => DemoKind::ComputeCircles,
            "shapes" => DemoKind::Shapes,
            other => bail!("unknown demo `{other}`"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(DemoKind),
    Probe,
    Help,
}

/// Settings for one `gallery` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub command: Command,
    pub shader_dir: PathBuf,
    pub count: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            command: Command::Run(DemoKind::Circles),
            shader_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders")),
            count: 256,
            width: 800,
            height: 600,
        }
    }
}

impl DemoConfig {
    /// Parses arguments, program name excluded.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        let mut positional = None;
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => config.command = Command::Help,
                "--shaders" => config.shader_dir = PathBuf::from(value(&mut args, "--shaders")?),
                "--count" => {
                    let raw = value(&mut args, "--count")?;
                    config.count = raw
                        .parse()
                        .with_context(|| format!("invalid --count `{raw}`"))?;
                }
                "--size" => {
                    let raw = value(&mut args, "--size")?;
                    (config.width, config.height) = parse_size(&raw)?;
                }
                flag if flag.starts_with('-') => bail!("unknown option `{flag}`"),
                _ => {
                    if positional.is_some() {
                        bail!("unexpected argument `{arg}`");
                    }
                    positional = Some(arg);
                }
            }
        }

        if config.command != Command::Help {
            if let Some(name) = positional {
                config.command = match name.as_str() {
                    "probe" => Command::Probe,
                    demo => Command::Run(demo.parse()?),
                };
            }
        }

        Ok(config)
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next().ok_or_else(|| anyhow!("{flag} expects a value"))
}

fn parse_size(raw: &str) -> Result<(u32, u32)> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("invalid --size `{raw}`, expected WxH"))?;
    let width: u32 = w.parse().with_context(|| format!("invalid width in `{raw}`"))?;
    let height: u32 = h.parse().with_context(|| format!("invalid height in `{raw}`"))?;
    if width == 0 || height == 0 {
        bail!("--size must be non-zero, got `{raw}`");
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_runs_circles() {
        let config = DemoConfig::from_args(Vec::<String>::new()).unwrap();
        assert_eq!(config, DemoConfig::default());
        assert_eq!(config.command, Command::Run(DemoKind::Circles));
    }

    #[test]
    fn every_demo_name_parses_back() {
        for kind in [
            DemoKind::Triangle,
            DemoKind::Gradient,
            DemoKind::Circles,
            DemoKind::ComputeCircles,
            DemoKind::Shapes,
        ] {
            assert_eq!(kind.name().parse::<DemoKind>().unwrap(), kind);
        }
        assert!("hexagons".parse::<DemoKind>().is_err());
    }

    #[test]
    fn options_are_applied() {
        let config = DemoConfig::from_args([
            "compute-circles",
            "--count",
            "4096",
            "--size",
            "1024x768",
            "--shaders",
            "/tmp/wgsl",
        ])
        .unwrap();

        assert_eq!(config.command, Command::Run(DemoKind::ComputeCircles));
        assert_eq!(config.count, 4096);
        assert_eq!((config.width, config.height), (1024, 768));
        assert_eq!(config.shader_dir, PathBuf::from("/tmp/wgsl"));
    }

    #[test]
    fn probe_is_a_command() {
        let config = DemoConfig::from_args(["probe"]).unwrap();
        assert_eq!(config.command, Command::Probe);
    }

    #[test]
    fn help_wins_over_positional() {
        let config = DemoConfig::from_args(["gradient", "--help"]).unwrap();
        assert_eq!(config.command, Command::Help);
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        for args in [
            vec!["--count"],
            vec!["--count", "many"],
            vec!["--size", "800"],
            vec!["--size", "0x600"],
            vec!["--fullscreen"],
            vec!["triangle", "gradient"],
        ] {
            assert!(DemoConfig::from_args(args.clone()).is_err(), "{args:?}");
        }
    }
}
