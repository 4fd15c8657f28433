use std::{fmt, path::PathBuf, str::FromStr, time::SystemTime};

use anyhow::Context;
use clap::Parser;

use crate::simulation::FlakeStyle;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "snow-globe")]
#[command(about = "A snow globe you can shake by orbiting the camera", long_about = None)]
#[command(version)]
pub struct Settings {
    /// Seed of the snow RNG; taken from the clock when unset
    #[arg(long, env = "SNOW_GLOBE_SEED")]
    pub seed: Option<u64>,

    /// Flake orientation: billboard or tumble
    #[arg(long, env = "SNOW_GLOBE_FLAKES", default_value = "billboard", value_parser = FlakeStyle::from_str)]
    pub flakes: FlakeStyle,

    /// PNG used as the flake sprite instead of the built-in star
    #[arg(long, env = "SNOW_GLOBE_FLAKE_TEXTURE")]
    pub flake_texture: Option<PathBuf>,

    /// Directory holding px/nx/py/ny/pz/nz.png reflected by the glass
    #[arg(long, env = "SNOW_GLOBE_ENVIRONMENT")]
    pub environment: Option<PathBuf>,

    /// Initial window size in logical pixels
    #[arg(long, env = "SNOW_GLOBE_WINDOW", default_value = "960x720", value_parser = WindowSize::from_str)]
    pub window: WindowSize,
}

impl Settings {
    pub fn seed_or_clock(&self) -> u64 {
        self.seed.unwrap_or_else(clock_seed)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl FromStr for WindowSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .trim()
            .split_once(|c: char| c == 'x' || c == 'X')
            .with_context(|| format!("Expected WIDTHxHEIGHT, got {:?}", s))?;
        let width: u32 = width.trim().parse().context("Bad width")?;
        let height: u32 = height.trim().parse().context("Bad height")?;
        anyhow::ensure!(width > 0 && height > 0, "Window size must not be zero");
        Ok(Self { width, height })
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Settings, clap::Error> {
        Settings::try_parse_from(std::iter::once("snow-globe").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let settings = parse(&[]).unwrap();
        assert_eq!(settings.flakes, FlakeStyle::Billboard);
        assert_eq!(settings.flake_texture, None);
        assert_eq!(settings.environment, None);
        assert_eq!(
            settings.window,
            WindowSize {
                width: 960,
                height: 720
            }
        );
    }

    #[test]
    fn reads_every_option() {
        let settings = parse(&[
            "--seed",
            "1234",
            "--flakes",
            "tumble",
            "--flake-texture",
            "assets/snowflake.png",
            "--environment",
            "assets/park",
            "--window",
            "640x360",
        ])
        .unwrap();

        assert_eq!(
            settings,
            Settings {
                seed: Some(1234),
                flakes: FlakeStyle::Tumble,
                flake_texture: Some(PathBuf::from("assets/snowflake.png")),
                environment: Some(PathBuf::from("assets/park")),
                window: WindowSize {
                    width: 640,
                    height: 360
                },
            }
        );
        assert_eq!(settings.seed_or_clock(), 1234);
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(parse(&["--seed", "snow"]).is_err());
        assert!(parse(&["--flakes", "cube"]).is_err());
        assert!(parse(&["--window", "640"]).is_err());
        assert!(parse(&["--window", "0x360"]).is_err());
    }

    #[test]
    fn window_size_round_trips_through_display() {
        let size: WindowSize = " 1280X800 ".parse().unwrap();
        assert_eq!(size.to_string(), "1280x800");
    }

    #[test]
    fn declares_environment_variables() {
        use clap::CommandFactory;

        let command = Settings::command();
        let env = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .map(|name| name.to_string_lossy().into_owned())
        };

        assert_eq!(env("seed").as_deref(), Some("SNOW_GLOBE_SEED"));
        assert_eq!(env("flakes").as_deref(), Some("SNOW_GLOBE_FLAKES"));
        assert_eq!(env("flake_texture").as_deref(), Some("SNOW_GLOBE_FLAKE_TEXTURE"));
        assert_eq!(env("environment").as_deref(), Some("SNOW_GLOBE_ENVIRONMENT"));
        assert_eq!(env("window").as_deref(), Some("SNOW_GLOBE_WINDOW"));
    }

    #[test]
    fn command_is_well_formed() {
        use clap::CommandFactory;
        Settings::command().debug_assert();
    }
}
