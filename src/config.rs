// Command-line configuration
//
// Positional numbers follow the classic launcher form: none for defaults,
// `SENS` for mouse sensitivity in thousandths (`2` means `0.002`),
// `WIDTH HEIGHT` for the window resolution, or `SENS WIDTH HEIGHT`.

use clap::Parser;

use crate::error::{GameError, Result};

pub const DEFAULT_SENSITIVITY: f32 = 0.002;
pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;
pub const DEFAULT_CAMERA_SPEED: f32 = 0.1;

#[derive(Debug, Parser)]
#[command(name = "eyeball-hunt", about = "Click the eye before the clock runs out")]
pub struct Cli {
    /// [SENS] | [WIDTH HEIGHT] | [SENS WIDTH HEIGHT]
    #[arg(num_args = 0..=3, allow_negative_numbers = true)]
    pub values: Vec<f32>,

    /// Distance the camera moves per frame while a movement key is held
    #[arg(long, default_value_t = DEFAULT_CAMERA_SPEED)]
    pub camera_speed: f32,

    /// Seed for eye placement; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub sensitivity: f32,
    pub width: u32,
    pub height: u32,
    pub camera_speed: f32,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            camera_speed: DEFAULT_CAMERA_SPEED,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Parse the process arguments.
    pub fn from_args() -> Result<Self> {
        Self::try_from(Cli::parse())
    }

    /// Parse an explicit argument list; the first item is the program name.
    pub fn from_arg_list<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| GameError::Config(e.to_string()))?;
        Self::try_from(cli)
    }
}

impl TryFrom<Cli> for GameConfig {
    type Error = GameError;

    fn try_from(cli: Cli) -> Result<Self> {
        let mut config = GameConfig {
            camera_speed: cli.camera_speed,
            seed: cli.seed,
            ..GameConfig::default()
        };

        let (sens, size) = match cli.values.as_slice() {
            [] => (None, None),
            [sens] => (Some(*sens), None),
            [w, h] => (None, Some((*w, *h))),
            [sens, w, h] => (Some(*sens), Some((*w, *h))),
            more => {
                return Err(GameError::Config(format!(
                    "expected at most 3 positional values, got {}",
                    more.len()
                )))
            }
        };

        if let Some(sens) = sens {
            config.sensitivity = sens / 1000.0;
        }
        if let Some((w, h)) = size {
            config.width = dimension("width", w)?;
            config.height = dimension("height", h)?;
        }
        Ok(config)
    }
}

fn dimension(what: &str, value: f32) -> Result<u32> {
    if value.fract() != 0.0 || value < 1.0 || value > u32::MAX as f32 {
        return Err(GameError::Config(format!(
            "{what} must be a positive whole number, got {value}"
        )));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn no_values_gives_defaults() {
        let config = GameConfig::from_arg_list(["eyeball-hunt"]).unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn single_value_is_sensitivity_in_thousandths() {
        let config = GameConfig::from_arg_list(["eyeball-hunt", "3.5"]).unwrap();
        assert_relative_eq!(config.sensitivity, 0.0035);
        assert_eq!((config.width, config.height), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
    }

    #[test]
    fn two_values_are_resolution() {
        let config = GameConfig::from_arg_list(["eyeball-hunt", "1280", "720"]).unwrap();
        assert_eq!((config.width, config.height), (1280, 720));
        assert_relative_eq!(config.sensitivity, DEFAULT_SENSITIVITY);
    }

    #[test]
    fn three_values_are_sensitivity_and_resolution() {
        let config = GameConfig::from_arg_list(["eyeball-hunt", "1", "800", "600"]).unwrap();
        assert_relative_eq!(config.sensitivity, 0.001);
        assert_eq!((config.width, config.height), (800, 600));
    }

    #[test]
    fn named_options() {
        let config =
            GameConfig::from_arg_list(["eyeball-hunt", "--camera-speed", "0.5", "--seed", "7"]).unwrap();
        assert_relative_eq!(config.camera_speed, 0.5);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn rejects_bad_resolution() {
        assert!(matches!(
            GameConfig::from_arg_list(["eyeball-hunt", "0", "720"]),
            Err(GameError::Config(_))
        ));
        assert!(matches!(
            GameConfig::from_arg_list(["eyeball-hunt", "640.5", "480"]),
            Err(GameError::Config(_))
        ));
    }

    #[test]
    fn rejects_too_many_values() {
        assert!(GameConfig::from_arg_list(["eyeball-hunt", "1", "2", "3", "4"]).is_err());
        assert!(GameConfig::from_arg_list(["eyeball-hunt", "abc"]).is_err());
    }
}
