use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, FileFormat};
use serde::{Deserialize, Serialize};

use crate::channel::Pinning;
use crate::error::{CalError, CalResult};
use crate::search::Strategy;
use crate::types::XY;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DescentConfig {
    pub max_iterations: usize,
    pub tolerance: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SecantConfig {
    pub max_iterations: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    pub strategy: Strategy,
    pub pinning: Pinning,
    pub threshold: f64,
    pub descent: DescentConfig,
    pub secant: SecantConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Secant,
            pinning: Pinning::Largest,
            threshold: 0.0002,
            descent: DescentConfig {
                max_iterations: 200,
                tolerance: 0.0005,
            },
            secant: SecantConfig {
                max_iterations: 100,
                seed: None,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayConfig {
    pub device: Utf8PathBuf,
    pub alpha: u8,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub bits_per_pixel: Option<u32>,
    #[serde(default)]
    pub stride: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MeterConfig {
    pub command: String,
    pub args: Vec<String>,
    pub marker: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub target: XY,
    pub search: SearchConfig,
    pub display: DisplayConfig,
    pub meter: MeterConfig,
}

/// Command line values that take precedence over the configuration file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub strategy: Option<Strategy>,
    pub pinning: Option<Pinning>,
    pub seed: Option<u64>,
    pub device: Option<Utf8PathBuf>,
}

impl AppConfig {
    pub fn validate(&self) -> CalResult<()> {
        if !self.target.is_valid() {
            return Err(CalError::InvalidChromaticity(self.target.x, self.target.y));
        }
        if self.search.threshold.is_nan() || self.search.threshold < 0.0 {
            return Err(CalError::InvalidConfig("search.threshold must be >= 0"));
        }
        let tolerance = self.search.descent.tolerance;
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(CalError::InvalidConfig(
                "search.descent.tolerance must be >= 0",
            ));
        }
        if self.meter.marker.is_empty() {
            return Err(CalError::InvalidConfig("meter.marker must not be empty"));
        }
        Ok(())
    }
}

pub fn parse(filename: &Utf8Path, overrides: &Overrides) -> CalResult<AppConfig> {
    let settings = Config::builder()
        .set_default("target.x", XY::D65_WHITE_POINT.x)?
        .set_default("target.y", XY::D65_WHITE_POINT.y)?
        .set_default("search.strategy", Strategy::Secant.as_str())?
        .set_default("search.pinning", Pinning::Largest.as_str())?
        .set_default("search.threshold", 0.0002)?
        .set_default("search.descent.max_iterations", 200)?
        .set_default("search.descent.tolerance", 0.0005)?
        .set_default("search.secant.max_iterations", 100)?
        .set_default("display.device", "/dev/fb0")?
        .set_default("display.alpha", 255)?
        .set_default("meter.command", "spotread")?
        .set_default("meter.args", vec!["-e", "-x"])?
        .set_default("meter.marker", "Yxy: ")?
        .add_source(config::File::new(filename.as_str(), FileFormat::Yaml).required(false))
        .set_override_option("search.strategy", overrides.strategy.map(Strategy::as_str))?
        .set_override_option("search.pinning", overrides.pinning.map(Pinning::as_str))?
        .set_override_option("search.secant.seed", overrides.seed)?
        .set_override_option(
            "display.device",
            overrides.device.as_deref().map(Utf8Path::as_str),
        )?
        .build()?;

    let conf: AppConfig = settings.try_deserialize()?;
    conf.validate()?;
    Ok(conf)
}
