//! Series palette derivation from a single base color

use tracing::{trace, warn};

use crate::{ChartError, ChartResult};

/// Brightness multiplier between consecutive palette entries
const BRIGHTER: f64 = 1.0 / 0.7;

/// Collaborator producing one color per series
pub trait PaletteGenerator {
    fn generate(&self, base: &str, count: usize) -> ChartResult<Vec<String>>;
}

/// Linear sRGB color with unclamped channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub fn parse(input: &str) -> ChartResult<Self> {
        let s = input.trim().to_ascii_lowercase();
        let invalid = || ChartError::InvalidColor(input.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            let channel = |h: &str| u8::from_str_radix(h, 16).map(f64::from).map_err(|_| invalid());
            return match hex.len() {
                3 => {
                    let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
                    Ok(Self {
                        r: expand(0)?,
                        g: expand(1)?,
                        b: expand(2)?,
                    })
                }
                6 => Ok(Self {
                    r: channel(&hex[0..2])?,
                    g: channel(&hex[2..4])?,
                    b: channel(&hex[4..6])?,
                }),
                _ => Err(invalid()),
            };
        }

        let inner = s
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;
        let parts: Vec<f64> = inner
            .split(',')
            .map(|p| p.trim().parse::<f64>().map_err(|_| invalid()))
            .collect::<ChartResult<_>>()?;

        match parts.as_slice() {
            [r, g, b] => Ok(Self { r: *r, g: *g, b: *b }),
            _ => Err(invalid()),
        }
    }

    pub fn brighter(self, k: f64) -> Self {
        let f = BRIGHTER.powf(k);
        Self {
            r: self.r * f,
            g: self.g * f,
            b: self.b * f,
        }
    }

    pub fn to_css(self) -> String {
        let c = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        format!("rgb({}, {}, {})", c(self.r), c(self.g), c(self.b))
    }
}

/// Each entry is one brightness step above the previous one. The first entry
/// is the base color itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrighterPalette;

impl PaletteGenerator for BrighterPalette {
    fn generate(&self, base: &str, count: usize) -> ChartResult<Vec<String>> {
        let rgb = Rgb::parse(base).inspect_err(|err| warn!(%err, "palette base color rejected"))?;
        trace!(base, count, "palette generated");
        if count == 0 {
            return Ok(vec![base.to_string()]);
        }
        Ok((0..count).map(|i| rgb.brighter(i as f64).to_css()).collect())
    }
}
