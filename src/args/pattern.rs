use crate::error::ConfigError;

pub const DEFAULT_SAMPLES: u32 = 10_000;
pub const DEFAULT_SAMPLING_RATE: f64 = 20.0;

/// One experiment shape, parsed once from the colon-delimited selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPattern {
    Fixed { load: u32 },
    FixedQual { load: u32 },
    FixedRepeat { load: u32 },
    Step { start: u32, end: u32, step: u32, qualified: bool },
}

/// A pattern plus the sampling parameters its selector carried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternSpec {
    pub pattern: LoadPattern,
    pub samples: u32,
    pub sampling_rate: f64,
}

fn parse_u32(fields: &[&str], index: usize, field: &'static str) -> Result<u32, ConfigError> {
    fields
        .get(index)
        .ok_or(ConfigError::MissingPatternField { field })?
        .parse::<u32>()
        .map_err(|err| ConfigError::InvalidPatternInt { field, source: err })
}

fn parse_sampling(
    fields: &[&str],
    first: usize,
) -> Result<(Option<u32>, Option<f64>), ConfigError> {
    let samples = match fields.get(first) {
        Some(value) => Some(value.parse::<u32>().map_err(|err| {
            ConfigError::InvalidPatternInt {
                field: "samples",
                source: err,
            }
        })?),
        None => None,
    };
    let rate = match fields.get(first + 1) {
        Some(value) => Some(value.parse::<f64>().map_err(|err| {
            ConfigError::InvalidPatternFloat {
                field: "sampling rate",
                source: err,
            }
        })?),
        None => None,
    };
    Ok((samples, rate))
}

/// Parses a selector such as `fixed:10000:1000:100` or `stepQual:1000:9000:1000`.
pub fn parse_pattern(value: &str) -> Result<PatternSpec, ConfigError> {
    let fields: Vec<&str> = value.split(':').collect();
    let (pattern, sampling) = match fields[0] {
        "fixed" => (
            LoadPattern::Fixed {
                load: parse_u32(&fields, 1, "load")?,
            },
            parse_sampling(&fields, 2)?,
        ),
        "fixedQual" | "fixedSteady" => (
            LoadPattern::FixedQual {
                load: parse_u32(&fields, 1, "load")?,
            },
            parse_sampling(&fields, 2)?,
        ),
        "fixedRepeat" => (
            LoadPattern::FixedRepeat {
                load: parse_u32(&fields, 1, "load")?,
            },
            (None, None),
        ),
        "step" | "stepQual" => (
            LoadPattern::Step {
                start: parse_u32(&fields, 1, "start load")?,
                end: parse_u32(&fields, 2, "end load")?,
                step: parse_u32(&fields, 3, "step load")?,
                qualified: fields[0] == "stepQual",
            },
            parse_sampling(&fields, 4)?,
        ),
        _ => {
            return Err(ConfigError::UnknownPattern {
                value: value.to_owned(),
            })
        }
    };
    let (samples, rate) = sampling;
    Ok(PatternSpec {
        pattern,
        samples: samples.unwrap_or(DEFAULT_SAMPLES),
        sampling_rate: rate.unwrap_or(DEFAULT_SAMPLING_RATE),
    })
}
