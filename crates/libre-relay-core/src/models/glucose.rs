use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Format of the `Timestamp` field reported by LibreLinkUp (device local time)
const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Direction of the short-term glucose trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Up,
    Down,
    Steady,
}

impl TrendLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::Up => "up",
            TrendLabel::Down => "down",
            TrendLabel::Steady => "steady",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single glucose measurement as returned by the graph and logbook endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlucoseSample {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "FactoryTimestamp")]
    pub factory_timestamp: Option<String>,
    /// Kept as received so integers are relayed as integers
    #[serde(rename = "Value")]
    pub value: Number,
    #[serde(rename = "ValueInMgPerDl")]
    pub value_in_mg_per_dl: Option<f64>,
    #[serde(rename = "TrendArrow")]
    pub trend_arrow: Option<i32>,
    #[serde(rename = "isHigh", default)]
    pub is_high: bool,
    #[serde(rename = "isLow", default)]
    pub is_low: bool,
    /// Computed locally; never part of the remote payload.
    #[serde(skip)]
    pub trend: Option<TrendLabel>,
}

impl GlucoseSample {
    /// Attach a computed trend label to this sample
    pub fn with_trend(mut self, trend: TrendLabel) -> Self {
        self.trend = Some(trend);
        self
    }

    /// The measured value as a float, for trend calculation
    pub fn value_f64(&self) -> f64 {
        self.value.as_f64().unwrap_or(f64::NAN)
    }

    /// Parse the device-local timestamp, if it is in the expected format
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.timestamp.trim(), TIMESTAMP_FORMAT).ok()
    }
}

impl fmt::Display for GlucoseSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\tValue: {}", self.timestamp, self.value)?;
        if let Some(trend) = self.trend {
            write!(f, "\tTrend: {}", trend)?;
        }
        Ok(())
    }
}

/// The payload forwarded to the downstream endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub time: String,
    pub value: Number,
    pub trend: TrendLabel,
}

impl Reading {
    pub fn new(sample: &GlucoseSample, trend: TrendLabel) -> Self {
        Self {
            time: sample.timestamp.clone(),
            value: sample.value.clone(),
            trend,
        }
    }
}
