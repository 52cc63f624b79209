use crate::SymbolId;
use crate::config::ConfigError;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of bar resolutions the engine understands, totally ordered by minute count.
/// Every timeframe is an integer multiple of [`Timeframe::M1`]. Broker extensions (eg/ "W1",
/// "MN1") are not part of the set and fail to parse.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    /// Interval width in minutes.
    pub fn minutes(&self) -> i64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }

    /// Interval width as a [`TimeDelta`].
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::minutes(self.minutes())
    }

    /// Broker-boundary string representation (eg/ "M15").
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "M1" => Ok(Timeframe::M1),
            "M5" => Ok(Timeframe::M5),
            "M15" => Ok(Timeframe::M15),
            "M30" => Ok(Timeframe::M30),
            "H1" => Ok(Timeframe::H1),
            "H4" => Ok(Timeframe::H4),
            "D1" => Ok(Timeframe::D1),
            unknown => Err(ConfigError::UnknownTimeframe(unknown.to_owned())),
        }
    }
}

/// OHLCV record summarising price action over one timeframe interval starting at `time`.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Ordered sequence of [`Bar`]s indexed by strictly increasing UTC timestamps, tagged with the
/// owning symbol and the timeframe the bars are aligned to.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct OhlcvSeries {
    pub symbol: SymbolId,
    pub timeframe: Timeframe,
    pub bars: Vec<Bar>,
}

impl OhlcvSeries {
    /// Constructs a new [`OhlcvSeries`] from the provided bars.
    pub fn new(symbol: impl Into<SymbolId>, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// A series is aligned to its timeframe iff every timestamp is a multiple of the timeframe
    /// from the epoch and timestamps are strictly increasing. Intervals may be missing (markets
    /// close), so consecutive timestamps are not required to be adjacent.
    pub fn is_aligned(&self) -> bool {
        let step_secs = self.timeframe.minutes() * 60;
        let aligned = self
            .bars
            .iter()
            .all(|bar| bar.time.timestamp().rem_euclid(step_secs) == 0);
        let increasing = self
            .bars
            .windows(2)
            .all(|pair| pair[0].time < pair[1].time);
        aligned && increasing
    }
}
