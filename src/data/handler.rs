use crate::broker::BrokerClient;
use crate::config::SymbolConfig;
use crate::data::error::DataError;
use crate::data::market::{OhlcvSeries, Timeframe};
use crate::data::resample::resample;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-coarsest-timeframe caps on the number of bars a data window covers.
///
/// The cap shrinks as the coarsest requested timeframe grows so that the equivalent
/// base-timeframe request stays within broker history limits, while still providing enough
/// coarse bars for a 200-period moving average with margin.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct BarCaps {
    pub m1: u32,
    pub m5: u32,
    pub m15: u32,
    pub m30: u32,
    pub h1: u32,
    pub h4: u32,
    pub d1: u32,
}

impl Default for BarCaps {
    fn default() -> Self {
        Self {
            m1: 1440,
            m5: 1440,
            m15: 1000,
            m30: 720,
            h1: 500,
            h4: 500,
            d1: 500,
        }
    }
}

impl BarCaps {
    /// Bar-count cap applied when `timeframe` is the coarsest one requested.
    pub fn cap(&self, timeframe: Timeframe) -> u32 {
        match timeframe {
            Timeframe::M1 => self.m1,
            Timeframe::M5 => self.m5,
            Timeframe::M15 => self.m15,
            Timeframe::M30 => self.m30,
            Timeframe::H1 => self.h1,
            Timeframe::H4 => self.h4,
            Timeframe::D1 => self.d1,
        }
    }

    /// Data window covering `cap(max_timeframe)` bars of `max_timeframe`.
    pub fn window(&self, max_timeframe: Timeframe) -> TimeDelta {
        TimeDelta::minutes(max_timeframe.minutes() * i64::from(self.cap(max_timeframe)))
    }
}

/// Fetches a symbol's base-timeframe series from the broker and resamples it to the requested
/// set of coarser timeframes, returning one aligned [`OhlcvSeries`] per producible timeframe.
#[derive(Debug)]
pub struct MarketDataService<Broker> {
    broker: Arc<Broker>,
    caps: BarCaps,
}

impl<Broker> MarketDataService<Broker>
where
    Broker: BrokerClient,
{
    /// Constructs a new [`MarketDataService`] using the provided broker handle and window caps.
    pub fn new(broker: Arc<Broker>, caps: BarCaps) -> Self {
        Self { broker, caps }
    }

    /// Data window required to satisfy the coarsest timeframe of `timeframes`.
    pub fn window_for(&self, timeframes: &BTreeSet<Timeframe>) -> TimeDelta {
        let max_timeframe = timeframes.iter().max().copied().unwrap_or(Timeframe::M1);
        self.caps.window(max_timeframe)
    }

    /// Returns the mapping `timeframe -> series` for `symbol` over `[start, end]`.
    ///
    /// The symbol's base timeframe is always included unmodified. Targets coarser than the base
    /// are resampled from it. A target finer than the base cannot be produced and is dropped
    /// with a warning rather than appearing in the result.
    pub fn get(
        &self,
        symbol: &SymbolConfig,
        targets: &BTreeSet<Timeframe>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HashMap<Timeframe, OhlcvSeries>, DataError> {
        let base = symbol.min_timeframe;
        debug!(
            symbol = %symbol.name,
            %base,
            %start,
            %end,
            "requesting base series from broker"
        );

        let mut raw = self.broker.get_ohlcv(&symbol.name, base, start, end)?;
        raw.symbol = symbol.name.clone();

        if raw.is_empty() {
            return Err(DataError::Empty(symbol.name.clone()));
        }
        if raw.timeframe != base || !raw.is_aligned() {
            return Err(DataError::Misaligned {
                symbol: symbol.name.clone(),
                timeframe: base,
            });
        }

        let mut series_by_timeframe = HashMap::with_capacity(targets.len() + 1);
        for &target in targets {
            if target < base {
                warn!(
                    symbol = %symbol.name,
                    %target,
                    %base,
                    "target timeframe finer than the symbol's base resolution, dropping"
                );
                continue;
            }
            if target == base {
                continue;
            }
            series_by_timeframe.insert(target, resample(&raw, target));
        }
        series_by_timeframe.insert(base, raw);

        Ok(series_by_timeframe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::BrokerError;
    use crate::data::market::Bar;
    use crate::execution::position::Position;
    use crate::execution::trade::TradeRecord;
    use crate::execution::{OrderRequest, OrderResult};
    use chrono::TimeZone;

    struct FixedSeriesBroker {
        series: OhlcvSeries,
    }

    impl BrokerClient for FixedSeriesBroker {
        fn connect(&self) -> Result<(), BrokerError> {
            Ok(())
        }

        fn get_ohlcv(
            &self,
            _: &str,
            _: Timeframe,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
        ) -> Result<OhlcvSeries, BrokerError> {
            Ok(self.series.clone())
        }

        fn send_market_order(&self, _: &OrderRequest) -> Result<OrderResult, BrokerError> {
            Err(BrokerError::Unsupported("send_market_order"))
        }

        fn get_open_positions(&self) -> Result<Vec<Position>, BrokerError> {
            Ok(Vec::new())
        }

        fn get_closed_trades(&self) -> Result<Vec<TradeRecord>, BrokerError> {
            Err(BrokerError::Unsupported("get_closed_trades"))
        }
    }

    fn minute_series(length: usize) -> OhlcvSeries {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
        let bars = (0..length)
            .map(|index| Bar {
                time: start + TimeDelta::minutes(index as i64),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: 1.0,
            })
            .collect();
        OhlcvSeries::new("EURUSD", Timeframe::M1, bars)
    }

    fn service(series: OhlcvSeries) -> MarketDataService<FixedSeriesBroker> {
        MarketDataService::new(
            Arc::new(FixedSeriesBroker { series }),
            BarCaps::default(),
        )
    }

    fn window(start: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (start, start + TimeDelta::minutes(10))
    }

    #[test]
    fn base_timeframe_is_always_included_unmodified() {
        let series = minute_series(10);
        let expected = series.clone();
        let service = service(series);
        let symbol = SymbolConfig::new("EURUSD", Timeframe::M1, 0.01);
        let (start, end) = window(expected.bars[0].time);

        let result = service
            .get(&symbol, &BTreeSet::from([Timeframe::M5]), start, end)
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[&Timeframe::M1], expected);
        assert_eq!(result[&Timeframe::M5].len(), 2);
    }

    #[test]
    fn targets_finer_than_base_never_appear_in_the_result() {
        let mut series = minute_series(12);
        series.timeframe = Timeframe::M5;
        for (index, bar) in series.bars.iter_mut().enumerate() {
            bar.time = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()
                + TimeDelta::minutes(5 * index as i64);
        }
        let start = series.bars[0].time;
        let service = service(series);
        let symbol = SymbolConfig::new("EURUSD", Timeframe::M5, 0.01);

        let result = service
            .get(
                &symbol,
                &BTreeSet::from([Timeframe::M1, Timeframe::M15]),
                start,
                start + TimeDelta::hours(1),
            )
            .unwrap();

        assert!(!result.contains_key(&Timeframe::M1));
        assert!(result.contains_key(&Timeframe::M5));
        assert!(result.contains_key(&Timeframe::M15));
    }

    #[test]
    fn empty_broker_series_surfaces_as_data_error() {
        let service = service(minute_series(0));
        let symbol = SymbolConfig::new("EURUSD", Timeframe::M1, 0.01);
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();

        let result = service.get(&symbol, &BTreeSet::from([Timeframe::M1]), start, start);

        assert!(matches!(result, Err(DataError::Empty(_))));
    }

    #[test]
    fn wrong_granularity_series_surfaces_as_misaligned() {
        let series = minute_series(10);
        let start = series.bars[0].time;
        let service = service(series);
        // Symbol claims an M5 base, yet the broker hands back minute bars.
        let symbol = SymbolConfig::new("EURUSD", Timeframe::M5, 0.01);

        let result = service.get(
            &symbol,
            &BTreeSet::from([Timeframe::M5]),
            start,
            start + TimeDelta::minutes(10),
        );

        assert!(matches!(result, Err(DataError::Misaligned { .. })));
    }

    #[test]
    fn window_scales_with_the_coarsest_requested_timeframe() {
        let service = service(minute_series(1));

        let fine = service.window_for(&BTreeSet::from([Timeframe::M1]));
        assert_eq!(fine, TimeDelta::minutes(1440));

        let coarse = service.window_for(&BTreeSet::from([Timeframe::M1, Timeframe::H1]));
        assert_eq!(coarse, TimeDelta::minutes(60 * 500));
    }
}
