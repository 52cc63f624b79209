use crate::data::market::{Bar, OhlcvSeries, Timeframe};
use chrono::TimeDelta;

/// Aggregates a fine series into bars aligned to the coarser `target` timeframe.
///
/// Each output bar covers the half-open interval `[t, t + target)` of the input: open is the
/// first contained open, high/low the extremes, close the last contained close, volume the sum.
/// Intervals containing no input bar are dropped rather than emitted as gaps, so the output keeps
/// the gap structure of the input.
pub fn resample(base: &OhlcvSeries, target: Timeframe) -> OhlcvSeries {
    let step_secs = target.minutes() * 60;
    let mut bars: Vec<Bar> = Vec::with_capacity(
        base.bars.len() / (target.minutes() / base.timeframe.minutes()).max(1) as usize + 1,
    );

    for bar in &base.bars {
        let bucket_time = bar.time - TimeDelta::seconds(bar.time.timestamp().rem_euclid(step_secs));
        if let Some(last) = bars.last_mut()
            && last.time == bucket_time
        {
            last.high = last.high.max(bar.high);
            last.low = last.low.min(bar.low);
            last.close = bar.close;
            last.volume += bar.volume;
            continue;
        }
        bars.push(Bar {
            time: bucket_time,
            ..*bar
        });
    }

    OhlcvSeries::new(base.symbol.clone(), target, bars)
}
