/// Maximum peak-to-trough decline of the equity curve as a percentage of the peak.
///
/// Walks the realised PnL sequence in chronological order, accumulating equity from
/// `initial_balance` while tracking the running peak. `initial_balance` must be positive, which
/// keeps the peak positive and the division defined. An empty sequence yields 0.
pub fn max_drawdown_pct(initial_balance: f64, pnls: impl IntoIterator<Item = f64>) -> f64 {
    let mut equity = initial_balance;
    let mut peak = initial_balance;
    let mut max_dd_pct = 0.0_f64;

    for pnl in pnls {
        equity += pnl;
        peak = peak.max(equity);
        let dd_pct = (peak - equity) / peak * 100.0;
        max_dd_pct = max_dd_pct.max(dd_pct);
    }

    max_dd_pct
}
