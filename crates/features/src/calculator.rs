//! Book-derived price metrics.
//!
//! Volume-weighted prices, weighted mids and queue position, computed from
//! the fixed-depth arrays of an [`OrderBookSnapshot`]. Every division is
//! guarded and degrades to NaN.

use lob_core::Side;

use crate::order_book::{OrderBookSnapshot, BPS};

impl OrderBookSnapshot {
    /// Average price paid (ask) or received (bid) consuming levels best first
    /// until `target_size` is filled.
    ///
    /// The last consumed level contributes only the residual size. With
    /// `executable`, a book too thin to fill `target_size` yields NaN;
    /// otherwise the average over the available depth is returned.
    pub fn volume_weighted_price(&self, side: Side, target_size: f64, executable: bool) -> f64 {
        if !(target_size > 0.0) {
            return f64::NAN;
        }

        let (prices, quantities) = self.side(side);
        let mut filled = 0.0;
        let mut notional = 0.0;

        for (&price, &quantity) in prices.iter().zip(quantities) {
            let residual = target_size - filled;
            if quantity < residual {
                notional += price * quantity;
                filled += quantity;
            } else {
                notional += price * residual;
                filled = target_size;
                break;
            }
        }

        if filled == 0.0 || (executable && filled < target_size) {
            return f64::NAN;
        }
        notional / filled
    }

    /// Indicative ask VWAP minus bid VWAP at `target_size`.
    pub fn volume_weighted_spread(&self, target_size: f64) -> f64 {
        self.volume_weighted_spread_with(target_size, false)
    }

    /// Ask VWAP minus bid VWAP, NaN on either side per `executable`.
    pub fn volume_weighted_spread_with(&self, target_size: f64, executable: bool) -> f64 {
        let bid = self.volume_weighted_price(Side::Bid, target_size, executable);
        let ask = self.volume_weighted_price(Side::Ask, target_size, executable);
        ask - bid
    }

    /// [`Self::volume_weighted_spread`] in basis points of mid.
    pub fn volume_weighted_spread_bps(&self, target_size: f64) -> f64 {
        self.spread_in_bps(self.volume_weighted_spread(target_size))
    }

    /// Express a price difference in basis points of mid.
    pub fn spread_in_bps(&self, spread: f64) -> f64 {
        spread / self.mid() * BPS
    }

    /// Mid of the indicative bid and ask VWAPs at `target_size`.
    pub fn vwap_weighted_mid(&self, target_size: f64) -> f64 {
        let bid = self.volume_weighted_price(Side::Bid, target_size, false);
        let ask = self.volume_weighted_price(Side::Ask, target_size, false);
        0.5 * (bid + ask)
    }

    /// Quantity resting at prices strictly better than `price` on `side`:
    /// the queue an order placed at `price` waits behind.
    pub fn volume_ahead_of_price(&self, price: f64, side: Side) -> f64 {
        let (prices, quantities) = self.side(side);
        prices
            .iter()
            .zip(quantities)
            .filter(|(level_price, _)| side.is_better(**level_price, price))
            .map(|(_, &quantity)| quantity)
            .sum()
    }

    /// Microprice: best prices weighted by the opposite side's quantity.
    pub fn top_of_book_weighted_mid(&self) -> f64 {
        let bid = self.bid_price();
        let ask = self.ask_price();
        if bid.is_nan() || ask.is_nan() {
            return f64::NAN;
        }

        let bid_qty = self.bid_quantity[0];
        let ask_qty = self.ask_quantity[0];
        let total = bid_qty + ask_qty;
        if total == 0.0 {
            return f64::NAN;
        }
        (bid * ask_qty + ask * bid_qty) / total
    }

    /// Depth-weighted mid over all levels.
    ///
    /// Each side's quantity-weighted average price is weighted by the opposite
    /// side's total size. This is its own formula, not a deeper microprice:
    /// the weights are total sizes while the prices are per-side averages.
    pub fn book_weighted_mid(&self) -> f64 {
        let total_bid = self.total_bid_size();
        let total_ask = self.total_ask_size();
        let total = total_bid + total_ask;
        if !(total > 0.0) {
            return f64::NAN;
        }

        let bid_avg = weighted_average(&self.bid_prices, &self.bid_quantity);
        let ask_avg = weighted_average(&self.ask_prices, &self.ask_quantity);
        (bid_avg * total_ask + ask_avg * total_bid) / total
    }
}

/// Quantity-weighted average price, NaN when no quantity rests.
fn weighted_average(prices: &[f64], quantities: &[f64]) -> f64 {
    let total: f64 = quantities.iter().sum();
    if total == 0.0 {
        return f64::NAN;
    }
    let notional: f64 = prices.iter().zip(quantities).map(|(p, q)| p * q).sum();
    notional / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lob_core::{BookConfig, Level, NormalizedBook, Venue};

    fn make_book(bids: &[(f64, f64)], asks: &[(f64, f64)]) -> OrderBookSnapshot {
        let config = BookConfig {
            n_levels: 3,
            ..BookConfig::default()
        };
        let mut book = OrderBookSnapshot::new("BTC-USDT", Venue::GateIo, config).unwrap();
        book.apply(&NormalizedBook {
            bids: bids.iter().map(|&(p, q)| Level::new(p, q)).collect(),
            asks: asks.iter().map(|&(p, q)| Level::new(p, q)).collect(),
            ..NormalizedBook::default()
        });
        book
    }

    fn example_book() -> OrderBookSnapshot {
        make_book(
            &[(10.0, 5.0), (9.0, 5.0), (8.0, 5.0)],
            &[(11.0, 4.0), (12.0, 4.0), (13.0, 4.0)],
        )
    }

    #[test]
    fn test_vwap_partial_level() {
        let book = example_book();
        // 5 @ 10 + 2 @ 9
        let vwap = book.volume_weighted_price(Side::Bid, 7.0, true);
        assert_relative_eq!(vwap, 68.0 / 7.0, epsilon = 1e-12);
        assert!((vwap - 9.714).abs() < 0.001);
    }

    #[test]
    fn test_vwap_within_best_level() {
        let book = example_book();
        assert_eq!(book.volume_weighted_price(Side::Ask, 3.0, true), 11.0);
        assert_eq!(book.volume_weighted_price(Side::Ask, 4.0, true), 11.0);
    }

    #[test]
    fn test_vwap_executable_insufficient_depth() {
        let book = example_book();
        assert!(book.volume_weighted_price(Side::Bid, 20.0, true).is_nan());
    }

    #[test]
    fn test_vwap_indicative_uses_available_depth() {
        let book = example_book();
        // Whole bid side: (50 + 45 + 40) / 15
        let vwap = book.volume_weighted_price(Side::Bid, 20.0, false);
        assert_relative_eq!(vwap, 9.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vwap_exact_depth_is_executable() {
        let book = example_book();
        let vwap = book.volume_weighted_price(Side::Ask, 12.0, true);
        assert_relative_eq!(vwap, 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vwap_degenerate_inputs() {
        let book = example_book();
        assert!(book.volume_weighted_price(Side::Bid, 0.0, false).is_nan());
        assert!(book.volume_weighted_price(Side::Bid, -1.0, false).is_nan());
        assert!(book.volume_weighted_price(Side::Bid, f64::NAN, false).is_nan());

        let empty = make_book(&[], &[]);
        assert!(empty.volume_weighted_price(Side::Ask, 1.0, false).is_nan());
    }

    #[test]
    fn test_vw_spread() {
        let book = example_book();
        // ask (44 + 24) / 6, bid (50 + 9) / 6
        let spread = book.volume_weighted_spread(6.0);
        assert_relative_eq!(spread, 68.0 / 6.0 - 59.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(
            book.volume_weighted_spread_bps(6.0),
            spread / 10.5 * 10_000.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(book.vwap_weighted_mid(6.0), 0.5 * (68.0 + 59.0) / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vw_spread_beyond_depth() {
        let book = example_book();
        // 15 bid and 12 ask resting
        assert_relative_eq!(book.volume_weighted_spread(20.0), 12.0 - 9.0, epsilon = 1e-12);
        assert_eq!(
            book.volume_weighted_spread(20.0),
            book.volume_weighted_spread_with(20.0, false)
        );
        assert!(book.volume_weighted_spread_with(20.0, true).is_nan());
        assert_relative_eq!(
            book.volume_weighted_spread_with(4.0, true),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_vw_spread_bps_nan_without_mid() {
        let book = make_book(&[(10.0, 1.0)], &[]);
        assert!(book.volume_weighted_spread_bps(1.0).is_nan());
    }

    #[test]
    fn test_volume_ahead() {
        let book = example_book();
        assert_eq!(book.volume_ahead_of_price(9.0, Side::Bid), 5.0);
        assert_eq!(book.volume_ahead_of_price(8.5, Side::Bid), 10.0);
        assert_eq!(book.volume_ahead_of_price(10.0, Side::Bid), 0.0);
        assert_eq!(book.volume_ahead_of_price(13.0, Side::Ask), 8.0);
        assert_eq!(book.volume_ahead_of_price(11.0, Side::Ask), 0.0);
    }

    #[test]
    fn test_microprice() {
        let book = example_book();
        // (10 * 4 + 11 * 5) / 9
        assert_relative_eq!(book.top_of_book_weighted_mid(), 95.0 / 9.0, epsilon = 1e-12);
    }

    #[test]
    fn test_microprice_zero_quantity_guard() {
        let book = make_book(&[(10.0, 0.0)], &[(11.0, 0.0)]);
        assert!(book.top_of_book_weighted_mid().is_nan());
    }

    #[test]
    fn test_book_weighted_mid() {
        let book = example_book();
        // bid avg 9, ask avg 12, totals 15 / 12
        let expected = (9.0 * 12.0 + 12.0 * 15.0) / 27.0;
        assert_relative_eq!(book.book_weighted_mid(), expected, epsilon = 1e-12);
        assert!((book.book_weighted_mid() - book.top_of_book_weighted_mid()).abs() > 0.1);
    }

    #[test]
    fn test_book_weighted_mid_one_sided() {
        let book = make_book(&[(10.0, 1.0)], &[]);
        assert!(book.book_weighted_mid().is_nan());
        let empty = make_book(&[], &[]);
        assert!(empty.book_weighted_mid().is_nan());
    }
}
