//! Static precision table for Bitstamp currency pairs.
//!
//! Regenerate from `GET /v2/trading-pairs-info/` (`url_symbol`,
//! `base_decimals`, `counter_decimals`) keeping the rows sorted by symbol.

use crate::core::errors::BitstampError;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places accepted for a pair's amount (base) and price (counter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairPrecision {
    pub base_decimals: u32,
    pub counter_decimals: u32,
}

// sorted by symbol for binary search
static PRECISIONS: &[(&str, u32, u32)] = &[
    ("1incheur", 2, 2),
    ("1inchusd", 2, 2),
    ("aavebtc", 8, 8),
    ("aaveeur", 8, 2),
    ("aaveusd", 8, 2),
    ("adabtc", 8, 8),
    ("adaeur", 8, 5),
    ("adausd", 8, 5),
    ("algobtc", 8, 8),
    ("algoeur", 8, 5),
    ("algousd", 8, 5),
    ("alphaeur", 8, 5),
    ("alphausd", 8, 5),
    ("ampeur", 8, 5),
    ("ampusd", 8, 5),
    ("anteur", 1, 2),
    ("antusd", 1, 2),
    ("apeeur", 2, 2),
    ("apeusd", 2, 2),
    ("audiobtc", 8, 8),
    ("audioeur", 8, 5),
    ("audiousd", 8, 5),
    ("avaxeur", 8, 5),
    ("avaxusd", 8, 5),
    ("axseur", 8, 5),
    ("axsusd", 8, 5),
    ("bandeur", 2, 3),
    ("bandusd", 2, 3),
    ("bateur", 8, 5),
    ("batusd", 8, 5),
    ("bchbtc", 8, 8),
    ("bcheur", 8, 2),
    ("bchusd", 8, 2),
    ("blureur", 3, 4),
    ("blurusd", 3, 4),
    ("btceur", 8, 0),
    ("btcgbp", 8, 0),
    ("btcusd", 8, 0),
    ("btcusdc", 8, 0),
    ("btcusdt", 8, 0),
    ("chzeur", 8, 5),
    ("chzusd", 8, 5),
    ("compeur", 8, 2),
    ("compusd", 8, 2),
    ("crveur", 8, 5),
    ("crvusd", 8, 5),
    ("cspreur", 1, 5),
    ("csprusd", 1, 5),
    ("ctsieur", 1, 4),
    ("ctsiusd", 1, 4),
    ("cvxeur", 3, 2),
    ("cvxusd", 3, 2),
    ("daiusd", 5, 5),
    ("dgldeur", 5, 1),
    ("dgldusd", 5, 1),
    ("dogeeur", 2, 5),
    ("dogeusd", 2, 5),
    ("doteur", 2, 3),
    ("dotusd", 2, 3),
    ("dydxeur", 8, 3),
    ("dydxusd", 8, 3),
    ("enjeur", 8, 5),
    ("enjusd", 8, 5),
    ("enseur", 2, 2),
    ("ensusd", 2, 2),
    ("eth2eth", 8, 8),
    ("ethbtc", 8, 8),
    ("etheur", 8, 1),
    ("ethgbp", 8, 1),
    ("ethusd", 8, 1),
    ("ethusdc", 8, 1),
    ("ethusdt", 8, 1),
    ("eurcveur", 2, 4),
    ("eurcvusdt", 2, 4),
    ("euroceur", 2, 4),
    ("eurocusdc", 2, 4),
    ("eurteur", 5, 5),
    ("eurtusd", 5, 5),
    ("eurusd", 5, 5),
    ("feteur", 8, 5),
    ("fetusd", 8, 5),
    ("flreur", 1, 5),
    ("flrusd", 1, 5),
    ("ftmeur", 8, 5),
    ("ftmusd", 8, 5),
    ("galaeur", 8, 5),
    ("galausd", 8, 5),
    ("gbpusd", 5, 5),
    ("godseur", 2, 2),
    ("godsusd", 2, 2),
    ("grteur", 8, 5),
    ("grtusd", 8, 5),
    ("gusdusd", 5, 5),
    ("hbareur", 8, 5),
    ("hbarusd", 8, 5),
    ("imxeur", 2, 2),
    ("imxusd", 2, 2),
    ("injeur", 2, 3),
    ("injusd", 2, 3),
    ("knceur", 8, 5),
    ("kncusd", 8, 5),
    ("ldoeur", 2, 4),
    ("ldousd", 2, 4),
    ("linkbtc", 8, 8),
    ("linkeur", 8, 2),
    ("linkgbp", 8, 2),
    ("linkusd", 8, 2),
    ("lmwreur", 3, 4),
    ("lmwrusd", 3, 4),
    ("lrceur", 1, 4),
    ("lrcusd", 1, 4),
    ("ltcbtc", 8, 8),
    ("ltceur", 8, 2),
    ("ltcgbp", 8, 2),
    ("ltcusd", 8, 2),
    ("manaeur", 2, 2),
    ("manausd", 2, 2),
    ("maticeur", 8, 5),
    ("maticusd", 8, 5),
    ("mkreur", 8, 2),
    ("mkrusd", 8, 2),
    ("mpleur", 3, 2),
    ("mplusd", 3, 2),
    ("neareur", 2, 3),
    ("nearusd", 2, 3),
    ("nexoeur", 2, 2),
    ("nexousd", 2, 2),
    ("paxusd", 5, 5),
    ("pepeeur", 1, 8),
    ("pepeusd", 1, 8),
    ("perpeur", 8, 3),
    ("perpusd", 8, 3),
    ("pyusdeur", 2, 4),
    ("pyusdusd", 2, 4),
    ("radeur", 2, 2),
    ("radusd", 2, 2),
    ("rlyeur", 0, 4),
    ("rlyusd", 0, 4),
    ("rndreur", 2, 3),
    ("rndrusd", 2, 3),
    ("sandeur", 8, 5),
    ("sandusd", 8, 5),
    ("sgbeur", 8, 5),
    ("sgbusd", 8, 5),
    ("shibeur", 0, 8),
    ("shibusd", 0, 8),
    ("skleur", 8, 5),
    ("sklusd", 8, 5),
    ("slpeur", 0, 5),
    ("slpusd", 0, 5),
    ("snxeur", 8, 5),
    ("snxusd", 8, 5),
    ("soleur", 2, 4),
    ("solusd", 2, 4),
    ("storjeur", 8, 5),
    ("storjusd", 8, 5),
    ("suieur", 4, 3),
    ("suiusd", 4, 3),
    ("sushieur", 8, 5),
    ("sushiusd", 8, 5),
    ("traceur", 2, 4),
    ("tracusd", 2, 4),
    ("umaeur", 8, 2),
    ("umausd", 8, 2),
    ("unibtc", 8, 8),
    ("unieur", 8, 5),
    ("uniusd", 8, 5),
    ("usdceur", 5, 5),
    ("usdcusd", 5, 5),
    ("usdcusdt", 5, 5),
    ("usdteur", 5, 5),
    ("usdtusd", 5, 5),
    ("vchfeur", 2, 4),
    ("vchfusd", 2, 4),
    ("vegaeur", 2, 3),
    ("vegausd", 2, 3),
    ("veureur", 2, 4),
    ("veurusd", 2, 4),
    ("vexteur", 3, 4),
    ("vextusd", 3, 4),
    ("wbtcbtc", 4, 4),
    ("wecaneur", 2, 5),
    ("wecanusd", 2, 5),
    ("xlmbtc", 8, 8),
    ("xlmeur", 8, 5),
    ("xlmgbp", 8, 5),
    ("xlmusd", 8, 5),
    ("xrpbtc", 8, 8),
    ("xrpeur", 8, 5),
    ("xrpgbp", 8, 5),
    ("xrpusd", 8, 5),
    ("xrpusdt", 8, 5),
    ("yfieur", 8, 2),
    ("yfiusd", 8, 2),
    ("zrxeur", 8, 5),
    ("zrxusd", 8, 5),
];

/// Precision for `pair`, if the pair is known.
pub fn precision(pair: &str) -> Option<PairPrecision> {
    PRECISIONS
        .binary_search_by(|(symbol, _, _)| (*symbol).cmp(pair))
        .ok()
        .map(|index| {
            let (_, base_decimals, counter_decimals) = PRECISIONS[index];
            PairPrecision {
                base_decimals,
                counter_decimals,
            }
        })
}

pub fn is_known_pair(pair: &str) -> bool {
    precision(pair).is_some()
}

/// All known pair symbols in sorted order.
pub fn known_pairs() -> impl Iterator<Item = &'static str> {
    PRECISIONS.iter().map(|(symbol, _, _)| *symbol)
}

pub fn validate_currency_pair(pair: &str) -> Result<PairPrecision, BitstampError> {
    precision(pair).ok_or_else(|| {
        BitstampError::InvalidParameters(format!("unknown currency pair: {}", pair))
    })
}

/// Round an order amount to the pair's base precision (half away from zero).
pub fn round_amount(pair: &str, amount: Decimal) -> Result<Decimal, BitstampError> {
    let precision = validate_currency_pair(pair)?;
    Ok(amount.round_dp_with_strategy(
        precision.base_decimals,
        RoundingStrategy::MidpointAwayFromZero,
    ))
}

/// Round an order price to the pair's counter precision (half away from zero).
pub fn round_price(pair: &str, price: Decimal) -> Result<Decimal, BitstampError> {
    let precision = validate_currency_pair(pair)?;
    Ok(price.round_dp_with_strategy(
        precision.counter_decimals,
        RoundingStrategy::MidpointAwayFromZero,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_table_is_sorted_and_unique() {
        let symbols: Vec<&str> = known_pairs().collect();
        assert!(symbols.windows(2).all(|w| w[0] < w[1]));
        assert!(symbols.len() > 150);
    }

    #[test]
    fn test_precision_lookup() {
        assert_eq!(
            precision("btcusd"),
            Some(PairPrecision {
                base_decimals: 8,
                counter_decimals: 0
            })
        );
        assert_eq!(precision("ethusd").map(|p| p.counter_decimals), Some(1));
        assert_eq!(precision("xrpusd").map(|p| p.counter_decimals), Some(5));
        assert!(precision("BTCUSD").is_none());
        assert!(precision("doesnotexist").is_none());
        assert!(is_known_pair("1incheur"));
        assert!(is_known_pair("zrxusd"));
    }

    #[test]
    fn test_validate_currency_pair() {
        assert!(validate_currency_pair("btceur").is_ok());
        let err = validate_currency_pair("btcxyz").unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameters: unknown currency pair: btcxyz");
    }

    #[test]
    fn test_rounding() {
        let amount = Decimal::from_str("0.123456789").unwrap();
        let price = Decimal::from_str("27123.5").unwrap();
        assert_eq!(
            round_amount("btcusd", amount).unwrap(),
            Decimal::from_str("0.12345679").unwrap()
        );
        assert_eq!(
            round_price("btcusd", price).unwrap(),
            Decimal::from_str("27124").unwrap()
        );
        assert_eq!(
            round_price("ethusd", Decimal::from_str("1650.44").unwrap()).unwrap(),
            Decimal::from_str("1650.4").unwrap()
        );
        assert!(round_price("nope", price).is_err());
    }
}
