use serde::{Deserialize, Serialize};

use crate::{TradeDate, ValidationError};

/// Daily OHLCV bar for one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: TradeDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    pub fn new(
        date: TradeDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// A bar plus the features derived from trailing history.
///
/// `None` marks a feature whose window is not yet warm. It is never
/// conflated with a computed value of zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRow {
    #[serde(flatten)]
    pub bar: Bar,
    pub daily_return: Option<f64>,
    pub volatility_30: Option<f64>,
    pub ma_20: Option<f64>,
    pub ma_50: Option<f64>,
    pub rsi_14: Option<f64>,
}

impl EnrichedRow {
    /// Row with every derived feature undefined.
    pub const fn unwarmed(bar: Bar) -> Self {
        Self {
            bar,
            daily_return: None,
            volatility_30: None,
            ma_20: None,
            ma_50: None,
            rsi_14: None,
        }
    }

    pub const fn date(&self) -> TradeDate {
        self.bar.date
    }

    pub const fn close(&self) -> f64 {
        self.bar.close
    }
}

/// Date-ordered enriched rows for one ticker. Dates are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<EnrichedRow>", into = "Vec<EnrichedRow>")]
pub struct EnrichedSeries(Vec<EnrichedRow>);

impl EnrichedSeries {
    pub fn new(rows: Vec<EnrichedRow>) -> Result<Self, ValidationError> {
        ensure_strictly_increasing(rows.iter().map(EnrichedRow::date))?;
        Ok(Self(rows))
    }

    pub fn rows(&self) -> &[EnrichedRow] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&EnrichedRow> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&EnrichedRow> {
        self.0.last()
    }

    pub fn closes(&self) -> impl Iterator<Item = (TradeDate, f64)> + '_ {
        self.0.iter().map(|row| (row.date(), row.close()))
    }

    /// Defined daily returns with their dates; the warm-up row is skipped.
    pub fn returns(&self) -> impl Iterator<Item = (TradeDate, f64)> + '_ {
        self.0
            .iter()
            .filter_map(|row| row.daily_return.map(|value| (row.date(), value)))
    }

    pub fn return_values(&self) -> Vec<f64> {
        self.returns().map(|(_, value)| value).collect()
    }
}

impl TryFrom<Vec<EnrichedRow>> for EnrichedSeries {
    type Error = ValidationError;

    fn try_from(value: Vec<EnrichedRow>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EnrichedSeries> for Vec<EnrichedRow> {
    fn from(value: EnrichedSeries) -> Self {
        value.0
    }
}

/// Fails with the index of the first date that does not advance.
pub fn ensure_strictly_increasing(
    dates: impl IntoIterator<Item = TradeDate>,
) -> Result<(), ValidationError> {
    let mut previous: Option<TradeDate> = None;
    for (index, date) in dates.into_iter().enumerate() {
        if previous.is_some_and(|prev| date <= prev) {
            return Err(ValidationError::UnorderedSeries { index });
        }
        previous = Some(date);
    }
    Ok(())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> TradeDate {
        TradeDate::parse(value).expect("valid date")
    }

    fn bar(day: &str, close: f64) -> Bar {
        Bar::new(date(day), close, close, close, close, 1_000).expect("valid bar")
    }

    #[test]
    fn rejects_invalid_bar_bounds() {
        let err = Bar::new(date("2024-01-02"), 10.0, 12.0, 9.0, 12.5, 10).expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidBarBounds));
    }

    #[test]
    fn rejects_non_finite_prices() {
        let err =
            Bar::new(date("2024-01-02"), f64::NAN, 12.0, 9.0, 10.0, 10).expect_err("must fail");
        assert!(matches!(err, ValidationError::NonFiniteValue { field: "open" }));
    }

    #[test]
    fn series_rejects_duplicate_dates() {
        let rows = vec![
            EnrichedRow::unwarmed(bar("2024-01-02", 10.0)),
            EnrichedRow::unwarmed(bar("2024-01-02", 11.0)),
        ];
        let err = EnrichedSeries::new(rows).expect_err("must fail");
        assert_eq!(err, ValidationError::UnorderedSeries { index: 1 });
    }

    #[test]
    fn series_returns_skip_undefined_rows() {
        let mut second = EnrichedRow::unwarmed(bar("2024-01-03", 11.0));
        second.daily_return = Some(0.1);
        let series = EnrichedSeries::new(vec![EnrichedRow::unwarmed(bar("2024-01-02", 10.0)), second])
            .expect("ordered series");

        assert_eq!(series.return_values(), vec![0.1]);
    }

    #[test]
    fn row_serializes_undefined_features_as_null() {
        let row = EnrichedRow::unwarmed(bar("2024-01-02", 10.0));
        let value = serde_json::to_value(row).expect("serialize");
        assert_eq!(value["date"], "2024-01-02");
        assert!(value["ma_20"].is_null());
        let back: EnrichedRow = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, row);
    }
}
