use marketlens_core::{
    Bar, FeatureBuilder, HistoryPeriod, ReferenceInfo, Symbol, TickerRecord, TradeDate, Universe,
    UniverseMeta, UtcDateTime,
};

pub(crate) fn date(input: &str) -> TradeDate {
    TradeDate::parse(input).expect("valid date")
}

/// Flat bars (open = high = low = close) on consecutive weekdays from `start`.
pub(crate) fn record(symbol: &str, sector: &str, start: &str, closes: &[f64]) -> TickerRecord {
    let mut day = date(start);
    let mut bars = Vec::with_capacity(closes.len());
    for close in closes {
        bars.push(Bar::new(day, *close, *close, *close, *close, 1_000).expect("valid bar"));
        day = day.next_weekday();
    }
    TickerRecord {
        symbol: Symbol::parse(symbol).expect("valid symbol"),
        series: FeatureBuilder::new().build(&bars).expect("enriched"),
        sector: sector.to_owned(),
        reference: ReferenceInfo::new(),
    }
}

pub(crate) fn universe(records: Vec<TickerRecord>) -> Universe {
    let meta = UniverseMeta {
        period: HistoryPeriod::SixMonths,
        collected_at: UtcDateTime::parse("2024-06-28T21:00:00Z").expect("timestamp"),
    };
    Universe::new(meta, records).expect("universe")
}
