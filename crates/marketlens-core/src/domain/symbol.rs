use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Longest ticker accepted; listed equity tickers stay well below this.
pub const MAX_TICKER_LEN: usize = 10;

/// Equity ticker in canonical uppercase form.
///
/// Share-class suffixes keep their separator (`BRK-B`, `BF.B`). `Ord` is
/// plain byte order, which is what the universe's `BTreeMap` keys rely on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let ticker = input.trim().to_ascii_uppercase();

        let mut len = 0;
        for (index, ch) in ticker.chars().enumerate() {
            match (index, ch) {
                (0, c) if !c.is_ascii_alphabetic() => {
                    return Err(ValidationError::SymbolInvalidStart { ch: c });
                }
                (_, c) if c.is_ascii_alphanumeric() || c == '-' || c == '.' => {}
                (_, c) => return Err(ValidationError::SymbolInvalidChar { ch: c, index }),
            }
            len += 1;
        }

        match len {
            0 => Err(ValidationError::EmptySymbol),
            len if len > MAX_TICKER_LEN => Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_TICKER_LEN,
            }),
            _ => Ok(Self(ticker)),
        }
    }

    /// Stops at the first ticker that does not parse.
    pub fn parse_all<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<Self>, ValidationError> {
        inputs.iter().map(|raw| Self::parse(raw.as_ref())).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_is_trimmed_and_uppercased() {
        assert_eq!(Symbol::parse(" msft\n").expect("valid").as_str(), "MSFT");
        assert_eq!("brk-b".parse::<Symbol>().expect("valid").as_str(), "BRK-B");
        assert_eq!(Symbol::parse("bf.b").expect("valid").as_str(), "BF.B");
    }

    #[test]
    fn ticker_must_start_with_a_letter() {
        assert_eq!(
            Symbol::parse("3M"),
            Err(ValidationError::SymbolInvalidStart { ch: '3' })
        );
        assert_eq!(
            Symbol::parse("-X"),
            Err(ValidationError::SymbolInvalidStart { ch: '-' })
        );
    }

    #[test]
    fn blank_and_oversized_tickers_are_rejected() {
        assert_eq!(Symbol::parse("   "), Err(ValidationError::EmptySymbol));
        assert_eq!(
            Symbol::parse("ABCDEFGHIJK"),
            Err(ValidationError::SymbolTooLong { len: 11, max: 10 })
        );
    }

    #[test]
    fn punctuation_outside_share_class_separators_is_rejected() {
        assert_eq!(
            Symbol::parse("AAPL$"),
            Err(ValidationError::SymbolInvalidChar { ch: '$', index: 4 })
        );
        assert_eq!(
            Symbol::parse("BRK B"),
            Err(ValidationError::SymbolInvalidChar { ch: ' ', index: 3 })
        );
    }

    #[test]
    fn universe_keys_sort_by_ticker() {
        let mut tickers = Symbol::parse_all(&["XOM", "AAPL", "BRK-B"]).expect("valid");
        tickers.sort();
        let names: Vec<&str> = tickers.iter().map(Symbol::as_str).collect();
        assert_eq!(names, ["AAPL", "BRK-B", "XOM"]);
    }
}
