//! ISS JSON payloads
//!
//! ISS answers with named tables, each a list of `columns` and a list of
//! positional `data` rows. Only the tables the gateway needs are modelled.

use crate::error::{MoexError, Result};
use folio_core::{Decimal, Quote, Ticker};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

const PRICE_COLUMN: &str = "PREVPRICE";
const CURRENCY_COLUMN: &str = "CURRENCYID";

/// One ISS table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssTable {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

impl IssTable {
    fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }
}

/// Answer of `/securities/{ticker}.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityInfo {
    #[serde(default)]
    pub boards: IssTable,
}

impl SecurityInfo {
    /// A security exists when ISS lists at least one trading board for it
    pub fn exists(&self) -> bool {
        !self.boards.data.is_empty()
    }
}

/// Answer of `/engines/stock/markets/shares/boards/{board}/securities/{ticker}.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardSecurities {
    #[serde(default)]
    pub securities: IssTable,
}

impl BoardSecurities {
    /// Previous-session price of the first row, `None` if ISS has no price
    pub fn quote(&self, ticker: &Ticker) -> Result<Option<Quote>> {
        let table = &self.securities;
        let Some(row) = table.data.first() else {
            return Ok(None);
        };

        let price_at = table.column(PRICE_COLUMN).unwrap_or(0);
        let currency_at = table.column(CURRENCY_COLUMN).unwrap_or(1);

        let Some(price) = row.get(price_at).map(decimal_from_json).transpose()?.flatten() else {
            return Ok(None);
        };
        let Some(currency) = row.get(currency_at).and_then(Value::as_str) else {
            return Ok(None);
        };

        Ok(Some(Quote {
            ticker: ticker.clone(),
            price,
            currency: normalize_currency(currency),
        }))
    }
}

/// ISS reports the rouble as `SUR`; everything downstream uses `RUB`.
pub fn normalize_currency(code: &str) -> String {
    let code = code.trim().to_uppercase();
    if code == "SUR" { "RUB".to_string() } else { code }
}

/// Read an ISS number without a detour through `f64`
fn decimal_from_json(value: &Value) -> Result<Option<Decimal>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => {
            let text = number.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map(|d| Some(d.normalize()))
                .map_err(|e| MoexError::Response(format!("price {text}: {e}")))
        }
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => Decimal::from_str(text.trim())
            .map(Some)
            .map_err(|e| MoexError::Response(format!("price {text}: {e}"))),
        other => Err(MoexError::Response(format!("unexpected price value {other}"))),
    }
}
