use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Free-form `reason` attached to exchange-reported failures.
///
/// Bitstamp sends either a plain message, a field map such as
/// `{"__all__": ["Price is more than 20% below market price."]}`, or
/// occasionally something else entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reason {
    Message(String),
    Fields(Map<String, Value>),
    Other(Value),
}

impl Reason {
    /// All human readable messages carried by this reason, flattened.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Message(msg) => vec![msg.clone()],
            Self::Fields(fields) => fields.values().flat_map(value_messages).collect(),
            Self::Other(value) => value_messages(value),
        }
    }
}

fn value_messages(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(value_messages).collect(),
        other => vec![other.to_string()],
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(msg) => write!(f, "{}", msg),
            Self::Fields(fields) => {
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|(field, value)| format!("{}: {}", field, value_messages(value).join(", ")))
                    .collect();
                write!(f, "{}", rendered.join("; "))
            }
            Self::Other(value) => write!(f, "{}", value),
        }
    }
}

/// One `[price, amount, id?]` row of an order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBookEntry {
    pub price: Decimal,
    pub amount: Decimal,
    pub order_id: Option<i64>,
}

impl<'de> Deserialize<'de> for OrderBookEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let parts = Vec::<String>::deserialize(deserializer)?;
        if parts.len() != 2 && parts.len() != 3 {
            return Err(de::Error::custom(format!(
                "wrong number of arguments for order book entry: {:?}",
                parts
            )));
        }

        let price = Decimal::from_str(&parts[0])
            .map_err(|e| de::Error::custom(format!("invalid price {:?}: {}", parts[0], e)))?;
        let amount = Decimal::from_str(&parts[1])
            .map_err(|e| de::Error::custom(format!("invalid amount {:?}: {}", parts[1], e)))?;
        let order_id = match parts.get(2) {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|e| de::Error::custom(format!("invalid order id {:?}: {}", raw, e)))?,
            ),
            None => None,
        };

        Ok(Self {
            price,
            amount,
            order_id,
        })
    }
}

fn value_to_i64<E: de::Error>(value: &Value) -> Result<i64, E> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                // whole floats such as 1.7e9 only, within i64 range
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .ok_or_else(|| E::custom(format!("expected integer, got {}", n))),
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|e| E::custom(format!("invalid integer string {:?}: {}", s, e))),
        other => Err(E::custom(format!("expected integer, got {}", other))),
    }
}

/// Integers that the API sends either as JSON numbers or as quoted strings.
pub mod string_or_int {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        super::value_to_i64(&value)
    }
}

/// Like [`string_or_int`], tolerating `null` and missing fields.
pub mod option_string_or_int {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(value) => super::value_to_i64(&value).map(Some),
        }
    }
}

/// Microsecond epoch timestamps (number or string) into `DateTime<Utc>`.
pub mod micros_datetime {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(value) => {
                let micros = super::value_to_i64(&value)?;
                DateTime::<Utc>::from_timestamp_micros(micros)
                    .map(Some)
                    .ok_or_else(|| {
                        serde::de::Error::custom(format!("Invalid timestamp: {}", micros))
                    })
            }
        }
    }
}
