//! Order payload sent by the frontend.
//!
//! The frontend is loose about types: prices arrive as numbers or strings, optional
//! fields arrive as `null`, and dates come in either `YYYY-MM-DD` or `DD/MM/YYYY`.
//! Everything here decodes permissively and keeps unknown fields out of the way.

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// Nullable number that decodes from a JSON number or a number-like string.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Number(pub Option<f64>);

impl Number {
    pub fn value(&self) -> Option<f64> {
        self.0
    }

    /// Present and strictly positive.
    pub fn positive(&self) -> Option<f64> {
        self.0.filter(|v| *v > 0.0)
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NumberVisitor;

        impl<'de> Visitor<'de> for NumberVisitor {
            type Value = Number;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a number, a numeric string or null")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Number, E> {
                Ok(Number(Some(v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Number, E> {
                Ok(Number(Some(v as f64)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Number, E> {
                Ok(Number(Some(v as f64)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Number, E> {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    return Ok(Number(None));
                }
                trimmed
                    .parse::<f64>()
                    .map(|f| Number(Some(f)))
                    .map_err(|_| E::custom(format!("invalid number {:?}", v)))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Number, E> {
                Ok(Number(None))
            }

            fn visit_none<E: de::Error>(self) -> Result<Number, E> {
                Ok(Number(None))
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Number, D::Error> {
                d.deserialize_any(self)
            }
        }

        deserializer.deserialize_any(NumberVisitor)
    }
}

/// Date string kept exactly as sent; `null` becomes empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringDate(pub String);

impl StringDate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for StringDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<String>::deserialize(deserializer).map(|v| StringDate(v.unwrap_or_default()))
    }
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn nullable_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Option::<bool>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn nullable_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Option::<f64>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `null` reads as the type's default, same as an absent key.
fn nullable_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerPayload {
    #[serde(deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(deserialize_with = "nullable_string")]
    pub first_name: String,
    #[serde(deserialize_with = "nullable_string")]
    pub surname: String,
    #[serde(deserialize_with = "nullable_string")]
    pub display_name: String,
    #[serde(deserialize_with = "nullable_string")]
    pub email: String,
    /// Record id of the customer in the store.
    #[serde(deserialize_with = "nullable_string")]
    pub id: String,
    #[serde(deserialize_with = "nullable_string")]
    pub phone_number: String,
}

impl CustomerPayload {
    /// `displayName` when given, otherwise `title firstName surname`.
    pub fn display_name(&self) -> String {
        let display = self.display_name.trim();
        if !display.is_empty() {
            return display.to_string();
        }
        [self.title.as_str(), self.first_name.as_str(), self.surname.as_str()]
            .join(" ")
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderPayload {
    pub order_no: Number,
    pub occasion_date: StringDate,
    #[serde(deserialize_with = "nullable_string")]
    pub billing_address_line1: String,
    #[serde(deserialize_with = "nullable_string")]
    pub billing_address_line2: String,
    #[serde(deserialize_with = "nullable_string")]
    pub billing_town: String,
    #[serde(deserialize_with = "nullable_string")]
    pub billing_county: String,
    #[serde(deserialize_with = "nullable_string")]
    pub billing_postcode: String,
    /// Record id of the order in the store.
    #[serde(deserialize_with = "nullable_string")]
    pub order_id: String,
    #[serde(deserialize_with = "nullable_string")]
    pub created: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderExtrasPayload {
    #[serde(deserialize_with = "nullable_bool")]
    pub replacement_flowers: bool,
    pub replacement_flowers_qty: Number,
    pub replacement_flowers_price: Number,
    pub collection_qty: Number,
    pub collection_price: Number,
    pub delivery_qty: Number,
    pub delivery_price: Number,
    #[serde(deserialize_with = "nullable_bool")]
    pub return_unused_flowers: bool,
    pub return_unused_flowers_price: Number,
    pub artist_hours: Number,
    #[serde(deserialize_with = "nullable_string")]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameExtrasPayload {
    pub mount_price: Number,
    pub glass_price: Number,
    pub glass_engraving_price: Number,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FramePayload {
    #[serde(deserialize_with = "nullable_string")]
    pub size: String,
    #[serde(deserialize_with = "nullable_string")]
    pub frame_type: String,
    #[serde(deserialize_with = "nullable_string")]
    pub glass_type: String,
    #[serde(deserialize_with = "nullable_string")]
    pub inclusions: String,
    #[serde(deserialize_with = "nullable_string")]
    pub mount_colour: String,
    #[serde(deserialize_with = "nullable_string")]
    pub glass_engraving: String,
    pub price: Number,
    pub extras: Option<FrameExtrasPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaperweightPayload {
    pub quantity: Number,
    pub price: Number,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TotalsPayload {
    #[serde(deserialize_with = "nullable_f64")]
    pub sub_total: f64,
    #[serde(deserialize_with = "nullable_f64")]
    pub vat_rate: f64,
    #[serde(deserialize_with = "nullable_f64")]
    pub vat_total: f64,
    #[serde(deserialize_with = "nullable_f64")]
    pub grand_total: f64,
}

/// Optional description of why an email is being sent, stored on the email log.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailContextPayload {
    #[serde(deserialize_with = "nullable_string")]
    pub email_type: String,
    #[serde(deserialize_with = "nullable_string")]
    pub event_type: String,
    #[serde(deserialize_with = "nullable_string")]
    pub event_note: String,
    #[serde(deserialize_with = "nullable_string")]
    pub template_key: String,
    #[serde(deserialize_with = "nullable_string")]
    pub order_id: String,
    #[serde(deserialize_with = "nullable_string")]
    pub customer_id: String,
    #[serde(deserialize_with = "nullable_string")]
    pub frame_item_id: String,
    #[serde(deserialize_with = "nullable_string")]
    pub paperweight_item_id: String,
    #[serde(deserialize_with = "nullable_string")]
    pub source: String,
    pub meta: Option<Map<String, Value>>,
}

/// Body of the invoice preview and email routes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoicePayload {
    pub email_context: Option<EmailContextPayload>,
    #[serde(deserialize_with = "nullable_default")]
    pub customer: CustomerPayload,
    #[serde(deserialize_with = "nullable_default")]
    pub order: OrderPayload,
    pub order_extras: Option<OrderExtrasPayload>,
    #[serde(deserialize_with = "nullable_default")]
    pub frames: Vec<FramePayload>,
    pub paperweight: Option<PaperweightPayload>,
    pub paper_weight_order: Option<PaperweightPayload>,
    #[serde(deserialize_with = "nullable_default")]
    pub totals: TotalsPayload,
}

impl InvoicePayload {
    /// The paperweight under either accepted key, `paperweight` first.
    pub fn paperweight(&self) -> Option<&PaperweightPayload> {
        self.paperweight
            .as_ref()
            .or(self.paper_weight_order.as_ref())
    }
}
