//! Label description
//!
//! The structured record a caller hands to the encoder. Field names follow
//! the bundle records produced upstream, which arrive as JSON with numbers
//! sometimes encoded as strings.

use crate::error::PrinterError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use tracing::warn;

pub const FEET_TO_METERS: f64 = 0.3048;
pub const INCHES_TO_METERS: f64 = 0.0254;

/// Product-name fragments that identify linear-metre products.
pub const LINEAR_PRODUCT_KEYWORDS: &[&str] = &["MOLDURA", "ZOCALO", "LISTON", "TRIM"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitMode {
    /// Square metres: pieces x length x width.
    Area,
    /// Linear metres: pieces x length.
    Linear,
}

impl UnitMode {
    pub fn from_selector(selector: &str) -> Option<Self> {
        match selector.trim().to_lowercase().as_str() {
            "m2" | "area" => Some(UnitMode::Area),
            "ml" | "m" | "lineal" | "linear" => Some(UnitMode::Linear),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UnitMode::Area => "M2",
            UnitMode::Linear => "ML",
        }
    }
}

/// One table row: `piezas` pieces of `largo` feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PieceRow {
    #[serde(deserialize_with = "lenient::count")]
    pub piezas: u32,
    #[serde(deserialize_with = "lenient::number")]
    pub largo: f64,
}

impl PieceRow {
    pub fn new(piezas: u32, largo: f64) -> Self {
        Self { piezas, largo }
    }

    /// Quantity in metric units. `width_in` only matters for area mode.
    pub fn quantity(&self, unit: UnitMode, width_in: f64) -> f64 {
        let linear = f64::from(self.piezas) * self.largo * FEET_TO_METERS;
        match unit {
            UnitMode::Linear => linear,
            UnitMode::Area => linear * width_in * INCHES_TO_METERS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelDescriptor {
    #[serde(rename = "fardoNo", alias = "fardo_no", deserialize_with = "lenient::text")]
    pub fardo_no: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub lote: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub producto: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub especie: String,
    /// Thickness as written upstream, e.g. `1` or `5/4`.
    #[serde(default, deserialize_with = "lenient::text")]
    pub grosor: String,
    /// Width in inches.
    #[serde(default, deserialize_with = "lenient::number")]
    pub ancho: f64,
    /// Explicit unit selector, `m2` or `ml`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unidad: Option<String>,
    /// Total quantity declared upstream; computed from the rows when absent.
    #[serde(
        default,
        rename = "m2",
        alias = "total",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_number"
    )]
    pub declared_total: Option<f64>,
    #[serde(default)]
    pub detalles: Vec<PieceRow>,
    /// Flat single-row fields used by records that carry no `detalles`.
    #[serde(
        default,
        alias = "pzs",
        alias = "cantidad",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_count"
    )]
    pub piezas: Option<u32>,
    #[serde(
        default,
        alias = "largo_pies",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_number"
    )]
    pub largo: Option<f64>,
}

impl LabelDescriptor {
    pub fn from_json(json: &str) -> Result<Self, PrinterError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Explicit `unidad` first, then product keywords, then area.
    pub fn unit_mode(&self) -> UnitMode {
        if let Some(selector) = &self.unidad {
            match UnitMode::from_selector(selector) {
                Some(unit) => return unit,
                None => warn!("Unknown unit selector {:?}, inferring from product", selector),
            }
        }

        let product = fold_accents(&self.producto.to_uppercase());
        if LINEAR_PRODUCT_KEYWORDS
            .iter()
            .any(|keyword| product.contains(keyword))
        {
            UnitMode::Linear
        } else {
            UnitMode::Area
        }
    }

    /// Rows to print.
    ///
    /// When `detalles` is empty but the flat `piezas` and `largo` fields are
    /// both present and positive, a single row is synthesized from them.
    pub fn piece_rows(&self) -> Cow<'_, [PieceRow]> {
        if !self.detalles.is_empty() {
            return Cow::Borrowed(&self.detalles);
        }

        match (self.piezas, self.largo) {
            (Some(piezas), Some(largo)) if piezas > 0 && largo > 0.0 => {
                Cow::Owned(vec![PieceRow::new(piezas, largo)])
            }
            _ => Cow::Owned(Vec::new()),
        }
    }
}

/// Spanish accented capitals to their plain form, so `ZÓCALO` matches `ZOCALO`.
fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'Á' | 'À' | 'Ä' | 'Â' => 'A',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

/// Deserializers accepting numbers encoded either as JSON numbers or strings.
mod lenient {
    use super::*;
    use serde::de::Error;

    fn to_number<E: Error>(value: &Value) -> Result<Option<f64>, E> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_f64()),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Some)
                .ok_or_else(|| E::custom(format!("expected a number, got {:?}", s))),
            other => Err(E::custom(format!("expected a number, got {}", other))),
        }
    }

    fn to_count<E: Error>(value: &Value) -> Result<Option<u32>, E> {
        match to_number::<E>(value)? {
            None => Ok(None),
            Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => {
                Ok(Some(n as u32))
            }
            Some(n) => Err(E::custom(format!("expected a piece count, got {}", n))),
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(to_number(&Value::deserialize(d)?)?.unwrap_or(0.0))
    }

    pub fn optional_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        to_number(&Value::deserialize(d)?)
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        Ok(to_count(&Value::deserialize(d)?)?.unwrap_or(0))
    }

    pub fn optional_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        to_count(&Value::deserialize(d)?)
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(D::Error::custom(format!("expected text, got {}", other))),
        }
    }
}
