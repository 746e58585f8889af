//! Brand catalog response shapes
//!
//! `food_brands.get.v2` has been observed to answer in several layouts. Each
//! known layout is one variant of [`BrandCatalog`]; decoders are tried in a
//! fixed order and the first that matches wins.

use serde_json::Value;

/// A decoded brand catalog response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrandCatalog {
    /// `{"food_brands": {"food_brand": [...]}}`
    Nested(Vec<String>),

    /// `{"brands": [...]}`
    TopLevelBrands(Vec<String>),

    /// `{"food_brand": [...]}`
    FoodBrand(Vec<String>),

    /// None of the known layouts matched
    Unrecognized,
}

type ShapeDecoder = fn(&Value) -> Option<BrandCatalog>;

/// Decoders in probe order
const DECODERS: &[ShapeDecoder] = &[decode_nested, decode_top_level, decode_food_brand];

fn decode_nested(value: &Value) -> Option<BrandCatalog> {
    let list = value.get("food_brands")?.get("food_brand")?;
    brand_names(list).map(BrandCatalog::Nested)
}

fn decode_top_level(value: &Value) -> Option<BrandCatalog> {
    brand_names(value.get("brands")?).map(BrandCatalog::TopLevelBrands)
}

fn decode_food_brand(value: &Value) -> Option<BrandCatalog> {
    brand_names(value.get("food_brand")?).map(BrandCatalog::FoodBrand)
}

/// Reads a single element or a list of elements
fn brand_names(value: &Value) -> Option<Vec<String>> {
    let elements: Vec<&Value> = match value {
        Value::Array(elements) => elements.iter().collect(),
        Value::Object(_) | Value::String(_) => vec![value],
        _ => return None,
    };

    Some(elements.into_iter().filter_map(brand_name).collect())
}

/// An element is a bare string or an object carrying `brand_name` or `name`
fn brand_name(element: &Value) -> Option<String> {
    let name = match element {
        Value::String(name) => name.as_str(),
        Value::Object(fields) => fields
            .get("brand_name")
            .or_else(|| fields.get("name"))
            .and_then(Value::as_str)?,
        _ => return None,
    };

    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

impl BrandCatalog {
    /// Decodes a response by trying each known layout in order
    pub fn decode(value: &Value) -> Self {
        DECODERS
            .iter()
            .find_map(|decoder| decoder(value))
            .unwrap_or(Self::Unrecognized)
    }

    /// Returns the brand names carried by the response
    pub fn names(&self) -> &[String] {
        match self {
            Self::Nested(names) | Self::TopLevelBrands(names) | Self::FoodBrand(names) => names,
            Self::Unrecognized => &[],
        }
    }

    /// Short label of the matched layout, for logging
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Nested(_) => "food_brands.food_brand",
            Self::TopLevelBrands(_) => "brands",
            Self::FoodBrand(_) => "food_brand",
            Self::Unrecognized => "unrecognized",
        }
    }
}
