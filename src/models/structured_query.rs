//! The structured query produced by translation.
//!
//! This is the contract between the translator, the search log, the public
//! endpoint and the storefront interceptor. Wire names follow the vocabulary
//! the prompt teaches the model (`categoria`, `cor`, `atributos`, ...).
//!
//! # JSON Example
//!
//! ```json
//! {
//!   "categoria": "tênis",
//!   "cor": "azul",
//!   "tamanho": "42",
//!   "preco_max": 500,
//!   "atributos": ["de corrida"],
//!   "ordenacao": "mais_vendidos"
//! }
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Filters the storefront understands natively, in URL parameter order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Category,
    Color,
    Size,
    Material,
    Vendor,
    PriceMax,
    PriceMin,
}

impl FilterField {
    pub const ALL: [FilterField; 7] = [
        FilterField::Category,
        FilterField::Color,
        FilterField::Size,
        FilterField::Material,
        FilterField::Vendor,
        FilterField::PriceMax,
        FilterField::PriceMin,
    ];

    /// Key used in the structured query JSON.
    pub fn key(self) -> &'static str {
        match self {
            FilterField::Category => "categoria",
            FilterField::Color => "cor",
            FilterField::Size => "tamanho",
            FilterField::Material => "material",
            FilterField::Vendor => "marca",
            FilterField::PriceMax => "preco_max",
            FilterField::PriceMin => "preco_min",
        }
    }

    /// Shopify storefront search parameter this field maps to.
    pub fn shopify_param(self) -> &'static str {
        match self {
            FilterField::Category => "filter.p.product_type",
            FilterField::Color => "filter.v.option.color",
            FilterField::Size => "filter.v.option.size",
            FilterField::Material => "filter.v.option.material",
            FilterField::Vendor => "filter.p.vendor",
            FilterField::PriceMax => "filter.v.price.lte",
            FilterField::PriceMin => "filter.v.price.gte",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

pub const ATTRIBUTES_KEY: &str = "atributos";
pub const SORT_KEY: &str = "ordenacao";
const SORT_ALIAS: &str = "sort";

/// A filter value as the model returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Number(serde_json::Number),
}

impl FilterValue {
    /// Blank strings and zero carry no filtering intent.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Text(text) => text.trim().is_empty(),
            FilterValue::Number(number) => number.as_f64() == Some(0.0),
        }
    }

    fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(FilterValue::Text(text)),
            Value::Number(number) => Some(FilterValue::Number(number)),
            _ => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(text) => f.write_str(text.trim()),
            FilterValue::Number(number) => match number.as_f64() {
                // 5000.0 -> "5000"
                Some(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", n as i64),
                _ => write!(f, "{number}"),
            },
        }
    }
}

/// Structured search intent extracted from a free-text query.
///
/// Deserialization is lenient: any JSON object is accepted, known keys with
/// unusable values are dropped, and unknown keys are kept in `extra` until
/// [`StructuredQuery::retain_vocabulary`] decides their fate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct StructuredQuery {
    #[serde(rename = "categoria", skip_serializing_if = "Option::is_none")]
    pub category: Option<FilterValue>,

    #[serde(rename = "cor", skip_serializing_if = "Option::is_none")]
    pub color: Option<FilterValue>,

    #[serde(rename = "tamanho", skip_serializing_if = "Option::is_none")]
    pub size: Option<FilterValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<FilterValue>,

    #[serde(rename = "marca", skip_serializing_if = "Option::is_none")]
    pub vendor: Option<FilterValue>,

    #[serde(rename = "preco_max", skip_serializing_if = "Option::is_none")]
    pub price_max: Option<FilterValue>,

    #[serde(rename = "preco_min", skip_serializing_if = "Option::is_none")]
    pub price_min: Option<FilterValue>,

    /// Free-text terms that matched no known filter. Always serialized.
    #[serde(rename = "atributos")]
    pub attributes: Vec<String>,

    #[serde(rename = "ordenacao", skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    /// Keys the model returned that are not part of the fixed mapping.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StructuredQuery {
    /// Degraded translation: every whitespace-separated token becomes a
    /// free-text attribute, in the original order.
    pub fn fallback(query: &str) -> Self {
        Self {
            attributes: query.split_whitespace().map(str::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn filter(&self, field: FilterField) -> Option<&FilterValue> {
        match field {
            FilterField::Category => self.category.as_ref(),
            FilterField::Color => self.color.as_ref(),
            FilterField::Size => self.size.as_ref(),
            FilterField::Material => self.material.as_ref(),
            FilterField::Vendor => self.vendor.as_ref(),
            FilterField::PriceMax => self.price_max.as_ref(),
            FilterField::PriceMin => self.price_min.as_ref(),
        }
    }

    fn filter_mut(&mut self, field: FilterField) -> &mut Option<FilterValue> {
        match field {
            FilterField::Category => &mut self.category,
            FilterField::Color => &mut self.color,
            FilterField::Size => &mut self.size,
            FilterField::Material => &mut self.material,
            FilterField::Vendor => &mut self.vendor,
            FilterField::PriceMax => &mut self.price_max,
            FilterField::PriceMin => &mut self.price_min,
        }
    }

    /// Known filters carrying a non-empty value, in mapping order.
    pub fn active_filters(&self) -> impl Iterator<Item = (FilterField, &FilterValue)> {
        FilterField::ALL.into_iter().filter_map(|field| {
            self.filter(field)
                .filter(|value| !value.is_empty())
                .map(|value| (field, value))
        })
    }

    /// Drop free-text attributes that repeat a value already emitted as a
    /// direct field, known or extra.
    ///
    /// Run after [`StructuredQuery::retain_vocabulary`] so only extras the
    /// shop declared take part.
    pub fn enforce_precedence(&mut self) {
        let extra_values = self
            .extra
            .values()
            .filter_map(|value| FilterValue::from_json(value.clone()))
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string());

        let filter_values: HashSet<String> = self
            .active_filters()
            .map(|(_, value)| value.to_string())
            .chain(extra_values)
            .collect();

        self.attributes
            .retain(|term| !filter_values.contains(term.trim()));
    }

    /// Strip extra keys the shop never declared. Known filter fields, the
    /// attribute list and the sort field are part of the fixed contract and
    /// always kept.
    ///
    /// Returns the keys that were removed.
    pub fn retain_vocabulary(&mut self, vocabulary: &FilterVocabulary) -> Vec<String> {
        let removed: Vec<String> = self
            .extra
            .keys()
            .filter(|key| !vocabulary.contains(key))
            .cloned()
            .collect();

        for key in &removed {
            self.extra.remove(key);
        }

        removed
    }

    /// Names of every filter present in this query, known or extra.
    pub fn filter_names(&self) -> Vec<String> {
        self.active_filters()
            .map(|(field, _)| field.key().to_string())
            .chain(
                self.extra
                    .iter()
                    .filter(|(_, value)| !value.is_null())
                    .map(|(key, _)| key.clone()),
            )
            .collect()
    }
}

impl From<Map<String, Value>> for StructuredQuery {
    fn from(mut object: Map<String, Value>) -> Self {
        let mut query = StructuredQuery::default();

        for field in FilterField::ALL {
            if let Some(value) = object.remove(field.key()) {
                *query.filter_mut(field) = FilterValue::from_json(value);
            }
        }

        query.attributes = match object.remove(ATTRIBUTES_KEY) {
            Some(Value::Array(items)) => items.into_iter().filter_map(term_from_json).collect(),
            Some(other) => term_from_json(other).into_iter().collect(),
            None => Vec::new(),
        };

        let sort = object
            .remove(SORT_KEY)
            .or_else(|| object.remove(SORT_ALIAS));
        query.sort = match sort {
            Some(Value::String(sort)) if !sort.trim().is_empty() => Some(sort),
            _ => None,
        };

        query.extra = object;
        query
    }
}

fn term_from_json(value: Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// The set of filter names a merchant declared for their storefront.
///
/// Merchants type this as free text, usually a comma separated list such as
/// `categoria, cor, tamanho` or `categoria: tênis, sapato; cor: azul`. A JSON
/// array of `{"nome_filtro": ...}` objects is also understood.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterVocabulary {
    names: HashSet<String>,
}

impl FilterVocabulary {
    pub fn parse(text: Option<&str>) -> Self {
        let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
            return Self::default();
        };

        if let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(text) {
            let names = entries
                .iter()
                .filter_map(|entry| {
                    entry
                        .get("nome_filtro")
                        .or_else(|| entry.get("name"))
                        .and_then(Value::as_str)
                })
                .map(normalize_name)
                .filter(|name| !name.is_empty())
                .collect();
            return Self { names };
        }

        let names = text
            .split([',', ';', '\n'])
            .filter_map(|segment| segment.split([':', '=']).next())
            .map(normalize_name)
            .filter(|name| !name.is_empty())
            .collect();

        Self { names }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.names.contains(&normalize_name(key))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fallback_splits_on_whitespace_in_order() {
        let query = StructuredQuery::fallback("  tênis  azul\tde corrida ");
        assert_eq!(query.attributes, vec!["tênis", "azul", "de", "corrida"]);
        assert!(query.category.is_none());
        assert!(query.extra.is_empty());
    }

    #[test]
    fn test_fallback_serializes_attributes() {
        let value = serde_json::to_value(StructuredQuery::fallback("camiseta preta")).unwrap();
        assert_eq!(value, json!({"atributos": ["camiseta", "preta"]}));
    }

    #[test]
    fn test_empty_object_still_has_attribute_list() {
        let query: StructuredQuery = serde_json::from_value(json!({})).unwrap();
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value, json!({"atributos": []}));
    }

    #[test]
    fn test_deserializes_known_fields_and_extras() {
        let query: StructuredQuery = serde_json::from_value(json!({
            "categoria": "notebook",
            "memoria_ram": "16gb",
            "preco_max": 5000.0,
            "atributos": ["para trabalho"],
            "ordenacao": "mais_vendidos"
        }))
        .unwrap();

        assert_eq!(query.category, Some(FilterValue::Text("notebook".into())));
        assert_eq!(query.price_max.as_ref().unwrap().to_string(), "5000");
        assert_eq!(query.attributes, vec!["para trabalho"]);
        assert_eq!(query.sort.as_deref(), Some("mais_vendidos"));
        assert_eq!(query.extra.get("memoria_ram"), Some(&json!("16gb")));
    }

    #[test]
    fn test_lenient_on_odd_value_shapes() {
        let query: StructuredQuery = serde_json::from_value(json!({
            "cor": ["azul"],
            "tamanho": 42,
            "atributos": "leve",
            "sort": "mais_recentes"
        }))
        .unwrap();

        assert!(query.color.is_none());
        assert_eq!(query.size.as_ref().unwrap().to_string(), "42");
        assert_eq!(query.attributes, vec!["leve"]);
        assert_eq!(query.sort.as_deref(), Some("mais_recentes"));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(serde_json::from_value::<StructuredQuery>(json!(["a", "b"])).is_err());
        assert!(serde_json::from_str::<StructuredQuery>("not json").is_err());
    }

    #[test]
    fn test_precedence_removes_duplicated_filter_values() {
        let mut query: StructuredQuery = serde_json::from_value(json!({
            "categoria": "tênis",
            "cor": "azul",
            "atributos": ["tênis", "de corrida", "azul "]
        }))
        .unwrap();

        query.enforce_precedence();

        assert_eq!(query.attributes, vec!["de corrida"]);
    }

    #[test]
    fn test_precedence_covers_declared_extras() {
        let mut query: StructuredQuery = serde_json::from_value(json!({
            "genero": "masculino",
            "categoria": "tênis",
            "estoque": 3,
            "atributos": ["masculino", "de corrida", "3"]
        }))
        .unwrap();

        query.retain_vocabulary(&FilterVocabulary::parse(Some("categoria, genero")));
        query.enforce_precedence();

        assert_eq!(query.extra.get("genero"), Some(&json!("masculino")));
        // `estoque` was not declared, so its value stays free text
        assert_eq!(query.attributes, vec!["de corrida", "3"]);
    }

    #[test]
    fn test_retain_vocabulary_strips_undeclared_extras() {
        let mut query: StructuredQuery = serde_json::from_value(json!({
            "categoria": "tênis",
            "genero": "masculino",
            "memoria_ram": "16gb"
        }))
        .unwrap();
        let vocabulary = FilterVocabulary::parse(Some("categoria, Genero, cor"));

        let removed = query.retain_vocabulary(&vocabulary);

        assert_eq!(removed, vec!["memoria_ram"]);
        assert!(query.extra.contains_key("genero"));
        assert!(query.category.is_some());
    }

    #[test]
    fn test_empty_vocabulary_strips_every_extra() {
        let mut query: StructuredQuery =
            serde_json::from_value(json!({"genero": "feminino", "cor": "preto"})).unwrap();

        query.retain_vocabulary(&FilterVocabulary::default());

        assert!(query.extra.is_empty());
        assert!(query.color.is_some());
    }

    #[test]
    fn test_vocabulary_parses_value_lists() {
        let vocabulary =
            FilterVocabulary::parse(Some("categoria: tênis, sapato; cor = azul\ntamanho"));
        assert!(vocabulary.contains("categoria"));
        assert!(vocabulary.contains("cor"));
        assert!(vocabulary.contains("TAMANHO"));
        assert!(!vocabulary.contains("genero"));
    }

    #[test]
    fn test_vocabulary_parses_json_declarations() {
        let vocabulary = FilterVocabulary::parse(Some(
            r#"[{"nome_filtro": "memoria_ram", "valores_possiveis": "8gb, 16gb"}]"#,
        ));
        assert!(vocabulary.contains("memoria_ram"));
        assert!(!vocabulary.contains("8gb"));
    }

    #[test]
    fn test_filter_names_lists_known_then_extra() {
        let query: StructuredQuery = serde_json::from_value(json!({
            "cor": "azul",
            "categoria": "tênis",
            "genero": "masculino",
            "marca": ""
        }))
        .unwrap();

        assert_eq!(query.filter_names(), vec!["categoria", "cor", "genero"]);
    }
}
