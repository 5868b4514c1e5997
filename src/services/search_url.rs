//! Mapping from a structured query to a Shopify storefront search URL.
//!
//! The output is a plain `/search?...` URL the storefront can navigate to:
//! known filters become `filter.*` parameters, the sort label becomes
//! `sort_by`, free-text terms are joined into `q`, and `type=product` is
//! always present.

use url::form_urlencoded;

use crate::models::structured_query::{FilterField, StructuredQuery};

pub const SEARCH_PATH: &str = "/search";

/// Sort labels the translator may emit in `ordenacao`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOption {
    PriceAscending,
    PriceDescending,
    BestSelling,
    Newest,
}

impl SortOption {
    pub const ALL: [SortOption; 4] = [
        SortOption::PriceAscending,
        SortOption::PriceDescending,
        SortOption::BestSelling,
        SortOption::Newest,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortOption::PriceAscending => "preço_crescente",
            SortOption::PriceDescending => "preço_decrescente",
            SortOption::BestSelling => "mais_vendidos",
            SortOption::Newest => "mais_recentes",
        }
    }

    /// Value for Shopify's `sort_by` parameter.
    pub fn shopify_value(self) -> &'static str {
        match self {
            SortOption::PriceAscending => "price-ascending",
            SortOption::PriceDescending => "price-descending",
            SortOption::BestSelling => "best-selling",
            SortOption::Newest => "created-descending",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|option| option.label() == label.trim())
    }
}

/// Builds storefront search parameters from a [`StructuredQuery`].
///
/// Extra string fields have no Shopify parameter. They are dropped by
/// default. With `fold_unmapped_terms(true)` they are appended to `q`
/// instead; the storefront interceptor enables this, and the server only
/// lets extras the merchant declared through.
#[derive(Debug, Clone)]
pub struct SearchUrlBuilder {
    search_path: String,
    fold_unmapped_terms: bool,
}

impl Default for SearchUrlBuilder {
    fn default() -> Self {
        Self {
            search_path: SEARCH_PATH.to_string(),
            fold_unmapped_terms: false,
        }
    }
}

impl SearchUrlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_path(mut self, path: impl Into<String>) -> Self {
        self.search_path = path.into();
        self
    }

    pub fn fold_unmapped_terms(mut self, fold: bool) -> Self {
        self.fold_unmapped_terms = fold;
        self
    }

    /// Ordered parameter list: filters in mapping order, `sort_by`, `q`, `type`.
    pub fn params(&self, query: &StructuredQuery) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = query
            .active_filters()
            .map(|(field, value)| (field.shopify_param().to_string(), value.to_string()))
            .collect();

        if let Some(sort) = query.sort.as_deref().and_then(SortOption::from_label) {
            params.push(("sort_by".to_string(), sort.shopify_value().to_string()));
        }

        params.push(("q".to_string(), self.query_text(query)));
        params.push(("type".to_string(), "product".to_string()));

        params
    }

    /// Relative URL, e.g. `/search?filter.v.option.color=azul&q=camiseta&type=product`.
    pub fn build(&self, query: &StructuredQuery) -> String {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params(query))
            .finish();

        format!("{}?{}", self.search_path, encoded)
    }

    /// Free-text part of the search: the product type is echoed first so the
    /// storefront's text search agrees with the product type filter.
    fn query_text(&self, query: &StructuredQuery) -> String {
        let category = query
            .filter(FilterField::Category)
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string());

        let unmapped = query
            .extra
            .values()
            .filter(|_| self.fold_unmapped_terms)
            .filter_map(|value| value.as_str())
            .map(str::to_string);

        let mut terms: Vec<String> = Vec::new();
        for term in category
            .into_iter()
            .chain(query.attributes.iter().map(|t| t.trim().to_string()))
            .chain(unmapped)
        {
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        }

        terms.join(" ")
    }
}
