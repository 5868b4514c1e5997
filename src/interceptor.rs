//! Storefront search interceptor.
//!
//! Runs on the storefront side. Once installed on a page that has a search
//! form, every submission is sent to the translation endpoint and, when a
//! structured query comes back, turned into a filtered `/search` URL. Any
//! failure falls back to the form's native submission, so the shopper
//! always gets a search.
//!
//! The page itself is abstracted behind [`StorefrontPage`] so the same logic
//! drives a real DOM binding or a test double.

use std::collections::HashMap;

use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::{
    middleware::auth::API_KEY_HEADER, models::structured_query::StructuredQuery,
    services::search_url::SearchUrlBuilder,
};

/// Selectors tried in order to find the storefront search form.
pub const FORM_SELECTORS: [&str; 2] = [r#"form[action*="/search"]"#, r#"form[role="search"]"#];

/// Name of the text input holding the shopper's query.
pub const QUERY_INPUT: &str = "q";

/// Endpoint and credentials, resolved once from the snippet tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptorConfig {
    pub endpoint: Url,
    pub api_key: String,
}

impl InterceptorConfig {
    pub fn new(endpoint: Url, api_key: impl Into<String>) -> Self {
        Self {
            endpoint,
            api_key: api_key.into(),
        }
    }

    /// Read `data-api-key` and `data-api-url` from the snippet tag.
    ///
    /// Attribute names are accepted with or without the `data-` prefix.
    /// Returns `None` when either is missing, blank, or the URL does not
    /// parse; the interceptor then stays native.
    pub fn from_data_attributes(attributes: &HashMap<String, String>) -> Option<Self> {
        let lookup = |name: &str| {
            attributes
                .get(&format!("data-{name}"))
                .or_else(|| attributes.get(name))
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };

        let api_key = lookup("api-key")?;
        let raw_url = lookup("api-url")?;

        match Url::parse(raw_url) {
            Ok(endpoint) => Some(Self::new(endpoint, api_key)),
            Err(e) => {
                tracing::warn!(url = %raw_url, error = %e, "interceptor api url is invalid");
                None
            }
        }
    }
}

/// A form element on the storefront page.
pub trait SearchForm {
    fn has_text_input(&self, name: &str) -> bool;
}

/// The storefront page the interceptor is installed on.
pub trait StorefrontPage {
    type Form: SearchForm;

    /// First form matching a CSS selector.
    fn query_selector(&self, selector: &str) -> Option<Self::Form>;
}

/// Locate the search form: first selector match that has a `q` input.
pub fn find_search_form<P: StorefrontPage>(page: &P) -> Option<P::Form> {
    FORM_SELECTORS
        .iter()
        .filter_map(|selector| page.query_selector(selector))
        .find(|form| form.has_text_input(QUERY_INPUT))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptorState {
    Native,
    Intercepted,
}

/// What the page should do with a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAction {
    /// Let the form submit normally with the original query.
    NativeSubmit(String),
    /// Navigate to this storefront-relative search URL.
    Navigate(String),
}

#[derive(Serialize)]
struct TranslateBody<'a> {
    query: &'a str,
}

/// Installed interceptor bound to one search form.
pub struct SearchInterceptor<F> {
    form: Option<F>,
    config: Option<InterceptorConfig>,
    client: Client,
    url_builder: SearchUrlBuilder,
}

impl<F: SearchForm> SearchInterceptor<F> {
    /// Install on a page. Without a search form or a config the interceptor
    /// stays native for the lifetime of the page.
    pub fn install<P>(page: &P, config: Option<InterceptorConfig>) -> Self
    where
        P: StorefrontPage<Form = F>,
    {
        let form = find_search_form(page);

        match (&form, &config) {
            (None, _) => tracing::debug!("no search form found, staying native"),
            (_, None) => tracing::warn!("interceptor config missing, staying native"),
            _ => tracing::debug!("search form intercepted"),
        }

        Self {
            form,
            config,
            client: Client::new(),
            // Extras reaching the storefront are the ones the merchant declared;
            // keep their values searchable through `q`
            url_builder: SearchUrlBuilder::new().fold_unmapped_terms(true),
        }
    }

    pub fn with_url_builder(mut self, url_builder: SearchUrlBuilder) -> Self {
        self.url_builder = url_builder;
        self
    }

    pub fn state(&self) -> InterceptorState {
        match (&self.form, &self.config) {
            (Some(_), Some(_)) => InterceptorState::Intercepted,
            _ => InterceptorState::Native,
        }
    }

    pub fn form(&self) -> Option<&F> {
        self.form.as_ref()
    }

    /// Handle a form submission.
    ///
    /// One request per call. An empty query never reaches the network.
    pub async fn on_submit(&self, query: &str) -> SubmitAction {
        let native = || SubmitAction::NativeSubmit(query.to_string());

        let Some(config) = self.config.as_ref().filter(|_| self.form.is_some()) else {
            return native();
        };

        if query.trim().is_empty() {
            return native();
        }

        match self.request_translation(config, query).await {
            Ok(structured) => SubmitAction::Navigate(self.url_builder.build(&structured)),
            Err(e) => {
                tracing::warn!(error = %e, "translation request failed, using native search");
                native()
            }
        }
    }

    async fn request_translation(
        &self,
        config: &InterceptorConfig,
        query: &str,
    ) -> Result<StructuredQuery, reqwest::Error> {
        self.client
            .post(config.endpoint.clone())
            .header(API_KEY_HEADER, &config.api_key)
            .json(&TranslateBody { query })
            .send()
            .await?
            .error_for_status()?
            .json::<StructuredQuery>()
            .await
    }
}
