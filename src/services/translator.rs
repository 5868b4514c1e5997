//! Prompt Translator: free-text query to [`StructuredQuery`] via an LLM.
//!
//! The upstream is any OpenAI-compatible chat completion endpoint (Groq in
//! production). One request per query, JSON-object response mode, low
//! temperature. Whatever goes wrong upstream, callers receive a usable
//! query: the whitespace-split fallback.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::TranslationError;
use crate::models::structured_query::{ATTRIBUTES_KEY, FilterField, SORT_KEY, StructuredQuery};
use crate::services::search_url::SortOption;

/// Chat completion request body.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for the translation upstream. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Translator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl Translator {
    /// Build a translator from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed (TLS backend
    /// initialisation failure).
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.groq_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.groq_api_url.clone(),
            api_key: config.groq_api_key.clone(),
            model: config.groq_model.clone(),
            temperature: config.groq_temperature,
        })
    }

    /// Translate `query` using the shop's declared vocabulary.
    ///
    /// Never fails: upstream errors are logged with their classification and
    /// replaced by [`StructuredQuery::fallback`].
    pub async fn translate(
        &self,
        query: &str,
        filters: Option<&str>,
        sorts: Option<&str>,
    ) -> StructuredQuery {
        match self.request_translation(query, filters, sorts).await {
            Ok(structured) => structured,
            Err(err) => {
                tracing::warn!(kind = err.kind(), error = %err, "translation failed, using fallback");
                StructuredQuery::fallback(query)
            }
        }
    }

    async fn request_translation(
        &self,
        query: &str,
        filters: Option<&str>,
        sorts: Option<&str>,
    ) -> Result<StructuredQuery, TranslationError> {
        let system_prompt = build_system_prompt(filters, sorts);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: query,
                },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TranslationError::RateLimited);
        }
        if !status.is_success() {
            return Err(TranslationError::UpstreamStatus(status.as_u16()));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| TranslationError::MalformedResponse(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(TranslationError::EmptyResponse)?;

        parse_completion_content(&content)
    }
}

/// Parse the model's message content into a structured query.
///
/// Tolerates a surrounding Markdown code fence, which some models add even
/// in JSON mode.
pub fn parse_completion_content(content: &str) -> Result<StructuredQuery, TranslationError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str::<StructuredQuery>(body)
        .map_err(|e| TranslationError::MalformedResponse(e.to_string()))
}

/// System instruction sent ahead of the shopper's query.
///
/// States the mapping the storefront understands, the precedence rule
/// between filters and free-text attributes (with worked examples), the
/// price phrasing rule and the JSON-only output requirement.
pub fn build_system_prompt(filters: Option<&str>, sorts: Option<&str>) -> String {
    let filters = filters
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or("não especificado");
    let sorts = sorts
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("não especificado");

    let mapping = FilterField::ALL
        .iter()
        .map(|field| format!("  \"{}\" -> {}", field.key(), field.shopify_param()))
        .collect::<Vec<_>>()
        .join("\n");

    let sort_labels = SortOption::ALL
        .iter()
        .map(|option| format!("\"{}\"", option.label()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are a precise e-commerce search analyst. Convert the shopper's search string into one JSON object.

Output keys and the storefront parameter each one feeds:
{mapping}
  "{ATTRIBUTES_KEY}" -> list of free-text terms that match no filter above
  "{SORT_KEY}" -> one of {sort_labels}

Rules:
1. First find the terms that match the AVAILABLE FILTERS exactly.
2. A term that matches a filter MUST be emitted as that filter field and MUST NOT also appear in "{ATTRIBUTES_KEY}". "{ATTRIBUTES_KEY}" is only for characteristics without a filter.
3. Price phrases such as "até 500", "abaixo de 1000", "menos de 300", "under 500" or "less than 300" set "preco_max" to a number. "acima de 200" or "more than 200" set "preco_min".
4. Only use "{SORT_KEY}" when the shopper asks for an ordering and the store offers it.
5. Return ONLY the JSON object, with no text, explanation or code formatting around it.

Example 1
Search: "tênis de corrida masculino azul tamanho 42"
Available filters: categoria (tênis, sapato), cor (azul, preto), tamanho (40, 41, 42), genero (masculino, feminino)
Output:
{{"categoria": "tênis", "genero": "masculino", "cor": "azul", "tamanho": "42", "{ATTRIBUTES_KEY}": ["de corrida"]}}

Example 2
Search: "notebook para trabalho com 16gb de ram por menos de 5000"
Available filters: categoria (notebook, celular), memoria_ram (8gb, 16gb, 32gb)
Output:
{{"categoria": "notebook", "memoria_ram": "16gb", "preco_max": 5000.0, "{ATTRIBUTES_KEY}": ["para trabalho"]}}

Example 3
Search: "camiseta preta mais vendida"
Available filters: categoria (camiseta, calça), cor (preta, branca)
Output:
{{"categoria": "camiseta", "cor": "preta", "{SORT_KEY}": "mais_vendidos", "{ATTRIBUTES_KEY}": []}}

Now the real task.
Filters available in this store: {filters}
Sort options available in this store: {sorts}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::structured_query::FilterValue;

    #[test]
    fn test_prompt_states_mapping_and_rules() {
        let prompt = build_system_prompt(Some("categoria, cor"), None);

        assert!(prompt.contains("\"categoria\" -> filter.p.product_type"));
        assert!(prompt.contains("\"preco_max\" -> filter.v.price.lte"));
        assert!(prompt.contains("MUST NOT also appear in \"atributos\""));
        assert!(prompt.contains("Return ONLY the JSON object"));
        assert!(prompt.contains("\"mais_vendidos\""));
        assert!(prompt.contains("Filters available in this store: categoria, cor"));
        assert!(prompt.contains("Sort options available in this store: não especificado"));
    }

    #[test]
    fn test_prompt_examples_are_valid_json() {
        let prompt = build_system_prompt(None, None);
        let examples: Vec<&str> = prompt
            .lines()
            .filter(|line| line.starts_with('{'))
            .collect();

        assert_eq!(examples.len(), 3);
        for example in examples {
            assert!(parse_completion_content(example).is_ok(), "{example}");
        }
    }

    #[test]
    fn test_parse_plain_object() {
        let query =
            parse_completion_content(r#"{"cor": "azul", "atributos": ["leve"]}"#).unwrap();
        assert_eq!(query.color, Some(FilterValue::Text("azul".into())));
        assert_eq!(query.attributes, vec!["leve"]);
    }

    #[test]
    fn test_parse_fenced_object() {
        let query = parse_completion_content("```json\n{\"tamanho\": 40}\n```").unwrap();
        assert_eq!(query.size.unwrap().to_string(), "40");
    }

    #[test]
    fn test_parse_rejects_prose_and_arrays() {
        assert!(matches!(
            parse_completion_content("Here is your JSON: {}"),
            Err(TranslationError::MalformedResponse(_))
        ));
        assert!(parse_completion_content("[1, 2]").is_err());
    }
}
