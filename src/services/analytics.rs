//! Merchant analytics over the search log.
//!
//! Everything is computed from the last 30 days of logs (today included,
//! UTC days): a zero-filled daily series plus the ten most frequent
//! queries, filters and sort options.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::search_log::SearchLog;
use crate::models::structured_query::StructuredQuery;
use crate::repository::Repository;

pub const WINDOW_DAYS: i64 = 30;
pub const TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryCount {
    pub query: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterCount {
    pub filter: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortCount {
    pub sort: String,
    pub count: i64,
}

/// Response body for `GET /api/v1/analytics`.
#[derive(Debug, Serialize)]
pub struct AnalyticsReport {
    pub daily: Vec<DailyCount>,
    pub top_searches: Vec<QueryCount>,
    pub top_filters: Vec<FilterCount>,
    pub top_sorts: Vec<SortCount>,
    pub last_updated: DateTime<Utc>,
}

/// Midnight UTC of the first day in the window ending today.
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let first_day = now.date_naive() - Duration::days(WINDOW_DAYS - 1);
    first_day.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

pub async fn load_report(repo: &dyn Repository, shop_id: Uuid) -> Result<AnalyticsReport, AppError> {
    let now = Utc::now();
    let logs = repo.search_logs_since(shop_id, window_start(now)).await?;
    Ok(build_report(&logs, now))
}

pub fn build_report(logs: &[SearchLog], now: DateTime<Utc>) -> AnalyticsReport {
    let start = window_start(now).date_naive();
    let mut daily: Vec<DailyCount> = (0..WINDOW_DAYS)
        .map(|offset| DailyCount {
            date: start + Duration::days(offset),
            count: 0,
        })
        .collect();

    let mut queries: HashMap<String, i64> = HashMap::new();
    let mut filters: HashMap<String, i64> = HashMap::new();
    let mut sorts: HashMap<String, i64> = HashMap::new();

    for log in logs {
        let offset = (log.created_at.date_naive() - start).num_days();
        let Some(day) = usize::try_from(offset).ok().and_then(|i| daily.get_mut(i)) else {
            continue;
        };
        day.count += 1;

        *queries.entry(log.original_query.clone()).or_default() += 1;

        // Rows written by older versions may not parse; they still count above
        let Ok(structured) = serde_json::from_str::<StructuredQuery>(&log.returned_json) else {
            continue;
        };
        for name in structured.filter_names() {
            *filters.entry(name).or_default() += 1;
        }
        if let Some(sort) = structured.sort {
            *sorts.entry(sort).or_default() += 1;
        }
    }

    AnalyticsReport {
        daily,
        top_searches: top(queries)
            .map(|(query, count)| QueryCount { query, count })
            .collect(),
        top_filters: top(filters)
            .map(|(filter, count)| FilterCount { filter, count })
            .collect(),
        top_sorts: top(sorts)
            .map(|(sort, count)| SortCount { sort, count })
            .collect(),
        last_updated: now,
    }
}

/// Highest counts first, ties broken alphabetically.
fn top(counts: HashMap<String, i64>) -> impl Iterator<Item = (String, i64)> {
    let mut entries: Vec<(String, i64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.into_iter().take(TOP_N)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn log(query: &str, json: &str, created_at: DateTime<Utc>) -> SearchLog {
        SearchLog {
            id: Uuid::new_v4(),
            shop_id: Uuid::nil(),
            original_query: query.to_string(),
            returned_json: json.to_string(),
            created_at,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 31, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_window_covers_thirty_days_including_today() {
        assert_eq!(
            window_start(now()),
            Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_daily_series_is_zero_filled() {
        let report = build_report(&[], now());

        assert_eq!(report.daily.len(), 30);
        assert_eq!(report.daily[0].date, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
        assert_eq!(report.daily[29].date, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
        assert!(report.daily.iter().all(|d| d.count == 0));
        assert!(report.top_searches.is_empty());
    }

    #[test]
    fn test_counts_and_rankings() {
        let today = now();
        let yesterday = today - Duration::days(1);
        let logs = vec![
            log(
                "tênis azul",
                r#"{"categoria": "tênis", "cor": "azul", "atributos": []}"#,
                yesterday,
            ),
            log(
                "tênis azul",
                r#"{"categoria": "tênis", "cor": "azul", "atributos": [], "ordenacao": "mais_vendidos"}"#,
                today,
            ),
            log(
                "camisa",
                r#"{"categoria": "camisa", "genero": "masculino", "atributos": []}"#,
                today,
            ),
            log("quebrado", "not json", today),
            log("antigo", r#"{"atributos": ["antigo"]}"#, today - Duration::days(45)),
        ];

        let report = build_report(&logs, today);

        assert_eq!(report.daily[29].count, 3);
        assert_eq!(report.daily[28].count, 1);
        assert_eq!(
            report.top_searches[0],
            QueryCount {
                query: "tênis azul".to_string(),
                count: 2
            }
        );
        assert_eq!(report.top_searches.len(), 3);
        assert_eq!(
            report.top_filters[0],
            FilterCount {
                filter: "categoria".to_string(),
                count: 3
            }
        );
        assert!(report.top_filters.contains(&FilterCount {
            filter: "genero".to_string(),
            count: 1
        }));
        assert_eq!(
            report.top_sorts,
            vec![SortCount {
                sort: "mais_vendidos".to_string(),
                count: 1
            }]
        );
    }

    #[test]
    fn test_top_is_capped() {
        let today = now();
        let logs: Vec<SearchLog> = (0..15)
            .map(|i| log(&format!("busca {i}"), "{}", today))
            .collect();

        let report = build_report(&logs, today);

        assert_eq!(report.top_searches.len(), TOP_N);
    }
}
