//! Shop provisioning, settings and API key rotation.

use uuid::Uuid;

use crate::error::AppError;
use crate::models::api_key::IssuedApiKey;
use crate::models::shop::{
    IssuedKeyResponse, NewShop, ShopResponse, SubscriptionStatus, UpdateSettingsRequest,
};
use crate::repository::Repository;

/// Database side of app installation.
///
/// # Process
///
/// 1. Normalize the shop URL to a bare host
/// 2. Existing shop: keep its key; reset subscription to `pending` unless it
///    is `active`
/// 3. New shop: issue an API key and insert with status `pending`
///
/// Returns the created flag and the response (with the key only for new shops).
pub async fn install_shop(
    repo: &dyn Repository,
    shop_url: &str,
    usage_limit: i64,
) -> Result<(bool, IssuedKeyResponse), AppError> {
    let shop_url = normalize_shop_url(shop_url)?;

    if let Some(existing) = repo.find_shop_by_url(&shop_url).await? {
        let shop = if existing.status() == SubscriptionStatus::Active {
            tracing::info!(shop_id = %existing.id, "active shop reinstalled, subscription kept");
            existing
        } else {
            let shop = repo
                .set_subscription_status(existing.id, SubscriptionStatus::Pending)
                .await?;
            tracing::info!(shop_id = %shop.id, shop_url = %shop.shop_url, "shop reinstalled");
            shop
        };

        return Ok((
            false,
            IssuedKeyResponse {
                shop: shop.into(),
                api_key: None,
            },
        ));
    }

    let issued = IssuedApiKey::generate();
    let shop = repo
        .create_shop(NewShop {
            shop_url,
            api_key_hash: issued.key_hash,
            api_key_prefix: issued.api_key_prefix,
            usage_limit,
        })
        .await?;
    tracing::info!(shop_id = %shop.id, shop_url = %shop.shop_url, "shop installed");

    Ok((
        true,
        IssuedKeyResponse {
            shop: shop.into(),
            api_key: Some(issued.api_key),
        },
    ))
}

/// Save the merchant's filter and sort vocabulary. Blank values clear it.
pub async fn update_settings(
    repo: &dyn Repository,
    shop_id: Uuid,
    request: UpdateSettingsRequest,
) -> Result<ShopResponse, AppError> {
    let shop = repo
        .update_settings(
            shop_id,
            non_blank(request.filters),
            non_blank(request.sorts),
        )
        .await?;

    Ok(shop.into())
}

/// Replace the shop's API key. The old key stops working immediately.
pub async fn rotate_api_key(
    repo: &dyn Repository,
    shop_id: Uuid,
) -> Result<IssuedKeyResponse, AppError> {
    let issued = IssuedApiKey::generate();
    let shop = repo
        .replace_api_key(shop_id, &issued.key_hash, &issued.api_key_prefix)
        .await?;
    tracing::info!(shop_id = %shop.id, "api key rotated");

    Ok(IssuedKeyResponse {
        shop: shop.into(),
        api_key: Some(issued.api_key),
    })
}

/// Reduce `https://Acme.myshopify.com/admin` to `acme.myshopify.com`.
fn normalize_shop_url(raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::InvalidRequest("shop_url is required".to_string()));
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let parsed = url::Url::parse(&with_scheme)
        .map_err(|_| AppError::InvalidRequest("shop_url is not a valid host".to_string()))?;

    parsed
        .host_str()
        .filter(|host| host.contains('.'))
        .map(str::to_lowercase)
        .ok_or_else(|| AppError::InvalidRequest("shop_url is not a valid host".to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::api_key::hash_api_key;
    use crate::repository::memory::MemoryRepository;

    #[test]
    fn test_normalize_shop_url() {
        assert_eq!(
            normalize_shop_url("https://Acme.myshopify.com/admin").unwrap(),
            "acme.myshopify.com"
        );
        assert_eq!(
            normalize_shop_url(" acme.myshopify.com ").unwrap(),
            "acme.myshopify.com"
        );
        assert!(normalize_shop_url("").is_err());
        assert!(normalize_shop_url("localhost").is_err());
    }

    #[tokio::test]
    async fn test_reinstall_keeps_key_and_active_subscription() {
        let repo = MemoryRepository::new();

        let (created, first) = install_shop(&repo, "acme.myshopify.com", 1000)
            .await
            .unwrap();
        assert!(created);
        let api_key = first.api_key.expect("new shop gets a key");
        assert_eq!(first.shop.subscription_status, SubscriptionStatus::Pending);

        repo.set_subscription_status(first.shop.id, SubscriptionStatus::Active)
            .await
            .unwrap();

        let (created, second) = install_shop(&repo, "https://acme.myshopify.com", 1000)
            .await
            .unwrap();
        assert!(!created);
        assert!(second.api_key.is_none());
        assert_eq!(second.shop.id, first.shop.id);
        assert_eq!(second.shop.subscription_status, SubscriptionStatus::Active);
        assert_eq!(repo.shop(first.shop.id).unwrap().status(), SubscriptionStatus::Active);
        assert!(repo.api_key_exists(&hash_api_key(&api_key)).await.unwrap());
    }

    #[tokio::test]
    async fn test_reinstall_resets_inactive_subscription() {
        let repo = MemoryRepository::new();
        let (_, first) = install_shop(&repo, "acme.myshopify.com", 1000)
            .await
            .unwrap();

        repo.set_subscription_status(first.shop.id, SubscriptionStatus::Cancelled)
            .await
            .unwrap();

        let (_, second) = install_shop(&repo, "acme.myshopify.com", 1000)
            .await
            .unwrap();
        assert_eq!(second.shop.subscription_status, SubscriptionStatus::Pending);
    }

    #[tokio::test]
    async fn test_rotation_invalidates_old_key() {
        let repo = MemoryRepository::new();
        let (_, installed) = install_shop(&repo, "acme.myshopify.com", 1000)
            .await
            .unwrap();
        let old_key = installed.api_key.unwrap();

        let rotated = rotate_api_key(&repo, installed.shop.id).await.unwrap();
        let new_key = rotated.api_key.unwrap();

        assert_ne!(old_key, new_key);
        assert!(!repo.api_key_exists(&hash_api_key(&old_key)).await.unwrap());
        assert!(repo.api_key_exists(&hash_api_key(&new_key)).await.unwrap());
    }

    #[tokio::test]
    async fn test_blank_settings_are_cleared() {
        let repo = MemoryRepository::new();
        let (_, installed) = install_shop(&repo, "acme.myshopify.com", 1000)
            .await
            .unwrap();

        let updated = update_settings(
            &repo,
            installed.shop.id,
            UpdateSettingsRequest {
                filters: Some(" categoria, cor ".to_string()),
                sorts: Some("   ".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.filters.as_deref(), Some("categoria, cor"));
        assert!(updated.sorts.is_none());
    }
}
