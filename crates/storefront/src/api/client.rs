//! REST implementation of [`StoreApi`].

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rocketshoes_core::{Product, ProductId, Stock};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::{ApiError, StoreApi};
use crate::config::CartConfig;

/// Longest slice of a response body copied into logs and errors.
const BODY_EXCERPT_CHARS: usize = 200;

// =============================================================================
// HttpStoreApi
// =============================================================================

/// Client for the stock/product REST service.
///
/// Cheap to clone; clones share the connection pool and the product cache.
#[derive(Clone)]
pub struct HttpStoreApi {
    inner: Arc<HttpStoreApiInner>,
}

struct HttpStoreApiInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl HttpStoreApi {
    /// Create a client from configuration.
    #[must_use]
    pub fn new(config: &CartConfig) -> Self {
        Self::with_client(
            reqwest::Client::new(),
            config.api_url.clone(),
            config.catalog_cache_ttl,
        )
    }

    /// Create a client around an existing `reqwest::Client`.
    ///
    /// `base_url` should end in `/`; `cache_ttl` of `None` disables the
    /// product cache.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: Url, cache_ttl: Option<Duration>) -> Self {
        let cache = cache_ttl.map(|ttl| Cache::builder().max_capacity(1000).time_to_live(ttl).build());

        Self {
            inner: Arc::new(HttpStoreApiInner {
                client,
                base_url,
                cache,
            }),
        }
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// GET `path` and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(path.to_string()));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %excerpt(&body),
                "Store API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: excerpt(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&body),
                "Failed to parse store API response"
            );
            ApiError::Parse(e)
        })
    }

    async fn cached(&self, key: CacheKey) -> Option<CacheValue> {
        match &self.inner.cache {
            Some(cache) => cache.get(&key).await,
            None => None,
        }
    }

    async fn remember(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }
}

impl StoreApi for HttpStoreApi {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn fetch_stock(&self, id: ProductId) -> Result<Stock, ApiError> {
        self.get_json(&format!("stock/{id}")).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn fetch_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.cached(key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.get_json(&format!("products/{id}")).await?;

        self.remember(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    #[instrument(skip(self))]
    async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cached(CacheKey::Products).await {
            debug!("Cache hit for product listing");
            return Ok(products.as_ref().clone());
        }

        let products: Vec<Product> = self.get_json("products").await?;

        self.remember(CacheKey::Products, CacheValue::Products(Arc::new(products.clone())))
            .await;

        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %stock.id, amount = stock.amount))]
    async fn update_stock(&self, stock: Stock) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("stock/{}", stock.id))?;
        let response = self.inner.client.put(url).json(&stock).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(format!("stock/{}", stock.id)));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %excerpt(&body),
                "Stock update rejected"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: excerpt(&body),
            });
        }

        debug!("Stock updated");
        Ok(())
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpStoreApi {
        HttpStoreApi::with_client(reqwest::Client::new(), Url::parse(base).unwrap(), None)
    }

    #[test]
    fn test_endpoint_joins_under_base() {
        let api = api("http://localhost:3333/api/");
        assert_eq!(
            api.endpoint("stock/4").unwrap().as_str(),
            "http://localhost:3333/api/stock/4"
        );
        assert_eq!(
            api.endpoint("products").unwrap().as_str(),
            "http://localhost:3333/api/products"
        );
    }

    #[test]
    fn test_excerpt_truncates() {
        let long = "x".repeat(500);
        assert_eq!(excerpt(&long).len(), BODY_EXCERPT_CHARS);
        assert_eq!(excerpt("short"), "short");
    }

    #[tokio::test]
    async fn test_cache_disabled_returns_nothing() {
        let api = api("http://localhost:3333/");
        api.remember(
            CacheKey::Product(ProductId::new(1)),
            CacheValue::Products(Arc::new(Vec::new())),
        )
        .await;
        assert!(api.cached(CacheKey::Product(ProductId::new(1))).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_enabled_remembers_product() {
        let api = HttpStoreApi::with_client(
            reqwest::Client::new(),
            Url::parse("http://localhost:3333/").unwrap(),
            Some(Duration::from_secs(60)),
        );
        let product = Product::new(ProductId::new(1), "Tênis", rust_decimal::Decimal::new(100, 0));
        api.remember(
            CacheKey::Product(product.id),
            CacheValue::Product(Box::new(product.clone())),
        )
        .await;

        match api.cached(CacheKey::Product(ProductId::new(1))).await {
            Some(CacheValue::Product(cached)) => assert_eq!(*cached, product),
            other => panic!("unexpected cache entry: {other:?}"),
        }
    }
}
