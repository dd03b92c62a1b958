//! Typed CRUD access to a REST collection
//!
//! Back-office screens all follow the same pattern over a collection path:
//! list, fetch one, create, update, delete, export.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};
use urlencoding::encode;

use super::client::ApiClient;
use super::errors::ApiError;

/// Typed handle over a collection such as `/employees`
pub struct Resource<T> {
    client: ApiClient,
    collection: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            collection: self.collection.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Resource<T>
where
    T: Serialize + DeserializeOwned,
{
    /// # Arguments
    /// * `client` - API client
    /// * `collection` - Collection path relative to the base URL, e.g. `/employees`
    pub fn new(client: ApiClient, collection: impl Into<String>) -> Self {
        let collection = collection.into();
        let collection = format!("/{}", collection.trim_matches('/'));
        Self { client, collection, _marker: PhantomData }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.collection, encode(id))
    }

    /// List every item of the collection
    ///
    /// # Errors
    /// Returns error if API request fails
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn list(&self) -> Result<Vec<T>, ApiError> {
        let items: Vec<T> = self.client.get_json(&self.collection).await?;
        debug!(count = items.len(), "Items listed");
        Ok(items)
    }

    /// List items matching query parameters (`?key=value&...`)
    ///
    /// # Errors
    /// Returns error if API request fails
    #[instrument(skip(self, params), fields(collection = %self.collection))]
    pub async fn list_where(&self, params: &[(&str, &str)]) -> Result<Vec<T>, ApiError> {
        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        let path =
            if query.is_empty() { self.collection.clone() } else { format!("{}?{query}", self.collection) };

        let items: Vec<T> = self.client.get_json(&path).await?;
        debug!(count = items.len(), "Items listed");
        Ok(items)
    }

    /// Get an item by ID
    ///
    /// # Errors
    /// Returns error if item not found or API request fails
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn get(&self, id: &str) -> Result<T, ApiError> {
        self.client.get_json(&self.item_path(id)).await
    }

    /// Create an item, returning the server's representation
    ///
    /// # Errors
    /// Returns error if API request fails
    #[instrument(skip(self, item), fields(collection = %self.collection))]
    pub async fn create(&self, item: &T) -> Result<T, ApiError> {
        let created: T = self.client.post_json(&self.collection, item).await?;
        debug!("Item created");
        Ok(created)
    }

    /// Replace an item, returning the server's representation
    ///
    /// # Errors
    /// Returns error if API request fails
    #[instrument(skip(self, item), fields(collection = %self.collection))]
    pub async fn update(&self, id: &str, item: &T) -> Result<T, ApiError> {
        self.client.put_json(&self.item_path(id), item).await
    }

    /// Delete an item; any response body is ignored
    ///
    /// # Errors
    /// Returns error if API request fails
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let _: Value = self.client.delete_json(&self.item_path(id)).await?;
        debug!("Item deleted");
        Ok(())
    }

    /// Download an export of the collection, e.g. `export("export/pdf")`
    ///
    /// # Errors
    /// Returns error if API request fails
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn export(&self, suffix: &str) -> Result<Vec<u8>, ApiError> {
        let path = format!("{}/{}", self.collection, suffix.trim_start_matches('/'));
        let bytes = self.client.download(&path).await?;
        debug!(size = bytes.len(), "Export downloaded");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agrm_core::auth::MemoryCredentialStore;
    use agrm_domain::ClientConfig;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Product {
        code: String,
        label: String,
    }

    fn products(server: &MockServer) -> Resource<Product> {
        let store = MemoryCredentialStore::with_token("h.p.s");
        let client = ApiClient::new(ClientConfig::new(server.uri()), Arc::new(store)).unwrap();
        Resource::new(client, "products/")
    }

    fn rice() -> Product {
        Product { code: "RIZ-25".into(), label: "Riz 25kg".into() }
    }

    #[tokio::test]
    async fn list_and_get() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([rice()])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/products/RIZ%2F25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(rice())))
            .expect(1)
            .mount(&server)
            .await;

        let products = products(&server);
        assert_eq!(products.collection(), "/products");
        assert_eq!(products.list().await.unwrap(), vec![rice()]);
        assert_eq!(products.get("RIZ/25").await.unwrap(), rice());
    }

    #[tokio::test]
    async fn list_where_encodes_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("label", "Riz 25kg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([rice()])))
            .expect(1)
            .mount(&server)
            .await;

        let found = products(&server).list_where(&[("label", "Riz 25kg")]).await.unwrap();
        assert_eq!(found, vec![rice()]);
    }

    #[tokio::test]
    async fn create_update_delete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/products"))
            .and(body_json(json!(rice())))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!(rice())))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/products/RIZ-25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(rice())))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/products/RIZ-25"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let products = products(&server);
        assert_eq!(products.create(&rice()).await.unwrap(), rice());
        assert_eq!(products.update("RIZ-25", &rice()).await.unwrap(), rice());
        products.delete("RIZ-25").await.unwrap();
    }

    #[tokio::test]
    async fn export_returns_raw_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/export/csv"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"code;label\n".to_vec()))
            .mount(&server)
            .await;

        let bytes = products(&server).export("/export/csv").await.unwrap();
        assert_eq!(bytes, b"code;label\n");
    }

    #[tokio::test]
    async fn wrong_shape_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .mount(&server)
            .await;

        match products(&server).list().await {
            Err(ApiError::Decode { status, .. }) => assert_eq!(status, 200),
            other => panic!("expected decode error, got {:?}", other),
        }
    }
}
