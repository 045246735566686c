//! Supabase client: PostgREST record access and Storage uploads.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::schema::{ContactMessage, InsertMenuItem, Invoice, MenuItem, MenuItemPatch};
use crate::store::{MenuStore, StoreError};

/// Supabase client configuration.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseClient {
    /// Create a new Supabase client from environment variables.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("SUPABASE_URL").map_err(|_| anyhow!("SUPABASE_URL not set"))?;
        let service_role_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| anyhow!("SUPABASE_SERVICE_ROLE_KEY not set"))?;

        Ok(Self {
            client: Client::new(),
            base_url,
            service_role_key,
        })
    }

    /// Helper: GET from the Supabase REST API.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/rest/v1/{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Supabase GET {} failed: {} - {}", path, status, text));
        }

        Ok(resp.json().await?)
    }

    /// Helper: write (POST/PATCH/DELETE) against the REST API, discarding
    /// the response body.
    async fn write(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<()> {
        let url = format!("{}/rest/v1/{}", self.base_url, path);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .header("Prefer", "return=minimal");
        if let Some(body) = body {
            request = request.json(body);
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Supabase {} {} failed: {} - {}",
                method,
                path,
                status,
                text
            ));
        }
        Ok(())
    }

    /// List all invoices, newest first.
    pub async fn list_invoices(&self) -> Result<Vec<Invoice>> {
        self.get_json("invoices?select=*&order=issued_at.desc").await
    }

    /// Persist a contact-form submission.
    pub async fn insert_contact_message(&self, message: &ContactMessage) -> Result<()> {
        self.write(
            reqwest::Method::POST,
            "contact_messages",
            Some(&json!({
                "name": message.name,
                "email": message.email,
                "message": message.message,
            })),
        )
        .await?;
        info!("Stored contact message from {}", message.email);
        Ok(())
    }

    /// Upload a file to the public `media` bucket and return its public
    /// URL. Re-uploading the same key overwrites in place (upsert).
    pub async fn upload_media(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let url = format!("{}/storage/v1/object/media/{}", self.base_url, key);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to upload media {}: {} - {}", key, status, text));
        }

        let public_url = format!("{}/storage/v1/object/public/media/{}", self.base_url, key);
        info!("Uploaded media {} -> {}", key, public_url);
        Ok(public_url)
    }
}

#[async_trait]
impl MenuStore for SupabaseClient {
    async fn list(&self) -> Result<Vec<MenuItem>, StoreError> {
        let items = self
            .get_json("menu_items?select=*&order=sort_order.asc")
            .await?;
        Ok(items)
    }

    async fn insert(&self, record: InsertMenuItem) -> Result<MenuItem, StoreError> {
        let url = format!("{}/rest/v1/menu_items", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await
            .map_err(anyhow::Error::from)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(StoreError::Request(anyhow!(
                "Failed to insert menu item: {} - {}",
                status,
                text
            )));
        }

        // PostgREST returns the inserted rows as an array.
        let mut rows: Vec<MenuItem> = resp.json().await.map_err(anyhow::Error::from)?;
        rows.pop()
            .ok_or_else(|| StoreError::Request(anyhow!("Insert returned no rows")))
    }

    async fn update(&self, id: &str, patch: &MenuItemPatch) -> Result<(), StoreError> {
        let body = patch_body(patch);
        if body.is_empty() {
            return Ok(());
        }
        debug!("PATCH menu_items id={} fields={}", id, body.len());
        self.write(
            reqwest::Method::PATCH,
            &format!("menu_items?id=eq.{}", id),
            Some(&Value::Object(body)),
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.write(
            reqwest::Method::DELETE,
            &format!("menu_items?id=eq.{}", id),
            None,
        )
        .await?;
        Ok(())
    }
}

/// Only the fields present in the patch go over the wire; `parent_id`
/// serializes an explicit null when the item becomes a root.
fn patch_body(patch: &MenuItemPatch) -> serde_json::Map<String, Value> {
    let mut body = serde_json::Map::new();
    if let Some(title) = &patch.title {
        body.insert("title".to_string(), json!(title));
    }
    if let Some(link) = &patch.link {
        body.insert("link".to_string(), json!(link));
    }
    if let Some(location) = patch.location {
        body.insert("location".to_string(), json!(location));
    }
    if let Some(parent_id) = &patch.parent_id {
        body.insert("parent_id".to_string(), json!(parent_id));
    }
    if let Some(sort_order) = patch.sort_order {
        body.insert("sort_order".to_string(), json!(sort_order));
    }
    if let Some(is_active) = patch.is_active {
        body.insert("is_active".to_string(), json!(is_active));
    }
    body
}
