//! Firestore REST client
//!
//! Reads collections through the Firestore v1 REST API:
//! - top-level collections are listed page by page
//! - per-user subcollections are read with one collection-group query and
//!   the owning user id is taken from each document's path
//!
//! Firestore wraps every field in a typed value (`{"stringValue": "x"}`);
//! documents are unwrapped to plain JSON before they are deserialized into
//! record types. Documents that still do not fit are skipped with a warning.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RecordSource;
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::types::{
    AdminAggregateStats, CrisisJournalEntry, GlobalMedicationRecord, UserMedicationRecord,
    UserRecord,
};

/// A document as returned by the REST API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Document {
    /// Full resource name, `projects/{p}/databases/{d}/documents/{path}`
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub create_time: Option<String>,
}

/// Response from GET `{collection}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// One element of the POST `:runQuery` response array
#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryRequest<'a> {
    structured_query: StructuredQuery<'a>,
}

#[derive(Serialize)]
struct StructuredQuery<'a> {
    from: [CollectionSelector<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector<'a> {
    collection_id: &'a str,
    all_descendants: bool,
}

/// HTTP client for the Firestore REST API
pub struct FirestoreClient {
    config: StoreConfig,
    http_client: reqwest::Client,
    documents_url: String,
}

impl FirestoreClient {
    /// Create a new client from configuration
    ///
    /// Returns an error if the configuration is invalid or missing required fields.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let project_id = config
            .project_id
            .as_deref()
            .ok_or_else(|| Error::Config("store.project_id is required".to_string()))?;

        let documents_url = format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            config.base_url.trim_end_matches('/'),
            urlencoding::encode(project_id)
        );

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(id_token) = &config.id_token {
            let auth_value = format!("Bearer {}", id_token);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| Error::Config(format!("invalid id_token: {}", e)))?,
            );
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            documents_url,
        })
    }

    /// Root URL of the document tree
    pub fn documents_url(&self) -> &str {
        &self.documents_url
    }

    fn with_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }

    async fn read_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        if status.is_success() {
            response
                .text()
                .await
                .map_err(|e| Error::Fetch(format!("failed to read response: {}", e)))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Fetch(format!("API error ({}): {}", status, error_text)))
        }
    }

    /// List every document of a top-level collection, following page tokens.
    async fn list_collection(&self, collection: &str) -> Result<Vec<Document>> {
        let url = format!("{}/{}", self.documents_url, urlencoding::encode(collection));
        let page_size = self.config.page_size.to_string();
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http_client
                .get(&url)
                .query(&[("pageSize", page_size.as_str())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = self
                .with_key(request)
                .send()
                .await
                .map_err(|e| Error::Fetch(format!("HTTP request failed: {}", e)))?;
            let body = Self::read_body(response).await?;

            let page: ListDocumentsResponse =
                serde_json::from_str(&body).map_err(|e| Error::Decode {
                    collection: collection.to_string(),
                    message: e.to_string(),
                })?;

            tracing::debug!(
                collection,
                documents = page.documents.len(),
                "Fetched page"
            );
            documents.extend(page.documents);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    /// Read every document in any subcollection named `collection_id`.
    async fn collection_group(&self, collection_id: &str) -> Result<Vec<Document>> {
        let url = format!("{}:runQuery", self.documents_url);
        let body = RunQueryRequest {
            structured_query: StructuredQuery {
                from: [CollectionSelector {
                    collection_id,
                    all_descendants: true,
                }],
            },
        };

        let response = self
            .with_key(self.http_client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("HTTP request failed: {}", e)))?;
        let body = Self::read_body(response).await?;

        let items: Vec<RunQueryItem> = serde_json::from_str(&body).map_err(|e| Error::Decode {
            collection: collection_id.to_string(),
            message: e.to_string(),
        })?;

        let documents: Vec<Document> = items.into_iter().filter_map(|item| item.document).collect();
        tracing::debug!(
            collection = collection_id,
            documents = documents.len(),
            "Ran collection group query"
        );
        Ok(documents)
    }
}

#[async_trait]
impl RecordSource for FirestoreClient {
    async fn fetch_users(&self) -> Result<Vec<UserRecord>> {
        let collection = &self.config.collections.users;
        let documents = self.list_collection(collection).await?;
        Ok(decode_documents(collection, documents))
    }

    async fn fetch_global_medications(&self) -> Result<Vec<GlobalMedicationRecord>> {
        let collection = &self.config.collections.global_medications;
        let documents = self.list_collection(collection).await?;
        Ok(decode_documents(collection, documents))
    }

    async fn fetch_user_medications(&self) -> Result<Vec<UserMedicationRecord>> {
        let collection = &self.config.collections.user_medications;
        let documents = self.collection_group(collection).await?;
        Ok(decode_documents(collection, documents))
    }

    async fn fetch_crisis_entries(&self) -> Result<Vec<CrisisJournalEntry>> {
        let collection = &self.config.collections.crisis_entries;
        let documents = self.collection_group(collection).await?;
        Ok(decode_documents(collection, documents))
    }

    async fn fetch_admin_stats(&self) -> Result<AdminAggregateStats> {
        let collection = &self.config.collections.admin;
        let documents = self.list_collection(collection).await?;
        match decode_documents::<AdminAggregateStats>(collection, documents)
            .into_iter()
            .next()
        {
            Some(stats) => Ok(stats),
            None => {
                tracing::warn!(collection = %collection, "No admin stats document, using zeros");
                Ok(AdminAggregateStats::default())
            }
        }
    }
}

/// Unwrap a Firestore typed value into plain JSON.
pub(crate) fn decode_value(value: &Value) -> Value {
    let Some(typed) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = typed.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => inner.as_bool().map(Value::Bool).unwrap_or(Value::Null),
        // int64 travels as a decimal string
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(s.clone())),
            other => other.clone(),
        },
        // NaN and Infinity travel as strings and have no JSON form
        "doubleValue" => match inner {
            Value::Number(_) => inner.clone(),
            _ => Value::Null,
        },
        "timestampValue" | "stringValue" | "bytesValue" | "referenceValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

pub(crate) fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

/// Path segments below `.../documents/`.
fn relative_segments(name: &str) -> Vec<&str> {
    let relative = match name.find("/documents/") {
        Some(idx) => &name[idx + "/documents/".len()..],
        None => name,
    };
    relative.split('/').filter(|s| !s.is_empty()).collect()
}

/// Document id: the last path segment.
pub(crate) fn document_id(name: &str) -> Option<&str> {
    relative_segments(name).last().copied()
}

/// Id of the document owning a subcollection document
/// (`Users/{uid}/Medications/{doc}` gives `uid`).
pub(crate) fn parent_document_id(name: &str) -> Option<&str> {
    let segments = relative_segments(name);
    if segments.len() >= 4 {
        Some(segments[segments.len() - 3])
    } else {
        None
    }
}

/// Flatten a document to plain JSON, adding `id`, `userId` and `createdAt`
/// from document metadata when the fields do not carry them.
pub(crate) fn document_to_json(document: &Document) -> Value {
    let mut fields = decode_fields(&document.fields);

    if let Some(id) = document_id(&document.name) {
        fields
            .entry("id")
            .or_insert_with(|| Value::String(id.to_string()));
    }
    if let Some(owner) = parent_document_id(&document.name) {
        fields
            .entry("userId")
            .or_insert_with(|| Value::String(owner.to_string()));
    }
    if let Some(created) = &document.create_time {
        fields
            .entry("createdAt")
            .or_insert_with(|| Value::String(created.clone()));
    }

    Value::Object(fields)
}

fn decode_documents<T>(collection: &str, documents: Vec<Document>) -> Vec<T>
where
    T: DeserializeOwned,
{
    let total = documents.len();
    let records: Vec<T> = documents
        .iter()
        .filter_map(|document| {
            match serde_json::from_value::<T>(document_to_json(document)) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(
                        collection,
                        document = %document.name,
                        error = %e,
                        "Skipping document that does not match the record shape"
                    );
                    None
                }
            }
        })
        .collect();

    if records.len() < total {
        tracing::warn!(
            collection,
            skipped = total - records.len(),
            total,
            "Some documents were skipped"
        );
    }
    records
}
