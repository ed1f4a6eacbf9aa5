//! Firestore REST adapter.
//!
//! Documents travel as Firestore's typed value encoding (`stringValue`,
//! `integerValue`, `mapValue`, ...) and are converted to plain JSON at the
//! boundary.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Number, Value};

use super::{Document, DocumentStore, StoreError, StoredDocument};
use crate::config::FirestoreConfig;

/// Document store backed by a Firestore database.
pub struct FirestoreStore {
    http_client: Client,
    base_url: String,
    project_id: String,
    database: String,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

impl FirestoreStore {
    pub fn new(config: &FirestoreConfig) -> Self {
        Self {
            http_client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            database: config.database.clone(),
            access_token: config.access_token.clone(),
        }
    }

    /// URL of `.../documents` followed by `segments`, each percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| StoreError::Config(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Config(format!("invalid base url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["projects", self.project_id.as_str(), "databases", self.database.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http_client.request(method, url);
        match self.access_token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, StoreError> {
        builder
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

async fn failure(response: reqwest::Response) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    StoreError::Unavailable(format!("{}: {}", status, body))
}

fn document_id(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

/// Plain JSON to a Firestore typed value.
fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn encode_fields(doc: &Document) -> Map<String, Value> {
    doc.iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Firestore typed value back to plain JSON.
fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let invalid = || StoreError::InvalidDocument(format!("unsupported value: {}", value));
    let (kind, inner) = value
        .as_object()
        .and_then(|obj| obj.iter().next())
        .ok_or_else(invalid)?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner.as_bool().map(Value::Bool).ok_or_else(invalid),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed.map(|i| Value::Number(i.into())).ok_or_else(invalid)
        }
        "doubleValue" => Ok(inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        "stringValue" | "timestampValue" | "referenceValue" => {
            inner.as_str().map(|s| Value::String(s.to_string())).ok_or_else(invalid)
        }
        "arrayValue" => {
            let items = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(items))
        }
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Object(fields))
        }
        _ => Err(invalid()),
    }
}

fn decode_fields(fields: &Map<String, Value>) -> Result<Document, StoreError> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn backend(&self) -> &'static str {
        "firestore"
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.url(&["documents", collection, id])?;
        let response = self.send(self.request(Method::GET, url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(failure(response).await);
        }

        let document: FirestoreDocument = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
        decode_fields(&document.fields).map(Some)
    }

    async fn set(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        let url = self.url(&["documents", collection, id])?;
        let body = json!({ "fields": encode_fields(doc) });
        let response = self.send(self.request(Method::PATCH, url).json(&body)).await?;

        if !response.status().is_success() {
            return Err(failure(response).await);
        }
        tracing::debug!("Set document {}/{}", collection, id);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: &Document,
    ) -> Result<(), StoreError> {
        // A PATCH without a mask would replace the document with nothing.
        if fields.is_empty() {
            return match self.get(collection, id).await? {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound(format!("{}/{}", collection, id))),
            };
        }

        let url = self.url(&["documents", collection, id])?;
        let mut query: Vec<(&str, &str)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let body = json!({ "fields": encode_fields(fields) });
        let response = self
            .send(self.request(Method::PATCH, url).query(&query).json(&body))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(format!("{}/{}", collection, id)));
        }
        if !response.status().is_success() {
            return Err(failure(response).await);
        }
        tracing::debug!("Updated {} field(s) of {}/{}", fields.len(), collection, id);
        Ok(())
    }

    async fn add(&self, collection: &str, doc: &Document) -> Result<String, StoreError> {
        let url = self.url(&["documents", collection])?;
        let body = json!({ "fields": encode_fields(doc) });
        let response = self.send(self.request(Method::POST, url).json(&body)).await?;

        if !response.status().is_success() {
            return Err(failure(response).await);
        }

        let created: FirestoreDocument = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
        let id = document_id(&created.name);
        tracing::debug!("Added document {}/{}", collection, id);
        Ok(id)
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let url = self.url(&["documents:runQuery"])?;
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": encode_value(value),
                    }
                }
            }
        });
        let response = self.send(self.request(Method::POST, url).json(&body)).await?;

        if !response.status().is_success() {
            return Err(failure(response).await);
        }

        let items: Vec<RunQueryItem> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;

        items
            .into_iter()
            .filter_map(|item| item.document)
            .map(|doc| {
                Ok(StoredDocument {
                    id: document_id(&doc.name),
                    fields: decode_fields(&doc.fields)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOCS: &str = "/projects/test-project/databases/(default)/documents";

    fn store_for(server: &MockServer, token: Option<&str>) -> FirestoreStore {
        FirestoreStore::new(&FirestoreConfig {
            project_id: "test-project".to_string(),
            database: "(default)".to_string(),
            base_url: server.uri(),
            access_token: token.map(String::from),
        })
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_value_encoding() {
        let encoded = encode_value(&json!({
            "name": "ada",
            "points": 40,
            "score": 92.5,
            "done": false,
            "classes": [{"id": 1}],
            "missing": null
        }));
        let fields = &encoded["mapValue"]["fields"];
        assert_eq!(fields["name"], json!({"stringValue": "ada"}));
        assert_eq!(fields["points"], json!({"integerValue": "40"}));
        assert_eq!(fields["score"], json!({"doubleValue": 92.5}));
        assert_eq!(fields["done"], json!({"booleanValue": false}));
        assert_eq!(fields["missing"], json!({"nullValue": null}));
        assert_eq!(
            fields["classes"]["arrayValue"]["values"][0]["mapValue"]["fields"]["id"],
            json!({"integerValue": "1"})
        );
    }

    #[test]
    fn test_value_decoding() {
        let decoded = decode_fields(&doc(json!({
            "points": {"integerValue": "60"},
            "bio": {"stringValue": "x"},
            "homework": {"arrayValue": {}},
            "profile": {"mapValue": {"fields": {"score": {"doubleValue": 7.5}}}}
        })))
        .unwrap();
        assert_eq!(
            Value::Object(decoded),
            json!({"points": 60, "bio": "x", "homework": [], "profile": {"score": 7.5}})
        );
    }

    #[test]
    fn test_unknown_value_kind_is_rejected() {
        let result = decode_value(&json!({"geoPointValue": {"latitude": 1.0}}));
        assert!(matches!(result, Err(StoreError::InvalidDocument(_))));
    }

    #[test]
    fn test_document_id_from_name() {
        assert_eq!(
            document_id("projects/p/databases/(default)/documents/notes/abc123"),
            "abc123"
        );
    }

    #[tokio::test]
    async fn test_get_decodes_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/users/u1", DOCS)))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/test-project/databases/(default)/documents/users/u1",
                "fields": {"points": {"integerValue": "5"}}
            })))
            .mount(&server)
            .await;

        let store = store_for(&server, Some("token-1"));
        let fetched = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(fetched["points"], 5);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": {"status": "NOT_FOUND"}})))
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        assert!(store.get("users", "ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let result = store.get("users", "u1").await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_update_sends_field_mask_and_precondition() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(format!("{}/users/u1", DOCS)))
            .and(query_param("updateMask.fieldPaths", "points"))
            .and(query_param("currentDocument.exists", "true"))
            .and(body_partial_json(json!({"fields": {"points": {"integerValue": "60"}}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/test-project/databases/(default)/documents/users/u1",
                "fields": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        store
            .update("users", "u1", &doc(json!({"points": 60})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let result = store.update("users", "ghost", &doc(json!({"points": 1}))).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_returns_assigned_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/notes", DOCS)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/test-project/databases/(default)/documents/notes/generated42",
                "fields": {}
            })))
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let id = store.add("notes", &doc(json!({"subject": "Math"}))).await.unwrap();
        assert_eq!(id, "generated42");
    }

    #[tokio::test]
    async fn test_find_by_field_runs_structured_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", DOCS)))
            .and(body_partial_json(json!({
                "structuredQuery": {
                    "from": [{"collectionId": "notes"}],
                    "where": {"fieldFilter": {
                        "field": {"fieldPath": "firebaseUid"},
                        "op": "EQUAL",
                        "value": {"stringValue": "u1"}
                    }}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "document": {
                        "name": "projects/test-project/databases/(default)/documents/notes/n1",
                        "fields": {"subject": {"stringValue": "Math"}}
                    },
                    "readTime": "2024-01-01T00:00:00Z"
                }
            ])))
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let found = store
            .find_by_field("notes", "firebaseUid", &json!("u1"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "n1");
        assert_eq!(found[0].fields["subject"], "Math");
    }

    #[tokio::test]
    async fn test_find_by_field_without_matches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"readTime": "2024-01-01T00:00:00Z"}])),
            )
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let found = store
            .find_by_field("notes", "firebaseUid", &json!("nobody"))
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
