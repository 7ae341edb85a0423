//! Serializes transformed records into JSON:API documents.
//!
//! A [Transformer](crate::transformer::Transformer) produces a flat map with an
//! integer `id`, the resource's attributes and a `links` list holding the
//! resource's `self` URI. [JsonApiSerializer] turns those maps into resource
//! objects and wraps them in a [Document].

use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::Error;

/// The media type of every JSON:API response.
pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

/// A JSON request body whose rejections are rendered as JSON:API error documents.
///
/// Accepts both `application/json` and `application/vnd.api+json` bodies.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                tracing::warn!("Rejected request body: {rejection}");
                Err(Error::InvalidRequest(rejection.body_text()))
            }
        }
    }
}

/// A single JSON:API resource object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    /// The resource type, e.g. "transactions".
    #[serde(rename = "type")]
    pub resource_type: String,
    /// The resource ID rendered as a string.
    pub id: String,
    /// Every transformed field except `id` and `links`.
    pub attributes: Map<String, Value>,
    /// Links to the related resources that were included.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub relationships: Map<String, Value>,
    /// The absolute link to this resource.
    pub links: ResourceLinks,
}

impl Resource {
    /// A resource identifier object (`type` and `id`) pointing at this resource.
    pub fn identifier(&self) -> Value {
        json!({ "type": self.resource_type, "id": self.id })
    }

    /// Link this resource to a single related resource.
    pub fn relate_one(&mut self, name: &str, related: &Resource) {
        self.relationships
            .insert(name.to_owned(), json!({ "data": related.identifier() }));
    }

    /// Link this resource to a list of related resources.
    pub fn relate_many(&mut self, name: &str, related: &[Resource]) {
        let identifiers: Vec<Value> = related.iter().map(Resource::identifier).collect();

        self.relationships
            .insert(name.to_owned(), json!({ "data": identifiers }));
    }
}

/// The links object of a resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceLinks {
    /// The absolute URL of the resource.
    #[serde(rename = "self")]
    pub self_link: String,
}

/// The primary data of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    /// A document about one resource.
    Single(Box<Resource>),
    /// A document about a collection of resources.
    Many(Vec<Resource>),
}

/// Top level links of a document, e.g. for pagination.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentLinks {
    /// The link that produced this document.
    #[serde(rename = "self")]
    pub self_link: String,
    /// The first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    /// The previous page, absent on the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    /// The next page, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// The last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

/// A JSON:API top level document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// The primary data.
    pub data: PrimaryData,
    /// Related resources requested with the `include` parameter.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Resource>,
    /// Non-standard meta information, e.g. pagination counts.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
    /// Top level links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<DocumentLinks>,
}

impl Document {
    /// Add resources to `included`, skipping any that are already present.
    pub fn include(&mut self, resources: impl IntoIterator<Item = Resource>) {
        let mut seen: BTreeSet<(String, String)> = self
            .included
            .iter()
            .map(|resource| (resource.resource_type.clone(), resource.id.clone()))
            .collect();

        for resource in resources {
            if seen.insert((resource.resource_type.clone(), resource.id.clone())) {
                self.included.push(resource);
            }
        }
    }

    /// Set a top level meta entry.
    pub fn with_meta(mut self, key: &str, value: Value) -> Self {
        self.meta.insert(key.to_owned(), value);
        self
    }

    /// Set the top level links.
    pub fn with_links(mut self, links: DocumentLinks) -> Self {
        self.links = Some(links);
        self
    }
}

impl IntoResponse for Document {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self) {
            Ok(body) => (
                StatusCode::OK,
                [(CONTENT_TYPE, JSON_API_CONTENT_TYPE)],
                body,
            )
                .into_response(),
            Err(error) => {
                tracing::error!("Could not serialize JSON:API document: {error}");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                )
            }
        }
    }
}

/// Builds resource objects with absolute links under `base_url`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonApiSerializer {
    base_url: String,
}

impl JsonApiSerializer {
    /// Create a serializer for links relative to `base_url`, e.g. "https://example.com/api/v1".
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// The URL that relative API paths are appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Turn a transformed record into a resource object.
    ///
    /// The record's `id` becomes the resource ID and its `self` link becomes
    /// the resource link. Records without a `self` link get `/{resource_type}/{id}`.
    pub fn resource(&self, resource_type: &str, mut record: Map<String, Value>) -> Resource {
        let id = match record.remove("id") {
            Some(Value::String(id)) => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => String::new(),
        };

        let self_uri = record
            .remove("links")
            .and_then(|links| find_self_uri(&links))
            .unwrap_or_else(|| format!("/{resource_type}/{id}"));

        Resource {
            resource_type: resource_type.to_owned(),
            id,
            attributes: record,
            relationships: Map::new(),
            links: ResourceLinks {
                self_link: format!("{}{}", self.base_url, self_uri),
            },
        }
    }

    /// Wrap a single resource in a document.
    pub fn item(&self, resource: Resource) -> Document {
        Document {
            data: PrimaryData::Single(Box::new(resource)),
            included: Vec::new(),
            meta: Map::new(),
            links: None,
        }
    }

    /// Wrap a list of resources in a document.
    pub fn collection(&self, resources: Vec<Resource>) -> Document {
        Document {
            data: PrimaryData::Many(resources),
            included: Vec::new(),
            meta: Map::new(),
            links: None,
        }
    }
}

fn find_self_uri(links: &Value) -> Option<String> {
    links.as_array()?.iter().find_map(|link| {
        if link.get("rel")?.as_str()? == "self" {
            link.get("uri")?.as_str().map(str::to_owned)
        } else {
            None
        }
    })
}

#[derive(Debug, Serialize)]
struct ErrorObject<'a> {
    status: String,
    title: &'a str,
    detail: &'a str,
}

#[derive(Debug, Serialize)]
struct ErrorDocument<'a> {
    errors: Vec<ErrorObject<'a>>,
}

/// Render a JSON:API error document with a single error object.
pub fn error_response(status_code: StatusCode, title: &str, detail: &str) -> Response {
    let document = ErrorDocument {
        errors: vec![ErrorObject {
            status: status_code.as_u16().to_string(),
            title,
            detail,
        }],
    };

    match serde_json::to_vec(&document) {
        Ok(body) => (status_code, [(CONTENT_TYPE, JSON_API_CONTENT_TYPE)], body).into_response(),
        Err(error) => {
            tracing::error!("Could not serialize JSON:API error document: {error}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
