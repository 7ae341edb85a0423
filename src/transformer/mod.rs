//! Map entities to flat records for rendering as JSON:API resources.
//!
//! Every record has an integer `id`, timestamps as RFC 3339 strings and a
//! `links` list holding the resource's `self` URI relative to the API root.

mod attachment;
mod budget;
mod import_job;
mod includes;
mod piggy_bank;
mod transaction;
mod user;

use serde_json::{Map, Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::json_api::{JsonApiSerializer, Resource};

pub use attachment::AttachmentTransformer;
pub use budget::BudgetTransformer;
pub use import_job::ImportJobTransformer;
pub use includes::Includes;
pub use piggy_bank::{PiggyBankEventTransformer, PiggyBankTransformer};
pub use transaction::TransactionTransformer;
pub use user::UserTransformer;

/// Maps one kind of entity to a flat record.
pub trait Transformer {
    /// The entity this transformer renders.
    type Entity;

    /// The JSON:API resource type, e.g. "budgets".
    const RESOURCE_TYPE: &'static str;

    /// The related resources a client may ask to include.
    const AVAILABLE_INCLUDES: &'static [&'static str];

    /// The related resources that are included without being asked for.
    const DEFAULT_INCLUDES: &'static [&'static str] = &[];

    /// Map `entity` to a flat record.
    fn transform(&self, entity: &Self::Entity) -> Map<String, Value>;

    /// Map `entity` to a resource object.
    fn resource(&self, serializer: &JsonApiSerializer, entity: &Self::Entity) -> Resource {
        serializer.resource(Self::RESOURCE_TYPE, self.transform(entity))
    }

    /// Map each of `entities` to a resource object.
    fn resources<'a>(
        &self,
        serializer: &JsonApiSerializer,
        entities: impl IntoIterator<Item = &'a Self::Entity>,
    ) -> Vec<Resource>
    where
        Self::Entity: 'a,
    {
        entities
            .into_iter()
            .map(|entity| self.resource(serializer, entity))
            .collect()
    }
}

/// Render a timestamp as an RFC 3339 string.
pub(crate) fn timestamp(date_time: OffsetDateTime) -> Value {
    match date_time.format(&Rfc3339) {
        Ok(text) => Value::String(text),
        Err(error) => {
            tracing::error!("Could not format {date_time} as RFC 3339: {error}");
            Value::Null
        }
    }
}

/// The `links` entry of a record.
pub(crate) fn self_link(uri: String) -> Value {
    json!([{ "rel": "self", "uri": uri }])
}

/// Unwrap a `json!({...})` literal into its map.
pub(crate) fn into_record(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
