use serde_json::{Map, Value, json};

use crate::{
    User,
    transformer::{Transformer, into_record, self_link, timestamp},
};

/// Renders users.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserTransformer;

impl Transformer for UserTransformer {
    type Entity = User;

    const RESOURCE_TYPE: &'static str = "users";
    const AVAILABLE_INCLUDES: &'static [&'static str] = &[];

    fn transform(&self, user: &User) -> Map<String, Value> {
        into_record(json!({
            "id": user.id.as_i64(),
            "updated_at": timestamp(user.updated_at),
            "created_at": timestamp(user.created_at),
            "email": user.email.as_str(),
            "links": self_link(format!("/users/{}", user.id)),
        }))
    }
}
