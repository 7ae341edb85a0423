use serde_json::{Map, Value, json};

use crate::{
    attachment::Attachment,
    transformer::{Transformer, into_record, self_link, timestamp},
};

/// Renders attachment records.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachmentTransformer;

impl Transformer for AttachmentTransformer {
    type Entity = Attachment;

    const RESOURCE_TYPE: &'static str = "attachments";
    const AVAILABLE_INCLUDES: &'static [&'static str] = &["user"];

    fn transform(&self, attachment: &Attachment) -> Map<String, Value> {
        into_record(json!({
            "id": attachment.id,
            "updated_at": timestamp(attachment.updated_at),
            "created_at": timestamp(attachment.created_at),
            "attachable_type": "transaction_journal",
            "attachable_id": attachment.journal_id,
            "filename": attachment.filename,
            "title": attachment.title,
            "notes": attachment.notes,
            "mime": attachment.mime,
            "size": attachment.size,
            "links": self_link(format!("/attachments/{}", attachment.id)),
        }))
    }
}
