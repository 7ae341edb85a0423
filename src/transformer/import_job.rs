use serde_json::{Map, Value, json};

use crate::{
    import_job::ImportJob,
    transformer::{Transformer, into_record, self_link, timestamp},
};

/// Renders import jobs without their configuration, which may hold provider credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportJobTransformer;

impl Transformer for ImportJobTransformer {
    type Entity = ImportJob;

    const RESOURCE_TYPE: &'static str = "import_jobs";
    const AVAILABLE_INCLUDES: &'static [&'static str] = &[];

    fn transform(&self, job: &ImportJob) -> Map<String, Value> {
        into_record(json!({
            "id": job.id,
            "updated_at": timestamp(job.updated_at),
            "created_at": timestamp(job.created_at),
            "key": job.key,
            "provider": job.provider.as_str(),
            "stage": job.stage.as_str(),
            "status": job.status.as_str(),
            "links": self_link(format!("/import/jobs/{}", job.key)),
        }))
    }
}
