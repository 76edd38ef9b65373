use serde::Serializer;

use super::model::EventError;

pub fn serialize_error_message<S>(error: &Option<EventError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(e) => serializer.collect_str(e),
        None => serializer.serialize_none(),
    }
}
