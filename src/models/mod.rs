/// Pages and cursors of paginated responses.
pub mod page;

/// Threads, posts and the per-thread export record.
pub mod thread;

use std::collections::BTreeMap;

/// Request parameters sent with an API call.
///
/// Kept ordered so a request and its log line are reproducible.
pub type Params = BTreeMap<String, String>;

pub(crate) fn de_opt_token<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde_json::Value;

    // cursor ids and record ids arrive as either strings or numbers
    let value = <Option<Value> as serde::Deserialize>::deserialize(deserializer)?;
    Ok(value.and_then(|v| token(&v)))
}

/// Normalizes a JSON id to the string token the API expects back.
pub(crate) fn token(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;

    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) mod macros {
    macro_rules! params {
        ($($key:expr => $value:expr),* $(,)?) => {{
            #[allow(unused_mut)]
            let mut params = $crate::models::Params::new();
            $(params.insert($key.to_string(), $value.to_string());)*
            params
        }};
    }

    pub(crate) use params;
}
