use crate::stub::CallContext;
use std::str::FromStr;
use tonic::metadata::{
    Ascii, MetadataKey, MetadataValue,
    errors::{InvalidMetadataKey, InvalidMetadataValue},
};

/// Header the service uses to route a request to the right table.
pub const ROUTING_HEADER: &str = "x-goog-request-params";

#[derive(thiserror::Error, Debug)]
pub enum MetadataError {
    #[error("Invalid metadata (header) key '{key}': '{source}'")]
    InvalidMetadataKey {
        key: String,
        source: InvalidMetadataKey,
    },
    #[error("Invalid metadata (header) value for key '{key}': '{source}'")]
    InvalidMetadataValue {
        key: String,
        source: InvalidMetadataValue,
    },
}

/// Adds the routing header, plus any caller-supplied headers, to every attempt.
///
/// Headers are validated once, when the policy is built, so attaching them to an attempt
/// cannot fail.
#[derive(Debug, Clone)]
pub struct MetadataUpdatePolicy {
    headers: Vec<(MetadataKey<Ascii>, MetadataValue<Ascii>)>,
}

impl MetadataUpdatePolicy {
    pub fn new(
        table_name: &str,
        app_profile_id: &str,
        extra_headers: Vec<(String, String)>,
    ) -> Result<Self, MetadataError> {
        let routing = if app_profile_id.is_empty() {
            format!("table_name={table_name}")
        } else {
            format!("table_name={table_name}&app_profile_id={app_profile_id}")
        };

        let headers = std::iter::once((ROUTING_HEADER.to_string(), routing))
            .chain(extra_headers)
            .map(|(k, v)| parse_header(k, v))
            .collect::<Result<_, _>>()?;

        Ok(Self { headers })
    }

    pub fn setup(&self, context: &mut CallContext) {
        for (key, value) in &self.headers {
            context.metadata_mut().append(key.clone(), value.clone());
        }
    }
}

fn parse_header(
    k: String,
    v: String,
) -> Result<(MetadataKey<Ascii>, MetadataValue<Ascii>), MetadataError> {
    let key = MetadataKey::from_str(&k).map_err(|source| MetadataError::InvalidMetadataKey {
        key: k.clone(),
        source,
    })?;
    let val = MetadataValue::from_str(&v)
        .map_err(|source| MetadataError::InvalidMetadataValue { key: k, source })?;
    Ok((key, val))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn adds_routing_header() {
        let policy =
            MetadataUpdatePolicy::new("projects/p/instances/i/tables/t", "batch", vec![]).unwrap();
        let mut context = CallContext::new();

        policy.setup(&mut context);

        assert_eq!(
            context.metadata().get(ROUTING_HEADER).unwrap(),
            "table_name=projects/p/instances/i/tables/t&app_profile_id=batch"
        );
    }

    #[test]
    fn omits_empty_app_profile() {
        let policy = MetadataUpdatePolicy::new("t", "", vec![]).unwrap();
        let mut context = CallContext::new();

        policy.setup(&mut context);

        assert_eq!(
            context.metadata().get(ROUTING_HEADER).unwrap(),
            "table_name=t"
        );
    }

    #[test]
    fn carries_extra_headers() {
        let policy = MetadataUpdatePolicy::new(
            "t",
            "",
            vec![("x-request-source".to_string(), "cli".to_string())],
        )
        .unwrap();
        let mut context = CallContext::new();

        policy.setup(&mut context);

        assert_eq!(context.metadata().get("x-request-source").unwrap(), "cli");
    }

    #[test]
    fn rejects_invalid_headers() {
        let err = MetadataUpdatePolicy::new(
            "t",
            "",
            vec![("bad key".to_string(), "v".to_string())],
        )
        .unwrap_err();
        assert!(matches!(err, MetadataError::InvalidMetadataKey { key, .. } if key == "bad key"));

        let err = MetadataUpdatePolicy::new(
            "t",
            "",
            vec![("x-ok".to_string(), "line\nbreak".to_string())],
        )
        .unwrap_err();
        assert!(matches!(err, MetadataError::InvalidMetadataValue { .. }));
    }
}
