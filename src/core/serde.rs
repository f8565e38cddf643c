/// Serde helper functions for custom serialization/deserialization
use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Serialize Duration as whole milliseconds
pub mod duration_millis {
    use super::*;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Serialize Option<Duration> as Option<milliseconds>
pub mod optional_duration_millis {
    use super::*;

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt = Option::<u64>::deserialize(deserializer)?;
        Ok(opt.map(Duration::from_millis))
    }
}

/// Skip serializing if Option is None
pub fn is_none<T>(value: &Option<T>) -> bool {
    value.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "duration_millis")]
        hold: Duration,
        #[serde(with = "optional_duration_millis", default, skip_serializing_if = "is_none")]
        limit: Option<Duration>,
    }

    #[test]
    fn test_duration_millis_roundtrip() {
        let sample = Sample {
            hold: Duration::from_millis(150),
            limit: None,
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"hold":150}"#);
        assert_eq!(serde_json::from_str::<Sample>(&json).unwrap(), sample);
    }

    #[test]
    fn test_optional_present() {
        let sample: Sample = serde_json::from_str(r#"{"hold":1,"limit":2000}"#).unwrap();
        assert_eq!(sample.limit, Some(Duration::from_secs(2)));
    }
}
