//! Encode/decode pairs for the columns whose physical encoding differs
//! between backends.
//!
//! This is the only place that knows how a logical value is laid out on
//! disk for the SQLite family (embedded file and libsql). MySQL and PostgreSQL
//! map the same logical types onto native column types and need no codec
//! beyond what their drivers provide.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{AppError, AppResult};

/// 64-bit integers stored as the ASCII decimal digits inside a BLOB.
///
/// This is the layout used by existing SQLite databases of this application,
/// which were written by clients without lossless 64-bit integers.
pub mod bigint_blob {
    use super::*;

    pub fn encode(value: i64) -> Vec<u8> {
        value.to_string().into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> AppResult<i64> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| AppError::Decode(format!("big integer blob is not UTF-8: {}", e)))?;
        text.trim()
            .parse::<i64>()
            .map_err(|e| AppError::Decode(format!("invalid big integer blob '{}': {}", text, e)))
    }

    /// A big integer as found in a column of the SQLite family. Rows written
    /// by other clients may hold a plain INTEGER or the digits as TEXT.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Stored<'a> {
        Integer(i64),
        Digits(&'a [u8]),
    }

    pub fn decode_stored(stored: Stored<'_>) -> AppResult<i64> {
        match stored {
            Stored::Integer(value) => Ok(value),
            Stored::Digits(bytes) => decode(bytes),
        }
    }
}

/// Ordered string lists stored as a JSON array in a TEXT column
pub mod tags_json {
    use super::*;

    pub fn encode(tags: Option<&[String]>) -> AppResult<Option<String>> {
        tags.map(|t| serde_json::to_string(t).map_err(AppError::Serialization))
            .transpose()
    }

    pub fn decode(raw: Option<&str>) -> AppResult<Option<Vec<String>>> {
        raw.map(|s| serde_json::from_str::<Vec<String>>(s).map_err(AppError::Serialization))
            .transpose()
    }
}

/// Timestamps stored as UTC text in the same shape as SQLite's
/// `CURRENT_TIMESTAMP`
pub mod text_timestamp {
    use super::*;

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn encode(value: DateTime<Utc>) -> String {
        value.format(FORMAT).to_string()
    }

    /// Insert-time value for creation timestamps
    pub fn now() -> String {
        encode(Utc::now())
    }

    /// Accepts `CURRENT_TIMESTAMP` output (with or without fractional
    /// seconds) and RFC 3339.
    pub fn decode(raw: &str) -> AppResult<DateTime<Utc>> {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
            return Ok(naive.and_utc());
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        Err(AppError::Decode(format!("invalid timestamp '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_bigint_blob_beyond_safe_integer_range() {
        let value = 9_007_199_254_740_993i64;
        let blob = bigint_blob::encode(value);
        assert_eq!(blob, b"9007199254740993".to_vec());
        assert_eq!(bigint_blob::decode(&blob).unwrap(), value);
    }

    #[test]
    fn test_bigint_blob_extremes() {
        for value in [i64::MIN, -1, 0, i64::MAX] {
            assert_eq!(bigint_blob::decode(&bigint_blob::encode(value)).unwrap(), value);
        }
    }

    #[test]
    fn test_bigint_blob_rejects_garbage() {
        assert!(matches!(
            bigint_blob::decode(b"12abc"),
            Err(AppError::Decode(_))
        ));
        assert!(bigint_blob::decode(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_bigint_stored_by_other_clients() {
        use bigint_blob::{decode_stored, Stored};

        assert_eq!(
            decode_stored(Stored::Integer(1_700_000_000_123)).unwrap(),
            1_700_000_000_123
        );
        assert_eq!(
            decode_stored(Stored::Digits("1700000600456".as_bytes())).unwrap(),
            1_700_000_600_456
        );
        assert!(decode_stored(Stored::Digits(b"")).is_err());
    }

    #[test]
    fn test_tags_json_keeps_order_and_duplicates() {
        let tags = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        let encoded = tags_json::encode(Some(&tags)).unwrap();
        assert_eq!(encoded.as_deref(), Some(r#"["b","a","b"]"#));
        assert_eq!(tags_json::decode(encoded.as_deref()).unwrap(), Some(tags));
    }

    #[test]
    fn test_tags_json_null_and_empty() {
        assert_eq!(tags_json::encode(None).unwrap(), None);
        assert_eq!(tags_json::decode(None).unwrap(), None);
        assert_eq!(
            tags_json::decode(Some("[]")).unwrap(),
            Some(Vec::<String>::new())
        );
        assert!(tags_json::decode(Some("not json")).is_err());
    }

    #[test]
    fn test_text_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(text_timestamp::encode(expected), "2024-03-01 12:30:05");
        assert_eq!(
            text_timestamp::decode("2024-03-01 12:30:05").unwrap(),
            expected
        );
        assert_eq!(
            text_timestamp::decode("2024-03-01T12:30:05Z").unwrap(),
            expected
        );
        assert!(text_timestamp::decode("yesterday").is_err());
    }
}
