//! 바이너리 값의 JSON 표현
//!
//! BLOB/BINARY 컬럼 값은 `{"$bytes": "<hex>"}` 객체로 표현합니다.
//! 링크 조건에 이 형태가 오면 SELECT 빌더가 바이트 리터럴(`x'..'`)로 되돌립니다.

use serde_json::{Map, Value};

/// 바이트 값을 담는 객체 키
pub const BYTES_KEY: &str = "$bytes";

/// 바이트 → `{"$bytes": "<hex>"}`
pub fn bytes_to_json(bytes: &[u8]) -> Value {
    let mut object = Map::new();
    object.insert(BYTES_KEY.to_string(), Value::String(hex::encode(bytes)));
    Value::Object(object)
}

/// `{"$bytes": "<hex>"}` 형태이면 바이트로 복원
pub fn bytes_from_json(value: &Value) -> Option<Vec<u8>> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    let encoded = object.get(BYTES_KEY)?.as_str()?;
    hex::decode(encoded).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bytes_json() {
        let value = bytes_to_json(&[0x68, 0xff, 0x00]);
        assert_eq!(value, json!({ "$bytes": "68ff00" }));
        assert_eq!(bytes_from_json(&value), Some(vec![0x68, 0xff, 0x00]));
        assert_eq!(bytes_from_json(&bytes_to_json(&[])), Some(Vec::new()));
    }

    #[test]
    fn test_other_values_are_not_bytes() {
        assert_eq!(bytes_from_json(&json!("6869")), None);
        assert_eq!(bytes_from_json(&json!({ "$bytes": "zz" })), None);
        assert_eq!(bytes_from_json(&json!({ "$bytes": "68", "extra": 1 })), None);
        assert_eq!(bytes_from_json(&json!({ "$bytes": 1 })), None);
    }
}
