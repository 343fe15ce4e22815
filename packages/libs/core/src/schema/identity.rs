//! 행 식별자 계산
//!
//! 식별 컬럼 값을 JSON 배열로 직렬화한 문자열이 행 식별자입니다.
//! 40자를 넘으면 SHA-1 hex digest로 줄입니다.

use serde_json::Value;
use sha1::{Digest, Sha1};
use uuid::Uuid;

use crate::row::RowData;

/// 직렬화 결과를 그대로 쓰는 최대 길이 (문자 수)
pub const MAX_PLAIN_IDENTITY_LEN: usize = 40;

/// 행 식별자 계산
///
/// - 식별 컬럼이 없으면 무작위 UUID (해당 테이블의 행은 중복 제거되지 않음)
/// - null이거나 없는 값은 무작위 UUID로 대체 (NULL은 서로 구별됨)
pub fn encode_identity(columns: &[String], data: &RowData) -> String {
    if columns.is_empty() {
        return Uuid::new_v4().to_string();
    }

    let values: Vec<Value> = columns
        .iter()
        .map(|column| match data.get(column) {
            None | Some(Value::Null) => Value::String(Uuid::new_v4().to_string()),
            Some(value) => value.clone(),
        })
        .collect();

    let encoded = Value::Array(values).to_string();
    if encoded.chars().count() <= MAX_PLAIN_IDENTITY_LEN {
        encoded
    } else {
        digest(&encoded)
    }
}

fn digest(encoded: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(encoded.as_bytes());
    hex::encode(hasher.finalize())
}
