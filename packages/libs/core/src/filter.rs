//! 등치 조건 맵
//!
//! 링크 조회와 시드 선택에 쓰이는 `컬럼 → 값` 조건입니다.
//! 값이 `null`이면 `IS NULL`, 그 외에는 `=`로 해석되며 모든 항목은 AND로 결합됩니다.
//! 빈 조건은 전체 스캔을 의미합니다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::row::RowData;

/// WHERE 조건
///
/// 삽입 순서를 유지합니다. 같은 컬럼을 다시 넣으면 값이 교체됩니다.
///
/// # 예시
///
/// ```json
/// { "firstname": "first", "lastname": "last" }   // firstname = 'first' AND lastname = 'last'
/// { "email": null }                              // email IS NULL
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhereClause(pub Map<String, Value>);

impl WhereClause {
    /// 빈 WHERE 절
    pub fn empty() -> Self {
        Self(Map::new())
    }

    /// WHERE 조건이 비어있는지
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 단순 equality 조건 추가
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// 값 중 하나라도 null인지
    ///
    /// null 값을 가진 링크는 따라가지 않습니다.
    pub fn has_null(&self) -> bool {
        self.0.values().any(Value::is_null)
    }

    /// 행 데이터가 조건을 만족하는지 (SQL 등치 의미론)
    ///
    /// 행에 없는 컬럼은 null로 취급합니다. 숫자는 값으로 비교합니다 (`1 = 1.0`).
    pub fn matches(&self, data: &RowData) -> bool {
        self.0.iter().all(|(column, expected)| {
            let actual = data.get(column).unwrap_or(&Value::Null);
            match expected {
                Value::Null => actual.is_null(),
                _ => values_equal(actual, expected),
            }
        })
    }

    /// 조건 파싱 및 검증
    ///
    /// 테이블 컬럼 목록과 대조하여 유효성을 검사합니다.
    pub fn validate(&self, allowed_columns: &[&str]) -> Result<(), WhereValidationError> {
        for key in self.0.keys() {
            if !allowed_columns.contains(&key.as_str()) {
                return Err(WhereValidationError::UnknownColumn(key.clone()));
            }
        }

        Ok(())
    }

    /// `column=value` 형식 파싱
    ///
    /// 값은 `null`, `true`/`false`, 숫자, JSON 문자열(`"..."`) 순으로 해석하고
    /// 나머지는 그대로 문자열이 됩니다.
    pub fn parse_pair(pair: &str) -> Result<(String, Value), WhereValidationError> {
        let (column, raw) = pair
            .split_once('=')
            .ok_or_else(|| WhereValidationError::InvalidPair(pair.to_string()))?;

        let column = column.trim();
        if column.is_empty() {
            return Err(WhereValidationError::InvalidPair(pair.to_string()));
        }

        Ok((column.to_string(), parse_scalar(raw)))
    }
}

impl FromIterator<(String, Value)> for WhereClause {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn parse_scalar(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => actual == expected,
    }
}

/// WHERE 검증 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WhereValidationError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("invalid condition '{0}', expected COLUMN=VALUE")]
    InvalidPair(String),
}
