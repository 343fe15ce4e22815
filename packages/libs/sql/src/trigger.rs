//! 트리거 정의
//!
//! 덤프 파일에 그대로 붙일 수 있도록 구분자(delimiter)를 감싼 SQL을 만듭니다.

use serde::Serialize;

/// 트리거
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trigger {
    name: String,
    sql: String,
    delimiter: String,
}

impl Trigger {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let delimiter = choose_delimiter(&sql);
        Self {
            name: name.into(),
            sql,
            delimiter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 원본 CREATE TRIGGER 문
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// 트리거 본문에 나타나지 않는 가장 짧은 `$` 반복
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// `delimiter X` / 본문 / `delimiter ;`
    pub fn to_sql(&self) -> String {
        format!("delimiter {}\n{}\ndelimiter ;", self.delimiter, self.sql)
    }
}

fn choose_delimiter(sql: &str) -> String {
    let mut delimiter = String::from("$");
    while sql.contains(delimiter.as_str()) {
        delimiter.push('$');
    }
    delimiter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_grows() {
        assert_eq!(Trigger::new("t", "BEGIN END").delimiter(), "$");
        assert_eq!(Trigger::new("t", "SET @a = '$';").delimiter(), "$$");
        assert_eq!(Trigger::new("t", "SELECT '$$$' , '$'").delimiter(), "$$$$");
    }

    #[test]
    fn test_to_sql() {
        let trigger = Trigger::new(
            "users_touch",
            "CREATE TRIGGER users_touch BEFORE UPDATE ON USERS FOR EACH ROW SET NEW.email = LOWER(NEW.email)",
        );

        assert_eq!(
            trigger.to_sql(),
            "delimiter $\n\
             CREATE TRIGGER users_touch BEFORE UPDATE ON USERS FOR EACH ROW SET NEW.email = LOWER(NEW.email)\n\
             delimiter ;"
        );
    }
}
