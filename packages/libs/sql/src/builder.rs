//! 조회 SQL 빌더
//!
//! 링크 조건(`WhereClause`)을 받아 `SELECT * FROM ... WHERE ...`를 생성합니다.
//! SeaQuery를 사용하여 식별자 인용과 값 이스케이프를 처리합니다.

use sea_query::{Asterisk, Expr, Iden, MysqlQueryBuilder, Query, SelectStatement, SimpleExpr, SqliteQueryBuilder};
use serde_json::Value;

use subset_core::WhereClause;

use crate::engine::Engine;
use crate::value::bytes_from_json;

/// 동적 테이블/컬럼 식별자
#[derive(Debug, Clone)]
struct DynIden(String);

impl Iden for DynIden {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let _ = s.write_str(&self.0);
    }
}

/// SELECT 쿼리 빌더
pub struct SelectBuilder<'a> {
    table_name: &'a str,
}

impl<'a> SelectBuilder<'a> {
    /// 새 빌더 생성
    pub fn new(table_name: &'a str) -> Self {
        Self { table_name }
    }

    /// SeaQuery 문장 생성
    ///
    /// null 값은 `IS NULL`, 그 외에는 `=`. 빈 조건이면 WHERE 절이 없습니다.
    pub fn statement(&self, filter: &WhereClause) -> SelectStatement {
        let mut query = Query::select();
        query
            .column(Asterisk)
            .from(DynIden(self.table_name.to_string()));

        for (column, value) in filter.iter() {
            let col = Expr::col(DynIden(column.clone()));
            match value {
                Value::Null => query.and_where(col.is_null()),
                _ => query.and_where(col.eq(value_to_expr(value))),
            };
        }

        query
    }

    /// 엔진 방언으로 SQL 생성 (값은 리터럴로 인라인)
    pub fn build(&self, filter: &WhereClause, engine: Engine) -> String {
        let query = self.statement(filter);
        match engine {
            Engine::Sqlite => query.to_string(SqliteQueryBuilder),
            Engine::MySql => query.to_string(MysqlQueryBuilder),
        }
    }
}

fn value_to_expr(value: &Value) -> SimpleExpr {
    match value {
        Value::Null => Expr::val(Option::<String>::None).into(),
        Value::Bool(b) => Expr::val(*b).into(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Expr::val(i).into()
            } else if let Some(u) = n.as_u64() {
                Expr::val(u).into()
            } else if let Some(f) = n.as_f64() {
                Expr::val(f).into()
            } else {
                Expr::val(n.to_string()).into()
            }
        }
        Value::String(s) => Expr::val(s.as_str()).into(),
        Value::Object(_) => match bytes_from_json(value) {
            Some(bytes) => Expr::val(bytes).into(),
            None => Expr::val(value.to_string()).into(),
        },
        // JSON 컬럼 비교용 직렬화
        Value::Array(_) => Expr::val(value.to_string()).into(),
    }
}
