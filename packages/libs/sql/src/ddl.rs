//! CREATE TABLE 해석
//!
//! sqlparser AST를 `TableDescription`으로 좁힙니다. 탐색에 필요한 정보만 남깁니다.
//!
//! - 컬럼: 이름, NOT NULL 여부, 컬럼 레벨 PRIMARY KEY/UNIQUE 여부
//! - 테이블 제약조건: PRIMARY KEY, UNIQUE, FOREIGN KEY (나머지는 버림)
//! - 컬럼 레벨 `REFERENCES`는 단일 컬럼 FOREIGN KEY로 변환되어 테이블 제약조건 뒤에 붙음

use sqlparser::ast::{ColumnDef, ColumnOption, ColumnOptionDef, CreateTable, Ident, ObjectName, Statement, TableConstraint};
use sqlparser::parser::Parser;

use subset_core::schema::{ColumnDescription, ConstraintDescription, CreateDefinition, TableDescription};
use subset_core::Error;

use crate::engine::Engine;

/// CREATE TABLE 문 하나를 해석
///
/// 여러 문장이 있으면 첫 번째만 사용합니다.
pub fn parse_table_definition(sql: &str, engine: Engine) -> subset_core::Result<TableDescription> {
    let dialect = engine.dialect();
    let statements = Parser::parse_sql(dialect.as_ref(), sql).map_err(|e| Error::SchemaParse {
        message: e.to_string(),
    })?;

    match statements.into_iter().next() {
        Some(Statement::CreateTable(create)) => Ok(describe_table(create)),
        Some(other) => Err(Error::SchemaParse {
            message: format!("expected CREATE TABLE, got: {}", summary(&other.to_string())),
        }),
        None => Err(Error::SchemaParse {
            message: "empty table definition".to_string(),
        }),
    }
}

fn describe_table(create: CreateTable) -> TableDescription {
    let CreateTable {
        name,
        columns,
        constraints,
        ..
    } = create;

    let mut definitions = Vec::with_capacity(columns.len() + constraints.len());
    let mut inline_references = Vec::new();

    for column in columns {
        let (description, reference) = describe_column(column);
        definitions.push(CreateDefinition::Column(description));
        inline_references.extend(reference);
    }

    definitions.extend(
        constraints
            .into_iter()
            .filter_map(describe_constraint)
            .map(CreateDefinition::Constraint),
    );
    definitions.extend(inline_references.into_iter().map(CreateDefinition::Constraint));

    TableDescription {
        name: object_name(&name),
        definitions,
    }
}

fn describe_column(column: ColumnDef) -> (ColumnDescription, Option<ConstraintDescription>) {
    let mut description = ColumnDescription::new(column.name.value.clone());
    let mut reference = None;

    for ColumnOptionDef { option, .. } in column.options {
        match option {
            ColumnOption::Null => description.nullable = true,
            ColumnOption::NotNull => description.nullable = false,
            ColumnOption::Unique { is_primary, .. } => {
                description.unique_or_primary = true;
                if is_primary {
                    description.nullable = false;
                }
            }
            ColumnOption::ForeignKey {
                foreign_table,
                referred_columns,
                ..
            } => {
                reference = Some(ConstraintDescription::ForeignKey {
                    columns: vec![column.name.value.clone()],
                    foreign_table: object_name(&foreign_table),
                    referred_columns: idents(referred_columns),
                });
            }
            _ => {}
        }
    }

    (description, reference)
}

fn describe_constraint(constraint: TableConstraint) -> Option<ConstraintDescription> {
    match constraint {
        TableConstraint::PrimaryKey { columns, .. } => Some(ConstraintDescription::PrimaryKey {
            columns: idents(columns),
        }),
        TableConstraint::Unique { columns, .. } => Some(ConstraintDescription::Unique {
            columns: idents(columns),
        }),
        TableConstraint::ForeignKey {
            columns,
            foreign_table,
            referred_columns,
            ..
        } => Some(ConstraintDescription::ForeignKey {
            columns: idents(columns),
            foreign_table: object_name(&foreign_table),
            referred_columns: idents(referred_columns),
        }),
        _ => None,
    }
}

/// 스키마 한정자(`db.table`)는 버리고 마지막 이름만 사용
fn object_name(name: &ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .unwrap_or_default()
}

fn idents(idents: Vec<Ident>) -> Vec<String> {
    idents.into_iter().map(|ident| ident.value).collect()
}

fn summary(sql: &str) -> String {
    const MAX: usize = 60;
    match sql.char_indices().nth(MAX) {
        Some((end, _)) => format!("{}...", &sql[..end]),
        None => sql.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subset_core::schema::IdentityKey;
    use subset_core::Table;

    #[test]
    fn test_parse_mysql_table() {
        let sql = "CREATE TABLE TEST (
            id INT(6) UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            firstname VARCHAR(30) NOT NULL,
            XPersonID INT(6),
            email VARCHAR(50),
            reg_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
            FOREIGN KEY (XPersonID) REFERENCES Persons(PersonID)
        )";

        let table = Table::new(parse_table_definition(sql, Engine::MySql).unwrap());

        assert_eq!(table.name(), "TEST");
        assert_eq!(table.columns().len(), 5);
        assert_eq!(table.constraints().len(), 1);
        assert_eq!(table.required_table_names(), &["Persons".to_string()]);
        assert_eq!(table.primary_key(), Some(&["id".to_string()][..]));
    }

    #[test]
    fn test_parse_nullability() {
        let sql = "CREATE TABLE t (a INT NOT NULL, b INT NULL, c INT, d INT PRIMARY KEY)";
        let desc = parse_table_definition(sql, Engine::Sqlite).unwrap();

        let nullable: Vec<(String, bool)> = desc
            .definitions
            .iter()
            .filter_map(|d| match d {
                CreateDefinition::Column(c) => Some((c.name.clone(), c.nullable)),
                _ => None,
            })
            .collect();
        assert_eq!(
            nullable,
            vec![
                ("a".to_string(), false),
                ("b".to_string(), true),
                ("c".to_string(), true),
                ("d".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_parse_composite_foreign_key_and_unique() {
        let sql = "CREATE TABLE `SECOND_TABLE` (
            `id` INT NOT NULL,
            `xfirstname` VARCHAR(30),
            `xlastname` VARCHAR(30),
            PRIMARY KEY (`id`),
            UNIQUE KEY (`xfirstname`, `xlastname`),
            CONSTRAINT `fk_name` FOREIGN KEY (`xfirstname`, `xlastname`) REFERENCES `USERS` (`firstname`, `lastname`),
            FOREIGN KEY (`xlastname`) REFERENCES `USERS` (`lastname`) ON DELETE CASCADE
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4";

        let table = Table::new(parse_table_definition(sql, Engine::MySql).unwrap());

        assert_eq!(table.name(), "SECOND_TABLE");
        assert_eq!(table.identity_key(), &IdentityKey::Primary(vec!["id".to_string()]));
        assert_eq!(
            table.required_table_names(),
            &["USERS".to_string(), "USERS".to_string()]
        );
        let reference = &table.foreign_key_refs()[0];
        assert_eq!(reference.internal_columns, vec!["xfirstname", "xlastname"]);
        assert_eq!(reference.referenced_columns, vec!["firstname", "lastname"]);
    }

    #[test]
    fn test_inline_reference() {
        let sql = "CREATE TABLE posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id INTEGER NOT NULL REFERENCES users(id),
            CHECK (id > 0)
        )";

        let desc = parse_table_definition(sql, Engine::Sqlite).unwrap();
        let table = Table::new(desc);

        assert_eq!(table.constraints().len(), 1);
        assert_eq!(table.required_table_names(), &["users".to_string()]);
        assert_eq!(table.foreign_key_refs()[0].internal_columns, vec!["author_id"]);
    }

    #[test]
    fn test_qualified_table_name() {
        let sql = "CREATE TABLE shop.orders (id INT PRIMARY KEY)";
        let desc = parse_table_definition(sql, Engine::MySql).unwrap();
        assert_eq!(desc.name, "orders");
    }

    #[test]
    fn test_not_a_create_table() {
        let err = parse_table_definition("SELECT 1", Engine::Sqlite).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_PARSE_ERROR");
        assert!(err.to_string().contains("expected CREATE TABLE"));

        let err = parse_table_definition("CREATE TABLE (", Engine::Sqlite).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_PARSE_ERROR");

        let err = parse_table_definition("", Engine::Sqlite).unwrap_err();
        assert!(err.to_string().contains("empty table definition"));
    }
}
