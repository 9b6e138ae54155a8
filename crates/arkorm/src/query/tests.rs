use super::*;
use crate::mock::MockConnection;

#[test]
fn test_simple_select() {
    let mut q = Query::new();
    q.find().from("users");
    let stmt = q.compile().unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM `users`");
    assert!(stmt.params.is_empty());
}

#[test]
fn test_select_fields() {
    let mut q = Query::new();
    q.find().from("users").fields(["id", "users.name", "COUNT(*)"]);
    assert_eq!(
        q.compile().unwrap().sql,
        "SELECT `id`, `users`.`name`, COUNT(*) FROM `users`"
    );
}

#[test]
fn test_where_conditions() {
    let mut q = Query::new();
    q.find()
        .from("users")
        .where_eq("status", "active")
        .where_with("age", 18, Op::Gte, Conjunction::And)
        .where_with("name", "A%", Op::NotLike, Conjunction::Or);
    let stmt = q.compile().unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT * FROM `users` WHERE `status` = ? AND `age` >= ? OR `name` NOT LIKE ?"
    );
    assert_eq!(
        stmt.params,
        vec![Value::from("active"), Value::from(18), Value::from("A%")]
    );
}

#[test]
fn test_group_is_parenthesized() {
    let mut q = Query::new();
    q.find()
        .from("t")
        .where_eq("a", 1)
        .group(Conjunction::Or)
        .where_eq("b", 2)
        .where_eq("c", 3);
    let stmt = q.compile().unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT * FROM `t` WHERE `a` = ? AND (`b` = ? OR `c` = ?)"
    );
    assert_eq!(stmt.params, vec![Value::from(1), Value::from(2), Value::from(3)]);
}

#[test]
fn test_group_closed_by_second_marker() {
    let mut q = Query::new();
    q.find()
        .from("t")
        .group(Conjunction::Or)
        .where_eq("a", 1)
        .where_eq("b", 2)
        .group(Conjunction::Or)
        .where_eq("c", 3);
    assert_eq!(
        q.compile().unwrap().sql,
        "SELECT * FROM `t` WHERE (`a` = ? OR `b` = ?) AND `c` = ?"
    );
}

#[test]
fn test_group_joined_by_first_predicate_conjunction() {
    let mut q = Query::new();
    q.find()
        .from("t")
        .where_eq("a", 1)
        .group(Conjunction::And)
        .where_with("b", 2, Op::Eq, Conjunction::Or)
        .where_eq("c", 3);
    assert_eq!(
        q.compile().unwrap().sql,
        "SELECT * FROM `t` WHERE `a` = ? OR (`b` = ? AND `c` = ?)"
    );
}

#[test]
fn test_empty_group_is_skipped() {
    let mut q = Query::new();
    q.find()
        .from("t")
        .where_eq("a", 1)
        .group(Conjunction::Or)
        .group(Conjunction::Or);
    assert_eq!(q.compile().unwrap().sql, "SELECT * FROM `t` WHERE `a` = ?");
}

#[test]
fn test_clause_order() {
    let mut q = Query::new();
    q.find()
        .from("users")
        .join("addresses", "users.address_id", "addresses.id", JoinType::Inner)
        .where_eq("users.name", "Ann")
        .sort("users.name", true)
        .sort("id", false)
        .limit(10)
        .offset(20);
    assert_eq!(
        q.compile().unwrap().sql,
        "SELECT * FROM `users` INNER JOIN `addresses` ON `users`.`address_id` = `addresses`.`id` \
         WHERE `users`.`name` = ? ORDER BY `users`.`name` ASC, `id` DESC LIMIT 10 OFFSET 20"
    );
}

#[test]
fn test_join_with_alias() {
    let mut q = Query::new();
    q.find().from("users").join_as(
        "addresses",
        "address",
        "`users`.`address_id`",
        "`address`.`id`",
        JoinType::Left,
    );
    assert_eq!(
        q.compile().unwrap().sql,
        "SELECT * FROM `users` LEFT JOIN `addresses` AS `address` ON `users`.`address_id` = `address`.`id`"
    );
}

#[test]
fn test_count() {
    let mut q = Query::new();
    q.count().from("users").where_eq("age", 30);
    assert_eq!(
        q.compile().unwrap().sql,
        "SELECT COUNT(*) FROM `users` WHERE `age` = ?"
    );
}

#[test]
fn test_delete() {
    let mut q = Query::new();
    q.delete().from("users").where_eq("id", 7);
    assert_eq!(q.compile().unwrap().sql, "DELETE FROM `users` WHERE `id` = ?");

    q.delete()
        .from("users")
        .join("addresses", "users.address_id", "addresses.id", JoinType::Inner)
        .where_eq("addresses.city", "Oslo");
    assert_eq!(
        q.compile().unwrap().sql,
        "DELETE `users` FROM `users` INNER JOIN `addresses` ON `users`.`address_id` = `addresses`.`id` \
         WHERE `addresses`.`city` = ?"
    );
}

#[test]
fn test_insert() {
    let mut q = Query::new();
    q.insert_into(
        "users",
        [("name", Value::from("Ann")), ("age", Value::from(30))],
    );
    let stmt = q.compile().unwrap();
    assert_eq!(stmt.kind, StatementKind::Insert);
    assert_eq!(stmt.sql, "INSERT INTO `users` (`name`, `age`) VALUES (?, ?)");
    assert_eq!(stmt.params, vec![Value::from("Ann"), Value::from(30)]);
}

#[test]
fn test_insert_empty_payload_uses_defaults() {
    let mut q = Query::new();
    q.insert_into("tags", Vec::<(String, Value)>::new());
    let stmt = q.compile().unwrap();
    assert_eq!(stmt.sql, "INSERT INTO `tags` () VALUES ()");
    assert!(stmt.params.is_empty());
}

#[test]
fn test_update_set_values_precede_where_values() {
    let mut q = Query::new();
    q.update("users")
        .set("name", "Bob")
        .set("age", 31)
        .set("name", "Bobby")
        .where_eq("id", 1);
    let stmt = q.compile().unwrap();
    assert_eq!(stmt.sql, "UPDATE `users` SET `name` = ?, `age` = ? WHERE `id` = ?");
    assert_eq!(
        stmt.params,
        vec![Value::from("Bobby"), Value::from(31), Value::from(1)]
    );
}

#[test]
fn test_update_without_assignments_is_build_error() {
    let mut q = Query::new();
    q.update("users").where_eq("id", 1);
    assert!(q.compile().unwrap_err().is_build_error());
}

#[test]
fn test_missing_table_is_build_error() {
    let mut q = Query::new();
    q.find();
    assert!(q.compile().unwrap_err().is_build_error());
}

#[test]
fn test_create_table() {
    let mut q = Query::new();
    q.create_table("users")
        .add_column(ColumnDescriptor::new("id", "INT").size(11).auto_increment())
        .add_column(ColumnDescriptor::new("email", "VARCHAR").size(255).unique())
        .add_column(ColumnDescriptor::new("bio", "TEXT").nullable().no_index())
        .add_column(ColumnDescriptor::new("age", "INT").size(11).default_value(0))
        .add_column(
            ColumnDescriptor::new("role", "VARCHAR")
                .size(16)
                .default_value("member"),
        );
    let stmt = q.compile().unwrap();
    assert_eq!(stmt.kind, StatementKind::CreateTable);
    assert_eq!(
        stmt.sql,
        "CREATE TABLE `users` (\n\
         `id` INT(11) NOT NULL AUTO_INCREMENT,\n\
         `email` VARCHAR(255) NOT NULL,\n\
         `bio` TEXT,\n\
         `age` INT(11) NOT NULL DEFAULT 0,\n\
         `role` VARCHAR(16) NOT NULL DEFAULT 'member',\n\
         PRIMARY KEY `id` (`id`),\n\
         UNIQUE KEY `email` (`email`),\n\
         KEY `age` (`age`),\n\
         KEY `role` (`role`)\n\
         )"
    );
}

#[test]
fn test_create_table_composite_primary_key() {
    let mut q = Query::new();
    q.create_table("memberships")
        .add_column(ColumnDescriptor::new("user_id", "INT").primary_key())
        .add_column(ColumnDescriptor::new("group_id", "INT").primary_key());
    let sql = q.compile().unwrap().sql;
    assert!(sql.contains("PRIMARY KEY (`user_id`, `group_id`)"));
    assert!(!sql.contains("KEY `user_id`"));
}

#[test]
fn test_create_table_without_columns_is_build_error() {
    let mut q = Query::new();
    q.create_table("empty");
    assert!(q.compile().unwrap_err().is_build_error());
}

#[test]
fn test_reset_is_idempotent() {
    let mut q = Query::with_escape_mode(EscapeMode::Verbatim);
    q.find().from("users").where_eq("a", 1).limit(3);
    q.reset().reset();
    assert!(q.conditions().is_empty());
    assert!(q.joins().is_empty());
    assert_eq!(q.table(), None);
    assert_eq!(q.kind(), StatementKind::Select);
    assert_eq!(q.escape_mode(), EscapeMode::Verbatim);
}

#[test]
fn test_statement_carries_escape_mode() {
    let mut q = Query::with_escape_mode(EscapeMode::Verbatim);
    q.find().from("t").where_eq("a", "x'y");
    let stmt = q.compile().unwrap();
    assert_eq!(stmt.to_literal_sql(), "SELECT * FROM `t` WHERE `a` = 'x'y'");
}

#[tokio::test]
async fn test_execute_select_returns_empty_rows() {
    let conn = MockConnection::new();
    let mut q = Query::new();
    q.find().from("users");
    let out = q.execute(&conn).await.unwrap();
    assert_eq!(out, QueryOutput::Rows(Vec::new()));
    assert_eq!(conn.statements().len(), 1);
}

#[tokio::test]
async fn test_execute_write_returns_affected() {
    let conn = MockConnection::new();
    conn.push_affected(3);
    let mut q = Query::new();
    q.delete().from("users").where_eq("age", 30);
    let out = q.execute(&conn).await.unwrap();
    assert_eq!(out.affected(), 3);
}

#[tokio::test]
async fn test_table_exists() {
    let conn = MockConnection::new();
    let q = Query::new();

    assert!(!q.table_exists(&conn, "users").await.unwrap());

    conn.push_rows(vec![Row::new().with("Tables_in_app", "users")]);
    assert!(q.table_exists(&conn, "users").await.unwrap());

    conn.push_rows(vec![
        Row::new().with("Tables_in_app", "users"),
        Row::new().with("Tables_in_app", "users_old"),
    ]);
    let err = q.table_exists(&conn, "users%").await.unwrap_err();
    assert!(err.is_build_error());

    let sent = conn.statements();
    assert_eq!(sent[0].sql, "SHOW TABLES LIKE ?");
    assert_eq!(sent[0].params, vec![Value::from("users")]);
}

#[tokio::test]
async fn test_drop_table() {
    let conn = MockConnection::new();
    let mut q = Query::new();
    q.drop_table(&conn, "users").await.unwrap();
    assert_eq!(conn.statements()[0].sql, "DROP TABLE `users`");
}

#[tokio::test]
async fn test_connection_errors_propagate() {
    let conn = MockConnection::new();
    conn.push_error(OrmError::query("SELECT", "server has gone away"));
    let mut q = Query::new();
    q.find().from("users");
    let err = q.execute(&conn).await.unwrap_err();
    assert!(err.is_connection_error());
}
