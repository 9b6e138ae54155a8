//! End-to-end tests for an entity graph: install, cascading insert, update,
//! joined reads and refresh, against the scripted connection.

use arkorm::{
    Collection, ColumnDef, DefaultValue, Entity, EntityState, Filter, MockConnection, Model, Row,
    Schema, SlotDef, ValidationCode, Value, register_schema,
};

static PUBLISHERS: Schema = Schema::new(
    "publishers",
    &[
        SlotDef::Column(ColumnDef::int("id").auto_increment()),
        SlotDef::Column(ColumnDef::varchar("name", 128).with_label("Publisher").required()),
    ],
);

static AUTHORS: Schema = Schema::new(
    "authors",
    &[
        SlotDef::Column(ColumnDef::int("id").auto_increment()),
        SlotDef::Column(ColumnDef::varchar("name", 128).with_label("Name").required()),
        SlotDef::Column(
            ColumnDef::varchar("email", 255)
                .with_label("Email")
                .validate(r"^[^@\s]+@[^@\s]+$"),
        ),
    ],
);

static BOOKS: Schema = Schema::new(
    "books",
    &[
        SlotDef::Column(ColumnDef::int("id").auto_increment()),
        SlotDef::Column(ColumnDef::varchar("title", 255).with_label("Title").required()),
        SlotDef::Column(ColumnDef::boolean("in_print").with_default(DefaultValue::Int(1))),
        SlotDef::Column(ColumnDef::timestamp("published_at").with_label("Published")),
        SlotDef::Column(ColumnDef::int("author_id").references("author", "id")),
        SlotDef::Column(ColumnDef::int("publisher_id").references("publisher", "id")),
        SlotDef::Nested {
            name: "author",
            schema: &AUTHORS,
        },
        SlotDef::Nested {
            name: "publisher",
            schema: &PUBLISHERS,
        },
    ],
);

register_schema!(BOOKS);
register_schema!(AUTHORS);
register_schema!(PUBLISHERS);

struct Book;

impl Model for Book {
    const SCHEMA: &'static Schema = &BOOKS;
}

fn draft_book() -> Entity {
    let mut book = Entity::new(&BOOKS);
    book.set("title", "The Left Hand of Darkness").unwrap();
    book.set("published_at", 0).unwrap();
    book.set_path("author.name", "Ursula").unwrap();
    book.set_path("author.email", "ursula@example.org").unwrap();
    book.set_path("publisher.name", "Ace").unwrap();
    book
}

#[tokio::test]
async fn install_all_creates_missing_tables() {
    let conn = MockConnection::new();
    for schema in arkorm::registry::schemas() {
        if schema.table == "authors" {
            conn.push_rows(vec![Row::new().with("Tables_in_library", "authors")]);
        } else {
            conn.push_rows(vec![]);
            conn.push_affected(0);
        }
    }

    let created = arkorm::registry::install_all(&conn).await.unwrap();

    assert_eq!(created, vec!["books", "publishers"]);
    let create_books = conn
        .sql_log()
        .into_iter()
        .find(|sql| sql.starts_with("CREATE TABLE `books`"))
        .unwrap();
    assert!(create_books.contains("`in_print` TINYINT(1) NOT NULL DEFAULT 1"), "{create_books}");
    assert!(create_books.contains("PRIMARY KEY `id` (`id`)"), "{create_books}");
    assert!(create_books.contains("KEY `author_id` (`author_id`)"), "{create_books}");
}

#[tokio::test]
async fn insert_then_update_graph() {
    let conn = MockConnection::new().with_first_insert_id(100);
    let mut books = Collection::for_model::<Book>(&conn);

    let mut book = draft_book();
    assert!(book.validate().is_empty());
    assert!(books.insert(&mut book).await.unwrap());

    // author 100, publisher 101, book 102
    assert_eq!(book.get("author_id").unwrap(), &Value::Int(100));
    assert_eq!(book.get("publisher_id").unwrap(), &Value::Int(101));
    assert_eq!(book.get("id").unwrap(), &Value::Int(102));
    assert_eq!(book.state(), EntityState::Synced);
    assert_eq!(conn.statements().len(), 3);

    conn.clear();
    book.set_path("publisher.name", "Gollancz").unwrap();
    assert_eq!(book.state(), EntityState::Modified);
    assert!(books.update_entity(&mut book).await.unwrap());

    let sql = conn.sql_log();
    assert_eq!(sql, vec!["UPDATE `publishers` SET `name` = ? WHERE `id` = ?"]);
    assert_eq!(book.state(), EntityState::Synced);

    // A second insert of the same graph does nothing.
    assert!(!books.insert(&mut book).await.unwrap());
    assert_eq!(conn.statements().len(), 1);
}

#[tokio::test]
async fn find_binds_nested_entities() {
    let conn = MockConnection::new();
    conn.push_rows(vec![
        Row::new()
            .with("id", 7)
            .with("title", "Dune")
            .with("in_print", "0")
            .with("published_at", "1965-08-01")
            .with("author_id", 3)
            .with("publisher_id", 4)
            .with("author.id", 3)
            .with("author.name", "Frank")
            .with("author.email", Value::Null)
            .with("publisher.id", 4)
            .with("publisher.name", "Chilton"),
    ]);
    let mut books = Collection::for_table(&conn, "books").unwrap();

    let found = books
        .find(&Filter::new().eq("author.name", "Frank").eq("in_print", false))
        .await
        .unwrap();

    assert_eq!(
        conn.sql_log()[0],
        "SELECT `books`.*, `author`.`id` AS `author.id`, `author`.`name` AS `author.name`, \
         `author`.`email` AS `author.email`, `publisher`.`id` AS `publisher.id`, \
         `publisher`.`name` AS `publisher.name` FROM `books` \
         INNER JOIN `authors` AS `author` ON `books`.`author_id` = `author`.`id` \
         INNER JOIN `publishers` AS `publisher` ON `books`.`publisher_id` = `publisher`.`id` \
         WHERE `author`.`name` = ? AND `books`.`in_print` = ?"
    );

    let book = &found[0];
    assert_eq!(book.state(), EntityState::Synced);
    assert_eq!(book.get("in_print").unwrap(), &Value::Bool(false));
    assert_eq!(book.field("published_at").unwrap().format(), "08/01/1965");
    assert_eq!(book.get_path("publisher.name").unwrap(), &Value::from("Chilton"));
    assert_eq!(book.get_path("author.email").unwrap(), &Value::Null);

    let json = book.to_json();
    assert_eq!(json["author"]["name"], "Frank");
    assert_eq!(json["id"], 7);
}

#[tokio::test]
async fn count_and_delete_with_nested_filter() {
    let conn = MockConnection::new();
    conn.push_rows(vec![Row::new().with("COUNT(*)", 2)]);
    conn.push_affected(2);
    let mut books = Collection::for_model::<Book>(&conn);
    let filter = Filter::new().eq("publisher.name", "Ace");

    assert_eq!(books.count(&filter).await.unwrap(), 2);
    assert_eq!(books.delete(&filter).await.unwrap(), 2);

    let sql = conn.sql_log();
    assert!(sql[0].starts_with("SELECT COUNT(*) FROM `books` INNER JOIN"));
    assert!(sql[1].starts_with("DELETE `books` FROM `books` INNER JOIN"));
    assert!(sql[1].ends_with("WHERE `publisher`.`name` = ?"));
}

#[tokio::test]
async fn refresh_detects_deleted_rows() {
    let conn = MockConnection::new();
    let mut books = Collection::for_model::<Book>(&conn);

    let mut book = draft_book();
    books.insert(&mut book).await.unwrap();
    assert_eq!(book.state(), EntityState::Synced);

    // The next query returns no rows: the book is gone.
    books.refresh_state(&mut book).await.unwrap();
    assert_eq!(book.state(), EntityState::New);
}

#[test]
fn validation_reports_nested_paths() {
    let mut book = Entity::new(&BOOKS);
    book.set_path("author.name", "Ursula").unwrap();
    book.set_path("author.email", "not-an-email").unwrap();

    let errors = book.validate();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["title", "author.email", "publisher.name"]);
    assert_eq!(errors.iter().next().unwrap().code, ValidationCode::Required);
    assert_eq!(
        errors.iter().nth(1).unwrap().message,
        "not-an-email is not a valid Email."
    );
}
