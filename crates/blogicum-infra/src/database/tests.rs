use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction, Value};
use uuid::Uuid;

use crate::database::entity::{category, comment, location, post, user};
use crate::database::postgres_repo::{
    PostgresCommentRepository, PostgresPostRepository, PostgresUserRepository,
};
use blogicum_core::domain::{Post, User};
use blogicum_core::error::RepoError;
use blogicum_core::ports::{BaseRepository, CommentRepository, PostRepository, UserRepository};
use blogicum_core::query::{PageRequest, PostFilter, PostOrder};

fn user_model(username: &str) -> user::Model {
    let now = Utc::now();
    user::Model {
        id: Uuid::new_v4(),
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        first_name: "Lev".to_owned(),
        last_name: String::new(),
        password_hash: "hash".to_owned(),
        is_staff: false,
        date_joined: now.into(),
        updated_at: now.into(),
    }
}

fn post_model(author_id: Uuid, title: &str, days_ago: i64) -> post::Model {
    let now = Utc::now();
    post::Model {
        id: Uuid::new_v4(),
        author_id,
        title: title.to_owned(),
        text: "Content".to_owned(),
        pub_date: (now - Duration::days(days_ago)).into(),
        is_published: true,
        category_id: None,
        location_id: None,
        image: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

fn count_row(total: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(total)))])
}

fn comment_count_row(post_id: Uuid, count: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([
        ("post_id", Value::Uuid(Some(Box::new(post_id)))),
        ("comment_count", Value::BigInt(Some(count))),
    ])
}

fn statement_sql(log: &[Transaction], index: usize) -> String {
    log[index].statements()[0].sql.clone()
}

#[tokio::test]
async fn test_find_post_by_id() {
    let author_id = Uuid::new_v4();
    let model = post_model(author_id, "Test Post", 0);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model.clone()]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(model.id).await.unwrap();

    let post = result.expect("post should be found");
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, model.id);
    assert_eq!(post.author_id, author_id);
}

#[tokio::test]
async fn test_find_user_by_username() {
    let model = user_model("tolstoy");
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model.clone()]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let user = repo.find_by_username("tolstoy").await.unwrap().unwrap();

    assert_eq!(user.id, model.id);
    assert_eq!(user.display_name(), "Lev");
}

#[tokio::test]
async fn test_save_user_returns_stored_row() {
    let model = user_model("chekhov");
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model.clone()]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let user: User = model.clone().into();
    let saved: User = repo.save(user).await.unwrap();

    assert_eq!(saved.username, "chekhov");
    assert_eq!(saved.id, model.id);
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result = BaseRepository::<Post, Uuid>::delete(&repo, Uuid::new_v4()).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_published_listing_applies_gate_and_counts_comments() {
    let author = user_model("tolstoy");
    let older = post_model(author.id, "Older", 2);
    let newer = post_model(author.id, "Newer", 1);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row(2)]])
        .append_query_results(vec![vec![older.clone(), newer.clone()]])
        .append_query_results(vec![vec![author.clone()]])
        .append_query_results(vec![Vec::<category::Model>::new()])
        .append_query_results(vec![Vec::<location::Model>::new()])
        .append_query_results(vec![vec![comment_count_row(older.id, 3)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let page = repo
        .list(
            &PostFilter::published(Utc::now()),
            PostOrder::PublishedAsc,
            PageRequest::first(10),
        )
        .await
        .unwrap();

    assert_eq!(page.total_items, 2);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].post.id, older.id);
    assert_eq!(page.items[0].comment_count, 3);
    assert_eq!(page.items[1].comment_count, 0);
    assert_eq!(page.items[1].author.username, "tolstoy");

    let log = repo.db.into_transaction_log();
    let listing = statement_sql(&log, 1);
    assert!(listing.contains(r#"LEFT JOIN "categories""#), "{listing}");
    assert!(
        listing.contains(
            r#""posts"."is_published" = $1 AND "posts"."pub_date" <= $2 AND ("posts"."category_id" IS NULL OR "categories"."is_published" = $3)"#
        ),
        "{listing}"
    );
    assert!(
        listing.contains(r#"ORDER BY "posts"."pub_date" ASC, "posts"."created_at" ASC"#),
        "{listing}"
    );
    assert!(listing.contains("LIMIT"), "{listing}");

    let counts = statement_sql(&log, 5);
    assert!(counts.contains(r#"GROUP BY "comments"."post_id""#), "{counts}");
}

#[tokio::test]
async fn test_author_listing_is_newest_first_without_gate() {
    let author = user_model("tolstoy");

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row(0)]])
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let page = repo
        .list(
            &PostFilter::all().by_author(author.id),
            PostOrder::PublishedDesc,
            PageRequest::first(10),
        )
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total_pages, 1);

    let log = repo.db.into_transaction_log();
    let listing = statement_sql(&log, 1);
    assert!(listing.contains(r#""posts"."author_id" = $1"#), "{listing}");
    assert!(!listing.contains(r#""posts"."is_published""#), "{listing}");
    assert!(
        listing.contains(r#"ORDER BY "posts"."pub_date" DESC, "posts"."created_at" DESC"#),
        "{listing}"
    );
}

#[tokio::test]
async fn test_listing_past_last_page_stops_after_count() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row(5)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result = repo
        .list(
            &PostFilter::published(Utc::now()),
            PostOrder::PublishedAsc,
            PageRequest::new(2, 10),
        )
        .await;

    assert!(matches!(result, Err(RepoError::NotFound)));
    assert_eq!(repo.db.into_transaction_log().len(), 1);
}

#[tokio::test]
async fn test_comments_listed_oldest_first_with_authors() {
    let author = user_model("chekhov");
    let post_id = Uuid::new_v4();
    let now = Utc::now();
    let first = comment::Model {
        id: Uuid::new_v4(),
        post_id,
        author_id: author.id,
        text: "first".to_owned(),
        created_at: (now - Duration::hours(1)).into(),
    };
    let second = comment::Model {
        id: Uuid::new_v4(),
        text: "second".to_owned(),
        created_at: now.into(),
        ..first.clone()
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![
            (first.clone(), author.clone()),
            (second.clone(), author.clone()),
        ]])
        .into_connection();

    let repo = PostgresCommentRepository::new(db);
    let comments = repo.list_for_post(post_id).await.unwrap();

    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].comment.text, "first");
    assert_eq!(comments[1].author.username, "chekhov");

    let log = repo.db.into_transaction_log();
    let sql = statement_sql(&log, 0);
    assert!(sql.contains(r#""comments"."post_id" = $1"#), "{sql}");
    assert!(sql.contains(r#"ORDER BY "comments"."created_at" ASC"#), "{sql}");
}
