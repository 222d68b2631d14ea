//! Demo data for the `articles` resource
//!
//! 3 authors, 3 tags and 100 articles. Every 20th article is unpublished, so
//! the published collection holds 95 rows. Every 4th article has no rating.

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, Set};
use tracing::info;

use super::entities::{article, article_tag, author, tag};

pub const DEMO_ARTICLES: i32 = 100;
const EPOCH_2024: i64 = 1_704_067_200;

/// Inserts demo rows unless the database already has authors.
///
/// Returns whether anything was inserted.
pub async fn seed_demo_data<C: ConnectionTrait>(db: &C) -> Result<bool, DbErr> {
    if author::Entity::find().count(db).await? > 0 {
        return Ok(false);
    }

    let authors = [
        ("Ada Lovelace", "ada@example.com"),
        ("Grace Hopper", "grace@example.com"),
        ("Alan Turing", "alan@example.com"),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (name, email))| author::ActiveModel {
        id: Set(i as i32 + 1),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
    });
    author::Entity::insert_many(authors).exec_without_returning(db).await?;

    let tags = ["rust", "databases", "web"]
        .into_iter()
        .enumerate()
        .map(|(i, name)| tag::ActiveModel {
            id: Set(i as i32 + 1),
            name: Set(name.to_string()),
        });
    tag::Entity::insert_many(tags).exec_without_returning(db).await?;

    let articles = (1..=DEMO_ARTICLES).map(|i| article::ActiveModel {
        id: Set(i),
        title: Set(format!("Article {:03}", i)),
        author_id: Set(i % 3 + 1),
        views: Set((i * 37) % 1000),
        rating: Set((i % 4 != 0).then_some(i % 5 + 1)),
        published: Set(i % 20 != 0),
        created_at: Set(created_at(i)),
    });
    article::Entity::insert_many(articles).exec_without_returning(db).await?;

    let links = (1..=DEMO_ARTICLES).map(|i| article_tag::ActiveModel {
        article_id: Set(i),
        tag_id: Set((i - 1) % 3 + 1),
    });
    article_tag::Entity::insert_many(links).exec_without_returning(db).await?;

    info!(articles = DEMO_ARTICLES, "Seeded demo data");
    Ok(true)
}

fn created_at(i: i32) -> DateTime<Utc> {
    DateTime::from_timestamp(EPOCH_2024 + i64::from(i) * 60, 0).unwrap_or_default()
}
