//! Database entities module

pub mod article;
pub mod article_tag;
pub mod author;
pub mod tag;

pub use article::Entity as Article;
pub use article_tag::Entity as ArticleTag;
pub use author::Entity as Author;
pub use tag::Entity as Tag;
