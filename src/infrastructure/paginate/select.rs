//! Applies a normalized pagination query to a SeaORM `Select`

use sea_orm::sea_query::{Alias, IntoColumnRef, NullOrdering, SimpleExpr};
use sea_orm::{
    Condition, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, JsonValue, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use tracing::{debug, warn};

use super::columns::{ColumnMap, ColumnTarget, RelationAliases};
use super::relations::RelationRegistry;
use crate::pagination::{
    PaginateConfig, PaginateDataQuery, PaginateOptions, PaginateQuery, Paginated, Paginator,
    SortDirection,
};
use crate::shared::ConfigError;

/// Unpaged reads above this many rows are logged.
const LARGE_UNPAGED_READ: u64 = 10_000;

/// Pagination for one SeaORM entity.
///
/// Built once per resource; every sortable and selectable property must be
/// mapped in the [`ColumnMap`], every joined column must belong to a
/// configured relation, and every relation must be registered in the
/// [`RelationRegistry`], otherwise construction fails.
pub struct SeaPaginator<E: EntityTrait> {
    paginator: Paginator<Condition>,
    columns: ColumnMap<E>,
    relations: RelationRegistry<E>,
    aliases: RelationAliases,
}

impl<E> SeaPaginator<E>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
{
    pub fn new(
        config: PaginateConfig<Condition>,
        options: PaginateOptions,
        columns: ColumnMap<E>,
        relations: RelationRegistry<E>,
    ) -> Result<Self, ConfigError> {
        let paginator = Paginator::new(config, options)?;
        let config = paginator.config();

        if let Some(unmapped) = config
            .sortable
            .iter()
            .flatten()
            .chain(config.default_sort_by.iter().map(|s| &s.property))
            .find(|p| !columns.contains(p))
        {
            return Err(ConfigError::InvalidSortable(unmapped.clone()));
        }

        if let Some(selection) = &config.select {
            if let Some(unmapped) = selection.fields().into_iter().find(|f| !columns.contains(f)) {
                return Err(ConfigError::InvalidSelect(unmapped.to_string()));
            }
        }

        if let Some(relation) = config
            .relations
            .iter()
            .find(|r| relations.get(&r.property).is_none())
        {
            return Err(ConfigError::InvalidRelation(format!(
                "{} is not registered",
                relation.property
            )));
        }

        // First relation configured under a property owns its columns.
        let mut aliases = RelationAliases::new();
        for resolved in config.resolved_relations() {
            aliases
                .entry(resolved.relation.property.clone())
                .or_insert_with(|| resolved.alias.to_string());
        }

        let used = config
            .sortable
            .iter()
            .flatten()
            .map(String::as_str)
            .chain(config.default_sort_by.iter().map(|s| s.property.as_str()))
            .chain(config.select.iter().flat_map(|s| s.fields()));
        for property in used {
            let Some(relation) = columns.get(property).and_then(ColumnTarget::relation) else {
                continue;
            };
            if !aliases.contains_key(relation) {
                return Err(ConfigError::InvalidRelation(format!(
                    "{} reads from relation {}, which is not configured",
                    property, relation
                )));
            }
        }

        Ok(Self {
            paginator,
            columns,
            relations,
            aliases,
        })
    }

    /// Whether `property` can be turned into an `ORDER BY` expression.
    fn orderable(&self, property: &str) -> bool {
        self.columns
            .get(property)
            .is_some_and(|target| target.expr(&self.aliases).is_some())
    }

    pub fn paginator(&self) -> &Paginator<Condition> {
        &self.paginator
    }

    /// Base filter, joins and projection. No ordering or paging.
    pub fn prepare(&self, select: Select<E>) -> Select<E> {
        let config = self.paginator.config();
        let mut select = select;

        if let Some(cond) = &config.where_clause {
            select = select.filter(cond.clone());
        }

        for resolved in config.resolved_relations() {
            let relation = resolved.relation;
            let Some(entry) = self.relations.get(&relation.property) else {
                continue;
            };
            let owner = relation
                .path
                .as_deref()
                .filter(|path| *path != config.alias);

            for step in entry.join_steps(relation.relation_type, resolved.alias, owner, relation.cond.clone()) {
                debug!(relation = %relation.property, alias = %step.alias, "Joining relation");
                select = select.join_as(step.join_type, step.def, Alias::new(step.alias.as_str()));
            }
        }

        if let Some(selection) = &config.select {
            select = select.select_only();
            for target in selection.fields().into_iter().filter_map(|f| self.columns.get(f)) {
                select = match target {
                    ColumnTarget::Root(col) => select.column(*col),
                    joined => match (joined.expr(&self.aliases), joined.select_alias(&self.aliases)) {
                        (Some(expr), Some(name)) => select.column_as(expr, name.as_str()),
                        _ => select,
                    },
                };
            }
        }

        for resolved in config.resolved_relations() {
            let relation = resolved.relation;
            if !relation.and_select {
                continue;
            }
            let Some(entry) = self.relations.get(&relation.property) else {
                continue;
            };
            for column in entry.selected_columns(relation.relation_type) {
                let expr = SimpleExpr::Column(
                    (Alias::new(resolved.alias), Alias::new(column.as_str())).into_column_ref(),
                );
                let name = format!("{}_{}", resolved.alias, column);
                select = select.column_as(expr, name.as_str());
            }
        }

        select
    }

    /// Ordering plus offset/limit for an already normalized query.
    pub fn page(&self, select: Select<E>, meta: &PaginateQuery) -> Select<E> {
        let mut select = select;

        for sort in &meta.sort_by {
            let Some(expr) = self
                .columns
                .get(&sort.property)
                .and_then(|target| target.expr(&self.aliases))
            else {
                debug!(property = %sort.property, "No column mapped for sort property, skipping");
                continue;
            };
            let order = match sort.direction {
                SortDirection::Asc => Order::Asc,
                SortDirection::Desc => Order::Desc,
            };
            select = match sort.nulls_first {
                Some(true) => select.order_by_with_nulls(expr, order, NullOrdering::First),
                Some(false) => select.order_by_with_nulls(expr, order, NullOrdering::Last),
                None => select.order_by(expr, order),
            };
        }

        if !meta.unpaged {
            select = select.offset(meta.offset).limit(meta.size);
        }

        select
    }

    /// Counts, normalizes, and fetches one page into `M`.
    pub async fn fetch<M, C>(
        &self,
        select: Select<E>,
        raw: &PaginateDataQuery,
        db: &C,
    ) -> Result<Paginated<M>, DbErr>
    where
        M: FromQueryResult + Send + Sync,
        C: ConnectionTrait,
    {
        let (select, meta) = self.plan(select, raw, db).await?;
        let data = select.into_model::<M>().all(db).await?;
        Ok(self.paginator.envelope(data, meta, raw))
    }

    /// Like [`SeaPaginator::fetch`], returning rows as JSON objects.
    pub async fn fetch_json<C>(
        &self,
        select: Select<E>,
        raw: &PaginateDataQuery,
        db: &C,
    ) -> Result<Paginated<JsonValue>, DbErr>
    where
        C: ConnectionTrait,
    {
        let (select, meta) = self.plan(select, raw, db).await?;
        let data = select.into_json().all(db).await?;
        Ok(self.paginator.envelope(data, meta, raw))
    }

    async fn plan<C>(
        &self,
        select: Select<E>,
        raw: &PaginateDataQuery,
        db: &C,
    ) -> Result<(Select<E>, PaginateQuery), DbErr>
    where
        C: ConnectionTrait,
    {
        let select = self.prepare(select);
        let total_items = select.clone().count(db).await?;
        let meta = self
            .paginator
            .normalize_with(raw, total_items, |property| self.orderable(property));
        if meta.unpaged && total_items > LARGE_UNPAGED_READ {
            warn!(total_items, path = %meta.path, "Unpaged request over a large collection");
        }
        Ok((self.page(select, &meta), meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::entities::{article, article_tag, author, tag};
    use crate::infrastructure::database::testing::seeded_db;
    use crate::pagination::{Relation, Sort};
    use sea_orm::sea_query::Expr;
    use sea_orm::{ColumnTrait, DbBackend, QueryTrait, RelationTrait};

    fn columns() -> ColumnMap<article::Entity> {
        ColumnMap::with_all_columns().joined("author.name", "author", "name")
    }

    fn relations() -> RelationRegistry<article::Entity> {
        RelationRegistry::new()
            .direct::<author::Entity>("author", || article::Relation::Author.def())
            .pivot::<article_tag::Entity, tag::Entity>(
                "tags",
                || article::Relation::ArticleTags.def(),
                || article_tag::Relation::Tag.def(),
            )
            .direct::<article::Entity>("authorArticles", || author::Relation::Articles.def())
    }

    fn published() -> PaginateConfig<Condition> {
        PaginateConfig::new()
            .sortable(["id", "title", "views", "rating", "createdAt"])
            .where_clause(Condition::all().add(article::Column::Published.eq(true)))
            .default_sort(Sort::asc("id"))
    }

    fn published_by_author(author: Relation<Condition>) -> PaginateConfig<Condition> {
        published()
            .sortable(["id", "title", "views", "rating", "createdAt", "author.name"])
            .relation(author)
    }

    fn sea(config: PaginateConfig<Condition>, options: PaginateOptions) -> SeaPaginator<article::Entity> {
        SeaPaginator::new(config, options, columns(), relations()).unwrap()
    }

    fn sql(select: Select<article::Entity>) -> String {
        select.build(DbBackend::Sqlite).to_string()
    }

    #[tokio::test]
    async fn third_page_of_published_articles() {
        let db = seeded_db().await;
        let paginator = sea(published(), PaginateOptions::default());
        let raw = PaginateDataQuery::new()
            .with_page(3)
            .with_size(20)
            .with_path("/api/v1/articles");

        let page = paginator
            .fetch::<article::Model, _>(article::Entity::find(), &raw, &db)
            .await
            .unwrap();

        assert_eq!(page.meta.total_items, 95);
        assert_eq!(page.meta.offset, 40);
        assert_eq!(page.meta.total_pages, 5);
        assert_eq!(page.data.len(), 20);
        assert!(page.data.iter().all(|a| a.published));
        assert!(page.data.windows(2).all(|w| w[0].id < w[1].id));
        assert!(page.links.next.is_some());
        assert!(page.links.previous.is_some());
    }

    #[tokio::test]
    async fn following_next_link_continues_the_listing() {
        let db = seeded_db().await;
        let paginator = sea(published(), PaginateOptions::default());
        let raw = PaginateDataQuery::new().with_size(10).with_sort("views:desc").with_path("/a");

        let first = paginator
            .fetch::<article::Model, _>(article::Entity::find(), &raw, &db)
            .await
            .unwrap();

        let next = first.links.next.clone().unwrap();
        let query = next.split_once('?').unwrap().1;
        let pairs: Vec<(String, String)> = query
            .split('&')
            .map(|kv| {
                let (k, v) = kv.split_once('=').unwrap();
                (k.to_string(), urlencoding::decode(v).unwrap().into_owned())
            })
            .collect();
        let raw_next = PaginateDataQuery::from_pairs(pairs).with_path("/a");

        let second = paginator
            .fetch::<article::Model, _>(article::Entity::find(), &raw_next, &db)
            .await
            .unwrap();

        assert_eq!(second.meta.current_page, 2);
        assert_eq!(second.meta.sort_by, vec![Sort::desc("views")]);
        let last_of_first = first.data.last().unwrap().views;
        assert!(second.data.iter().all(|a| a.views <= last_of_first));
    }

    #[tokio::test]
    async fn unpaged_returns_whole_collection() {
        let db = seeded_db().await;
        let paginator = sea(published(), PaginateOptions::default().unpaged(true).with_max_size(10));
        let raw = PaginateDataQuery::new().with_unpaged(true);

        let page = paginator
            .fetch::<article::Model, _>(article::Entity::find(), &raw, &db)
            .await
            .unwrap();

        assert_eq!(page.data.len(), 95);
        assert_eq!(page.meta.total_pages, 1);
        assert_eq!(page.meta.size, 95);
    }

    #[tokio::test]
    async fn nulls_ordering_is_honored() {
        let db = seeded_db().await;
        let paginator = sea(published(), PaginateOptions::default());

        let first = paginator
            .fetch::<article::Model, _>(
                article::Entity::find(),
                &PaginateDataQuery::new().with_sort("rating:desc:nullsFirst"),
                &db,
            )
            .await
            .unwrap();
        assert!(first.data[0].rating.is_none());

        let last = paginator
            .fetch::<article::Model, _>(
                article::Entity::find(),
                &PaginateDataQuery::new().with_sort("rating:desc:nullsLast"),
                &db,
            )
            .await
            .unwrap();
        assert_eq!(last.data[0].rating, Some(5));
    }

    #[tokio::test]
    async fn disallowed_sort_falls_back_to_default_order() {
        let db = seeded_db().await;
        let paginator = sea(published(), PaginateOptions::default());
        let page = paginator
            .fetch::<article::Model, _>(
                article::Entity::find(),
                &PaginateDataQuery::new().with_sort("published:desc"),
                &db,
            )
            .await
            .unwrap();
        assert_eq!(page.meta.sort_by, vec![Sort::asc("id")]);
        assert_eq!(page.data[0].id, 1);
    }

    #[derive(Debug, FromQueryResult)]
    struct ArticleWithAuthor {
        id: i32,
        author_id: i32,
        author_name: String,
    }

    #[tokio::test]
    async fn and_select_projects_joined_columns() {
        let db = seeded_db().await;
        let paginator = sea(
            published_by_author(Relation::left_join("author").and_select()),
            PaginateOptions::default(),
        );

        let page = paginator
            .fetch::<ArticleWithAuthor, _>(
                article::Entity::find(),
                &PaginateDataQuery::new().with_sort("author.name:asc,id:asc").with_size(5),
                &db,
            )
            .await
            .unwrap();

        // Ada Lovelace sorts first and owns every article with i % 3 == 0.
        assert!(page.data.iter().all(|a| a.author_name == "Ada Lovelace"));
        assert!(page.data.iter().all(|a| a.author_id == 1));
        assert_eq!(page.data[0].id, 3);
        assert!(page.data.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn inner_join_condition_filters_rows() {
        let db = seeded_db().await;
        let paginator = sea(
            published().relation(
                Relation::inner_join("author")
                    .alias("a")
                    .cond(Condition::all().add(Expr::col((Alias::new("a"), author::Column::Name)).eq("Ada Lovelace"))),
            ),
            PaginateOptions::default(),
        );

        let page = paginator
            .fetch::<article::Model, _>(article::Entity::find(), &PaginateDataQuery::new(), &db)
            .await
            .unwrap();

        assert!(page.data.iter().all(|a| a.author_id == 1));
        // 33 articles, one of them (60) unpublished
        assert_eq!(page.meta.total_items, 32);
    }

    #[tokio::test]
    async fn json_rows_include_pivot_columns() {
        let db = seeded_db().await;
        let paginator = sea(
            published().relation(Relation::pivot_join("tags").alias("t").and_select()),
            PaginateOptions::default(),
        );

        let page = paginator
            .fetch_json(article::Entity::find(), &PaginateDataQuery::new().with_size(3), &db)
            .await
            .unwrap();

        assert_eq!(page.data.len(), 3);
        assert_eq!(page.data[0]["id"], 1);
        assert_eq!(page.data[0]["t_tag_id"], 1);
        assert!(page.data[0].get("t_name").is_none());
    }

    #[test]
    fn pivot_join_stops_at_association_table() {
        let paginator = sea(
            published().relation(Relation::pivot_join("tags")),
            PaginateOptions::default(),
        );
        let query = sql(paginator.prepare(article::Entity::find()));
        assert!(query.contains(r#"LEFT JOIN "article_tags" AS "tags""#));
        assert!(!query.contains(r#"JOIN "tags""#));
    }

    #[test]
    fn many_to_many_left_join_goes_through_pivot() {
        let paginator = sea(
            published().relation(Relation::left_join("tags")),
            PaginateOptions::default(),
        );
        let query = sql(paginator.prepare(article::Entity::find()));
        assert!(query.contains(r#"LEFT JOIN "article_tags" AS "tags_pivot""#));
        assert!(query.contains(r#"LEFT JOIN "tags" AS "tags" ON "tags_pivot"."tag_id" = "tags"."id""#));
    }

    #[test]
    fn nested_relation_joins_from_owner_alias() {
        let paginator = sea(
            published()
                .relation(Relation::inner_join("author").alias("a"))
                .relation(Relation::left_join("authorArticles").alias("siblings").path("a")),
            PaginateOptions::default(),
        );
        let query = sql(paginator.prepare(article::Entity::find()));
        assert!(query.contains(r#"INNER JOIN "authors" AS "a""#));
        assert!(query.contains(r#"LEFT JOIN "articles" AS "siblings" ON "a"."id" = "siblings"."author_id""#));
    }

    #[test]
    fn projection_selects_only_configured_columns() {
        let paginator = sea(
            PaginateConfig::new().select(vec!["id", "title"]).sortable(["id"]),
            PaginateOptions::default(),
        );
        let query = sql(paginator.prepare(article::Entity::find()));
        assert!(query.starts_with(r#"SELECT "articles"."id", "articles"."title" FROM"#));
    }

    #[test]
    fn unpaged_query_has_no_limit() {
        let paginator = sea(published(), PaginateOptions::default().unpaged(true));
        let meta = paginator
            .paginator()
            .normalize(&PaginateDataQuery::new().with_unpaged(true), 95);
        let query = sql(paginator.page(article::Entity::find(), &meta));
        assert!(!query.contains("LIMIT"));
        assert!(query.contains(r#"ORDER BY "articles"."id" ASC"#));
    }

    #[test]
    fn unmapped_sortable_is_a_config_error() {
        let err = SeaPaginator::new(
            PaginateConfig::<Condition>::new().sortable(["body"]),
            PaginateOptions::default(),
            columns(),
            relations(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::InvalidSortable(p) if p == "body"));
    }

    #[test]
    fn unregistered_relation_is_a_config_error() {
        let err = SeaPaginator::new(
            PaginateConfig::<Condition>::new().relation(Relation::left_join("comments")),
            PaginateOptions::default(),
            columns(),
            relations(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::InvalidRelation(_)));
    }

    #[test]
    fn joined_sortable_needs_its_relation() {
        let err = SeaPaginator::new(
            published().sortable(["id", "author.name"]),
            PaginateOptions::default(),
            columns(),
            relations(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::InvalidRelation(msg) if msg.contains("author.name")));

        let err = SeaPaginator::new(
            PaginateConfig::<Condition>::new().select(vec!["id", "author.name"]).sortable(["id"]),
            PaginateOptions::default(),
            columns(),
            relations(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::InvalidRelation(_)));
    }

    #[tokio::test]
    async fn joined_sort_follows_renamed_alias() {
        let db = seeded_db().await;
        // "e" collides with the root alias and is renamed
        let paginator = sea(
            published_by_author(Relation::left_join("author").alias("e")),
            PaginateOptions::default(),
        );
        let alias = paginator.paginator().config().resolved_relations()[0].alias.to_string();
        assert_ne!(alias, "e");

        let raw = PaginateDataQuery::new().with_sort("author.name:desc").with_size(5);
        let query = sql(paginator.page(
            paginator.prepare(article::Entity::find()),
            &paginator.paginator().normalize(&raw, 95),
        ));
        assert!(query.contains(&format!(r#"ORDER BY "{}"."name" DESC"#, alias)));

        let page = paginator
            .fetch::<article::Model, _>(article::Entity::find(), &raw, &db)
            .await
            .unwrap();
        assert_eq!(page.meta.sort_by, vec![Sort::desc("author.name")]);
        // Grace Hopper sorts last and owns every article with i % 3 == 1
        assert!(page.data.iter().all(|a| a.author_id == 2));
    }

    #[tokio::test]
    async fn unrestricted_sortable_reports_only_applied_order() {
        let db = seeded_db().await;
        let paginator = sea(
            PaginateConfig::new()
                .where_clause(Condition::all().add(article::Column::Published.eq(true)))
                .default_sort(Sort::asc("id")),
            PaginateOptions::default(),
        );
        let raw = PaginateDataQuery::new()
            .with_sort("nickname:desc")
            .with_size(5)
            .with_path("/a");

        let page = paginator
            .fetch::<article::Model, _>(article::Entity::find(), &raw, &db)
            .await
            .unwrap();

        assert_eq!(page.meta.sort_by, vec![Sort::asc("id")]);
        assert_eq!(page.data[0].id, 1);
        assert!(!page.links.current.contains("nickname"));
        assert!(page.links.current.contains("sortBy=id:asc"));
    }
}
