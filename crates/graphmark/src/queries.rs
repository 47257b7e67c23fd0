//! Query catalog
//!
//! A fixed list of Cypher templates grouped by [`Category`]. Parameters are
//! drawn fresh on every execution from the query stream, bounded by the
//! [`ScaleConfig`] the catalog was built for, so ids always exist in the
//! loaded dataset.

use crate::datasets::{ScaleConfig, CATEGORIES, EVENT_TYPES};
use crate::rng::DeterministicRng;
use crate::runner::{params, QueryParams};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Query category, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Lookup,
    Pattern,
    Aggregation,
    Traversal,
    Write,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Lookup,
        Category::Pattern,
        Category::Aggregation,
        Category::Traversal,
        Category::Write,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Lookup => "lookup",
            Category::Pattern => "pattern",
            Category::Aggregation => "aggregation",
            Category::Traversal => "traversal",
            Category::Write => "write",
        }
    }

    /// Writes mutate backend state and are not repeatable
    pub fn is_read_only(&self) -> bool {
        !matches!(self, Category::Write)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

type ParamFn = Box<dyn Fn(&mut DeterministicRng) -> QueryParams + Send + Sync>;

/// One named, parameterized query
pub struct QueryDefinition {
    pub name: &'static str,
    pub template: &'static str,
    pub category: Category,
    make_params: ParamFn,
}

impl QueryDefinition {
    fn new(
        name: &'static str,
        category: Category,
        template: &'static str,
        make_params: impl Fn(&mut DeterministicRng) -> QueryParams + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            template,
            category,
            make_params: Box::new(make_params),
        }
    }

    /// Draw a fresh parameter set from the query stream
    pub fn params(&self, rng: &mut DeterministicRng) -> QueryParams {
        (self.make_params)(rng)
    }
}

impl fmt::Debug for QueryDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryDefinition")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("template", &self.template)
            .finish()
    }
}

/// Immutable catalog built for one scale
#[derive(Debug)]
pub struct QueryCatalog {
    queries: Vec<QueryDefinition>,
}

impl QueryCatalog {
    pub fn new(scale: &ScaleConfig) -> Self {
        let ScaleConfig {
            users,
            items,
            events,
            ..
        } = *scale;

        let has_users = users > 0;
        let has_items = items > 0;

        // Queries drawing ids from an empty population are left out
        let queries = [
            // Lookup
            (
                has_users,
                QueryDefinition::new(
                    "user_by_id",
                    Category::Lookup,
                    "MATCH (u:User {id: $id}) RETURN u",
                    move |rng| params([("id", rng.random_id(users).into())]),
                ),
            ),
            (
                has_items,
                QueryDefinition::new(
                    "item_by_id",
                    Category::Lookup,
                    "MATCH (i:Item {id: $id}) RETURN i",
                    move |rng| params([("id", rng.random_id(items).into())]),
                ),
            ),
            (
                true,
                QueryDefinition::new(
                    "items_by_category",
                    Category::Lookup,
                    "MATCH (i:Item) WHERE i.category = $category RETURN i LIMIT 100",
                    |rng| params([("category", (*rng.random_choice(&CATEGORIES)).into())]),
                ),
            ),
            // Pattern
            (
                has_users,
                QueryDefinition::new(
                    "user_owned_items",
                    Category::Pattern,
                    "MATCH (u:User {id: $id})-[:OWNS]->(i:Item) RETURN i.id, i.title",
                    move |rng| params([("id", rng.random_id(users).into())]),
                ),
            ),
            (
                has_users,
                QueryDefinition::new(
                    "user_events_by_type",
                    Category::Pattern,
                    "MATCH (u:User {id: $id})-[:TRIGGERED]->(e:Event) WHERE e.type = $type RETURN e.id, e.timestamp",
                    move |rng| {
                        let id = rng.random_id(users);
                        let event_type = *rng.random_choice(&EVENT_TYPES);
                        params([("id", id.into()), ("type", event_type.into())])
                    },
                ),
            ),
            (
                has_users,
                QueryDefinition::new(
                    "co_owners",
                    Category::Pattern,
                    "MATCH (u:User {id: $id})-[:OWNS]->(:Item)<-[:OWNS]-(o:User) WHERE o.id <> $id RETURN DISTINCT o.id LIMIT 50",
                    move |rng| params([("id", rng.random_id(users).into())]),
                ),
            ),
            // Aggregation
            (
                true,
                QueryDefinition::new(
                    "count_users",
                    Category::Aggregation,
                    "MATCH (u:User) RETURN count(u) AS total",
                    |_| QueryParams::new(),
                ),
            ),
            (
                true,
                QueryDefinition::new(
                    "items_per_category",
                    Category::Aggregation,
                    "MATCH (i:Item) RETURN i.category AS category, count(*) AS total ORDER BY total DESC",
                    |_| QueryParams::new(),
                ),
            ),
            (
                true,
                QueryDefinition::new(
                    "avg_price_in_category",
                    Category::Aggregation,
                    "MATCH (i:Item) WHERE i.category = $category RETURN avg(i.price) AS avg_price",
                    |rng| params([("category", (*rng.random_choice(&CATEGORIES)).into())]),
                ),
            ),
            (
                true,
                QueryDefinition::new(
                    "events_per_type",
                    Category::Aggregation,
                    "MATCH (e:Event) RETURN e.type AS type, count(*) AS total",
                    |_| QueryParams::new(),
                ),
            ),
            // Traversal
            (
                has_items,
                QueryDefinition::new(
                    "related_items_2_hops",
                    Category::Traversal,
                    "MATCH (i:Item {id: $id})-[:RELATED_TO*1..2]->(r:Item) RETURN DISTINCT r.id LIMIT 100",
                    move |rng| params([("id", rng.random_id(items).into())]),
                ),
            ),
            (
                has_items,
                QueryDefinition::new(
                    "related_items_3_hops",
                    Category::Traversal,
                    "MATCH (i:Item {id: $id})-[:RELATED_TO*1..3]->(r:Item) RETURN DISTINCT r.id LIMIT 100",
                    move |rng| params([("id", rng.random_id(items).into())]),
                ),
            ),
            (
                has_users,
                QueryDefinition::new(
                    "user_recommendations",
                    Category::Traversal,
                    "MATCH (u:User {id: $id})-[:OWNS]->(:Item)-[:RELATED_TO]->(r:Item) WHERE NOT (u)-[:OWNS]->(r) RETURN DISTINCT r.id LIMIT 20",
                    move |rng| params([("id", rng.random_id(users).into())]),
                ),
            ),
            // Write
            (
                true,
                QueryDefinition::new(
                    "create_user",
                    Category::Write,
                    "CREATE (u:User {id: $id, name: $name, email: $email, createdAt: $createdAt})",
                    move |rng| {
                        let id = users + rng.random_id(1_000_000);
                        params([
                            ("id", id.into()),
                            ("name", format!("bench-user-{}", id).into()),
                            ("email", format!("bench{}@example.com", id).into()),
                            ("createdAt", rng.random_int(0, i64::from(u32::MAX)).into()),
                        ])
                    },
                ),
            ),
            (
                has_users && has_items,
                QueryDefinition::new(
                    "create_owns_edge",
                    Category::Write,
                    "MATCH (u:User {id: $userId}), (i:Item {id: $itemId}) CREATE (u)-[:OWNS]->(i)",
                    move |rng| {
                        let user_id = rng.random_id(users);
                        let item_id = rng.random_id(items);
                        params([("userId", user_id.into()), ("itemId", item_id.into())])
                    },
                ),
            ),
            (
                has_items,
                QueryDefinition::new(
                    "update_item_price",
                    Category::Write,
                    "MATCH (i:Item {id: $id}) SET i.price = $price",
                    move |rng| {
                        let id = rng.random_id(items);
                        let price = (rng.next_f64() * 100_000.0).round() / 100.0;
                        params([("id", id.into()), ("price", price.into())])
                    },
                ),
            ),
            (
                has_users,
                QueryDefinition::new(
                    "log_event",
                    Category::Write,
                    "MATCH (u:User {id: $userId}) CREATE (u)-[:TRIGGERED]->(:Event {id: $id, type: $type, timestamp: $timestamp})",
                    move |rng| {
                        let user_id = rng.random_id(users);
                        let id = events + rng.random_id(1_000_000);
                        let event_type = *rng.random_choice(&EVENT_TYPES);
                        params([
                            ("userId", user_id.into()),
                            ("id", id.into()),
                            ("type", event_type.into()),
                            ("timestamp", rng.random_int(0, i64::from(u32::MAX)).into()),
                        ])
                    },
                ),
            ),
        ];

        Self {
            queries: queries
                .into_iter()
                .filter_map(|(enabled, query)| enabled.then_some(query))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// All queries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &QueryDefinition> {
        self.queries.iter()
    }

    /// Queries safe to repeat; the write category is left out
    pub fn read_only(&self) -> impl Iterator<Item = &QueryDefinition> {
        self.queries.iter().filter(|q| q.category.is_read_only())
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &QueryDefinition> {
        self.queries.iter().filter(move |q| q.category == category)
    }

    pub fn get(&self, name: &str) -> Option<&QueryDefinition> {
        self.queries.iter().find(|q| q.name == name)
    }
}

/// Statements used by the load phase
///
/// Each takes one batch as `$rows`, a list of flat maps produced by
/// [`GraphRecord::to_row`](crate::datasets::GraphRecord::to_row).
pub mod load {
    /// Id indexes, created before loading so edge inserts can find endpoints
    pub const SCHEMA: [&str; 3] = [
        "CREATE INDEX user_id IF NOT EXISTS FOR (u:User) ON (u.id)",
        "CREATE INDEX item_id IF NOT EXISTS FOR (i:Item) ON (i.id)",
        "CREATE INDEX event_id IF NOT EXISTS FOR (e:Event) ON (e.id)",
    ];

    pub const USERS: &str = "UNWIND $rows AS row CREATE (:User {id: row.id, name: row.name, email: row.email, createdAt: row.createdAt})";

    pub const ITEMS: &str = "UNWIND $rows AS row CREATE (:Item {id: row.id, title: row.title, category: row.category, price: row.price})";

    pub const EVENTS: &str =
        "UNWIND $rows AS row CREATE (:Event {id: row.id, type: row.type, timestamp: row.timestamp})";

    pub const OWNS: &str = "UNWIND $rows AS row MATCH (u:User {id: row.from}), (i:Item {id: row.to}) CREATE (u)-[:OWNS]->(i)";

    pub const TRIGGERED: &str = "UNWIND $rows AS row MATCH (u:User {id: row.from}), (e:Event {id: row.to}) CREATE (u)-[:TRIGGERED]->(e)";

    pub const RELATED_TO: &str = "UNWIND $rows AS row MATCH (a:Item {id: row.from}), (b:Item {id: row.to}) CREATE (a)-[:RELATED_TO]->(b)";
}
