//! Synthetic dataset generation
//!
//! Records are produced lazily from the dataset stream and regrouped into
//! batches with [`batched`]; nothing here materializes a whole dataset.
//! Re-running a generator with the same seed reproduces the same records.

use crate::error::{GraphmarkError, GraphmarkResult};
use crate::rng::DeterministicRng;
use crate::runner::{ParamValue, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

const FIRST_NAMES: [&str; 20] = [
    "Alice", "Bob", "Charlie", "Diana", "Eve", "Frank", "Grace", "Henry", "Ivy", "Jack", "Kate",
    "Leo", "Mia", "Noah", "Olivia", "Paul", "Quinn", "Ruby", "Sam", "Tina",
];

const LAST_NAMES: [&str; 20] = [
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin",
];

const EMAIL_DOMAINS: [&str; 4] = ["gmail.com", "yahoo.com", "outlook.com", "example.com"];

/// Item categories, shared with the query catalog
pub const CATEGORIES: [&str; 8] = [
    "Electronics",
    "Clothing",
    "Books",
    "Home",
    "Sports",
    "Toys",
    "Food",
    "Health",
];

const ADJECTIVES: [&str; 8] = [
    "Premium", "Basic", "Pro", "Ultra", "Mini", "Mega", "Super", "Classic",
];

const NOUNS: [&str; 8] = [
    "Widget", "Gadget", "Device", "Tool", "Item", "Product", "Thing", "Object",
];

/// Event types, shared with the query catalog
pub const EVENT_TYPES: [&str; 5] = ["view", "click", "purchase", "share", "review"];

/// 2023-11-14T22:13:20Z in epoch milliseconds; timestamps are offsets from here
const EPOCH_BASE_MS: i64 = 1_700_000_000_000;
const YEAR_MS: i64 = 365 * 24 * 60 * 60 * 1000;

/// Named dataset size preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleTier {
    Micro,
    Quick,
    Full,
}

impl ScaleTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleTier::Micro => "micro",
            ScaleTier::Quick => "quick",
            ScaleTier::Full => "full",
        }
    }

    pub fn config(&self) -> ScaleConfig {
        match self {
            ScaleTier::Micro => ScaleConfig {
                users: 1_000,
                items: 500,
                events: 2_000,
                owns_edges: 2_000,
                triggered_edges: 2_000,
                related_to_edges: 1_000,
            },
            ScaleTier::Quick => ScaleConfig {
                users: 10_000,
                items: 5_000,
                events: 20_000,
                owns_edges: 20_000,
                triggered_edges: 20_000,
                related_to_edges: 10_000,
            },
            ScaleTier::Full => ScaleConfig {
                users: 100_000,
                items: 50_000,
                events: 500_000,
                owns_edges: 200_000,
                triggered_edges: 500_000,
                related_to_edges: 100_000,
            },
        }
    }
}

impl fmt::Display for ScaleTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScaleTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "micro" => Ok(ScaleTier::Micro),
            "quick" => Ok(ScaleTier::Quick),
            "full" => Ok(ScaleTier::Full),
            other => Err(format!("unknown scale tier '{}'", other)),
        }
    }
}

/// Size of one benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleConfig {
    pub users: u64,
    pub items: u64,
    pub events: u64,
    pub owns_edges: u64,
    pub triggered_edges: u64,
    pub related_to_edges: u64,
}

impl ScaleConfig {
    /// Reject configurations no generator can satisfy
    ///
    /// Edges need non-empty endpoint populations, and RELATED_TO edges need at
    /// least two items because self-loops are resampled.
    pub fn validate(&self) -> GraphmarkResult<()> {
        require_population(
            "owns_edges",
            self.owns_edges,
            &[("users", self.users), ("items", self.items)],
        )?;
        require_population(
            "triggered_edges",
            self.triggered_edges,
            &[("users", self.users), ("events", self.events)],
        )?;
        if self.related_to_edges > 0 && self.items < 2 {
            return Err(GraphmarkError::Generation {
                field: "related_to_edges",
                message: format!(
                    "{} edges requested but items = {}; at least 2 items are required",
                    self.related_to_edges, self.items
                ),
            });
        }
        Ok(())
    }

    pub fn total_nodes(&self) -> u64 {
        self.users + self.items + self.events
    }

    pub fn total_edges(&self) -> u64 {
        self.owns_edges + self.triggered_edges + self.related_to_edges
    }
}

fn require_population(
    field: &'static str,
    edges: u64,
    populations: &[(&str, u64)],
) -> GraphmarkResult<()> {
    if edges == 0 {
        return Ok(());
    }
    for (name, count) in populations {
        if *count == 0 {
            return Err(GraphmarkError::Generation {
                field,
                message: format!("{} edges requested but {} = 0", edges, name),
            });
        }
    }
    Ok(())
}

/// A generated record that can be shipped to a backend as a flat row
pub trait GraphRecord {
    fn to_row(&self) -> Row;
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    /// Epoch milliseconds
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: u64,
    pub title: String,
    pub category: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: u64,
    pub event_type: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Directed edge between two dense ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from_id: u64,
    pub to_id: u64,
}

fn row<const N: usize>(pairs: [(&str, ParamValue); N]) -> Row {
    crate::runner::params(pairs)
}

impl GraphRecord for User {
    fn to_row(&self) -> Row {
        row([
            ("id", self.id.into()),
            ("name", self.name.as_str().into()),
            ("email", self.email.as_str().into()),
            ("createdAt", self.created_at.into()),
        ])
    }
}

impl GraphRecord for Item {
    fn to_row(&self) -> Row {
        row([
            ("id", self.id.into()),
            ("title", self.title.as_str().into()),
            ("category", self.category.as_str().into()),
            ("price", self.price.into()),
        ])
    }
}

impl GraphRecord for Event {
    fn to_row(&self) -> Row {
        row([
            ("id", self.id.into()),
            ("type", self.event_type.as_str().into()),
            ("timestamp", self.timestamp.into()),
        ])
    }
}

impl GraphRecord for Edge {
    fn to_row(&self) -> Row {
        row([("from", self.from_id.into()), ("to", self.to_id.into())])
    }
}

/// Lazy, single-pass sequence of `count` records with ids `0..count`
pub struct Records<'a, F> {
    rng: &'a mut DeterministicRng,
    next_id: u64,
    count: u64,
    make: F,
}

impl<'a, T, F> Iterator for Records<'a, F>
where
    F: FnMut(&mut DeterministicRng, u64) -> T,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.next_id >= self.count {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        Some((self.make)(&mut *self.rng, id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count - self.next_id) as usize;
        (remaining, Some(remaining))
    }
}

impl<'a, T, F> ExactSizeIterator for Records<'a, F>
where
    F: FnMut(&mut DeterministicRng, u64) -> T,
{
}

/// Generator over the dataset stream
///
/// Sequences borrow the stream, so they are consumed one after another in
/// the order the caller requests them.
pub struct DatasetGenerator {
    rng: DeterministicRng,
}

impl Default for DatasetGenerator {
    fn default() -> Self {
        Self::new(DeterministicRng::dataset())
    }
}

impl DatasetGenerator {
    pub fn new(rng: DeterministicRng) -> Self {
        Self { rng }
    }

    fn records<T, F>(&mut self, count: u64, make: F) -> Records<'_, F>
    where
        F: FnMut(&mut DeterministicRng, u64) -> T,
    {
        Records {
            rng: &mut self.rng,
            next_id: 0,
            count,
            make,
        }
    }

    pub fn users(
        &mut self,
        count: u64,
    ) -> Records<'_, impl FnMut(&mut DeterministicRng, u64) -> User> {
        self.records(count, |rng, id| {
            let first = *rng.random_choice(&FIRST_NAMES);
            let last = *rng.random_choice(&LAST_NAMES);
            let domain = *rng.random_choice(&EMAIL_DOMAINS);
            User {
                id,
                name: format!("{} {}", first, last),
                email: format!(
                    "{}.{}{}@{}",
                    first.to_lowercase(),
                    last.to_lowercase(),
                    id,
                    domain
                ),
                created_at: EPOCH_BASE_MS + rng.random_int(0, YEAR_MS - 1),
            }
        })
    }

    pub fn items(
        &mut self,
        count: u64,
    ) -> Records<'_, impl FnMut(&mut DeterministicRng, u64) -> Item> {
        self.records(count, |rng, id| {
            let category = *rng.random_choice(&CATEGORIES);
            let adj = *rng.random_choice(&ADJECTIVES);
            let noun = *rng.random_choice(&NOUNS);
            Item {
                id,
                title: format!("{} {} {}", adj, category, noun),
                category: category.to_string(),
                price: random_price(rng),
            }
        })
    }

    pub fn events(
        &mut self,
        count: u64,
    ) -> Records<'_, impl FnMut(&mut DeterministicRng, u64) -> Event> {
        self.records(count, |rng, id| Event {
            id,
            event_type: rng.random_choice(&EVENT_TYPES).to_string(),
            timestamp: EPOCH_BASE_MS + rng.random_int(0, YEAR_MS - 1),
        })
    }

    /// User → Item edges, endpoints drawn with replacement
    pub fn owns(
        &mut self,
        user_count: u64,
        item_count: u64,
        edge_count: u64,
    ) -> GraphmarkResult<Records<'_, impl FnMut(&mut DeterministicRng, u64) -> Edge>> {
        require_population(
            "owns_edges",
            edge_count,
            &[("users", user_count), ("items", item_count)],
        )?;
        Ok(self.records(edge_count, move |rng, _| Edge {
            from_id: rng.random_id(user_count),
            to_id: rng.random_id(item_count),
        }))
    }

    /// User → Event edges, endpoints drawn with replacement
    pub fn triggered(
        &mut self,
        user_count: u64,
        event_count: u64,
        edge_count: u64,
    ) -> GraphmarkResult<Records<'_, impl FnMut(&mut DeterministicRng, u64) -> Edge>> {
        require_population(
            "triggered_edges",
            edge_count,
            &[("users", user_count), ("events", event_count)],
        )?;
        Ok(self.records(edge_count, move |rng, _| Edge {
            from_id: rng.random_id(user_count),
            to_id: rng.random_id(event_count),
        }))
    }

    /// Item → Item edges without self-loops
    pub fn related_to(
        &mut self,
        item_count: u64,
        edge_count: u64,
    ) -> GraphmarkResult<Records<'_, impl FnMut(&mut DeterministicRng, u64) -> Edge>> {
        if edge_count > 0 && item_count < 2 {
            return Err(GraphmarkError::Generation {
                field: "related_to_edges",
                message: format!("at least 2 items are required, got {}", item_count),
            });
        }
        Ok(self.records(edge_count, move |rng, _| {
            let from_id = rng.random_id(item_count);
            let mut to_id = rng.random_id(item_count);
            while to_id == from_id {
                to_id = rng.random_id(item_count);
            }
            Edge { from_id, to_id }
        }))
    }
}

fn random_price(rng: &mut DeterministicRng) -> f64 {
    let raw = 1.0 + rng.next_f64() * 999.0;
    (raw * 100.0).round() / 100.0
}

/// Regroups an iterator into chunks of at most `size` elements
pub struct Batches<I> {
    iter: I,
    size: NonZeroUsize,
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<I::Item> = self.iter.by_ref().take(self.size.get()).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

/// Lazily split a sequence into batches of `size`; the last may be shorter
pub fn batched<I: IntoIterator>(iter: I, size: NonZeroUsize) -> Batches<I::IntoIter> {
    Batches {
        iter: iter.into_iter(),
        size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_generation_scenario_counts_and_ranges() {
        let scale = ScaleConfig {
            users: 1000,
            items: 2000,
            events: 0,
            owns_edges: 500,
            triggered_edges: 0,
            related_to_edges: 0,
        };
        scale.validate().unwrap();

        let mut gen = DatasetGenerator::default();
        let users: Vec<User> = gen.users(scale.users).collect();
        assert_eq!(users.len(), 1000);
        assert!(users.iter().enumerate().all(|(i, u)| u.id == i as u64));

        let items: Vec<Item> = gen.items(scale.items).collect();
        assert_eq!(items.len(), 2000);
        assert!(items.iter().enumerate().all(|(i, it)| it.id == i as u64));

        let owns: Vec<Edge> = gen
            .owns(scale.users, scale.items, scale.owns_edges)
            .unwrap()
            .collect();
        assert_eq!(owns.len(), 500);
        assert!(owns.iter().all(|e| e.from_id <= 999 && e.to_id <= 1999));

        assert_eq!(gen.events(scale.events).count(), 0);
    }

    #[test]
    fn test_related_to_never_self_loops() {
        for items in [2u64, 3, 10, 1000] {
            let mut gen = DatasetGenerator::default();
            let edges: Vec<Edge> = gen.related_to(items, 5_000).unwrap().collect();
            assert_eq!(edges.len(), 5_000);
            assert!(edges.iter().all(|e| e.from_id != e.to_id));
            assert!(edges.iter().all(|e| e.from_id < items && e.to_id < items));
        }
    }

    #[test]
    fn test_related_to_rejects_single_item() {
        let mut gen = DatasetGenerator::default();
        assert!(matches!(
            gen.related_to(1, 10),
            Err(GraphmarkError::Generation { .. })
        ));
        // No edges requested is fine
        assert_eq!(gen.related_to(1, 0).unwrap().count(), 0);
    }

    #[test]
    fn test_validate_rejects_small_item_population() {
        let mut scale = ScaleTier::Micro.config();
        scale.items = 1;
        let err = scale.validate().unwrap_err();
        assert!(err.to_string().contains("related_to_edges"));
    }

    #[test]
    fn test_validate_rejects_empty_endpoints() {
        let scale = ScaleConfig {
            users: 0,
            items: 10,
            events: 10,
            owns_edges: 5,
            triggered_edges: 0,
            related_to_edges: 0,
        };
        assert!(matches!(
            scale.validate(),
            Err(GraphmarkError::Generation {
                field: "owns_edges",
                ..
            })
        ));
    }

    #[test]
    fn test_tiers_are_valid() {
        for tier in [ScaleTier::Micro, ScaleTier::Quick, ScaleTier::Full] {
            tier.config().validate().unwrap();
            assert_eq!(tier.as_str().parse::<ScaleTier>(), Ok(tier));
        }
    }

    #[test]
    fn test_same_seed_same_dataset() {
        let mut a = DatasetGenerator::default();
        let mut b = DatasetGenerator::default();
        let ua: Vec<User> = a.users(200).collect();
        let ub: Vec<User> = b.users(200).collect();
        assert_eq!(ua, ub);
        let ea: Vec<Edge> = a.related_to(50, 300).unwrap().collect();
        let eb: Vec<Edge> = b.related_to(50, 300).unwrap().collect();
        assert_eq!(ea, eb);
    }

    #[test]
    fn test_first_users_are_pinned() {
        let mut gen = DatasetGenerator::default();
        let users: Vec<User> = gen.users(2).collect();
        assert_eq!(
            users,
            [
                User {
                    id: 0,
                    name: "Noah Martin".to_string(),
                    email: "noah.martin0@yahoo.com".to_string(),
                    created_at: 1_719_784_441_396,
                },
                User {
                    id: 1,
                    name: "Frank Williams".to_string(),
                    email: "frank.williams1@yahoo.com".to_string(),
                    created_at: 1_725_350_931_585,
                },
            ]
        );
    }

    #[test]
    fn test_prices_have_two_decimals() {
        let mut gen = DatasetGenerator::default();
        for item in gen.items(500) {
            assert!((1.0..=1000.0).contains(&item.price));
            let cents = item.price * 100.0;
            assert!((cents - cents.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_batched_sizes_and_order() {
        for n in [0usize, 1, 9, 10, 11, 25, 100] {
            let k = 10;
            let batches: Vec<Vec<usize>> = batched(0..n, nz(k)).collect();
            assert_eq!(batches.len(), n.div_ceil(k));
            if let Some((last, full)) = batches.split_last() {
                assert!(full.iter().all(|b| b.len() == k));
                assert!(!last.is_empty() && last.len() <= k);
            }
            let flat: Vec<usize> = batches.into_iter().flatten().collect();
            assert_eq!(flat, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_batched_is_lazy() {
        // An unbounded source only works if batches are pulled one at a time
        let mut batches = batched(0u64.., nz(4));
        assert_eq!(batches.next(), Some(vec![0, 1, 2, 3]));
        assert_eq!(batches.next(), Some(vec![4, 5, 6, 7]));
    }

    #[test]
    fn test_edge_row_shape() {
        let edge = Edge { from_id: 3, to_id: 7 };
        let row = edge.to_row();
        assert_eq!(row.get("from"), Some(&ParamValue::Int(3)));
        assert_eq!(row.get("to"), Some(&ParamValue::Int(7)));
    }
}
