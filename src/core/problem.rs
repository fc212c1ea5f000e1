use ahash::{HashMap, HashSet};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A machine. Identified by its name, it can perform every operation in its capability set.
#[derive(Clone, Debug, Deserialize, Eq, Serialize, PartialEq)]
pub struct Machine {
    pub name: String,
    pub operations: HashSet<String>,
}

impl Machine {
    /// Creates a new machine capable of the given operations.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            operations: operations.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns whether the machine can perform the given operation.
    #[must_use]
    pub fn can_perform(&self, operation: &str) -> bool {
        self.operations.contains(operation)
    }
}

/// A single step of a product's process plan.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Serialize, PartialEq)]
pub struct ProductTask {
    pub operation: String,
    pub duration: u64,
}

impl ProductTask {
    /// Creates a new process step.
    #[must_use]
    pub fn new(operation: impl Into<String>, duration: u64) -> Self {
        let operation = operation.into();
        Self {
            operation,
            duration,
        }
    }
}

/// A product with its mandatory process plan. Tasks must be executed in order.
#[derive(Clone, Debug, Deserialize, Eq, Serialize, PartialEq)]
pub struct Product {
    pub name: String,
    pub tasks: Vec<ProductTask>,
}

impl Product {
    /// Creates a new product.
    #[must_use]
    pub fn new(name: impl Into<String>, tasks: Vec<ProductTask>) -> Self {
        Self {
            name: name.into(),
            tasks,
        }
    }

    /// Total processing time of a single unit.
    #[must_use]
    pub fn unit_work(&self) -> u64 {
        self.tasks.iter().map(|task| task.duration).sum()
    }
}

/// An order for `quantity` units of a product, due `deadline` hours after the schedule start.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Serialize, PartialEq)]
pub struct Order {
    pub product: String,
    pub quantity: u64,
    pub deadline: u64,
}

impl Order {
    /// Creates a new order.
    #[must_use]
    pub fn new(product: impl Into<String>, quantity: u64, deadline: u64) -> Self {
        Self {
            product: product.into(),
            quantity,
            deadline,
        }
    }
}

/// Sequence-dependent setup times between products.
/// Serialized as a map keyed by `"from-to"`; absent pairs need no setup.
#[derive(Clone, Debug, Default, Deserialize, Eq, Serialize, PartialEq)]
#[serde(from = "HashMap<String, u64>", into = "HashMap<String, u64>")]
pub struct SetupTimes {
    times: HashMap<String, u64>,
}

impl SetupTimes {
    /// Creates an empty setup table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(from: &str, to: &str) -> String {
        format!("{from}-{to}")
    }

    /// Sets the setup time required when switching from `from` to `to`.
    pub fn insert(&mut self, from: &str, to: &str, time: u64) {
        self.times.insert(Self::key(from, to), time);
    }

    /// Builder variant of [`SetupTimes::insert`].
    #[must_use]
    pub fn with(mut self, from: &str, to: &str, time: u64) -> Self {
        self.insert(from, to, time);
        self
    }

    /// Returns the setup time between two products, zero if none is defined.
    #[must_use]
    pub fn get(&self, from: &str, to: &str) -> u64 {
        self.times.get(&Self::key(from, to)).copied().unwrap_or_default()
    }

    /// Returns whether no setup time is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Returns the number of defined pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns the raw keys that do not name any pair of the given products.
    /// Such entries can never be looked up and most likely contain a typo.
    #[must_use]
    pub fn unmatched_keys(&self, products: &[Product]) -> Vec<&str> {
        let known: HashSet<String> = products
            .iter()
            .flat_map(|from| products.iter().map(|to| Self::key(&from.name, &to.name)))
            .collect();

        let mut keys: Vec<_> = self
            .times
            .keys()
            .filter(|key| !known.contains(*key))
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys
    }
}

impl From<HashMap<String, u64>> for SetupTimes {
    fn from(times: HashMap<String, u64>) -> Self {
        Self { times }
    }
}

impl From<SetupTimes> for HashMap<String, u64> {
    fn from(setup: SetupTimes) -> Self {
        setup.times
    }
}

/// A complete scheduling request.
#[non_exhaustive]
#[derive(Clone, Debug, Default, Deserialize, Eq, Serialize, PartialEq)]
pub struct Problem {
    pub machines: Vec<Machine>,
    pub products: Vec<Product>,
    #[serde(default)]
    pub setup_times: SetupTimes,
    pub orders: Vec<Order>,
    #[serde(
        default,
        deserialize_with = "deserialize_start_time",
        serialize_with = "serialize_start_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<NaiveDateTime>,
}

impl Problem {
    /// Creates a new problem without a fixed start time.
    #[must_use]
    pub const fn new(
        machines: Vec<Machine>,
        products: Vec<Product>,
        setup_times: SetupTimes,
        orders: Vec<Order>,
    ) -> Self {
        Self {
            machines,
            products,
            setup_times,
            orders,
            start_time: None,
        }
    }

    /// Anchors the schedule at the given time.
    #[must_use]
    pub const fn with_start_time(mut self, start_time: NaiveDateTime) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Finds a product by name.
    #[must_use]
    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|product| product.name == name)
    }
}

const START_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 datetime. Offsets are dropped, the wall-clock time is kept.
///
/// # Errors
/// - If the text matches none of the accepted formats.
pub fn parse_start_time(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let text = text.trim();
    if let Ok(time) = chrono::DateTime::parse_from_rfc3339(text) {
        return Ok(time.naive_local());
    }
    for format in START_TIME_FORMATS {
        if let Ok(time) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(time);
        }
    }
    chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").map(|date| date.and_time(chrono::NaiveTime::MIN))
}

fn deserialize_start_time<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|text| parse_start_time(&text).map_err(serde::de::Error::custom))
        .transpose()
}

#[allow(clippy::ref_option)]
fn serialize_start_time<S>(time: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match time {
        Some(time) => serializer.serialize_str(&time.format("%Y-%m-%dT%H:%M:%S").to_string()),
        None => serializer.serialize_none(),
    }
}
