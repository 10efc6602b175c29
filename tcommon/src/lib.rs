//! Shared primitives for the toolwire workspace crates.
//!
//! ```rust
//! use tcommon::{GenerationOptions, Registry, TraceId};
//!
//! let trace = TraceId::new("trace-1");
//! let mut registry = Registry::new();
//! registry.insert("add".to_string(), 2_u8);
//!
//! let options = GenerationOptions::default().with_temperature(0.0);
//! assert_eq!(trace.as_str(), "trace-1");
//! assert_eq!(registry.get("add"), Some(&2));
//! assert_eq!(options.temperature, Some(0.0));
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use tcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod deadline {
    //! Runtime-agnostic upper bound for a single suspension point.
    //!
    //! ```rust
    //! use std::time::Duration;
    //! use tcommon::with_deadline;
    //!
    //! let _bounded = with_deadline(Duration::from_secs(1), async { 42 });
    //! ```

    use std::error::Error;
    use std::fmt::{Display, Formatter};
    use std::future::Future;
    use std::pin::pin;
    use std::time::Duration;

    use futures_timer::Delay;
    use futures_util::future::{Either, select};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeadlineElapsed {
        pub after: Duration,
    }

    impl Display for DeadlineElapsed {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "deadline of {} ms elapsed", self.after.as_millis())
        }
    }

    impl Error for DeadlineElapsed {}

    pub async fn with_deadline<F>(after: Duration, future: F) -> Result<F::Output, DeadlineElapsed>
    where
        F: Future,
    {
        let future = pin!(future);
        let delay = pin!(Delay::new(after));

        match select(future, delay).await {
            Either::Left((output, _)) => Ok(output),
            Either::Right(((), _)) => Err(DeadlineElapsed { after }),
        }
    }
}

pub mod context {
    //! Request correlation identifiers.
    //!
    //! ```rust
    //! use tcommon::TraceId;
    //!
    //! let trace = TraceId::from("trace-42");
    //! assert_eq!(trace.to_string(), "trace-42");
    //! assert_ne!(TraceId::generate(), TraceId::generate());
    //! ```

    use std::fmt::{Display, Formatter};

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct TraceId(String);

    impl TraceId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn generate() -> Self {
            Self(uuid::Uuid::new_v4().simple().to_string())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for TraceId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for TraceId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for TraceId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }
}

pub mod model {
    //! Shared sampling settings for completion requests.

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct GenerationOptions {
        pub temperature: Option<f32>,
        pub max_tokens: Option<u32>,
    }

    impl GenerationOptions {
        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = Some(temperature);
            self
        }

        pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
            self.max_tokens = Some(max_tokens);
            self
        }
    }
}

pub mod registry {
    //! Insertion-ordered arena with a key index.
    //!
    //! Entries live in a `Vec` in registration order and are looked up through a
    //! key → slot map, so iteration order is stable across runs.
    //!
    //! ```rust
    //! use tcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("beta".to_string(), 2_u32);
    //! registry.insert("alpha".to_string(), 1_u32);
    //!
    //! let keys: Vec<&str> = registry.keys().map(String::as_str).collect();
    //! assert_eq!(keys, ["beta", "alpha"]);
    //! assert_eq!(registry.get("alpha"), Some(&1));
    //! ```

    use std::borrow::Borrow;
    use std::collections::HashMap;
    use std::hash::Hash;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        entries: Vec<(K, V)>,
        index: HashMap<K, usize>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Eq + Hash,
    {
        fn default() -> Self {
            Self {
                entries: Vec::new(),
                index: HashMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Eq + Hash + Clone,
    {
        pub fn new() -> Self {
            Self::default()
        }

        /// Inserts `value` under `key`. An existing entry keeps its slot and the
        /// previous value is returned.
        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            if let Some(&slot) = self.index.get(&key) {
                return Some(std::mem::replace(&mut self.entries[slot].1, value));
            }

            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, value));
            None
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.index.get(key).map(|&slot| &self.entries[slot].1)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.index.contains_key(key)
        }

        pub fn keys(&self) -> impl Iterator<Item = &K> {
            self.entries.iter().map(|(key, _)| key)
        }

        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.entries.iter().map(|(_, value)| value)
        }

        pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
            self.entries.iter().map(|(key, value)| (key, value))
        }

        pub fn len(&self) -> usize {
            self.entries.len()
        }

        pub fn is_empty(&self) -> bool {
            self.entries.is_empty()
        }
    }

    impl<K, V> FromIterator<(K, V)> for Registry<K, V>
    where
        K: Eq + Hash + Clone,
    {
        fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
            let mut registry = Self::new();
            for (key, value) in iter {
                registry.insert(key, value);
            }
            registry
        }
    }
}

pub use context::TraceId;
pub use deadline::{DeadlineElapsed, with_deadline};
pub use future::BoxFuture;
pub use model::GenerationOptions;
pub use registry::Registry;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{GenerationOptions, Registry, TraceId, with_deadline};

    #[test]
    fn trace_ids_round_trip_and_generate_unique_values() {
        let trace = TraceId::from("trace-1");
        assert_eq!(trace.as_str(), "trace-1");
        assert_eq!(trace.to_string(), "trace-1");

        let generated = TraceId::generate();
        assert_eq!(generated.as_str().len(), 32);
        assert_ne!(generated, TraceId::generate());
    }

    #[test]
    fn generation_options_builder_helpers_set_values() {
        let options = GenerationOptions::default()
            .with_temperature(0.3)
            .with_max_tokens(123);

        assert_eq!(options.temperature, Some(0.3));
        assert_eq!(options.max_tokens, Some(123));
    }

    #[test]
    fn registry_keeps_insertion_order_and_replaces_in_place() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        registry.insert("b".to_string(), 1_u32);
        registry.insert("a".to_string(), 2_u32);
        let previous = registry.insert("b".to_string(), 3_u32);

        assert_eq!(previous, Some(1));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains_key("a"));
        assert_eq!(registry.values().copied().collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(
            registry.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>(),
            vec!["b", "a"]
        );
    }

    #[test]
    fn registry_collects_from_iterator() {
        let registry: Registry<String, u32> =
            [("x".to_string(), 1), ("y".to_string(), 2)].into_iter().collect();
        assert_eq!(registry.get("y"), Some(&2));
        assert_eq!(registry.get("z"), None);
    }

    #[tokio::test]
    async fn deadline_passes_through_fast_futures() {
        let output = with_deadline(Duration::from_secs(5), async { 7 })
            .await
            .expect("future should finish first");
        assert_eq!(output, 7);
    }

    #[tokio::test]
    async fn deadline_reports_elapsed_for_slow_futures() {
        let elapsed = with_deadline(
            Duration::from_millis(20),
            tokio::time::sleep(Duration::from_secs(5)),
        )
        .await
        .expect_err("deadline should fire");
        assert_eq!(elapsed.after, Duration::from_millis(20));
        assert!(elapsed.to_string().contains("20 ms"));
    }
}
