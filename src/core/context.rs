//! Key/value context attached to records
//!
//! This module provides:
//! - `Context`: a key/value pair, both already rendered to strings
//! - `Dynamic`: a value generator evaluated once per emitted record
//! - `ContextValue`: what a handle accepts when contexts are attached

use std::fmt;
use std::sync::Arc;

/// A rendered key/value pair carried by a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context {
    pub key: String,
    pub value: String,
}

impl Context {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

/// Generator for a context value that is computed at dispatch time.
///
/// The generator receives its own key and runs while the logger lock is held,
/// once for every record that reaches the filter stage. It must not log through
/// the logger it is attached to, or it will deadlock.
///
/// # Example
///
/// ```
/// use rust_slot_logger::core::Dynamic;
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use std::sync::Arc;
///
/// let counter = Arc::new(AtomicU64::new(0));
/// let seq = Dynamic::new(move |_key| counter.fetch_add(1, Ordering::Relaxed));
/// assert_eq!(seq.generate("seq"), "0");
/// assert_eq!(seq.generate("seq"), "1");
/// ```
#[derive(Clone)]
pub struct Dynamic(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl Dynamic {
    pub fn new<F, V>(generator: F) -> Self
    where
        F: Fn(&str) -> V + Send + Sync + 'static,
        V: fmt::Display,
    {
        Self(Arc::new(move |key| generator(key).to_string()))
    }

    /// Invoke the generator for `key`.
    #[inline]
    pub fn generate(&self, key: &str) -> String {
        (self.0)(key)
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dynamic(..)")
    }
}

/// Value half of a context pair as accepted by [`Logger::with_contexts`].
///
/// Static values are rendered to a string immediately; dynamic values are
/// kept as generators.
///
/// [`Logger::with_contexts`]: crate::core::Logger::with_contexts
#[derive(Debug, Clone)]
pub enum ContextValue {
    Static(String),
    Dynamic(Dynamic),
}

impl From<Dynamic> for ContextValue {
    fn from(d: Dynamic) -> Self {
        ContextValue::Dynamic(d)
    }
}

impl From<String> for ContextValue {
    fn from(s: String) -> Self {
        ContextValue::Static(s)
    }
}

impl From<&str> for ContextValue {
    fn from(s: &str) -> Self {
        ContextValue::Static(s.to_string())
    }
}

impl From<&String> for ContextValue {
    fn from(s: &String) -> Self {
        ContextValue::Static(s.clone())
    }
}

macro_rules! static_context_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ContextValue {
                fn from(v: $t) -> Self {
                    ContextValue::Static(v.to_string())
                }
            }
        )*
    };
}

static_context_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char);

/// A context whose value is generated per record.
#[derive(Debug, Clone)]
pub(crate) struct DynamicContext {
    pub key: String,
    pub generator: Dynamic,
}

impl DynamicContext {
    pub fn resolve(&self) -> Context {
        Context {
            key: self.key.clone(),
            value: self.generator.generate(&self.key),
        }
    }
}
