//! Per-path method table.
//!
//! Each route endpoint in the tree owns a [`MethodTable`] mapping HTTP
//! methods to the payload registered for them. Extension methods
//! (anything `http::Method` can represent) are supported alongside the
//! standard verbs.

use http::Method;
use smallvec::SmallVec;

/// Most endpoints serve one or two methods.
const INLINE_METHODS: usize = 2;

/// Maps HTTP methods to payloads for a single path endpoint.
///
/// Registration order is preserved; it is the order reported by
/// [`MethodTable::allowed_methods`].
///
/// # Example
///
/// ```rust
/// use trellis_router::MethodTable;
/// use http::Method;
///
/// let mut table = MethodTable::new();
/// table.insert(Method::GET, "list").unwrap();
/// table.insert(Method::POST, "create").unwrap();
///
/// assert_eq!(table.get(&Method::GET), Some(&"list"));
/// assert_eq!(table.allowed_methods(), vec![Method::GET, Method::POST]);
/// ```
#[derive(Debug, Clone)]
pub struct MethodTable<T> {
    entries: SmallVec<[(Method, T); INLINE_METHODS]>,
}

impl<T> Default for MethodTable<T> {
    fn default() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }
}

impl<T> MethodTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a payload for `method`.
    ///
    /// Returns the payload back if the method is already taken.
    pub fn insert(&mut self, method: Method, payload: T) -> Result<(), T> {
        if self.contains(&method) {
            return Err(payload);
        }
        self.entries.push((method, payload));
        Ok(())
    }

    /// Returns the payload registered for `method`.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&T> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, payload)| payload)
    }

    /// Returns true if `method` has a payload.
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        self.entries.iter().any(|(m, _)| m == method)
    }

    /// Returns true if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Methods served by this endpoint, in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Iterates over `(method, payload)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Method, &T)> {
        self.entries.iter().map(|(m, payload)| (m, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_table_new() {
        let table: MethodTable<u8> = MethodTable::new();
        assert!(table.is_empty());
        assert!(table.allowed_methods().is_empty());
    }

    #[test]
    fn test_insert_and_get() {
        let mut table = MethodTable::new();
        table.insert(Method::GET, 1).unwrap();
        table.insert(Method::DELETE, 2).unwrap();

        assert_eq!(table.get(&Method::GET), Some(&1));
        assert_eq!(table.get(&Method::DELETE), Some(&2));
        assert_eq!(table.get(&Method::POST), None);
    }

    #[test]
    fn test_duplicate_method_is_rejected() {
        let mut table = MethodTable::new();
        table.insert(Method::GET, 1).unwrap();
        assert_eq!(table.insert(Method::GET, 2), Err(2));
        assert_eq!(table.get(&Method::GET), Some(&1));
    }

    #[test]
    fn test_extension_method() {
        let purge = Method::from_bytes(b"PURGE").unwrap();
        let mut table = MethodTable::new();
        table.insert(purge.clone(), "purge").unwrap();
        assert!(table.contains(&purge));
    }

    #[test]
    fn test_allowed_methods_keep_registration_order() {
        let mut table = MethodTable::new();
        table.insert(Method::PUT, ()).unwrap();
        table.insert(Method::GET, ()).unwrap();
        table.insert(Method::OPTIONS, ()).unwrap();

        assert_eq!(
            table.allowed_methods(),
            vec![Method::PUT, Method::GET, Method::OPTIONS]
        );
    }
}
