//! Lifecycle metadata shared by every persisted record.

/// A record the store can hold.
///
/// `initialized` is the one-shot flag the Initialization Guard checks before
/// any field write. Records that exist as soon as they are created (orders,
/// nonce scopes) report `true` unconditionally.
pub trait Record: Clone + Send + 'static {
    /// Short human-readable kind used in errors and logs.
    const KIND: &'static str;

    /// Whether setup logic has already run for this record.
    fn is_initialized(&self) -> bool;
}
