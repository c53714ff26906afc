use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hash that is stable across runs (fixed SipHash keys), unlike `RandomState`.
pub fn stable_u64<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut h = DefaultHasher::new();
    value.hash(&mut h);
    h.finish()
}
