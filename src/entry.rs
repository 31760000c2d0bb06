/// A stored key/value pair together with the full hash it was inserted
/// under, so resizes never rehash keys.
#[derive(Clone)]
pub(crate) struct Entry<K, V> {
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K: Eq, V> Entry<K, V> {
    #[inline(always)]
    pub(crate) fn new(hash: u64, key: K, value: V) -> Self {
        Self { hash, key, value }
    }

    #[inline(always)]
    pub(crate) fn matches(&self, hash: u64, key: &K) -> bool {
        self.hash == hash && self.key == *key
    }
}
