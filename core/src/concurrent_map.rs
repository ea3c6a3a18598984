//! Lock-sharded map used to accumulate scores from many workers.
//!
//! Keys are spread over a fixed number of buckets by `key mod bucket_count`;
//! each bucket has its own mutex, so workers touching different buckets never
//! contend. Only per-bucket atomicity is provided: [`ConcurrentMap::materialize`]
//! locks one bucket at a time and is not a global snapshot.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::collections::BTreeMap;

/// Integer-like keys that can be partitioned by modulo.
pub trait BucketKey: Copy + Ord {
    fn bucket(&self, bucket_count: usize) -> usize;
}

macro_rules! impl_bucket_key {
    ($($t:ty),*) => {
        $(
            impl BucketKey for $t {
                #[inline]
                fn bucket(&self, bucket_count: usize) -> usize {
                    (*self as i128).rem_euclid(bucket_count as i128) as usize
                }
            }
        )*
    };
}

impl_bucket_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

pub struct ConcurrentMap<K, V> {
    buckets: Vec<Mutex<BTreeMap<K, V>>>,
}

impl<K: BucketKey, V: Default + Clone> ConcurrentMap<K, V> {
    /// A zero bucket count is raised to one.
    pub fn new(bucket_count: usize) -> Self {
        let buckets = (0..bucket_count.max(1)).map(|_| Mutex::new(BTreeMap::new())).collect();
        Self { buckets }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_for(&self, key: &K) -> &Mutex<BTreeMap<K, V>> {
        &self.buckets[key.bucket(self.buckets.len())]
    }

    /// Exclusive access to the slot for `key`, created with `V::default()` on
    /// first access. The owning bucket stays locked while the guard lives.
    pub fn access(&self, key: K) -> MappedMutexGuard<'_, V> {
        MutexGuard::map(self.bucket_for(&key).lock(), |map| map.entry(key).or_default())
    }

    pub fn erase(&self, key: &K) -> Option<V> {
        self.bucket_for(key).lock().remove(key)
    }

    pub fn materialize(&self) -> BTreeMap<K, V> {
        let mut result = BTreeMap::new();
        for bucket in &self.buckets {
            let guard = bucket.lock();
            result.extend(guard.iter().map(|(k, v)| (*k, v.clone())));
        }
        result
    }
}
