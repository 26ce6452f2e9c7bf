use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::service::ServiceName;

/// Append-only cache of per-service handles.
///
/// An entry is built at most once per service and is never evicted or
/// replaced. Lookup and insertion happen under one lock, so concurrent
/// callers always observe the same handle.
#[derive(Debug)]
pub struct HandleCache<T> {
    entries: Mutex<HashMap<ServiceName, Arc<T>>>,
}

impl<T> Default for HandleCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> HandleCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached handle for `service`, building it with `build` on a miss.
    ///
    /// A failed build leaves the cache untouched.
    pub fn get_or_try_insert_with<E, F>(&self, service: ServiceName, build: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut entries = self.lock();
        if let Some(handle) = entries.get(&service) {
            return Ok(Arc::clone(handle));
        }
        let handle = Arc::new(build()?);
        entries.insert(service, Arc::clone(&handle));
        Ok(handle)
    }

    pub fn contains(&self, service: ServiceName) -> bool {
        self.lock().contains_key(&service)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Entries are only ever inserted whole, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<ServiceName, Arc<T>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_builds_once_per_service() {
        let cache: HandleCache<String> = HandleCache::new();
        let builds = Cell::new(0);

        let build = || {
            builds.set(builds.get() + 1);
            Ok::<_, ()>("handle".to_string())
        };
        let first = cache.get_or_try_insert_with(ServiceName::S3, build).unwrap();
        let second = cache
            .get_or_try_insert_with(ServiceName::S3, || Ok::<_, ()>("other".to_string()))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, "handle");
        assert_eq!(builds.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let cache: HandleCache<u32> = HandleCache::new();

        let err = cache
            .get_or_try_insert_with(ServiceName::DynamoDb, || Err("boom"))
            .unwrap_err();
        assert_eq!(err, "boom");
        assert!(!cache.contains(ServiceName::DynamoDb));

        let value = cache
            .get_or_try_insert_with(ServiceName::DynamoDb, || Ok::<_, &str>(7))
            .unwrap();
        assert_eq!(*value, 7);
    }

    #[test]
    fn test_concurrent_callers_share_one_build() {
        const THREADS: usize = 8;
        let cache: HandleCache<usize> = HandleCache::new();
        let builds = AtomicUsize::new(0);
        let start = Barrier::new(THREADS);

        let handles: Vec<Arc<usize>> = thread::scope(|scope| {
            let workers: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        start.wait();
                        cache
                            .get_or_try_insert_with(ServiceName::S3, || {
                                thread::sleep(std::time::Duration::from_millis(10));
                                Ok::<_, ()>(builds.fetch_add(1, Ordering::SeqCst))
                            })
                            .unwrap()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
        assert_eq!(cache.len(), 1);
    }
}
