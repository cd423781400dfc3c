use std::collections::HashMap;
use std::sync::Mutex;

use super::{ResourceError, ResourceId};

/// A version comparator: returns negative, zero, or positive when comparing
/// `v1` against `v2`, or an error if either string cannot be understood.
pub type CompareFn = Box<dyn Fn(&str, &str) -> Result<i32, ResourceError> + Send + Sync>;

/// The default comparator: dot-separated non-negative integers, compared
/// component-wise. Equal on the shared prefix, the shorter string is less —
/// so `"1.2"` sorts before `"1.2.0"`. There is no pre-release/build-metadata
/// concept.
pub fn default_compare(v1: &str, v2: &str) -> Result<i32, ResourceError> {
    let parse = |v: &str| -> Result<Vec<u64>, ResourceError> {
        v.split('.')
            .map(|part| {
                part.parse::<u64>()
                    .map_err(|_| ResourceError::MalformedVersion(v.to_string()))
            })
            .collect()
    };
    let a = parse(v1)?;
    let b = parse(v2)?;
    let shared = a.len().min(b.len());
    for i in 0..shared {
        match a[i].cmp(&b[i]) {
            std::cmp::Ordering::Less => return Ok(-1),
            std::cmp::Ordering::Greater => return Ok(1),
            std::cmp::Ordering::Equal => continue,
        }
    }
    // Equal on the shared prefix: the shorter string is less, per the spec's
    // literal tie-break (not semver's "missing component is zero" rule).
    Ok(match a.len().cmp(&b.len()) {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Equal => 0,
    })
}

/// Per-resource registry of version comparators, falling back to
/// [`default_compare`] for any resource with no registered comparator.
/// Registration is write-once: re-registering the same resource is a
/// programmer error.
pub struct ComparatorRegistry {
    comparators: Mutex<HashMap<ResourceId, CompareFn>>,
}

impl ComparatorRegistry {
    pub fn new() -> Self {
        Self {
            comparators: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, resource: ResourceId, compare: CompareFn) -> Result<(), ResourceError> {
        let mut table = self.comparators.lock().expect("comparator registry poisoned");
        if table.contains_key(&resource) {
            return Err(ResourceError::AlreadyRegistered(resource.name()));
        }
        table.insert(resource, compare);
        Ok(())
    }

    pub fn compare(&self, resource: ResourceId, v1: &str, v2: &str) -> Result<i32, ResourceError> {
        let table = self.comparators.lock().expect("comparator registry poisoned");
        match table.get(&resource) {
            Some(f) => f(v1, v2),
            None => default_compare(v1, v2),
        }
    }
}

impl Default for ComparatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
