use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// A globally interned handle for a resource name.
///
/// Two `ResourceId`s compare equal iff they were interned from byte-equal
/// strings. The interning table is a process-wide singleton so a
/// `ResourceId` can be freely copied and compared without carrying a
/// reference to whatever interned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u32);

struct InternTable {
    by_name: HashMap<String, u32>,
    names: Vec<String>,
}

fn table() -> &'static Mutex<InternTable> {
    static TABLE: OnceLock<Mutex<InternTable>> = OnceLock::new();
    TABLE.get_or_init(|| {
        Mutex::new(InternTable {
            by_name: HashMap::new(),
            names: Vec::new(),
        })
    })
}

impl ResourceId {
    /// The distinguished value that no interned string ever maps to.
    pub const INVALID: ResourceId = ResourceId(u32::MAX);

    /// Interns `name`, returning the same id for the same string on every call.
    pub fn intern(name: &str) -> ResourceId {
        let mut table = table().lock().expect("resource intern table poisoned");
        if let Some(&id) = table.by_name.get(name) {
            return ResourceId(id);
        }
        let id = table.names.len() as u32;
        table.names.push(name.to_string());
        table.by_name.insert(name.to_string(), id);
        ResourceId(id)
    }

    /// Returns the string this id was interned from.
    pub fn name(self) -> String {
        if self == Self::INVALID {
            return String::new();
        }
        let table = table().lock().expect("resource intern table poisoned");
        table.names[self.0 as usize].clone()
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
