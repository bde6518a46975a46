use std::fmt;

use bytes::Bytes;

/// Stable identity of a tracked image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An encoded, displayable image payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub mime: &'static str,
    pub bytes: Bytes,
}

impl Preview {
    pub fn new(mime: &'static str, bytes: impl Into<Bytes>) -> Self {
        Self {
            mime,
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub name: String,
    pub bytes: Bytes,
}

/// Where an item came from. Only archive members remember a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOrigin {
    Loose,
    Archive { path: String },
}

/// An ingested image that has not been given an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub source: SourceImage,
    pub original_preview: Preview,
    pub origin: ItemOrigin,
}

/// The converted preview lives inside `Done`, so it exists exactly when the item is done.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConversionState {
    #[default]
    Idle,
    Converting,
    Done(Preview),
}

impl ConversionState {
    pub fn is_converting(&self) -> bool {
        matches!(self, ConversionState::Converting)
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ConversionState::Done(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub id: ItemId,
    pub source: SourceImage,
    pub original_preview: Preview,
    pub state: ConversionState,
    pub archive_origin: Option<String>,
}

impl WorkItem {
    pub fn converted_preview(&self) -> Option<&Preview> {
        match &self.state {
            ConversionState::Done(preview) => Some(preview),
            _ => None,
        }
    }
}

/// Insertion-ordered collection of work items.
///
/// Ids come from a counter that survives `clear`, so an id is never handed out twice
/// for the lifetime of the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRepository {
    items: Vec<WorkItem>,
    next_id: u64,
}

impl Default for ItemRepository {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }
}

impl ItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, batch: Vec<NewItem>) -> Vec<ItemId> {
        let mut ids = Vec::with_capacity(batch.len());
        self.items.reserve(batch.len());
        for item in batch {
            let id = ItemId(self.next_id);
            self.next_id += 1;
            let archive_origin = match item.origin {
                ItemOrigin::Loose => None,
                ItemOrigin::Archive { path } => Some(path),
            };
            self.items.push(WorkItem {
                id,
                source: item.source,
                original_preview: item.original_preview,
                state: ConversionState::Idle,
                archive_origin,
            });
            ids.push(id);
        }
        ids
    }

    pub fn get(&self, id: ItemId) -> Option<&WorkItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut WorkItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn remove(&mut self, id: ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_converted(&self) -> bool {
        self.items.iter().any(|item| item.state.is_done())
    }

    pub fn converted(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter().filter(|item| item.state.is_done())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loose(name: &str) -> NewItem {
        NewItem {
            source: SourceImage {
                name: name.to_string(),
                bytes: Bytes::from_static(b"raw"),
            },
            original_preview: Preview::new("image/png", Bytes::from_static(b"raw")),
            origin: ItemOrigin::Loose,
        }
    }

    #[test]
    fn ids_survive_clear() {
        let mut repo = ItemRepository::new();
        let first = repo.append(vec![loose("a.png"), loose("b.png")]);
        repo.clear();
        let second = repo.append(vec![loose("c.png")]);
        assert!(repo.len() == 1);
        assert!(!first.contains(&second[0]));
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let mut repo = ItemRepository::new();
        let ids = repo.append(vec![loose("a.png")]);
        assert!(repo.remove(ids[0]));
        assert!(!repo.remove(ids[0]));
        assert!(repo.is_empty());
    }

    #[test]
    fn archive_origin_is_kept_only_for_archive_items() {
        let mut repo = ItemRepository::new();
        let mut member = loose("1.png");
        member.origin = ItemOrigin::Archive {
            path: "x/1.png".to_string(),
        };
        let ids = repo.append(vec![loose("a.png"), member]);
        assert_eq!(repo.get(ids[0]).unwrap().archive_origin, None);
        assert_eq!(
            repo.get(ids[1]).unwrap().archive_origin.as_deref(),
            Some("x/1.png")
        );
    }
}
