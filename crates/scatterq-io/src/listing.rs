//! Accumulates paginated listing responses into one [`Listing`].
//!
//! Pages may legitimately be empty (a trailing page, or a page whose keys were
//! all filtered). Emptiness of the scope is only decided in [`ListingBuilder::finish`].

use scatterq_core::config::Scope;
use scatterq_core::error::{Error, Result};
use scatterq_core::types::{Listing, ObjectDescriptor};

#[derive(Debug, Default)]
pub struct ListingBuilder {
    objects: Vec<ObjectDescriptor>,
    total_bytes: u64,
    pages: usize,
}

impl ListingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one page, skipping directory markers.
    pub fn push_page<I>(&mut self, page: I)
    where
        I: IntoIterator<Item = ObjectDescriptor>,
    {
        self.pages += 1;
        for obj in page {
            if obj.key.is_empty() || obj.key.ends_with('/') {
                continue;
            }
            self.total_bytes += obj.size;
            self.objects.push(obj);
        }
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn finish(self, scope: &Scope) -> Result<Listing> {
        if self.objects.is_empty() {
            return Err(Error::EmptyScope(scope.to_string()));
        }
        Ok(Listing {
            total_objects: self.objects.len() as u64,
            total_bytes: self.total_bytes,
            objects: self.objects,
        })
    }
}
