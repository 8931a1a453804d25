use super::question::CategoryName;

/// Ordered mapping from category to the number of questions to draw.
///
/// Insertion order is preserved; it drives the planner's per-category
/// iteration and keeps logs stable. Setting a category twice replaces the
/// earlier count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryQuotas {
    entries: Vec<(CategoryName, usize)>,
}

impl CategoryQuotas {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the requested draw count for a category.
    pub fn set(&mut self, category: CategoryName, count: usize) {
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| *name == category) {
            entry.1 = count;
        } else {
            self.entries.push((category, count));
        }
    }

    /// Builder-style `set`.
    #[must_use]
    pub fn with(mut self, category: CategoryName, count: usize) -> Self {
        self.set(category, count);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CategoryName, usize)> {
        self.entries.iter().map(|(name, count)| (name, *count))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all requested counts, before any clamping to supply.
    #[must_use]
    pub fn total_requested(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }
}

impl FromIterator<(CategoryName, usize)> for CategoryQuotas {
    fn from_iter<T: IntoIterator<Item = (CategoryName, usize)>>(iter: T) -> Self {
        let mut quotas = Self::new();
        for (category, count) in iter {
            quotas.set(category, count);
        }
        quotas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str) -> CategoryName {
        CategoryName::new(name).unwrap()
    }

    #[test]
    fn preserves_insertion_order() {
        let quotas = CategoryQuotas::new()
            .with(category("2.Marinarie"), 7)
            .with(category("1.RND"), 10);

        let names: Vec<&str> = quotas.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["2.Marinarie", "1.RND"]);
        assert_eq!(quotas.total_requested(), 17);
    }

    #[test]
    fn reinsert_replaces_count() {
        let quotas = CategoryQuotas::new()
            .with(category("1.RND"), 10)
            .with(category("1.RND"), 3);

        assert_eq!(quotas.len(), 1);
        assert_eq!(quotas.total_requested(), 3);
    }
}
