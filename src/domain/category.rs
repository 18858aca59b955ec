use serde::Deserialize;

/// An establishment category in the search API's taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    /// Opaque identifier sent to the API
    pub id: String,
    /// Human-readable name written to output records
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Parse a `ID=NAME` pair as given on the command line
    pub fn parse_pair(s: &str) -> Result<Self, String> {
        let (id, name) = s
            .split_once('=')
            .ok_or_else(|| format!("expected ID=NAME, got '{}'", s))?;
        let (id, name) = (id.trim(), name.trim());
        if id.is_empty() || name.is_empty() {
            return Err(format!("empty category id or name in '{}'", s));
        }
        Ok(Self::new(id, name))
    }
}

/// Category id -> name mapping that iterates in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMap {
    categories: Vec<Category>,
}

impl CategoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a category, replacing the name in place if the id exists
    pub fn insert(&mut self, category: Category) {
        match self.categories.iter_mut().find(|c| c.id == category.id) {
            Some(existing) => existing.name = category.name,
            None => self.categories.push(category),
        }
    }

    /// Human-readable name for a category id
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl FromIterator<Category> for CategoryMap {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut map = CategoryMap::new();
        for category in iter {
            map.insert(category);
        }
        map
    }
}

impl<'a> IntoIterator for &'a CategoryMap {
    type Item = &'a Category;
    type IntoIter = std::slice::Iter<'a, Category>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
