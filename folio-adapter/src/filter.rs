use folio::{Keyed, ListVersion};

use crate::Project;

/// The category that matches every project.
pub const ALL_CATEGORIES: &str = "All";

/// Search and category filtering for the project listing.
///
/// Every change that alters which projects are listed (search term, category, or a new fetch of
/// the source data) moves [`version`](Self::version) forward, which is what a
/// [`crate::RevealController`] keys its reset on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    search: String,
    category: Option<String>,
    source_generation: Option<u64>,
    version: ListVersion,
}

impl ProjectFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// The selected category, `None` meaning [`ALL_CATEGORIES`].
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn version(&self) -> ListVersion {
        self.version
    }

    fn bump(&mut self) {
        self.version = self.version.next();
    }

    /// Returns `true` if the term changed.
    pub fn set_search(&mut self, term: impl Into<String>) -> bool {
        let term = term.into();
        if term == self.search {
            return false;
        }
        self.search = term;
        self.bump();
        true
    }

    pub fn clear_search(&mut self) -> bool {
        self.set_search(String::new())
    }

    /// Selects a category by label; [`ALL_CATEGORIES`] clears the selection.
    pub fn select_category(&mut self, category: &str) -> bool {
        let next = (category != ALL_CATEGORIES).then(|| category.to_string());
        if next == self.category {
            return false;
        }
        self.category = next;
        self.bump();
        true
    }

    /// Records which fetch the listed data came from (see `QueryResult::data_generation`).
    ///
    /// A pending refetch still lists the previous data under the previous data generation, so
    /// the version only moves once new data is actually published.
    pub fn sync_source(&mut self, generation: u64) -> bool {
        if self.source_generation == Some(generation) {
            return false;
        }
        self.source_generation = Some(generation);
        self.bump();
        true
    }

    /// Case-insensitive match of the search term against name, description and stack tags,
    /// combined with an exact category match.
    pub fn matches(&self, project: &Project) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = project.name.to_lowercase().contains(&needle)
            || project.description.to_lowercase().contains(&needle)
            || project
                .stack
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle));
        let matches_category = self
            .category
            .as_deref()
            .is_none_or(|category| project.kind == category);
        matches_search && matches_category
    }

    pub fn apply<'a>(&self, items: &'a [Keyed<Project>]) -> Vec<&'a Keyed<Project>> {
        items.iter().filter(|item| self.matches(&item.data)).collect()
    }
}

/// [`ALL_CATEGORIES`] followed by every distinct project type, in first-seen order.
pub fn categories(items: &[Keyed<Project>]) -> Vec<String> {
    let mut out = vec![ALL_CATEGORIES.to_string()];
    for item in items {
        if !out.iter().any(|c| *c == item.data.kind) {
            out.push(item.data.kind.clone());
        }
    }
    out
}
