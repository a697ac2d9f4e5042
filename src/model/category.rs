use crate::model::EntryType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Represents a single row from the categories table.
#[derive(Default, Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub(crate) id: String,
    /// Should match the type of the bills filed under this category, this is not enforced.
    #[serde(rename = "type")]
    pub(crate) r#type: EntryType,
    pub(crate) name: String,
}

impl Category {
    pub fn new(id: impl Into<String>, r#type: EntryType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            r#type,
            name: name.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn r#type(&self) -> EntryType {
        self.r#type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// What the index knows about a category.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    #[serde(rename = "type")]
    pub r#type: EntryType,
    pub name: String,
}

/// Lookup from category id to its type and name. It is rebuilt in full whenever the categories
/// table changes.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoriesIndex(HashMap<String, CategoryEntry>);

impl CategoriesIndex {
    pub fn build(categories: &[Category]) -> Self {
        Self(
            categories
                .iter()
                .map(|c| {
                    (
                        c.id.clone(),
                        CategoryEntry {
                            r#type: c.r#type,
                            name: c.name.clone(),
                        },
                    )
                })
                .collect(),
        )
    }

    pub fn get(&self, id: &str) -> Option<&CategoryEntry> {
        self.0.get(id)
    }

    pub fn name(&self, id: &str) -> Option<&str> {
        self.get(id).map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_index() {
        let categories = vec![
            Category::new("1bcddudhmh", EntryType::Expenditure, "车贷"),
            Category::new("salary", EntryType::Revenue, "Salary"),
        ];
        let index = CategoriesIndex::build(&categories);
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.get("1bcddudhmh"),
            Some(&CategoryEntry {
                r#type: EntryType::Expenditure,
                name: "车贷".to_string()
            })
        );
        assert_eq!(index.name("salary"), Some("Salary"));
        assert_eq!(index.name("missing"), None);
    }

    #[test]
    fn test_later_rows_win() {
        let categories = vec![
            Category::new("a", EntryType::Expenditure, "Old"),
            Category::new("a", EntryType::Expenditure, "New"),
        ];
        let index = CategoriesIndex::build(&categories);
        assert_eq!(index.len(), 1);
        assert_eq!(index.name("a"), Some("New"));
    }

    #[test]
    fn test_category_json() {
        let category: Category =
            serde_json::from_str(r#"{"id":"1bcddudhmh","type":0,"name":"车贷"}"#).unwrap();
        assert_eq!(category, Category::new("1bcddudhmh", EntryType::Expenditure, "车贷"));
    }
}
