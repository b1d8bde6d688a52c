// Typed view model of the element sets shown on a record page

use serde::{Deserialize, Serialize};

/// Coordinates of one element, e.g. Dublin Core / Relation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementKey {
    pub element_set: String,
    pub element: String,
}

impl ElementKey {
    pub fn new(element_set: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            element_set: element_set.into(),
            element: element.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayElement {
    pub name: String,
    pub texts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSet {
    pub name: String,
    pub elements: Vec<DisplayElement>,
}

/// Ordered element sets with their elements, as handed over by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementsBySet {
    sets: Vec<ElementSet>,
}

impl ElementsBySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append texts to an element, creating the set and element as needed
    pub fn insert(&mut self, key: &ElementKey, texts: Vec<String>) {
        let set_index = match self.sets.iter().position(|s| s.name == key.element_set) {
            Some(index) => index,
            None => {
                self.sets.push(ElementSet {
                    name: key.element_set.clone(),
                    elements: Vec::new(),
                });
                self.sets.len() - 1
            }
        };

        let set = &mut self.sets[set_index];
        match set.elements.iter_mut().find(|e| e.name == key.element) {
            Some(element) => element.texts.extend(texts),
            None => set.elements.push(DisplayElement {
                name: key.element.clone(),
                texts,
            }),
        }
    }

    pub fn get(&self, key: &ElementKey) -> Option<&DisplayElement> {
        self.sets
            .iter()
            .find(|s| s.name == key.element_set)?
            .elements
            .iter()
            .find(|e| e.name == key.element)
    }

    pub fn contains(&self, key: &ElementKey) -> bool {
        self.get(key).is_some()
    }

    /// Remove one element, returning it. The set itself stays even when empty.
    pub fn remove(&mut self, key: &ElementKey) -> Option<DisplayElement> {
        let set = self.sets.iter_mut().find(|s| s.name == key.element_set)?;
        let index = set.elements.iter().position(|e| e.name == key.element)?;
        Some(set.elements.remove(index))
    }

    pub fn sets(&self) -> &[ElementSet] {
        &self.sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let relation = ElementKey::new("Dublin Core", "Relation");
        let title = ElementKey::new("Dublin Core", "Title");

        let mut elements = ElementsBySet::new();
        elements.insert(&title, vec!["A letter".to_string()]);
        elements.insert(&relation, vec!["full:1.jpg".to_string()]);
        elements.insert(&relation, vec!["thumb:1t.jpg".to_string()]);

        assert_eq!(elements.get(&relation).unwrap().texts.len(), 2);

        let removed = elements.remove(&relation).unwrap();
        assert_eq!(removed.name, "Relation");
        assert!(!elements.contains(&relation));
        assert!(elements.contains(&title));
        assert_eq!(elements.sets().len(), 1);

        assert!(elements.remove(&relation).is_none());
        assert!(elements.remove(&ElementKey::new("Item Type Metadata", "Text")).is_none());
    }
}
