//! Parent-chain lookups over a snapshot of the category collection.
//!
//! Stored data may already contain cycles or dangling parents, so every
//! walk tracks the ids it has visited and stops on a repeat.

use std::collections::{HashMap, HashSet};

use mongodb::bson::oid::ObjectId;

use crate::models::{Category, CategoryView, ParentRef, PropertyDef};

pub struct CategoryTree<'a> {
    categories: &'a [Category],
    by_id: HashMap<ObjectId, usize>,
}

impl<'a> CategoryTree<'a> {
    pub fn new(categories: &'a [Category]) -> Self{
        let by_id = categories
            .iter()
            .enumerate()
            .filter_map(|(index, c)| c.id.map(|id| (id, index)))
            .collect();
        Self { categories, by_id }
    }

    pub fn get(&self, id: ObjectId) -> Option<&'a Category>{
        self.by_id.get(&id).map(|&index| &self.categories[index])
    }

    /// `start` followed by its ancestors, nearest first.
    pub fn ancestry(&self, start: ObjectId) -> Vec<&'a Category>{
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if !seen.insert(id) {
                break;
            }
            let Some(category) = self.get(id) else {
                break;
            };
            chain.push(category);
            current = category.parent;
        }
        chain
    }

    /// Properties a product in `start` has to fill: its own, then each ancestor's.
    pub fn inherited_properties(&self, start: ObjectId) -> Vec<PropertyDef>{
        self.ancestry(start)
            .into_iter()
            .flat_map(|c| c.properties.iter().cloned())
            .collect()
    }

    /// `root` and every category below it.
    pub fn descendants(&self, root: ObjectId) -> Vec<ObjectId>{
        let mut children: HashMap<ObjectId, Vec<ObjectId>> = HashMap::new();
        for category in self.categories {
            if let (Some(id), Some(parent)) = (category.id, category.parent) {
                children.entry(parent).or_default().push(id);
            }
        }

        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            out.push(id);
            if let Some(kids) = children.get(&id) {
                stack.extend(kids.iter().rev().copied());
            }
        }
        out
    }

    /// Whether giving `id` the parent `new_parent` would close a loop.
    pub fn would_cycle(&self, id: ObjectId, new_parent: ObjectId) -> bool{
        new_parent == id || self.ancestry(new_parent).iter().any(|c| c.id == Some(id))
    }

    /// List view with each parent populated one level deep.
    pub fn populated_view(&self, category: &Category) -> CategoryView{
        let mut view = CategoryView::from(category);
        view.parent = category
            .parent
            .and_then(|p| self.get(p))
            .map(|parent| ParentRef::Populated(Box::new(CategoryView::from(parent))));
        view
    }
}
