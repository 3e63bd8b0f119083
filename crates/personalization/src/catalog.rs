//! User and product catalogs: the identities the rating matrix may refer to,
//! plus display attributes for the presentation layer.

use affinity_core::types::{ItemId, Product, User, UserId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    users: BTreeMap<UserId, User>,
    products: BTreeMap<ItemId, Product>,
    /// Product ids ordered by (name, id); the fallback ranking walks this.
    by_name: Vec<ItemId>,
}

impl Catalog {
    /// Build a catalog. A repeated id replaces the earlier entry.
    pub fn new(
        users: impl IntoIterator<Item = User>,
        products: impl IntoIterator<Item = Product>,
    ) -> Self {
        let users: BTreeMap<_, _> = users.into_iter().map(|u| (u.user_id, u)).collect();
        let products: BTreeMap<_, _> = products
            .into_iter()
            .map(|p| (p.product_id, p))
            .collect();

        let mut by_name: Vec<ItemId> = products.keys().copied().collect();
        by_name.sort_by(|a, b| {
            products[a]
                .name
                .cmp(&products[b].name)
                .then_with(|| a.cmp(b))
        });

        Self {
            users,
            products,
            by_name,
        }
    }

    pub fn user(&self, user_id: UserId) -> Option<&User> {
        self.users.get(&user_id)
    }

    pub fn product(&self, item_id: ItemId) -> Option<&Product> {
        self.products.get(&item_id)
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.users.contains_key(&user_id)
    }

    pub fn contains_product(&self, item_id: ItemId) -> bool {
        self.products.contains_key(&item_id)
    }

    /// Users in ascending id order.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// Products in ascending id order.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Products ordered by name, then id.
    pub fn products_by_name(&self) -> impl Iterator<Item = &Product> {
        self.by_name.iter().map(move |id| &self.products[id])
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }
}
