//! In-memory store for tests/dev.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use storefront_auth::Role;
use storefront_catalog::{
    CustomerLevel, Discount, Feedback, FeedbackAuthor, Image, Money, NewFeedback, Product,
    ProductSubtype, ProductType,
};
use storefront_core::{FeedbackId, ProductId, UserId};

use super::{
    CatalogStore, CredentialStore, FeedbackStore, ImageKind, NewUser, StoreError, StoreResult,
    UserRecord,
};

pub const DEFAULT_FIRST_NAME: &str = "Новый";
pub const DEFAULT_LAST_NAME: &str = "Пользователь";

#[derive(Debug, Clone)]
struct FeedbackRow {
    id: FeedbackId,
    product_id: ProductId,
    author_id: UserId,
    liked_text: String,
    disliked_text: String,
    admin_comment: Option<String>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, UserRecord>,
    last_user_id: i64,
    levels: Vec<CustomerLevel>,
    product_types: Vec<ProductType>,
    products: BTreeMap<ProductId, Product>,
    feedback: BTreeMap<FeedbackId, FeedbackRow>,
    last_feedback_id: i64,
    images: HashMap<ImageKind, Vec<Image>>,
}

impl State {
    fn lowest_level(&self) -> Option<&CustomerLevel> {
        self.levels.iter().min_by_key(|l| l.level_number)
    }

    fn join(&self, row: &FeedbackRow) -> Option<Feedback> {
        let author = self.users.get(&row.author_id)?;
        Some(Feedback {
            id: row.id,
            product_id: row.product_id,
            author_id: row.author_id,
            author: FeedbackAuthor {
                first_name: author.first_name.clone(),
                last_name: author.last_name.clone(),
            },
            liked_text: row.liked_text.clone(),
            disliked_text: row.disliked_text.clone(),
            admin_comment: row.admin_comment.clone(),
            updated_at: row.updated_at,
        })
    }
}

/// Process-local store guarded by a single `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    /// An empty store with no customer levels; registration fails until
    /// levels are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Customer levels plus a small demo catalog.
    pub fn seeded() -> Self {
        let state = State {
            levels: default_levels(),
            product_types: demo_product_types(),
            products: demo_products()
                .into_iter()
                .map(|p| (p.id, p))
                .collect(),
            images: demo_images(),
            ..State::default()
        };
        Self {
            inner: RwLock::new(state),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }
}

fn insert_user(state: &mut State, new_user: NewUser) -> StoreResult<UserRecord> {
    if state.users.values().any(|u| u.login == new_user.login) {
        return Err(StoreError::Conflict(format!(
            "login '{}' already exists",
            new_user.login
        )));
    }
    let level = state
        .lowest_level()
        .cloned()
        .ok_or_else(|| StoreError::Backend("no customer levels configured".into()))?;

    state.last_user_id += 1;
    let record = UserRecord {
        id: UserId::new(state.last_user_id),
        login: new_user.login,
        password_hash: new_user.password_hash,
        role: Role::User,
        first_name: DEFAULT_FIRST_NAME.to_string(),
        last_name: DEFAULT_LAST_NAME.to_string(),
        phone_number: None,
        email: None,
        total_purchases: Money::ZERO,
        level,
    };
    state.users.insert(record.id, record.clone());
    Ok(record)
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_by_login(&self, login: &str) -> StoreResult<Option<UserRecord>> {
        let state = self.read()?;
        Ok(state.users.values().find(|u| u.login == login).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<UserRecord>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<UserRecord> {
        let mut state = self.write()?;
        insert_user(&mut state, new_user)
    }

    async fn update_personal_data(
        &self,
        id: UserId,
        first_name: &str,
        last_name: &str,
    ) -> StoreResult<UserRecord> {
        let mut state = self.write()?;
        let user = state.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.first_name = first_name.to_string();
        user.last_name = last_name.to_string();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let mut state = self.write()?;
        state.users.remove(&id).ok_or(StoreError::NotFound)?;
        state.feedback.retain(|_, f| f.author_id != id);
        Ok(())
    }

    async fn next_level(&self, current: &CustomerLevel) -> StoreResult<Option<CustomerLevel>> {
        let state = self.read()?;
        Ok(state
            .levels
            .iter()
            .find(|l| l.level_number == current.level_number + 1)
            .cloned())
    }
}

#[async_trait]
impl FeedbackStore for InMemoryStore {
    async fn create_feedback(&self, new_feedback: NewFeedback) -> StoreResult<Feedback> {
        let mut state = self.write()?;
        if !state.users.contains_key(&new_feedback.author_id) {
            return Err(StoreError::NotFound);
        }
        if !state.products.contains_key(&new_feedback.product_id) {
            return Err(StoreError::NotFound);
        }
        state.last_feedback_id += 1;
        let row = FeedbackRow {
            id: FeedbackId::new(state.last_feedback_id),
            product_id: new_feedback.product_id,
            author_id: new_feedback.author_id,
            liked_text: new_feedback.liked_text,
            disliked_text: new_feedback.disliked_text,
            admin_comment: None,
            updated_at: Utc::now(),
        };
        let feedback = state.join(&row).ok_or(StoreError::NotFound)?;
        state.feedback.insert(row.id, row);
        Ok(feedback)
    }

    async fn list_for_product(&self, product_id: ProductId) -> StoreResult<Vec<Feedback>> {
        let state = self.read()?;
        Ok(state
            .feedback
            .values()
            .filter(|f| f.product_id == product_id)
            .filter_map(|f| state.join(f))
            .collect())
    }

    async fn set_admin_comment(
        &self,
        product_id: ProductId,
        feedback_id: FeedbackId,
        comment: &str,
    ) -> StoreResult<Feedback> {
        let mut state = self.write()?;
        let row = state
            .feedback
            .get_mut(&feedback_id)
            .filter(|f| f.product_id == product_id)
            .ok_or(StoreError::NotFound)?;
        row.admin_comment = Some(comment.to_string());
        row.updated_at = Utc::now();
        let row = row.clone();
        state.join(&row).ok_or(StoreError::NotFound)
    }

    async fn delete_feedback(&self, product_id: ProductId, feedback_id: FeedbackId) -> StoreResult<()> {
        let mut state = self.write()?;
        match state.feedback.get(&feedback_id) {
            Some(f) if f.product_id == product_id => {
                state.feedback.remove(&feedback_id);
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn product_types(&self) -> StoreResult<Vec<ProductType>> {
        let mut types = self.read()?.product_types.clone();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn products_in_subtype(
        &self,
        type_name: &str,
        subtype_name: &str,
    ) -> StoreResult<Vec<Product>> {
        let state = self.read()?;
        Ok(state
            .products
            .values()
            .filter(|p| p.type_name == type_name && p.subtype_name == subtype_name)
            .cloned()
            .collect())
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn top_sellers(&self, limit: usize) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self.read()?.products.values().cloned().collect();
        products.sort_by(|a, b| b.number_of_sales.cmp(&a.number_of_sales));
        products.truncate(limit);
        Ok(products)
    }

    async fn images(&self, kind: ImageKind) -> StoreResult<Vec<Image>> {
        Ok(self
            .read()?
            .images
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }
}

fn default_levels() -> Vec<CustomerLevel> {
    [
        ("Новичок", 1, 0, 1),
        ("Постоянный покупатель", 5, 30_000, 2),
        ("Эксперт", 10, 100_000, 3),
    ]
    .into_iter()
    .map(|(name, pct, threshold, number)| CustomerLevel {
        name: name.to_string(),
        discount: Discount::new(pct),
        lower_threshold: Money::from_roubles(threshold),
        level_number: number,
    })
    .collect()
}

fn subtype(name: &str, image_link: &str) -> ProductSubtype {
    ProductSubtype {
        name: name.to_string(),
        image_link: image_link.to_string(),
    }
}

fn demo_product_types() -> Vec<ProductType> {
    vec![
        ProductType {
            name: "Бытовая техника".into(),
            image_link: "/static/images/types/appliances.png".into(),
            subtypes: vec![
                subtype("Для кухни", "/static/images/subtypes/kitchen.png"),
                subtype("Для дома", "/static/images/subtypes/home.png"),
            ],
        },
        ProductType {
            name: "Электроника".into(),
            image_link: "/static/images/types/electronics.png".into(),
            subtypes: vec![
                subtype("Смартфоны", "/static/images/subtypes/phones.png"),
                subtype("Ноутбуки", "/static/images/subtypes/laptops.png"),
            ],
        },
    ]
}

#[allow(clippy::too_many_arguments)]
fn product(
    id: i64,
    name: &str,
    kopecks: i64,
    type_name: &str,
    subtype_name: &str,
    stock: i32,
    rating: f64,
    sales: i64,
) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price: Money::from_kopecks(kopecks),
        description: format!("{name}: описание товара"),
        image_link: format!("/static/images/products/{id}.png"),
        quantity_in_stock: Some(stock),
        type_name: type_name.to_string(),
        subtype_name: subtype_name.to_string(),
        additional_information: String::new(),
        rating,
        number_of_sales: Some(sales),
    }
}

fn demo_products() -> Vec<Product> {
    vec![
        product(1, "Электрический чайник", 3_499_00, "Бытовая техника", "Для кухни", 12, 4.6, 310),
        product(2, "Микроволновая печь", 8_990_00, "Бытовая техника", "Для кухни", 5, 4.3, 120),
        product(3, "Пылесос", 12_490_00, "Бытовая техника", "Для дома", 7, 4.8, 205),
        product(4, "Смартфон", 29_999_00, "Электроника", "Смартфоны", 20, 4.5, 540),
        product(5, "Ноутбук", 64_990_00, "Электроника", "Ноутбуки", 3, 4.7, 95),
    ]
}

fn demo_images() -> HashMap<ImageKind, Vec<Image>> {
    let image = |name: &str, link: &str| Image {
        name: name.to_string(),
        image_link: link.to_string(),
    };
    HashMap::from([
        (
            ImageKind::MainInfo,
            vec![image("delivery", "/static/images/main/delivery.png")],
        ),
        (
            ImageKind::Promotion,
            vec![image("spring-sale", "/static/images/promo/spring.png")],
        ),
        (
            ImageKind::Service,
            vec![image("warranty", "/static/images/service/warranty.png")],
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(login: &str) -> NewUser {
        NewUser {
            login: login.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn registration_assigns_ids_and_defaults() {
        let store = InMemoryStore::seeded();
        let first = store.create_user(new_user("newTestUser")).await.unwrap();
        assert_eq!(first.id, UserId::new(1));
        assert_eq!(first.role, Role::User);
        assert_eq!(first.first_name, "Новый");
        assert_eq!(first.level.name, "Новичок");

        let second = store.create_user(new_user("another")).await.unwrap();
        assert_eq!(second.id, UserId::new(2));
    }

    #[tokio::test]
    async fn duplicate_login_conflicts() {
        let store = InMemoryStore::seeded();
        store.create_user(new_user("newTestUser")).await.unwrap();
        let err = store.create_user(new_user("newTestUser")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn empty_store_cannot_register() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.create_user(new_user("x")).await,
            Err(StoreError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn feedback_follows_author_and_product() {
        let store = InMemoryStore::seeded();
        let user = store.create_user(new_user("author")).await.unwrap();
        let product_id = ProductId::new(1);
        let created = store
            .create_feedback(NewFeedback {
                product_id,
                author_id: user.id,
                liked_text: "Хорошо".into(),
                disliked_text: "Нет".into(),
            })
            .await
            .unwrap();
        assert_eq!(created.author.display_name(), "Новый П.");

        let commented = store
            .set_admin_comment(product_id, created.id, "Спасибо")
            .await
            .unwrap();
        assert_eq!(commented.admin_comment.as_deref(), Some("Спасибо"));

        // Scoped to the product it was left on.
        assert_eq!(
            store.delete_feedback(ProductId::new(2), created.id).await,
            Err(StoreError::NotFound)
        );

        store.delete_user(user.id).await.unwrap();
        assert!(store.list_for_product(product_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn next_level_and_top_sellers() {
        let store = InMemoryStore::seeded();
        let levels = default_levels();
        let next = store.next_level(&levels[0]).await.unwrap().unwrap();
        assert_eq!(next.level_number, 2);
        assert!(store.next_level(&levels[2]).await.unwrap().is_none());

        let top = store.top_sellers(2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Смартфон");
    }
}
