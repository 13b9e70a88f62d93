//! Macros for reducing boilerplate when defining entities

/// Implement [`Entity`](crate::core::entity::Entity) for a struct that carries
/// the common `id`, `created_at` and `updated_at` fields.
///
/// An optional fourth argument names a function returning the seed records.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Debug, Serialize, Deserialize)]
/// pub struct Bookmark {
///     pub id: EntityId,
///     pub created_at: DateTime<Utc>,
///     pub updated_at: DateTime<Utc>,
///     pub url: String,
/// }
///
/// impl_entity!(Bookmark, "bookmarks", "bookmark");
/// impl_entity!(Post, "posts", "post", sample_posts);
/// ```
#[macro_export]
macro_rules! impl_entity {
    (@impl $type:ident, $plural:expr, $singular:expr, { $($extra:tt)* }) => {
        impl $crate::core::entity::Entity for $type {
            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $singular
            }

            fn id(&self) -> $crate::core::entity::EntityId {
                self.id
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.updated_at
            }

            fn set_updated_at(&mut self, at: ::chrono::DateTime<::chrono::Utc>) {
                self.updated_at = at;
            }

            $($extra)*
        }
    };
    ($type:ident, $plural:expr, $singular:expr) => {
        $crate::impl_entity!(@impl $type, $plural, $singular, {});
    };
    ($type:ident, $plural:expr, $singular:expr, $seed:path) => {
        $crate::impl_entity!(@impl $type, $plural, $singular, {
            fn seed() -> Vec<Self> {
                $seed()
            }
        });
    };
}
