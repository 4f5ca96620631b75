//! Macros for reducing boilerplate when defining entities
//!
//! These macros generate the struct, the static schema and the per-field
//! getter/setter table each entity type needs.

/// Define an entity struct together with its [`Entity`](crate::core::entity::Entity) implementation
///
/// Attribute classes are listed by field name. The optional `owner` names the
/// field holding the owning user id (`i64` or `Option<i64>`).
///
/// # Example
///
/// ```rust,ignore
/// use accountlink::impl_entity;
///
/// impl_entity!(
///     Playlist,
///     "playlist",
///     key: [id],
///     public: [id, title],
///     mutable: [title],
///     filterable: [user_id],
///     owner: user_id,
///     {
///         id: String,
///         user_id: i64,
///         title: Option<String>,
///     }
/// );
/// ```
#[macro_export]
macro_rules! impl_entity {
    (
        $(#[$meta:meta])*
        $type:ident,
        $collection:literal,
        key: [ $( $key:ident ),+ $(,)? ],
        public: [ $( $public:ident ),* $(,)? ],
        mutable: [ $( $mutable:ident ),* $(,)? ],
        filterable: [ $( $filterable:ident ),* $(,)? ],
        $( owner: $owner:ident, )?
        {
            $( $(#[$field_meta:meta])* $field:ident : $field_type:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $type {
            $( $(#[$field_meta])* pub $field : $field_type ),*
        }

        impl $crate::core::entity::Entity for $type {
            fn schema() -> &'static $crate::core::entity::EntitySchema {
                static SCHEMA: $crate::core::entity::EntitySchema =
                    $crate::core::entity::EntitySchema {
                        name: $collection,
                        key: &[ $( stringify!($key) ),+ ],
                        fields: &[ $( stringify!($field) ),* ],
                        public: &[ $( stringify!($public) ),* ],
                        mutable: &[ $( stringify!($mutable) ),* ],
                        filterable: &[ $( stringify!($filterable) ),* ],
                    };
                &SCHEMA
            }

            fn field_value(&self, field: &str) -> Option<$crate::core::field::FieldValue> {
                match field {
                    $( stringify!($field) => Some(
                        <$field_type as $crate::core::field::FieldType>::to_field_value(&self.$field)
                    ), )*
                    _ => None,
                }
            }

            fn assign(
                &mut self,
                field: &str,
                value: $crate::core::field::FieldValue,
            ) -> Result<(), $crate::core::error::ControllerError> {
                match field {
                    $( stringify!($field) => {
                        self.$field =
                            <$field_type as $crate::core::field::FieldType>::from_field_value(value)
                                .map_err(|reason| {
                                    $crate::core::error::ControllerError::invalid_value(
                                        $collection,
                                        field,
                                        reason,
                                    )
                                })?;
                        Ok(())
                    } )*
                    _ => Err($crate::core::error::ControllerError::unknown_field($collection, field)),
                }
            }

            fn blank() -> Self {
                Self::default()
            }

            $(
                fn owner_id(&self) -> Option<i64> {
                    $crate::core::entity::OwnerId::owner_id(&self.$owner)
                }
            )?
        }
    };
}
