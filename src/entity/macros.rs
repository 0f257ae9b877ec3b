/// Declares a record struct together with its `<Name>Patch` partial type.
///
/// Every field of the record becomes an `Option` on the patch, and
/// [`ShallowMerge`](crate::entity::ShallowMerge) is implemented by overwriting
/// exactly the fields that are `Some`. A nested struct field is therefore
/// replaced as a whole.
///
/// Outer attributes are applied to both structs, so keep them to `serde`
/// container attributes; field attributes only land on the record.
///
/// ```ignore
/// entity_record! {
///     #[serde(rename_all = "camelCase")]
///     pub struct Gauge {
///         pub id: String,
///         pub reading: i64,
///     }
/// }
/// ```
#[macro_export]
macro_rules! entity_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty
            ),+ $(,)?
        }
    ) => {
        $crate::paste::paste! {
            #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
            $(#[$meta])*
            $vis struct $name {
                $(
                    $(#[$field_meta])*
                    $field_vis $field: $field_ty,
                )+
            }

            #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
            $(#[$meta])*
            $vis struct [<$name Patch>] {
                $(
                    #[serde(default, skip_serializing_if = "Option::is_none")]
                    pub $field: Option<$field_ty>,
                )+
            }

            impl [<$name Patch>] {
                /// Returns `true` when the patch carries no field updates.
                pub fn is_empty(&self) -> bool {
                    true $(
                        && self.$field.is_none()
                    )+
                }

                /// Names of the fields this patch overwrites, in declaration order.
                pub fn changed_fields(&self) -> Vec<&'static str> {
                    let mut fields = Vec::new();
                    $(
                        if self.$field.is_some() {
                            fields.push(stringify!($field));
                        }
                    )+
                    fields
                }
            }

            impl $crate::entity::ShallowMerge for $name {
                type Patch = [<$name Patch>];

                fn merge(&mut self, patch: Self::Patch) {
                    $(
                        if let Some(value) = patch.$field {
                            self.$field = value;
                        }
                    )+
                }
            }
        }
    };
}
