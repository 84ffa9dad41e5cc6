/// Implement [`Reflect`](crate::schema::Reflect), [`Record`](crate::schema::Record)
/// and [`RecordMut`](crate::schema::RecordMut) for a plain struct.
///
/// Fields are listed in declaration order. A field followed by
/// `=> "name[,omitempty]"` carries INI metadata and must implement
/// [`FromIni`](crate::schema::FromIni); a bare field is untagged. Untagged
/// fields never reach the INI text but still count when deciding whether the
/// record is empty.
///
/// # Examples
///
/// ```
/// use vsphere_cloud_config::{ini_record, is_empty};
///
/// #[derive(Default)]
/// struct Endpoint {
///     host: String,
///     port: i32,
///     note: String,
/// }
///
/// ini_record!(Endpoint {
///     host => "host,omitempty",
///     port => "port,omitempty",
///     note,
/// });
///
/// let endpoint = Endpoint { note: "internal".into(), ..Endpoint::default() };
/// assert!(!is_empty(&endpoint).unwrap());
/// ```
#[macro_export]
macro_rules! ini_record {
    ($ty:ty { $( $field:ident $(=> $metadata:literal)? ),* $(,)? }) => {
        impl $crate::schema::Reflect for $ty {
            fn reflect(&self) -> $crate::schema::Value<'_> {
                $crate::schema::Value::Record(self)
            }
        }

        impl $crate::schema::Record for $ty {
            fn fields(&self) -> Vec<$crate::schema::Field<'_>> {
                vec![
                    $( $crate::schema::Field {
                        ident: stringify!($field),
                        metadata: $crate::__ini_metadata!($($metadata)?),
                        value: &self.$field,
                    }, )*
                ]
            }
        }

        impl $crate::schema::RecordMut for $ty {
            #[allow(unused_variables)]
            fn assign(
                &mut self,
                name: &str,
                raw: Option<&str>,
            ) -> Result<bool, $crate::error::ValueError> {
                $( $crate::__ini_assign!(self, name, raw, $field $(, $metadata)?); )*
                Ok(false)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __ini_metadata {
    () => {
        None
    };
    ($metadata:literal) => {
        Some($metadata)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __ini_assign {
    ($self:ident, $name:ident, $raw:ident, $field:ident) => {};
    ($self:ident, $name:ident, $raw:ident, $field:ident, $metadata:literal) => {
        if $crate::schema::FieldTag::resolve(stringify!($field), Some($metadata))
            .is_some_and(|tag| tag.matches($name))
        {
            $self.$field = $crate::schema::FromIni::from_ini($raw)?;
            return Ok(true);
        }
    };
}
