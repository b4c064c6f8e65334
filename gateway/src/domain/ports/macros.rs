//! Defines helper macros for generating domain port error enums.
//!
//! Each variant names the [`ErrorKind`](crate::domain::ErrorKind) it folds
//! into, so adapters get a `From<PortError> for GatewayError` conversion for
//! free and the taxonomy stays closed.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $kind:ident : $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*

            /// Gateway error kind this failure folds into.
            pub fn kind(&self) -> $crate::domain::ErrorKind {
                match self {
                    $( Self::$variant { .. } => $crate::domain::ErrorKind::$kind, )*
                }
            }
        }

        impl From<$name> for $crate::domain::GatewayError {
            fn from(error: $name) -> Self {
                $crate::domain::GatewayError::new(error.kind(), error.to_string())
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use crate::domain::{ErrorKind, GatewayError};

    define_port_error! {
        pub enum SamplePortError {
            Offline { message: String } => UpstreamUnavailable: "offline: {message}",
            Refused { status: u16 } => Authentication: "refused with {status}",
            Garbled { message: String, bytes: usize } => Upstream: "garbled: {message} ({bytes} bytes)",
            Gone => NotFound: "gone",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = SamplePortError::offline("dns");
        assert_eq!(err.to_string(), "offline: dns");
    }

    #[test]
    fn constructors_support_mixed_and_unit_variants() {
        assert_eq!(
            SamplePortError::garbled("eof", 12_usize).to_string(),
            "garbled: eof (12 bytes)"
        );
        assert_eq!(SamplePortError::gone().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn conversion_keeps_kind_and_message() {
        let err: GatewayError = SamplePortError::refused(401_u16).into();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.message(), "refused with 401");
    }
}
