//! `define_port_error!` generates the error enums returned by driven ports.
//!
//! Each variant gets a snake_case constructor whose fields accept
//! `impl Into<T>`, so adapters can write
//! `BookingRepositoryError::query(err.to_string())` or
//! `BookingRepositoryError::capacity_exceeded(2_u32, 3_u32)`.

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
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
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
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum SeatPortError {
            Exhausted => "no seats left",
            Short { remaining: u32, requested: u32 } =>
                "only {remaining} seats remain, {requested} requested",
            Query { message: String } => "seat query failed: {message}",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(SeatPortError::exhausted(), SeatPortError::Exhausted);
        assert_eq!(SeatPortError::exhausted().to_string(), "no seats left");
    }

    #[test]
    fn struct_variants_keep_field_order() {
        let err = SeatPortError::short(2_u32, 5_u32);
        assert_eq!(err.to_string(), "only 2 seats remain, 5 requested");
    }

    #[test]
    fn string_fields_accept_borrowed_input() {
        let err = SeatPortError::query("relation \"events\" does not exist");
        assert!(err.to_string().contains("events"));
    }
}
