//! Macros for defining typed numeric ID types.

/// Macro to define a typed numeric ID.
///
/// This generates a newtype wrapper around `u64` with:
/// - A `KIND` constant used in error messages
/// - `new()` and `get()` accessors
/// - `Display` and `FromStr` implementations (plain decimal)
/// - `Serialize` and `Deserialize` implementations (JSON number, or a quoted
///   number when the ID is a map key)
/// - `Ord`, `Hash`, and other standard traits
///
/// # Example
///
/// ```ignore
/// define_id!(StoreId, "store");
///
/// let id = StoreId::new(5);
/// let parsed: StoreId = "5".parse()?;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $kind:literal) => {
        #[doc = concat!("A typed ", $kind, " ID.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(u64);

        impl $name {
            /// The resource kind, used in error messages.
            pub const KIND: &'static str = $kind;

            /// Creates an ID from its raw value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw value.
            #[must_use]
            pub const fn get(&self) -> u64 {
                self.0
            }

            /// Parses an ID from its decimal form.
            pub fn parse(s: &str) -> Result<Self, $crate::IdError> {
                if s.is_empty() {
                    return Err($crate::IdError::Empty);
                }

                s.parse::<u64>()
                    .map(Self)
                    .map_err(|e| $crate::IdError::InvalidNumber {
                        kind: Self::KIND,
                        value: s.to_string(),
                        reason: e.to_string(),
                    })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_u64(self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                <u64 as serde::Deserialize>::deserialize(deserializer).map(Self)
            }
        }
    };
}
