//! Keyword conversions for small configuration enums
//!
//! Backends, log formats and response kinds are configured through plain
//! strings (environment variables, TOML/JSON files). This macro gives each of
//! those enums a canonical keyword, `Display`, and case-insensitive
//! `FromStr`.
//!
//! # Example
//!
//! ```rust
//! use agrm_domain::impl_keyword_enum;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Backend {
//!     Memory,
//!     File,
//! }
//!
//! impl_keyword_enum!(Backend {
//!     Memory => "memory",
//!     File => "file",
//! });
//!
//! assert_eq!(Backend::File.as_str(), "file");
//! assert_eq!("MEMORY".parse::<Backend>(), Ok(Backend::Memory));
//! ```

/// Implements `as_str`, `Display` and `FromStr` for keyword enums
///
/// Keywords must be lowercase; parsing lowercases its input first, so
/// `"JSON"`, `"Json"` and `"json"` all resolve to the same variant.
#[macro_export]
macro_rules! impl_keyword_enum {
    ($enum_name:ident { $($variant:ident => $keyword:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical keyword for this variant.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $keyword,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($keyword => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
