//! String-backed enums.
//!
//! Enums stored in TEXT columns convert to and from their column value with
//! [`text_enum!`]; sqlx rows read them through `#[sqlx(try_from = "String")]`.

/// A TEXT value that does not name any variant of the target enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `as_str`, `FromStr`, `TryFrom<String>` and `Display` for an
/// enum stored as TEXT. The TEXT values must match the serde names.
macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::text_enum::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err($crate::text_enum::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $ty {
            type Error = $crate::text_enum::UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use text_enum;

#[cfg(test)]
mod tests {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Shade {
        Light,
        Dark,
    }

    text_enum!(Shade, "shade", {
        Light => "light",
        Dark => "dark",
    });

    #[test]
    fn converts_both_ways() {
        assert_eq!(Shade::Dark.as_str(), "dark");
        assert_eq!("light".parse::<Shade>(), Ok(Shade::Light));
        assert_eq!(Shade::Light.to_string(), "light");
    }

    #[test]
    fn names_the_kind_on_unknown_values() {
        let err = Shade::try_from("grey".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "unknown shade 'grey'");
    }
}
