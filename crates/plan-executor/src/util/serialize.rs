use {
    alloy::primitives::U256,
    serde::{Deserializer, Serializer, de},
    serde_with::{DeserializeAs, SerializeAs},
    std::fmt,
};

/// Serialize [`U256`] as a decimal string and deserialize it from a decimal
/// string, a `0x` prefixed hex string or a plain JSON number. Aggregators are
/// not consistent about which of those they return.
#[derive(Debug)]
pub struct HexOrDecimalU256;

impl<'de> DeserializeAs<'de, U256> for HexOrDecimalU256 {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        struct Visitor;

        impl de::Visitor<'_> for Visitor {
            type Value = U256;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    formatter,
                    "a u256 encoded either as 0x hex prefixed or decimal encoded string"
                )
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(U256::from(value))
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let s = s.trim();
                match s.strip_prefix("0x") {
                    Some(hex) => U256::from_str_radix(hex, 16).map_err(|err| {
                        E::custom(format!("failed to decode {s:?} as hex u256: {err}"))
                    }),
                    None => U256::from_str_radix(s, 10).map_err(|err| {
                        E::custom(format!("failed to decode {s:?} as decimal u256: {err}"))
                    }),
                }
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

impl SerializeAs<U256> for HexOrDecimalU256 {
    fn serialize_as<S: Serializer>(source: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde::Deserialize, serde_with::serde_as};

    #[serde_as]
    #[derive(Deserialize)]
    struct Value(#[serde_as(as = "HexOrDecimalU256")] U256);

    fn parse(json: &str) -> Result<U256, serde_json::Error> {
        serde_json::from_str::<Value>(json).map(|value| value.0)
    }

    #[test]
    fn accepts_all_encodings() {
        assert_eq!(parse(r#""0x2a""#).unwrap(), U256::from(42));
        assert_eq!(parse(r#""42""#).unwrap(), U256::from(42));
        assert_eq!(parse("42").unwrap(), U256::from(42));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse(r#""0xzz""#).is_err());
        assert!(parse(r#""forty two""#).is_err());
    }
}
