// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serde support for [`SpdxExpr`], serialized as its original source string.
//!
//! Requires the `summaries` feature to be enabled.

use crate::expr::SpdxExpr;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

impl Serialize for SpdxExpr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_canonical_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SpdxExpr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        SpdxExpr::parse(&text).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_toml() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            license: SpdxExpr,
        }

        let original = Wrapper {
            license: SpdxExpr::parse("MIT OR Apache-2.0").unwrap(),
        };
        let serialized = toml::to_string(&original).unwrap();
        let deserialized: Wrapper = toml::from_str(&serialized).unwrap();
        assert_eq!(original.license, deserialized.license);
    }
}
