// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serde support for [`PlatformExpr`], serialized as its original source string.
//!
//! Requires the `summaries` feature to be enabled.

use crate::expr::PlatformExpr;
use crate::parser::ParseMode;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

impl Serialize for PlatformExpr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.expression_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PlatformExpr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        PlatformExpr::parse(&text, ParseMode::Strict).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_toml() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            supports: PlatformExpr,
        }

        let original = Wrapper {
            supports: PlatformExpr::parse("windows & !arm", ParseMode::Strict).unwrap(),
        };
        let serialized = toml::to_string(&original).unwrap();
        let deserialized: Wrapper = toml::from_str(&serialized).unwrap();
        assert_eq!(original.supports, deserialized.supports);
    }
}
