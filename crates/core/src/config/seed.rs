use derive_more::Display;
use fnv::FnvHasher;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{de::Visitor, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    convert::TryInto,
    fmt,
    hash::{Hash, Hasher},
};

/// Seed for every random process in a simulation: the terrain noise
/// permutation, random weather picks, and scatter placement. Two simulations
/// with the same seed and config play out identically.
///
/// When deserializing, a seed can be given as:
/// - an integer that fits into `u64`, used as-is
/// - a string that parses into a `u64`, used as that number
/// - any other string, which is kept and hashed when the seed is used
///
/// Anything else (negative or out of range numbers, floats, arrays, etc.) is
/// an error.
///
/// Seeds are always **serialized as strings**. JSON and TOML can't hold
/// every `u64`, so a numeric serialization could lose information on a round
/// trip.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum Seed {
    /// An integer seed, which can be used directly
    Int(u64),
    /// A textual seed, which will be hashed into a u64 before use
    Text(String),
}

impl Seed {
    /// Convert the seed to a `u64`, so it can actually be used in an RNG
    pub fn to_u64(&self) -> u64 {
        match self {
            Self::Int(seed) => *seed,
            Self::Text(text) => {
                let mut hasher = FnvHasher::default();
                text.hash(&mut hasher);
                hasher.finish()
            }
        }
    }

    /// Build the master RNG for a simulation. Subsystems should derive their
    /// own seeds from this rather than sharing it, so that adding a random
    /// call in one place doesn't shift the values another one sees.
    pub fn rng(&self) -> Pcg64 {
        Pcg64::seed_from_u64(self.to_u64())
    }

    /// A fresh random seed. The default config uses this, which means the
    /// default config is **not** reproducible unless you save the seed.
    pub fn random() -> Self {
        Self::Int(rand::random())
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self::random()
    }
}

impl From<u64> for Seed {
    fn from(seed: u64) -> Self {
        Self::Int(seed)
    }
}

// If the string is a valid int, use that. Otherwise keep the raw text
impl From<&str> for Seed {
    fn from(seed_str: &str) -> Self {
        match seed_str.parse::<u64>() {
            Ok(seed) => Self::Int(seed),
            Err(_) => Self::Text(seed_str.into()),
        }
    }
}

impl Serialize for Seed {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Seed {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        // Both ints and strings are accepted, so no type hint here
        deserializer.deserialize_any(SeedVisitor)
    }
}

/// Implements a `visit_*` method for one integer type
macro_rules! impl_visit {
    ($fname:ident, $type:ty) => {
        fn $fname<E>(self, value: $type) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            value
                .try_into()
                .map(Seed::Int)
                .map_err(|_| E::custom(format!("u64 out of range: {}", value)))
        }
    };
}

struct SeedVisitor;

impl<'de> Visitor<'de> for SeedVisitor {
    type Value = Seed;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a positive integer or string")
    }

    impl_visit!(visit_u8, u8);
    impl_visit!(visit_u16, u16);
    impl_visit!(visit_u32, u32);
    impl_visit!(visit_u64, u64);
    impl_visit!(visit_u128, u128);
    impl_visit!(visit_i8, i8);
    impl_visit!(visit_i16, i16);
    impl_visit!(visit_i32, i32);
    impl_visit!(visit_i64, i64);
    impl_visit!(visit_i128, i128);

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(value.into())
    }
}
