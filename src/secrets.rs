#[cfg(test)]
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Opaque lookup of credentials by name.
pub trait SecretProvider {
    fn lookup(&self, name: &str) -> Option<String>;

    /// First non-empty value among `names`, or `ConfigMissing` naming the first.
    fn require(&self, names: &[&str]) -> Result<String> {
        names
            .iter()
            .filter_map(|name| self.lookup(name))
            .find(|value| !value.trim().is_empty())
            .ok_or_else(|| Error::ConfigMissing(names.first().copied().unwrap_or("secret").into()))
    }
}

/// Reads secrets from the process environment (after `.env` has been loaded).
pub struct EnvSecrets;

impl SecretProvider for EnvSecrets {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed name → value map, for wiring the pipeline without touching the environment.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct StaticSecrets {
    values: HashMap<String, String>,
}

#[cfg(test)]
impl StaticSecrets {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
impl SecretProvider for StaticSecrets {
    fn lookup(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}
