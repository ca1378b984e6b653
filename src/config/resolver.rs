// Copyright (c) 2025 The project authors
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::env;

use crate::{jg_error, jg_warn};

/// One layer of configuration properties.
pub trait PropertySource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads properties from process environment variables.
pub struct EnvSource;

impl PropertySource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

/// Fixed in-memory properties, mostly for tests and embedders.
#[derive(Default)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn from_iter<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        MapSource {
            values: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl PropertySource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Layered property lookup with typed accessors. Sources are consulted in
/// the order they were added; the first one holding the key wins.
pub struct PropertyResolver {
    sources: Vec<Box<dyn PropertySource>>,
}

impl PropertyResolver {
    pub fn new() -> Self {
        PropertyResolver {
            sources: Vec::new(),
        }
    }

    /// A resolver backed by the process environment only.
    pub fn from_env() -> Self {
        Self::new().add_source(Box::new(EnvSource))
    }

    pub fn add_source(mut self, source: Box<dyn PropertySource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|s| s.get(key))
    }

    /// Integer property; a present but unparsable value is logged and
    /// treated as absent.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        let value = self.get(key)?;
        match value.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                jg_error!("Failed to parse integer for property {key} with value {value}");
                None
            }
        }
    }

    pub fn get_number(&self, key: &str) -> Option<f64> {
        let value = self.get(key)?;
        match value.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                jg_error!("Failed to parse number for property {key} with value {value}");
                None
            }
        }
    }

    /// Boolean property: true only when the value is present and equals
    /// "true" case-insensitively. Absence and anything else read as false.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Parses a comma-separated `key=value` tag list. Entries without
    /// exactly one `=` are logged and skipped. Values may reference other
    /// properties as `${NAME:default}`; a reference that resolves nowhere
    /// and has no default yields `None` for that tag.
    pub fn get_tags(&self, key: &str) -> HashMap<String, Option<String>> {
        let mut tags = HashMap::new();
        let Some(raw) = self.get(key) else {
            return tags;
        };
        for entry in raw.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let mut parts = entry.split('=');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(tag_key), Some(tag_value), None) => {
                    tags.insert(
                        tag_key.trim().to_string(),
                        self.resolve_value(tag_value.trim()),
                    );
                }
                _ => {
                    jg_warn!("Invalid tag incurred, {entry} is not a valid tag");
                }
            }
        }
        tags
    }

    /// Expands a `${NAME:default}` reference against this resolver. A plain
    /// value passes through untouched; an unresolvable reference with no
    /// default resolves to nothing.
    fn resolve_value(&self, value: &str) -> Option<String> {
        if let Some(inner) = value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
            let (name, default) = match inner.split_once(':') {
                Some((name, default)) => (name, Some(default)),
                None => (inner, None),
            };
            match self.get(name.trim()) {
                Some(resolved) => Some(resolved),
                None => default.filter(|d| !d.is_empty()).map(str::to_string),
            }
        } else {
            Some(value.to_string())
        }
    }
}

impl Default for PropertyResolver {
    fn default() -> Self {
        Self::new()
    }
}
