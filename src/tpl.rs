use std::collections::BTreeMap;

/// Template processor for resolving $VARIABLE references in configuration values
pub struct Tpl {
    variables: BTreeMap<String, String>,
}

impl Tpl {
    pub fn new() -> Self {
        Self {
            variables: BTreeMap::new(),
        }
    }

    /// Register a variable with its value
    pub fn register<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.variables.insert(key.into(), value.into());
    }

    /// Resolve all registered $VARIABLE references in `input`.
    /// Longer names are substituted first so `$APPID` never matches a `$APP` variable.
    pub fn parse(&self, input: &str) -> String {
        let mut keys: Vec<&String> = self.variables.keys().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        keys.into_iter().fold(input.to_string(), |text, key| {
            text.replace(&format!("${}", key), &self.variables[key])
        })
    }
}

impl Default for Tpl {
    fn default() -> Self {
        Self::new()
    }
}
