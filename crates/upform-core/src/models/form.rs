use serde::Serialize;

/// Ordered multi-map of text form fields.
///
/// Insertion order is preserved and a key may appear several times. Lookups
/// ignore ASCII case, the same way browsers' form posts are usually bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormValues {
    entries: Vec<(String, String)>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// First value recorded under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_order_and_duplicates() {
        let mut values = FormValues::new();
        values.append("Tag", "a");
        values.append("Title", "Demo");
        values.append("Tag", "b");

        let keys: Vec<_> = values.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Tag", "Title", "Tag"]);
        assert_eq!(values.get_all("tag").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(values.get("TAG"), Some("a"));
    }

    #[test]
    fn missing_key() {
        let values = FormValues::new();
        assert!(values.get("Title").is_none());
        assert!(!values.contains_key("Title"));
        assert!(values.is_empty());
    }
}
