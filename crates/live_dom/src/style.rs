use std::fmt;

/// Inline style of a live element as an ordered property set.
///
/// Property names are trimmed and ASCII-lowercased; a property appears at most
/// once and keeps the position of its first assignment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleMap {
    properties: Vec<(String, String)>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `style` attribute value. Declarations without a `:` or with an
    /// empty name are skipped; a repeated property keeps its last value.
    pub fn parse(input: &str) -> Self {
        let mut style = Self::new();
        for (name, value) in declarations(input) {
            style.set(&name, value);
        }
        style
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(property, _)| property == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.properties.iter_mut().find(|(property, _)| property == name) {
            Some((_, existing)) => *existing = value,
            None => self.properties.push((name.to_string(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.properties.iter().position(|(property, _)| property == name)?;
        Some(self.properties.remove(index).1)
    }

    /// Moves from the `previous` style attribute value to `next`.
    ///
    /// Properties declared by `previous` and absent from `next` are removed;
    /// properties `next` declares are set. Anything else (properties set by
    /// other code) is left alone.
    pub fn merge(&mut self, previous: Option<&str>, next: Option<&str>) {
        let next: Vec<(String, String)> = next.map(declarations).unwrap_or_default();
        for (name, _) in previous.map(declarations).unwrap_or_default() {
            if !next.iter().any(|(property, _)| *property == name) {
                self.remove(&name);
            }
        }
        for (name, value) in next {
            self.set(&name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl fmt::Display for StyleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.properties.iter().enumerate() {
            if i != 0 {
                f.write_str("; ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

fn declarations(input: &str) -> Vec<(String, String)> {
    input
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                return None;
            }
            Some((name, value.trim().to_string()))
        })
        .collect()
}
