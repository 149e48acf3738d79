//! Declarative rule sets
//!
//! A [`RuleSet`] names the fields a request must provide and carries, for each one, a rule description. The
//! middleware only uses the field names (to project request data); descriptions are handed verbatim to the
//! [`RuleEngine`](crate::engine::RuleEngine).

/// Ordered mapping from field name to an opaque rule description.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet<R> {
  rules: Vec<(String, R)>,
}

impl<R> RuleSet<R> {
  pub fn new() -> Self {
    Self { rules: Vec::new() }
  }

  /// Declares `name` with `rule`. Declaring an existing field again replaces its rule but keeps its position.
  pub fn field(mut self, name: impl Into<String>, rule: R) -> Self {
    self.insert(name.into(), rule);
    self
  }

  pub fn get(&self, name: &str) -> Option<&R> {
    self.rules.iter().find(|(key, _)| key == name).map(|(_, rule)| rule)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.get(name).is_some()
  }

  /// Field names in declaration order
  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.rules.iter().map(|(key, _)| key.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &R)> {
    self.rules.iter().map(|(key, rule)| (key.as_str(), rule))
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  fn insert(&mut self, name: String, rule: R) {
    match self.rules.iter_mut().find(|(key, _)| *key == name) {
      Some((_, existing)) => *existing = rule,
      None => self.rules.push((name, rule)),
    }
  }
}

impl<R> Default for RuleSet<R> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K: Into<String>, R> FromIterator<(K, R)> for RuleSet<R> {
  fn from_iter<I: IntoIterator<Item = (K, R)>>(iter: I) -> Self {
    let mut rules = Self::new();
    for (name, rule) in iter {
      rules.insert(name.into(), rule);
    }
    rules
  }
}
