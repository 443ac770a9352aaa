use serde_json::Value;

use crate::error::RecordError;

pub const LEVEL_PREFIX: &str = "ITC.apps.ratings.level.";

const GRADED_LEVELS: [&str; 3] = ["NONE", "INFREQUENT_MILD", "FREQUENT_INTENSE"];
const BOOLEAN_PRESENT: &str = "YES";
const BOOLEAN_ABSENT: &str = "NO";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Boolean,
    Graded,
}

impl DescriptorKind {
    fn array_key(self) -> &'static str {
        match self {
            Self::Boolean => "booleanDescriptors",
            Self::Graded => "nonBooleanDescriptors",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingDescriptor {
    pub name: String,
    pub kind: DescriptorKind,
    pub level: Option<String>,
}

/// Content-rating descriptors of a version (`ratings`).
#[derive(Debug)]
pub struct RatingDescriptorSet<'a> {
    ratings: &'a mut Value,
}

impl<'a> RatingDescriptorSet<'a> {
    pub fn new(ratings: &'a mut Value) -> Self {
        Self { ratings }
    }

    fn entries(&self, kind: DescriptorKind) -> &[Value] {
        self.ratings
            .get(kind.array_key())
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }

    /// Graded descriptors first, then boolean ones, in document order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<RatingDescriptor> {
        [DescriptorKind::Graded, DescriptorKind::Boolean]
            .into_iter()
            .flat_map(|kind| {
                self.entries(kind).iter().map(move |entry| RatingDescriptor {
                    name: entry
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    kind,
                    level: entry
                        .get("level")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            })
            .collect()
    }

    /// First descriptor of `kind` whose name contains `key`.
    fn position(&self, kind: DescriptorKind, key: &str) -> Option<usize> {
        self.entries(kind).iter().position(|entry| {
            entry
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| name.contains(key))
        })
    }

    /// Set descriptor levels from `key -> severity` pairs.
    ///
    /// Keys are matched as substrings of descriptor names, graded descriptors
    /// before boolean ones. Graded descriptors take severities 0, 1 or 2;
    /// boolean descriptors are present for any severity above zero. Every
    /// pair is resolved before anything is written.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for a graded severity outside 0..=2 and
    /// `NotFound` for a key matching no descriptor.
    pub fn apply<I, K>(&mut self, mapping: I) -> Result<usize, RecordError>
    where
        I: IntoIterator<Item = (K, i64)>,
        K: AsRef<str>,
    {
        let mut plan = Vec::new();

        for (key, severity) in mapping {
            let key = key.as_ref();
            if let Some(index) = self.position(DescriptorKind::Graded, key) {
                let level = usize::try_from(severity)
                    .ok()
                    .and_then(|severity| GRADED_LEVELS.get(severity))
                    .ok_or_else(|| {
                        RecordError::invalid_argument(
                            "rating severity",
                            format!("{key}={severity}"),
                            "graded descriptors take 0, 1 or 2",
                        )
                    })?;
                plan.push((DescriptorKind::Graded, index, *level));
            } else if let Some(index) = self.position(DescriptorKind::Boolean, key) {
                let level = if severity > 0 {
                    BOOLEAN_PRESENT
                } else {
                    BOOLEAN_ABSENT
                };
                plan.push((DescriptorKind::Boolean, index, level));
            } else {
                return Err(RecordError::not_found("Rating descriptor", key));
            }
        }

        for (kind, index, level) in &plan {
            if let Some(entry) = self
                .ratings
                .get_mut(kind.array_key())
                .and_then(|entries| entries.get_mut(*index))
            {
                entry["level"] = Value::String(format!("{LEVEL_PREFIX}{level}"));
                log::debug!(
                    "Rating {} set to {level}",
                    entry["name"].as_str().unwrap_or_default()
                );
            }
        }

        Ok(plan.len())
    }
}
