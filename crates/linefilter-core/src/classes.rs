//! Output class table: maps raw raster values to class indices.

use std::fmt;

use crate::error::{ClassifyError, Result};

/// Token marking the raster's nodata value in a value list.
pub const NODATA_TOKEN: &str = "NoData";
/// Token matching every value not claimed by an earlier class.
pub const WILDCARD_TOKEN: &str = "*";

/// One entry of a class's value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassValue {
    Value(i64),
    NoData,
    Wildcard,
}

impl ClassValue {
    #[inline]
    fn matches(self, raw: i64, nodata: Option<i64>) -> bool {
        match self {
            ClassValue::Value(v) => v == raw,
            ClassValue::NoData => nodata == Some(raw),
            ClassValue::Wildcard => true,
        }
    }
}

impl fmt::Display for ClassValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassValue::Value(v) => write!(f, "{v}"),
            ClassValue::NoData => f.write_str(NODATA_TOKEN),
            ClassValue::Wildcard => f.write_str(WILDCARD_TOKEN),
        }
    }
}

/// Parse a space and/or comma separated value list, e.g. `"1, 2 3 NoData"` or `"*"`.
pub fn parse_values(text: &str) -> Result<Vec<ClassValue>> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|tok| !tok.is_empty())
        .map(|tok| match tok {
            NODATA_TOKEN => Ok(ClassValue::NoData),
            WILDCARD_TOKEN => Ok(ClassValue::Wildcard),
            _ => tok.parse::<i64>().map(ClassValue::Value).map_err(|_| {
                ClassifyError::InvalidConfiguration(format!(
                    "'{tok}' is not an integer, '{NODATA_TOKEN}' or '{WILDCARD_TOKEN}'"
                ))
            }),
        })
        .collect()
}

/// A named output class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub values: Vec<ClassValue>,
    /// Minimum run length, in samples, for this class to anchor a region.
    pub min_steps: usize,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, values: Vec<ClassValue>, min_steps: usize) -> Self {
        Self { name: name.into(), values, min_steps }
    }

    pub fn is_wildcard(&self) -> bool {
        self.values.contains(&ClassValue::Wildcard)
    }
}

/// Validated, ordered class table. Immutable once built; wildcard classes
/// always sort after every non-wildcard class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassTable {
    classes: Vec<ClassDef>,
}

impl ClassTable {
    /// Validate and order a list of classes.
    pub fn new(mut classes: Vec<ClassDef>) -> Result<Self> {
        if classes.is_empty() {
            return Err(ClassifyError::InvalidConfiguration("no classes configured".into()));
        }
        if let Some(c) = classes.iter().find(|c| c.values.is_empty()) {
            return Err(ClassifyError::InvalidConfiguration(format!(
                "class '{}' has an empty value list",
                c.name
            )));
        }
        // Stable: relative order inside each group is preserved.
        classes.sort_by_key(ClassDef::is_wildcard);
        Ok(Self { classes })
    }

    /// Build a table from the three parallel lists supplied on the command line.
    ///
    /// `class_steps` may be empty, in which case every class uses
    /// `default_min_steps`; otherwise all three lists must have equal length.
    pub fn from_lists(
        names: Vec<String>,
        values: Vec<Vec<ClassValue>>,
        class_steps: Vec<usize>,
        default_min_steps: usize,
    ) -> Result<Self> {
        let steps_ok = class_steps.is_empty() || class_steps.len() == names.len();
        if names.len() != values.len() || !steps_ok {
            return Err(ClassifyError::InvalidConfiguration(format!(
                "{} classes, {} value lists, {} class specific min-steps: must be equal number of each",
                names.len(),
                values.len(),
                class_steps.len()
            )));
        }
        let class_steps = if class_steps.is_empty() {
            vec![default_min_steps; names.len()]
        } else {
            class_steps
        };
        let classes = names
            .into_iter()
            .zip(values)
            .zip(class_steps)
            .map(|((name, values), min_steps)| ClassDef::new(name, values, min_steps))
            .collect();
        Self::new(classes)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[ClassDef] {
        &self.classes
    }

    pub fn name(&self, class: usize) -> &str {
        &self.classes[class].name
    }

    /// Per-class minimum run lengths, indexed by class.
    pub fn thresholds(&self) -> Vec<usize> {
        self.classes.iter().map(|c| c.min_steps).collect()
    }

    /// Index of the first class claiming `raw`.
    pub fn map(&self, raw: i64, nodata: Option<i64>) -> Result<usize> {
        self.classes
            .iter()
            .position(|c| c.values.iter().any(|v| v.matches(raw, nodata)))
            .ok_or(ClassifyError::UnknownClass(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_mixed_separators_and_tokens() {
        let v = parse_values(" 1, 2 3,,NoData ").unwrap();
        assert_eq!(
            v,
            vec![
                ClassValue::Value(1),
                ClassValue::Value(2),
                ClassValue::Value(3),
                ClassValue::NoData
            ]
        );
        assert_eq!(parse_values("*").unwrap(), vec![ClassValue::Wildcard]);
        assert_eq!(parse_values("-5").unwrap(), vec![ClassValue::Value(-5)]);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            parse_values("1 two"),
            Err(ClassifyError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn wildcard_class_moves_last_with_its_name_and_steps() {
        let table = ClassTable::from_lists(
            names(&["other", "water", "forest"]),
            vec![
                vec![ClassValue::Wildcard],
                vec![ClassValue::Value(1)],
                vec![ClassValue::Value(2), ClassValue::Value(3)],
            ],
            vec![7, 2, 3],
            1,
        )
        .unwrap();
        let order: Vec<&str> = table.classes().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, vec!["water", "forest", "other"]);
        assert_eq!(table.thresholds(), vec![2, 3, 7]);
    }

    #[test]
    fn default_min_steps_fill_missing_thresholds() {
        let table = ClassTable::from_lists(
            names(&["a", "b"]),
            vec![vec![ClassValue::Value(0)], vec![ClassValue::Value(1)]],
            vec![],
            4,
        )
        .unwrap();
        assert_eq!(table.thresholds(), vec![4, 4]);
    }

    #[test]
    fn mismatched_counts_are_invalid() {
        let err = ClassTable::from_lists(
            names(&["a", "b"]),
            vec![vec![ClassValue::Value(0)]],
            vec![],
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidConfiguration(_)));

        let err = ClassTable::from_lists(
            names(&["a"]),
            vec![vec![ClassValue::Value(0)]],
            vec![1, 2],
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidConfiguration(_)));
    }

    #[test]
    fn first_matching_class_wins() {
        let table = ClassTable::new(vec![
            ClassDef::new("low", vec![ClassValue::Value(1), ClassValue::Value(2)], 1),
            ClassDef::new("dup", vec![ClassValue::Value(2)], 1),
            ClassDef::new("nd", vec![ClassValue::NoData], 1),
        ])
        .unwrap();
        assert_eq!(table.map(2, None).unwrap(), 0);
        assert_eq!(table.map(255, Some(255)).unwrap(), 2);
    }

    #[test]
    fn unmatched_value_without_wildcard_is_unknown() {
        let table = ClassTable::new(vec![ClassDef::new("a", vec![ClassValue::Value(1)], 1)]).unwrap();
        assert_eq!(table.map(9, None), Err(ClassifyError::UnknownClass(9)));
        // NoData only matches when the raster declares a nodata value.
        let table = ClassTable::new(vec![ClassDef::new("nd", vec![ClassValue::NoData], 1)]).unwrap();
        assert_eq!(table.map(0, None), Err(ClassifyError::UnknownClass(0)));
    }

    #[test]
    fn wildcard_catches_the_rest() {
        let table = ClassTable::new(vec![
            ClassDef::new("rest", vec![ClassValue::Wildcard], 1),
            ClassDef::new("one", vec![ClassValue::Value(1)], 1),
        ])
        .unwrap();
        assert_eq!(table.map(1, None).unwrap(), 0);
        assert_eq!(table.map(42, None).unwrap(), 1);
        assert_eq!(table.name(1), "rest");
    }

    #[test]
    fn empty_tables_and_value_lists_are_invalid() {
        assert!(ClassTable::new(vec![]).is_err());
        assert!(ClassTable::new(vec![ClassDef::new("a", vec![], 1)]).is_err());
    }
}
