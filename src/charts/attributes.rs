//! Selector catalogs and color palettes shared by the charts.

use crate::data::{CountField, NumericField, ScoreField, Snapshot};

/// One entry of an attribute selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeOption {
    pub key: &'static str,
    pub label: &'static str,
}

const fn option(key: &'static str, label: &'static str) -> AttributeOption {
    AttributeOption { key, label }
}

/// Attributes the donut chart can group students by. The first is the default.
pub const DONUT_ATTRIBUTES: [AttributeOption; 32] = [
    option("age", "Age"),
    option("gender", "Gender"),
    option("health_problems", "Health Problems"),
    option("homework", "Homework"),
    option("preschool", "Preschool"),
    option("work", "Work"),
    option("internal_external", "Internal/External"),
    option("mother_qualification", "Mother Qualification"),
    option("father_qualification", "Father Qualification"),
    option("mother_profession", "Mother Profession"),
    option("father_profession", "Father Profession"),
    option("divorced", "Divorced"),
    option("dead", "Dead"),
    option("help_with_homework", "Help with Homework"),
    option("speciality", "Speciality"),
    option("number_of_repetition", "Number of Repetition"),
    option("public_or_private", "Public/Private"),
    option("area", "Area"),
    option("electricity", "Electricity"),
    option("water", "Water"),
    option("pc", "PC"),
    option("books", "Books"),
    option("marital_status", "Marital Status"),
    option("motivation", "Motivation"),
    option("learning_style", "Learning Style"),
    option("study_situation", "Study Situation"),
    option("primary_score_range", "Primary Score"),
    option("college_score_range", "College Score"),
    option("current_score_range", "Current Score"),
    option("math_score_range", "Math Score"),
    option("arabic_language_score_range", "Arabic Language Score"),
    option("first_language_score_range", "First Language Score"),
];

/// Fields offered on both scatter axes, in selector order.
pub const SCATTER_FIELDS: [NumericField; 7] = [
    NumericField::Count(CountField::NumberOfRepetition),
    NumericField::Score(ScoreField::Primary),
    NumericField::Score(ScoreField::College),
    NumericField::Score(ScoreField::Current),
    NumericField::Score(ScoreField::Math),
    NumericField::Score(ScoreField::ArabicLanguage),
    NumericField::Score(ScoreField::FirstLanguage),
];

/// Ten-class diverging Spectral scheme (donut slices).
pub const SPECTRAL_10: [&str; 10] = [
    "#9e0142", "#d53e4f", "#f46d43", "#fdae61", "#fee08b", "#e6f598", "#abdda4", "#66c2a5",
    "#3288bd", "#5e4fa2",
];

/// Tableau 10 categorical scheme (radar polygons).
pub const TABLEAU_10: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

pub fn find_donut_attribute(key: &str) -> Option<AttributeOption> {
    DONUT_ATTRIBUTES.iter().copied().find(|a| a.key == key)
}

/// One entry of the student selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentOption {
    pub code: i64,
    pub label: String,
}

pub fn student_options(snapshot: &Snapshot) -> Vec<StudentOption> {
    snapshot
        .iter()
        .map(|r| StudentOption {
            code: r.code(),
            label: format!("Student {}", r.code()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn donut_keys_are_unique() {
        let keys: HashSet<&str> = DONUT_ATTRIBUTES.iter().map(|a| a.key).collect();
        assert_eq!(keys.len(), DONUT_ATTRIBUTES.len());
        assert_eq!(DONUT_ATTRIBUTES[0].key, "age");
    }

    #[test]
    fn every_score_range_is_offered() {
        for field in ScoreField::ALL {
            let option = find_donut_attribute(field.range_column()).expect("range attribute");
            assert_eq!(option.label, field.label());
        }
        assert!(find_donut_attribute("code").is_none());
    }

    #[test]
    fn scatter_fields_skip_number_of_teachers() {
        assert!(!SCATTER_FIELDS.contains(&NumericField::Count(CountField::NumberOfTeachers)));
        assert_eq!(SCATTER_FIELDS.len(), 7);
    }
}
