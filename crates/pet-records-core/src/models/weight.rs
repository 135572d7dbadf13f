//! Weight entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::{require, FieldErrors, RecordForm, RecordKind, MSG_OUT_OF_RANGE};

const KG_PER_LB: f64 = 0.453_592_37;

/// Unit a weight was entered in. Storage is always kilograms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    #[default]
    Kilograms,
    Pounds,
}

impl WeightUnit {
    pub fn to_kilograms(&self, value: f64) -> f64 {
        match self {
            WeightUnit::Kilograms => value,
            WeightUnit::Pounds => value * KG_PER_LB,
        }
    }

    pub fn from_kilograms(&self, kg: f64) -> f64 {
        match self {
            WeightUnit::Kilograms => kg,
            WeightUnit::Pounds => kg / KG_PER_LB,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            WeightUnit::Kilograms => "kg",
            WeightUnit::Pounds => "lb",
        }
    }
}

/// Editable field set of a weight entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeightForm {
    pub weight: f64,
    pub unit: WeightUnit,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl WeightForm {
    pub fn weight_kg(&self) -> f64 {
        self.unit.to_kilograms(self.weight)
    }
}

impl RecordForm for WeightForm {
    const KIND: RecordKind = RecordKind::Weight;

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if !self.weight.is_finite() || self.weight <= 0.0 {
            errors.insert("weight".into(), MSG_OUT_OF_RANGE.into());
        }
        require(&mut errors, "date", &self.date);
        errors
    }

    fn display_name(&self) -> String {
        format!("{:.2} {}", self.weight, self.unit.symbol())
    }

    fn normalized(&self) -> Self {
        Self {
            weight: self.weight_kg(),
            unit: WeightUnit::Kilograms,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pounds_normalize_to_kilograms() {
        let form = WeightForm {
            weight: 22.0,
            unit: WeightUnit::Pounds,
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            notes: None,
        };

        let stored = form.normalized();
        assert_eq!(stored.unit, WeightUnit::Kilograms);
        assert!((stored.weight - 9.979_032_14).abs() < 1e-6);
    }

    #[test]
    fn test_kilograms_are_unchanged() {
        let form = WeightForm {
            weight: 12.5,
            ..Default::default()
        };
        assert_eq!(form.normalized().weight, 12.5);
    }

    #[test]
    fn test_non_positive_weight_is_rejected() {
        let form = WeightForm {
            weight: 0.0,
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..Default::default()
        };
        assert!(form.validate().contains_key("weight"));

        let nan = WeightForm {
            weight: f64::NAN,
            ..form
        };
        assert!(nan.validate().contains_key("weight"));
    }
}
