//! Translation lookup for user-facing strings.
//!
//! Core logic never branches on translated text; it only passes keys through a
//! [`Translator`] handed to it by the host.

use std::collections::HashMap;

/// `t(key) -> string` lookup supplied by the host.
pub trait Translator: Send + Sync {
    fn t(&self, key: &str) -> String;
}

impl<F> Translator for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn t(&self, key: &str) -> String {
        self(key)
    }
}

/// Built-in English strings. Unknown keys are returned unchanged.
#[derive(Debug, Clone)]
pub struct EnglishTranslator {
    strings: HashMap<&'static str, &'static str>,
}

impl Default for EnglishTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl EnglishTranslator {
    pub fn new() -> Self {
        let mut strings = HashMap::new();

        // Validation
        strings.insert("validation.required", "This field is required.");
        strings.insert("validation.endBeforeStart", "This date cannot be before the start date.");
        strings.insert("validation.outOfRange", "This value is out of range.");

        // Advisory warnings
        strings.insert(
            "advisor.allergyConflict",
            "This pet has a {severity} allergy to {allergen} on record. Check with your veterinarian before giving {medication}.",
        );
        strings.insert(
            "advisor.polypharmacy",
            "This pet is already taking {count} other active medications. Ask your veterinarian to review them for interactions.",
        );

        // Severity levels
        strings.insert("severity.mild", "mild");
        strings.insert("severity.moderate", "moderate");
        strings.insert("severity.severe", "severe");
        strings.insert("severity.life_threatening", "life-threatening");

        Self { strings }
    }
}

impl Translator for EnglishTranslator {
    fn t(&self, key: &str) -> String {
        self.strings
            .get(key)
            .map(|s| s.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

/// Replace `{name}` placeholders in a translated template.
pub fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{}}}", name), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_echoes() {
        let t = EnglishTranslator::new();
        assert_eq!(t.t("no.such.key"), "no.such.key");
        assert_eq!(t.t("validation.required"), "This field is required.");
    }

    #[test]
    fn test_closure_translator() {
        let upper = |key: &str| key.to_uppercase();
        assert_eq!(upper.t("abc"), "ABC");
    }

    #[test]
    fn test_interpolate() {
        let text = interpolate("{a} and {b} and {a}", &[("a", "x"), ("b", "y")]);
        assert_eq!(text, "x and y and x");
    }
}
