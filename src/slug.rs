use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("separator regex is valid"));

/// Lowercases `input` and turns every run of non letter/digit characters into a
/// single hyphen. Leading and trailing hyphens are dropped.
pub fn slugify(input: &str) -> String {
    let lower = input.to_lowercase();
    SEPARATOR_REGEX
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Super Widget"), "super-widget");
    }

    #[test]
    fn collapses_punctuation_runs() {
        assert_eq!(slugify("  Widget -- 2000, (Pro)!  "), "widget-2000-pro");
        assert_eq!(slugify("snake_case_name"), "snake-case-name");
    }

    #[test]
    fn keeps_unicode_letters() {
        assert_eq!(slugify("Ноутбук Lenovo"), "ноутбук-lenovo");
    }

    #[test]
    fn empty_when_nothing_usable() {
        assert_eq!(slugify("!!! ---"), "");
    }
}
