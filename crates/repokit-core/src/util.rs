//! Small string helpers shared by the changelog and crawl pipelines.

use std::cmp::Ordering;

/// Compare two strings the way a default-locale collator orders them.
///
/// Letters compare case-insensitively first; when two strings only differ
/// in case, the lowercase form sorts first (`"apple" < "Apple" < "banana"`).
#[must_use]
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Sort strings case-insensitively and drop case-insensitive duplicates.
///
/// The first spelling encountered in sorted order is kept.
#[must_use]
pub fn sorted_case_insensitive<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut items: Vec<String> = items.into_iter().collect();
    items.sort_by(|a, b| locale_cmp(a, b));
    items.dedup_by(|b, a| a.eq_ignore_ascii_case(b));
    items
}

/// Replace `{name}` placeholders in `template` with the provided values.
///
/// Unknown placeholders are left untouched.
#[must_use]
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in values {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_cmp_is_case_insensitive_first() {
        assert_eq!(locale_cmp("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_cmp("Banana", "apple"), Ordering::Greater);
        assert_eq!(locale_cmp("apple", "Apple"), Ordering::Less);
        assert_eq!(locale_cmp("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_sorted_case_insensitive_dedups() {
        let sorted = sorted_case_insensitive(vec![
            "zoe".to_string(),
            "Alice".to_string(),
            "bob".to_string(),
            "alice".to_string(),
        ]);
        assert_eq!(sorted, vec!["alice", "bob", "zoe"]);
    }

    #[test]
    fn test_fill_template() {
        let out = fill_template(
            "- {message} (#{prNumber}) {unknown}",
            &[("message", "Fix it"), ("prNumber", "12")],
        );
        assert_eq!(out, "- Fix it (#12) {unknown}");
    }
}
