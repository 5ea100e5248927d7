const MAX_SLUG_LEN: usize = 100;

/// Lowercase ASCII slug; runs of anything else collapse into a single `-`.
pub(crate) fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch != '\'' && ch != '`' {
            pending_dash = true;
        }

        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

/// Explicit slug when given, otherwise derived from the title, otherwise `fallback`.
pub(crate) fn resolve(explicit: Option<&str>, title: &str, fallback: &str) -> String {
    let candidate = explicit.map(slugify).filter(|s| !s.is_empty()).unwrap_or_else(|| slugify(title));
    if candidate.is_empty() {
        fallback.chars().take(MAX_SLUG_LEN).collect()
    } else {
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Python Backend: Module 1"), "python-backend-module-1");
        assert_eq!(slugify("  --Django  REST--  "), "django-rest");
        assert_eq!(slugify("O'zbek tili"), "ozbek-tili");
    }

    #[test]
    fn resolve_falls_back_when_nothing_ascii_remains() {
        assert_eq!(resolve(None, "Модуль", "abc123"), "abc123");
        assert_eq!(resolve(Some("Custom Slug"), "ignored", "x"), "custom-slug");
    }

    #[test]
    fn slug_is_bounded() {
        let long = "a".repeat(300);
        assert_eq!(slugify(&long).len(), 100);
    }
}
