use std::collections::HashMap;

/// Replaces `{{ key }}` placeholders with values from `fields`.
///
/// Unknown keys and unterminated placeholders are copied through verbatim.
pub fn render(template: &str, fields: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = after_open[..end].trim();
        match fields.get(key) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after_open[end + 2..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> HashMap<&'static str, String> {
        HashMap::from([
            ("first_name", "Kofi".to_string()),
            ("full_name", "Kofi Boateng".to_string()),
        ])
    }

    #[test]
    fn substitutes_known_keys() {
        assert_eq!(
            render("Hello {{first_name}}, welcome {{ full_name }}!", &fields()),
            "Hello Kofi, welcome Kofi Boateng!"
        );
    }

    #[test]
    fn leaves_unknown_keys_verbatim() {
        assert_eq!(
            render("Dear {{title}} {{first_name}}", &fields()),
            "Dear {{title}} Kofi"
        );
    }

    #[test]
    fn keeps_unterminated_placeholder() {
        assert_eq!(render("Hi {{first_name", &fields()), "Hi {{first_name");
        assert_eq!(render("{single} braces", &fields()), "{single} braces");
    }

    #[test]
    fn handles_multibyte_text() {
        assert_eq!(render("Akwaaba {{first_name}} 🎉", &fields()), "Akwaaba Kofi 🎉");
    }
}
