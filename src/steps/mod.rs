// One module per provisioning component, in the order the orchestrator runs them.

pub mod guard;        // Privilege + OS identity
pub mod packages;     // apt + nginx service
pub mod site;         // Masquerade site + vhost
pub mod certificate;  // certbot issuance
pub mod tunnel;       // Tunnel install + config
pub mod tuning;       // sysctl buffers
pub mod firewall;     // ufw ports
pub mod verify;       // Service states + client config

/// Double-quoted YAML scalar. Operator-supplied passwords may contain anything,
/// and YAML forbids raw control characters inside quotes.
pub(crate) fn yaml_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::yaml_string;

    #[test]
    fn plain_values_are_just_quoted() {
        assert_eq!(yaml_string("abc-_123"), "\"abc-_123\"");
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        assert_eq!(yaml_string(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn escaped_value_parses_back() {
        let raw = "p@ss: \"w0rd\" # not a comment\\";
        let doc = format!("password: {}\n", yaml_string(raw));
        let parsed: serde_yaml::Value = serde_yaml::from_str(&doc).unwrap();
        assert_eq!(parsed["password"].as_str(), Some(raw));
    }

    #[test]
    fn control_characters_survive_a_parse() {
        for raw in ["a\rb", "a\u{7}b", "a\u{1b}b", "a\u{85}b", "tab\there"] {
            let doc = format!("password: {}\n", yaml_string(raw));
            let parsed: serde_yaml::Value = serde_yaml::from_str(&doc)
                .unwrap_or_else(|e| panic!("{:?} rendered unparseable YAML: {}", raw, e));
            assert_eq!(parsed["password"].as_str(), Some(raw), "{:?}", raw);
        }
    }

    #[test]
    fn control_characters_are_escaped_as_unicode() {
        assert_eq!(yaml_string("a\u{1b}b"), "\"a\\u001Bb\"");
        assert_eq!(yaml_string("a\rb"), "\"a\\rb\"");
    }
}
