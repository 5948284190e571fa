//! Default TOML config template with inline documentation comments.

pub(crate) fn default_config_toml() -> &'static str {
    r#"# Tether Configuration
# Only override what you want to change -- missing fields use defaults.

[window]
# title = "Tether"
# width = 800            # 1-16384
# height = 600           # 1-16384
# size_hint = "none"     # none | min | max | fixed
# url = "https://example.org"     # either url or html, not both
# html = "<h1>Hello</h1>"
# devtools = false

[bridge]
# unknown_binding = "drop"   # drop | reject
# log_payloads = false

[logging]
# level = "info"         # trace | debug | info | warn | error
"#
}
