//! Maps option names and data keys to environment variable names.

use crate::catalog::WorkloadProfile;

/// Converts `foo-bar` into `FOO_BAR`.
pub(crate) fn upper_snake(name: &str) -> String {
    name.chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() {
                character.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Whether an option configures the web server rather than the workload.
pub(crate) fn is_webserver_option(name: &str) -> bool {
    name.starts_with("webserver-")
}

/// Returns the variable an option is exported as.
///
/// Framework options use their fixed name. Other options lose a leading
/// `<kind>-` or `app-` and gain the configuration prefix.
pub(crate) fn option_env(profile: &WorkloadProfile, option: &str) -> String {
    if let Some(framework) = profile.framework_option(option) {
        return framework.env.to_owned();
    }
    let kind_prefix = format!("{}-", profile.kind.as_str());
    let stripped = option
        .strip_prefix(kind_prefix.as_str())
        .or_else(|| option.strip_prefix("app-"))
        .unwrap_or(option);
    format!("{}{}", profile.config_prefix, upper_snake(stripped))
}
