/// Fallback title when the client sent no usable User-Agent.
pub(crate) const UNKNOWN_DEVICE: &str = "Unknown device";

const MAX_TITLE_LEN: usize = 255;

/// Short human-readable device name such as `Chrome on Windows`.
pub(crate) fn title_from_user_agent(user_agent: Option<&str>) -> String {
    let Some(agent) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
        return UNKNOWN_DEVICE.to_string();
    };

    let browser = browser_name(agent);
    let os = os_name(agent);

    let title = match (browser, os) {
        (Some(browser), Some(os)) => format!("{browser} on {os}"),
        (Some(browser), None) => browser.to_string(),
        (None, Some(os)) => os.to_string(),
        (None, None) => agent.chars().take(MAX_TITLE_LEN).collect(),
    };

    title
}

// Order matters: Edge and Opera also announce Chrome, Chrome also announces Safari.
fn browser_name(agent: &str) -> Option<&'static str> {
    const BROWSERS: &[(&str, &str)] = &[
        ("Edg/", "Edge"),
        ("OPR/", "Opera"),
        ("YaBrowser/", "Yandex Browser"),
        ("Firefox/", "Firefox"),
        ("Chrome/", "Chrome"),
        ("Safari/", "Safari"),
        ("okhttp", "Android app"),
        ("Dart/", "Mobile app"),
        ("PostmanRuntime", "Postman"),
        ("curl/", "curl"),
    ];

    BROWSERS.iter().find(|(needle, _)| agent.contains(needle)).map(|(_, name)| *name)
}

fn os_name(agent: &str) -> Option<&'static str> {
    const SYSTEMS: &[(&str, &str)] = &[
        ("Windows", "Windows"),
        ("iPhone", "iOS"),
        ("iPad", "iPadOS"),
        ("Android", "Android"),
        ("Mac OS X", "macOS"),
        ("Linux", "Linux"),
    ];

    SYSTEMS.iter().find(|(needle, _)| agent.contains(needle)).map(|(_, name)| *name)
}
