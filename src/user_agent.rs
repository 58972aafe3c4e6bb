use woothee::parser::Parser;

/// Device classification extracted from the User-Agent header.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub device_type: String,
    pub browser: String,
    pub os: String,
}

/// Classify a raw User-Agent string into coarse device/browser/OS
/// buckets for the analytics tables.
pub fn parse(ua: &str) -> DeviceInfo {
    let result = Parser::new().parse(ua);

    let device_type = if ua.contains("iPad") || ua.contains("Tablet") {
        "tablet"
    } else {
        match result.as_ref().map(|r| r.category) {
            Some("smartphone") | Some("mobilephone") => "mobile",
            _ => "desktop",
        }
    };

    let browser = match result.as_ref().map(|r| r.name) {
        Some("Chrome") => "Chrome",
        Some("Firefox") => "Firefox",
        Some("Safari") => "Safari",
        Some("Edge") => "Edge",
        Some("Opera") => "Opera",
        _ => {
            // woothee misses some Chromium-derived tokens
            if ua.contains("Edg/") {
                "Edge"
            } else if ua.contains("OPR/") {
                "Opera"
            } else {
                "Unknown"
            }
        }
    };

    let os_raw = result.as_ref().map(|r| r.os).unwrap_or("");
    let os = if os_raw.contains("Windows") {
        "Windows"
    } else if os_raw.contains("Mac OSX") || os_raw.contains("Mac OS X") {
        "macOS"
    } else if os_raw.contains("Android") {
        "Android"
    } else if os_raw.contains("iPhone") || os_raw.contains("iPad") || os_raw.contains("iOS") {
        "iOS"
    } else if os_raw.contains("Linux") {
        "Linux"
    } else {
        "Unknown"
    };

    DeviceInfo {
        device_type: device_type.to_string(),
        browser: browser.to_string(),
        os: os.to_string(),
    }
}
