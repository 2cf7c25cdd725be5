//! Heuristic User-Agent classification.
//!
//! Case-insensitive substring checks, first match wins. Every input, including
//! the empty string, lands in one of the fallback categories.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Windows,
    MacOs,
    Android,
    Ios,
    Linux,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Edge,
    Chrome,
    Firefox,
    Safari,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Mobile,
    Tablet,
    Desktop,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Windows => "Windows",
            Os::MacOs => "macOS",
            Os::Android => "Android",
            Os::Ios => "iOS",
            Os::Linux => "Linux",
            Os::Unknown => "Unknown",
        }
    }
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Edge => "Edge",
            Browser::Chrome => "Chrome",
            Browser::Firefox => "Firefox",
            Browser::Safari => "Safari",
            Browser::Other => "Other",
        }
    }
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Mobile => "Mobile",
            Device::Tablet => "Tablet",
            Device::Desktop => "Desktop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UaClass {
    pub os: Os,
    pub browser: Browser,
    pub device: Device,
}

pub fn classify(user_agent: &str) -> UaClass {
    let ua = user_agent.to_lowercase();
    let has = |needle: &str| ua.contains(needle);

    let os = if has("windows") {
        Os::Windows
    } else if has("macintosh") {
        Os::MacOs
    } else if has("android") {
        Os::Android
    } else if has("iphone") || has("ipad") {
        Os::Ios
    } else if has("linux") {
        Os::Linux
    } else {
        Os::Unknown
    };

    // "edg/" must be checked before "chrome/": Edge UAs carry both tokens.
    let browser = if has("edg/") {
        Browser::Edge
    } else if has("chrome/") {
        Browser::Chrome
    } else if has("firefox/") {
        Browser::Firefox
    } else if has("safari/") {
        Browser::Safari
    } else {
        Browser::Other
    };

    let device = if has("mobile") || has("android") || has("iphone") {
        Device::Mobile
    } else if has("ipad") || has("tablet") {
        Device::Tablet
    } else {
        Device::Desktop
    };

    UaClass {
        os,
        browser,
        device,
    }
}
