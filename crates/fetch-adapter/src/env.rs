//! Execution environment detection
//!
//! Whether the adapter runs inside a standard browser changes how form bodies
//! are sent. The answer is computed once and handed to the adapter instead of
//! being probed from globals on every request.

use url::Url;

/// Navigator products of embeddings that expose `fetch` without a full
/// browser global surface.
const NON_BROWSER_PRODUCTS: [&str; 3] = ["ReactNative", "NativeScript", "NS"];

/// Snapshot of the globals consulted by [`Environment::detect`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalDescriptor {
    /// Value of `navigator.product`, if a navigator exists
    pub navigator_product: Option<String>,
    /// A `window` global exists
    pub has_window: bool,
    /// A `document` global exists
    pub has_document: bool,
    /// Current document location, used as the base of relative URLs
    pub location: Option<Url>,
}

/// Execution context capability passed to the request translator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    standard_browser: bool,
    location: Option<Url>,
}

impl Environment {
    /// An environment without browser globals
    pub fn non_browser() -> Self {
        Self::default()
    }

    /// A standard browser environment, optionally located at `location`
    pub fn standard_browser(location: Option<Url>) -> Self {
        Self {
            standard_browser: true,
            location,
        }
    }

    /// Classify a set of globals
    pub fn detect(globals: &GlobalDescriptor) -> Self {
        if let Some(product) = globals.navigator_product.as_deref() {
            if NON_BROWSER_PRODUCTS.contains(&product) {
                return Self::non_browser();
            }
        }

        if globals.has_window && globals.has_document {
            Self::standard_browser(globals.location.clone())
        } else {
            Self::non_browser()
        }
    }

    /// Detect the environment the process is running in
    #[cfg(not(target_arch = "wasm32"))]
    pub fn current() -> Self {
        Self::non_browser()
    }

    /// Detect the environment the process is running in
    #[cfg(target_arch = "wasm32")]
    pub fn current() -> Self {
        Self::detect(&browser_globals())
    }

    /// True inside a browser with the full window/document surface
    pub fn is_standard_browser_env(&self) -> bool {
        self.standard_browser
    }

    /// Base URL that relative request URLs resolve against
    pub fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }
}

#[cfg(target_arch = "wasm32")]
fn browser_globals() -> GlobalDescriptor {
    let Some(window) = web_sys::window() else {
        return GlobalDescriptor::default();
    };

    let navigator_product = window.navigator().product();
    let location = window
        .location()
        .href()
        .ok()
        .and_then(|href| Url::parse(&href).ok());

    GlobalDescriptor {
        navigator_product: Some(navigator_product),
        has_window: true,
        has_document: window.document().is_some(),
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn browser(product: &str) -> GlobalDescriptor {
        GlobalDescriptor {
            navigator_product: Some(product.to_string()),
            has_window: true,
            has_document: true,
            location: None,
        }
    }

    #[test]
    fn test_non_browser_products() {
        for product in ["ReactNative", "NativeScript", "NS"] {
            assert!(
                !Environment::detect(&browser(product)).is_standard_browser_env(),
                "{product} should not be a standard browser"
            );
        }
    }

    #[test]
    fn test_window_and_document_is_browser() {
        assert!(Environment::detect(&browser("Gecko")).is_standard_browser_env());
    }

    #[test]
    fn test_missing_document_is_not_browser() {
        let globals = GlobalDescriptor {
            has_window: true,
            ..Default::default()
        };
        assert!(!Environment::detect(&globals).is_standard_browser_env());
    }

    #[test]
    fn test_location_is_kept() {
        let location = Url::parse("https://app.example.com/page").expect("Valid URL");
        let globals = GlobalDescriptor {
            location: Some(location.clone()),
            ..browser("Gecko")
        };
        assert_eq!(Environment::detect(&globals).location(), Some(&location));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_native_current_is_not_browser() {
        assert!(!Environment::current().is_standard_browser_env());
    }
}
