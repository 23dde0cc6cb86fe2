//! Presentation-side image overlay.
//!
//! When a profile image upload is in flight, the UI should show the local
//! preview immediately rather than wait for the confirmed URL. The overlay
//! holds that preview outside the store: cached user records are never
//! touched, so a failed upload needs no rollback and the next refetch
//! naturally replaces the preview with server truth.

/// A locally selected image preview, displayed until the server-confirmed
/// URL arrives.
#[derive(Debug, Clone)]
pub struct ImageOverlay {
    local_url: String,
}

impl ImageOverlay {
    pub fn new(local_url: impl Into<String>) -> Self {
        Self {
            local_url: local_url.into(),
        }
    }

    pub fn local_url(&self) -> &str {
        &self.local_url
    }

    /// The URL to display: the confirmed one once the cache has it, the
    /// local preview otherwise.
    pub fn display_url<'a>(&'a self, confirmed: Option<&'a str>) -> &'a str {
        match confirmed {
            Some(url) if !url.is_empty() => url,
            _ => &self.local_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_shows_until_confirmed() {
        let overlay = ImageOverlay::new("blob:local-preview");
        assert_eq!(overlay.display_url(None), "blob:local-preview");
        assert_eq!(
            overlay.display_url(Some("https://cdn.example.com/u/4.png")),
            "https://cdn.example.com/u/4.png"
        );
    }

    #[test]
    fn test_empty_confirmed_url_keeps_preview() {
        let overlay = ImageOverlay::new("blob:local-preview");
        assert_eq!(overlay.display_url(Some("")), "blob:local-preview");
    }
}
