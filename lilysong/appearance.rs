use log::info;

/// Host-side appearance derived from the page theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Light,
    Dark,
}

impl Appearance {
    /// The page only distinguishes its "black" theme; every other theme
    /// name maps to light.
    pub fn from_theme_name(name: &str) -> Self {
        if name == "black" {
            Appearance::Dark
        } else {
            Appearance::Light
        }
    }

    /// Records the appearance the window chrome should adopt. Actually
    /// switching the native appearance is left to the platform default.
    pub fn apply(self) {
        info!("Page theme maps to {self:?} appearance");
    }
}
