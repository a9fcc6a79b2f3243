use indexmap::IndexMap;

/// Theme used when the configuration does not name one
pub const DEFAULT_THEME: &str = "trs80";

/// Colours as 0xRRGGBB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub bg: u32,
    pub text: u32,
    pub status: u32,
    pub status_bg: u32,
    pub error: u32,
}

lazy_static! {
    /// Retro colour themes, in the order `themes` lists them
    pub static ref THEMES: IndexMap<&'static str, Theme> = {
        let mut m = IndexMap::new();
        m.insert("trs80", Theme {
            bg: 0x000000,
            text: 0xFFFFFF,
            status: 0x000000,
            status_bg: 0xFFFFFF,
            error: 0xFF5555,
        });
        m.insert("lisa", Theme {
            bg: 0xFFFFFF,
            text: 0x000000,
            status: 0xFFFFFF,
            status_bg: 0x000000,
            error: 0xC00000,
        });
        m.insert("compaq", Theme {
            bg: 0x000000,
            text: 0x00FF00,
            status: 0x000000,
            status_bg: 0x00FF00,
            error: 0xFF5555,
        });
        m.insert("amiga", Theme {
            bg: 0x4040E0,
            text: 0xFFFFFF,
            status: 0x4040E0,
            status_bg: 0xA0A0FF,
            error: 0xFFA0A0,
        });
        m.insert("amber", Theme {
            bg: 0x000000,
            text: 0xFFB000,
            status: 0x000000,
            status_bg: 0xFFB000,
            error: 0xFF5555,
        });
        m
    };
}

/// Look a theme up by name, ignoring case
pub fn find_theme(name: &str) -> Option<(&'static str, &'static Theme)> {
    let name = name.trim().to_lowercase();
    THEMES
        .get_key_value(name.as_str())
        .map(|(key, theme)| (*key, theme))
}

pub fn theme_names() -> impl Iterator<Item = &'static str> {
    THEMES.keys().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme_exists() {
        assert!(find_theme(DEFAULT_THEME).is_some());
    }

    #[test]
    fn test_lookup_ignores_case() {
        let (name, theme) = find_theme(" Amber ").unwrap();
        assert_eq!(name, "amber");
        assert_eq!(theme.text, 0xFFB000);
        assert!(find_theme("neon").is_none());
    }

    #[test]
    fn test_names_keep_declaration_order() {
        let names: Vec<_> = theme_names().collect();
        assert_eq!(names, vec!["trs80", "lisa", "compaq", "amiga", "amber"]);
    }
}
