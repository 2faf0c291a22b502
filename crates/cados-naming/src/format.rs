/// Artifact format accepted by the download endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Obj,
    Stl,
    Step,
    G,
}

impl ModelFormat {
    pub const ALL: [ModelFormat; 4] = [
        ModelFormat::Obj,
        ModelFormat::Stl,
        ModelFormat::Step,
        ModelFormat::G,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "obj" => Some(ModelFormat::Obj),
            "stl" => Some(ModelFormat::Stl),
            "step" => Some(ModelFormat::Step),
            "g" => Some(ModelFormat::G),
            _ => None,
        }
    }

    /// Format name as the remote service spells it in URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            ModelFormat::Obj => "obj",
            ModelFormat::Stl => "stl",
            ModelFormat::Step => "step",
            ModelFormat::G => "g",
        }
    }

    /// File extension for download filenames. STEP files use `stp`.
    pub fn extension(self) -> &'static str {
        match self {
            ModelFormat::Obj => "obj",
            ModelFormat::Stl => "stl",
            ModelFormat::Step => "stp",
            ModelFormat::G => "g",
        }
    }
}

/// Strip the extension (everything after the last `.`), if any.
pub fn base_filename(filename: &str) -> &str {
    filename.rsplit_once('.').map_or(filename, |(base, _)| base)
}

/// Base name with the extension for the given format appended.
pub fn with_extension(filename: &str, format: ModelFormat) -> String {
    format!("{}.{}", base_filename(filename), format.extension())
}

#[cfg(test)]
mod tests {
    use super::{ModelFormat, base_filename, with_extension};

    #[test]
    fn known_formats_parse_and_unknown_are_rejected() {
        assert_eq!(ModelFormat::from_name("obj"), Some(ModelFormat::Obj));
        assert_eq!(ModelFormat::from_name("step"), Some(ModelFormat::Step));
        assert_eq!(ModelFormat::from_name("gltf"), None);
        assert_eq!(ModelFormat::from_name("OBJ"), None);
    }

    #[test]
    fn step_maps_to_stp_extension() {
        assert_eq!(ModelFormat::Step.extension(), "stp");
        assert_eq!(with_extension("washer-abc123", ModelFormat::Step), "washer-abc123.stp");
    }

    #[test]
    fn base_filename_strips_only_the_last_extension() {
        assert_eq!(base_filename("washer-abc123.obj"), "washer-abc123");
        assert_eq!(base_filename("washer-radius=2_dot_5.stl"), "washer-radius=2_dot_5");
        assert_eq!(base_filename("no-extension"), "no-extension");
    }

    #[test]
    fn with_extension_replaces_an_existing_one() {
        assert_eq!(with_extension("part.obj", ModelFormat::Stl), "part.stl");
    }
}
