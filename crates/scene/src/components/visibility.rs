#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Visibility {
    pub visible: bool,
}

impl Visibility {
    pub fn visible() -> Self {
        Self { visible: true }
    }

    pub fn hidden() -> Self {
        Self { visible: false }
    }

    pub fn from_flag(visible: bool) -> Self {
        Self { visible }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::visible()
    }
}

#[cfg(test)]
mod tests {
    use super::Visibility;

    #[test]
    fn visibility_helpers() {
        assert!(Visibility::visible().visible);
        assert!(!Visibility::hidden().visible);
        assert_eq!(Visibility::default(), Visibility::from_flag(true));
    }
}
