/// Canonical comparison form for package and extra names.
///
/// Lower-cases the name and swaps underscores for dashes so `Foo_Bar` and
/// `foo-bar` compare equal. Applied identically to PyPI and conda-forge names.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}
