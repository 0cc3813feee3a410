/// Concrete settings for one compression attempt, derived from
/// (tier, overrides) by the preset resolver.
///
/// The struct is backend-agnostic; each adapter consumes the fields it
/// understands and ignores the rest (the built-in backend, for example,
/// is lossless and only ever recompresses streams).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResolvedParameters {
    /// Cap on embedded image resolution in DPI
    pub max_dpi: u32,
    /// JPEG quality (1-100) used when images are recoded lossily
    pub image_quality: u8,
    /// Downsample images above `max_dpi`
    pub downsample_images: bool,
    /// Allow lossy recoding of embedded images
    pub lossy_recode: bool,
    /// Trade visual fidelity for size wherever a backend offers the choice
    pub aggressive: bool,
}
