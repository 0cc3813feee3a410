/// The closed set of compression strategies the engine knows about.
///
/// Priority order (lower tried first) reflects expected compression ratio:
/// Ghostscript rewrites pages and images, qpdf restructures streams, and
/// the built-in backend only performs safe lossless cleanup.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Ghostscript,
    Qpdf,
    Builtin,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::Ghostscript,
        BackendKind::Qpdf,
        BackendKind::Builtin,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Ghostscript => "ghostscript",
            BackendKind::Qpdf => "qpdf",
            BackendKind::Builtin => "builtin",
        }
    }

    /// Rank in the default try order; lower is tried first.
    pub fn priority(self) -> u8 {
        match self {
            BackendKind::Ghostscript => 0,
            BackendKind::Qpdf => 1,
            BackendKind::Builtin => 2,
        }
    }

    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            BackendKind::Ghostscript => &[
                Capability::StreamRecompress,
                Capability::ImageDownsample,
                Capability::StructureRepair,
            ],
            BackendKind::Qpdf => &[
                Capability::StreamRecompress,
                Capability::StructureRepair,
            ],
            BackendKind::Builtin => &[
                Capability::StreamRecompress,
                Capability::ObjectDedup,
            ],
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a backend can do to a document.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Re-deflate or deflate stream data
    StreamRecompress,
    /// Reduce embedded image resolution
    ImageDownsample,
    /// Rebuild cross-reference tables and repair structure
    StructureRepair,
    /// Drop byte-identical duplicate objects
    ObjectDedup,
}

/// One probed backend: whether it is usable on this host and how to invoke it.
#[derive(Clone, Debug)]
pub struct BackendDescriptor {
    pub kind: BackendKind,
    pub available: bool,
    /// Version string reported by the tool, when it could be queried
    pub version: Option<String>,
    /// Executable name that answered the probe (None for the built-in backend)
    pub program: Option<String>,
}

impl BackendDescriptor {
    pub fn unavailable(kind: BackendKind) -> Self {
        Self {
            kind,
            available: false,
            version: None,
            program: None,
        }
    }
}

/// The result of one probe pass: every known backend with its availability,
/// ordered by priority. Treated as read-only for the duration of a batch run.
#[derive(Clone, Debug)]
pub struct BackendSet {
    descriptors: Vec<BackendDescriptor>,
}

impl BackendSet {
    pub fn new(mut descriptors: Vec<BackendDescriptor>) -> Self {
        descriptors.sort_by_key(|d| d.kind.priority());
        Self { descriptors }
    }

    pub fn get(&self, kind: BackendKind) -> Option<&BackendDescriptor> {
        self.descriptors.iter().find(|d| d.kind == kind)
    }

    pub fn is_available(&self, kind: BackendKind) -> bool {
        self.get(kind).map(|d| d.available).unwrap_or(false)
    }

    /// All descriptors in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &BackendDescriptor> {
        self.descriptors.iter()
    }

    /// Available backends in priority order.
    pub fn available(&self) -> impl Iterator<Item = &BackendDescriptor> {
        self.descriptors.iter().filter(|d| d.available)
    }
}
