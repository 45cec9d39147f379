use clap::ValueEnum;
use codemap_search::VectorMode;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum VectorFlag {
    None,
    Stub,
}

impl VectorFlag {
    pub(crate) const fn as_domain(self) -> VectorMode {
        match self {
            VectorFlag::None => VectorMode::None,
            VectorFlag::Stub => VectorMode::Stub,
        }
    }
}
