//! InMemory Repository 実装

mod workspace;

pub use workspace::InMemoryWorkspaceRepository;
