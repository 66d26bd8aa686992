//! Concrete collaborators behind the traits in [`crate::traits`].

pub mod archive;
pub mod crypto;
pub mod nexus;
pub mod node;
pub mod notify;
pub mod process;

#[cfg(test)]
pub(crate) mod testing;

pub use archive::TarArchiveExtractor;
pub use crypto::{AesGcmCipher, CryptoError};
pub use nexus::HttpNexusClient;
pub use node::{CommandBootstrapper, SshNodeAuthenticator};
pub use notify::LoggingSyncListener;
pub use process::ProcessCommandRunner;
